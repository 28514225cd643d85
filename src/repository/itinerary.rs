//! Itinerary repository
//!
//! An itinerary and its destinations are always written inside a single
//! transaction so readers never observe a partial destination set.

use crate::domain::{
    Destination, DestinationInput, ImageChange, ItineraryChanges, ItineraryFilter,
    ItineraryRecord, ItinerarySort, NewItinerary, StringUuid,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};

/// Column list shared by every itinerary read, aliased `i` with owner `u`.
pub(crate) const ITINERARY_SELECT: &str = r#"
    SELECT i.id, i.user_id, u.name AS owner_name, i.title, i.category, i.duration,
           i.image_path,
           (SELECT COUNT(*) FROM user_to_visit_itinerary f WHERE f.itinerary_id = i.id)
               AS favorites_count,
           i.created_at, i.updated_at
    FROM itineraries i
    INNER JOIN users u ON u.id = i.user_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    /// Insert the itinerary and all of its destinations atomically.
    async fn create(&self, input: &NewItinerary) -> Result<ItineraryRecord>;
    /// Apply scalar changes, image change and optional destination replacement atomically.
    async fn update(&self, id: StringUuid, changes: &ItineraryChanges) -> Result<ItineraryRecord>;
    /// Destinations and favorites go with it through FK cascades.
    async fn delete(&self, id: StringUuid) -> Result<bool>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<ItineraryRecord>>;
    /// Destinations for several itineraries in one round trip, in submission order.
    async fn find_destinations(&self, itinerary_ids: &[StringUuid]) -> Result<Vec<Destination>>;
    async fn list(
        &self,
        filter: &ItineraryFilter,
        sort: ItinerarySort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>>;
    async fn count(&self, filter: &ItineraryFilter) -> Result<i64>;
}

pub struct ItineraryRepositoryImpl {
    pool: MySqlPool,
}

impl ItineraryRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards and wrap for substring matching.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filter_clause(filter: &ItineraryFilter) -> String {
    let mut sql = String::from(" WHERE 1=1");
    if filter.category.is_some() {
        sql.push_str(" AND i.category = ?");
    }
    if filter.duration.is_some() {
        sql.push_str(" AND i.duration = ?");
    }
    if filter.search.is_some() {
        sql.push_str(" AND LOWER(i.title) LIKE ?");
    }
    sql
}

async fn insert_destinations(
    tx: &mut Transaction<'_, MySql>,
    itinerary_id: StringUuid,
    destinations: &[DestinationInput],
) -> Result<()> {
    for (position, destination) in destinations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO destinations (id, itinerary_id, position, name, lodging, things_to_do, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(6), NOW(6))
            "#,
        )
        .bind(StringUuid::new_v4())
        .bind(itinerary_id)
        .bind(position as i32)
        .bind(&destination.name)
        .bind(&destination.lodging)
        .bind(&destination.things_to_do)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ItineraryRepository for ItineraryRepositoryImpl {
    async fn create(&self, input: &NewItinerary) -> Result<ItineraryRecord> {
        let id = StringUuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO itineraries (id, user_id, title, category, duration, image_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NOW(6), NOW(6))
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.category)
        .bind(input.duration)
        .bind(&input.image_path)
        .execute(&mut *tx)
        .await?;

        insert_destinations(&mut tx, id, &input.destinations).await?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create itinerary")))
    }

    async fn update(&self, id: StringUuid, changes: &ItineraryChanges) -> Result<ItineraryRecord> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<StringUuid> =
            sqlx::query_scalar("SELECT id FROM itineraries WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound(format!("Itinerary {} not found", id)));
        }

        sqlx::query(
            r#"
            UPDATE itineraries
            SET title = COALESCE(?, title),
                category = COALESCE(?, category),
                duration = COALESCE(?, duration),
                updated_at = NOW(6)
            WHERE id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.category)
        .bind(changes.duration)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let image_path = match &changes.image {
            ImageChange::Keep => None,
            ImageChange::Replace(path) => Some(Some(path.as_str())),
            ImageChange::Clear => Some(None),
        };
        if let Some(image_path) = image_path {
            sqlx::query("UPDATE itineraries SET image_path = ? WHERE id = ?")
                .bind(image_path)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(destinations) = &changes.destinations {
            sqlx::query("DELETE FROM destinations WHERE itinerary_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_destinations(&mut tx, id, destinations).await?;
        }

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Itinerary {} not found", id)))
    }

    async fn delete(&self, id: StringUuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM itineraries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<ItineraryRecord>> {
        let sql = format!("{} WHERE i.id = ?", ITINERARY_SELECT);
        let record = sqlx::query_as::<_, ItineraryRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_destinations(&self, itinerary_ids: &[StringUuid]) -> Result<Vec<Destination>> {
        if itinerary_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; itinerary_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, itinerary_id, name, lodging, things_to_do, created_at, updated_at
            FROM destinations
            WHERE itinerary_id IN ({})
            ORDER BY itinerary_id, position
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, Destination>(&sql);
        for id in itinerary_ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn list(
        &self,
        filter: &ItineraryFilter,
        sort: ItinerarySort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>> {
        let order = match sort {
            ItinerarySort::Latest => "i.created_at DESC, i.id",
            ItinerarySort::Popularity => "favorites_count DESC, i.created_at DESC, i.id",
        };
        let sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            ITINERARY_SELECT,
            filter_clause(filter),
            order
        );

        let mut query = sqlx::query_as::<_, ItineraryRecord>(&sql);
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }
        if let Some(duration) = filter.duration {
            query = query.bind(duration);
        }
        if let Some(search) = &filter.search {
            query = query.bind(like_pattern(search));
        }
        query = query.bind(limit).bind(offset);

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn count(&self, filter: &ItineraryFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM itineraries i{}", filter_clause(filter));

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }
        if let Some(duration) = filter.duration {
            query = query.bind(duration);
        }
        if let Some(search) = &filter.search {
            query = query.bind(like_pattern(search));
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(row.0)
    }
}

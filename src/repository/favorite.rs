//! Favorites (to-visit list) repository

use super::itinerary::ITINERARY_SELECT;
use crate::domain::{Favorite, ItineraryRecord, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Idempotent; returns true only when a new pair was stored.
    async fn add(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool>;
    /// Returns true only when a pair was actually deleted.
    async fn remove(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool>;
    async fn find(&self, user_id: StringUuid, itinerary_id: StringUuid)
        -> Result<Option<Favorite>>;
    /// Favorited itineraries, most recently added first
    async fn list_for_user(
        &self,
        user_id: StringUuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>>;
    async fn count_for_user(&self, user_id: StringUuid) -> Result<i64>;
    /// Subset of `itinerary_ids` the user has favorited
    async fn favorited_ids(
        &self,
        user_id: StringUuid,
        itinerary_ids: &[StringUuid],
    ) -> Result<Vec<StringUuid>>;
}

pub struct FavoriteRepositoryImpl {
    pool: MySqlPool,
}

impl FavoriteRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for FavoriteRepositoryImpl {
    async fn add(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO user_to_visit_itinerary (user_id, itinerary_id, created_at, updated_at)
            VALUES (?, ?, NOW(6), NOW(6))
            "#,
        )
        .bind(user_id)
        .bind(itinerary_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM user_to_visit_itinerary WHERE user_id = ? AND itinerary_id = ?",
        )
        .bind(user_id)
        .bind(itinerary_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(
        &self,
        user_id: StringUuid,
        itinerary_id: StringUuid,
    ) -> Result<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT user_id, itinerary_id, created_at
            FROM user_to_visit_itinerary
            WHERE user_id = ? AND itinerary_id = ?
            "#,
        )
        .bind(user_id)
        .bind(itinerary_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn list_for_user(
        &self,
        user_id: StringUuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>> {
        let sql = format!(
            r#"{}
            INNER JOIN user_to_visit_itinerary fav ON fav.itinerary_id = i.id
            WHERE fav.user_id = ?
            ORDER BY fav.created_at DESC, i.id
            LIMIT ? OFFSET ?"#,
            ITINERARY_SELECT
        );

        let records = sqlx::query_as::<_, ItineraryRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn count_for_user(&self, user_id: StringUuid) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_to_visit_itinerary WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    async fn favorited_ids(
        &self,
        user_id: StringUuid,
        itinerary_ids: &[StringUuid],
    ) -> Result<Vec<StringUuid>> {
        if itinerary_ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; itinerary_ids.len()].join(", ");
        let sql = format!(
            "SELECT itinerary_id FROM user_to_visit_itinerary WHERE user_id = ? AND itinerary_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_scalar::<_, StringUuid>(&sql).bind(user_id);
        for id in itinerary_ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

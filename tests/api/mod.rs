//! API integration tests infrastructure
//!
//! In-memory implementations of every repository trait plus a recording
//! image store, so the production router runs without MySQL or a disk.


use async_trait::async_trait;
use itinera_core::config::JwtConfig;
use itinera_core::domain::{
    AccessToken, Destination, DestinationInput, Favorite, ImageChange, ItineraryChanges,
    ItineraryFilter, ItineraryRecord, ItinerarySort, NewItinerary, NewUser, StringUuid, User,
};
use itinera_core::error::{AppError, Result};
use itinera_core::jwt::JwtManager;
use itinera_core::repository::{
    AccessTokenRepository, FavoriteRepository, ItineraryRepository, UserRepository,
};
use itinera_core::storage::ImageStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

// ============================================================================
// Test Configuration
// ============================================================================

pub const TEST_APP_URL: &str = "http://localhost:8080";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-api-testing-purposes".to_string(),
        issuer: "itinera-test".to_string(),
        access_token_ttl_secs: 3600,
    }
}

pub fn create_test_jwt_manager() -> JwtManager {
    JwtManager::new(test_jwt_config())
}

// ============================================================================
// Shared in-memory tables
// ============================================================================

#[derive(Debug, Clone)]
struct ItineraryRow {
    seq: u64,
    id: StringUuid,
    user_id: StringUuid,
    title: String,
    category: String,
    duration: i32,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FavoriteRow {
    seq: u64,
    favorite: Favorite,
}

#[derive(Debug, Default)]
struct Tables {
    seq: u64,
    users: Vec<User>,
    tokens: Vec<AccessToken>,
    itineraries: Vec<ItineraryRow>,
    destinations: Vec<Destination>,
    favorites: Vec<FavoriteRow>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn record(&self, row: &ItineraryRow) -> ItineraryRecord {
        let owner_name = self
            .users
            .iter()
            .find(|u| u.id == row.user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        ItineraryRecord {
            id: row.id,
            user_id: row.user_id,
            owner_name,
            title: row.title.clone(),
            category: row.category.clone(),
            duration: row.duration,
            image_path: row.image_path.clone(),
            favorites_count: self.favorites_count(row.id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn favorites_count(&self, itinerary_id: StringUuid) -> i64 {
        self.favorites
            .iter()
            .filter(|f| f.favorite.itinerary_id == itinerary_id)
            .count() as i64
    }

    fn insert_destinations(&mut self, itinerary_id: StringUuid, inputs: &[DestinationInput]) {
        let now = Utc::now();
        for input in inputs {
            self.destinations.push(Destination {
                id: StringUuid::new_v4(),
                itinerary_id,
                name: input.name.clone(),
                lodging: input.lodging.clone(),
                things_to_do: input.things_to_do.clone(),
                created_at: now,
                updated_at: now,
            });
        }
    }

    fn matching(&self, filter: &ItineraryFilter) -> Vec<&ItineraryRow> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        self.itineraries
            .iter()
            .filter(|row| filter.category.as_ref().map_or(true, |c| &row.category == c))
            .filter(|row| filter.duration.map_or(true, |d| row.duration == d))
            .filter(|row| {
                search
                    .as_ref()
                    .map_or(true, |s| row.title.to_lowercase().contains(s))
            })
            .collect()
    }
}

/// Emulates the MySQL schema, cascades included
#[derive(Debug, Default)]
pub struct TestDatabase {
    tables: RwLock<Tables>,
    fail_itinerary_writes: AtomicBool,
    fail_token_lookups: AtomicBool,
}

impl TestDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every itinerary create/update fail as a rolled back transaction would
    pub fn fail_itinerary_writes(&self, fail: bool) {
        self.fail_itinerary_writes.store(fail, Ordering::SeqCst);
    }

    /// Make token lookups fail as an unreachable database would
    pub fn fail_token_lookups(&self, fail: bool) {
        self.fail_token_lookups.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_itinerary_writes.load(Ordering::SeqCst) {
            Err(AppError::Internal(anyhow::anyhow!(
                "simulated transaction failure"
            )))
        } else {
            Ok(())
        }
    }

    pub async fn itinerary_count(&self) -> usize {
        self.tables.read().await.itineraries.len()
    }

    pub async fn destination_count(&self, itinerary_id: StringUuid) -> usize {
        self.tables
            .read()
            .await
            .destinations
            .iter()
            .filter(|d| d.itinerary_id == itinerary_id)
            .count()
    }

    pub async fn favorite_count(&self, itinerary_id: StringUuid) -> usize {
        self.tables.read().await.favorites_count(itinerary_id) as usize
    }

    pub async fn token_count(&self) -> usize {
        self.tables.read().await.tokens.len()
    }
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

pub struct TestUserRepository(pub Arc<TestDatabase>);

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create(&self, input: &NewUser) -> Result<User> {
        let mut tables = self.0.tables.write().await;
        if tables.users.iter().any(|u| u.email == input.email) {
            return Err(AppError::field("email", "The email has already been taken."));
        }
        let user = User {
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            ..Default::default()
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

pub struct TestAccessTokenRepository(pub Arc<TestDatabase>);

#[async_trait]
impl AccessTokenRepository for TestAccessTokenRepository {
    async fn create(&self, user_id: StringUuid, name: &str) -> Result<AccessToken> {
        let token = AccessToken {
            id: StringUuid::new_v4(),
            user_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.0.tables.write().await.tokens.push(token.clone());
        Ok(token)
    }

    async fn find(&self, id: StringUuid) -> Result<Option<AccessToken>> {
        if self.0.fail_token_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let tables = self.0.tables.read().await;
        Ok(tables.tokens.iter().find(|t| t.id == id).cloned())
    }

    async fn revoke(&self, id: StringUuid) -> Result<bool> {
        let mut tables = self.0.tables.write().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|t| t.id != id);
        Ok(tables.tokens.len() < before)
    }
}

pub struct TestItineraryRepository(pub Arc<TestDatabase>);

#[async_trait]
impl ItineraryRepository for TestItineraryRepository {
    async fn create(&self, input: &NewItinerary) -> Result<ItineraryRecord> {
        self.0.check_writable()?;
        let mut tables = self.0.tables.write().await;
        let now = Utc::now();
        let row = ItineraryRow {
            seq: tables.next_seq(),
            id: StringUuid::new_v4(),
            user_id: input.user_id,
            title: input.title.clone(),
            category: input.category.clone(),
            duration: input.duration,
            image_path: input.image_path.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.insert_destinations(row.id, &input.destinations);
        let record = tables.record(&row);
        tables.itineraries.push(row);
        Ok(record)
    }

    async fn update(&self, id: StringUuid, changes: &ItineraryChanges) -> Result<ItineraryRecord> {
        self.0.check_writable()?;
        let mut tables = self.0.tables.write().await;
        let index = tables
            .itineraries
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Itinerary {} not found", id)))?;

        {
            let row = &mut tables.itineraries[index];
            if let Some(title) = &changes.title {
                row.title = title.clone();
            }
            if let Some(category) = &changes.category {
                row.category = category.clone();
            }
            if let Some(duration) = changes.duration {
                row.duration = duration;
            }
            match &changes.image {
                ImageChange::Keep => {}
                ImageChange::Replace(path) => row.image_path = Some(path.clone()),
                ImageChange::Clear => row.image_path = None,
            }
            row.updated_at = Utc::now();
        }

        if let Some(destinations) = &changes.destinations {
            tables.destinations.retain(|d| d.itinerary_id != id);
            tables.insert_destinations(id, destinations);
        }

        let row = tables.itineraries[index].clone();
        Ok(tables.record(&row))
    }

    async fn delete(&self, id: StringUuid) -> Result<bool> {
        let mut tables = self.0.tables.write().await;
        let before = tables.itineraries.len();
        tables.itineraries.retain(|row| row.id != id);
        if tables.itineraries.len() == before {
            return Ok(false);
        }
        tables.destinations.retain(|d| d.itinerary_id != id);
        tables.favorites.retain(|f| f.favorite.itinerary_id != id);
        Ok(true)
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<ItineraryRecord>> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .itineraries
            .iter()
            .find(|row| row.id == id)
            .map(|row| tables.record(row)))
    }

    async fn find_destinations(&self, itinerary_ids: &[StringUuid]) -> Result<Vec<Destination>> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .destinations
            .iter()
            .filter(|d| itinerary_ids.contains(&d.itinerary_id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        filter: &ItineraryFilter,
        sort: ItinerarySort,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>> {
        let tables = self.0.tables.read().await;
        let mut rows: Vec<(i64, &ItineraryRow)> = tables
            .matching(filter)
            .into_iter()
            .map(|row| (tables.favorites_count(row.id), row))
            .collect();

        match sort {
            ItinerarySort::Latest => rows.sort_by(|a, b| b.1.seq.cmp(&a.1.seq)),
            ItinerarySort::Popularity => {
                rows.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.seq.cmp(&a.1.seq)))
            }
        }

        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, row)| tables.record(row))
            .collect())
    }

    async fn count(&self, filter: &ItineraryFilter) -> Result<i64> {
        let tables = self.0.tables.read().await;
        Ok(tables.matching(filter).len() as i64)
    }
}

pub struct TestFavoriteRepository(pub Arc<TestDatabase>);

#[async_trait]
impl FavoriteRepository for TestFavoriteRepository {
    async fn add(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool> {
        let mut tables = self.0.tables.write().await;
        let exists = tables
            .favorites
            .iter()
            .any(|f| f.favorite.user_id == user_id && f.favorite.itinerary_id == itinerary_id);
        if exists {
            return Ok(false);
        }
        let seq = tables.next_seq();
        tables.favorites.push(FavoriteRow {
            seq,
            favorite: Favorite {
                user_id,
                itinerary_id,
                created_at: Utc::now(),
            },
        });
        Ok(true)
    }

    async fn remove(&self, user_id: StringUuid, itinerary_id: StringUuid) -> Result<bool> {
        let mut tables = self.0.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.favorite.user_id == user_id && f.favorite.itinerary_id == itinerary_id));
        Ok(tables.favorites.len() < before)
    }

    async fn find(
        &self,
        user_id: StringUuid,
        itinerary_id: StringUuid,
    ) -> Result<Option<Favorite>> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .find(|f| f.favorite.user_id == user_id && f.favorite.itinerary_id == itinerary_id)
            .map(|f| f.favorite.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: StringUuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ItineraryRecord>> {
        let tables = self.0.tables.read().await;
        let mut favorites: Vec<&FavoriteRow> = tables
            .favorites
            .iter()
            .filter(|f| f.favorite.user_id == user_id)
            .collect();
        favorites.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(favorites
            .into_iter()
            .filter_map(|f| {
                tables
                    .itineraries
                    .iter()
                    .find(|row| row.id == f.favorite.itinerary_id)
            })
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| tables.record(row))
            .collect())
    }

    async fn count_for_user(&self, user_id: StringUuid) -> Result<i64> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .filter(|f| f.favorite.user_id == user_id)
            .count() as i64)
    }

    async fn favorited_ids(
        &self,
        user_id: StringUuid,
        itinerary_ids: &[StringUuid],
    ) -> Result<Vec<StringUuid>> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .filter(|f| f.favorite.user_id == user_id && itinerary_ids.contains(&f.favorite.itinerary_id))
            .map(|f| f.favorite.itinerary_id)
            .collect())
    }
}

// ============================================================================
// Test Image Store
// ============================================================================

/// Keeps blobs in memory and records every delete
#[derive(Debug, Default)]
pub struct TestImageStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl TestImageStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for TestImageStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("cannot delete {}", path)));
        }
        self.blobs.lock().unwrap().remove(path);
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/storage/{}", TEST_APP_URL, path)
    }
}

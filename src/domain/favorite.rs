//! To-visit list entries

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user's bookmark of an itinerary, unique per pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub user_id: StringUuid,
    pub itinerary_id: StringUuid,
    pub created_at: DateTime<Utc>,
}

/// Result of removing a pair; `removed` is false when it was already absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    pub removed: bool,
}

//! Itinerary aggregate: the itinerary row, its destinations and image reference

use super::common::StringUuid;
use super::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use crate::error::FieldErrors;
use validator::Validate;

/// Fewest destinations an itinerary may have
pub const MIN_DESTINATIONS: usize = 2;

/// Itinerary row joined with its owner's name and favorite count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItineraryRecord {
    pub id: StringUuid,
    pub user_id: StringUuid,
    pub owner_name: String,
    pub title: String,
    pub category: String,
    pub duration: i32,
    pub image_path: Option<String>,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ItineraryRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            user_id: StringUuid::new_v4(),
            owner_name: String::new(),
            title: String::new(),
            category: String::new(),
            duration: 1,
            image_path: None,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ItineraryRecord {
    pub fn is_owned_by(&self, user_id: StringUuid) -> bool {
        self.user_id == user_id
    }
}

/// One stop of an itinerary
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Destination {
    pub id: StringUuid,
    pub itinerary_id: StringUuid,
    pub name: String,
    pub lodging: Option<String>,
    pub things_to_do: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An itinerary with its destinations loaded
#[derive(Debug, Clone)]
pub struct ItineraryDetails {
    pub record: ItineraryRecord,
    pub destinations: Vec<Destination>,
}

/// Submitted destination. `id` is accepted on update but never used:
/// destinations are always replaced wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct DestinationInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "The destination name is required (max 255 characters)."
    ))]
    pub name: String,
    #[validate(length(max = 255, message = "The lodging may not be greater than 255 characters."))]
    pub lodging: Option<String>,
    pub things_to_do: Option<String>,
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
}

impl DestinationInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Validated fields for a new itinerary (image handled separately)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateItineraryInput {
    #[validate(length(min = 1, max = 255, message = "The title field is required (max 255 characters)."))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "The category field is required (max 100 characters)."))]
    pub category: String,
    #[validate(range(min = 1, message = "The duration must be at least 1 day."))]
    pub duration: i32,
    #[validate(nested)]
    pub destinations: Vec<DestinationInput>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItineraryInput {
    #[validate(length(min = 1, max = 255, message = "The title may not be empty (max 255 characters)."))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "The category may not be empty (max 100 characters)."))]
    pub category: Option<String>,
    #[validate(range(min = 1, message = "The duration must be at least 1 day."))]
    pub duration: Option<i32>,
    /// When present, replaces every stored destination
    #[validate(nested)]
    pub destinations: Option<Vec<DestinationInput>>,
    #[serde(default)]
    pub remove_image: bool,
}

impl CreateItineraryInput {
    /// Every field error of the payload.
    ///
    /// The destination count is checked outside the derive: validator keeps
    /// a single error kind per field, and a list-level length error would
    /// hide the per-destination ones.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = validation_errors(self.validate());
        reject_blank(&mut errors, "title", &self.title, "The title field is required.");
        reject_blank(&mut errors, "category", &self.category, "The category field is required.");
        check_destinations(&mut errors, &self.destinations);
        errors
    }
}

impl UpdateItineraryInput {
    /// Every field error of the patch; absent fields are not checked.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = validation_errors(self.validate());
        if let Some(title) = &self.title {
            reject_blank(&mut errors, "title", title, "The title may not be empty.");
        }
        if let Some(category) = &self.category {
            reject_blank(&mut errors, "category", category, "The category may not be empty.");
        }
        if let Some(destinations) = &self.destinations {
            check_destinations(&mut errors, destinations);
        }
        errors
    }
}

fn validation_errors(result: Result<(), validator::ValidationErrors>) -> FieldErrors {
    match result {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    }
}

fn reject_blank(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() && !errors.contains(field) {
        errors.add(field, message);
    }
}

fn check_destinations(errors: &mut FieldErrors, destinations: &[DestinationInput]) {
    if destinations.len() < MIN_DESTINATIONS {
        errors.add("destinations", "An itinerary needs at least two destinations.");
    }
    for (index, destination) in destinations.iter().enumerate() {
        reject_blank(
            errors,
            &format!("destinations.{}.name", index),
            &destination.name,
            "The destination name is required (max 255 characters).",
        );
    }
}

/// Insert command handed to the repository
#[derive(Debug, Clone)]
pub struct NewItinerary {
    pub user_id: StringUuid,
    pub title: String,
    pub category: String,
    pub duration: i32,
    pub image_path: Option<String>,
    pub destinations: Vec<DestinationInput>,
}

/// What happens to the image column during an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    #[default]
    Keep,
    Replace(String),
    Clear,
}

/// Update command handed to the repository
#[derive(Debug, Clone, Default)]
pub struct ItineraryChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub duration: Option<i32>,
    pub image: ImageChange,
    pub destinations: Option<Vec<DestinationInput>>,
}

/// Browse filters, AND-combined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItineraryFilter {
    /// Exact match
    pub category: Option<String>,
    /// Exact match in days
    pub duration: Option<i32>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

/// Browse ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItinerarySort {
    /// Newest first
    #[default]
    Latest,
    /// Most favorited first, newest first among equals
    Popularity,
}

impl ItinerarySort {
    /// Anything other than `popularity` falls back to newest first.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("popularity") {
            ItinerarySort::Popularity
        } else {
            ItinerarySort::Latest
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DestinationView {
    #[schema(value_type = String, format = Uuid)]
    pub id: StringUuid,
    pub name: String,
    pub lodging: Option<String>,
    pub things_to_do: Option<String>,
}

impl From<Destination> for DestinationView {
    fn from(d: Destination) -> Self {
        Self {
            id: d.id,
            name: d.name,
            lodging: d.lodging,
            things_to_do: d.things_to_do,
        }
    }
}

/// Public itinerary representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItineraryView {
    #[schema(value_type = String, format = Uuid)]
    pub id: StringUuid,
    pub title: String,
    pub category: String,
    pub duration: i32,
    /// Absolute URL of the cover image
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
    pub destinations: Vec<DestinationView>,
    /// Whether the caller has this itinerary on their to-visit list
    pub is_favorited: bool,
    pub favorites_count: i64,
}

impl ItineraryView {
    pub fn build(
        details: ItineraryDetails,
        url_for: impl Fn(&str) -> String,
        is_favorited: bool,
    ) -> Self {
        let ItineraryDetails {
            record,
            destinations,
        } = details;
        Self {
            id: record.id,
            image_url: record.image_path.as_deref().map(url_for),
            title: record.title,
            category: record.category,
            duration: record.duration,
            created_at: record.created_at,
            updated_at: record.updated_at,
            user: UserSummary {
                id: record.user_id,
                name: record.owner_name,
            },
            destinations: destinations.into_iter().map(DestinationView::from).collect(),
            is_favorited,
            favorites_count: record.favorites_count,
        }
    }
}

/// One page of itineraries plus the total across all pages
#[derive(Debug, Clone)]
pub struct ItineraryPage {
    pub items: Vec<ItineraryView>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

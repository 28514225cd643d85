//! REST API shared utilities (response types, pagination, path ids)

pub mod auth;
pub mod favorite;
pub mod health;
pub mod itinerary;
pub mod itinerary_form;

use crate::domain::{ItineraryPage, ItineraryView, StringUuid};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Page query parameter shared by the listing endpoints
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PaginationQuery {
    pub fn page(&self) -> Result<u32> {
        parse_page(self.page.as_deref())
    }
}

/// Absent or empty means the first page; anything else must be an integer >= 1
pub(crate) fn parse_page(raw: Option<&str>) -> Result<u32> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| AppError::field("page", "The page must be a positive integer.")),
    }
}

/// Parse an `{id}` path segment; anything that is not a UUID cannot exist.
pub(crate) fn parse_id(raw: &str) -> Result<StringUuid> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Itinerary {} not found", raw)))
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    pub links: PageLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

/// Absolute URLs of neighbouring pages, preserving the active query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageLinks {
    pub first: Option<String>,
    pub last: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total.max(0) as f64 / per_page as f64).ceil() as u32
        };
        Self {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
            links: PageLinks::default(),
        }
    }

    /// Fill `links` for `base` (e.g. `http://host/itineraries`), carrying the
    /// non-page query parameters along.
    pub fn with_links(mut self, base: &str, params: &[(&str, &str)]) -> Self {
        let last_page = self.pagination.total_pages.max(1);
        let page = self.pagination.page;
        let url = |n: u32| page_url(base, params, n);

        self.links = PageLinks {
            first: Some(url(1)),
            last: Some(url(last_page)),
            prev: (page > 1).then(|| url((page - 1).min(last_page))),
            next: (page < last_page).then(|| url(page + 1)),
        };
        self
    }
}

impl PaginatedResponse<ItineraryView> {
    pub fn from_page(page: ItineraryPage) -> Self {
        Self::new(page.items, page.page, page.per_page, page.total)
    }
}

fn page_url(base: &str, params: &[(&str, &str)], page: u32) -> String {
    let mut query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    query.push(format!("page={}", page));
    format!("{}?{}", base, query.join("&"))
}

/// Success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Message response (for delete, etc.)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

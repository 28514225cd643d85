//! Itinerary API handlers

use crate::api::itinerary_form::ItineraryForm;
use crate::api::{parse_id, parse_page, MessageResponse, PaginatedResponse, SuccessResponse};
use crate::domain::{ItineraryFilter, ItinerarySort, ItineraryView};
use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, OptionalAuth};
use crate::policy::PolicyAction;
use crate::state::HasServices;
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Browse query parameters; empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams)]
pub struct BrowseQuery {
    /// Exact category
    pub category: Option<String>,
    /// Exact duration in days
    pub duration: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    /// `popularity` or `latest` (default)
    #[serde(alias = "sortBy")]
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl BrowseQuery {
    fn value<'a>(raw: &'a Option<String>) -> Option<&'a str> {
        raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn filter(&self) -> Result<ItineraryFilter> {
        let duration = match Self::value(&self.duration) {
            None => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| AppError::field("duration", "The duration must be an integer."))?,
            ),
        };

        Ok(ItineraryFilter {
            category: Self::value(&self.category).map(str::to_string),
            duration,
            search: Self::value(&self.search).map(str::to_string),
        })
    }

    pub fn sort(&self) -> ItinerarySort {
        Self::value(&self.sort)
            .map(ItinerarySort::parse)
            .unwrap_or_default()
    }

    pub fn page(&self) -> Result<u32> {
        parse_page(self.page.as_deref())
    }

    /// Active parameters (other than `page`) to carry into pagination links
    pub fn link_params(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", &self.category),
            ("duration", &self.duration),
            ("search", &self.search),
            ("sort", &self.sort),
        ]
        .into_iter()
        .filter_map(|(key, raw)| Self::value(raw).map(|value| (key, value)))
        .collect()
    }
}

fn collection_url<S: HasServices>(state: &S, path: &str) -> String {
    format!("{}{}", state.config().app_url.trim_end_matches('/'), path)
}

#[utoipa::path(
    get,
    path = "/itineraries",
    tag = "Itineraries",
    params(BrowseQuery),
    responses(
        (status = 200, description = "Paginated itineraries"),
        (status = 422, description = "Invalid filter value")
    )
)]
/// Browse, filter, search and sort all itineraries
pub async fn index<S: HasServices>(
    State(state): State<S>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<PaginatedResponse<ItineraryView>>> {
    let filter = query.filter()?;
    let page = query.page()?;

    let result = state
        .listing_service()
        .browse(&filter, query.sort(), page, viewer.as_ref())
        .await?;

    let base = collection_url(&state, "/itineraries");
    Ok(Json(
        PaginatedResponse::from_page(result).with_links(&base, &query.link_params()),
    ))
}

#[utoipa::path(
    get,
    path = "/itineraries/{id}",
    tag = "Itineraries",
    params(("id" = String, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Itinerary", body = ItineraryView),
        (status = 404, description = "Not found")
    )
)]
pub async fn show<S: HasServices>(
    State(state): State<S>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<ItineraryView>>> {
    let id = parse_id(&id)?;
    let view = state.listing_service().show(id, viewer.as_ref()).await?;
    Ok(Json(SuccessResponse::new(view)))
}

#[utoipa::path(
    post,
    path = "/itineraries",
    tag = "Itineraries",
    security(("bearer_jwt" = [])),
    responses(
        (status = 201, description = "Itinerary created", body = ItineraryView),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid payload")
    )
)]
/// Create an itinerary from a `multipart/form-data` body: `title`, `category`,
/// `duration`, `destinations[i][name|lodging|things_to_do]` and an optional
/// `image` file.
pub async fn store<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let decoded = ItineraryForm::read(multipart).await?.into_create();
    let service = state.itinerary_service();
    let semantic = service.check_create(&decoded.input, decoded.image.as_ref());
    let (input, image) = decoded.finish(semantic)?;

    let details = service.create(&auth, input, image).await?;
    let view = state.listing_service().present(details, Some(&auth)).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(view))))
}

#[utoipa::path(
    put,
    path = "/itineraries/{id}",
    tag = "Itineraries",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Itinerary updated", body = ItineraryView),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 422, description = "Invalid payload")
    )
)]
/// Update an itinerary the caller owns (also routed for PATCH).
///
/// Accepts any subset of the create fields plus `remove_image`; a
/// `destinations` list replaces the stored one entirely.
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SuccessResponse<ItineraryView>>> {
    let id = parse_id(&id)?;
    let service = state.itinerary_service();
    let target = service
        .authorize(&auth, id, PolicyAction::ItineraryUpdate)
        .await?;

    let decoded = ItineraryForm::read(multipart).await?.into_update();
    let semantic = service.check_update(&decoded.input, decoded.image.as_ref());
    let (input, image) = decoded.finish(semantic)?;

    let details = service.update(target, input, image).await?;
    let view = state.listing_service().present(details, Some(&auth)).await?;
    Ok(Json(SuccessResponse::new(view)))
}

#[utoipa::path(
    delete,
    path = "/itineraries/{id}",
    tag = "Itineraries",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Itinerary deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn destroy<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    let service = state.itinerary_service();
    let target = service
        .authorize(&auth, id, PolicyAction::ItineraryDelete)
        .await?;
    service.destroy(target).await?;
    Ok(Json(MessageResponse::new("Itinerary deleted successfully")))
}

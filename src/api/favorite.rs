//! To-visit list API handlers

use crate::api::{parse_id, MessageResponse, PaginatedResponse, PaginationQuery};
use crate::domain::ItineraryView;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/user/to-visit",
    tag = "To-visit",
    security(("bearer_jwt" = [])),
    params(("page" = Option<u32>, Query, description = "Page number, from 1")),
    responses(
        (status = 200, description = "Favorited itineraries, most recently added first"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn index<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ItineraryView>>> {
    let page = query.page()?;
    let result = state.listing_service().to_visit(&auth, page).await?;

    let base = format!(
        "{}/user/to-visit",
        state.config().app_url.trim_end_matches('/')
    );
    Ok(Json(PaginatedResponse::from_page(result).with_links(&base, &[])))
}

#[utoipa::path(
    post,
    path = "/user/to-visit/{id}",
    tag = "To-visit",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "On the list (added now or already present)", body = MessageResponse),
        (status = 404, description = "Itinerary not found")
    )
)]
pub async fn add<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.favorite_service().add(&auth, id).await?;
    Ok(Json(MessageResponse::new(
        "Itinerary added to your to-visit list",
    )))
}

#[utoipa::path(
    delete,
    path = "/user/to-visit/{id}",
    tag = "To-visit",
    security(("bearer_jwt" = [])),
    params(("id" = String, Path, description = "Itinerary id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 404, description = "Itinerary was not on the list")
    )
)]
pub async fn remove<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    let outcome = state.favorite_service().remove(&auth, id).await?;
    if !outcome.removed {
        return Err(AppError::NotFound(
            "This itinerary was not in your to-visit list".to_string(),
        ));
    }
    Ok(Json(MessageResponse::new(
        "Itinerary removed from your to-visit list",
    )))
}

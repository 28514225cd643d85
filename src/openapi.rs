//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates all handler path annotations and domain schemas into a single
//! OpenAPI specification, served through Swagger UI at `/swagger-ui`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Itinera Core API",
        version = "0.1.0",
        description = "Share multi-destination travel itineraries and keep a to-visit list",
        contact(name = "Itinera Team")
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Account", description = "Registration, login, logout and the current user"),
        (name = "Itineraries", description = "Browse, create, update and delete itineraries"),
        (name = "To-visit", description = "The authenticated user's favorited itineraries"),
    ),
    components(
        schemas(
            // ── Shared response types ──────────────────────────────────
            crate::api::PaginationQuery,
            crate::api::PaginationMeta,
            crate::api::PageLinks,
            crate::api::MessageResponse,
            crate::api::auth::TokenResponse,
            crate::api::health::HealthResponse,

            // ── Account ────────────────────────────────────────────────
            crate::domain::User,
            crate::domain::UserSummary,
            crate::domain::RegisterInput,
            crate::domain::LoginInput,

            // ── Itineraries ────────────────────────────────────────────
            crate::domain::ItineraryView,
            crate::domain::DestinationView,
            crate::domain::DestinationInput,
            crate::domain::ItinerarySort,
        )
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,

        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::me,

        crate::api::itinerary::index,
        crate::api::itinerary::show,
        crate::api::itinerary::store,
        crate::api::itinerary::update,
        crate::api::itinerary::destroy,

        crate::api::favorite::index,
        crate::api::favorite::add,
        crate::api::favorite::remove,
    ),
)]
pub struct ApiDoc;

/// Security scheme definition added via modify
impl ApiDoc {
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        // Add Bearer JWT security scheme
        if let Some(c) = doc.components.as_mut() {
            c.security_schemes.insert(
                "bearer_jwt".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}

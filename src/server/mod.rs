//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::openapi::ApiDoc;
use crate::repository::{
    access_token::AccessTokenRepositoryImpl, favorite::FavoriteRepositoryImpl,
    itinerary::ItineraryRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{AuthService, FavoriteService, ItineraryService, ListingService};
use crate::state::HasServices;
use crate::storage::LocalImageStore;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

/// Room left in a request body for the text fields next to an image
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub auth_service: Arc<AuthService<UserRepositoryImpl, AccessTokenRepositoryImpl>>,
    pub itinerary_service: Arc<ItineraryService<ItineraryRepositoryImpl, LocalImageStore>>,
    pub favorite_service: Arc<FavoriteService<FavoriteRepositoryImpl, ItineraryRepositoryImpl>>,
    pub listing_service:
        Arc<ListingService<ItineraryRepositoryImpl, FavoriteRepositoryImpl, LocalImageStore>>,
}

/// Implement HasServices trait for production AppState
impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type TokenRepo = AccessTokenRepositoryImpl;
    type ItineraryRepo = ItineraryRepositoryImpl;
    type FavoriteRepo = FavoriteRepositoryImpl;
    type Images = LocalImageStore;

    fn config(&self) -> &Config {
        &self.config
    }

    fn auth_service(&self) -> &AuthService<Self::UserRepo, Self::TokenRepo> {
        &self.auth_service
    }

    fn itinerary_service(&self) -> &ItineraryService<Self::ItineraryRepo, Self::Images> {
        &self.itinerary_service
    }

    fn favorite_service(&self) -> &FavoriteService<Self::FavoriteRepo, Self::ItineraryRepo> {
        &self.favorite_service
    }

    fn listing_service(
        &self,
    ) -> &ListingService<Self::ItineraryRepo, Self::FavoriteRepo, Self::Images> {
        &self.listing_service
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .is_ok()
    }
}

impl AppState {
    /// Wire repositories and services over an existing pool
    pub fn new(config: Config, db_pool: MySqlPool) -> Self {
        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let token_repo = Arc::new(AccessTokenRepositoryImpl::new(db_pool.clone()));
        let itinerary_repo = Arc::new(ItineraryRepositoryImpl::new(db_pool.clone()));
        let favorite_repo = Arc::new(FavoriteRepositoryImpl::new(db_pool.clone()));

        let images = Arc::new(LocalImageStore::new(
            config.storage.root.clone(),
            config.image_base_url(),
        ));

        let auth_service = Arc::new(AuthService::new(
            user_repo,
            token_repo,
            JwtManager::new(config.jwt.clone()),
        ));
        let itinerary_service = Arc::new(ItineraryService::new(
            itinerary_repo.clone(),
            images.clone(),
            config.storage.max_image_bytes,
        ));
        let favorite_service = Arc::new(FavoriteService::new(
            favorite_repo.clone(),
            itinerary_repo.clone(),
        ));
        let listing_service = Arc::new(ListingService::new(
            itinerary_repo,
            favorite_repo,
            images,
            config.itineraries_per_page,
        ));

        Self {
            config: Arc::new(config),
            db_pool,
            auth_service,
            itinerary_service,
            favorite_service,
            listing_service,
        }
    }
}

/// Run the server
pub async fn run(config: Config) -> Result<()> {
    // Create database connection pool
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    info!("Connected to database");

    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .with_context(|| {
            format!(
                "Failed to create storage root {}",
                config.storage.root.display()
            )
        })?;

    let http_addr = config.http_addr();
    let mount = config.storage_mount_path();
    let storage_root = config.storage.root.clone();

    let state = AppState::new(config, db_pool);
    let mut app = build_router(state);
    if mount != "/" {
        app = app.nest_service(&mount, ServeDir::new(storage_root));
    }

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router
pub fn build_router<S: HasServices>(state: S) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Oversized images must reach the form decoder so they are reported as
    // a field error rather than a bare 413.
    let body_limit = state.config().storage.max_image_bytes * 2 + FORM_OVERHEAD_BYTES;

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Account
        .route("/register", post(api::auth::register::<S>))
        .route("/login", post(api::auth::login::<S>))
        .route("/logout", post(api::auth::logout::<S>))
        .route("/user", get(api::auth::me::<S>))
        // To-visit list
        .route("/user/to-visit", get(api::favorite::index::<S>))
        .route(
            "/user/to-visit/{id}",
            post(api::favorite::add::<S>).delete(api::favorite::remove::<S>),
        )
        // Itineraries
        .route(
            "/itineraries",
            get(api::itinerary::index::<S>).post(api::itinerary::store::<S>),
        )
        .route(
            "/itineraries/{id}",
            get(api::itinerary::show::<S>)
                .put(api::itinerary::update::<S>)
                .patch(api::itinerary::update::<S>)
                .delete(api::itinerary::destroy::<S>),
        )
        // API documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::build()))
        // Add middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

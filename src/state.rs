//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router runs against
//! the production `AppState` and the in-memory state used by the HTTP tests.

use crate::config::Config;
use crate::repository::{
    AccessTokenRepository, FavoriteRepository, ItineraryRepository, UserRepository,
};
use crate::service::{AuthService, FavoriteService, ItineraryService, ListingService};
use crate::storage::ImageStore;

/// Access to every service a handler may need.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The user repository type
    type UserRepo: UserRepository;
    /// The personal access token repository type
    type TokenRepo: AccessTokenRepository;
    /// The itinerary repository type
    type ItineraryRepo: ItineraryRepository;
    /// The favorites repository type
    type FavoriteRepo: FavoriteRepository;
    /// The image blob store type
    type Images: ImageStore;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Registration, login and token checks
    fn auth_service(&self) -> &AuthService<Self::UserRepo, Self::TokenRepo>;

    /// Itinerary create/update/destroy
    fn itinerary_service(&self) -> &ItineraryService<Self::ItineraryRepo, Self::Images>;

    /// To-visit list mutations
    fn favorite_service(&self) -> &FavoriteService<Self::FavoriteRepo, Self::ItineraryRepo>;

    /// Browse, to-visit listing and presentation
    fn listing_service(
        &self,
    ) -> &ListingService<Self::ItineraryRepo, Self::FavoriteRepo, Self::Images>;

    /// Check whether the database is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}

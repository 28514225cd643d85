//! Business logic layer

pub mod auth;
pub mod favorite;
pub mod itinerary;
pub mod listing;

pub use auth::{AuthService, IssuedToken};
pub use favorite::FavoriteService;
pub use itinerary::ItineraryService;
pub use listing::ListingService;

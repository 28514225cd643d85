//! Data access layer (Repository pattern)

pub mod access_token;
pub mod favorite;
pub mod itinerary;
pub mod user;

pub use access_token::AccessTokenRepository;
pub use favorite::FavoriteRepository;
pub use itinerary::ItineraryRepository;
pub use user::UserRepository;

//! Domain models for Itinera Core

pub mod common;
pub mod favorite;
pub mod itinerary;
pub mod user;

pub use common::*;
pub use favorite::*;
pub use itinerary::*;
pub use user::*;

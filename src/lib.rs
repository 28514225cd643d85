//! Itinera Core - itinerary sharing service backend
//!
//! REST API for publishing multi-destination itineraries, browsing and
//! searching them, and keeping a personal to-visit list.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};

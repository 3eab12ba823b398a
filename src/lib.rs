// Social feed backend: follow graph and feed composition

// Core types and primitives
pub mod core;

// Data model shared by the services and the HTTP surface
pub mod models;

// Database, caching, collaborators and request context
pub mod infrastructure;

// Follow graph and feed services
pub mod services;

// Application wiring
pub mod app_state;
pub mod config;
pub mod http_interface;

// Common utilities
pub mod error;
pub mod data_seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};

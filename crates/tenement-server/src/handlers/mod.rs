//! HTTP request handlers for API endpoints.

pub mod health;
pub mod progress;
pub mod sync;

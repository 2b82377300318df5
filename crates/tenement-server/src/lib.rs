//! Tenement Server - REST API for the tenement sync pipeline
//!
//! This crate exposes the sync pipeline over HTTP:
//!
//! - **Sync**: run one jurisdiction or all enabled jurisdictions
//! - **Progress**: poll or overwrite a jurisdiction's progress snapshot
//! - **Health**: server and database status
//!
//! # API Documentation
//!
//! When running the server, the OpenAPI document is served at
//! `/api-docs/openapi.json`.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;

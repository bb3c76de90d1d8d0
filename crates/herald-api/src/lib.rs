//! # herald-api
//!
//! HTTP layer for Herald built on Axum: the `/ws` upgrade that hosts live
//! connections, the REST fallback under `/api`, extractors, DTOs, and error
//! mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, open_stores};
pub use error::ApiError;
pub use state::AppState;

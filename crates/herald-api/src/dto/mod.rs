//! Request and response bodies for the REST fallback.

pub mod response;

pub use response::{ApiResponse, CountResponse, HealthResponse};

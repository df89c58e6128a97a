//! HTTP surface for the dashboard frontend
//!
//! Thin glue over the orchestrator and filter controller; no aggregation
//! logic lives here.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_api_router;

//! HTTP API layer for mindful.
//!
//! - **Endpoints**: mood journal, analytics, insights and support groups
//! - **Auth**: bearer token verification and the [`extractors::AuthUser`] extractor
//! - **Middleware**: application state and token middleware
//!
//! Built on Axum 0.8.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;

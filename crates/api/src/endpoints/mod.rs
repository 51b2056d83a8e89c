//! API endpoints.

pub mod health;
mod mood;
mod support_groups;

use axum::Router;

use crate::middleware::AppState;

pub use health::health;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/mood", mood::router())
        .nest("/support-groups", support_groups::router())
}

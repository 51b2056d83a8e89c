//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use mindful_core::{AnalyticsService, MoodService, SupportGroupService};

use crate::auth::TokenVerifier;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Journal writes and listings.
    pub mood_service: MoodService,
    /// Analytics and insights.
    pub analytics_service: AnalyticsService,
    /// Group registry and membership ledger.
    pub support_group_service: SupportGroupService,
    /// Access token verification.
    pub tokens: TokenVerifier,
}

/// Authentication middleware.
///
/// Attaches the verified [`crate::auth::CurrentUser`] to the request. Missing
/// or invalid tokens pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.tokens.verify(token.trim())
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

//! Mood journal endpoints.

use axum::{Router, extract::State, routing::get};
use mindful_common::AppResult;
use mindful_core::services::analytics::{AnalyticsQuery, InsightQuery, MoodAnalytics};
use mindful_core::services::insight::Insights;
use mindful_core::services::mood::{MoodEntryResponse, SubmitMoodEntryInput};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, JsonBody, QueryParams},
    middleware::AppState,
    response::ApiResponse,
};

/// Query for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub limit: Option<u64>,
}

/// Submit a mood entry.
async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SubmitMoodEntryInput>,
) -> AppResult<ApiResponse<MoodEntryResponse>> {
    let entry = state.mood_service.submit(&user.id, input).await?;

    Ok(ApiResponse::created(entry.into()))
}

/// List recent entries, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListEntriesQuery>,
) -> AppResult<ApiResponse<Vec<MoodEntryResponse>>> {
    let entries = state.mood_service.list(&user.id, query.limit).await?;

    Ok(ApiResponse::ok(entries.into_iter().map(Into::into).collect()))
}

/// Aggregated analytics for a window.
async fn analytics(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AnalyticsQuery>,
) -> AppResult<ApiResponse<MoodAnalytics>> {
    let analytics = state.analytics_service.get_analytics(&user.id, &query).await?;

    Ok(ApiResponse::ok(analytics))
}

/// Patterns and suggestions for a window.
async fn insights(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<InsightQuery>,
) -> AppResult<ApiResponse<Insights>> {
    let insights = state.analytics_service.get_insights(&user.id, &query).await?;

    Ok(ApiResponse::ok(insights))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/analytics", get(analytics))
        .route("/insights", get(insights))
}

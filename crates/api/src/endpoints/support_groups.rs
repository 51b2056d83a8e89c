//! Support group endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use mindful_common::AppResult;
use mindful_core::services::support_group::{
    CreateSupportGroupInput, GroupRecommendation, JoinGroupResponse, LeaveGroupResponse,
    SupportGroupResponse,
};

use crate::{
    extractors::{AuthUser, JsonBody},
    middleware::AppState,
    response::ApiResponse,
};

/// List all active groups.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<SupportGroupResponse>>> {
    let groups = state.support_group_service.list_all().await?;

    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

/// Create a group facilitated by the caller.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateSupportGroupInput>,
) -> AppResult<ApiResponse<SupportGroupResponse>> {
    let group = state.support_group_service.create(&user.id, input).await?;

    Ok(ApiResponse::created(group.into()))
}

/// Deactivate a group the caller facilitates.
async fn deactivate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<SupportGroupResponse>> {
    let group = state
        .support_group_service
        .deactivate(&user.id, &group_id)
        .await?;

    Ok(ApiResponse::ok(group.into()))
}

/// List groups the caller has joined.
async fn joined(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<SupportGroupResponse>>> {
    let groups = state.support_group_service.list_for_user(&user.id).await?;

    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

/// Groups ranked against the caller's recent emotions.
async fn recommended(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupRecommendation>>> {
    let ranked = state.support_group_service.recommend(&user.id).await?;

    Ok(ApiResponse::ok(ranked))
}

/// Join a group.
async fn join(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<JoinGroupResponse>> {
    let joined = state.support_group_service.join(&user.id, &group_id).await?;

    Ok(ApiResponse::created(joined))
}

/// Leave a group.
async fn leave(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<ApiResponse<LeaveGroupResponse>> {
    let left = state.support_group_service.leave(&user.id, &group_id).await?;

    Ok(ApiResponse::ok(left))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/user", get(joined))
        .route("/recommended", get(recommended))
        .route("/{id}/join", post(join))
        .route("/{id}/leave", post(leave))
        .route("/{id}/deactivate", post(deactivate))
}

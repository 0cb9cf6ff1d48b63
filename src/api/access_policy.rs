//! Access policy API handlers

use crate::api::SuccessResponse;
use crate::domain::{CreateAccessPoliciesInput, StringUuid};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// Create access policies on a project
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateAccessPoliciesInput>,
) -> Result<impl IntoResponse> {
    input.validate()?;

    let project_id = StringUuid::from(project_id);
    let policies = input.into_policies(project_id);
    let created = state
        .access_policy_service()
        .create_for_project(project_id, policies, auth.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(created))))
}

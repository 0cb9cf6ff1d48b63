//! Secrets Manager import/export handlers

use crate::api::SuccessResponse;
use crate::domain::{SmImport, StringUuid};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

pub async fn export<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(organization_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let export = state
        .porting_service()
        .export(
            StringUuid::from(organization_id),
            auth.user_id,
            auth.client_type,
            &query.format,
        )
        .await?;

    Ok(Json(SuccessResponse::new(export)))
}

pub async fn import<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<SmImport>,
) -> Result<impl IntoResponse> {
    let summary = state
        .porting_service()
        .import(StringUuid::from(organization_id), auth.user_id, payload)
        .await?;

    Ok(Json(SuccessResponse::new(summary)))
}

//! Patient CRUD.

use axum::{
    Json,
    extract::{Path, State},
};
use reflab_auth::{BearerAuth, policy};
use reflab_storage::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::DEFAULT_LIST_CAP;
use crate::error::ApiError;
use crate::state::AppState;

use super::{apply_patch, fetch, parse_id, to_patch_map};

pub const COLLECTION: &str = "patient";
const RESOURCE: &str = "patient";

/// Create payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct PatientIn {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Deserialize, Serialize)]
pub struct PatientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Json(body): Json<PatientIn>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::PATIENT_WRITE)?;
    let doc = state
        .store
        .insert(COLLECTION, serde_json::to_value(&body).map_err(reflab_core::CoreError::from)?)
        .await?;
    tracing::info!(patient_id = %doc.id, "Patient created");
    Ok(Json(doc.public_projection()))
}

pub async fn list(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::RESOURCE_READ)?;
    let docs = state
        .store
        .list(COLLECTION, &SortOrder::desc("created_at"), DEFAULT_LIST_CAP)
        .await?;
    Ok(Json(Value::Array(
        docs.iter().map(|d| d.public_projection()).collect(),
    )))
}

pub async fn get(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::RESOURCE_READ)?;
    let id = parse_id(&id)?;
    let doc = fetch(state.store.as_ref(), COLLECTION, RESOURCE, &id).await?;
    Ok(Json(doc.public_projection()))
}

pub async fn update(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Path(id): Path<String>,
    Json(patch): Json<PatientPatch>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::PATIENT_WRITE)?;
    let id = parse_id(&id)?;
    let doc = apply_patch(
        state.store.as_ref(),
        COLLECTION,
        RESOURCE,
        &id,
        to_patch_map(&patch)?,
    )
    .await?;
    Ok(Json(doc.public_projection()))
}

pub async fn delete(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::PATIENT_DELETE)?;
    let id = parse_id(&id)?;
    // Idempotent: deleting an absent patient still succeeds.
    let removed = state.store.delete(COLLECTION, &id).await?;
    if removed {
        tracing::info!(patient_id = %id, "Patient deleted");
    }
    Ok(Json(json!({ "ok": true })))
}

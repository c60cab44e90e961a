//! Test catalog CRUD.
//!
//! Catalog codes are a business convention, not a stored constraint; two
//! entries may share a code.

use axum::{
    Json,
    extract::{Path, State},
};
use reflab_auth::{BearerAuth, policy};
use reflab_storage::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::CATALOG_LIST_CAP;
use crate::error::ApiError;
use crate::state::AppState;

use super::{apply_patch, fetch, parse_id, to_patch_map};

pub const COLLECTION: &str = "testcatalog";
const RESOURCE: &str = "test";

/// Create payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogIn {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Turnaround time in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tat_hours: Option<i64>,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tat_hours: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Json(body): Json<CatalogIn>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::CATALOG_WRITE)?;
    let doc = state
        .store
        .insert(COLLECTION, serde_json::to_value(&body).map_err(reflab_core::CoreError::from)?)
        .await?;
    tracing::info!(test_id = %doc.id, code = %body.code, "Catalog entry created");
    Ok(Json(doc.public_projection()))
}

pub async fn list(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::RESOURCE_READ)?;
    let docs = state
        .store
        .list(COLLECTION, &SortOrder::asc("name"), CATALOG_LIST_CAP)
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
    Json(patch): Json<CatalogPatch>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::CATALOG_WRITE)?;
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
    ctx.require_any(policy::CATALOG_DELETE)?;
    let id = parse_id(&id)?;
    let removed = state.store.delete(COLLECTION, &id).await?;
    if removed {
        tracing::info!(test_id = %id, "Catalog entry deleted");
    }
    Ok(Json(json!({ "ok": true })))
}

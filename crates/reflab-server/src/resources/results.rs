//! Test result recording and verification.
//!
//! A result moving to `verified` gets reviewer attribution: when the patch
//! does not name a reviewer, `reviewed_by` defaults to the caller and
//! `reviewed_at` to now.

use axum::{
    Json,
    extract::{Path, State},
};
use reflab_auth::{BearerAuth, policy};
use reflab_core::ResultStatus;
use reflab_storage::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::DEFAULT_LIST_CAP;
use crate::error::ApiError;
use crate::state::AppState;

use super::{apply_patch, fetch, parse_id, to_patch_map};

pub const COLLECTION: &str = "testresult";
const RESOURCE: &str = "result";

/// Create payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResultIn {
    pub referral_id: String,
    pub test_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(default)]
    pub status: ResultStatus,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResultPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResultStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Json(body): Json<ResultIn>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::RESULT_CREATE)?;
    let doc = state
        .store
        .insert(COLLECTION, serde_json::to_value(&body).map_err(reflab_core::CoreError::from)?)
        .await?;
    tracing::info!(
        result_id = %doc.id,
        referral_id = %body.referral_id,
        test_code = %body.test_code,
        "Result recorded"
    );
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
    Json(mut patch): Json<ResultPatch>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::RESULT_UPDATE)?;
    let id = parse_id(&id)?;

    if let Some(next) = patch.status {
        let current = fetch(state.store.as_ref(), COLLECTION, RESOURCE, &id).await?;
        let current_status = current
            .field_str("status")
            .and_then(|s| s.parse::<ResultStatus>().ok());

        if !state.config.allow_freeform_status
            && let Some(from) = current_status
        {
            from.transition(next)?;
        }

        // Entering verified stamps reviewer attribution if the client
        // didn't supply it.
        if next == ResultStatus::Verified && current_status != Some(ResultStatus::Verified) {
            if patch.reviewed_by.is_none() {
                patch.reviewed_by = Some(ctx.user_id().to_string());
            }
            if patch.reviewed_at.is_none() {
                patch.reviewed_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();
            }
        }
    }

    let doc = apply_patch(
        state.store.as_ref(),
        COLLECTION,
        RESOURCE,
        &id,
        to_patch_map(&patch)?,
    )
    .await?;
    if let Some(status) = patch.status {
        tracing::info!(result_id = %id, status = %status, "Result status updated");
    }
    Ok(Json(doc.public_projection()))
}

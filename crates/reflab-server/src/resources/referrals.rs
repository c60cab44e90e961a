//! Referral intake and lifecycle.
//!
//! New referrals always start at `pending`; `ordered_by` defaults to the
//! caller when the payload leaves it out. Status changes on update follow
//! the forward-only transition table unless the server runs in free-form
//! status mode.

use axum::{
    Json,
    extract::{Path, State},
};
use reflab_auth::{BearerAuth, policy};
use reflab_core::{Priority, ReferralStatus};
use reflab_storage::SortOrder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_LIST_CAP;
use crate::error::ApiError;
use crate::state::AppState;

use super::{apply_patch, fetch, parse_id, to_patch_map};

pub const COLLECTION: &str = "referral";
const RESOURCE: &str = "referral";

/// Create payload. Status is not accepted at intake; every referral starts
/// at `pending`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReferralIn {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    /// Requesting user id; defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
    /// Test codes from the catalog.
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReferralPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReferralStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Json(mut body): Json<ReferralIn>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::REFERRAL_CREATE)?;
    if body.ordered_by.is_none() {
        body.ordered_by = Some(ctx.user_id().to_string());
    }

    let mut doc_body = serde_json::to_value(&body).map_err(reflab_core::CoreError::from)?;
    if let Value::Object(map) = &mut doc_body {
        map.insert(
            "status".to_string(),
            serde_json::to_value(ReferralStatus::Pending).map_err(reflab_core::CoreError::from)?,
        );
    }

    let doc = state.store.insert(COLLECTION, doc_body).await?;
    tracing::info!(
        referral_id = %doc.id,
        patient_id = %body.patient_id,
        priority = %body.priority,
        "Referral created"
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
    Json(patch): Json<ReferralPatch>,
) -> Result<Json<Value>, ApiError> {
    ctx.require_any(policy::REFERRAL_UPDATE)?;
    let id = parse_id(&id)?;

    if let Some(next) = patch.status
        && !state.config.allow_freeform_status
    {
        let current = fetch(state.store.as_ref(), COLLECTION, RESOURCE, &id).await?;
        // Documents written in free-form mode may carry a status outside the
        // table; those are left unvalidated rather than bricked.
        if let Some(current_status) = current
            .field_str("status")
            .and_then(|s| s.parse::<ReferralStatus>().ok())
        {
            current_status.transition(next)?;
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
        tracing::info!(referral_id = %id, status = %status, "Referral status updated");
    }
    Ok(Json(doc.public_projection()))
}

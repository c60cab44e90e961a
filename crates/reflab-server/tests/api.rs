//! End-to-end API tests driving the router directly.

use assert_json_diff::assert_json_include;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use reflab_auth::config::{AuthConfig, BootstrapConfig};
use reflab_server::{AppConfig, build_app, state::AppState};
use reflab_storage::DocumentStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const BOOTSTRAP_SECRET: &str = "test-bootstrap-secret";

fn test_config() -> AppConfig {
    AppConfig {
        auth: AuthConfig {
            secret: "integration-test-secret".into(),
            token_ttl_minutes: 720,
            bootstrap: BootstrapConfig {
                secret: Some(BOOTSTRAP_SECRET.into()),
                ..BootstrapConfig::default()
            },
        },
        ..AppConfig::default()
    }
}

fn app() -> Router {
    let store: Arc<dyn DocumentStore> = Arc::new(reflab_db_memory::MemoryDocumentStore::new());
    build_app(AppState::new(test_config(), store))
}

fn app_with_freeform_status() -> Router {
    let config = AppConfig {
        allow_freeform_status: true,
        ..test_config()
    };
    let store: Arc<dyn DocumentStore> = Arc::new(reflab_db_memory::MemoryDocumentStore::new());
    build_app(AppState::new(config, store))
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Seeds the admin and logs in, returning the admin's bearer token.
async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/seed-admin",
        None,
        Some(json!({ "secret": BOOTSTRAP_SECRET, "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin seeded");

    login(app, "admin@lab.local", "admin123").await
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let form = format!(
        "username={}&password={}",
        urlencode(email),
        urlencode(password)
    );
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

fn urlencode(s: &str) -> String {
    s.replace('@', "%40").replace('+', "%2B")
}

/// Registers a user with the given role and returns their bearer token.
async fn user_token(app: &Router, admin: &str, email: &str, role: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        Some(admin),
        Some(json!({
            "name": "Test User",
            "email": email,
            "password": "hunter22",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    login(app, email, "hunter22").await
}

// =============================================================================
// Health and probe
// =============================================================================

#[tokio::test]
async fn test_liveness() {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn test_store_probe() {
    let app = app();
    let _admin = admin_token(&app).await;

    let (status, body) = send(&app, "GET", "/test", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connection_status"], "connected");
    assert_eq!(body["store"], "memory");
    // Seeding the admin created the user collection.
    assert!(
        body["collections"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c == "user")
    );
}

// =============================================================================
// Auth flow
// =============================================================================

#[tokio::test]
async fn test_seed_admin_is_idempotent_and_secret_gated() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/auth/seed-admin",
        None,
        Some(json!({ "secret": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let _token = admin_token(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/seed-admin",
        None,
        Some(json!({ "secret": BOOTSTRAP_SECRET })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin exists");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_seed_admin_disabled_without_configured_secret() {
    let config = AppConfig {
        auth: AuthConfig {
            secret: "s".into(),
            token_ttl_minutes: 720,
            bootstrap: BootstrapConfig::default(),
        },
        ..AppConfig::default()
    };
    let store: Arc<dyn DocumentStore> = Arc::new(reflab_db_memory::MemoryDocumentStore::new());
    let app = build_app(AppState::new(config, store));

    let (status, _) = send(
        &app,
        "POST",
        "/auth/seed-admin",
        None,
        Some(json!({ "secret": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_requires_admin() {
    let app = app();
    let admin = admin_token(&app).await;
    let viewer = user_token(&app, &admin, "viewer@lab.test", "viewer").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        Some(&viewer),
        Some(json!({
            "name": "X",
            "email": "x@lab.test",
            "password": "pw",
            "role": "viewer",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = app();
    let admin = admin_token(&app).await;
    let _ = user_token(&app, &admin, "dup@lab.test", "viewer").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        Some(&admin),
        Some(json!({
            "name": "Again",
            "email": "dup@lab.test",
            "password": "pw",
            "role": "lab_tech",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let app = app();
    let _admin = admin_token(&app).await;

    let form = "username=admin%40lab.local&password=wrong";
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "incorrect email or password");
}

#[tokio::test]
async fn test_me_returns_public_projection() {
    let app = app();
    let admin = admin_token(&app).await;

    let (status, body) = send(&app, "GET", "/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_json_include!(
        actual: body.clone(),
        expected: json!({
            "email": "admin@lab.local",
            "role": "admin",
            "is_active": true,
        })
    );
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_missing_token_is_challenged() {
    let app = app();
    let request = Request::builder()
        .method("GET")
        .uri("/patients")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let www = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(www.starts_with("Bearer"));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let app = app();
    let mut token = admin_token(&app).await;
    token.push('x');
    let (status, _) = send(&app, "GET", "/patients", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Patients
// =============================================================================

#[tokio::test]
async fn test_patient_crud_roundtrip() {
    let app = app();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "staff@lab.test", "hospital_staff").await;

    let (status, created) = send(
        &app,
        "POST",
        "/patients",
        Some(&staff),
        Some(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "gender": "female",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["first_name"], "Ada");
    assert!(created["created_at"].is_string());

    let (status, fetched) = send(&app, "GET", &format!("/patients/{id}"), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["last_name"], "Lovelace");

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/patients/{id}"),
        Some(&staff),
        Some(json!({ "phone": "555-0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "555-0100");
    // The partial update left other fields alone.
    assert_eq!(updated["first_name"], "Ada");
    assert_eq!(updated["id"], id);

    // Delete is admin-only.
    let (status, _) = send(&app, "DELETE", &format!("/patients/{id}"), Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &format!("/patients/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    // Idempotent: a second delete still succeeds.
    let (status, body) = send(&app, "DELETE", &format!("/patients/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = send(&app, "GET", &format!("/patients/{id}"), Some(&staff), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_is_read_only() {
    let app = app();
    let admin = admin_token(&app).await;
    let viewer = user_token(&app, &admin, "ro@lab.test", "viewer").await;

    let (status, _) = send(&app, "GET", "/patients", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/patients",
        Some(&viewer),
        Some(json!({ "first_name": "A", "last_name": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_id_is_a_client_error() {
    let app = app();
    let admin = admin_token(&app).await;
    let (status, _) = send(&app, "GET", "/patients/not-a-uuid", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_patient_is_not_found() {
    let app = app();
    let admin = admin_token(&app).await;
    let ghost = uuid::Uuid::new_v4();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/patients/{ghost}"),
        Some(&admin),
        Some(json!({ "phone": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Test catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_write_roles_and_name_sort() {
    let app = app();
    let admin = admin_token(&app).await;
    let tech = user_token(&app, &admin, "tech@lab.test", "lab_tech").await;
    let staff = user_token(&app, &admin, "hs@lab.test", "hospital_staff").await;

    // Hospital staff may not write the catalog.
    let (status, _) = send(
        &app,
        "POST",
        "/tests",
        Some(&staff),
        Some(json!({ "code": "GLU", "name": "Glucose" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for (code, name) in [("GLU", "Glucose"), ("ALB", "Albumin"), ("CBC", "Complete Blood Count")] {
        let (status, _) = send(
            &app,
            "POST",
            "/tests",
            Some(&tech),
            Some(json!({ "code": code, "name": name, "tat_hours": 24 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, listed) = send(&app, "GET", "/tests", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Albumin", "Complete Blood Count", "Glucose"]);
}

#[tokio::test]
async fn test_catalog_delete_is_admin_only() {
    let app = app();
    let admin = admin_token(&app).await;
    let tech = user_token(&app, &admin, "tech2@lab.test", "lab_tech").await;

    let (_, created) = send(
        &app,
        "POST",
        "/tests",
        Some(&tech),
        Some(json!({ "code": "NA", "name": "Sodium" })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/tests/{id}"), Some(&tech), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/tests/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Referrals
// =============================================================================

#[tokio::test]
async fn test_referral_create_defaults() {
    let app = app();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "ord@lab.test", "hospital_staff").await;

    let (_, me) = send(&app, "GET", "/auth/me", Some(&staff), None).await;

    let (status, created) = send(
        &app,
        "POST",
        "/referrals",
        Some(&staff),
        Some(json!({
            "patient_id": "p-1",
            "tests": ["GLU", "CBC"],
            "priority": "high",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["ordered_by"], me["id"]);
    assert_eq!(created["priority"], "high");
}

#[tokio::test]
async fn test_referral_status_machine() {
    let app = app();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "sm@lab.test", "hospital_staff").await;
    let tech = user_token(&app, &admin, "smt@lab.test", "lab_tech").await;

    let (_, created) = send(
        &app,
        "POST",
        "/referrals",
        Some(&staff),
        Some(json!({ "patient_id": "p-2" })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    // Hospital staff cannot update referrals.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/referrals/{id}"),
        Some(&staff),
        Some(json!({ "status": "received" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Skipping ahead is rejected.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/referrals/{id}"),
        Some(&tech),
        Some(json!({ "status": "reported" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid");

    // Stepping forward works, one stage at a time.
    for next in ["received", "in_progress", "completed", "reported"] {
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/referrals/{id}"),
            Some(&tech),
            Some(json!({ "status": next })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "transition to {next}");
        assert_eq!(updated["status"], next);
    }

    // And regression is rejected.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/referrals/{id}"),
        Some(&tech),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_freeform_status_mode_skips_validation() {
    let app = app_with_freeform_status();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "ff@lab.test", "hospital_staff").await;

    let (_, created) = send(
        &app,
        "POST",
        "/referrals",
        Some(&staff),
        Some(json!({ "patient_id": "p-3" })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // pending -> reported directly, allowed in free-form mode.
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/referrals/{id}"),
        Some(&admin),
        Some(json!({ "status": "reported" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "reported");
}

#[tokio::test]
async fn test_unknown_status_value_is_rejected() {
    let app = app();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "us@lab.test", "hospital_staff").await;

    let (_, created) = send(
        &app,
        "POST",
        "/referrals",
        Some(&staff),
        Some(json!({ "patient_id": "p-4" })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // "done" is not in the status vocabulary; deserialization fails.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/referrals/{id}"),
        Some(&admin),
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// Results
// =============================================================================

#[tokio::test]
async fn test_result_lifecycle_and_reviewer_stamp() {
    let app = app();
    let admin = admin_token(&app).await;
    let tech = user_token(&app, &admin, "rt@lab.test", "lab_tech").await;

    let (status, created) = send(
        &app,
        "POST",
        "/results",
        Some(&tech),
        Some(json!({
            "referral_id": "r-1",
            "test_code": "GLU",
            "value": "5.2",
            "unit": "mmol/L",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_string();

    // pending -> verified skips a stage.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/results/{id}"),
        Some(&tech),
        Some(json!({ "status": "verified" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/results/{id}"),
        Some(&tech),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = send(&app, "GET", "/auth/me", Some(&tech), None).await;
    let (status, verified) = send(
        &app,
        "PUT",
        &format!("/results/{id}"),
        Some(&tech),
        Some(json!({ "status": "verified" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["status"], "verified");
    // Reviewer attribution was stamped from the caller.
    assert_eq!(verified["reviewed_by"], me["id"]);
    assert!(verified["reviewed_at"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_result_explicit_reviewer_is_kept() {
    let app = app();
    let admin = admin_token(&app).await;
    let tech = user_token(&app, &admin, "rt2@lab.test", "lab_tech").await;

    let (_, created) = send(
        &app,
        "POST",
        "/results",
        Some(&tech),
        Some(json!({ "referral_id": "r-2", "test_code": "NA", "status": "completed" })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, verified) = send(
        &app,
        "PUT",
        &format!("/results/{id}"),
        Some(&tech),
        Some(json!({ "status": "verified", "reviewed_by": "dr-house" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["reviewed_by"], "dr-house");
}

#[tokio::test]
async fn test_result_create_requires_lab_role() {
    let app = app();
    let admin = admin_token(&app).await;
    let staff = user_token(&app, &admin, "nr@lab.test", "hospital_staff").await;

    let (status, _) = send(
        &app,
        "POST",
        "/results",
        Some(&staff),
        Some(json!({ "referral_id": "r-3", "test_code": "GLU" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lists_are_newest_first() {
    let app = app();
    let admin = admin_token(&app).await;

    for n in 0..3 {
        let (status, _) = send(
            &app,
            "POST",
            "/patients",
            Some(&admin),
            Some(json!({ "first_name": format!("P{n}"), "last_name": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Distinct creation instants for a deterministic sort.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, listed) = send(&app, "GET", "/patients", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["P2", "P1", "P0"]);
}

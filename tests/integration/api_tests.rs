//! API integration tests
//!
//! Health, site catalogue and the token and role guards.

use axum::http::StatusCode;
use uuid::Uuid;

use nic_intranet::models::Role;

use crate::common::{generate_test_token, home_site, TestApp};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_endpoint() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health/detailed").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["components"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_and_readiness_probes() {
    let app = TestApp::new().await;
    app.get("/api/v1/health/live").await.assert_ok();
    app.get("/api/v1/health/ready").await.assert_ok();
}

#[tokio::test]
async fn test_sites_catalogue_is_public() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/auth/sites").await;

    response.assert_ok();
    let sites: Vec<serde_json::Value> = response.json();
    assert!(!sites.is_empty());
    assert_eq!(sites[0]["location"], home_site().0);
    assert!(sites[0]["departments"].as_array().unwrap().len() > 1);
}

#[tokio::test]
async fn test_protected_endpoint_requires_token() {
    let app = TestApp::new().await;

    app.get("/api/v1/employee/user").await.assert_unauthorized();
    app.get("/api/v1/admin/ip-applications")
        .await
        .assert_unauthorized();
    app.get("/api/v1/auth/verify").await.assert_unauthorized();
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new().await;
    app.get_auth("/api/v1/employee/user", "not-a-jwt")
        .await
        .assert_unauthorized();

    // Signed with a different secret
    let mut other = app.state.config.clone();
    other.auth.jwt_secret = "another_secret_key_that_is_also_32_bytes_long".to_string();
    let forged = generate_test_token(&other, Uuid::new_v4(), Role::Admin);
    app.get_auth("/api/v1/admin/user", &forged)
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_employee_token_cannot_reach_admin_routes() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let response = app
        .get_auth("/api/v1/admin/ip-applications", &employee.token)
        .await;
    response.assert_forbidden();
    assert_eq!(response.message(), "Access denied: admin role required");
}

#[tokio::test]
async fn test_admin_token_cannot_reach_employee_routes() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;

    let response = app.get_auth("/api/v1/employee/user", &admin.token).await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.message(), "Access denied: employee role required");
}

#[tokio::test]
async fn test_verify_returns_session_user() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let response = app.get_auth("/api/v1/auth/verify", &employee.token).await;
    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["user"]["email"], employee.email);
    assert_eq!(json["user"]["role"], "employee");
}

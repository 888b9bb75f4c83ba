//! Discovery scans and reachability through the admin API

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::{TestApp, SCAN_OUTPUT};

const SCAN: &str = "/api/v1/admin/ip-scan";

#[tokio::test]
async fn test_scan_reports_discovered_devices() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.mocks.runner.set_scan_stdout(SCAN_OUTPUT);

    let response = app.get_auth(SCAN, &admin.token).await;
    response.assert_ok();
    let devices: Vec<Value> = response.json();
    assert_eq!(devices.len(), 2);

    assert_eq!(devices[0]["ip"], "10.10.0.1");
    assert_eq!(devices[0]["mac"], "00:1B:44:11:3A:B7");
    assert_eq!(devices[0]["vendor"], "Cisco Systems");

    assert_eq!(devices[1]["ip"], "10.10.0.20");
    assert!(devices[1]["mac"].is_null());
    assert_eq!(devices[1]["vendor"], "Unknown");
}

#[tokio::test]
async fn test_scan_with_no_hosts_is_empty() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.mocks
        .runner
        .set_scan_stdout("Nmap done: 256 IP addresses (0 hosts up) scanned in 3.02 seconds\n");

    let devices: Vec<Value> = app.get_auth(SCAN, &admin.token).await.json();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_scan_error_output_is_bad_gateway() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.mocks
        .runner
        .set_scan_stderr("You requested a scan type which requires root privileges.");

    let response = app.get_auth(SCAN, &admin.token).await;
    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_code("scan_failed");
    assert_eq!(response.message(), "Scan failed");
}

#[tokio::test]
async fn test_scan_tool_missing_is_bad_gateway() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.mocks.runner.set_failing(true);

    let response = app.get_auth(SCAN, &admin.token).await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.message(), "Scan failed");
}

#[tokio::test]
async fn test_concurrent_scans_share_one_sweep() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.mocks.runner.set_scan_stdout(SCAN_OUTPUT);

    let (a, b) = tokio::join!(
        app.get_auth(SCAN, &admin.token),
        app.get_auth(SCAN, &admin.token)
    );
    a.assert_ok();
    b.assert_ok();
    assert_eq!(a.text(), b.text());
    assert_eq!(app.mocks.runner.scan_calls(), 1);

    // A later request starts a fresh sweep
    app.get_auth(SCAN, &admin.token).await.assert_ok();
    assert_eq!(app.mocks.runner.scan_calls(), 2);
}

#[tokio::test]
async fn test_scan_requires_admin() {
    let app = TestApp::new().await;
    let employee = app.register_employee(crate::common::home_site()).await;

    app.get_auth(SCAN, &employee.token).await.assert_forbidden();
    assert_eq!(app.mocks.runner.scan_calls(), 0);
}

#[tokio::test]
async fn test_search_without_records_is_empty() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;

    let rows: Vec<Value> = app
        .get_auth("/api/v1/admin/ip-search?ip=10.99.0.1", &admin.token)
        .await
        .json();
    assert!(rows.is_empty());
    assert_eq!(app.mocks.probe.calls(), 0);
}

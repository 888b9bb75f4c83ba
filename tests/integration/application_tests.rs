//! Employee IP application submission

use axum::http::StatusCode;
use serde_json::json;

use nic_intranet::{db::AddressRepository, models::PoolEntry};

use crate::common::{
    home_site, other_site, random_mac, ApplicationFixtures, TestApp, SAMPLE_PDF,
};

const SUBMIT: &str = "/api/v1/employee/ip-application";

fn stored_uploads(app: &TestApp) -> usize {
    std::fs::read_dir(app.state.files.dir())
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_submit_application() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;
    let mac = random_mac();

    let response = app
        .post_multipart_auth(
            SUBMIT,
            ApplicationFixtures::form(home_site(), &employee.email, Some(&mac)),
            &employee.token,
        )
        .await;
    response.assert_created();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["userId"], employee.id.to_string());
    assert_eq!(json["macAddress"], mac);
    assert!(json["ipAddress"].is_null());
    let form = json["ipForm"].as_str().unwrap();
    assert!(form.ends_with("application.pdf"));
    assert_eq!(
        std::fs::read(app.state.files.dir().join(form)).unwrap(),
        SAMPLE_PDF
    );

    let history: Vec<serde_json::Value> = app
        .get_auth("/api/v1/employee/ip-applications/history", &employee.token)
        .await
        .json();
    assert_eq!(history.len(), 1);

    let activity: Vec<serde_json::Value> = app
        .get_auth("/api/v1/employee/recent-activity", &employee.token)
        .await
        .json();
    assert_eq!(activity[0]["type"], "IP Application");
    assert_eq!(activity[0]["description"], "Submitted new IP application");
}

#[tokio::test]
async fn test_hardware_address_is_normalised() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let response = app
        .post_multipart_auth(
            SUBMIT,
            ApplicationFixtures::form(home_site(), &employee.email, Some("aa-bb-cc-dd-ee-0f")),
            &employee.token,
        )
        .await;
    response.assert_created();
    let json: serde_json::Value = response.json();
    assert_eq!(json["macAddress"], "AA:BB:CC:DD:EE:0F");
}

#[tokio::test]
async fn test_submit_requires_pdf_form() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let response = app
        .post_multipart_auth(
            SUBMIT,
            ApplicationFixtures::form(home_site(), &employee.email, None).without("ipForm"),
            &employee.token,
        )
        .await;
    response.assert_bad_request().assert_code("invalid_format");

    let not_pdf = ApplicationFixtures::form(home_site(), &employee.email, None)
        .without("ipForm")
        .file("ipForm", "photo.png", "image/png", b"\x89PNG\r\n\x1a\n");
    let response = app.post_multipart_auth(SUBMIT, not_pdf, &employee.token).await;
    response.assert_bad_request();
    assert!(response.message().contains("Only PDF files are allowed"));
}

#[tokio::test]
async fn test_submit_rejects_oversized_form() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let mut big = SAMPLE_PDF.to_vec();
    big.resize(app.state.files.max_bytes() + 1, b' ');
    let form = ApplicationFixtures::form(home_site(), &employee.email, None)
        .without("ipForm")
        .file("ipForm", "big.pdf", "application/pdf", &big);

    app.post_multipart_auth(SUBMIT, form, &employee.token)
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(stored_uploads(&app), 0);
}

#[tokio::test]
async fn test_invalid_fields_leave_no_upload_behind() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let response = app
        .post_multipart_auth(
            SUBMIT,
            ApplicationFixtures::form(home_site(), &employee.email, None).without("contact"),
            &employee.token,
        )
        .await;
    response.assert_bad_request().assert_code("invalid_format");

    let bad_mac = ApplicationFixtures::form(home_site(), &employee.email, Some("not-a-mac"));
    app.post_multipart_auth(SUBMIT, bad_mac, &employee.token)
        .await
        .assert_bad_request()
        .assert_code("invalid_format");

    assert_eq!(stored_uploads(&app), 0);
    let history: Vec<serde_json::Value> = app
        .get_auth("/api/v1/employee/ip-applications/history", &employee.token)
        .await
        .json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_submit_only_for_own_site() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(other_site(), &employee.email, None),
        &employee.token,
    )
    .await
    .assert_forbidden()
    .assert_code("forbidden");

    assert_eq!(stored_uploads(&app), 0);
    let history: Vec<serde_json::Value> = app
        .get_auth("/api/v1/employee/ip-applications/history", &employee.token)
        .await
        .json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_pending_hardware_address_cannot_be_reused() {
    let app = TestApp::new().await;
    let first = app.register_employee(home_site()).await;
    let second = app.register_employee(home_site()).await;
    let mac = random_mac();

    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &first.email, Some(&mac)),
        &first.token,
    )
    .await
    .assert_created();

    let dashed_lower = mac.replace(':', "-").to_lowercase();
    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &second.email, Some(&dashed_lower)),
        &second.token,
    )
    .await
    .assert_conflict()
    .assert_code("duplicate_hardware_address");
}

#[tokio::test]
async fn test_current_allocation_not_found_while_pending() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &employee.email, None),
        &employee.token,
    )
    .await
    .assert_created();

    app.get_auth(SUBMIT, &employee.token).await.assert_not_found();
}

#[tokio::test]
async fn test_admin_cannot_submit() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;

    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &admin.email, None),
        &admin.token,
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_hardware_address_held_by_registry_record_cannot_be_reused() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let repo = AddressRepository::new(&app.state.db);
    for (ip, mac) in [("10.20.9.1", "00:1B:44:11:3A:C9"), ("10.20.9.2", "00-1B-44-11-3A-CA")] {
        repo.insert_available(&PoolEntry {
            ip_address: ip.to_string(),
            mac_address: Some(mac.to_string()),
            location: home_site().0.to_string(),
            department: home_site().1.to_string(),
        })
        .await
        .unwrap();
    }

    // Stored colon form, submitted lower-case dashed
    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &employee.email, Some("00-1b-44-11-3a-c9")),
        &employee.token,
    )
    .await
    .assert_conflict()
    .assert_code("duplicate_hardware_address");

    // Stored dashed form, submitted colon form
    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &employee.email, Some("00:1b:44:11:3a:ca")),
        &employee.token,
    )
    .await
    .assert_conflict()
    .assert_code("duplicate_hardware_address");

    assert_eq!(stored_uploads(&app), 0);
}

#[tokio::test]
async fn test_hardware_address_of_allocated_holder_cannot_be_reused() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let holder = app.register_employee(home_site()).await;
    let other = app.register_employee(home_site()).await;
    let mac = random_mac();

    let created: serde_json::Value = app
        .post_multipart_auth(
            SUBMIT,
            ApplicationFixtures::form(home_site(), &holder.email, Some(&mac)),
            &holder.token,
        )
        .await
        .json();
    app.post_json_auth(
        &format!(
            "/api/v1/admin/ip-applications/{}/allocate",
            created["id"].as_str().unwrap()
        ),
        json!({ "ipAddress": "10.20.9.3" }),
        &admin.token,
    )
    .await
    .assert_ok();

    app.post_multipart_auth(
        SUBMIT,
        ApplicationFixtures::form(home_site(), &other.email, Some(&mac.to_lowercase())),
        &other.token,
    )
    .await
    .assert_conflict()
    .assert_code("duplicate_hardware_address");
}

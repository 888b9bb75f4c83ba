//! Registration, login and OTP password reset

use axum::http::StatusCode;
use serde_json::json;

use nic_intranet::db::user_repository::FIRST_REGISTRATION_NUMBER;

use crate::common::{home_site, RequestFixtures, TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_register_returns_token_and_assigns_registration_numbers() {
    let app = TestApp::new().await;
    let first = app.register_employee(home_site()).await;
    let second = app.register_employee(home_site()).await;

    let mut numbers = Vec::new();
    for session in [&first, &second] {
        let users: Vec<serde_json::Value> = app
            .get_auth("/api/v1/employee/users", &session.token)
            .await
            .json();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["email"], session.email);
        numbers.push(users[0]["registrationNumber"].as_i64().unwrap());
    }

    assert_eq!(numbers, vec![FIRST_REGISTRATION_NUMBER, FIRST_REGISTRATION_NUMBER + 1]);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = TestApp::new().await;
    let employee = app.employees.create(home_site());
    app.post_json("/api/v1/auth/employee/register", employee.to_json())
        .await
        .assert_created();

    let again = app.employees.create(home_site()).with_email(&employee.email);
    app.post_json("/api/v1/auth/employee/register", again.to_json())
        .await
        .assert_conflict();
}

#[tokio::test]
async fn test_register_validates_phone_and_password() {
    let app = TestApp::new().await;

    let bad_phone = app.employees.create(home_site()).with_phone("12345");
    app.post_json("/api/v1/auth/employee/register", bad_phone.to_json())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let short_password = app.employees.create(home_site()).with_password("abc");
    app.post_json("/api/v1/auth/employee/register", short_password.to_json())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_is_scoped_by_role() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;
    let admin = app.create_admin().await;

    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login(&employee.email, TEST_PASSWORD),
    )
    .await
    .assert_ok();

    // Correct credentials at the wrong door look like bad credentials
    app.post_json(
        "/api/v1/auth/admin/login",
        RequestFixtures::login(&employee.email, TEST_PASSWORD),
    )
    .await
    .assert_unauthorized();
    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login(&admin.email, TEST_PASSWORD),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_blank_fields() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login(&employee.email, "wrong-password"),
    )
    .await
    .assert_unauthorized();

    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login("", ""),
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_password_reset_with_otp() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    app.post_json(
        "/api/v1/auth/forgot-password",
        json!({ "email": employee.email }),
    )
    .await
    .assert_ok();

    let code = app
        .mocks
        .mailer
        .last_code_for(&employee.email)
        .expect("OTP mail was sent");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let response = app
        .post_json(
            "/api/v1/auth/verify-otp",
            json!({ "email": employee.email, "otp": wrong }),
        )
        .await;
    response.assert_bad_request();
    assert!(response.message().contains("Invalid OTP"));

    app.post_json(
        "/api/v1/auth/verify-otp",
        json!({ "email": employee.email, "otp": code }),
    )
    .await
    .assert_ok();

    app.post_json(
        "/api/v1/auth/reset-password",
        json!({ "email": employee.email, "otp": code, "newPassword": "fresh-password" }),
    )
    .await
    .assert_ok();

    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login(&employee.email, "fresh-password"),
    )
    .await
    .assert_ok();
    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login(&employee.email, TEST_PASSWORD),
    )
    .await
    .assert_unauthorized();

    // The code is single use
    let response = app
        .post_json(
            "/api/v1/auth/verify-otp",
            json!({ "email": employee.email, "otp": code }),
        )
        .await;
    response.assert_bad_request();
    assert!(response.message().contains("No OTP found"));
}

#[tokio::test]
async fn test_forgot_password_input_checks() {
    let app = TestApp::new().await;

    app.post_json("/api/v1/auth/forgot-password", json!({}))
        .await
        .assert_bad_request();
    app.post_json("/api/v1/auth/forgot-password", json!({ "email": "not-an-email" }))
        .await
        .assert_bad_request();
    app.post_json(
        "/api/v1/auth/forgot-password",
        json!({ "email": "nobody@example.com" }),
    )
    .await
    .assert_not_found();

    // Admin accounts cannot reset through the employee flow
    let admin = app.create_admin().await;
    app.post_json("/api/v1/auth/forgot-password", json!({ "email": admin.email }))
        .await
        .assert_not_found();
    assert!(app.mocks.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_mail_failure_discards_the_code() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;
    app.mocks.mailer.set_failing(true);

    app.post_json(
        "/api/v1/auth/forgot-password",
        json!({ "email": employee.email }),
    )
    .await
    .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .post_json(
            "/api/v1/auth/verify-otp",
            json!({ "email": employee.email, "otp": "123456" }),
        )
        .await;
    response.assert_bad_request();
    assert!(response.message().contains("No OTP found"));
}

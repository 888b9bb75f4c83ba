//! Profiles, colleague directory and admin user management

use serde_json::{json, Value};

use crate::common::{home_site, other_site, RequestFixtures, TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_employee_profile() {
    let app = TestApp::new().await;
    let employee = app.register_employee(home_site()).await;

    let profile: Value = app
        .get_auth("/api/v1/employee/user", &employee.token)
        .await
        .json();
    assert_eq!(profile["email"], employee.email);
    assert_eq!(profile["location"], home_site().0);
    assert_eq!(profile["phone"].as_str().unwrap().len(), 10);
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("password_hash").is_none());
}

#[tokio::test]
async fn test_colleagues_exclude_caller_and_other_sites() {
    let app = TestApp::new().await;
    let me = app.register_employee(home_site()).await;
    let peer = app.register_employee(home_site()).await;
    app.register_employee(other_site()).await;

    let url = format!(
        "/api/v1/employee/colleagues/{}/{}",
        home_site().0.replace(' ', "%20"),
        home_site().1.replace(' ', "%20")
    );
    let colleagues: Vec<Value> = app.get_auth(&url, &me.token).await.json();
    assert_eq!(colleagues.len(), 1);
    assert_eq!(colleagues[0]["email"], peer.email);
    assert!(colleagues[0]["registrationNumber"].is_i64());
}

#[tokio::test]
async fn test_admin_name_and_directory_views() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    app.register_employee(home_site()).await;
    app.register_employee(home_site()).await;
    app.register_employee(other_site()).await;

    let me: Value = app.get_auth("/api/v1/admin/user", &admin.token).await.json();
    assert_eq!(me["name"], "Office Administrator");

    let employees: Vec<Value> = app
        .get_auth("/api/v1/admin/employees", &admin.token)
        .await
        .json();
    assert_eq!(employees.len(), 3);

    let departments: Value = app
        .get_auth("/api/v1/admin/departments", &admin.token)
        .await
        .json();
    let home_key = format!("{}_{}", home_site().0, home_site().1);
    let other_key = format!("{}_{}", other_site().0, other_site().1);
    assert_eq!(departments[&home_key].as_array().unwrap().len(), 2);
    assert_eq!(departments[&other_key].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_user_crud() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let (location, department) = home_site();

    let response = app
        .post_json_auth(
            "/api/v1/admin/database/users",
            json!({
                "name": "Ravi Kumar",
                "email": "Ravi.Kumar@Example.com",
                "password": TEST_PASSWORD,
                "location": location,
                "department": department,
                "phone": "9123456780"
            }),
            &admin.token,
        )
        .await;
    response.assert_created();
    let created: Value = response.json();
    assert_eq!(created["email"], "ravi.kumar@example.com");
    assert_eq!(created["role"], "employee");
    let id = created["id"].as_str().unwrap().to_string();

    // Same email again
    app.post_json_auth(
        "/api/v1/admin/database/users",
        RequestFixtures::admin_user("ravi.kumar@example.com", home_site()),
        &admin.token,
    )
    .await
    .assert_conflict();

    let response = app
        .put_json_auth(
            &format!("/api/v1/admin/database/users/{}", id),
            json!({
                "name": "Ravi K.",
                "email": "ravi.kumar@example.com",
                "location": location,
                "department": department,
                "designation": "Assistant Grade II"
            }),
            &admin.token,
        )
        .await;
    response.assert_ok();
    let updated: Value = response.json();
    assert_eq!(updated["name"], "Ravi K.");
    assert_eq!(updated["designation"], "Assistant Grade II");

    // Password untouched by an update without one
    app.post_json(
        "/api/v1/auth/employee/login",
        RequestFixtures::login("ravi.kumar@example.com", TEST_PASSWORD),
    )
    .await
    .assert_ok();

    let users: Vec<Value> = app
        .get_auth("/api/v1/admin/database/users", &admin.token)
        .await
        .json();
    assert!(users.iter().any(|u| u["id"] == id.as_str()));
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    app.delete_auth(&format!("/api/v1/admin/database/users/{}", id), &admin.token)
        .await
        .assert_ok();
    app.delete_auth(&format!("/api/v1/admin/database/users/{}", id), &admin.token)
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_admin_activity_feed_includes_employee() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let employee = app.register_employee(home_site()).await;
    app.post_json_auth(
        "/api/v1/employee/complaint",
        json!({ "description": "Scanner jammed" }),
        &employee.token,
    )
    .await
    .assert_created();

    let feed: Vec<Value> = app
        .get_auth("/api/v1/admin/activities", &admin.token)
        .await
        .json();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], "Complaint");
    assert_eq!(feed[0]["employeeEmail"], employee.email);
}

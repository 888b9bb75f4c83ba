//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! with temporary SQLite databases and mock network and mail services.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use nic_intranet::{
    api,
    config::{AppConfig, DatabaseConfig, UploadConfig},
    db,
    middleware::auth::Claims,
    models::{AuthResponse, CreateUserRequest, Role},
    services::{
        AuthService, DiscoveryScanner, FileStore, OtpStore, ReachabilityProber,
    },
    AppState,
};

use super::factories::EmployeeFactory;
use super::fixtures::{MultipartForm, RequestFixtures, TEST_PASSWORD};
use super::mocks::Mocks;

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mocks: Mocks,
    pub employees: EmployeeFactory,
}

/// A logged-in account
#[derive(Debug, Clone)]
pub struct TestSession {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestApp {
    /// Create a new test application with a fresh SQLite database
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let mocks = Mocks::default();
        let prober = Arc::new(ReachabilityProber::new(
            &config.network,
            mocks.probe.clone(),
            mocks.runner.clone(),
        ));
        let scanner = Arc::new(DiscoveryScanner::new(&config.network, mocks.runner.clone()));

        let state = AppState {
            otp: OtpStore::new(&config.otp),
            files: FileStore::new(&config.uploads),
            config,
            db,
            prober,
            scanner,
            mailer: mocks.mailer.clone(),
        };

        // Build the router
        let router = Router::new()
            .nest("/api/v1", api::public_routes())
            .nest(
                "/api/v1",
                api::protected_routes().layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    nic_intranet::middleware::auth::auth_middleware,
                )),
            )
            .with_state(state.clone());

        Self {
            router,
            state,
            mocks,
            employees: EmployeeFactory::new(),
        }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, uri: &str, token: &str) -> TestResponse {
        self.request_with_auth(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
            token,
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.request(json_request("POST", uri, body)).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post_json_auth(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.request_with_auth(json_request("POST", uri, body), token)
            .await
    }

    /// Make an authenticated PUT request with JSON body
    pub async fn put_json_auth(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.request_with_auth(json_request("PUT", uri, body), token)
            .await
    }

    /// Make an authenticated DELETE request
    pub async fn delete_auth(&self, uri: &str, token: &str) -> TestResponse {
        self.request_with_auth(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
            token,
        )
        .await
    }

    /// Submit a multipart form with authentication
    pub async fn post_multipart_auth(
        &self,
        uri: &str,
        form: MultipartForm,
        token: &str,
    ) -> TestResponse {
        self.request_with_auth(form.into_request(uri), token).await
    }

    /// Make a request with authentication
    pub async fn request_with_auth(&self, request: Request<Body>, token: &str) -> TestResponse {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        self.request(Request::from_parts(parts, body)).await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register an employee through the public endpoint
    pub async fn register_employee(&self, site: (&str, &str)) -> TestSession {
        let employee = self.employees.create(site);
        let response = self
            .post_json("/api/v1/auth/employee/register", employee.to_json())
            .await;
        response.assert_created();
        let auth: AuthResponse = response.json();
        TestSession {
            id: auth.user.id,
            email: auth.user.email,
            token: auth.token,
        }
    }

    /// Create an admin directly and log in through the admin endpoint
    pub async fn create_admin(&self) -> TestSession {
        let email = format!("admin_{}@example.com", Uuid::new_v4().simple());
        let request: CreateUserRequest = serde_json::from_value(RequestFixtures::admin_user(
            &email,
            ("NIC Office", "NIC Office"),
        ))
        .expect("valid admin fixture");
        AuthService::new(self.state.db.clone(), &self.state.config.auth)
            .create_user(&request)
            .await
            .expect("Failed to create admin");

        let response = self
            .post_json(
                "/api/v1/auth/admin/login",
                RequestFixtures::login(&email, TEST_PASSWORD),
            )
            .await;
        response.assert_ok();
        let auth: AuthResponse = response.json();
        TestSession {
            id: auth.user.id,
            email,
            token: auth.token,
        }
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// The `message` field of a JSON body
    pub fn message(&self) -> String {
        let json: Value = self.json();
        json["message"].as_str().unwrap_or_default().to_string()
    }

    /// Check if the response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::FORBIDDEN)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Conflict (409)
    pub fn assert_conflict(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CONFLICT)
    }

    /// Assert the JSON `code` field carries the given error taxonomy name
    pub fn assert_code(&self, code: &str) -> &Self {
        let json: Value = self.json();
        assert_eq!(json["code"], code, "Body: {}", self.text());
        self
    }
}

/// Create a test configuration with temporary SQLite database and upload dir
pub fn test_config() -> AppConfig {
    // Use a unique temp file for each test to avoid conflicts
    let id = Uuid::new_v4().simple().to_string();
    let db_path = std::env::temp_dir().join(format!("nic_test_{}.db", id));

    let mut config = AppConfig::default();
    config.database = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", db_path.display()),
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 30,
        idle_timeout_secs: 600,
    };
    config.auth.jwt_secret = "test_secret_key_that_is_at_least_32_bytes_long".to_string();
    config.uploads = UploadConfig {
        dir: test_upload_dir(&id),
        max_bytes: 64 * 1024,
    };
    config.network.scan_subnet = "10.10.0.0/24".to_string();
    config
}

fn test_upload_dir(id: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nic_test_uploads_{}", id))
}

/// Generate a test JWT token for authentication
pub fn generate_test_token(config: &AppConfig, user_id: Uuid, role: Role) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp: now + 3600,
        nbf: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
    )
    .expect("Failed to generate test token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        assert!(app.state.config.mail.is_none());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1/health").await;
        response.assert_ok();
    }

    #[tokio::test]
    async fn test_response_json_parsing() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1/health").await;
        let json: Value = response.json();
        assert!(json.get("status").is_some());
    }
}

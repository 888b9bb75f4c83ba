//! Authentication API endpoints
//!
//! Registration, role-scoped login, token verification and OTP password reset.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    middleware::auth::{create_access_token, AuthUser},
    models::{AuthResponse, LoginRequest, RegisterRequest, Role, SessionUser, Site, User, SITES},
    services::{AuthService, PasswordResetService},
    utils::{AppError, AppResult},
    AppState,
};

/// Create public routes for authentication endpoints (no auth required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/sites", get(list_sites))
        .route("/employee/register", post(register))
        .route("/employee/login", post(employee_login))
        .route("/admin/login", post(admin_login))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-otp", post(verify_otp))
        .route("/reset-password", post(reset_password))
}

/// Create protected routes for authentication endpoints (auth required)
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/verify", get(verify))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: SessionUser,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), &state.config.auth)
}

fn reset_service(state: &AppState) -> PasswordResetService {
    PasswordResetService::new(
        state.db.clone(),
        &state.config.auth,
        state.otp.clone(),
        state.mailer.clone(),
    )
}

fn session_for(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = create_access_token(
        &user.id,
        user.role,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_hours,
    )
    .map_err(|e| AppError::internal(format!("Failed to create access token: {}", e)))?;

    Ok(AuthResponse {
        token,
        user: SessionUser::from(user),
    })
}

/// GET /api/v1/auth/sites
async fn list_sites() -> Json<&'static [Site]> {
    Json(SITES)
}

/// POST /api/v1/auth/employee/register
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = auth_service(&state).register_employee(&payload).await?;
    Ok((StatusCode::CREATED, Json(session_for(&state, &user)?)))
}

async fn login_as(state: &AppState, payload: &LoginRequest, role: Role) -> AppResult<Json<AuthResponse>> {
    let user = auth_service(state)
        .login(&payload.email, &payload.password, role)
        .await?;
    info!(user_id = %user.id, role = %role, "User logged in");
    Ok(Json(session_for(state, &user)?))
}

/// POST /api/v1/auth/employee/login
async fn employee_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    login_as(&state, &payload, Role::Employee).await
}

/// POST /api/v1/auth/admin/login
async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    login_as(&state, &payload, Role::Admin).await
}

/// GET /api/v1/auth/verify
async fn verify(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<VerifyResponse>> {
    let user = auth_service(&state).get_user(auth.id).await?;
    Ok(Json(VerifyResponse {
        user: SessionUser::from(&user),
    }))
}

/// POST /api/v1/auth/forgot-password
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    reset_service(&state)
        .request_reset(payload.email.as_deref())
        .await?;
    Ok(MessageResponse::new("OTP sent to your email"))
}

/// POST /api/v1/auth/verify-otp
async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    reset_service(&state)
        .verify(payload.email.as_deref(), payload.otp.as_deref())
        .await?;
    Ok(MessageResponse::new("OTP verified successfully"))
}

/// POST /api/v1/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    reset_service(&state)
        .reset(
            payload.email.as_deref(),
            payload.otp.as_deref(),
            payload.new_password.as_deref(),
        )
        .await?;
    Ok(MessageResponse::new("Password reset successfully"))
}

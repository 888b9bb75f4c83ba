//! JWT Authentication Middleware
//!
//! Bearer tokens carry the user id and role. `auth_middleware` validates the
//! token and injects an [`AuthUser`]; `require_admin` / `require_employee`
//! then gate route groups by role.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{models::Role, utils::error::ErrorResponse, AppState};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Account role
    pub role: Role,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Not before timestamp
    pub nbf: i64,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Authenticated user information extracted from JWT
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = &'static str;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        Ok(Self {
            id,
            role: claims.role,
        })
    }
}

/// Extractor for AuthUser from request extensions
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Create a new JWT access token
pub fn create_access_token(
    user_id: &Uuid,
    role: Role,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now.timestamp(),
        exp: exp.timestamp(),
        nbf: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<TokenData<Claims>, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenExpired,
    RoleRequired(Role),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing authentication token".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid authentication token".to_string(),
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication token has expired".to_string(),
            ),
            AuthError::RoleRequired(role) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("Access denied: {} role required", role),
            ),
        };

        (status, Json(ErrorResponse::new(error, message))).into_response()
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Validates the bearer token and injects the AuthUser into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)
        .and_then(|h| extract_bearer_token(h).ok_or(AuthError::InvalidToken))?;

    let token_data = validate_token(token, &state.config.auth.jwt_secret)?;
    let auth_user: AuthUser = token_data
        .claims
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;

    debug!(user_id = %auth_user.id, role = %auth_user.role, "Authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

async fn require_role(role: Role, request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;

    if user.role != role {
        debug!(user_id = %user.id, required = %role, "Role check failed");
        return Err(AuthError::RoleRequired(role));
    }

    Ok(next.run(request).await)
}

/// Admits only admin tokens; runs after `auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(Role::Admin, request, next).await
}

/// Admits only employee tokens; runs after `auth_middleware`
pub async fn require_employee(request: Request, next: Next) -> Result<Response, AuthError> {
    require_role(Role::Employee, request, next).await
}

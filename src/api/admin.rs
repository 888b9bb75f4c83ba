//! Administrator endpoints
//!
//! Application approval, user database management, complaints, the address
//! registry search and the live subnet scan.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::auth::MessageResponse;
use crate::{
    db::ActivityRepository,
    middleware::auth::AuthUser,
    models::{
        ActivityWithEmployee, AddressFilter, AdminComplaintView, AllocateRequest, Application,
        CloseComplaintRequest, CreateUserRequest, DirectoryEntry, DiscoveredDevice,
        EmployeeSummary, IpRangeUsage, ProbedAddress, UpdateUserRequest, UserPublic,
    },
    services::{AddressRegistry, ApplicationService, AuthService, ComplaintService},
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(get_admin_name))
        .route("/ip-applications", get(pending_applications))
        .route("/ip-applications/{id}/allocate", post(allocate_address))
        .route("/database/users", get(list_users).post(create_user))
        .route("/database/users/{id}", put(update_user).delete(delete_user))
        .route("/activities", get(list_activities))
        .route("/ip-ranges", get(list_ip_ranges))
        .route("/complaints", get(list_complaints))
        .route("/complaints/{id}/close", put(close_complaint))
        .route("/departments", get(departments))
        .route("/employees", get(list_employees))
        .route("/ip-search", get(search_addresses))
        .route("/ip-scan", get(scan_subnet))
}

#[derive(Debug, Serialize)]
pub struct AdminNameResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AllocateResponse {
    pub message: String,
    pub application: Application,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), &state.config.auth)
}

/// GET /api/v1/admin/user
async fn get_admin_name(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<AdminNameResponse>> {
    let user = auth_service(&state).get_user(auth.id).await?;
    Ok(Json(AdminNameResponse { name: user.name }))
}

/// GET /api/v1/admin/ip-applications
async fn pending_applications(State(state): State<AppState>) -> AppResult<Json<Vec<Application>>> {
    Ok(Json(ApplicationService::new(state.db.clone()).pending().await?))
}

/// POST /api/v1/admin/ip-applications/{id}/allocate
async fn allocate_address(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocateRequest>,
) -> AppResult<Json<AllocateResponse>> {
    let application = ApplicationService::new(state.db.clone())
        .allocate(id, payload.ip_address.as_deref())
        .await?;
    info!(
        application_id = %id,
        admin_id = %auth.id,
        ip_address = application.ip_address.as_deref().unwrap_or_default(),
        "IP allocated"
    );
    Ok(Json(AllocateResponse {
        message: "IP allocated successfully".to_string(),
        application,
    }))
}

/// GET /api/v1/admin/database/users
async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserPublic>>> {
    Ok(Json(auth_service(&state).list_users().await?))
}

/// POST /api/v1/admin/database/users
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserPublic>)> {
    let user = auth_service(&state).create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(UserPublic::from(user))))
}

/// PUT /api/v1/admin/database/users/{id}
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserPublic>> {
    let user = auth_service(&state).update_user(id, &payload).await?;
    Ok(Json(UserPublic::from(user)))
}

/// DELETE /api/v1/admin/database/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    auth_service(&state).delete_user(id).await?;
    Ok(MessageResponse::new("User deleted successfully"))
}

/// GET /api/v1/admin/activities
async fn list_activities(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ActivityWithEmployee>>> {
    Ok(Json(ActivityRepository::new(&state.db).list_all().await?))
}

/// GET /api/v1/admin/ip-ranges
async fn list_ip_ranges(State(state): State<AppState>) -> AppResult<Json<Vec<IpRangeUsage>>> {
    Ok(Json(AddressRegistry::new(state.db.clone()).range_usage().await?))
}

/// GET /api/v1/admin/complaints
async fn list_complaints(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminComplaintView>>> {
    Ok(Json(ComplaintService::new(state.db.clone()).list_all().await?))
}

/// PUT /api/v1/admin/complaints/{id}/close
async fn close_complaint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseComplaintRequest>,
) -> AppResult<Json<MessageResponse>> {
    ComplaintService::new(state.db.clone())
        .close(id, payload.remarks.as_deref())
        .await?;
    Ok(MessageResponse::new("Complaint closed successfully"))
}

/// GET /api/v1/admin/departments
async fn departments(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, Vec<DirectoryEntry>>>> {
    Ok(Json(auth_service(&state).departments().await?))
}

/// GET /api/v1/admin/employees
async fn list_employees(State(state): State<AppState>) -> AppResult<Json<Vec<EmployeeSummary>>> {
    let employees = auth_service(&state).list_employees().await?;
    Ok(Json(employees.iter().map(EmployeeSummary::from).collect()))
}

/// GET /api/v1/admin/ip-search
///
/// Registry rows matching the filter, each probed for reachability.
async fn search_addresses(
    State(state): State<AppState>,
    Query(filter): Query<AddressFilter>,
) -> AppResult<Json<Vec<ProbedAddress>>> {
    let records = AddressRegistry::new(state.db.clone()).find(&filter).await?;
    Ok(Json(state.prober.probe_records(&records).await))
}

/// GET /api/v1/admin/ip-scan
async fn scan_subnet(State(state): State<AppState>) -> AppResult<Json<Vec<DiscoveredDevice>>> {
    let devices = state.scanner.scan().await?;
    Ok(Json(devices.as_ref().clone()))
}

//! Employee self-service endpoints

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::{
    db::ActivityRepository,
    middleware::auth::AuthUser,
    models::{
        ActivityRecord, Application, ApplicationFields, CreateComplaintRequest, CurrentAllocation,
        DirectoryEntry, EmployeeComplaintView, EmployeeSummary, ProfileView,
    },
    services::{ApplicationService, AuthService, ComplaintService},
    utils::{AppError, AppResult},
    AppState,
};

const RECENT_ACTIVITY_LIMIT: i64 = 5;
const FORM_FIELD: &str = "ipForm";
const TEXT_FIELD_LIMIT: usize = 4 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(get_profile))
        .route("/users", get(list_self))
        .route("/recent-activity", get(recent_activity))
        .route("/colleagues/{location}/{department}", get(colleagues))
        // The form handler enforces the upload cap while reading
        .route(
            "/ip-application",
            post(submit_application)
                .get(current_application)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/ip-applications/history", get(application_history))
        .route("/complaints", get(list_complaints))
        .route("/complaint", post(file_complaint))
}

/// GET /api/v1/employee/user
async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ProfileView>> {
    let user = AuthService::new(state.db.clone(), &state.config.auth)
        .get_user(auth.id)
        .await?;
    Ok(Json(ProfileView::from(&user)))
}

/// GET /api/v1/employee/users
///
/// Employees only ever see their own summary here.
async fn list_self(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<EmployeeSummary>>> {
    let user = AuthService::new(state.db.clone(), &state.config.auth)
        .get_user(auth.id)
        .await?;
    Ok(Json(vec![EmployeeSummary::from(&user)]))
}

/// GET /api/v1/employee/recent-activity
async fn recent_activity(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ActivityRecord>>> {
    let activities = ActivityRepository::new(&state.db)
        .recent_for(auth.id, RECENT_ACTIVITY_LIMIT)
        .await?;
    Ok(Json(activities))
}

/// GET /api/v1/employee/colleagues/{location}/{department}
async fn colleagues(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((location, department)): Path<(String, String)>,
) -> AppResult<Json<Vec<DirectoryEntry>>> {
    let entries = AuthService::new(state.db.clone(), &state.config.auth)
        .colleagues(auth.id, &location, &department)
        .await?;
    Ok(Json(entries))
}

/// POST /api/v1/employee/ip-application
///
/// Multipart form: the `ipForm` PDF plus the application text fields.
async fn submit_application(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Application>)> {
    let mut fields = ApplicationFields::default();
    let mut stored_form: Option<String> = None;

    let outcome = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FORM_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = read_capped(field, state.files.max_bytes()).await?;
                if let Some(previous) = stored_form.take() {
                    state.files.remove(&previous).await;
                }
                stored_form = Some(
                    state
                        .files
                        .store(file_name.as_deref(), content_type.as_deref(), &bytes)
                        .await?,
                );
                continue;
            }

            let slot = match name.as_str() {
                "name" => &mut fields.name,
                "address" => &mut fields.address,
                "department" => &mut fields.department,
                "contact" => &mut fields.contact,
                "email" => &mut fields.email,
                "location" => &mut fields.location,
                "macAddress" => &mut fields.mac_address,
                "antivirus" => &mut fields.antivirus,
                "antivirusName" => &mut fields.antivirus_name,
                "operatingSystem" => &mut fields.operating_system,
                _ => continue,
            };
            let bytes = read_capped(field, TEXT_FIELD_LIMIT).await?;
            *slot = Some(String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok::<_, AppError>(
            ApplicationService::new(state.db.clone())
                .submit(auth.id, &fields, stored_form.as_deref())
                .await?,
        )
    }
    .await;

    match outcome {
        Ok(application) => {
            info!(application_id = %application.id, user_id = %auth.id, "IP application submitted");
            Ok((StatusCode::CREATED, Json(application)))
        }
        Err(e) => {
            if let Some(name) = stored_form {
                state.files.remove(&name).await;
            }
            Err(e)
        }
    }
}

/// Buffer a multipart field, failing as soon as it exceeds `limit` bytes
async fn read_capped(mut field: Field<'_>, limit: usize) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Field exceeds the {} byte limit",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// GET /api/v1/employee/ip-applications/history
async fn application_history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Application>>> {
    let applications = ApplicationService::new(state.db.clone())
        .history(auth.id)
        .await?;
    Ok(Json(applications))
}

/// GET /api/v1/employee/ip-application
async fn current_application(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<CurrentAllocation>> {
    let current = ApplicationService::new(state.db.clone())
        .current(auth.id)
        .await?;
    Ok(Json(current))
}

/// GET /api/v1/employee/complaints
async fn list_complaints(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<EmployeeComplaintView>>> {
    let complaints = ComplaintService::new(state.db.clone())
        .list_for_employee(auth.id)
        .await?;
    Ok(Json(complaints))
}

/// POST /api/v1/employee/complaint
async fn file_complaint(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateComplaintRequest>,
) -> AppResult<(StatusCode, Json<EmployeeComplaintView>)> {
    let complaint = ComplaintService::new(state.db.clone())
        .file_complaint(auth.id, payload.description.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EmployeeComplaintView::from(&complaint)),
    ))
}

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::{self, LifecycleStatus, Teacher};
use crate::store::repos::{RepoError, Repos};
use crate::utils::{identifier_cache, identifier_filter};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacher {
    pub username: String,
    pub full_name: String,
    #[schema(format = "email")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub department: String,
    #[schema(example = "EMP-042")]
    pub employee_id: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacher {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub total: usize,
}

/// List approved teachers
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    responses((status = 200, description = "Approved teachers", body = TeacherListResponse)),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn list_teachers(
    auth: AuthUser,
    repos: web::Data<Repos>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teachers = repos.teachers().approved();
    Ok(HttpResponse::Ok().json(TeacherListResponse {
        total: teachers.len(),
        data: teachers.iter().map(model::public_view).collect(),
    }))
}

/// List teachers waiting for approval
#[utoipa::path(
    get,
    path = "/api/v1/teachers/pending",
    responses((status = 200, description = "Pending teachers", body = TeacherListResponse)),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn pending_teachers(
    auth: AuthUser,
    repos: web::Data<Repos>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teachers = repos.teachers().pending();
    Ok(HttpResponse::Ok().json(TeacherListResponse {
        total: teachers.len(),
        data: teachers.iter().map(model::public_view).collect(),
    }))
}

/// Create Teacher (admin entry; skips the approval queue)
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    request_body = CreateTeacher,
    responses(
        (status = 201, description = "Teacher created"),
        (status = 409, description = "Username, email or employee ID already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn create_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    payload: web::Json<CreateTeacher>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.username.trim().is_empty() || payload.employee_id.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        })));
    }

    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        username: payload.username.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone,
        department: payload.department,
        employee_id: payload.employee_id.trim().to_string(),
        password: hash_password(&payload.password),
        status: LifecycleStatus::Approved,
        registration_date: Utc::now(),
        assigned_classes: vec![],
        password_changed_at: None,
    };

    match repos.teachers().insert(teacher) {
        Ok(teacher) => {
            identifier_filter::insert(&teacher.username);
            identifier_filter::insert(&teacher.employee_id);
            identifier_filter::insert(&teacher.email);
            identifier_cache::mark_taken(&teacher.username).await;
            identifier_cache::mark_taken(&teacher.employee_id).await;
            identifier_cache::mark_taken(&teacher.email).await;

            Ok(HttpResponse::Created().json(json!({
                "message": "Teacher created successfully",
                "data": model::public_view(&teacher)
            })))
        }
        Err(RepoError::Duplicate("employee id")) => Ok(HttpResponse::Conflict().json(json!({
            "message": "A teacher with this employee ID already exists."
        }))),
        Err(RepoError::Duplicate(_)) => Ok(HttpResponse::Conflict().json(json!({
            "message": "A teacher with this username or email already exists."
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create teacher");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

/// Get Teacher by ID
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{teacher_id}",
    params(("teacher_id", Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher found"),
        (status = 404, description = "Teacher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn get_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    match repos.teachers().get(&path.into_inner()) {
        Some(teacher) => Ok(HttpResponse::Ok().json(model::public_view(&teacher))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        }))),
    }
}

/// Update Teacher
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}",
    params(("teacher_id", Path, description = "Teacher ID")),
    request_body = UpdateTeacher,
    responses(
        (status = 200, description = "Teacher updated"),
        (status = 404, description = "Teacher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn update_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<UpdateTeacher>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();
    let changes = payload.into_inner();

    let outcome = repos.teachers().update(&teacher_id, |teacher| {
        if let Some(full_name) = changes.full_name {
            teacher.full_name = full_name;
        }
        if let Some(email) = changes.email {
            teacher.email = email;
        }
        if changes.phone.is_some() {
            teacher.phone = changes.phone;
        }
        if let Some(department) = changes.department {
            teacher.department = department;
        }
    });

    match outcome {
        Ok(teacher) => Ok(HttpResponse::Ok().json(json!({
            "message": "Teacher updated successfully",
            "data": model::public_view(&teacher)
        }))),
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        }))),
        Err(e) => {
            error!(error = %e, teacher_id, "Failed to update teacher");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Approve a pending teacher. Terminal: approval enables login and cannot be
/// undone from here.
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}/approve",
    params(("teacher_id", Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher approved", body = Object, example = json!({
            "message": "Teacher approved"
        })),
        (status = 400, description = "Teacher not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn approve_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();
    match repos.teachers().approve(&teacher_id) {
        Ok(teacher) => Ok(HttpResponse::Ok().json(json!({
            "message": "Teacher approved",
            "data": model::public_view(&teacher)
        }))),
        Err(RepoError::NotFound) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Teacher not found or already processed"
        }))),
        Err(e) => {
            error!(error = %e, teacher_id, "Approve teacher failed");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Reject a pending teacher. The record is deleted; registering again is the
/// only way back in.
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}/reject",
    params(("teacher_id", Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher rejected and removed"),
        (status = 400, description = "Teacher not found or already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn reject_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();
    match repos.teachers().reject(&teacher_id) {
        Ok(teacher) => {
            identifier_filter::remove(&teacher.username);
            identifier_filter::remove(&teacher.employee_id);
            identifier_filter::remove(&teacher.email);
            identifier_cache::release(&teacher.username).await;
            identifier_cache::release(&teacher.employee_id).await;
            identifier_cache::release(&teacher.email).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Teacher rejected and removed"
            })))
        }
        Err(RepoError::NotFound) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Teacher not found or already processed"
        }))),
        Err(e) => {
            error!(error = %e, teacher_id, "Reject teacher failed");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Delete Teacher
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{teacher_id}",
    params(("teacher_id", Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Teacher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
pub async fn delete_teacher(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();
    match repos.teachers().remove(&teacher_id) {
        Ok(teacher) => {
            identifier_filter::remove(&teacher.username);
            identifier_filter::remove(&teacher.employee_id);
            identifier_filter::remove(&teacher.email);
            identifier_cache::release(&teacher.username).await;
            identifier_cache::release(&teacher.employee_id).await;
            identifier_cache::release(&teacher.email).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        }))),
        Err(e) => {
            error!(error = %e, teacher_id, "Failed to delete teacher");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::config::Config;
    use crate::model::Role;
    use crate::store::repos::tests::{teacher, test_repos};
    use actix_web::{App, test, web::Data};

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            data_dir: String::new(),
            jwt_secret: "test-secret".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".to_string(),
            legacy_register_url: None,
        }
    }

    #[actix_web::test]
    async fn approve_endpoint_moves_teacher_out_of_pending() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);
        let config = test_config();

        let pending = repos
            .teachers()
            .insert(teacher("smith", LifecycleStatus::Pending))
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(Data::new(repos.clone()))
                .app_data(Data::new(config.clone()))
                .route(
                    "/teachers/{id}/approve",
                    actix_web::web::put().to(approve_teacher),
                ),
        )
        .await;

        let token = generate_access_token("a-1", "admin", Role::Admin, &config.jwt_secret, 900);
        let req = test::TestRequest::put()
            .uri(&format!("/teachers/{}/approve", pending.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(repos.teachers().pending().is_empty());
        assert_eq!(repos.teachers().approved().len(), 1);

        // A second approval is a no-op error, not a state change.
        let token = generate_access_token("a-1", "admin", Role::Admin, &config.jwt_secret, 900);
        let req = test::TestRequest::put()
            .uri(&format!("/teachers/{}/approve", pending.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn non_admin_cannot_approve() {
        let dir = tempfile::tempdir().unwrap();
        let repos = test_repos(&dir);
        let config = test_config();

        let pending = repos
            .teachers()
            .insert(teacher("smith", LifecycleStatus::Pending))
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(Data::new(repos.clone()))
                .app_data(Data::new(config.clone()))
                .route(
                    "/teachers/{id}/approve",
                    actix_web::web::put().to(approve_teacher),
                ),
        )
        .await;

        let token =
            generate_access_token("s-1", "CS/2024/001", Role::Student, &config.jwt_secret, 900);
        let req = test::TestRequest::put()
            .uri(&format!("/teachers/{}/approve", pending.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FORBIDDEN);
        assert_eq!(repos.teachers().pending().len(), 1);
    }
}

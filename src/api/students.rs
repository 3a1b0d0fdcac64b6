use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::{self, LifecycleStatus, Student};
use crate::store::repos::{RepoError, Repos};
use crate::utils::attendance_stats;
use crate::utils::csv_export::{self, Column};
use crate::utils::roster_filter::StudentFilter;
use crate::utils::{identifier_cache, identifier_filter};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    /// Case-insensitive substring over name, index number and email
    pub search: Option<String>,
    pub academic_level: Option<String>,
    pub program_type: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    #[schema(example = "CS/2024/001")]
    pub index_number: String,
    pub full_name: String,
    #[schema(format = "email")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub academic_level: String,
    pub program_type: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub academic_level: Option<String>,
    pub program_type: Option<String>,
    pub status: Option<LifecycleStatus>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub total: usize,
}

fn filtered<'s>(students: &'s [Student], query: &StudentQuery) -> Vec<&'s Student> {
    StudentFilter {
        term: query.search.as_deref(),
        academic_level: query.academic_level.as_deref(),
        program_type: query.program_type.as_deref(),
    }
    .apply(students)
}

/// List Students
#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Filtered student list", body = StudentListResponse),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn list_students(
    auth: AuthUser,
    repos: web::Data<Repos>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let query = query.into_inner();
    let students = repos.students().list();
    let hits = filtered(&students, &query);

    Ok(HttpResponse::Ok().json(StudentListResponse {
        total: hits.len(),
        data: hits.into_iter().map(model::public_view).collect(),
    }))
}

/// Create Student (admin entry, same record shape as self-registration)
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created"),
        (status = 409, description = "Index number or email already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    auth: AuthUser,
    repos: web::Data<Repos>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.index_number.trim().is_empty() || payload.full_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        })));
    }

    let student = Student {
        id: Uuid::new_v4().to_string(),
        index_number: payload.index_number.trim().to_string(),
        full_name: payload.full_name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone,
        academic_level: payload.academic_level,
        program_type: payload.program_type,
        password: hash_password(&payload.password),
        status: LifecycleStatus::Active,
        registration_date: Utc::now(),
        enrolled_classes: vec![],
        password_changed_at: None,
    };

    match repos.students().insert(student) {
        Ok(student) => {
            identifier_filter::insert(&student.index_number);
            identifier_filter::insert(&student.email);
            identifier_cache::mark_taken(&student.index_number).await;
            identifier_cache::mark_taken(&student.email).await;

            Ok(HttpResponse::Created().json(json!({
                "message": "Student created successfully",
                "data": model::public_view(&student)
            })))
        }
        Err(RepoError::Duplicate(_)) => Ok(HttpResponse::Conflict().json(json!({
            "message": "A student with this index number or email already exists."
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

/// Get Student by ID
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn get_student(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    // Students may read their own record, everything else is admin-only.
    if !(auth.is_student() && auth.account_id == student_id) {
        auth.require_admin()?;
    }

    match repos.students().get(&student_id) {
        Some(student) => Ok(HttpResponse::Ok().json(model::public_view(&student))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
    }
}

/// Update Student
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn update_student(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<UpdateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_id = path.into_inner();
    let changes = payload.into_inner();

    let outcome = repos.students().update(&student_id, |student| {
        if let Some(full_name) = changes.full_name {
            student.full_name = full_name;
        }
        if let Some(email) = changes.email {
            student.email = email;
        }
        if changes.phone.is_some() {
            student.phone = changes.phone;
        }
        if let Some(level) = changes.academic_level {
            student.academic_level = level;
        }
        if let Some(program) = changes.program_type {
            student.program_type = program;
        }
        if let Some(status) = changes.status {
            student.status = status;
        }
    });

    match outcome {
        Ok(student) => Ok(HttpResponse::Ok().json(json!({
            "message": "Student updated successfully",
            "data": model::public_view(&student)
        }))),
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
        Err(e) => {
            error!(error = %e, student_id, "Failed to update student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Delete Student
#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn delete_student(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_id = path.into_inner();
    match repos.students().remove(&student_id) {
        Ok(student) => {
            identifier_filter::remove(&student.index_number);
            identifier_filter::remove(&student.email);
            identifier_cache::release(&student.index_number).await;
            identifier_cache::release(&student.email).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
        Err(e) => {
            error!(error = %e, student_id, "Failed to delete student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Export the filtered roster as CSV
#[utoipa::path(
    get,
    path = "/api/v1/students/export",
    params(StudentQuery),
    responses((status = 200, description = "CSV document", content_type = "text/csv")),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn export_students_csv(
    auth: AuthUser,
    repos: web::Data<Repos>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    const COLUMNS: [Column; 7] = [
        Column::plain("Index Number"),
        Column::quoted("Full Name"),
        Column::plain("Email"),
        Column::plain("Phone"),
        Column::plain("Academic Level"),
        Column::plain("Program Type"),
        Column::plain("Registration Date"),
    ];

    let query = query.into_inner();
    let students = repos.students().list();
    let rows: Vec<Vec<String>> = filtered(&students, &query)
        .into_iter()
        .map(|student| {
            vec![
                student.index_number.clone(),
                student.full_name.clone(),
                student.email.clone(),
                student.phone.clone().unwrap_or_default(),
                student.academic_level.clone(),
                student.program_type.clone(),
                student.registration_date.date_naive().to_string(),
            ]
        })
        .collect();

    let body = csv_export::render(&COLUMNS, &rows);
    Ok(csv_export::attachment(
        &csv_export::dated_filename("students"),
        body,
    ))
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttendanceReport {
    pub class_id: String,
    pub class_name: String,
    pub class_code: String,
    pub instructor: String,
    pub total_sessions: u32,
    pub attended_sessions: u32,
    pub attendance_rate: u32,
    /// Most recent five sessions, newest first.
    pub recent_attendance: Vec<RecentAttendance>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentAttendance {
    #[schema(value_type = String, format = "date")]
    pub date: chrono::NaiveDate,
    pub status: crate::model::AttendanceStatus,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceResponse {
    pub data: Vec<ClassAttendanceReport>,
    pub overall_attendance_rate: u32,
    pub total_sessions: u32,
    pub total_attended: u32,
}

/// Per-class attendance summary for one student (the student-portal view).
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/attendance",
    params(("student_id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Per-class attendance summary", body = StudentAttendanceResponse),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn student_attendance(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    if !(auth.is_student() && auth.account_id == student_id) {
        auth.require_teacher_or_admin()?;
    }

    let Some(student) = repos.students().get(&student_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    };

    let classes = repos.classes().list();

    // Group this student's entries by class, keeping session order by date.
    let mut per_class: BTreeMap<String, Vec<(chrono::NaiveDate, crate::model::AttendanceStatus)>> =
        BTreeMap::new();
    for session in repos.attendance().list() {
        if let Some(entry) = session
            .entries
            .iter()
            .find(|e| e.index_number.eq_ignore_ascii_case(&student.index_number))
        {
            per_class
                .entry(session.class_id.clone())
                .or_default()
                .push((session.date, entry.status));
        }
    }

    let mut reports = Vec::new();
    for (class_id, mut attendance) in per_class {
        attendance.sort_by_key(|(date, _)| *date);

        let total_sessions = attendance.len() as u32;
        let attended_sessions = attendance
            .iter()
            .filter(|(_, status)| *status == crate::model::AttendanceStatus::Present)
            .count() as u32;

        // Dangling class references render as "Unknown".
        let class = classes.iter().find(|c| c.id == class_id);
        let recent_attendance = attendance
            .iter()
            .rev()
            .take(5)
            .map(|(date, status)| RecentAttendance {
                date: *date,
                status: *status,
            })
            .collect();

        reports.push(ClassAttendanceReport {
            class_id,
            class_name: class.map_or("Unknown Class".to_string(), |c| c.class_name.clone()),
            class_code: class.map_or("Unknown".to_string(), |c| c.class_code.clone()),
            instructor: class.map_or("Unknown".to_string(), |c| c.teacher_name.clone()),
            total_sessions,
            attended_sessions,
            attendance_rate: attendance_stats::rate(attended_sessions, total_sessions),
            recent_attendance,
        });
    }

    let rates: Vec<u32> = reports.iter().map(|r| r.attendance_rate).collect();
    let response = StudentAttendanceResponse {
        overall_attendance_rate: attendance_stats::average_rate(&rates),
        total_sessions: reports.iter().map(|r| r.total_sessions).sum(),
        total_attended: reports.iter().map(|r| r.attended_sessions).sum(),
        data: reports,
    };

    Ok(HttpResponse::Ok().json(response))
}

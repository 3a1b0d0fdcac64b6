use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::model::{AttendanceEntry, AttendanceSession, AttendanceStatus};
use crate::store::repos::{RepoError, Repos};
use crate::utils::attendance_stats;
use crate::utils::csv_export::{self, Column};
use crate::utils::roster_filter;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub entries: Vec<EntryInput>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub student_id: String,
    #[schema(example = "CS/2024/001")]
    pub index_number: String,
    pub full_name: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    /// Exact session date
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    /// Substring over entry names and index numbers
    pub search: Option<String>,
}

/// Post-hoc correction: a map of student id to new status, the shape the
/// edit screen produces.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionRequest {
    pub statuses: HashMap<String, AttendanceStatus>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuickMarkRequest {
    #[schema(example = "CS/2024/001")]
    pub index_number: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub student_id: String,
}

#[derive(Debug, PartialEq)]
enum QuickMarkError {
    UnknownStudent,
    AlreadyPresent,
}

fn recompute(session: &mut AttendanceSession) {
    let summary = attendance_stats::summarize(&session.entries);
    session.present_count = summary.present_count;
    session.total_count = summary.total_count;
    session.attendance_rate = summary.rate;
}

/// Quick-entry by index number. Unknown students are an error, and so is
/// marking someone who is already present.
fn apply_quick_mark(session: &mut AttendanceSession, index_number: &str) -> Result<String, QuickMarkError> {
    let entry = session
        .entries
        .iter_mut()
        .find(|e| e.index_number.eq_ignore_ascii_case(index_number))
        .ok_or(QuickMarkError::UnknownStudent)?;

    if entry.status == AttendanceStatus::Present {
        return Err(QuickMarkError::AlreadyPresent);
    }

    entry.status = AttendanceStatus::Present;
    let name = entry.full_name.clone();
    recompute(session);
    Ok(name)
}

/// Toggle flips present <-> absent for one student; repeating it restores the
/// original state.
fn apply_toggle(session: &mut AttendanceSession, student_id: &str) -> Option<AttendanceStatus> {
    let entry = session
        .entries
        .iter_mut()
        .find(|e| e.student_id == student_id)?;

    entry.status = match entry.status {
        AttendanceStatus::Present => AttendanceStatus::Absent,
        AttendanceStatus::Absent => AttendanceStatus::Present,
    };
    let status = entry.status;
    recompute(session);
    Some(status)
}

fn apply_statuses(session: &mut AttendanceSession, statuses: &HashMap<String, AttendanceStatus>) {
    for entry in &mut session.entries {
        if let Some(status) = statuses.get(&entry.student_id) {
            entry.status = *status;
        }
    }
    recompute(session);
}

/// Re-derives the class display snapshot (session count and average rate)
/// from the stored sessions. Dangling class references are quietly skipped.
fn refresh_class_aggregates(repos: &Repos, class_id: &str) {
    let sessions = repos.attendance().for_class(class_id);
    let rates: Vec<u32> = sessions.iter().map(|s| s.attendance_rate).collect();
    let total_sessions = sessions.len() as u32;
    let average = attendance_stats::average_rate(&rates);

    let _ = repos.classes().update(class_id, |class| {
        class.total_sessions = total_sessions;
        class.attendance_rate = average;
    });
}

/// Record a session for a class and date
#[utoipa::path(
    post,
    path = "/api/v1/classes/{class_id}/attendance",
    params(("class_id", Path, description = "Class ID")),
    request_body = SaveSessionRequest,
    responses(
        (status = 201, description = "Attendance saved", body = AttendanceSession),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Attendance for this date already recorded")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn save_session(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<SaveSessionRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let class_id = path.into_inner();
    if repos.classes().get(&class_id).is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        })));
    }

    let payload = payload.into_inner();
    let entries: Vec<AttendanceEntry> = payload
        .entries
        .into_iter()
        .map(|entry| AttendanceEntry {
            student_id: entry.student_id,
            index_number: entry.index_number,
            full_name: entry.full_name,
            status: entry.status,
        })
        .collect();

    let summary = attendance_stats::summarize(&entries);
    let session = AttendanceSession {
        id: Uuid::new_v4().to_string(),
        class_id: class_id.clone(),
        date: payload.date,
        entries,
        present_count: summary.present_count,
        total_count: summary.total_count,
        attendance_rate: summary.rate,
        recorded_by: auth.identifier.clone(),
        recorded_at: Utc::now(),
    };

    match repos.attendance().insert(session) {
        Ok(session) => {
            refresh_class_aggregates(repos.get_ref(), &class_id);
            Ok(HttpResponse::Created().json(json!({
                "message": "Attendance saved successfully!",
                "data": session
            })))
        }
        Err(RepoError::Duplicate(_)) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Attendance for this date has already been recorded."
        }))),
        Err(e) => {
            error!(error = %e, class_id, "Failed to save attendance");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save attendance. Please try again."
            })))
        }
    }
}

/// List a class's sessions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/classes/{class_id}/attendance",
    params(("class_id", Path, description = "Class ID"), SessionQuery),
    responses((status = 200, description = "Recorded sessions")),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_sessions(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    query: web::Query<SessionQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let sessions = repos.attendance().for_class(&path.into_inner());
    let mut hits: Vec<&AttendanceSession> =
        roster_filter::filter_sessions(&sessions, query.date, query.search.as_deref());
    hits.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(HttpResponse::Ok().json(json!({
        "data": hits,
        "total": hits.len()
    })))
}

/// Edit a saved session's entries
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{session_id}",
    params(("session_id", Path, description = "Session ID")),
    request_body = EditSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = AttendanceSession),
        (status = 404, description = "Session not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn edit_session(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<EditSessionRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let session_id = path.into_inner();
    let statuses = payload.into_inner().statuses;

    let outcome = repos.attendance().update(&session_id, |session| {
        apply_statuses(session, &statuses);
    });

    match outcome {
        Ok(session) => {
            refresh_class_aggregates(repos.get_ref(), &session.class_id);
            Ok(HttpResponse::Ok().json(json!({
                "message": "Attendance record updated successfully!",
                "data": session
            })))
        }
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        }))),
        Err(e) => {
            error!(error = %e, session_id, "Failed to update attendance record");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to update attendance record."
            })))
        }
    }
}

/// Quick-mark one student present by index number
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{session_id}/mark",
    params(("session_id", Path, description = "Session ID")),
    request_body = QuickMarkRequest,
    responses(
        (status = 200, description = "Student marked present"),
        (status = 400, description = "Unknown student or already present"),
        (status = 404, description = "Session not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn quick_mark(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<QuickMarkRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let session_id = path.into_inner();
    let index_number = payload.index_number.trim().to_string();
    if index_number.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please enter an index number."
        })));
    }

    let Some(mut session) = repos.attendance().get(&session_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    match apply_quick_mark(&mut session, &index_number) {
        Ok(name) => match repos.attendance().replace(session) {
            Ok(session) => {
                refresh_class_aggregates(repos.get_ref(), &session.class_id);
                Ok(HttpResponse::Ok().json(json!({
                    "message": format!("{name} marked present."),
                    "data": session
                })))
            }
            Err(e) => {
                error!(error = %e, session_id, "Failed to store quick mark");
                Ok(HttpResponse::InternalServerError().json(json!({
                    "message": "Failed to save attendance. Please try again."
                })))
            }
        },
        Err(QuickMarkError::UnknownStudent) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Student not found in this class."
        }))),
        Err(QuickMarkError::AlreadyPresent) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Student already marked present."
        }))),
    }
}

/// Toggle one student's status
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{session_id}/toggle",
    params(("session_id", Path, description = "Session ID")),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Status flipped"),
        (status = 404, description = "Session or student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn toggle_status(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<ToggleRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let session_id = path.into_inner();
    let Some(mut session) = repos.attendance().get(&session_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let Some(status) = apply_toggle(&mut session, &payload.student_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found in this session"
        })));
    };

    match repos.attendance().replace(session) {
        Ok(session) => {
            refresh_class_aggregates(repos.get_ref(), &session.class_id);
            Ok(HttpResponse::Ok().json(json!({
                "status": status,
                "data": session
            })))
        }
        Err(e) => {
            error!(error = %e, session_id, "Failed to store toggle");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save attendance. Please try again."
            })))
        }
    }
}

/// Export a class's full attendance history as CSV
#[utoipa::path(
    get,
    path = "/api/v1/classes/{class_id}/attendance/export",
    params(("class_id", Path, description = "Class ID")),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_class_csv(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let class_id = path.into_inner();
    let Some(class) = repos.classes().get(&class_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        })));
    };

    const COLUMNS: [Column; 4] = [
        Column::plain("Date"),
        Column::plain("Index Number"),
        Column::quoted("Student Name"),
        Column::plain("Status"),
    ];

    let rows: Vec<Vec<String>> = repos
        .attendance()
        .for_class(&class_id)
        .iter()
        .flat_map(|session| {
            session.entries.iter().map(|entry| {
                vec![
                    session.date.to_string(),
                    entry.index_number.clone(),
                    entry.full_name.clone(),
                    entry.status.to_string(),
                ]
            })
        })
        .collect();

    let body = csv_export::render(&COLUMNS, &rows);
    let filename = format!("{}_attendance_records.csv", class.class_code);
    Ok(csv_export::attachment(&filename, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(student_id: &str, index_number: &str, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            student_id: student_id.to_string(),
            index_number: index_number.to_string(),
            full_name: format!("Student {student_id}"),
            status,
        }
    }

    fn session() -> AttendanceSession {
        let entries = vec![
            entry("s1", "CS/2024/001", AttendanceStatus::Present),
            entry("s2", "CS/2024/002", AttendanceStatus::Absent),
            entry("s3", "CS/2024/003", AttendanceStatus::Absent),
        ];
        let summary = attendance_stats::summarize(&entries);

        AttendanceSession {
            id: "sess-1".to_string(),
            class_id: "class-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entries,
            present_count: summary.present_count,
            total_count: summary.total_count,
            attendance_rate: summary.rate,
            recorded_by: "smith".to_string(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn quick_mark_flips_absent_to_present_and_recomputes() {
        let mut session = session();
        let name = apply_quick_mark(&mut session, "cs/2024/002").unwrap();

        assert_eq!(name, "Student s2");
        assert_eq!(session.present_count, 2);
        assert_eq!(session.attendance_rate, 67);
    }

    #[test]
    fn quick_mark_rejects_already_present_student() {
        let mut session = session();
        let outcome = apply_quick_mark(&mut session, "CS/2024/001");

        assert_eq!(outcome, Err(QuickMarkError::AlreadyPresent));
        assert_eq!(session.present_count, 1);
    }

    #[test]
    fn quick_mark_rejects_unknown_student() {
        let mut session = session();
        let outcome = apply_quick_mark(&mut session, "CS/2024/999");

        assert_eq!(outcome, Err(QuickMarkError::UnknownStudent));
    }

    #[test]
    fn toggle_twice_restores_original_state() {
        let mut session = session();

        assert_eq!(
            apply_toggle(&mut session, "s1"),
            Some(AttendanceStatus::Absent)
        );
        assert_eq!(session.present_count, 0);

        assert_eq!(
            apply_toggle(&mut session, "s1"),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(session.present_count, 1);
        assert_eq!(session.attendance_rate, 33);
    }

    #[test]
    fn edit_applies_status_map_and_recomputes() {
        let mut session = session();
        let statuses = HashMap::from([
            ("s2".to_string(), AttendanceStatus::Present),
            ("s3".to_string(), AttendanceStatus::Present),
        ]);

        apply_statuses(&mut session, &statuses);
        assert_eq!(session.present_count, 3);
        assert_eq!(session.attendance_rate, 100);
    }
}

use actix_web::{Responder, web};
use actix_web::HttpResponse;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::classes::visible_classes;
use crate::auth::auth::AuthUser;
use crate::model::AttendanceSession;
use crate::store::repos::Repos;
use crate::utils::attendance_stats::{self, RateBand};
use crate::utils::csv_export;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_classes: usize,
    pub total_students: usize,
    pub total_sessions: usize,
    /// Rounded mean of the persisted per-session rates.
    pub average_attendance: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub rate: u32,
    pub present: u32,
    pub total: u32,
    pub band: RateBand,
}

/// Sessions belonging to the caller's visible classes.
fn visible_sessions(auth: &AuthUser, repos: &Repos) -> Vec<AttendanceSession> {
    let class_ids: Vec<String> = visible_classes(auth, repos)
        .into_iter()
        .map(|c| c.id)
        .collect();

    repos
        .attendance()
        .list()
        .into_iter()
        .filter(|s| class_ids.contains(&s.class_id))
        .collect()
}

fn overall_stats(auth: &AuthUser, repos: &Repos) -> OverallStats {
    let classes = visible_classes(auth, repos);
    let sessions = visible_sessions(auth, repos);
    let rates: Vec<u32> = sessions.iter().map(|s| s.attendance_rate).collect();

    OverallStats {
        total_classes: classes.len(),
        total_students: repos.students().list().len(),
        total_sessions: sessions.len(),
        average_attendance: attendance_stats::average_rate(&rates),
    }
}

/// Last-30-days sessions, oldest first.
fn trend_points(auth: &AuthUser, repos: &Repos) -> Vec<TrendPoint> {
    let cutoff = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(30))
        .unwrap_or(NaiveDate::MIN);

    let mut sessions: Vec<AttendanceSession> = visible_sessions(auth, repos)
        .into_iter()
        .filter(|s| s.date >= cutoff)
        .collect();
    sessions.sort_by_key(|s| s.date);

    sessions
        .into_iter()
        .map(|s| TrendPoint {
            date: s.date,
            rate: s.attendance_rate,
            present: s.present_count,
            total: s.total_count,
            band: attendance_stats::band(s.attendance_rate),
        })
        .collect()
}

/// Overall statistics
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    responses((status = 200, description = "Overall statistics", body = OverallStats)),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn summary(auth: AuthUser, repos: web::Data<Repos>) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;
    Ok(HttpResponse::Ok().json(overall_stats(&auth, repos.get_ref())))
}

/// Attendance trends over the last 30 days
#[utoipa::path(
    get,
    path = "/api/v1/reports/trends",
    responses((status = 200, description = "Daily attendance rates", body = [TrendPoint])),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn trends(auth: AuthUser, repos: web::Data<Repos>) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let points = trend_points(&auth, repos.get_ref());
    Ok(HttpResponse::Ok().json(json!({
        "data": points,
        "total": points.len()
    })))
}

/// Export the report document as CSV: a statistics block followed by the
/// 30-day trend table.
#[utoipa::path(
    get,
    path = "/api/v1/reports/export",
    responses((status = 200, description = "CSV document", content_type = "text/csv")),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export(auth: AuthUser, repos: web::Data<Repos>) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let stats = overall_stats(&auth, repos.get_ref());
    let trends = trend_points(&auth, repos.get_ref());

    let mut doc = String::from("Attendance Report\n\n");
    doc.push_str("Overall Statistics\n");
    doc.push_str(&format!("Total Classes,{}\n", stats.total_classes));
    doc.push_str(&format!("Total Students,{}\n", stats.total_students));
    doc.push_str(&format!("Total Sessions,{}\n", stats.total_sessions));
    doc.push_str(&format!("Average Attendance,{}%\n\n", stats.average_attendance));

    doc.push_str("Attendance Trends (Last 30 Days)\n");
    doc.push_str("Date,Attendance Rate,Present,Total\n");
    for point in &trends {
        doc.push_str(&format!(
            "{},{}%,{},{}\n",
            point.date, point.rate, point.present, point.total
        ));
    }

    Ok(csv_export::attachment(
        &csv_export::dated_filename("attendance-report"),
        doc,
    ))
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::AttendanceStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: String,
    pub index_number: String,
    pub full_name: String,
    pub status: AttendanceStatus,
}

/// One recorded class meeting: the roster snapshot for a date plus the
/// aggregate computed when it was saved. Post-hoc edits recompute the
/// aggregate from the entries.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub id: String,
    pub class_id: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    pub present_count: u32,
    pub total_count: u32,
    pub attendance_rate: u32,
    pub recorded_by: String,
    #[schema(value_type = String, format = "date-time")]
    pub recorded_at: DateTime<Utc>,
}

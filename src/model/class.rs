use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::LifecycleStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub class_name: String,
    /// Unique class code, e.g. `CS101`.
    pub class_code: String,
    pub department: String,
    // Denormalized teacher reference. Nothing re-checks it after creation, so
    // a deleted teacher leaves these dangling and views render "Unknown".
    pub teacher_id: String,
    pub teacher_name: String,
    pub teacher_username: String,
    #[serde(default)]
    pub description: String,
    pub credits: u32,
    pub max_students: u32,
    #[serde(default)]
    pub current_students: u32,
    #[serde(default)]
    pub room: String,
    pub days: Vec<String>,
    pub time_slot: String,
    /// Display string derived from `days` and `time_slot`.
    pub schedule: String,
    #[serde(default)]
    pub semester: String,
    pub academic_year: String,
    pub status: LifecycleStatus,
    /// Display snapshot: rounded average of the per-session rates. The
    /// session entries stay the source of truth.
    #[serde(default)]
    pub attendance_rate: u32,
    #[serde(default)]
    pub total_sessions: u32,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    /// Index numbers of enrolled students.
    #[serde(default)]
    pub students: Vec<String>,
}

impl Class {
    pub fn schedule_string(days: &[String], time_slot: &str) -> String {
        format!("{} - {}", days.join(", "), time_slot)
    }
}

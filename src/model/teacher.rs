use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::LifecycleStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub department: String,
    /// Unique staff identifier.
    pub employee_id: String,
    pub password: String,
    /// `pending` until an admin approves; rejection deletes the record.
    pub status: LifecycleStatus,
    #[schema(value_type = String, format = "date-time")]
    pub registration_date: DateTime<Utc>,
    /// Class codes assigned to this teacher.
    #[serde(default)]
    pub assigned_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub password_changed_at: Option<DateTime<Utc>>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::LifecycleStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    /// Unique enrollment identifier, also the login identifier.
    pub index_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub academic_level: String,
    pub program_type: String,
    pub password: String,
    pub status: LifecycleStatus,
    #[schema(value_type = String, format = "date-time")]
    pub registration_date: DateTime<Utc>,
    /// Class codes this student is enrolled in.
    #[serde(default)]
    pub enrolled_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub password_changed_at: Option<DateTime<Utc>>,
}

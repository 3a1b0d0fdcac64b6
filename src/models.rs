use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::Role;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "CS/2024/001")]
    pub identifier: String,
    pub password: String,
    /// Which collection to authenticate against.
    #[schema(value_type = String, example = "student")]
    pub user_type: Role,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminRequest {
    pub full_name: String,
    pub username: String,
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_institution")]
    pub institution: String,
}

fn default_department() -> String {
    "Computer Science".to_string()
}

fn default_institution() -> String {
    "KSTU".to_string()
}

/// Role-tagged registration payload. Students activate immediately, teachers
/// go into the pending queue until an admin approves them.
#[derive(Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RegisterRequest {
    Student(StudentRegistration),
    Teacher(TeacherRegistration),
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    #[schema(example = "CS/2024/001")]
    pub index_number: String,
    pub full_name: String,
    #[schema(format = "email")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[schema(example = "Level 100")]
    pub academic_level: String,
    #[schema(example = "regular")]
    pub program_type: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRegistration {
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

/// Relayed verbatim to the legacy PHP endpoint, so the field names keep its
/// snake_case convention.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LegacyRegisterRequest {
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_number: Option<String>,
    #[schema(value_type = String, example = "student")]
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

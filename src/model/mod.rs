pub mod admin;
pub mod attendance;
pub mod class;
pub mod role;
pub mod status;
pub mod student;
pub mod teacher;

pub use admin::Admin;
pub use attendance::{AttendanceEntry, AttendanceSession};
pub use class::Class;
pub use role::Role;
pub use status::{AttendanceStatus, LifecycleStatus};
pub use student::Student;
pub use teacher::Teacher;

use serde::Serialize;
use serde_json::Value;

/// Serializes a record for an API response with the password field removed.
pub fn public_view<T: Serialize>(record: &T) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Some(object) = value.as_object_mut() {
        object.remove("password");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn public_view_strips_password() {
        let student = Student {
            id: "s-1".to_string(),
            index_number: "CS/2024/001".to_string(),
            full_name: "Alice Johnson".to_string(),
            email: "alice@university.edu".to_string(),
            phone: None,
            academic_level: "Level 100".to_string(),
            program_type: "regular".to_string(),
            password: "secret-hash".to_string(),
            status: LifecycleStatus::Active,
            registration_date: Utc::now(),
            enrolled_classes: vec![],
            password_changed_at: None,
        };

        let view = public_view(&student);
        assert!(view.get("password").is_none());
        assert_eq!(view["indexNumber"], "CS/2024/001");
    }
}

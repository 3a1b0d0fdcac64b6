use crate::api::account::ChangePasswordRequest;
use crate::api::attendance::{
    EditSessionRequest, EntryInput, QuickMarkRequest, SaveSessionRequest, ToggleRequest,
};
use crate::api::classes::{
    ClassListResponse, CreateClass, EnrollRequest, UpdateClass,
};
use crate::api::reports::{OverallStats, TrendPoint};
use crate::api::students::{
    ClassAttendanceReport, CreateStudent, RecentAttendance, StudentAttendanceResponse,
    StudentListResponse, UpdateStudent,
};
use crate::api::teachers::{CreateTeacher, TeacherListResponse, UpdateTeacher};
use crate::model::{
    Admin, AttendanceEntry, AttendanceSession, AttendanceStatus, Class, LifecycleStatus, Student,
    Teacher,
};
use crate::models::{
    LegacyRegisterRequest, LoginRequest, SetupAdminRequest, StudentRegistration,
    TeacherRegistration,
};
use crate::utils::attendance_stats::{AttendanceSummary, RateBand};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Management API",
        version = "1.0.0",
        description = r#"
## Departmental Attendance Management System

This API powers the attendance management system of an academic department.

### 🔹 Key Features
- **Accounts**
  - Role-based registration and login for admins, teachers and students
  - Teacher approval workflow (pending → approved / rejected)
- **Roster Management**
  - Create, update, list, and search students, teachers and classes
- **Attendance**
  - Record a class session, quick-mark by index number, edit past sessions
- **Reports**
  - Overall statistics, 30-day trends, and CSV exports

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Sensitive operations are restricted to the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- CSV downloads for report endpoints

---
Built with **Rust**, **Actix Web**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::setup_admin,
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::legacy_register,

        crate::api::account::change_password,

        crate::api::students::list_students,
        crate::api::students::create_student,
        crate::api::students::get_student,
        crate::api::students::update_student,
        crate::api::students::delete_student,
        crate::api::students::export_students_csv,
        crate::api::students::student_attendance,

        crate::api::teachers::list_teachers,
        crate::api::teachers::pending_teachers,
        crate::api::teachers::create_teacher,
        crate::api::teachers::get_teacher,
        crate::api::teachers::update_teacher,
        crate::api::teachers::approve_teacher,
        crate::api::teachers::reject_teacher,
        crate::api::teachers::delete_teacher,

        crate::api::classes::list_classes,
        crate::api::classes::create_class,
        crate::api::classes::get_class,
        crate::api::classes::update_class,
        crate::api::classes::delete_class,
        crate::api::classes::enroll_student,

        crate::api::attendance::save_session,
        crate::api::attendance::list_sessions,
        crate::api::attendance::edit_session,
        crate::api::attendance::quick_mark,
        crate::api::attendance::toggle_status,
        crate::api::attendance::export_class_csv,

        crate::api::reports::summary,
        crate::api::reports::trends,
        crate::api::reports::export
    ),
    components(
        schemas(
            Admin,
            Student,
            Teacher,
            Class,
            AttendanceSession,
            AttendanceEntry,
            AttendanceStatus,
            LifecycleStatus,
            AttendanceSummary,
            RateBand,
            LoginRequest,
            SetupAdminRequest,
            StudentRegistration,
            TeacherRegistration,
            LegacyRegisterRequest,
            ChangePasswordRequest,
            CreateStudent,
            UpdateStudent,
            StudentListResponse,
            ClassAttendanceReport,
            RecentAttendance,
            StudentAttendanceResponse,
            CreateTeacher,
            UpdateTeacher,
            TeacherListResponse,
            CreateClass,
            UpdateClass,
            EnrollRequest,
            ClassListResponse,
            SaveSessionRequest,
            EntryInput,
            EditSessionRequest,
            QuickMarkRequest,
            ToggleRequest,
            OverallStats,
            TrendPoint
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token APIs"),
        (name = "Account", description = "Self-service account APIs"),
        (name = "Students", description = "Student roster APIs"),
        (name = "Teachers", description = "Teacher roster and approval APIs"),
        (name = "Classes", description = "Class management APIs"),
        (name = "Attendance", description = "Attendance recording APIs"),
        (name = "Reports", description = "Reporting and export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

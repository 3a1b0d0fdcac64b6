use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::model::{Class, LifecycleStatus, Role};
use crate::store::repos::{RepoError, Repos};
use crate::utils::roster_filter;
use crate::utils::{identifier_cache, identifier_filter};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassQuery {
    /// Case-insensitive substring over class name and code
    pub search: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClass {
    pub class_name: String,
    #[schema(example = "CS101")]
    pub class_code: String,
    pub department: String,
    pub teacher_id: String,
    #[serde(default)]
    pub description: String,
    pub credits: u32,
    pub max_students: u32,
    #[serde(default)]
    pub room: String,
    #[schema(example = json!(["Mon", "Wed", "Fri"]))]
    pub days: Vec<String>,
    #[schema(example = "9:00 AM")]
    pub time_slot: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub academic_year: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClass {
    pub class_name: Option<String>,
    pub department: Option<String>,
    pub teacher_id: Option<String>,
    pub description: Option<String>,
    pub credits: Option<u32>,
    pub max_students: Option<u32>,
    pub room: Option<String>,
    pub days: Option<Vec<String>>,
    pub time_slot: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub status: Option<LifecycleStatus>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[schema(example = "CS/2024/001")]
    pub index_number: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub total: usize,
}

/// Which classes this principal may see: admins all of them, teachers their
/// own, students the ones they are enrolled in. The original UI matched a
/// teacher's classes by several identifiers, so both id and username count.
pub fn visible_classes(auth: &AuthUser, repos: &Repos) -> Vec<Class> {
    let classes = repos.classes().list();
    match auth.role {
        Role::Admin => classes,
        Role::Teacher => classes
            .into_iter()
            .filter(|c| c.teacher_id == auth.account_id || c.teacher_username == auth.identifier)
            .collect(),
        Role::Student => classes
            .into_iter()
            .filter(|c| {
                c.students
                    .iter()
                    .any(|index| index.eq_ignore_ascii_case(&auth.identifier))
            })
            .collect(),
    }
}

/// List classes visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    params(ClassQuery),
    responses((status = 200, description = "Visible classes", body = ClassListResponse)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn list_classes(
    auth: AuthUser,
    repos: web::Data<Repos>,
    query: web::Query<ClassQuery>,
) -> impl Responder {
    let classes = visible_classes(&auth, repos.get_ref());
    let hits = roster_filter::filter_classes(&classes, query.search.as_deref());

    HttpResponse::Ok().json(ClassListResponse {
        total: hits.len(),
        data: hits
            .into_iter()
            .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
            .collect(),
    })
}

/// Create Class
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    request_body = CreateClass,
    responses(
        (status = 201, description = "Class created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Selected teacher not found"),
        (status = 409, description = "Class code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn create_class(
    auth: AuthUser,
    repos: web::Data<Repos>,
    payload: web::Json<CreateClass>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.class_name.trim().is_empty()
        || payload.class_code.trim().is_empty()
        || payload.department.trim().is_empty()
        || payload.days.is_empty()
        || payload.time_slot.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        })));
    }

    let Some(teacher) = repos.teachers().get(&payload.teacher_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Selected teacher not found."
        })));
    };

    let class = Class {
        id: Uuid::new_v4().to_string(),
        class_name: payload.class_name.trim().to_string(),
        class_code: payload.class_code.trim().to_string(),
        department: payload.department,
        teacher_id: teacher.id.clone(),
        teacher_name: teacher.full_name.clone(),
        teacher_username: teacher.username.clone(),
        description: payload.description,
        credits: payload.credits,
        max_students: payload.max_students,
        current_students: 0,
        room: payload.room,
        schedule: Class::schedule_string(&payload.days, &payload.time_slot),
        days: payload.days,
        time_slot: payload.time_slot,
        semester: payload.semester,
        academic_year: payload
            .academic_year
            .unwrap_or_else(|| Utc::now().year().to_string()),
        status: LifecycleStatus::Active,
        attendance_rate: 0,
        total_sessions: 0,
        created_at: Utc::now(),
        created_by: auth.identifier.clone(),
        students: vec![],
    };

    match repos.classes().insert(class) {
        Ok(class) => {
            identifier_filter::insert(&class.class_code);
            identifier_cache::mark_taken(&class.class_code).await;

            // Keep the teacher's assignment list in step.
            let _ = repos.teachers().update(&class.teacher_id, |t| {
                if !t.assigned_classes.contains(&class.class_code) {
                    t.assigned_classes.push(class.class_code.clone());
                }
            });

            Ok(HttpResponse::Created().json(json!({
                "message": format!(
                    "Class \"{}\" created successfully! Class Code: {}",
                    class.class_name, class.class_code
                ),
                "data": class
            })))
        }
        Err(RepoError::Duplicate(_)) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Class code already exists. Please use a different one."
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create class");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

/// Get Class by ID
#[utoipa::path(
    get,
    path = "/api/v1/classes/{class_id}",
    params(("class_id", Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class found", body = Class),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn get_class(
    _auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> impl Responder {
    match repos.classes().get(&path.into_inner()) {
        Some(class) => HttpResponse::Ok().json(class),
        None => HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        })),
    }
}

/// Update Class
#[utoipa::path(
    put,
    path = "/api/v1/classes/{class_id}",
    params(("class_id", Path, description = "Class ID")),
    request_body = UpdateClass,
    responses(
        (status = 200, description = "Class updated"),
        (status = 404, description = "Class or selected teacher not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn update_class(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<UpdateClass>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let class_id = path.into_inner();
    let changes = payload.into_inner();

    // Reassignment must point at a real teacher; everything else stays
    // denormalized and unchecked.
    let new_teacher = match &changes.teacher_id {
        Some(teacher_id) => match repos.teachers().get(teacher_id) {
            Some(teacher) => Some(teacher),
            None => {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Selected teacher not found."
                })));
            }
        },
        None => None,
    };

    let outcome = repos.classes().update(&class_id, |class| {
        if let Some(class_name) = changes.class_name {
            class.class_name = class_name;
        }
        if let Some(department) = changes.department {
            class.department = department;
        }
        if let Some(teacher) = new_teacher {
            class.teacher_id = teacher.id;
            class.teacher_name = teacher.full_name;
            class.teacher_username = teacher.username;
        }
        if let Some(description) = changes.description {
            class.description = description;
        }
        if let Some(credits) = changes.credits {
            class.credits = credits;
        }
        if let Some(max_students) = changes.max_students {
            class.max_students = max_students;
        }
        if let Some(room) = changes.room {
            class.room = room;
        }
        if let Some(days) = changes.days {
            class.days = days;
        }
        if let Some(time_slot) = changes.time_slot {
            class.time_slot = time_slot;
        }
        if let Some(semester) = changes.semester {
            class.semester = semester;
        }
        if let Some(academic_year) = changes.academic_year {
            class.academic_year = academic_year;
        }
        if let Some(status) = changes.status {
            class.status = status;
        }
        class.schedule = Class::schedule_string(&class.days, &class.time_slot);
    });

    match outcome {
        Ok(class) => Ok(HttpResponse::Ok().json(json!({
            "message": "Class updated successfully",
            "data": class
        }))),
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        }))),
        Err(e) => {
            error!(error = %e, class_id, "Failed to update class");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Delete Class
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{class_id}",
    params(("class_id", Path, description = "Class ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn delete_class(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let class_id = path.into_inner();
    match repos.classes().remove(&class_id) {
        Ok(class) => {
            identifier_filter::remove(&class.class_code);
            identifier_cache::release(&class.class_code).await;

            // Recorded sessions keep their classId; views render them as
            // "Unknown" rather than cascading a delete.
            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(RepoError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        }))),
        Err(e) => {
            error!(error = %e, class_id, "Failed to delete class");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Enroll a student into a class
#[utoipa::path(
    post,
    path = "/api/v1/classes/{class_id}/enroll",
    params(("class_id", Path, description = "Class ID")),
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Student enrolled"),
        (status = 400, description = "Class is full"),
        (status = 404, description = "Class or student not found"),
        (status = 409, description = "Student already enrolled")
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn enroll_student(
    auth: AuthUser,
    repos: web::Data<Repos>,
    path: web::Path<String>,
    payload: web::Json<EnrollRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let class_id = path.into_inner();
    let Some(class) = repos.classes().get(&class_id) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Class not found"
        })));
    };

    let Some(student) = repos.students().find_by_index(payload.index_number.trim()) else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    };

    if class
        .students
        .iter()
        .any(|index| index.eq_ignore_ascii_case(&student.index_number))
    {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Student is already enrolled in this class."
        })));
    }

    if class.current_students >= class.max_students {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Class is full."
        })));
    }

    let index_number = student.index_number.clone();
    let class_code = class.class_code.clone();

    let updated = repos.classes().update(&class_id, |class| {
        class.students.push(index_number.clone());
        class.current_students += 1;
    });

    if let Err(e) = updated {
        error!(error = %e, class_id, "Failed to enroll student");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "message": "Internal Server Error"
        })));
    }

    let _ = repos.students().update(&student.id, |student| {
        if !student.enrolled_classes.contains(&class_code) {
            student.enrolled_classes.push(class_code.clone());
        }
    });

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} enrolled in {}", student.full_name, class.class_name)
    })))
}

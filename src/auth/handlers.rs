use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
        revocation,
    },
    config::Config,
    model::{self, Admin, LifecycleStatus, Role, Student, Teacher},
    models::{
        LegacyRegisterRequest, LoginRequest, RegisterRequest, SetupAdminRequest, TokenType,
    },
    store::repos::{RepoError, Repos},
    utils::{identifier_cache, identifier_filter},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// true  => identifier AVAILABLE
/// false => identifier TAKEN
pub async fn is_identifier_available(identifier: &str, repos: &Repos) -> bool {
    let identifier = identifier.to_lowercase();

    // 1️⃣ Cuckoo filter — fast negative
    if !identifier_filter::might_exist(&identifier) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if identifier_cache::is_taken(&identifier).await {
        return false;
    }

    // 3️⃣ Record store fallback
    !identifier_filter::taken_identifiers(repos).contains(&identifier)
}

async fn claim_identifiers(identifiers: &[&str]) {
    for identifier in identifiers {
        identifier_filter::insert(identifier);
        identifier_cache::mark_taken(identifier).await;
    }
}

/// First-run admin creation. Refused once an admin record exists.
#[utoipa::path(
    post,
    path = "/auth/setup-admin",
    request_body = SetupAdminRequest,
    responses(
        (status = 201, description = "Admin account created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "An admin account already exists")
    ),
    tag = "Auth"
)]
pub async fn setup_admin(
    repos: web::Data<Repos>,
    payload: web::Json<SetupAdminRequest>,
) -> impl Responder {
    let payload = payload.into_inner();

    if payload.full_name.trim().is_empty()
        || payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
    {
        return HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        }));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return HttpResponse::BadRequest().json(json!({
            "message": "Password must be at least 6 characters long"
        }));
    }
    if payload.password != payload.confirm_password {
        return HttpResponse::BadRequest().json(json!({
            "message": "Passwords do not match"
        }));
    }

    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        full_name: payload.full_name.trim().to_string(),
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        password: hash_password(&payload.password),
        department: payload.department,
        institution: payload.institution,
        role: "super_admin".to_string(),
        created_at: Utc::now(),
        password_changed_at: None,
    };

    match repos.admin().create(admin) {
        Ok(admin) => {
            claim_identifiers(&[&admin.username, &admin.email]).await;
            HttpResponse::Created().json(json!({
                "message": "Admin account created successfully"
            }))
        }
        Err(RepoError::Duplicate(_)) => HttpResponse::Conflict().json(json!({
            "message": "An admin account already exists."
        })),
        Err(e) => {
            error!(error = %e, "Failed to create admin account");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}

/// Role-tagged self-registration: a `StudentRegistration` or
/// `TeacherRegistration` body with a `role` discriminator field.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = Object,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Identifier already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    repos: web::Data<Repos>,
    payload: web::Json<RegisterRequest>,
) -> impl Responder {
    match payload.into_inner() {
        RegisterRequest::Student(registration) => {
            register_student(repos.get_ref(), registration).await
        }
        RegisterRequest::Teacher(registration) => {
            register_teacher(repos.get_ref(), registration).await
        }
    }
}

async fn register_student(
    repos: &Repos,
    registration: crate::models::StudentRegistration,
) -> HttpResponse {
    let index_number = registration.index_number.trim();

    if index_number.is_empty()
        || registration.full_name.trim().is_empty()
        || registration.email.trim().is_empty()
    {
        return HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        }));
    }
    if registration.password.len() < MIN_PASSWORD_LEN {
        return HttpResponse::BadRequest().json(json!({
            "message": "Password must be at least 6 characters long."
        }));
    }

    if !is_identifier_available(index_number, repos).await {
        return HttpResponse::Conflict().json(json!({
            "message": "A student with this index number or email already exists."
        }));
    }

    let student = Student {
        id: Uuid::new_v4().to_string(),
        index_number: index_number.to_string(),
        full_name: registration.full_name.trim().to_string(),
        email: registration.email.trim().to_string(),
        phone: registration.phone,
        academic_level: registration.academic_level,
        program_type: registration.program_type,
        password: hash_password(&registration.password),
        status: LifecycleStatus::Active,
        registration_date: Utc::now(),
        enrolled_classes: vec![],
        password_changed_at: None,
    };

    match repos.students().insert(student) {
        Ok(student) => {
            claim_identifiers(&[&student.index_number, &student.email]).await;
            HttpResponse::Created().json(json!({
                "message": "Registration successful! You can now log in with your index number and password."
            }))
        }
        Err(RepoError::Duplicate(_)) => HttpResponse::Conflict().json(json!({
            "message": "A student with this index number or email already exists."
        })),
        Err(e) => {
            error!(error = %e, "Failed to register student");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}

async fn register_teacher(
    repos: &Repos,
    registration: crate::models::TeacherRegistration,
) -> HttpResponse {
    let username = registration.username.trim();

    if username.is_empty()
        || registration.full_name.trim().is_empty()
        || registration.email.trim().is_empty()
        || registration.employee_id.trim().is_empty()
    {
        return HttpResponse::BadRequest().json(json!({
            "message": "Please fill in all required fields."
        }));
    }
    if registration.password.len() < MIN_PASSWORD_LEN {
        return HttpResponse::BadRequest().json(json!({
            "message": "Password must be at least 6 characters long."
        }));
    }

    if !is_identifier_available(username, repos).await {
        return HttpResponse::Conflict().json(json!({
            "message": "A teacher with this username or email already exists."
        }));
    }

    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        full_name: registration.full_name.trim().to_string(),
        email: registration.email.trim().to_string(),
        phone: registration.phone,
        department: registration.department,
        employee_id: registration.employee_id.trim().to_string(),
        password: hash_password(&registration.password),
        // Requires admin approval
        status: LifecycleStatus::Pending,
        registration_date: Utc::now(),
        assigned_classes: vec![],
        password_changed_at: None,
    };

    match repos.teachers().insert(teacher) {
        Ok(teacher) => {
            claim_identifiers(&[&teacher.username, &teacher.employee_id, &teacher.email]).await;
            HttpResponse::Created().json(json!({
                "message": "Registration submitted successfully! Your account is pending admin approval. You will be notified once approved."
            }))
        }
        Err(RepoError::Duplicate("employee id")) => HttpResponse::Conflict().json(json!({
            "message": "A teacher with this employee ID already exists."
        })),
        Err(RepoError::Duplicate(_)) => HttpResponse::Conflict().json(json!({
            "message": "A teacher with this username or email already exists."
        })),
        Err(e) => {
            error!(error = %e, "Failed to register teacher");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user: serde_json::Value,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; returns token pair and the principal"),
        (status = 401, description = "Invalid credentials or account not approved")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(repos, config, payload),
    fields(identifier = %payload.identifier, user_type = %payload.user_type)
)]
pub async fn login(
    repos: web::Data<Repos>,
    config: web::Data<Config>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    info!("Login request received");

    if payload.identifier.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty identifier or password");
        return HttpResponse::BadRequest().body("Identifier or password required");
    }

    debug!("Fetching account from record store");

    let (account_id, identifier, user) = match payload.user_type {
        Role::Admin => {
            let Some(admin) = repos.admin().get() else {
                return HttpResponse::Unauthorized().json(json!({
                    "message": "No admin account found. Please set up an admin account first."
                }));
            };
            let matches = admin.username == payload.identifier || admin.email == payload.identifier;
            if !matches || !verify_password(&payload.password, &admin.password) {
                info!("Invalid credentials: admin mismatch");
                return HttpResponse::Unauthorized().json(json!({
                    "message": "Invalid admin credentials"
                }));
            }
            (admin.id.clone(), admin.username.clone(), model::public_view(&admin))
        }
        Role::Teacher => {
            let teacher = repos
                .teachers()
                .find_by_login(payload.identifier.trim())
                .filter(|t| verify_password(&payload.password, &t.password))
                .filter(|t| t.status == LifecycleStatus::Approved);

            match teacher {
                Some(teacher) => (
                    teacher.id.clone(),
                    teacher.username.clone(),
                    model::public_view(&teacher),
                ),
                None => {
                    info!("Invalid credentials: teacher mismatch or not approved");
                    return HttpResponse::Unauthorized().json(json!({
                        "message": "Invalid teacher credentials or account not approved"
                    }));
                }
            }
        }
        Role::Student => {
            let student = repos
                .students()
                .find_by_login(payload.identifier.trim())
                .filter(|s| verify_password(&payload.password, &s.password))
                .filter(|s| s.status == LifecycleStatus::Active);

            match student {
                Some(student) => (
                    student.id.clone(),
                    student.index_number.clone(),
                    model::public_view(&student),
                ),
                None => {
                    info!("Invalid credentials: student mismatch");
                    return HttpResponse::Unauthorized().json(json!({
                        "message": "Invalid student credentials"
                    }));
                }
            }
        }
    };

    debug!("Credentials verified, generating tokens");

    let access_token = generate_access_token(
        &account_id,
        &identifier,
        payload.user_type,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let (refresh_token, _refresh_claims) = generate_refresh_token(
        &account_id,
        &identifier,
        payload.user_type,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    // Clients keep the logged-in principal around with a `type`
    // discriminator, so it rides along with the token pair.
    let mut user = user;
    if let Some(object) = user.as_object_mut() {
        object.insert("type".to_string(), json!(payload.user_type));
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair"),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh_token(req: HttpRequest, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    if revocation::is_revoked(&claims.jti) {
        return HttpResponse::Unauthorized().finish();
    }

    let Some(role) = Role::from_id(claims.role) else {
        return HttpResponse::Unauthorized().finish();
    };

    // 🔥 revoke old refresh token
    revocation::revoke(&claims.jti);

    // 🔄 issue new pair
    let (new_refresh_token, _new_claims) = generate_refresh_token(
        &claims.user_id,
        &claims.sub,
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    let access_token = generate_access_token(
        &claims.user_id,
        &claims.sub,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    HttpResponse::Ok().json(json!({
        "accessToken": access_token,
        "refreshToken": new_refresh_token
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (idempotent)")),
    tag = "Auth"
)]
pub async fn logout(req: HttpRequest, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke refresh token (idempotent)
    revocation::revoke(&claims.jti);

    HttpResponse::NoContent().finish()
}

#[derive(Debug, Default, Deserialize)]
struct LegacyOutcome {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Relays a registration payload to the legacy PHP service, an external
/// collaborator with its own account store. No retry, and no local write
/// either way.
#[utoipa::path(
    post,
    path = "/auth/legacy-register",
    request_body = LegacyRegisterRequest,
    responses(
        (status = 200, description = "Legacy service accepted the registration"),
        (status = 400, description = "Legacy service rejected the registration"),
        (status = 502, description = "Legacy service unreachable"),
        (status = 503, description = "Relay not configured")
    ),
    tag = "Auth"
)]
pub async fn legacy_register(
    config: web::Data<Config>,
    payload: web::Json<LegacyRegisterRequest>,
) -> impl Responder {
    let Some(base_url) = config.legacy_register_url.as_deref() else {
        return HttpResponse::ServiceUnavailable().json(json!({
            "message": "Legacy registration is not configured"
        }));
    };

    let url = format!("{base_url}/register.php");
    let response = reqwest::Client::new()
        .post(&url)
        .json(&payload.into_inner())
        .send()
        .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, url = %url, "Legacy registration relay failed");
            return HttpResponse::BadGateway().json(json!({
                "message": "Could not connect to server."
            }));
        }
    };

    match response.json::<LegacyOutcome>().await {
        Ok(outcome) if outcome.success => HttpResponse::Ok().json(json!({
            "message": "Registration successful"
        })),
        Ok(outcome) => HttpResponse::BadRequest().json(json!({
            "message": outcome.error.unwrap_or_else(|| "Registration failed.".to_string())
        })),
        Err(e) => {
            error!(error = %e, url = %url, "Legacy registration returned an unreadable body");
            HttpResponse::BadGateway().json(json!({
                "message": "Could not connect to server."
            }))
        }
    }
}

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::model::Role;
use crate::store::repos::{RepoError, Repos};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change Password
#[utoipa::path(
    put,
    path = "/api/v1/account/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Password changed successfully!"
        })),
        (status = 400, description = "Current password incorrect or new password too short"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn change_password(
    auth: AuthUser,
    repos: web::Data<Repos>,
    payload: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    if payload.new_password.len() < 6 {
        return HttpResponse::BadRequest().json(json!({
            "message": "New password must be at least 6 characters long."
        }));
    }

    let stored_hash = match auth.role {
        Role::Admin => repos.admin().get().map(|a| a.password),
        Role::Teacher => repos.teachers().get(&auth.account_id).map(|t| t.password),
        Role::Student => repos.students().get(&auth.account_id).map(|s| s.password),
    };

    let Some(stored_hash) = stored_hash else {
        return HttpResponse::NotFound().json(json!({
            "message": "Account not found"
        }));
    };

    if !verify_password(&payload.current_password, &stored_hash) {
        return HttpResponse::BadRequest().json(json!({
            "message": "Current password is incorrect."
        }));
    }

    let new_hash = hash_password(&payload.new_password);
    let changed_at = Utc::now();

    let outcome = match auth.role {
        Role::Admin => repos
            .admin()
            .update(|admin| {
                admin.password = new_hash.clone();
                admin.password_changed_at = Some(changed_at);
            })
            .map(|_| ()),
        Role::Teacher => repos
            .teachers()
            .update(&auth.account_id, |teacher| {
                teacher.password = new_hash.clone();
                teacher.password_changed_at = Some(changed_at);
            })
            .map(|_| ()),
        Role::Student => repos
            .students()
            .update(&auth.account_id, |student| {
                student.password = new_hash.clone();
                student.password_changed_at = Some(changed_at);
            })
            .map(|_| ()),
    };

    match outcome {
        Ok(_) => HttpResponse::Ok().json(json!({
            "message": "Password changed successfully!"
        })),
        Err(RepoError::NotFound) => HttpResponse::NotFound().json(json!({
            "message": "Account not found"
        })),
        Err(e) => {
            error!(error = %e, account_id = %auth.account_id, "Password change failed");
            HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }))
        }
    }
}

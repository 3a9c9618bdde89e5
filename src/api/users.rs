use actix_web::{HttpResponse, web};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    CreateUserRequest, DeleteUserRequest, EditUserRequest, ErrorResponse, MessageResponse,
    UidResponse,
};
use crate::services::UserAdmin;

/// Create a user (or update the profile of an existing one)
#[utoipa::path(
    post,
    path = "/create-user",
    request_body(
        content = CreateUserRequest,
        description = "Identity and profile fields",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "User created or updated", body = UidResponse),
        (status = 400, description = "Email missing", body = ErrorResponse, example = json!({
            "error": "Email is required."
        })),
        (status = 500, description = "Identity provider or store failure", body = ErrorResponse, example = json!({
            "error": "The email address is already in use by another account."
        }))
    ),
    tag = "Users"
)]
#[instrument(
    name = "create_user",
    skip_all,
    fields(email = ?payload.email, editing = ?payload.is_editing)
)]
pub async fn create_user(
    admin: web::Data<UserAdmin>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    info!("Create user request received");

    let uid = admin.create_or_update_user(payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UidResponse { uid }))
}

/// Delete a user's profile documents, root document and identity
#[utoipa::path(
    post,
    path = "/delete-user",
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "User deleted", body = MessageResponse, example = json!({
            "message": "User 3f1c and Firestore data deleted successfully."
        })),
        (status = 400, description = "UID missing", body = ErrorResponse, example = json!({
            "error": "UID is required."
        })),
        (status = 500, description = "Identity provider or store failure", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(name = "delete_user", skip_all, fields(uid = ?payload.uid))]
pub async fn delete_user(
    admin: web::Data<UserAdmin>,
    payload: web::Json<DeleteUserRequest>,
) -> Result<HttpResponse, AppError> {
    admin.delete_user(payload.uid.as_deref()).await?;

    let uid = payload.uid.as_deref().unwrap_or_default();
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("User {uid} and Firestore data deleted successfully."),
    }))
}

/// Change a user's sign-in email and mirror it into the profile
#[utoipa::path(
    post,
    path = "/edit-user",
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "Email updated", body = MessageResponse, example = json!({
            "message": "Email updated successfully for user 3f1c."
        })),
        (status = 400, description = "UID or new email missing", body = ErrorResponse, example = json!({
            "error": "UID and new email are required."
        })),
        (status = 500, description = "Identity provider or store failure", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(name = "edit_user", skip_all, fields(uid = ?payload.uid))]
pub async fn edit_user(
    admin: web::Data<UserAdmin>,
    payload: web::Json<EditUserRequest>,
) -> Result<HttpResponse, AppError> {
    admin
        .update_email(payload.uid.as_deref(), payload.new_email.as_deref())
        .await?;

    let uid = payload.uid.as_deref().unwrap_or_default();
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Email updated successfully for user {uid}."),
    }))
}

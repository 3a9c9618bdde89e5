use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::Fields;

/// Body of `/create-user`. Everything is optional on the wire; the handler decides
/// what is required.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "jane@company.com")]
    pub email: Option<String>,
    /// Defaults to the configured default password.
    pub password: Option<String>,
    #[schema(value_type = Option<String>, example = "17")]
    pub no: Option<Value>,
    pub name: Option<String>,
    #[schema(example = "3201010101010001")]
    pub nik: Option<String>,
    pub gender: Option<String>,
    #[schema(example = "1990-05-17")]
    pub dob: Option<String>,
    pub pob: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    #[schema(example = "2024-01-02")]
    pub join_date: Option<String>,
    pub phone: Option<String>,
    /// With `uid`, updates the profile of an existing user instead of creating one.
    pub is_editing: Option<bool>,
    pub uid: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteUserRequest {
    pub uid: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRequest {
    pub uid: Option<String>,
    #[schema(example = "jane.doe@company.com")]
    pub new_email: Option<String>,
}

/// Body of the standalone identity server: account only, no profile.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateIdentityRequest {
    #[schema(example = "jane.doe@company.com")]
    pub email: Option<String>,
    #[schema(example = "s3cret-pass")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UidResponse {
    pub uid: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Delivery of a document update on `users/{userId}/leave_requests/{requestId}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveRequestEvent {
    #[schema(example = "users/u1/leave_requests/r1")]
    pub document: String,
    #[schema(value_type = Option<Object>)]
    pub before: Option<Fields>,
    #[schema(value_type = Option<Object>)]
    pub after: Option<Fields>,
}

use crate::models::{
    CreateUserRequest, DeleteUserRequest, EditUserRequest, ErrorResponse, LeaveRequestEvent,
    MessageResponse, UidResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Functions API",
        version = "1.0.0",
        description = r#"
## HRM back-office functions

Server-side companion of the HR web client.

### Key Features
- **User administration**
  - Create sign-in identities with a profile, update profiles, change email, delete users
- **Generated attendance**
  - Approved *Attendance Request* leave requests become daily clock-in/clock-out records
  - Rejecting the request afterwards removes them again

### Response Format
- Success bodies are endpoint-specific JSON
- Failures are always `{ "error": "<message>" }`
"#,
    ),
    paths(
        crate::api::users::create_user,
        crate::api::users::delete_user,
        crate::api::users::edit_user,

        crate::api::events::leave_request_updated
    ),
    components(
        schemas(
            CreateUserRequest,
            DeleteUserRequest,
            EditUserRequest,
            UidResponse,
            MessageResponse,
            ErrorResponse,
            LeaveRequestEvent
        )
    ),
    tags(
        (name = "Users", description = "Identity and profile administration"),
        (name = "Events", description = "Document store trigger deliveries"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/create-user",
            "/delete-user",
            "/edit-user",
            "/events/leave-request-updated",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}

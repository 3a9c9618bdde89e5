//! Document shapes and locations under `users/{uid}`.

pub mod attendance;
pub mod leave_request;
pub mod user;

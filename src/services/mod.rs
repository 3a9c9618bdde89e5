pub mod attendance;
pub mod export;
pub mod user_admin;

pub use attendance::{AttendanceMaterializer, LeaveRequestUpdate, MaterializeError, Outcome};
pub use user_admin::UserAdmin;

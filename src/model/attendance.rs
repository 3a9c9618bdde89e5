use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::user::user_doc;
use crate::store::CollectionPath;

pub const ATTENDANCE: &str = "attendance";

/// `users/{uid}/attendance`
pub fn attendance_collection(uid: &str) -> CollectionPath {
    user_doc(uid).collection(ATTENDANCE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ActivityType {
    #[serde(rename = "Clock In")]
    #[strum(serialize = "Clock In")]
    ClockIn,
    #[serde(rename = "Clock Out")]
    #[strum(serialize = "Clock Out")]
    ClockOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub activity_type: ActivityType,
    pub uploaded_at: DateTime<Utc>,
    pub user_email: String,
    pub url: String,
    pub late: bool,
    pub no_daily: bool,
    pub auto_generated: bool,
    pub request_id: String,
}

impl AttendanceRecord {
    /// Record produced from an approved leave request.
    pub fn generated(
        activity_type: ActivityType,
        uploaded_at: DateTime<Utc>,
        user_email: &str,
        request_id: &str,
    ) -> Self {
        Self {
            activity_type,
            uploaded_at,
            user_email: user_email.to_string(),
            url: String::new(),
            late: false,
            no_daily: false,
            auto_generated: true,
            request_id: request_id.to_string(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::user::user_doc;
use crate::store::DocPath;
use crate::utils::timestamp;

pub const LEAVE_REQUESTS: &str = "leave_requests";

/// Only this leave type produces attendance.
pub const ATTENDANCE_REQUEST: &str = "Attendance Request";

pub const ATTENDANCE_GENERATED: &str = "attendanceGenerated";

/// `users/{uid}/leave_requests/{request_id}`
pub fn leave_request_doc(uid: &str, request_id: &str) -> DocPath {
    user_doc(uid).collection(LEAVE_REQUESTS).doc(request_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    /// Any status this service does not act on, kept verbatim.
    Other(String),
}

impl LeaveStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
            LeaveStatus::Other(status) => status,
        }
    }
}

impl From<String> for LeaveStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => LeaveStatus::Pending,
            "Approved" => LeaveStatus::Approved,
            "Rejected" => LeaveStatus::Rejected,
            _ => LeaveStatus::Other(value),
        }
    }
}

/// One side (before or after) of a leave request update. Every field is optional;
/// documents are written by other clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestSnapshot {
    pub leave_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub end_date: Option<DateTime<Utc>>,
    pub attendance_generated: Option<bool>,
    pub user_email: Option<String>,
}

impl LeaveRequestSnapshot {
    pub fn status(&self) -> Option<LeaveStatus> {
        self.status.clone().map(LeaveStatus::from)
    }

    pub fn is_approved(&self) -> bool {
        self.status() == Some(LeaveStatus::Approved)
    }

    pub fn is_rejected(&self) -> bool {
        self.status() == Some(LeaveStatus::Rejected)
    }

    pub fn is_attendance_request(&self) -> bool {
        self.leave_type.as_deref() == Some(ATTENDANCE_REQUEST)
    }

    /// Missing or null counts as not generated.
    pub fn attendance_generated(&self) -> bool {
        self.attendance_generated.unwrap_or(false)
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref().filter(|email| !email.is_empty())
    }
}

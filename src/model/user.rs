use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{CollectionPath, DocPath};

pub const USERS: &str = "users";
pub const PROFILE: &str = "profile";

/// `users/{uid}`
pub fn user_doc(uid: &str) -> DocPath {
    CollectionPath::root(USERS).doc(uid)
}

/// `users/{uid}/profile`
pub fn profile_collection(uid: &str) -> CollectionPath {
    user_doc(uid).collection(PROFILE)
}

/// `users/{uid}/profile/{uid}`
pub fn profile_doc(uid: &str) -> DocPath {
    profile_collection(uid).doc(uid)
}

/// Root document of a user.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoot {
    pub created_at: DateTime<Utc>,
}

/// Profile mirror of an identity. `None` fields are left out so a merge keeps whatever
/// is already stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    /// Employee number; clients send it as a string or a number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nik: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

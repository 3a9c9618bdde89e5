//! Identity provider: owns user accounts (uid, email, password).

pub mod memory;
pub mod password;
pub mod sql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryIdentityProvider;
pub use sql::SqlIdentityProvider;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("The email address is already in use by another account.")]
    EmailExists,

    #[error("The email address is improperly formatted.")]
    InvalidEmail,

    #[error("The password must be a string with at least 6 characters.")]
    InvalidPassword,

    #[error("There is no user record corresponding to the provided identifier.")]
    UserNotFound,

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Identity store lock poisoned")]
    Poisoned,
}

/// Account to create. Both email and password are optional, as with the hosted
/// provider.
#[derive(Debug, Clone, Default)]
pub struct NewIdentity {
    pub email: Option<String>,
    pub password: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, new: NewIdentity) -> Result<UserRecord, IdentityError>;

    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, IdentityError>;

    async fn update_email(&self, uid: &str, email: &str) -> Result<UserRecord, IdentityError>;

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError>;
}

pub fn new_uid() -> String {
    Uuid::new_v4().to_simple().to_string()
}

/// Lowercases and checks for a `local@domain.tld` shape.
pub fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(IdentityError::InvalidEmail);
    };

    let domain_ok = domain
        .split('.')
        .filter(|label| !label.is_empty())
        .count()
        >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    if local.is_empty() || !domain_ok || domain.contains('@') || email.contains(char::is_whitespace)
    {
        return Err(IdentityError::InvalidEmail);
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "ana", "@example.com", "ana@", "ana@example", "a b@x.io", "a@b@x.io"] {
            assert!(
                matches!(normalize_email(bad), Err(IdentityError::InvalidEmail)),
                "{bad} should be rejected"
            );
        }
    }
}

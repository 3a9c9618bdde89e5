use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::password::validate_password;
use super::{IdentityError, IdentityProvider, NewIdentity, UserRecord, new_uid, normalize_email};

/// Accounts kept in process. Passwords are validated but never stored.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_user(&self, new: NewIdentity) -> Result<UserRecord, IdentityError> {
        let email = new.email.as_deref().map(normalize_email).transpose()?;
        if let Some(password) = new.password.as_deref() {
            validate_password(password)?;
        }

        let mut accounts = self.accounts.write().map_err(|_| IdentityError::Poisoned)?;
        if email.is_some() && accounts.values().any(|a| a.email == email) {
            return Err(IdentityError::EmailExists);
        }

        let record = UserRecord {
            uid: new_uid(),
            email,
            email_verified: new.email_verified,
            created_at: Utc::now(),
        };
        accounts.insert(record.uid.clone(), record.clone());
        Ok(record)
    }

    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, IdentityError> {
        let accounts = self.accounts.read().map_err(|_| IdentityError::Poisoned)?;
        Ok(accounts.get(uid).cloned())
    }

    async fn update_email(&self, uid: &str, email: &str) -> Result<UserRecord, IdentityError> {
        let email = Some(normalize_email(email)?);

        let mut accounts = self.accounts.write().map_err(|_| IdentityError::Poisoned)?;
        if accounts
            .iter()
            .any(|(other, a)| other != uid && a.email == email)
        {
            return Err(IdentityError::EmailExists);
        }

        let account = accounts.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        account.email = email;
        Ok(account.clone())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().map_err(|_| IdentityError::Poisoned)?;
        accounts
            .remove(uid)
            .map(|_| ())
            .ok_or(IdentityError::UserNotFound)
    }
}

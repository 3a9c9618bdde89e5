//! Identity + profile management behind the user endpoints.

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::identity::{IdentityProvider, NewIdentity};
use crate::model::user::{Profile, UserRoot, profile_collection, profile_doc, user_doc};
use crate::models::CreateUserRequest;
use crate::store::{DocumentStore, Fields, to_fields};

pub struct UserAdmin {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    default_password: String,
}

/// Treats empty strings like missing values.
fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl UserAdmin {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        default_password: impl Into<String>,
    ) -> Self {
        Self {
            store,
            identity,
            default_password: default_password.into(),
        }
    }

    /// Creates the identity (unless editing an existing uid) and merges the profile.
    /// Returns the uid.
    #[instrument(name = "create_or_update_user", skip_all, fields(editing = ?input.is_editing))]
    pub async fn create_or_update_user(&self, input: CreateUserRequest) -> Result<String, AppError> {
        let email = required(input.email.as_deref())
            .ok_or_else(|| AppError::validation("Email is required."))?
            .to_string();

        let existing_uid = match (input.is_editing, required(input.uid.as_deref())) {
            (Some(true), Some(uid)) => Some(uid.to_string()),
            _ => None,
        };

        let uid = match existing_uid {
            Some(uid) => {
                debug!(uid, "Editing existing user, identity untouched");
                uid
            }
            None => {
                let password = input
                    .password
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| self.default_password.clone());

                let record = self
                    .identity
                    .create_user(NewIdentity {
                        email: Some(email.clone()),
                        password: Some(password),
                        email_verified: true,
                    })
                    .await?;

                let root = to_fields(&UserRoot {
                    created_at: Utc::now(),
                })?;
                self.store.set(&user_doc(&record.uid), root).await?;

                info!(uid = %record.uid, "User identity created");
                record.uid
            }
        };

        let profile = Profile {
            uid: uid.clone(),
            no: input.no,
            name: input.name,
            nik: input.nik,
            email: Some(email),
            gender: input.gender,
            dob: input.dob,
            pob: input.pob,
            position: input.position,
            address: input.address,
            join_date: input.join_date,
            phone: input.phone,
        };
        self.store
            .set_merge(&profile_doc(&uid), to_fields(&profile)?)
            .await?;

        Ok(uid)
    }

    /// Profile documents, then the root document, then the identity. Stops at the first
    /// failure; nothing is rolled back.
    #[instrument(name = "delete_user", skip(self))]
    pub async fn delete_user(&self, uid: Option<&str>) -> Result<(), AppError> {
        let uid = required(uid).ok_or_else(|| AppError::validation("UID is required."))?;

        let profile_docs = self.store.list_documents(&profile_collection(uid)).await?;
        try_join_all(profile_docs.iter().map(|doc| self.store.delete(&doc.path))).await?;

        self.store.delete(&user_doc(uid)).await?;
        self.identity.delete_user(uid).await?;

        info!(uid, profiles = profile_docs.len(), "User deleted");
        Ok(())
    }

    #[instrument(name = "update_email", skip(self))]
    pub async fn update_email(
        &self,
        uid: Option<&str>,
        new_email: Option<&str>,
    ) -> Result<(), AppError> {
        let (Some(uid), Some(new_email)) = (required(uid), required(new_email)) else {
            return Err(AppError::validation("UID and new email are required."));
        };

        self.identity.update_email(uid, new_email).await?;

        let mut fields = Fields::new();
        fields.insert("email".to_string(), new_email.into());
        self.store.set_merge(&profile_doc(uid), fields).await?;

        info!(uid, "User email updated");
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{error, info};

use super::password::{hash_password, validate_password};
use super::{IdentityError, IdentityProvider, NewIdentity, UserRecord, new_uid, normalize_email};

#[derive(FromRow)]
struct IdentityRow {
    uid: String,
    email: Option<String>,
    email_verified: bool,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for UserRecord {
    fn from(row: IdentityRow) -> Self {
        UserRecord {
            uid: row.uid,
            email: row.email,
            email_verified: row.email_verified,
            created_at: row.created_at,
        }
    }
}

/// Accounts in the `identities` table; passwords stored as argon2 hashes.
#[derive(Clone)]
pub struct SqlIdentityProvider {
    pool: MySqlPool,
}

impl SqlIdentityProvider {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Unique key violation (duplicate email) maps to `EmailExists`.
fn map_write_error(e: sqlx::Error) -> IdentityError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return IdentityError::EmailExists;
        }
    }
    error!(error = %e, "Identity write failed");
    IdentityError::Database(e)
}

#[async_trait]
impl IdentityProvider for SqlIdentityProvider {
    async fn create_user(&self, new: NewIdentity) -> Result<UserRecord, IdentityError> {
        let email = new.email.as_deref().map(normalize_email).transpose()?;
        let password_hash = match new.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let record = UserRecord {
            uid: new_uid(),
            email,
            email_verified: new.email_verified,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO identities (uid, email, password_hash, email_verified, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.uid)
        .bind(&record.email)
        .bind(password_hash)
        .bind(record.email_verified)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        info!(uid = %record.uid, "Identity created");
        Ok(record)
    }

    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT uid, email, email_verified, created_at
            FROM identities
            WHERE uid = ?
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn update_email(&self, uid: &str, email: &str) -> Result<UserRecord, IdentityError> {
        let email = normalize_email(email)?;

        sqlx::query("UPDATE identities SET email = ? WHERE uid = ?")
            .bind(&email)
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        // affected rows is 0 for an unchanged value too, so existence is checked by reading
        self.get_user(uid).await?.ok_or(IdentityError::UserNotFound)
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        let result = sqlx::query("DELETE FROM identities WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }

        info!(uid, "Identity deleted");
        Ok(())
    }
}

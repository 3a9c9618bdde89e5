use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the two backing tables when missing.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            parent_path   VARCHAR(400) NOT NULL,
            collection_id VARCHAR(150) NOT NULL,
            doc_id        VARCHAR(150) NOT NULL,
            data          LONGTEXT     NOT NULL,
            updated_at    TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            PRIMARY KEY (parent_path, collection_id, doc_id)
        ) DEFAULT CHARSET = utf8mb4
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create documents table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            uid            VARCHAR(128) NOT NULL PRIMARY KEY,
            email          VARCHAR(320) NULL UNIQUE,
            password_hash  VARCHAR(255) NULL,
            email_verified BOOLEAN      NOT NULL DEFAULT FALSE,
            created_at     DATETIME(6)  NOT NULL
        ) DEFAULT CHARSET = utf8mb4
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create identities table")?;

    info!("Database schema ready");
    Ok(())
}

//! Personal access token repository
//!
//! Every issued bearer token is backed by a row here; deleting the row
//! revokes the token even though its signature is still valid.

use crate::domain::{AccessToken, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    async fn create(&self, user_id: StringUuid, name: &str) -> Result<AccessToken>;
    async fn find(&self, id: StringUuid) -> Result<Option<AccessToken>>;
    /// Returns false when the token was already gone.
    async fn revoke(&self, id: StringUuid) -> Result<bool>;
}

pub struct AccessTokenRepositoryImpl {
    pool: MySqlPool,
}

impl AccessTokenRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessTokenRepository for AccessTokenRepositoryImpl {
    async fn create(&self, user_id: StringUuid, name: &str) -> Result<AccessToken> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO personal_access_tokens (id, user_id, name, created_at)
            VALUES (?, ?, ?, NOW())
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        self.find(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create access token")))
    }

    async fn find(&self, id: StringUuid) -> Result<Option<AccessToken>> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, user_id, name, created_at
            FROM personal_access_tokens
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn revoke(&self, id: StringUuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

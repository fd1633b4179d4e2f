//! Postgres credential store

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use super::CredentialStore;
use crate::{
    error::{AppError, AppResult},
    models::user::{format_roles, parse_roles, Credential, NewCredential},
};

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: Pool<Postgres>,
}

impl PgCredentialStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Raw `app_user` row; roles are kept as the stored comma separated text
#[derive(FromRow)]
struct CredentialRow {
    id: i32,
    username: String,
    password_hash: String,
    roles: String,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = AppError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        let roles = parse_roles(&row.roles).map_err(|e| {
            AppError::Internal(format!("Corrupt roles for user {}: {}", row.username, e))
        })?;
        Ok(Credential {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            roles,
        })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, password_hash, roles FROM app_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(Credential::try_from)
        .transpose()
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn save(&self, credential: NewCredential) -> AppResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO app_user (username, password_hash, roles)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, roles
            "#,
        )
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(format_roles(&credential.roles))
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }
}

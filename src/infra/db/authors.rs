use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AuthorKeysRepo, CreateAuthorKeyParams, RepoError};
use crate::domain::entities::AuthorKeyRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct AuthorKeyRow {
    id: Uuid,
    name: String,
    prefix: String,
    hashed_secret: Vec<u8>,
    created_at: OffsetDateTime,
    last_used_at: Option<OffsetDateTime>,
    revoked_at: Option<OffsetDateTime>,
}

impl From<AuthorKeyRow> for AuthorKeyRecord {
    fn from(row: AuthorKeyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[async_trait::async_trait]
impl AuthorKeysRepo for PostgresRepositories {
    async fn create_key(
        &self,
        params: CreateAuthorKeyParams,
    ) -> Result<AuthorKeyRecord, RepoError> {
        let row = sqlx::query_as::<_, AuthorKeyRow>(
            r#"
            INSERT INTO author_keys (id, name, prefix, hashed_secret, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, prefix, hashed_secret, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.name)
        .bind(params.prefix)
        .bind(params.hashed_secret)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AuthorKeyRecord::from(row))
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthorKeyRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorKeyRow>(
            r#"
            SELECT id, name, prefix, hashed_secret, created_at, last_used_at, revoked_at
            FROM author_keys
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorKeyRecord::from))
    }

    async fn revoke_key(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE author_keys
            SET revoked_at = $2
            WHERE prefix = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(prefix)
        .bind(at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE author_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

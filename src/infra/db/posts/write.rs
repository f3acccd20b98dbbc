use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;
use super::types::PostRow;

const RETURNING: &str = "RETURNING id, slug, title, body, pub_date, created_at, updated_at";

async fn replace_post_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    if !tag_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO post_tags (post_id, tag_id)
            SELECT $1, id
            FROM UNNEST($2::uuid[]) AS id
            "#,
        )
        .bind(post_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
    }

    Ok(())
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            slug,
            title,
            body,
            pub_date,
            tag_ids,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "INSERT INTO posts (id, slug, title, body, pub_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) {RETURNING}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(slug)
            .bind(title)
            .bind(body)
            .bind(pub_date)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        replace_post_tags(&mut tx, id, &tag_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            slug,
            title,
            body,
            pub_date,
            tag_ids,
        } = params;

        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let sql = format!(
            "UPDATE posts SET slug = $2, title = $3, body = $4, pub_date = $5, updated_at = $6 \
             WHERE id = $1 {RETURNING}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(slug)
            .bind(title)
            .bind(body)
            .bind(pub_date)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        replace_post_tags(&mut tx, id, &tag_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

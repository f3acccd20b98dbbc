//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageWindow;
use crate::application::search::SearchQuery;
use crate::domain::entities::{AuthorKeyRecord, PostRecord, TagRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Visibility cut-off for post reads: only posts whose `pub_date` is at or
/// before `now` are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostListScope {
    pub now: OffsetDateTime,
}

impl PostListScope {
    pub fn published_now() -> Self {
        Self {
            now: OffsetDateTime::now_utc(),
        }
    }

    pub fn admits(&self, post: &PostRecord) -> bool {
        post.is_published_at(self.now)
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pub_date: OffsetDateTime,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pub_date: OffsetDateTime,
    pub tag_ids: Vec<Uuid>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts in default order (newest `pub_date` first, then id).
    async fn list_posts(
        &self,
        scope: PostListScope,
        search: &SearchQuery,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(
        &self,
        scope: PostListScope,
        search: &SearchQuery,
    ) -> Result<u64, RepoError>;

    /// Case-insensitive exact slug lookup.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    async fn list_for_tag(
        &self,
        tag_id: Uuid,
        scope: PostListScope,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Whether another post already uses `slug` (case-insensitive).
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError>;
}

/// Post writes replace the tag set in the same transaction.
#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateTagParams {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTagParams {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Tags ordered by title (case-insensitive), then slug.
    async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError>;
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TagRecord>, RepoError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError>;
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError>;

    async fn update_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError>;

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateAuthorKeyParams {
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
}

#[async_trait]
pub trait AuthorKeysRepo: Send + Sync {
    async fn create_key(&self, params: CreateAuthorKeyParams)
    -> Result<AuthorKeyRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthorKeyRecord>, RepoError>;

    /// Returns `false` when no active key carries the prefix.
    async fn revoke_key(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError>;

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;
}

#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}

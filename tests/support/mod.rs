#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use blogengine::application::authors::AuthorKeyService;
use blogengine::application::pagination::PageWindow;
use blogengine::application::posts::PostService;
use blogengine::application::repos::{
    AuthorKeysRepo, CreateAuthorKeyParams, CreatePostParams, CreateTagParams, DatabaseHealth,
    PostListScope, PostsRepo, PostsWriteRepo, RepoError, TagsRepo, TagsWriteRepo,
    UpdatePostParams, UpdateTagParams,
};
use blogengine::application::search::SearchQuery;
use blogengine::application::tags::TagService;
use blogengine::domain::entities::{AuthorKeyRecord, PostRecord, TagRecord};
use blogengine::infra::http::{HttpState, build_router};

/// Text columns in Postgres reject NUL, so the store does too.
fn reject_nul(values: &[&str]) -> Result<(), RepoError> {
    if values.iter().any(|value| value.contains('\0')) {
        return Err(RepoError::from_persistence(
            "invalid byte sequence for encoding \"UTF8\": 0x00",
        ));
    }
    Ok(())
}

/// In-memory stand-in for every repository the HTTP layer needs.
#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<PostRecord>>,
    tags: Mutex<Vec<TagRecord>>,
    post_tags: Mutex<Vec<(Uuid, Uuid)>>,
    keys: Mutex<Vec<AuthorKeyRecord>>,
}

impl MemoryStore {
    pub fn add_post(&self, title: &str, slug: &str, body: &str, pub_date: OffsetDateTime) -> PostRecord {
        let post = PostRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            pub_date,
            created_at: pub_date,
            updated_at: pub_date,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn add_tag(&self, title: &str, slug: &str) -> TagRecord {
        let now = OffsetDateTime::now_utc();
        let tag = TagRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tags.lock().unwrap().push(tag.clone());
        tag
    }

    pub fn link(&self, post: &PostRecord, tag: &TagRecord) {
        self.post_tags.lock().unwrap().push((post.id, tag.id));
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        self.posts.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<TagRecord> {
        self.tags.lock().unwrap().clone()
    }

    pub fn tag_ids_of(&self, post_id: Uuid) -> Vec<Uuid> {
        self.post_tags
            .lock()
            .unwrap()
            .iter()
            .filter(|(post, _)| *post == post_id)
            .map(|(_, tag)| *tag)
            .collect()
    }

    fn visible_posts(&self, scope: PostListScope, search: &SearchQuery) -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| scope.admits(post) && search.matches(*post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }

    fn post_slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> bool {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .any(|post| post.slug.eq_ignore_ascii_case(slug) && Some(post.id) != exclude)
    }

    fn tag_slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> bool {
        self.tags
            .lock()
            .unwrap()
            .iter()
            .any(|tag| tag.slug.eq_ignore_ascii_case(slug) && Some(tag.id) != exclude)
    }

    fn replace_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) {
        let mut links = self.post_tags.lock().unwrap();
        links.retain(|(post, _)| *post != post_id);
        links.extend(tag_ids.iter().map(|tag| (post_id, *tag)));
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        scope: PostListScope,
        search: &SearchQuery,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        reject_nul(&[search.term().unwrap_or_default()])?;
        Ok(self
            .visible_posts(scope, search)
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn count_posts(
        &self,
        scope: PostListScope,
        search: &SearchQuery,
    ) -> Result<u64, RepoError> {
        reject_nul(&[search.term().unwrap_or_default()])?;
        Ok(self.visible_posts(scope, search).len() as u64)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        reject_nul(&[slug])?;
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.slug.eq_ignore_ascii_case(slug))
            .cloned())
    }

    async fn list_for_tag(
        &self,
        tag_id: Uuid,
        scope: PostListScope,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let post_ids: Vec<Uuid> = self
            .post_tags
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, tag)| *tag == tag_id)
            .map(|(post, _)| *post)
            .collect();
        Ok(self
            .visible_posts(scope, &SearchQuery::none())
            .into_iter()
            .filter(|post| post_ids.contains(&post.id))
            .collect())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError> {
        reject_nul(&[slug])?;
        Ok(self.post_slug_taken(slug, exclude))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        reject_nul(&[&params.slug, &params.title, &params.body])?;
        if self.post_slug_taken(&params.slug, None) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_lower_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            body: params.body,
            pub_date: params.pub_date,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        self.replace_tags(post.id, &params.tag_ids);
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        reject_nul(&[&params.slug, &params.title, &params.body])?;
        if self.post_slug_taken(&params.slug, Some(params.id)) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_lower_key".to_string(),
            });
        }
        let updated = {
            let mut posts = self.posts.lock().unwrap();
            let post = posts
                .iter_mut()
                .find(|post| post.id == params.id)
                .ok_or(RepoError::NotFound)?;
            post.slug = params.slug;
            post.title = params.title;
            post.body = params.body;
            post.pub_date = params.pub_date;
            post.updated_at = OffsetDateTime::now_utc();
            post.clone()
        };
        self.replace_tags(updated.id, &params.tag_ids);
        Ok(updated)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        self.post_tags.lock().unwrap().retain(|(post, _)| *post != id);
        Ok(())
    }
}

#[async_trait]
impl TagsRepo for MemoryStore {
    async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.tags();
        tags.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(tags)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        let ids = self.tag_ids_of(post_id);
        let mut tags: Vec<TagRecord> = self
            .tags()
            .into_iter()
            .filter(|tag| ids.contains(&tag.id))
            .collect();
        tags.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(tags)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TagRecord>, RepoError> {
        Ok(self
            .tags()
            .into_iter()
            .filter(|tag| ids.contains(&tag.id))
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        reject_nul(&[slug])?;
        Ok(self
            .tags()
            .into_iter()
            .find(|tag| tag.slug.eq_ignore_ascii_case(slug)))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, RepoError> {
        reject_nul(&[slug])?;
        Ok(self.tag_slug_taken(slug, exclude))
    }
}

#[async_trait]
impl TagsWriteRepo for MemoryStore {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        reject_nul(&[&params.slug, &params.title])?;
        if self.tag_slug_taken(&params.slug, None) {
            return Err(RepoError::Duplicate {
                constraint: "tags_slug_lower_key".to_string(),
            });
        }
        Ok(self.add_tag(&params.title, &params.slug))
    }

    async fn update_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError> {
        reject_nul(&[&params.slug, &params.title])?;
        if self.tag_slug_taken(&params.slug, Some(params.id)) {
            return Err(RepoError::Duplicate {
                constraint: "tags_slug_lower_key".to_string(),
            });
        }
        let mut tags = self.tags.lock().unwrap();
        let tag = tags
            .iter_mut()
            .find(|tag| tag.id == params.id)
            .ok_or(RepoError::NotFound)?;
        tag.slug = params.slug;
        tag.title = params.title;
        tag.updated_at = OffsetDateTime::now_utc();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tags = self.tags.lock().unwrap();
        let before = tags.len();
        tags.retain(|tag| tag.id != id);
        if tags.len() == before {
            return Err(RepoError::NotFound);
        }
        self.post_tags.lock().unwrap().retain(|(_, tag)| *tag != id);
        Ok(())
    }
}

#[async_trait]
impl AuthorKeysRepo for MemoryStore {
    async fn create_key(
        &self,
        params: CreateAuthorKeyParams,
    ) -> Result<AuthorKeyRecord, RepoError> {
        let record = AuthorKeyRecord {
            id: Uuid::new_v4(),
            name: params.name,
            prefix: params.prefix,
            hashed_secret: params.hashed_secret,
            created_at: OffsetDateTime::now_utc(),
            last_used_at: None,
            revoked_at: None,
        };
        self.keys.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthorKeyRecord>, RepoError> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .find(|key| key.prefix == prefix)
            .cloned())
    }

    async fn revoke_key(&self, prefix: &str, at: OffsetDateTime) -> Result<bool, RepoError> {
        let mut keys = self.keys.lock().unwrap();
        match keys
            .iter_mut()
            .find(|key| key.prefix == prefix && key.revoked_at.is_none())
        {
            Some(key) => {
                key.revoked_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(key) = self.keys.lock().unwrap().iter_mut().find(|key| key.id == id) {
            key.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseHealth for MemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// A router over a fresh store plus a valid author token.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_page_size(3).await
    }

    pub async fn with_page_size(per_page: u32) -> Self {
        Self::build(per_page, false).await
    }

    /// An app that marks its session cookie `Secure`.
    pub async fn with_secure_cookies() -> Self {
        Self::build(3, true).await
    }

    async fn build(per_page: u32, secure_cookies: bool) -> Self {
        let store = Arc::new(MemoryStore::default());
        let posts_repo: Arc<dyn PostsRepo> = store.clone();
        let posts_write: Arc<dyn PostsWriteRepo> = store.clone();
        let tags_repo: Arc<dyn TagsRepo> = store.clone();
        let tags_write: Arc<dyn TagsWriteRepo> = store.clone();
        let keys_repo: Arc<dyn AuthorKeysRepo> = store.clone();
        let health: Arc<dyn DatabaseHealth> = store.clone();

        let authors = AuthorKeyService::new(keys_repo);
        let token = authors
            .issue("Test Author")
            .await
            .expect("key should be issued")
            .token;

        let state = HttpState {
            posts: Arc::new(PostService::new(
                posts_repo.clone(),
                posts_write,
                tags_repo.clone(),
                NonZeroU32::new(per_page).expect("non-zero page size"),
            )),
            tags: Arc::new(TagService::new(tags_repo, tags_write, posts_repo)),
            authors: Arc::new(authors),
            health,
            site_title: Arc::from("Test Blog"),
            secure_cookies,
        };

        Self {
            store,
            router: build_router(state),
            token,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }

    pub async fn get_as_author(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(form_request(uri, body, None)).await
    }

    pub async fn post_form_as_author(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(form_request(uri, body, Some(&self.token))).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }
}

fn form_request(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::crud::{CrudError, SlugPlan, SlugResource, save_with_slug};
use crate::application::forms::{FieldErrors, PostDraft, PostForm, SLUG_TAKEN};
use crate::application::pagination::{Page, PageLinks, Paginator};
use crate::application::repos::{
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, TagsRepo,
    UpdatePostParams,
};
use crate::application::search::SearchQuery;
use crate::domain::entities::{PostRecord, TagRecord};
use crate::domain::posts::POST_SLUG_MAX;
use crate::domain::slug::is_storable;

pub const DEFAULT_POSTS_PER_PAGE: u32 = 3;

#[derive(Debug, Clone)]
pub struct PostListing {
    pub page: Page<PostRecord>,
    pub links: PageLinks,
    pub search: SearchQuery,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    tags: Arc<dyn TagsRepo>,
    per_page: NonZeroU32,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        tags: Arc<dyn TagsRepo>,
        per_page: NonZeroU32,
    ) -> Self {
        Self {
            reader,
            writer,
            tags,
            per_page,
        }
    }

    /// One page of published posts, newest first, optionally filtered by search.
    pub async fn list_published(
        &self,
        search: SearchQuery,
        raw_page: Option<&str>,
    ) -> Result<PostListing, RepoError> {
        let scope = PostListScope::published_now();
        let total = self.reader.count_posts(scope, &search).await?;
        let paginator = Paginator::new(total, self.per_page);
        let number = paginator.resolve(raw_page);
        let items = self
            .reader
            .list_posts(scope, &search, paginator.window(number))
            .await?;

        let page = paginator.page(number, items);
        let links = PageLinks::for_page(&page, &search);
        Ok(PostListing {
            page,
            links,
            search,
        })
    }

    pub async fn find_published(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let scope = PostListScope::published_now();
        let post = self.find_by_slug(slug).await?;
        Ok(post.filter(|post| scope.admits(post)))
    }

    pub async fn tags_for(&self, post_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        self.tags.list_for_post(post_id).await
    }

    /// Every tag, for the tag picker on the post form.
    pub async fn tag_choices(&self) -> Result<Vec<TagRecord>, RepoError> {
        self.tags.list_all().await
    }

    async fn write(
        &self,
        draft: &PostDraft,
        slug: String,
        pub_date: OffsetDateTime,
        existing: Option<&PostRecord>,
    ) -> Result<PostRecord, RepoError> {
        match existing {
            None => {
                self.writer
                    .create_post(CreatePostParams {
                        slug,
                        title: draft.title.clone(),
                        body: draft.body.clone(),
                        pub_date,
                        tag_ids: draft.tag_ids.clone(),
                    })
                    .await
            }
            Some(post) => {
                self.writer
                    .update_post(UpdatePostParams {
                        id: post.id,
                        slug,
                        title: draft.title.clone(),
                        body: draft.body.clone(),
                        pub_date,
                        tag_ids: draft.tag_ids.clone(),
                    })
                    .await
            }
        }
    }
}

#[async_trait]
impl SlugResource for PostService {
    type Entity = PostRecord;
    type Form = PostForm;
    type Draft = PostDraft;

    const KIND: &'static str = "post";

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        if !is_storable(slug) {
            return Ok(None);
        }
        self.reader.find_by_slug(slug).await
    }

    async fn form_for(&self, post: &PostRecord) -> Result<PostForm, RepoError> {
        let tag_ids: Vec<Uuid> = self
            .tags
            .list_for_post(post.id)
            .await?
            .into_iter()
            .map(|tag| tag.id)
            .collect();
        Ok(PostForm::from_parts(
            &post.title,
            &post.slug,
            &post.body,
            &tag_ids,
            post.pub_date,
        ))
    }

    async fn validate(
        &self,
        form: &PostForm,
        existing: Option<&PostRecord>,
    ) -> Result<PostDraft, CrudError> {
        let draft = form.clean()?;
        let mut errors = FieldErrors::new();

        if !draft.tag_ids.is_empty() {
            let known = self.tags.find_by_ids(&draft.tag_ids).await?;
            for id in &draft.tag_ids {
                if !known.iter().any(|tag| tag.id == *id) {
                    errors.add(
                        "tags",
                        format!("Select a valid choice. {id} is not one of the available choices."),
                    );
                }
            }
        }

        if let Some(slug) = draft.slug.as_deref() {
            let exclude = existing.map(|post| post.id);
            if self.reader.slug_taken(slug, exclude).await? {
                errors.add("slug", SLUG_TAKEN);
            }
        }

        Ok(errors.into_result(draft)?)
    }

    async fn save(
        &self,
        draft: PostDraft,
        existing: Option<&PostRecord>,
    ) -> Result<PostRecord, CrudError> {
        let now = OffsetDateTime::now_utc();
        let pub_date = draft.pub_date.unwrap_or(now);
        let exclude = existing.map(|post| post.id);
        let action = if existing.is_some() { "update" } else { "create" };

        let reader = &self.reader;
        let draft = &draft;
        let post = save_with_slug(
            SlugPlan {
                kind: Self::KIND,
                title: &draft.title,
                supplied: draft.slug.as_deref(),
                max_len: POST_SLUG_MAX,
                now,
            },
            move |candidate: String| async move { reader.slug_taken(&candidate, exclude).await },
            move |slug| self.write(draft, slug, pub_date, existing),
        )
        .await?;

        counter!("blogengine_entity_writes_total", "entity" => Self::KIND, "action" => action)
            .increment(1);
        info!(
            target = "application::posts::save",
            post_id = %post.id,
            slug = %post.slug,
            action,
            "post saved"
        );
        Ok(post)
    }

    async fn delete(&self, post: &PostRecord) -> Result<(), CrudError> {
        self.writer.delete_post(post.id).await?;
        counter!("blogengine_entity_writes_total", "entity" => Self::KIND, "action" => "delete")
            .increment(1);
        info!(
            target = "application::posts::delete",
            post_id = %post.id,
            slug = %post.slug,
            "post deleted"
        );
        Ok(())
    }
}

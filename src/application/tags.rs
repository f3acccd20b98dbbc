use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use time::OffsetDateTime;
use tracing::info;

use crate::application::crud::{CrudError, SlugPlan, SlugResource, save_with_slug};
use crate::application::forms::{FieldErrors, SLUG_TAKEN, TagDraft, TagForm};
use crate::application::repos::{
    CreateTagParams, PostListScope, PostsRepo, RepoError, TagsRepo, TagsWriteRepo,
    UpdateTagParams,
};
use crate::domain::entities::{PostRecord, TagRecord};
use crate::domain::posts::TAG_SLUG_MAX;
use crate::domain::slug::is_storable;

#[derive(Clone)]
pub struct TagService {
    reader: Arc<dyn TagsRepo>,
    writer: Arc<dyn TagsWriteRepo>,
    posts: Arc<dyn PostsRepo>,
}

impl TagService {
    pub fn new(
        reader: Arc<dyn TagsRepo>,
        writer: Arc<dyn TagsWriteRepo>,
        posts: Arc<dyn PostsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            posts,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError> {
        self.reader.list_all().await
    }

    /// Published posts carrying the tag, newest first.
    pub async fn published_posts(&self, tag: &TagRecord) -> Result<Vec<PostRecord>, RepoError> {
        self.posts
            .list_for_tag(tag.id, PostListScope::published_now())
            .await
    }

    async fn write(
        &self,
        draft: &TagDraft,
        slug: String,
        existing: Option<&TagRecord>,
    ) -> Result<TagRecord, RepoError> {
        match existing {
            None => {
                self.writer
                    .create_tag(CreateTagParams {
                        slug,
                        title: draft.title.clone(),
                    })
                    .await
            }
            Some(tag) => {
                self.writer
                    .update_tag(UpdateTagParams {
                        id: tag.id,
                        slug,
                        title: draft.title.clone(),
                    })
                    .await
            }
        }
    }
}

#[async_trait]
impl SlugResource for TagService {
    type Entity = TagRecord;
    type Form = TagForm;
    type Draft = TagDraft;

    const KIND: &'static str = "tag";

    async fn find_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError> {
        if !is_storable(slug) {
            return Ok(None);
        }
        self.reader.find_by_slug(slug).await
    }

    async fn form_for(&self, tag: &TagRecord) -> Result<TagForm, RepoError> {
        Ok(TagForm::from_parts(&tag.title, &tag.slug))
    }

    /// The slug must not be used by any other tag, compared case-insensitively.
    /// A tag re-submitting its own slug is accepted.
    async fn validate(
        &self,
        form: &TagForm,
        existing: Option<&TagRecord>,
    ) -> Result<TagDraft, CrudError> {
        let draft = form.clean()?;
        if let Some(slug) = draft.slug.as_deref() {
            let exclude = existing.map(|tag| tag.id);
            if self.reader.slug_taken(slug, exclude).await? {
                return Err(FieldErrors::single("slug", SLUG_TAKEN).into());
            }
        }
        Ok(draft)
    }

    async fn save(
        &self,
        draft: TagDraft,
        existing: Option<&TagRecord>,
    ) -> Result<TagRecord, CrudError> {
        let now = OffsetDateTime::now_utc();
        let exclude = existing.map(|tag| tag.id);
        let action = if existing.is_some() { "update" } else { "create" };

        let reader = &self.reader;
        let draft = &draft;
        let tag = save_with_slug(
            SlugPlan {
                kind: Self::KIND,
                title: &draft.title,
                supplied: draft.slug.as_deref(),
                max_len: TAG_SLUG_MAX,
                now,
            },
            move |candidate: String| async move { reader.slug_taken(&candidate, exclude).await },
            move |slug| self.write(draft, slug, existing),
        )
        .await?;

        counter!("blogengine_entity_writes_total", "entity" => Self::KIND, "action" => action)
            .increment(1);
        info!(
            target = "application::tags::save",
            tag_id = %tag.id,
            slug = %tag.slug,
            action,
            "tag saved"
        );
        Ok(tag)
    }

    async fn delete(&self, tag: &TagRecord) -> Result<(), CrudError> {
        self.writer.delete_tag(tag.id).await?;
        counter!("blogengine_entity_writes_total", "entity" => Self::KIND, "action" => "delete")
            .increment(1);
        info!(
            target = "application::tags::delete",
            tag_id = %tag.id,
            slug = %tag.slug,
            "tag deleted"
        );
        Ok(())
    }
}

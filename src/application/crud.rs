//! Resource abstraction shared by the create, detail, update and delete flows.

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::forms::{FieldErrors, SLUG_TAKEN};
use crate::application::repos::RepoError;
use crate::domain::entities::CanonicalLocation;
use crate::domain::slug::{SlugAsyncError, SlugSpec, generate_unique_slug};

/// Bound on regenerate-and-retry when a generated slug loses a race.
const MAX_SAVE_ATTEMPTS: usize = 3;

const SLUG_EXHAUSTED: &str = "Could not generate a unique address. Please enter one.";

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("submitted form is invalid")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<FieldErrors> for CrudError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// A persisted entity addressed by slug and edited through a form.
///
/// `validate` turns a raw form into a draft (or field errors) and `save` runs
/// the save hook before writing. `existing` is `None` on create.
#[async_trait]
pub trait SlugResource: Send + Sync + 'static {
    type Entity: CanonicalLocation + Clone + Send + Sync + 'static;
    type Form: DeserializeOwned + Default + Clone + Send + Sync + 'static;
    type Draft: Send + 'static;

    /// Label used in logs and metrics.
    const KIND: &'static str;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Self::Entity>, RepoError>;

    /// Form pre-populated from a stored entity.
    async fn form_for(&self, entity: &Self::Entity) -> Result<Self::Form, RepoError>;

    async fn validate(
        &self,
        form: &Self::Form,
        existing: Option<&Self::Entity>,
    ) -> Result<Self::Draft, CrudError>;

    async fn save(
        &self,
        draft: Self::Draft,
        existing: Option<&Self::Entity>,
    ) -> Result<Self::Entity, CrudError>;

    async fn delete(&self, entity: &Self::Entity) -> Result<(), CrudError>;

    async fn create(&self, form: &Self::Form) -> Result<Self::Entity, CrudError> {
        let draft = self.validate(form, None).await?;
        self.save(draft, None).await
    }

    async fn update(
        &self,
        existing: &Self::Entity,
        form: &Self::Form,
    ) -> Result<Self::Entity, CrudError> {
        let draft = self.validate(form, Some(existing)).await?;
        self.save(draft, Some(existing)).await
    }
}

/// Slug inputs for one save of a [`SlugResource`] entity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlugPlan<'a> {
    pub kind: &'static str,
    pub title: &'a str,
    /// Author-supplied slug; `None` asks for a generated one.
    pub supplied: Option<&'a str>,
    pub max_len: usize,
    pub now: OffsetDateTime,
}

/// Resolve the slug and run `write`, regenerating a generated slug when the
/// write reports a duplicate.
///
/// `slug_taken` answers whether another entity already holds a candidate. A
/// duplicate on a supplied slug becomes a field error on `slug`.
pub(crate) async fn save_with_slug<T, Taken, TakenFut, Write, WriteFut>(
    plan: SlugPlan<'_>,
    slug_taken: Taken,
    mut write: Write,
) -> Result<T, CrudError>
where
    Taken: Fn(String) -> TakenFut,
    TakenFut: Future<Output = Result<bool, RepoError>>,
    Write: FnMut(String) -> WriteFut,
    WriteFut: Future<Output = Result<T, RepoError>>,
{
    for attempt in 1..=MAX_SAVE_ATTEMPTS {
        let slug = match plan.supplied {
            Some(slug) => slug.to_string(),
            None => generate_slug(&plan, &slug_taken).await?,
        };

        match write(slug).await {
            Ok(entity) => return Ok(entity),
            Err(RepoError::Duplicate { constraint }) if plan.supplied.is_none() => {
                warn!(
                    target = "application::crud::save",
                    kind = plan.kind,
                    attempt,
                    constraint = %constraint,
                    "generated slug collided; regenerating"
                );
            }
            Err(RepoError::Duplicate { .. }) => {
                return Err(FieldErrors::single("slug", SLUG_TAKEN).into());
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(FieldErrors::single("slug", SLUG_EXHAUSTED).into())
}

async fn generate_slug<Taken, TakenFut>(
    plan: &SlugPlan<'_>,
    slug_taken: &Taken,
) -> Result<String, CrudError>
where
    Taken: Fn(String) -> TakenFut,
    TakenFut: Future<Output = Result<bool, RepoError>>,
{
    let spec = SlugSpec {
        title: plan.title,
        fallback: plan.kind,
        timestamp: plan.now.unix_timestamp(),
        max_len: plan.max_len,
    };
    generate_unique_slug(spec, |candidate| {
        let taken = slug_taken(candidate.to_string());
        async move { taken.await.map(|taken| !taken) }
    })
    .await
    .map_err(|err| match err {
        SlugAsyncError::Slug(err) => FieldErrors::single("slug", err.to_string()).into(),
        SlugAsyncError::Predicate(err) => CrudError::Repo(err),
    })
}

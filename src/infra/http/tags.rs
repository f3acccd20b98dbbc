use std::sync::Arc;

use async_trait::async_trait;
use axum::{http::StatusCode, response::Response};

use crate::application::crud::SlugResource;
use crate::application::forms::{FieldErrors, TagForm};
use crate::application::repos::RepoError;
use crate::application::tags::TagService;
use crate::domain::entities::TagRecord;
use crate::presentation::views::{
    DeleteTemplate, DeleteView, FormTarget, LayoutChrome, LayoutContext, TagDetailTemplate,
    TagDetailView, TagFormTemplate, TagFormView, render_template_response,
};

use super::HttpState;
use super::crud::CrudEndpoint;

pub(super) struct TagEndpoint;

#[async_trait]
impl CrudEndpoint for TagEndpoint {
    type Resource = TagService;

    const LIST_LOCATION: &'static str = "/tags/";
    const SOURCE: &'static str = "infra::http::tags";

    fn resource(state: &HttpState) -> Arc<TagService> {
        state.tags.clone()
    }

    async fn form_page(
        _state: &HttpState,
        chrome: LayoutChrome,
        target: FormTarget<'_, TagRecord>,
        form: TagForm,
        errors: FieldErrors,
    ) -> Result<Response, RepoError> {
        let view = LayoutContext::new(chrome, TagFormView::new(target, form, errors));
        Ok(render_template_response(
            TagFormTemplate { view },
            StatusCode::OK,
        ))
    }

    async fn detail_page(
        state: &HttpState,
        chrome: LayoutChrome,
        slug: &str,
    ) -> Result<Option<Response>, RepoError> {
        let Some(tag) = state.tags.find_by_slug(slug).await? else {
            return Ok(None);
        };
        let posts = state.tags.published_posts(&tag).await?;
        let view = LayoutContext::new(chrome, TagDetailView::new(&tag, &posts));
        Ok(Some(render_template_response(
            TagDetailTemplate { view },
            StatusCode::OK,
        )))
    }

    fn delete_page(chrome: LayoutChrome, tag: &TagRecord) -> Response {
        let view = LayoutContext::new(chrome, DeleteView::new("tag", &tag.title, tag));
        render_template_response(DeleteTemplate { view }, StatusCode::OK)
    }
}

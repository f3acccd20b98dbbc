use std::sync::Arc;

use async_trait::async_trait;
use axum::{http::StatusCode, response::Response};
use time::OffsetDateTime;

use crate::application::forms::{FieldErrors, PostForm};
use crate::application::posts::PostService;
use crate::application::repos::RepoError;
use crate::domain::entities::PostRecord;
use crate::presentation::views::{
    DeleteTemplate, DeleteView, FormTarget, LayoutChrome, LayoutContext, PostDetailTemplate,
    PostDetailView, PostFormTemplate, PostFormView, render_template_response,
};

use super::HttpState;
use super::crud::CrudEndpoint;

pub(super) struct PostEndpoint;

#[async_trait]
impl CrudEndpoint for PostEndpoint {
    type Resource = PostService;

    const LIST_LOCATION: &'static str = "/";
    const SOURCE: &'static str = "infra::http::posts";

    fn resource(state: &HttpState) -> Arc<PostService> {
        state.posts.clone()
    }

    async fn form_page(
        state: &HttpState,
        chrome: LayoutChrome,
        target: FormTarget<'_, PostRecord>,
        form: PostForm,
        errors: FieldErrors,
    ) -> Result<Response, RepoError> {
        let tags = state.posts.tag_choices().await?;
        let content = PostFormView::new(target, form, errors, &tags);
        let view = LayoutContext::new(chrome, content);
        Ok(render_template_response(
            PostFormTemplate { view },
            StatusCode::OK,
        ))
    }

    async fn detail_page(
        state: &HttpState,
        chrome: LayoutChrome,
        slug: &str,
    ) -> Result<Option<Response>, RepoError> {
        // scheduled posts stay hidden until their publication moment
        let Some(post) = state.posts.find_published(slug).await? else {
            return Ok(None);
        };
        let tags = state.posts.tags_for(post.id).await?;
        let content = PostDetailView::new(&post, &tags, OffsetDateTime::now_utc());
        let view = LayoutContext::new(chrome, content);
        Ok(Some(render_template_response(
            PostDetailTemplate { view },
            StatusCode::OK,
        )))
    }

    fn delete_page(chrome: LayoutChrome, post: &PostRecord) -> Response {
        let content = DeleteView::new("post", &post.title, post);
        let view = LayoutContext::new(chrome, content);
        render_template_response(DeleteTemplate { view }, StatusCode::OK)
    }
}

use crate::application::error::{ErrorReport, HttpError};
use crate::application::forms::{FieldErrors, PostForm, TagForm};
use crate::application::pagination::PageLinks;
use crate::application::posts::PostListing;
use crate::domain::entities::{CanonicalLocation, PostRecord, TagRecord};
use crate::domain::posts::format_human;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const EXCERPT_CHARS: usize = 280;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    render_error_page(
        chrome,
        ErrorPageView::not_found(),
        StatusCode::NOT_FOUND,
        ErrorReport::from_message(
            "presentation::views::render_not_found_response",
            StatusCode::NOT_FOUND,
            "Resource not found",
        ),
    )
}

pub fn render_forbidden_response(chrome: LayoutChrome) -> Response {
    render_error_page(
        chrome,
        ErrorPageView::forbidden(),
        StatusCode::FORBIDDEN,
        ErrorReport::from_message(
            "presentation::views::render_forbidden_response",
            StatusCode::FORBIDDEN,
            "Author session required",
        ),
    )
}

/// Render a failed request as an HTML error page, keeping its report.
pub fn render_http_error(chrome: LayoutChrome, error: HttpError) -> Response {
    let status = error.status();
    let view = ErrorPageView {
        title: status
            .canonical_reason()
            .unwrap_or("Something went wrong")
            .to_string(),
        message: error.public_message().to_string(),
        primary_action: Some(ErrorAction::home()),
    };
    render_error_page(chrome, view, status, error.into_report())
}

fn render_error_page(
    chrome: LayoutChrome,
    content: ErrorPageView,
    status: StatusCode,
    report: ErrorReport,
) -> Response {
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    report.attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

/// Per-request layout data: site brand and the identified author, if any.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub author: Option<String>,
}

impl LayoutChrome {
    pub fn new(site_title: &str, author: Option<String>) -> Self {
        Self {
            brand: BrandView {
                title: site_title.to_string(),
                href: "/".to_string(),
            },
            author,
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub author: Option<String>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            author: chrome.author,
            content,
        }
    }

    /// Whether create/edit/delete links should be shown.
    pub fn is_author(&self) -> bool {
        self.author.is_some()
    }
}

#[derive(Clone)]
pub struct TagLink {
    pub title: String,
    pub href: String,
}

impl From<&TagRecord> for TagLink {
    fn from(tag: &TagRecord) -> Self {
        Self {
            title: tag.title.clone(),
            href: tag.canonical_location(),
        }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub title: String,
    pub excerpt: String,
    pub published: String,
    pub iso_date: String,
    pub href: String,
    pub update_href: String,
    pub delete_href: String,
}

impl From<&PostRecord> for PostCard {
    fn from(post: &PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            excerpt: excerpt(&post.body),
            published: format_human(post.pub_date),
            iso_date: iso_date(post.pub_date),
            href: post.canonical_location(),
            update_href: post.update_location(),
            delete_href: post.delete_location(),
        }
    }
}

pub struct IndexView {
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub search: String,
    pub is_paginated: bool,
    pub page_number: u64,
    pub num_pages: u64,
    pub prev_url: String,
    pub next_url: String,
}

impl From<&PostListing> for IndexView {
    fn from(listing: &PostListing) -> Self {
        let PageLinks { previous, next } = listing.links.clone();
        let posts: Vec<PostCard> = listing.page.items.iter().map(PostCard::from).collect();
        Self {
            has_results: !posts.is_empty(),
            posts,
            search: listing.search.term().unwrap_or_default().to_string(),
            is_paginated: listing.page.is_paginated(),
            page_number: listing.page.number,
            num_pages: listing.page.num_pages,
            prev_url: previous,
            next_url: next,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexView>,
}

pub struct PostDetailView {
    pub title: String,
    pub body: String,
    pub published: String,
    pub iso_date: String,
    pub is_recent: bool,
    pub tags: Vec<TagLink>,
    pub update_href: String,
    pub delete_href: String,
}

impl PostDetailView {
    pub fn new(post: &PostRecord, tags: &[TagRecord], now: OffsetDateTime) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            published: format_human(post.pub_date),
            iso_date: iso_date(post.pub_date),
            is_recent: post.was_published_recently(now),
            tags: tags.iter().map(TagLink::from).collect(),
            update_href: post.update_location(),
            delete_href: post.delete_location(),
        }
    }
}

#[derive(Template)]
#[template(path = "posts/detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Clone)]
pub struct TagChoice {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

pub struct PostFormView {
    pub heading: String,
    pub action: String,
    pub submit_label: &'static str,
    pub cancel_href: String,
    pub form: PostForm,
    pub errors: FieldErrors,
    pub tag_choices: Vec<TagChoice>,
}

impl PostFormView {
    pub fn new(
        target: FormTarget<'_, PostRecord>,
        form: PostForm,
        errors: FieldErrors,
        tags: &[TagRecord],
    ) -> Self {
        let tag_choices = tags
            .iter()
            .map(|tag| TagChoice {
                id: tag.id.to_string(),
                title: tag.title.clone(),
                selected: form.has_tag(&tag.id),
            })
            .collect();
        Self {
            heading: target.heading("post"),
            action: target.action("/post/create/"),
            submit_label: target.submit_label(),
            cancel_href: target.cancel_href("/"),
            form,
            errors,
            tag_choices,
        }
    }
}

#[derive(Template)]
#[template(path = "posts/form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

/// A delete confirmation for either resource.
pub struct DeleteView {
    pub kind: &'static str,
    pub title: String,
    pub action: String,
    pub cancel_href: String,
}

impl DeleteView {
    pub fn new<E: CanonicalLocation>(kind: &'static str, title: &str, entity: &E) -> Self {
        Self {
            kind,
            title: title.to_string(),
            action: entity.delete_location(),
            cancel_href: entity.canonical_location(),
        }
    }
}

#[derive(Template)]
#[template(path = "delete.html")]
pub struct DeleteTemplate {
    pub view: LayoutContext<DeleteView>,
}

pub struct TagListView {
    pub tags: Vec<TagLink>,
}

#[derive(Template)]
#[template(path = "tags/list.html")]
pub struct TagListTemplate {
    pub view: LayoutContext<TagListView>,
}

pub struct TagDetailView {
    pub title: String,
    pub posts: Vec<PostCard>,
    pub update_href: String,
    pub delete_href: String,
}

impl TagDetailView {
    pub fn new(tag: &TagRecord, posts: &[PostRecord]) -> Self {
        Self {
            title: tag.title.clone(),
            posts: posts.iter().map(PostCard::from).collect(),
            update_href: tag.update_location(),
            delete_href: tag.delete_location(),
        }
    }
}

#[derive(Template)]
#[template(path = "tags/detail.html")]
pub struct TagDetailTemplate {
    pub view: LayoutContext<TagDetailView>,
}

pub struct TagFormView {
    pub heading: String,
    pub action: String,
    pub submit_label: &'static str,
    pub cancel_href: String,
    pub form: TagForm,
    pub errors: FieldErrors,
}

impl TagFormView {
    pub fn new(target: FormTarget<'_, TagRecord>, form: TagForm, errors: FieldErrors) -> Self {
        Self {
            heading: target.heading("tag"),
            action: target.action("/tags/create/"),
            submit_label: target.submit_label(),
            cancel_href: target.cancel_href("/tags/"),
            form,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "tags/form.html")]
pub struct TagFormTemplate {
    pub view: LayoutContext<TagFormView>,
}

/// Whether a form creates a new entity or edits an existing one.
pub enum FormTarget<'a, E> {
    Create,
    Update(&'a E),
}

impl<E> Clone for FormTarget<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FormTarget<'_, E> {}

impl<E: CanonicalLocation> FormTarget<'_, E> {
    fn heading(self, kind: &str) -> String {
        match self {
            Self::Create => format!("Create {kind}"),
            Self::Update(_) => format!("Edit {kind}"),
        }
    }

    fn action(self, create_path: &str) -> String {
        match self {
            Self::Create => create_path.to_string(),
            Self::Update(entity) => entity.update_location(),
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update(_) => "Save",
        }
    }

    fn cancel_href(self, list_location: &str) -> String {
        match self {
            Self::Create => list_location.to_string(),
            Self::Update(entity) => entity.canonical_location(),
        }
    }
}

pub struct LoginView {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            title: "Access Denied".to_string(),
            message: "Only signed-in authors may change posts and tags.".to_string(),
            primary_action: Some(ErrorAction::login()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }

    pub fn login() -> Self {
        Self {
            href: "/login/".to_string(),
            label: "Sign in".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut text: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    if let Some(index) = text.rfind(char::is_whitespace) {
        text.truncate(index);
    }
    text.push('…');
    text
}

fn iso_date(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

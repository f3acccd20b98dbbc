//! Create, detail, update and delete handlers shared by every slug-addressed resource.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::Form;
use metrics::counter;
use tracing::debug;

use crate::application::crud::{CrudError, SlugResource};
use crate::application::error::HttpError;
use crate::application::forms::FieldErrors;
use crate::application::repos::RepoError;
use crate::domain::entities::CanonicalLocation;
use crate::presentation::views::{
    FormTarget, LayoutChrome, render_http_error, render_not_found_response,
};

use super::{Chrome, HttpState, repo_error_to_http};

type EntityOf<E> = <<E as CrudEndpoint>::Resource as SlugResource>::Entity;
type FormOf<E> = <<E as CrudEndpoint>::Resource as SlugResource>::Form;

/// HTML surface of a [`SlugResource`].
#[async_trait]
pub(super) trait CrudEndpoint: Send + Sync + 'static {
    type Resource: SlugResource;

    /// Where a successful delete redirects.
    const LIST_LOCATION: &'static str;
    const SOURCE: &'static str;

    fn resource(state: &HttpState) -> Arc<Self::Resource>;

    async fn form_page(
        state: &HttpState,
        chrome: LayoutChrome,
        target: FormTarget<'_, <Self::Resource as SlugResource>::Entity>,
        form: <Self::Resource as SlugResource>::Form,
        errors: FieldErrors,
    ) -> Result<Response, RepoError>;

    /// `None` when the slug does not resolve to a visible entity.
    async fn detail_page(
        state: &HttpState,
        chrome: LayoutChrome,
        slug: &str,
    ) -> Result<Option<Response>, RepoError>;

    fn delete_page(chrome: LayoutChrome, entity: &<Self::Resource as SlugResource>::Entity)
    -> Response;
}

/// Detail route, open to every visitor.
pub(super) fn public_routes<E: CrudEndpoint>() -> Router<HttpState> {
    let collection = <EntityOf<E> as CanonicalLocation>::COLLECTION;
    Router::new().route(&format!("/{collection}/{{slug}}/"), get(detail::<E>))
}

/// Create, update and delete routes; callers gate them behind author auth.
pub(super) fn authoring_routes<E: CrudEndpoint>() -> Router<HttpState> {
    let collection = <EntityOf<E> as CanonicalLocation>::COLLECTION;
    Router::new()
        .route(
            &format!("/{collection}/create/"),
            get(create_form::<E>).post(create_submit::<E>),
        )
        .route(
            &format!("/{collection}/{{slug}}/update/"),
            get(update_form::<E>).post(update_submit::<E>),
        )
        .route(
            &format!("/{collection}/{{slug}}/delete/"),
            get(delete_confirm::<E>).post(delete_submit::<E>),
        )
}

async fn detail<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Path(slug): Path<String>,
) -> Response {
    match E::detail_page(&state, chrome.clone(), &slug).await {
        Ok(Some(response)) => response,
        Ok(None) => render_not_found_response(chrome),
        Err(err) => render_http_error(chrome, repo_error_to_http(E::SOURCE, err)),
    }
}

async fn create_form<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
) -> Response {
    let page = E::form_page(
        &state,
        chrome.clone(),
        FormTarget::Create,
        FormOf::<E>::default(),
        FieldErrors::new(),
    )
    .await;
    page_or_error::<E>(page, chrome)
}

async fn create_submit<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Form(form): Form<FormOf<E>>,
) -> Response {
    let resource = E::resource(&state);
    match resource.create(&form).await {
        Ok(entity) => Redirect::to(&entity.canonical_location()).into_response(),
        Err(CrudError::Invalid(errors)) => {
            reject::<E>(&state, chrome, FormTarget::Create, form, errors).await
        }
        Err(CrudError::Repo(err)) => render_http_error(chrome, repo_error_to_http(E::SOURCE, err)),
    }
}

async fn update_form<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Path(slug): Path<String>,
) -> Response {
    let resource = E::resource(&state);
    let entity = match lookup::<E>(&resource, &slug, &chrome).await {
        Ok(entity) => entity,
        Err(response) => return response,
    };
    let form = match resource.form_for(&entity).await {
        Ok(form) => form,
        Err(err) => return render_http_error(chrome, repo_error_to_http(E::SOURCE, err)),
    };
    let page = E::form_page(
        &state,
        chrome.clone(),
        FormTarget::Update(&entity),
        form,
        FieldErrors::new(),
    )
    .await;
    page_or_error::<E>(page, chrome)
}

async fn update_submit<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Path(slug): Path<String>,
    Form(form): Form<FormOf<E>>,
) -> Response {
    let resource = E::resource(&state);
    let entity = match lookup::<E>(&resource, &slug, &chrome).await {
        Ok(entity) => entity,
        Err(response) => return response,
    };
    match resource.update(&entity, &form).await {
        Ok(saved) => Redirect::to(&saved.canonical_location()).into_response(),
        Err(CrudError::Invalid(errors)) => {
            reject::<E>(&state, chrome, FormTarget::Update(&entity), form, errors).await
        }
        Err(CrudError::Repo(err)) => render_http_error(chrome, repo_error_to_http(E::SOURCE, err)),
    }
}

async fn delete_confirm<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Path(slug): Path<String>,
) -> Response {
    let resource = E::resource(&state);
    match lookup::<E>(&resource, &slug, &chrome).await {
        Ok(entity) => E::delete_page(chrome, &entity),
        Err(response) => response,
    }
}

async fn delete_submit<E: CrudEndpoint>(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Path(slug): Path<String>,
) -> Response {
    let resource = E::resource(&state);
    let entity = match lookup::<E>(&resource, &slug, &chrome).await {
        Ok(entity) => entity,
        Err(response) => return response,
    };
    match resource.delete(&entity).await {
        Ok(()) => Redirect::to(E::LIST_LOCATION).into_response(),
        Err(CrudError::Repo(RepoError::NotFound)) => render_not_found_response(chrome),
        Err(CrudError::Repo(err)) => render_http_error(chrome, repo_error_to_http(E::SOURCE, err)),
        Err(CrudError::Invalid(errors)) => render_http_error(
            chrome,
            HttpError::new(
                E::SOURCE,
                StatusCode::CONFLICT,
                "The record could not be deleted",
                format!("delete rejected on fields: {:?}", errors.fields().collect::<Vec<_>>()),
            ),
        ),
    }
}

async fn lookup<E: CrudEndpoint>(
    resource: &E::Resource,
    slug: &str,
    chrome: &LayoutChrome,
) -> Result<EntityOf<E>, Response> {
    match resource.find_by_slug(slug).await {
        Ok(Some(entity)) => Ok(entity),
        Ok(None) => Err(render_not_found_response(chrome.clone())),
        Err(err) => Err(render_http_error(
            chrome.clone(),
            repo_error_to_http(E::SOURCE, err),
        )),
    }
}

/// Re-render a rejected submission with its field errors; nothing was written.
async fn reject<E: CrudEndpoint>(
    state: &HttpState,
    chrome: LayoutChrome,
    target: FormTarget<'_, EntityOf<E>>,
    form: FormOf<E>,
    errors: FieldErrors,
) -> Response {
    let kind = <E::Resource as SlugResource>::KIND;
    counter!("blogengine_form_rejections_total", "entity" => kind).increment(1);
    debug!(
        target = "blogengine::http::crud",
        entity = kind,
        fields = ?errors.fields().collect::<Vec<_>>(),
        "form submission rejected"
    );
    let page = E::form_page(state, chrome.clone(), target, form, errors).await;
    page_or_error::<E>(page, chrome)
}

fn page_or_error<E: CrudEndpoint>(
    page: Result<Response, RepoError>,
    chrome: LayoutChrome,
) -> Response {
    page.unwrap_or_else(|err| render_http_error(chrome, repo_error_to_http(E::SOURCE, err)))
}

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post},
};
use serde::Deserialize;

use crate::application::search::SearchQuery;
use crate::presentation::views::{
    IndexTemplate, IndexView, LayoutContext, TagLink, TagListTemplate, TagListView,
    render_http_error, render_not_found_response, render_template_response,
};

use super::{
    Chrome, HttpState,
    auth::{identify_author, login_form, login_submit, logout, require_author},
    crud::{authoring_routes, public_routes},
    db_health_response,
    middleware::{log_responses, set_request_context},
    posts::PostEndpoint,
    repo_error_to_http,
    tags::TagEndpoint,
};

pub fn build_router(state: HttpState) -> Router {
    let authoring = authoring_routes::<PostEndpoint>()
        .merge(authoring_routes::<TagEndpoint>())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_author,
        ));

    Router::new()
        .route("/", get(index))
        .route("/tags/", get(tag_list))
        .route("/login/", get(login_form).post(login_submit))
        .route("/logout/", post(logout))
        .route("/_health/db", get(public_health))
        .merge(public_routes::<PostEndpoint>())
        .merge(public_routes::<TagEndpoint>())
        .merge(authoring)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identify_author,
        ))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndexQuery {
    search: Option<String>,
    page: Option<String>,
}

async fn index(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    Query(query): Query<IndexQuery>,
) -> Response {
    let search = SearchQuery::parse(query.search.as_deref());
    match state
        .posts
        .list_published(search, query.page.as_deref())
        .await
    {
        Ok(listing) => {
            let view = LayoutContext::new(chrome, IndexView::from(&listing));
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => render_http_error(chrome, repo_error_to_http("infra::http::index", err)),
    }
}

async fn tag_list(State(state): State<HttpState>, Chrome(chrome): Chrome) -> Response {
    match state.tags.list_all().await {
        Ok(tags) => {
            let content = TagListView {
                tags: tags.iter().map(TagLink::from).collect(),
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(TagListTemplate { view }, StatusCode::OK)
        }
        Err(err) => render_http_error(chrome, repo_error_to_http("infra::http::tag_list", err)),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn fallback(Chrome(chrome): Chrome) -> Response {
    render_not_found_response(chrome)
}

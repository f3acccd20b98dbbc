mod auth;
mod crud;
mod middleware;
mod posts;
mod public;
mod tags;

pub use auth::SESSION_COOKIE;
pub use public::build_router;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::application::authors::{AuthorKeyService, AuthorSession};
use crate::application::error::{ErrorReport, HttpError};
use crate::application::posts::PostService;
use crate::application::repos::{DatabaseHealth, RepoError};
use crate::application::tags::TagService;
use crate::presentation::views::LayoutChrome;

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub tags: Arc<TagService>,
    pub authors: Arc<AuthorKeyService>,
    pub health: Arc<dyn DatabaseHealth>,
    pub site_title: Arc<str>,
    pub secure_cookies: bool,
}

impl HttpState {
    pub fn chrome(&self, author: Option<&AuthorSession>) -> LayoutChrome {
        LayoutChrome::new(&self.site_title, author.map(|session| session.name.clone()))
    }
}

/// Layout chrome for the current request, aware of the signed-in author.
pub struct Chrome(pub LayoutChrome);

impl FromRequestParts<HttpState> for Chrome {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<AuthorSession>();
        Ok(Self(state.chrome(session)))
    }
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

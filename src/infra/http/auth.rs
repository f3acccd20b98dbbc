//! Author identification and the gate in front of authoring routes.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    Form,
    cookie::{Cookie, CookieJar, SameSite},
};
use metrics::counter;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::authors::AuthorSession;
use crate::presentation::views::{
    LayoutContext, LoginTemplate, LoginView, render_forbidden_response, render_template_response,
};

use super::{Chrome, HttpState};

pub const SESSION_COOKIE: &str = "blogengine_session";

/// Resolve the author behind a bearer token or session cookie, if any.
///
/// Anonymous requests pass through untouched; an unusable token is treated
/// as anonymous.
pub(super) async fn identify_author(
    State(state): State<HttpState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&request)
        .or_else(|| jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()));

    let session = match token {
        Some(token) => match state.authors.authenticate(&token).await {
            Ok(session) => Some(session),
            Err(err) => {
                debug!(
                    target = "blogengine::http::auth",
                    error = %err,
                    "ignoring unusable author token"
                );
                None
            }
        },
        None => None,
    };

    if let Some(session) = session.clone() {
        request.extensions_mut().insert(session);
    }
    let mut response = next.run(request).await;
    if let Some(session) = session {
        response.extensions_mut().insert(session);
    }
    response
}

pub(super) async fn require_author(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthorSession>().is_some() {
        return next.run(request).await;
    }

    counter!("blogengine_auth_denied_total").increment(1);
    render_forbidden_response(state.chrome(None))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    token: String,
}

pub(super) async fn login_form(Chrome(chrome): Chrome) -> Response {
    let view = LayoutContext::new(chrome, LoginView { error: None });
    render_template_response(LoginTemplate { view }, StatusCode::OK)
}

pub(super) async fn login_submit(
    State(state): State<HttpState>,
    Chrome(chrome): Chrome,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let token = form.token.trim().to_string();
    match state.authors.authenticate(&token).await {
        Ok(session) => {
            info!(
                target = "blogengine::http::auth",
                prefix = %session.prefix,
                "author signed in"
            );
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.secure_cookies)
                .path("/");
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(err) => {
            warn!(
                target = "blogengine::http::auth",
                error = %err,
                "author sign-in rejected"
            );
            let view = LayoutContext::new(
                chrome,
                LoginView {
                    error: Some("That access key is not valid.".to_string()),
                },
            );
            render_template_response(LoginTemplate { view }, StatusCode::OK)
        }
    }
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie.set_secure(state.secure_cookies);
    cookie.make_removal();
    (jar.add(cookie), Redirect::to("/")).into_response()
}

fn bearer_token(request: &Request<Body>) -> Option<String> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

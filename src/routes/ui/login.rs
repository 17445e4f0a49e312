use askama::Template;
use axum::extract::State;
use axum::{Extension, Form};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::auth::{self, CurrentSession};
use crate::error::{AppError, HtmlError};
use crate::models::login::LoginRequest;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    username: String,
    error: Option<String>,
}

pub async fn form() -> Result<Html<String>, HtmlError> {
    let tmpl = LoginTemplate {
        username: String::new(),
        error: None,
    };
    Ok(Html(tmpl.render()?))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn submit(
    State(state): State<AppState>,
    Form(input): Form<LoginForm>,
) -> Result<Response, HtmlError> {
    let username = input.username.trim().to_string();
    let request = LoginRequest {
        username: username.clone(),
        password: input.password,
    };

    match state.backend.login(&request).await {
        Ok(resp) => {
            let session_id = state.sessions.create(&username, resp.access_token).await;
            tracing::info!("User '{username}' logged in");
            Ok((
                [(SET_COOKIE, auth::session_cookie(&session_id))],
                Redirect::to("/"),
            )
                .into_response())
        }
        Err(e @ (AppError::Backend { .. } | AppError::Network(_))) => {
            tracing::warn!("Login failed for '{username}': {e}");
            let status = match &e {
                AppError::Backend { status, .. } if *status < 500 => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            let tmpl = LoginTemplate {
                username,
                error: Some(e.to_string()),
            };
            Ok((status, Html(tmpl.render()?)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    state.sessions.remove(&session.key).await;
    tracing::info!("User '{}' logged out", session.username);
    (
        [(SET_COOKIE, auth::expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

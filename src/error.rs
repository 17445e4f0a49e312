use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The backend rejected the bearer token. Terminal for the session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Non-success answer from the backend, carrying its `detail` message.
    #[error("{detail}")]
    Backend { status: u16, detail: String },

    #[error("Could not reach the analytics service")]
    Network(String),

    #[error("Unexpected response from the analytics service: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Backend { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() => code,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Decode(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Template(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    fn public_message(&self) -> String {
        match self {
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Network(cause) => {
                tracing::warn!("Backend unreachable: {cause}");
                self.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: String,
}

/// Error type for HTML routes: an expired session sends the browser back to
/// the login page, anything else renders the error page.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl From<askama::Error> for HtmlError {
    fn from(err: askama::Error) -> Self {
        HtmlError(AppError::Template(err))
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        if self.0.is_unauthorized() {
            return Redirect::to("/login").into_response();
        }

        let status = self.0.status();
        let tmpl = ErrorTemplate {
            status: status.as_u16(),
            message: self.0.public_message(),
        };
        match tmpl.render() {
            Ok(page) => (status, Html(page)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {e}");
                (status, tmpl.message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_server_errors_become_bad_gateway() {
        let err = AppError::Backend {
            status: 500,
            detail: "boom".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = AppError::Backend {
            status: 422,
            detail: "nivel inválido".into(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "nivel inválido");
    }

    #[test]
    fn network_error_has_distinct_message() {
        let err = AppError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Could not reach the analytics service");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn html_unauthorized_redirects_to_login() {
        let resp = HtmlError(AppError::Unauthorized).into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/login");
    }

    #[test]
    fn html_other_errors_render_page() {
        let resp = HtmlError(AppError::NotFound("programa".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

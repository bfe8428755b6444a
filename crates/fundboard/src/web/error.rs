//! Mapping of crate errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::Error;

/// Path of the admin login page.
pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Login URL that returns the visitor to `next` afterwards.
#[must_use]
pub fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) if !next.is_empty() => serde_urlencoded::to_string(&[("next", next)])
            .map_or_else(|_| LOGIN_PATH.to_string(), |query| format!("{LOGIN_PATH}?{query}")),
        _ => LOGIN_PATH.to_string(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::LoginRequired { next } => {
                return Redirect::to(&login_url(Some(&next))).into_response();
            }
            Self::ProjectNotFound { slug } => {
                (StatusCode::NOT_FOUND, format!("project not found: {slug}"))
            }
            Self::Validation { message } => (StatusCode::BAD_REQUEST, message),
            Self::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_login_url() {
        assert_eq!(login_url(None), "/admin/login");
        assert_eq!(login_url(Some("")), "/admin/login");
        assert_eq!(
            login_url(Some("/admin/projects/ai-education/edit")),
            "/admin/login?next=%2Fadmin%2Fprojects%2Fai-education%2Fedit"
        );
    }

    #[test]
    fn test_login_required_redirects() {
        let response = Error::login_required("/admin").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/admin/login?next=%2Fadmin"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::validation("bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::internal("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

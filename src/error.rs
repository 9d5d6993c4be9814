use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{validation::FieldError, AuthError};

/// Opaque codes for server-side failures; details stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCode {
    UserLookup,
    UserInsert,
}

impl ServerCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserLookup => "USR-451",
            Self::UserInsert => "USR-521",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("Sorry, there is already a user with that email in our system.")]
    DuplicateUser,

    #[error("Server Error: {}", .0.as_str())]
    Server(ServerCode),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateUser => StatusCode::IM_A_TEAPOT,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorItem {
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorItems {
    Fields(Vec<FieldError>),
    Messages(Vec<ErrorItem>),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    errors: ErrorItems,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let errors = match self {
            Self::Validation(fields) => ErrorItems::Fields(fields),
            Self::Unauthorized(ref e) => ErrorItems::Messages(vec![ErrorItem {
                msg: e.to_string(),
                code: Some(e.code()),
            }]),
            other => ErrorItems::Messages(vec![ErrorItem {
                msg: other.to_string(),
                code: None,
            }]),
        };
        let body = ErrorBody {
            success: false,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn server_errors_expose_only_the_code() {
        let (status, body) = render(ApiError::Server(ServerCode::UserLookup)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "errors": [{"msg": "Server Error: USR-451"}]})
        );

        let (_, body) = render(ApiError::Server(ServerCode::UserInsert)).await;
        assert_eq!(body["errors"][0]["msg"], "Server Error: USR-521");
    }

    #[tokio::test]
    async fn auth_errors_carry_message_and_code() {
        let (status, body) = render(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["msg"], "Token expired, please login in again.");
        assert_eq!(body["errors"][0]["code"], "token_expired");
    }

    #[tokio::test]
    async fn store_failures_during_auth_hide_details() {
        let err = AuthError::Store(anyhow::anyhow!("connection refused to 10.0.0.3"));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["msg"], "Unable to auth user.");
    }

    #[tokio::test]
    async fn duplicate_user_is_a_teapot() {
        let (status, body) = render(ApiError::DuplicateUser).await;
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(
            body["errors"][0]["msg"],
            "Sorry, there is already a user with that email in our system."
        );
    }
}

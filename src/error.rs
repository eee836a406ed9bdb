use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// CodeMessage
///
/// The `{code, message}` pair every JSON response carries. Rejections and handler
/// failures are built from the constants below rather than assembled ad hoc, so a
/// given failure kind always produces the same payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeMessage {
    pub code: u16,
    pub message: &'static str,
}

impl CodeMessage {
    pub const OK: Self = Self::new(0, "ok");
    pub const UNAUTHORIZED: Self = Self::new(1, "Unauthorized");
    pub const INTERNAL_ERROR: Self = Self::new(2, "Internal server error");
    pub const USERNAME_PASSWORD_WRONG: Self =
        Self::new(3, "Bad Request: username or password is wrong");
    pub const USERNAME_PASSWORD_MISMATCH: Self =
        Self::new(4, "Bad Request: username or password is mismatch");
    pub const USER_NOT_FOUND: Self = Self::new(5, "Bad Request: User not found");
    pub const NOTIFICATION_NOT_FOUND: Self = Self::new(5, "Bad Request: Notification not found");
    pub const INVALID_TOKEN: Self = Self::new(6, "Invalid Token!");
    pub const AUTHORIZATION_FORMAT_ERROR: Self =
        Self::new(7, "Format for Authorization: Bearer [token]");
    pub const AUTHORIZATION_NOT_FOUND: Self = Self::new(8, "No Authorization was found");
    pub const PRIVILEGE_NOT_SUFFICIENT: Self =
        Self::new(9, "Authorization privilege not sufficient");
    pub const MALFORMED_REQUEST: Self = Self::new(10, "Bad Request: malformed request");

    const fn new(code: u16, message: &'static str) -> Self {
        Self { code, message }
    }
}

/// VerifyError
///
/// Internal reasons a token failed verification. These are kept for logging only;
/// clients always see the single `InvalidToken` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

impl VerifyError {
    /// Stable label used in structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            VerifyError::Malformed => "malformed",
            VerifyError::InvalidSignature => "invalid_signature",
            VerifyError::Expired => "expired",
        }
    }
}

/// AuthError
///
/// Terminal outcomes of the auth gate. Every variant is answered with HTTP 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredentials,
    #[error("authorization header is not `Bearer <token>`")]
    MalformedAuthorizationHeader,
    #[error("token rejected: {0}")]
    InvalidToken(VerifyError),
    #[error("role is not allowed on this route")]
    InsufficientPrivilege,
}

impl AuthError {
    pub fn code_message(&self) -> CodeMessage {
        match self {
            AuthError::MissingCredentials => CodeMessage::AUTHORIZATION_NOT_FOUND,
            AuthError::MalformedAuthorizationHeader => CodeMessage::AUTHORIZATION_FORMAT_ERROR,
            AuthError::InvalidToken(_) => CodeMessage::INVALID_TOKEN,
            AuthError::InsufficientPrivilege => CodeMessage::PRIVILEGE_NOT_SUFFICIENT,
        }
    }
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        AuthError::InvalidToken(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self.code_message())).into_response()
    }
}

/// ApiError
///
/// Failures raised by route handlers after the gate has let a request through
/// (or on public routes).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("username or password missing")]
    MissingLoginFields,
    #[error("no user matches the supplied username")]
    UnknownLogin,
    #[error("password does not match")]
    WrongPassword,
    #[error("user not found")]
    UserNotFound,
    #[error("notification not found")]
    NotificationNotFound,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, CodeMessage) {
        match self {
            ApiError::MissingLoginFields => {
                (StatusCode::BAD_REQUEST, CodeMessage::USERNAME_PASSWORD_WRONG)
            }
            ApiError::UnknownLogin => {
                (StatusCode::BAD_REQUEST, CodeMessage::USERNAME_PASSWORD_MISMATCH)
            }
            ApiError::WrongPassword => (StatusCode::UNAUTHORIZED, CodeMessage::UNAUTHORIZED),
            ApiError::UserNotFound => (StatusCode::BAD_REQUEST, CodeMessage::USER_NOT_FOUND),
            ApiError::NotificationNotFound => {
                (StatusCode::BAD_REQUEST, CodeMessage::NOTIFICATION_NOT_FOUND)
            }
            ApiError::MalformedRequest(_) => {
                (StatusCode::BAD_REQUEST, CodeMessage::MALFORMED_REQUEST)
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, CodeMessage::INTERNAL_ERROR)
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("failed to issue token: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_code();
        match &self {
            ApiError::Internal(detail) => tracing::error!(error = %detail, "request failed"),
            ApiError::MalformedRequest(detail) => {
                tracing::debug!(error = %detail, "rejected malformed request")
            }
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}

/// ApiResponse
///
/// Success envelope: `{"code": 0, "message": "ok", "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(flatten)]
    pub status: CodeMessage,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            status: CodeMessage::OK,
            data,
        })
    }
}

//! Request extractors whose rejections are answered with the `{code, message}` body
//! instead of axum's plain-text defaults.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Body encodings understood by both the auth gate and the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    /// `None` for a missing or unsupported content type.
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        let mime = content_type?.split(';').next()?.trim();
        if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(BodyFormat::Form)
        } else if mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json") {
            Some(BodyFormat::Json)
        } else {
            None
        }
    }
}

/// decode_body
///
/// An empty body, or one in an unsupported format, decodes as an empty object so
/// handlers see the same "no fields" input either way.
pub fn decode_body<T: DeserializeOwned>(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<T, ApiError> {
    let format = BodyFormat::from_content_type(content_type).filter(|_| !bytes.is_empty());
    let decoded = match format {
        Some(BodyFormat::Json) => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        Some(BodyFormat::Form) => serde_urlencoded::from_bytes(bytes).map_err(|e| e.to_string()),
        None => serde_json::from_value(Value::Object(Map::new())).map_err(|e| e.to_string()),
    };
    decoded.map_err(ApiError::MalformedRequest)
}

/// Payload
///
/// Request body accepted as JSON or as a url-encoded form, the same two encodings the
/// gate reads a `token` field from.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            tracing::warn!(error = %rejection.body_text(), "could not read request body");
            ApiError::MalformedRequest(rejection.body_text())
        })?;

        decode_body(content_type.as_deref(), &bytes).map(Payload)
    }
}

/// Numeric `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| RecordId(id))
            .map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))
    }
}

/// Query string, rejected with the JSON error body.
#[derive(Debug)]
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Params(value))
            .map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))
    }
}

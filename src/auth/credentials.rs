use axum::http::{HeaderMap, header};
use serde_json::{Map, Value};

use crate::{error::AuthError, extract::BodyFormat};

const BEARER_SCHEME: &str = "Bearer";
const TOKEN_FIELD: &str = "token";

/// extract_token
///
/// Locates the candidate token for a request, checking in order:
/// `Authorization: Bearer <token>`, the `token` query parameter, then a `token` field
/// in the parsed body. A present but badly shaped `Authorization` header is an error
/// and does not fall through to the other sources.
pub fn extract_token(
    headers: &HeaderMap,
    query: Option<&str>,
    body: Option<&Value>,
) -> Result<String, AuthError> {
    if let Some(token) = header_or_query_token(headers, query)? {
        return Ok(token);
    }
    body.and_then(body_token)
        .ok_or(AuthError::MissingCredentials)
}

/// needs_body
///
/// True when neither the header nor the query string settles the outcome, so the
/// caller has to buffer and parse the body before calling [`extract_token`].
pub fn needs_body(headers: &HeaderMap, query: Option<&str>) -> bool {
    matches!(header_or_query_token(headers, query), Ok(None))
}

fn header_or_query_token(
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Option<String>, AuthError> {
    if let Some(token) = bearer_token(headers) {
        return token.map(Some);
    }
    Ok(query.and_then(query_token))
}

fn bearer_token(headers: &HeaderMap) -> Option<Result<String, AuthError>> {
    let value = headers.get(header::AUTHORIZATION)?;
    if value.is_empty() {
        return None;
    }

    let Ok(value) = value.to_str() else {
        return Some(Err(AuthError::MalformedAuthorizationHeader));
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, credentials] if *scheme == BEARER_SCHEME => Some(Ok((*credentials).to_string())),
        _ => Some(Err(AuthError::MalformedAuthorizationHeader)),
    }
}

fn query_token(query: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == TOKEN_FIELD)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Reads `token` from a parsed body. Null and empty strings count as absent; any other
/// non-string value is handed on as JSON text and will fail verification.
fn body_token(body: &Value) -> Option<String> {
    match body.get(TOKEN_FIELD)? {
        Value::Null => None,
        Value::String(token) if token.is_empty() => None,
        Value::String(token) => Some(token.clone()),
        other => Some(other.to_string()),
    }
}

/// Parses a buffered request body the way the handlers' extractor would: JSON for
/// `application/json`, key/value pairs for url-encoded forms.
pub fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }

    match BodyFormat::from_content_type(content_type)? {
        BodyFormat::Form => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes).ok()?;
            let fields: Map<String, Value> = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            Some(Value::Object(fields))
        }
        BodyFormat::Json => serde_json::from_slice(bytes).ok(),
    }
}

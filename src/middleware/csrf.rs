// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSRF protection for state-changing requests.

use crate::error::AppError;
use crate::middleware::session::Session;
use axum::{
    body::Body,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
    Form,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

/// Header carrying the token on script-issued requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Largest form body buffered while looking for the token.
const MAX_FORM_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
struct CsrfField {
    csrf_token: Option<String>,
}

fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Compare tokens in constant time.
pub fn tokens_match(expected: &str, submitted: &str) -> bool {
    !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(submitted.as_bytes()))
}

/// Reject unsafe requests that do not echo the session's CSRF token, either in
/// the `X-CSRF-Token` header or the `csrf_token` form field.
pub async fn verify_csrf(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    let header_token = parts
        .headers
        .get(CSRF_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let (submitted, body) = match header_token {
        Some(token) => (Some(token), body),
        None if is_urlencoded_form(&parts.headers) => {
            let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
                .await
                .map_err(|_| AppError::BadRequest("Form body too large".to_string()))?;

            let probe = Request::builder()
                .method(Method::POST)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(bytes.clone()))
                .map_err(|e| AppError::Internal(e.into()))?;

            let token = Form::<CsrfField>::from_request(probe, &())
                .await
                .ok()
                .and_then(|Form(field)| field.csrf_token);

            (token, Body::from(bytes))
        }
        None => (None, body),
    };

    let valid = submitted
        .as_deref()
        .map(|token| tokens_match(&session.csrf_token(), token))
        .unwrap_or(false);

    if !valid {
        tracing::warn!(
            method = %parts.method,
            path = %parts.uri.path(),
            token_present = submitted.is_some(),
            "Blocked request with missing or invalid CSRF token"
        );
        return Err(AppError::Forbidden(
            "CSRF token missing or invalid".to_string(),
        ));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc123", "abc"));
        assert!(!tokens_match("", ""));
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
    }
}

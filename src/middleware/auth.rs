// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login guards for pages and API routes.

use crate::error::AppError;
use crate::middleware::session::{FlashLevel, Session};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Authenticated user taken from the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl AuthUser {
    fn from_session(session: &Session) -> Option<Self> {
        Some(AuthUser {
            user_id: session.user_id()?,
            username: session.username().unwrap_or_default(),
        })
    }
}

/// Page guard: anonymous visitors are sent to the login form.
pub async fn require_user(session: Session, mut request: Request, next: Next) -> Response {
    match AuthUser::from_session(&session) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            session.flash(FlashLevel::Info, "Please log in to continue");
            Redirect::to("/login").into_response()
        }
    }
}

/// API guard: anonymous requests get `401`.
pub async fn require_api_user(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = AuthUser::from_session(&session).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

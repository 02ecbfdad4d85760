// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (sessions, CSRF, authentication, metrics, security headers).

pub mod auth;
pub mod csrf;
pub mod metrics;
pub mod security;
pub mod session;

pub use auth::{require_api_user, require_user, AuthUser};
pub use session::{FlashLevel, Session};

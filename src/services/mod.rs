// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod consent;
pub mod password;
pub mod recommendations;

pub use recommendations::{recommend, Recommendation};

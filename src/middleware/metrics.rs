// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request counters and latency histogram.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use ::metrics::{counter, histogram};
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const ERRORS_TOTAL: &str = "http_errors_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Record every request; responses with status >= 400 also count as errors.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();

    // Route templates keep label cardinality bounded (no habit IDs).
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    if response.status().is_client_error() || response.status().is_server_error() {
        counter!(
            ERRORS_TOTAL,
            "method" => method.clone(),
            "path" => path.clone(),
            "status" => status
        )
        .increment(1);
    }

    histogram!(REQUEST_DURATION, "method" => method, "path" => path).record(elapsed);

    response
}

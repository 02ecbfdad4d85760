// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSRF protection on state-changing requests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;
use common::{body_json, location, TestClient};

#[tokio::test]
async fn test_form_without_token_rejected() {
    let mut client = TestClient::new();
    client.sign_up("ana").await;

    let response = client
        .post_form_raw("/add_habit", &[("habit_name", "Sneaky")])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "forbidden");

    assert!(client.habits().await.is_empty());
}

#[tokio::test]
async fn test_form_with_wrong_token_rejected() {
    let mut client = TestClient::new();
    client.sign_up("ben").await;

    let response = client
        .post_form_raw(
            "/add_habit",
            &[("habit_name", "Sneaky"), ("csrf_token", "0000")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_from_another_session_rejected() {
    let mut victim = TestClient::new();
    victim.sign_up("victim").await;

    let mut attacker = victim.fresh_browser();
    let attacker_token = attacker.csrf_token().await;

    let response = victim
        .post_form_raw(
            "/add_habit",
            &[("habit_name", "Planted"), ("csrf_token", &attacker_token)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_form_requires_token() {
    let mut client = TestClient::new();

    let response = client
        .post_form_raw("/login", &[("username", "x"), ("password", "y")])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_rotates_on_login() {
    let mut client = TestClient::new();
    let before = client.csrf_token().await;
    assert_eq!(before.len(), 64);

    client.sign_up("cleo").await;
    let after = client.csrf_token().await;
    assert_ne!(before, after);

    // The pre-login token no longer works
    let response = client
        .post_form_raw("/add_habit", &[("habit_name", "Old"), ("csrf_token", &before)])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_json_requires_header() {
    let mut client = TestClient::new();

    let response = client
        .post_json("/api/cookie-preferences", json!({"analytics": true}), false)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post_json("/api/cookie-preferences", json!({"analytics": true}), true)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_safe_methods_skip_check() {
    let mut client = TestClient::new();
    client.sign_up("dino").await;

    let response = client
        .send(
            Request::builder()
                .method("GET")
                .uri("/api/cookie-preferences")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_needs_token() {
    let mut client = TestClient::new();
    client.sign_up("dana").await;

    // A cross-site link or image cannot end the session
    let response = client.get("/logout").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client.post_form_raw("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(client.get("/").await.status(), StatusCode::OK);

    let response = client.post_form("/logout", &[]).await;
    assert_eq!(location(&response), "/login");
    assert_eq!(location(&client.get("/").await), "/login");
}

#[tokio::test]
async fn test_page_embeds_session_token() {
    let mut client = TestClient::new();
    let html = client.page("/login").await;
    let token = client.csrf_token().await;

    assert!(html.contains(&format!("name=\"csrf_token\" value=\"{}\"", token)));
    assert!(html.contains(&format!("<meta name=\"csrf-token\" content=\"{}\">", token)));
}

#[tokio::test]
async fn test_non_form_body_without_header_rejected() {
    let mut client = TestClient::new();

    let response = client
        .send(
            Request::builder()
                .method("POST")
                .uri("/cookie-consent")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("action=accept_all"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

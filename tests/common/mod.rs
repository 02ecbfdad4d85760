// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response, StatusCode},
    Router,
};
use habit_tracker::config::Config;
use habit_tracker::db::{Database, FirestoreDb, MemoryDb};
use habit_tracker::routes::create_router;
use habit_tracker::AppState;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

pub mod db_contract;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Database::Memory(MemoryDb::new()))
}

#[allow(dead_code)]
pub fn create_test_app_with(db: Database) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db,
        metrics: None,
    });

    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Redirect target of a `303 See Other` response.
#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// A browser-like client: keeps cookies between requests.
#[allow(dead_code)]
pub struct TestClient {
    app: Router,
    pub state: Arc<AppState>,
    cookies: BTreeMap<String, String>,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new() -> Self {
        let (app, state) = create_test_app();
        Self::from_app(app, state)
    }

    pub fn from_app(app: Router, state: Arc<AppState>) -> Self {
        Self {
            app,
            state,
            cookies: BTreeMap::new(),
        }
    }

    /// A second browser talking to the same server.
    pub fn fresh_browser(&self) -> Self {
        Self::from_app(self.app.clone(), self.state.clone())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request.headers_mut().insert(
                header::COOKIE,
                HeaderValue::from_str(&cookie_header).unwrap(),
            );
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// GET a page and return its HTML.
    pub async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        body_string(response).await
    }

    pub async fn csrf_token(&mut self) -> String {
        let response = self.get("/api/csrf-token").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["csrf_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// POST a form exactly as given.
    pub async fn post_form_raw(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_body(fields)))
                .unwrap(),
        )
        .await
    }

    /// POST a form with the session's CSRF token added.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let token = self.csrf_token().await;
        let mut with_token = fields.to_vec();
        with_token.push(("csrf_token", token.as_str()));
        self.post_form_raw(uri, &with_token).await
    }

    /// POST JSON, optionally with the `X-CSRF-Token` header.
    pub async fn post_json(
        &mut self,
        uri: &str,
        body: serde_json::Value,
        with_token: bool,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if with_token {
            let token = self.csrf_token().await;
            builder = builder.header("x-csrf-token", token);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Response<Body> {
        self.post_form(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Response<Body> {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    /// Register `username` with a default password and log in.
    pub async fn sign_up(&mut self, username: &str) {
        let email = format!("{}@example.com", username);
        let response = self.register(username, &email, "correct horse").await;
        assert_eq!(location(&response), "/login");

        let response = self.login(username, "correct horse").await;
        assert_eq!(location(&response), "/");
    }

    pub async fn add_habit(&mut self, name: &str, description: &str) -> Response<Body> {
        self.post_form(
            "/add_habit",
            &[("habit_name", name), ("habit_description", description)],
        )
        .await
    }

    /// Habit summaries from the JSON API.
    pub async fn habits(&mut self) -> Vec<serde_json::Value> {
        let response = self.get("/api/habits").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["habits"]
            .as_array()
            .unwrap()
            .clone()
    }

    /// ID of the habit called `name`.
    pub async fn habit_id(&mut self, name: &str) -> String {
        self.habits()
            .await
            .into_iter()
            .find(|h| h["name"] == name)
            .unwrap_or_else(|| panic!("no habit named {}", name))["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

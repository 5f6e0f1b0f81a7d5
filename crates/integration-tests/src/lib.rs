//! HTTP integration tests for Doações.
//!
//! # Running Tests
//!
//! ```bash
//! doacoes-cli migrate
//! doacoes-cli admin create
//! cargo run -p doacoes-admin &
//! cargo test -p doacoes-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `DOACOES_TEST_URL` - server under test (default `http://127.0.0.1:8000`)
//! - `DOACOES_TEST_ADMIN_EMAIL` / `DOACOES_TEST_ADMIN_PASSWORD` - an existing
//!   ADMIN account (defaults match `doacoes-cli admin create`)

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, StatusCode, redirect::Policy};
use serde_json::{Value, json};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("DOACOES_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

/// Credentials of the bootstrap ADMIN account.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("DOACOES_TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@admin.com".to_string()),
        std::env::var("DOACOES_TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    )
}

/// A unique email address so tests can run repeatedly.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.doacoes.org", uuid::Uuid::new_v4().simple())
}

/// Client with a cookie store that does not follow redirects.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// JSON API client authenticated with a bearer token.
pub struct ApiClient {
    pub client: Client,
    pub base_url: String,
    pub access: String,
    pub refresh: String,
    pub user: Value,
}

impl ApiClient {
    /// Obtain a token pair for `email`.
    pub async fn login(email: &str, password: &str) -> Self {
        let base_url = base_url();
        let client = client();

        let resp = client
            .post(format!("{base_url}/api/token/"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to request token");
        assert_eq!(resp.status(), StatusCode::OK, "login as {email} failed");

        let body: Value = resp.json().await.expect("Invalid token response");
        Self {
            client,
            base_url,
            access: body["access"].as_str().expect("access token").to_string(),
            refresh: body["refresh"].as_str().expect("refresh token").to_string(),
            user: body["user"].clone(),
        }
    }

    /// Log in as the bootstrap ADMIN.
    pub async fn admin() -> Self {
        let (email, password) = admin_credentials();
        Self::login(&email, &password).await
    }

    /// Create a GERENTE account and log in as it.
    pub async fn new_gerente(&self) -> Self {
        let email = unique_email("gerente");
        let password = "gerente-pass-1";
        let resp = self
            .post(
                "/api/users/create_gerente/",
                &json!({
                    "email": email,
                    "full_name": "Gerente de Teste",
                    "password": password,
                    "password2": password,
                }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        Self::login(&email, password).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.access)
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.access)
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(&self.access)
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&self.access)
            .send()
            .await
            .expect("DELETE failed")
    }

    /// POST and return the created record's JSON.
    pub async fn create(&self, path: &str, body: &Value) -> Value {
        let resp = self.post(path, body).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "POST {path}");
        resp.json().await.expect("Invalid JSON")
    }
}

/// Field names carried by a JSON error body.
#[must_use]
pub fn error_fields(body: &Value) -> Vec<String> {
    body["error"]["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

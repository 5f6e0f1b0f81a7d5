//! Token issuance, account management and role gating over the JSON API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The admin server running (cargo run -p doacoes-admin)
//! - The bootstrap account (doacoes-cli admin create)

use doacoes_integration_tests::{ApiClient, base_url, client, unique_email};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_protected_endpoints_reject_anonymous_requests() {
    let client = client();
    let base_url = base_url();

    for path in [
        "/api/users/",
        "/api/doadores/",
        "/api/recebedores/",
        "/api/itens/",
        "/api/doacoes/",
    ] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_token_carries_user_and_refreshes() {
    let api = ApiClient::admin().await;
    assert_eq!(api.user["role"], "ADMIN");
    assert!(api.user["last_access"].is_string());

    let resp = api
        .client
        .post(format!("{}/api/token/refresh/", api.base_url))
        .json(&json!({ "refresh": api.refresh }))
        .send()
        .await
        .expect("refresh failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert!(body["access"].as_str().is_some_and(|t| t != api.access));

    let me: Value = api.get("/api/users/me/").await.json().await.expect("Invalid JSON");
    assert_eq!(me["email"], api.user["email"]);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_wrong_password_rejected() {
    let resp = client()
        .post(format!("{}/api/token/", base_url()))
        .json(&json!({ "email": "admin@admin.com", "password": "definitely-wrong" }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_gerente_cannot_manage_users() {
    let admin = ApiClient::admin().await;
    let gerente = admin.new_gerente().await;
    assert_eq!(gerente.user["role"], "GERENTE");

    let resp = gerente
        .post(
            "/api/users/",
            &json!({
                "email": unique_email("blocked"),
                "full_name": "Blocked",
                "password": "blocked-pass-1",
                "password2": "blocked-pass-1",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Records remain accessible
    assert_eq!(gerente.get("/api/doadores/").await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_user_creation_requires_matching_passwords() {
    let admin = ApiClient::admin().await;

    let resp = admin
        .post(
            "/api/users/",
            &json!({
                "email": unique_email("mismatch"),
                "full_name": "Mismatch",
                "password": "first-password",
                "password2": "second-password",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_duplicate_email_conflicts() {
    let admin = ApiClient::admin().await;
    let email = unique_email("dup");
    let body = json!({
        "email": email,
        "full_name": "Dup",
        "password": "dup-password",
        "password2": "dup-password",
    });

    admin.create("/api/users/", &body).await;
    let resp = admin.post("/api/users/", &body).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_change_password_revokes_tokens() {
    let admin = ApiClient::admin().await;
    let gerente = admin.new_gerente().await;
    let id = gerente.user["id"].as_i64().expect("user id");

    let resp = gerente
        .put(
            &format!("/api/users/{id}/change_password/"),
            &json!({
                "old_password": "gerente-pass-1",
                "password": "gerente-pass-2",
                "password2": "gerente-pass-2",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(
        gerente.get("/api/users/me/").await.status(),
        StatusCode::UNAUTHORIZED
    );
    let email = gerente.user["email"].as_str().expect("email");
    ApiClient::login(email, "gerente-pass-2").await;
}

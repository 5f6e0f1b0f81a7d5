//! Session login and the server-rendered pages.
//!
//! These tests require a running server and the bootstrap account; see
//! `api_auth.rs`.

use doacoes_integration_tests::{admin_credentials, base_url, client};
use reqwest::{Client, StatusCode, header::LOCATION};

async fn login(client: &Client) -> reqwest::Response {
    let (email, password) = admin_credentials();
    client
        .post(format!("{}/login", base_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("login request failed")
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_pages_redirect_anonymous_users() {
    let client = client();
    for path in ["/", "/dashboard", "/donors", "/items", "/donations/new"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(resp.headers()[LOCATION], "/login", "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_login_lands_on_users() {
    let client = client();
    let resp = login(&client).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/users");

    let resp = client
        .get(format!("{}/dashboard", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("donors"));

    // The session also authenticates the JSON API
    let resp = client
        .get(format!("{}/api/users/me/", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_bad_login_rerenders_form() {
    let resp = client()
        .post(format!("{}/login", base_url()))
        .form(&[("email", "admin@admin.com"), ("password", "nope-nope")])
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_invalid_donor_form_returns_400() {
    let client = client();
    login(&client).await;

    let resp = client
        .post(format!("{}/donors", base_url()))
        .form(&[("name", "Sem Contato")])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_logout_ends_session() {
    let client = client();
    login(&client).await;

    let resp = client
        .post(format!("{}/logout", base_url()))
        .send()
        .await
        .expect("logout failed");
    assert_eq!(resp.headers()[LOCATION], "/login");

    let resp = client
        .get(format!("{}/dashboard", base_url()))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

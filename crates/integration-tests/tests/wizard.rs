//! The donation wizard endpoint.
//!
//! These tests require a running server and the bootstrap account; see
//! `api_auth.rs`.

use doacoes_integration_tests::{ApiClient, error_fields, unique_email};
use reqwest::{StatusCode, multipart};
use serde_json::{Value, json};

async fn count(api: &ApiClient, path: &str) -> usize {
    let list: Vec<Value> = api.get(path).await.json().await.expect("Invalid JSON");
    list.len()
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_zero_amount_rejected_without_writes() {
    let api = ApiClient::admin().await;
    let donors_before = count(&api, "/api/doadores/").await;
    let donations_before = count(&api, "/api/doacoes/").await;

    let resp = api
        .post(
            "/api/wizard/doacoes/",
            &json!({
                "kind": "money",
                "donor_mode": "new",
                "donor_name": "Novo Doador",
                "donor_email": unique_email("wizard"),
                "amount": "0",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert!(error_fields(&body).contains(&"amount".to_string()));

    assert_eq!(count(&api, "/api/doadores/").await, donors_before);
    assert_eq!(count(&api, "/api/doacoes/").await, donations_before);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_existing_donor_and_new_recipient() {
    let api = ApiClient::admin().await;
    let donor = api
        .create(
            "/api/doadores/",
            &json!({ "name": "Doador Existente", "phone": "11 95555-0000" }),
        )
        .await;
    let recipients_before = count(&api, "/api/recebedores/").await;

    let resp = api
        .post(
            "/api/wizard/doacoes/",
            &json!({
                "kind": "money",
                "donor_mode": "existing",
                "donor_id": donor["id"],
                "recipient_mode": "new",
                "recipient_name": "Recebedor Novo",
                "recipient_phone": "11 94444-0000",
                "amount": "25,50",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Invalid JSON");

    assert_eq!(count(&api, "/api/recebedores/").await, recipients_before + 1);

    let donation: Value = api
        .get(&format!("/api/doacoes/{}/", created["id"]))
        .await
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(donation["donor"], donor["id"]);
    assert_eq!(donation["amount"], "25.50");
    assert!(donation["recipient"].is_number());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_item_with_recipient_is_not_available() {
    let api = ApiClient::admin().await;

    let form = multipart::Form::new()
        .text("kind", "item")
        .text("donor_mode", "new")
        .text("donor_name", "Doadora com Foto")
        .text("donor_email", unique_email("photo"))
        .text("recipient_mode", "new")
        .text("recipient_name", "Família Silva")
        .text("recipient_phone", "11 93333-0000")
        .text("item_name", "Geladeira")
        .text("item_category", "ED")
        .part(
            "item_photo",
            multipart::Part::bytes(b"GIF89a".to_vec())
                .file_name("geladeira.gif")
                .mime_str("image/gif")
                .expect("mime"),
        );

    let resp = api
        .client
        .post(format!("{}/api/wizard/doacoes/", api.base_url))
        .bearer_auth(&api.access)
        .multipart(form)
        .send()
        .await
        .expect("wizard request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Invalid JSON");

    let donation: Value = api
        .get(&format!("/api/doacoes/{}/", created["id"]))
        .await
        .json()
        .await
        .expect("Invalid JSON");
    let item: Value = api
        .get(&format!("/api/itens/{}/", donation["item"]))
        .await
        .json()
        .await
        .expect("Invalid JSON");

    assert_eq!(item["available"], false);
    assert_eq!(item["donor"], donation["donor"]);
    let photo = item["photo"].as_str().expect("photo stored");
    assert!(photo.starts_with("itens/"));

    let resp = api
        .client
        .get(format!("{}/media/{photo}", api.base_url))
        .send()
        .await
        .expect("media request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_missing_existing_donor_is_not_found() {
    let api = ApiClient::admin().await;

    let resp = api
        .post(
            "/api/wizard/doacoes/",
            &json!({
                "kind": "money",
                "donor_mode": "existing",
                "donor_id": 999_999_999,
                "amount": "10",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_missing_recipient_rolls_back_new_donor() {
    let api = ApiClient::admin().await;
    let donors_before = count(&api, "/api/doadores/").await;
    let donations_before = count(&api, "/api/doacoes/").await;

    let resp = api
        .post(
            "/api/wizard/doacoes/",
            &json!({
                "kind": "money",
                "donor_mode": "new",
                "donor_name": "Doador Sem Recebedor",
                "donor_email": unique_email("rollback"),
                "recipient_mode": "existing",
                "recipient_id": 999_999_999,
                "amount": "10",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The donor row inserted before the failed lookup must not survive
    assert_eq!(count(&api, "/api/doadores/").await, donors_before);
    assert_eq!(count(&api, "/api/doacoes/").await, donations_before);
}

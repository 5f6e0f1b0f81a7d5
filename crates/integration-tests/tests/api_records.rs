//! Donor, recipient, item and donation CRUD over the JSON API.
//!
//! These tests require a running server and the bootstrap account; see
//! `api_auth.rs`.

use doacoes_integration_tests::{ApiClient, error_fields, unique_email};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn donor(api: &ApiClient) -> Value {
    api.create(
        "/api/doadores/",
        &json!({ "name": "Doador de Teste", "email": unique_email("donor") }),
    )
    .await
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_contact_requires_email_or_phone() {
    let api = ApiClient::admin().await;

    let resp = api
        .post("/api/doadores/", &json!({ "name": "Sem Contato" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let recipient = api
        .create(
            "/api/recebedores/",
            &json!({ "name": "Abrigo", "phone": "11 3333-4444" }),
        )
        .await;
    assert!(recipient["email"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_donor_update_and_not_found() {
    let api = ApiClient::admin().await;
    let donor = donor(&api).await;
    let id = donor["id"].as_i64().expect("id");

    let resp = api
        .put(
            &format!("/api/doadores/{id}/"),
            &json!({ "name": "Nome Novo", "phone": "11 90000-0000" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(updated["name"], "Nome Novo");

    assert_eq!(
        api.get("/api/doadores/999999999/").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_donation_is_item_xor_amount() {
    let api = ApiClient::admin().await;
    let donor = donor(&api).await;
    let item = api
        .create(
            "/api/itens/",
            &json!({ "name": "Cadeira", "category": "MO", "donor": donor["id"] }),
        )
        .await;

    let resp = api
        .post(
            "/api/doacoes/",
            &json!({ "donor": donor["id"], "item": item["id"], "amount": "10.00" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = api
        .post("/api/doacoes/", &json!({ "donor": donor["id"] }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = api
        .post(
            "/api/doacoes/",
            &json!({ "donor": donor["id"], "amount": "-5" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert!(error_fields(&body).contains(&"amount".to_string()));

    let money = api
        .create(
            "/api/doacoes/",
            &json!({ "donor": donor["id"], "amount": "150.00" }),
        )
        .await;
    assert_eq!(money["amount"], "150.00");
    assert!(money["item"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_deleting_donor_cascades_donations_but_keeps_items() {
    let api = ApiClient::admin().await;
    let donor = donor(&api).await;
    let donor_id = donor["id"].as_i64().expect("id");

    let item = api
        .create(
            "/api/itens/",
            &json!({ "name": "Mesa", "category": "MO", "donor": donor_id }),
        )
        .await;
    let item_id = item["id"].as_i64().expect("id");
    let donation = api
        .create(
            "/api/doacoes/",
            &json!({ "donor": donor_id, "item": item_id }),
        )
        .await;
    let donation_id = donation["id"].as_i64().expect("id");

    assert_eq!(
        api.delete(&format!("/api/doadores/{donor_id}/")).await.status(),
        StatusCode::NO_CONTENT
    );

    assert_eq!(
        api.get(&format!("/api/doacoes/{donation_id}/")).await.status(),
        StatusCode::NOT_FOUND
    );
    let item: Value = api
        .get(&format!("/api/itens/{item_id}/"))
        .await
        .json()
        .await
        .expect("Invalid JSON");
    assert!(item["donor"].is_null());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_donation_list_filters_by_donor() {
    let api = ApiClient::admin().await;
    let first = donor(&api).await;
    let second = donor(&api).await;

    api.create(
        "/api/doacoes/",
        &json!({ "donor": first["id"], "amount": "5" }),
    )
    .await;
    api.create(
        "/api/doacoes/",
        &json!({ "donor": second["id"], "amount": "7" }),
    )
    .await;

    let list: Vec<Value> = api
        .get(&format!("/api/doacoes/?donor={}", first["id"]))
        .await
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["donor"], first["id"]);
}

mod common;

use std::time::Duration;

use common::harness::{TestServerConfig, spawn_embed_server};
use common::http_client::{TestClient, TestClientError};
use duet::gateway::RequestLimits;
use serde_json::json;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

async fn ready_client() -> (common::harness::TestServer, TestClient) {
    let server = spawn_embed_server(TestServerConfig::default()).await.unwrap();
    let client = TestClient::new(server.url());
    client.wait_until_ready(READY_TIMEOUT).await.unwrap();
    (server, client)
}

fn l2(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[tokio::test]
async fn test_embed_end_to_end() {
    let (_server, client) = ready_client().await;

    let response = client
        .embed(json!({
            "instruction": "Represent the Science title: ",
            "texts": ["3D ActionSLAM: wearable person tracking", "Quantum error correction"],
            "normalize": true,
            "batch_size": 1
        }))
        .await
        .unwrap();

    assert_eq!(response.embeddings.len(), 2);
    let dim = response.embeddings[0].len();
    assert!(dim > 0);
    for vector in &response.embeddings {
        assert_eq!(vector.len(), dim);
        assert!((l2(vector) - 1.0).abs() < 1e-4);
    }
}

#[tokio::test]
async fn test_embed_defaults_apply() {
    let (_server, client) = ready_client().await;

    let implicit = client.embed(json!({"texts": ["hello"]})).await.unwrap();
    let explicit = client
        .embed(json!({
            "instruction": "Represent the document for retrieval: ",
            "texts": ["hello"],
            "normalize": true,
            "batch_size": 32
        }))
        .await
        .unwrap();

    assert_eq!(implicit.embeddings, explicit.embeddings);
}

#[tokio::test]
async fn test_embed_is_deterministic_across_requests() {
    let (_server, client) = ready_client().await;
    let body = json!({"texts": ["same text", "another"]});

    let first = client.embed(body.clone()).await.unwrap();
    let second = client.embed(body).await.unwrap();

    assert_eq!(first.embeddings, second.embeddings);
}

#[tokio::test]
async fn test_embed_ignores_unknown_fields() {
    let (_server, client) = ready_client().await;

    let response = client
        .embed(json!({"texts": ["x"], "model": "ignored", "extra": {"a": 1}}))
        .await
        .unwrap();
    assert_eq!(response.embeddings.len(), 1);
}

#[tokio::test]
async fn test_embed_allows_empty_string_items() {
    let (_server, client) = ready_client().await;

    let response = client.embed(json!({"texts": ["", "x"]})).await.unwrap();
    assert_eq!(response.embeddings.len(), 2);
}

#[tokio::test]
async fn test_embed_client_errors() {
    let (_server, client) = ready_client().await;

    for body in [
        json!({"texts": []}),
        json!({}),
        json!({"texts": ["a"], "batch_size": 0}),
    ] {
        let resp = client.post("/embed", &body).await.unwrap();
        assert_eq!(resp.status, 400, "body: {}", body);
        assert_eq!(resp.duet_status, "invalid_request");
        assert_eq!(resp.body["code"], 400);
    }
}

#[tokio::test]
async fn test_embed_max_inputs_enforced() {
    let limits = RequestLimits {
        default_batch_size: 4,
        max_batch_size: 8,
        max_inputs: 5,
    };
    let server = spawn_embed_server(TestServerConfig::default().with_limits(limits))
        .await
        .unwrap();
    let client = TestClient::new(server.url());
    client.wait_until_ready(READY_TIMEOUT).await.unwrap();

    let ok = client
        .embed(json!({"texts": ["1", "2", "3", "4", "5"], "batch_size": 100}))
        .await
        .unwrap();
    assert_eq!(ok.embeddings.len(), 5);

    let err = client
        .embed(json!({"texts": ["1", "2", "3", "4", "5", "6"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, TestClientError::BadRequest(_)));
}

#[tokio::test]
async fn test_embed_unavailable_while_loading() {
    let server = spawn_embed_server(
        TestServerConfig::default().with_load_delay(Duration::from_millis(300)),
    )
    .await
    .unwrap();
    let client = TestClient::new(server.url());

    let resp = client.post("/embed", &json!({"texts": ["a"]})).await.unwrap();
    assert_eq!(resp.status, 503);
    assert_eq!(resp.duet_status, "not_ready");

    client.wait_until_ready(READY_TIMEOUT).await.unwrap();
    let response = client.embed(json!({"texts": ["a"]})).await.unwrap();
    assert_eq!(response.embeddings.len(), 1);
}

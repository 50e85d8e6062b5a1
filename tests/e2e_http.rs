//! HTTP API tests. Requests go straight into the router with `oneshot`, no
//! socket involved.

#![cfg(feature = "http")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use asv_graph::http::router;
use asv_graph::storage::MemoryBackend;
use asv_graph::{Engine, MemoryTaxonomy, Sample, TaxonomyRecord};

fn app() -> axum::Router {
    let store = MemoryBackend::from_samples([
        Sample::new("A")
            .with_location(37.0, 127.0)
            .with_features(["x1", "x2", "x3"])
            .with_biome("tundra")
            .with_env_feature("soil"),
        Sample::new("B")
            .with_location(37.05, 127.0)
            .with_features(["x2", "x3", "x4"])
            .with_biome("tundra")
            .with_env_feature("water"),
        Sample::new("C")
            .with_location(38.0, 127.0)
            .with_features(["x5"])
            .with_biome("desert"),
    ]);
    let taxonomy = MemoryTaxonomy::from_records([
        TaxonomyRecord::new("x2").with_rank("domain", "Bacteria").with_rank("genus", "Bacillus"),
    ]);
    router(Arc::new(Engine::with_store(store).with_taxonomy(taxonomy)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    read(app().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

// ============================================================================
// 1. Graph and drill-down
// ============================================================================

#[tokio::test]
async fn test_similarity_endpoint() {
    let (status, body) = get("/api/similarity?minCount=2&limitPairs=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["links"], json!([{ "source": "A", "target": "B", "value": 2 }]));
    assert_eq!(body["nodes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_similarity_biome_filter() {
    let (status, body) = get("/api/similarity?biome=desert").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "nodes": [], "links": [] }));
}

#[tokio::test]
async fn test_shared_asvs_endpoint() {
    let (status, body) = get("/api/shared-asvs?sampleId=A&neighbors=B,C").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "neighbor": "B", "sequences": ["x2", "x3"] },
            { "neighbor": "C", "sequences": [] },
        ])
    );
}

#[tokio::test]
async fn test_shared_asvs_errors() {
    let (status, body) = get("/api/shared-asvs?neighbors=B").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sampleId"));

    let (status, _) = get("/api/shared-asvs?sampleId=nobody&neighbors=A").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// 2. Proximity
// ============================================================================

#[tokio::test]
async fn test_nearby_endpoint() {
    let (status, body) = get("/api/nearby?lat=37.0&lng=127.0&radius=10").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[tokio::test]
async fn test_nearby_requires_coordinates() {
    let (status, body) = get("/api/nearby?lat=37.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_nearby_profile_endpoint() {
    let (status, body) = get("/api/nearby/profile?lat=37.0&lon=127.0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nearby_samples"], 2);
    let rows = body["profile"]["rows"].as_array().unwrap();
    assert_eq!(rows[0]["feature"], "x2");
    assert_eq!(rows[0]["total"], 2);
    assert_eq!(rows[0]["breakdown"], json!({ "soil": 1, "water": 1 }));
    assert_eq!(body["taxonomy"]["x2"]["genus"], "Bacillus");
    assert!(body["taxonomy"]["x1"].is_null());
}

// ============================================================================
// 3. Listings and taxonomy
// ============================================================================

#[tokio::test]
async fn test_samples_and_categories() {
    let (status, body) = get("/api/samples?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["desert", "tundra"]));

    let (status, body) = get("/api/categories?field=env_feature").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["soil", "water"]));

    let (status, _) = get("/api/categories?field=colour").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_asv_profile_endpoint() {
    let (status, body) = post("/api/asv-profile", json!({ "asvSeqs": ["x2", "x9"] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["x2"]["domain"], "Bacteria");
    assert!(body["x9"].is_null());
}

#[tokio::test]
async fn test_taxonomy_endpoint() {
    let (status, body) = get("/api/taxonomy?asvSeq=x2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genus"], "Bacillus");

    let (status, body) = get("/api/taxonomy?query=bacill").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = get("/api/taxonomy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

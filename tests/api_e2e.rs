use actix_web::{web, App, HttpServer};
use kvsearch::{seed, Document, HashingEmbedder, SearchService};
use reqwest::Client;
use serde_json::{json, Value};
use std::net::TcpListener;
use tokio::time::{sleep, Duration};

/// Find a free port by binding to port 0
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start a server over `documents` and return its base URL and handle
async fn start_server(documents: Vec<Document>) -> (String, actix_web::dev::ServerHandle) {
    let port = free_port();
    let service = SearchService::new(Box::new(HashingEmbedder::new(384)));
    service.load_documents(documents).unwrap();
    let service = web::Data::new(service);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(kvsearch::server::config)
    })
    .bind(format!("127.0.0.1:{}", port))
    .unwrap()
    .run();
    let handle = server.handle();
    tokio::spawn(server);
    sleep(Duration::from_millis(200)).await;

    (format!("http://127.0.0.1:{}", port), handle)
}

fn scenario_documents() -> Vec<Document> {
    vec![
        Document::new(1, "The Honda Civic is a compact car."),
        Document::new(2, "California is a US state."),
        Document::new(3, "California has many cities."),
    ]
}

async fn query(client: &Client, base: &str, text: &str, top_k: usize) -> Vec<Value> {
    let resp = client
        .get(format!("{}/query", base))
        .query(&[("text", text.to_string()), ("top_k", top_k.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body.as_array().unwrap().clone()
}

#[actix_web::test]
async fn test_root() {
    let (base, handle) = start_server(Vec::new()).await;

    let resp = Client::new().get(format!("{}/", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_ingest() {
    let (base, handle) = start_server(seed::builtin_documents()).await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/ingest", base))
        .json(&json!({"id": 8, "text": "Python is a popular programming language."}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Document 8 added");
    assert_eq!(body["slot"], 7);

    // Count grew by one and the document is searchable right away
    let stats: Value = client.get(format!("{}/stats", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(stats["documents"], 8);
    assert_eq!(stats["dimension"], 384);

    let results = query(&client, &base, "Python is a popular programming language.", 1).await;
    assert_eq!(results[0]["id"], 8);
    assert!((results[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-6);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_ingest_string_id() {
    let (base, handle) = start_server(Vec::new()).await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/ingest", base))
        .json(&json!({"id": "doc-a", "text": "hello world"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let results = query(&client, &base, "hello", 1).await;
    assert_eq!(results[0]["id"], "doc-a");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_ingest_malformed_body() {
    let (base, handle) = start_server(Vec::new()).await;

    let resp = Client::new()
        .post(format!("{}/ingest", base))
        .json(&json!({"text": "no id"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_basic() {
    let (base, handle) = start_server(seed::builtin_documents()).await;
    let client = Client::new();

    let results = query(&client, &base, "What is Civic?", 2).await;
    assert!(!results.is_empty());
    assert!(results.iter().any(|r| r["text"].as_str().unwrap().contains("Civic")));

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_multiple_results() {
    let (base, handle) = start_server(scenario_documents()).await;
    let client = Client::new();

    let results = query(&client, &base, "California", 3).await;
    assert_eq!(results.len(), 3);

    // Both California documents outrank the car
    let ids: Vec<i64> = results.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert!(ids[..2].contains(&2));
    assert!(ids[..2].contains(&3));
    assert_eq!(ids[2], 1);

    let scores: Vec<f64> = results.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    // Only id, text and score are exposed
    let keys: Vec<&String> = results[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_top_k_exceeds_count() {
    let docs = vec![
        Document::new(1, "The Honda Civic is a compact car."),
        Document::new(2, "California is a US state."),
    ];
    let (base, handle) = start_server(docs).await;

    let results = query(&Client::new(), &base, "car", 5).await;
    assert_eq!(results.len(), 2);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_default_top_k() {
    let (base, handle) = start_server(scenario_documents()).await;

    let resp = Client::new()
        .get(format!("{}/query?text=California", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_empty_index() {
    let (base, handle) = start_server(Vec::new()).await;

    let results = query(&Client::new(), &base, "anything", 3).await;
    assert!(results.is_empty());

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_invalid_params() {
    let (base, handle) = start_server(scenario_documents()).await;
    let client = Client::new();

    // top_k = 0 is rejected by the index
    let resp = client
        .get(format!("{}/query?text=California&top_k=0", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("top_k"));

    // Missing text and negative top_k never reach the handler
    let resp = client.get(format!("{}/query", base)).send().await.unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/query?text=California&top_k=-1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_duplicate_id_keeps_both_slots() {
    let (base, handle) = start_server(Vec::new()).await;
    let client = Client::new();

    for text in ["apples and oranges", "rockets and satellites"] {
        let resp = client
            .post(format!("{}/ingest", base))
            .json(&json!({"id": 1, "text": text}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // The older slot still reports its own text
    let results = query(&client, &base, "apples oranges", 2).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], 1);
    assert_eq!(results[0]["text"], "apples and oranges");
    assert_eq!(results[1]["id"], 1);
    assert_eq!(results[1]["text"], "rockets and satellites");

    handle.stop(true).await;
}

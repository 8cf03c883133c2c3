//! End-to-end HTTP tests: the four services wired together on ephemeral
//! ports, with a deterministic embedding backend and a mocked generation
//! backend.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use httpmock::prelude::*;
use tokio::net::TcpListener;
use url::Url;

use ragline::chunker::Chunker;
use ragline::clients::{HttpEmbeddingClient, HttpVectorIndexClient, OllamaGenerator};
use ragline::config::RetryPolicy;
use ragline::documents::SqliteDocumentStore;
use ragline::embeddings::HashEmbedder;
use ragline::extract::ExtractorRegistry;
use ragline::ingest::IngestionPipeline;
use ragline::query::QueryPipeline;
use ragline::server;
use ragline::server::embedding::EmbeddingState;
use ragline::types::Document;
use ragline::vector_store::SqliteVectorStore;

async fn spawn(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

struct Stack {
    ingestion_url: Url,
    query_url: Url,
    vectordb_url: Url,
    ollama: MockServer,
}

/// Brings up vectordb, embedding, ingestion, and query services, the last
/// generation hop answered by an httpmock Ollama stand-in.
async fn spawn_stack() -> Stack {
    let vector_store = Arc::new(SqliteVectorStore::open_in_memory().await.unwrap());
    let vectordb_url = spawn(server::vectordb::router(vector_store)).await;

    let embedding_state = Arc::new(EmbeddingState {
        backend: Arc::new(HashEmbedder::default()),
        index: Arc::new(HttpVectorIndexClient::new(vectordb_url.clone()).unwrap()),
    });
    let embedding_url = spawn(server::embedding::router(embedding_state)).await;

    let documents = SqliteDocumentStore::open_in_memory().await.unwrap();
    let ingestion = IngestionPipeline::new(
        documents,
        ExtractorRegistry::with_defaults(),
        Chunker::new(500, 50).unwrap(),
        Arc::new(HttpEmbeddingClient::new(embedding_url.clone()).unwrap()),
        Arc::new(HttpVectorIndexClient::new(vectordb_url.clone()).unwrap()),
        RetryPolicy {
            max_attempts: 5,
            delay: Duration::ZERO,
        },
    );
    let ingestion_url = spawn(server::ingestion::router(Arc::new(ingestion))).await;

    let ollama = MockServer::start_async().await;
    let query = QueryPipeline::new(
        Arc::new(HttpEmbeddingClient::new(embedding_url).unwrap()),
        Arc::new(HttpVectorIndexClient::new(vectordb_url.clone()).unwrap()),
        Arc::new(
            OllamaGenerator::new(&Url::parse(&ollama.base_url()).unwrap(), "llama3").unwrap(),
        ),
    );
    let query_url = spawn(server::query::router(Arc::new(query))).await;

    Stack {
        ingestion_url,
        query_url,
        vectordb_url,
        ollama,
    }
}

async fn upload(client: &reqwest::Client, base: &Url, name: &str, body: &str) -> reqwest::Response {
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(body.as_bytes().to_vec()).file_name(name.to_string()),
    );
    client
        .post(base.join("upload").unwrap())
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn document_lifecycle_round_trip() {
    let stack = spawn_stack().await;
    let client = reqwest::Client::new();

    let generate = stack
        .ollama
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({"response": "The pipeline stores chunks."}));
        })
        .await;

    // Upload a document.
    let response = upload(
        &client,
        &stack.ingestion_url,
        "pipeline.txt",
        "The pipeline stores chunks in a vector index.\n\nQuestions are answered from them.",
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let doc_id = body["doc_id"].as_i64().unwrap();
    assert!(body["chunks"].as_u64().unwrap() >= 1);

    // The record is listed as completed.
    let docs: Vec<Document> = client
        .get(stack.ingestion_url.join("documents").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, doc_id);
    assert_eq!(docs[0].status.as_str(), "completed");

    // Query comes back grounded, with the uploaded document attributed.
    let answer: serde_json::Value = client
        .post(stack.query_url.join("query").unwrap())
        .json(&serde_json::json!({"question": "what does the pipeline do?", "top_k": 3}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["answer"], "The pipeline stores chunks.");
    let sources = answer["sources"].as_array().unwrap();
    assert!(!sources.is_empty());
    assert!(sources.iter().all(|s| s["doc_id"].as_i64() == Some(doc_id)));
    generate.assert_async().await;

    // Delete cascades into the vector store.
    let deleted = client
        .delete(
            stack
                .ingestion_url
                .join(&format!("documents/{doc_id}"))
                .unwrap(),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let docs: Vec<Document> = client
        .get(stack.ingestion_url.join("documents").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(docs.is_empty());

    let hits: Vec<serde_json::Value> = client
        .post(stack.vectordb_url.join("search").unwrap())
        .json(&serde_json::json!({"embedding": vec![0.5f32; 32], "top_k": 5}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(hits.is_empty(), "vectors should be gone after delete");
}

#[tokio::test]
async fn unsupported_upload_is_a_client_error_with_a_failed_record() {
    let stack = spawn_stack().await;
    let client = reqwest::Client::new();

    let response = upload(&client, &stack.ingestion_url, "deck.pptx", "binary-ish").await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["detail"].as_str().unwrap().contains("unsupported"),
        "got {body}"
    );

    let docs: Vec<Document> = client
        .get(stack.ingestion_url.join("documents").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].status.as_str(), "failed");
}

#[tokio::test]
async fn query_with_empty_index_skips_generation() {
    let stack = spawn_stack().await;
    let client = reqwest::Client::new();

    let generate = stack
        .ollama
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(serde_json::json!({"response": "unused"}));
        })
        .await;

    let answer: serde_json::Value = client
        .post(stack.query_url.join("query").unwrap())
        .json(&serde_json::json!({"question": "anything?", "top_k": 5}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(answer["answer"], "No relevant context found.");
    assert_eq!(generate.hits_async().await, 0);
}

#[tokio::test]
async fn delete_still_succeeds_when_the_vector_service_is_down() {
    // Ingestion pointed at a vectordb that is not listening.
    let documents = SqliteDocumentStore::open_in_memory().await.unwrap();
    let dead_index = HttpVectorIndexClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
    let embedding_state = Arc::new(EmbeddingState {
        backend: Arc::new(HashEmbedder::default()),
        index: Arc::new(dead_index.clone()),
    });
    let embedding_url = spawn(server::embedding::router(embedding_state)).await;

    let ingestion = IngestionPipeline::new(
        documents,
        ExtractorRegistry::with_defaults(),
        Chunker::new(500, 50).unwrap(),
        Arc::new(HttpEmbeddingClient::new(embedding_url).unwrap()),
        Arc::new(dead_index),
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        },
    );
    let ingestion_url = spawn(server::ingestion::router(Arc::new(ingestion))).await;
    let client = reqwest::Client::new();

    // The upload fails (store pipeline cannot reach vector storage) and
    // leaves a failed record.
    let response = upload(&client, &ingestion_url, "doomed.txt", "some text to chunk").await;
    assert_eq!(response.status(), 500);

    let docs: Vec<Document> = client
        .get(ingestion_url.join("documents").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    let doc_id = docs[0].id;
    assert_eq!(docs[0].status.as_str(), "failed");

    // Deleting it succeeds even though the cascade delete cannot land.
    let deleted = client
        .delete(ingestion_url.join(&format!("documents/{doc_id}")).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let docs: Vec<Document> = client
        .get(ingestion_url.join("documents").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(docs.is_empty());
}

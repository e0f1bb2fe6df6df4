#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: OLLAMA_INTEGRATION=1 cargo test --test integration_ollama

use docs_answer::config::OllamaConfig;
use docs_answer::embeddings::{Embedder, OllamaClient};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

const TEST_MODEL: &str = "nomic-embed-text:latest";
const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

fn enabled() -> bool {
    let enabled = env::var("OLLAMA_INTEGRATION").is_ok_and(|v| !v.is_empty() && v != "0");
    if !enabled {
        println!("Skipping: set OLLAMA_INTEGRATION=1 to run against a local Ollama");
    }
    enabled
}

fn create_integration_test_client() -> OllamaClient {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string());

    let config = OllamaConfig {
        host,
        port,
        model,
        batch_size: 5,
        ..OllamaConfig::default()
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[test]
fn real_ollama_health_check() {
    if !enabled() {
        return;
    }
    init_test_tracing();

    let client = create_integration_test_client();

    info!("Testing health check against real Ollama instance");
    let result = client.health_check();

    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
fn real_ollama_list_models() {
    if !enabled() {
        return;
    }
    init_test_tracing();

    let client = create_integration_test_client();
    let models = client.list_models().expect("Model listing should succeed");

    assert!(
        !models.is_empty(),
        "Should have at least one model available"
    );
    for model in &models {
        debug!("Available model: {} (size: {:?})", model.name, model.size);
    }
}

#[tokio::test]
async fn real_ollama_embeddings_are_consistent() {
    if !enabled() {
        return;
    }
    init_test_tracing();

    let client = create_integration_test_client();

    let texts = vec![
        "Restart the router to fix the wifi connection.".to_string(),
        "Power-cycle the wireless router when the network drops.".to_string(),
        "The annual report covers revenue growth in Europe.".to_string(),
    ];
    let batch = client.embed_many(&texts).await.expect("batch embedding");
    let single = client.embed(&texts[0]).await.expect("single embedding");

    assert_eq!(batch.len(), texts.len());
    assert!(batch.iter().all(|v| v.len() == single.len()));
    info!("Embedding dimension: {}", single.len());

    let related = cosine_similarity(&batch[0], &batch[1]);
    let unrelated = cosine_similarity(&batch[0], &batch[2]);
    debug!("related {related:.3}, unrelated {unrelated:.3}");
    assert!(related > unrelated);
    assert!(cosine_similarity(&batch[0], &single) > 0.99);
}

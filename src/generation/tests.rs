use super::extract::extract_text;
use super::*;
use crate::config::GenerationConfig;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_url(server: &MockServer) -> url::Url {
    url::Url::parse(&server.uri()).expect("mock server uri")
}

#[test]
fn extracts_ollama_generate_shape() {
    let value = json!({"model": "m", "response": "Paris.", "done": true});
    assert_eq!(extract_text(&value).expect("text"), "Paris.");
}

#[test]
fn extracts_ollama_chat_shape() {
    let value = json!({"message": {"role": "assistant", "content": "Hello!"}});
    assert_eq!(extract_text(&value).expect("text"), "Hello!");
}

#[test]
fn extracts_gemini_shape_joining_parts() {
    let value = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}
        }]
    });
    assert_eq!(extract_text(&value).expect("text"), "Hello, world");
}

#[test]
fn extracts_answer_field_including_nested() {
    assert_eq!(
        extract_text(&json!({"answer": "flat"})).expect("text"),
        "flat"
    );
    assert_eq!(
        extract_text(&json!({"answer": {"answer": "nested"}})).expect("text"),
        "nested"
    );
}

#[test]
fn extracts_bare_string() {
    assert_eq!(extract_text(&json!("just text")).expect("text"), "just text");
}

#[test]
fn earlier_shapes_take_precedence() {
    let value = json!({"response": "from ollama", "answer": "from answer"});
    assert_eq!(extract_text(&value).expect("text"), "from ollama");
}

#[test]
fn unknown_shapes_are_errors() {
    assert!(extract_text(&json!({"candidates": []})).is_err());
    assert!(extract_text(&json!({"answer": 42})).is_err());
    assert!(extract_text(&json!(null)).is_err());
}

#[tokio::test]
async fn ollama_generator_posts_non_streaming_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(
            json!({"model": "llama", "prompt": "Say hi", "stream": false}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OllamaGenerator::new(
        server_url(&server),
        "llama".to_string(),
        Duration::from_secs(5),
    );

    assert_eq!(generator.generate("Say hi").await.expect("answer"), "hi");
}

#[tokio::test]
async fn non_success_status_carries_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let generator = OllamaGenerator::new(
        server_url(&server),
        "llama".to_string(),
        Duration::from_secs(5),
    );
    let err = generator.generate("q").await.expect_err("429 fails");

    assert_eq!(err.message(), "HTTP 429: rate limited");
}

#[tokio::test]
async fn ollama_error_payload_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "model not loaded"})),
        )
        .mount(&server)
        .await;

    let generator = OllamaGenerator::new(
        server_url(&server),
        "llama".to_string(),
        Duration::from_secs(5),
    );
    let err = generator.generate("q").await.expect_err("error payload");

    assert!(err.message().contains("model not loaded"));
}

#[tokio::test]
async fn gemini_generator_sends_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "secret"))
        .and(body_partial_json(
            json!({"contents": [{"parts": [{"text": "Why?"}]}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Because."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = GeminiGenerator::new(
        server_url(&server),
        "gemini-2.5-flash".to_string(),
        "secret".to_string(),
        Duration::from_secs(5),
    );

    assert_eq!(generator.generate("Why?").await.expect("answer"), "Because.");
    assert!(!format!("{generator:?}").contains("secret"));
}

#[test]
fn gemini_endpoint_keeps_base_path_prefix() {
    for base in [
        "https://proxy.example.com/gemini",
        "https://proxy.example.com/gemini/",
    ] {
        let generator = GeminiGenerator::new(
            url::Url::parse(base).expect("base url"),
            "gemini-2.5-flash".to_string(),
            "secret".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(
            generator.endpoint().expect("endpoint").as_str(),
            "https://proxy.example.com/gemini/v1beta/models/gemini-2.5-flash:generateContent",
            "{base}"
        );
    }
}

#[tokio::test]
async fn gemini_generator_behind_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/proxy/gemini/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Proxied."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server_url(&server).join("proxy/gemini").expect("prefixed url");
    let generator = GeminiGenerator::new(
        base,
        "gemini-2.5-flash".to_string(),
        "secret".to_string(),
        Duration::from_secs(5),
    );

    assert_eq!(generator.generate("q").await.expect("answer"), "Proxied.");
}

#[tokio::test]
async fn gemini_quota_error_mentions_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded"}
        })))
        .mount(&server)
        .await;

    let generator = GeminiGenerator::new(
        server_url(&server),
        "gemini-2.5-flash".to_string(),
        "secret".to_string(),
        Duration::from_secs(5),
    );
    let err = generator.generate("q").await.expect_err("quota");

    assert!(err.message().starts_with("HTTP 429:"));
    assert!(err.message().contains("Quota exceeded"));
}

#[test]
fn from_config_picks_ollama_by_default() {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let generator = from_config(&config).expect("ollama generator");
    assert_eq!(generator.name(), "ollama");
}

#[test]
fn from_config_gemini_requires_key() {
    let config = Config {
        generation: GenerationConfig {
            provider: GenerationProvider::Gemini,
            api_key_env: "DOCS_ANSWER_UNSET_TEST_KEY".to_string(),
            ..GenerationConfig::default()
        },
        ..Config::default()
    };

    assert!(from_config(&config).is_err());
}

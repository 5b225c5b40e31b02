//! Tests for Ollama backend construction and tuning.

use haka_ollama::{DEFAULT_MODEL, DEFAULT_PORT, LocalTuning, Ollama};
use llm::{Client, LLM};

#[test]
fn plain_host_gets_http_scheme() {
    let backend = Ollama::new(Client::new(), "127.0.0.1", DEFAULT_PORT, DEFAULT_MODEL);
    assert_eq!(backend.chat_endpoint(), "http://127.0.0.1:11434/api/chat");
    assert_eq!(backend.name(), "ollama");
    assert_eq!(backend.model(), "llama3.1");
}

#[test]
fn host_with_scheme_is_kept() {
    let backend = Ollama::new(Client::new(), "https://gpu-box/", 8080, "qwen2");
    assert_eq!(backend.chat_endpoint(), "https://gpu-box:8080/api/chat");
}

#[test]
fn default_tuning_matches_local_settings() {
    let tuning = LocalTuning::default();
    assert_eq!(tuning.temperature, 0.7);
    assert_eq!(tuning.num_predict, 5000);
    assert_eq!(tuning.num_ctx, 2048);
    assert_eq!(tuning.num_batch, 512);
    assert_eq!(tuning.num_thread, 4);
    assert_eq!(tuning.top_k, 40);
    assert_eq!(tuning.repeat_last_n, 64);
    assert_eq!(tuning.stop, vec!["\n\n", "Human:", "User:"]);
}

#[test]
fn partial_tuning_fills_defaults() {
    let tuning: LocalTuning = serde_json::from_str(r#"{"num_ctx": 8192}"#).unwrap();
    assert_eq!(tuning.num_ctx, 8192);
    assert_eq!(tuning.num_predict, 5000);

    let backend = Ollama::new(Client::new(), "localhost", DEFAULT_PORT, DEFAULT_MODEL)
        .with_tuning(tuning.clone());
    assert_eq!(backend.tuning(), &tuning);
}

#[tokio::test]
async fn ping_unreachable_server_fails() {
    let backend = Ollama::new(Client::new(), "127.0.0.1", 9, DEFAULT_MODEL);
    assert!(backend.ping().await.is_err());
}

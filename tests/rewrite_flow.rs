//! End-to-end transaction tests against a mock chat-completions server.

use nb_rationale::config::GenConfig;
use nb_rationale::engine::RewriteEngine;
use nb_rationale::errors::GenerationError;
use nb_rationale::llm::LlmClient;
use nb_rationale::notebook::{CellKind, Notebook};
use nb_rationale::report::{FailReason, Outcome, SkipReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn flight_notebook() -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "cells": [
            {
                "cell_type": "markdown",
                "metadata": {},
                "source": ["**[user]**\n\nbook a flight"]
            },
            {
                "cell_type": "markdown",
                "metadata": {},
                "source": ["**[tool_call]**\n\n```json\n{\"tool_name\": \"search_flights\", \"arguments\": {\"from\": \"SFO\", \"to\": \"JFK\"}}\n```"]
            },
            {
                "cell_type": "markdown",
                "metadata": {},
                "source": ["**[tool_output]**\n\n[{\"flight\": \"UA123\"}]"]
            },
            {
                "cell_type": "markdown",
                "metadata": {},
                "source": ["**[assistant]**\n\nold text"]
            }
        ],
        "metadata": {"language_info": {"name": "python"}},
        "nbformat": 4,
        "nbformat_minor": 4
    }))
    .unwrap()
}

fn instruction_only_notebook() -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["**[user]**\n\nx"]},
            {"cell_type": "markdown", "metadata": {}, "source": ["**[assistant]**\n\ny"]}
        ]
    }))
    .unwrap()
}

fn engine_for(server_uri: &str, dry_run: bool) -> RewriteEngine {
    let config = GenConfig {
        base_url: server_uri.to_string(),
        api_key: Some("sk-test".to_string()),
        ..GenConfig::default()
    };
    let truncate_at = config.truncate_at;
    RewriteEngine::new(LlmClient::new(config).unwrap(), truncate_at, dry_run)
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn successful_transaction_rewrites_only_the_reasoning_cell() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(
            "I need to find flights from SFO to JFK, so I will call search_flights first.",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();
    let before = Notebook::parse(&flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(outcome, Outcome::Saved), "got {outcome:?}");

    let after = Notebook::load(&file).unwrap();
    for i in 0..3 {
        assert_eq!(before.cells[i], after.cells[i]);
    }
    assert_eq!(after.cells[3].kind, CellKind::Reasoning);
    let new_text = after.cells[3].body();
    assert!(!new_text.is_empty());
    assert_ne!(new_text, "old text");
    assert!(new_text.contains("search_flights"));
}

#[tokio::test]
async fn auth_failure_leaves_the_file_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(
        matches!(
            outcome,
            Outcome::Failed(FailReason::Generation(GenerationError::Auth))
        ),
        "got {outcome:?}"
    );
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

#[tokio::test]
async fn rate_limit_is_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Failed(FailReason::Generation(GenerationError::RateLimited))
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

#[tokio::test]
async fn empty_trace_is_skipped_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, instruction_only_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::EmptyTrace)
    ));
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        instruction_only_notebook()
    );
}

#[tokio::test]
async fn empty_completion_fails_and_preserves_the_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("   "))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Failed(FailReason::Generation(GenerationError::EmptyResponse))
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

#[tokio::test]
async fn malformed_service_response_fails_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Failed(FailReason::Generation(
            GenerationError::MalformedResponse(_)
        ))
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

#[tokio::test]
async fn malformed_notebook_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, "{\"cells\": 42}").unwrap();

    let outcome = engine_for(&server.uri(), false).process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Failed(FailReason::Document(_))
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "{\"cells\": 42}");
}

#[tokio::test]
async fn slow_service_times_out_and_preserves_the_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("too late").set_delay(std::time::Duration::from_secs(5)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let config = GenConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        timeout: std::time::Duration::from_millis(200),
        ..GenConfig::default()
    };
    let truncate_at = config.truncate_at;
    let engine = RewriteEngine::new(LlmClient::new(config).unwrap(), truncate_at, false);

    let outcome = engine.process(&file).await;
    assert!(matches!(
        outcome,
        Outcome::Failed(FailReason::Generation(GenerationError::Timeout))
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

#[tokio::test]
async fn dry_run_builds_the_prompt_but_never_calls_or_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("task.ipynb");
    std::fs::write(&file, flight_notebook()).unwrap();

    let outcome = engine_for(&server.uri(), true).process(&file).await;
    assert!(matches!(outcome, Outcome::Skipped(SkipReason::DryRun)));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), flight_notebook());
}

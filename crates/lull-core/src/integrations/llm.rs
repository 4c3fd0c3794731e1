//! LLM classifier: priority classification through an OpenAI-compatible
//! chat-completions endpoint.
//!
//! The model is asked for a single `label|confidence|reason` line, parsed
//! leniently: a missing confidence defaults to 0.5, a missing reason is
//! dropped, but an unrecognized label is a hard error so that the engine's
//! fallback fires instead of guessing.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::keyring_store;
use crate::classify::{Classification, Classifier};
use crate::context::ContextSnapshot;
use crate::error::ClassifyError;
use crate::message::{Message, MessagePriority};
use crate::storage::ClassifierConfig;

/// Environment variable checked before the keyring.
pub const API_KEY_ENV: &str = "LULL_API_KEY";
/// Keyring entry name for the classifier key.
const API_KEY_ENTRY: &str = "classifier_api_key";

const SYSTEM_PROMPT: &str = "You triage mobile notifications. Reply with a single line: \
    <label>|<confidence 0-1>|<short reason>. \
    The label is one of: urgent, important, normal, low.";

/// Classifier backed by a chat-completions endpoint.
pub struct LlmClassifier {
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
    http_client: Client,
}

impl LlmClassifier {
    /// Create a classifier from explicit parts.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        LlmClassifier {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
            http_client: Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a classifier from config, resolving the API key from the
    /// LULL_API_KEY environment variable or the OS keyring.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let api_key = resolve_api_key().ok_or(ClassifyError::MissingCredentials)?;
        Ok(
            LlmClassifier::new(&config.endpoint, &config.model, api_key)
                .with_timeout(Duration::from_secs(config.timeout_secs)),
        )
    }

    fn user_prompt(message: &Message, context: &ContextSnapshot) -> String {
        format!(
            "From: {}\nSource: {}\nBody: {}\nUser status: {} (focus mode {})",
            message.title,
            message.source.as_deref().unwrap_or("unknown"),
            message.body,
            context.work_status.name(),
            if context.is_focused { "on" } else { "off" },
        )
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        message: &Message,
        context: &ContextSnapshot,
    ) -> Result<Classification, ClassifyError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::user_prompt(message, context)},
            ],
            "temperature": 0.0,
        });

        let resp = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = resp.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClassifyError::Malformed("reply has no message content".to_string()))?;

        parse_reply(content)
    }
}

/// Parse a `label|confidence|reason` reply line.
fn parse_reply(reply: &str) -> Result<Classification, ClassifyError> {
    let mut parts = reply.trim().splitn(3, '|');
    let label = parts.next().unwrap_or("").trim();
    let priority = MessagePriority::from_label(label).ok_or_else(|| {
        ClassifyError::Malformed(format!("unrecognized priority label '{label}'"))
    })?;

    let confidence = parts
        .next()
        .and_then(|c| c.trim().parse::<f32>().ok())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.5);

    let mut classification = Classification::new(priority, confidence);
    if let Some(reason) = parts.next().map(str::trim).filter(|r| !r.is_empty()) {
        classification = classification.with_reasoning(reason);
    }
    Ok(classification)
}

/// Resolve the classifier API key: environment first, then keyring.
pub fn resolve_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            return Some(key);
        }
    }
    keyring_store::get(API_KEY_ENTRY).ok().flatten()
}

/// Store the classifier API key in the OS keyring.
pub fn store_api_key(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    keyring_store::set(API_KEY_ENTRY, key)
}

/// Remove the classifier API key from the OS keyring.
pub fn clear_api_key() -> Result<(), Box<dyn std::error::Error>> {
    keyring_store::delete(API_KEY_ENTRY)
}

/// Whether a key is stored in the OS keyring (the environment variable is
/// not consulted).
pub fn keyring_has_api_key() -> bool {
    matches!(keyring_store::get(API_KEY_ENTRY), Ok(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WorkStatus;

    fn make_message() -> Message {
        Message::new("Boss", "need those numbers before the 2pm call")
    }

    fn make_context() -> ContextSnapshot {
        ContextSnapshot::new(WorkStatus::Working, false)
    }

    fn chat_reply(content: &str) -> String {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn parse_full_reply() {
        let c = parse_reply("urgent|0.95|deadline is imminent").unwrap();
        assert_eq!(c.priority, MessagePriority::Urgent);
        assert!((c.confidence - 0.95).abs() < f32::EPSILON);
        assert_eq!(c.reasoning.as_deref(), Some("deadline is imminent"));
    }

    #[test]
    fn parse_label_only_reply() {
        let c = parse_reply("low").unwrap();
        assert_eq!(c.priority, MessagePriority::Low);
        assert!((c.confidence - 0.5).abs() < f32::EPSILON);
        assert!(c.reasoning.is_none());
    }

    #[test]
    fn parse_clamps_confidence() {
        let c = parse_reply("normal|7.5|very sure").unwrap();
        assert!((c.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_tolerates_whitespace_and_case() {
        let c = parse_reply("  Important | 0.8 | sender is the on-call rotation ").unwrap();
        assert_eq!(c.priority, MessagePriority::Important);
        assert_eq!(c.reasoning.as_deref(), Some("sender is the on-call rotation"));
    }

    #[test]
    fn parse_rejects_unknown_label() {
        let err = parse_reply("critical|0.9|sounds bad").unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn classify_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_reply("important|0.8|sender is a direct report"))
            .create_async()
            .await;

        let classifier = LlmClassifier::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model",
            "test-key",
        );
        let result = classifier
            .classify(&make_message(), &make_context())
            .await
            .unwrap();

        assert_eq!(result.priority, MessagePriority::Important);
        assert_eq!(result.reasoning.as_deref(), Some("sender is a direct report"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn classify_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let classifier = LlmClassifier::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model",
            "test-key",
        );
        let err = classifier
            .classify(&make_message(), &make_context())
            .await
            .unwrap_err();

        match err {
            ClassifyError::Api { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn classify_rejects_reply_without_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let classifier = LlmClassifier::new(
            format!("{}/v1/chat/completions", server.url()),
            "test-model",
            "test-key",
        );
        let err = classifier
            .classify(&make_message(), &make_context())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)));
    }
}

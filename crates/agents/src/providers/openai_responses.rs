//! OpenAI Responses API (`POST /responses`) with the hosted file-search and
//! web-search tools.

use std::time::Duration;

use {
    async_trait::async_trait,
    parley_common::{HistoryTurn, Role},
    parley_config::OpenAiConfig,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{debug, trace, warn},
};

use crate::{GenerationError, model::ReplyGenerator};

pub struct OpenAiResponsesGenerator {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    vector_store_id: Option<String>,
    max_num_results: u32,
    web_search: bool,
    client: reqwest::Client,
}

impl OpenAiResponsesGenerator {
    pub fn new(api_key: Secret<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            vector_store_id: None,
            max_num_results: 20,
            web_search: true,
            client: reqwest::Client::new(),
        }
    }

    /// Build from the `[openai]` config section. The API key and the vector
    /// store id are required.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(GenerationError::NotConfigured {
                setting: "openai.api_key",
            })?;
        let vector_store_id =
            config
                .vector_store_id
                .clone()
                .ok_or(GenerationError::NotConfigured {
                    setting: "openai.vector_store_id",
                })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self::new(api_key, config.model.clone(), config.base_url.clone())
            .with_client(client)
            .with_file_search(vector_store_id, config.max_num_results)
            .with_web_search(config.web_search))
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_file_search(mut self, vector_store_id: String, max_num_results: u32) -> Self {
        self.vector_store_id = Some(vector_store_id);
        self.max_num_results = max_num_results;
        self
    }

    #[must_use]
    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    fn tools(&self) -> Vec<Value> {
        let mut tools = Vec::new();
        if let Some(id) = &self.vector_store_id {
            tools.push(json!({
                "type": "file_search",
                "vector_store_ids": [id],
                "max_num_results": self.max_num_results,
            }));
        }
        if self.web_search {
            tools.push(json!({ "type": "web_search_preview" }));
        }
        tools
    }

    fn request_body(&self, history: &[HistoryTurn]) -> Value {
        let input: Vec<Value> = history
            .iter()
            .map(|turn| json!({ "role": api_role(turn.role), "content": turn.content }))
            .collect();

        let mut body = json!({
            "model": self.model,
            "input": input,
        });
        let tools = self.tools();
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

/// The Responses API knows no `incoming` role; receipt markers are replayed
/// as user turns.
fn api_role(role: Role) -> &'static str {
    match role {
        Role::User | Role::Incoming => "user",
        Role::Assistant => "assistant",
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl ResponsesReply {
    /// All `output_text` parts of all `message` items, concatenated in order.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| &item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiResponsesGenerator {
    fn name(&self) -> &str {
        "openai-responses"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn generate_reply(&self, history: &[HistoryTurn]) -> Result<String, GenerationError> {
        let body = self.request_body(history);

        debug!(
            model = %self.model,
            turns = history.len(),
            file_search = self.vector_store_id.is_some(),
            web_search = self.web_search,
            "openai responses request"
        );
        trace!(body = %body, "openai request body");

        let http_resp = self
            .client
            .post(format!("{}/responses", self.base_url.trim_end_matches('/')))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, body = %body_text, "openai API error");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let raw = http_resp.text().await?;
        trace!(response = %raw, "openai raw response");
        let reply: ResponsesReply = serde_json::from_str(&raw)?;

        if let Some(usage) = &reply.usage {
            debug!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "openai responses usage"
            );
        }

        let text = reply.output_text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyOutput);
        }
        Ok(text)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn generator(base_url: &str) -> OpenAiResponsesGenerator {
        OpenAiResponsesGenerator::new(
            Secret::new("sk-test".into()),
            "gpt-4o-mini".into(),
            base_url.into(),
        )
        .with_file_search("vs_kb".into(), 20)
    }

    fn message_output(texts: &[&str]) -> String {
        let parts: Vec<Value> = texts
            .iter()
            .map(|t| json!({"type": "output_text", "text": t, "annotations": []}))
            .collect();
        json!({
            "id": "resp_1",
            "object": "response",
            "output": [
                {"type": "file_search_call", "id": "fs_1", "status": "completed"},
                {"type": "message", "role": "assistant", "content": parts}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 5}
        })
        .to_string()
    }

    #[test]
    fn request_body_carries_history_and_tools() {
        let body = generator("http://unused").request_body(&[
            HistoryTurn::user("Hi"),
            HistoryTurn::assistant("Hello!"),
            HistoryTurn::new(Role::Incoming, "image received"),
        ]);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(
            body["input"],
            json!([
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello!"},
                {"role": "user", "content": "image received"}
            ])
        );
        assert_eq!(
            body["tools"],
            json!([
                {"type": "file_search", "vector_store_ids": ["vs_kb"], "max_num_results": 20},
                {"type": "web_search_preview"}
            ])
        );
    }

    #[test]
    fn web_search_can_be_disabled() {
        let body = generator("http://unused")
            .with_web_search(false)
            .request_body(&[HistoryTurn::user("Hi")]);
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "file_search");
    }

    #[test]
    fn from_config_requires_key_and_vector_store() {
        let mut config = OpenAiConfig::default();
        assert!(matches!(
            OpenAiResponsesGenerator::from_config(&config),
            Err(GenerationError::NotConfigured {
                setting: "openai.api_key"
            })
        ));

        config.api_key = Some(Secret::new("sk".into()));
        assert!(matches!(
            OpenAiResponsesGenerator::from_config(&config),
            Err(GenerationError::NotConfigured {
                setting: "openai.vector_store_id"
            })
        ));

        config.vector_store_id = Some("vs".into());
        let generator = OpenAiResponsesGenerator::from_config(&config).unwrap();
        assert_eq!(generator.id(), "gpt-4o-mini");
    }

    #[tokio::test]
    async fn returns_concatenated_output_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/responses")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "input": [{"role": "user", "content": "Hi"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(message_output(&["Hello! ", "How can I help?"]))
            .create_async()
            .await;

        let reply = generator(&server.url())
            .generate_reply(&[HistoryTurn::user("Hi")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Hello! How can I help?");
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/responses")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .create_async()
            .await;

        let err = generator(&server.url())
            .generate_reply(&[HistoryTurn::user("Hi")])
            .await
            .unwrap_err();

        match err {
            GenerationError::Status { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("Rate limit"));
            },
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn response_without_text_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/responses")
            .with_status(200)
            .with_body(r#"{"output":[{"type":"web_search_call","id":"ws_1"}]}"#)
            .create_async()
            .await;

        let err = generator(&server.url())
            .generate_reply(&[HistoryTurn::user("Hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/responses")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = generator(&server.url())
            .generate_reply(&[HistoryTurn::user("Hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let err = generator("http://127.0.0.1:1")
            .generate_reply(&[HistoryTurn::user("Hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }
}

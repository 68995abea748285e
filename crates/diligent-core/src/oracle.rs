//! Judgment oracle: the LLM that decides whether command output is suspicious.
//!
//! The engine only sees the [`Oracle`] trait. [`OpenAiOracle`] is the
//! production implementation speaking the Chat Completions protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{parse_verdict, OracleError, OsFamily, Verdict};

/// Default model used for judgments.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Judges a context prompt and returns a structured verdict.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn judge(&self, context_prompt: &str) -> Result<Verdict, OracleError>;
}

/// Fixed system instruction sent with every judgment request.
pub fn system_instruction(os: OsFamily) -> String {
    format!(
        r#"You are a careful and accurate system analyst. Our operating system is {os}.
Your task is to evaluate the provided command output in the context of the given prompt and determine if there is any truly suspicious activity. If you identify any issues, set flagged to true, provide a description of the problem and a follow up prompt and terminal command to analyse it in a more detailed way.
Return data as JSON:
{{
  "flagged": boolean,
  "description": string,
  "follow_up_prompt": string,
  "follow_up_command": string,
  "alert": string
}}
Do not include any extra text outside of the JSON object."#,
        os = os.display_name()
    )
}

/// Configuration for [`OpenAiOracle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Bearer token
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Completion token limit
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Operating system named in the system instruction
    pub os: OsFamily,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>, os: OsFamily) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            max_tokens: 8100,
            timeout_secs: 60,
            os,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat Completions client. One round trip per judgment, no retries.
pub struct OpenAiOracle {
    config: OracleConfig,
    client: Client,
    system: String,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let system = system_instruction(config.os);

        Ok(Self {
            config,
            client,
            system,
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn complete(&self, context_prompt: &str) -> Result<String, OracleError> {
        let request = ChatCompletionsRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system,
                },
                ChatMessage {
                    role: "user",
                    content: context_prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Transport(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let body: ChatCompletionsResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Transport("no choices in response".to_string()))
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn judge(&self, context_prompt: &str) -> Result<Verdict, OracleError> {
        let reply = self.complete(context_prompt).await?;
        debug!(reply_len = reply.len(), "oracle replied");
        parse_verdict(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP request with a canned response; returns the base URL
    /// and a handle yielding the raw request text.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if buf.len() >= split + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}/v1"), handle)
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    fn oracle_for(base_url: &str) -> OpenAiOracle {
        OpenAiOracle::new(
            OracleConfig::new("sk-test", OsFamily::Linux)
                .with_base_url(base_url)
                .with_timeout_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_system_instruction_names_os_and_schema() {
        let text = system_instruction(OsFamily::MacOs);
        assert!(text.contains("Our operating system is macOS."));
        assert!(text.contains("\"flagged\": boolean"));
        assert!(text.contains("\"follow_up_command\": string"));
        assert!(text.contains("Do not include any extra text outside of the JSON object."));
    }

    #[test]
    fn test_oracle_config_defaults() {
        let config = OracleConfig::new("key", OsFamily::Linux);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_tokens, 8100);
        assert_eq!(config.timeout_secs, 60);

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("api_key"), "api key must not be serialized");
    }

    #[tokio::test]
    async fn test_judge_parses_verdict_and_sends_messages() {
        let (base_url, server) = serve_once(
            "200 OK",
            completion_body(r#"{"flagged": true, "description": "odd", "alert": "look"}"#),
        )
        .await;

        let verdict = oracle_for(&base_url).judge("check this").await.unwrap();
        assert!(verdict.flagged);
        assert_eq!(verdict.alert.as_deref(), Some("look"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("\"role\":\"system\""));
        assert!(request.contains("\"content\":\"check this\""));
        assert!(request.contains(DEFAULT_MODEL));
    }

    #[tokio::test]
    async fn test_judge_schema_error_on_prose_reply() {
        let (base_url, _server) =
            serve_once("200 OK", completion_body("I think everything is fine.")).await;

        let err = oracle_for(&base_url).judge("check").await.unwrap_err();
        assert!(err.is_schema());
    }

    #[tokio::test]
    async fn test_judge_transport_error_on_http_status() {
        let (base_url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error": {"message": "bad key"}}"#.to_string(),
        )
        .await;

        let err = oracle_for(&base_url).judge("check").await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_judge_transport_error_on_empty_choices() {
        let (base_url, _server) = serve_once("200 OK", r#"{"choices": []}"#.to_string()).await;

        let err = oracle_for(&base_url).judge("check").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_judge_transport_error_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = oracle_for(&format!("http://{addr}/v1"))
            .judge("check")
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}

//! Ollama chat client implementing the analyzer and rewriter services.
//!
//! Both operations are a single non-streaming call to `/api/chat`; the
//! analyze call asks for JSON output and parses it into a report.

use crate::analysis::{Analyzer, Rewriter};
use crate::error::{AnalysisError, RewriteError, ServiceError};
use crate::llm::prompts::{
    analysis_prompt, rewrite_prompt, ANALYSIS_SYSTEM_PROMPT, REWRITE_SYSTEM_PROMPT,
};
use crate::models::AnalysisReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.3,
            timeout_seconds: 300,
        }
    }
}

/// Message in a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for an Ollama-compatible backend.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Send one chat request and return the assistant's message content.
    async fn chat(
        &self,
        system: &str,
        user: String,
        format: Option<&'static str>,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            stream: false,
            format,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("POST {} (model: {})", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout {
                        seconds: self.config.timeout_seconds,
                    }
                } else if e.is_connect() {
                    ServiceError::Connect {
                        url: self.config.ollama_url.clone(),
                    }
                } else {
                    ServiceError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        debug!("Received {} chars", chat_response.message.content.len());
        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl Analyzer for OllamaClient {
    async fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        let content = self
            .chat(ANALYSIS_SYSTEM_PROMPT, analysis_prompt(text), Some("json"))
            .await?;
        parse_report(&content)
    }
}

#[async_trait]
impl Rewriter for OllamaClient {
    async fn rewrite(&self, text: &str, report: &AnalysisReport) -> Result<String, RewriteError> {
        let content = self
            .chat(REWRITE_SYSTEM_PROMPT, rewrite_prompt(text, report), None)
            .await?;
        parse_rewrite(&content)
    }
}

/// Parse the model's JSON answer into a report.
///
/// Tolerates code fences and prose around the outermost JSON object.
pub fn parse_report(content: &str) -> Result<AnalysisReport, AnalysisError> {
    let json = extract_json_object(content)
        .ok_or_else(|| AnalysisError::MalformedReport("no JSON object in response".to_string()))?;

    let report: AnalysisReport = serde_json::from_str(json)
        .map_err(|e| AnalysisError::MalformedReport(e.to_string()))?;

    let percentage = report.ai_detection_percentage;
    if !(0.0..=100.0).contains(&percentage) {
        return Err(AnalysisError::PercentageOutOfRange(percentage));
    }

    Ok(report)
}

/// Clean up the model's rewrite answer.
pub fn parse_rewrite(content: &str) -> Result<String, RewriteError> {
    let text = strip_code_fence(content.trim()).trim();
    if text.is_empty() {
        return Err(RewriteError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. ```text) up to the first newline.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.model_name, "llama3.2:latest");
        assert_eq!(config.ollama_url, "http://localhost:11434");
    }

    #[test]
    fn test_parse_report_plain_json() {
        let content = r#"{
            "conclusion": "Reads like a template.",
            "ai_detection_percentage": 82,
            "key_evidence": ["uniform sentence length", "generic transitions"],
            "revision_suggestions": [{
                "suspicious_passage": "In today's fast-paced world",
                "suggestion": "Open with a concrete detail",
                "rewritten_example": "Last Tuesday the bus was late again"
            }]
        }"#;

        let report = parse_report(content).unwrap();
        assert_eq!(report.ai_detection_percentage, 82.0);
        assert_eq!(report.key_evidence.len(), 2);
        assert_eq!(
            report.revision_suggestions[0].suspicious_passage,
            "In today's fast-paced world"
        );
    }

    #[test]
    fn test_parse_report_fenced_with_prose() {
        let content = "Here is the analysis:\n```json\n{\"conclusion\": \"human\", \"ai_detection_percentage\": 12.5}\n```";
        let report = parse_report(content).unwrap();
        assert_eq!(report.conclusion, "human");
        assert_eq!(report.ai_detection_percentage, 12.5);
        assert!(report.revision_suggestions.is_empty());
    }

    #[test]
    fn test_parse_report_missing_fields() {
        let err = parse_report(r#"{"ai_detection_percentage": 40}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));

        let err = parse_report("I cannot help with that.").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedReport(_)));
    }

    #[test]
    fn test_parse_report_out_of_range() {
        let err =
            parse_report(r#"{"conclusion": "x", "ai_detection_percentage": 140}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::PercentageOutOfRange(p) if p == 140.0));
    }

    #[test]
    fn test_parse_rewrite() {
        assert_eq!(parse_rewrite("  Hello, world!\n").unwrap(), "Hello, world!");
        assert_eq!(parse_rewrite("```text\nHello, world!\n```").unwrap(), "Hello, world!");
        assert!(matches!(parse_rewrite(" \n "), Err(RewriteError::EmptyResponse)));
        assert!(matches!(parse_rewrite("```\n```"), Err(RewriteError::EmptyResponse)));
    }

    #[test]
    fn test_request_serialization() {
        let request = OllamaChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u".to_string())],
            stream: false,
            format: Some("json"),
            options: OllamaOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][1]["role"], "user");

        let request = OllamaChatRequest { format: None, ..request };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
    }

    /// Serve exactly one HTTP response on a local port.
    async fn serve_once(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    /// Read headers plus a Content-Length body so the client never sees a reset.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn client_for(url: String) -> OllamaClient {
        let http_client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        OllamaClient {
            config: ClientConfig {
                ollama_url: url,
                timeout_seconds: 5,
                ..Default::default()
            },
            http_client,
        }
    }

    #[tokio::test]
    async fn test_analyze_against_stub_server() {
        let content = r#"{"conclusion":"likely human","ai_detection_percentage":10,"key_evidence":[],"revision_suggestions":[]}"#;
        let body = serde_json::json!({
            "message": { "role": "assistant", "content": content },
            "done": true
        })
        .to_string();
        let url = serve_once("200 OK", body).await;

        let report = client_for(url).analyze("Hello world").await.unwrap();

        assert_eq!(report.conclusion, "likely human");
        assert_eq!(report.ai_detection_percentage, 10.0);
    }

    #[tokio::test]
    async fn test_rewrite_against_stub_server() {
        let body = serde_json::json!({
            "message": { "role": "assistant", "content": "Hello, world!\n" },
            "done": true
        })
        .to_string();
        let url = serve_once("200 OK", body).await;
        let report = AnalysisReport {
            conclusion: "c".to_string(),
            ai_detection_percentage: 10.0,
            key_evidence: vec![],
            revision_suggestions: vec![],
        };

        let text = client_for(url).rewrite("Hello world", &report).await.unwrap();

        assert_eq!(text, "Hello, world!");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let url = serve_once("500 Internal Server Error", "model not found".to_string()).await;

        let err = client_for(url).analyze("text").await.unwrap_err();

        match err {
            AnalysisError::Service(ServiceError::Api { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client_for(url).analyze("text").await.unwrap_err();

        assert!(
            matches!(err, AnalysisError::Service(ServiceError::Connect { .. })),
            "{err:?}"
        );
    }
}

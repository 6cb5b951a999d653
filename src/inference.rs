use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{InferenceFailure, TriageError, TriageResult};
use crate::request::AnalysisRequest;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Delegate capability that turns an analysis request into raw reply text
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send the request and return the delegate's text payload, unparsed
    async fn generate(&self, request: &AnalysisRequest) -> TriageResult<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gemini `generateContent` client
///
/// # Error Handling
/// - HTTP 401/403: authentication failure
/// - Other non-2xx: delegate failure carrying the API's error message
/// - Blocked prompt or a candidate without text: delegate failure
/// - Transport timeout: timeout; any other transport error: network failure
///
/// No timeout is set on the HTTP client; callers that want one wrap the call.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> TriageResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("incident_triage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TriageError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(GeminiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

fn transport_failure(e: reqwest::Error) -> InferenceFailure {
    if e.is_timeout() {
        InferenceFailure::Timeout
    } else {
        InferenceFailure::Network(e.to_string())
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

fn reply_text(body: &str) -> Result<String, InferenceFailure> {
    let reply: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| InferenceFailure::Delegate {
            status: None,
            message: format!("unreadable reply envelope: {}", e),
        })?;

    if let Some(reason) = reply.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(InferenceFailure::Delegate {
            status: None,
            message: format!("prompt blocked: {}", reason),
        });
    }

    let candidate = reply
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| InferenceFailure::Delegate {
            status: None,
            message: "reply has no candidates".to_string(),
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(InferenceFailure::Delegate {
            status: None,
            message: format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(text)
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(&self, request: &AnalysisRequest) -> TriageResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(InferenceFailure::Authentication(status.as_u16()).into());
        } else if !status.is_success() {
            return Err(InferenceFailure::Delegate {
                status: Some(status.as_u16()),
                message: error_message(&body),
            }
            .into());
        }

        Ok(reply_text(&body)?)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::EncodedMedia;
    use crate::request::build_request;
    use crate::test_support::spawn_server;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn request() -> AnalysisRequest {
        build_request(EncodedMedia {
            data: "AAAA".to_string(),
            mime_type: "video/mp4".to_string(),
        })
    }

    async fn fake_gemini(
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("good-key") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": 403, "message": "API key not valid"}})),
            );
        }
        if body["contents"][0]["parts"][1]["inlineData"]["mimeType"] != "video/mp4" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"code": 400, "message": "missing video"}})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"incidents\":"}, {"text": " []}"}]},
                    "finishReason": "STOP"
                }]
            })),
        )
    }

    async fn client(api_key: &str) -> GeminiClient {
        let app = Router::new().route("/v1beta/models/*rest", post(fake_gemini));
        let base = spawn_server(app).await;
        GeminiClient::new(api_key, "gemini-test", &base).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("k", DEFAULT_MODEL, "https://example.test/").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_returns_concatenated_text() {
        let text = client("good-key").await.generate(&request()).await.unwrap();
        assert_eq!(text, "{\"incidents\": []}");
    }

    #[tokio::test]
    async fn test_bad_key_is_authentication_failure() {
        let err = client("bad-key").await.generate(&request()).await.unwrap_err();
        match err {
            TriageError::Inference(InferenceFailure::Authentication(code)) => assert_eq!(code, 403),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_request_is_delegate_failure() {
        let request = build_request(EncodedMedia {
            data: "AAAA".to_string(),
            mime_type: "image/png".to_string(),
        });
        let err = client("good-key").await.generate(&request).await.unwrap_err();
        match err {
            TriageError::Inference(InferenceFailure::Delegate { status, message }) => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "missing video");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let client = GeminiClient::new("k", "m", "http://127.0.0.1:1").unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            TriageError::Inference(InferenceFailure::Network(_))
        ));
    }

    #[test]
    fn test_reply_text_failures() {
        let blocked = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(
            reply_text(blocked),
            Err(InferenceFailure::Delegate { .. })
        ));

        let empty = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        match reply_text(empty) {
            Err(InferenceFailure::Delegate { message, .. }) => {
                assert!(message.contains("MAX_TOKENS"))
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(reply_text("<html>").is_err());
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        assert_eq!(
            error_message(r#"{"error": {"code": 500, "message": "backend down"}}"#),
            "backend down"
        );
        assert_eq!(error_message("plain text"), "plain text");
    }
}

/// Client for the generative image-editing service
///
/// Wraps exactly one `generateContent` call per edit: the source image
/// as an inline base64 part plus the instruction text, requesting both
/// image and text response modalities. Nothing is retried; every
/// failure mode maps to a distinct `EditError` variant whose display
/// string is the user-facing message.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::data::{EditResult, EditedImage};

/// Model used for every edit request
pub const MODEL: &str = "gemini-2.5-flash-image-preview";

/// Default REST endpoint base, overridable via GEMINI_API_BASE
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest error-body excerpt included in a transport error message
const ERROR_BODY_LIMIT: usize = 200;

/// Everything that can go wrong with one edit request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    /// The request itself was rejected at the prompt level
    #[error("Request blocked: {reason}")]
    PromptBlocked { reason: String },

    /// The service produced no candidate responses at all
    #[error("The AI service returned no candidates. Try rephrasing your prompt.")]
    NoCandidates,

    /// The candidate was flagged unsafe
    #[error("The response was blocked due to safety settings. Try a different prompt or image.")]
    SafetyBlocked,

    /// The candidate came back without any content parts
    #[error("The AI returned an empty response. The prompt might have been blocked.")]
    EmptyResponse,

    /// Parts were present but neither an image nor text could be extracted
    #[error("Could not understand the AI service's response.")]
    Unparseable,

    /// The request never completed (network, HTTP status, bad body)
    #[error("Failed to communicate with the AI service: {0}")]
    Transport(String),
}

// ---- wire format ----------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ---- client ---------------------------------------------------------------

/// Handle to the remote editing service
#[derive(Debug, Clone)]
pub struct EditClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl EditClient {
    /// Create a client with the given API key.
    /// The endpoint base can be overridden with GEMINI_API_BASE.
    pub fn new(api_key: String) -> Self {
        let api_base = std::env::var("GEMINI_API_BASE")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        EditClient {
            http: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    /// Read the API key from the environment, rejecting blank values
    pub fn api_key_from_env() -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, MODEL)
    }

    /// Send one edit request and normalize the outcome.
    ///
    /// Takes `self` by value so the future is detachable into an iced
    /// task; the client is cheap to clone.
    pub async fn edit_image(
        self,
        image_bytes: Vec<u8>,
        mime_type: String,
        instruction: String,
    ) -> Result<EditResult, EditError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: Some(vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type,
                            data: BASE64.encode(&image_bytes),
                        }),
                        ..Part::default()
                    },
                    Part {
                        text: Some(instruction),
                        ..Part::default()
                    },
                ]),
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EditError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(EditError::Transport(format!("HTTP {}: {}", status, excerpt)));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EditError::Transport(e.to_string()))?;

        parse_response(payload)
    }
}

/// Map a decoded service response onto the edit result or an error.
///
/// Pure so the whole failure taxonomy is testable without a network.
fn parse_response(response: GenerateResponse) -> Result<EditResult, EditError> {
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(EditError::PromptBlocked { reason });
        }
    }

    let mut candidates = response.candidates.unwrap_or_default();
    if candidates.is_empty() {
        return Err(EditError::NoCandidates);
    }
    let candidate = candidates.remove(0);

    if matches!(
        candidate.finish_reason.as_deref(),
        Some("SAFETY") | Some("IMAGE_SAFETY")
    ) {
        return Err(EditError::SafetyBlocked);
    }

    let parts = candidate.content.and_then(|c| c.parts).unwrap_or_default();
    if parts.is_empty() {
        return Err(EditError::EmptyResponse);
    }

    let mut image = None;
    let mut text = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let bytes = BASE64
                .decode(inline.data.as_bytes())
                .map_err(|_| EditError::Unparseable)?;
            image = Some(EditedImage {
                bytes,
                mime_type: inline.mime_type,
            });
        } else if let Some(t) = part.text {
            text = Some(t);
        }
    }

    if image.is_none() && text.is_none() {
        return Err(EditError::Unparseable);
    }

    Ok(EditResult { image, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_json(json: &str) -> Result<EditResult, EditError> {
        parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_image_and_text() {
        let data = BASE64.encode(b"fake image bytes");
        let json = format!(
            r#"{{"candidates": [{{"content": {{"parts": [
                {{"inlineData": {{"mimeType": "image/png", "data": "{data}"}}}},
                {{"text": "Brightened the sky for you."}}
            ]}}, "finishReason": "STOP"}}]}}"#
        );

        let result = parse_json(&json).unwrap();
        let image = result.image.unwrap();
        assert_eq!(image.bytes, b"fake image bytes");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(result.text.as_deref(), Some("Brightened the sky for you."));
    }

    #[test]
    fn test_parse_accepts_snake_case_inline_data() {
        let data = BASE64.encode(b"x");
        let json = format!(
            r#"{{"candidates": [{{"content": {{"parts": [
                {{"inline_data": {{"mime_type": "image/png", "data": "{data}"}}}}
            ]}}}}]}}"#
        );

        let result = parse_json(&json).unwrap();
        assert!(result.image.is_some());
        assert!(result.text.is_none());
    }

    #[test]
    fn test_prompt_block_reported_verbatim() {
        let json = r#"{"promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}}"#;
        assert_eq!(
            parse_json(json),
            Err(EditError::PromptBlocked {
                reason: "PROHIBITED_CONTENT".to_string()
            })
        );
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(parse_json(r#"{}"#), Err(EditError::NoCandidates));
        assert_eq!(parse_json(r#"{"candidates": []}"#), Err(EditError::NoCandidates));
    }

    #[test]
    fn test_safety_block() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert_eq!(parse_json(json), Err(EditError::SafetyBlocked));

        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        assert_eq!(parse_json(json), Err(EditError::SafetyBlocked));

        // The safety message names the cause for the user
        assert!(EditError::SafetyBlocked.to_string().contains("safety settings"));
    }

    #[test]
    fn test_empty_content() {
        let json = r#"{"candidates": [{"finishReason": "STOP"}]}"#;
        assert_eq!(parse_json(json), Err(EditError::EmptyResponse));

        let json = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        assert_eq!(parse_json(json), Err(EditError::EmptyResponse));
    }

    #[test]
    fn test_unextractable_parts() {
        // A part shape we don't know (e.g. a tool call) deserializes to
        // an empty Part and must surface as a parse error
        let json = r#"{"candidates": [{"content": {"parts": [{"functionCall": {"name": "x"}}]}}]}"#;
        assert_eq!(parse_json(json), Err(EditError::Unparseable));
    }

    #[test]
    fn test_invalid_base64_is_a_parse_error() {
        let json = r#"{"candidates": [{"content": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": "@@not-base64@@"}}
        ]}}]}"#;
        assert_eq!(parse_json(json), Err(EditError::Unparseable));
    }

    #[test]
    fn test_text_only_is_a_valid_result() {
        let json = r#"{"candidates": [{"content": {"parts": [
            {"text": "I cannot edit this image."}
        ]}}]}"#;

        let result = parse_json(json).unwrap();
        assert!(result.image.is_none());
        assert_eq!(result.text.as_deref(), Some("I cannot edit this image."));
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: Some(vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: "QUJD".to_string(),
                        }),
                        ..Part::default()
                    },
                    Part {
                        text: Some("make it sunset".to_string()),
                        ..Part::default()
                    },
                ]),
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"inlineData\""));
        assert!(json.contains("\"mimeType\":\"image/png\""));
        assert!(json.contains("\"responseModalities\":[\"IMAGE\",\"TEXT\"]"));
        assert!(json.contains("\"role\":\"user\""));
        // Absent options stay off the wire
        assert!(!json.contains("null"));
    }
}

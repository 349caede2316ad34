//! Generative Language REST client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{InterpretError, TextGenerator};
use crate::config::{
    GEMINI_API_BASE, GEMINI_MODEL, GEN_MAX_OUTPUT_TOKENS, GEN_TEMPERATURE, GEN_TOP_K, GEN_TOP_P,
    HTTP_TIMEOUT_SECS, SAFETY_CATEGORIES, SAFETY_THRESHOLD,
};

// === Request ===

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: GEN_TEMPERATURE,
                top_k: GEN_TOP_K,
                top_p: GEN_TOP_P,
                max_output_tokens: GEN_MAX_OUTPUT_TOKENS,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }
}

// === Response ===

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Text of the first part of the first candidate
fn first_text(body: &str) -> Result<String, InterpretError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| InterpretError::MalformedResponse(e.to_string()))?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| InterpretError::MalformedResponse("no candidate text".to_string()))
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            api_key: api_key.to_string(),
            endpoint: format!("{}/{}:generateContent", GEMINI_API_BASE, GEMINI_MODEL),
        })
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InterpretError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::new(prompt))
            .send()
            .await
            .map_err(|e| InterpretError::Upstream {
                status: None,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| InterpretError::Upstream {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(InterpretError::Upstream {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        first_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_carries_fixed_generation_parameters() {
        let body = serde_json::to_value(GenerateRequest::new("why?")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "why?");
        assert_eq!(
            body["generationConfig"],
            json!({"temperature": 0.7, "topK": 1, "topP": 1.0, "maxOutputTokens": 256})
        );
        assert_eq!(body["safetySettings"].as_array().map(|a| a.len()), Some(4));
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_first_candidate_text_extracted() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "Reserves are healthy."}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        })
        .to_string();
        assert_eq!(first_text(&body).unwrap(), "Reserves are healthy.");
    }

    #[test]
    fn test_missing_candidates_is_malformed() {
        for body in [r#"{"candidates": []}"#, r#"{"candidates": [{"finishReason": "SAFETY"}]}"#, "not json"] {
            assert!(matches!(first_text(body), Err(InterpretError::MalformedResponse(_))));
        }
    }
}

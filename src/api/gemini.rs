use crate::api::NarrativeGenerator;
use crate::error::{CoinwatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, GEMINI_API_URL, api_key, model)
    }

    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoinwatchError::UpstreamStatus {
                service: "gemini",
                status: status.as_u16(),
            });
        }
        let parsed: GenerateResponse = resp.json().await?;
        Ok(parsed.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_text_is_trimmed() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Hold for now. \n"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("Hold for now."));
    }

    #[test]
    fn test_blocked_or_empty_answer_is_none() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.first_text(), None);

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.first_text(), None);

        let no_content: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(no_content.first_text(), None);
    }

    #[tokio::test]
    async fn test_request_error_hides_api_key() {
        let generator = GeminiGenerator::with_base_url(
            Client::new(),
            "http://127.0.0.1:1/v1beta/models",
            "SECRET-KEY-456",
            "gemini-2.5-flash",
        );
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, CoinwatchError::HttpError(_)));
        let rendered = err.to_string();
        assert!(!rendered.contains("SECRET-KEY-456"), "key leaked: {rendered}");
        assert!(!rendered.contains("generateContent"), "url leaked: {rendered}");
    }
}

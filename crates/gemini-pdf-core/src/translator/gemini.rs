use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Lang, TranslatorConfig};
use super::traits::{SkipCause, TranslationOutcome, Translator};

/// Gemini generateContent translator.
///
/// Issues one request per text block, strictly sequentially, with the key
/// passed as a query parameter. Every endpoint deviation (non-200 status,
/// network failure, timeout, malformed body) is a soft failure the caller
/// skips; there are no retries, no rate limiting and no batching.
pub struct GeminiTranslator {
    client: Client,
    /// Base URL for the API, without a trailing slash
    api_base: String,
    /// Model identifier (e.g. "gemini-1.5-pro")
    model: String,
    /// API key, sent as the `key` query parameter
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

impl GeminiTranslator {
    /// Create a new Gemini translator.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created, which should only happen
    /// in extreme circumstances (e.g., TLS backend unavailable on the system).
    #[allow(clippy::expect_used)]
    pub fn new(config: &TranslatorConfig, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Fixed translation instruction followed by the source text.
    fn create_prompt(text: &str, target: &Lang) -> String {
        let language: &str = target.english_name().unwrap_or(target.as_str());
        format!("Translate the following text to {language}. Keep the style. ONLY translation:\n{text}")
    }

    /// Pull the translated string out of the response envelope.
    fn extract_candidate_text(response: GenerateResponse) -> Option<String> {
        response
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn translate(&self, text: &str, target: &Lang) -> TranslationOutcome {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: Self::create_prompt(text, target),
                }],
            }],
        };

        debug!("Translation request to model {}", self.model);

        let response = match self.client.post(self.endpoint()).json(&request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Translation request timed out");
                return TranslationOutcome::Skipped(SkipCause::Timeout);
            }
            Err(e) => {
                warn!("Translation request failed: {}", e);
                return TranslationOutcome::Skipped(SkipCause::Network(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Translation endpoint answered {}", status);
            return TranslationOutcome::Skipped(SkipCause::HttpStatus(status.as_u16()));
        }

        match response.json::<GenerateResponse>().await {
            Ok(body) => match Self::extract_candidate_text(body) {
                Some(translated) => {
                    let translated = translated.trim().to_string();
                    if translated.is_empty() {
                        return TranslationOutcome::Skipped(SkipCause::EmptyResponse);
                    }
                    TranslationOutcome::Translated(translated)
                }
                None => {
                    warn!("Translation response carried no candidates");
                    TranslationOutcome::Skipped(SkipCause::EmptyResponse)
                }
            },
            Err(e) => {
                warn!("Failed to parse translation response: {}", e);
                TranslationOutcome::Skipped(SkipCause::MalformedResponse(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = GeminiTranslator::create_prompt("Hello world", &Lang::new("ru"));
        assert!(prompt.contains("to Russian"));
        assert!(prompt.ends_with("Hello world"));
        assert!(prompt.contains("ONLY translation"));
    }

    #[test]
    fn test_prompt_falls_back_to_raw_code() {
        let prompt = GeminiTranslator::create_prompt("Hi", &Lang::new("xx"));
        assert!(prompt.contains("to xx"));
    }

    #[test]
    fn test_extract_candidate_text() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Привет мир"}], "role": "model"}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            GeminiTranslator::extract_candidate_text(response).as_deref(),
            Some("Привет мир")
        );
    }

    #[test]
    fn test_extract_candidate_text_empty_envelope() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(GeminiTranslator::extract_candidate_text(response).is_none());
    }

    #[test]
    fn test_endpoint_encodes_key() {
        let translator = GeminiTranslator::new(
            &TranslatorConfig::default(),
            "key with spaces&chars".to_string(),
        );
        let endpoint = translator.endpoint();
        assert!(endpoint.contains("models/gemini-1.5-pro:generateContent?key="));
        assert!(!endpoint.contains(' '));
        assert!(!endpoint.contains("spaces&chars"));
    }
}

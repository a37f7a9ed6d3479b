use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// Rate-limited calls are retried with a fixed delay; anything else fails fast.
const RATE_LIMIT_RETRIES: u32 = 2;
const RATE_LIMIT_BACKOFF_SECS: u64 = 8;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
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
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug)]
pub enum GeminiError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    RateLimited,
    ResponseError(String),
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            GeminiError::HttpError(err) => write!(f, "HTTP error: {}", err),
            GeminiError::RateLimited => write!(f, "Rate limited by the Gemini API"),
            GeminiError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for GeminiError {}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::HttpError(err)
    }
}

/// Strip the markdown code fences the model wraps around JSON payloads,
/// despite being told not to.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, GeminiError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::EnvironmentError("GEMINI_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Point the service at a different API host. Used by tests to aim at a fake.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Single generateContent call. Returns the concatenated candidate text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GeminiError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GeminiError::ResponseError(format!(
                "Request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::ResponseError(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(GeminiError::ResponseError(error.message));
        }

        let text: String = parsed
            .candidates
            .unwrap_or_default()
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::ResponseError(
                "No candidate text in response".to_string(),
            ));
        }

        Ok(text)
    }

    /// generateContent with the rate-limit retry policy: up to 2 extra
    /// attempts, fixed 8s delay between them. Other failures propagate
    /// immediately.
    pub async fn generate_with_retry(&self, prompt: &str) -> Result<String, GeminiError> {
        let mut retries = RATE_LIMIT_RETRIES;

        loop {
            match self.generate(prompt).await {
                Err(GeminiError::RateLimited) if retries > 0 => {
                    retries -= 1;
                    println!(
                        "[gemini] Rate limited, retrying in {}s ({} retries left)",
                        RATE_LIMIT_BACKOFF_SECS, retries
                    );
                    tokio::time::sleep(Duration::from_secs(RATE_LIMIT_BACKOFF_SECS)).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```json\n{\"stays\":[]}\n```"),
            "{\"stays\":[]}"
        );
        assert_eq!(strip_code_fences("{\"stays\":[]}"), "{\"stays\":[]}");
        assert_eq!(strip_code_fences("  ```\nhello\n```  "), "hello");
        assert_eq!(strip_code_fences(""), "");
    }
}

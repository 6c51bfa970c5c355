//! Connection settings for the Gemini oracle.

use std::time::Duration;

/// Public Generative Language API endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for narration and arbitration.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// HTTP timeout for a single oracle request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Lets PvE narration consult web search and return citations.
    pub grounding: bool,
}

impl GeminiConfig {
    /// Settings with the default model, endpoint and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grounding: true,
        }
    }

    /// The `generateContent` URL for the configured model, without the key.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

// The API key must never reach the logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("grounding", &self.grounding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let mut config = GeminiConfig::new("k");
        config.base_url = "http://127.0.0.1:9999/".to_owned();

        assert_eq!(
            config.endpoint(),
            "http://127.0.0.1:9999/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = GeminiConfig::new("super-secret");

        let printed = format!("{config:?}");

        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("gemini-3-flash-preview"));
    }
}

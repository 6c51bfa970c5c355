//! HTTP client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use destiny_narrative::application::oracle::{NarrativeOracle, OracleError};
use destiny_narrative::domain::context::{ArbitrationRequest, TurnContext};
use destiny_narrative::domain::directive::{ArbitrationResult, Directive};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::GeminiConfig;
use crate::prompt::{ARBITER_INSTRUCTION, NARRATOR_INSTRUCTION, arbitration_parts, turn_parts};
use crate::wire::{
    GenerateContentRequest, GenerateContentResponse, decode_arbitration, decode_directive,
};

/// Narrative oracle backed by a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiOracle {
    client: Client,
    config: GeminiConfig,
}

impl GeminiOracle {
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "oracle request rejected");
            return Err(OracleError::Unavailable(format!(
                "upstream answered {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::MalformedDirective(e.without_url().to_string()))
    }
}

#[async_trait]
impl NarrativeOracle for GeminiOracle {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn generate_turn(&self, context: &TurnContext) -> Result<Directive, OracleError> {
        let request = GenerateContentRequest::json(
            NARRATOR_INSTRUCTION,
            turn_parts(context),
            self.config.grounding,
        );
        let directive = decode_directive(&self.generate(&request).await?)?;
        debug!(sources = directive.sources.len(), "narration received");
        Ok(directive)
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResult, OracleError> {
        let body = GenerateContentRequest::json(
            ARBITER_INSTRUCTION,
            arbitration_parts(request),
            false,
        );
        decode_arbitration(&self.generate(&body).await?)
    }
}

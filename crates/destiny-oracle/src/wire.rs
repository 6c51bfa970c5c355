//! `generateContent` request and response bodies, and decoding of the
//! candidate text into validated oracle answers.

use destiny_narrative::application::oracle::OracleError;
use destiny_narrative::domain::directive::{ArbitrationResult, Directive};
use destiny_narrative::domain::message::Citation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl GenerateContentRequest {
    /// A single-turn request asking for a JSON answer.
    #[must_use]
    pub fn json(instruction: &str, parts: Vec<String>, grounding: bool) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: instruction.to_owned(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_owned()),
                parts: parts.into_iter().map(|text| Part { text }).collect(),
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_owned(),
            },
            tools: if grounding {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebSource {
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::Unavailable` when the prompt was blocked and
    /// `OracleError::MalformedDirective` when there is no text at all.
    pub fn candidate_text(&self) -> Result<String, OracleError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(OracleError::Unavailable(format!("prompt blocked: {reason}")));
        }
        let text: String = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::MalformedDirective(
                "response carried no candidate text".to_owned(),
            ));
        }
        Ok(text)
    }

    /// Web citations from the first candidate's grounding metadata. Chunks
    /// without a URI are dropped.
    #[must_use]
    pub fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.clone().filter(|uri| !uri.is_empty())?;
                        Some(Citation {
                            title: web.title.clone().unwrap_or_else(|| uri.clone()),
                            uri,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Cuts the JSON object out of model text that may be wrapped in a code
/// fence or surrounded by prose.
#[must_use]
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    if let Some(body) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
    {
        return body.trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Decodes a narration response into a validated directive, attaching the
/// grounding citations.
///
/// # Errors
///
/// Returns the errors of [`GenerateContentResponse::candidate_text`], or
/// `OracleError::MalformedDirective` if the text fails schema validation.
pub fn decode_directive(response: &GenerateContentResponse) -> Result<Directive, OracleError> {
    let text = response.candidate_text()?;
    let mut directive = Directive::from_json(extract_json(&text))?;
    for citation in response.citations() {
        if !directive.sources.iter().any(|known| known.uri == citation.uri) {
            directive.sources.push(citation);
        }
    }
    Ok(directive)
}

/// Decodes an arbitration response.
///
/// # Errors
///
/// Same as [`decode_directive`].
pub fn decode_arbitration(
    response: &GenerateContentResponse,
) -> Result<ArbitrationResult, OracleError> {
    let text = response.candidate_text()?;
    Ok(ArbitrationResult::from_json(extract_json(&text))?)
}

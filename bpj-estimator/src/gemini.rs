use crate::error::{EstimateError, Result};
use crate::types::EstimatedMaterial;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Substrings Gemini puts in error bodies when the key itself is rejected.
const INVALID_KEY_MARKERS: &[&str] = &["API key not valid", "API_KEY_INVALID"];

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Absent or blank means every call fails with `MissingApiKey` before
    /// any network I/O.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct EstimatorClient {
    http: reqwest::Client,
    config: EstimatorConfig,
}

impl EstimatorClient {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Recommend materials for a free-text project description.
    ///
    /// Single attempt per call: no retries, no backoff. The returned sequence
    /// is exactly what the service produced, in service order.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn estimate(&self, project_description: &str) -> Result<Vec<EstimatedMaterial>> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty())
        else {
            return Err(EstimateError::MissingApiKey);
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let req = GenerateContentRequest::new(project_description);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "gemini generateContent request failed");
                EstimateError::Service
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, "gemini response body read failed");
            EstimateError::Service
        })?;
        if !status.is_success() {
            return Err(classify_upstream_failure(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let text = parsed.candidate_text();
        let text = text.trim();
        if text.is_empty() {
            return Err(EstimateError::EmptyResponse);
        }

        let materials: Vec<EstimatedMaterial> = serde_json::from_str(text)?;
        Ok(materials)
    }
}

fn classify_upstream_failure(status: StatusCode, body: &str) -> EstimateError {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || INVALID_KEY_MARKERS.iter().any(|m| body.contains(m))
    {
        tracing::warn!(%status, "gemini rejected the configured api key");
        return EstimateError::InvalidApiKey;
    }
    tracing::warn!(%status, %body, "gemini generateContent returned non-success status");
    EstimateError::Service
}

fn build_prompt(project_description: &str) -> String {
    format!(
        "Based on the following construction project description, provide a list of \
         recommended materials (sand, stone, etc.), their estimated quantities, and units. \
         Project: \"{project_description}\""
    )
}

/// JSON Schema the service must conform its output to: an array of objects
/// with four required string properties.
fn response_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "materialName": {
                    "type": "STRING",
                    "description": "The name of the recommended building material (e.g., \"Pasir Pasang\", \"Batu Split 2/3\").",
                },
                "quantity": {
                    "type": "STRING",
                    "description": "The estimated quantity of the material needed, as a string to accommodate ranges (e.g., \"10-12\").",
                },
                "unit": {
                    "type": "STRING",
                    "description": "The unit of measurement for the quantity (e.g., \"m³\", \"pcs\", \"karung\").",
                },
                "notes": {
                    "type": "STRING",
                    "description": "Brief notes on why this material is recommended or its primary use in the project.",
                },
            },
            "required": ["materialName", "quantity", "unit", "notes"],
        },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn new(project_description: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(project_description),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, matching how the
    /// official SDKs expose `response.text`.
    fn candidate_text(&self) -> String {
        let mut text = String::new();
        let Some(candidate) = self.candidates.first() else {
            return text;
        };
        let Some(content) = &candidate.content else {
            return text;
        };
        for part in &content.parts {
            text.push_str(&part.text);
        }
        text
    }
}

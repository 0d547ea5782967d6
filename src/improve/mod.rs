//! Report improvement through an external text generation service.
//!
//! Rewrites the servant's activity notes in formal administrative Portuguese.
//! The call is best effort: [`improve_report`] never fails and hands back the
//! original notes whenever the service does not produce usable text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;

/// Sampling temperature sent with every request.
const TEMPERATURE: f32 = 0.7;
/// Nucleus sampling cutoff sent with every request.
const TOP_P: f32 = 0.9;

/// Rewrites raw activity notes into a formal report.
#[async_trait]
pub trait ReportImprover: Send + Sync {
    async fn improve(&self, notes: &str, objective: &str) -> Result<String, AppError>;
}

/// Improve `notes`, falling back to them unchanged on any failure.
pub async fn improve_report(improver: &dyn ReportImprover, notes: &str, objective: &str) -> String {
    match improver.improve(notes, objective).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("Report improvement returned no text, keeping original notes");
            notes.to_string()
        }
        Err(e) => {
            tracing::error!("Error improving report: {}", e);
            notes.to_string()
        }
    }
}

/// Instruction sent to the model. The output language is fixed to Brazilian Portuguese.
pub fn build_prompt(notes: &str, objective: &str) -> String {
    format!(
        "Transforme as seguintes notas de atividades de um servidor público em um relatório \
         formal e profissional para prestação de contas de diárias.\n\n\
         Objetivo da Viagem: {objective}\n\
         Notas das Atividades: {notes}\n\n\
         Regras:\n\
         1. Use linguagem administrativa formal e impessoal (Ex: \"Procedeu-se...\", \"Realizou-se...\").\n\
         2. Seja conciso mas detalhado sobre as ações executadas.\n\
         3. Organize em parágrafos coerentes.\n\
         4. O texto deve estar em Português do Brasil."
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        Some(text)
    }
}

/// Calls the Gemini `generateContent` endpoint once per improvement.
pub struct GeminiImprover {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiImprover {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ReportImprover for GeminiImprover {
    async fn improve(&self, notes: &str, objective: &str) -> Result<String, AppError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(notes, objective)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
            },
        };

        tracing::debug!("Requesting report improvement from model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Text generation service returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        body.text()
            .ok_or_else(|| AppError::Upstream("Response contained no candidates".to_string()))
    }
}

/// Stand-in used when no API key is configured. Every call fails, so the
/// original notes are always kept.
pub struct UnconfiguredImprover;

#[async_trait]
impl ReportImprover for UnconfiguredImprover {
    async fn improve(&self, _notes: &str, _objective: &str) -> Result<String, AppError> {
        Err(AppError::Upstream(
            "No text generation API key configured".to_string(),
        ))
    }
}

/// Build the improver described by `config`.
pub fn from_config(config: &Config) -> Result<Arc<dyn ReportImprover>, AppError> {
    match &config.gemini_api_key {
        Some(key) => Ok(Arc::new(GeminiImprover::new(
            key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            config.improve_timeout,
        )?)),
        None => {
            tracing::warn!("No Gemini API key configured (GEMINI_API_KEY). Report improvement will keep the original notes");
            Ok(Arc::new(UnconfiguredImprover))
        }
    }
}

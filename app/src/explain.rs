// ==============================================================================
// explain.rs - Natural-Language Explanation Generator
// ==============================================================================
// Description: Optional LLM explanation of a drug-gene result via Gemini
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// The analysis engine never calls this module. Callers request an explanation
// after a result exists; every failure (no API key, network, HTTP status,
// malformed or empty response) collapses to FALLBACK_EXPLANATION.
//
// Environment:
//   GEMINI_API_KEY       - enables the client (unset -> fallback only)
//   GEMINI_MODEL         - model name (default: gemini-1.5-flash)
//   GEMINI_API_BASE      - API base URL (default: Google v1beta endpoint)
//   GEMINI_TIMEOUT_SECS  - request timeout (default: 20)
// ==============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::AnalysisResult;

pub const FALLBACK_EXPLANATION: &str = "LLM explanation unavailable";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Text-in / text-out explanation collaborator
#[async_trait]
pub trait ExplanationGenerator: Send + Sync {
    /// Never fails; returns `FALLBACK_EXPLANATION` when nothing better is available
    async fn explain(
        &self,
        gene: &str,
        drug: &str,
        phenotype: &str,
        risk: &str,
        rsids: &[String],
    ) -> String;
}

/// Convenience wrapper feeding a finished result to a generator
pub async fn explain_result(generator: &dyn ExplanationGenerator, result: &AnalysisResult) -> String {
    generator
        .explain(
            result.gene.as_str(),
            result.drug.as_str(),
            result.phenotype.as_str(),
            result.risk.as_str(),
            &result.rsids,
        )
        .await
}

pub fn build_prompt(gene: &str, drug: &str, phenotype: &str, risk: &str, rsids: &[String]) -> String {
    let rsid_text = if rsids.is_empty() {
        "none detected".to_string()
    } else {
        rsids.join(", ")
    };

    format!(
        "Explain clinically why a {} metabolizer of {} taking {} is categorized as {}. \
         Include mechanism and reference variants {}. Be professional and concise.",
        phenotype, gene, drug, risk, rsid_text
    )
}

/// Generator used when no LLM backend is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackExplainer;

#[async_trait]
impl ExplanationGenerator for FallbackExplainer {
    async fn explain(
        &self,
        _gene: &str,
        _drug: &str,
        _phenotype: &str,
        _risk: &str,
        _rsids: &[String],
    ) -> String {
        FALLBACK_EXPLANATION.to_string()
    }
}

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct ExplainConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ExplainConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

// Request / response bodies for models/{model}:generateContent

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini-backed explanation generator
pub struct GeminiExplainer {
    client: reqwest::Client,
    config: ExplainConfig,
}

impl GeminiExplainer {
    pub fn new(config: ExplainConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    async fn generate(&self, api_key: &str, prompt: String) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        };

        debug!("Requesting explanation from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Explanation request failed")?
            .error_for_status()
            .context("Explanation service returned an error status")?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Malformed explanation response")?;

        Ok(parsed.text().trim().to_string())
    }
}

#[async_trait]
impl ExplanationGenerator for GeminiExplainer {
    async fn explain(
        &self,
        gene: &str,
        drug: &str,
        phenotype: &str,
        risk: &str,
        rsids: &[String],
    ) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return FALLBACK_EXPLANATION.to_string();
        };

        let prompt = build_prompt(gene, drug, phenotype, risk, rsids);
        match self.generate(api_key, prompt).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                warn!("Explanation service returned empty text for {} / {}", drug, gene);
                FALLBACK_EXPLANATION.to_string()
            }
            Err(e) => {
                warn!("Explanation unavailable for {} / {}: {:#}", drug, gene, e);
                FALLBACK_EXPLANATION.to_string()
            }
        }
    }
}

/// Pick a generator for the current environment
///
/// Falls back to `FallbackExplainer` when no API key is set or the HTTP client
/// cannot be built.
pub fn from_env() -> Box<dyn ExplanationGenerator> {
    let config = ExplainConfig::from_env();
    if config.api_key.is_none() {
        debug!("GEMINI_API_KEY not set, explanations disabled");
        return Box::new(FallbackExplainer);
    }

    match GeminiExplainer::new(config) {
        Ok(client) => Box::new(client),
        Err(e) => {
            warn!("Explanation client unavailable: {:#}", e);
            Box::new(FallbackExplainer)
        }
    }
}

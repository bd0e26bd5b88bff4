// ==============================================================================
// output.rs - Report Rendering
// ==============================================================================
// Description: Render analysis results as JSON, CSV or plain text
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-19
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::models::AnalysisResult;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full result structure (best for web APIs and JavaScript)
    Json,
    /// One flat row per drug (best for spreadsheets)
    Csv,
    /// Human-readable summary
    Text,
}

/// One analysis result plus its optional explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub result: AnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ReportEntry {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: String) -> Self {
        self.explanation = Some(explanation);
        self
    }
}

/// Flat CSV row; nested fields are collapsed
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    patient_id: &'a str,
    drug: &'a str,
    gene: &'a str,
    diplotype: &'a str,
    phenotype: &'a str,
    risk: &'a str,
    severity: &'a str,
    confidence_score: f64,
    recommendation: &'a str,
    rsids: String,
    vcf_parsing_success: bool,
    explanation: &'a str,
}

impl<'a> From<&'a ReportEntry> for CsvRow<'a> {
    fn from(entry: &'a ReportEntry) -> Self {
        let result = &entry.result;
        Self {
            patient_id: &result.patient_id,
            drug: result.drug.as_str(),
            gene: result.gene.as_str(),
            diplotype: &result.diplotype,
            phenotype: result.phenotype.as_str(),
            risk: result.risk.as_str(),
            severity: result.severity.as_str(),
            confidence_score: result.confidence_score,
            recommendation: &result.recommendation,
            rsids: result.rsids.join(";"),
            vcf_parsing_success: result.quality_metrics.vcf_parsing_success,
            explanation: entry.explanation.as_deref().unwrap_or(""),
        }
    }
}

pub fn render(entries: &[ReportEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(entries),
        OutputFormat::Csv => render_csv(entries),
        OutputFormat::Text => Ok(render_text(entries)),
    }
}

/// Pretty JSON; a single entry is written as an object, several as an array
pub fn render_json(entries: &[ReportEntry]) -> Result<String> {
    let json = match entries {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(entries),
    }
    .context("Failed to serialize report as JSON")?;

    Ok(json)
}

pub fn render_csv(entries: &[ReportEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in entries {
        writer
            .serialize(CsvRow::from(entry))
            .context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV writer")?;

    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn render_text(entries: &[ReportEntry]) -> String {
    let mut out = String::new();

    for (i, entry) in entries.iter().enumerate() {
        let result = &entry.result;
        if i > 0 {
            out.push('\n');
        }

        // Writing into a String cannot fail
        let _ = writeln!(out, "Patient:        {}", result.patient_id);
        let _ = writeln!(out, "Drug:           {} ({})", result.drug, result.gene);
        let _ = writeln!(out, "Diplotype:      {}", result.diplotype);
        let _ = writeln!(out, "Phenotype:      {}", result.phenotype);
        let _ = writeln!(out, "Risk:           {} [severity: {}]", result.risk, result.severity);
        let _ = writeln!(out, "Confidence:     {:.2}", result.confidence_score);
        let _ = writeln!(out, "Recommendation: {}", result.recommendation);
        if !result.rsids.is_empty() {
            let _ = writeln!(out, "Variants:       {}", result.rsids.join(", "));
        }
        if let Some(explanation) = &entry.explanation {
            let _ = writeln!(out, "Explanation:    {}", explanation);
        }
    }

    out
}

// ==============================================================================
// models.rs - Pharmacogenomic Data Models
// ==============================================================================
// Description: Per-gene accumulators, parsed file summary and analysis results
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Drug, Gene, Phenotype, Risk, Severity};

/// Star alleles and rsIDs collected for one gene during a parse pass
///
/// Both lists keep first-seen order and never contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRecord {
    /// Upper-cased star-allele tokens (e.g., "*1", "*4", "*2X2")
    pub stars: Vec<String>,

    /// Reference SNP identifiers (e.g., "rs3892097")
    pub rsids: Vec<String>,
}

impl GeneRecord {
    pub fn add_star(&mut self, star: String) {
        if !self.stars.contains(&star) {
            self.stars.push(star);
        }
    }

    pub fn add_rsid(&mut self, rsid: String) {
        if !self.rsids.contains(&rsid) {
            self.rsids.push(rsid);
        }
    }

    /// True when at least one star allele or rsID was observed
    pub fn has_evidence(&self) -> bool {
        !self.stars.is_empty() || !self.rsids.is_empty()
    }
}

/// Result of one extraction pass over an input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub patient_id: String,

    /// Only supported genes ever appear here
    pub genes: BTreeMap<Gene, GeneRecord>,

    /// False only when the bytes were not valid UTF-8
    pub parse_succeeded: bool,
}

impl ParsedFile {
    /// Placeholder used when the input could not be decoded as text
    pub fn undecodable(patient_id: String) -> Self {
        Self {
            patient_id,
            genes: BTreeMap::new(),
            parse_succeeded: false,
        }
    }
}

/// Signals that fed the confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub gene_detected: bool,
    pub rule_applied: bool,
    pub confidence_score: f64,
}

/// Step-by-step record of how the risk outcome was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalTrace {
    pub drug_requested: Drug,
    pub required_gene: Gene,
    /// Canonical diplotype or "Unknown"
    pub detected_diplotype: String,
    pub derived_phenotype: Phenotype,
    /// "Yes" or "No"
    pub cpic_rule_applied: String,
    pub final_risk_outcome: Risk,
}

/// Complete drug-gene evaluation for one patient file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub patient_id: String,
    pub drug: Drug,
    pub gene: Gene,
    /// Canonical diplotype ("*1/*4") or "Unknown" when fewer than two alleles were seen
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub risk: Risk,
    pub recommendation: String,
    pub severity: Severity,
    /// 0.0 - 1.0 in steps of 0.1
    pub confidence_score: f64,
    /// rsIDs observed for the required gene
    pub rsids: Vec<String>,
    /// Every supported gene seen in the file, kept for auditability
    pub parsed_genes: BTreeMap<Gene, GeneRecord>,
    pub quality_metrics: QualityMetrics,
    pub clinical_trace: ClinicalTrace,
}

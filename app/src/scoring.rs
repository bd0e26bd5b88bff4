// ==============================================================================
// scoring.rs - Confidence & Severity Scoring
// ==============================================================================
// Description: Deterministic confidence score and severity tier for a result
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Confidence weights (percent):
//   gene detected          40
//   complete diplotype     30
//   clinical rule applied  30
// Reachable scores: 0.0, 0.3, 0.4, 0.6, 0.7, 1.0
// ==============================================================================

use crate::catalog::{self, Risk, Severity};

const GENE_DETECTED_WEIGHT: u32 = 40;
const DIPLOTYPE_COMPLETE_WEIGHT: u32 = 30;
const RULE_APPLIED_WEIGHT: u32 = 30;
const MAX_SCORE: u32 = 100;

/// Confidence in [0.0, 1.0], rounded to two decimals
///
/// Weights are summed in integer percent before converting to f64.
pub fn confidence_score(gene_detected: bool, diplotype_complete: bool, rule_applied: bool) -> f64 {
    let mut percent = 0;
    if gene_detected {
        percent += GENE_DETECTED_WEIGHT;
    }
    if diplotype_complete {
        percent += DIPLOTYPE_COMPLETE_WEIGHT;
    }
    if rule_applied {
        percent += RULE_APPLIED_WEIGHT;
    }

    f64::from(percent.min(MAX_SCORE)) / 100.0
}

pub fn severity(risk: Risk) -> Severity {
    catalog::severity_for(risk)
}

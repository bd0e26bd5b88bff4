// ==============================================================================
// resolver.rs - Phenotype & Rule Resolution
// ==============================================================================
// Description: Diplotype -> phenotype, then (drug, phenotype) -> clinical rule
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use crate::catalog::{self, Drug, Gene, Phenotype, Risk};

/// Risk and recommendation chosen for a drug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub risk: Risk,
    pub recommendation: String,
    /// True when a catalog rule matched, false for the "Unknown" fallback
    pub rule_applied: bool,
}

/// Phenotype for a gene, `Unknown` when the diplotype is missing or not tabled
pub fn map_phenotype(gene: Gene, diplotype: Option<&str>) -> Phenotype {
    match diplotype {
        Some(diplotype) => catalog::phenotype_for(gene, diplotype),
        None => Phenotype::Unknown,
    }
}

pub fn unknown_recommendation(gene: Gene) -> String {
    format!("Insufficient data to apply CPIC rule for {}.", gene)
}

/// Apply the drug's rule for `phenotype`, falling back to an "Unknown" risk
/// that names the drug's required gene
pub fn resolve_rule(drug: Drug, phenotype: Phenotype) -> RuleOutcome {
    match catalog::rule_for(drug, phenotype) {
        Some(rule) => RuleOutcome {
            risk: rule.risk,
            recommendation: rule.recommendation.to_string(),
            rule_applied: true,
        },
        None => RuleOutcome {
            risk: Risk::Unknown,
            recommendation: unknown_recommendation(drug.required_gene()),
            rule_applied: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_diplotype_is_unknown() {
        assert_eq!(map_phenotype(Gene::Cyp2d6, None), Phenotype::Unknown);
    }

    #[test]
    fn test_untabled_diplotype_is_unknown() {
        assert_eq!(map_phenotype(Gene::Cyp2d6, Some("*2/*10")), Phenotype::Unknown);
        assert_eq!(map_phenotype(Gene::Cyp2d6, Some("*4/*4")), Phenotype::Poor);
    }

    #[test]
    fn test_rule_hit() {
        let outcome = resolve_rule(Drug::Clopidogrel, Phenotype::Poor);
        assert_eq!(outcome.risk, Risk::Toxic);
        assert_eq!(
            outcome.recommendation,
            "Avoid clopidogrel; prefer alternative antiplatelet therapy."
        );
        assert!(outcome.rule_applied);
    }

    #[test]
    fn test_rule_miss_names_required_gene() {
        let outcome = resolve_rule(Drug::Warfarin, Phenotype::Unknown);
        assert_eq!(outcome.risk, Risk::Unknown);
        assert_eq!(
            outcome.recommendation,
            "Insufficient data to apply CPIC rule for CYP2C9."
        );
        assert!(!outcome.rule_applied);
    }
}

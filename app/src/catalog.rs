// ==============================================================================
// catalog.rs - Pharmacogenomic Rule Catalog
// ==============================================================================
// Description: Static gene/drug tables, diplotype phenotypes and CPIC-style rules
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Tables:
//   Drug        -> required gene
//   Gene + diplotype -> metabolizer phenotype (NM / IM / PM)
//   Drug + phenotype -> RuleDecision (risk, recommendation)
//   Risk        -> severity tier (none / moderate / high)
//
// All tables are compiled into `match` arms; nothing is loaded or mutated at
// runtime, so lookups are safe from any number of threads.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing catalog symbols from free text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown gene symbol: {0}")]
    UnknownGene(String),

    #[error("Unknown drug: {0}")]
    UnknownDrug(String),
}

/// Pharmacogenes supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gene {
    #[serde(rename = "CYP2D6")]
    Cyp2d6,
    #[serde(rename = "CYP2C19")]
    Cyp2c19,
    #[serde(rename = "CYP2C9")]
    Cyp2c9,
}

impl Gene {
    /// Declaration order. Substring-based gene detection depends on it:
    /// CYP2C19 must be tried before CYP2C9.
    pub const ALL: [Gene; 3] = [Gene::Cyp2d6, Gene::Cyp2c19, Gene::Cyp2c9];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gene::Cyp2d6 => "CYP2D6",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2c9 => "CYP2C9",
        }
    }

    /// Look up an already upper-cased, trimmed symbol
    pub fn from_symbol(symbol: &str) -> Option<Gene> {
        Gene::ALL.into_iter().find(|gene| gene.as_str() == symbol)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gene {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gene::from_symbol(&s.trim().to_uppercase())
            .ok_or_else(|| CatalogError::UnknownGene(s.to_string()))
    }
}

/// Drugs with a clinical rule in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Drug {
    Codeine,
    Clopidogrel,
    Warfarin,
}

impl Drug {
    pub const ALL: [Drug; 3] = [Drug::Codeine, Drug::Clopidogrel, Drug::Warfarin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Drug::Codeine => "CODEINE",
            Drug::Clopidogrel => "CLOPIDOGREL",
            Drug::Warfarin => "WARFARIN",
        }
    }

    /// The single gene whose phenotype drives this drug's rule
    pub fn required_gene(&self) -> Gene {
        match self {
            Drug::Codeine => Gene::Cyp2d6,
            Drug::Clopidogrel => Gene::Cyp2c19,
            Drug::Warfarin => Gene::Cyp2c9,
        }
    }
}

impl fmt::Display for Drug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Drug {
    type Err = CatalogError;

    /// Accepts any casing and surrounding whitespace ("  codeine " -> CODEINE)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Drug::ALL
            .into_iter()
            .find(|drug| drug.as_str() == normalized)
            .ok_or_else(|| CatalogError::UnknownDrug(s.to_string()))
    }
}

/// Metabolizer status derived from a diplotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    /// Normal metabolizer
    #[serde(rename = "NM")]
    Normal,
    /// Intermediate metabolizer
    #[serde(rename = "IM")]
    Intermediate,
    /// Poor metabolizer
    #[serde(rename = "PM")]
    Poor,
    Unknown,
}

impl Phenotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phenotype::Normal => "NM",
            Phenotype::Intermediate => "IM",
            Phenotype::Poor => "PM",
            Phenotype::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Risk {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    /// No rule could be applied
    Unknown,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Safe => "Safe",
            Risk::AdjustDosage => "Adjust Dosage",
            Risk::Toxic => "Toxic",
            Risk::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse triage bucket for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the drug rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    pub risk: Risk,
    pub recommendation: &'static str,
}

const fn decision(risk: Risk, recommendation: &'static str) -> RuleDecision {
    RuleDecision { risk, recommendation }
}

/// Map a canonical diplotype ("*1/*4") to a phenotype, `Unknown` on miss
pub fn phenotype_for(gene: Gene, diplotype: &str) -> Phenotype {
    match (gene, diplotype) {
        (Gene::Cyp2d6, "*1/*1") => Phenotype::Normal,
        (Gene::Cyp2d6, "*1/*4") => Phenotype::Intermediate,
        (Gene::Cyp2d6, "*4/*4") => Phenotype::Poor,

        (Gene::Cyp2c19, "*1/*1") => Phenotype::Normal,
        (Gene::Cyp2c19, "*1/*2") => Phenotype::Intermediate,
        (Gene::Cyp2c19, "*2/*2") => Phenotype::Poor,

        (Gene::Cyp2c9, "*1/*1") => Phenotype::Normal,
        (Gene::Cyp2c9, "*1/*3") => Phenotype::Intermediate,
        (Gene::Cyp2c9, "*3/*3") => Phenotype::Poor,

        _ => Phenotype::Unknown,
    }
}

/// Look up the clinical rule for a drug and phenotype
///
/// Returns `None` for `Phenotype::Unknown`; every drug has a rule for each of
/// NM, IM and PM.
pub fn rule_for(drug: Drug, phenotype: Phenotype) -> Option<RuleDecision> {
    let rule = match (drug, phenotype) {
        (_, Phenotype::Unknown) => return None,

        (Drug::Codeine, Phenotype::Normal) => decision(
            Risk::Safe,
            "Use standard dosing per CPIC-guided interpretation.",
        ),
        (Drug::Codeine, Phenotype::Intermediate) => decision(
            Risk::AdjustDosage,
            "Consider alternative analgesic or monitor for reduced effect.",
        ),
        (Drug::Codeine, Phenotype::Poor) => decision(
            Risk::Toxic,
            "Avoid codeine and use a non-CYP2D6-dependent analgesic.",
        ),

        (Drug::Clopidogrel, Phenotype::Normal) => decision(
            Risk::Safe,
            "Use standard clopidogrel therapy.",
        ),
        (Drug::Clopidogrel, Phenotype::Intermediate) => decision(
            Risk::AdjustDosage,
            "Consider alternative antiplatelet based on clinical context.",
        ),
        (Drug::Clopidogrel, Phenotype::Poor) => decision(
            Risk::Toxic,
            "Avoid clopidogrel; prefer alternative antiplatelet therapy.",
        ),

        (Drug::Warfarin, Phenotype::Normal) => decision(
            Risk::Safe,
            "Use standard initiation with INR monitoring.",
        ),
        (Drug::Warfarin, Phenotype::Intermediate) => decision(
            Risk::AdjustDosage,
            "Consider lower initial dose and closer INR monitoring.",
        ),
        (Drug::Warfarin, Phenotype::Poor) => decision(
            Risk::Toxic,
            "Use substantially lower dose and intensive INR monitoring.",
        ),
    };

    Some(rule)
}

/// Severity tier for a risk label; anything without a rule is "moderate"
pub fn severity_for(risk: Risk) -> Severity {
    match risk {
        Risk::Safe => Severity::None,
        Risk::AdjustDosage => Severity::Moderate,
        Risk::Toxic => Severity::High,
        Risk::Unknown => Severity::Moderate,
    }
}

// ==============================================================================
// processor.rs - Core Pharmacogenomic Analysis Logic
// ==============================================================================
// Description: Runs extraction, diplotype, phenotype, rule and scoring steps
//              for one uploaded file and one or more drugs
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Pipeline:
//   bytes --decode--> text --VariantExtractor--> ParsedFile
//   drug  --normalize--> required gene --> GeneRecord
//   GeneRecord --build_diplotype--> diplotype --map_phenotype--> phenotype
//   (drug, phenotype) --resolve_rule--> risk / recommendation
//   signals --confidence_score--> score, risk --severity--> tier
//
// No I/O happens here. The same inputs always produce the same result.
// ==============================================================================

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Drug, Gene};
use crate::diplotype::build_diplotype;
use crate::models::{AnalysisResult, ClinicalTrace, GeneRecord, ParsedFile, QualityMetrics};
use crate::parsers::VariantExtractor;
use crate::resolver::{map_phenotype, resolve_rule};
use crate::scoring::{confidence_score, severity};

/// Patient ID used when neither the file nor its name provides one
pub const UNKNOWN_PATIENT: &str = "Unknown";

/// Rendered in place of a missing diplotype
pub const UNKNOWN_DIPLOTYPE: &str = "Unknown";

/// Analysis errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Unsupported drug: {requested} (supported: {})", format_drugs(.supported))]
    UnsupportedDrug {
        /// Drug name exactly as requested (not normalized)
        requested: String,
        supported: Vec<Drug>,
    },
}

fn format_drugs(drugs: &[Drug]) -> String {
    drugs
        .iter()
        .map(Drug::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trim and upper-case a drug name and check it against the catalog
pub fn normalize_drug(drug_name: &str) -> Result<Drug, AnalysisError> {
    drug_name
        .parse::<Drug>()
        .map_err(|_| AnalysisError::UnsupportedDrug {
            requested: drug_name.to_string(),
            supported: Drug::ALL.to_vec(),
        })
}

/// File name without directory or extension ("uploads/p01.vcf" -> "p01")
pub fn fallback_patient_id(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| UNKNOWN_PATIENT.to_string())
}

/// Decode and scan an uploaded file
///
/// Bytes that are not valid UTF-8 yield an empty `ParsedFile` with
/// `parse_succeeded = false` instead of an error.
pub fn parse_input(file_bytes: &[u8], file_name: &str) -> ParsedFile {
    let fallback_id = fallback_patient_id(file_name);

    match std::str::from_utf8(file_bytes) {
        Ok(text) => VariantExtractor::new().parse(text, &fallback_id),
        Err(e) => {
            warn!("Could not decode {} as UTF-8: {}", file_name, e);
            ParsedFile::undecodable(fallback_id)
        }
    }
}

/// Analyze one file for one drug
///
/// # Arguments
/// * `file_bytes` - Raw uploaded file contents
/// * `file_name` - Original file name (patient ID fallback)
/// * `drug_name` - Requested drug, any casing
///
/// # Returns
/// * `Ok(AnalysisResult)` - Always, for a supported drug, even on unreadable input
/// * `Err(AnalysisError::UnsupportedDrug)` - Drug outside the catalog
pub fn analyze(
    file_bytes: &[u8],
    file_name: &str,
    drug_name: &str,
) -> Result<AnalysisResult, AnalysisError> {
    let parsed = parse_input(file_bytes, file_name);
    let drug = normalize_drug(drug_name)?;
    Ok(evaluate(&parsed, drug))
}

/// Analyze one file for several drugs, parsing it once
///
/// Every drug name is checked before any drug is evaluated; results follow
/// the request order.
pub fn analyze_many<S: AsRef<str>>(
    file_bytes: &[u8],
    file_name: &str,
    drug_names: &[S],
) -> Result<Vec<AnalysisResult>, AnalysisError> {
    let parsed = parse_input(file_bytes, file_name);
    let drugs = drug_names
        .iter()
        .map(|name| normalize_drug(name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(drugs.into_iter().map(|drug| evaluate(&parsed, drug)).collect())
}

/// Evaluate a drug against an already parsed file
pub fn evaluate(parsed: &ParsedFile, drug: Drug) -> AnalysisResult {
    let gene: Gene = drug.required_gene();
    let record: Option<&GeneRecord> = parsed.genes.get(&gene);

    let gene_detected = record.is_some_and(GeneRecord::has_evidence);
    let diplotype = record.and_then(|r| build_diplotype(&r.stars));
    let phenotype = map_phenotype(gene, diplotype.as_deref());
    let outcome = resolve_rule(drug, phenotype);

    let score = confidence_score(gene_detected, diplotype.is_some(), outcome.rule_applied);
    let tier = severity(outcome.risk);
    let diplotype = diplotype.unwrap_or_else(|| UNKNOWN_DIPLOTYPE.to_string());

    debug!(
        "{} / {}: stars={:?} diplotype={} phenotype={}",
        drug,
        gene,
        record.map(|r| r.stars.as_slice()).unwrap_or_default(),
        diplotype,
        phenotype
    );
    info!(
        "Analysis for {} ({}): {} -> {} (confidence {:.1})",
        parsed.patient_id, drug, phenotype, outcome.risk, score
    );

    AnalysisResult {
        patient_id: parsed.patient_id.clone(),
        drug,
        gene,
        diplotype: diplotype.clone(),
        phenotype,
        risk: outcome.risk,
        recommendation: outcome.recommendation,
        severity: tier,
        confidence_score: score,
        rsids: record.map(|r| r.rsids.clone()).unwrap_or_default(),
        parsed_genes: parsed.genes.clone(),
        quality_metrics: QualityMetrics {
            vcf_parsing_success: parsed.parse_succeeded,
            gene_detected,
            rule_applied: outcome.rule_applied,
            confidence_score: score,
        },
        clinical_trace: ClinicalTrace {
            drug_requested: drug,
            required_gene: gene,
            detected_diplotype: diplotype,
            derived_phenotype: phenotype,
            cpic_rule_applied: (if outcome.rule_applied { "Yes" } else { "No" }).to_string(),
            final_risk_outcome: outcome.risk,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Phenotype, Risk, Severity};
    use std::collections::BTreeMap;

    const HEADER: &str = "\
##fileformat=VCFv4.2
##SAMPLE=<ID=PATIENT_001>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT_001
";

    fn data_line(rsid: &str, info: &str) -> String {
        format!("22\t42130692\t{}\tC\tT\t.\tPASS\t{}\tGT\t0/1\n", rsid, info)
    }

    fn vcf(lines: &[String]) -> Vec<u8> {
        let mut text = HEADER.to_string();
        for line in lines {
            text.push_str(line);
        }
        text.into_bytes()
    }

    fn cyp2d6_star1_star4() -> Vec<u8> {
        vcf(&[
            data_line("rs1065852", "GENE=CYP2D6;STAR=*1"),
            data_line("rs3892097", "GENE=CYP2D6;STAR=*4"),
        ])
    }

    #[test]
    fn test_intermediate_metabolizer_scenario() {
        let result = analyze(&cyp2d6_star1_star4(), "patient.vcf", "codeine").unwrap();

        assert_eq!(result.patient_id, "PATIENT_001");
        assert_eq!(result.drug, Drug::Codeine);
        assert_eq!(result.gene, Gene::Cyp2d6);
        assert_eq!(result.diplotype, "*1/*4");
        assert_eq!(result.phenotype, Phenotype::Intermediate);
        assert_eq!(result.risk, Risk::AdjustDosage);
        assert_eq!(
            result.recommendation,
            "Consider alternative analgesic or monitor for reduced effect."
        );
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.confidence_score, 1.0);
        assert_eq!(result.rsids, vec!["rs1065852", "rs3892097"]);

        assert!(result.quality_metrics.vcf_parsing_success);
        assert!(result.quality_metrics.gene_detected);
        assert!(result.quality_metrics.rule_applied);
        assert_eq!(result.clinical_trace.cpic_rule_applied, "Yes");
        assert_eq!(result.clinical_trace.detected_diplotype, "*1/*4");
        assert_eq!(result.clinical_trace.final_risk_outcome, Risk::AdjustDosage);
    }

    #[test]
    fn test_unsupported_drug_keeps_original_name() {
        let err = analyze(&cyp2d6_star1_star4(), "patient.vcf", " Aspirin ").unwrap_err();

        assert_eq!(
            err,
            AnalysisError::UnsupportedDrug {
                requested: " Aspirin ".to_string(),
                supported: vec![Drug::Codeine, Drug::Clopidogrel, Drug::Warfarin],
            }
        );
        assert_eq!(
            err.to_string(),
            "Unsupported drug:  Aspirin  (supported: CODEINE, CLOPIDOGREL, WARFARIN)"
        );
    }

    #[test]
    fn test_unsupported_drug_regardless_of_content() {
        assert!(analyze(&[0xff, 0xfe, 0x00], "bad.vcf", "ibuprofen").is_err());
        assert!(analyze(b"", "empty.vcf", "").is_err());
    }

    #[test]
    fn test_required_gene_absent() {
        let result = analyze(&cyp2d6_star1_star4(), "patient.vcf", "WARFARIN").unwrap();

        assert_eq!(result.gene, Gene::Cyp2c9);
        assert_eq!(result.diplotype, "Unknown");
        assert_eq!(result.phenotype, Phenotype::Unknown);
        assert_eq!(result.risk, Risk::Unknown);
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(
            result.recommendation,
            "Insufficient data to apply CPIC rule for CYP2C9."
        );
        assert!(result.rsids.is_empty());
        assert_eq!(result.clinical_trace.cpic_rule_applied, "No");

        // Other genes are still reported for auditing
        assert!(result.parsed_genes.contains_key(&Gene::Cyp2d6));
    }

    #[test]
    fn test_single_star_allele() {
        let bytes = vcf(&[data_line("rs4244285", "GENE=CYP2C19;STAR=*2")]);
        let result = analyze(&bytes, "patient.vcf", "clopidogrel").unwrap();

        assert_eq!(result.diplotype, "Unknown");
        assert_eq!(result.phenotype, Phenotype::Unknown);
        assert_eq!(result.risk, Risk::Unknown);
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.confidence_score, 0.4);
    }

    #[test]
    fn test_rsids_without_star_alleles() {
        let bytes = vcf(&[
            data_line("rs3892097", "GENE=CYP2D6"),
            data_line(".", "GENE=CYP2D6;DBSNP=rs16947"),
        ]);
        let result = analyze(&bytes, "patient.vcf", "Codeine").unwrap();

        assert!(result.quality_metrics.gene_detected);
        assert_eq!(result.diplotype, "Unknown");
        assert_eq!(result.phenotype, Phenotype::Unknown);
        assert_eq!(result.confidence_score, 0.4);
        assert_eq!(result.rsids, vec!["rs3892097", "rs16947"]);
    }

    #[test]
    fn test_later_alleles_do_not_change_diplotype() {
        let bytes = vcf(&[
            data_line("rs3892097", "GENE=CYP2D6;STAR=*4"),
            data_line("rs1065852", "GENE=CYP2D6;STAR=*1"),
            data_line("rs16947", "GENE=CYP2D6;STAR=*2"),
        ]);
        let result = analyze(&bytes, "patient.vcf", "codeine").unwrap();

        assert_eq!(result.diplotype, "*1/*4");
        assert_eq!(result.phenotype, Phenotype::Intermediate);
        assert_eq!(result.parsed_genes[&Gene::Cyp2d6].stars, vec!["*4", "*1", "*2"]);
    }

    #[test]
    fn test_intermediate_rule_for_every_drug() {
        let cases = [
            (Drug::Codeine, "CYP2D6", "*4"),
            (Drug::Clopidogrel, "CYP2C19", "*2"),
            (Drug::Warfarin, "CYP2C9", "*3"),
        ];

        for (drug, gene, variant_star) in cases {
            let bytes = vcf(&[
                data_line("rs1", &format!("GENE={};STAR={}", gene, variant_star)),
                data_line("rs2", &format!("GENE={};STAR=*1", gene)),
            ]);
            let result = analyze(&bytes, "p.vcf", drug.as_str()).unwrap();

            assert_eq!(result.phenotype, Phenotype::Intermediate);
            assert_eq!(result.risk, Risk::AdjustDosage);
            assert_eq!(result.confidence_score, 1.0);
        }
    }

    #[test]
    fn test_every_tabled_diplotype_scores_full_confidence() {
        let cases = [
            (Drug::Codeine, ["*1", "*1"], Phenotype::Normal),
            (Drug::Codeine, ["*4", "*4"], Phenotype::Poor),
            (Drug::Clopidogrel, ["*1", "*1"], Phenotype::Normal),
            (Drug::Clopidogrel, ["*2", "*2"], Phenotype::Poor),
            (Drug::Warfarin, ["*1", "*1"], Phenotype::Normal),
            (Drug::Warfarin, ["*3", "*3"], Phenotype::Poor),
        ];

        for (drug, stars, expected) in cases {
            // Homozygous records cannot come out of the extractor, which
            // de-duplicates tokens, so build them directly.
            let mut genes = BTreeMap::new();
            genes.insert(
                drug.required_gene(),
                GeneRecord {
                    stars: stars.iter().map(|s| s.to_string()).collect(),
                    rsids: Vec::new(),
                },
            );
            let parsed = ParsedFile {
                patient_id: "p".to_string(),
                genes,
                parse_succeeded: true,
            };

            let result = evaluate(&parsed, drug);
            let rule = crate::catalog::rule_for(drug, expected).unwrap();

            assert_eq!(result.phenotype, expected);
            assert_eq!(result.risk, rule.risk);
            assert_eq!(result.recommendation, rule.recommendation);
            assert_eq!(result.confidence_score, 1.0);
        }
    }

    #[test]
    fn test_undecodable_bytes_degrade_gracefully() {
        let result = analyze(&[0xff, 0xfe, 0xfd], "uploads/patient42.vcf", "codeine").unwrap();

        assert!(!result.quality_metrics.vcf_parsing_success);
        assert_eq!(result.patient_id, "patient42");
        assert!(result.parsed_genes.is_empty());
        assert_eq!(result.risk, Risk::Unknown);
        assert_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn test_fallback_patient_id() {
        assert_eq!(fallback_patient_id("uploads/p01.vcf"), "p01");
        assert_eq!(fallback_patient_id("p01.final.vcf"), "p01.final");
        assert_eq!(fallback_patient_id(""), "Unknown");

        let bytes = vcf(&[]);
        let text = String::from_utf8(bytes).unwrap().replace("##SAMPLE=<ID=PATIENT_001>\n", "");
        let headerless = text.replace("\tFORMAT\tPATIENT_001", "");
        let result = analyze(headerless.as_bytes(), "sample_17.vcf", "codeine").unwrap();
        assert_eq!(result.patient_id, "sample_17");
    }

    #[test]
    fn test_cr_only_file_is_analyzed() {
        let text = String::from_utf8(cyp2d6_star1_star4()).unwrap().replace('\n', "\r");
        let result = analyze(text.as_bytes(), "patient.vcf", "codeine").unwrap();

        assert_eq!(result.patient_id, "PATIENT_001");
        assert_eq!(result.diplotype, "*1/*4");
        assert_eq!(result.risk, Risk::AdjustDosage);
        assert_eq!(result.confidence_score, 1.0);
    }

    #[test]
    fn test_unsupported_drug_keeps_name_as_typed() {
        let err = analyze_many(&cyp2d6_star1_star4(), "patient.vcf", &["codeine", "  Aspirin "])
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnsupportedDrug {
                requested: "  Aspirin ".to_string(),
                supported: Drug::ALL.to_vec(),
            }
        );
    }

    #[test]
    fn test_idempotent() {
        let bytes = cyp2d6_star1_star4();
        let first = analyze(&bytes, "patient.vcf", "codeine").unwrap();
        let second = analyze(&bytes, "patient.vcf", "codeine").unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_analyze_many_keeps_request_order() {
        let bytes = vcf(&[
            data_line("rs1065852", "GENE=CYP2D6;STAR=*1"),
            data_line("rs3892097", "GENE=CYP2D6;STAR=*4"),
            data_line("rs4244285", "GENE=CYP2C19;STAR=*2"),
        ]);

        let results = analyze_many(&bytes, "p.vcf", &["warfarin", "codeine", "clopidogrel"]).unwrap();
        let drugs: Vec<Drug> = results.iter().map(|r| r.drug).collect();
        assert_eq!(drugs, vec![Drug::Warfarin, Drug::Codeine, Drug::Clopidogrel]);
        assert_eq!(results[1].risk, Risk::AdjustDosage);
        assert_eq!(results[2].confidence_score, 0.4);
    }

    #[test]
    fn test_analyze_many_rejects_any_unsupported_drug() {
        let err = analyze_many(&cyp2d6_star1_star4(), "p.vcf", &["codeine", "tramadol"]).unwrap_err();
        match err {
            AnalysisError::UnsupportedDrug { requested, .. } => assert_eq!(requested, "tramadol"),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let result = analyze(&cyp2d6_star1_star4(), "patient.vcf", "codeine").unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["drug"], "CODEINE");
        assert_eq!(json["gene"], "CYP2D6");
        assert_eq!(json["phenotype"], "IM");
        assert_eq!(json["risk"], "Adjust Dosage");
        assert_eq!(json["severity"], "moderate");
        assert_eq!(json["parsed_genes"]["CYP2D6"]["stars"][1], "*4");
        assert_eq!(json["clinical_trace"]["cpic_rule_applied"], "Yes");
        assert_eq!(json["quality_metrics"]["confidence_score"], 1.0);
    }
}

// ==============================================================================
// parsers/vcf.rs - Pharmacogene Marker Extractor
// ==============================================================================
// Description: Lenient text scanner pulling gene, star-allele and rsID markers
//              out of annotated VCF lines
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Only the fields needed for gene / allele / rsID extraction are read. Lines are
// matched as text rather than parsed into typed VCF records because the gene
// and star-allele annotations arrive in many different INFO layouts.
//
// Example:
//   ##SAMPLE=<ID=PATIENT_001,Description="...">
//   #CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO  FORMAT  PATIENT_001
//   22  42130692  rs3892097  C  T  .  PASS  GENE=CYP2D6;STAR=*4  GT  0/1
// ==============================================================================

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::catalog::Gene;
use crate::models::{GeneRecord, ParsedFile};

/// Minimum tab-separated columns for a data line (CHROM .. INFO)
pub const MIN_DATA_COLUMNS: usize = 8;

/// INFO attribute names that may carry a gene symbol, tried in order
pub const GENE_ATTRIBUTES: [&str; 4] = ["GENE", "SYMBOL", "GENE_NAME", "HGNC"];

fn sample_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ID=([^,>]+)").expect("valid sample ID regex"))
}

fn rsid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\brs\d+\b").expect("valid rsID regex"))
}

fn star_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\*[0-9a-z]+(?:x\d+)?").expect("valid star allele regex"))
}

fn attribute_regexes() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        GENE_ATTRIBUTES
            .iter()
            .map(|field| Regex::new(&format!("{}=([^;]+)", field)).expect("valid attribute regex"))
            .collect()
    })
}

/// One way of finding a supported gene in an upper-cased line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneStrategy {
    /// `GENE=`, `SYMBOL=`, `GENE_NAME=` or `HGNC=` attribute whose value is supported
    Attribute,
    /// Any supported symbol appearing anywhere in the text
    SymbolScan,
}

impl GeneStrategy {
    pub fn detect(&self, upper_text: &str) -> Option<Gene> {
        match self {
            GeneStrategy::Attribute => attribute_regexes().iter().find_map(|re| {
                let captured = re.captures(upper_text)?.get(1)?.as_str();
                // Multi-valued attributes ("CYP2D6,CYP2D7") use the first entry
                let value = captured.split(',').next().unwrap_or_default().trim();
                Gene::from_symbol(value)
            }),
            GeneStrategy::SymbolScan => Gene::ALL
                .into_iter()
                .find(|gene| upper_text.contains(gene.as_str())),
        }
    }
}

/// Scanner that accumulates per-gene markers from VCF text
pub struct VariantExtractor {
    /// Gene detection strategies, first hit wins
    pub strategies: Vec<GeneStrategy>,

    /// Non-comment lines seen (for reporting)
    pub data_lines: usize,

    /// Lines with fewer than 8 columns (for reporting)
    pub short_lines: usize,

    /// Lines where no supported gene was found (for reporting)
    pub unmatched_lines: usize,
}

impl Default for VariantExtractor {
    fn default() -> Self {
        Self {
            strategies: vec![GeneStrategy::Attribute, GeneStrategy::SymbolScan],
            data_lines: 0,
            short_lines: 0,
            unmatched_lines: 0,
        }
    }
}

impl VariantExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gene detection strategies
    pub fn with_strategies(mut self, strategies: Vec<GeneStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Scan decoded file text
    ///
    /// # Arguments
    /// * `text` - Whole file contents
    /// * `fallback_id` - Patient ID used when the text names no sample
    ///
    /// Malformed lines are skipped, never reported as errors.
    pub fn parse(&mut self, text: &str, fallback_id: &str) -> ParsedFile {
        self.data_lines = 0;
        self.short_lines = 0;
        self.unmatched_lines = 0;

        let lines = split_lines(text);
        let patient_id = extract_patient_id(&lines, fallback_id);
        let mut genes: BTreeMap<Gene, GeneRecord> = BTreeMap::new();

        for line in &lines {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.data_lines += 1;

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < MIN_DATA_COLUMNS {
                self.short_lines += 1;
                continue;
            }

            let rsid = extract_rsid(line, columns[2].trim());
            let combined = format!("{};{}", line, columns[7].trim());

            let Some(gene) = self.detect_gene(&combined.to_uppercase()) else {
                self.unmatched_lines += 1;
                continue;
            };

            let record = genes.entry(gene).or_default();
            for star in extract_stars(&combined) {
                record.add_star(star);
            }
            if let Some(rsid) = rsid {
                record.add_rsid(rsid);
            }
        }

        debug!(
            "Extracted {} gene(s) for {}: {} data lines, {} short, {} without supported gene",
            genes.len(),
            patient_id,
            self.data_lines,
            self.short_lines,
            self.unmatched_lines
        );

        ParsedFile {
            patient_id,
            genes,
            parse_succeeded: true,
        }
    }

    fn detect_gene(&self, upper_text: &str) -> Option<Gene> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.detect(upper_text))
    }
}

/// Split text into lines
///
/// `\r\n`, bare `\r` and `\n` all end a line, as do `\x0b`, `\x0c`,
/// `\x1c`-`\x1e`, `\u{85}`, `\u{2028}` and `\u{2029}`. A trailing break does
/// not produce an empty final line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Resolve the patient ID: `##SAMPLE=<ID=...>`, then the first sample column
/// of the `#CHROM` header, then the fallback
pub fn extract_patient_id(lines: &[&str], fallback_id: &str) -> String {
    let from_sample_meta = lines
        .iter()
        .filter(|line| line.starts_with("##SAMPLE="))
        .find_map(|line| sample_id_regex().captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    if let Some(id) = from_sample_meta {
        return id;
    }

    let from_header = lines
        .iter()
        .filter(|line| line.starts_with("#CHROM"))
        .find_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            match parts.get(9).map(|p| p.trim()) {
                Some(sample) if !sample.is_empty() => Some(sample.to_string()),
                _ => None,
            }
        });

    from_header.unwrap_or_else(|| fallback_id.to_string())
}

/// rsID from the ID column when it already is one, else the first `rs<digits>`
/// token anywhere in the line (lower-cased)
pub fn extract_rsid(line: &str, id_column: &str) -> Option<String> {
    if id_column.starts_with("rs") {
        return Some(id_column.to_string());
    }
    rsid_regex()
        .find(line)
        .map(|m| m.as_str().to_lowercase())
}

/// All star-allele tokens in `text`, upper-cased and de-duplicated in order
pub fn extract_stars(text: &str) -> Vec<String> {
    let mut stars: Vec<String> = Vec::new();
    for m in star_regex().find_iter(text) {
        let star = m.as_str().to_uppercase();
        if !stars.contains(&star) {
            stars.push(star);
        }
    }
    stars
}

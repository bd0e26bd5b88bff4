// ==============================================================================
// lib.rs - Pharmacogenomics Engine Library
// ==============================================================================
// Description: Drug-gene risk classification from VCF text
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-19
// Version: 2.0.0
// ==============================================================================
// Core (pure, synchronous): catalog, parsers, diplotype, resolver, scoring,
// processor. Caller-side layers: validator, explain, output, audit.
// ==============================================================================

pub mod audit;
pub mod catalog;
pub mod diplotype;
pub mod explain;
pub mod models;
pub mod output;
pub mod parsers;
pub mod processor;
pub mod resolver;
pub mod scoring;
pub mod validator;

pub use catalog::{Drug, Gene, Phenotype, Risk, Severity};
pub use models::{AnalysisResult, ClinicalTrace, GeneRecord, ParsedFile, QualityMetrics};
pub use processor::{analyze, analyze_many, AnalysisError};

// ==============================================================================
// main.rs - Pharmacogenomic Analysis CLI
// ==============================================================================
// Description: Validate a VCF file, classify drug-gene risk, print the report
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-19
// Version: 2.0.0
// ==============================================================================
// Results go to stdout; logs and audit events go to stderr.
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgx_engine::audit::{self, AuditEventType};
use pgx_engine::explain;
use pgx_engine::output::{self, OutputFormat, ReportEntry};
use pgx_engine::processor;
use pgx_engine::validator::{FileValidator, DEFAULT_MAX_FILE_SIZE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// VCF file to analyze (.vcf or .vcf.gz)
    #[arg(short, long)]
    input: PathBuf,

    /// Drug to evaluate (repeat for several)
    #[arg(short, long = "drug", required = true)]
    drugs: Vec<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Request a natural-language explanation for each result
    #[arg(long)]
    explain: bool,

    /// Uploads must be smaller than this many bytes
    #[arg(long, env = "PGX_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgx_engine=info,pgx_analyze=info,audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    info!("Analyzing {:?} for {} drug(s)", args.input, args.drugs.len());

    let validator = FileValidator::new().with_max_file_size(args.max_file_size);
    let resource = Some(args.input.display().to_string());

    // Blank and over-long names are rejected here; the engine sees the names as typed
    for drug in &args.drugs {
        validator.validate_drug_name(drug).context("Invalid drug name")?;
    }

    // Validate upload
    let file = match validator.validate_path(&args.input) {
        Ok(file) => file,
        Err(e) => {
            audit::log_event(
                AuditEventType::FileRejected,
                resource,
                serde_json::json!({ "error": e.to_string() }),
            );
            return Err(e).with_context(|| format!("Rejected input file {:?}", args.input));
        }
    };

    audit::log_event(
        AuditEventType::FileValidated,
        resource.clone(),
        serde_json::json!({
            "safe_name": file.safe_name,
            "size": file.size,
            "compressed": file.compressed,
            "sha256": file.hash_sha256,
            "validated_at": file.validated_at,
        }),
    );

    // Run the engine
    let results = match processor::analyze_many(&file.content, &file.original_name, &args.drugs) {
        Ok(results) => results,
        Err(e) => {
            warn!("{}", e);
            audit::log_event(
                AuditEventType::AnalysisRejected,
                resource,
                serde_json::json!({ "error": e.to_string(), "drugs": args.drugs }),
            );
            return Err(e.into());
        }
    };

    for result in &results {
        audit::log_event(
            AuditEventType::AnalysisCompleted,
            resource.clone(),
            serde_json::json!({
                "sha256": file.hash_sha256,
                "drug": result.drug,
                "gene": result.gene,
                "risk": result.risk,
                "confidence_score": result.confidence_score,
            }),
        );
    }

    let mut entries: Vec<ReportEntry> = results.into_iter().map(ReportEntry::new).collect();

    if args.explain {
        let generator = explain::from_env();
        for entry in entries.iter_mut() {
            audit::log_event(
                AuditEventType::ExplanationRequested,
                resource.clone(),
                serde_json::json!({
                    "drug": entry.result.drug,
                    "gene": entry.result.gene,
                }),
            );
            entry.explanation = Some(explain::explain_result(generator.as_ref(), &entry.result).await);
        }
    }

    let report = output::render(&entries, args.format)?;
    println!("{}", report.trim_end());

    Ok(())
}

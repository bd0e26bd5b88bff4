// ==============================================================================
// validator.rs - Input File Validation
// ==============================================================================
// Description: Validates uploaded VCF files and drug names before analysis
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-19
// Version: 2.0.0
// Security: Allowlist-only extensions, gzip magic number verification,
//           size limits enforced before and after decompression
// ==============================================================================

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Uploads must be strictly smaller than this (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Longest accepted drug name
pub const MAX_DRUG_NAME_LEN: usize = 255;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("File extension must be .vcf (got {0})")]
    InvalidExtension(String),

    #[error("File size must be less than {max} bytes (got {size})")]
    FileTooLarge { size: usize, max: usize },

    #[error("File is empty")]
    EmptyFile,

    #[error("Magic number mismatch for .vcf.gz file")]
    NotGzip,

    #[error("Failed to decompress {name}: {source}")]
    Decompression {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Drug name cannot be empty.")]
    EmptyDrugName,

    #[error("Drug name exceeds 255 characters")]
    DrugNameTooLong,

    #[error("Invalid filename after sanitization")]
    InvalidFileName,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An upload that passed validation, decompressed and ready for analysis
#[derive(Debug)]
pub struct ValidatedFile {
    pub original_name: String,
    pub safe_name: String,
    pub compressed: bool,
    /// Size as uploaded (before decompression)
    pub size: usize,
    pub hash_sha256: String,
    /// Plain VCF bytes
    pub content: Vec<u8>,
    pub validated_at: DateTime<Utc>,
}

pub struct FileValidator {
    max_file_size: usize,
}

impl FileValidator {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max: usize) -> Self {
        self.max_file_size = max;
        self
    }

    /// Read and validate a file from disk
    ///
    /// The size is checked from metadata before anything is read.
    pub fn validate_path(&self, path: &Path) -> Result<ValidatedFile, ValidationError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or(ValidationError::InvalidFileName)?;

        let size = std::fs::metadata(path)?.len() as usize;
        self.check_size(size)?;

        let bytes = std::fs::read(path)?;
        self.validate_upload(&file_name, bytes)
    }

    /// Validate an in-memory upload
    pub fn validate_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ValidatedFile, ValidationError> {
        info!("Validating file: {}", file_name);

        // 1. Size check
        self.check_size(bytes.len())?;
        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        debug!("Size check passed: {} bytes", bytes.len());

        // 2. Filename sanitization
        let safe_name = sanitize_filename(file_name)?;
        debug!("Sanitized filename: {}", safe_name);

        // 3. Extension check (allowlist)
        let compressed = match get_extension(&safe_name).as_str() {
            "vcf" => false,
            "vcf.gz" => true,
            other => return Err(ValidationError::InvalidExtension(other.to_string())),
        };

        // 4. SHA-256 of the bytes as uploaded
        let hash_sha256 = compute_sha256(&bytes);
        debug!("SHA-256: {}", hash_sha256);

        // 5. Magic number verification and decompression
        let size = bytes.len();
        let content = if compressed {
            if !bytes.starts_with(&GZIP_MAGIC) {
                return Err(ValidationError::NotGzip);
            }
            self.decompress(file_name, &bytes)?
        } else {
            bytes
        };

        Ok(ValidatedFile {
            original_name: file_name.to_string(),
            safe_name,
            compressed,
            size,
            hash_sha256,
            content,
            validated_at: Utc::now(),
        })
    }

    /// Trim a drug name and reject blank or oversized values
    pub fn validate_drug_name(&self, drug_name: &str) -> Result<String, ValidationError> {
        let trimmed = drug_name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyDrugName);
        }
        if trimmed.chars().count() > MAX_DRUG_NAME_LEN {
            return Err(ValidationError::DrugNameTooLong);
        }
        Ok(trimmed.to_string())
    }

    fn check_size(&self, size: usize) -> Result<(), ValidationError> {
        if size >= self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Inflate a gzip upload, applying the same size limit to the output
    fn decompress(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<u8>, ValidationError> {
        let mut content = Vec::new();
        GzDecoder::new(bytes)
            .take(self.max_file_size as u64)
            .read_to_end(&mut content)
            .map_err(|source| ValidationError::Decompression {
                name: file_name.to_string(),
                source,
            })?;

        self.check_size(content.len())?;
        Ok(content)
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_filename(name: &str) -> Result<String, ValidationError> {
    // Remove path separators, null bytes, control characters
    let safe = name
        .replace(['/', '\\', '\0'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.' || *c == '-')
        .collect::<String>();

    // Limit length to 255 characters
    let truncated: String = safe.chars().take(255).collect();

    if truncated.is_empty() {
        return Err(ValidationError::InvalidFileName);
    }

    Ok(truncated)
}

fn get_extension(filename: &str) -> String {
    let lower = filename.to_lowercase();

    // Handle compound extension .vcf.gz
    if lower.ends_with(".vcf.gz") {
        return "vcf.gz".to_string();
    }

    match lower.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

fn compute_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ==============================================================================
// validator.rs - VCF Upload Validation (API Gateway)
// ==============================================================================
// Description: Checks uploaded variant files before they reach the parser
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// Security: Size limit, filename sanitization, gzip magic number check
// ==============================================================================

use anyhow::{bail, Result};
use axum::body::Bytes;
use pgx_processor::Compression;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Maximum accepted VCF upload (50 MiB)
pub const MAX_VCF_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Maximum decoded VCF text for a compressed upload
pub const MAX_DECOMPRESSED_SIZE: u64 = 4 * MAX_VCF_FILE_SIZE as u64;

const MAX_FILENAME_LEN: usize = 255;

/// gzip and BGZF share the gzip member header
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An upload that passed validation, with its audit details
#[derive(Debug)]
pub struct ValidatedFile {
    pub original_name: String,
    pub safe_name: String,
    pub compression: Compression,
    pub size: usize,
    pub hash_sha256: String,
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    max_size: usize,
    max_decompressed_size: u64,
}

impl FileValidator {
    pub fn new() -> Self {
        Self::with_max_size(MAX_VCF_FILE_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            max_decompressed_size: MAX_DECOMPRESSED_SIZE,
        }
    }

    pub fn with_max_decompressed_size(mut self, limit: u64) -> Self {
        self.max_decompressed_size = limit;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_decompressed_size(&self) -> u64 {
        self.max_decompressed_size
    }

    /// Validate a `vcf_file` upload. Empty content passes through so the
    /// parser reports it.
    pub fn validate_upload(&self, filename: &str, file_data: &Bytes) -> Result<ValidatedFile> {
        let size = file_data.len();
        if size > self.max_size {
            bail!("File too large: {} bytes (max: {} bytes)", size, self.max_size);
        }

        let safe_name = sanitize_filename(filename)?;
        if safe_name != filename {
            debug!("Upload name {:?} sanitized to {}", filename, safe_name);
        }

        // Compression comes from the suffix; the magic number must agree
        let compression = Compression::from_filename(&safe_name);
        if compression.is_compressed() && !file_data.is_empty() && !file_data.starts_with(&GZIP_MAGIC) {
            bail!("{} is not gzip/BGZF compressed (magic number mismatch)", safe_name);
        }

        Ok(ValidatedFile {
            original_name: filename.to_string(),
            safe_name,
            compression,
            size,
            hash_sha256: sha256_hex(file_data),
        })
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce an upload name to its last path component, limited to `[A-Za-z0-9._-]`
fn sanitize_filename(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let safe: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(MAX_FILENAME_LEN)
        .collect();

    match safe.chars().next() {
        None => bail!("Invalid filename after sanitization"),
        Some('.') => bail!("Filename cannot start with '.'"),
        Some(_) => Ok(safe),
    }
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("patient_001.vcf.gz").unwrap(), "patient_001.vcf.gz");
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\uploads\\My Sample.vcf").unwrap(), "MySample.vcf");
        assert!(sanitize_filename(".hidden.vcf").is_err());
        assert!(sanitize_filename("uploads/..").is_err());
        assert!(sanitize_filename("***").is_err());
        assert_eq!(sanitize_filename(&"a".repeat(300)).unwrap().len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_compression_detection() {
        let validator = FileValidator::new();
        let gz = Bytes::from_static(&[0x1f, 0x8b, 0x08, 0x00]);

        let plain = validator
            .validate_upload("sample.vcf", &Bytes::from_static(b"##fileformat=VCFv4.2\n"))
            .unwrap();
        assert_eq!(plain.compression, Compression::None);

        assert_eq!(
            validator.validate_upload("sample.vcf.gz", &gz).unwrap().compression,
            Compression::Gzip
        );
        assert_eq!(
            validator.validate_upload("sample.VCF.BGZ", &gz).unwrap().compression,
            Compression::Bgzf
        );
    }

    #[test]
    fn test_magic_number_mismatch() {
        let validator = FileValidator::new();
        let result = validator.validate_upload("sample.vcf.gz", &Bytes::from_static(b"##fileformat"));

        assert!(result.unwrap_err().to_string().contains("magic number"));
    }

    #[test]
    fn test_empty_upload_passes_to_parser() {
        let validator = FileValidator::new();
        let validated = validator.validate_upload("empty.vcf.gz", &Bytes::new()).unwrap();

        assert_eq!(validated.size, 0);
    }

    #[test]
    fn test_size_limits() {
        let validator = FileValidator::with_max_size(16);
        let result = validator.validate_upload("big.vcf", &Bytes::from(vec![b'#'; 17]));

        assert!(result.unwrap_err().to_string().contains("too large"));
        assert!(validator.validate_upload("ok.vcf", &Bytes::from(vec![b'#'; 16])).is_ok());

        assert_eq!(FileValidator::new().max_decompressed_size(), MAX_DECOMPRESSED_SIZE);
        assert_eq!(validator.with_max_decompressed_size(64).max_decompressed_size(), 64);
    }

    #[test]
    fn test_audit_details() {
        let validator = FileValidator::new();
        let validated = validator
            .validate_upload("../abc.vcf", &Bytes::from_static(b"abc"))
            .unwrap();

        assert_eq!(
            validated.hash_sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(validated.original_name, "../abc.vcf");
        assert_eq!(validated.safe_name, "abc.vcf");
        assert_eq!(validated.size, 3);
    }
}

// ==============================================================================
// handlers.rs - API Request Handlers
// ==============================================================================
// Description: HTTP request handlers for the pharmacogenomic API endpoints
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use pgx_processor::{parse_drug_list, AnalysisError, AnalysisResult, Analyzer, VcfParseError, VcfParser};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{models::*, state::AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Pharmacogenomic Risk API",
        version: VERSION,
        endpoints: vec![
            "/health - Health check",
            "/drugs - Drugs covered by the knowledge base (GET)",
            "/genes - Genes covered by the knowledge base (GET)",
            "/analyze - Analyze a VCF against a drug list (POST multipart: vcf_file, drugs, sample)",
        ],
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        timestamp: Utc::now(),
    })
}

pub async fn list_drugs(State(state): State<AppState>) -> Json<DrugsResponse> {
    Json(DrugsResponse {
        drugs: state.knowledge_base().drugs().to_vec(),
    })
}

pub async fn list_genes(State(state): State<AppState>) -> Json<GenesResponse> {
    Json(GenesResponse {
        genes: state.knowledge_base().genes().to_vec(),
    })
}

/// Analyze endpoint (multipart upload: vcf_file, drugs, optional sample)
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    info!("Received analysis request");

    let mut upload: Option<(String, Bytes)> = None;
    let mut drugs_raw: Option<String> = None;
    let mut sample: Option<String> = None;

    // Process multipart form fields
    while let Some(field) = multipart.next_field().await.map_err(AppError::from_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "vcf_file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(AppError::from_multipart)?;
                upload = Some((filename, data));
            }
            "drugs" => {
                drugs_raw = Some(field.text().await.map_err(AppError::from_multipart)?);
            }
            "sample" => {
                sample = Some(field.text().await.map_err(AppError::from_multipart)?);
            }
            other => {
                debug!("Ignoring unknown form field: {}", other);
            }
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'vcf_file' in form data".to_string()))?;
    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("Empty VCF file".to_string()));
    }

    let drugs = parse_drug_list(drugs_raw.as_deref().unwrap_or(""));
    if drugs.is_empty() {
        return Err(AppError::BadRequest(
            "Missing 'drugs' parameter (comma-separated drug names)".to_string(),
        ));
    }

    let sample = sample
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    // SECURITY: Validate upload before parsing
    let validated = state
        .validator()
        .validate_upload(&filename, &data)
        .map_err(|e| AppError::BadRequest(format!("Invalid VCF file: {}", e)))?;

    info!(
        file = %validated.safe_name,
        sha256 = %validated.hash_sha256,
        "Accepted upload {:?} ({} bytes, {:?})",
        validated.original_name,
        validated.size,
        validated.compression
    );

    // Decompression and parsing are CPU-bound; keep them off the async workers
    let parser = VcfParser::new()
        .with_compression(validated.compression)
        .with_max_decompressed_size(state.validator().max_decompressed_size());
    let (parsed, parse_time_ms) = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let parsed = parser.parse_bytes(&data);
        (parsed, started.elapsed().as_secs_f64() * 1000.0)
    })
    .await
    .map_err(|e| AppError::Internal(format!("VCF parse task failed: {}", e)))?;
    let file = parsed?;

    info!(
        file = %validated.safe_name,
        "Parsed {} samples, {} records in {:.2} ms",
        file.samples.len(),
        file.records.len(),
        parse_time_ms
    );

    let result = Analyzer::new(state.knowledge_base()).analyze(
        &file,
        sample.as_deref(),
        &drugs,
        Some(parse_time_ms),
    )?;

    Ok(Json(result))
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to parse VCF file: {0}")]
    InvalidVcf(#[from] VcfParseError),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!("Upload too large: {}", err.body_text()))
        } else {
            AppError::BadRequest(format!("Failed to read multipart field: {}", err.body_text()))
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NoSample | AnalysisError::SampleNotFound(_) => {
                AppError::BadRequest(err.to_string())
            }
            AnalysisError::Internal(msg) => AppError::Internal(format!("Analysis failed: {}", msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::InvalidVcf(ref err) => {
                warn!("Rejected VCF upload: {}", err);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        self.to_string(),
                        "Ensure the file is a valid VCF (v4.x) file.",
                    ),
                )
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, ErrorResponse::new(msg)),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

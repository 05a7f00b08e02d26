// ==============================================================================
// main.rs - Pharmacogenomic API Gateway Entry Point
// ==============================================================================
// Description: Axum web server exposing VCF drug-risk analysis
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use pgx_processor::KnowledgeBase;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod handlers;
mod models;
mod state;
mod validator;

use config::{CorsOrigins, GatewayConfig, LogFormat};
use state::AppState;
use validator::FileValidator;

/// Room for the non-file form fields and multipart framing
const FORM_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;
    init_tracing(config.log_format);

    info!("Starting Pharmacogenomic API Gateway v{}", env!("CARGO_PKG_VERSION"));

    let knowledge_base = match &config.knowledge_base {
        Some(path) => KnowledgeBase::from_json_path(path)
            .with_context(|| format!("Failed to load knowledge base {}", path.display()))?,
        None => KnowledgeBase::cpic(),
    };
    info!(
        "Knowledge base ready: {} drugs, {} genes",
        knowledge_base.drugs().len(),
        knowledge_base.genes().len()
    );

    let validator = FileValidator::new().with_max_decompressed_size(config.max_decompressed_size);
    let state = AppState::with_validator(knowledge_base, validator);
    let app = build_router(state, &config.cors_origins);

    // Bind server
    let addr = config.socket_addr();
    info!("API Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pgx_api_gateway=info,pgx_processor=info,tower_http=info".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .init(),
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    match origins {
        CorsOrigins::Any => cors.allow_origin(Any),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }
}

fn build_router(state: AppState, cors_origins: &CorsOrigins) -> Router {
    let body_limit = state.validator().max_size() + FORM_OVERHEAD;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/drugs", get(handlers::list_drugs))
        .route("/genes", get(handlers::list_genes))
        .route("/analyze", post(handlers::analyze))
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins))
                // Oversized uploads fail with 413 before parsing
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use flate2::write::GzEncoder;
    use serde_json::Value;
    use std::io::Write;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pgx-test-boundary";

    const CODEINE_PM: &str = "##fileformat=VCFv4.2\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT_001\tPATIENT_002\n\
        22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\tGT\t1/1\t0/0\n";

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_request(parts: &[Part]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"vcf_file\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn router() -> Router {
        build_router(AppState::mock(), &CorsOrigins::Any)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(router(), get_request("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_discovery_endpoints() {
        let (status, json) = send(router(), get_request("/drugs")).await;
        assert_eq!(status, StatusCode::OK);
        let drugs = json["drugs"].as_array().unwrap();
        assert_eq!(drugs.len(), 16);
        assert_eq!(drugs[0], "atorvastatin");
        assert!(drugs.contains(&Value::from("codeine")));

        let (status, json) = send(router(), get_request("/genes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["genes"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_analyze_codeine_poor_metabolizer() {
        let request = multipart_request(&[
            Part::File("patient.vcf", CODEINE_PM.as_bytes()),
            Part::Text("drugs", "codeine, aspirin"),
        ]);
        let (status, json) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sample_id"], "PATIENT_001");
        let codeine = &json["results"][0];
        assert_eq!(codeine["gene"], "CYP2D6");
        assert_eq!(codeine["phenotype"], "Poor Metabolizer");
        assert_eq!(codeine["risk"], "Ineffective");
        assert!(codeine["recommendation"].as_str().unwrap().contains("AVOID codeine"));

        let aspirin = &json["results"][1];
        assert_eq!(aspirin["risk"], "Unknown");
        assert_eq!(aspirin["warnings"][0]["code"], "unknown_drug");
        assert!(json["parse_time_ms"].as_f64().is_some());
    }

    #[tokio::test]
    async fn test_analyze_selected_sample_gzip() {
        let compressed = gzip(CODEINE_PM.as_bytes());

        let request = multipart_request(&[
            Part::Text("drugs", "Codeine"),
            Part::Text("sample", "PATIENT_002"),
            Part::File("patient.vcf.gz", &compressed),
        ]);
        let (status, json) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sample_id"], "PATIENT_002");
        assert_eq!(json["results"][0]["phenotype"], "Normal Metabolizer");
        assert_eq!(json["results"][0]["risk"], "Safe");
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn test_plain_gzip_named_bgz() {
        let compressed = gzip(CODEINE_PM.as_bytes());
        let request = multipart_request(&[
            Part::File("patient.vcf.bgz", &compressed),
            Part::Text("drugs", "codeine"),
        ]);
        let (status, json) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["results"][0]["risk"], "Ineffective");
    }

    #[tokio::test]
    async fn test_decompressed_size_cap() {
        let validator = FileValidator::new().with_max_decompressed_size(4096);
        let state = AppState::with_validator(KnowledgeBase::cpic(), validator);
        let router = build_router(state, &CorsOrigins::Any);

        // Small on the wire, far larger once inflated
        let mut content = CODEINE_PM.to_string();
        while content.len() < 256 * 1024 {
            content.push_str("22\t42128945\trs3892097\tC\tT\t.\tPASS\t.\tGT\t1/1\t0/0\n");
        }
        let compressed = gzip(content.as_bytes());
        assert!(compressed.len() < 4096);

        let request = multipart_request(&[
            Part::File("patient.vcf.gz", &compressed),
            Part::Text("drugs", "codeine"),
        ]);
        let (status, json) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("exceeds 4096 bytes"));
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_requests() {
        let request = multipart_request(&[Part::Text("drugs", "codeine")]);
        let (status, json) = send(router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("vcf_file"));

        let request = multipart_request(&[
            Part::File("patient.vcf", CODEINE_PM.as_bytes()),
            Part::Text("drugs", " , "),
        ]);
        let (status, json) = send(router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("drugs"));
    }

    #[tokio::test]
    async fn test_empty_file_is_parse_error() {
        let request = multipart_request(&[
            Part::File("patient.vcf", b""),
            Part::Text("drugs", "codeine"),
        ]);
        let (status, json) = send(router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse VCF file"));
        assert!(json["details"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_sample_is_bad_request() {
        let request = multipart_request(&[
            Part::File("patient.vcf", CODEINE_PM.as_bytes()),
            Part::Text("drugs", "codeine"),
            Part::Text("sample", "NOBODY"),
        ]);
        let (status, json) = send(router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("NOBODY"));
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let state = AppState::with_validator(KnowledgeBase::cpic(), FileValidator::with_max_size(1024));
        let router = build_router(state, &CorsOrigins::Any);

        // Over the file limit but within the body limit: rejected by validation
        let data = vec![b'#'; 2048];
        let request = multipart_request(&[
            Part::File("big.vcf", &data),
            Part::Text("drugs", "codeine"),
        ]);
        let (status, json) = send(router.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("too large"));

        // Over the body limit: rejected while reading the form
        let data = vec![b'#'; 1024 + FORM_OVERHEAD + 1];
        let request = multipart_request(&[
            Part::File("huge.vcf", &data),
            Part::Text("drugs", "codeine"),
        ]);
        let (status, _) = send(router, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}

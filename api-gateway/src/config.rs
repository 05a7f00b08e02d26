// ==============================================================================
// config.rs - Gateway Configuration
// ==============================================================================
// Description: Environment-driven settings for the HTTP service
// Author: PGx Processor Maintainers
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::validator::MAX_DECOMPRESSED_SIZE;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Allowed CORS origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origins: CorsOrigins,
    /// Alternative knowledge base JSON; built-in tables when None
    pub knowledge_base: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Cap on decoded VCF text per upload
    pub max_decompressed_size: u64,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .parse()
            .context("HOST must be an IP address")?;

        let port = match var("PORT") {
            Some(port) => port.parse().context("PORT must be a number between 0 and 65535")?,
            None => DEFAULT_PORT,
        };

        let cors_origins = match var("CORS_ALLOWED_ORIGINS") {
            None => CorsOrigins::Any,
            Some(origins) if origins == "*" => CorsOrigins::Any,
            Some(origins) => CorsOrigins::List(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let max_decompressed_size = match var("PGX_MAX_DECOMPRESSED_BYTES") {
            Some(limit) => limit
                .parse()
                .context("PGX_MAX_DECOMPRESSED_BYTES must be a byte count")?,
            None => MAX_DECOMPRESSED_SIZE,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            knowledge_base: var("PGX_KNOWLEDGE_BASE").map(PathBuf::from),
            log_format,
            max_decompressed_size,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

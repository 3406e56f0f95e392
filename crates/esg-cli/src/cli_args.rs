use std::path::PathBuf;

use clap::Parser;
use esg_runtime::SessionRuntimeConfig;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "esg-insight",
    about = "Interactive reviewer client for ESG report generation sessions",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "server-url",
        env = "ESG_SERVER_URL",
        default_value = "ws://localhost:8000/query",
        help = "Websocket endpoint that streams report generation"
    )]
    pub(crate) server_url: String,

    #[arg(
        long = "upload-url",
        env = "ESG_UPLOAD_URL",
        default_value = "http://localhost:8000/upload",
        help = "HTTP endpoint receiving the subject's documents"
    )]
    pub(crate) upload_url: String,

    #[arg(
        long = "company",
        env = "ESG_COMPANY",
        help = "Company to start a session for immediately"
    )]
    pub(crate) company: Option<String>,

    #[arg(
        long = "file",
        env = "ESG_FILES",
        value_delimiter = ',',
        help = "Document to upload with --company; repeat for several files"
    )]
    pub(crate) files: Vec<PathBuf>,

    #[arg(
        long = "request-timeout-ms",
        env = "ESG_REQUEST_TIMEOUT_MS",
        default_value_t = 120_000,
        value_parser = parse_positive_u64,
        help = "Timeout for one document upload request"
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "ESG_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Upload attempts before giving up on a retryable failure"
    )]
    pub(crate) retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "ESG_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Initial backoff between upload attempts"
    )]
    pub(crate) retry_base_delay_ms: u64,
}

impl Cli {
    pub(crate) fn runtime_config(&self) -> SessionRuntimeConfig {
        SessionRuntimeConfig {
            server_url: self.server_url.trim().to_string(),
            upload_url: self.upload_url.trim().to_string(),
            request_timeout_ms: self.request_timeout_ms,
            retry_max_attempts: self.retry_max_attempts,
            retry_base_delay_ms: self.retry_base_delay_ms,
        }
    }
}

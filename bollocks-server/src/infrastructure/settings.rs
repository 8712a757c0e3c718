use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_ms: u64,
    pub like_toggle_max_attempts: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let storage_backend = parse_storage_backend(
            &std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
        )?;
        let database_url = get_optional("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL is required for the postgres storage backend"));
        }
        let database_max_connections = parse_u64_env("DATABASE_MAX_CONNECTIONS", 10)?;
        let database_max_connections = u32::try_from(database_max_connections)
            .context("DATABASE_MAX_CONNECTIONS is too large")?;

        let jwt_secret = get_required("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }
        let jwt_issuer = get_optional("JWT_ISSUER");
        let jwt_audience = get_optional("JWT_AUDIENCE");

        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        );
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let log_format = parse_log_format(
            &std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;
        let http_request_body_limit_bytes =
            parse_usize_env("HTTP_REQUEST_BODY_LIMIT_BYTES", 64 * 1024)?;
        let http_concurrency_limit = parse_usize_env("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_u64_env("HTTP_REQUEST_TIMEOUT_SECS", 10)?;

        let gemini_api_key = get_optional("GEMINI_API_KEY");
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let gemini_base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        });
        let gemini_timeout_ms = parse_u64_env("GEMINI_TIMEOUT_MS", 3000)?;
        let like_toggle_max_attempts = parse_u64_env("LIKE_TOGGLE_MAX_ATTEMPTS", 10)?;
        let like_toggle_max_attempts = u32::try_from(like_toggle_max_attempts)
            .context("LIKE_TOGGLE_MAX_ATTEMPTS is too large")?;

        Ok(Self {
            storage_backend,
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            http_addr,
            cors_origins,
            log_level,
            log_format,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            gemini_timeout_ms,
            like_toggle_max_attempts,
        })
    }
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn get_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_storage_backend(raw: &str) -> Result<StorageBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "postgres" => Ok(StorageBackend::Postgres),
        "memory" => Ok(StorageBackend::Memory),
        other => Err(anyhow!(
            "STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"
        )),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(anyhow!("LOG_FORMAT must be 'compact' or 'json', got '{other}'")),
    }
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

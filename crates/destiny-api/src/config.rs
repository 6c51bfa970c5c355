//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use destiny_oracle::GeminiConfig;

use crate::error::AppError;

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Sessions persist as JSON files here. In memory when absent.
    pub data_dir: Option<PathBuf>,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Reads `HOST`, `PORT`, `DESTINY_DATA_DIR`, `GEMINI_API_KEY`,
    /// `GEMINI_MODEL`, `GEMINI_BASE_URL` and `ORACLE_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the API key is missing or a number
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };

        let api_key = var("GEMINI_API_KEY").ok_or_else(|| {
            AppError::Config("GEMINI_API_KEY environment variable must be set".to_owned())
        })?;
        let mut gemini = GeminiConfig::new(api_key);
        if let Some(model) = var("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Some(base_url) = var("GEMINI_BASE_URL") {
            gemini.base_url = base_url;
        }
        if let Some(secs) = var("ORACLE_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                AppError::Config(format!("ORACLE_TIMEOUT_SECS must be whole seconds: {e}"))
            })?;
            gemini.request_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            host,
            port,
            data_dir: var("DESTINY_DATA_DIR").map(PathBuf::from),
            gemini,
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unparseable host.
    pub fn bind_address(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use url::Url;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::CsvParser;

/// Where a catalog load reads its CSV from
#[derive(Debug, Clone, PartialEq)]
pub enum CsvSource {
    Url(String),
    Path(PathBuf),
    /// User-supplied file contents
    Bytes(Vec<u8>),
}

impl CsvSource {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn from_location(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            CsvSource::Url(trimmed.to_string())
        } else {
            CsvSource::Path(PathBuf::from(trimmed))
        }
    }

    /// A location sent by a client. Only `http` and `https` URLs are
    /// accepted; file paths are reserved for the configured source.
    pub fn remote(location: &str) -> Result<Self> {
        let trimmed = location.trim();
        let url = Url::parse(trimmed).map_err(|e| {
            AppError::ValidationError(format!("Invalid CSV URL '{}': {}", trimmed, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(CsvSource::Url(url.into())),
            scheme => Err(AppError::ValidationError(format!(
                "Unsupported CSV URL scheme '{}'",
                scheme
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CsvSource::Url(url) => url.clone(),
            CsvSource::Path(path) => path.display().to_string(),
            CsvSource::Bytes(bytes) => format!("upload ({} bytes)", bytes.len()),
        }
    }
}

pub struct CsvSourceLoader {
    client: reqwest::Client,
}

impl Default for CsvSourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvSourceLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Read the source as text. Every failure is `SourceUnavailable`.
    pub async fn read_text(&self, source: &CsvSource) -> Result<String> {
        let bytes = match source {
            CsvSource::Url(url) => self.fetch(url).await?,
            CsvSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                AppError::SourceUnavailable(format!(
                    "Failed to read CSV file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            CsvSource::Bytes(bytes) => bytes.clone(),
        };

        info!(source = %source.describe(), bytes = bytes.len(), "CSV source read");
        Ok(CsvParser::decode_bytes(&bytes))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SourceUnavailable(format!(
                "CSV not found at {} ({})",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("Failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }
}

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Total attempts per asset, first try included.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Awaited after every fetch, success or failure, to stay under
    /// upstream rate limits.
    pub fetch_pause: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            fetch_pause: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    InvalidUrl,
    /// HTTP 403: the resource is categorically inaccessible. Never retried,
    /// in this run or any later one.
    Forbidden,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    Network,
    Io,
}

impl FetchFailure {
    pub fn is_permanent(&self) -> bool {
        matches!(self, FetchFailure::Forbidden)
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::InvalidUrl => write!(f, "invalid url"),
            FetchFailure::Forbidden => write!(f, "forbidden"),
            FetchFailure::HttpStatus(code) => write!(f, "http status {code}"),
            FetchFailure::Timeout => write!(f, "timeout"),
            FetchFailure::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FetchFailure::Network => write!(f, "network error"),
            FetchFailure::Io => write!(f, "io error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FetchFailure,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind.is_permanent()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

/// Single-asset fetch to a destination path whose parent directory
/// already exists.
#[async_trait::async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    settings: DownloadSettings,
}

impl ReqwestDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.redirect_limit,
            ))
            .build()
            .map_err(|err| FetchError::new(FetchFailure::Network, err.to_string()))
    }

    async fn fetch_with_retries(
        &self,
        url: &reqwest::Url,
        destination: &Path,
    ) -> Result<(), FetchError> {
        let client = self.build_client()?;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.attempt(&client, url, destination).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) if attempt >= self.settings.max_attempts.max(1) => return Err(err),
                Err(err) => {
                    log::debug!("retrying {url} after attempt {attempt}: {err}");
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        client: &reqwest::Client,
        url: &reqwest::Url,
        destination: &Path,
    ) -> Result<(), FetchError> {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::new(FetchFailure::Forbidden, status.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                FetchFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        // Stream into a temp file next to the destination; only a fully
        // received body is allowed to land at the final path, so a failed
        // attempt can never satisfy an existence check.
        let dir = destination.parent().ok_or_else(|| {
            FetchError::new(FetchFailure::Io, "destination has no parent directory")
        })?;
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|err| FetchError::new(FetchFailure::Io, err.to_string()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            tmp.write_all(&chunk)
                .map_err(|err| FetchError::new(FetchFailure::Io, err.to_string()))?;
        }
        tmp.flush()
            .map_err(|err| FetchError::new(FetchFailure::Io, err.to_string()))?;
        tmp.as_file_mut()
            .sync_all()
            .map_err(|err| FetchError::new(FetchFailure::Io, err.to_string()))?;

        if destination.exists() {
            fs::remove_file(destination)
                .map_err(|err| FetchError::new(FetchFailure::Io, err.to_string()))?;
        }
        tmp.persist(destination)
            .map_err(|err| FetchError::new(FetchFailure::Io, err.error.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetFetcher for ReqwestDownloader {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FetchFailure::InvalidUrl, err.to_string()));
        let result = match parsed {
            Ok(parsed) => self.fetch_with_retries(&parsed, destination).await,
            Err(err) => Err(err),
        };
        if !self.settings.fetch_pause.is_zero() {
            tokio::time::sleep(self.settings.fetch_pause).await;
        }
        result
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FetchFailure::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FetchFailure::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FetchFailure::Network, err.to_string())
}

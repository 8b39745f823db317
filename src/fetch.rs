use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, USER_AGENT};
use url::Url;

use crate::error::ImportError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("courseimport/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("COURSEIMPORT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().with_context(|| {
                format!("invalid COURSEIMPORT_HTTP_TIMEOUT_SECS={raw:?}. expected whole seconds")
            })?;
            if secs == 0 {
                anyhow::bail!("COURSEIMPORT_HTTP_TIMEOUT_SECS must be greater than zero");
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("COURSEIMPORT_USER_AGENT")
            && !raw.trim().is_empty()
        {
            config.user_agent = raw.trim().to_owned();
        }
        Ok(config)
    }
}

/// Retrieves the raw text behind an export URL.
#[async_trait]
pub trait ExportFetcher: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String, ImportError>;
}

#[derive(Debug, Clone)]
pub struct HttpExportFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpExportFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build export http client")?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl ExportFetcher for HttpExportFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, ImportError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/csv,text/plain;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|err| ImportError::Unknown(format!("GET {url}: {err}")))?;

        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), "export response");
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown Status");
            return Err(ImportError::from_status(status.as_u16(), reason));
        }
        if is_html(response.headers()) {
            // Private sheets answer with a sign-in page instead of an error.
            tracing::debug!(%url, "export answered with html");
            return Err(ImportError::NotAccessible {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| ImportError::Unknown(format!("read export body: {err}")))
    }
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn sign_in_pages_are_detected_by_content_type() {
        assert!(is_html(&headers("text/html; charset=utf-8")));
        assert!(is_html(&headers("TEXT/HTML")));
        assert!(!is_html(&headers("text/csv")));
        assert!(!is_html(&HeaderMap::new()));
    }

    #[test]
    fn default_config_identifies_the_importer() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("courseimport/"));
    }
}

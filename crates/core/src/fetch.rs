//! Content fetching from wiki APIs, files, and stdin.
//!
//! [`MediaWikiClient`] is the network [`WikiSource`]: rendered HTML comes from
//! the REST API, everything else from the action API. Both endpoints are
//! configured as URL templates with a `{domain}` placeholder.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ETAG};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::metadata::Metadata;
use crate::mwapi;
use crate::siteinfo::SiteInfo;
use crate::source::{MobileView, PageRequest, RawDocument, WikiSource};
use crate::{Result, SectioError};

/// HTTP client configuration for the upstream APIs.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// REST API base, `{domain}` is replaced by the request's domain.
    pub rest_template: String,
    /// Action API endpoint, `{domain}` is replaced by the request's domain.
    pub api_template: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: concat!("sectio/", env!("CARGO_PKG_VERSION"), " (mobile-sections service)").to_string(),
            rest_template: "https://{domain}/api/rest_v1".to_string(),
            api_template: "https://{domain}/w/api.php".to_string(),
        }
    }
}

impl FetchConfig {
    /// REST API base URL for a domain.
    pub fn rest_url(&self, domain: &str) -> Result<Url> {
        expand(&self.rest_template, domain)
    }

    /// Action API URL for a domain.
    pub fn api_url(&self, domain: &str) -> Result<Url> {
        expand(&self.api_template, domain)
    }
}

fn expand(template: &str, domain: &str) -> Result<Url> {
    if domain.is_empty() || domain.contains(['/', '?', '#', '@']) {
        return Err(SectioError::InvalidUrl(format!("invalid domain '{domain}'")));
    }
    Url::parse(&template.replace("{domain}", domain)).map_err(|e| SectioError::InvalidUrl(e.to_string()))
}

/// Splits an upstream ETag (`W/"123/abc"`) into revision and tid.
pub fn parse_etag(etag: &str) -> (Option<u64>, Option<String>) {
    let value = etag.trim().trim_start_matches("W/").trim_matches('"');
    let mut parts = value.splitn(2, '/');
    let revision = parts.next().and_then(|rev| rev.parse().ok());
    let tid = parts.next().filter(|tid| !tid.is_empty()).map(str::to_string);
    (revision, tid)
}

/// [`WikiSource`] backed by a wiki's REST and action APIs.
#[derive(Debug, Clone)]
pub struct MediaWikiClient {
    client: Client,
    config: FetchConfig,
}

impl MediaWikiClient {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SectioError::HttpError`] if the TLS backend cannot be initialized.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(SectioError::HttpError)?;
        Ok(Self { client, config })
    }

    fn transport_error(&self, e: reqwest::Error) -> SectioError {
        if e.is_timeout() { SectioError::Timeout { timeout: self.config.timeout } } else { SectioError::HttpError(e) }
    }

    async fn get(&self, url: Url, accept: &str, title: &str) -> Result<reqwest::Response> {
        tracing::debug!(%url, "upstream request");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(SectioError::UpstreamNotFound { title: title.to_string() }),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(SectioError::UpstreamStatus { status: status.as_u16(), detail })
            }
        }
    }

    async fn query(&self, domain: &str, params: &[(&str, String)], title: &str) -> Result<Value> {
        let mut url = self.config.api_url(domain)?;
        url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        let response = self.get(url, "application/json", title).await?;
        response.json::<Value>().await.map_err(|e| self.transport_error(e))
    }
}

#[async_trait]
impl WikiSource for MediaWikiClient {
    async fn fetch_document(&self, request: &PageRequest) -> Result<RawDocument> {
        let mut url = self.config.rest_url(&request.domain)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SectioError::InvalidUrl(self.config.rest_template.clone()))?;
            segments.pop_if_empty().extend(["page", "html", request.title.as_str()]);
            if let Some(revision) = request.revision {
                segments.push(&revision.to_string());
                if let Some(tid) = &request.tid {
                    segments.push(tid);
                }
            }
        }

        let response = self.get(url, "text/html; charset=utf-8", &request.title).await?;
        let (revision, tid) = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(parse_etag)
            .unwrap_or_default();
        let html = response.text().await.map_err(|e| self.transport_error(e))?;

        Ok(RawDocument { html, revision: revision.or(request.revision), tid: tid.or_else(|| request.tid.clone()) })
    }

    async fn fetch_metadata(&self, request: &PageRequest) -> Result<Metadata> {
        let body = self.query(&request.domain, &mwapi::metadata_params(&request.title), &request.title).await?;
        mwapi::parse_metadata(&body, &request.title)
    }

    async fn fetch_siteinfo(&self, domain: &str) -> Result<SiteInfo> {
        let body = self.query(domain, &mwapi::siteinfo_params(), domain).await?;
        mwapi::parse_siteinfo(&body)
    }

    async fn fetch_main_page(&self, request: &PageRequest) -> Result<MobileView> {
        let body = self.query(&request.domain, &mwapi::mobileview_params(&request.title), &request.title).await?;
        mwapi::parse_mobileview(&body, &request.title)
    }

    async fn api_get(&self, domain: &str, params: &[(&str, String)]) -> Result<Value> {
        let body = self.query(domain, params, domain).await?;
        mwapi::check_api_error(&body, domain)?;
        Ok(body)
    }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(SectioError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(SectioError::from)
    }
}

/// Reads HTML content from standard input.
///
/// This function reads all available input from stdin until EOF.
/// Useful for piping Parsoid output from other commands.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(SectioError::from)?;

    Ok(buffer)
}

//! Upstream collaborators.
//!
//! The pipeline never talks HTTP directly: it asks a [`WikiSource`] for the
//! parsed document, the page metadata, the site information and, for main
//! pages, the mobile rendering. [`crate::fetch::MediaWikiClient`] is the
//! network implementation; [`StaticSource`] serves canned payloads for
//! offline runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::metadata::Metadata;
use crate::sections::Section;
use crate::siteinfo::SiteInfo;
use crate::{Result, SectioError};

/// Identifies the page (and optionally the revision) a request is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub domain: String,
    pub title: String,
    pub revision: Option<u64>,
    pub tid: Option<String>,
}

impl PageRequest {
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        Self { domain: domain.into(), title: title.into(), revision: None, tid: None }
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = Some(tid.into());
        self
    }
}

/// A rendered page document together with the revision that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub html: String,
    pub revision: Option<u64>,
    pub tid: Option<String>,
}

impl RawDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into(), revision: None, tid: None }
    }
}

/// The legacy mobile rendering of a page, already cut into sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileView {
    pub revision: Option<u64>,
    pub sections: Vec<Section>,
}

/// The upstream services a request is assembled from.
#[async_trait]
pub trait WikiSource: Send + Sync {
    /// Rendered HTML of the page or revision.
    async fn fetch_document(&self, request: &PageRequest) -> Result<RawDocument>;

    /// Page metadata from the action API.
    async fn fetch_metadata(&self, request: &PageRequest) -> Result<Metadata>;

    /// Site information of the request's wiki.
    async fn fetch_siteinfo(&self, domain: &str) -> Result<SiteInfo>;

    /// Mobile rendering used for main pages.
    async fn fetch_main_page(&self, request: &PageRequest) -> Result<MobileView>;

    /// Generic action API GET returning the decoded body.
    async fn api_get(&self, domain: &str, params: &[(&str, String)]) -> Result<Value>;
}

/// Canned upstream payloads for one page.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    pub document: Option<RawDocument>,
    pub metadata: Option<Metadata>,
    pub main_page: Option<MobileView>,
}

/// A [`WikiSource`] that answers from memory.
///
/// Titles are looked up with underscores folded to spaces. Unknown titles
/// answer `UpstreamNotFound`, titles registered with [`StaticSource::with_failure`]
/// answer `UpstreamStatus`. API calls are recorded and matched against the
/// responses registered with [`StaticSource::with_api_response`]; unmatched
/// calls get an empty object. Calls matching [`StaticSource::with_api_failure`]
/// answer `UpstreamStatus`.
#[derive(Debug, Default)]
pub struct StaticSource {
    siteinfo: SiteInfo,
    pages: HashMap<String, StaticPage>,
    failures: HashMap<String, u16>,
    api_responses: Vec<(String, String, Value)>,
    api_failures: Vec<(String, String, u16)>,
    api_calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_siteinfo(mut self, siteinfo: SiteInfo) -> Self {
        self.siteinfo = siteinfo;
        self
    }

    pub fn with_page(mut self, title: &str, page: StaticPage) -> Self {
        self.pages.insert(key(title), page);
        self
    }

    /// Registers a document and its metadata for `title`.
    pub fn with_document(self, title: &str, document: RawDocument, metadata: Metadata) -> Self {
        self.with_page(title, StaticPage { document: Some(document), metadata: Some(metadata), main_page: None })
    }

    /// Makes every fetch for `title` fail with the given upstream status.
    pub fn with_failure(mut self, title: &str, status: u16) -> Self {
        self.failures.insert(key(title), status);
        self
    }

    /// Answers API calls carrying `param=value` with `response`.
    pub fn with_api_response(mut self, param: &str, value: &str, response: Value) -> Self {
        self.api_responses.push((param.to_string(), value.to_string(), response));
        self
    }

    /// Makes API calls carrying `param=value` fail with the given upstream status.
    pub fn with_api_failure(mut self, param: &str, value: &str, status: u16) -> Self {
        self.api_failures.push((param.to_string(), value.to_string(), status));
        self
    }

    /// Parameters of every API call made so far.
    pub fn api_calls(&self) -> Vec<Vec<(String, String)>> {
        self.api_calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn page(&self, title: &str) -> Result<&StaticPage> {
        let key = key(title);
        if let Some(status) = self.failures.get(&key) {
            return Err(SectioError::UpstreamStatus { status: *status, detail: format!("canned failure for {title}") });
        }
        self.pages.get(&key).ok_or_else(|| SectioError::UpstreamNotFound { title: title.to_string() })
    }
}

fn key(title: &str) -> String {
    title.replace('_', " ").trim().to_string()
}

fn not_found(request: &PageRequest) -> SectioError {
    SectioError::UpstreamNotFound { title: request.title.clone() }
}

#[async_trait]
impl WikiSource for StaticSource {
    async fn fetch_document(&self, request: &PageRequest) -> Result<RawDocument> {
        let document = self.page(&request.title)?.document.clone().ok_or_else(|| not_found(request))?;
        match request.revision {
            Some(revision) if document.revision.is_some_and(|known| known != revision) => Err(not_found(request)),
            _ => Ok(document),
        }
    }

    async fn fetch_metadata(&self, request: &PageRequest) -> Result<Metadata> {
        self.page(&request.title)?.metadata.clone().ok_or_else(|| not_found(request))
    }

    async fn fetch_siteinfo(&self, _domain: &str) -> Result<SiteInfo> {
        Ok(self.siteinfo.clone())
    }

    async fn fetch_main_page(&self, request: &PageRequest) -> Result<MobileView> {
        self.page(&request.title)?.main_page.clone().ok_or_else(|| not_found(request))
    }

    async fn api_get(&self, _domain: &str, params: &[(&str, String)]) -> Result<Value> {
        let call: Vec<(String, String)> = params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        if let Ok(mut calls) = self.api_calls.lock() {
            calls.push(call);
        }

        let matches = |param: &str, value: &str| params.iter().any(|(k, v)| *k == param && v == value);
        if let Some((param, value, status)) = self.api_failures.iter().find(|(param, value, _)| matches(param, value)) {
            return Err(SectioError::UpstreamStatus {
                status: *status,
                detail: format!("canned failure for {param}={value}"),
            });
        }

        let response = self
            .api_responses
            .iter()
            .find(|(param, value, _)| matches(param, value))
            .map(|(_, _, response)| response.clone());

        Ok(response.unwrap_or_else(|| Value::Object(Default::default())))
    }
}

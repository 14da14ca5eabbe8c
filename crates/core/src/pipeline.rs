//! Main entry point of the mobile-sections pipeline.
//!
//! A [`Pipeline`] owns an upstream [`WikiSource`] and a read-only
//! [`SectionsConfig`]; both are shared behind `Arc`, so one pipeline can
//! serve any number of concurrent requests.
//!
//! # Example
//!
//! ```no_run
//! use sectio_core::{FetchConfig, MediaWikiClient, Mode, PageRequest, Pipeline, SectionsConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MediaWikiClient::new(FetchConfig::default())?;
//! let pipeline = Pipeline::new(Arc::new(client), SectionsConfig::default());
//!
//! let request = PageRequest::new("en.wikipedia.org", "Foobar");
//! let response = pipeline.mobile_sections(&request, Mode::Legacy).await?;
//! println!("{} sections", response.body.remaining.sections.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::Result;
use crate::assemble::{AssembleOptions, Lead, MobileSections, Remaining, build_all, build_lead, build_remaining};
use crate::dom_transforms::TransformConfig;
use crate::enrich::{Collected, enrich};
use crate::lead::{LeadConfig, Mode};
use crate::mwapi::LEAD_IMAGE_WIDTHS;
use crate::page::Page;
use crate::references::{ReferenceTerms, lang_from_domain};
use crate::source::{PageRequest, WikiSource};
use crate::title::Title;

/// Configuration for the pipeline.
///
/// # Example
///
/// ```rust
/// use sectio_core::SectionsConfig;
///
/// let config = SectionsConfig::builder()
///     .split_depth(3)
///     .relocation_min_length(80)
///     .build();
/// assert_eq!(config.split_depth, 3);
/// ```
#[derive(Debug, Clone)]
pub struct SectionsConfig {
    /// Deepest heading level that starts a section (default: 6).
    pub split_depth: u8,

    /// Lead extraction settings.
    pub lead: LeadConfig,

    /// Markup cleanup applied to upstream documents.
    pub transforms: TransformConfig,

    /// Widths lead image URLs are offered at (default: 320, 640, 800, 1024).
    pub image_widths: Vec<u32>,

    /// Reference heading terms per language.
    pub reference_terms: ReferenceTerms,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            split_depth: 6,
            lead: LeadConfig::default(),
            transforms: TransformConfig::default(),
            image_widths: LEAD_IMAGE_WIDTHS.to_vec(),
            reference_terms: ReferenceTerms::default(),
        }
    }
}

impl SectionsConfig {
    /// Creates a new builder for SectionsConfig.
    pub fn builder() -> SectionsConfigBuilder {
        SectionsConfigBuilder::new()
    }

    fn assemble_options(&self, mode: Mode) -> AssembleOptions<'_> {
        AssembleOptions {
            mode,
            lead: &self.lead,
            image_widths: &self.image_widths,
            reference_terms: &self.reference_terms,
        }
    }
}

/// Builder for SectionsConfig.
pub struct SectionsConfigBuilder {
    config: SectionsConfig,
}

impl SectionsConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: SectionsConfig::default() }
    }

    /// Sets the deepest heading level that splits sections, clamped to 1..=6.
    pub fn split_depth(mut self, value: u8) -> Self {
        self.config.split_depth = value.clamp(1, 6);
        self
    }

    /// Sets the infobox selector.
    pub fn infobox_selector(mut self, value: impl Into<String>) -> Self {
        self.config.lead.infobox_selector = value.into();
        self
    }

    /// Sets the minimum introduction paragraph length.
    pub fn intro_min_length(mut self, value: usize) -> Self {
        self.config.lead.intro_min_length = value;
        self
    }

    /// Sets the minimum length of a paragraph relocated in legacy mode.
    pub fn relocation_min_length(mut self, value: usize) -> Self {
        self.config.lead.relocation_min_length = value;
        self
    }

    /// Sets the lead image widths.
    pub fn image_widths(mut self, value: Vec<u32>) -> Self {
        self.config.image_widths = value;
        self
    }

    /// Sets the reference heading terms.
    pub fn reference_terms(mut self, value: ReferenceTerms) -> Self {
        self.config.reference_terms = value;
        self
    }

    /// Sets the DOM transform settings.
    pub fn transforms(mut self, value: TransformConfig) -> Self {
        self.config.transforms = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> SectionsConfig {
        self.config
    }
}

impl Default for SectionsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A response body with the revision that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub body: T,
    pub revision: Option<u64>,
    pub tid: Option<String>,
}

impl<T> Versioned<T> {
    /// Entity tag of the response, `"{revision}/{tid}"`.
    pub fn etag(&self) -> Option<String> {
        let revision = self.revision?;
        Some(match &self.tid {
            Some(tid) => format!("\"{revision}/{tid}\""),
            None => format!("\"{revision}\""),
        })
    }

    fn from_page(body: T, page: &Page) -> Self {
        Self { body, revision: page.revision, tid: page.tid.clone() }
    }
}

/// The mobile-sections pipeline.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn WikiSource>,
    config: Arc<SectionsConfig>,
}

impl Pipeline {
    /// Creates a pipeline over an upstream source.
    pub fn new(source: Arc<dyn WikiSource>, config: SectionsConfig) -> Self {
        Self { source, config: Arc::new(config) }
    }

    /// Fetches document, metadata and site info concurrently, normalizes
    /// the title and runs the enrichment branch.
    ///
    /// # Errors
    ///
    /// The first upstream failure ends the request; nothing partial is returned.
    #[tracing::instrument(skip(self), fields(domain = %request.domain, title = %request.title))]
    pub async fn collect(&self, request: &PageRequest, mode: Mode) -> Result<Collected> {
        let (document, mut meta, siteinfo) = tokio::try_join!(
            self.source.fetch_document(request),
            self.source.fetch_metadata(request),
            self.source.fetch_siteinfo(&request.domain),
        )?;

        let title = Title::parse(&request.title, &siteinfo);
        let main_page = Title::parse(&siteinfo.main_page, &siteinfo);
        meta.normalizedtitle = Some(title.prefixed());
        meta.mainpage = meta.mainpage || title == main_page;
        tracing::debug!(normalized = %title, ns = meta.ns, mainpage = meta.mainpage, "collected");

        let page = Page::from_document(document, &self.config.transforms, self.config.split_depth, mode);
        tracing::debug!(sections = page.sections.len(), "split");

        enrich(self.source.as_ref(), request, Collected { page, meta, title, siteinfo }).await
    }

    /// Lead and remaining sections of a page.
    pub async fn mobile_sections(&self, request: &PageRequest, mode: Mode) -> Result<Versioned<MobileSections>> {
        let collected = self.collect(request, mode).await?;
        let body = build_all(&collected, &self.config.assemble_options(mode));
        Ok(Versioned::from_page(body, &collected.page))
    }

    /// Lead object of a page.
    pub async fn lead(&self, request: &PageRequest, mode: Mode) -> Result<Versioned<Lead>> {
        let collected = self.collect(request, mode).await?;
        let body = build_lead(&collected, &self.config.assemble_options(mode));
        Ok(Versioned::from_page(body, &collected.page))
    }

    /// Every section except the lead. Only the document is fetched.
    #[tracing::instrument(skip(self), fields(domain = %request.domain, title = %request.title))]
    pub async fn remaining(&self, request: &PageRequest) -> Result<Versioned<Remaining>> {
        let document = self.source.fetch_document(request).await?;
        let page = Page::from_document(document, &self.config.transforms, self.config.split_depth, Mode::Legacy);
        let body = build_remaining(&page.sections, &self.config.reference_terms, lang_from_domain(&request.domain));
        Ok(Versioned::from_page(body, &page))
    }

    /// Only the reference sections of a page.
    pub async fn references(&self, request: &PageRequest) -> Result<Versioned<Remaining>> {
        let mut remaining = self.remaining(request).await?;
        remaining.body.sections.retain(|s| s.is_reference_section == Some(true));
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::source::{RawDocument, StaticSource};

    #[test]
    fn test_sections_config_default() {
        let config = SectionsConfig::default();
        assert_eq!(config.split_depth, 6);
        assert_eq!(config.image_widths, vec![320, 640, 800, 1024]);
        assert_eq!(config.lead.relocation_min_length, 60);
    }

    #[test]
    fn test_sections_config_builder() {
        let config = SectionsConfig::builder()
            .split_depth(9)
            .infobox_selector("table.vcard")
            .intro_min_length(10)
            .relocation_min_length(80)
            .image_widths(vec![100])
            .reference_terms(ReferenceTerms::empty())
            .build();

        assert_eq!(config.split_depth, 6);
        assert_eq!(config.lead.infobox_selector, "table.vcard");
        assert_eq!(config.lead.intro_min_length, 10);
        assert_eq!(config.lead.relocation_min_length, 80);
        assert_eq!(config.image_widths, vec![100]);
        assert!(!config.reference_terms.matches("en", "References"));
    }

    #[test]
    fn test_etag() {
        let versioned = Versioned { body: (), revision: Some(123456), tid: Some("abc".to_string()) };
        assert_eq!(versioned.etag().as_deref(), Some("\"123456/abc\""));
        let no_tid = Versioned { body: (), revision: Some(1), tid: None };
        assert_eq!(no_tid.etag().as_deref(), Some("\"1\""));
        let unknown = Versioned { body: (), revision: None, tid: None };
        assert_eq!(unknown.etag(), None);
    }

    #[tokio::test]
    async fn test_references_only() {
        let html = "<body><p>Lead</p><h2>History</h2><p>h</p><h2>Notes</h2><p>n</p><h2>See also</h2><p>s</p></body>";
        let source = StaticSource::new().with_document("Foo", RawDocument::new(html), Metadata::default());
        let pipeline = Pipeline::new(Arc::new(source), SectionsConfig::default());
        let references = pipeline.references(&PageRequest::new("en.wikipedia.org", "Foo")).await.unwrap();
        assert_eq!(references.body.sections.len(), 1);
        assert_eq!(references.body.sections[0].line.as_deref(), Some("Notes"));
    }

    #[tokio::test]
    async fn test_missing_page_is_terminal() {
        let pipeline = Pipeline::new(Arc::new(StaticSource::new()), SectionsConfig::default());
        let request = PageRequest::new("en.wikipedia.org", "Nope");
        let err = pipeline.mobile_sections(&request, Mode::Legacy).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

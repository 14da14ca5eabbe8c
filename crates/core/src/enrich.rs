//! Namespace-specific enrichment.
//!
//! After collection exactly one [`Enrichment`] branch runs: main pages swap
//! their content for the mobile rendering, user pages get the owner's global
//! account and file pages get their image info.

use crate::Result;
use crate::metadata::Metadata;
use crate::mwapi;
use crate::page::Page;
use crate::siteinfo::{NS_FILE, NS_USER, SiteInfo};
use crate::source::{PageRequest, WikiSource};
use crate::title::Title;

/// The upstream payloads of one request, gathered and normalized.
#[derive(Debug, Clone)]
pub struct Collected {
    pub page: Page,
    pub meta: Metadata,
    pub title: Title,
    pub siteinfo: SiteInfo,
}

/// The enrichment branch a request takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    MainPage,
    UserPage { owner: String },
    FilePage { title: String },
    Default,
}

impl Enrichment {
    /// Picks the branch: main page first, then top-level user pages, then
    /// file pages.
    pub fn resolve(meta: &Metadata, title: &Title) -> Self {
        if meta.mainpage {
            Enrichment::MainPage
        } else if meta.ns == NS_USER && !title.is_subpage() {
            Enrichment::UserPage { owner: title.text().to_string() }
        } else if meta.ns == NS_FILE {
            Enrichment::FilePage { title: title.prefixed() }
        } else {
            Enrichment::Default
        }
    }
}

/// Runs the enrichment branch for a collected request.
///
/// # Errors
///
/// Any upstream failure of the branch's fetch ends the request.
pub async fn enrich(source: &dyn WikiSource, request: &PageRequest, mut collected: Collected) -> Result<Collected> {
    let enrichment = Enrichment::resolve(&collected.meta, &collected.title);
    tracing::debug!(?enrichment, "enriching");

    match enrichment {
        Enrichment::MainPage => {
            let view = source.fetch_main_page(request).await?;
            let tid = collected.page.tid.take();
            let revision = collected.page.revision;
            let mut page = Page::from_mobileview(view, tid);
            page.revision = page.revision.or(revision);
            collected.page = page;
        }
        Enrichment::UserPage { owner } => {
            let body = source.api_get(&request.domain, &mwapi::userinfo_params(&owner)).await?;
            collected.meta.userinfo = mwapi::parse_userinfo(&body);
        }
        Enrichment::FilePage { title } => {
            let body = source.api_get(&request.domain, &mwapi::imageinfo_params(&title)).await?;
            collected.meta.imageinfo = mwapi::parse_imageinfo(&body);
        }
        Enrichment::Default => {}
    }

    Ok(collected)
}

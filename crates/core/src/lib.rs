pub mod assemble;
pub mod document;
pub mod dom_transforms;
pub mod enrich;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod lead;
pub mod metadata;
pub mod mwapi;
pub mod page;
pub mod pipeline;
pub mod references;
pub mod sections;
pub mod siteinfo;
pub mod source;
pub mod title;

pub use assemble::{Lead, LeadImage, MobileSections, Remaining, SectionSummary};
pub use assemble::{build_all, build_lead, build_remaining};
pub use document::{Document, Element, Fragment};
pub use dom_transforms::{TransformConfig, run_dom_transforms, run_main_page_transforms};
pub use enrich::{Collected, Enrichment};
pub use error::{Result, SectioError};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, MediaWikiClient, fetch_file, fetch_stdin};
pub use lead::{LeadConfig, LeadContent, Mode, extract_infobox, extract_intro, extract_lead, relocate_first_paragraph};
pub use metadata::Metadata;
pub use page::{Page, Pronunciation, Spoken};
pub use pipeline::{Pipeline, SectionsConfig, SectionsConfigBuilder, Versioned};
pub use references::{ReferenceTerms, mark_reference_sections};
pub use sections::{Section, split_html, split_sections};
pub use siteinfo::SiteInfo;
pub use source::{MobileView, PageRequest, RawDocument, StaticPage, StaticSource, WikiSource};
pub use title::Title;

//! The page content a response is built from.
//!
//! A [`Page`] is the sectioned document plus the lead-level pieces pulled
//! out of it: hatnotes, maintenance issues, pronunciation audio and spoken
//! article files.

use serde::{Deserialize, Serialize};

use crate::document::{Document, Fragment};
use crate::dom_transforms::{TransformConfig, run_dom_transforms, run_main_page_transforms};
use crate::lead::Mode;
use crate::sections::{Section, split_sections};
use crate::source::{MobileView, RawDocument};

const HATNOTE_SELECTOR: &str = "div.hatnote";
const ISSUE_BOX_SELECTOR: &str = ".ambox";
const ISSUE_TEXT_SELECTOR: &str = ".ambox .mbox-text-span";
const SPOKEN_SELECTOR: &str = "#section_SpokenWikipedia";
const AUDIO_EXTENSIONS: [&str; 6] = [".ogg", ".oga", ".opus", ".mp3", ".wav", ".flac"];

/// Link to the pronunciation audio of the page title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pronunciation {
    pub url: String,
}

/// Spoken-article recordings of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spoken {
    pub files: Vec<String>,
}

/// Sectioned page content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub revision: Option<u64>,
    pub tid: Option<String>,
    pub sections: Vec<Section>,
    pub hatnotes: Option<Vec<String>>,
    pub issues: Option<Vec<String>>,
    pub pronunciation: Option<Pronunciation>,
    pub spoken: Option<Spoken>,
}

impl Page {
    /// Builds a page from a rendered document.
    ///
    /// The document is cleaned, split into sections, and the lead pieces are
    /// collected from section 0. In formatted mode hatnotes and issue boxes
    /// are also taken out of the lead text.
    pub fn from_document(raw: RawDocument, transforms: &TransformConfig, depth: u8, mode: Mode) -> Self {
        let html = run_dom_transforms(&raw.html, transforms);
        let doc = Document::parse(&html);
        let mut sections = split_sections(&doc, depth);

        let spoken = spoken_files(&doc);
        let mut page = Page { revision: raw.revision, tid: raw.tid, spoken, ..Default::default() };

        if let Some(lead) = sections.first_mut() {
            let mut fragment = Fragment::parse(&lead.text);
            page.hatnotes = non_empty(inner_html_of(&fragment, HATNOTE_SELECTOR));
            page.issues = non_empty(inner_html_of(&fragment, ISSUE_TEXT_SELECTOR));
            page.pronunciation = pronunciation(&fragment);

            if mode == Mode::Formatted && (page.hatnotes.is_some() || page.issues.is_some()) {
                for selector in [HATNOTE_SELECTOR, ISSUE_BOX_SELECTOR] {
                    remove_all(&mut fragment, selector);
                }
                lead.text = fragment.to_html();
            }
        }

        page.sections = sections;
        page
    }

    /// Builds a page from the mobile rendering used for main pages.
    ///
    /// Every section goes through the main-page transforms; nothing else is
    /// extracted.
    pub fn from_mobileview(view: MobileView, tid: Option<String>) -> Self {
        let sections = view
            .sections
            .into_iter()
            .map(|mut section| {
                section.text = run_main_page_transforms(&section.text);
                section
            })
            .collect();

        Page { revision: view.revision, tid, sections, ..Default::default() }
    }

    /// Whether the page has at most one section.
    pub fn is_stub(&self) -> bool {
        self.sections.len() <= 1
    }

    /// Text of section 0, empty when there are no sections.
    pub fn lead_text(&self) -> &str {
        self.sections.first().map(|s| s.text.as_str()).unwrap_or_default()
    }
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items) }
}

fn inner_html_of(fragment: &Fragment, selector: &str) -> Vec<String> {
    fragment
        .select(selector)
        .map(|found| found.iter().map(|el| el.inner_html()).collect())
        .unwrap_or_default()
}

fn remove_all(fragment: &mut Fragment, selector: &str) {
    let ids: Vec<_> = fragment
        .select(selector)
        .map(|found| found.iter().map(|el| el.id()).collect())
        .unwrap_or_default();
    for id in ids {
        fragment.detach(id);
    }
}

fn pronunciation(fragment: &Fragment) -> Option<Pronunciation> {
    let links = fragment.select(r#"a[rel="mw:MediaLink"]"#).ok()?;
    links
        .iter()
        .filter_map(|link| link.attr("href"))
        .find(|href| {
            let lower = href.to_lowercase();
            AUDIO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .map(|href| Pronunciation { url: href.to_string() })
}

fn spoken_files(doc: &Document) -> Option<Spoken> {
    let boxes = doc.select(SPOKEN_SELECTOR).ok()?;
    let mut files: Vec<String> = Vec::new();

    for container in &boxes {
        for link in container.select("a[href]").unwrap_or_default() {
            let Some(href) = link.attr("href") else { continue };
            let Some(name) = href.rsplit('/').next() else { continue };
            let is_audio = AUDIO_EXTENSIONS.iter().any(|ext| name.to_lowercase().ends_with(ext));
            if is_audio && name.contains(':') && !files.iter().any(|f| f == name) {
                files.push(name.to_string());
            }
        }
    }

    if files.is_empty() { None } else { Some(Spoken { files }) }
}

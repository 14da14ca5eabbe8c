//! Section splitting.
//!
//! A document body is cut at every top-level heading up to the configured
//! depth. The heading opens its section's fragment and the content before the
//! first heading becomes section 0, so concatenating all fragments in id
//! order gives back the body exactly.

use regex::Regex;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::document::{Document, Element, fragment_text, serialize_node};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One section of an article.
///
/// Section 0 is the lead and never carries `toclevel`, `line` or `anchor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toclevel: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "isReferenceSection", default, skip_serializing_if = "Option::is_none")]
    pub is_reference_section: Option<bool>,
}

impl Section {
    /// Creates the lead section.
    pub fn lead(text: String) -> Self {
        Self {
            id: 0,
            toclevel: None,
            line: None,
            anchor: None,
            text,
            is_reference_section: None,
        }
    }

    /// Whether this is section 0.
    pub fn is_lead(&self) -> bool {
        self.id == 0
    }

    /// The display line with markup removed.
    pub fn line_text(&self) -> Option<String> {
        self.line.as_deref().map(|line| {
            let text = fragment_text(line);
            WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
        })
    }
}

/// Splits a parsed document into sections.
///
/// Headings deeper than `depth` stay inside the fragment of the section they
/// appear in. A body without headings yields a single lead section; a
/// document without a body yields an empty lead section.
pub fn split_sections(doc: &Document, depth: u8) -> Vec<Section> {
    let mut sections = vec![Section::lead(String::new())];
    let Some(body) = doc.body() else {
        return sections;
    };

    for node in body.element_ref().children() {
        let heading = ElementRef::wrap(node)
            .map(Element::from)
            .and_then(|el| el.heading_level().filter(|level| *level <= depth).map(|level| (el, level)));

        if let Some((heading, level)) = heading {
            let anchor = heading
                .attr("id")
                .map(str::to_string)
                .unwrap_or_else(|| anchor_from_text(&heading.text()));
            sections.push(Section {
                id: sections.len(),
                toclevel: Some(level.saturating_sub(1).max(1)),
                line: Some(heading.inner_html()),
                anchor: Some(anchor),
                text: String::new(),
                is_reference_section: None,
            });
        }

        if let Some(current) = sections.last_mut() {
            current.text.push_str(&serialize_node(node));
        }
    }

    sections
}

/// Parses `html` as a full document and splits it.
pub fn split_html(html: &str, depth: u8) -> Vec<Section> {
    split_sections(&Document::parse(html), depth)
}

/// Builds a wiki-style anchor from heading text: trimmed, whitespace runs
/// replaced by underscores.
pub fn anchor_from_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), "_").to_string()
}

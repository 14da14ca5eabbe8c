//! Lead section transforms.
//!
//! Everything here works on section 0's fragment and follows the same shape:
//! take an owned [`Fragment`], return the transformed fragment and whatever
//! was pulled out of it. Nothing in this module fails; a missing infobox or
//! paragraph is reported as `None`.

use ego_tree::NodeId;

use crate::document::{Element, Fragment};

/// Which transform path a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Paragraph relocation, sections summary in the lead. Kept for older clients.
    #[default]
    Legacy,
    /// Infobox and introduction are split out of the lead text.
    Formatted,
}

/// Configuration for lead extraction
#[derive(Debug, Clone)]
pub struct LeadConfig {
    /// Selector for infobox-like blocks; the first match in document order wins
    pub infobox_selector: String,
    /// Minimum trimmed text length of an introduction paragraph
    pub intro_min_length: usize,
    /// Minimum trimmed text length of a paragraph moved up in legacy mode
    pub relocation_min_length: usize,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            infobox_selector: "table.infobox, div.infobox, table.infobox_v2, table.vcard".to_string(),
            intro_min_length: 1,
            relocation_min_length: 60,
        }
    }
}

/// Result of running the lead transforms over section 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadContent {
    /// Lead HTML after extraction or relocation
    pub text: String,
    /// Outer HTML of the removed infobox
    pub infobox: Option<String>,
    /// The introduction paragraph and its trailing lists
    pub intro: Option<String>,
}

/// Runs the lead transforms for one request.
///
/// In formatted mode the infobox is removed unless the page is a stub, and
/// the introduction is always extracted but only removed from the text of
/// non-stub pages. In legacy mode the first good paragraph is moved to the
/// top and nothing is extracted.
pub fn extract_lead(text: &str, mode: Mode, stub: bool, config: &LeadConfig) -> LeadContent {
    let fragment = Fragment::parse(text);

    match mode {
        Mode::Legacy => {
            let fragment = relocate_first_paragraph(fragment, config);
            LeadContent { text: fragment.to_html(), infobox: None, intro: None }
        }
        Mode::Formatted => {
            let (fragment, infobox) = if stub { (fragment, None) } else { extract_infobox(fragment, config) };
            let (fragment, intro) = extract_intro(fragment, !stub, config);
            LeadContent { text: fragment.to_html(), infobox, intro }
        }
    }
}

/// Removes the first infobox-like block and returns its outer HTML.
pub fn extract_infobox(mut fragment: Fragment, config: &LeadConfig) -> (Fragment, Option<String>) {
    let found = fragment
        .select(&config.infobox_selector)
        .ok()
        .and_then(|matches| matches.into_iter().next().map(|el| (el.id(), el.outer_html())));

    match found {
        Some((id, html)) => {
            fragment.detach(id);
            (fragment, Some(html))
        }
        None => (fragment, None),
    }
}

/// Finds the first qualifying paragraph and returns it together with the
/// lists that directly follow it. With `remove` set those nodes are taken
/// out of the fragment.
pub fn extract_intro(mut fragment: Fragment, remove: bool, config: &LeadConfig) -> (Fragment, Option<String>) {
    let Some((paragraph, siblings)) = first_eligible_paragraph(&fragment, config.intro_min_length) else {
        return (fragment, None);
    };

    let mut block = vec![paragraph];
    for id in siblings {
        let is_list = fragment
            .element(id)
            .is_some_and(|el| matches!(el.tag_name().as_str(), "ul" | "ol" | "dl"));
        let is_blank = fragment.element(id).is_none() && fragment.node_html(id).trim().is_empty();
        if !(is_list || is_blank) {
            break;
        }
        block.push(id);
    }

    let intro: String = block.iter().map(|id| fragment.node_html(*id)).collect();
    if remove {
        for id in &block {
            fragment.detach(*id);
        }
    }

    (fragment, Some(intro.trim().to_string()))
}

/// Moves the first good paragraph, and every node up to the next paragraph,
/// to the very start of the fragment.
pub fn relocate_first_paragraph(mut fragment: Fragment, config: &LeadConfig) -> Fragment {
    let Some((paragraph, siblings)) = first_eligible_paragraph(&fragment, config.relocation_min_length) else {
        return fragment;
    };

    let mut block = vec![paragraph];
    for id in siblings {
        if fragment.element(id).is_some_and(|el| el.tag_name() == "p") {
            break;
        }
        block.push(id);
    }

    fragment.move_to_front(&block);
    fragment
}

fn first_eligible_paragraph(fragment: &Fragment, min_length: usize) -> Option<(NodeId, Vec<NodeId>)> {
    fragment
        .top_level_elements()
        .into_iter()
        .find(|el| is_paragraph_eligible(el, min_length))
        .map(|el| (el.id(), el.following_siblings()))
}

/// A paragraph qualifies when it has real text, is not the coordinates
/// holder and is not a hatnote or empty-element marker.
fn is_paragraph_eligible(p: &Element<'_>, min_length: usize) -> bool {
    if p.tag_name() != "p" {
        return false;
    }
    if p.has_class("mw-empty-elt") || p.has_class("hatnote") || p.attr("role") == Some("note") {
        return false;
    }
    if p.contains("span#coordinates") || p.contains(".coordinates") {
        return false;
    }

    let text = p.text();
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().count() >= min_length
}

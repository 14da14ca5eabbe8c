//! Reference-section classification.
//!
//! A section is a reference section when its heading names one (per the
//! wiki's language) or when it closes the article and holds citation lists.

use std::collections::{HashMap, HashSet};

use crate::document::Fragment;
use crate::sections::Section;

/// Markup that marks a block of citations.
const CITATION_SELECTOR: &str = "ol.references, .reflist, .refbegin, .mw-references-wrap";

/// Heading terms that name reference sections, keyed by language code.
#[derive(Debug, Clone)]
pub struct ReferenceTerms {
    terms: HashMap<String, HashSet<String>>,
}

impl Default for ReferenceTerms {
    fn default() -> Self {
        let mut terms = Self { terms: HashMap::new() };
        terms.insert(
            "en",
            [
                "references",
                "notes",
                "further reading",
                "notes and references",
                "references and notes",
                "footnotes",
                "citations",
                "sources",
                "bibliography",
                "works cited",
            ],
        );
        terms.insert("de", ["einzelnachweise", "literatur", "anmerkungen", "quellen", "belege"]);
        terms.insert("fr", ["références", "notes et références", "bibliographie", "notes"]);
        terms.insert("es", ["referencias", "notas", "bibliografía", "notas y referencias"]);
        terms.insert("it", ["note", "bibliografia", "fonti"]);
        terms.insert("nl", ["referenties", "bronnen", "noten", "literatuur"]);
        terms
    }
}

impl ReferenceTerms {
    /// An empty term table. Only trailing citation blocks are flagged.
    pub fn empty() -> Self {
        Self { terms: HashMap::new() }
    }

    /// Adds terms for a language. Terms are matched case-insensitively.
    pub fn insert<I, S>(&mut self, lang: &str, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.terms.entry(lang.to_lowercase()).or_default();
        entry.extend(terms.into_iter().map(|t| t.as_ref().trim().to_lowercase()));
    }

    /// Terms for `lang`, falling back to English.
    pub fn for_lang(&self, lang: &str) -> Option<&HashSet<String>> {
        self.terms.get(&lang.to_lowercase()).or_else(|| self.terms.get("en"))
    }

    /// Whether a heading text names a reference section in `lang`.
    pub fn matches(&self, lang: &str, heading: &str) -> bool {
        let heading = heading.trim().to_lowercase();
        self.for_lang(lang).is_some_and(|terms| terms.contains(&heading))
    }
}

/// Language code of a wiki domain, e.g. `de` for `de.wikipedia.org`.
pub fn lang_from_domain(domain: &str) -> &str {
    domain.split('.').next().filter(|lang| !lang.is_empty()).unwrap_or("en")
}

/// Flags the reference sections among `sections`.
///
/// Section 0 is never considered. Sections that do not match are left
/// without the field, so running this twice changes nothing.
pub fn mark_reference_sections(sections: &mut [Section], terms: &ReferenceTerms, lang: &str) {
    let last = sections.len().saturating_sub(1);

    for (index, section) in sections.iter_mut().enumerate() {
        if section.is_lead() {
            continue;
        }

        let named = section.line_text().is_some_and(|line| terms.matches(lang, &line));
        let trailing_citations = index == last && has_citation_markup(&section.text);

        if named || trailing_citations {
            section.is_reference_section = Some(true);
        }
    }
}

fn has_citation_markup(html: &str) -> bool {
    Fragment::parse(html)
        .select(CITATION_SELECTOR)
        .map(|found| !found.is_empty())
        .unwrap_or(false)
}

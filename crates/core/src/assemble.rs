//! Response assembly.
//!
//! Projects a collected page into the lead and remaining objects. Field
//! presence is part of the output contract: optional fields are omitted
//! rather than serialized as `null`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::enrich::Collected;
use crate::lead::{LeadConfig, Mode, extract_lead};
use crate::metadata::{Geo, LastModifier, Protection};
use crate::mwapi::lead_image_urls;
use crate::page::{Pronunciation, Spoken};
use crate::references::{ReferenceTerms, mark_reference_sections};
use crate::sections::Section;

/// Settings the assembler reads.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions<'a> {
    pub mode: Mode,
    pub lead: &'a LeadConfig,
    pub image_widths: &'a [u32],
    pub reference_terms: &'a ReferenceTerms,
}

/// Lead image file and its thumbnail URLs keyed by width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<BTreeMap<u32, String>>,
}

/// Entry of the legacy `sections` summary. Only section 0 carries text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toclevel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// The lead object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub ns: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imageinfo: Option<serde_json::Value>,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip)]
    pub tid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmodified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmodifier: Option<LastModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displaytitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalizedtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikibase_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub protection: Protection,
    pub editable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub mainpage: bool,
    pub languagecount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<LeadImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<Pronunciation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoken: Option<Spoken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hatnotes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infobox: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected: Option<String>,
}

/// The remaining object: every section except the lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub sections: Vec<Section>,
}

/// Lead and remaining together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MobileSections {
    pub lead: Lead,
    pub remaining: Remaining,
}

/// Builds the lead object.
///
/// Main pages and legacy mode get the sections summary with section 0's
/// text; formatted mode gets the text with infobox and intro split out.
/// Main pages skip relocation and extraction altogether.
pub fn build_lead(collected: &Collected, options: &AssembleOptions<'_>) -> Lead {
    let meta = &collected.meta;
    let page = &collected.page;
    let lead_text = page.lead_text();

    let (sections, text, infobox, intro) = if meta.mainpage {
        (Some(summarize(&page.sections, lead_text.to_string())), Some(lead_text.to_string()), None, None)
    } else {
        let content = extract_lead(lead_text, options.mode, page.is_stub(), options.lead);
        match options.mode {
            Mode::Legacy => (Some(summarize(&page.sections, content.text.clone())), Some(content.text), None, None),
            Mode::Formatted => (None, Some(content.text), content.infobox, content.intro),
        }
    };

    let image = LeadImage {
        file: meta.image.as_ref().map(|image| image.file.clone()),
        urls: meta.thumb.as_ref().map(|thumb| lead_image_urls(&thumb.url, options.image_widths)),
    };

    Lead {
        ns: meta.ns,
        contentmodel: meta.non_default_contentmodel().map(str::to_string),
        userinfo: meta.userinfo.clone(),
        imageinfo: meta.imageinfo.clone(),
        id: meta.id,
        revision: page.revision.map(|rev| rev.to_string()),
        tid: page.tid.clone(),
        lastmodified: meta.lastmodified.clone(),
        lastmodifier: meta.lastmodifier.clone(),
        displaytitle: meta.displaytitle.clone(),
        normalizedtitle: meta.normalizedtitle.clone(),
        wikibase_item: meta.wikibase_item(),
        disambiguation: meta.is_disambiguation().then_some(true),
        description: meta.description.clone(),
        protection: meta.protection.clone(),
        editable: meta.editable,
        mainpage: meta.mainpage,
        languagecount: meta.languagecount,
        image: (image.file.is_some() || image.urls.is_some()).then_some(image),
        pronunciation: page.pronunciation.clone(),
        spoken: page.spoken.clone(),
        hatnotes: page.hatnotes.clone(),
        issues: page.issues.clone(),
        infobox,
        intro,
        geo: meta.geo,
        sections,
        text,
        redirected: meta.redirected.clone(),
    }
}

fn summarize(sections: &[Section], lead_text: String) -> Vec<SectionSummary> {
    let mut summary = vec![SectionSummary { id: 0, toclevel: None, anchor: None, line: None, text: Some(lead_text) }];
    summary.extend(sections.iter().filter(|s| !s.is_lead()).map(|s| SectionSummary {
        id: s.id,
        toclevel: s.toclevel,
        anchor: s.anchor.clone(),
        line: s.line.clone(),
        text: None,
    }));
    summary
}

/// Builds the remaining object: drops section 0 and flags reference
/// sections when anything is left.
pub fn build_remaining(sections: &[Section], terms: &ReferenceTerms, lang: &str) -> Remaining {
    let mut remaining: Vec<Section> = sections.iter().filter(|s| !s.is_lead()).cloned().collect();
    if !remaining.is_empty() {
        mark_reference_sections(&mut remaining, terms, lang);
    }
    Remaining { sections: remaining }
}

/// Builds both objects.
pub fn build_all(collected: &Collected, options: &AssembleOptions<'_>) -> MobileSections {
    MobileSections {
        lead: build_lead(collected, options),
        remaining: build_remaining(&collected.page.sections, options.reference_terms, &collected.siteinfo.lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, PageImage, Thumbnail};
    use crate::page::Page;
    use crate::sections::split_html;
    use crate::siteinfo::SiteInfo;
    use crate::title::Title;
    use serde_json::json;

    const INTRO: &str = "Foobar is a term used in programming as a placeholder for unnamed things of all kinds.";

    fn collected(html: &str, meta: Metadata) -> Collected {
        let site = SiteInfo::default();
        Collected {
            page: Page {
                revision: Some(5),
                tid: Some("t".to_string()),
                sections: split_html(html, 6),
                ..Default::default()
            },
            meta,
            title: Title::parse("Foobar", &site),
            siteinfo: site,
        }
    }

    fn article() -> String {
        format!(
            r#"<body><table class="infobox"><tr><td>box</td></tr></table><p>{INTRO}</p><h2 id="History">History</h2><p>h</p><h2 id="References">References</h2><ol class="references"><li>r</li></ol><h2 id="External_links">External links</h2><ul><li>e</li></ul><h2 id="See_also">See also</h2><ul><li>s</li></ul></body>"#
        )
    }

    fn run(collected: &Collected, mode: Mode) -> MobileSections {
        let lead = LeadConfig::default();
        let terms = ReferenceTerms::default();
        let options = AssembleOptions { mode, lead: &lead, image_widths: &[320, 640], reference_terms: &terms };
        build_all(collected, &options)
    }

    #[test]
    fn test_legacy_shape() {
        let all = run(&collected(&article(), Metadata::default()), Mode::Legacy);
        let sections = all.lead.sections.as_ref().unwrap();
        assert_eq!(sections.len(), 5);
        assert!(sections[0].text.as_ref().unwrap().starts_with(&format!("<p>{INTRO}</p>")));
        assert!(sections[1..].iter().all(|s| s.text.is_none()));
        assert!(all.lead.infobox.is_none());
        assert!(all.lead.intro.is_none());
        assert_eq!(all.lead.revision.as_deref(), Some("5"));
    }

    #[test]
    fn test_formatted_shape() {
        let all = run(&collected(&article(), Metadata::default()), Mode::Formatted);
        assert!(all.lead.sections.is_none());
        assert!(all.lead.infobox.as_ref().unwrap().contains("box"));
        assert_eq!(all.lead.intro.as_deref(), Some(format!("<p>{INTRO}</p>").as_str()));
        assert!(!all.lead.text.as_ref().unwrap().contains(INTRO));
    }

    #[test]
    fn test_remaining_flags() {
        let all = run(&collected(&article(), Metadata::default()), Mode::Legacy);
        let ids: Vec<usize> = all.remaining.sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let flags: Vec<Option<bool>> = all.remaining.sections.iter().map(|s| s.is_reference_section).collect();
        assert_eq!(flags, vec![None, Some(true), None, None]);
    }

    #[test]
    fn test_stub_page() {
        let html = format!("<body><p>{INTRO}</p></body>");
        let all = run(&collected(&html, Metadata::default()), Mode::Legacy);
        assert_eq!(all.lead.sections.as_ref().map(Vec::len), Some(1));
        assert!(all.remaining.sections.is_empty());

        let formatted = run(&collected(&html, Metadata::default()), Mode::Formatted);
        assert_eq!(formatted.lead.text.as_deref(), Some(format!("<p>{INTRO}</p>").as_str()));
        assert!(formatted.lead.intro.is_some());
    }

    #[test]
    fn test_main_page_legacy_keeps_order() {
        let html = format!(
            "<body><div id=\"mp-topbanner\">Welcome</div><p>{INTRO}</p><h2 id=\"News\">News</h2><p>n</p></body>"
        );
        let meta = Metadata { mainpage: true, ..Default::default() };
        let all = run(&collected(&html, meta), Mode::Legacy);
        let text = all.lead.text.as_deref().unwrap();
        assert_eq!(text, format!("<div id=\"mp-topbanner\">Welcome</div><p>{INTRO}</p>"));

        let sections = all.lead.sections.as_ref().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].text.as_deref(), Some(text));
        assert!(all.lead.infobox.is_none());
        assert!(all.lead.intro.is_none());
    }

    #[test]
    fn test_main_page_skips_extraction() {
        let meta = Metadata { mainpage: true, ..Default::default() };
        let all = run(&collected(&article(), meta), Mode::Formatted);
        assert!(all.lead.mainpage);
        assert!(all.lead.infobox.is_none());
        assert!(all.lead.intro.is_none());
        assert!(all.lead.text.as_ref().unwrap().starts_with("<table"));
        assert!(all.lead.sections.is_some());
    }

    #[test]
    fn test_optional_metadata_fields() {
        let json = serde_json::to_value(run(&collected(&article(), Metadata::default()), Mode::Legacy).lead).unwrap();
        for absent in ["contentmodel", "disambiguation", "image", "mainpage", "wikibase_item", "redirected", "tid"] {
            assert!(json.get(absent).is_none(), "{absent} should be absent");
        }
        assert_eq!(json["protection"], json!({}));
    }

    #[test]
    fn test_present_metadata_fields() {
        let mut meta = Metadata {
            contentmodel: "json".to_string(),
            image: Some(PageImage { file: "Foo.jpg".to_string() }),
            thumb: Some(Thumbnail { url: "//u/320px-Foo.jpg".to_string(), width: None, height: None }),
            ..Default::default()
        };
        meta.pageprops.insert("disambiguation".to_string(), json!(""));
        let json = serde_json::to_value(run(&collected(&article(), meta), Mode::Legacy).lead).unwrap();
        assert_eq!(json["contentmodel"], "json");
        assert_eq!(json["disambiguation"], true);
        assert_eq!(json["image"]["file"], "Foo.jpg");
        assert_eq!(json["image"]["urls"]["640"], "//u/640px-Foo.jpg");
    }

    #[test]
    fn test_build_remaining_empty() {
        let remaining = build_remaining(&[Section::lead("<p>x</p>".to_string())], &ReferenceTerms::default(), "en");
        assert!(remaining.sections.is_empty());
    }
}

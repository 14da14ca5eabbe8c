//! Page metadata as reported by the action API.
//!
//! [`Metadata`] is the collected, not yet projected, view of a page. It
//! deserializes from the same JSON shape it serializes to, so a metadata
//! file saved by the CLI can be fed back in for offline runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content model of ordinary wiki pages.
pub const WIKITEXT: &str = "wikitext";

/// Protection levels keyed by action (`edit`, `move`, ...). Empty when unprotected.
pub type Protection = BTreeMap<String, Vec<String>>;

/// Everything known about a page apart from its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub id: u64,
    pub ns: i64,
    pub contentmodel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmodified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmodifier: Option<LastModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displaytitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalizedtitle: Option<String>,
    pub protection: Protection,
    pub editable: bool,
    pub mainpage: bool,
    pub languagecount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PageImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<Thumbnail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pageprops: BTreeMap<String, serde_json::Value>,
    /// Target title (with fragment) when the request followed a redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imageinfo: Option<serde_json::Value>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            id: 0,
            ns: 0,
            contentmodel: WIKITEXT.to_string(),
            lastmodified: None,
            lastmodifier: None,
            displaytitle: None,
            normalizedtitle: None,
            protection: Protection::new(),
            editable: false,
            mainpage: false,
            languagecount: 0,
            description: None,
            image: None,
            thumb: None,
            geo: None,
            pageprops: BTreeMap::new(),
            redirected: None,
            userinfo: None,
            imageinfo: None,
        }
    }
}

impl Metadata {
    /// Content model, only when it is not plain wikitext.
    pub fn non_default_contentmodel(&self) -> Option<&str> {
        Some(self.contentmodel.as_str()).filter(|model| !model.is_empty() && *model != WIKITEXT)
    }

    /// Whether pageprops mark the page as a disambiguation page.
    pub fn is_disambiguation(&self) -> bool {
        self.pageprops.contains_key("disambiguation")
    }

    /// Wikidata item id from pageprops.
    pub fn wikibase_item(&self) -> Option<String> {
        self.pageprops
            .get("wikibase_item")
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }
}

/// Last editor of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastModifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub anon: bool,
}

/// The page's lead image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub file: String,
}

/// A thumbnail rendering of the lead image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Primary coordinates of the page subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_wikitext() {
        let meta = Metadata::default();
        assert_eq!(meta.contentmodel, "wikitext");
        assert_eq!(meta.non_default_contentmodel(), None);
        assert!(meta.protection.is_empty());
    }

    #[test]
    fn test_non_default_contentmodel() {
        let meta = Metadata { contentmodel: "json".to_string(), ..Default::default() };
        assert_eq!(meta.non_default_contentmodel(), Some("json"));
    }

    #[test]
    fn test_disambiguation_and_wikibase() {
        let mut meta = Metadata::default();
        assert!(!meta.is_disambiguation());
        meta.pageprops.insert("disambiguation".to_string(), json!(""));
        meta.pageprops.insert("wikibase_item".to_string(), json!("Q42"));
        assert!(meta.is_disambiguation());
        assert_eq!(meta.wikibase_item().as_deref(), Some("Q42"));
    }

    #[test]
    fn test_deserialize_partial() {
        let meta: Metadata = serde_json::from_value(json!({
            "id": 12,
            "ns": 2,
            "editable": true,
            "protection": { "edit": ["sysop"] }
        }))
        .unwrap();
        assert_eq!(meta.id, 12);
        assert_eq!(meta.ns, 2);
        assert_eq!(meta.contentmodel, "wikitext");
        assert_eq!(meta.protection["edit"], vec!["sysop".to_string()]);
    }

    #[test]
    fn test_lastmodifier_skips_defaults() {
        let modifier = LastModifier { user: Some("Alice".to_string()), ..Default::default() };
        assert_eq!(serde_json::to_value(&modifier).unwrap(), json!({ "user": "Alice" }));
        let anon = LastModifier { anon: true, ..Default::default() };
        assert_eq!(serde_json::to_value(&anon).unwrap(), json!({ "anon": true }));
    }
}

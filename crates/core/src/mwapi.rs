//! Action API queries and response parsing.
//!
//! Each query has a `*_params` builder and a `parse_*` function so that the
//! HTTP client and the in-memory source share the same decoding.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::metadata::{Geo, LastModifier, Metadata, PageImage, Protection, Thumbnail};
use crate::sections::Section;
use crate::siteinfo::{Namespace, SiteInfo, TitleCase};
use crate::source::MobileView;
use crate::{Result, SectioError};

/// Widths the lead image is offered at.
pub const LEAD_IMAGE_WIDTHS: [u32; 4] = [320, 640, 800, 1024];

/// Width requested for file-page image info.
pub const LEAD_IMAGE_L: u32 = 800;

static THUMB_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+px-").unwrap());

type Params = Vec<(&'static str, String)>;

fn base_params() -> Params {
    vec![("action", "query".to_string()), ("format", "json".to_string()), ("formatversion", "2".to_string())]
}

/// Query for page metadata.
pub fn metadata_params(title: &str) -> Params {
    let mut params = base_params();
    params.extend([
        ("titles", title.to_string()),
        ("redirects", "true".to_string()),
        ("prop", "info|revisions|pageprops|pageimages|coordinates|description|langlinkscount".to_string()),
        ("inprop", "protection|displaytitle".to_string()),
        ("intestactions", "edit".to_string()),
        ("rvprop", "user|timestamp".to_string()),
        ("piprop", "thumbnail|name".to_string()),
        ("pithumbsize", LEAD_IMAGE_WIDTHS[0].to_string()),
        ("pilicense", "any".to_string()),
        ("colimit", "1".to_string()),
    ]);
    params
}

/// Query for site information.
pub fn siteinfo_params() -> Params {
    let mut params = base_params();
    params.extend([
        ("meta", "siteinfo".to_string()),
        ("siprop", "general|namespaces|namespacealiases".to_string()),
    ]);
    params
}

/// Query for the mobile rendering of a page.
pub fn mobileview_params(title: &str) -> Params {
    vec![
        ("action", "mobileview".to_string()),
        ("format", "json".to_string()),
        ("formatversion", "2".to_string()),
        ("page", title.to_string()),
        ("prop", "text|sections|revision".to_string()),
        ("sections", "all".to_string()),
        ("sectionprop", "toclevel|line|anchor".to_string()),
        ("noheadings", "true".to_string()),
    ]
}

/// Query for the global account of a user page's owner.
pub fn userinfo_params(owner: &str) -> Params {
    let mut params = base_params();
    params.extend([("meta", "globaluserinfo".to_string()), ("guiuser", owner.to_string())]);
    params
}

/// Query for the image of a file page.
pub fn imageinfo_params(title: &str) -> Params {
    let mut params = base_params();
    params.extend([
        ("titles", title.to_string()),
        ("prop", "imageinfo".to_string()),
        ("iiprop", "url".to_string()),
        ("iiurlwidth", LEAD_IMAGE_L.to_string()),
        ("iiurlheight", (LEAD_IMAGE_L * 3 / 4).to_string()),
    ]);
    params
}

/// Fails when the body is an API error envelope.
pub fn check_api_error(body: &Value, title: &str) -> Result<()> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
    let info = error.get("info").and_then(Value::as_str).unwrap_or(code);
    match code {
        "missingtitle" | "invalidtitle" | "nosuchrevid" => {
            Err(SectioError::UpstreamNotFound { title: title.to_string() })
        }
        _ => Err(SectioError::InvalidResponse(format!("{code}: {info}"))),
    }
}

/// Decodes a metadata query response.
///
/// # Errors
///
/// Returns [`SectioError::UpstreamNotFound`] for missing or invalid titles
/// and [`SectioError::InvalidResponse`] when the body has no page.
pub fn parse_metadata(body: &Value, title: &str) -> Result<Metadata> {
    check_api_error(body, title)?;
    let query = body
        .get("query")
        .ok_or_else(|| SectioError::InvalidResponse("metadata response without query".to_string()))?;
    let page = query
        .get("pages")
        .and_then(Value::as_array)
        .and_then(|pages| pages.first())
        .ok_or_else(|| SectioError::InvalidResponse("metadata response without pages".to_string()))?;

    if flag(page, "missing") || flag(page, "invalid") {
        return Err(SectioError::UpstreamNotFound { title: title.to_string() });
    }

    let revision = page.get("revisions").and_then(Value::as_array).and_then(|revs| revs.first());

    let normalizedtitle = query
        .get("normalized")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(|entry| str_field(entry, "to"))
        .unwrap_or_else(|| title.replace('_', " "));

    Ok(Metadata {
        id: page.get("pageid").and_then(Value::as_u64).unwrap_or_default(),
        ns: page.get("ns").and_then(Value::as_i64).unwrap_or_default(),
        contentmodel: str_field(page, "contentmodel").unwrap_or_else(|| crate::metadata::WIKITEXT.to_string()),
        lastmodified: revision.and_then(|rev| str_field(rev, "timestamp")).or_else(|| str_field(page, "touched")),
        lastmodifier: revision.map(|rev| {
            if flag(rev, "anon") {
                LastModifier { anon: true, ..Default::default() }
            } else {
                LastModifier { user: str_field(rev, "user"), gender: str_field(rev, "gender"), anon: false }
            }
        }),
        displaytitle: str_field(page, "displaytitle"),
        normalizedtitle: Some(normalizedtitle),
        protection: parse_protection(page),
        editable: page
            .get("actions")
            .and_then(|actions| actions.get("edit"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        mainpage: false,
        languagecount: page
            .get("langlinkscount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        description: str_field(page, "description"),
        image: str_field(page, "pageimage").map(|file| PageImage { file }),
        thumb: page.get("thumbnail").and_then(|thumb| {
            str_field(thumb, "source").map(|url| Thumbnail {
                url,
                width: thumb.get("width").and_then(Value::as_u64).map(|w| w as u32),
                height: thumb.get("height").and_then(Value::as_u64).map(|h| h as u32),
            })
        }),
        geo: page
            .get("coordinates")
            .and_then(Value::as_array)
            .and_then(|coords| coords.first())
            .and_then(|coord| {
                Some(Geo { latitude: coord.get("lat")?.as_f64()?, longitude: coord.get("lon")?.as_f64()? })
            }),
        pageprops: page
            .get("pageprops")
            .and_then(Value::as_object)
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
        redirected: query
            .get("redirects")
            .and_then(Value::as_array)
            .and_then(|list| list.last())
            .and_then(|entry| {
                let to = str_field(entry, "to")?;
                Some(match str_field(entry, "tofragment") {
                    Some(fragment) => format!("{to}#{fragment}"),
                    None => to,
                })
            }),
        userinfo: None,
        imageinfo: None,
    })
}

fn parse_protection(page: &Value) -> Protection {
    let mut protection = Protection::new();
    let entries = page.get("protection").and_then(Value::as_array).into_iter().flatten();
    for entry in entries {
        if let (Some(kind), Some(level)) = (str_field(entry, "type"), str_field(entry, "level")) {
            protection.entry(kind).or_default().push(level);
        }
    }
    protection
}

/// Decodes a site information response.
pub fn parse_siteinfo(body: &Value) -> Result<SiteInfo> {
    check_api_error(body, "")?;
    let query = body
        .get("query")
        .ok_or_else(|| SectioError::InvalidResponse("siteinfo response without query".to_string()))?;
    let general = query
        .get("general")
        .ok_or_else(|| SectioError::InvalidResponse("siteinfo response without general".to_string()))?;

    let mut namespaces: Vec<Namespace> = match query.get("namespaces") {
        Some(Value::Object(map)) => map.values().filter_map(parse_namespace).collect(),
        Some(Value::Array(list)) => list.iter().filter_map(parse_namespace).collect(),
        _ => Vec::new(),
    };
    namespaces.sort_by_key(|ns| ns.id);

    for alias in query.get("namespacealiases").and_then(Value::as_array).into_iter().flatten() {
        let id = alias.get("id").and_then(Value::as_i64);
        let name = str_field(alias, "alias");
        if let (Some(id), Some(name)) = (id, name)
            && let Some(ns) = namespaces.iter_mut().find(|ns| ns.id == id)
        {
            ns.aliases.push(name);
        }
    }

    let defaults = SiteInfo::default();
    Ok(SiteInfo {
        main_page: str_field(general, "mainpage").unwrap_or(defaults.main_page),
        lang: str_field(general, "lang").unwrap_or(defaults.lang),
        case: parse_case(general),
        namespaces: if namespaces.is_empty() { defaults.namespaces } else { namespaces },
    })
}

fn parse_namespace(value: &Value) -> Option<Namespace> {
    Some(Namespace {
        id: value.get("id")?.as_i64()?,
        name: str_field(value, "name").unwrap_or_default(),
        canonical: str_field(value, "canonical"),
        aliases: Vec::new(),
        case: parse_case(value),
    })
}

fn parse_case(value: &Value) -> TitleCase {
    match value.get("case").and_then(Value::as_str) {
        Some("case-sensitive") => TitleCase::CaseSensitive,
        _ => TitleCase::FirstLetter,
    }
}

/// Decodes a mobileview response into sections.
pub fn parse_mobileview(body: &Value, title: &str) -> Result<MobileView> {
    check_api_error(body, title)?;
    let view = body
        .get("mobileview")
        .ok_or_else(|| SectioError::InvalidResponse("mobileview response without mobileview".to_string()))?;

    let sections = view
        .get("sections")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, section)| {
            let id = section.get("id").and_then(Value::as_u64).map(|id| id as usize).unwrap_or(index);
            if id == 0 {
                Section::lead(str_field(section, "text").unwrap_or_default())
            } else {
                Section {
                    id,
                    toclevel: section.get("toclevel").and_then(Value::as_u64).map(|level| level.clamp(1, 6) as u8),
                    line: str_field(section, "line"),
                    anchor: str_field(section, "anchor"),
                    text: str_field(section, "text").unwrap_or_default(),
                    is_reference_section: None,
                }
            }
        })
        .collect();

    Ok(MobileView { revision: view.get("revision").and_then(as_u64_lenient), sections })
}

/// Global account info from a `globaluserinfo` response, if any.
pub fn parse_userinfo(body: &Value) -> Option<Value> {
    body.get("query")?.get("globaluserinfo").cloned()
}

/// First image info entry from an `imageinfo` response, if any.
pub fn parse_imageinfo(body: &Value) -> Option<Value> {
    body.get("query")?
        .get("pages")?
        .as_array()?
        .first()?
        .get("imageinfo")?
        .as_array()?
        .first()
        .cloned()
}

/// Thumbnail URLs of the lead image at each width, keyed by width.
///
/// The `NNNpx-` token of the thumbnail URL is rewritten; URLs without one are
/// used unchanged.
///
/// ```rust
/// use sectio_core::mwapi::lead_image_urls;
///
/// let urls = lead_image_urls("//upload.example.org/thumb/a/ab/Foo.jpg/320px-Foo.jpg", &[640]);
/// assert_eq!(urls[&640], "//upload.example.org/thumb/a/ab/Foo.jpg/640px-Foo.jpg");
/// ```
pub fn lead_image_urls(url: &str, widths: &[u32]) -> BTreeMap<u32, String> {
    widths
        .iter()
        .map(|width| (*width, THUMB_WIDTH_RE.replace(url, format!("{width}px-")).to_string()))
        .collect()
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Boolean flags come as `true` in formatversion 2 and as `""` in version 1.
fn flag(value: &Value, name: &str) -> bool {
    match value.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(_)) => true,
        _ => false,
    }
}

fn as_u64_lenient(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata_body() -> Value {
        json!({
            "query": {
                "normalized": [{ "from": "main_page", "to": "Main page" }],
                "redirects": [{ "from": "Main page", "to": "Main Page", "tofragment": "Top" }],
                "pages": [{
                    "pageid": 15580374,
                    "ns": 0,
                    "title": "Main Page",
                    "contentmodel": "wikitext",
                    "touched": "2017-01-01T00:00:00Z",
                    "displaytitle": "Main Page",
                    "protection": [
                        { "type": "edit", "level": "sysop", "expiry": "infinity" },
                        { "type": "move", "level": "sysop", "expiry": "infinity" }
                    ],
                    "actions": { "edit": false },
                    "revisions": [{ "user": "Alice", "timestamp": "2017-02-03T04:05:06Z" }],
                    "pageprops": { "wikibase_item": "Q5296" },
                    "pageimage": "Example.jpg",
                    "thumbnail": {
                        "source": "//upload.example.org/thumb/Example.jpg/320px-Example.jpg",
                        "width": 320,
                        "height": 240
                    },
                    "coordinates": [{ "lat": 51.5, "lon": -0.12, "primary": true }],
                    "description": "main page of a wiki",
                    "langlinkscount": 42
                }]
            }
        })
    }

    #[test]
    fn test_parse_metadata() {
        let meta = parse_metadata(&metadata_body(), "main_page").unwrap();
        assert_eq!(meta.id, 15580374);
        assert_eq!(meta.lastmodified.as_deref(), Some("2017-02-03T04:05:06Z"));
        assert_eq!(meta.lastmodifier.as_ref().unwrap().user.as_deref(), Some("Alice"));
        assert_eq!(meta.normalizedtitle.as_deref(), Some("Main page"));
        assert_eq!(meta.protection["edit"], vec!["sysop".to_string()]);
        assert_eq!(meta.protection["move"], vec!["sysop".to_string()]);
        assert!(!meta.editable);
        assert_eq!(meta.languagecount, 42);
        assert_eq!(meta.wikibase_item().as_deref(), Some("Q5296"));
        assert_eq!(meta.image.unwrap().file, "Example.jpg");
        assert_eq!(meta.thumb.unwrap().width, Some(320));
        assert_eq!(meta.geo.unwrap().latitude, 51.5);
        assert_eq!(meta.redirected.as_deref(), Some("Main Page#Top"));
    }

    #[test]
    fn test_parse_metadata_unprotected() {
        let body = json!({ "query": { "pages": [{ "pageid": 1, "ns": 0, "title": "Foo" }] } });
        let meta = parse_metadata(&body, "Foo").unwrap();
        assert!(meta.protection.is_empty());
        assert_eq!(meta.contentmodel, "wikitext");
        assert_eq!(meta.normalizedtitle.as_deref(), Some("Foo"));
        assert!(meta.redirected.is_none());
    }

    #[test]
    fn test_parse_metadata_missing() {
        let body = json!({ "query": { "pages": [{ "ns": 0, "title": "Weoiuyrxcmxn", "missing": true }] } });
        let err = parse_metadata(&body, "weoiuyrxcmxn").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_metadata_without_query() {
        let err = parse_metadata(&json!({}), "Foo").unwrap_err();
        assert!(matches!(err, SectioError::InvalidResponse(_)));
    }

    #[test]
    fn test_api_error_envelope() {
        let body = json!({ "error": { "code": "missingtitle", "info": "The page you specified doesn't exist." } });
        assert!(check_api_error(&body, "Foo").unwrap_err().is_not_found());
        let body = json!({ "error": { "code": "internal_api_error", "info": "boom" } });
        assert_eq!(check_api_error(&body, "Foo").unwrap_err().status_code(), 502);
    }

    #[test]
    fn test_parse_siteinfo() {
        let body = json!({
            "query": {
                "general": { "mainpage": "Hauptseite", "lang": "de", "case": "first-letter" },
                "namespaces": {
                    "0": { "id": 0, "name": "", "case": "first-letter" },
                    "2": { "id": 2, "name": "Benutzer", "canonical": "User", "case": "first-letter" },
                    "6": { "id": 6, "name": "Datei", "canonical": "File", "case": "first-letter" }
                },
                "namespacealiases": [{ "id": 6, "alias": "Bild" }]
            }
        });
        let site = parse_siteinfo(&body).unwrap();
        assert_eq!(site.main_page, "Hauptseite");
        assert_eq!(site.lang, "de");
        assert_eq!(site.namespace_by_name("bild").map(|ns| ns.id), Some(6));
        assert_eq!(site.namespace_by_name("User").map(|ns| ns.name.as_str()), Some("Benutzer"));
    }

    #[test]
    fn test_parse_mobileview() {
        let body = json!({
            "mobileview": {
                "revision": "771",
                "sections": [
                    { "id": 0, "text": "<div id=\"mp-topbanner\">Welcome</div>" },
                    { "id": 1, "toclevel": 1, "line": "Featured", "anchor": "Featured", "text": "<p>tfa</p>" }
                ]
            }
        });
        let view = parse_mobileview(&body, "Main Page").unwrap();
        assert_eq!(view.revision, Some(771));
        assert_eq!(view.sections.len(), 2);
        assert!(view.sections[0].is_lead());
        assert_eq!(view.sections[1].anchor.as_deref(), Some("Featured"));
    }

    #[test]
    fn test_parse_userinfo_and_imageinfo() {
        let user = json!({
            "query": { "globaluserinfo": { "home": "enwiki", "id": 1, "registration": "2001", "name": "Alice" } }
        });
        assert_eq!(parse_userinfo(&user).unwrap()["name"], "Alice");
        assert!(parse_userinfo(&json!({})).is_none());

        let image = json!({
            "query": { "pages": [{ "imageinfo": [{ "url": "https://upload.example.org/a.jpg", "thumburl": "t" }] }] }
        });
        assert_eq!(parse_imageinfo(&image).unwrap()["thumburl"], "t");
        assert!(parse_imageinfo(&json!({ "query": { "pages": [{}] } })).is_none());
    }

    #[test]
    fn test_lead_image_urls() {
        let urls = lead_image_urls("//upload.example.org/thumb/Foo.jpg/320px-Foo.jpg", &LEAD_IMAGE_WIDTHS);
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[&320], "//upload.example.org/thumb/Foo.jpg/320px-Foo.jpg");
        assert_eq!(urls[&1024], "//upload.example.org/thumb/Foo.jpg/1024px-Foo.jpg");
    }

    #[test]
    fn test_imageinfo_params() {
        let params = imageinfo_params("File:Foo.jpg");
        assert!(params.contains(&("iiurlwidth", "800".to_string())));
        assert!(params.contains(&("iiurlheight", "600".to_string())));
    }
}

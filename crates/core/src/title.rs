//! Title normalization against a wiki's site information.

use std::fmt;

use regex::Regex;
use std::sync::LazyLock;

use crate::siteinfo::{NS_MAIN, SiteInfo, TitleCase};

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_]+").unwrap());

/// A normalized page title.
///
/// # Example
///
/// ```rust
/// use sectio_core::{SiteInfo, Title};
///
/// let title = Title::parse("user:foo_bar", &SiteInfo::default());
/// assert_eq!(title.namespace(), 2);
/// assert_eq!(title.to_string(), "User:Foo bar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    namespace: i64,
    prefix: String,
    text: String,
}

impl Title {
    /// Normalizes a raw title: underscores become spaces, a known namespace
    /// prefix is replaced by its local name, and the first letter is
    /// upper-cased on first-letter wikis. A single leading colon is dropped.
    pub fn parse(raw: &str, site: &SiteInfo) -> Self {
        let cleaned = SPACES_RE.replace_all(raw, " ");
        let cleaned = cleaned.trim();
        let cleaned = cleaned.strip_prefix(':').map(str::trim_start).unwrap_or(cleaned);

        let (namespace, prefix, rest) = match cleaned.split_once(':') {
            Some((prefix, rest)) => match site.namespace_by_name(prefix) {
                Some(ns) => (ns.id, ns.name.clone(), rest.trim()),
                None => (NS_MAIN, String::new(), cleaned),
            },
            None => (NS_MAIN, String::new(), cleaned),
        };

        let case = site.namespace(namespace).map(|ns| ns.case).unwrap_or(site.case);
        let text = match case {
            TitleCase::FirstLetter if site.case == TitleCase::FirstLetter => upper_first(rest),
            _ => rest.to_string(),
        };

        Self { namespace, prefix, text }
    }

    /// Namespace id.
    pub fn namespace(&self) -> i64 {
        self.namespace
    }

    /// Title text without the namespace prefix.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the title names a subpage.
    pub fn is_subpage(&self) -> bool {
        self.text.contains('/')
    }

    /// Title with the namespace prefix, as displayed.
    pub fn prefixed(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() { write!(f, "{}", self.text) } else { write!(f, "{}:{}", self.prefix, self.text) }
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

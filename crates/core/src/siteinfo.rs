//! Per-wiki site information: main page title, language and namespaces.

use serde::{Deserialize, Serialize};

/// Namespace ids the pipeline cares about.
pub const NS_MAIN: i64 = 0;
pub const NS_USER: i64 = 2;
pub const NS_FILE: i64 = 6;

/// How the first letter of titles is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleCase {
    #[default]
    FirstLetter,
    CaseSensitive,
}

/// A namespace with its local name, canonical name and aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub case: TitleCase,
}

impl Namespace {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            canonical: Some(name.to_string()),
            aliases: Vec::new(),
            case: TitleCase::FirstLetter,
        }
    }

    fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Whether `prefix` names this namespace. Matching ignores case and
    /// treats underscores as spaces.
    pub fn is_named(&self, prefix: &str) -> bool {
        let wanted = fold(prefix);
        std::iter::once(&self.name)
            .chain(self.canonical.iter())
            .chain(self.aliases.iter())
            .any(|name| !name.is_empty() && fold(name) == wanted)
    }
}

fn fold(name: &str) -> String {
    name.replace('_', " ").trim().to_lowercase()
}

/// Site information of one wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub main_page: String,
    pub lang: String,
    pub case: TitleCase,
    pub namespaces: Vec<Namespace>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            main_page: "Main Page".to_string(),
            lang: "en".to_string(),
            case: TitleCase::FirstLetter,
            namespaces: vec![
                Namespace {
                    id: NS_MAIN,
                    name: String::new(),
                    canonical: None,
                    aliases: Vec::new(),
                    case: TitleCase::FirstLetter,
                },
                Namespace::new(-2, "Media"),
                Namespace::new(-1, "Special"),
                Namespace::new(1, "Talk"),
                Namespace::new(NS_USER, "User"),
                Namespace::new(3, "User talk"),
                Namespace::new(4, "Project"),
                Namespace::new(NS_FILE, "File").with_alias("Image"),
                Namespace::new(7, "File talk").with_alias("Image talk"),
                Namespace::new(10, "Template"),
                Namespace::new(12, "Help"),
                Namespace::new(14, "Category"),
            ],
        }
    }
}

impl SiteInfo {
    /// Looks a namespace up by id.
    pub fn namespace(&self, id: i64) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.id == id)
    }

    /// Looks a non-main namespace up by any of its names.
    pub fn namespace_by_name(&self, prefix: &str) -> Option<&Namespace> {
        self.namespaces.iter().filter(|ns| ns.id != NS_MAIN).find(|ns| ns.is_named(prefix))
    }
}

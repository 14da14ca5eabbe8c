//! Markup cleanup run on upstream HTML before it is split or shipped.
//!
//! Parsoid documents and legacy main-page sections both pass through
//! [`run_dom_transforms`]; the streaming rewrite is done with lol_html.

use regex::Regex;
use std::sync::LazyLock;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Configuration for DOM transforms
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove `[edit]` section links
    pub remove_edit_links: bool,
    /// Whether to remove category and other page-property links
    pub remove_page_props: bool,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
    /// Whether to unwrap Parsoid `<section>` wrappers so headings become top-level
    pub unwrap_sections: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_styles: true,
            remove_edit_links: true,
            remove_page_props: true,
            remove_comments: true,
            unwrap_sections: true,
        }
    }
}

/// Runs the configured transforms over an HTML document or fragment.
pub fn run_dom_transforms(html: &str, config: &TransformConfig) -> String {
    let mut processed = rewrite(html, config);

    if config.remove_comments {
        processed = remove_comments(&processed);
    }

    processed
}

/// Transforms applied to each section of the legacy main-page rendering.
///
/// These are the same rules as for Parsoid documents; main-page sections
/// carry no section wrappers, so unwrapping is a no-op for them.
pub fn run_main_page_transforms(html: &str) -> String {
    run_dom_transforms(html, &TransformConfig::default())
}

fn rewrite(html: &str, config: &TransformConfig) -> String {
    let mut output: Vec<u8> = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                if config.remove_scripts {
                    Some(lol_html::element!("script", |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
                if config.remove_styles {
                    Some(lol_html::element!("style", |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
                if config.remove_edit_links {
                    Some(lol_html::element!("span.mw-editsection", |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
                if config.remove_page_props {
                    Some(lol_html::element!(r#"link[rel^="mw:PageProp"]"#, |el| {
                        el.remove();
                        Ok(())
                    }))
                } else {
                    None
                },
                if config.unwrap_sections {
                    Some(lol_html::element!("section", |el| {
                        el.remove_and_keep_content();
                        Ok(())
                    }))
                } else {
                    None
                },
            ]
            .into_iter()
            .flatten()
            .collect(),
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    if output.is_empty() { html.to_string() } else { String::from_utf8_lossy(&output).into_owned() }
}

fn remove_comments(html: &str) -> String {
    COMMENT_RE.replace_all(html, "").to_string()
}

//! HTML parsing and tree manipulation.
//!
//! This module provides the [`Document`] type for full article documents,
//! the [`Fragment`] type for section fragments and the [`Element`] wrapper
//! used to inspect nodes with CSS selectors.
//!
//! A [`Fragment`] is an arena-backed tree: nodes are addressed by stable
//! [`NodeId`] handles that stay valid while other nodes are detached or
//! moved, which is what the lead transforms rely on.
//!
//! # Example
//!
//! ```rust
//! use sectio_core::document::Fragment;
//!
//! let mut fragment = Fragment::parse("<p>First</p><p>Second</p>");
//! let first = fragment.top_level_elements()[0].id();
//! fragment.detach(first);
//! assert_eq!(fragment.to_html(), "<p>Second</p>");
//! ```

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};

use crate::{Result, SectioError};

/// Parses a CSS selector, mapping failures onto [`SectioError::HtmlParseError`].
pub fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| SectioError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Represents a parsed article document.
///
/// Wraps a full HTML page, typically Parsoid output, and exposes its body
/// for the section splitter.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document.
    ///
    /// html5ever recovers from malformed markup, so parsing itself never fails.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Gets the `<body>` element, if the tree has one.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        let sel = selector("body").ok()?;
        self.html.select(&sel).next().map(|element| Element { element })
    }

    /// Serialized content of the body, excluding the `<body>` tags.
    pub fn body_html(&self) -> String {
        self.body().map(|b| b.inner_html()).unwrap_or_default()
    }

    /// Selects elements anywhere in the document using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SectioError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector_str: &str) -> Result<Vec<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.html.select(&sel).map(|element| Element { element }).collect())
    }

    /// Gets the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        let sel = selector("title").ok()?;
        self.html.select(&sel).next().map(|el| el.text().collect::<String>())
    }
}

/// An owned HTML fragment with stable node handles.
///
/// Fragments are parsed in a `<body>` context; the synthetic `<html>` root
/// element holds the top-level nodes.
#[derive(Debug, Clone)]
pub struct Fragment {
    html: Html,
}

impl Fragment {
    /// Parses an HTML fragment.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_fragment(html) }
    }

    fn root(&'_ self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Serializes the fragment back to HTML.
    pub fn to_html(&self) -> String {
        self.root().inner_html()
    }

    /// Top-level element nodes, in order.
    pub fn top_level_elements(&'_ self) -> Vec<Element<'_>> {
        self.root()
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .collect()
    }

    /// Gets the element behind a handle, if the handle points at an element.
    pub fn element(&'_ self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(|element| Element { element })
    }

    /// Serializes one node, whatever its kind.
    pub fn node_html(&self, id: NodeId) -> String {
        self.html.tree.get(id).map(serialize_node).unwrap_or_default()
    }

    /// Selects elements anywhere in the fragment using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SectioError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector_str: &str) -> Result<Vec<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.root().select(&sel).map(|element| Element { element }).collect())
    }

    /// Detaches a node (and its subtree) from the fragment.
    ///
    /// Unknown handles are ignored.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Moves the given top-level nodes to the front of the fragment,
    /// keeping their relative order.
    pub fn move_to_front(&mut self, ids: &[NodeId]) {
        let root_id = self.root().id();
        for id in ids.iter().rev() {
            if *id == root_id {
                continue;
            }
            self.detach(*id);
            if let Some(mut root) = self.html.tree.get_mut(root_id) {
                root.prepend_id(*id);
            }
        }
    }
}

/// Serializes a single node the way html5ever serializes the children of
/// a body element.
///
/// Text and comment nodes are copied under an empty fragment root so the
/// html5ever serializer handles their escaping.
pub(crate) fn serialize_node(node: NodeRef<'_, Node>) -> String {
    match node.value() {
        Node::Element(_) => ElementRef::wrap(node).map(|el| el.html()).unwrap_or_default(),
        Node::Text(_) | Node::Comment(_) => {
            let mut holder = Html::parse_fragment("");
            let root_id = holder.root_element().id();
            if let Some(mut root) = holder.tree.get_mut(root_id) {
                root.append(node.value().clone());
            }
            holder.root_element().inner_html()
        }
        _ => String::new(),
    }
}

/// Text content of an HTML fragment, all markup removed.
pub fn fragment_text(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use sectio_core::document::Fragment;
///
/// let fragment = Fragment::parse(r#"<a href="/wiki/Foo">Link text</a>"#);
/// let link = &fragment.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("/wiki/Foo"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl<'a> Element<'a> {
    /// Stable handle of this element in its tree.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Whether the element carries the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Heading level for `h1`..`h6`, `None` for everything else.
    pub fn heading_level(&self) -> Option<u8> {
        match self.element.value().name() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Handles of the siblings that follow this element, in order.
    pub fn following_siblings(&self) -> Vec<NodeId> {
        self.element.next_siblings().map(|node| node.id()).collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SectioError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector_str: &str) -> Result<Vec<Element<'_>>> {
        let sel = selector(selector_str)?;
        Ok(self.element.select(&sel).map(|element| Element { element }).collect())
    }

    /// Whether any descendant matches the selector. Invalid selectors never match.
    pub fn contains(&self, selector_str: &str) -> bool {
        self.select(selector_str).map(|found| !found.is_empty()).unwrap_or(false)
    }

    pub(crate) fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body><p class="content">Paragraph 1</p><h2 id="History">History</h2><p class="content">Paragraph 2</p></body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_body_html() {
        let doc = Document::parse(SAMPLE_HTML);
        let body = doc.body_html();
        assert!(body.starts_with(r#"<p class="content">Paragraph 1</p>"#));
        assert!(body.contains(r#"<h2 id="History">History</h2>"#));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(SectioError::HtmlParseError(_))));
    }

    #[test]
    fn test_heading_level() {
        let doc = Document::parse(SAMPLE_HTML);
        let heading = &doc.select("h2").unwrap()[0];
        assert_eq!(heading.heading_level(), Some(2));
        let p = &doc.select("p").unwrap()[0];
        assert_eq!(p.heading_level(), None);
    }

    #[test]
    fn test_fragment_round_trip() {
        let html = r#"<p>One &amp; two</p>text<!--note--><ul><li>x</li></ul>"#;
        let fragment = Fragment::parse(html);
        assert_eq!(fragment.to_html(), html);
        assert_eq!(fragment.root().children().count(), 4);
        assert_eq!(fragment.top_level_elements().len(), 2);
    }

    #[test]
    fn test_node_html_matches_serializer() {
        let html = "a &lt; b<p>x</p><!--c-->";
        let fragment = Fragment::parse(html);
        let joined: String = fragment.root().children().map(|node| fragment.node_html(node.id())).collect();
        assert_eq!(joined, fragment.to_html());
    }

    #[test]
    fn test_node_html_escapes_text() {
        let fragment = Fragment::parse("Tom &amp; Jerry &lt;3&nbsp;&gt;<p>x</p><!--a&b-->");
        let nodes: Vec<NodeId> = fragment.root().children().map(|node| node.id()).collect();
        assert_eq!(fragment.node_html(nodes[0]), "Tom &amp; Jerry &lt;3&nbsp;&gt;");
        assert_eq!(fragment.node_html(nodes[1]), "<p>x</p>");
        assert_eq!(fragment.node_html(nodes[2]), "<!--a&b-->");
    }

    #[test]
    fn test_fragment_text() {
        assert_eq!(fragment_text("Early <i>days</i>"), "Early days");
        assert_eq!(fragment_text(""), "");
    }

    #[test]
    fn test_fragment_detach() {
        let mut fragment = Fragment::parse("<div>a</div><p>b</p>");
        let div = fragment.top_level_elements()[0].id();
        fragment.detach(div);
        assert_eq!(fragment.to_html(), "<p>b</p>");
    }

    #[test]
    fn test_fragment_move_to_front() {
        let mut fragment = Fragment::parse("<div>a</div><p>b</p><ul><li>c</li></ul><p>d</p>");
        let elements = fragment.top_level_elements();
        let block = vec![elements[1].id(), elements[2].id()];
        fragment.move_to_front(&block);
        assert_eq!(fragment.to_html(), "<p>b</p><ul><li>c</li></ul><div>a</div><p>d</p>");
    }

    #[test]
    fn test_move_to_front_when_already_first() {
        let mut fragment = Fragment::parse("<p>b</p><div>a</div>");
        let first = fragment.top_level_elements()[0].id();
        fragment.move_to_front(&[first]);
        assert_eq!(fragment.to_html(), "<p>b</p><div>a</div>");
    }
}

//! Metadata document model: XML parsing and path queries
//!
//! A metadata file is parsed into an arena of nodes with index-based child
//! references. Queries use a simplified path syntax: `//tag` finds the first
//! element named `tag` anywhere (depth-first, document order), and
//! `//a//b//c` resolves segments left to right, each searched within the
//! subtree of the previous match. This is not XPath: no predicates, no
//! attribute axes, no ancestor axes.

use log::warn;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// A node in the parsed XML tree
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Element name (namespace prefixes already rewritten to `prefix_name`)
    pub name: String,

    /// Attributes in document order
    pub attrs: Vec<(String, String)>,

    /// Direct text content, if any
    pub text: Option<String>,

    /// Child element indices into the arena
    pub children: Vec<usize>,

    /// 1-based source line where the element's tag begins, 0 if unknown
    pub line: u32,
}

/// Arena of parsed nodes; the document root is at index 0
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
}

impl XmlTree {
    /// Node lookup by arena index
    pub fn node(&self, idx: usize) -> Option<&XmlNode> {
        self.nodes.get(idx)
    }

    /// First node named `name` in the subtree rooted at `from`, depth-first,
    /// optionally matching `from` itself
    fn find_first(&self, from: usize, name: &str, include_self: bool) -> Option<usize> {
        let node = self.nodes.get(from)?;
        if include_self && node.name == name {
            return Some(from);
        }
        for &child in &node.children {
            if let Some(found) = self.find_first(child, name, true) {
                return Some(found);
            }
        }
        None
    }

    /// Every node named `name` in the subtree rooted at `from`, depth-first
    fn find_all(&self, from: usize, name: &str, include_self: bool, out: &mut Vec<usize>) {
        let Some(node) = self.nodes.get(from) else {
            return;
        };
        if include_self && node.name == name {
            out.push(from);
        }
        for &child in &node.children {
            self.find_all(child, name, true, out);
        }
    }

    /// Resolve all but the last segment to a context node. Returns the
    /// context index and whether the context itself may match the final
    /// segment (true only when searching from the tree root).
    fn resolve_context(&self, segments: &[&str]) -> Option<(usize, bool)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut ctx = 0;
        let mut include_self = true;
        for segment in &segments[..segments.len() - 1] {
            ctx = self.find_first(ctx, segment, include_self)?;
            include_self = false;
        }
        Some((ctx, include_self))
    }

    /// Text content of a node, degrading gracefully:
    /// direct text wins; a node with nothing at all is empty; a node with a
    /// single string-valued property yields that string; anything else is
    /// serialized back to XML text.
    fn text_of(&self, idx: usize) -> String {
        let Some(node) = self.nodes.get(idx) else {
            return String::new();
        };
        if let Some(text) = &node.text {
            return text.clone();
        }
        let props = node.attrs.len() + node.children.len();
        if props == 0 {
            return String::new();
        }
        if props == 1 {
            if let Some((_, value)) = node.attrs.first() {
                return value.clone();
            }
            let child = &self.nodes[node.children[0]];
            if child.attrs.is_empty() && child.children.is_empty() {
                if let Some(text) = &child.text {
                    return text.clone();
                }
            }
        }
        self.serialize(idx)
    }

    /// Compact XML serialization of a subtree
    fn serialize(&self, idx: usize) -> String {
        let mut out = String::new();
        self.serialize_into(idx, &mut out);
        out
    }

    fn serialize_into(&self, idx: usize, out: &mut String) {
        let Some(node) = self.nodes.get(idx) else {
            return;
        };
        out.push('<');
        out.push_str(&node.name);
        for (key, value) in &node.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
        if node.text.is_none() && node.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for &child in &node.children {
            self.serialize_into(child, out);
        }
        out.push_str("</");
        out.push_str(&node.name);
        out.push('>');
    }
}

/// Result of a successful path query
///
/// Created fresh on every query and never mutated. The element keeps its
/// arena index so scoped queries (`get_in` / `get_all_in`) can resolve
/// relative to it.
#[derive(Debug, Clone)]
pub struct Element {
    value: String,
    line: u32,
    node: usize,
}

impl Element {
    /// Resolved text content of the matched node
    pub fn text(&self) -> &str {
        &self.value
    }

    /// 1-based source line of the matched node, 0 when unknown
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// A single metadata file: raw text plus the parsed tree when parsing succeeded
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    /// Identifier of the source file, as given by the caller
    pub path: String,

    /// Original file content, kept even when the tree fails to build
    pub raw_text: String,

    /// Parsed tree, `None` when the XML was malformed
    pub tree: Option<XmlTree>,
}

impl MetadataDocument {
    /// Parse raw text into a document. Never fails: malformed XML yields a
    /// document without a tree, and queries report not-found.
    pub fn parse(path: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let path = path.into();
        let raw_text = raw_text.into();
        let normalized = normalize_namespaces(&raw_text);
        let tree = match parse_tree(&normalized) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!("failed to parse XML in {}: {}", path, err);
                None
            }
        };
        Self {
            path,
            raw_text,
            tree,
        }
    }

    /// Read and parse a file from disk
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let raw_text = std::fs::read_to_string(path)?;
        Ok(Self::parse(path.display().to_string(), raw_text))
    }

    /// First element matching the path expression, or `None`
    pub fn get(&self, path_expr: &str) -> Option<Element> {
        let tree = self.tree.as_ref()?;
        let segments = split_path(path_expr)?;
        let (ctx, include_self) = tree.resolve_context(&segments)?;
        let idx = tree.find_first(ctx, segments[segments.len() - 1], include_self)?;
        Some(self.element_at(tree, idx))
    }

    /// Every element matching the path expression, in document order
    pub fn get_all(&self, path_expr: &str) -> Vec<Element> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        let Some(segments) = split_path(path_expr) else {
            return Vec::new();
        };
        let Some((ctx, include_self)) = tree.resolve_context(&segments) else {
            return Vec::new();
        };
        let mut indices = Vec::new();
        tree.find_all(ctx, segments[segments.len() - 1], include_self, &mut indices);
        indices
            .into_iter()
            .map(|idx| self.element_at(tree, idx))
            .collect()
    }

    /// Like `get`, but resolved within the subtree of a previous match
    pub fn get_in(&self, scope: &Element, path_expr: &str) -> Option<Element> {
        let tree = self.tree.as_ref()?;
        let segments = split_path(path_expr)?;
        let mut ctx = scope.node;
        for segment in &segments[..segments.len() - 1] {
            ctx = tree.find_first(ctx, segment, false)?;
        }
        let idx = tree.find_first(ctx, segments[segments.len() - 1], false)?;
        Some(self.element_at(tree, idx))
    }

    /// Like `get_all`, but resolved within the subtree of a previous match
    pub fn get_all_in(&self, scope: &Element, path_expr: &str) -> Vec<Element> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        let Some(segments) = split_path(path_expr) else {
            return Vec::new();
        };
        let mut ctx = scope.node;
        for segment in &segments[..segments.len() - 1] {
            match tree.find_first(ctx, segment, false) {
                Some(found) => ctx = found,
                None => return Vec::new(),
            }
        }
        let mut indices = Vec::new();
        tree.find_all(ctx, segments[segments.len() - 1], false, &mut indices);
        indices
            .into_iter()
            .map(|idx| self.element_at(tree, idx))
            .collect()
    }

    fn element_at(&self, tree: &XmlTree, idx: usize) -> Element {
        Element {
            value: tree.text_of(idx),
            line: tree.nodes[idx].line,
            node: idx,
        }
    }
}

/// Split a `//a//b` expression into segments. Returns `None` for anything
/// that is not the supported syntax; queries then report not-found.
fn split_path(path_expr: &str) -> Option<Vec<&str>> {
    if !path_expr.starts_with("//") {
        return None;
    }
    let segments: Vec<&str> = path_expr.split("//").filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Strip namespace declarations and rewrite prefixed names so elements can
/// be matched by bare tag name (`foo:tag` becomes `foo_tag`).
fn normalize_namespaces(xml: &str) -> String {
    static XMLNS_RE: OnceLock<Regex> = OnceLock::new();
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();

    let xmlns_re = XMLNS_RE.get_or_init(|| {
        Regex::new(r#"\s+xmlns(:[\w.-]+)?\s*=\s*("[^"]*"|'[^']*')"#).unwrap()
    });
    // Requires a word character after the colon so URLs (`https://...`)
    // in text content survive.
    let prefix_re = PREFIX_RE.get_or_init(|| Regex::new(r"(\w+):(\w)").unwrap());

    // Keep newlines from removed declarations so line numbers survive.
    let stripped = xmlns_re.replace_all(xml, |caps: &regex::Captures| {
        caps[0].chars().filter(|&c| c == '\n').collect::<String>()
    });
    prefix_re.replace_all(&stripped, "${1}_${2}").into_owned()
}

/// Parse normalized XML into an arena tree with line tracking
fn parse_tree(content: &str) -> Result<XmlTree, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut nodes: Vec<XmlNode> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut buf = Vec::new();

    // Pre-calculate line positions for fast lookup
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let pos_to_line = |pos: usize| -> u32 { line_starts.partition_point(|&start| start <= pos) as u32 };

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                // buffer_position is past the tag; step back to where it began
                let start = (reader.buffer_position() as usize).saturating_sub(e.len() + 2);
                let idx = push_element(&mut nodes, &stack, &e, pos_to_line(start));
                stack.push(idx);
            }

            Event::Empty(e) => {
                let start = (reader.buffer_position() as usize).saturating_sub(e.len() + 3);
                push_element(&mut nodes, &stack, &e, pos_to_line(start));
            }

            Event::End(_) => {
                stack.pop();
            }

            Event::Text(e) => {
                let text = e.unescape()?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(&parent) = stack.last() {
                        append_text(&mut nodes[parent], trimmed);
                    }
                }
            }

            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).to_string();
                if !text.is_empty() {
                    if let Some(&parent) = stack.last() {
                        append_text(&mut nodes[parent], &text);
                    }
                }
            }

            Event::Eof => break,

            _ => {} // declarations, comments, processing instructions
        }

        buf.clear();
    }

    Ok(XmlTree { nodes })
}

fn push_element(
    nodes: &mut Vec<XmlNode>,
    stack: &[usize],
    e: &quick_xml::events::BytesStart<'_>,
    line: u32,
) -> usize {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        attrs.push((key, value));
    }

    let idx = nodes.len();
    nodes.push(XmlNode {
        name,
        attrs,
        text: None,
        children: Vec::new(),
        line,
    });
    if let Some(&parent) = stack.last() {
        nodes[parent].children.push(idx);
    }
    idx
}

fn append_text(node: &mut XmlNode, chunk: &str) {
    match &mut node.text {
        Some(existing) => existing.push_str(chunk),
        slot => *slot = Some(chunk.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FLOW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Flow xmlns="http://soap.sforce.com/2006/04/metadata">
    <apiVersion>55.0</apiVersion>
    <status>Draft</status>
    <start>
        <object>Account</object>
    </start>
</Flow>"#;

    #[test]
    fn test_parse_keeps_raw_text() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        assert_eq!(doc.raw_text, FLOW);
        assert!(doc.tree.is_some());
    }

    #[test]
    fn test_malformed_xml_has_no_tree() {
        let doc = MetadataDocument::parse("Bad.flow-meta.xml", "<Flow><status>Draft</wrong>");
        assert!(doc.tree.is_none());
        assert_eq!(doc.raw_text, "<Flow><status>Draft</wrong>");
        assert!(doc.get("//status").is_none());
        assert!(doc.get_all("//status").is_empty());
    }

    #[test]
    fn test_get_single_segment() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        let status = doc.get("//status").unwrap();
        assert_eq!(status.text(), "Draft");
        assert_eq!(status.line(), 4);
    }

    #[test]
    fn test_get_first_match_wins() {
        let xml = "<root><a><x>first</x></a><b><x>second</x></b></root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//x").unwrap().text(), "first");
    }

    #[test]
    fn test_get_multi_segment() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        let object = doc.get("//start//object").unwrap();
        assert_eq!(object.text(), "Account");
        assert_eq!(object.line(), 6);
    }

    #[test]
    fn test_get_multi_segment_scopes_to_first_context() {
        // `object` exists outside `start`; only the one inside counts
        let xml = "<Flow><object>Wrong</object><start><object>Right</object></start></Flow>";
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//start//object").unwrap().text(), "Right");
    }

    #[test]
    fn test_get_missing_segment_is_none() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        assert!(doc.get("//start//missing").is_none());
        assert!(doc.get("//missing//object").is_none());
        assert!(doc.get("//nothere").is_none());
    }

    #[test]
    fn test_malformed_expression_is_none() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        assert!(doc.get("status").is_none());
        assert!(doc.get("//").is_none());
        assert!(doc.get("").is_none());
        assert!(doc.get_all("not-a-path").is_empty());
    }

    #[test]
    fn test_get_all_document_order() {
        let xml = "<root><name>one</name><nest><name>two</name></nest><name>three</name></root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        let names: Vec<String> = doc
            .get_all("//name")
            .iter()
            .map(|e| e.text().to_string())
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_get_all_multi_segment() {
        let xml = "<root><a><b>1</b><b>2</b></a><a><b>ignored</b></a></root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        // leading segments resolve first-match; all `b` under the first `a`
        let values: Vec<String> = doc
            .get_all("//a//b")
            .iter()
            .map(|e| e.text().to_string())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn test_scoped_queries() {
        let xml = "<root><lookup><auto>true</auto></lookup><lookup><auto>false</auto></lookup></root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        let lookups = doc.get_all("//lookup");
        assert_eq!(lookups.len(), 2);
        assert_eq!(doc.get_in(&lookups[0], "//auto").unwrap().text(), "true");
        assert_eq!(doc.get_in(&lookups[1], "//auto").unwrap().text(), "false");
        assert!(doc.get_in(&lookups[1], "//missing").is_none());
        assert_eq!(doc.get_all_in(&lookups[0], "//auto").len(), 1);
    }

    #[test]
    fn test_namespace_declaration_stripped() {
        let doc = MetadataDocument::parse("Foo.flow-meta.xml", FLOW);
        let flow = doc.get("//Flow").unwrap();
        assert_eq!(flow.line(), 2);
    }

    #[test]
    fn test_namespace_prefix_rewritten() {
        let xml = r#"<CustomObject xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <xsi:value>42</xsi:value>
</CustomObject>"#;
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//xsi_value").unwrap().text(), "42");
        assert!(doc.get("//value").is_none());
    }

    #[test]
    fn test_url_text_survives_normalization() {
        let xml = "<a><endpoint>https://example.com/path</endpoint></a>";
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//endpoint").unwrap().text(), "https://example.com/path");
    }

    #[test]
    fn test_text_extraction_plain_value() {
        let doc = MetadataDocument::parse("t.xml", "<a><status>Active</status></a>");
        assert_eq!(doc.get("//status").unwrap().text(), "Active");
    }

    #[test]
    fn test_text_extraction_text_with_attribute() {
        // explicit text content wins over the attribute
        let doc = MetadataDocument::parse("t.xml", r#"<a><v unit="pt">30.0</v></a>"#);
        assert_eq!(doc.get("//v").unwrap().text(), "30.0");
    }

    #[test]
    fn test_text_extraction_empty_node() {
        let doc = MetadataDocument::parse("t.xml", "<a><empty/></a>");
        assert_eq!(doc.get("//empty").unwrap().text(), "");
        let doc = MetadataDocument::parse("t.xml", "<a><empty></empty></a>");
        assert_eq!(doc.get("//empty").unwrap().text(), "");
    }

    #[test]
    fn test_text_extraction_single_string_child() {
        let doc = MetadataDocument::parse("t.xml", "<a><wrap><inner>value</inner></wrap></a>");
        assert_eq!(doc.get("//wrap").unwrap().text(), "value");
    }

    #[test]
    fn test_text_extraction_single_attribute() {
        let doc = MetadataDocument::parse("t.xml", r#"<a><v unit="pt"/></a>"#);
        assert_eq!(doc.get("//v").unwrap().text(), "pt");
    }

    #[test]
    fn test_text_extraction_falls_back_to_serialization() {
        let doc = MetadataDocument::parse("t.xml", "<a><w><x>1</x><y>2</y></w></a>");
        assert_eq!(doc.get("//w").unwrap().text(), "<w><x>1</x><y>2</y></w>");
    }

    #[test]
    fn test_line_numbers() {
        let xml = "<root>\n  <first/>\n  <second>\n    text\n  </second>\n</root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//root").unwrap().line(), 1);
        assert_eq!(doc.get("//first").unwrap().line(), 2);
        assert_eq!(doc.get("//second").unwrap().line(), 3);
    }

    #[test]
    fn test_line_numbers_survive_xmlns_strip() {
        // declaration spans its own line; following elements keep their lines
        let xml = "<root\n    xmlns=\"http://example.com/ns\">\n  <child>x</child>\n</root>";
        let doc = MetadataDocument::parse("t.xml", xml);
        assert_eq!(doc.get("//child").unwrap().line(), 3);
    }

    #[test]
    fn test_cdata_text() {
        let doc = MetadataDocument::parse("t.xml", "<a><f><![CDATA[1 < 2]]></f></a>");
        assert_eq!(doc.get("//f").unwrap().text(), "1 < 2");
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.flow-meta.xml");
        std::fs::write(&path, FLOW).unwrap();

        let doc = MetadataDocument::read(&path).unwrap();
        assert!(doc.tree.is_some());
        assert_eq!(doc.get("//status").unwrap().text(), "Draft");
    }
}

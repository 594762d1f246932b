//! Mutable SVG element tree.

use crate::error::{Error, Result};

use super::ParseOptions;

pub(super) const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub(super) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Handle to an element inside one [`Document`].
///
/// Handles are plain indices: they stay valid across clones of the same
/// document, and are meaningless for any other document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(super) usize);

/// A single attribute assignment, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub(super) enum NodeData {
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(super) struct Node {
    pub(super) data: NodeData,
    pub(super) parent: Option<usize>,
    pub(super) children: Vec<usize>,
}

/// A parsed SVG document.
///
/// Only elements in the SVG namespace are kept, together with their text
/// content; comments, processing instructions and foreign-namespace
/// elements are dropped at load time. Attributes in the `xlink` and `xml`
/// namespaces keep their conventional prefix (`xlink:href`).
#[derive(Debug, Clone)]
pub struct Document {
    pub(super) nodes: Vec<Node>,
    pub(super) root: usize,
}

impl Document {
    /// Parse SVG source text with default options.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_options(text, &ParseOptions::default())
    }

    /// Parse SVG source text.
    ///
    /// Fails with [`Error::Parse`] on malformed XML or when the root element
    /// is not `<svg>`.
    pub fn parse_with_options(text: &str, options: &ParseOptions) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Parse("SVG source is empty".to_string()));
        }

        let xml = roxmltree::Document::parse_with_options(text, options.to_xml_options())?;
        let xml_root = xml.root_element();
        if xml_root.tag_name().name() != "svg" || !is_svg_element(&xml_root) {
            return Err(Error::Parse(format!(
                "root element is <{}>, expected <svg>",
                xml_root.tag_name().name()
            )));
        }

        let mut doc = Document {
            nodes: Vec::new(),
            root: 0,
        };
        doc.root = doc.push(element_data(&xml_root), None);

        let mut stack = vec![(xml_root, doc.root)];
        while let Some((xml_node, index)) = stack.pop() {
            for child in xml_node.children() {
                if child.is_element() {
                    if !is_svg_element(&child) {
                        continue;
                    }
                    let child_index = doc.push(element_data(&child), Some(index));
                    stack.push((child, child_index));
                } else if child.is_text() {
                    if let Some(text) = child.text() {
                        doc.push(NodeData::Text(text.to_string()), Some(index));
                    }
                }
            }
        }

        Ok(doc)
    }

    fn push(&mut self, data: NodeData, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        index
    }

    /// The root `<svg>` element.
    pub fn root(&self) -> ElementId {
        ElementId(self.root)
    }

    /// Number of elements in the document.
    pub fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.data, NodeData::Element { .. }))
            .count()
    }

    fn element(&self, el: ElementId) -> Option<(&str, &[Attribute])> {
        match &self.nodes.get(el.0)?.data {
            NodeData::Element { tag, attributes } => Some((tag, attributes)),
            NodeData::Text(_) => None,
        }
    }

    fn attributes_mut(&mut self, el: ElementId) -> Option<&mut Vec<Attribute>> {
        match &mut self.nodes.get_mut(el.0)?.data {
            NodeData::Element { attributes, .. } => Some(attributes),
            NodeData::Text(_) => None,
        }
    }

    /// Local tag name of an element (e.g. `"symbol"`).
    pub fn tag_name(&self, el: ElementId) -> Option<&str> {
        self.element(el).map(|(tag, _)| tag)
    }

    /// All attributes of an element, in source order.
    pub fn attributes(&self, el: ElementId) -> &[Attribute] {
        self.element(el).map(|(_, attrs)| attrs).unwrap_or(&[])
    }

    /// Read an attribute value.
    pub fn get_attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        self.attributes(el)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check whether an attribute is present.
    pub fn has_attribute(&self, el: ElementId, name: &str) -> bool {
        self.get_attribute(el, name).is_some()
    }

    /// Assign an attribute, replacing any previous value.
    ///
    /// Calls with a handle that does not name an element are ignored.
    pub fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        let Some(attributes) = self.attributes_mut(el) else {
            return;
        };
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, el: ElementId, name: &str) -> Option<String> {
        let attributes = self.attributes_mut(el)?;
        let pos = attributes.iter().position(|a| a.name == name)?;
        Some(attributes.remove(pos).value)
    }

    /// The element's `id`, if it has a non-empty one.
    pub fn id(&self, el: ElementId) -> Option<&str> {
        self.get_attribute(el, "id").filter(|id| !id.is_empty())
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self, el: ElementId) -> impl Iterator<Item = &str> {
        self.get_attribute(el, "class")
            .unwrap_or("")
            .split_whitespace()
    }

    /// Parent element, `None` for the root.
    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.nodes.get(el.0)?.parent.map(ElementId)
    }

    /// Child elements in document order (text content is skipped).
    pub fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(el.0)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|&c| matches!(self.nodes[c].data, NodeData::Element { .. }))
                    .map(ElementId)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The element and all its descendant elements, in document order.
    pub fn descendants(&self, el: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if self.element(el).is_none() {
            return out;
        }
        let mut stack = vec![el];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Whether `ancestor` is `el` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut current = Some(el);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Find the first element (in document order) with the given id.
    pub fn find_element_by_id(&self, id: &str) -> Option<ElementId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .into_iter()
            .find(|&el| self.id(el) == Some(id))
    }

    /// Query elements with a restricted selector.
    ///
    /// Supported forms: `*`, a tag name (`symbol`), an id (`#icon`) and a
    /// single class (`.warn`). Anything else matches nothing.
    pub fn query_elements(&self, selector: &str) -> Vec<ElementId> {
        let selector = selector.trim();
        let matches = |el: ElementId| -> bool {
            if selector == "*" {
                true
            } else if let Some(id) = selector.strip_prefix('#') {
                self.id(el) == Some(id)
            } else if let Some(class) = selector.strip_prefix('.') {
                self.classes(el).any(|c| c == class)
            } else {
                self.tag_name(el) == Some(selector)
            }
        };

        if selector.is_empty() {
            return Vec::new();
        }
        self.descendants(self.root())
            .into_iter()
            .filter(|&el| matches(el))
            .collect()
    }

    /// Serialize the whole document back to SVG text.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        super::writer::write_subtree(self, self.root(), true, &mut out);
        out
    }
}

fn is_svg_element(node: &roxmltree::Node) -> bool {
    matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

fn element_data(node: &roxmltree::Node) -> NodeData {
    let attributes = node
        .attributes()
        .filter_map(|attr| {
            let name = match attr.namespace() {
                None | Some(SVG_NS) => attr.name().to_string(),
                Some(XLINK_NS) => format!("xlink:{}", attr.name()),
                Some(XML_NS) => format!("xml:{}", attr.name()),
                Some(_) => return None,
            };
            Some(Attribute {
                name,
                value: attr.value().to_string(),
            })
        })
        .collect();

    NodeData::Element {
        tag: node.tag_name().name().to_string(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 100 100">
  <!-- comment -->
  <defs>
    <symbol id="icon" viewBox="0 0 24 24">
      <rect id="bg" class="warn" width="24" height="24"/>
      <g id="inner"><circle id="dot" class="warn big" r="4"/></g>
    </symbol>
  </defs>
  <use xlink:href="#icon" x="10" y="10"/>
  <text id="label">Hi</text>
</svg>"##;

    #[test]
    fn test_parse_and_query() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.tag_name(doc.root()), Some("svg"));

        let symbols = doc.query_elements("symbol");
        assert_eq!(symbols.len(), 1);
        assert_eq!(doc.id(symbols[0]), Some("icon"));
        assert_eq!(doc.get_attribute(symbols[0], "viewBox"), Some("0 0 24 24"));

        let warn = doc.query_elements(".warn");
        assert_eq!(warn.len(), 2);
        assert_eq!(doc.id(warn[0]), Some("bg"));
        assert_eq!(doc.id(warn[1]), Some("dot"));

        assert_eq!(doc.query_elements("#label").len(), 1);
        assert!(doc.query_elements("").is_empty());
    }

    #[test]
    fn test_xlink_attribute_prefix() {
        let doc = Document::parse(SAMPLE).unwrap();
        let uses = doc.query_elements("use");
        assert_eq!(doc.get_attribute(uses[0], "xlink:href"), Some("#icon"));
    }

    #[test]
    fn test_children_in_document_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let icon = doc.find_element_by_id("icon").unwrap();
        let kids: Vec<_> = doc
            .children(icon)
            .into_iter()
            .filter_map(|c| doc.id(c))
            .collect();
        assert_eq!(kids, vec!["bg", "inner"]);
    }

    #[test]
    fn test_attribute_mutation() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let dot = doc.find_element_by_id("dot").unwrap();

        assert!(!doc.has_attribute(dot, "fill"));
        doc.set_attribute(dot, "fill", "red");
        assert_eq!(doc.get_attribute(dot, "fill"), Some("red"));
        doc.set_attribute(dot, "fill", "blue");
        assert_eq!(doc.get_attribute(dot, "fill"), Some("blue"));
        assert_eq!(doc.remove_attribute(dot, "fill"), Some("blue".to_string()));
        assert!(!doc.has_attribute(dot, "fill"));
    }

    #[test]
    fn test_clone_is_independent() {
        let doc = Document::parse(SAMPLE).unwrap();
        let mut scratch = doc.clone();
        let bg = scratch.find_element_by_id("bg").unwrap();
        scratch.set_attribute(bg, "fill", "red");

        assert_eq!(scratch.get_attribute(bg, "fill"), Some("red"));
        assert_eq!(doc.get_attribute(bg, "fill"), None);
    }

    #[test]
    fn test_ancestry() {
        let doc = Document::parse(SAMPLE).unwrap();
        let icon = doc.find_element_by_id("icon").unwrap();
        let dot = doc.find_element_by_id("dot").unwrap();
        assert!(doc.is_ancestor_or_self(icon, dot));
        assert!(!doc.is_ancestor_or_self(dot, icon));
    }

    #[test]
    fn test_rejects_non_svg_root() {
        let result = Document::parse("<html><body/></html>");
        assert!(matches!(result, Err(Error::Parse(_))));

        let result = Document::parse("   ");
        assert!(matches!(result, Err(Error::Parse(_))));

        let result = Document::parse("<svg><g></svg>");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 1_000;
        let mut text = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\">");
        for _ in 0..depth {
            text.push_str("<g>");
        }
        for _ in 0..depth {
            text.push_str("</g>");
        }
        text.push_str("</svg>");

        let options = ParseOptions::default();
        let doc = Document::parse_with_options(&text, &options).unwrap();
        assert_eq!(doc.element_count(), depth + 1);
        assert_eq!(doc.descendants(doc.root()).len(), depth + 1);
        assert!(doc.to_svg_string().ends_with("</g></svg>"));
    }
}

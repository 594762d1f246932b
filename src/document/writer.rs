//! SVG text serialization for [`Document`] subtrees.

use super::tree::{Document, ElementId, NodeData, SVG_NS, XLINK_NS};

enum Step {
    Open(usize),
    Close(usize),
}

/// Append `el` and its whole subtree to `out`.
///
/// With `declare_namespaces` the written element carries the SVG and xlink
/// namespace declarations, so the output parses as a standalone document.
pub(crate) fn write_subtree(
    doc: &Document,
    el: ElementId,
    declare_namespaces: bool,
    out: &mut String,
) {
    let start = el.0;
    if doc.nodes.get(start).is_none() {
        return;
    }

    let mut stack = vec![Step::Open(start)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(index) => {
                let node = &doc.nodes[index];
                match &node.data {
                    NodeData::Text(text) => escape_text(text, out),
                    NodeData::Element { tag, attributes } => {
                        out.push('<');
                        out.push_str(tag);
                        if declare_namespaces && index == start {
                            out.push_str(" xmlns=\"");
                            out.push_str(SVG_NS);
                            out.push_str("\" xmlns:xlink=\"");
                            out.push_str(XLINK_NS);
                            out.push('"');
                        }
                        for attr in attributes {
                            out.push(' ');
                            out.push_str(&attr.name);
                            out.push_str("=\"");
                            escape_attribute(&attr.value, out);
                            out.push('"');
                        }
                        if node.children.is_empty() {
                            out.push_str("/>");
                        } else {
                            out.push('>');
                            stack.push(Step::Close(index));
                            for &child in node.children.iter().rev() {
                                stack.push(Step::Open(child));
                            }
                        }
                    }
                }
            }
            Step::Close(index) => {
                if let NodeData::Element { tag, .. } = &doc.nodes[index].data {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
    }
}

/// Append the content of `el` (children and text, without the element's own
/// tags) to `out`.
pub(crate) fn write_children(doc: &Document, el: ElementId, out: &mut String) {
    let Some(node) = doc.nodes.get(el.0) else {
        return;
    };
    for &child in &node.children {
        match &doc.nodes[child].data {
            NodeData::Text(text) => escape_text(text, out),
            NodeData::Element { .. } => write_subtree(doc, ElementId(child), false, out),
        }
    }
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_document_reparses() {
        let source = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><g id="a" fill="red"><rect width="4" height="4"/></g><text>a &lt; b</text></svg>"#;
        let doc = Document::parse(source).unwrap();
        let text = doc.to_svg_string();

        assert!(text.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(text.contains("<g id=\"a\" fill=\"red\"><rect width=\"4\" height=\"4\"/></g>"));
        assert!(text.contains("a &lt; b"));

        let again = Document::parse(&text).unwrap();
        assert_eq!(again.element_count(), doc.element_count());
    }

    #[test]
    fn test_attribute_escaping() {
        let mut out = String::new();
        escape_attribute("a\"b&c<d", &mut out);
        assert_eq!(out, "a&quot;b&amp;c&lt;d");
    }

    #[test]
    fn test_write_children_skips_own_tags() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><symbol id="s"><rect/><circle/></symbol></svg>"#,
        )
        .unwrap();
        let symbol = doc.find_element_by_id("s").unwrap();
        let mut out = String::new();
        write_children(&doc, symbol, &mut out);
        assert_eq!(out, "<rect/><circle/>");
    }
}

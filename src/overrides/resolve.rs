//! Override resolution.
//!
//! Decides which overrides apply to an element and writes them into a
//! render-only copy of the document.

use std::collections::BTreeMap;

use serde::Serialize;

use super::store::{class_key, OverrideStore};
use crate::document::{Document, ElementId};
use crate::model::{Color, Shader};

/// Overrides that apply to one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub properties: BTreeMap<String, String>,
    pub shader: Option<Shader>,
}

impl EffectiveStyle {
    /// True when no override applies.
    pub fn is_empty(&self) -> bool {
        self.fill.is_none()
            && self.stroke.is_none()
            && self.properties.is_empty()
            && self.shader.is_none()
    }
}

/// Summary of one [`resolve_subtree`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Elements walked
    pub visited: usize,
    /// Fill attributes written
    pub fills: usize,
    /// Stroke attributes written
    pub strokes: usize,
    /// Property attributes written
    pub properties: usize,
    /// Shader overrides found, by element id, in document order
    pub shaders: Vec<(String, Shader)>,
}

/// Compute the overrides for a single element.
///
/// Id-keyed fill and stroke come first; a class-keyed entry matching any of
/// the element's classes then replaces them. With several matching classes
/// the last one in the `class` attribute wins. Properties and shaders are
/// looked up by id only.
pub fn effective_style(doc: &Document, el: ElementId, store: &OverrideStore) -> EffectiveStyle {
    let mut style = EffectiveStyle::default();

    if let Some(id) = doc.id(el) {
        style.fill = store.fill(id);
        style.stroke = store.stroke(id);
        if let Some(props) = store.properties(id) {
            style.properties = props.clone();
        }
        style.shader = store.shader(id).cloned();
    }

    for class in doc.classes(el) {
        let key = class_key(class);
        if let Some(color) = store.fill(&key) {
            style.fill = Some(color);
        }
        if let Some(color) = store.stroke(&key) {
            style.stroke = Some(color);
        }
    }

    style
}

/// Apply overrides to `root` and every element below it.
///
/// `doc` must be a scratch copy: attributes are overwritten in place. Shader
/// overrides are collected in the returned [`Resolution`], not applied.
pub fn resolve_subtree(doc: &mut Document, root: ElementId, store: &OverrideStore) -> Resolution {
    let mut resolution = Resolution::default();
    if store.is_empty() {
        resolution.visited = doc.descendants(root).len();
        return resolution;
    }

    let mut stack = vec![root];
    while let Some(el) = stack.pop() {
        resolution.visited += 1;
        let style = effective_style(doc, el, store);

        if let Some(fill) = style.fill {
            set_presentation(doc, el, "fill", &fill.to_css());
            resolution.fills += 1;
        }
        if let Some(stroke) = style.stroke {
            set_presentation(doc, el, "stroke", &stroke.to_css());
            resolution.strokes += 1;
        }
        for (name, value) in &style.properties {
            set_presentation(doc, el, name, value);
            resolution.properties += 1;
        }
        if let Some(shader) = style.shader {
            let id = doc.id(el).unwrap_or_default().to_string();
            log::debug!("Element '{}' carries shader '{}'", id, shader.name);
            resolution.shaders.push((id, shader));
        }

        stack.extend(doc.children(el).into_iter().rev());
    }

    log::debug!(
        "Resolved overrides over {} elements ({} fills, {} strokes, {} properties)",
        resolution.visited,
        resolution.fills,
        resolution.strokes,
        resolution.properties
    );
    resolution
}

/// Assign a presentation attribute and drop any same-named declaration from
/// the inline `style`, which would otherwise take precedence.
fn set_presentation(doc: &mut Document, el: ElementId, name: &str, value: &str) {
    doc.set_attribute(el, name, value);

    let Some(style) = doc.get_attribute(el, "style") else {
        return;
    };
    let kept: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            decl.split_once(':')
                .map_or(true, |(prop, _)| prop.trim() != name)
        })
        .collect();
    let rewritten = kept.join(";");

    if rewritten.is_empty() {
        doc.remove_attribute(el, "style");
    } else {
        doc.set_attribute(el, "style", &rewritten);
    }
}

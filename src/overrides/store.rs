//! Override tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fingerprint::{self, OverrideFingerprint};
use crate::error::Result;
use crate::model::{Color, Shader};

/// Prefix that marks a selector key as a class name rather than an id.
pub const CLASS_PREFIX: char = '.';

/// Selector key for a class name (`"warn"` becomes `".warn"`).
///
/// Names that already carry the prefix are returned unchanged.
pub fn class_key(class: &str) -> String {
    if class.starts_with(CLASS_PREFIX) {
        class.to_string()
    } else {
        format!("{}{}", CLASS_PREFIX, class)
    }
}

/// Caller-supplied overrides, independent of any document.
///
/// Fill and stroke tables are keyed by selector: a bare element id, or a
/// class key starting with [`CLASS_PREFIX`]. Properties and shaders are
/// keyed by element id only. Tables are sorted maps, so iteration and the
/// [`OverrideFingerprint`] never depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideStore {
    #[serde(default)]
    fills: BTreeMap<String, Color>,
    #[serde(default)]
    strokes: BTreeMap<String, Color>,
    #[serde(default)]
    properties: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    shaders: BTreeMap<String, Shader>,
    #[serde(skip)]
    fingerprint: OverrideFingerprint,
}

impl OverrideStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no table holds any entry.
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
            && self.strokes.is_empty()
            && self.properties.is_empty()
            && self.shaders.is_empty()
    }

    /// Current fingerprint of all four tables.
    pub fn fingerprint(&self) -> OverrideFingerprint {
        self.fingerprint
    }

    fn refresh(&mut self) {
        self.fingerprint = OverrideFingerprint {
            fill: fingerprint::hash_colors(&self.fills),
            stroke: fingerprint::hash_colors(&self.strokes),
            shader: fingerprint::hash_shaders(&self.shaders),
            property: fingerprint::hash_properties(&self.properties),
        };
    }

    pub fn set_fill(&mut self, selector: &str, color: Color) {
        self.fills.insert(selector.to_string(), color);
        self.refresh();
    }

    pub fn clear_fill(&mut self, selector: &str) -> bool {
        let removed = self.fills.remove(selector).is_some();
        self.refresh();
        removed
    }

    pub fn fill(&self, selector: &str) -> Option<Color> {
        self.fills.get(selector).copied()
    }

    pub fn set_stroke(&mut self, selector: &str, color: Color) {
        self.strokes.insert(selector.to_string(), color);
        self.refresh();
    }

    pub fn clear_stroke(&mut self, selector: &str) -> bool {
        let removed = self.strokes.remove(selector).is_some();
        self.refresh();
        removed
    }

    pub fn stroke(&self, selector: &str) -> Option<Color> {
        self.strokes.get(selector).copied()
    }

    /// Register an attribute assignment for one element.
    pub fn set_property(&mut self, element_id: &str, name: &str, value: &str) {
        self.properties
            .entry(element_id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self.refresh();
    }

    /// Remove one property override. Elements left without properties are
    /// dropped from the table.
    pub fn clear_property(&mut self, element_id: &str, name: &str) -> bool {
        let mut removed = false;
        if let Some(props) = self.properties.get_mut(element_id) {
            removed = props.remove(name).is_some();
            if props.is_empty() {
                self.properties.remove(element_id);
            }
        }
        self.refresh();
        removed
    }

    /// Remove every property override of one element.
    pub fn clear_properties(&mut self, element_id: &str) -> bool {
        let removed = self.properties.remove(element_id).is_some();
        self.refresh();
        removed
    }

    /// Property overrides of one element, sorted by name.
    pub fn properties(&self, element_id: &str) -> Option<&BTreeMap<String, String>> {
        self.properties.get(element_id)
    }

    pub fn set_shader(&mut self, element_id: &str, shader: Shader) {
        self.shaders.insert(element_id.to_string(), shader);
        self.refresh();
    }

    pub fn clear_shader(&mut self, element_id: &str) -> bool {
        let removed = self.shaders.remove(element_id).is_some();
        self.refresh();
        removed
    }

    pub fn shader(&self, element_id: &str) -> Option<&Shader> {
        self.shaders.get(element_id)
    }

    /// Empty every table.
    pub fn clear_all(&mut self) {
        self.fills.clear();
        self.strokes.clear();
        self.properties.clear();
        self.shaders.clear();
        self.refresh();
    }

    /// Number of entries across all tables (each property counts once).
    pub fn len(&self) -> usize {
        self.fills.len()
            + self.strokes.len()
            + self.shaders.len()
            + self.properties.values().map(BTreeMap::len).sum::<usize>()
    }

    /// Snapshot the tables as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a store from a [`to_json`](Self::to_json) snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut store: OverrideStore = serde_json::from_str(json)?;
        store.refresh();
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_key() {
        assert_eq!(class_key("warn"), ".warn");
        assert_eq!(class_key(".warn"), ".warn");
    }

    #[test]
    fn test_fingerprint_tracks_mutations() {
        let mut store = OverrideStore::new();
        assert!(store.fingerprint().is_empty());

        store.set_fill("e1", Color::RED);
        let after_fill = store.fingerprint();
        assert_ne!(after_fill.fill, 0);
        assert_eq!(after_fill.stroke, 0);

        store.set_fill("e1", Color::BLUE);
        assert_ne!(store.fingerprint(), after_fill);

        store.clear_fill("e1");
        assert!(store.fingerprint().is_empty());
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let mut a = OverrideStore::new();
        a.set_fill("x", Color::RED);
        a.set_fill(".warn", Color::BLUE);
        a.set_property("x", "opacity", "0.5");
        a.set_property("x", "stroke-width", "2");

        let mut b = OverrideStore::new();
        b.set_property("x", "stroke-width", "2");
        b.set_fill(".warn", Color::BLUE);
        b.set_property("x", "opacity", "0.5");
        b.set_fill("x", Color::RED);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_value_in_different_table_differs() {
        let mut fill = OverrideStore::new();
        fill.set_fill("e1", Color::RED);
        let mut stroke = OverrideStore::new();
        stroke.set_stroke("e1", Color::RED);
        assert_ne!(fill.fingerprint(), stroke.fingerprint());
    }

    #[test]
    fn test_property_removal() {
        let mut store = OverrideStore::new();
        store.set_property("e1", "opacity", "0.5");
        store.set_property("e1", "stroke-width", "3");
        assert_eq!(store.len(), 2);

        assert!(store.clear_property("e1", "opacity"));
        assert!(!store.clear_property("e1", "opacity"));
        assert_eq!(store.properties("e1").map(BTreeMap::len), Some(1));

        assert!(store.clear_property("e1", "stroke-width"));
        assert!(store.properties("e1").is_none());
        assert!(store.is_empty());
        assert!(store.fingerprint().is_empty());
    }

    #[test]
    fn test_json_snapshot_restores_fingerprint() {
        let mut store = OverrideStore::new();
        store.set_stroke(".outline", Color::rgba(0, 0, 0, 128));
        store.set_shader("e2", Shader::new("glow", "void main() {}"));

        let json = store.to_json().unwrap();
        let restored = OverrideStore::from_json(&json).unwrap();
        assert_eq!(restored.fingerprint(), store.fingerprint());
        assert_eq!(restored.shader("e2").map(|s| s.name.as_str()), Some("glow"));
    }
}

//! Order-independent digests of the override tables.

use std::collections::BTreeMap;
use std::fmt;

use md5::{Digest, Md5};
use serde::Serialize;

use crate::model::{Color, Shader};

const FIELD_SEP: u8 = 0x1f;
const RECORD_SEP: u8 = 0x1e;

/// One digest per override table.
///
/// A table that is empty hashes to `0`, so a store with no overrides has an
/// empty fingerprint and cache keys carry no override suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct OverrideFingerprint {
    pub fill: u64,
    pub stroke: u64,
    pub shader: u64,
    pub property: u64,
}

impl OverrideFingerprint {
    /// True when every table is empty.
    pub fn is_empty(&self) -> bool {
        self.fill == 0 && self.stroke == 0 && self.shader == 0 && self.property == 0
    }
}

impl fmt::Display for OverrideFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}_{:x}_{:x}_{:x}",
            self.fill, self.stroke, self.shader, self.property
        )
    }
}

/// Digest of records whose fields are written in a fixed order.
///
/// Callers must feed records sorted by key; `BTreeMap` iteration does that.
struct TableHasher {
    md5: Md5,
    records: usize,
}

impl TableHasher {
    fn new() -> Self {
        Self {
            md5: Md5::new(),
            records: 0,
        }
    }

    fn record(&mut self, fields: &[&str]) {
        for field in fields {
            self.md5.update(field.as_bytes());
            self.md5.update([FIELD_SEP]);
        }
        self.md5.update([RECORD_SEP]);
        self.records += 1;
    }

    fn finish(self) -> u64 {
        if self.records == 0 {
            return 0;
        }
        let digest = self.md5.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

pub(super) fn hash_colors(table: &BTreeMap<String, Color>) -> u64 {
    let mut hasher = TableHasher::new();
    for (key, color) in table {
        hasher.record(&[key.as_str(), color.to_hex().as_str()]);
    }
    hasher.finish()
}

pub(super) fn hash_shaders(table: &BTreeMap<String, Shader>) -> u64 {
    let mut hasher = TableHasher::new();
    for (key, shader) in table {
        hasher.record(&[key.as_str(), shader.name.as_str(), shader.source.as_str()]);
    }
    hasher.finish()
}

pub(super) fn hash_properties(table: &BTreeMap<String, BTreeMap<String, String>>) -> u64 {
    let mut hasher = TableHasher::new();
    for (id, props) in table {
        for (name, value) in props {
            hasher.record(&[id.as_str(), name.as_str(), value.as_str()]);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables_hash_to_zero() {
        assert_eq!(hash_colors(&BTreeMap::new()), 0);
        assert_eq!(hash_shaders(&BTreeMap::new()), 0);
        assert_eq!(hash_properties(&BTreeMap::new()), 0);
        assert!(OverrideFingerprint::default().is_empty());
    }

    #[test]
    fn test_field_boundaries_matter() {
        let mut a = BTreeMap::new();
        a.insert("e".to_string(), BTreeMap::from([("1x".to_string(), "y".to_string())]));
        let mut b = BTreeMap::new();
        b.insert("e1".to_string(), BTreeMap::from([("x".to_string(), "y".to_string())]));
        assert_ne!(hash_properties(&a), hash_properties(&b));
    }

    #[test]
    fn test_color_change_changes_hash() {
        let red = BTreeMap::from([("e1".to_string(), Color::RED)]);
        let blue = BTreeMap::from([("e1".to_string(), Color::BLUE)]);
        assert_ne!(hash_colors(&red), hash_colors(&blue));
        assert_eq!(hash_colors(&red), hash_colors(&red.clone()));
    }

    #[test]
    fn test_display() {
        let fp = OverrideFingerprint {
            fill: 0xab,
            stroke: 0,
            shader: 1,
            property: 0xff,
        };
        assert_eq!(fp.to_string(), "ab_0_1_ff");
    }
}

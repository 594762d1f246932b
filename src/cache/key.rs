//! Cache key construction.

use std::fmt;

use crate::model::Size;
use crate::overrides::OverrideFingerprint;

/// What a cached image shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentId {
    Document,
    Symbol(String),
    Element(String),
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Document => f.write_str("document"),
            ContentId::Symbol(id) => write!(f, "symbol:{}", id),
            ContentId::Element(id) => write!(f, "element:{}", id),
        }
    }
}

/// Build the cache key for `content` rendered at `render_size` under the
/// given override state.
///
/// The key is `<content>_<w>x<h>`, followed by `_ov_<fingerprint>` when any
/// override is active.
pub fn build_key(
    content: &ContentId,
    render_size: Size,
    overrides: &OverrideFingerprint,
) -> String {
    let mut key = format!("{}_{}", content, render_size);
    if !overrides.is_empty() {
        key.push_str("_ov_");
        key.push_str(&overrides.to_string());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_key() {
        let fp = OverrideFingerprint::default();
        assert_eq!(build_key(&ContentId::Document, Size::new(64, 32), &fp), "document_64x32");
        assert_eq!(
            build_key(&ContentId::Symbol("icon".into()), Size::square(16), &fp),
            "symbol:icon_16x16"
        );
    }

    #[test]
    fn test_override_suffix() {
        let fp = OverrideFingerprint {
            fill: 1,
            ..Default::default()
        };
        let key = build_key(&ContentId::Element("e1".into()), Size::square(8), &fp);
        assert_eq!(key, "element:e1_8x8_ov_1_0_0_0");
    }

    #[test]
    fn test_content_kinds_do_not_collide() {
        let fp = OverrideFingerprint::default();
        let size = Size::square(32);
        assert_ne!(
            build_key(&ContentId::Symbol("a".into()), size, &fp),
            build_key(&ContentId::Element("a".into()), size, &fp)
        );
    }
}

//! Caller-supplied style overrides and their resolution.
//!
//! The [`OverrideStore`] holds four tables (fill, stroke, property and
//! shader). [`resolve_subtree`] applies them to a scratch copy of a
//! document right before it is rendered; the loaded document itself is
//! never touched.

mod fingerprint;
mod resolve;
mod store;

pub use fingerprint::OverrideFingerprint;
pub use resolve::{effective_style, resolve_subtree, EffectiveStyle, Resolution};
pub use store::{class_key, OverrideStore, CLASS_PREFIX};

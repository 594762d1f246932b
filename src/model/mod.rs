//! Value types shared across the crate.
//!
//! These are plain data: sizes, boxes, colors, shader handles and symbol
//! descriptions. None of them own document or cache state.

mod color;
mod geometry;
mod shader;
mod symbol;

pub use color::Color;
pub use geometry::{BoundingBox, Size};
pub use shader::Shader;
pub use symbol::Symbol;

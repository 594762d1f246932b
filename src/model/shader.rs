//! Opaque shader handles passed to the post-process hook.

use serde::{Deserialize, Serialize};

/// A shader reference the core never executes itself.
///
/// The resource only stores, fingerprints and forwards shaders; running
/// them is the job of an injected [`crate::render::PostProcessor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shader {
    /// Caller-chosen name, used in logs
    pub name: String,
    /// Shader source code, opaque to this crate
    pub source: String,
}

impl Shader {
    /// Create a new shader handle.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// A shader with no source code cannot be run by any post-processor.
    pub fn is_valid(&self) -> bool {
        !self.source.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_validity() {
        assert!(Shader::new("tint", "void main() {}").is_valid());
        assert!(!Shader::new("empty", "   ").is_valid());
    }
}

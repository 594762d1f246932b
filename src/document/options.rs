//! Document loading options.

/// Options for parsing SVG documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Accept a `<!DOCTYPE>` (common in editor exports); entity expansion
    /// is still bounded by `nodes_limit`
    pub allow_dtd: bool,

    /// Upper bound on the number of XML nodes (guards against entity bombs)
    pub nodes_limit: u32,

    /// Accept gzip-compressed input (`.svgz`) in byte/file loaders
    pub decompress: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or reject DTDs.
    pub fn with_dtd(mut self, allow: bool) -> Self {
        self.allow_dtd = allow;
        self
    }

    /// Set the XML node limit.
    pub fn with_nodes_limit(mut self, limit: u32) -> Self {
        self.nodes_limit = limit;
        self
    }

    /// Enable or disable SVGZ decompression.
    pub fn with_decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    pub(crate) fn to_xml_options(&self) -> roxmltree::ParsingOptions {
        let mut opt = roxmltree::ParsingOptions::default();
        opt.allow_dtd = self.allow_dtd;
        opt.nodes_limit = self.nodes_limit;
        opt
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_dtd: true,
            nodes_limit: 1_000_000,
            decompress: cfg!(feature = "svgz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_dtd(false)
            .with_nodes_limit(500)
            .with_decompress(false);

        assert!(!options.allow_dtd);
        assert_eq!(options.nodes_limit, 500);
        assert!(!options.decompress);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.allow_dtd);
        assert_eq!(options.nodes_limit, 1_000_000);
    }
}

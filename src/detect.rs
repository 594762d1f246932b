//! SVG format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Detected SVG container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgFormat {
    /// Plain SVG/XML text
    Svg,
    /// Gzip-compressed SVG (`.svgz`)
    Svgz,
}

impl std::fmt::Display for SvgFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SvgFormat::Svg => write!(f, "SVG"),
            SvgFormat::Svgz => write!(f, "SVGZ"),
        }
    }
}

/// Gzip magic bytes: 1F 8B
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// How many leading bytes are inspected for an XML/SVG opening.
const SNIFF_LEN: usize = 512;

/// Detect SVG format from a file path.
///
/// # Example
/// ```no_run
/// use svgtint::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("icons.svg").unwrap();
/// println!("Format: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SvgFormat> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect SVG format from the leading bytes of a file.
///
/// # Returns
/// * `Ok(SvgFormat::Svgz)` if the data starts with the gzip magic
/// * `Ok(SvgFormat::Svg)` if the data starts (after whitespace, BOM and
///   XML prolog/comments) with a markup opening
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<SvgFormat> {
    if data.starts_with(GZIP_MAGIC) {
        return Ok(SvgFormat::Svgz);
    }

    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();

    if trimmed.starts_with("<?xml")
        || trimmed.starts_with("<svg")
        || trimmed.starts_with("<!--")
        || trimmed.starts_with("<!DOCTYPE svg")
    {
        return Ok(SvgFormat::Svg);
    }

    Err(Error::UnknownFormat)
}

/// Check if a file looks like SVG or SVGZ.
pub fn is_svg<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes look like SVG or SVGZ.
pub fn is_svg_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Decode raw file content into SVG source text, inflating SVGZ input.
pub fn decode_source(data: &[u8], allow_compressed: bool) -> Result<String> {
    match detect_format_from_bytes(data)? {
        SvgFormat::Svg => {
            let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
            String::from_utf8(data.to_vec())
                .map_err(|e| Error::Parse(format!("SVG source is not valid UTF-8: {}", e)))
        }
        SvgFormat::Svgz if allow_compressed => inflate(data),
        SvgFormat::Svgz => Err(Error::Parse(
            "compressed SVG input is disabled".to_string(),
        )),
    }
}

#[cfg(feature = "svgz")]
fn inflate(data: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;

    let mut decoder = GzDecoder::new(data);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| Error::Parse(format!("failed to inflate SVGZ: {}", e)))?;
    Ok(text)
}

#[cfg(not(feature = "svgz"))]
fn inflate(_data: &[u8]) -> Result<String> {
    Err(Error::Parse(
        "svgtint was built without the `svgz` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_plain_svg() {
        let data = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert_eq!(detect_format_from_bytes(data).unwrap(), SvgFormat::Svg);
    }

    #[test]
    fn test_detect_xml_prolog_and_bom() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"  \n<?xml version=\"1.0\"?><svg/>");
        assert_eq!(detect_format_from_bytes(&data).unwrap(), SvgFormat::Svg);
    }

    #[test]
    fn test_detect_gzip() {
        let data = [0x1F, 0x8B, 0x08, 0x00, 0x00];
        assert_eq!(detect_format_from_bytes(&data).unwrap(), SvgFormat::Svgz);
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"%PDF-1.7");
        assert!(matches!(result, Err(Error::UnknownFormat)));
        assert!(!is_svg_bytes(b""));
    }

    #[test]
    fn test_decode_source_plain() {
        let text = decode_source(b"<svg/>", true).unwrap();
        assert_eq!(text, "<svg/>");
    }

    #[cfg(feature = "svgz")]
    #[test]
    fn test_decode_source_svgz() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<svg/>").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_source(&compressed, true).unwrap(), "<svg/>");
        assert!(matches!(
            decode_source(&compressed, false),
            Err(Error::Parse(_))
        ));
    }
}

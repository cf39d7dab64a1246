//! Raw code-block extraction.
//!
//! A raw block is a verbatim run of embedded-language source between two
//! marker lines:
//!
//! ```text
//! :: code ::
//! from os.path import join
//! ROOT = join(prefix, "share")
//! :: end ::
//! ```
//!
//! Markers are recognized per physical line, at column zero. The body
//! is captured exactly as written (the embedded parser re-tokenizes it
//! later with the correct line origin), and the whole region is masked
//! to spaces so the declarative scan never sees embedded content. The
//! mask preserves newlines, keeping every byte offset and line number
//! valid.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::vela::error::{ParseError, ParseResult};

static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^::[ \t]*code[ \t]*::[ \t]*$").expect("block start pattern")
});

static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^::[ \t]*end[ \t]*::[ \t]*$").expect("block end pattern"));

/// One extracted raw block.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRegion {
    /// Byte offset of the start-marker line's first byte.
    pub start: usize,
    /// Byte offset one past the end-marker line (including its newline).
    pub end: usize,
    /// The verbatim body between the marker lines.
    pub body: String,
    /// 1-based line of the start marker.
    pub start_line: usize,
    /// 1-based line of the end marker.
    pub end_line: usize,
}

/// Scan physical lines for raw-block regions. Returns the masked source
/// and the regions in order of appearance.
pub fn extract_raw_regions(
    source: &str,
    filename: &str,
    line_offset: usize,
) -> ParseResult<(String, Vec<RawRegion>)> {
    let mut regions = Vec::new();

    let mut open: Option<(usize, usize, usize)> = None; // (start_offset, start_line, body_offset)
    let mut offset = 0;
    let mut line_no = 0;
    for line in source.split_inclusive('\n') {
        line_no += 1;
        let content = line.trim_end_matches(['\n', '\r']);
        match open {
            None => {
                if BLOCK_START.is_match(content) {
                    open = Some((offset, line_no, offset + line.len()));
                }
            }
            Some((start, start_line, body_offset)) => {
                if BLOCK_END.is_match(content) {
                    let body = source[body_offset..offset].to_string();
                    regions.push(RawRegion {
                        start,
                        end: offset + line.len(),
                        body,
                        start_line: start_line + line_offset,
                        end_line: line_no + line_offset,
                    });
                    open = None;
                }
            }
        }
        offset += line.len();
    }

    if let Some((_, start_line, _)) = open {
        return Err(ParseError::lexical(
            filename,
            start_line + line_offset,
            "unterminated raw code block (missing ':: end ::')",
        ));
    }

    if regions.is_empty() {
        return Ok((source.to_string(), regions));
    }

    let mut masked = source.as_bytes().to_vec();
    for region in &regions {
        for byte in &mut masked[region.start..region.end] {
            if *byte != b'\n' && *byte != b'\r' {
                *byte = b' ';
            }
        }
    }
    let masked = String::from_utf8(masked)
        .map_err(|_| ParseError::lexical(filename, 1, "source is not valid UTF-8"))?;

    Ok((masked, regions))
}

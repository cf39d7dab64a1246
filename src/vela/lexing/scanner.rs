//! Raw tokenization of (masked) vela source.
//!
//! The scan is a vanilla logos pass; everything stateful (indentation,
//! line joining, raw blocks) happens in later passes. The only logic
//! here is turning a scan failure into a located lexical error.

use std::ops::Range;

use logos::Logos;

use crate::vela::error::{ParseError, ParseResult};
use crate::vela::token::{LineIndex, RawToken};

/// Scan the source into raw tokens with byte spans.
pub fn scan(
    source: &str,
    filename: &str,
    index: &LineIndex,
    line_offset: usize,
) -> ParseResult<Vec<(RawToken, Range<usize>)>> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                let span = lexer.span();
                let line = index.line_of(span.start) + line_offset;
                let offending = source[span.start..].chars().next();
                let message = match offending {
                    Some('"') | Some('\'') => "unterminated string literal".to_string(),
                    Some(ch) => format!("invalid character {:?} in input", ch),
                    None => "unexpected end of input".to_string(),
                };
                return Err(ParseError::lexical(filename, line, message));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(source: &str) -> Vec<(RawToken, Range<usize>)> {
        let index = LineIndex::new(source);
        scan(source, "t.vela", &index, 0).unwrap()
    }

    fn scan_err(source: &str) -> ParseError {
        let index = LineIndex::new(source);
        scan(source, "t.vela", &index, 0).unwrap_err()
    }

    #[test]
    fn spans_cover_the_source_text() {
        let source = "label << fmt(value)\n";
        for (_, span) in scan_ok(source) {
            assert!(span.end <= source.len());
        }
    }

    #[test]
    fn invalid_character_is_located() {
        let err = scan_err("x = 1\ny = $\n");
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("invalid character"));
    }

    #[test]
    fn unterminated_string_is_located() {
        let err = scan_err("s = \"abc\n");
        assert_eq!(err.line(), 1);
        assert!(err.to_string().contains("unterminated string"));
    }
}

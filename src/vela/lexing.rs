//! Tokenization pipeline for vela source.
//!
//! The pipeline follows the "vanilla scan + transformation passes"
//! shape:
//!
//! 1. Raw-block extraction: `:: code ::` … `:: end ::` regions are
//!    captured verbatim and masked out of the text ([`blocks`]).
//! 2. Raw scan: logos over the masked text ([`scanner`]).
//! 3. Assembly: raw tokens become logical lines — comments vanish,
//!    newlines inside brackets and after backslash joins do not end the
//!    line, blank lines disappear, names become keywords, raw-block
//!    tokens are spliced in ([`assembly`]).
//! 4. Indentation: logical-line indent widths become balanced
//!    Indent/Dedent tokens, each line gains its closing Newline, and the
//!    stream is finished with Dedents and an EndMarker ([`indentation`]).
//!
//! All tokens carry the 1-based line they start at; `tokenize_embedded`
//! shifts every line by a caller-supplied origin so that re-parsing a
//! raw block reports positions in the enclosing file.

pub mod assembly;
pub mod blocks;
pub mod indentation;
pub mod scanner;

use crate::vela::error::ParseResult;
use crate::vela::grammar::Grammar;
use crate::vela::token::{LineIndex, Token};

/// Tokenize a vela module using the process-wide grammar tables.
pub fn tokenize(source: &str, filename: &str) -> ParseResult<Vec<Token>> {
    tokenize_with_grammar(source, filename, &Grammar::shared())
}

/// Tokenize a vela module with explicit grammar tables.
pub fn tokenize_with_grammar(
    source: &str,
    filename: &str,
    grammar: &Grammar,
) -> ParseResult<Vec<Token>> {
    run(source, filename, grammar, 1, true)
}

/// Tokenize the body of a raw code block. `first_line` is the absolute
/// line of the block body's first line; raw-block markers are not
/// recognized in this mode.
pub(crate) fn tokenize_embedded(
    source: &str,
    filename: &str,
    grammar: &Grammar,
    first_line: usize,
) -> ParseResult<Vec<Token>> {
    run(source, filename, grammar, first_line, false)
}

fn run(
    source: &str,
    filename: &str,
    grammar: &Grammar,
    first_line: usize,
    extract_blocks: bool,
) -> ParseResult<Vec<Token>> {
    let line_offset = first_line - 1;

    let (masked, regions) = if extract_blocks {
        blocks::extract_raw_regions(source, filename, line_offset)?
    } else {
        (source.to_string(), Vec::new())
    };

    let index = LineIndex::new(&masked);
    let raw = scanner::scan(&masked, filename, &index, line_offset)?;
    let lines = assembly::assemble(&masked, raw, regions, &index, grammar, line_offset);
    let eof_line = line_offset + index.line_count();
    indentation::structure(lines, filename, eof_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vela::token::TokenKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, "test.vela")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn flat_line_ends_with_newline_and_endmarker() {
        assert_eq!(
            kinds("import os\n"),
            vec![
                TokenKind::Import,
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn empty_source_is_just_the_endmarker() {
        assert_eq!(kinds(""), vec![TokenKind::EndMarker]);
    }

    #[test]
    fn indentation_produces_balanced_pairs() {
        let kinds = kinds("Main(View):\n    pass\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::LPar,
                TokenKind::Name,
                TokenKind::RPar,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Pass,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn newlines_inside_brackets_do_not_end_the_line() {
        let kinds = kinds("x = [1,\n     2]\n");
        assert!(!kinds[..kinds.len() - 2].contains(&TokenKind::Indent));
        assert_eq!(
            kinds.iter().filter(|&&k| k == TokenKind::Newline).count(),
            1
        );
    }

    #[test]
    fn backslash_joins_physical_lines() {
        let kinds = kinds("x = 1 + \\\n    2\n");
        assert_eq!(
            kinds.iter().filter(|&&k| k == TokenKind::Newline).count(),
            1
        );
        assert!(!kinds.contains(&TokenKind::Indent));
    }

    #[test]
    fn comments_and_blank_lines_are_invisible() {
        let source = "# header\n\nimport os  # trailing\n\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Import,
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn raw_block_tokens_are_spliced_in() {
        let source = ":: code ::\nx = 1\n:: end ::\n";
        let tokens = tokenize(source, "test.vela").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::BlockStart,
                TokenKind::Newline,
                TokenKind::BlockBody,
                TokenKind::Newline,
                TokenKind::BlockEnd,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
        assert_eq!(tokens[2].text, "x = 1\n");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn keywords_are_resolved_through_the_grammar() {
        let kinds = kinds("a and b\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::And,
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn embedded_mode_offsets_line_numbers() {
        let tokens = tokenize_embedded("x = 1\n", "test.vela", &Grammar::shared(), 10).unwrap();
        assert_eq!(tokens[0].line, 10);
    }

    #[test]
    fn inconsistent_dedent_is_a_lexical_error() {
        let source = "Main(View):\n        pass\n    pass\n";
        let err = tokenize(source, "test.vela").unwrap_err();
        assert!(matches!(
            err,
            crate::vela::error::ParseError::Lexical { line: 3, .. }
        ));
    }
}

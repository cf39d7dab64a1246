//! Raw tokens to logical lines.
//!
//! This pass walks the span-ordered raw stream and groups it into
//! logical lines, each tagged with its indentation width:
//!
//! - whitespace runs at the start of a line become the line's indent
//!   width (tab stops every 8 columns); all other whitespace separates
//!   tokens and is dropped;
//! - comments are dropped;
//! - a newline inside `()`/`[]`/`{}` nesting, or one consumed by a
//!   backslash join, does not end the logical line;
//! - lines with no content tokens (blank or comment-only) vanish;
//! - names are reclassified through the grammar's keyword table;
//! - masked raw-block regions are replaced by three synthetic lines:
//!   BlockStart, BlockBody (carrying the verbatim body), BlockEnd.
//!
//! The pass is infallible: anything it cannot make structural it leaves
//! for the parser to reject with a located syntax error.

use std::ops::Range;

use super::blocks::RawRegion;
use crate::vela::grammar::Grammar;
use crate::vela::token::{LineIndex, RawToken, Token, TokenKind};

/// One logical line: content tokens plus the indentation width of its
/// first physical line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub indent: usize,
    pub tokens: Vec<Token>,
}

/// Group raw tokens into logical lines, splicing raw-block lines in at
/// their source positions.
pub fn assemble(
    source: &str,
    raw: Vec<(RawToken, Range<usize>)>,
    regions: Vec<RawRegion>,
    index: &LineIndex,
    grammar: &Grammar,
    line_offset: usize,
) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut pending_indent = 0usize;
    let mut line_start = true;
    let mut depth = 0usize;

    let mut regions = regions.into_iter();
    let mut next_region = regions.next();
    let mut skip_until = 0usize;

    for (raw_token, span) in raw {
        // Splice raw-block lines once the scan reaches a masked region.
        while next_region
            .as_ref()
            .map_or(false, |region| span.start >= region.start)
        {
            if let Some(region) = next_region.take() {
                if !current.is_empty() {
                    lines.push(LogicalLine {
                        indent: pending_indent,
                        tokens: std::mem::take(&mut current),
                    });
                }
                push_block_lines(&region, &mut lines);
                skip_until = region.end;
                pending_indent = 0;
                line_start = true;
            }
            next_region = regions.next();
        }
        if span.start < skip_until {
            continue;
        }

        match raw_token {
            RawToken::Space => {
                if line_start && depth == 0 {
                    pending_indent = indent_width(&source[span]);
                }
            }
            RawToken::Comment | RawToken::LineJoin => {}
            RawToken::Newline => {
                if depth == 0 {
                    if current.is_empty() {
                        pending_indent = 0;
                    } else {
                        lines.push(LogicalLine {
                            indent: pending_indent,
                            tokens: std::mem::take(&mut current),
                        });
                        pending_indent = 0;
                    }
                    line_start = true;
                }
            }
            other => {
                let text = &source[span.clone()];
                let kind = content_kind(other, text, grammar);
                let line = index.line_of(span.start) + line_offset;
                match kind {
                    TokenKind::LPar | TokenKind::LSqb | TokenKind::LBrace => depth += 1,
                    TokenKind::RPar | TokenKind::RSqb | TokenKind::RBrace => {
                        depth = depth.saturating_sub(1)
                    }
                    _ => {}
                }
                current.push(Token::new(kind, text, line));
                line_start = false;
            }
        }
    }

    // A final line without a trailing newline still counts.
    if !current.is_empty() {
        lines.push(LogicalLine {
            indent: pending_indent,
            tokens: current,
        });
    }

    // Regions after the last scan token (e.g. a block closing the file).
    while let Some(region) = next_region.take() {
        push_block_lines(&region, &mut lines);
        next_region = regions.next();
    }

    lines
}

fn push_block_lines(region: &RawRegion, lines: &mut Vec<LogicalLine>) {
    lines.push(LogicalLine {
        indent: 0,
        tokens: vec![Token::new(TokenKind::BlockStart, ":: code ::", region.start_line)],
    });
    lines.push(LogicalLine {
        indent: 0,
        tokens: vec![Token::new(
            TokenKind::BlockBody,
            region.body.clone(),
            region.start_line + 1,
        )],
    });
    lines.push(LogicalLine {
        indent: 0,
        tokens: vec![Token::new(TokenKind::BlockEnd, ":: end ::", region.end_line)],
    });
}

/// Indentation width of a whitespace run, with tab stops every 8.
fn indent_width(text: &str) -> usize {
    let mut width = 0;
    for ch in text.chars() {
        if ch == '\t' {
            width = width / 8 * 8 + 8;
        } else {
            width += 1;
        }
    }
    width
}

/// Map a content raw token to its final kind, resolving keywords.
fn content_kind(raw: RawToken, text: &str, grammar: &Grammar) -> TokenKind {
    match raw {
        RawToken::Name => grammar.keyword(text).unwrap_or(TokenKind::Name),
        RawToken::Int => TokenKind::Int,
        RawToken::Float => TokenKind::Float,
        RawToken::Str => TokenKind::Str,
        RawToken::LPar => TokenKind::LPar,
        RawToken::RPar => TokenKind::RPar,
        RawToken::LSqb => TokenKind::LSqb,
        RawToken::RSqb => TokenKind::RSqb,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::DoubleColon => TokenKind::DoubleColon,
        RawToken::ColonEqual => TokenKind::ColonEqual,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Ellipsis => TokenKind::Ellipsis,
        RawToken::Assign => TokenKind::Assign,
        RawToken::EqEqual => TokenKind::EqEqual,
        RawToken::NotEqual => TokenKind::NotEqual,
        RawToken::Less => TokenKind::Less,
        RawToken::Greater => TokenKind::Greater,
        RawToken::LessEqual => TokenKind::LessEqual,
        RawToken::GreaterEqual => TokenKind::GreaterEqual,
        RawToken::LeftShift => TokenKind::LeftShift,
        RawToken::RightShift => TokenKind::RightShift,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::DoubleStar => TokenKind::DoubleStar,
        RawToken::Slash => TokenKind::Slash,
        RawToken::DoubleSlash => TokenKind::DoubleSlash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::VBar => TokenKind::VBar,
        RawToken::Circumflex => TokenKind::Circumflex,
        RawToken::Amper => TokenKind::Amper,
        RawToken::Tilde => TokenKind::Tilde,
        // Consumed before this point; mapping them keeps the match total.
        RawToken::Space | RawToken::Comment | RawToken::Newline | RawToken::LineJoin => {
            TokenKind::Newline
        }
    }
}

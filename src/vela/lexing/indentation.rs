//! Logical lines to a structured token stream.
//!
//! A stateful mapper tracks an indentation stack and turns each logical
//! line's indent width into Indent/Dedent tokens: one Indent when the
//! width grows, one Dedent per level closed when it shrinks. A width
//! that falls between two stack levels has no matching open block and
//! is rejected. Every emitted Indent is matched by a Dedent before the
//! EndMarker; the final cleanup closes whatever is still open.

use super::assembly::LogicalLine;
use crate::vela::error::{ParseError, ParseResult};
use crate::vela::token::{Token, TokenKind};

/// Convert logical lines into the final token stream.
pub fn structure(
    lines: Vec<LogicalLine>,
    filename: &str,
    eof_line: usize,
) -> ParseResult<Vec<Token>> {
    let mut stack: Vec<usize> = vec![0];
    let mut out = Vec::new();
    let mut last_line = eof_line;

    for line in lines {
        let first_line = line.tokens.first().map(|t| t.line).unwrap_or(last_line);
        let top = stack.last().copied().unwrap_or(0);

        if line.indent > top {
            stack.push(line.indent);
            out.push(Token::new(TokenKind::Indent, "", first_line));
        } else if line.indent < top {
            while stack.last().copied().unwrap_or(0) > line.indent {
                stack.pop();
                out.push(Token::new(TokenKind::Dedent, "", first_line));
            }
            if stack.last().copied().unwrap_or(0) != line.indent {
                return Err(ParseError::lexical(
                    filename,
                    first_line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }

        last_line = line.tokens.last().map(|t| t.line).unwrap_or(first_line);
        out.extend(line.tokens);
        out.push(Token::new(TokenKind::Newline, "", last_line));
    }

    while stack.len() > 1 {
        stack.pop();
        out.push(Token::new(TokenKind::Dedent, "", eof_line));
    }
    out.push(Token::new(TokenKind::EndMarker, "", eof_line));

    Ok(out)
}

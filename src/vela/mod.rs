//! The vela language front end.
//!
//! Pipeline layout:
//!
//! - [`token`] / [`lexing`] — source text to a flat, line-tagged token
//!   stream (indentation becomes balanced Indent/Dedent tokens, raw code
//!   blocks are captured verbatim).
//! - [`grammar`] — the compiled grammar tables (keywords, binding
//!   operators) with an injectable load-or-build cache.
//! - [`parsing`] — the deterministic parser and AST construction rules.
//! - [`ast`] — the two tree families: declarative nodes and embedded
//!   expression nodes, joined by the [`ast::Code`] wrapper.
//! - [`error`] — the structured error taxonomy shared by every stage.

pub mod ast;
pub mod error;
pub mod grammar;
pub mod lexing;
pub mod parsing;
pub mod token;

use std::sync::Arc;

use self::ast::Module;
use self::error::ParseError;
use self::grammar::Grammar;

/// Parse vela source text into a [`Module`] tree.
///
/// `filename` is used only for diagnostics. The process-wide grammar
/// tables are built on first use and shared across calls.
pub fn parse(source: &str, filename: &str) -> Result<Module, ParseError> {
    parse_with_grammar(source, filename, Grammar::shared())
}

/// Parse with an explicitly provided grammar, for callers that manage
/// their own [`Grammar`] cache.
pub fn parse_with_grammar(
    source: &str,
    filename: &str,
    grammar: Arc<Grammar>,
) -> Result<Module, ParseError> {
    let tokens = lexing::tokenize_with_grammar(source, filename, &grammar)?;
    parsing::Parser::new(tokens, filename, grammar).module()
}

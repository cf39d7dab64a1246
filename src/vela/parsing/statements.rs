//! Simple statements of the embedded language.
//!
//! Only the forms that make sense inside bindings and raw code blocks
//! exist: expression statements, single assignments (with tuple/list
//! destructuring), the import forms, and `pass`. Raw blocks are
//! re-tokenized with their absolute starting line, so every error they
//! produce points into the enclosing file.

use std::sync::Arc;

use crate::vela::ast::expr::{Alias, Expr, ExprContext, ExprKind, Stmt, StmtKind};
use crate::vela::error::{ParseError, ParseResult};
use crate::vela::grammar::Grammar;
use crate::vela::lexing;
use crate::vela::token::TokenKind;

use super::parser::Parser;
use super::targets::into_store_context;

impl Parser {
    /// One simple statement terminated by its newline.
    pub(crate) fn simple_statement_line(&mut self) -> ParseResult<Stmt> {
        let stmt = self.simple_statement()?;
        self.expect(TokenKind::Newline)?;
        Ok(stmt)
    }

    fn simple_statement(&mut self) -> ParseResult<Stmt> {
        match self.kind() {
            TokenKind::Pass => {
                let token = self.bump();
                Ok(Stmt::new(StmtKind::Pass, token.line))
            }
            TokenKind::Import | TokenKind::From => self.import_statement(),
            _ => self.expression_statement(),
        }
    }

    /// `testlist` or `testlist = testlist`.
    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let lhs = self.testlist()?;
        let line = lhs.first().map(|e| e.line).unwrap_or_else(|| self.line());

        if self.eat(TokenKind::Assign).is_none() {
            let value = tuple_or_single(lhs, line);
            return Ok(Stmt::new(StmtKind::Expr { value }, line));
        }

        let rhs = self.testlist()?;
        let value = tuple_or_single(rhs, line);
        let target = tuple_or_single(lhs, line);
        let target = into_store_context(target, self.filename())?;
        Ok(Stmt::new(
            StmtKind::Assign {
                targets: vec![target],
                value,
            },
            line,
        ))
    }

    /// `import a.b as c, d` or any `from … import …` form.
    pub(crate) fn import_statement(&mut self) -> ParseResult<Stmt> {
        match self.kind() {
            TokenKind::Import => {
                let keyword = self.bump();
                let names = self.dotted_as_names()?;
                Ok(Stmt::new(StmtKind::Import { names }, keyword.line))
            }
            TokenKind::From => {
                let keyword = self.bump();

                // Relative-import dots; `...` arrives as one token.
                let mut level = 0usize;
                loop {
                    if self.eat(TokenKind::Dot).is_some() {
                        level += 1;
                    } else if self.eat(TokenKind::Ellipsis).is_some() {
                        level += 3;
                    } else {
                        break;
                    }
                }

                let module = if self.at(TokenKind::Name) {
                    Some(self.dotted_name()?)
                } else {
                    None
                };
                if level == 0 && module.is_none() {
                    return Err(self.syntax_error("expected a module name after 'from'"));
                }

                self.expect(TokenKind::Import)?;
                let names = if self.eat(TokenKind::Star).is_some() {
                    vec![Alias {
                        name: "*".to_string(),
                        asname: None,
                    }]
                } else if self.eat(TokenKind::LPar).is_some() {
                    let names = self.import_as_names(TokenKind::RPar)?;
                    self.expect(TokenKind::RPar)?;
                    names
                } else {
                    self.import_as_names(TokenKind::Newline)?
                };

                Ok(Stmt::new(
                    StmtKind::ImportFrom {
                        module,
                        names,
                        level,
                    },
                    keyword.line,
                ))
            }
            _ => Err(self.syntax_error("invalid import statement")),
        }
    }

    /// `a.b.c` joined back into one dotted path.
    fn dotted_name(&mut self) -> ParseResult<String> {
        let mut path = self.expect(TokenKind::Name)?.text;
        while self.at(TokenKind::Dot) && self.kind_at(1) == TokenKind::Name {
            self.bump();
            let part = self.expect(TokenKind::Name)?;
            path.push('.');
            path.push_str(&part.text);
        }
        Ok(path)
    }

    fn dotted_as_names(&mut self) -> ParseResult<Vec<Alias>> {
        let mut names = vec![self.dotted_as_name()?];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.dotted_as_name()?);
        }
        Ok(names)
    }

    fn dotted_as_name(&mut self) -> ParseResult<Alias> {
        let name = self.dotted_name()?;
        let asname = if self.eat(TokenKind::As).is_some() {
            Some(self.expect(TokenKind::Name)?.text)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    /// `x as y, z` with an optional trailing comma before `stop`.
    fn import_as_names(&mut self, stop: TokenKind) -> ParseResult<Vec<Alias>> {
        let mut names = vec![self.import_as_name()?];
        while self.eat(TokenKind::Comma).is_some() {
            if self.at(stop) {
                break;
            }
            names.push(self.import_as_name()?);
        }
        Ok(names)
    }

    fn import_as_name(&mut self) -> ParseResult<Alias> {
        let name = self.expect(TokenKind::Name)?.text;
        let asname = if self.eat(TokenKind::As).is_some() {
            Some(self.expect(TokenKind::Name)?.text)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }
}

/// A testlist collapses to its single value; several values form a
/// tuple.
fn tuple_or_single(mut values: Vec<Expr>, line: usize) -> Expr {
    if values.len() == 1 {
        return values.remove(0);
    }
    Expr::new(
        ExprKind::Tuple {
            elts: values,
            ctx: ExprContext::Load,
        },
        line,
    )
}

/// Parse a raw block body as a suite of simple statements. `first_line`
/// is the absolute line of the body's first line; all positions and
/// errors are reported in the enclosing file's coordinates.
pub(crate) fn parse_embedded_suite(
    text: &str,
    filename: &str,
    grammar: &Arc<Grammar>,
    first_line: usize,
) -> ParseResult<Vec<Stmt>> {
    let tokens = lexing::tokenize_embedded(text, filename, grammar, first_line)
        .map_err(as_embedded_error)?;
    let mut parser = Parser::new(tokens, filename, Arc::clone(grammar));

    let mut stmts = Vec::new();
    loop {
        match parser.kind() {
            TokenKind::EndMarker => break,
            TokenKind::Indent => {
                return Err(ParseError::embedded(
                    filename,
                    parser.line(),
                    "unexpected indent in code block",
                ));
            }
            _ => stmts.push(parser.simple_statement_line().map_err(as_embedded_error)?),
        }
    }
    Ok(stmts)
}

/// Lexical and grammar failures inside a raw block surface as embedded
/// parse errors; the structural target/keyword errors keep their own
/// kind (they already carry absolute positions).
fn as_embedded_error(err: ParseError) -> ParseError {
    match err {
        ParseError::Lexical {
            filename,
            line,
            message,
        }
        | ParseError::Syntax {
            filename,
            line,
            message,
        } => ParseError::EmbeddedParse {
            filename,
            line,
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vela::token::Token;

    fn parse_stmt(source: &str) -> Stmt {
        let grammar = Grammar::shared();
        let line = format!("{}\n", source);
        let tokens: Vec<Token> =
            lexing::tokenize_with_grammar(&line, "stmt.vela", &grammar).unwrap();
        let mut parser = Parser::new(tokens, "stmt.vela", grammar);
        parser.simple_statement_line().unwrap()
    }

    fn parse_stmt_err(source: &str) -> ParseError {
        let grammar = Grammar::shared();
        let line = format!("{}\n", source);
        let tokens = lexing::tokenize_with_grammar(&line, "stmt.vela", &grammar).unwrap();
        let mut parser = Parser::new(tokens, "stmt.vela", grammar);
        parser.simple_statement_line().unwrap_err()
    }

    #[test]
    fn expression_statement() {
        let stmt = parse_stmt("f(x)");
        assert!(matches!(stmt.kind, StmtKind::Expr { .. }));
    }

    #[test]
    fn assignment_target_gets_store_context() {
        let stmt = parse_stmt("a.b = 1");
        match stmt.kind {
            StmtKind::Assign { targets, .. } => {
                assert!(matches!(
                    targets[0].kind,
                    ExprKind::Attribute { ctx: ExprContext::Store, .. }
                ));
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn tuple_assignment_forms_one_target() {
        let stmt = parse_stmt("a, b = 1, 2");
        match stmt.kind {
            StmtKind::Assign { targets, value } => {
                assert_eq!(targets.len(), 1);
                assert!(matches!(
                    targets[0].kind,
                    ExprKind::Tuple { ctx: ExprContext::Store, .. }
                ));
                assert!(matches!(value.kind, ExprKind::Tuple { .. }));
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn invalid_target_is_rejected_with_its_label() {
        let err = parse_stmt_err("f() = 1");
        match err {
            ParseError::InvalidAssignmentTarget { construct, .. } => {
                assert_eq!(construct, "function call");
            }
            other => panic!("expected target error, got {:?}", other),
        }
    }

    #[test]
    fn pass_statement() {
        assert!(matches!(parse_stmt("pass").kind, StmtKind::Pass));
    }

    #[test]
    fn plain_import_with_aliases() {
        let stmt = parse_stmt("import os.path as p, sys");
        match stmt.kind {
            StmtKind::Import { names } => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[0].name, "os.path");
                assert_eq!(names[0].asname.as_deref(), Some("p"));
                assert_eq!(names[1].name, "sys");
                assert_eq!(names[1].asname, None);
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn from_import_forms() {
        let stmt = parse_stmt("from a.b import c as d, e");
        match stmt.kind {
            StmtKind::ImportFrom { module, names, level } => {
                assert_eq!(module.as_deref(), Some("a.b"));
                assert_eq!(names.len(), 2);
                assert_eq!(level, 0);
            }
            other => panic!("expected from-import, got {:?}", other),
        }

        let stmt = parse_stmt("from .. import x");
        match stmt.kind {
            StmtKind::ImportFrom { module, level, .. } => {
                assert_eq!(module, None);
                assert_eq!(level, 2);
            }
            other => panic!("expected from-import, got {:?}", other),
        }

        let stmt = parse_stmt("from ...pkg import *");
        match stmt.kind {
            StmtKind::ImportFrom { module, names, level } => {
                assert_eq!(module.as_deref(), Some("pkg"));
                assert_eq!(level, 3);
                assert_eq!(names[0].name, "*");
            }
            other => panic!("expected from-import, got {:?}", other),
        }

        let stmt = parse_stmt("from m import (a, b,)");
        match stmt.kind {
            StmtKind::ImportFrom { names, .. } => assert_eq!(names.len(), 2),
            other => panic!("expected from-import, got {:?}", other),
        }
    }

    #[test]
    fn embedded_suite_reports_absolute_lines() {
        let grammar = Grammar::shared();
        let stmts = parse_embedded_suite("a = 1\nb = a + 1\n", "t.vela", &grammar, 10).unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].line, 10);
        assert_eq!(stmts[1].line, 11);
    }

    #[test]
    fn embedded_suite_error_is_an_embedded_error() {
        let grammar = Grammar::shared();
        let err = parse_embedded_suite("a = 1\nb = = 2\n", "t.vela", &grammar, 10).unwrap_err();
        match err {
            ParseError::EmbeddedParse { line, .. } => assert_eq!(line, 11),
            other => panic!("expected embedded error, got {:?}", other),
        }
    }
}

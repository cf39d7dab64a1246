//! Token cursor and the declarative grammar layer.
//!
//! Body items share prefixes (`name :` opens an instantiation, `name
//! name` an attribute declaration, `name OP` a binding), so dispatch
//! peeks up to three tokens before committing to a rule. Everything
//! else is plain descent.

use std::sync::Arc;

use crate::vela::ast::declarative::{
    AttributeBinding, AttributeDeclaration, BodyItem, BoundExpression, Code, Declaration,
    Instantiation, Module, ModuleItem,
};
use crate::vela::ast::expr::{string_literal_value, Expr, ExprContext, ExprKind};
use crate::vela::error::{ParseError, ParseResult};
use crate::vela::grammar::{BindingOperator, Grammar};
use crate::vela::token::{Token, TokenKind};

use super::statements::parse_embedded_suite;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    filename: String,
    grammar: Arc<Grammar>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, filename: &str, grammar: Arc<Grammar>) -> Self {
        let mut tokens = tokens;
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EndMarker, "", 1));
        }
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_string(),
            grammar,
        }
    }

    // ---- cursor -------------------------------------------------------

    pub(crate) fn peek(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn kind_at(&self, ahead: usize) -> TokenKind {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn line(&self) -> usize {
        self.peek().line
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.syntax_error(format!(
                "invalid syntax (expected {}, found {})",
                kind.describe(),
                self.kind().describe()
            )))
        }
    }

    pub(crate) fn filename(&self) -> &str {
        &self.filename
    }

    pub(crate) fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(&self.filename, self.line(), message)
    }

    // ---- module level -------------------------------------------------

    /// Parse the whole stream into a module. Consumes the parser.
    pub fn module(mut self) -> ParseResult<Module> {
        let docstring = self.optional_docstring();

        let mut items = Vec::new();
        loop {
            match self.kind() {
                TokenKind::EndMarker => break,
                TokenKind::Newline => {
                    self.bump();
                }
                TokenKind::Import | TokenKind::From => {
                    let stmt = self.import_statement()?;
                    self.expect(TokenKind::Newline)?;
                    let line = stmt.line;
                    items.push(ModuleItem::Import(Code::suite(vec![stmt], line)));
                }
                TokenKind::BlockStart => {
                    items.push(ModuleItem::CodeBlock(self.code_block()?));
                }
                TokenKind::Name => {
                    items.push(ModuleItem::Declaration(self.declaration()?));
                }
                _ => return Err(self.syntax_error("invalid syntax at module level")),
            }
        }
        Ok(Module::new(docstring, items, 1))
    }

    /// A docstring line: one string literal alone on its line.
    fn optional_docstring(&mut self) -> String {
        if self.at(TokenKind::Str) && self.kind_at(1) == TokenKind::Newline {
            let token = self.bump();
            self.bump();
            string_literal_value(&token.text)
        } else {
            String::new()
        }
    }

    /// `:: code ::` … `:: end ::` — re-parse the captured body as a
    /// statement suite with absolute line numbers.
    fn code_block(&mut self) -> ParseResult<Code> {
        let start = self.expect(TokenKind::BlockStart)?;
        self.expect(TokenKind::Newline)?;
        let body = self.expect(TokenKind::BlockBody)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::BlockEnd)?;
        self.expect(TokenKind::Newline)?;

        let stmts = parse_embedded_suite(&body.text, &self.filename, &self.grammar, body.line)?;
        Ok(Code::suite(stmts, start.line))
    }

    /// `Name(Base):` plus an indented body.
    fn declaration(&mut self) -> ParseResult<Declaration> {
        let name = self.expect(TokenKind::Name)?;
        self.expect(TokenKind::LPar)?;
        let base = self.expect(TokenKind::Name)?;
        self.expect(TokenKind::RPar)?;
        self.expect(TokenKind::Colon)?;

        let base_expr = Expr::new(
            ExprKind::Name {
                id: base.text,
                ctx: ExprContext::Load,
            },
            base.line,
        );
        let base_code = Code::expression(base_expr, name.line);

        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let docstring = self.optional_docstring();
        let identifier = self.leading_identifier()?;
        let items = self.body_items()?;
        self.expect(TokenKind::Dedent)?;

        Ok(Declaration {
            name: name.text,
            base: base_code,
            identifier,
            docstring,
            items,
            line: name.line,
        })
    }

    /// `TypeName:` plus an indented body (no docstring here).
    fn instantiation(&mut self) -> ParseResult<Instantiation> {
        let name = self.expect(TokenKind::Name)?;
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let identifier = self.leading_identifier()?;
        let items = self.body_items()?;
        self.expect(TokenKind::Dedent)?;

        Ok(Instantiation {
            name: name.text,
            identifier,
            items,
            line: name.line,
        })
    }

    /// `id: name` — allowed once, before any body item.
    fn leading_identifier(&mut self) -> ParseResult<Option<String>> {
        if !self.at_identifier_line() {
            return Ok(None);
        }
        let keyword = self.bump();
        self.bump(); // colon
        let name = self.bump();
        self.expect(TokenKind::Newline)?;
        if keyword.text != "id" {
            return Err(ParseError::syntax(
                &self.filename,
                keyword.line,
                format!("'id' required. Got '{}' instead", keyword.text),
            ));
        }
        Ok(Some(name.text))
    }

    fn at_identifier_line(&self) -> bool {
        self.at(TokenKind::Name)
            && self.kind_at(1) == TokenKind::Colon
            && self.kind_at(2) == TokenKind::Name
            && self.kind_at(3) == TokenKind::Newline
    }

    /// Body items up to the closing dedent, with `pass` filtered out.
    fn body_items(&mut self) -> ParseResult<Vec<BodyItem>> {
        let mut items = Vec::new();
        while !self.at(TokenKind::Dedent) && !self.at(TokenKind::EndMarker) {
            if let Some(item) = self.body_item()? {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn body_item(&mut self) -> ParseResult<Option<BodyItem>> {
        match self.kind() {
            TokenKind::Pass => {
                self.bump();
                self.expect(TokenKind::Newline)?;
                Ok(None)
            }
            TokenKind::Name => {
                if self.at_identifier_line() {
                    // An identifier marker past the head of the body.
                    let keyword = self.peek().clone();
                    if keyword.text == "id" {
                        return Err(ParseError::syntax(
                            &self.filename,
                            keyword.line,
                            "'id' must be the first item in the body",
                        ));
                    }
                    return Err(ParseError::syntax(
                        &self.filename,
                        keyword.line,
                        format!("'id' required. Got '{}' instead", keyword.text),
                    ));
                }
                match self.kind_at(1) {
                    TokenKind::Colon if self.kind_at(2) == TokenKind::Newline => {
                        Ok(Some(BodyItem::Instantiation(self.instantiation()?)))
                    }
                    TokenKind::Name => {
                        Ok(Some(BodyItem::AttributeDeclaration(
                            self.attribute_declaration()?,
                        )))
                    }
                    kind if kind.is_binding_operator() => {
                        Ok(Some(BodyItem::AttributeBinding(self.attribute_binding()?)))
                    }
                    _ => Err(self.syntax_error("invalid syntax in body")),
                }
            }
            _ => Err(self.syntax_error("invalid syntax in body")),
        }
    }

    /// `attr name[: Type][binding]` / `event name[: Type][binding]`.
    fn attribute_declaration(&mut self) -> ParseResult<AttributeDeclaration> {
        let keyword = self.expect(TokenKind::Name)?;
        let is_event = match keyword.text.as_str() {
            "attr" => false,
            "event" => true,
            other => {
                return Err(ParseError::invalid_keyword(&self.filename, keyword.line, other));
            }
        };
        let name = self.expect(TokenKind::Name)?;

        let type_expr = if self.eat(TokenKind::Colon).is_some() {
            let type_name = self.expect(TokenKind::Name)?;
            let expr = Expr::new(
                ExprKind::Name {
                    id: type_name.text,
                    ctx: ExprContext::Load,
                },
                type_name.line,
            );
            Some(Code::expression(expr, keyword.line))
        } else {
            None
        };

        let default = if self.eat(TokenKind::Newline).is_some() {
            None
        } else if self.kind().is_binding_operator() {
            let binding = self.binding()?;
            Some(AttributeBinding {
                name: name.text.clone(),
                binding,
                line: keyword.line,
            })
        } else {
            return Err(self.syntax_error("invalid syntax in attribute declaration"));
        };

        Ok(AttributeDeclaration {
            name: name.text,
            type_expr,
            default,
            is_event,
            line: keyword.line,
        })
    }

    /// `name OP …` — a binding on an existing attribute.
    fn attribute_binding(&mut self) -> ParseResult<AttributeBinding> {
        let name = self.expect(TokenKind::Name)?;
        let binding = self.binding()?;
        Ok(AttributeBinding {
            name: name.text,
            binding,
            line: name.line,
        })
    }

    /// The operator and bound code of a binding. Inline operators take
    /// one expression to end of line; `::` takes one statement on the
    /// line or an indented suite of simple statements.
    fn binding(&mut self) -> ParseResult<BoundExpression> {
        let token = self.bump();
        let operator = match BindingOperator::from_token(token.kind) {
            Some(op) => op,
            None => {
                return Err(ParseError::syntax(
                    &self.filename,
                    token.line,
                    "invalid binding operator",
                ));
            }
        };
        let identifier = self.grammar.binding_identifier(operator).to_string();
        let line = token.line;

        let code = match operator {
            BindingOperator::DoubleColon => {
                if self.eat(TokenKind::Newline).is_some() {
                    self.expect(TokenKind::Indent)?;
                    let mut stmts = Vec::new();
                    while !self.at(TokenKind::Dedent) && !self.at(TokenKind::EndMarker) {
                        stmts.push(self.simple_statement_line()?);
                    }
                    self.expect(TokenKind::Dedent)?;
                    Code::suite(stmts, line)
                } else {
                    let stmt = self.simple_statement_line()?;
                    let stmt_line = stmt.line;
                    Code::suite(vec![stmt], stmt_line)
                }
            }
            _ => {
                let expr = self.test()?;
                self.expect(TokenKind::Newline)?;
                Code::expression(expr, line)
            }
        };

        Ok(BoundExpression {
            operator: identifier,
            code,
            line,
        })
    }
}

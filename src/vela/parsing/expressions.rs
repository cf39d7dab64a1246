//! The embedded expression grammar.
//!
//! One parsing function per precedence layer, each binding tighter than
//! the one above it:
//!
//! ```text
//! test  →  or_test  →  and_test  →  not_test  →  comparison
//!       →  bitor  →  bitxor  →  bitand  →  shift  →  arith
//!       →  term  →  factor  →  power  →  atom + trailers
//! ```
//!
//! `**` is right-associative (its right operand re-enters at the unary
//! layer); every other binary operator folds to the left. Postfix
//! trailers (call, attribute, subscript) are collected flat and folded
//! onto the atom, so `a.b(c)[d]` is one rule family rather than one
//! rule per combination.

use crate::vela::ast::expr::{
    number_literal_value, string_literal_value, Arguments, BoolOperator, CmpOperator,
    Comprehension, Expr, ExprContext, ExprKind, Keyword, Operator, Slice, UnaryOperator,
};
use crate::vela::error::{ParseError, ParseResult};
use crate::vela::token::TokenKind;

use super::parser::Parser;
use super::targets::into_store_context;

/// A postfix operator waiting to be folded onto its operand. The set is
/// closed: there is no "unexpected trailer" case to fall through to.
pub(crate) enum Trailer {
    Call {
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        starargs: Option<Box<Expr>>,
        kwargs: Option<Box<Expr>>,
    },
    Attribute {
        attr: String,
    },
    Subscript {
        slice: Slice,
    },
}

/// Re-parent each trailer onto the accumulated root, left to right.
fn fold_trailers(root: Expr, trailers: Vec<(Trailer, usize)>) -> Expr {
    let mut node = root;
    for (trailer, line) in trailers {
        let kind = match trailer {
            Trailer::Call {
                args,
                keywords,
                starargs,
                kwargs,
            } => ExprKind::Call {
                func: Box::new(node),
                args,
                keywords,
                starargs,
                kwargs,
            },
            Trailer::Attribute { attr } => ExprKind::Attribute {
                value: Box::new(node),
                attr,
                ctx: ExprContext::Load,
            },
            Trailer::Subscript { slice } => ExprKind::Subscript {
                value: Box::new(node),
                slice: Box::new(slice),
                ctx: ExprContext::Load,
            },
        };
        node = Expr::new(kind, line);
    }
    node
}

impl Parser {
    /// Can the current token begin an expression?
    pub(crate) fn starts_expression(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Name
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::LPar
                | TokenKind::LSqb
                | TokenKind::LBrace
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Tilde
                | TokenKind::Not
                | TokenKind::Lambda
        )
    }

    /// The general expression: conditional expression or lambda.
    pub(crate) fn test(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::Lambda) {
            return self.lambda(false);
        }
        let body = self.or_test()?;
        if self.eat(TokenKind::If).is_none() {
            return Ok(body);
        }
        let line = body.line;
        let test = self.or_test()?;
        self.expect(TokenKind::Else)?;
        let orelse = self.test()?;
        Ok(Expr::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            line,
        ))
    }

    /// An expression without the conditional form, for positions where
    /// a trailing `if` belongs to the enclosing comprehension.
    fn test_no_cond(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::Lambda) {
            self.lambda(true)
        } else {
            self.or_test()
        }
    }

    fn or_test(&mut self) -> ParseResult<Expr> {
        let first = self.and_test()?;
        if !self.at(TokenKind::Or) {
            return Ok(first);
        }
        let line = first.line;
        let mut values = vec![first];
        while self.eat(TokenKind::Or).is_some() {
            values.push(self.and_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOperator::Or,
                values,
            },
            line,
        ))
    }

    fn and_test(&mut self) -> ParseResult<Expr> {
        let first = self.not_test()?;
        if !self.at(TokenKind::And) {
            return Ok(first);
        }
        let line = first.line;
        let mut values = vec![first];
        while self.eat(TokenKind::And).is_some() {
            values.push(self.not_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOperator::And,
                values,
            },
            line,
        ))
    }

    fn not_test(&mut self) -> ParseResult<Expr> {
        if let Some(token) = self.eat(TokenKind::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
                token.line,
            ));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let first = self.bitor_expr()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_operator() {
            ops.push(op);
            comparators.push(self.bitor_expr()?);
        }
        if ops.is_empty() {
            return Ok(first);
        }
        let line = first.line;
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(first),
                ops,
                comparators,
            },
            line,
        ))
    }

    fn comparison_operator(&mut self) -> Option<CmpOperator> {
        let op = match self.kind() {
            TokenKind::Less => CmpOperator::Lt,
            TokenKind::Greater => CmpOperator::Gt,
            TokenKind::EqEqual => CmpOperator::Eq,
            TokenKind::NotEqual => CmpOperator::NotEq,
            TokenKind::LessEqual => CmpOperator::LtE,
            TokenKind::GreaterEqual => CmpOperator::GtE,
            TokenKind::In => CmpOperator::In,
            TokenKind::Is => {
                self.bump();
                return if self.eat(TokenKind::Not).is_some() {
                    Some(CmpOperator::IsNot)
                } else {
                    Some(CmpOperator::Is)
                };
            }
            TokenKind::Not if self.kind_at(1) == TokenKind::In => {
                self.bump();
                self.bump();
                return Some(CmpOperator::NotIn);
            }
            _ => return None,
        };
        self.bump();
        Some(op)
    }

    fn bitor_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.bitxor_expr()?;
        while self.eat(TokenKind::VBar).is_some() {
            let right = self.bitxor_expr()?;
            node = binop(node, Operator::BitOr, right);
        }
        Ok(node)
    }

    fn bitxor_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.bitand_expr()?;
        while self.eat(TokenKind::Circumflex).is_some() {
            let right = self.bitand_expr()?;
            node = binop(node, Operator::BitXor, right);
        }
        Ok(node)
    }

    fn bitand_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.shift_expr()?;
        while self.eat(TokenKind::Amper).is_some() {
            let right = self.shift_expr()?;
            node = binop(node, Operator::BitAnd, right);
        }
        Ok(node)
    }

    fn shift_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.arith_expr()?;
        loop {
            let op = match self.kind() {
                TokenKind::LeftShift => Operator::LShift,
                TokenKind::RightShift => Operator::RShift,
                _ => break,
            };
            self.bump();
            let right = self.arith_expr()?;
            node = binop(node, op, right);
        }
        Ok(node)
    }

    fn arith_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.term()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Sub,
                _ => break,
            };
            self.bump();
            let right = self.term()?;
            node = binop(node, op, right);
        }
        Ok(node)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut node = self.factor()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => Operator::Mult,
                TokenKind::Slash => Operator::Div,
                TokenKind::Percent => Operator::Mod,
                TokenKind::DoubleSlash => Operator::FloorDiv,
                _ => break,
            };
            self.bump();
            let right = self.factor()?;
            node = binop(node, op, right);
        }
        Ok(node)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Plus => UnaryOperator::UAdd,
            TokenKind::Minus => UnaryOperator::USub,
            TokenKind::Tilde => UnaryOperator::Invert,
            _ => return self.power(),
        };
        let token = self.bump();
        let operand = self.factor()?;
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            token.line,
        ))
    }

    /// Atom, postfix trailers, and the right-associative power tail.
    fn power(&mut self) -> ParseResult<Expr> {
        let atom = self.atom()?;
        let trailers = self.trailers()?;
        let node = fold_trailers(atom, trailers);
        if self.eat(TokenKind::DoubleStar).is_some() {
            let right = self.factor()?;
            return Ok(binop(node, Operator::Pow, right));
        }
        Ok(node)
    }

    fn trailers(&mut self) -> ParseResult<Vec<(Trailer, usize)>> {
        let mut list = Vec::new();
        loop {
            match self.kind() {
                TokenKind::LPar => {
                    let token = self.bump();
                    list.push((self.call_arguments()?, token.line));
                }
                TokenKind::Dot => {
                    let token = self.bump();
                    let name = self.expect(TokenKind::Name)?;
                    list.push((Trailer::Attribute { attr: name.text }, token.line));
                }
                TokenKind::LSqb => {
                    let token = self.bump();
                    list.push((self.subscript_trailer()?, token.line));
                }
                _ => break,
            }
        }
        Ok(list)
    }

    fn atom(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::LPar => self.paren_atom(),
            TokenKind::LSqb => self.list_atom(),
            TokenKind::LBrace => self.brace_atom(),
            TokenKind::Name => {
                let token = self.bump();
                Ok(Expr::new(
                    ExprKind::Name {
                        id: token.text,
                        ctx: ExprContext::Load,
                    },
                    token.line,
                ))
            }
            TokenKind::Int | TokenKind::Float => {
                let token = self.bump();
                match number_literal_value(&token.text) {
                    Some(value) => Ok(Expr::new(ExprKind::Num { value }, token.line)),
                    None => Err(ParseError::syntax(
                        self.filename(),
                        token.line,
                        format!("number literal out of range: {}", token.text),
                    )),
                }
            }
            TokenKind::Str => {
                // Adjacent string literals concatenate into one value.
                let token = self.bump();
                let mut value = string_literal_value(&token.text);
                while self.at(TokenKind::Str) {
                    let next = self.bump();
                    value.push_str(&string_literal_value(&next.text));
                }
                Ok(Expr::new(ExprKind::Str { value }, token.line))
            }
            _ => Err(self.syntax_error("invalid syntax")),
        }
    }

    /// `()`, `(expr)`, `(a, b)`, `(x for x in xs)`.
    fn paren_atom(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LPar)?;
        if self.eat(TokenKind::RPar).is_some() {
            return Ok(Expr::new(
                ExprKind::Tuple {
                    elts: Vec::new(),
                    ctx: ExprContext::Load,
                },
                open.line,
            ));
        }
        let first = self.test()?;
        let node = if self.at(TokenKind::For) {
            let generators = self.comp_clauses()?;
            Expr::new(
                ExprKind::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                open.line,
            )
        } else if self.at(TokenKind::Comma) {
            let mut elts = vec![first];
            while self.eat(TokenKind::Comma).is_some() {
                if self.at(TokenKind::RPar) {
                    break;
                }
                elts.push(self.test()?);
            }
            Expr::new(
                ExprKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                open.line,
            )
        } else {
            // Parentheses controlling order of operations only.
            first
        };
        self.expect(TokenKind::RPar)?;
        Ok(node)
    }

    /// `[]`, `[a, b]`, `[x for x in xs]`.
    fn list_atom(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LSqb)?;
        if self.eat(TokenKind::RSqb).is_some() {
            return Ok(Expr::new(
                ExprKind::List {
                    elts: Vec::new(),
                    ctx: ExprContext::Load,
                },
                open.line,
            ));
        }
        let first = self.test()?;
        let node = if self.at(TokenKind::For) {
            let generators = self.comp_clauses()?;
            Expr::new(
                ExprKind::ListComp {
                    elt: Box::new(first),
                    generators,
                },
                open.line,
            )
        } else {
            let mut elts = vec![first];
            while self.eat(TokenKind::Comma).is_some() {
                if self.at(TokenKind::RSqb) {
                    break;
                }
                elts.push(self.test()?);
            }
            Expr::new(
                ExprKind::List {
                    elts,
                    ctx: ExprContext::Load,
                },
                open.line,
            )
        };
        self.expect(TokenKind::RSqb)?;
        Ok(node)
    }

    /// `{}`, `{k: v}`, `{a, b}`, and both comprehension forms.
    fn brace_atom(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBrace)?;
        if self.eat(TokenKind::RBrace).is_some() {
            return Ok(Expr::new(
                ExprKind::Dict {
                    keys: Vec::new(),
                    values: Vec::new(),
                },
                open.line,
            ));
        }
        let first = self.test()?;

        let node = if self.eat(TokenKind::Colon).is_some() {
            let first_value = self.test()?;
            if self.at(TokenKind::For) {
                let generators = self.comp_clauses()?;
                Expr::new(
                    ExprKind::DictComp {
                        key: Box::new(first),
                        value: Box::new(first_value),
                        generators,
                    },
                    open.line,
                )
            } else {
                let mut keys = vec![first];
                let mut values = vec![first_value];
                while self.eat(TokenKind::Comma).is_some() {
                    if self.at(TokenKind::RBrace) {
                        break;
                    }
                    keys.push(self.test()?);
                    self.expect(TokenKind::Colon)?;
                    values.push(self.test()?);
                }
                Expr::new(ExprKind::Dict { keys, values }, open.line)
            }
        } else if self.at(TokenKind::For) {
            let generators = self.comp_clauses()?;
            Expr::new(
                ExprKind::SetComp {
                    elt: Box::new(first),
                    generators,
                },
                open.line,
            )
        } else {
            let mut elts = vec![first];
            while self.eat(TokenKind::Comma).is_some() {
                if self.at(TokenKind::RBrace) {
                    break;
                }
                elts.push(self.test()?);
            }
            Expr::new(ExprKind::Set { elts }, open.line)
        };
        self.expect(TokenKind::RBrace)?;
        Ok(node)
    }

    /// One or more `for` clauses with their `if` filters.
    pub(crate) fn comp_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators: Vec<Comprehension> = Vec::new();
        loop {
            if self.eat(TokenKind::For).is_some() {
                let target = self.comp_target()?;
                self.expect(TokenKind::In)?;
                let iter = self.or_test()?;
                generators.push(Comprehension {
                    target,
                    iter,
                    ifs: Vec::new(),
                });
            } else if self.at(TokenKind::If) && !generators.is_empty() {
                self.bump();
                let condition = self.test_no_cond()?;
                if let Some(last) = generators.last_mut() {
                    last.ifs.push(condition);
                }
            } else {
                break;
            }
        }
        if generators.is_empty() {
            return Err(self.syntax_error("invalid syntax in comprehension"));
        }
        Ok(generators)
    }

    /// A comprehension's loop target: one expression or a bare tuple,
    /// converted to store context.
    fn comp_target(&mut self) -> ParseResult<Expr> {
        let first = self.bitor_expr()?;
        if !self.at(TokenKind::Comma) {
            return into_store_context(first, self.filename());
        }
        let line = first.line;
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            if self.at(TokenKind::In) {
                break;
            }
            elts.push(self.bitor_expr()?);
        }
        let tuple = Expr::new(
            ExprKind::Tuple {
                elts,
                ctx: ExprContext::Load,
            },
            line,
        );
        into_store_context(tuple, self.filename())
    }

    /// Call arguments after the opening parenthesis: positional and
    /// keyword arguments in any interleaving, then `*args`, then
    /// `**kwargs`. A bare generator expression must be the only
    /// argument.
    fn call_arguments(&mut self) -> ParseResult<Trailer> {
        let mut args: Vec<Expr> = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();
        let mut starargs: Option<Box<Expr>> = None;
        let mut kwargs: Option<Box<Expr>> = None;

        while !self.at(TokenKind::RPar) {
            if self.eat(TokenKind::Star).is_some() {
                if starargs.is_some() || kwargs.is_some() {
                    return Err(self.syntax_error("invalid argument unpacking"));
                }
                starargs = Some(Box::new(self.test()?));
            } else if self.eat(TokenKind::DoubleStar).is_some() {
                if kwargs.is_some() {
                    return Err(self.syntax_error("invalid argument unpacking"));
                }
                kwargs = Some(Box::new(self.test()?));
            } else {
                if starargs.is_some() || kwargs.is_some() {
                    return Err(
                        self.syntax_error("positional argument follows argument unpacking")
                    );
                }
                let value = self.test()?;
                if self.eat(TokenKind::Assign).is_some() {
                    let arg = match value.kind {
                        ExprKind::Name { id, .. } => id,
                        _ => {
                            return Err(ParseError::syntax(
                                self.filename(),
                                value.line,
                                "keyword argument must be a name",
                            ));
                        }
                    };
                    keywords.push(Keyword {
                        arg,
                        value: self.test()?,
                    });
                } else if self.at(TokenKind::For) {
                    if !args.is_empty() || !keywords.is_empty() {
                        return Err(
                            self.syntax_error("generator expression must be the only argument")
                        );
                    }
                    let line = value.line;
                    let generators = self.comp_clauses()?;
                    args.push(Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(value),
                            generators,
                        },
                        line,
                    ));
                    break;
                } else {
                    args.push(value);
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RPar)?;
        Ok(Trailer::Call {
            args,
            keywords,
            starargs,
            kwargs,
        })
    }

    /// Subscript contents after the opening bracket: a single index or
    /// slice, or a comma-separated extended subscript.
    fn subscript_trailer(&mut self) -> ParseResult<Trailer> {
        let first = self.subscript()?;
        if !self.at(TokenKind::Comma) {
            self.expect(TokenKind::RSqb)?;
            return Ok(Trailer::Subscript { slice: first });
        }
        let mut dims = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            if self.at(TokenKind::RSqb) {
                break;
            }
            dims.push(self.subscript()?);
        }
        self.expect(TokenKind::RSqb)?;
        Ok(Trailer::Subscript {
            slice: Slice::Extended { dims },
        })
    }

    /// One subscript dimension. `::` is a colon pair, so `a[::2]` and
    /// `a[1::2]` arrive as a single token.
    fn subscript(&mut self) -> ParseResult<Slice> {
        if self.eat(TokenKind::Ellipsis).is_some() {
            return Ok(Slice::Ellipsis);
        }

        let lower = if self.starts_expression() {
            Some(self.test()?)
        } else {
            None
        };

        if self.eat(TokenKind::DoubleColon).is_some() {
            let step = if self.starts_expression() {
                Some(self.test()?)
            } else {
                None
            };
            return Ok(Slice::Range {
                lower,
                upper: None,
                step,
            });
        }

        if self.eat(TokenKind::Colon).is_some() {
            let upper = if self.starts_expression() {
                Some(self.test()?)
            } else {
                None
            };
            let step = if self.eat(TokenKind::Colon).is_some() {
                if self.starts_expression() {
                    Some(self.test()?)
                } else {
                    None
                }
            } else {
                None
            };
            return Ok(Slice::Range { lower, upper, step });
        }

        match lower {
            Some(value) => Ok(Slice::Index { value }),
            None => Err(self.syntax_error("invalid syntax in subscript")),
        }
    }

    /// `lambda [params]: body`.
    fn lambda(&mut self, no_cond: bool) -> ParseResult<Expr> {
        let keyword = self.expect(TokenKind::Lambda)?;
        let args = if self.at(TokenKind::Colon) {
            Arguments::empty()
        } else {
            self.parameter_list()?
        };
        self.expect(TokenKind::Colon)?;
        let body = if no_cond {
            self.test_no_cond()?
        } else {
            self.test()?
        };
        Ok(Expr::new(
            ExprKind::Lambda {
                args,
                body: Box::new(body),
            },
            keyword.line,
        ))
    }

    /// Lambda parameters: names or nested tuples, optional defaults,
    /// then `*args`, then `**kwargs`.
    fn parameter_list(&mut self) -> ParseResult<Arguments> {
        let mut arguments = Arguments::empty();
        loop {
            if self.eat(TokenKind::Star).is_some() {
                arguments.vararg = Some(self.expect(TokenKind::Name)?.text);
                if self.eat(TokenKind::Comma).is_some() {
                    self.expect(TokenKind::DoubleStar)?;
                    arguments.kwarg = Some(self.expect(TokenKind::Name)?.text);
                }
                break;
            }
            if self.eat(TokenKind::DoubleStar).is_some() {
                arguments.kwarg = Some(self.expect(TokenKind::Name)?.text);
                break;
            }
            let param = self.parameter()?;
            if self.eat(TokenKind::Assign).is_some() {
                arguments.defaults.push(self.test()?);
            } else if !arguments.defaults.is_empty() {
                return Err(self.syntax_error("non-default argument follows default argument"));
            }
            arguments.args.push(param);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
            if self.at(TokenKind::Colon) {
                break;
            }
        }
        Ok(arguments)
    }

    /// One formal parameter: a name or a parenthesized tuple of
    /// parameters.
    fn parameter(&mut self) -> ParseResult<Expr> {
        if self.at(TokenKind::Name) {
            let token = self.bump();
            return Ok(Expr::new(
                ExprKind::Name {
                    id: token.text,
                    ctx: ExprContext::Param,
                },
                token.line,
            ));
        }
        let open = self.expect(TokenKind::LPar)?;
        let mut elts = vec![self.parameter()?];
        let mut is_tuple = false;
        while self.eat(TokenKind::Comma).is_some() {
            is_tuple = true;
            if self.at(TokenKind::RPar) {
                break;
            }
            elts.push(self.parameter()?);
        }
        self.expect(TokenKind::RPar)?;
        if !is_tuple && elts.len() == 1 {
            return Ok(elts.remove(0));
        }
        Ok(Expr::new(
            ExprKind::Tuple {
                elts,
                ctx: ExprContext::Param,
            },
            open.line,
        ))
    }

    /// A comma-separated list of tests. A trailing comma is consumed
    /// but adds nothing.
    pub(crate) fn testlist(&mut self) -> ParseResult<Vec<Expr>> {
        let mut values = vec![self.test()?];
        while self.eat(TokenKind::Comma).is_some() {
            if !self.starts_expression() {
                break;
            }
            values.push(self.test()?);
        }
        Ok(values)
    }
}

fn binop(left: Expr, op: Operator, right: Expr) -> Expr {
    let line = left.line;
    Expr::new(
        ExprKind::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        line,
    )
}

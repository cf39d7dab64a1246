//! Assignment-target validation.
//!
//! A left-hand side may be a name, an attribute access, a subscript, or
//! a list/tuple of such (recursively). The check is purely structural —
//! no symbol table — and it is a transform, not a mutation: it consumes
//! the expression and returns a new one with store context on every
//! name-shaped node, or fails naming the offending construct.

use crate::vela::ast::expr::{Expr, ExprContext, ExprKind};
use crate::vela::error::{ParseError, ParseResult};

/// Convert an expression to a store-context target, or reject it.
pub fn into_store_context(expr: Expr, filename: &str) -> ParseResult<Expr> {
    let Expr { kind, line } = expr;
    match kind {
        ExprKind::Name { id, .. } => Ok(Expr::new(
            ExprKind::Name {
                id,
                ctx: ExprContext::Store,
            },
            line,
        )),
        ExprKind::Attribute { value, attr, .. } => Ok(Expr::new(
            ExprKind::Attribute {
                value,
                attr,
                ctx: ExprContext::Store,
            },
            line,
        )),
        ExprKind::Subscript { value, slice, .. } => Ok(Expr::new(
            ExprKind::Subscript {
                value,
                slice,
                ctx: ExprContext::Store,
            },
            line,
        )),
        ExprKind::Tuple { elts, .. } => {
            if elts.is_empty() {
                return Err(ParseError::invalid_target(filename, line, "()"));
            }
            let elts = elts
                .into_iter()
                .map(|elt| into_store_context(elt, filename))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::new(
                ExprKind::Tuple {
                    elts,
                    ctx: ExprContext::Store,
                },
                line,
            ))
        }
        ExprKind::List { elts, .. } => {
            let elts = elts
                .into_iter()
                .map(|elt| into_store_context(elt, filename))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::new(
                ExprKind::List {
                    elts,
                    ctx: ExprContext::Store,
                },
                line,
            ))
        }
        other => Err(ParseError::invalid_target(
            filename,
            line,
            construct_label(&other),
        )),
    }
}

/// The label used in "can't assign to …" diagnostics.
fn construct_label(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Lambda { .. } => "lambda",
        ExprKind::Call { .. } => "function call",
        ExprKind::BoolOp { .. } | ExprKind::BinOp { .. } | ExprKind::UnaryOp { .. } => "operator",
        ExprKind::GeneratorExp { .. } => "generator expression",
        ExprKind::ListComp { .. } => "list comprehension",
        ExprKind::SetComp { .. } => "set comprehension",
        ExprKind::DictComp { .. } => "dict comprehension",
        ExprKind::Dict { .. } | ExprKind::Set { .. } => "literal",
        ExprKind::Num { .. } | ExprKind::Str { .. } => "literal",
        ExprKind::Compare { .. } => "comparison",
        ExprKind::IfExp { .. } => "conditional expression",
        // Assignable shapes are handled before this label is asked for.
        ExprKind::Name { .. }
        | ExprKind::Attribute { .. }
        | ExprKind::Subscript { .. }
        | ExprKind::Tuple { .. }
        | ExprKind::List { .. } => "expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vela::ast::expr::Number;

    fn name(id: &str) -> Expr {
        Expr::new(
            ExprKind::Name {
                id: id.to_string(),
                ctx: ExprContext::Load,
            },
            1,
        )
    }

    #[test]
    fn name_becomes_store() {
        let out = into_store_context(name("x"), "t.vela").unwrap();
        assert!(matches!(
            out.kind,
            ExprKind::Name { ctx: ExprContext::Store, .. }
        ));
    }

    #[test]
    fn nested_aggregates_recurse() {
        let target = Expr::new(
            ExprKind::Tuple {
                elts: vec![
                    name("a"),
                    Expr::new(
                        ExprKind::List {
                            elts: vec![name("b")],
                            ctx: ExprContext::Load,
                        },
                        1,
                    ),
                ],
                ctx: ExprContext::Load,
            },
            1,
        );
        let out = into_store_context(target, "t.vela").unwrap();
        match out.kind {
            ExprKind::Tuple { elts, ctx } => {
                assert_eq!(ctx, ExprContext::Store);
                match &elts[1].kind {
                    ExprKind::List { elts, ctx } => {
                        assert_eq!(*ctx, ExprContext::Store);
                        assert!(matches!(
                            elts[0].kind,
                            ExprKind::Name { ctx: ExprContext::Store, .. }
                        ));
                    }
                    other => panic!("expected list, got {:?}", other),
                }
            }
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn empty_tuple_is_named_specifically() {
        let target = Expr::new(
            ExprKind::Tuple {
                elts: vec![],
                ctx: ExprContext::Load,
            },
            3,
        );
        let err = into_store_context(target, "t.vela").unwrap_err();
        match err {
            ParseError::InvalidAssignmentTarget { construct, line, .. } => {
                assert_eq!(construct, "()");
                assert_eq!(line, 3);
            }
            other => panic!("expected target error, got {:?}", other),
        }
    }

    #[test]
    fn disallowed_kinds_carry_their_labels() {
        let num = Expr::new(
            ExprKind::Num {
                value: Number::Int(1),
            },
            1,
        );
        let err = into_store_context(num, "t.vela").unwrap_err();
        assert!(err.to_string().contains("can't assign to literal"));

        let bad_elt = Expr::new(
            ExprKind::Tuple {
                elts: vec![name("a"), Expr::new(ExprKind::Str { value: "s".into() }, 1)],
                ctx: ExprContext::Load,
            },
            1,
        );
        let err = into_store_context(bad_elt, "t.vela").unwrap_err();
        assert!(err.to_string().contains("literal"));
    }
}

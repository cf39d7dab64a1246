//! Property tests for determinism and nesting.
//!
//! Two properties from the front end's contract:
//!
//! - re-parsing identical text yields a structurally identical tree;
//! - wrapping a body one indentation level deeper inside an outer
//!   instantiation leaves the inner subtree unchanged apart from the
//!   uniform line shift of the wrapping line.

use proptest::prelude::*;

use vela::vela::ast::{BodyItem, Declaration, Module, ModuleItem};
use vela::vela::parse;

/// Lowercase identifiers that are not reserved words (and not the
/// contextual `id`/`attr`/`event` keywords, to keep sources valid in
/// every position they are spliced into).
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("reserved words are not identifiers", |name| {
        !matches!(
            name.as_str(),
            "and" | "or" | "not" | "in" | "is" | "if" | "else" | "for" | "lambda" | "import"
                | "from" | "as" | "pass" | "id" | "attr" | "event"
        )
    })
}

fn binding_operator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("="), Just(":="), Just("<<"), Just(">>")]
}

fn expression_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,4}".prop_map(|n| n.to_string()),
        (identifier_strategy(), identifier_strategy()).prop_map(|(a, b)| format!("{}.{}", a, b)),
        (identifier_strategy(), "[0-9]{1,3}").prop_map(|(a, n)| format!("{} + {}", a, n)),
        identifier_strategy().prop_map(|f| format!("{}()", f)),
    ]
}

/// A declaration with a chain of `depth` nested instantiations, each
/// carrying one binding.
fn nested_source(depth: usize, name: &str, op: &str, expr: &str) -> String {
    let mut source = String::from("Main(Window):\n");
    for level in 0..depth {
        let pad = "    ".repeat(level + 1);
        source.push_str(&format!("{}Inner{}:\n", pad, level));
    }
    let pad = "    ".repeat(depth + 1);
    source.push_str(&format!("{}{} {} {}\n", pad, name, op, expr));
    source
}

/// The same module with every line wrapped one level deeper inside an
/// outer instantiation of the declaration body.
fn wrapped_source(depth: usize, name: &str, op: &str, expr: &str) -> String {
    let mut source = String::from("Main(Window):\n    Outer:\n");
    for level in 0..depth {
        let pad = "    ".repeat(level + 2);
        source.push_str(&format!("{}Inner{}:\n", pad, level));
    }
    let pad = "    ".repeat(depth + 2);
    source.push_str(&format!("{}{} {} {}\n", pad, name, op, expr));
    source
}

fn sole_declaration(module: &Module) -> &Declaration {
    assert_eq!(module.items.len(), 1);
    match &module.items[0] {
        ModuleItem::Declaration(decl) => decl,
        other => panic!("expected a declaration, got {:?}", other),
    }
}

/// Walk two body-item lists that must be identical up to a uniform
/// line-number shift.
fn assert_shifted(original: &[BodyItem], wrapped: &[BodyItem], shift: usize) {
    assert_eq!(original.len(), wrapped.len());
    for (a, b) in original.iter().zip(wrapped) {
        assert_eq!(a.line() + shift, b.line());
        match (a, b) {
            (BodyItem::Instantiation(a), BodyItem::Instantiation(b)) => {
                assert_eq!(a.name, b.name);
                assert_eq!(a.identifier, b.identifier);
                assert_shifted(&a.items, &b.items, shift);
            }
            (BodyItem::AttributeBinding(a), BodyItem::AttributeBinding(b)) => {
                assert_eq!(a.name, b.name);
                assert_eq!(a.binding.operator, b.binding.operator);
                assert_eq!(a.binding.line + shift, b.binding.line);
            }
            (BodyItem::AttributeDeclaration(a), BodyItem::AttributeDeclaration(b)) => {
                assert_eq!(a.name, b.name);
                assert_eq!(a.is_event, b.is_event);
            }
            (a, b) => panic!("mismatched items: {:?} vs {:?}", a, b),
        }
    }
}

proptest! {
    #[test]
    fn reparsing_identical_text_yields_an_identical_tree(
        depth in 1usize..6,
        name in identifier_strategy(),
        op in binding_operator_strategy(),
        expr in expression_strategy(),
    ) {
        let source = nested_source(depth, &name, op, &expr);
        let first = parse(&source, "prop.vela").unwrap();
        let second = parse(&source, "prop.vela").unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn wrapping_one_level_preserves_the_inner_subtree(
        depth in 1usize..6,
        name in identifier_strategy(),
        op in binding_operator_strategy(),
        expr in expression_strategy(),
    ) {
        let flat = parse(&nested_source(depth, &name, op, &expr), "prop.vela").unwrap();
        let deep = parse(&wrapped_source(depth, &name, op, &expr), "prop.vela").unwrap();

        let flat_decl = sole_declaration(&flat);
        let deep_decl = sole_declaration(&deep);

        // The wrapper is the declaration's only item; its body is the
        // original body shifted by the one wrapping line.
        prop_assert_eq!(deep_decl.items.len(), 1);
        match &deep_decl.items[0] {
            BodyItem::Instantiation(outer) => {
                prop_assert_eq!(&outer.name, "Outer");
                assert_shifted(&flat_decl.items, &outer.items, 1);
            }
            other => panic!("expected the wrapping instantiation, got {:?}", other),
        }
    }

    #[test]
    fn binding_depth_does_not_corrupt_line_numbers(
        depth in 1usize..6,
        name in identifier_strategy(),
    ) {
        let source = nested_source(depth, &name, "<<", "value");
        let module = parse(&source, "prop.vela").unwrap();

        // The innermost binding sits on the last line of the source.
        let mut items = &sole_declaration(&module).items;
        for _ in 0..depth {
            match &items[0] {
                BodyItem::Instantiation(inst) => items = &inst.items,
                other => panic!("expected an instantiation, got {:?}", other),
            }
        }
        match &items[0] {
            BodyItem::AttributeBinding(binding) => {
                prop_assert_eq!(binding.line, depth + 2);
            }
            other => panic!("expected a binding, got {:?}", other),
        }
    }
}

use super::api::{parse, unescape, JsParser, Rule, TokenStream};
use super::ast::*;
use crate::runner::context::Context;

use pest::consumes_to;
use pest::parses_to;

#[test]
fn test_decimal_number_with_exponent() {
    parses_to! {
        parser: JsParser,
        input: "10.5e3",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_single_quoted_string() {
    parses_to! {
        parser: JsParser,
        input: "'ab'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 4, [
                single_string_characters(1, 3)
            ])
        ]
    };
}

#[test]
fn test_typeof_is_a_unary_operator() {
    parses_to! {
        parser: JsParser,
        input: "typeof x",
        rule: Rule::unary_expression,
        tokens: [
            unary_expression(0, 8, [
                unary_operator(0, 6),
                postfix_expression(7, 8, [
                    identifier(7, 8)
                ])
            ])
        ]
    };
}

#[test]
fn test_dot_member_accepts_reserved_words() {
    parses_to! {
        parser: JsParser,
        input: ".new",
        rule: Rule::dot_member,
        tokens: [
            dot_member(0, 4, [
                identifier_name(1, 4)
            ])
        ]
    };
}

#[test]
fn test_call_arguments() {
    parses_to! {
        parser: JsParser,
        input: "(1)",
        rule: Rule::arguments,
        tokens: [
            arguments(0, 3, [
                assignment_expression(1, 2, [
                    conditional_expression(1, 2, [
                        logical_or_expression(1, 2, [
                            logical_and_expression(1, 2, [
                                equality_expression(1, 2, [
                                    relational_expression(1, 2, [
                                        additive_expression(1, 2, [
                                            multiplicative_expression(1, 2, [
                                                unary_expression(1, 2, [
                                                    postfix_expression(1, 2, [
                                                        numeric_literal(1, 2)
                                                    ])
                                                ])
                                            ])
                                        ])
                                    ])
                                ])
                            ])
                        ])
                    ])
                ])
            ])
        ]
    };
}

fn parse_source(source: &str) -> ProgramData {
    let cx = Context::new();
    let mut ts = TokenStream::new(source, Some("test.js"), 1);
    parse(&cx, &mut ts).unwrap().unwrap()
}

fn only_expression(program: &ProgramData) -> &ExpressionType {
    match &program.body[..] {
        [StatementType::ExpressionStatement { expression, .. }] => expression,
        other => panic!("expected one expression statement, got {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let program = parse_source("1 + 2 * 3");
    match only_expression(&program) {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            **right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_member_call_chain() {
    let program = parse_source("a.b(1)[c]");
    match only_expression(&program) {
        ExpressionType::MemberExpression {
            object,
            property: MemberProperty::Computed(index),
        } => {
            assert_eq!(**index, ExpressionType::Identifier("c".to_string()));
            match &**object {
                ExpressionType::CallExpression { callee, arguments } => {
                    assert_eq!(arguments.len(), 1);
                    assert!(matches!(
                        &**callee,
                        ExpressionType::MemberExpression {
                            property: MemberProperty::Named(name),
                            ..
                        } if name == "b"
                    ));
                }
                other => panic!("unexpected callee {:?}", other),
            }
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_new_then_member() {
    let program = parse_source("new Foo(1).bar");
    match only_expression(&program) {
        ExpressionType::MemberExpression { object, .. } => match &**object {
            ExpressionType::NewExpression { callee, arguments } => {
                assert_eq!(**callee, ExpressionType::Identifier("Foo".to_string()));
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("unexpected object {:?}", other),
        },
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative_over_conditional() {
    let program = parse_source("a = b += c ? 1 : 2, d");
    let items = match only_expression(&program) {
        ExpressionType::SequenceExpression(items) => items,
        other => panic!("expected a sequence, got {:?}", other),
    };
    assert_eq!(items.len(), 2);
    match &items[0] {
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::Equals,
            right,
            ..
        } => match &**right {
            ExpressionType::AssignmentExpression {
                operator: AssignmentOperator::AddEquals,
                right,
                ..
            } => assert!(matches!(**right, ExpressionType::ConditionalExpression { .. })),
            other => panic!("unexpected inner assignment {:?}", other),
        },
        other => panic!("unexpected tree {:?}", other),
    }
    assert_eq!(items[1], ExpressionType::Identifier("d".to_string()));
}

#[test]
fn test_statement_lines_are_offset_by_start_line() {
    let cx = Context::new();
    let mut ts = TokenStream::new("\n\nx;", Some("offset.js"), 10);
    let program = parse(&cx, &mut ts).unwrap().unwrap();
    assert_eq!(program.body[0].get_meta().line, 12);
    assert_eq!(ts.line_source(12), Some("x;".to_string()));
}

#[test]
fn test_empty_source_is_nothing() {
    let cx = Context::new();
    let mut ts = TokenStream::new("  // only a comment\n", None, 1);
    assert!(parse(&cx, &mut ts).unwrap().is_none());
    assert_eq!(cx.error_count(), 0);
}

#[test]
fn test_truncated_source_fails_at_eof() {
    let cx = Context::new();
    let mut ts = TokenStream::new("function f(", None, 1);
    assert!(parse(&cx, &mut ts).is_err());
    assert!(ts.eof());
    assert_eq!(cx.error_count(), 1);

    let mut ts = TokenStream::new("var 1 = 2", None, 1);
    assert!(parse(&cx, &mut ts).is_err());
    assert!(!ts.eof());
}

#[test]
fn test_object_literal_keys() {
    let program = parse_source("var o = {a: 1, 'b c': 2, 3: 4}");
    match &program.body[0] {
        StatementType::VariableDeclaration { declarations, .. } => {
            match declarations[0].init.as_ref().unwrap() {
                ExpressionType::ObjectExpression(properties) => {
                    let keys: Vec<&str> = properties.iter().map(|p| p.key.as_str()).collect();
                    assert_eq!(keys, vec!["a", "b c", "3"]);
                }
                other => panic!("unexpected initializer {:?}", other),
            }
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_unescape() {
    assert_eq!(unescape(r"a\nb"), "a\nb");
    assert_eq!(unescape(r"\x41B"), "AB");
    assert_eq!(unescape(r#"\"q\""#), "\"q\"");
    assert_eq!(unescape(r"\q"), "q");
}

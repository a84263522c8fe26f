use std::rc::Rc;

use pest::error::{Error, ErrorVariant, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;
use crate::runner::context::report::SourcePosition;
use crate::runner::context::Context;
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::operations::type_conversion::number_to_string;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

/// Source text bound to its origin. Remembers whether the last parse failure happened
/// at end of input, which is what separates incomplete input from a real syntax error.
#[derive(Debug, Clone)]
pub struct TokenStream {
    source: String,
    source_name: Option<String>,
    start_line: u32,
    eof: bool,
}

impl TokenStream {
    pub fn new(source: &str, source_name: Option<&str>, start_line: u32) -> Self {
        TokenStream {
            source: source.to_string(),
            source_name: source_name.map(|s| s.to_string()),
            start_line,
            eof: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    /// True when the last failure was positioned at end of input (trailing whitespace
    /// ignored).
    pub fn eof(&self) -> bool {
        self.eof
    }

    fn record_failure(&mut self, offset: usize) {
        self.eof = offset >= self.source.trim_end().len();
    }

    /// Absolute line number of a 1-based line within this source.
    pub fn absolute_line(&self, relative: usize) -> u32 {
        self.start_line + relative.saturating_sub(1) as u32
    }

    pub fn line_source(&self, line: u32) -> Option<String> {
        let relative = line.checked_sub(self.start_line)? as usize;
        self.source.lines().nth(relative).map(|l| l.to_string())
    }

    pub fn position_at(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.source.len());
        let before = &self.source[..offset];
        let relative = before.matches('\n').count() + 1;
        let column = before.rfind('\n').map(|i| offset - i - 1).unwrap_or(offset) as u32 + 1;
        let line = self.absolute_line(relative);
        SourcePosition::new(self.source_name(), line)
            .with_line_source(self.line_source(line), Some(column))
    }

    pub fn position_of(&self, meta: &Meta) -> SourcePosition {
        SourcePosition::new(self.source_name(), meta.line)
            .with_line_source(self.line_source(meta.line), None)
    }
}

/// Parse the token stream into a program tree. Syntax errors are reported through the
/// context and yield `Ok(None)`; `Err` means the reporter escalated.
pub fn parse(cx: &Context, ts: &mut TokenStream) -> Result<Option<ProgramData>, EngineError> {
    let outcome = match JsParser::parse(Rule::script, ts.source()) {
        Ok(pairs) => build_ast_from_script(&*ts, pairs),
        Err(e) => Err(ParseFailure::Syntax(e)),
    };
    match outcome {
        Ok(program) => {
            if program.body.is_empty() {
                Ok(None)
            } else {
                Ok(Some(program))
            }
        }
        Err(ParseFailure::Syntax(e)) => {
            let offset = match e.location {
                InputLocation::Pos(p) => p,
                InputLocation::Span((s, _)) => s,
            };
            ts.record_failure(offset);
            cx.report_error(&describe_error(&e), ts.position_at(offset))?;
            Ok(None)
        }
        Err(ParseFailure::Tree(e, offset)) => {
            ts.record_failure(offset);
            cx.report_error(e.message(), ts.position_at(offset))?;
            Ok(None)
        }
    }
}

fn describe_error(e: &Error<Rule>) -> String {
    match &e.variant {
        ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives
                .iter()
                .map(|r| format!("{:?}", r).replace('_', " "))
                .collect();
            format!("syntax error: expected {}", expected.join(", "))
        }
        ErrorVariant::ParsingError { .. } => "syntax error".to_string(),
        ErrorVariant::CustomError { message } => message.to_string(),
    }
}

enum ParseFailure {
    Syntax(Error<Rule>),
    Tree(JErrorType, usize),
}

type BuildResult<T> = Result<T, ParseFailure>;

fn malformed(pair: &Pair<Rule>) -> ParseFailure {
    ParseFailure::Tree(
        JErrorType::SyntaxError(format!("unexpected {:?}", pair.as_rule())),
        pair.as_span().start(),
    )
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, parent: &Pair<'i, Rule>) -> BuildResult<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| malformed(parent))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_var
            | Rule::kw_function
            | Rule::kw_return
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_while
            | Rule::kw_throw
            | Rule::kw_new
            | Rule::assign_equals
    )
}

/// Children of a pair with keyword tokens dropped.
fn significant<'i>(pair: &Pair<'i, Rule>) -> Vec<Pair<'i, Rule>> {
    pair.clone()
        .into_inner()
        .filter(|p| !is_keyword(p.as_rule()))
        .collect()
}

fn get_meta(ts: &TokenStream, pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    let (line, _) = span.start_pos().line_col();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
        line: ts.absolute_line(line),
    }
}

fn build_ast_from_script(ts: &TokenStream, mut pairs: Pairs<Rule>) -> BuildResult<ProgramData> {
    let mut body = vec![];
    let mut meta = Meta {
        start_index: 0,
        end_index: ts.source().len(),
        line: ts.start_line(),
    };
    if let Some(script) = pairs.next() {
        meta = get_meta(ts, &script);
        for pair in script.into_inner() {
            if pair.as_rule() != Rule::EOI {
                body.push(build_ast_from_statement(ts, pair)?);
            }
        }
    }
    Ok(ProgramData {
        meta,
        body,
        declarations: Declarations::default(),
    })
}

// ════════════════════════════════════════════════════════════
// Statements
// ════════════════════════════════════════════════════════════

fn build_ast_from_statement(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(ts, &pair);
    let children = significant(&pair);
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement {
            meta,
            body: build_ast_from_statement_list(ts, children)?,
        },
        Rule::variable_statement => {
            let mut declarations = vec![];
            for declarator in children {
                let declarator_meta = get_meta(ts, &declarator);
                let parts = significant(&declarator);
                let id = match parts.first() {
                    Some(p) => p.as_str().to_string(),
                    None => return Err(malformed(&declarator)),
                };
                let init = match parts.get(1) {
                    Some(p) => Some(build_ast_from_assignment_expression(ts, p.clone())?),
                    None => None,
                };
                declarations.push(VariableDeclaratorData {
                    meta: declarator_meta,
                    id,
                    init,
                });
            }
            StatementType::VariableDeclaration { meta, declarations }
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_ast_from_function(ts, pair, false)?))
        }
        Rule::if_statement => {
            let mut it = children.into_iter();
            let test = match it.next() {
                Some(p) => build_ast_from_expression(ts, p)?,
                None => return Err(malformed(&pair)),
            };
            let consequent = match it.next() {
                Some(p) => Box::new(build_ast_from_statement(ts, p)?),
                None => return Err(malformed(&pair)),
            };
            let alternate = match it.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(ts, p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test,
                consequent,
                alternate,
            }
        }
        Rule::while_statement => {
            let mut it = children.into_iter();
            let test = match it.next() {
                Some(p) => build_ast_from_expression(ts, p)?,
                None => return Err(malformed(&pair)),
            };
            let body = match it.next() {
                Some(p) => Box::new(build_ast_from_statement(ts, p)?),
                None => return Err(malformed(&pair)),
            };
            StatementType::WhileStatement { meta, test, body }
        }
        Rule::return_statement => StatementType::ReturnStatement {
            meta,
            argument: match children.into_iter().next() {
                Some(p) => Some(build_ast_from_expression(ts, p)?),
                None => None,
            },
        },
        Rule::throw_statement => match children.into_iter().next() {
            Some(p) => StatementType::ThrowStatement {
                meta,
                argument: build_ast_from_expression(ts, p)?,
            },
            None => return Err(malformed(&pair)),
        },
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::expression_statement => match children.into_iter().next() {
            Some(p) => StatementType::ExpressionStatement {
                meta,
                expression: build_ast_from_expression(ts, p)?,
            },
            None => return Err(malformed(&pair)),
        },
        _ => return Err(malformed(&pair)),
    })
}

fn build_ast_from_statement_list(ts: &TokenStream, pairs: Vec<Pair<Rule>>) -> BuildResult<Vec<StatementType>> {
    pairs.into_iter().map(|p| build_ast_from_statement(ts, p)).collect()
}

fn build_ast_from_function(ts: &TokenStream, pair: Pair<Rule>, is_expression: bool) -> BuildResult<FunctionData> {
    let meta = get_meta(ts, &pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = vec![];
    for child in significant(&pair) {
        match child.as_rule() {
            Rule::identifier => id = Some(child.as_str().to_string()),
            Rule::formal_parameters => {
                params = child.into_inner().map(|p| p.as_str().to_string()).collect()
            }
            Rule::function_body => body = build_ast_from_statement_list(ts, child.into_inner().collect())?,
            _ => return Err(malformed(&child)),
        }
    }
    Ok(FunctionData {
        meta,
        id,
        params,
        body,
        is_expression,
        declarations: Declarations::default(),
    })
}

// ════════════════════════════════════════════════════════════
// Expressions
// ════════════════════════════════════════════════════════════

fn build_ast_from_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut items = vec![];
    for child in pair.into_inner() {
        items.push(build_ast_from_assignment_expression(ts, child)?);
    }
    if items.len() == 1 {
        if let Some(only) = items.pop() {
            return Ok(only);
        }
    }
    Ok(ExpressionType::SequenceExpression(items))
}

fn build_ast_from_assignment_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(ts, &pair);
    let mut inner = pair.clone().into_inner();
    let left = build_ast_from_conditional_expression(ts, next_pair(&mut inner, &pair)?)?;
    match inner.next() {
        None => Ok(left),
        Some(op) => {
            let operator = match op.as_str() {
                "=" => AssignmentOperator::Equals,
                "+=" => AssignmentOperator::AddEquals,
                "-=" => AssignmentOperator::SubtractEquals,
                "*=" => AssignmentOperator::MultiplyEquals,
                "/=" => AssignmentOperator::DivideEquals,
                _ => return Err(malformed(&op)),
            };
            let right = build_ast_from_assignment_expression(ts, next_pair(&mut inner, &pair)?)?;
            Ok(ExpressionType::AssignmentExpression {
                meta,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }
}

fn build_ast_from_conditional_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.clone().into_inner();
    let test = build_ast_from_binary_expression(ts, next_pair(&mut inner, &pair)?)?;
    match inner.next() {
        None => Ok(test),
        Some(consequent) => {
            let consequent = build_ast_from_assignment_expression(ts, consequent)?;
            let alternate = build_ast_from_assignment_expression(ts, next_pair(&mut inner, &pair)?)?;
            Ok(ExpressionType::ConditionalExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        }
    }
}

/// Left-associative operator chains: `operand (operator operand)*`.
fn build_ast_from_binary_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    if pair.as_rule() == Rule::unary_expression {
        return build_ast_from_unary_expression(ts, pair);
    }
    let mut inner = pair.clone().into_inner();
    let mut left = build_ast_from_binary_expression(ts, next_pair(&mut inner, &pair)?)?;
    while let Some(op) = inner.next() {
        let right = build_ast_from_binary_expression(ts, next_pair(&mut inner, &pair)?)?;
        left = match op.as_rule() {
            Rule::or_operator | Rule::and_operator => ExpressionType::LogicalExpression {
                operator: if op.as_rule() == Rule::or_operator {
                    LogicalOperator::Or
                } else {
                    LogicalOperator::And
                },
                left: Box::new(left),
                right: Box::new(right),
            },
            _ => ExpressionType::BinaryExpression {
                operator: binary_operator(&op)?,
                left: Box::new(left),
                right: Box::new(right),
            },
        };
    }
    Ok(left)
}

fn build_ast_from_unary_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut operators = vec![];
    let mut operand = None;
    for child in pair.clone().into_inner() {
        match child.as_rule() {
            Rule::unary_operator => operators.push(match child.as_str() {
                "!" => UnaryOperator::LogicalNot,
                "-" => UnaryOperator::Minus,
                "+" => UnaryOperator::Plus,
                "typeof" => UnaryOperator::TypeOf,
                _ => return Err(malformed(&child)),
            }),
            _ => operand = Some(build_ast_from_postfix_expression(ts, child)?),
        }
    }
    let mut expression = operand.ok_or_else(|| malformed(&pair))?;
    while let Some(operator) = operators.pop() {
        expression = ExpressionType::UnaryExpression {
            operator,
            argument: Box::new(expression),
        };
    }
    Ok(expression)
}

fn build_ast_from_postfix_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let mut inner = pair.clone().into_inner();
    let head = next_pair(&mut inner, &pair)?;
    let mut expression = match head.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(ts, head)?,
        _ => build_ast_from_primary_expression(ts, head)?,
    };
    for suffix in inner {
        expression = build_ast_from_member_suffix(ts, expression, suffix)?;
    }
    Ok(expression)
}

fn build_ast_from_member_suffix(ts: &TokenStream, object: ExpressionType, suffix: Pair<Rule>) -> BuildResult<ExpressionType> {
    Ok(match suffix.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            callee: Box::new(object),
            arguments: build_ast_from_arguments(ts, suffix)?,
        },
        Rule::dot_member => ExpressionType::MemberExpression {
            object: Box::new(object),
            property: MemberProperty::Named(
                suffix
                    .clone()
                    .into_inner()
                    .next()
                    .ok_or_else(|| malformed(&suffix))?
                    .as_str()
                    .to_string(),
            ),
        },
        Rule::index_member => {
            let mut inner = suffix.clone().into_inner();
            let index = build_ast_from_expression(ts, next_pair(&mut inner, &suffix)?)?;
            ExpressionType::MemberExpression {
                object: Box::new(object),
                property: MemberProperty::Computed(Box::new(index)),
            }
        }
        _ => return Err(malformed(&suffix)),
    })
}

fn build_ast_from_arguments(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<Vec<ExpressionType>> {
    pair.into_inner().map(|a| build_ast_from_assignment_expression(ts, a)).collect()
}

fn build_ast_from_new_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let children = significant(&pair);
    let mut it = children.into_iter();
    let member = it.next().ok_or_else(|| malformed(&pair))?;
    let mut member_inner = member.clone().into_inner();
    let mut callee = build_ast_from_primary_expression(ts, next_pair(&mut member_inner, &member)?)?;
    for suffix in member_inner {
        callee = build_ast_from_member_suffix(ts, callee, suffix)?;
    }
    let arguments = match it.next() {
        Some(args) => build_ast_from_arguments(ts, args)?,
        None => vec![],
    };
    Ok(ExpressionType::NewExpression {
        callee: Box::new(callee),
        arguments,
    })
}

fn build_ast_from_primary_expression(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    Ok(match pair.as_rule() {
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(ts, pair, true)?))
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for property in pair.into_inner() {
                let mut inner = property.clone().into_inner();
                let name = next_pair(&mut inner, &property)?;
                let key = build_ast_from_property_name(ts, name)?;
                let value = build_ast_from_assignment_expression(ts, next_pair(&mut inner, &property)?)?;
                properties.push(PropertyData { key, value });
            }
            ExpressionType::ObjectExpression(properties)
        }
        Rule::array_literal => ExpressionType::ArrayExpression(
            pair.into_inner()
                .map(|e| build_ast_from_assignment_expression(ts, e))
                .collect::<BuildResult<Vec<_>>>()?,
        ),
        Rule::paren_expression => {
            let mut inner = pair.clone().into_inner();
            build_ast_from_expression(ts, next_pair(&mut inner, &pair)?)?
        }
        Rule::null_literal => ExpressionType::Literal(LiteralType::NullLiteral),
        Rule::boolean_literal => {
            ExpressionType::Literal(LiteralType::BooleanLiteral(pair.as_str() == "true"))
        }
        Rule::numeric_literal => {
            ExpressionType::Literal(LiteralType::NumberLiteral(parse_number(&pair)?))
        }
        Rule::string_literal => {
            ExpressionType::Literal(LiteralType::StringLiteral(string_value(&pair)))
        }
        Rule::this_literal => ExpressionType::ThisExpression,
        Rule::identifier => ExpressionType::Identifier(pair.as_str().to_string()),
        _ => return Err(malformed(&pair)),
    })
}

fn build_ast_from_property_name(ts: &TokenStream, pair: Pair<Rule>) -> BuildResult<String> {
    let inner = pair.clone().into_inner().next().ok_or_else(|| malformed(&pair))?;
    Ok(match inner.as_rule() {
        Rule::string_literal => string_value(&inner),
        Rule::numeric_literal => number_to_string(parse_number(&inner)?),
        _ => inner.as_str().to_string(),
    })
}

fn binary_operator(op: &Pair<Rule>) -> BuildResult<BinaryOperator> {
    Ok(match op.as_str() {
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        _ => return Err(malformed(op)),
    })
}

fn parse_number(pair: &Pair<Rule>) -> BuildResult<f64> {
    let text = pair.as_str();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return Ok(hex
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64));
    }
    text.parse::<f64>().map_err(|_| malformed(pair))
}

fn string_value(pair: &Pair<Rule>) -> String {
    let raw = pair
        .clone()
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or("");
    unescape(raw)
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars>, digits: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..digits {
        let d = chars.peek()?.to_digit(16)?;
        chars.next();
        value = value * 16 + d;
    }
    Some(value)
}

/// Resolve escape sequences of a string literal body.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('v') => out.push('\u{000B}'),
            Some('0') => out.push('\0'),
            Some('x') => match take_hex(&mut chars, 2).and_then(char::from_u32) {
                Some(ch) => out.push(ch),
                None => out.push('x'),
            },
            Some('u') => match take_hex(&mut chars, 4).and_then(char::from_u32) {
                Some(ch) => out.push(ch),
                None => out.push('u'),
            },
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

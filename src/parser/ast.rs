use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
    /// 1-based line, already offset by the compile request's starting line.
    pub line: u32,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
}
impl AssignmentOperator {
    /// Binary operator applied by a compound assignment.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Equals => None,
            AssignmentOperator::AddEquals => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractEquals => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyEquals => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideEquals => Some(BinaryOperator::Divide),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    TypeOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    NumberLiteral(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    Named(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData {
    pub key: String,
    pub value: ExpressionType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionType {
    Literal(LiteralType),
    Identifier(String),
    ThisExpression,
    ArrayExpression(Vec<ExpressionType>),
    ObjectExpression(Vec<PropertyData>),
    FunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    MemberExpression {
        object: Box<ExpressionType>,
        property: MemberProperty,
    },
    SequenceExpression(Vec<ExpressionType>),
}
impl ExpressionType {
    pub fn as_literal(&self) -> Option<&LiteralType> {
        match self {
            ExpressionType::Literal(l) => Some(l),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: String,
    pub init: Option<ExpressionType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: ExpressionType,
    },
    VariableDeclaration {
        meta: Meta,
        declarations: Vec<VariableDeclaratorData>,
    },
    FunctionDeclaration(Rc<FunctionData>),
    BlockStatement {
        meta: Meta,
        body: Vec<StatementType>,
    },
    IfStatement {
        meta: Meta,
        test: ExpressionType,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        meta: Meta,
        test: ExpressionType,
        body: Box<StatementType>,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<ExpressionType>,
    },
    ThrowStatement {
        meta: Meta,
        argument: ExpressionType,
    },
    EmptyStatement {
        meta: Meta,
    },
}
impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::ExpressionStatement { meta, .. }
            | StatementType::VariableDeclaration { meta, .. }
            | StatementType::BlockStatement { meta, .. }
            | StatementType::IfStatement { meta, .. }
            | StatementType::WhileStatement { meta, .. }
            | StatementType::ReturnStatement { meta, .. }
            | StatementType::ThrowStatement { meta, .. }
            | StatementType::EmptyStatement { meta } => meta,
            StatementType::FunctionDeclaration(f) => &f.meta,
        }
    }
}

/// Names a scope must bind before its body runs. Filled in by the semantic transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub var_names: Vec<String>,
    pub functions: Vec<Rc<FunctionData>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<StatementType>,
    pub is_expression: bool,
    pub declarations: Declarations,
}
impl HasMeta for FunctionData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    pub declarations: Declarations,
}
impl HasMeta for ProgramData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

use std::fmt;
use std::rc::Rc;

/// A syntax tree node. Nodes own their children and are never mutated after
/// parsing; `Dead` stands in for an elided optional clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Vec<Node>),
    Block(Vec<Node>),
    VariableDeclaration(VariableDeclaration),
    Identifier(String),
    Literal(Literal),
    BinaryExpression(BinaryExpression),
    UnaryExpression(UnaryExpression),
    IfStatement(IfStatement),
    ForStatement(ForStatement),
    ForOfStatement(ForOfStatement),
    ArrayLiteral(Vec<Node>),
    MemberExpression(MemberExpression),
    IndexerCall(IndexerCall),
    FunctionCall(FunctionCall),
    NamedFunctionDeclaration(Rc<FunctionDeclaration>),
    AnonymousFunctionDeclaration(Rc<FunctionDeclaration>),
    FunctionReturn(Box<Node>),
    BreakStatement,
    Dead,
}

impl Node {
    pub fn is_dead(&self) -> bool {
        matches!(self, Node::Dead)
    }

    /// Name used in diagnostics, e.g. `ForOfStatement`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program(_) => "Program",
            Node::Block(_) => "Block",
            Node::VariableDeclaration(_) => "VariableDeclaration",
            Node::Identifier(_) => "Identifier",
            Node::Literal(_) => "Literal",
            Node::BinaryExpression(_) => "BinaryExpression",
            Node::UnaryExpression(_) => "UnaryExpression",
            Node::IfStatement(_) => "IfStatement",
            Node::ForStatement(_) => "ForStatement",
            Node::ForOfStatement(_) => "ForOfStatement",
            Node::ArrayLiteral(_) => "ArrayLiteral",
            Node::MemberExpression(_) => "MemberExpression",
            Node::IndexerCall(_) => "IndexerCall",
            Node::FunctionCall(_) => "FunctionCall",
            Node::NamedFunctionDeclaration(_) => "NamedFunctionDeclaration",
            Node::AnonymousFunctionDeclaration(_) => "AnonymousFunctionDeclaration",
            Node::FunctionReturn(_) => "FunctionReturn",
            Node::BreakStatement => "BreakStatement",
            Node::Dead => "Dead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Let,
    Const,
    Var,
}

impl DeclarationKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "let" => Some(DeclarationKind::Let),
            "const" => Some(DeclarationKind::Const),
            "var" => Some(DeclarationKind::Var),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
            DeclarationKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// `Dead` when declared without an initializer.
    pub init: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) | Literal::Float(_) => "number",
            Literal::Boolean(_) => "bool",
            Literal::String(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Binary,
    /// `=` and the compound forms such as `+=`.
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    LogicalAnd,
    LogicalOr,
    Nullish,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let operator = match symbol {
            "=" => BinaryOperator::Assign,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Remainder,
            "**" => BinaryOperator::Exponent,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "===" => BinaryOperator::StrictEqual,
            "!==" => BinaryOperator::StrictNotEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessThanEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterThanEqual,
            "&&" => BinaryOperator::LogicalAnd,
            "||" => BinaryOperator::LogicalOr,
            "??" => BinaryOperator::Nullish,
            "&" => BinaryOperator::BitwiseAnd,
            "|" => BinaryOperator::BitwiseOr,
            "^" => BinaryOperator::BitwiseXor,
            "<<" => BinaryOperator::ShiftLeft,
            ">>" => BinaryOperator::ShiftRight,
            ">>>" => BinaryOperator::UnsignedShiftRight,
            _ => return None,
        };
        Some(operator)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Assign => "=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::Nullish => "??",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub kind: BinaryKind,
    /// For a compound assignment this is the operator applied before writing,
    /// so `x += 1` is `Assignment` + `Add`.
    pub operator: BinaryOperator,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

impl BinaryExpression {
    /// The operator as written in source.
    pub fn operator_symbol(&self) -> String {
        match (self.kind, self.operator) {
            (BinaryKind::Assignment, BinaryOperator::Assign) | (BinaryKind::Binary, _) => {
                self.operator.symbol().to_string()
            }
            (BinaryKind::Assignment, operator) => format!("{}=", operator.symbol()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Increment,
    Decrement,
    Negate,
    Plus,
    Not,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "++" => Some(UnaryOperator::Increment),
            "--" => Some(UnaryOperator::Decrement),
            "-" => Some(UnaryOperator::Negate),
            "+" => Some(UnaryOperator::Plus),
            "!" => Some(UnaryOperator::Not),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Increment => "++",
            UnaryOperator::Decrement => "--",
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Node>,
    /// `i++` rather than `++i`.
    pub is_suffix: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub test: Box<Node>,
    pub consequent: Box<Node>,
    pub alternate: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Box<Node>,
    pub test: Box<Node>,
    pub update: Box<Node>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStatement {
    pub kind: DeclarationKind,
    pub binding: String,
    pub iterable: Box<Node>,
    pub body: Box<Node>,
}

/// `object.property`, where `property` is an `Identifier` for accessors such as
/// `length` or a `FunctionCall` for method calls such as `push(4)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    pub object: Box<Node>,
    pub property: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexerCall {
    pub target: Box<Node>,
    pub index: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: Box<Node>,
    pub arguments: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// A `Block`, or a bare expression for arrow functions like `n => n * 2`.
    pub body: Node,
}

impl FunctionDeclaration {
    pub fn has_block_body(&self) -> bool {
        matches!(self.body, Node::Block(_))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

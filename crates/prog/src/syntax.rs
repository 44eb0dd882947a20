//! Prog syntax tree
//!
//! Untyped output of the parser. The compiler turns it into the typed,
//! executable tree in [`crate::node`].

use crate::lexer::Token;
use crate::types::ProgType;
use std::fmt;

/// Untyped expression
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxExpr {
    Number(f64),

    Text(String),

    Boolean(bool),

    Variable(String),

    /// Operator resolved through the function registry
    Binary {
        left: Box<SyntaxExpr>,
        op: BinaryOp,
        right: Box<SyntaxExpr>,
    },

    /// Short-circuit `and` / `or`
    Logical {
        left: Box<SyntaxExpr>,
        op: LogicalOp,
        right: Box<SyntaxExpr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<SyntaxExpr>,
    },

    Call {
        name: String,
        args: Vec<SyntaxExpr>,
    },

    /// `target[index]`
    Index {
        target: Box<SyntaxExpr>,
        index: Box<SyntaxExpr>,
    },

    /// `[a, b, c]`
    Collection(Vec<SyntaxExpr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        let op = match token {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,

            Token::Equal => BinaryOp::Equal,
            Token::NotEqual => BinaryOp::NotEqual,
            Token::Less => BinaryOp::Less,
            Token::Greater => BinaryOp::Greater,
            Token::LessEqual => BinaryOp::LessEqual,
            Token::GreaterEqual => BinaryOp::GreaterEqual,

            _ => return None,
        };
        Some(op)
    }

    /// Registry name the operator resolves under
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

/// Short-circuit operators, compiled to dedicated nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Minus => Some(UnaryOp::Negate),
            Token::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "negate",
            UnaryOp::Not => "not",
        }
    }
}

/// Registry name for `target[index]`
pub const INDEX_FUNCTION: &str = "[]";

/// One parsed source line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `var name as type [= initializer]`
    Declare {
        name: String,
        ty: ProgType,
        initializer: Option<SyntaxExpr>,
    },

    /// `name = value`
    Assign { name: String, value: SyntaxExpr },

    /// `return [value]`
    Return(Option<SyntaxExpr>),

    If(SyntaxExpr),

    ElseIf(SyntaxExpr),

    Else,

    EndIf,

    While(SyntaxExpr),

    EndWhile,

    /// `foreach variable in source`
    Foreach { variable: String, source: SyntaxExpr },

    EndForeach,

    Break,

    Continue,

    /// Any other expression, evaluated for its effects
    Expression(SyntaxExpr),
}

impl Line {
    /// True for lines that close or continue an enclosing block
    pub fn is_block_terminator(&self) -> bool {
        matches!(
            self,
            Line::ElseIf(_) | Line::Else | Line::EndIf | Line::EndWhile | Line::EndForeach
        )
    }
}

impl fmt::Display for SyntaxExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyntaxExpr::Number(n) => write!(f, "{}", n),
            SyntaxExpr::Text(s) => write!(f, "{:?}", s),
            SyntaxExpr::Boolean(b) => write!(f, "{}", b),
            SyntaxExpr::Variable(name) => f.write_str(name),
            SyntaxExpr::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op.function_name(), right)
            }
            SyntaxExpr::Logical { left, op, right } => {
                let word = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                write!(f, "({} {} {})", left, word, right)
            }
            SyntaxExpr::Unary { op: UnaryOp::Negate, operand } => write!(f, "-{}", operand),
            SyntaxExpr::Unary { op: UnaryOp::Not, operand } => write!(f, "not {}", operand),
            SyntaxExpr::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            SyntaxExpr::Index { target, index } => write!(f, "{}[{}]", target, index),
            SyntaxExpr::Collection(items) => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

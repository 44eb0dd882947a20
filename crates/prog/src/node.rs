//! Executable prog tree
//!
//! The compiler produces these nodes with every type already resolved and
//! every function call already bound to one implementation. Execution lives
//! in [`crate::runtime`].

use crate::error::RuntimeFault;
use crate::runtime::ExecContext;
use crate::types::{ElementType, ProgType};
use crate::value::Value;
use std::fmt;

/// Native implementation of a built-in function
///
/// Receives the already-evaluated arguments, left to right.
pub type NativeFn = fn(&mut ExecContext<'_>, &[Value]) -> Result<Value, RuntimeFault>;

/// A call bound to one overload
#[derive(Clone)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub return_type: ProgType,
    pub native: NativeFn,
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Expression node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Constant value
    Literal(Value),

    /// Variable read
    Variable { name: String, ty: ProgType },

    /// Built-in function or operator
    Call(FunctionCall),

    /// Short-circuit logical and
    And(Box<Expr>, Box<Expr>),

    /// Short-circuit logical or
    Or(Box<Expr>, Box<Expr>),

    /// Evaluates only the selected branch
    Choose {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },

    /// Collection literal
    Collection { element: ElementType, items: Vec<Expr> },
}

impl Expr {
    /// Static type of the value this expression produces
    pub fn prog_type(&self) -> ProgType {
        match self {
            Expr::Literal(value) => value.prog_type(),
            Expr::Variable { ty, .. } => *ty,
            Expr::Call(call) => call.return_type,
            Expr::And(..) | Expr::Or(..) => ProgType::Boolean,
            Expr::Choose { when_true, .. } => when_true.prog_type(),
            Expr::Collection { element, .. } => ProgType::Collection(*element),
        }
    }
}

/// One `if` or `else if` arm
#[derive(Debug, Clone)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Statement>,
}

/// Statement node
#[derive(Debug, Clone)]
pub enum Statement {
    /// `var name as type [= initializer]`
    Declare {
        name: String,
        ty: ProgType,
        initializer: Option<Expr>,
    },

    /// `name = value`
    Assign { name: String, value: Expr },

    /// Expression evaluated for its effects
    Expression(Expr),

    /// `return [value]`
    Return(Option<Expr>),

    /// `if` / `else if` / `else`
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Statement>>,
    },

    /// `while condition`
    While { condition: Expr, body: Vec<Statement> },

    /// `foreach variable in source`
    ForEach {
        variable: String,
        element: ElementType,
        source: Expr,
        body: Vec<Statement>,
    },

    Break,

    Continue,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Text(s)) => write!(f, "{:?}", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable { name, .. } => f.write_str(name),
            Expr::Call(call) => {
                let args: Vec<String> = call.args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{}({})", call.name, args.join(", "))
            }
            Expr::And(left, right) => write!(f, "({} and {})", left, right),
            Expr::Or(left, right) => write!(f, "({} or {})", left, right),
            Expr::Choose {
                condition,
                when_true,
                when_false,
            } => write!(f, "ifelse({}, {}, {})", condition, when_true, when_false),
            Expr::Collection { items, .. } => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Render a statement list as an indented listing
pub fn disassemble(statements: &[Statement], name: &str) -> String {
    let mut output = format!("== {} ==\n", name);
    write_statements(&mut output, statements, 0);
    output
}

fn write_statements(output: &mut String, statements: &[Statement], depth: usize) {
    for statement in statements {
        write_statement(output, statement, depth);
    }
}

fn write_line(output: &mut String, depth: usize, text: &str) {
    output.push_str(&"  ".repeat(depth));
    output.push_str(text);
    output.push('\n');
}

fn write_statement(output: &mut String, statement: &Statement, depth: usize) {
    match statement {
        Statement::Declare {
            name,
            ty,
            initializer: Some(init),
        } => write_line(output, depth, &format!("var {} as {} = {}", name, ty, init)),
        Statement::Declare { name, ty, .. } => {
            write_line(output, depth, &format!("var {} as {}", name, ty))
        }
        Statement::Assign { name, value } => write_line(output, depth, &format!("{} = {}", name, value)),
        Statement::Expression(expr) => write_line(output, depth, &expr.to_string()),
        Statement::Return(Some(expr)) => write_line(output, depth, &format!("return {}", expr)),
        Statement::Return(None) => write_line(output, depth, "return"),
        Statement::If { branches, otherwise } => {
            for (index, branch) in branches.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "else if" };
                write_line(output, depth, &format!("{} {}", keyword, branch.condition));
                write_statements(output, &branch.body, depth + 1);
            }
            if let Some(body) = otherwise {
                write_line(output, depth, "else");
                write_statements(output, body, depth + 1);
            }
            write_line(output, depth, "end if");
        }
        Statement::While { condition, body } => {
            write_line(output, depth, &format!("while {}", condition));
            write_statements(output, body, depth + 1);
            write_line(output, depth, "end while");
        }
        Statement::ForEach {
            variable,
            source,
            body,
            ..
        } => {
            write_line(output, depth, &format!("foreach {} in {}", variable, source));
            write_statements(output, body, depth + 1);
            write_line(output, depth, "end foreach");
        }
        Statement::Break => write_line(output, depth, "break"),
        Statement::Continue => write_line(output, depth, "continue"),
    }
}

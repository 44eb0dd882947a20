//! Prog Statement Compiler
//!
//! Compiles source lines into the executable tree, one statement at a time.
//! Each call to [`StatementCompiler::compile_next`] consumes one statement
//! (a block statement consumes its whole body) and hands back the variable
//! types visible after it together with the lines it did not touch.
//!
//! Block bodies see the variables declared before the block. Nothing declared
//! inside a block is visible after it, whichever branch declared it.

use crate::error::CompileError;
use crate::node::{Branch, Expr, Statement};
use crate::parser::parse_line;
use crate::program::ProgParameter;
use crate::registry::FunctionRegistry;
use crate::syntax::{Line, LogicalOp, SyntaxExpr, INDEX_FUNCTION};
use crate::types::ProgType;
use crate::value::Value;
use std::collections::{BTreeMap, HashSet};

/// Declared variable types, by name
pub type VariableTypes = BTreeMap<String, ProgType>;

/// Default limit on how deeply blocks may nest
pub const DEFAULT_MAX_NESTING: usize = 32;

/// A statement compiled from one or more source lines
#[derive(Debug, Clone)]
pub struct CompiledStatement<'a> {
    pub statement: Statement,
    /// Variable types visible after this statement
    pub variables: VariableTypes,
    /// Source lines after the ones this statement consumed
    pub remaining: &'a [&'a str],
    pub first_line: usize,
    pub last_line: usize,
}

/// Outcome of compiling the next statement
#[derive(Debug, Clone)]
pub enum CompileResult<'a> {
    Statement(CompiledStatement<'a>),
    /// A blank or comment line was skipped
    Comment { line: usize, remaining: &'a [&'a str] },
}

/// Where in the block structure a statement sits
#[derive(Debug, Clone, Copy)]
struct Scope {
    depth: usize,
    in_loop: bool,
}

/// Remaining body of a block, stopped at its terminator line
struct Body<'a> {
    statements: Vec<Statement>,
    terminator: Line,
    terminator_line: usize,
    remaining: &'a [&'a str],
}

/// Compiles prog statements against a function registry
pub struct StatementCompiler<'r> {
    registry: &'r FunctionRegistry,
    return_type: ProgType,
    max_nesting: usize,
}

impl<'r> StatementCompiler<'r> {
    pub fn new(registry: &'r FunctionRegistry, return_type: ProgType) -> Self {
        Self {
            registry,
            return_type,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Compile a whole program body
    ///
    /// Parameter problems are reported against line 0.
    pub fn compile_program(&self, source: &str, parameters: &[ProgParameter]) -> Result<Vec<Statement>, CompileError> {
        let mut variables = VariableTypes::new();
        let mut seen = HashSet::new();

        for parameter in parameters {
            if !is_identifier(&parameter.name) {
                return Err(CompileError::new(
                    0,
                    format!("'{}' is not a valid parameter name", parameter.name),
                ));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(CompileError::new(
                    0,
                    format!("Parameter '{}' is declared twice", parameter.name),
                ));
            }
            if parameter.ty.is_void() {
                return Err(CompileError::new(
                    0,
                    format!("Parameter '{}' cannot be void", parameter.name),
                ));
            }
            variables.insert(parameter.name.clone(), parameter.ty);
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut remaining = lines.as_slice();
        let mut offset = 0;
        let mut statements = Vec::new();

        while !remaining.is_empty() {
            match self.compile_next(remaining, &variables, offset)? {
                CompileResult::Comment { line, remaining: rest } => {
                    offset = line;
                    remaining = rest;
                }
                CompileResult::Statement(compiled) => {
                    offset = compiled.last_line;
                    remaining = compiled.remaining;
                    variables = compiled.variables;
                    statements.push(compiled.statement);
                }
            }
        }

        Ok(statements)
    }

    /// Compile the statement starting at `lines[0]`
    ///
    /// `line_offset` is the number of source lines before `lines`, so
    /// `lines[0]` is reported as line `line_offset + 1`.
    pub fn compile_next<'a>(
        &self,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        line_offset: usize,
    ) -> Result<CompileResult<'a>, CompileError> {
        self.compile_in(
            lines,
            variables,
            line_offset,
            Scope {
                depth: 0,
                in_loop: false,
            },
        )
    }

    fn compile_in<'a>(
        &self,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        offset: usize,
        scope: Scope,
    ) -> Result<CompileResult<'a>, CompileError> {
        let line = offset + 1;
        let Some((text, rest)) = lines.split_first() else {
            return Err(CompileError::new(line, "Expected a statement"));
        };

        let Some(parsed) = parse_line(text, line)? else {
            return Ok(CompileResult::Comment { line, remaining: rest });
        };

        let mut after = variables.clone();
        let statement = match parsed {
            Line::Declare { name, ty, initializer } => {
                if ty.is_void() {
                    return Err(CompileError::new(line, format!("Variable '{}' cannot be void", name)));
                }
                if let Some(existing) = variables.get(&name) {
                    if *existing != ty {
                        return Err(CompileError::new(
                            line,
                            format!("Variable '{}' is already declared as {}", name, existing),
                        ));
                    }
                }

                let initializer = match initializer {
                    Some(init) => {
                        let init = self.expression(init, variables, line)?;
                        if init.prog_type() != ty {
                            return Err(CompileError::new(
                                line,
                                format!(
                                    "Cannot initialise {} variable '{}' with a {} value",
                                    ty,
                                    name,
                                    init.prog_type()
                                ),
                            ));
                        }
                        Some(init)
                    }
                    None => None,
                };

                after.insert(name.clone(), ty);
                Statement::Declare { name, ty, initializer }
            }

            Line::Assign { name, value } => {
                let ty = *variables.get(&name).ok_or_else(|| undeclared(line, &name))?;
                let value = self.expression(value, variables, line)?;
                if value.prog_type() != ty {
                    return Err(CompileError::new(
                        line,
                        format!(
                            "Cannot assign a {} value to {} variable '{}'",
                            value.prog_type(),
                            ty,
                            name
                        ),
                    ));
                }
                Statement::Assign { name, value }
            }

            Line::Expression(expr) => Statement::Expression(self.expression(expr, variables, line)?),

            Line::Return(None) => {
                if !self.return_type.is_void() {
                    return Err(CompileError::new(
                        line,
                        format!("This prog must return a {} value", self.return_type),
                    ));
                }
                Statement::Return(None)
            }

            Line::Return(Some(expr)) => {
                let value = self.expression(expr, variables, line)?;
                if self.return_type.is_void() {
                    return Err(CompileError::new(line, "This prog does not return a value"));
                }
                if value.prog_type() != self.return_type {
                    return Err(CompileError::new(
                        line,
                        format!(
                            "Return type mismatch: expected {} but found {}",
                            self.return_type,
                            value.prog_type()
                        ),
                    ));
                }
                Statement::Return(Some(value))
            }

            Line::Break if !scope.in_loop => return Err(outside_loop(line, "break")),

            Line::Continue if !scope.in_loop => return Err(outside_loop(line, "continue")),

            Line::Break => Statement::Break,

            Line::Continue => Statement::Continue,

            Line::If(condition) => {
                return self
                    .compile_if(condition, rest, variables, line, scope)
                    .map(CompileResult::Statement)
            }

            Line::While(condition) => {
                return self
                    .compile_while(condition, rest, variables, line, scope)
                    .map(CompileResult::Statement)
            }

            Line::Foreach { variable, source } => {
                return self
                    .compile_foreach(variable, source, rest, variables, line, scope)
                    .map(CompileResult::Statement)
            }

            terminator => {
                return Err(CompileError::new(
                    line,
                    format!("{} without a matching block", terminator_text(&terminator)),
                ))
            }
        };

        Ok(CompileResult::Statement(CompiledStatement {
            statement,
            variables: after,
            remaining: rest,
            first_line: line,
            last_line: line,
        }))
    }

    fn compile_if<'a>(
        &self,
        condition: SyntaxExpr,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        line: usize,
        scope: Scope,
    ) -> Result<CompiledStatement<'a>, CompileError> {
        let inner = self.nested(scope, line, false)?;
        let mut branches = Vec::new();
        let mut otherwise = None;
        let mut pending = Some(self.condition(condition, variables, line)?);
        let mut lines = lines;
        let mut offset = line;

        loop {
            let body = self.compile_body(lines, variables, offset, inner, line, "if")?;
            match pending.take() {
                Some(condition) => branches.push(Branch {
                    condition,
                    body: body.statements,
                }),
                None => otherwise = Some(body.statements),
            }
            lines = body.remaining;
            offset = body.terminator_line;

            match body.terminator {
                Line::EndIf => {
                    return Ok(CompiledStatement {
                        statement: Statement::If { branches, otherwise },
                        variables: variables.clone(),
                        remaining: lines,
                        first_line: line,
                        last_line: offset,
                    })
                }
                Line::ElseIf(next) if otherwise.is_none() => {
                    pending = Some(self.condition(next, variables, offset)?);
                }
                Line::Else if otherwise.is_none() => {}
                Line::ElseIf(_) | Line::Else => {
                    return Err(CompileError::new(offset, "'else' cannot follow the final 'else' of an if"))
                }
                other => {
                    return Err(CompileError::new(
                        offset,
                        format!("Expected 'end if' but found {}", terminator_text(&other)),
                    ))
                }
            }
        }
    }

    fn compile_while<'a>(
        &self,
        condition: SyntaxExpr,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        line: usize,
        scope: Scope,
    ) -> Result<CompiledStatement<'a>, CompileError> {
        let inner = self.nested(scope, line, true)?;
        let condition = self.condition(condition, variables, line)?;
        let body = self.compile_body(lines, variables, line, inner, line, "while")?;

        if body.terminator != Line::EndWhile {
            return Err(CompileError::new(
                body.terminator_line,
                format!("Expected 'end while' but found {}", terminator_text(&body.terminator)),
            ));
        }

        Ok(CompiledStatement {
            statement: Statement::While {
                condition,
                body: body.statements,
            },
            variables: variables.clone(),
            remaining: body.remaining,
            first_line: line,
            last_line: body.terminator_line,
        })
    }

    fn compile_foreach<'a>(
        &self,
        variable: String,
        source: SyntaxExpr,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        line: usize,
        scope: Scope,
    ) -> Result<CompiledStatement<'a>, CompileError> {
        let inner = self.nested(scope, line, true)?;

        if variables.contains_key(&variable) {
            return Err(CompileError::new(
                line,
                format!("Loop variable '{}' is already declared", variable),
            ));
        }

        let source = self.expression(source, variables, line)?;
        let element = match source.prog_type() {
            ProgType::Collection(element) | ProgType::Dictionary(element) => element,
            other => {
                return Err(CompileError::new(
                    line,
                    format!("foreach needs a collection or dictionary, not {}", other),
                ))
            }
        };

        let mut body_variables = variables.clone();
        body_variables.insert(variable.clone(), ProgType::from(element));
        let body = self.compile_body(lines, &body_variables, line, inner, line, "foreach")?;

        if body.terminator != Line::EndForeach {
            return Err(CompileError::new(
                body.terminator_line,
                format!("Expected 'end foreach' but found {}", terminator_text(&body.terminator)),
            ));
        }

        Ok(CompiledStatement {
            statement: Statement::ForEach {
                variable,
                element,
                source,
                body: body.statements,
            },
            variables: variables.clone(),
            remaining: body.remaining,
            first_line: line,
            last_line: body.terminator_line,
        })
    }

    /// Compile statements until a line that closes or continues the block
    fn compile_body<'a>(
        &self,
        lines: &'a [&'a str],
        variables: &VariableTypes,
        offset: usize,
        scope: Scope,
        opened_at: usize,
        keyword: &str,
    ) -> Result<Body<'a>, CompileError> {
        let mut statements = Vec::new();
        let mut variables = variables.clone();
        let mut lines = lines;
        let mut offset = offset;

        loop {
            let Some(text) = lines.first() else {
                return Err(CompileError::new(
                    opened_at,
                    format!("'{}' is never closed with 'end {}'", keyword, keyword),
                ));
            };

            let line = offset + 1;
            if let Some(parsed) = parse_line(text, line)? {
                if parsed.is_block_terminator() {
                    return Ok(Body {
                        statements,
                        terminator: parsed,
                        terminator_line: line,
                        remaining: &lines[1..],
                    });
                }
            }

            match self.compile_in(lines, &variables, offset, scope)? {
                CompileResult::Comment { line, remaining } => {
                    offset = line;
                    lines = remaining;
                }
                CompileResult::Statement(compiled) => {
                    offset = compiled.last_line;
                    lines = compiled.remaining;
                    variables = compiled.variables;
                    statements.push(compiled.statement);
                }
            }
        }
    }

    fn nested(&self, scope: Scope, line: usize, is_loop: bool) -> Result<Scope, CompileError> {
        if scope.depth >= self.max_nesting {
            return Err(CompileError::new(
                line,
                format!("Blocks are nested more than {} deep", self.max_nesting),
            ));
        }
        Ok(Scope {
            depth: scope.depth + 1,
            in_loop: scope.in_loop || is_loop,
        })
    }

    fn condition(&self, expr: SyntaxExpr, variables: &VariableTypes, line: usize) -> Result<Expr, CompileError> {
        let condition = self.expression(expr, variables, line)?;
        if condition.prog_type() != ProgType::Boolean {
            return Err(CompileError::new(
                line,
                format!("Condition must be boolean, not {}", condition.prog_type()),
            ));
        }
        Ok(condition)
    }

    /// Compile an expression against the variables declared so far
    pub fn expression(&self, expr: SyntaxExpr, variables: &VariableTypes, line: usize) -> Result<Expr, CompileError> {
        match expr {
            SyntaxExpr::Number(n) => Ok(Expr::Literal(Value::Number(n))),

            SyntaxExpr::Text(s) => Ok(Expr::Literal(Value::Text(s))),

            SyntaxExpr::Boolean(b) => Ok(Expr::Literal(Value::Boolean(b))),

            SyntaxExpr::Variable(name) => match variables.get(&name) {
                Some(&ty) => Ok(Expr::Variable { name, ty }),
                None => Err(undeclared(line, &name)),
            },

            SyntaxExpr::Binary { left, op, right } => {
                self.call(op.function_name(), vec![*left, *right], variables, line)
            }

            SyntaxExpr::Unary { op, operand } => self.call(op.function_name(), vec![*operand], variables, line),

            SyntaxExpr::Index { target, index } => {
                self.call(INDEX_FUNCTION, vec![*target, *index], variables, line)
            }

            SyntaxExpr::Call { name, args } => self.call(&name, args, variables, line),

            SyntaxExpr::Logical { left, op, right } => {
                let word = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                let left = self.expression(*left, variables, line)?;
                let right = self.expression(*right, variables, line)?;
                for operand in [&left, &right] {
                    if operand.prog_type() != ProgType::Boolean {
                        return Err(CompileError::new(
                            line,
                            format!("'{}' needs boolean operands, not {}", word, operand.prog_type()),
                        ));
                    }
                }
                Ok(match op {
                    LogicalOp::And => Expr::And(Box::new(left), Box::new(right)),
                    LogicalOp::Or => Expr::Or(Box::new(left), Box::new(right)),
                })
            }

            SyntaxExpr::Collection(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.expression(item, variables, line))
                    .collect::<Result<Vec<_>, _>>()?;

                let first = items
                    .first()
                    .map(Expr::prog_type)
                    .ok_or_else(|| CompileError::new(line, "A collection literal needs at least one element"))?;
                let element = first
                    .as_element()
                    .ok_or_else(|| CompileError::new(line, format!("Collections cannot hold {} values", first)))?;

                if let Some((position, odd)) = items
                    .iter()
                    .enumerate()
                    .find(|(_, item)| item.prog_type() != first)
                {
                    return Err(CompileError::new(
                        line,
                        format!(
                            "Collection elements must all be {}, but element {} is {}",
                            first,
                            position + 1,
                            odd.prog_type()
                        ),
                    ));
                }

                Ok(Expr::Collection { element, items })
            }
        }
    }

    /// Resolve a function or operator call and build its node
    fn call(&self, name: &str, args: Vec<SyntaxExpr>, variables: &VariableTypes, line: usize) -> Result<Expr, CompileError> {
        let args = args
            .into_iter()
            .map(|arg| self.expression(arg, variables, line))
            .collect::<Result<Vec<_>, _>>()?;
        let types: Vec<ProgType> = args.iter().map(Expr::prog_type).collect();

        let resolved = self
            .registry
            .resolve(name, &types)
            .map_err(|err| CompileError::new(line, err.to_string()))?;

        resolved
            .entry
            .instantiate(args, resolved.return_type)
            .map_err(|message| CompileError::new(line, message))
    }
}

fn undeclared(line: usize, name: &str) -> CompileError {
    CompileError::new(line, format!("Undeclared variable '{}'", name))
}

fn outside_loop(line: usize, keyword: &str) -> CompileError {
    CompileError::new(line, format!("'{}' outside of a loop", keyword))
}

fn terminator_text(line: &Line) -> &'static str {
    match line {
        Line::ElseIf(_) => "'else if'",
        Line::Else => "'else'",
        Line::EndIf => "'end if'",
        Line::EndWhile => "'end while'",
        Line::EndForeach => "'end foreach'",
        _ => "a statement",
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementType;

    fn compile(source: &str, return_type: ProgType, parameters: &[ProgParameter]) -> Result<Vec<Statement>, CompileError> {
        let registry = FunctionRegistry::standard();
        StatementCompiler::new(&registry, return_type).compile_program(source, parameters)
    }

    #[test]
    fn test_compile_next_reports_span_and_variables() {
        let registry = FunctionRegistry::standard();
        let compiler = StatementCompiler::new(&registry, ProgType::Void);
        let lines = ["var total as number = 1", "total = total + 1"];

        let CompileResult::Statement(first) = compiler.compile_next(&lines, &VariableTypes::new(), 0).unwrap() else {
            panic!("expected a statement");
        };
        assert_eq!((first.first_line, first.last_line), (1, 1));
        assert_eq!(first.variables.get("total"), Some(&ProgType::Number));
        assert_eq!(first.remaining, &lines[1..]);

        let CompileResult::Statement(second) = compiler
            .compile_next(first.remaining, &first.variables, first.last_line)
            .unwrap()
        else {
            panic!("expected a statement");
        };
        assert_eq!(second.first_line, 2);
        assert!(second.remaining.is_empty());
    }

    #[test]
    fn test_comment_consumes_one_line() {
        let registry = FunctionRegistry::standard();
        let compiler = StatementCompiler::new(&registry, ProgType::Void);
        let lines = ["// greeting", "return"];

        match compiler.compile_next(&lines, &VariableTypes::new(), 4).unwrap() {
            CompileResult::Comment { line, remaining } => {
                assert_eq!(line, 5);
                assert_eq!(remaining, &lines[1..]);
            }
            other => panic!("expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_block_spans_lines() {
        let registry = FunctionRegistry::standard();
        let compiler = StatementCompiler::new(&registry, ProgType::Void);
        let lines = ["while true", "  break", "end while", "return"];

        let CompileResult::Statement(compiled) = compiler.compile_next(&lines, &VariableTypes::new(), 0).unwrap() else {
            panic!("expected a statement");
        };
        assert_eq!((compiled.first_line, compiled.last_line), (1, 3));
        assert_eq!(compiled.remaining, &lines[3..]);
    }

    #[test]
    fn test_undeclared_variable() {
        let err = compile("return x + 1;", ProgType::Number, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(1, "Undeclared variable 'x'"));
    }

    #[test]
    fn test_forward_reference_reports_first_use() {
        let source = "var a as number\na = later\nvar later as number";
        let err = compile(source, ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "Undeclared variable 'later'"));
    }

    #[test]
    fn test_block_declarations_do_not_escape() {
        let source = "if true\n  var inner as number = 1\nelse\n  var inner as number = 2\nend if\nreturn inner";
        let err = compile(source, ProgType::Number, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(6, "Undeclared variable 'inner'"));
    }

    #[test]
    fn test_redeclare_with_other_type() {
        let source = "var x as number\nvar x as text";
        let err = compile(source, ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "Variable 'x' is already declared as number"));

        assert!(compile("var x as number\nvar x as number", ProgType::Void, &[]).is_ok());
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let source = "var x as number\nx = \"five\"";
        let err = compile(source, ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "Cannot assign a text value to number variable 'x'");
    }

    #[test]
    fn test_return_type_checked() {
        let err = compile("return \"five\"", ProgType::Number, &[]).unwrap_err();
        assert_eq!(err.message, "Return type mismatch: expected number but found text");

        let err = compile("return", ProgType::Number, &[]).unwrap_err();
        assert_eq!(err.message, "This prog must return a number value");

        let err = compile("return 1", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.message, "This prog does not return a value");
    }

    #[test]
    fn test_break_outside_loop() {
        let err = compile("if true\n  break\nend if", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "'break' outside of a loop"));

        assert!(compile("while true\n  if true\n    continue\n  end if\n  break\nend while", ProgType::Void, &[]).is_ok());
    }

    #[test]
    fn test_unclosed_and_stray_blocks() {
        let err = compile("return\nwhile true\n  return", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "'while' is never closed with 'end while'"));

        let err = compile("end if", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(1, "'end if' without a matching block"));

        let err = compile("while true\nend if", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "Expected 'end while' but found 'end if'"));

        let err = compile("if true\nelse\nelse\nend if", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let err = compile("if 1\nend if", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(1, "Condition must be boolean, not number"));
    }

    #[test]
    fn test_foreach_binds_element_type() {
        let params = [ProgParameter::new("names", ProgType::Collection(ElementType::Text))];
        let source = "var all as text\nforeach name in names\n  all = all + name\nend foreach\nreturn all";
        assert!(compile(source, ProgType::Text, &params).is_ok());

        let source = "foreach n in 5\nend foreach";
        let err = compile(source, ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.message, "foreach needs a collection or dictionary, not number");

        let source = "foreach names in names\nend foreach";
        let err = compile(source, ProgType::Void, &params).unwrap_err();
        assert_eq!(err.message, "Loop variable 'names' is already declared");
    }

    #[test]
    fn test_collection_literals() {
        let err = compile("var empty as number collection = []", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.message, "A collection literal needs at least one element");

        let err = compile("var mixed as number collection = [1, \"two\"]", ProgType::Void, &[]).unwrap_err();
        assert_eq!(err.message, "Collection elements must all be number, but element 2 is text");

        assert!(compile("var ok as number collection = [1, 2]", ProgType::Void, &[]).is_ok());
    }

    #[test]
    fn test_no_matching_overload() {
        let err = compile("return length(5)", ProgType::Number, &[]).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.starts_with("No matching overload for length(number)"));

        let err = compile("return 1 + true", ProgType::Number, &[]).unwrap_err();
        assert!(err.message.starts_with("No matching overload for +(number, boolean)"));
    }

    #[test]
    fn test_parameter_errors_use_line_zero() {
        let params = [
            ProgParameter::new("actor", ProgType::Character),
            ProgParameter::new("actor", ProgType::Character),
        ];
        let err = compile("return", ProgType::Void, &params).unwrap_err();
        assert_eq!(err, CompileError::new(0, "Parameter 'actor' is declared twice"));

        let params = [ProgParameter::new("bad name", ProgType::Number)];
        assert_eq!(compile("return", ProgType::Void, &params).unwrap_err().line, 0);
    }

    #[test]
    fn test_nesting_limit() {
        let registry = FunctionRegistry::standard();
        let compiler = StatementCompiler::new(&registry, ProgType::Void).with_max_nesting(1);
        let source = "if true\n  if true\n  end if\nend if";
        let err = compiler.compile_program(source, &[]).unwrap_err();
        assert_eq!(err, CompileError::new(2, "Blocks are nested more than 1 deep"));
    }
}

//! Prog Parser
//!
//! Recursive descent parser for a single prog source line.

use crate::error::CompileError;
use crate::lexer::{tokenize, Token};
use crate::syntax::*;
use crate::types::ProgType;

/// Parse one source line
///
/// Blank lines and comment-only lines yield `None`.
pub fn parse_line(text: &str, line: usize) -> Result<Option<Line>, CompileError> {
    let tokens = tokenize(text, line)?;
    if tokens.first() == Some(&Token::EOF) {
        return Ok(None);
    }
    Parser::new(tokens, line).line().map(Some)
}

/// Deepest expression tree one line may build
///
/// Compiling and running walk the tree recursively, so the limit bounds
/// their stack use too.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

const TOO_DEEP: &str = "Expression is nested too deeply";

/// Expression with the depth of its tree
type Parsed = (SyntaxExpr, usize);

/// Prog parser over the tokens of one line
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    line: usize,
    recursion: usize,
}

impl Parser {
    /// Create a parser; `tokens` must end with [`Token::EOF`]
    pub fn new(tokens: Vec<Token>, line: usize) -> Self {
        Self {
            tokens,
            position: 0,
            line,
            recursion: 0,
        }
    }

    /// Parse a complete statement line
    pub fn line(&mut self) -> Result<Line, CompileError> {
        let parsed = match self.current() {
            Token::Var => self.declaration()?,

            Token::Return => {
                self.advance();
                if self.at_end() {
                    Line::Return(None)
                } else {
                    Line::Return(Some(self.expression()?))
                }
            }

            Token::If => {
                self.advance();
                Line::If(self.expression()?)
            }

            Token::Else => {
                self.advance();
                if self.match_token(Token::If) {
                    Line::ElseIf(self.expression()?)
                } else {
                    Line::Else
                }
            }

            Token::End => {
                self.advance();
                if self.match_token(Token::If) {
                    Line::EndIf
                } else if self.match_token(Token::While) {
                    Line::EndWhile
                } else if self.match_token(Token::Foreach) {
                    Line::EndForeach
                } else {
                    return Err(self.error("Expected 'if', 'while' or 'foreach' after 'end'"));
                }
            }

            Token::While => {
                self.advance();
                Line::While(self.expression()?)
            }

            Token::Foreach => {
                self.advance();
                let variable = self.identifier("Expected loop variable name after 'foreach'")?;
                self.consume(Token::In, "Expected 'in' after loop variable")?;
                Line::Foreach {
                    variable,
                    source: self.expression()?,
                }
            }

            Token::Break => {
                self.advance();
                Line::Break
            }

            Token::Continue => {
                self.advance();
                Line::Continue
            }

            Token::Identifier(name) if self.peek() == &Token::Assign => {
                let name = name.clone();
                self.advance();
                self.advance();
                Line::Assign {
                    name,
                    value: self.expression()?,
                }
            }

            _ => Line::Expression(self.expression()?),
        };

        self.expect_end()?;
        Ok(parsed)
    }

    /// `var NAME as TYPE [= EXPR]`
    fn declaration(&mut self) -> Result<Line, CompileError> {
        self.consume(Token::Var, "Expected 'var'")?;
        let name = self.identifier("Expected variable name after 'var'")?;
        self.consume(Token::As, "Expected 'as' after variable name")?;

        let mut words = Vec::new();
        while let Token::Identifier(word) = self.current() {
            words.push(word.clone());
            self.advance();
        }
        if words.is_empty() {
            return Err(self.error("Expected a type after 'as'"));
        }

        let type_name = words.join(" ");
        let ty = ProgType::parse(&type_name)
            .ok_or_else(|| self.error(format!("Unknown type '{}'", type_name)))?;

        let initializer = if self.match_token(Token::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Line::Declare { name, ty, initializer })
    }

    /// Parse an expression
    pub fn expression(&mut self) -> Result<SyntaxExpr, CompileError> {
        self.nested().map(|(expr, _)| expr)
    }

    /// Parse a sub-expression one level further down
    fn nested(&mut self) -> Result<Parsed, CompileError> {
        self.enter()?;
        let parsed = self.or()?;
        self.leave();
        Ok(parsed)
    }

    /// Parse logical OR
    fn or(&mut self) -> Result<Parsed, CompileError> {
        let (mut expr, mut depth) = self.and()?;

        while self.match_token(Token::Or) {
            let (right, right_depth) = self.and()?;
            depth = self.deeper(depth.max(right_depth))?;
            expr = SyntaxExpr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }

        Ok((expr, depth))
    }

    /// Parse logical AND
    fn and(&mut self) -> Result<Parsed, CompileError> {
        let (mut expr, mut depth) = self.equality()?;

        while self.match_token(Token::And) {
            let (right, right_depth) = self.equality()?;
            depth = self.deeper(depth.max(right_depth))?;
            expr = SyntaxExpr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }

        Ok((expr, depth))
    }

    fn equality(&mut self) -> Result<Parsed, CompileError> {
        self.binary(&[Token::Equal, Token::NotEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Parsed, CompileError> {
        self.binary(
            &[Token::Greater, Token::GreaterEqual, Token::Less, Token::LessEqual],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Parsed, CompileError> {
        self.binary(&[Token::Minus, Token::Plus], Self::factor)
    }

    fn factor(&mut self) -> Result<Parsed, CompileError> {
        self.binary(&[Token::Slash, Token::Star, Token::Percent], Self::unary)
    }

    /// Left-associative binary level over `operand`
    ///
    /// Each further operand deepens the tree by one.
    fn binary(
        &mut self,
        operators: &[Token],
        operand: fn(&mut Self) -> Result<Parsed, CompileError>,
    ) -> Result<Parsed, CompileError> {
        let (mut expr, mut depth) = operand(self)?;

        while self.match_tokens(operators) {
            let op = BinaryOp::from_token(self.previous())
                .ok_or_else(|| self.error("Expected a binary operator"))?;
            let (right, right_depth) = operand(self)?;
            depth = self.deeper(depth.max(right_depth))?;
            expr = SyntaxExpr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok((expr, depth))
    }

    /// Parse unary expression
    fn unary(&mut self) -> Result<Parsed, CompileError> {
        if self.match_tokens(&[Token::Not, Token::Minus]) {
            let op = UnaryOp::from_token(self.previous())
                .ok_or_else(|| self.error("Expected a unary operator"))?;
            self.enter()?;
            let (operand, depth) = self.unary()?;
            self.leave();
            return Ok((
                SyntaxExpr::Unary {
                    op,
                    operand: Box::new(operand),
                },
                self.deeper(depth)?,
            ));
        }

        self.postfix()
    }

    /// Parse function call or index access
    fn postfix(&mut self) -> Result<Parsed, CompileError> {
        let (mut expr, mut depth) = self.primary()?;

        loop {
            if self.check(&Token::LParen) {
                let name = match &expr {
                    SyntaxExpr::Variable(name) => name.clone(),
                    _ => return Err(self.error("Only named functions can be called")),
                };
                self.advance();
                let (args, args_depth) = self.arguments(Token::RParen, "Expected ')' after arguments")?;
                depth = self.deeper(depth.max(args_depth))?;
                expr = SyntaxExpr::Call { name, args };
            } else if self.match_token(Token::LBracket) {
                let (index, index_depth) = self.nested()?;
                self.consume(Token::RBracket, "Expected ']' after index")?;
                depth = self.deeper(depth.max(index_depth))?;
                expr = SyntaxExpr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok((expr, depth))
    }

    /// Parse primary expression
    fn primary(&mut self) -> Result<Parsed, CompileError> {
        let token = self.current().clone();

        match token {
            Token::Number(n) => {
                self.advance();
                Ok((SyntaxExpr::Number(n), 1))
            }

            Token::Text(s) => {
                self.advance();
                Ok((SyntaxExpr::Text(s), 1))
            }

            Token::True => {
                self.advance();
                Ok((SyntaxExpr::Boolean(true), 1))
            }

            Token::False => {
                self.advance();
                Ok((SyntaxExpr::Boolean(false), 1))
            }

            Token::Identifier(name) => {
                self.advance();
                Ok((SyntaxExpr::Variable(name), 1))
            }

            Token::LParen => {
                self.advance();
                let parsed = self.nested()?;
                self.consume(Token::RParen, "Expected ')' after expression")?;
                Ok(parsed)
            }

            Token::LBracket => {
                self.advance();
                let (items, depth) = self.arguments(Token::RBracket, "Expected ']' after collection items")?;
                Ok((SyntaxExpr::Collection(items), self.deeper(depth)?))
            }

            Token::EOF => Err(self.error("Expected an expression")),

            _ => Err(self.error(format!("Unexpected token: {:?}", token))),
        }
    }

    /// Comma-separated expressions up to and including `close`, with the
    /// depth of the deepest one
    fn arguments(&mut self, close: Token, message: &str) -> Result<(Vec<SyntaxExpr>, usize), CompileError> {
        let mut args = Vec::new();
        let mut depth = 0;

        if !self.check(&close) {
            loop {
                let (arg, arg_depth) = self.nested()?;
                args.push(arg);
                depth = depth.max(arg_depth);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
        }

        self.consume(close, message)?;
        Ok((args, depth))
    }

    /// Count one level of parser recursion
    fn enter(&mut self) -> Result<(), CompileError> {
        self.recursion += 1;
        if self.recursion > MAX_EXPRESSION_DEPTH {
            return Err(self.error(TOO_DEEP));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.recursion = self.recursion.saturating_sub(1);
    }

    /// Depth of a node over a child of `depth`
    fn deeper(&self, depth: usize) -> Result<usize, CompileError> {
        if depth >= MAX_EXPRESSION_DEPTH {
            return Err(self.error(TOO_DEEP));
        }
        Ok(depth + 1)
    }

    fn identifier(&mut self, message: &str) -> Result<String, CompileError> {
        match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    /// Allow one trailing `;`, then require the end of the line
    fn expect_end(&mut self) -> Result<(), CompileError> {
        self.match_token(Token::Semicolon);
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error(format!("Unexpected token after statement: {:?}", self.current())))
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current(), Token::EOF | Token::Semicolon)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::EOF)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position + 1).unwrap_or(&Token::EOF)
    }

    /// Check if current token matches
    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    /// Match token and advance
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// Match any of multiple tokens
    fn match_tokens(&mut self, tokens: &[Token]) -> bool {
        for token in tokens {
            if self.check(token) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Consume a specific token or error
    fn consume(&mut self, token: Token, message: &str) -> Result<(), CompileError> {
        if self.check(&token) {
            self.advance();
            return Ok(());
        }
        Err(self.error(message))
    }

    fn previous(&self) -> &Token {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .unwrap_or(&Token::EOF)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.line, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementType;

    fn parse(text: &str) -> Line {
        parse_line(text, 1).unwrap().unwrap()
    }

    #[test]
    fn test_comment_and_blank_lines() {
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("   ", 1).unwrap(), None);
        assert_eq!(parse_line("// note", 1).unwrap(), None);
    }

    #[test]
    fn test_parse_return_with_precedence() {
        let Line::Return(Some(expr)) = parse("return 2 + 3 * 4;") else {
            panic!("expected return");
        };
        assert_eq!(expr.to_string(), "(2 + (3 * 4))");
    }

    #[test]
    fn test_parse_declaration() {
        assert_eq!(
            parse("var names as text collection"),
            Line::Declare {
                name: "names".into(),
                ty: ProgType::Collection(ElementType::Text),
                initializer: None,
            }
        );

        let line = parse("var total as number = 1");
        assert!(matches!(
            line,
            Line::Declare { ty: ProgType::Number, initializer: Some(SyntaxExpr::Number(_)), .. }
        ));
    }

    #[test]
    fn test_unknown_type() {
        let err = parse_line("var x as widget", 4).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.message, "Unknown type 'widget'");
    }

    #[test]
    fn test_parse_assignment_and_expression() {
        assert!(matches!(parse("x = x + 1"), Line::Assign { .. }));
        assert!(matches!(parse("x == 1"), Line::Expression(_)));
        assert!(matches!(
            parse("send(actor, \"hi\")"),
            Line::Expression(SyntaxExpr::Call { .. })
        ));
    }

    #[test]
    fn test_parse_block_lines() {
        assert!(matches!(parse("if x > 1"), Line::If(_)));
        assert!(matches!(parse("else if x"), Line::ElseIf(_)));
        assert_eq!(parse("else"), Line::Else);
        assert_eq!(parse("end if"), Line::EndIf);
        assert_eq!(parse("end while;"), Line::EndWhile);
        assert!(matches!(parse("foreach c in characters(here)"), Line::Foreach { .. }));
        assert_eq!(parse("end foreach"), Line::EndForeach);
        assert!(parse("end foreach").is_block_terminator());
    }

    #[test]
    fn test_logical_and_unary() {
        let Line::Expression(expr) = parse("not a and b || -c < 1") else {
            panic!("expected expression");
        };
        assert_eq!(expr.to_string(), "((not a and b) or (-c < 1))");
    }

    #[test]
    fn test_index_and_collection() {
        let Line::Expression(expr) = parse("[1, 2, 3][0]") else {
            panic!("expected expression");
        };
        assert_eq!(expr.to_string(), "[1, 2, 3][0]");
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_line("return 1 2", 2).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.starts_with("Unexpected token after statement"));
    }

    #[test]
    fn test_long_sum_rejected() {
        let source = format!("return 1{}", " + 1".repeat(10_000));
        let err = parse_line(&source, 1).unwrap_err();
        assert_eq!(err, CompileError::new(1, "Expression is nested too deeply"));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let parens = format!("return {}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse_line(&parens, 3).unwrap_err();
        assert_eq!(err, CompileError::new(3, "Expression is nested too deeply"));

        let negations = format!("return {}1", "-".repeat(10_000));
        let err = parse_line(&negations, 1).unwrap_err();
        assert_eq!(err.message, "Expression is nested too deeply");

        let lists = format!("return {}1{}", "[".repeat(10_000), "]".repeat(10_000));
        assert!(parse_line(&lists, 1).is_err());

        let calls = format!("return {}1{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert!(parse_line(&calls, 1).is_err());
    }

    #[test]
    fn test_depth_limit_boundary() {
        let source = format!("return 1{}", " + 1".repeat(MAX_EXPRESSION_DEPTH - 1));
        assert!(parse_line(&source, 1).is_ok());

        let source = format!("return 1{}", " + 1".repeat(MAX_EXPRESSION_DEPTH));
        assert!(parse_line(&source, 1).is_err());

        let Line::Return(Some(expr)) = parse("return (((a + b) * -c) > [1, 2][0]) and not done") else {
            panic!("expected return");
        };
        assert_eq!(expr.to_string(), "((((a + b) * -c) > [1, 2][0]) and not done)");
    }

    #[test]
    fn test_missing_end_keyword() {
        let err = parse_line("end", 5).unwrap_err();
        assert_eq!(err.message, "Expected 'if', 'while' or 'foreach' after 'end'");
    }
}

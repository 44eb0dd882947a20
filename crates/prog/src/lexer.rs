//! Prog Lexer and Tokenizer
//!
//! Progs are line oriented, so the lexer works on a single source line and
//! tags every error with that line's number.

use crate::error::CompileError;
use std::iter::Peekable;
use std::str::Chars;

/// Prog token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Text(String),
    Identifier(String),

    // Keywords
    Var,
    As,
    If,
    Else,
    End,
    While,
    Foreach,
    In,
    Return,
    Break,
    Continue,
    True,
    False,

    // Arithmetic
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %

    // Comparison
    Equal,          // ==
    NotEqual,       // !=
    Less,           // <
    Greater,        // >
    LessEqual,      // <=
    GreaterEqual,   // >=

    // Logical
    And,            // && or `and`
    Or,             // || or `or`
    Not,            // ! or `not`

    Assign,         // =

    // Delimiters
    LParen,         // (
    RParen,         // )
    LBracket,       // [
    RBracket,       // ]
    Comma,          // ,
    Semicolon,      // ;

    // End of line
    EOF,
}

/// Prog lexer over one source line
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    ch: Option<char>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for the text of source line `line`
    pub fn new(input: &'a str, line: usize) -> Self {
        let mut chars = input.chars().peekable();
        let ch = chars.next();
        Self { input: chars, line, ch }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace();

        let Some(ch) = self.ch else {
            return Ok(Token::EOF);
        };

        match ch {
            '0'..='9' => self.read_number(),

            'a'..='z' | 'A'..='Z' | '_' => Ok(self.read_identifier()),

            '"' => self.read_text(),

            '+' => Ok(self.single(Token::Plus)),
            '-' => Ok(self.single(Token::Minus)),
            '*' => Ok(self.single(Token::Star)),
            '%' => Ok(self.single(Token::Percent)),

            '/' => {
                self.advance();
                if self.ch == Some('/') {
                    // Trailing comment runs to the end of the line
                    while self.ch.is_some() {
                        self.advance();
                    }
                    Ok(Token::EOF)
                } else {
                    Ok(Token::Slash)
                }
            }

            '=' => Ok(self.pair('=', Token::Equal, Token::Assign)),
            '!' => Ok(self.pair('=', Token::NotEqual, Token::Not)),
            '<' => Ok(self.pair('=', Token::LessEqual, Token::Less)),
            '>' => Ok(self.pair('=', Token::GreaterEqual, Token::Greater)),

            '&' => {
                self.advance();
                if self.ch == Some('&') {
                    self.advance();
                    Ok(Token::And)
                } else {
                    Err(self.error("Expected '&&'"))
                }
            }

            '|' => {
                self.advance();
                if self.ch == Some('|') {
                    self.advance();
                    Ok(Token::Or)
                } else {
                    Err(self.error("Expected '||'"))
                }
            }

            '(' => Ok(self.single(Token::LParen)),
            ')' => Ok(self.single(Token::RParen)),
            '[' => Ok(self.single(Token::LBracket)),
            ']' => Ok(self.single(Token::RBracket)),
            ',' => Ok(self.single(Token::Comma)),
            ';' => Ok(self.single(Token::Semicolon)),

            _ => {
                self.advance();
                Err(self.error(format!("Unexpected character: {}", ch)))
            }
        }
    }

    /// Tokenize the rest of the line, ending with [`Token::EOF`]
    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::EOF;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Two-character operator when the next char is `second`, else the one-char form
    fn pair(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.ch == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn read_number(&mut self) -> Result<Token, CompileError> {
        let mut num_str = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_digit() || ch == '.' {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value: f64 = num_str
            .parse()
            .map_err(|_| self.error(format!("Invalid number: {}", num_str)))?;

        Ok(Token::Number(value))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "var" => Token::Var,
            "as" => Token::As,
            "if" => Token::If,
            "else" => Token::Else,
            "end" => Token::End,
            "while" => Token::While,
            "foreach" => Token::Foreach,
            "in" => Token::In,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "true" => Token::True,
            "false" => Token::False,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Identifier(ident),
        }
    }

    fn read_text(&mut self) -> Result<Token, CompileError> {
        self.advance(); // Skip opening quote

        let mut s = String::new();

        while let Some(ch) = self.ch {
            if ch == '"' {
                self.advance();
                return Ok(Token::Text(s));
            } else if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.ch {
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        _ => s.push(escaped),
                    }
                }
                self.advance();
            } else {
                s.push(ch);
                self.advance();
            }
        }

        Err(self.error("Unterminated text literal"))
    }

    fn advance(&mut self) {
        self.ch = self.input.next();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(self.line, message)
    }
}

/// Tokenize one source line
pub fn tokenize(line: &str, line_number: usize) -> Result<Vec<Token>, CompileError> {
    Lexer::new(line, line_number).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers() {
        let mut lexer = Lexer::new("123 45.67", 1);

        assert_eq!(lexer.next_token().unwrap(), Token::Number(123.0));
        assert_eq!(lexer.next_token().unwrap(), Token::Number(45.67));
        assert_eq!(lexer.next_token().unwrap(), Token::EOF);
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("var x as number", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Var,
                Token::Identifier("x".into()),
                Token::As,
                Token::Identifier("number".into()),
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_logical_words_and_symbols() {
        let tokens = tokenize("a and b && c or d || not e !f", 1).unwrap();
        let logical: Vec<&Token> = tokens
            .iter()
            .filter(|t| matches!(t, Token::And | Token::Or | Token::Not))
            .collect();
        assert_eq!(
            logical,
            vec![&Token::And, &Token::And, &Token::Or, &Token::Or, &Token::Not, &Token::Not]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("== != < > <= >= = %", 1).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::Less,
                Token::Greater,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Assign,
                Token::Percent,
                Token::EOF,
            ]
        );
    }

    #[test]
    fn test_text_escapes() {
        let tokens = tokenize(r#""say \"hi\"\n""#, 1).unwrap();
        assert_eq!(tokens[0], Token::Text("say \"hi\"\n".into()));
    }

    #[test]
    fn test_trailing_comment() {
        let tokens = tokenize("return 1; // done", 1).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Return, Token::Number(1.0), Token::Semicolon, Token::EOF]
        );
    }

    #[test]
    fn test_errors_carry_line() {
        let err = tokenize("x = \"open", 7).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.message, "Unterminated text literal");

        let err = tokenize("a & b", 3).unwrap_err();
        assert_eq!(err.line, 3);
    }
}

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::SyntaxError;

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("and", TokenType::And),
        ("class", TokenType::Class),
        ("else", TokenType::Else),
        ("false", TokenType::False),
        ("for", TokenType::For),
        ("fun", TokenType::Fun),
        ("if", TokenType::If),
        ("nil", TokenType::Nil),
        ("or", TokenType::Or),
        ("print", TokenType::Print),
        ("return", TokenType::Return),
        ("super", TokenType::Super),
        ("this", TokenType::This),
        ("true", TokenType::True),
        ("var", TokenType::Var),
        ("while", TokenType::While),
    ])
});

/// Scan the whole source into tokens. Always ends with exactly one EOF token;
/// bad input is skipped and reported in the returned diagnostics.
pub fn scan_tokens(code: &str) -> (Vec<Token>, Vec<SyntaxError>) {
    let mut scanner = Scanner {
        chars: code.chars().collect(),
        cursor_begin: 0,
        cursor_end: 0,
        line: 1,
        tokens: Vec::new(),
        errors: Vec::new(),
    };

    while !scanner.at_end() {
        scanner.cursor_begin = scanner.cursor_end;
        scanner.scan_token();
    }

    scanner.tokens.push(Token {
        token_type: TokenType::EOF,
        lexeme: String::new(),
        literal: None,
        line: scanner.line,
    });

    (scanner.tokens, scanner.errors)
}

#[derive(Debug)]
struct Scanner {
    chars: Vec<char>,
    cursor_begin: usize,
    cursor_end: usize,
    line: u32,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl Scanner {
    fn scan_token(&mut self) {
        let current = self.advance();

        match current {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '!' => self.add_token_if_next('=', TokenType::BangEqual, TokenType::Bang),
            '=' => self.add_token_if_next('=', TokenType::EqualEqual, TokenType::Equal),
            '<' => self.add_token_if_next('=', TokenType::LessEqual, TokenType::Less),
            '>' => self.add_token_if_next('=', TokenType::GreaterEqual, TokenType::Greater),
            '/' => {
                if self.advance_if_match('/') {
                    // line comment runs to the end of the line, newline left for the main loop
                    while self.peek() != Some('\n') && !self.at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),
            _ => self
                .errors
                .push(SyntaxError::at_line(self.line, "Unexpected character.")),
        }
    }

    fn string(&mut self) {
        while self.peek() != Some('"') && !self.at_end() {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.at_end() {
            self.errors
                .push(SyntaxError::at_line(self.line, "Unterminated string."));
            return;
        }

        // closing quote
        self.advance();

        let value: String = self.chars[self.cursor_begin + 1..self.cursor_end - 1]
            .iter()
            .collect();
        self.add_literal_token(TokenType::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        self.consume_digits();

        // a trailing '.' without digits after it belongs to the next token
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
        }

        let text = self.current_lexeme();
        match text.parse::<f64>() {
            Ok(value) => self.add_literal_token(TokenType::Number, Some(Literal::Number(value))),
            Err(_) => self
                .errors
                .push(SyntaxError::at_line(self.line, "Invalid number literal.")),
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(is_identifier_part) {
            self.advance();
        }

        let text = self.current_lexeme();
        let token_type = KEYWORDS
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn add_token_if_next(&mut self, expected: char, matched: TokenType, otherwise: TokenType) {
        let token_type = if self.advance_if_match(expected) { matched } else { otherwise };
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_literal_token(token_type, None);
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Option<Literal>) {
        let lexeme = self.current_lexeme();
        self.tokens.push(Token {
            token_type,
            lexeme,
            literal,
            line: self.line,
        });
    }

    fn current_lexeme(&self) -> String {
        self.chars[self.cursor_begin..self.cursor_end].iter().collect()
    }

    fn advance(&mut self) -> char {
        let current = self.chars[self.cursor_end];
        self.cursor_end += 1;
        current
    }

    fn advance_if_match(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.cursor_end += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor_end).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.cursor_end + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.cursor_end >= self.chars.len()
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    EOF,
}

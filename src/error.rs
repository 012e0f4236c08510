use std::result;

use thiserror::Error;

use crate::scanner::{Token, TokenType};

pub type RuntimeResult<T> = result::Result<T, RuntimeError>;
pub type ParseResult<T> = result::Result<T, SyntaxError>;

/// A scan-time or parse-time diagnostic, displayed as `[line N] Error<location>: <message>`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: u32,
    pub location: String,
    pub message: String,
}

impl SyntaxError {
    // errors without an offending token (scanner errors)
    pub fn at_line(line: u32, message: &str) -> SyntaxError {
        SyntaxError {
            line,
            location: String::new(),
            message: message.to_string(),
        }
    }

    pub fn at_token(token: &Token, message: &str) -> SyntaxError {
        let location = match token.token_type {
            TokenType::EOF => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme),
        };
        SyntaxError {
            line: token.line,
            location,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub line: u32,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: &str) -> RuntimeError {
        RuntimeError {
            line: token.line,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{}", join_lines(.0))]
    Syntax(Vec<SyntaxError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ExecutionError {
    /// Process exit status used by the file runner (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Syntax(_) => 65,
            Self::Runtime(_) => 70,
        }
    }
}

fn join_lines(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(token_type: TokenType, lexeme: &str) -> Token {
        Token {
            token_type,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 3,
        }
    }

    #[test]
    fn syntax_error_locations() {
        let at_lexeme = SyntaxError::at_token(&token(TokenType::RightParen, ")"), "Expect expression.");
        assert_eq!("[line 3] Error at ')': Expect expression.", at_lexeme.to_string());

        let at_end = SyntaxError::at_token(&token(TokenType::EOF, ""), "Expect ';' after value.");
        assert_eq!("[line 3] Error at end: Expect ';' after value.", at_end.to_string());

        let bare = SyntaxError::at_line(7, "Unexpected character.");
        assert_eq!("[line 7] Error: Unexpected character.", bare.to_string());
    }

    #[test]
    fn runtime_error_format_and_exit_codes() {
        let error = RuntimeError::new(&token(TokenType::Minus, "-"), "Operand must be a number.");
        assert_eq!("Operand must be a number.\n[line 3]", error.to_string());

        assert_eq!(70, ExecutionError::from(error).exit_code());
        let syntax = ExecutionError::Syntax(vec![
            SyntaxError::at_line(1, "Unexpected character."),
            SyntaxError::at_line(2, "Unterminated string."),
        ]);
        assert_eq!(65, syntax.exit_code());
        assert_eq!(
            "[line 1] Error: Unexpected character.\n[line 2] Error: Unterminated string.",
            syntax.to_string()
        );
    }
}

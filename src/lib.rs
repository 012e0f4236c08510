mod ast_printer;
mod callable;
mod environment;
mod expr;
mod interpreter;
mod parser;
mod scanner;
mod stdlib;
mod stmt;

pub mod error;
pub mod logging;

pub use ast_printer::{print_ast, print_program};
pub use callable::Callable;
pub use environment::{Environment, Value};
pub use error::ExecutionError;
pub use expr::{Expr, LiteralValue};
pub use parser::parse;
pub use scanner::{scan_tokens, Literal, Token, TokenType};
pub use stmt::{FunctionDecl, Stmt};

pub type ExecutionResult = Result<(), ExecutionError>;

/// Scan, parse and run `code` in the given session.
///
/// Any syntax error (scan or parse) suppresses execution; all of them are returned
/// together. Globals defined by a successful or partially executed run stay in `env`.
pub fn execute(code: &str, env: &mut Environment) -> ExecutionResult {
    let statements = compile(code)?;
    tracing::debug!(statements = statements.len(), "executing program");
    interpreter::execute(&statements, env).map_err(|error| {
        tracing::debug!(line = error.line, message = %error.message, "runtime error");
        ExecutionError::from(error)
    })
}

/// Scan and parse `code`, collecting every syntax error.
pub fn compile(code: &str) -> Result<Vec<Stmt>, ExecutionError> {
    let (tokens, mut errors) = scanner::scan_tokens(code);
    tracing::debug!(tokens = tokens.len(), "scanned source");
    let (statements, parse_errors) = parser::parse(&tokens);
    errors.extend(parse_errors);

    if errors.is_empty() {
        Ok(statements)
    } else {
        tracing::debug!(errors = errors.len(), "syntax errors, skipping execution");
        Err(ExecutionError::Syntax(errors))
    }
}

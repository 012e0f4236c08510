use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use crate::callable::Callable;
use crate::error::{RuntimeError, RuntimeResult};
use crate::expr::LiteralValue;
use crate::scanner::Token;
use crate::stdlib;

#[derive(Debug, Clone)]
pub enum Value {
    Callable(Rc<dyn Callable>),
    Literal(LiteralValue),
}

impl Value {
    pub fn nil() -> Value {
        Value::Literal(LiteralValue::Nil)
    }

    /// `nil` and `false` are falsy, everything else (including `0` and `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Literal(LiteralValue::Nil) => false,
            Self::Literal(LiteralValue::Boolean(value)) => *value,
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(left), Self::Literal(right)) => left == right,
            // callables are only equal to themselves
            (Self::Callable(left), Self::Callable(right)) => {
                Rc::as_ptr(left) as *const () == Rc::as_ptr(right) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(callable) => write!(f, "{callable}"),
            Self::Literal(value) => write!(f, "{value}"),
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(value: LiteralValue) -> Value {
        Value::Literal(value)
    }
}

type Scope = HashMap<String, Value>;

/// Interpreter session state: the scope chain and the program output sink.
///
/// The chain is kept as a stack. `globals` is the outermost scope and lives for the
/// whole session; `locals` holds the nested block and call scopes, innermost last.
/// Each scope's enclosing scope is the one below it on the stack.
pub struct Environment<'a> {
    globals: Scope,
    locals: Vec<Scope>,
    pub output_writer: &'a mut dyn Write,
}

impl<'a> Environment<'a> {
    pub fn new(output_writer: &'a mut dyn Write) -> Environment<'a> {
        let mut globals = Scope::new();
        for native in stdlib::standard_library() {
            globals.insert(native.name.to_string(), Value::Callable(Rc::new(native)));
        }

        Environment {
            globals,
            locals: Vec::new(),
            output_writer,
        }
    }

    pub fn push(&mut self) {
        self.locals.push(Scope::new());
    }

    pub fn pop(&mut self) {
        self.locals.pop();
    }

    /// Start a function call: the call scope encloses directly on the globals, so the
    /// caller's locals are set aside until `leave_call` hands them back.
    pub(crate) fn enter_call(&mut self) -> Vec<Scope> {
        tracing::trace!(caller_depth = self.locals.len(), "entering call scope");
        let caller_locals = mem::take(&mut self.locals);
        self.push();
        caller_locals
    }

    pub(crate) fn leave_call(&mut self, caller_locals: Vec<Scope>) {
        self.locals = caller_locals;
        tracing::trace!(caller_depth = self.locals.len(), "left call scope");
    }

    /// Bind in the innermost scope only. Redefining a name there overwrites it.
    pub fn define(&mut self, name: String, value: Value) {
        let scope = self.locals.last_mut().unwrap_or(&mut self.globals);
        scope.insert(name, value);
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        let scope = self
            .locals
            .iter_mut()
            .rev()
            .chain(std::iter::once(&mut self.globals))
            .find(|scope| scope.contains_key(&name.lexeme));

        match scope {
            Some(scope) => {
                scope.insert(name.lexeme.clone(), value);
                Ok(())
            }
            None => Err(undefined_variable(name)),
        }
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        self.locals
            .iter()
            .rev()
            .chain(std::iter::once(&self.globals))
            .find_map(|scope| scope.get(&name.lexeme))
            .cloned()
            .ok_or_else(|| undefined_variable(name))
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.locals.len()
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(name, &format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TokenType;
    use pretty_assertions::assert_eq;

    fn name(lexeme: &str) -> Token {
        Token {
            token_type: TokenType::Identifier,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 4,
        }
    }

    fn number(value: f64) -> Value {
        Value::from(LiteralValue::Number(value))
    }

    #[test]
    fn define_shadows_in_inner_scope() {
        let mut output = Vec::new();
        let mut env = Environment::new(&mut output);
        env.define("a".to_string(), number(1.0));
        env.push();
        env.define("a".to_string(), number(2.0));
        assert_eq!(number(2.0), env.get(&name("a")).unwrap());
        env.pop();
        assert_eq!(number(1.0), env.get(&name("a")).unwrap());
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let mut output = Vec::new();
        let mut env = Environment::new(&mut output);
        env.define("a".to_string(), number(1.0));
        env.push();
        env.assign(&name("a"), number(3.0)).unwrap();
        env.pop();
        assert_eq!(number(3.0), env.get(&name("a")).unwrap());
    }

    #[test]
    fn redefinition_overwrites() {
        let mut output = Vec::new();
        let mut env = Environment::new(&mut output);
        env.define("a".to_string(), number(1.0));
        env.define("a".to_string(), Value::nil());
        assert_eq!(Value::nil(), env.get(&name("a")).unwrap());
    }

    #[test]
    fn undefined_names_are_errors() {
        let mut output = Vec::new();
        let mut env = Environment::new(&mut output);
        let expected = RuntimeError {
            line: 4,
            message: "Undefined variable 'missing'.".to_string(),
        };
        assert_eq!(Err(expected.clone()), env.get(&name("missing")));
        assert_eq!(Err(expected), env.assign(&name("missing"), Value::nil()));
    }

    #[test]
    fn call_scope_only_sees_globals() {
        let mut output = Vec::new();
        let mut env = Environment::new(&mut output);
        env.define("global".to_string(), number(1.0));
        env.push();
        env.define("local".to_string(), number(2.0));

        let caller_locals = env.enter_call();
        assert_eq!(1, env.depth());
        assert!(env.get(&name("local")).is_err());
        assert_eq!(number(1.0), env.get(&name("global")).unwrap());
        env.leave_call(caller_locals);

        assert_eq!(number(2.0), env.get(&name("local")).unwrap());
    }

    #[test]
    fn truthiness() {
        assert!(!Value::nil().is_truthy());
        assert!(!Value::from(LiteralValue::Boolean(false)).is_truthy());
        assert!(number(0.0).is_truthy());
        assert!(Value::from(LiteralValue::String(String::new())).is_truthy());
    }

    #[test]
    fn natives_are_seeded() {
        let mut output = Vec::new();
        let env = Environment::new(&mut output);
        let clock = env.get(&name("clock")).unwrap();
        assert_eq!("<native fn>", clock.to_string());
        assert_eq!(clock, env.get(&name("clock")).unwrap());
    }
}

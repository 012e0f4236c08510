use std::fmt;
use std::rc::Rc;

use crate::environment::{Environment, Value};
use crate::error::RuntimeResult;
use crate::interpreter::{self, Flow};
use crate::stmt::FunctionDecl;

/// Anything that can appear as the callee of a call expression.
pub trait Callable: fmt::Debug + fmt::Display {
    fn arity(&self) -> usize;

    /// `arguments` has already been checked against `arity`.
    fn call(&self, env: &mut Environment, arguments: Vec<Value>) -> RuntimeResult<Value>;
}

/// A function declared in script code.
#[derive(Debug)]
pub struct Function {
    declaration: Rc<FunctionDecl>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>) -> Function {
        Function { declaration }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    // The call scope hangs off the globals, not the scope the function was declared in,
    // so a nested function sees its own parameters and globals only.
    fn call(&self, env: &mut Environment, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let caller_locals = env.enter_call();
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            env.define(param.lexeme.clone(), argument);
        }

        let result = interpreter::execute_statements(&self.declaration.body, env);
        env.leave_call(caller_locals);

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::nil()),
        }
    }
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _env: &mut Environment, arguments: Vec<Value>) -> RuntimeResult<Value> {
        Ok((self.func)(&arguments))
    }
}

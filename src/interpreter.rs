use std::rc::Rc;

use crate::callable::Function;
use crate::environment::{Environment, Value};
use crate::error::{RuntimeError, RuntimeResult};
use crate::expr::{Expr, LiteralValue};
use crate::scanner::{Token, TokenType};
use crate::stmt::{FunctionDecl, Stmt};

type ValueResult = RuntimeResult<Value>;
type StatementResult = RuntimeResult<Flow>;

/// How a statement finished. `Return` unwinds to the nearest function call and is
/// never surfaced as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Run a program against the session's global scope. The first runtime error
/// abandons the remaining statements.
pub fn execute(statements: &[Stmt], env: &mut Environment) -> RuntimeResult<()> {
    // a top-level return has no call to unwind to and just ends the program
    execute_statements(statements, env)?;
    Ok(())
}

/// Execute statements in the current scope, stopping early on a return.
pub(crate) fn execute_statements(statements: &[Stmt], env: &mut Environment) -> StatementResult {
    for statement in statements {
        if let Flow::Return(value) = execute_statement(statement, env)? {
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Normal)
}

fn execute_statement(statement: &Stmt, env: &mut Environment) -> StatementResult {
    match statement {
        Stmt::Block { statements } => block_statement(statements, env),
        Stmt::Expression { expression } => expression_statement(expression, env),
        Stmt::Function { declaration } => function_statement(declaration, env),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => if_statement(condition, then_branch, else_branch.as_deref(), env),
        Stmt::Print { keyword, expression } => print_statement(keyword, expression, env),
        Stmt::Return { value, .. } => return_statement(value.as_ref(), env),
        Stmt::Var { name, initializer } => var_statement(name, initializer.as_ref(), env),
        Stmt::While { condition, body } => while_statement(condition, body, env),
    }
}

fn block_statement(statements: &[Stmt], env: &mut Environment) -> StatementResult {
    env.push();
    let result = execute_statements(statements, env);
    // restore the scope on every exit path, including errors and returns
    env.pop();
    result
}

fn expression_statement(expression: &Expr, env: &mut Environment) -> StatementResult {
    evaluate(expression, env)?;
    Ok(Flow::Normal)
}

fn function_statement(declaration: &Rc<FunctionDecl>, env: &mut Environment) -> StatementResult {
    let function = Function::new(Rc::clone(declaration));
    env.define(declaration.name.lexeme.clone(), Value::Callable(Rc::new(function)));
    Ok(Flow::Normal)
}

fn if_statement(
    condition: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
    env: &mut Environment,
) -> StatementResult {
    if evaluate(condition, env)?.is_truthy() {
        execute_statement(then_branch, env)
    } else if let Some(else_statement) = else_branch {
        execute_statement(else_statement, env)
    } else {
        Ok(Flow::Normal)
    }
}

fn print_statement(keyword: &Token, expression: &Expr, env: &mut Environment) -> StatementResult {
    let result = evaluate(expression, env)?;
    writeln!(env.output_writer, "{result}")
        .map_err(|error| RuntimeError::new(keyword, &format!("Could not write program output: {error}")))?;
    Ok(Flow::Normal)
}

fn return_statement(value: Option<&Expr>, env: &mut Environment) -> StatementResult {
    let return_value = match value {
        Some(expression) => evaluate(expression, env)?,
        None => Value::nil(),
    };
    Ok(Flow::Return(return_value))
}

fn var_statement(name: &Token, initializer: Option<&Expr>, env: &mut Environment) -> StatementResult {
    let value = match initializer {
        Some(expression) => evaluate(expression, env)?,
        // uninitialized variables default to nil
        None => Value::nil(),
    };
    env.define(name.lexeme.clone(), value);
    Ok(Flow::Normal)
}

fn while_statement(condition: &Expr, body: &Stmt, env: &mut Environment) -> StatementResult {
    while evaluate(condition, env)?.is_truthy() {
        if let Flow::Return(value) = execute_statement(body, env)? {
            return Ok(Flow::Return(value));
        }
    }
    Ok(Flow::Normal)
}

fn evaluate(expression: &Expr, env: &mut Environment) -> ValueResult {
    match expression {
        Expr::Assign { name, value } => evaluate_assign(name, value, env),
        Expr::Binary { left, operator, right } => evaluate_binary(left, operator, right, env),
        Expr::Call {
            callee,
            paren,
            arguments,
        } => evaluate_call(callee, paren, arguments, env),
        Expr::Grouping { expression } => evaluate(expression, env),
        Expr::Literal { value } => Ok(Value::from(value.clone())),
        Expr::Logical { left, operator, right } => evaluate_logical(left, operator, right, env),
        Expr::Unary { operator, right } => evaluate_unary(operator, right, env),
        Expr::Variable { name } => env.get(name),
    }
}

fn evaluate_assign(name: &Token, value: &Expr, env: &mut Environment) -> ValueResult {
    let result = evaluate(value, env)?;
    env.assign(name, result.clone())?;
    Ok(result)
}

fn evaluate_binary(left: &Expr, operator: &Token, right: &Expr, env: &mut Environment) -> ValueResult {
    let left_evaluated = evaluate(left, env)?;
    let right_evaluated = evaluate(right, env)?;

    let evaluated = match operator.token_type {
        TokenType::Plus => match (&left_evaluated, &right_evaluated) {
            (Value::Literal(LiteralValue::Number(left)), Value::Literal(LiteralValue::Number(right))) => {
                LiteralValue::Number(left + right)
            }
            (Value::Literal(LiteralValue::String(left)), Value::Literal(LiteralValue::String(right))) => {
                LiteralValue::String(format!("{left}{right}"))
            }
            _ => {
                return Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                ))
            }
        },
        TokenType::EqualEqual => LiteralValue::Boolean(left_evaluated == right_evaluated),
        TokenType::BangEqual => LiteralValue::Boolean(left_evaluated != right_evaluated),
        _ => {
            let (left_number, right_number) = number_operands(operator, &left_evaluated, &right_evaluated)?;
            match operator.token_type {
                TokenType::Minus => LiteralValue::Number(left_number - right_number),
                TokenType::Slash => LiteralValue::Number(left_number / right_number),
                TokenType::Star => LiteralValue::Number(left_number * right_number),
                TokenType::Greater => LiteralValue::Boolean(left_number > right_number),
                TokenType::GreaterEqual => LiteralValue::Boolean(left_number >= right_number),
                TokenType::Less => LiteralValue::Boolean(left_number < right_number),
                TokenType::LessEqual => LiteralValue::Boolean(left_number <= right_number),
                // unhandled case here indicates a bug in the parser
                _ => unreachable!("Unhandled binary operation type: {:?}", operator.token_type),
            }
        }
    };
    Ok(Value::from(evaluated))
}

fn evaluate_call(callee: &Expr, paren: &Token, arguments: &[Expr], env: &mut Environment) -> ValueResult {
    let callee = evaluate(callee, env)?;

    let mut evaluated_args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        evaluated_args.push(evaluate(argument, env)?);
    }

    let Value::Callable(function) = callee else {
        return Err(RuntimeError::new(paren, "Can only call functions and classes."));
    };

    if evaluated_args.len() != function.arity() {
        return Err(RuntimeError::new(
            paren,
            &format!(
                "Expected {} arguments but got {}.",
                function.arity(),
                evaluated_args.len()
            ),
        ));
    }

    tracing::trace!(%function, arity = function.arity(), line = paren.line, "calling function");
    function.call(env, evaluated_args)
}

// Short circuits with the operand's own value, not a coerced boolean.
fn evaluate_logical(left: &Expr, operator: &Token, right: &Expr, env: &mut Environment) -> ValueResult {
    let left_evaluated = evaluate(left, env)?;

    let short_circuit = match operator.token_type {
        TokenType::Or => left_evaluated.is_truthy(),
        _ => !left_evaluated.is_truthy(),
    };

    if short_circuit {
        Ok(left_evaluated)
    } else {
        evaluate(right, env)
    }
}

fn evaluate_unary(operator: &Token, right: &Expr, env: &mut Environment) -> ValueResult {
    let operand = evaluate(right, env)?;
    let evaluated = match operator.token_type {
        TokenType::Bang => LiteralValue::Boolean(!operand.is_truthy()),
        TokenType::Minus => {
            let original =
                extract_number(&operand).ok_or_else(|| RuntimeError::new(operator, "Operand must be a number."))?;
            LiteralValue::Number(-original)
        }
        // unhandled case here indicates a bug in the parser
        _ => unreachable!("Unary expression not implemented in interpreter: {:?}", operator),
    };
    Ok(Value::from(evaluated))
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> RuntimeResult<(f64, f64)> {
    match (extract_number(left), extract_number(right)) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

fn extract_number(value: &Value) -> Option<f64> {
    match value {
        Value::Literal(LiteralValue::Number(result)) => Some(*result),
        _ => None,
    }
}

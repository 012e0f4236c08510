//! Lisp-style rendering of the syntax tree, used for debugging the parser.

use crate::expr::{Expr, LiteralValue};
use crate::stmt::Stmt;

pub fn print_ast(root: &Expr) -> String {
    let mut printed = String::new();
    format_expr(root, &mut printed);
    printed
}

/// One line per top-level statement.
pub fn print_program(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(|statement| {
            let mut printed = String::new();
            format_stmt(statement, &mut printed);
            printed
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_stmt(statement: &Stmt, output: &mut String) {
    match statement {
        Stmt::Block { statements } => {
            output.push_str("(block");
            format_statements(statements, output);
            output.push(')');
        }
        Stmt::Expression { expression } => {
            format_subexprs(";", &[expression], output);
        }
        Stmt::Function { declaration } => {
            output.push_str("(fun ");
            output.push_str(&declaration.name.lexeme);
            output.push_str(" (");
            let params: Vec<&str> = declaration.params.iter().map(|param| param.lexeme.as_str()).collect();
            output.push_str(&params.join(" "));
            output.push(')');
            format_statements(&declaration.body, output);
            output.push(')');
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            output.push_str("(if ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(then_branch, output);
            if let Some(else_branch) = else_branch {
                output.push(' ');
                format_stmt(else_branch, output);
            }
            output.push(')');
        }
        Stmt::Print { expression, .. } => {
            format_subexprs("print", &[expression], output);
        }
        Stmt::Return { value, .. } => match value {
            Some(value) => format_subexprs("return", &[value], output),
            None => output.push_str("(return)"),
        },
        Stmt::Var { name, initializer } => match initializer {
            Some(initializer) => format_subexprs(&format!("var {}", name.lexeme), &[initializer], output),
            None => {
                output.push_str("(var ");
                output.push_str(&name.lexeme);
                output.push(')');
            }
        },
        Stmt::While { condition, body } => {
            output.push_str("(while ");
            format_expr(condition, output);
            output.push(' ');
            format_stmt(body, output);
            output.push(')');
        }
    }
}

fn format_statements(statements: &[Stmt], output: &mut String) {
    for statement in statements {
        output.push(' ');
        format_stmt(statement, output);
    }
}

fn format_expr(expr: &Expr, output: &mut String) {
    match expr {
        Expr::Assign { name, value } => {
            format_subexprs(&format!("= {}", name.lexeme), &[value.as_ref()], output);
        }
        Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } => {
            format_subexprs(&operator.lexeme, &[left.as_ref(), right.as_ref()], output);
        }
        Expr::Call { callee, arguments, .. } => {
            let mut subexprs: Vec<&Expr> = vec![callee.as_ref()];
            subexprs.extend(arguments.iter());
            format_subexprs("call", &subexprs, output);
        }
        Expr::Grouping { expression } => {
            format_subexprs("group", &[expression.as_ref()], output);
        }
        Expr::Literal { value } => match value {
            LiteralValue::String(text) => {
                output.push('"');
                output.push_str(text);
                output.push('"');
            }
            _ => output.push_str(&value.to_string()),
        },
        Expr::Unary { operator, right } => {
            format_subexprs(&operator.lexeme, &[right.as_ref()], output);
        }
        Expr::Variable { name } => {
            output.push_str(&name.lexeme);
        }
    }
}

fn format_subexprs(name: &str, exprs: &[&Expr], output: &mut String) {
    output.push('(');
    output.push_str(name);
    for expr in exprs {
        output.push(' ');
        format_expr(expr, output);
    }
    output.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Token, TokenType};
    use pretty_assertions::assert_eq;

    fn token(token_type: TokenType, lexeme: &str) -> Token {
        Token {
            token_type,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 1,
        }
    }

    #[test]
    fn prints_nested_expression() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: token(TokenType::Minus, "-"),
                right: Box::new(Expr::Literal {
                    value: LiteralValue::Number(123.0),
                }),
            }),
            operator: token(TokenType::Star, "*"),
            right: Box::new(Expr::Grouping {
                expression: Box::new(Expr::Literal {
                    value: LiteralValue::Number(45.67),
                }),
            }),
        };

        assert_eq!("(* (- 123) (group 45.67))", print_ast(&expr));
    }

    #[test]
    fn prints_string_literals_quoted() {
        let expr = Expr::Literal {
            value: LiteralValue::String("hi".to_string()),
        };
        assert_eq!("\"hi\"", print_ast(&expr));
    }
}

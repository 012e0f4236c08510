use std::rc::Rc;

use crate::error::{ParseResult, SyntaxError};
use crate::expr::{Expr, LiteralValue};
use crate::scanner::{Literal, Token, TokenType};
use crate::stmt::{FunctionDecl, Stmt};

type StmtResult = ParseResult<Stmt>;
type ExprResult = ParseResult<Expr>;

const MAX_ARGUMENTS: usize = 255;

/// Parse a token sequence (terminated by EOF) into a program.
///
/// A syntax error doesn't stop the parse: the parser records it, skips ahead to the
/// next statement boundary and keeps going, so every independent error is returned.
pub fn parse(tokens: &[Token]) -> (Vec<Stmt>, Vec<SyntaxError>) {
    let mut cursor = TokenCursor::new(tokens);
    let mut statements = Vec::new();

    while !cursor.at_end() {
        if let Some(statement) = recovering_declaration(&mut cursor) {
            statements.push(statement);
        }
    }

    (statements, cursor.errors)
}

fn recovering_declaration(cursor: &mut TokenCursor) -> Option<Stmt> {
    match declaration(cursor) {
        Ok(statement) => Some(statement),
        Err(error) => {
            cursor.errors.push(error);
            cursor.synchronize();
            None
        }
    }
}

fn declaration(cursor: &mut TokenCursor) -> StmtResult {
    if cursor.advance_if_match(TokenType::Fun).is_some() {
        function_declaration(cursor, "function")
    } else if cursor.advance_if_match(TokenType::Var).is_some() {
        var_declaration(cursor)
    } else {
        statement(cursor)
    }
}

fn function_declaration(cursor: &mut TokenCursor, kind: &str) -> StmtResult {
    let name = cursor.consume(TokenType::Identifier, &format!("Expect {kind} name."))?;
    cursor.consume(TokenType::LeftParen, &format!("Expect '(' after {kind} name."))?;

    let mut params = Vec::new();
    if !cursor.check(TokenType::RightParen) {
        loop {
            if params.len() >= MAX_ARGUMENTS {
                let error = SyntaxError::at_token(cursor.peek(), "Can't have more than 255 parameters.");
                cursor.errors.push(error);
            }
            params.push(cursor.consume(TokenType::Identifier, "Expect parameter name.")?);
            if cursor.advance_if_match(TokenType::Comma).is_none() {
                break;
            }
        }
    }
    cursor.consume(TokenType::RightParen, "Expect ')' after parameters.")?;

    cursor.consume(TokenType::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
    let body = block(cursor)?;

    Ok(Stmt::Function {
        declaration: Rc::new(FunctionDecl { name, params, body }),
    })
}

fn var_declaration(cursor: &mut TokenCursor) -> StmtResult {
    let name = cursor.consume(TokenType::Identifier, "Expect variable name.")?;

    let initializer = if cursor.advance_if_match(TokenType::Equal).is_some() {
        Some(expression(cursor)?)
    } else {
        None
    };

    cursor.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
    Ok(Stmt::Var { name, initializer })
}

fn statement(cursor: &mut TokenCursor) -> StmtResult {
    let statement_types = [
        TokenType::For,
        TokenType::If,
        TokenType::Print,
        TokenType::Return,
        TokenType::While,
        TokenType::LeftBrace,
    ];

    if let Some(token) = cursor.advance_if_any_match(&statement_types) {
        match token.token_type {
            TokenType::For => for_statement(cursor),
            TokenType::If => if_statement(cursor),
            TokenType::Print => print_statement(cursor, token),
            TokenType::Return => return_statement(cursor, token),
            TokenType::While => while_statement(cursor),
            _ => Ok(Stmt::Block {
                statements: block(cursor)?,
            }),
        }
    } else {
        expression_statement(cursor)
    }
}

// `for` has no node of its own: it becomes a block around a while loop
fn for_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

    let initializer = if cursor.advance_if_match(TokenType::Semicolon).is_some() {
        None
    } else if cursor.advance_if_match(TokenType::Var).is_some() {
        Some(var_declaration(cursor)?)
    } else {
        Some(expression_statement(cursor)?)
    };

    let condition = if cursor.check(TokenType::Semicolon) {
        Expr::Literal {
            value: LiteralValue::Boolean(true),
        }
    } else {
        expression(cursor)?
    };
    cursor.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

    let increment = if cursor.check(TokenType::RightParen) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

    let mut body = statement(cursor)?;

    if let Some(increment) = increment {
        body = Stmt::Block {
            statements: vec![body, Stmt::Expression { expression: increment }],
        };
    }

    body = Stmt::While {
        condition,
        body: Box::new(body),
    };

    if let Some(initializer) = initializer {
        body = Stmt::Block {
            statements: vec![initializer, body],
        };
    }

    Ok(body)
}

fn if_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

    let then_branch = Box::new(statement(cursor)?);
    let else_branch = if cursor.advance_if_match(TokenType::Else).is_some() {
        Some(Box::new(statement(cursor)?))
    } else {
        None
    };

    Ok(Stmt::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn print_statement(cursor: &mut TokenCursor, keyword: Token) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after value.")?;
    Ok(Stmt::Print { keyword, expression })
}

fn return_statement(cursor: &mut TokenCursor, keyword: Token) -> StmtResult {
    let value = if cursor.check(TokenType::Semicolon) {
        None
    } else {
        Some(expression(cursor)?)
    };
    cursor.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
    Ok(Stmt::Return { keyword, value })
}

fn while_statement(cursor: &mut TokenCursor) -> StmtResult {
    cursor.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
    let condition = expression(cursor)?;
    cursor.consume(TokenType::RightParen, "Expect ')' after condition.")?;
    let body = Box::new(statement(cursor)?);
    Ok(Stmt::While { condition, body })
}

fn expression_statement(cursor: &mut TokenCursor) -> StmtResult {
    let expression = expression(cursor)?;
    cursor.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
    Ok(Stmt::Expression { expression })
}

// Statements up to the closing brace. An error here abandons the whole enclosing
// declaration; recovery only happens at the top level.
fn block(cursor: &mut TokenCursor) -> ParseResult<Vec<Stmt>> {
    let mut statements = Vec::new();
    while !cursor.check(TokenType::RightBrace) && !cursor.at_end() {
        statements.push(declaration(cursor)?);
    }
    cursor.consume(TokenType::RightBrace, "Expect '}' after block.")?;
    Ok(statements)
}

fn expression(cursor: &mut TokenCursor) -> ExprResult {
    assignment(cursor)
}

fn assignment(cursor: &mut TokenCursor) -> ExprResult {
    let expr = logic_or(cursor)?;

    if let Some(equals) = cursor.advance_if_match(TokenType::Equal) {
        let value = assignment(cursor)?;

        return match expr {
            Expr::Variable { name } => Ok(Expr::Assign {
                name,
                value: Box::new(value),
            }),
            // reported, but the parse carries on with the left-hand side
            _ => {
                cursor
                    .errors
                    .push(SyntaxError::at_token(&equals, "Invalid assignment target."));
                Ok(expr)
            }
        };
    }

    Ok(expr)
}

fn logic_or(cursor: &mut TokenCursor) -> ExprResult {
    logical_left_associative(cursor, logic_and, TokenType::Or)
}

fn logic_and(cursor: &mut TokenCursor) -> ExprResult {
    logical_left_associative(cursor, equality, TokenType::And)
}

fn equality(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(
        cursor,
        comparison,
        &[TokenType::BangEqual, TokenType::EqualEqual],
    )
}

fn comparison(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(
        cursor,
        term,
        &[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ],
    )
}

fn term(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(cursor, factor, &[TokenType::Minus, TokenType::Plus])
}

fn factor(cursor: &mut TokenCursor) -> ExprResult {
    binary_left_associative(cursor, unary, &[TokenType::Slash, TokenType::Star])
}

// Parse a binary left associative expression as long as the current token matches one of the given types
fn binary_left_associative(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    types: &[TokenType],
) -> ExprResult {
    let mut expr = higher_precedence(cursor)?;

    while let Some(operator) = cursor.advance_if_any_match(types) {
        let right = higher_precedence(cursor)?;
        expr = Expr::Binary {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }

    Ok(expr)
}

fn logical_left_associative(
    cursor: &mut TokenCursor,
    higher_precedence: fn(&mut TokenCursor) -> ExprResult,
    token_type: TokenType,
) -> ExprResult {
    let mut expr = higher_precedence(cursor)?;

    while let Some(operator) = cursor.advance_if_match(token_type) {
        let right = higher_precedence(cursor)?;
        expr = Expr::Logical {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }

    Ok(expr)
}

fn unary(cursor: &mut TokenCursor) -> ExprResult {
    if let Some(operator) = cursor.advance_if_any_match(&[TokenType::Bang, TokenType::Minus]) {
        let right = unary(cursor)?;
        return Ok(Expr::Unary {
            operator,
            right: Box::new(right),
        });
    }

    call(cursor)
}

fn call(cursor: &mut TokenCursor) -> ExprResult {
    let mut expr = primary(cursor)?;

    while cursor.advance_if_match(TokenType::LeftParen).is_some() {
        expr = finish_call(cursor, expr)?;
    }

    Ok(expr)
}

fn finish_call(cursor: &mut TokenCursor, callee: Expr) -> ExprResult {
    let mut arguments = Vec::new();
    if !cursor.check(TokenType::RightParen) {
        loop {
            if arguments.len() >= MAX_ARGUMENTS {
                let error = SyntaxError::at_token(cursor.peek(), "Can't have more than 255 arguments.");
                cursor.errors.push(error);
            }
            arguments.push(expression(cursor)?);
            if cursor.advance_if_match(TokenType::Comma).is_none() {
                break;
            }
        }
    }

    let paren = cursor.consume(TokenType::RightParen, "Expect ')' after arguments.")?;

    Ok(Expr::Call {
        callee: Box::new(callee),
        paren,
        arguments,
    })
}

fn primary(cursor: &mut TokenCursor) -> ExprResult {
    let current = cursor.peek();

    match current.token_type {
        TokenType::False | TokenType::True | TokenType::Nil | TokenType::Number | TokenType::String => {
            let literal = Expr::Literal {
                value: literal_value(current),
            };
            cursor.advance();
            Ok(literal)
        }
        TokenType::Identifier => {
            let name = cursor.advance();
            Ok(Expr::Variable { name })
        }
        TokenType::LeftParen => {
            cursor.advance();
            let expr = expression(cursor)?;
            cursor.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::Grouping {
                expression: Box::new(expr),
            })
        }
        _ => Err(SyntaxError::at_token(current, "Expect expression.")),
    }
}

fn literal_value(token: &Token) -> LiteralValue {
    match (token.token_type, &token.literal) {
        (TokenType::False, _) => LiteralValue::Boolean(false),
        (TokenType::True, _) => LiteralValue::Boolean(true),
        (TokenType::Number, Some(Literal::Number(value))) => LiteralValue::Number(*value),
        (TokenType::String, Some(Literal::String(value))) => LiteralValue::String(value.clone()),
        _ => LiteralValue::Nil,
    }
}

struct TokenCursor<'a> {
    tokens: &'a [Token],
    index: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> TokenCursor<'a> {
    fn new(tokens: &'a [Token]) -> TokenCursor<'a> {
        TokenCursor {
            tokens,
            index: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> &'a Token {
        &self.tokens[self.index]
    }

    fn previous(&self) -> &'a Token {
        &self.tokens[self.index.saturating_sub(1)]
    }

    // never moves past the EOF token
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.index += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        self.advance_if_match(token_type)
            .ok_or_else(|| SyntaxError::at_token(self.peek(), message))
    }

    fn advance_if_match(&mut self, token_type: TokenType) -> Option<Token> {
        if self.check(token_type) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn advance_if_any_match(&mut self, types: &[TokenType]) -> Option<Token> {
        if types.contains(&self.peek().token_type) {
            Some(self.advance())
        } else {
            None
        }
    }

    // Discard tokens until just after a ';' or just before a statement keyword.
    fn synchronize(&mut self) {
        self.advance();

        while !self.at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => self.advance(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_printer::print_program;
    use crate::scanner::scan_tokens;
    use pretty_assertions::assert_eq;

    fn parse_source(code: &str) -> (Vec<Stmt>, Vec<SyntaxError>) {
        let (tokens, scan_errors) = scan_tokens(code);
        assert!(scan_errors.is_empty());
        parse(&tokens)
    }

    fn printed(code: &str) -> String {
        let (statements, errors) = parse_source(code);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        print_program(&statements)
    }

    fn messages(code: &str) -> Vec<String> {
        let (_, errors) = parse_source(code);
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!("(; (+ 1 (* 2 3)))", printed("1 + 2 * 3;"));
        assert_eq!("(; (* (group (+ 1 2)) 3))", printed("(1 + 2) * 3;"));
        assert_eq!("(; (- (- 1 2) 3))", printed("1 - 2 - 3;"));
        assert_eq!("(; (== (< 1 2) (! false)))", printed("1 < 2 == !false;"));
        assert_eq!("(; (or a (and b c)))", printed("a or b and c;"));
        assert_eq!("(; (= a (= b 1)))", printed("a = b = 1;"));
        assert_eq!("(; (- (- 1)))", printed("--1;"));
    }

    #[test]
    fn chained_calls() {
        assert_eq!("(; (call (call f 1) 2 3))", printed("f(1)(2, 3);"));
    }

    #[test]
    fn for_loop_desugars_to_while() {
        assert_eq!(
            "(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))",
            printed("for (var i = 0; i < 3; i = i + 1) print i;")
        );
        assert_eq!("(while true (print 1))", printed("for (;;) print 1;"));
    }

    #[test]
    fn function_declaration() {
        assert_eq!(
            "(fun add (a b) (return (+ a b)))",
            printed("fun add(a, b) { return a + b; }")
        );
        assert_eq!("(fun f () (return))", printed("fun f() { return; }"));
    }

    #[test]
    fn reports_missing_paren_and_keeps_parsing() {
        assert_eq!(
            vec![
                "[line 1] Error at ';': Expect ')' after expression.".to_string(),
                "[line 3] Error at end: Expect ';' after value.".to_string(),
            ],
            messages("print (1 + 2;\nprint 3;\nprint 4")
        );
    }

    #[test]
    fn recovery_keeps_valid_statements() {
        let (statements, errors) = parse_source("var = 1;\nprint 2;");
        assert_eq!(1, errors.len());
        assert_eq!("(print 2)", print_program(&statements));
    }

    #[test]
    fn missing_semicolon_before_closing_brace_reports_once() {
        let (statements, errors) = parse_source("if (true) { print 1 }\nprint 2;");
        assert_eq!(
            vec![SyntaxError {
                line: 1,
                location: " at '}'".to_string(),
                message: "Expect ';' after value.".to_string(),
            }],
            errors
        );
        assert_eq!("(print 2)", print_program(&statements));

        assert_eq!(
            vec!["[line 1] Error at '}': Expect ';' after return value.".to_string()],
            messages("fun f() { return 1 }\nprint f();")
        );
        assert_eq!(
            vec!["[line 1] Error at '=': Expect expression.".to_string()],
            messages("{ = }")
        );
    }

    #[test]
    fn invalid_assignment_target_is_not_fatal() {
        let (statements, errors) = parse_source("a + b = c;\nprint 1;");
        assert_eq!(
            vec!["[line 1] Error at '=': Invalid assignment target.".to_string()],
            errors.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
        assert_eq!(2, statements.len());
    }

    #[test]
    fn argument_cap_is_reported() {
        let arguments = vec!["1"; 256].join(", ");
        let code = format!("f({arguments});");
        assert_eq!(
            vec!["[line 1] Error at '1': Can't have more than 255 arguments.".to_string()],
            messages(&code)
        );

        let params: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
        let code = format!("fun f({}) {{}}", params.join(", "));
        assert_eq!(
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters.".to_string()],
            messages(&code)
        );
    }
}

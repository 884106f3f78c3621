//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive-descent parser for both dialects.
//! CONTEXT: Forward formulas parse to a single `Expression`; Backward
//! scripts parse to a `Vec<Statement>`. Both share the same precedence-
//! climbing expression grammar — only the primary-expression and
//! statement layers differ.
//!
//! Forward expression grammar (lowest to highest precedence):
//!   expression   := or
//!   or           := and ( "or" and )*
//!   and          := comparison ( "and" comparison )*
//!   comparison   := concat ( ("=" | "<>" | "<" | ">" | "<=" | ">=") concat )*
//!   concat       := additive ( "&" additive )*
//!   additive     := multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative := unary ( ("*" | "/") unary )*
//!   unary        := ("-" | "not")? power
//!   power        := postfix ( "^" unary )?
//!   postfix      := primary ( "(" args ")" | "[" expr "]" )*
//!   primary      := number | string | "true" | "false" | "nil" | cellref
//!                 | identifier | "(" expression ")" | array-literal
//!                 | dictionary-literal | function-literal
//!
//! Backward statement grammar (spec §6.5), block-structured and
//! English-keyworded rather than brace-delimited:
//!   statement := function-decl | "set" target "to" expr
//!              | "call" expr | if-stmt | while-stmt | for-stmt
//!              | select-stmt | "return" [expr] | "break" [N] | "continue" [N]
//!   if-stmt     := "if" expr "then" stmts ("elseif" expr "then" stmts)* ("else" stmts)? "end"
//!   while-stmt  := "while" expr "do" stmts "end"
//!   for-stmt    := "for" NAME "in" expr "do" stmts "end"
//!               |  "for" NAME "from" expr ("to"|"downto") expr ("step" expr)? "do" stmts "end"
//!   select-stmt := "select" expr "from" ("case" ("above"|"below"|"also")? expr "is" stmts)* "end"

use std::rc::Rc;

use crate::ast::{
    BinaryOperator, CaseArm, CaseGuard, Expression, FunctionLiteral, Statement, StdlibFn, UnaryOperator,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::token::Token;
use crate::value::{CellAddress, CellRangeValue, Value};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    line: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, backward: bool) -> Self {
        let mut lexer = Lexer::new(source, backward);
        let current = lexer.next_token();
        let line = lexer.line;
        Self { lexer, current, line }
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        self.line = self.lexer.line;
        std::mem::replace(&mut self.current, next)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<Token> {
        if self.current == expected {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("expected {expected}, found {}", self.current),
                self.line,
            ))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Token::Identifier(name) => Ok(name),
            other => Err(ParseError::new(format!("expected identifier, found {other}"), self.line)),
        }
    }

    // ---- shared expression grammar ----

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_and()?;
        while self.current == Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::Binary {
                op: BinaryOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_comparison()?;
        while self.current == Token::And {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expression::Binary {
                op: BinaryOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.current {
                Token::Equals => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_concat()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;
        while self.current == Token::Ampersand {
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::Binary {
                op: BinaryOperator::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        match self.current {
            Token::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            Token::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> ParseResult<Expression> {
        let base = self.parse_postfix()?;
        if self.current == Token::Caret {
            self.advance();
            let exponent = self.parse_unary()?;
            Ok(Expression::Call {
                callee: Box::new(Expression::Identifier("Power".to_string())),
                args: vec![base, exponent],
                line: self.line,
            })
        } else {
            Ok(base)
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current {
                Token::LParen => {
                    let line = self.line;
                    self.advance();
                    let args = self.parse_call_args()?;
                    expr = match expr {
                        Expression::Identifier(name) => match StdlibFn::from_name(&name) {
                            Some(func) => Expression::StdlibCall { func, args, line },
                            None => Expression::Call {
                                callee: Box::new(Expression::Identifier(name)),
                                args,
                                line,
                            },
                        },
                        other => Expression::Call {
                            callee: Box::new(other),
                            args,
                            line,
                        },
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    expr = Expression::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expression>> {
        let mut args = Vec::new();
        if self.current != Token::RParen {
            args.push(self.parse_expression()?);
            while self.current == Token::Comma {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current.clone() {
            Token::Number(text) => {
                self.advance();
                let value = numeric::Number::from_string(&text, 0)
                    .map_err(|e| ParseError::new(e.to_string(), self.line))?;
                Ok(Expression::Literal(Value::Number(value)))
            }
            Token::String(text) => {
                self.advance();
                Ok(Expression::Literal(Value::string(text)))
            }
            Token::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(numeric::Number::from_i64(
                    if b { 1 } else { 0 },
                    0,
                ))))
            }
            Token::Nil => {
                self.advance();
                Ok(Expression::Literal(Value::Nil))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::LBrace => self.parse_brace_literal(),
            Token::Function => self.parse_function_literal(),
            Token::Dollar | Token::Identifier(_) | Token::QuotedIdentifier(_) => self.parse_ref_or_identifier(),
            other => Err(ParseError::new(format!("unexpected token {other}"), self.line)),
        }
    }

    /// `{ a; b; c }` is an array literal; `{ "k": v; ... }` is a
    /// dictionary literal. The two share an opening brace, so this peeks
    /// one token of lookahead (whether the first entry contains a colon)
    /// to decide which one it's parsing.
    fn parse_brace_literal(&mut self) -> ParseResult<Expression> {
        self.advance();
        if self.current == Token::RBrace {
            self.advance();
            return Ok(Expression::ArrayLiteral(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.current == Token::Colon {
            self.advance();
            let first_value = self.parse_expression()?;
            let mut pairs = vec![(first, first_value)];
            while self.current == Token::Semicolon {
                self.advance();
                let key = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let value = self.parse_expression()?;
                pairs.push((key, value));
            }
            self.expect(Token::RBrace)?;
            Ok(Expression::DictionaryLiteral(pairs))
        } else {
            let mut items = vec![first];
            while self.current == Token::Semicolon {
                self.advance();
                items.push(self.parse_expression()?);
            }
            self.expect(Token::RBrace)?;
            Ok(Expression::ArrayLiteral(items))
        }
    }

    /// `function [NAME] ( PARAMS ) [ [captures] ] is BODY end` (spec §6.5,
    /// extended with a bracketed capture list for function-literal
    /// expressions — the grammar doesn't show anonymous functions used as
    /// values, but `BuildFunction` in §4.4 requires capture expressions
    /// somewhere, so this keeps the capture-list syntax at the same
    /// position the original brace-bodied grammar used).
    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        let line = self.line;
        self.expect(Token::Function)?;
        let name = if let Token::Identifier(_) = self.current {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if self.current != Token::RParen {
            params.push(self.expect_identifier()?);
            while self.current == Token::Comma {
                self.advance();
                params.push(self.expect_identifier()?);
            }
        }
        self.expect(Token::RParen)?;
        let mut captures = Vec::new();
        if self.current == Token::LBracket {
            self.advance();
            if self.current != Token::RBracket {
                loop {
                    let cap_name = self.expect_identifier()?;
                    let cap_expr = Expression::Identifier(cap_name.clone());
                    captures.push((cap_name, cap_expr));
                    if self.current == Token::Comma {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(Token::RBracket)?;
        }
        self.expect(Token::Is)?;
        let body = self.parse_statements_until(&[Token::End])?;
        self.expect(Token::End)?;
        Ok(Expression::FunctionLiteral(Rc::new(FunctionLiteral {
            name,
            params,
            captures,
            body,
            line,
        })))
    }

    /// Cell references only make sense once we know a leading identifier
    /// splits into letters-then-digits; otherwise it's a plain name.
    fn parse_ref_or_identifier(&mut self) -> ParseResult<Expression> {
        let sheet = self.try_parse_sheet_prefix()?;
        let first = self.parse_cell_address_or_name(sheet.clone())?;
        match first {
            AddressOrName::Address(addr) => {
                if self.current == Token::Colon {
                    self.advance();
                    self.try_parse_sheet_prefix()?;
                    match self.parse_cell_address_or_name(sheet)? {
                        AddressOrName::Address(end) => {
                            Ok(Expression::CellRange(CellRangeValue { start: addr, end }))
                        }
                        AddressOrName::Name(_) => {
                            Err(ParseError::new("expected cell address after ':'", self.line))
                        }
                    }
                } else {
                    Ok(Expression::CellRef(addr))
                }
            }
            AddressOrName::Name(name) => Ok(Expression::Identifier(name)),
        }
    }

    fn try_parse_sheet_prefix(&mut self) -> ParseResult<Option<String>> {
        let name = match self.current.clone() {
            Token::Identifier(n) => n,
            Token::QuotedIdentifier(n) => n,
            _ => return Ok(None),
        };
        // Only commit to a sheet prefix if '!' actually follows; otherwise
        // this identifier belongs to the reference/name itself.
        let saved_line = self.line;
        let checkpoint = self.current.clone();
        self.advance();
        if self.current == Token::Exclamation {
            self.advance();
            Ok(Some(name))
        } else {
            // No '!' — restore by re-wrapping the token we consumed. Since
            // this lexer has no backtracking buffer, the caller re-derives
            // the identifier from `checkpoint` instead of re-lexing.
            self.current = checkpoint;
            self.line = saved_line;
            Ok(None)
        }
    }

    fn parse_cell_address_or_name(&mut self, sheet: Option<String>) -> ParseResult<AddressOrName> {
        let col_absolute = if self.current == Token::Dollar {
            self.advance();
            true
        } else {
            false
        };
        let name = match self.advance() {
            Token::Identifier(n) => n,
            other => {
                return Err(ParseError::new(
                    format!("expected a name or cell reference, found {other}"),
                    self.line,
                ))
            }
        };
        let (letters, digits) = split_column_row(&name);
        if letters.is_empty() || digits.is_empty() {
            if col_absolute {
                return Err(ParseError::new("'$' must precede a cell reference", self.line));
            }
            return Ok(AddressOrName::Name(name));
        }
        let _row_absolute = if self.current == Token::Dollar {
            self.advance();
            true
        } else {
            false
        };
        let col = column_letters_to_index(&letters);
        // The row digits in a reference *are* the row number — spec §6.4:
        // "Row shown in the reference is the row number." `A0` addresses
        // row 0 directly; there's no Excel-style 1-based offset to undo.
        let row: u32 = digits.parse().map_err(|_| ParseError::new("invalid row number", self.line))?;
        Ok(AddressOrName::Address(CellAddress { sheet, col, row }))
    }

    /// Parses statements until the current token is one of `terminators`
    /// (not consumed — the caller `expect()`s it) or EOF.
    fn parse_statements_until(&mut self, terminators: &[Token]) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while !terminators.contains(&self.current) && self.current != Token::EOF {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// An assignment/`set` target: a name, optionally indexed (`a[0]`,
    /// for the `RecAssign` indexed-slot case spec §4.4 mentions).
    fn parse_assignment_target(&mut self) -> ParseResult<Expression> {
        let name = self.expect_identifier()?;
        let mut expr = Expression::Identifier(name);
        while self.current == Token::LBracket {
            self.advance();
            let index = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            expr = Expression::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    /// A bare `return`/`break`/`continue` statement boundary check: true
    /// when the current token can't start an expression, so `return` with
    /// no following expression is unambiguous without needing a separator.
    fn at_statement_boundary(&self) -> bool {
        matches!(
            self.current,
            Token::End
                | Token::ElseIf
                | Token::Else
                | Token::Case
                | Token::EOF
                | Token::Set
                | Token::Call
                | Token::If
                | Token::While
                | Token::For
                | Token::Select
                | Token::Return
                | Token::Break
                | Token::Continue
                | Token::Function
        )
    }

    fn parse_optional_depth(&mut self) -> ParseResult<u32> {
        if let Token::Number(text) = self.current.clone() {
            self.advance();
            text.parse::<u32>()
                .map_err(|_| ParseError::new(format!("expected an integer depth, found {text}"), self.line))
        } else {
            Ok(1)
        }
    }

    fn parse_if_tail(&mut self) -> ParseResult<Option<Vec<Statement>>> {
        if self.current == Token::ElseIf {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect(Token::Then)?;
            let then_branch = self.parse_statements_until(&[Token::ElseIf, Token::Else, Token::End])?;
            let else_branch = self.parse_if_tail()?;
            Ok(Some(vec![Statement::If {
                condition,
                then_branch,
                else_branch,
            }]))
        } else if self.current == Token::Else {
            self.advance();
            Ok(Some(self.parse_statements_until(&[Token::End])?))
        } else {
            Ok(None)
        }
    }

    fn parse_for_statement(&mut self) -> ParseResult<Statement> {
        self.expect(Token::For)?;
        let var = self.expect_identifier()?;
        if self.current == Token::In {
            self.advance();
            let iterable = self.parse_expression()?;
            self.expect(Token::Do)?;
            let body = self.parse_statements_until(&[Token::End])?;
            self.expect(Token::End)?;
            Ok(Statement::ForEach { var, iterable, body })
        } else {
            self.expect(Token::From)?;
            let from = self.parse_expression()?;
            let downto = match self.current {
                Token::To => {
                    self.advance();
                    false
                }
                Token::DownTo => {
                    self.advance();
                    true
                }
                _ => {
                    return Err(ParseError::new(
                        format!("expected 'to' or 'downto', found {}", self.current),
                        self.line,
                    ))
                }
            };
            let to = self.parse_expression()?;
            let step = if self.current == Token::Step {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect(Token::Do)?;
            let body = self.parse_statements_until(&[Token::End])?;
            self.expect(Token::End)?;
            Ok(Statement::ForRange {
                var,
                from,
                to,
                step,
                downto,
                body,
            })
        }
    }

    /// `select EXPR from (case ("above"|"below"|"also")? EXPR is STMTS)* end`.
    /// `also` reuses the "extra value" wording from spec §6.5 but is parsed
    /// as its own full arm (guard plus body) — the grammar block shows an
    /// `is ...` body on every `case` line, `also` included.
    fn parse_select_statement(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Select)?;
        let selector = self.parse_expression()?;
        self.expect(Token::From)?;
        let mut arms = Vec::new();
        while self.current == Token::Case {
            self.advance();
            let guard = match self.current {
                Token::Above => {
                    self.advance();
                    CaseGuard::Above(self.parse_expression()?)
                }
                Token::Below => {
                    self.advance();
                    CaseGuard::Below(self.parse_expression()?)
                }
                Token::Also => {
                    self.advance();
                    CaseGuard::Is(self.parse_expression()?)
                }
                _ => CaseGuard::Is(self.parse_expression()?),
            };
            self.expect(Token::Is)?;
            let body = self.parse_statements_until(&[Token::Case, Token::End])?;
            arms.push(CaseArm { guards: vec![guard], body });
        }
        self.expect(Token::End)?;
        Ok(Statement::SelectBlock { selector, arms })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current {
            Token::Function => {
                let expr = self.parse_function_literal()?;
                match &expr {
                    Expression::FunctionLiteral(def) if def.name.is_some() => Ok(Statement::VarDecl {
                        name: def.name.clone().unwrap(),
                        value: Some(expr),
                    }),
                    _ => Ok(Statement::Expr(expr)),
                }
            }
            Token::Set => {
                self.advance();
                let target = self.parse_assignment_target()?;
                self.expect(Token::To)?;
                let value = self.parse_expression()?;
                Ok(Statement::Assign { target, value })
            }
            Token::Call => {
                self.advance();
                let expr = self.parse_expression()?;
                Ok(Statement::Expr(expr))
            }
            Token::If => {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect(Token::Then)?;
                let then_branch = self.parse_statements_until(&[Token::ElseIf, Token::Else, Token::End])?;
                let else_branch = self.parse_if_tail()?;
                self.expect(Token::End)?;
                Ok(Statement::If {
                    condition,
                    then_branch,
                    else_branch,
                })
            }
            Token::While => {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect(Token::Do)?;
                let body = self.parse_statements_until(&[Token::End])?;
                self.expect(Token::End)?;
                Ok(Statement::While { condition, body })
            }
            Token::For => self.parse_for_statement(),
            Token::Select => self.parse_select_statement(),
            Token::Return => {
                self.advance();
                if self.at_statement_boundary() {
                    Ok(Statement::Return(None))
                } else {
                    Ok(Statement::Return(Some(self.parse_expression()?)))
                }
            }
            Token::Break => {
                self.advance();
                Ok(Statement::Break(self.parse_optional_depth()?))
            }
            Token::Continue => {
                self.advance();
                Ok(Statement::Continue(self.parse_optional_depth()?))
            }
            _ => {
                let expr = self.parse_expression()?;
                Ok(Statement::Expr(expr))
            }
        }
    }

    pub fn parse_program(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while self.current != Token::EOF {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }
}

enum AddressOrName {
    Address(CellAddress),
    Name(String),
}

fn split_column_row(text: &str) -> (String, String) {
    let letters: String = text.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = text[letters.len()..].chars().collect();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        (letters, digits)
    } else {
        (String::new(), String::new())
    }
}

fn column_letters_to_index(letters: &str) -> u32 {
    letters
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
        - 1
}

/// Parses a Forward formula (no leading `=`, matching how `engine::Cell`
/// strips it before handing the body to the parser) into a single
/// expression tree.
pub fn parse_forward(source: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(source, false);
    let expr = parser.parse_expression()?;
    if parser.current != Token::EOF {
        return Err(ParseError::new(
            format!("unexpected trailing token {}", parser.current),
            parser.line,
        ));
    }
    Ok(expr)
}

/// Parses a Backward script into its statement list.
pub fn parse_backward(source: &str) -> ParseResult<Vec<Statement>> {
    let mut parser = Parser::new(source, true);
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let expr = parse_forward("1+2*3").unwrap();
        match expr {
            Expression::Binary { op: BinaryOperator::Add, right, .. } => {
                assert!(matches!(*right, Expression::Binary { op: BinaryOperator::Multiply, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn parses_a_simple_cell_reference() {
        let expr = parse_forward("A0").unwrap();
        match expr {
            Expression::CellRef(addr) => {
                assert_eq!(addr.col, 0);
                assert_eq!(addr.row, 0);
            }
            other => panic!("expected CellRef, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_range() {
        let expr = parse_forward("A1:B2").unwrap();
        assert!(matches!(expr, Expression::CellRange(_)));
    }

    #[test]
    fn parses_a_sheet_qualified_reference() {
        let expr = parse_forward("Sheet1!A1").unwrap();
        match expr {
            Expression::CellRef(addr) => assert_eq!(addr.sheet.as_deref(), Some("Sheet1")),
            other => panic!("expected CellRef, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_stdlib_call() {
        let expr = parse_forward("Size(A1)").unwrap();
        assert!(matches!(expr, Expression::StdlibCall { func: StdlibFn::Size, .. }));
    }

    #[test]
    fn parses_a_backward_function_and_call() {
        let program = parse_backward("function f(x) is return x + 1 end call f(41)").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(program[0], Statement::VarDecl { .. }));
    }

    #[test]
    fn parses_while_and_assignment() {
        let program = parse_backward("set i to 0 while i < 10 do set i to i + 1 end").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(program[1], Statement::While { .. }));
    }

    #[test]
    fn parses_numeric_for_with_step_and_downto() {
        let program = parse_backward("for i from 10 downto 1 step 2 do call i end").unwrap();
        match &program[0] {
            Statement::ForRange { downto, step, .. } => {
                assert!(*downto);
                assert!(step.is_some());
            }
            other => panic!("expected ForRange, got {other:?}"),
        }
    }

    #[test]
    fn parses_iterator_for() {
        let program = parse_backward("for x in arr do call x end").unwrap();
        assert!(matches!(program[0], Statement::ForEach { .. }));
    }

    #[test]
    fn parses_select_block_with_above_below_guards() {
        let program =
            parse_backward("select x from case 1 is return 1 case above 10 is return 2 case below 0 is return 3 end")
                .unwrap();
        match &program[0] {
            Statement::SelectBlock { arms, .. } => assert_eq!(arms.len(), 3),
            other => panic!("expected SelectBlock, got {other:?}"),
        }
    }

    #[test]
    fn parses_break_and_continue_with_depth() {
        let program = parse_backward("while 1 do break 2 end").unwrap();
        match &program[0] {
            Statement::While { body, .. } => assert!(matches!(body[0], Statement::Break(2))),
            other => panic!("expected While, got {other:?}"),
        }
    }

    #[test]
    fn parses_if_elseif_else_chain() {
        let program = parse_backward("if 1 then return 1 elseif 2 then return 2 else return 3 end").unwrap();
        match &program[0] {
            Statement::If { else_branch: Some(tail), .. } => {
                assert!(matches!(tail[0], Statement::If { .. }));
            }
            other => panic!("expected If with elseif tail, got {other:?}"),
        }
    }
}

//!
//! This is the parser for the Tetra language.
//!
//! It consumes the token stream produced by `tetra-lexer` and produces the
//! `tetra-core` AST. Binary operators are desugared to method-call nodes here,
//! so the compiler has a single send path.
//!

use std::fmt;

use tetra_core::ast::{
    AssignTarget, BlockLiteral, Body, ClassDef, Expression, MethodCall, MethodDef, Statement,
};
use tetra_lexer::{Lexer, Token};

/// A syntax error, with the line it was detected on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error (line {}): {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse a whole source file into a program body.
pub fn parse(input: &str) -> Result<Body, ParseError> {
    let tokens: Vec<(Token, u32)> = Lexer::new(input).collect();
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<(Token, u32)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, line)| *line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.check(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Skip statement separators (newlines and semicolons).
    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(token) if token.is_separator()) {
            self.pos += 1;
        }
    }

    /// Skip newlines inside bracketed constructs.
    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }

    fn parse_program(&mut self) -> Result<Body, ParseError> {
        let body = self.parse_body(&[])?;
        match self.peek() {
            None => Ok(body),
            Some(_) => Err(self.error("unexpected token")),
        }
    }

    /// Parse statements until one of `terminators` (not consumed) or the end
    /// of input.
    fn parse_body(&mut self, terminators: &[Token]) -> Result<Body, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => break,
                Some(token) if terminators.contains(token) => break,
                Some(_) => {}
            }
            statements.push(self.parse_statement()?);
            match self.peek() {
                None => break,
                Some(token) if token.is_separator() => self.skip_separators(),
                Some(token) if terminators.contains(token) => break,
                Some(_) => return Err(self.error("expected a newline or `;`")),
            }
        }
        Ok(Body { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Some(Token::Class) | Some(Token::Module) => self.parse_class_def(),
            Some(Token::Def) => self.parse_method_def(),
            Some(Token::Return) => {
                let line = self.line();
                self.advance();
                let value = match self.peek() {
                    None | Some(Token::End) => None,
                    Some(token) if token.is_separator() => None,
                    Some(_) => Some(self.parse_expression()?),
                };
                Ok(Statement::Return { value, line })
            }
            _ => Ok(Statement::Expression(self.parse_expression()?)),
        }
    }

    fn parse_class_def(&mut self) -> Result<Statement, ParseError> {
        let line = self.line();
        let is_module = match self.advance() {
            Some(Token::Class) => false,
            Some(Token::Module) => true,
            _ => unreachable!(),
        };
        let name = match self.advance() {
            Some(Token::Constant(name)) => name,
            _ => return Err(self.error("expected a class name")),
        };
        let super_class = if !is_module && self.check(&Token::Lt) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let body = self.parse_body(&[Token::End])?;
        self.expect(&Token::End, "`end` to close the class body")?;
        Ok(Statement::ClassDef(ClassDef {
            name,
            super_class,
            body,
            is_module,
            line,
        }))
    }

    fn parse_method_def(&mut self) -> Result<Statement, ParseError> {
        let line = self.line();
        self.advance(); // def
        let is_singleton = if self.peek() == Some(&Token::SelfKw) {
            self.advance();
            self.expect(&Token::Dot, "`.` after `self`")?;
            true
        } else {
            false
        };
        let name = match self.advance() {
            Some(Token::Identifier(name)) => name,
            // Operator methods can be (re)defined like any other.
            Some(Token::Plus) => "+".to_string(),
            Some(Token::Minus) => "-".to_string(),
            Some(Token::Star) => "*".to_string(),
            Some(Token::Slash) => "/".to_string(),
            Some(Token::Percent) => "%".to_string(),
            Some(Token::Eq) => "==".to_string(),
            Some(Token::NotEq) => "!=".to_string(),
            Some(Token::Lt) => "<".to_string(),
            Some(Token::Gt) => ">".to_string(),
            Some(Token::LtEq) => "<=".to_string(),
            Some(Token::GtEq) => ">=".to_string(),
            _ => return Err(self.error("expected a method name")),
        };
        let params = self.parse_params()?;
        let body = self.parse_body(&[Token::End])?;
        self.expect(&Token::End, "`end` to close the method body")?;
        Ok(Statement::MethodDef(MethodDef {
            name,
            params,
            body,
            is_singleton,
            line,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        let parenthesized = self.check(&Token::LParen);
        if !parenthesized && !matches!(self.peek(), Some(Token::Identifier(_))) {
            return Ok(params);
        }
        loop {
            if parenthesized {
                self.skip_newlines();
            }
            match self.advance() {
                Some(Token::Identifier(name)) => params.push(name),
                _ => return Err(self.error("expected a parameter name")),
            }
            if !self.check(&Token::Comma) {
                break;
            }
        }
        if parenthesized {
            self.skip_newlines();
            self.expect(&Token::RParen, "`)` to close the parameter list")?;
        }
        Ok(params)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_or()?;
        if self.peek() != Some(&Token::Assign) {
            return Ok(expr);
        }
        self.advance();
        let target = match expr {
            Expression::Identifier { name, .. } => AssignTarget::Local(name),
            Expression::InstanceVariable(name) => AssignTarget::InstanceVariable(name),
            Expression::Constant { name, .. } => AssignTarget::Constant(name),
            Expression::Call(call) if call.name == "[]" && call.receiver.is_some() => {
                let call = *call;
                let mut args = call.args;
                AssignTarget::Index {
                    receiver: Box::new(call.receiver.unwrap()),
                    index: Box::new(args.remove(0)),
                    line: call.line,
                }
            }
            _ => return Err(self.error("invalid assignment target")),
        };
        let value = self.parse_assignment()?;
        Ok(Expression::Assign {
            target,
            value: Box::new(value),
        })
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&Token::OrOr) {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn binary_call(&self, left: Expression, name: &str, right: Expression, line: u32) -> Expression {
        Expression::Call(Box::new(MethodCall {
            receiver: Some(left),
            name: name.to_string(),
            args: vec![right],
            block: None,
            line,
        }))
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let line = self.line();
            let name = match self.peek() {
                Some(Token::Eq) => "==",
                Some(Token::NotEq) => "!=",
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = self.binary_call(left, name, right, line);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_range()?;
        loop {
            let line = self.line();
            let name = match self.peek() {
                Some(Token::Lt) => "<",
                Some(Token::Gt) => ">",
                Some(Token::LtEq) => "<=",
                Some(Token::GtEq) => ">=",
                _ => break,
            };
            self.advance();
            let right = self.parse_range()?;
            left = self.binary_call(left, name, right, line);
        }
        Ok(left)
    }

    fn parse_range(&mut self) -> Result<Expression, ParseError> {
        let start = self.parse_additive()?;
        if !self.check(&Token::DotDot) {
            return Ok(start);
        }
        let end = self.parse_additive()?;
        Ok(Expression::Range {
            start: Box::new(start),
            end: Box::new(end),
        })
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let line = self.line();
            let name = match self.peek() {
                Some(Token::Plus) => "+",
                Some(Token::Minus) => "-",
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary_call(left, name, right, line);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let line = self.line();
            let name = match self.peek() {
                Some(Token::Star) => "*",
                Some(Token::Slash) => "/",
                Some(Token::Percent) => "%",
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary_call(left, name, right, line);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let line = self.line();
        match self.peek() {
            Some(Token::Bang) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::Call(Box::new(MethodCall {
                    receiver: Some(operand),
                    name: "!".to_string(),
                    args: vec![],
                    block: None,
                    line,
                })))
            }
            Some(Token::Minus) => {
                self.advance();
                if let Some(Token::Integer(value)) = self.peek() {
                    let value = *value;
                    self.advance();
                    return Ok(Expression::Integer(-value));
                }
                let operand = self.parse_unary()?;
                Ok(Expression::Call(Box::new(MethodCall {
                    receiver: Some(operand),
                    name: "-@".to_string(),
                    args: vec![],
                    block: None,
                    line,
                })))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let line = self.line();
                    let name = match self.advance() {
                        Some(Token::Identifier(name)) => name,
                        // `x.class` is a plain send; `class` only starts a
                        // definition in statement position.
                        Some(Token::Class) => "class".to_string(),
                        _ => return Err(self.error("expected a method name after `.`")),
                    };
                    // `obj.name = v` is an attribute-writer send (`name=`).
                    if self.peek() == Some(&Token::Assign) {
                        self.advance();
                        let value = self.parse_expression()?;
                        expr = Expression::Call(Box::new(MethodCall {
                            receiver: Some(expr),
                            name: format!("{name}="),
                            args: vec![value],
                            block: None,
                            line,
                        }));
                        continue;
                    }
                    let args = if self.check(&Token::LParen) {
                        self.parse_call_args()?
                    } else {
                        Vec::new()
                    };
                    let block = self.parse_optional_block()?;
                    expr = Expression::Call(Box::new(MethodCall {
                        receiver: Some(expr),
                        name,
                        args,
                        block,
                        line,
                    }));
                }
                Some(Token::LBracket) => {
                    let line = self.line();
                    self.advance();
                    self.skip_newlines();
                    let index = self.parse_expression()?;
                    self.skip_newlines();
                    self.expect(&Token::RBracket, "`]` to close the index")?;
                    expr = Expression::Call(Box::new(MethodCall {
                        receiver: Some(expr),
                        name: "[]".to_string(),
                        args: vec![index],
                        block: None,
                        line,
                    }));
                }
                Some(Token::ColonColon) => {
                    let line = self.line();
                    self.advance();
                    let name = match self.advance() {
                        Some(Token::Constant(name)) => name,
                        _ => return Err(self.error("expected a constant name after `::`")),
                    };
                    expr = Expression::ScopedConstant {
                        scope: Box::new(expr),
                        name,
                        line,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Whether the upcoming token can begin a parenthesis-free argument list
    /// (`puts 42`, `include Enumerable`, `attr_reader :name`).
    fn starts_bare_args(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Integer(_))
                | Some(Token::Str(_))
                | Some(Token::Constant(_))
                | Some(Token::Identifier(_))
                | Some(Token::InstanceVar(_))
                | Some(Token::True)
                | Some(Token::False)
                | Some(Token::Nil)
                | Some(Token::SelfKw)
        )
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let line = self.line();
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.error("unexpected end of input")),
        };
        match token {
            Token::Integer(value) => {
                self.advance();
                Ok(Expression::Integer(value))
            }
            Token::Str(value) => {
                self.advance();
                Ok(Expression::Str(value))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            Token::Nil => {
                self.advance();
                Ok(Expression::Nil)
            }
            Token::SelfKw => {
                self.advance();
                Ok(Expression::SelfRef)
            }
            Token::InstanceVar(name) => {
                self.advance();
                Ok(Expression::InstanceVariable(name))
            }
            Token::Constant(name) => {
                self.advance();
                Ok(Expression::Constant { name, line })
            }
            Token::Identifier(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    let args = self.parse_call_args()?;
                    let block = self.parse_optional_block()?;
                    return Ok(Expression::Call(Box::new(MethodCall {
                        receiver: None,
                        name,
                        args,
                        block,
                        line,
                    })));
                }
                if self.starts_bare_args() {
                    let args = self.parse_bare_args()?;
                    return Ok(Expression::Call(Box::new(MethodCall {
                        receiver: None,
                        name,
                        args,
                        block: None,
                        line,
                    })));
                }
                if matches!(self.peek(), Some(Token::LBrace) | Some(Token::Do)) {
                    let block = self.parse_optional_block()?;
                    return Ok(Expression::Call(Box::new(MethodCall {
                        receiver: None,
                        name,
                        args: Vec::new(),
                        block,
                        line,
                    })));
                }
                Ok(Expression::Identifier { name, line })
            }
            Token::Yield => {
                self.advance();
                let args = if self.check(&Token::LParen) {
                    self.parse_call_args()?
                } else if self.starts_bare_args() {
                    self.parse_bare_args()?
                } else {
                    Vec::new()
                };
                Ok(Expression::Yield { args, line })
            }
            Token::LParen => {
                self.advance();
                self.skip_newlines();
                let expr = self.parse_expression()?;
                self.skip_newlines();
                self.expect(&Token::RParen, "`)`")?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                self.skip_newlines();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        self.skip_newlines();
                        if !self.check(&Token::Comma) {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.expect(&Token::RBracket, "`]` to close the array literal")?;
                Ok(Expression::Array(elements))
            }
            Token::LBrace => {
                self.advance();
                self.parse_hash_literal()
            }
            Token::If => {
                self.advance();
                self.parse_if_tail()
            }
            Token::Unless => {
                self.advance();
                let condition = self.parse_expression()?;
                self.skip_separators();
                let body = self.parse_body(&[Token::Else, Token::End])?;
                let else_body = if self.check(&Token::Else) {
                    self.parse_body(&[Token::End])?
                } else {
                    Body::default()
                };
                self.expect(&Token::End, "`end` to close the `unless`")?;
                Ok(Expression::If {
                    condition: Box::new(condition),
                    then_body: else_body,
                    else_body: Some(body),
                })
            }
            Token::While => {
                self.advance();
                let condition = self.parse_expression()?;
                self.skip_separators();
                let body = self.parse_body(&[Token::End])?;
                self.expect(&Token::End, "`end` to close the `while`")?;
                Ok(Expression::While {
                    condition: Box::new(condition),
                    body,
                })
            }
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    /// The condition and branches of an `if`, with `elsif` chains folded into
    /// nested `if` expressions.
    fn parse_if_tail(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_expression()?;
        self.skip_separators();
        let then_body = self.parse_body(&[Token::Elsif, Token::Else, Token::End])?;
        let else_body = if self.check(&Token::Elsif) {
            let nested = self.parse_if_tail()?;
            return Ok(Expression::If {
                condition: Box::new(condition),
                then_body,
                else_body: Some(Body {
                    statements: vec![Statement::Expression(nested)],
                }),
            });
        } else if self.check(&Token::Else) {
            let body = self.parse_body(&[Token::End])?;
            self.expect(&Token::End, "`end` to close the `if`")?;
            Some(body)
        } else {
            self.expect(&Token::End, "`end` to close the `if`")?;
            None
        };
        Ok(Expression::If {
            condition: Box::new(condition),
            then_body,
            else_body,
        })
    }

    fn parse_hash_literal(&mut self) -> Result<Expression, ParseError> {
        let mut entries = Vec::new();
        self.skip_newlines();
        if self.peek() != Some(&Token::RBrace) {
            loop {
                let key = match self.advance() {
                    Some(Token::Identifier(name)) => name,
                    Some(Token::Str(name)) => name,
                    _ => return Err(self.error("expected a hash key")),
                };
                self.expect(&Token::Colon, "`:` after the hash key")?;
                self.skip_newlines();
                let value = self.parse_expression()?;
                entries.push((key, value));
                self.skip_newlines();
                if !self.check(&Token::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect(&Token::RBrace, "`}` to close the hash literal")?;
        Ok(Expression::Hash(entries))
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        self.skip_newlines();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                self.skip_newlines();
                if !self.check(&Token::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect(&Token::RParen, "`)` to close the argument list")?;
        Ok(args)
    }

    fn parse_bare_args(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_expression()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Ok(args)
    }

    fn parse_optional_block(&mut self) -> Result<Option<BlockLiteral>, ParseError> {
        let (open_brace, terminator) = match self.peek() {
            Some(Token::LBrace) => (true, Token::RBrace),
            Some(Token::Do) => (false, Token::End),
            _ => return Ok(None),
        };
        self.advance();
        self.skip_newlines();
        let mut params = Vec::new();
        if self.check(&Token::Pipe) {
            loop {
                match self.advance() {
                    Some(Token::Identifier(name)) => params.push(name),
                    _ => return Err(self.error("expected a block parameter name")),
                }
                if !self.check(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::Pipe, "`|` to close the block parameters")?;
        }
        let body = self.parse_body(&[terminator.clone()])?;
        let what = if open_brace {
            "`}` to close the block"
        } else {
            "`end` to close the block"
        };
        self.expect(&terminator, what)?;
        Ok(Some(BlockLiteral { params, body }))
    }
}

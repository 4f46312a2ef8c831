//! Recursive-descent parser producing the statement list the evaluator walks.

use super::lexer::{tokenize, Spanned, Token};
use super::ScriptError;

/// Nesting limit for expressions. Deeply nested input becomes a parse
/// error instead of exhausting the stack.
const MAX_DEPTH: u32 = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Var(String),
    /// `callee(args)` where callee is any expression.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `recv.name` without a call.
    Member { recv: Box<Expr>, name: String },
    /// `recv.name(args)`, kept distinct so natives see the receiver.
    MethodCall {
        recv: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let` and `const` bind the same way at runtime.
    Declare { name: String, init: Expr, line: u32 },
    Return { value: Option<Expr>, line: u32 },
    Throw { value: Expr, line: u32 },
    Expr { expr: Expr, line: u32 },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Declare { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Throw { line, .. }
            | Stmt::Expr { line, .. } => *line,
        }
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
        depth: 0,
    };
    parser.program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: u32,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ScriptError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ScriptError {
        let found = match self.peek() {
            Some(token) => format!("{:?}", token),
            None => "end of input".to_string(),
        };
        ScriptError::parse(self.line(), format!("expected {}, found {}", what, found))
    }

    fn program(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        let line = self.line();
        let stmt = match self.peek() {
            Some(Token::Let) | Some(Token::Const) => {
                self.advance();
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.unexpected("a variable name"));
                    }
                };
                self.expect(Token::Assign, "`=`")?;
                let init = self.expression()?;
                Stmt::Declare { name, init, line }
            }
            Some(Token::Return) => {
                self.advance();
                let value = match self.peek() {
                    Some(Token::Semi) | None => None,
                    _ => Some(self.expression()?),
                };
                Stmt::Return { value, line }
            }
            Some(Token::Throw) => {
                self.advance();
                let value = self.expression()?;
                Stmt::Throw { value, line }
            }
            _ => {
                let expr = self.expression()?;
                Stmt::Expr { expr, line }
            }
        };
        // The trailing semicolon is optional on the last statement.
        if !self.eat(&Token::Semi) && self.peek().is_some() {
            return Err(self.unexpected("`;`"));
        }
        Ok(stmt)
    }

    /// Entry point for every nested expression; carries the depth check.
    fn expression(&mut self) -> Result<Expr, ScriptError> {
        if self.depth >= MAX_DEPTH {
            return Err(ScriptError::parse(
                self.line(),
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        let result = self.additive();
        self.depth -= 1;
        result
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat(&Token::Plus) {
                let rhs = self.unary()?;
                lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
            } else if self.eat(&Token::Minus) {
                let rhs = self.unary()?;
                lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        if self.eat(&Token::Minus) {
            // `-` chains recurse without passing through expression().
            if self.depth >= MAX_DEPTH {
                return Err(ScriptError::parse(
                    self.line(),
                    "expression nested too deeply",
                ));
            }
            self.depth += 1;
            let inner = self.unary();
            self.depth -= 1;
            Ok(Expr::Neg(Box::new(inner?)))
        } else {
            self.postfix()
        }
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.unexpected("a property name"));
                    }
                };
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::MethodCall {
                        recv: Box::new(expr),
                        name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        recv: Box::new(expr),
                        name,
                    };
                }
            } else if self.eat(&Token::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Argument list with the opening paren already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::Comma) {
                // Allow a trailing comma before `)`.
                if self.eat(&Token::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(Token::RParen, "`,` or `)`")?;
            return Ok(args);
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let expr = match self.peek().cloned() {
            Some(Token::Null) => {
                self.advance();
                Expr::Null
            }
            Some(Token::True) => {
                self.advance();
                Expr::Bool(true)
            }
            Some(Token::False) => {
                self.advance();
                Expr::Bool(false)
            }
            Some(Token::Number(n)) => {
                self.advance();
                Expr::Number(n)
            }
            Some(Token::Str(s)) => {
                self.advance();
                Expr::Str(s)
            }
            Some(Token::Ident(name)) => {
                self.advance();
                Expr::Var(name)
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.expect(Token::RParen, "`)`")?;
                inner
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut elems = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        elems.push(self.expression()?);
                        if self.eat(&Token::Comma) {
                            if self.eat(&Token::RBracket) {
                                break;
                            }
                            continue;
                        }
                        self.expect(Token::RBracket, "`,` or `]`")?;
                        break;
                    }
                }
                Expr::Array(elems)
            }
            Some(Token::LBrace) => {
                self.advance();
                let mut fields = Vec::new();
                if !self.eat(&Token::RBrace) {
                    loop {
                        let key = match self.advance() {
                            Some(Token::Ident(name)) => name,
                            Some(Token::Str(s)) => s,
                            _ => {
                                self.pos = self.pos.saturating_sub(1);
                                return Err(self.unexpected("a field name"));
                            }
                        };
                        self.expect(Token::Colon, "`:`")?;
                        let value = self.expression()?;
                        fields.push((key, value));
                        if self.eat(&Token::Comma) {
                            if self.eat(&Token::RBrace) {
                                break;
                            }
                            continue;
                        }
                        self.expect(Token::RBrace, "`,` or `}`")?;
                        break;
                    }
                }
                Expr::Object(fields)
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(expr)
    }
}

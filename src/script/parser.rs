//! Parser for the script subset.
//!
//! Recursive descent over the token stream, with precedence climbing for
//! binary operators. The grammar covers what conforming test scripts
//! actually contain: declarations, expression statements, blocks,
//! `if`/`return`, arrow functions, call/member chains, object and array
//! literals, template literals, `await`, and the usual operators.
//! Everything else is a positioned [`SyntaxError`].

use crate::script::ast::{ArrowBody, DeclKind, Expr, Property, Span, Stmt, StmtKind};
use crate::script::lexer::{tokenize, Token, TokenKind};
use crate::script::SyntaxError;

/// Parses a full script into its top-level statement sequence.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let mut body = Vec::new();
    while !parser.at_eof() {
        if parser.eat_punct(";") {
            continue;
        }
        body.push(parser.parse_statement()?);
    }
    Ok(body)
}

/// Parses a string holding exactly one expression.
///
/// Used for template-literal interpolations and for rebuilding marker
/// expressions in the variable codec.
pub fn parse_expression_source(source: &str) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expression()?;
    if !parser.at_eof() {
        return Err(SyntaxError::new(
            "unexpected trailing tokens after expression",
            parser.offset(),
        ));
    }
    Ok(expr)
}

fn binary_precedence(op: &str) -> Option<u8> {
    match op {
        "||" | "??" => Some(1),
        "&&" => Some(2),
        "==" | "!=" | "===" | "!==" => Some(3),
        "<" | ">" | "<=" | ">=" => Some(4),
        "+" | "-" => Some(5),
        "*" | "/" | "%" => Some(6),
        _ => None,
    }
}

const ASSIGN_OPS: &[&str] = &["=", "+=", "-=", "*=", "/="];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the most recently consumed token.
    last_end: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            last_end: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn offset(&self) -> usize {
        self.peek().start
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        self.last_end = token.end;
        token
    }

    fn at_punct(&self, op: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == op)
    }

    fn eat_punct(&mut self, op: &str) -> bool {
        if self.at_punct(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, op: &str) -> Result<(), SyntaxError> {
        if self.eat_punct(op) {
            Ok(())
        } else {
            Err(SyntaxError::new(format!("expected '{op}'"), self.offset()))
        }
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == word)
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        let offset = self.offset();
        match self.advance().kind {
            TokenKind::Ident(name) => Ok(name),
            _ => Err(SyntaxError::new("expected identifier", offset)),
        }
    }

    // ----- statements -----

    fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.peek().start;

        let kind = if self.at_word("const") || self.at_word("let") || self.at_word("var") {
            self.parse_var_decl()?
        } else if self.at_word("if") {
            self.parse_if()?
        } else if self.at_word("return") {
            self.advance();
            let arg = if self.at_punct(";") || self.at_punct("}") || self.at_eof() {
                None
            } else {
                Some(self.parse_expression()?)
            };
            StmtKind::Return { arg }
        } else if self.at_punct("{") {
            StmtKind::Block {
                body: self.parse_block()?,
            }
        } else {
            StmtKind::Expr {
                expr: self.parse_expression()?,
            }
        };

        self.eat_punct(";");
        Ok(Stmt {
            kind,
            span: Span::new(start, self.last_end),
            comment: None,
        })
    }

    fn parse_var_decl(&mut self) -> Result<StmtKind, SyntaxError> {
        let kind = match self.advance().kind {
            TokenKind::Ident(word) => match word.as_str() {
                "const" => DeclKind::Const,
                "let" => DeclKind::Let,
                _ => DeclKind::Var,
            },
            _ => unreachable!("caller checked the declaration keyword"),
        };
        let name = self.expect_ident()?;
        let init = if self.eat_punct("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        if self.at_punct(",") {
            return Err(SyntaxError::new(
                "multiple declarators in one statement are not supported",
                self.offset(),
            ));
        }
        Ok(StmtKind::VarDecl { kind, name, init })
    }

    fn parse_if(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance(); // if
        self.expect_punct("(")?;
        let test = self.parse_expression()?;
        self.expect_punct(")")?;
        let consequent = self.parse_block()?;
        let alternate = if self.at_word("else") {
            self.advance();
            if self.at_word("if") {
                let start = self.peek().start;
                let nested = self.parse_if()?;
                Some(vec![Stmt {
                    kind: nested,
                    span: Span::new(start, self.last_end),
                    comment: None,
                }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.at_punct("}") {
            if self.at_eof() {
                return Err(SyntaxError::new("unterminated block", self.offset()));
            }
            if self.eat_punct(";") {
                continue;
            }
            body.push(self.parse_statement()?);
        }
        self.advance(); // }
        Ok(body)
    }

    // ----- expressions -----

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_conditional()?;
        let assign_op = match &self.peek().kind {
            TokenKind::Punct(op) => ASSIGN_OPS.iter().copied().find(|a| a == op),
            _ => None,
        };
        if let Some(op) = assign_op {
            if !matches!(
                left,
                Expr::Ident { .. } | Expr::Member { .. } | Expr::Paren { .. }
            ) {
                return Err(SyntaxError::new(
                    "invalid assignment target",
                    self.offset(),
                ));
            }
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Expr::Assign {
                op,
                target: Box::new(left),
                value: Box::new(value),
            });
        }
        Ok(left)
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let test = self.parse_binary(1)?;
        if self.eat_punct("?") {
            let consequent = self.parse_expression()?;
            self.expect_punct(":")?;
            let alternate = self.parse_expression()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(test)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Punct(op) => *op,
                _ => break,
            };
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        for op in ["!", "-", "+"] {
            if self.at_punct(op) {
                self.advance();
                let expr = self.parse_unary()?;
                return Ok(Expr::Unary {
                    op,
                    expr: Box::new(expr),
                });
            }
        }
        if self.at_word("typeof") {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: "typeof",
                expr: Box::new(expr),
            });
        }
        if self.at_word("await") {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Await {
                expr: Box::new(expr),
            });
        }
        if self.at_word("new") {
            self.advance();
            let mut callee = self.parse_primary()?;
            loop {
                if self.eat_punct(".") {
                    let name = self.expect_ident()?;
                    callee = Expr::Member {
                        object: Box::new(callee),
                        property: Box::new(Expr::ident(name)),
                        computed: false,
                    };
                } else {
                    break;
                }
            }
            let args = if self.at_punct("(") {
                self.parse_call_args()?
            } else {
                Vec::new()
            };
            let new_expr = Expr::New {
                callee: Box::new(callee),
                args,
            };
            return self.parse_postfix_chain(new_expr);
        }
        let primary = self.parse_primary()?;
        self.parse_postfix_chain(primary)
    }

    fn parse_postfix_chain(&mut self, mut expr: Expr) -> Result<Expr, SyntaxError> {
        loop {
            if self.eat_punct(".") {
                let name = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::ident(name)),
                    computed: false,
                };
            } else if self.at_punct("[") {
                self.advance();
                let property = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(property),
                    computed: true,
                };
            } else if self.at_punct("(") {
                let args = self.parse_call_args()?;
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

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.at_punct(")") {
            if self.at_eof() {
                return Err(SyntaxError::new("unterminated argument list", self.offset()));
            }
            args.push(self.parse_expression()?);
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.offset();
        match self.peek().kind.clone() {
            TokenKind::Num(raw) => {
                self.advance();
                Ok(Expr::Num { raw })
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::Str { value })
            }
            TokenKind::Template { quasis, exprs } => {
                self.advance();
                let parsed = exprs
                    .iter()
                    .map(|src| parse_expression_source(src))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Template {
                    quasis,
                    exprs: parsed,
                })
            }
            TokenKind::Ident(name) => match name.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Bool { value: true })
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Bool { value: false })
                }
                "null" => {
                    self.advance();
                    Ok(Expr::Null)
                }
                "async" if self.arrow_follows(1) => {
                    self.advance();
                    self.parse_arrow(true)
                }
                _ => {
                    // single-parameter arrow: `x => ...`
                    if matches!(self.peek_at(1).kind, TokenKind::Punct("=>")) {
                        self.advance();
                        self.advance();
                        let body = self.parse_arrow_body()?;
                        return Ok(Expr::Arrow {
                            is_async: false,
                            params: vec![name],
                            body,
                        });
                    }
                    self.advance();
                    Ok(Expr::Ident { name })
                }
            },
            TokenKind::Punct("(") => {
                if self.arrow_follows(0) {
                    self.parse_arrow(false)
                } else {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.expect_punct(")")?;
                    Ok(Expr::Paren {
                        expr: Box::new(expr),
                    })
                }
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut elements = Vec::new();
                while !self.at_punct("]") {
                    if self.at_eof() {
                        return Err(SyntaxError::new("unterminated array literal", offset));
                    }
                    elements.push(self.parse_expression()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                Ok(Expr::Array { elements })
            }
            TokenKind::Punct("{") => self.parse_object(),
            _ => Err(SyntaxError::new("expected expression", offset)),
        }
    }

    /// Looks ahead from the token at `self.pos + n` (which must open a
    /// parameter list or be a lone identifier) for a `=>`.
    fn arrow_follows(&self, n: usize) -> bool {
        let mut idx = self.pos + n;
        match self.tokens.get(idx).map(|t| &t.kind) {
            Some(TokenKind::Ident(_)) => {
                matches!(self.tokens.get(idx + 1).map(|t| &t.kind), Some(TokenKind::Punct("=>")))
            }
            Some(TokenKind::Punct("(")) => {
                let mut depth = 0usize;
                loop {
                    match self.tokens.get(idx).map(|t| &t.kind) {
                        Some(TokenKind::Punct("(")) => depth += 1,
                        Some(TokenKind::Punct(")")) => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(
                                    self.tokens.get(idx + 1).map(|t| &t.kind),
                                    Some(TokenKind::Punct("=>"))
                                );
                            }
                        }
                        Some(TokenKind::Eof) | None => return false,
                        _ => {}
                    }
                    idx += 1;
                }
            }
            _ => false,
        }
    }

    /// Parses an arrow function whose current token is `(` or the single
    /// parameter identifier. The `async` keyword, if any, is already
    /// consumed.
    fn parse_arrow(&mut self, is_async: bool) -> Result<Expr, SyntaxError> {
        let mut params = Vec::new();
        if self.at_punct("(") {
            self.advance();
            while !self.at_punct(")") {
                params.push(self.expect_ident()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct(")")?;
        } else {
            params.push(self.expect_ident()?);
        }
        self.expect_punct("=>")?;
        let body = self.parse_arrow_body()?;
        Ok(Expr::Arrow {
            is_async,
            params,
            body,
        })
    }

    fn parse_arrow_body(&mut self) -> Result<ArrowBody, SyntaxError> {
        if self.at_punct("{") {
            Ok(ArrowBody::Block(self.parse_block()?))
        } else {
            Ok(ArrowBody::Expr(Box::new(self.parse_expression()?)))
        }
    }

    fn parse_object(&mut self) -> Result<Expr, SyntaxError> {
        self.expect_punct("{")?;
        let mut properties = Vec::new();
        while !self.at_punct("}") {
            if self.at_eof() {
                return Err(SyntaxError::new("unterminated object literal", self.offset()));
            }

            if self.at_punct("[") {
                self.advance();
                let key = self.parse_expression()?;
                self.expect_punct("]")?;
                self.expect_punct(":")?;
                let value = self.parse_expression()?;
                properties.push(Property {
                    key,
                    value,
                    computed: true,
                    shorthand: false,
                });
            } else {
                let offset = self.offset();
                let key = match self.advance().kind {
                    TokenKind::Ident(name) => Expr::Ident { name },
                    TokenKind::Str(value) => Expr::Str { value },
                    TokenKind::Num(raw) => Expr::Num { raw },
                    _ => return Err(SyntaxError::new("expected property key", offset)),
                };

                if self.eat_punct(":") {
                    let value = self.parse_expression()?;
                    properties.push(Property {
                        key,
                        value,
                        computed: false,
                        shorthand: false,
                    });
                } else if let Expr::Ident { name } = &key {
                    // shorthand `{ name }`
                    let value = Expr::ident(name.clone());
                    properties.push(Property {
                        key,
                        value,
                        computed: false,
                        shorthand: true,
                    });
                } else {
                    return Err(SyntaxError::new(
                        "expected ':' after property key",
                        self.offset(),
                    ));
                }
            }

            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        Ok(Expr::Object { properties })
    }
}

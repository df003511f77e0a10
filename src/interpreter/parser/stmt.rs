use crate::{
    ast::{ChannelKind, Expr, FuncDef, FuncSig, Param, Stmt, Type},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::core::{ParseResult, Parser},
    },
};

impl Parser<'_> {
    /// Parses a single statement.
    ///
    /// A statement may be a declaration, an assignment, a call, control
    /// flow (`if`, `while`, `break`, `continue`, `return`), a function
    /// definition, a `par`/`seq` block, or a channel declaration. The
    /// leading token decides which; a trailing `;` is consumed when present
    /// but never required.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let stmt = match self.peek() {
            Some(Token::Identifier(_)) => self.parse_id_statement()?,
            Some(Token::If) => self.parse_if()?,
            Some(Token::While) => self.parse_while()?,
            Some(Token::Func) => self.parse_func_def()?,
            Some(Token::Par) => self.parse_par()?,
            Some(Token::Seq) => self.parse_seq()?,
            Some(Token::CChannel) => self.parse_channel_decl(ChannelKind::Client)?,
            Some(Token::SChannel) => self.parse_channel_decl(ChannelKind::Server)?,
            Some(Token::Return) => self.parse_return()?,
            Some(Token::Break) => {
                let (_, line) = self.advance().expect("peeked");
                if self.loop_depth == 0 {
                    return Err(ParseError::BreakOutsideLoop { line });
                }
                Stmt::Break { line }
            },
            Some(Token::Continue) => {
                let (_, line) = self.advance().expect("peeked");
                if self.loop_depth == 0 {
                    return Err(ParseError::ContinueOutsideLoop { line });
                }
                Stmt::Continue { line }
            },
            Some(token) => {
                let token = format!("expected a statement, found '{token}'");
                let line = self.tokens.peek().map_or(self.line, |(_, l)| *l);
                return Err(ParseError::UnexpectedToken { token, line });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line: self.line }),
        };

        self.eat(&Token::Semicolon);
        Ok(stmt)
    }

    /// Parses the statements of a braced block.
    ///
    /// Grammar: `block := "{" stmt* "}"`
    ///
    /// Scope handling is left to the caller, since `par`/`seq` blocks share
    /// the enclosing scope while `if`/`while`/function bodies do not.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&Token::LBrace, "to open the block")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    return Ok(stmts);
                },
                Some(Token::Semicolon) => {
                    self.advance();
                },
                Some(_) => stmts.push(self.parse_statement()?),
                None => return Err(ParseError::UnexpectedEndOfInput { line: self.line }),
            }
        }
    }

    /// Parses a statement that begins with an identifier: a declaration
    /// (`name: type`), an assignment (`name = expr`), or a call.
    ///
    /// An assignment to a name with no visible declaration implicitly
    /// declares it in the current scope with the type of the right-hand
    /// side.
    fn parse_id_statement(&mut self) -> ParseResult<Stmt> {
        let (name, line) = self.expect_identifier("at the start of a statement")?;

        match self.peek() {
            Some(Token::Colon) => {
                self.advance();
                self.check_not_reserved(&name, line)?;
                let ty = self.expect_value_type("in the declaration")?;

                let init = if self.eat(&Token::Equals) {
                    let expr = self.parse_expression()?;
                    if expr.ty() != &ty {
                        return Err(ParseError::TypeMismatch { expected: ty.to_string(),
                                                              found: expr.ty().to_string(),
                                                              line: expr.line_number(), });
                    }
                    Some(expr)
                } else {
                    None
                };

                self.symbols.declare(&name, ty.clone(), line)?;
                Ok(Stmt::Decl { name, ty, init, line })
            },
            Some(Token::Equals) => {
                self.advance();
                let value = self.parse_expression()?;

                let ty = match self.symbols.lookup(&name).cloned() {
                    Some(declared) => {
                        if value.ty() != &declared {
                            return Err(ParseError::TypeMismatch { expected:
                                                                      declared.to_string(),
                                                                  found: value.ty().to_string(),
                                                                  line: value.line_number(), });
                        }
                        declared
                    },
                    None => {
                        // First assignment doubles as the declaration.
                        self.check_not_reserved(&name, line)?;
                        let ty = value.ty().clone();
                        if ty == Type::Void {
                            return Err(ParseError::VoidInExpression { line: value.line_number(), });
                        }
                        self.symbols.declare(&name, ty.clone(), line)?;
                        ty
                    },
                };

                Ok(Stmt::Assign { name, value, ty, line })
            },
            Some(Token::LParen) => {
                let expr = self.parse_call(name, line)?;
                Ok(Stmt::Expression { expr, line })
            },
            Some(token) => {
                Err(ParseError::UnexpectedToken { token: format!("expected ':', '=' or '(' after '{name}', found '{token}'"),
                                                  line })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line: self.line }),
        }
    }

    /// Grammar: `if := "if" "(" expr ")" block ("else" (if | block))?`
    ///
    /// The condition must be `bool`. Each branch opens its own scope.
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        self.expect(&Token::LParen, "after 'if'")?;
        let condition = self.parse_expression()?;
        self.require_condition(&condition)?;
        self.expect(&Token::RParen, "after the condition")?;

        self.symbols.push_scope();
        let body = self.parse_block()?;
        self.symbols.pop_scope();

        let else_body = if self.eat(&Token::Else) {
            if self.peek() == Some(&Token::If) {
                Some(vec![self.parse_if()?])
            } else {
                self.symbols.push_scope();
                let stmts = self.parse_block()?;
                self.symbols.pop_scope();
                Some(stmts)
            }
        } else {
            None
        };

        Ok(Stmt::If { condition,
                      body,
                      else_body,
                      line })
    }

    /// Grammar: `while := "while" "(" expr ")" block`
    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        self.expect(&Token::LParen, "after 'while'")?;
        let condition = self.parse_expression()?;
        self.require_condition(&condition)?;
        self.expect(&Token::RParen, "after the condition")?;

        self.symbols.push_scope();
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        self.symbols.pop_scope();

        Ok(Stmt::While { condition,
                         body: body?,
                         line })
    }

    /// Grammar: `funcdef := "func" ID "(" params? ")" "->" type block`
    ///
    /// Parameters are `name: type` pairs with optional `= default` values;
    /// once one parameter has a default, the rest must as well. The function
    /// is declared before its body is parsed so it can call itself.
    fn parse_func_def(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        let (name, name_line) = self.expect_identifier("after 'func'")?;
        self.check_not_reserved(&name, name_line)?;

        self.expect(&Token::LParen, "to open the parameter list")?;
        let mut params: Vec<Param> = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                let (param_name, param_line) = self.expect_identifier("in the parameter list")?;
                self.expect(&Token::Colon, "after the parameter name")?;
                let ty = self.expect_value_type("for the parameter")?;

                let default = if self.eat(&Token::Equals) {
                    let expr = self.parse_expression()?;
                    if expr.ty() != &ty {
                        return Err(ParseError::TypeMismatch { expected: ty.to_string(),
                                                              found: expr.ty().to_string(),
                                                              line: expr.line_number(), });
                    }
                    Some(expr)
                } else {
                    if params.iter().any(|p| p.default.is_some()) {
                        return Err(ParseError::UnexpectedToken { token: format!("parameter '{param_name}' without a default follows a defaulted parameter"),
                                                                 line:  param_line, });
                    }
                    None
                };

                params.push(Param { name: param_name,
                                    ty,
                                    default });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "to close the parameter list")?;
        self.expect(&Token::Arrow, "before the return type")?;
        let ret = self.expect_return_type()?;

        let sig = FuncSig { params:   params.iter().map(|p| p.ty.clone()).collect(),
                            required: params.iter().filter(|p| p.default.is_none()).count(),
                            ret:      Box::new(ret.clone()), };
        self.symbols.declare(&name, Type::Func(sig), name_line)?;

        self.symbols.push_scope();
        for param in &params {
            self.symbols.declare(&param.name, param.ty.clone(), name_line)?;
        }

        let saved_ret = self.ret_type.replace(ret.clone());
        let saved_depth = std::mem::take(&mut self.loop_depth);
        let body = self.parse_block();
        self.ret_type = saved_ret;
        self.loop_depth = saved_depth;
        self.symbols.pop_scope();

        Ok(Stmt::FuncDef(FuncDef { name,
                                   params,
                                   ret,
                                   body: body?,
                                   line }))
    }

    /// Grammar: `par := "par" block`
    ///
    /// Children share the enclosing scope, so no scope is pushed. Each
    /// child runs as its own task, which is why `break`/`continue` may not
    /// cross the block boundary.
    fn parse_par(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        let saved_depth = std::mem::take(&mut self.loop_depth);
        let body = self.parse_block();
        self.loop_depth = saved_depth;
        Ok(Stmt::Par { body: body?, line })
    }

    /// Grammar: `seq := "seq" block`
    ///
    /// Transparent grouping: children run in order in the enclosing scope,
    /// and `break`/`continue` pass through to an enclosing loop.
    fn parse_seq(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        let body = self.parse_block()?;
        Ok(Stmt::Seq { body, line })
    }

    /// Grammar: `channeldecl := ("c_channel" | "s_channel") ID "{" expr "," expr "}"`
    ///
    /// The host expression must be a string and the port a number.
    fn parse_channel_decl(&mut self, kind: ChannelKind) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        let (name, name_line) = self.expect_identifier("after the channel keyword")?;
        self.check_not_reserved(&name, name_line)?;

        self.expect(&Token::LBrace, "to open the endpoint")?;
        let host = self.parse_expression()?;
        if host.ty() != &Type::Str {
            return Err(ParseError::TypeMismatch { expected: Type::Str.to_string(),
                                                  found: host.ty().to_string(),
                                                  line: host.line_number(), });
        }
        self.expect(&Token::Comma, "between host and port")?;
        let port = self.parse_expression()?;
        if port.ty() != &Type::Number {
            return Err(ParseError::TypeMismatch { expected: Type::Number.to_string(),
                                                  found: port.ty().to_string(),
                                                  line: port.line_number(), });
        }
        self.expect(&Token::RBrace, "to close the endpoint")?;

        let ty = match kind {
            ChannelKind::Client => Type::CChannel,
            ChannelKind::Server => Type::SChannel,
        };
        self.symbols.declare(&name, ty, name_line)?;

        Ok(Stmt::ChannelDecl { name,
                               kind,
                               host,
                               port,
                               line })
    }

    /// Grammar: `return := "return" expr?`
    ///
    /// Only legal inside a function body; the value type must match the
    /// declared return type, and a bare `return` requires `void`.
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let (_, line) = self.advance().expect("peeked");
        let Some(ret) = self.ret_type.clone() else {
            return Err(ParseError::ReturnOutsideFunction { line });
        };

        let value = if self.starts_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        match &value {
            Some(expr) => {
                if expr.ty() != &ret {
                    return Err(ParseError::ReturnTypeMismatch { expected: ret.to_string(),
                                                                found: expr.ty().to_string(),
                                                                line: expr.line_number(), });
                }
            },
            None => {
                if ret != Type::Void {
                    return Err(ParseError::ReturnTypeMismatch { expected: ret.to_string(),
                                                                found: Type::Void.to_string(),
                                                                line });
                }
            },
        }

        Ok(Stmt::Return { value, line })
    }

    /// Whether the next token can begin an expression.
    fn starts_expression(&mut self) -> bool {
        matches!(self.peek(),
                 Some(Token::Number(_)
                      | Token::Str(_)
                      | Token::Bool(_)
                      | Token::Identifier(_)
                      | Token::LParen
                      | Token::Bang
                      | Token::Minus))
    }

    /// Requires a `bool`-typed condition expression.
    fn require_condition(&self, condition: &Expr) -> ParseResult<()> {
        match condition.ty() {
            Type::Bool => Ok(()),
            found => Err(ParseError::TypeMismatch { expected: Type::Bool.to_string(),
                                                    found: found.to_string(),
                                                    line: condition.line_number(), }),
        }
    }
}

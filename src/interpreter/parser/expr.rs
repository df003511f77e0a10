use crate::{
    ast::{BinaryOperator, ChannelOp, Expr, LiteralValue, Type, UnaryOperator},
    error::ParseError,
    interpreter::{
        evaluator::builtins::{self, ParamTypes},
        lexer::Token,
        parser::core::{ParseResult, Parser},
    },
};

impl Parser<'_> {
    /// Parses a full expression.
    ///
    /// This is the entry point for expression parsing. It begins at the
    /// lowest-precedence level, logical OR, and descends through the
    /// precedence hierarchy. All binary operators are left-associative.
    ///
    /// Grammar: `expression := or`
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    /// Grammar: `or := and ("||" and)*`
    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_and()?;
            self.require_bool(&left, line)?;
            self.require_bool(&right, line)?;
            left = Expr::Logical { op: BinaryOperator::Or,
                                   left: Box::new(left),
                                   right: Box::new(right),
                                   line };
        }
        Ok(left)
    }

    /// Grammar: `and := equality ("&&" equality)*`
    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.peek() == Some(&Token::AndAnd) {
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_equality()?;
            self.require_bool(&left, line)?;
            self.require_bool(&right, line)?;
            left = Expr::Logical { op: BinaryOperator::And,
                                   left: Box::new(left),
                                   right: Box::new(right),
                                   line };
        }
        Ok(left)
    }

    /// Grammar: `equality := rel (("==" | "!=") rel)*`
    ///
    /// Both operands must have the same type.
    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqualEqual) => BinaryOperator::Equal,
                Some(Token::BangEqual) => BinaryOperator::NotEqual,
                _ => break,
            };
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_relational()?;

            if left.ty() == &Type::Void || right.ty() == &Type::Void {
                return Err(ParseError::VoidInExpression { line });
            }
            if left.ty() != right.ty() {
                return Err(ParseError::TypeMismatch { expected: left.ty().to_string(),
                                                      found: right.ty().to_string(),
                                                      line });
            }
            left = Expr::Relational { op,
                                      left: Box::new(left),
                                      right: Box::new(right),
                                      line };
        }
        Ok(left)
    }

    /// Grammar: `rel := add (("<" | "<=" | ">" | ">=") add)*`
    ///
    /// Ordering is defined for two numbers or two strings.
    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Less) => BinaryOperator::Less,
                Some(Token::LessEqual) => BinaryOperator::LessEqual,
                Some(Token::Greater) => BinaryOperator::Greater,
                Some(Token::GreaterEqual) => BinaryOperator::GreaterEqual,
                _ => break,
            };
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_additive()?;

            match (left.ty(), right.ty()) {
                (Type::Number, Type::Number) | (Type::Str, Type::Str) => {},
                (expected, found) => {
                    return Err(ParseError::TypeMismatch { expected: expected.to_string(),
                                                          found: found.to_string(),
                                                          line });
                },
            }
            left = Expr::Relational { op,
                                      left: Box::new(left),
                                      right: Box::new(right),
                                      line };
        }
        Ok(left)
    }

    /// Grammar: `add := mul (("+" | "-") mul)*`
    ///
    /// `+` also concatenates two strings.
    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Sub,
                _ => break,
            };
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_multiplicative()?;

            let ty = match (op, left.ty(), right.ty()) {
                (BinaryOperator::Add, Type::Str, Type::Str) => Type::Str,
                (_, Type::Number, Type::Number) => Type::Number,
                (_, _, found) => {
                    return Err(ParseError::TypeMismatch { expected: left.ty().to_string(),
                                                          found: found.to_string(),
                                                          line });
                },
            };
            left = Expr::Arithmetic { op,
                                      left: Box::new(left),
                                      right: Box::new(right),
                                      ty,
                                      line };
        }
        Ok(left)
    }

    /// Grammar: `mul := unary (("*" | "/" | "%") unary)*`
    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOperator::Mul,
                Some(Token::Slash) => BinaryOperator::Div,
                Some(Token::Percent) => BinaryOperator::Mod,
                _ => break,
            };
            let (_, line) = self.advance().expect("peeked");
            let right = self.parse_unary()?;

            self.require_number(&left, line)?;
            self.require_number(&right, line)?;
            left = Expr::Arithmetic { op,
                                      left: Box::new(left),
                                      right: Box::new(right),
                                      ty: Type::Number,
                                      line };
        }
        Ok(left)
    }

    /// Grammar: `unary := ("!" | "-") unary | primary`
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(Token::Bang) => {
                let (_, line) = self.advance().expect("peeked");
                let expr = self.parse_unary()?;
                self.require_bool(&expr, line)?;
                Ok(Expr::Unary { op: UnaryOperator::Not,
                                 expr: Box::new(expr),
                                 ty: Type::Bool,
                                 line })
            },
            Some(Token::Minus) => {
                let (_, line) = self.advance().expect("peeked");
                let expr = self.parse_unary()?;
                self.require_number(&expr, line)?;
                Ok(Expr::Unary { op: UnaryOperator::Negate,
                                 expr: Box::new(expr),
                                 ty: Type::Number,
                                 line })
            },
            _ => self.parse_primary(),
        }
    }

    /// Grammar: `primary := NUMBER | STRING | BOOL | call | ID | "(" expr ")"`
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Some((Token::Number(value), line)) => {
                Ok(Expr::Constant { value: LiteralValue::Number(value),
                                    ty: Type::Number,
                                    line })
            },
            Some((Token::Str(value), line)) => {
                Ok(Expr::Constant { value: LiteralValue::Str(value),
                                    ty: Type::Str,
                                    line })
            },
            Some((Token::Bool(value), line)) => {
                Ok(Expr::Constant { value: LiteralValue::Bool(value),
                                    ty: Type::Bool,
                                    line })
            },
            Some((Token::LParen, _)) => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen, "to close the expression")?;
                Ok(expr)
            },
            Some((Token::Identifier(name), line)) => {
                if self.peek() == Some(&Token::LParen) {
                    return self.parse_call(name, line);
                }
                match self.symbols.lookup(&name) {
                    Some(ty) => Ok(Expr::Id { name,
                                              ty: ty.clone(),
                                              line }),
                    None => Err(ParseError::UndeclaredIdentifier { name, line }),
                }
            },
            Some((token, line)) => {
                Err(ParseError::UnexpectedToken { token: format!("expected an expression, found '{token}'"),
                                                  line })
            },
            None => Err(ParseError::UnexpectedEndOfInput { line: self.line }),
        }
    }

    /// Parses a call after its callee identifier has been consumed.
    ///
    /// Grammar: `call := ID "(" (expr ("," expr)*)? ")"`
    ///
    /// The callee is resolved, in order, as a channel operation, a builtin,
    /// or a declared function; arity and argument types are checked against
    /// the resolved signature and the call node is annotated with the
    /// signature's result type.
    pub(crate) fn parse_call(&mut self, callee: String, line: usize) -> ParseResult<Expr> {
        self.expect(&Token::LParen, "to open the argument list")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "to close the argument list")?;

        if let Some(op) = ChannelOp::from_name(&callee) {
            let ty = self.check_channel_call(op, &args, line)?;
            return Ok(Expr::Call { callee,
                                   args,
                                   oper: Some(op),
                                   ty,
                                   line });
        }

        if let Some(def) = builtins::lookup(&callee) {
            if !def.arity.check(args.len()) {
                return Err(ParseError::ArgumentCountMismatch { name: callee, line });
            }
            match def.params {
                ParamTypes::Any => {
                    for arg in &args {
                        if arg.ty() == &Type::Void {
                            return Err(ParseError::VoidInExpression { line: arg.line_number(), });
                        }
                    }
                },
                ParamTypes::Exact(expected) => {
                    for (arg, expected) in args.iter().zip(expected) {
                        if arg.ty() != expected {
                            return Err(ParseError::TypeMismatch { expected:
                                                                      expected.to_string(),
                                                                  found: arg.ty().to_string(),
                                                                  line: arg.line_number(), });
                        }
                    }
                },
            }
            return Ok(Expr::Call { callee,
                                   args,
                                   oper: None,
                                   ty: def.ret.clone(),
                                   line });
        }

        match self.symbols.lookup(&callee).cloned() {
            Some(Type::Func(sig)) => {
                if args.len() < sig.required || args.len() > sig.params.len() {
                    return Err(ParseError::ArgumentCountMismatch { name: callee, line });
                }
                for (arg, expected) in args.iter().zip(&sig.params) {
                    if arg.ty() != expected {
                        return Err(ParseError::TypeMismatch { expected: expected.to_string(),
                                                              found: arg.ty().to_string(),
                                                              line: arg.line_number(), });
                    }
                }
                Ok(Expr::Call { callee,
                                args,
                                oper: None,
                                ty: *sig.ret,
                                line })
            },
            Some(_) | None => Err(ParseError::UnknownFunction { name: callee, line }),
        }
    }

    /// Checks the signature of a channel operation call and returns its
    /// result type.
    fn check_channel_call(&self,
                          op: ChannelOp,
                          args: &[Expr],
                          line: usize)
                          -> ParseResult<Type> {
        let expect_arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(ParseError::ArgumentCountMismatch { name: op.name().to_string(),
                                                        line })
            }
        };
        let expect_arg = |index: usize, expected: &Type| {
            let found = args[index].ty();
            if found == expected {
                Ok(())
            } else {
                Err(ParseError::TypeMismatch { expected: expected.to_string(),
                                               found: found.to_string(),
                                               line: args[index].line_number(), })
            }
        };

        match op {
            ChannelOp::Accept => {
                expect_arity(1)?;
                expect_arg(0, &Type::SChannel)?;
                Ok(Type::CChannel)
            },
            ChannelOp::Send => {
                expect_arity(2)?;
                expect_arg(0, &Type::CChannel)?;
                expect_arg(1, &Type::Str)?;
                Ok(Type::Void)
            },
            ChannelOp::Recv => {
                expect_arity(1)?;
                expect_arg(0, &Type::CChannel)?;
                Ok(Type::Str)
            },
            ChannelOp::Close => {
                expect_arity(1)?;
                match args[0].ty() {
                    Type::CChannel | Type::SChannel => Ok(Type::Void),
                    found => Err(ParseError::TypeMismatch { expected:
                                                                "c_channel or s_channel".to_string(),
                                                            found: found.to_string(),
                                                            line: args[0].line_number(), }),
                }
            },
        }
    }

    /// Requires `expr` to have type `bool`.
    fn require_bool(&self, expr: &Expr, line: usize) -> ParseResult<()> {
        match expr.ty() {
            Type::Bool => Ok(()),
            Type::Void => Err(ParseError::VoidInExpression { line }),
            found => Err(ParseError::TypeMismatch { expected: Type::Bool.to_string(),
                                                    found: found.to_string(),
                                                    line }),
        }
    }

    /// Requires `expr` to have type `number`.
    fn require_number(&self, expr: &Expr, line: usize) -> ParseResult<()> {
        match expr.ty() {
            Type::Number => Ok(()),
            Type::Void => Err(ParseError::VoidInExpression { line }),
            found => Err(ParseError::TypeMismatch { expected: Type::Number.to_string(),
                                                    found: found.to_string(),
                                                    line }),
        }
    }
}

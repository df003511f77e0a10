use std::{
    io::Write,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    ast::{BinaryOperator, ChannelKind, ChannelOp, Expr, LiteralValue, Module, Stmt, UnaryOperator},
    error::RuntimeError,
    interpreter::{
        channel::{ClientChannel, ServerChannel},
        evaluator::{builtins, env::{Env, Frame}},
        value::{Closure, Value},
    },
    util::number_to_port,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// A shared, lockable output sink for `print`/`output`.
pub type Output = Arc<Mutex<dyn Write + Send>>;

/// The non-local control signal produced by executing a statement.
///
/// `break`, `continue`, and `return` unwind the walker to the nearest legal
/// handler: the enclosing loop for the first two, the enclosing call for the
/// last. Everything else continues with `Normal`.
#[derive(Debug)]
pub enum Flow {
    /// Execution continues with the next statement.
    Normal,
    /// Unwind to the enclosing `while` and exit it.
    Break,
    /// Unwind to the enclosing `while` and re-test its condition.
    Continue,
    /// Unwind to the enclosing call with the returned value.
    Return(Value),
}

/// The tree-walking interpreter.
///
/// Holds what is shared by every task of a program: the output sink, whose
/// lock serializes each `print`/`output` call so concurrent tasks never
/// interleave within a single line. All per-task state (the environment
/// chain and the control-flow stack) is passed along the walk, which keeps
/// the walker re-entrant across `par` threads.
pub struct Interp {
    out: Output,
}

#[allow(clippy::new_without_default)]
impl Interp {
    /// Creates an interpreter writing to standard output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_output(Arc::new(Mutex::new(std::io::stdout())))
    }

    /// Creates an interpreter writing to the given sink.
    ///
    /// Used by tests and embedders that capture program output.
    #[must_use]
    pub fn with_output(out: Output) -> Self {
        Self { out }
    }

    /// Executes a checked module from a fresh root environment.
    ///
    /// # Errors
    /// Returns the first [`RuntimeError`] raised by any statement.
    pub fn run(&self, module: &Module) -> EvalResult<()> {
        let env = Frame::root();
        for stmt in &module.stmts {
            self.exec_stmt(stmt, &env)?;
        }
        Ok(())
    }

    /// Executes a statement list, stopping at the first non-normal flow.
    pub(crate) fn exec_block(&self, stmts: &[Stmt], env: &Env) -> EvalResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {},
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Executes a single statement in `env`.
    pub(crate) fn exec_stmt(&self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        match stmt {
            Stmt::Decl { name, ty, init, .. } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::zero_of(ty),
                };
                env.define(name, value);
                Ok(Flow::Normal)
            },
            Stmt::Assign { name, value, .. } => {
                let value = self.eval_expr(value, env)?;
                if !env.assign(name, value.clone()) {
                    // First assignment to an implicitly declared name.
                    env.define(name, value);
                }
                Ok(Flow::Normal)
            },
            Stmt::Expression { expr, .. } => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            },
            Stmt::If { condition,
                       body,
                       else_body,
                       .. } => {
                let chosen = if self.eval_expr(condition, env)?
                                 .as_bool(condition.line_number())?
                {
                    Some(body)
                } else {
                    else_body.as_ref()
                };
                match chosen {
                    Some(stmts) => self.exec_block(stmts, &Frame::child(env)),
                    None => Ok(Flow::Normal),
                }
            },
            Stmt::While { condition, body, .. } => {
                while self.eval_expr(condition, env)?
                          .as_bool(condition.line_number())?
                {
                    match self.exec_block(body, &Frame::child(env))? {
                        Flow::Normal | Flow::Continue => {},
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            },
            Stmt::FuncDef(def) => {
                let closure = Closure { def: def.clone(),
                                        env: Arc::clone(env), };
                env.define(&def.name, Value::Closure(Arc::new(closure)));
                Ok(Flow::Normal)
            },
            Stmt::Par { body, line } => self.exec_par(body, env, *line),
            Stmt::Seq { body, .. } => self.exec_block(body, env),
            Stmt::ChannelDecl { name,
                                kind,
                                host,
                                port,
                                line, } => {
                let host = self.eval_expr(host, env)?
                               .as_str(*line)?
                               .to_string();
                let port = number_to_port(self.eval_expr(port, env)?.as_number(*line)?, *line)?;
                let value = match kind {
                    ChannelKind::Client => {
                        Value::Client(Arc::new(ClientChannel::connect(&host, port, *line)?))
                    },
                    ChannelKind::Server => {
                        Value::Server(Arc::new(ServerChannel::bind(&host, port, *line)?))
                    },
                };
                env.define(name, value);
                Ok(Flow::Normal)
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Unit,
                };
                Ok(Flow::Return(value))
            },
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Continue { .. } => Ok(Flow::Continue),
        }
    }

    /// Evaluates an expression in `env`.
    pub(crate) fn eval_expr(&self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        match expr {
            Expr::Constant { value, .. } => Ok(match value {
                                                   LiteralValue::Number(n) => Value::Number(*n),
                                                   LiteralValue::Str(s) => Value::Str(s.clone()),
                                                   LiteralValue::Bool(b) => Value::Bool(*b),
                                               }),
            Expr::Id { name, line, .. } => {
                env.get(name)
                   .ok_or_else(|| RuntimeError::UnknownVariable { name: name.clone(),
                                                                  line: *line, })
            },
            Expr::Arithmetic { op,
                               left,
                               right,
                               line,
                               .. } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                eval_arithmetic(*op, &lhs, &rhs, *line)
            },
            Expr::Relational { op,
                               left,
                               right,
                               line, } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                eval_relational(*op, &lhs, &rhs, *line)
            },
            Expr::Logical { op,
                            left,
                            right,
                            line, } => {
                let lhs = self.eval_expr(left, env)?.as_bool(*line)?;
                // The right operand only runs when the left side does not
                // already decide the result.
                let result = match op {
                    BinaryOperator::And => lhs && self.eval_expr(right, env)?.as_bool(*line)?,
                    BinaryOperator::Or => lhs || self.eval_expr(right, env)?.as_bool(*line)?,
                    _ => return Err(RuntimeError::ExpectedBool { line: *line }),
                };
                Ok(Value::Bool(result))
            },
            Expr::Unary { op, expr, line, .. } => {
                let value = self.eval_expr(expr, env)?;
                match op {
                    UnaryOperator::Negate => Ok(Value::Number(-value.as_number(*line)?)),
                    UnaryOperator::Not => Ok(Value::Bool(!value.as_bool(*line)?)),
                }
            },
            Expr::Call { callee,
                         args,
                         oper,
                         line,
                         .. } => self.eval_call(callee, args, *oper, *line, env),
        }
    }

    /// Evaluates a call: arguments left to right, then dispatch to a channel
    /// operation, a builtin, or a closure.
    fn eval_call(&self,
                 callee: &str,
                 args: &[Expr],
                 oper: Option<ChannelOp>,
                 line: usize,
                 env: &Env)
                 -> EvalResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }

        if let Some(op) = oper {
            return eval_channel_op(op, &values, line);
        }
        if let Some(def) = builtins::lookup(callee) {
            return (def.func)(self, &values, line);
        }

        match env.get(callee) {
            Some(Value::Closure(closure)) => self.call_closure(&closure, values),
            Some(_) => Err(RuntimeError::NotCallable { name: callee.to_string(),
                                                       line }),
            None => Err(RuntimeError::UnknownVariable { name: callee.to_string(),
                                                        line }),
        }
    }

    /// Calls a closure with already-evaluated arguments.
    ///
    /// A fresh frame is parented at the closure's captured environment
    /// (static scoping). Defaulted parameters are bound first and then
    /// overwritten by the supplied arguments in order. A body that finishes
    /// without an explicit `return` yields the zero value of the declared
    /// return type.
    pub(crate) fn call_closure(&self, closure: &Closure, args: Vec<Value>) -> EvalResult<Value> {
        let frame = Frame::child(&closure.env);

        for param in &closure.def.params {
            if let Some(default) = &param.default {
                let value = self.eval_expr(default, &frame)?;
                frame.define(&param.name, value);
            }
        }
        for (param, value) in closure.def.params.iter().zip(args) {
            frame.define(&param.name, value);
        }

        match self.exec_block(&closure.def.body, &frame)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::zero_of(&closure.def.ret)),
        }
    }

    /// Writes one complete output line under a single lock acquisition.
    pub(crate) fn write_line(&self, text: &str, line: usize) -> EvalResult<()> {
        let mut out = self.out
                          .lock()
                          .unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{text}").map_err(|e| RuntimeError::OutputFailed { details: e.to_string(),
                                                                         line })
    }
}

/// Applies an arithmetic operator to two values.
fn eval_arithmetic(op: BinaryOperator,
                   lhs: &Value,
                   rhs: &Value,
                   line: usize)
                   -> EvalResult<Value> {
    if let (BinaryOperator::Add, Value::Str(a), Value::Str(b)) = (op, lhs, rhs) {
        return Ok(Value::Str(format!("{a}{b}")));
    }

    let a = lhs.as_number(line)?;
    let b = rhs.as_number(line)?;
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { line });
            }
            a / b
        },
        BinaryOperator::Mod => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { line });
            }
            a % b
        },
        _ => return Err(RuntimeError::ExpectedNumber { line }),
    };
    Ok(Value::Number(result))
}

/// Applies an equality or ordering operator to two values.
fn eval_relational(op: BinaryOperator,
                   lhs: &Value,
                   rhs: &Value,
                   line: usize)
                   -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Equal => lhs == rhs,
        BinaryOperator::NotEqual => lhs != rhs,
        _ => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => return Err(RuntimeError::ExpectedNumber { line }),
            };
            let Some(ordering) = ordering else {
                // NaN comparisons are false, as in the host language.
                return Ok(Value::Bool(false));
            };
            match op {
                BinaryOperator::Less => ordering.is_lt(),
                BinaryOperator::LessEqual => ordering.is_le(),
                BinaryOperator::Greater => ordering.is_gt(),
                BinaryOperator::GreaterEqual => ordering.is_ge(),
                _ => return Err(RuntimeError::ExpectedNumber { line }),
            }
        },
    };
    Ok(Value::Bool(result))
}

/// Dispatches a channel operation on its evaluated arguments.
fn eval_channel_op(op: ChannelOp, values: &[Value], line: usize) -> EvalResult<Value> {
    match op {
        ChannelOp::Accept => match values.first() {
            Some(Value::Server(server)) => {
                Ok(Value::Client(Arc::new(server.accept(line)?)))
            },
            _ => Err(RuntimeError::ExpectedChannel { line }),
        },
        ChannelOp::Send => match values.first() {
            Some(Value::Client(client)) => {
                let text = values.get(1)
                                 .ok_or(RuntimeError::ExpectedString { line })?
                                 .as_str(line)?;
                client.send(text, line)?;
                Ok(Value::Unit)
            },
            _ => Err(RuntimeError::ExpectedChannel { line }),
        },
        ChannelOp::Recv => match values.first() {
            Some(Value::Client(client)) => Ok(Value::Str(client.recv(line)?)),
            _ => Err(RuntimeError::ExpectedChannel { line }),
        },
        ChannelOp::Close => match values.first() {
            Some(Value::Client(client)) => {
                client.close();
                Ok(Value::Unit)
            },
            Some(Value::Server(server)) => {
                server.close();
                Ok(Value::Unit)
            },
            _ => Err(RuntimeError::ExpectedChannel { line }),
        },
    }
}

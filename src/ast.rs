use std::fmt::Write as _;

/// The closed set of types a Minipar expression or binding can have.
///
/// Every expression node in the syntax tree carries one of these, resolved
/// while parsing. `Func` additionally carries the full call signature so the
/// parser can check arity and argument types at every call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A 64-bit floating-point number. Integral values print without a
    /// decimal part.
    Number,
    /// An immutable text value.
    Str,
    /// A boolean value, `true` or `false`.
    Bool,
    /// The absence of a value. Only valid as a function return type.
    Void,
    /// A function, with its parameter types and return type.
    Func(FuncSig),
    /// A connected client channel (or an accepted server-side connection).
    CChannel,
    /// A listening server channel.
    SChannel,
}

/// The call signature carried by [`Type::Func`].
#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    /// Ordered parameter types.
    pub params:   Vec<Type>,
    /// How many leading parameters have no default and must be supplied.
    pub required: usize,
    /// The declared return type.
    pub ret:      Box<Type>,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Number => "number",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Void => "void",
            Self::Func(_) => "func",
            Self::CChannel => "c_channel",
            Self::SChannel => "s_channel",
        };
        write!(f, "{name}")
    }
}

/// A literal constant as it appears in source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A numeric literal such as `3` or `0.5`.
    Number(f64),
    /// A double-quoted string literal, stored without the quotes.
    Str(String),
    /// `true` or `false`.
    Bool(bool),
}

/// Represents a binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition (`+`); also string concatenation.
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
    /// Less than (`<`)
    Less,
    /// Greater than (`>`)
    Greater,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Equal to (`==`)
    Equal,
    /// Not equal to (`!=`)
    NotEqual,
    /// Logical and (`&&`), short-circuiting.
    And,
    /// Logical or (`||`), short-circuiting.
    Or,
}

impl BinaryOperator {
    /// The token tag used in token and tree dumps.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Add => "PLUS",
            Self::Sub => "MINUS",
            Self::Mul => "MULT",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Less => "LT",
            Self::Greater => "GT",
            Self::LessEqual => "LTE",
            Self::GreaterEqual => "GTE",
            Self::Equal => "EQ",
            Self::NotEqual => "NEQ",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
        };
        write!(f, "{operator}")
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Logical NOT (`!x`).
    Not,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::Not => write!(f, "!"),
        }
    }
}

/// The channel operation resolved on a [`Expr::Call`] node whose callee is
/// one of the channel builtins.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelOp {
    /// Block until a client connects; yields the connection.
    Accept,
    /// Write one line-framed message.
    Send,
    /// Read one line-framed message.
    Recv,
    /// Release the underlying socket. Idempotent.
    Close,
}

impl ChannelOp {
    /// Resolves a call name to a channel operation, if it is one.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "accept" => Some(Self::Accept),
            "send" => Some(Self::Send),
            "recv" => Some(Self::Recv),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    /// The source-level name of the operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Send => "send",
            Self::Recv => "recv",
            Self::Close => "close",
        }
    }
}

/// Whether a channel declaration connects out or listens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// `c_channel`: connect a TCP client socket.
    Client,
    /// `s_channel`: bind a TCP listener.
    Server,
}

/// An abstract syntax tree node representing an expression.
///
/// Every variant carries the resolved [`Type`] assigned while parsing and
/// the line of its originating token, so later phases never have to guess
/// either.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant.
    Constant {
        /// The constant value.
        value: LiteralValue,
        /// Resolved type of the literal.
        ty:    Type,
        /// Line number in the source code.
        line:  usize,
    },
    /// Reference to a variable by name.
    Id {
        /// Name of the variable.
        name: String,
        /// Declared type of the binding.
        ty:   Type,
        /// Line number in the source code.
        line: usize,
    },
    /// An arithmetic operation on numbers (or `+` on strings).
    Arithmetic {
        /// The operator.
        op:    BinaryOperator,
        /// Left operand.
        left:  Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Resolved result type.
        ty:    Type,
        /// Line number in the source code.
        line:  usize,
    },
    /// An ordering or equality comparison, yielding `bool`.
    Relational {
        /// The operator.
        op:    BinaryOperator,
        /// Left operand.
        left:  Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Line number in the source code.
        line:  usize,
    },
    /// A short-circuiting boolean connective.
    Logical {
        /// The operator, `&&` or `||`.
        op:    BinaryOperator,
        /// Left operand.
        left:  Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Line number in the source code.
        line:  usize,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op:   UnaryOperator,
        /// The operand expression.
        expr: Box<Expr>,
        /// Resolved result type.
        ty:   Type,
        /// Line number in the source code.
        line: usize,
    },
    /// A call to a builtin, a declared function, or a channel operation.
    Call {
        /// Name of the callee.
        callee: String,
        /// Argument expressions, in source order.
        args:   Vec<Expr>,
        /// Set when the callee is a channel operation.
        oper:   Option<ChannelOp>,
        /// Resolved result type.
        ty:     Type,
        /// Line number in the source code.
        line:   usize,
    },
}

impl Expr {
    /// The resolved type of this expression.
    #[must_use]
    pub fn ty(&self) -> &Type {
        static BOOL: Type = Type::Bool;
        match self {
            Self::Constant { ty, .. }
            | Self::Id { ty, .. }
            | Self::Arithmetic { ty, .. }
            | Self::Unary { ty, .. }
            | Self::Call { ty, .. } => ty,
            Self::Relational { .. } | Self::Logical { .. } => &BOOL,
        }
    }

    /// Gets the line number from `self`.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Constant { line, .. }
            | Self::Id { line, .. }
            | Self::Arithmetic { line, .. }
            | Self::Relational { line, .. }
            | Self::Logical { line, .. }
            | Self::Unary { line, .. }
            | Self::Call { line, .. } => *line,
        }
    }
}

/// One declared function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The parameter name.
    pub name:    String,
    /// The declared parameter type.
    pub ty:      Type,
    /// Optional default value; calls may omit trailing defaulted arguments.
    pub default: Option<Expr>,
}

/// A function definition, shared between the syntax tree and closures.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    /// The function name.
    pub name:   String,
    /// The declared parameters, in order.
    pub params: Vec<Param>,
    /// The declared return type.
    pub ret:    Type,
    /// The statements of the body.
    pub body:   Vec<Stmt>,
    /// Line number in the source code.
    pub line:   usize,
}

/// An abstract syntax tree node representing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A variable declaration, `name: type` with an optional initializer.
    /// Without an initializer the variable starts at the zero value of its
    /// type.
    Decl {
        /// The declared name.
        name: String,
        /// The declared type.
        ty:   Type,
        /// Optional initializer expression.
        init: Option<Expr>,
        /// Line number in the source code.
        line: usize,
    },
    /// An assignment to an existing (or implicitly declared) binding.
    Assign {
        /// The target name.
        name:  String,
        /// The assigned expression.
        value: Expr,
        /// The type of the target binding.
        ty:    Type,
        /// Line number in the source code.
        line:  usize,
    },
    /// A call evaluated for its effects, with the result discarded.
    Expression {
        /// The call expression.
        expr: Expr,
        /// Line number in the source code.
        line: usize,
    },
    /// A conditional with an optional `else` branch.
    If {
        /// The condition; must be `bool`.
        condition: Expr,
        /// Statements of the `if` branch.
        body:      Vec<Stmt>,
        /// Statements of the `else` branch, when present.
        else_body: Option<Vec<Stmt>>,
        /// Line number in the source code.
        line:      usize,
    },
    /// A `while` loop.
    While {
        /// The condition; must be `bool`.
        condition: Expr,
        /// Statements of the loop body.
        body:      Vec<Stmt>,
        /// Line number in the source code.
        line:      usize,
    },
    /// A function definition.
    FuncDef(FuncDef),
    /// A block whose direct children run as parallel tasks, joined at the
    /// closing brace.
    Par {
        /// The child statements, one task each.
        body: Vec<Stmt>,
        /// Line number in the source code.
        line: usize,
    },
    /// A block whose children run in source order.
    Seq {
        /// The child statements.
        body: Vec<Stmt>,
        /// Line number in the source code.
        line: usize,
    },
    /// A channel declaration binding a client or server endpoint.
    ChannelDecl {
        /// The channel name.
        name: String,
        /// Client or server.
        kind: ChannelKind,
        /// Host expression; must be `string`.
        host: Expr,
        /// Port expression; must be `number`.
        port: Expr,
        /// Line number in the source code.
        line: usize,
    },
    /// Return from the enclosing function, with an optional value.
    Return {
        /// The returned expression, when present.
        value: Option<Expr>,
        /// Line number in the source code.
        line:  usize,
    },
    /// Exit the enclosing `while` loop.
    Break {
        /// Line number in the source code.
        line: usize,
    },
    /// Restart the enclosing `while` loop at its condition.
    Continue {
        /// Line number in the source code.
        line: usize,
    },
}

/// The root node: an ordered list of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Top-level statements in source order.
    pub stmts: Vec<Stmt>,
}

/// Renders a module as an indented tree, one node per line.
///
/// Each line shows the node kind, its originating token as `{lexeme, TAG}`,
/// the source line, and the resolved type where the node has one. Children
/// follow in declared field order, indented by two spaces.
#[must_use]
pub fn dump(module: &Module) -> String {
    let mut out = String::from("Module\n");
    for stmt in &module.stmts {
        dump_stmt(stmt, 1, &mut out);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    // Expression statements have no wrapper node of their own.
    if let Stmt::Expression { expr, .. } = stmt {
        dump_expr(expr, depth, out);
        return;
    }
    indent(depth, out);
    match stmt {
        Stmt::Decl { name,
                     ty,
                     init,
                     line, } => {
            let _ = writeln!(out, "Decl({{{name}, ID}}, line {line}) : {ty}");
            if let Some(init) = init {
                dump_expr(init, depth + 1, out);
            }
        },
        Stmt::Assign { name,
                       value,
                       ty,
                       line, } => {
            let _ = writeln!(out, "Assign({{{name}, ID}}, line {line}) : {ty}");
            dump_expr(value, depth + 1, out);
        },
        Stmt::Expression { .. } => {},
        Stmt::If { condition,
                   body,
                   else_body,
                   line, } => {
            let _ = writeln!(out, "If({{if, IF}}, line {line})");
            dump_expr(condition, depth + 1, out);
            for stmt in body {
                dump_stmt(stmt, depth + 1, out);
            }
            if let Some(else_body) = else_body {
                indent(depth, out);
                let _ = writeln!(out, "Else({{else, ELSE}}, line {line})");
                for stmt in else_body {
                    dump_stmt(stmt, depth + 1, out);
                }
            }
        },
        Stmt::While { condition,
                      body,
                      line, } => {
            let _ = writeln!(out, "While({{while, WHILE}}, line {line})");
            dump_expr(condition, depth + 1, out);
            for stmt in body {
                dump_stmt(stmt, depth + 1, out);
            }
        },
        Stmt::FuncDef(def) => {
            let _ = writeln!(out,
                             "FuncDef({{{}, ID}}, line {}) -> {}",
                             def.name, def.line, def.ret);
            for param in &def.params {
                indent(depth + 1, out);
                let _ = writeln!(out, "Param({{{}, ID}}) : {}", param.name, param.ty);
                if let Some(default) = &param.default {
                    dump_expr(default, depth + 2, out);
                }
            }
            for stmt in &def.body {
                dump_stmt(stmt, depth + 1, out);
            }
        },
        Stmt::Par { body, line } => {
            let _ = writeln!(out, "Par({{par, PAR}}, line {line})");
            for stmt in body {
                dump_stmt(stmt, depth + 1, out);
            }
        },
        Stmt::Seq { body, line } => {
            let _ = writeln!(out, "Seq({{seq, SEQ}}, line {line})");
            for stmt in body {
                dump_stmt(stmt, depth + 1, out);
            }
        },
        Stmt::ChannelDecl { name,
                            kind,
                            host,
                            port,
                            line, } => {
            let (keyword, tag, ty) = match kind {
                ChannelKind::Client => ("c_channel", "C_CHANNEL", Type::CChannel),
                ChannelKind::Server => ("s_channel", "S_CHANNEL", Type::SChannel),
            };
            let _ = writeln!(out, "ChannelDecl({{{keyword} {name}, {tag}}}, line {line}) : {ty}");
            dump_expr(host, depth + 1, out);
            dump_expr(port, depth + 1, out);
        },
        Stmt::Return { value, line } => {
            let _ = writeln!(out, "Return({{return, RETURN}}, line {line})");
            if let Some(value) = value {
                dump_expr(value, depth + 1, out);
            }
        },
        Stmt::Break { line } => {
            let _ = writeln!(out, "Break({{break, BREAK}}, line {line})");
        },
        Stmt::Continue { line } => {
            let _ = writeln!(out, "Continue({{continue, CONTINUE}}, line {line})");
        },
    }
}

fn dump_expr(expr: &Expr, depth: usize, out: &mut String) {
    indent(depth, out);
    match expr {
        Expr::Constant { value, ty, line } => {
            let (lexeme, tag) = match value {
                LiteralValue::Number(n) => (crate::util::format_number(*n), "NUMBER"),
                LiteralValue::Str(s) => (format!("\"{s}\""), "STRING"),
                LiteralValue::Bool(b) => (b.to_string(), "BOOL"),
            };
            let _ = writeln!(out, "Constant({{{lexeme}, {tag}}}, line {line}) : {ty}");
        },
        Expr::Id { name, ty, line } => {
            let _ = writeln!(out, "Id({{{name}, ID}}, line {line}) : {ty}");
        },
        Expr::Arithmetic { op,
                           left,
                           right,
                           ty,
                           line, } => {
            let _ = writeln!(out, "Arithmetic({{{op}, {}}}, line {line}) : {ty}", op.tag());
            dump_expr(left, depth + 1, out);
            dump_expr(right, depth + 1, out);
        },
        Expr::Relational { op,
                           left,
                           right,
                           line, } => {
            let _ = writeln!(out, "Relational({{{op}, {}}}, line {line}) : bool", op.tag());
            dump_expr(left, depth + 1, out);
            dump_expr(right, depth + 1, out);
        },
        Expr::Logical { op,
                        left,
                        right,
                        line, } => {
            let _ = writeln!(out, "Logical({{{op}, {}}}, line {line}) : bool", op.tag());
            dump_expr(left, depth + 1, out);
            dump_expr(right, depth + 1, out);
        },
        Expr::Unary { op, expr, ty, line } => {
            let tag = match op {
                UnaryOperator::Negate => "MINUS",
                UnaryOperator::Not => "NOT",
            };
            let _ = writeln!(out, "Unary({{{op}, {tag}}}, line {line}) : {ty}");
            dump_expr(expr, depth + 1, out);
        },
        Expr::Call { callee,
                     args,
                     oper,
                     ty,
                     line, } => {
            match oper {
                Some(op) => {
                    let _ = writeln!(out,
                                     "Call({{{callee}, ID}}, line {line}, oper {}) : {ty}",
                                     op.name());
                },
                None => {
                    let _ = writeln!(out, "Call({{{callee}, ID}}, line {line}) : {ty}");
                },
            }
            for arg in args {
                dump_expr(arg, depth + 1, out);
            }
        },
    }
}

use std::sync::Arc;

use crate::{
    ast::{FuncDef, Type},
    interpreter::{
        channel::{ClientChannel, ServerChannel},
        evaluator::env::Env,
    },
    util::format_number,
};

/// Represents a runtime value in the interpreter.
///
/// The variants mirror the language's type set: numbers are 64-bit floats,
/// strings are immutable text, `Unit` is the `void` non-value produced by
/// statements and void calls. Functions and channels are handles shared by
/// reference, so cloning a `Value` is always cheap enough to pass across
/// `par` task boundaries.
#[derive(Clone)]
pub enum Value {
    /// A numeric value (double precision floating-point).
    Number(f64),
    /// A string value.
    Str(String),
    /// A boolean value, `true` or `false`.
    Bool(bool),
    /// The result of a `void` expression position; never observable in a
    /// well-typed program.
    Unit,
    /// A function closure.
    Closure(Arc<Closure>),
    /// A connected client channel or accepted connection.
    Client(Arc<ClientChannel>),
    /// A listening server channel.
    Server(Arc<ServerChannel>),
}

/// A function value: the definition bundled with the environment in effect
/// at its definition site.
///
/// The environment is captured by reference, so assignments to outer
/// variables made after capture are observable inside the closure.
pub struct Closure {
    /// The function definition (name, parameters, return type, body).
    pub def: FuncDef,
    /// The captured defining environment.
    pub env: Env,
}

impl Value {
    /// The zero value of a declared type: `0`, `""`, `false`, or unit.
    ///
    /// Used for declarations without an initializer and for non-void
    /// functions that finish without an explicit `return`.
    #[must_use]
    pub fn zero_of(ty: &Type) -> Self {
        match ty {
            Type::Number => Self::Number(0.0),
            Type::Str => Self::Str(String::new()),
            Type::Bool => Self::Bool(false),
            _ => Self::Unit,
        }
    }

    /// Extracts the numeric value.
    ///
    /// # Errors
    /// Returns `RuntimeError::ExpectedNumber` for any other variant.
    pub fn as_number(&self, line: usize) -> crate::interpreter::evaluator::core::EvalResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => Err(crate::error::RuntimeError::ExpectedNumber { line }),
        }
    }

    /// Extracts the string value.
    ///
    /// # Errors
    /// Returns `RuntimeError::ExpectedString` for any other variant.
    pub fn as_str(&self, line: usize) -> crate::interpreter::evaluator::core::EvalResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            _ => Err(crate::error::RuntimeError::ExpectedString { line }),
        }
    }

    /// Extracts the boolean value.
    ///
    /// # Errors
    /// Returns `RuntimeError::ExpectedBool` for any other variant.
    pub fn as_bool(&self, line: usize) -> crate::interpreter::evaluator::core::EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(crate::error::RuntimeError::ExpectedBool { line }),
        }
    }
}

impl PartialEq for Value {
    /// Primitive values compare by content; function and channel handles
    /// compare by identity. Values of different variants are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Unit, Self::Unit) => true,
            (Self::Closure(a), Self::Closure(b)) => Arc::ptr_eq(a, b),
            (Self::Client(a), Self::Client(b)) => Arc::ptr_eq(a, b),
            (Self::Server(a), Self::Server(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    /// Closures and channels print as opaque handles; the captured
    /// environment is never walked, because closure environments can contain
    /// the closure itself.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Unit => write!(f, "Unit"),
            Self::Closure(c) => write!(f, "Closure({})", c.def.name),
            Self::Client(_) => write!(f, "Client(..)"),
            Self::Server(_) => write!(f, "Server(..)"),
        }
    }
}

impl std::fmt::Display for Value {
    /// The canonical printed form used by `print` and `output`: numbers
    /// without trailing zeros when integral, booleans as `true`/`false`,
    /// strings verbatim.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Unit => write!(f, "void"),
            Self::Closure(c) => write!(f, "<func {}>", c.def.name),
            Self::Client(_) => write!(f, "<c_channel>"),
            Self::Server(_) => write!(f, "<s_channel>"),
        }
    }
}

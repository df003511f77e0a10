use std::io::BufRead;

use crate::{
    ast::{ChannelOp, Type},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Interp},
        value::Value,
    },
    util,
};

/// Type alias for builtin function handlers.
///
/// A builtin receives the interpreter (for output access), a slice of
/// evaluated argument values, and the call's line number.
pub type BuiltinFn = fn(&Interp, &[Value], usize) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a builtin.
#[derive(Clone, Copy)]
pub enum Arity {
    /// The builtin must receive exactly this many arguments.
    Exact(usize),
    /// The builtin accepts this many arguments or more.
    AtLeast(usize),
}

impl Arity {
    /// Tests whether the given argument count satisfies this constraint.
    #[must_use]
    pub const fn check(&self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == *m,
            Self::AtLeast(m) => n >= *m,
        }
    }
}

/// Specifies the argument types a builtin accepts, checked while parsing.
#[derive(Clone, Copy)]
pub enum ParamTypes {
    /// Any non-void argument types (used by the variadic print builtins).
    Any,
    /// Positional argument types; the argument count is governed by the
    /// arity.
    Exact(&'static [Type]),
}

/// One entry of the builtin registry.
pub struct BuiltinDef {
    /// The source-level name.
    pub name:   &'static str,
    /// Accepted argument counts.
    pub arity:  Arity,
    /// Accepted argument types.
    pub params: ParamTypes,
    /// The call's result type.
    pub ret:    Type,
    /// The handler run by the evaluator.
    pub func:   BuiltinFn,
}

/// Defines the builtin registry: a static lookup table consulted by the
/// parser for signatures and by the evaluator for dispatch.
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                params: $params:expr,
                ret: $ret:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        static BUILTIN_TABLE: &[BuiltinDef] = &[
            $(
                BuiltinDef { name: $name, arity: $arity, params: $params, ret: $ret, func: $func },
            )*
        ];
    };
}

builtin_functions! {
    "print"     => { arity: Arity::AtLeast(0), params: ParamTypes::Any,
                     ret: Type::Void,   func: print },
    "output"    => { arity: Arity::AtLeast(0), params: ParamTypes::Any,
                     ret: Type::Void,   func: print },
    "input"     => { arity: Arity::Exact(0),   params: ParamTypes::Exact(&[]),
                     ret: Type::Str,    func: input },
    "to_number" => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Str]),
                     ret: Type::Number, func: to_number },
    "to_string" => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Number]),
                     ret: Type::Str,    func: to_string },
    "to_bool"   => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Str]),
                     ret: Type::Bool,   func: to_bool },
    "length"    => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Str]),
                     ret: Type::Number, func: length },
    "isalpha"   => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Str]),
                     ret: Type::Bool,   func: isalpha },
    "isnum"     => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Str]),
                     ret: Type::Bool,   func: isnum },
    "exp"       => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Number]),
                     ret: Type::Number, func: exp },
    "sqrt"      => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Number]),
                     ret: Type::Number, func: sqrt },
    "sleep"     => { arity: Arity::Exact(1),   params: ParamTypes::Exact(&[Type::Number]),
                     ret: Type::Void,   func: sleep },
}

/// Finds the registry entry for `name`, if it is a builtin.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static BuiltinDef> {
    BUILTIN_TABLE.iter().find(|def| def.name == name)
}

/// Whether `name` is reserved for a builtin or a channel operation and can
/// therefore not be declared by a program.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    lookup(name).is_some() || ChannelOp::from_name(name).is_some()
}

/// Converts each argument to its canonical string form and writes them,
/// space-separated, as one line. The whole line is written under a single
/// lock acquisition so concurrent tasks never interleave within one call.
fn print(interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    let text = args.iter()
                   .map(ToString::to_string)
                   .collect::<Vec<_>>()
                   .join(" ");
    interp.write_line(&text, line)?;
    Ok(Value::Unit)
}

/// Reads one line from standard input, without the trailing newline.
fn input(_interp: &Interp, _args: &[Value], line: usize) -> EvalResult<Value> {
    let mut buffer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut buffer)
        .map_err(|e| RuntimeError::InputFailed { details: e.to_string(),
                                                 line })?;
    if buffer.ends_with('\n') {
        buffer.pop();
        if buffer.ends_with('\r') {
            buffer.pop();
        }
    }
    Ok(Value::Str(buffer))
}

/// Parses a string as a number.
fn to_number(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    let text = args[0].as_str(line)?;
    text.trim()
        .parse::<f64>()
        .map(Value::Number)
        .map_err(|_| RuntimeError::ConversionFailure { value:  text.to_string(),
                                                       target: "number",
                                                       line })
}

/// Formats a number in its canonical string form.
fn to_string(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    Ok(Value::Str(util::format_number(args[0].as_number(line)?)))
}

/// Parses `"true"` or `"false"`; anything else is a conversion error.
fn to_bool(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    match args[0].as_str(line)? {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        other => Err(RuntimeError::ConversionFailure { value:  other.to_string(),
                                                       target: "bool",
                                                       line }),
    }
}

/// The number of characters in a string.
#[allow(clippy::cast_precision_loss)]
fn length(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    Ok(Value::Number(args[0].as_str(line)?.chars().count() as f64))
}

/// Whether the string is non-empty and entirely alphabetic.
fn isalpha(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    let text = args[0].as_str(line)?;
    Ok(Value::Bool(!text.is_empty() && text.chars().all(char::is_alphabetic)))
}

/// Whether the string is non-empty and entirely decimal digits.
fn isnum(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    let text = args[0].as_str(line)?;
    Ok(Value::Bool(!text.is_empty() && text.chars().all(|c| c.is_ascii_digit())))
}

/// The natural exponential.
fn exp(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    Ok(Value::Number(args[0].as_number(line)?.exp()))
}

/// The square root.
fn sqrt(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    Ok(Value::Number(args[0].as_number(line)?.sqrt()))
}

/// Suspends the current task for the given number of seconds.
fn sleep(_interp: &Interp, args: &[Value], line: usize) -> EvalResult<Value> {
    let millis = util::number_to_millis(args[0].as_number(line)?, line)?;
    std::thread::sleep(std::time::Duration::from_millis(millis));
    Ok(Value::Unit)
}

//! # minipar
//!
//! minipar is an interpreter for the Minipar language: a small
//! statically-typed imperative language with first-class parallel execution
//! blocks (`par`/`seq`) and socket-based client/server channels.
//!
//! Interpretation runs in three phases. The lexer turns source text into a
//! token stream with line numbers, the parser builds a type-annotated
//! syntax tree while enforcing declaration and typing rules, and the
//! evaluator walks the tree, launching one task per `par` child and
//! exchanging line-framed messages over TCP channels.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

use log::debug;

use crate::{
    ast::Module,
    error::{Error, LexError},
    interpreter::{
        evaluator::core::{Interp, Output},
        lexer::{Token, scan},
    },
};

/// Defines the structure of parsed code.
///
/// This module declares the type set, the `Expr` and `Stmt` enums that
/// represent source code as a tree, and the indented tree dump. Every
/// expression node carries its resolved type and originating line, so the
/// evaluator never re-derives either.
pub mod ast;
/// Provides unified error types for every phase.
///
/// Lexical, parse/type, and runtime failures each have their own enum with
/// line numbers and human-readable messages, plus an umbrella [`Error`] that
/// maps each phase onto its process exit code.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// Ties together lexing, parsing, evaluation, values, channels, and the
/// concurrency runtime.
pub mod interpreter;
/// The compile-time symbol table.
///
/// A scope stack mapping names to declared types, entered and exited on
/// block boundaries by the parser. It mirrors the frame structure the
/// evaluator builds at runtime.
pub mod symtable;
/// General utilities: canonical number formatting and checked numeric
/// conversions.
pub mod util;

/// Tokenizes a program into `(token, line)` pairs.
///
/// # Errors
/// Returns a [`LexError`] for malformed input.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, LexError> {
    scan(source)
}

/// Tokenizes and parses a program into a type-checked [`Module`].
///
/// # Errors
/// Returns [`Error::Lex`] or [`Error::Parse`] on the first failure.
///
/// # Examples
/// ```
/// use minipar::parse_program;
///
/// assert!(parse_program("x: number = 3\nprint(x)").is_ok());
///
/// // `y` is never declared.
/// assert!(parse_program("print(y)").is_err());
/// ```
pub fn parse_program(source: &str) -> Result<Module, Error> {
    let tokens = scan(source)?;
    debug!("lexed {} tokens", tokens.len());
    Ok(interpreter::parser::core::parse(&tokens)?)
}

/// Parses and executes a program, writing output to standard output.
///
/// # Errors
/// Returns the first error of any phase; [`Error::exit_code`] maps it to
/// the conventional process exit code.
///
/// # Examples
/// ```
/// use minipar::run_program;
///
/// assert!(run_program("n: number = 2 + 2").is_ok());
/// assert!(run_program("n: number = 1 / 0").is_err());
/// ```
pub fn run_program(source: &str) -> Result<(), Error> {
    let module = parse_program(source)?;
    Interp::new().run(&module)?;
    Ok(())
}

/// Parses and executes a program, writing output to the given sink.
///
/// Tests and embedders use this to capture everything the program prints.
///
/// # Errors
/// Returns the first error of any phase.
pub fn run_program_with_output(source: &str, out: Output) -> Result<(), Error> {
    let module = parse_program(source)?;
    Interp::with_output(out).run(&module)?;
    Ok(())
}

/// Lexical errors.
///
/// Defines the error type raised while splitting source text into tokens,
/// covering unterminated literals and comments as well as characters that
/// belong to no token.
pub mod lex_error;
/// Parsing errors.
///
/// Defines all error types that can occur while building the syntax tree:
/// grammar violations, type mismatches, scope violations, and misplaced
/// control-flow statements.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised during evaluation, such as
/// division by zero, failed conversions, and channel or socket failures.
pub mod runtime_error;

pub use lex_error::LexError;
pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Any error a program can fail with, tagged by the phase that raised it.
///
/// The variant determines the process exit code reported by the command-line
/// front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The source could not be tokenized.
    Lex(LexError),
    /// The token stream could not be parsed or failed type checking.
    Parse(ParseError),
    /// The program aborted during execution.
    Runtime(RuntimeError),
}

impl Error {
    /// The process exit code associated with this error's phase.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Lex(_) => 1,
            Self::Parse(_) => 2,
            Self::Runtime(_) => 3,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e) => e.fmt(f),
            Self::Parse(e) => e.fmt(f),
            Self::Runtime(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur during evaluation.
pub enum RuntimeError {
    /// Tried to read a variable with no binding in any live frame.
    UnknownVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to call a name that is not bound to a function value.
    NotCallable {
        /// The name of the called binding.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A number was expected, but another value was found.
    ExpectedNumber {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A string was expected, but another value was found.
    ExpectedString {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A boolean was expected, but another value was found.
    ExpectedBool {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A channel handle was expected, but another value was found.
    ExpectedChannel {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Attempted division or modulo by zero.
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Attempted to send or receive on a channel that was already closed.
    ChannelClosed {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A socket operation failed at the OS level.
    SocketIo {
        /// Description of the underlying I/O failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A value could not be converted to the requested type.
    ConversionFailure {
        /// The value that failed to convert.
        value:  String,
        /// The target type name.
        target: &'static str,
        /// The source line where the error occurred.
        line:   usize,
    },
    /// A channel declaration was given a port outside `0..=65535`.
    InvalidPort {
        /// The rejected port value.
        port: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Reading from standard input failed.
    InputFailed {
        /// Description of the underlying I/O failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Writing program output failed.
    OutputFailed {
        /// Description of the underlying I/O failure.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A parallel task aborted without reporting an error of its own.
    TaskFailed {
        /// The source line of the enclosing `par` block.
        line: usize,
    },
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownVariable { name, line } => {
                write!(f, "Error on line {line}: Unknown variable '{name}'.")
            },
            Self::NotCallable { name, line } => {
                write!(f, "Error on line {line}: '{name}' is not a function.")
            },
            Self::ExpectedNumber { line } => write!(f, "Error on line {line}: Expected a number."),
            Self::ExpectedString { line } => write!(f, "Error on line {line}: Expected a string."),
            Self::ExpectedBool { line } => write!(f, "Error on line {line}: Expected a boolean."),
            Self::ExpectedChannel { line } => {
                write!(f, "Error on line {line}: Expected a channel.")
            },
            Self::DivisionByZero { line } => write!(f, "Error on line {line}: Division by zero."),
            Self::ChannelClosed { line } => write!(f, "Error on line {line}: Channel closed."),
            Self::SocketIo { details, line } => {
                write!(f, "Error on line {line}: Socket error: {details}.")
            },
            Self::ConversionFailure { value,
                                      target,
                                      line, } => {
                write!(f, "Error on line {line}: Cannot convert '{value}' to {target}.")
            },
            Self::InvalidPort { port, line } => {
                write!(f, "Error on line {line}: Invalid port '{port}'.")
            },
            Self::InputFailed { details, line } => {
                write!(f, "Error on line {line}: Failed to read input: {details}.")
            },
            Self::OutputFailed { details, line } => {
                write!(f, "Error on line {line}: Failed to write output: {details}.")
            },
            Self::TaskFailed { line } => {
                write!(f, "Error on line {line}: A parallel task aborted.")
            },
        }
    }
}

impl std::error::Error for RuntimeError {}

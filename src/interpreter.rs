/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text and produces a stream of tokens with
/// line numbers, each corresponding to a meaningful language element such as
/// a literal, identifier, keyword, operator, or delimiter. This is the first
/// stage of interpretation.
///
/// # Responsibilities
/// - Converts the input character stream into tokens with source location.
/// - Handles numeric, string and boolean literals, identifiers, keywords,
///   operators (maximal munch), and both comment styles.
/// - Reports lexical errors for malformed input.
pub mod lexer;

/// The parser module builds the typed abstract syntax tree from tokens.
///
/// The parser processes the token stream produced by the lexer and
/// constructs an AST by recursive descent, with precedence encoded in the
/// grammar layering. Type checking is inline: every expression node leaves
/// the parser annotated with its resolved type, and scope and signature
/// violations abort the parse.
///
/// # Responsibilities
/// - Converts tokens into structured AST nodes.
/// - Maintains the symbol table across block scopes.
/// - Validates grammar, types, scopes, and control-flow placement.
pub mod parser;

/// The evaluator module executes AST nodes and computes results.
///
/// The evaluator traverses the checked AST, evaluates expressions, executes
/// statements against a tree of environment frames, and drives the
/// `par`/`seq` concurrency runtime. It is the core execution engine of the
/// interpreter.
///
/// # Responsibilities
/// - Evaluates AST nodes, performing all supported operations.
/// - Manages the shared environment, closures, and control flow.
/// - Runs `par` children as joined parallel tasks.
/// - Reports runtime errors such as division by zero or channel failures.
pub mod evaluator;

/// The value module defines the runtime data types for evaluation.
///
/// Declares the `Value` enum used during execution: numbers, strings,
/// booleans, the void unit, function closures, and channel handles.
pub mod value;

/// The channel module implements the TCP endpoints behind channel values.
///
/// Server channels bind a listener and accept per-client connections;
/// client channels connect outward. Both exchange line-framed UTF-8
/// messages and own their socket exclusively.
pub mod channel;

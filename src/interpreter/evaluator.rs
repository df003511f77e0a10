/// Core evaluation logic and the interpreter state.
///
/// Contains the statement and expression walkers, function-call handling,
/// and the control-flow signal type used to unwind `break`, `continue`, and
/// `return`.
pub mod core;

/// Environment frames.
///
/// Defines the parent-linked frame tree shared by closures and parallel
/// tasks, with locked slot maps for safe concurrent mutation.
pub mod env;

/// The `par`/`seq` block runtime.
///
/// Spawns one task per `par` child, joins them at the closing brace, and
/// propagates the first failure in child order.
pub mod par;

/// Builtin functions.
///
/// Declares the static builtin table shared by the parser (for signatures)
/// and the evaluator (for dispatch), and implements each builtin.
pub mod builtins;

use std::fmt;

/// Errors that can escape the interpreter at the Rust level.
#[derive(Debug, Clone)]
pub enum SchemeError {
    /// A name had no binding in the current environment chain.
    UnboundName(String),

    /// A call supplied the wrong number of arguments.
    ArityMismatch(String),

    /// Attempted to apply a value that is not callable.
    NotAFunction(String),

    /// An operand had the wrong type (e.g. car of a non-pair).
    TypeMismatch(String),

    /// Walked onto the dotted tail of an improper list.
    ImproperList(String),

    /// Malformed source text.
    Reader(String),

    /// Signalled by user code via the `error` primitive.
    /// The message is surfaced verbatim, without any trace text.
    User(String),

    /// Any other evaluator error, annotated with the pending
    /// continuation as a pseudo stack trace.
    Traced {
        error: Box<SchemeError>,
        continuation: String,
    },

    /// I/O failure from the host line source or output sink.
    Io(String),

    /// Internal interpreter error (should not happen in correct code).
    Internal(String),
}

impl fmt::Display for SchemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeError::UnboundName(name) => write!(f, "Error: unbound variable '{}'", name),
            SchemeError::ArityMismatch(msg) => write!(f, "Error: arity mismatch: {}", msg),
            SchemeError::NotAFunction(what) => write!(f, "Error: not a function: {}", what),
            SchemeError::TypeMismatch(msg) => write!(f, "Type error: {}", msg),
            SchemeError::ImproperList(msg) => write!(f, "Error: improper list: {}", msg),
            SchemeError::Reader(msg) => write!(f, "Read error: {}", msg),
            SchemeError::User(msg) => write!(f, "{}", msg),
            SchemeError::Traced {
                error,
                continuation,
            } => write!(f, "{}\n\t{}", error, continuation),
            SchemeError::Io(msg) => write!(f, "I/O error: {}", msg),
            SchemeError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for SchemeError {}

pub type SchemeResult<T> = Result<T, SchemeError>;

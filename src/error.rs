use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the checker core and the specification reader.
///
/// Everything propagates to the driver boundary; there is no per-property
/// recovery.
#[derive(Debug, Error)]
pub enum Error {
    /// Operands were built against state spaces of different widths.
    #[error("state space mismatch: {left} bits vs {right} bits")]
    DomainMismatch { left: usize, right: usize },

    /// A fair operator was invoked on a transition without fairness
    /// predicates.
    #[error("fair operator requires at least one fairness predicate")]
    EmptyFairness,

    /// A concrete state was requested from the false predicate.
    #[error("cannot extract a state from an empty predicate")]
    EmptyPredicate,

    /// Malformed specification input; `expr` is the offending subexpression.
    #[error("parse error: {message} in `{expr}`")]
    Parse { message: String, expr: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested model exceeds what the engine can practically handle.
    #[error("state width {requested} exceeds the supported maximum of {max} bits")]
    Resource { requested: usize, max: usize },
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, expr: impl ToString) -> Self {
        Error::Parse {
            message: message.into(),
            expr: expr.to_string(),
        }
    }
}

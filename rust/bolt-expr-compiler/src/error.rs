//! Error types surfaced by each compiler stage (spec.md §4.6).

use thiserror::Error;

use bolt_expr_core::TypeDiagnostic;

/// Raised while lowering an expression tree into unrolled IR.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnrollError {
    #[error("type error: {0}")]
    Type(#[from] TypeDiagnostic),
    #[error("cannot unroll {op} on {shape}: {reason}")]
    UnsupportedShape {
        op: String,
        shape: String,
        reason: String,
    },
    #[error("data insert requires an index, none given for {op}")]
    MissingIndex { op: String },
    #[error("literal has no NBT representation: {0:?}")]
    Unrepresentable(bolt_expr_core::HostValue),
}

/// Raised by an individual optimizer pass when it finds IR it cannot
/// rewrite safely; the driver treats this as fatal (spec.md §7 — passes
/// never silently skip IR they don't understand).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("pass {pass} found an inconsistent IR shape: {reason}")]
    Inconsistent { pass: String, reason: String },
}

/// Raised by the serializer for IR shapes with no valid command rendering.
/// Per spec.md §7 this is the one stage allowed to panic instead — these
/// variants exist for the cases that are recoverable (bad host config)
/// rather than a genuine compiler-internal invariant violation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SerializeError {
    #[error("data target {0:?} has no path to operate on")]
    EmptyPath(String),
    #[error("condition on composite literal cannot be serialized directly")]
    CompositeCondition,
}

/// Top-level error returned by `Expression::resolve`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error(transparent)]
    Unroll(#[from] UnrollError),
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

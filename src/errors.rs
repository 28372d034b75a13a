//! # Error Architecture
//!
//! This module follows the same two-tier error boundary the rest of the host codebase uses:
//! context-free operation errors, wrapped with source context at the boundary where that context
//! is available.
//!
//! - [`OpError`]: context-free. The opcode-handler-local reason evaluation could not continue.
//!   Carries no source location — opcode handlers never see one directly.
//! - [`FoldError`]: wraps an [`OpError`] with the anchoring call's location and identifier, built
//!   at the point the driver gives up on a call. Annotated with [`miette::Diagnostic`] so a host
//!   compiler that wants rich rendering can use it directly, while the common path (silent
//!   failure, return the original AST node) simply discards it.
//! - [`FatalFoldError`]: a user-program fault the driver never swallows. Division, `mod`, and
//!   `rem` by zero fall here: the host compiler must halt the whole compilation, not just abandon
//!   this one fold.
//!
//! No exception-like propagation beyond these two `Result` types is needed: once an [`OpError`]
//! is produced, the dispatch loop's `failed` flag stops further opcodes from running, so nothing
//! downstream ever observes a half-updated state.

use miette::Diagnostic;
use thiserror::Error;

use crate::vir::VarType;

// OP ERROR
// ================================================================================================

/// A context-free reason an opcode handler could not produce a value.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum OpError {
    #[error("unsupported opcode prevents constant folding")]
    UnsupportedOpcode,

    #[error("evaluation heap exhaustion prevents constant folding ({allocated} allocated, {requested} requested)")]
    HeapExhausted { allocated: usize, requested: usize },

    #[error("reference to object without defined value in this phase prevents constant folding")]
    Undefined,

    #[error("variable lives outside the folder's universe")]
    ExternVariable,

    #[error("a thunk has no enclosing program unit")]
    NoEnclosingScope,

    #[error("cannot evaluate variables with unsupported type {0:?}")]
    UnsupportedVariableType(VarType),

    #[error("function call to {0} prevents constant folding")]
    UnresolvedCallee(String),

    #[error("{dims} dimensional array prevents constant folding")]
    TooManyDimensions { dims: usize },

    #[error("array index {value} outside bounds {low} to {high}")]
    BoundsViolation { value: i64, low: i64, high: i64, kind: crate::vir::BoundsKind },

    #[error("index range {low}..{high} outside bounds {min}..{max}")]
    IndexOutOfRange { low: i64, high: i64, min: i64, max: i64 },

    #[error("assertion would change runtime-visible behavior")]
    SuppressedAssertOrReport,

    #[error("assertion failed")]
    AssertionFailed,

    #[error("exceeded the allowed number of evaluation steps ({0})")]
    StepBudgetExceeded(u32),

    #[error("cannot use 'image with this type")]
    UnsupportedImageType,
}

// FOLD ERROR
// ================================================================================================

/// An ordinary folding failure, anchored at the call the driver gave up on.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
#[error("cannot constant-fold call to {call_name}")]
#[diagnostic(help("folding is a best-effort optimization; this call will execute at runtime instead"))]
pub struct FoldError {
    pub call_name: String,
    #[source]
    pub reason: OpError,
}

impl FoldError {
    pub fn new(call_name: impl Into<String>, reason: OpError) -> Self {
        FoldError { call_name: call_name.into(), reason }
    }
}

// FATAL FOLD ERROR
// ================================================================================================

/// A user-program semantic fault discovered while folding, serious enough to halt the whole
/// compilation rather than just abandon this one fold.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum FatalFoldError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("division by zero")]
    ModByZero,
    #[error("division by zero")]
    RemByZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_error_chains_to_its_source() {
        use std::error::Error;
        let err = FoldError::new("add", OpError::Undefined);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "cannot constant-fold call to add");
    }
}

//! Constant folding for a register-based, block-structured intermediate representation (VIR).
//!
//! This crate answers one question on behalf of a host compiler: given a function call (or a
//! reference to a constant) in the host's own AST, can its value be computed now, at compile
//! time, instead of left for the runtime to evaluate? [`Evaluator::eval`] answers that question
//! for one call; [`Evaluator::fold`] answers it for every call in a whole subtree.
//!
//! The host's AST, type system, VIR lowering pass, library loader, and diagnostic sink are all
//! out of scope — this crate only consumes them through the narrow [`EvalHost`] trait. A complete
//! in-memory implementation of that trait for testing lives in [`testing`], available to any
//! crate that depends on this one with the `testing` feature enabled.
//!
//! ```text
//! host AST --lower_thunk--> VIR thunk --dispatch::run_unit--> register file --literal--> host AST
//! ```

pub mod context;
pub mod dispatch;
pub mod driver;
pub mod errors;
pub mod flags;
pub mod foldable;
pub mod heap;
pub mod host;
pub mod ops;
pub mod options;
pub mod scope;
pub mod state;
pub mod value;
pub mod vir;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use driver::Evaluator;
pub use errors::{FatalFoldError, FoldError, OpError};
pub use flags::Flags;
pub use host::{DeclKind, EvalHost, NodeKind, ScalarKind, SourceLoc};
pub use options::EvalOptions;
pub use vir::BoundsKind;

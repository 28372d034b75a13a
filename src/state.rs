use crate::{context::Context, errors::OpError, flags::Flags, heap::Heap, host::SourceLoc, vir::RegId};

// EVAL STATE
// ================================================================================================

/// Everything specific to *one* context in the evaluation: its register file and variable slots,
/// whether it has failed, and the call this particular context is evaluating on behalf of.
///
/// A fresh [`EvalState`] is built for the thunk, for each nested `fcall`, and for each lazily
/// materialized enclosing scope — but they all share the same [`Shared`] resources (arena, error
/// counter, step budget), since those are scoped to the whole call chain of one top-level `eval`,
/// not to any one context within it.
pub struct EvalState {
    pub context: Context,
    pub result: Option<RegId>,
    /// Source location of the top-level call this evaluation was started for. Stays fixed
    /// through nested `fcall`s so that diagnostics raised deep in a call chain still anchor at
    /// the call the user actually wrote.
    pub call_loc: SourceLoc,
    pub call_name: String,
    pub flags: Flags,
    pub failed: bool,
    /// The first reason evaluation failed, kept for the driver's `WARN` diagnostic. Only the
    /// first is kept: once `failed` is set, invariant 2 says no opcode may observe further state,
    /// so nothing would overwrite this with a more specific reason anyway.
    pub fail_reason: Option<OpError>,
}

impl EvalState {
    pub fn new(context: Context, call_loc: SourceLoc, call_name: String, flags: Flags) -> Self {
        EvalState { context, result: None, call_loc, call_name, flags, failed: false, fail_reason: None }
    }

    /// Records `reason` as the cause of failure and sets the `failed` flag, if not already set.
    pub fn fail(&mut self, reason: OpError) {
        if !self.failed {
            self.fail_reason = Some(reason);
        }
        self.failed = true;
    }

    pub fn reg(&self, id: RegId) -> &crate::value::Value {
        self.context.reg(id)
    }

    pub fn set_reg(&mut self, id: RegId, value: crate::value::Value) {
        self.context.set_reg(id, value);
    }
}

// SHARED RESOURCES
// ================================================================================================

/// Resources shared across an entire evaluation's call chain: the arena, the bounds-error
/// counter, and the remaining step budget. A nested `fcall` or a lazily materialized enclosing
/// scope gets its own fresh [`EvalState`] (its own registers and variables) but borrows the same
/// `Shared` — an ordinary mutable borrow standing in for the "propagate the updated watermark
/// back to the caller" copy-in/copy-out a single-threaded C implementation would need explicit
/// bookkeeping for, with no borrow checker to do it for free.
pub struct Shared<'a> {
    pub heap: &'a mut Heap,
    pub errors: &'a mut u32,
    pub steps_remaining: &'a mut u32,
    /// The step bound evaluation started with, kept alongside `steps_remaining` purely so a
    /// [`crate::errors::OpError::StepBudgetExceeded`] can report what it was exceeded against.
    pub max_steps: u32,
}

impl<'a> Shared<'a> {
    pub fn reborrow(&mut self) -> Shared<'_> {
        Shared {
            heap: self.heap,
            errors: self.errors,
            steps_remaining: self.steps_remaining,
            max_steps: self.max_steps,
        }
    }
}

//! Bounds checks: `bounds`, `dynamic_bounds`, `index_check`.
//!
//! All three share the same shape: verify a value (or a sub-range) against a `[low, high]` range,
//! succeeding vacuously when the range is empty (`low > high`). `bounds` and `dynamic_bounds`
//! additionally report a violation as a user-visible error under [`Flags::BOUNDS`] (incrementing
//! the evaluator's error counter); `index_check` never reports, regardless of `BOUNDS` — it is
//! always a silent folding failure.

use crate::{
    errors::OpError,
    flags::Flags,
    host::{EvalHost, SourceLoc},
    state::{EvalState, Shared},
    vir::{BoundsKind, RegId, TypeDesc},
};

/// Violation message shared by `bounds` and `dynamic_bounds`, matching §8's concrete scenario
/// wording ("array index 11 outside bounds 1 to 10").
fn violation_message(value: i64, low: i64, high: i64) -> String {
    format!("array index {value} outside bounds {low} to {high}")
}

fn check_range(value: i64, low: i64, high: i64) -> bool {
    low > high || (value >= low && value <= high)
}

/// `bounds v` checks `v` against a static `[low, high]` drawn from the opcode's type descriptor.
pub fn op_bounds<H: EvalHost>(
    host: &H,
    shared: &mut Shared,
    state: &mut EvalState,
    call_loc: &SourceLoc,
    arg: RegId,
    bounds: TypeDesc,
    kind: BoundsKind,
) {
    let value = state.reg(arg).as_integer().expect("bounds operates on an integer");
    if check_range(value, bounds.low, bounds.high) {
        return;
    }

    if state.flags.contains(Flags::BOUNDS) {
        let msg = violation_message(value, bounds.low, bounds.high);
        host.error_at(call_loc, &msg);
        host.note_at(&state.call_loc, "while folding this call");
        *shared.errors += 1;
    }
    state.fail(OpError::BoundsViolation { value, low: bounds.low, high: bounds.high, kind });
}

/// `dynamic_bounds v, low, high` is identical to `bounds` except the range comes from registers
/// computed at fold time rather than a static type descriptor.
pub fn op_dynamic_bounds<H: EvalHost>(
    host: &H,
    shared: &mut Shared,
    state: &mut EvalState,
    call_loc: &SourceLoc,
    arg: RegId,
    low: RegId,
    high: RegId,
) {
    let low = state.reg(low).as_integer().expect("dynamic-bounds low is an integer");
    let high = state.reg(high).as_integer().expect("dynamic-bounds high is an integer");
    op_bounds(host, shared, state, call_loc, arg, TypeDesc::new(low, high), BoundsKind::ArrayTo);
}

/// `index_check low, high, min, max` validates a `[low, high]` sub-range against a `[min, max]`
/// parent range, as used when slicing a constrained array by a dynamically computed index range.
///
/// Unlike `bounds`/`dynamic_bounds`, a violation here is never reported as a user-visible error
/// even under [`Flags::BOUNDS`] — it is always a silent folding failure.
pub fn op_index_check<H: EvalHost>(
    _host: &H,
    _shared: &mut Shared,
    state: &mut EvalState,
    _call_loc: &SourceLoc,
    low: RegId,
    high: RegId,
    min: i64,
    max: i64,
) {
    let low = state.reg(low).as_integer().expect("index-check low is an integer");
    let high = state.reg(high).as_integer().expect("index-check high is an integer");

    if min > max || (low >= min && high <= max) || low > high {
        return;
    }

    state.fail(OpError::IndexOutOfRange { low, high, min, max });
}

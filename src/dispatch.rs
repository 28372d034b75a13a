//! §4.F — the dispatch loop: a linear scan of a block's opcodes, with terminators redirecting the
//! scan to another block instead of falling through.
//!
//! A block is conceptually re-entered rather than recursed into (§5: "a faithful implementation
//! may use a loop rather than actual recursion to avoid host stack growth"), so [`run_unit`] is an
//! ordinary `loop` over block indices, not a function that calls itself per `jump`.

use tracing::{trace, warn};

use crate::{
    errors::{FatalFoldError, OpError},
    host::EvalHost,
    ops::{arithmetic, array, assert as assert_ops, bounds as bounds_ops, call, comparison, control, convert, image, memory, Transfer},
    state::{EvalState, Shared},
    vir::{OpKind, Unit},
};

/// Runs `unit` starting at block 0 until a `return` terminator, a failure, or the step budget is
/// exhausted, writing results into `state`. `shared` carries the arena, bounds-error counter, and
/// remaining step budget across this call and any nested `fcall`s it makes.
#[tracing::instrument(level = "trace", skip_all, fields(unit = %unit.name))]
pub fn run_unit<H: EvalHost>(
    host: &H,
    unit: &Unit,
    state: &mut EvalState,
    shared: &mut Shared,
) -> Result<(), FatalFoldError> {
    let mut block_id = 0;

    'blocks: loop {
        let block = unit.block(block_id);

        for op in &block.ops {
            if state.failed {
                break 'blocks;
            }

            if *shared.steps_remaining == 0 {
                warn!(unit = %unit.name, "evaluation step budget exhausted");
                state.fail(OpError::StepBudgetExceeded(shared.max_steps));
                break 'blocks;
            }
            *shared.steps_remaining -= 1;

            trace!(unit = %unit.name, block = block_id, op = ?op.kind, "dispatch");

            match dispatch_one(host, unit, shared, state, op.loc.clone(), &op.kind)? {
                Transfer::Continue => continue,
                Transfer::Jump(target) => {
                    block_id = target;
                    continue 'blocks;
                },
                Transfer::Return => break 'blocks,
            }
        }

        // Every block ends in exactly one terminator; falling off without hitting `Transfer::Jump`
        // or `Transfer::Return` means a block was built without one, which is a bug in the VIR
        // this crate was handed, not a folding failure.
        host.fatal_trace("VIR block fell through without a terminator");
        break;
    }

    Ok(())
}

fn dispatch_one<H: EvalHost>(
    host: &H,
    unit: &Unit,
    shared: &mut Shared,
    state: &mut EvalState,
    loc: crate::host::SourceLoc,
    op: &OpKind,
) -> Result<Transfer, FatalFoldError> {
    use OpKind::*;

    match op {
        Comment | HeapSave | HeapRestore => {},

        Const { result, value } => arithmetic::op_const(state, *result, *value),
        ConstReal { result, value } => arithmetic::op_const_real(state, *result, *value),
        Add { result, lhs, rhs } => arithmetic::op_add(state, *result, *lhs, *rhs),
        Sub { result, lhs, rhs } => arithmetic::op_sub(state, *result, *lhs, *rhs),
        Mul { result, lhs, rhs } => arithmetic::op_mul(state, *result, *lhs, *rhs),
        Div { result, lhs, rhs } => {
            let saved_loc = std::mem::replace(&mut state.call_loc, loc);
            let outcome = arithmetic::op_div(host, state, *result, *lhs, *rhs);
            state.call_loc = saved_loc;
            outcome?;
        },
        Mod { result, lhs, rhs } => {
            let saved_loc = std::mem::replace(&mut state.call_loc, loc);
            let outcome = arithmetic::op_mod(host, state, *result, *lhs, *rhs);
            state.call_loc = saved_loc;
            outcome?;
        },
        Rem { result, lhs, rhs } => {
            let saved_loc = std::mem::replace(&mut state.call_loc, loc);
            let outcome = arithmetic::op_rem(host, state, *result, *lhs, *rhs);
            state.call_loc = saved_loc;
            outcome?;
        },
        Neg { result, arg } => arithmetic::op_neg(state, *result, *arg),
        Abs { result, arg } => arithmetic::op_abs(state, *result, *arg),
        Exp { result, lhs, rhs } => arithmetic::op_exp(state, *result, *lhs, *rhs),

        Cmp { result, op, lhs, rhs } => comparison::op_cmp(state, *result, *op, *lhs, *rhs),
        And { result, lhs, rhs } => comparison::op_and(state, *result, *lhs, *rhs),
        Or { result, lhs, rhs } => comparison::op_or(state, *result, *lhs, *rhs),
        Not { result, arg } => comparison::op_not(state, *result, *arg),
        Memcmp { result, lhs, rhs, len } => comparison::op_memcmp(state, shared.heap, *result, *lhs, *rhs, *len),

        Cast { result, arg, to } => convert::op_cast(state, *result, *arg, *to),

        Store { address, value } => memory::op_store(host, unit, shared, state, *address, *value),
        Load { result, address } => memory::op_load(host, unit, shared, state, *result, *address),
        StoreIndirect { address, value } => memory::op_store_indirect(state, shared.heap, *address, *value),
        LoadIndirect { result, address } => memory::op_load_indirect(state, shared.heap, *result, *address),
        Index { result, address } => memory::op_index(host, unit, shared, state, *result, *address),
        Alloca { result, count } => memory::op_alloca(state, shared.heap, *result, *count),
        Copy { dst, src, count } => memory::op_copy(state, shared.heap, *dst, *src, *count),

        ConstArray { result, args } => array::op_const_array(state, shared.heap, *result, args),
        Wrap { result, arg, dims } => array::op_wrap(state, *result, *arg, dims),
        Unwrap { result, arg } => array::op_unwrap(state, *result, *arg),
        UarrayLen { result, arg, dim } => array::op_uarray_len(state, *result, *arg, *dim),
        UarrayLeft { result, arg, dim } => array::op_uarray_left(state, *result, *arg, *dim),
        UarrayRight { result, arg, dim } => array::op_uarray_right(state, *result, *arg, *dim),
        UarrayDir { result, arg, dim } => array::op_uarray_dir(state, *result, *arg, *dim),

        Return { value } => return Ok(control::op_return(state, *value)),
        Jump { target } => return Ok(control::op_jump(*target)),
        Cond { test, if_true, if_false } => return Ok(control::op_cond(state, *test, *if_true, *if_false)),
        Case { test, default, cases } => return Ok(control::op_case(state, *test, *default, cases)),

        Bounds { arg, bounds, kind } => bounds_ops::op_bounds(host, shared, state, &loc, *arg, *bounds, *kind),
        DynamicBounds { arg, low, high } => bounds_ops::op_dynamic_bounds(host, shared, state, &loc, *arg, *low, *high),
        IndexCheck { low, high, min, max } => bounds_ops::op_index_check(host, shared, state, &loc, *low, *high, *min, *max),

        Assert { cond, severity, text, len } => assert_ops::op_assert(host, shared.heap, state, &loc, *cond, *severity, *text, *len),
        Report { severity, text, len } => assert_ops::op_report(host, shared.heap, state, &loc, *severity, *text, *len),

        Select { test, if_true, if_false, result } => control::op_select(state, *result, *test, *if_true, *if_false),
        Undefined { result } => control::op_undefined(state, *result),

        Fcall { result, func, args } => call::op_fcall(host, shared, state, *result, func, args)?,
        // A function nested inside another subprogram is, from the dispatch loop's point of
        // view, an ordinary `fcall`: its lexical parent is resolved lazily the same way any
        // other callee's is, through `scope::resolve_var`'s depth walk. There is no live caller
        // frame to thread through — constant folding has no call stack of suspended frames, only
        // the unit graph `EvalHost::lower_unit` exposes.
        NestedFcall { result, func, args } => call::op_fcall(host, shared, state, *result, func, args)?,

        Image { result, arg, ty } => image::op_image(state, shared.heap, *result, *arg, ty),
    }

    Ok(Transfer::Continue)
}

//! Function calls: `fcall fn, args...`.
//!
//! A process-wide "VIR cursor" that must be saved and restored around every cross-unit dispatch
//! would be one way to track the current callee, but that bookkeeping is only needed when the
//! evaluator selects into shared global state. Here the callee [`Unit`] is an owned value handed
//! straight to [`crate::dispatch::run_unit`], so there is no cursor to save in the first place —
//! normal Rust call-stack discipline does the job for free.

use tracing::warn;

use crate::{
    context::Context,
    errors::{FatalFoldError, OpError},
    flags::Flags,
    host::EvalHost,
    state::{EvalState, Shared},
    value::Value,
    vir::RegId,
};

/// Resolves `name` to a [`crate::vir::Unit`], trying the host's direct lookup first and falling
/// back to a library-qualified resolution (`library.unit`) that triggers on-demand lowering.
fn resolve_callee<H: EvalHost>(host: &H, name: &str) -> Option<crate::vir::Unit> {
    if let Some(unit) = host.lower_unit(name) {
        return Some(unit);
    }

    let (lib_name, unit_name) = name.rsplit_once('.')?;
    let lib = host.find_library(lib_name)?;
    // Loading the unit through the library collaborator is expected to trigger the host's own
    // on-demand lowering (including, for a package name, its body) as a side effect; once it has,
    // a direct lookup should succeed.
    host.get_unit(&lib, unit_name)?;
    host.lower_unit(name)
}

/// `fcall fn, args...` — resolves `func`, builds a fresh context with the caller's argument
/// registers copied into the callee's leading (parameter) registers, interprets it sharing the
/// caller's arena, and on success copies the callee's return register back into `result`.
pub fn op_fcall<H: EvalHost>(
    host: &H,
    shared: &mut Shared,
    state: &mut EvalState,
    result: RegId,
    func: &str,
    args: &[RegId],
) -> Result<(), FatalFoldError> {
    let Some(unit) = resolve_callee(host, func) else {
        if state.flags.contains(Flags::WARN) {
            host.warn_at(&state.call_loc, &format!("cannot evaluate call to {func}"));
        }
        state.fail(OpError::UnresolvedCallee(func.to_string()));
        return Ok(());
    };

    let mut callee_ctx = match Context::new(&unit, shared.heap) {
        Ok(ctx) => ctx,
        Err(reason) => {
            state.fail(reason);
            return Ok(());
        },
    };
    for (param, &arg) in args.iter().enumerate() {
        callee_ctx.set_reg(param as RegId, state.reg(arg).clone());
    }

    // The caller's flags all propagate into the callee, and BOUNDS is force-enabled even when the
    // caller lacks it.
    let callee_flags = state.flags | Flags::BOUNDS;
    let mut callee_state = EvalState::new(callee_ctx, state.call_loc.clone(), func.to_string(), callee_flags);

    crate::dispatch::run_unit(host, &unit, &mut callee_state, shared)?;

    if callee_state.failed {
        warn!(callee = func, "nested call did not fold");
        state.fail(callee_state.fail_reason.unwrap_or(OpError::UnresolvedCallee(func.to_string())));
        return Ok(());
    }

    let value = match callee_state.result {
        Some(reg) => callee_state.reg(reg).clone(),
        None => Value::Invalid,
    };
    state.set_reg(result, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Context,
        heap::Heap,
        host::SourceLoc,
        testing::MockHost,
        vir::{Block, Op, OpKind, Unit, UnitKind},
    };

    fn add_unit() -> Unit {
        Unit {
            name: "add".into(),
            kind: UnitKind::Function,
            depth: 1,
            nregs: 3,
            vars: vec![],
            blocks: vec![Block {
                ops: vec![
                    Op::new(OpKind::Add { result: 2, lhs: 0, rhs: 1 }, SourceLoc::default()),
                    Op::new(OpKind::Return { value: Some(2) }, SourceLoc::default()),
                ],
            }],
            enclosing: None,
        }
    }

    fn caller_state(regs: Vec<Value>, heap: &mut Heap) -> EvalState {
        let unit = Unit {
            name: "caller".into(),
            kind: UnitKind::Thunk,
            depth: 0,
            nregs: regs.len(),
            vars: vec![],
            blocks: vec![Block::default()],
            enclosing: None,
        };
        let mut context = Context::new(&unit, heap).unwrap();
        context.regs = regs;
        EvalState::new(context, SourceLoc::default(), "caller".into(), Default::default())
    }

    #[test]
    fn fcall_copies_args_in_and_result_out() {
        let mut host = MockHost::new();
        host.register_unit(add_unit());

        let mut heap = Heap::new(64);
        let mut state = caller_state(vec![Value::Integer(2), Value::Integer(3), Value::Invalid], &mut heap);
        let mut errors = 0;
        let mut steps = 1024;
        let mut shared = Shared { heap: &mut heap, errors: &mut errors, steps_remaining: &mut steps, max_steps: 1024 };

        op_fcall(&host, &mut shared, &mut state, 2, "add", &[0, 1]).unwrap();
        assert_eq!(state.reg(2), &Value::Integer(5));
        assert!(!state.failed);
    }

    #[test]
    fn unresolved_callee_is_an_ordinary_failure() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let mut state = caller_state(vec![Value::Invalid], &mut heap);
        let mut errors = 0;
        let mut steps = 1024;
        let mut shared = Shared { heap: &mut heap, errors: &mut errors, steps_remaining: &mut steps, max_steps: 1024 };

        op_fcall(&host, &mut shared, &mut state, 0, "missing", &[]).unwrap();
        assert!(state.failed);
        assert_eq!(state.fail_reason, Some(OpError::UnresolvedCallee("missing".into())));
    }

    #[test]
    fn callee_arena_allocations_are_visible_to_caller() {
        let mut host = MockHost::new();
        let alloc_unit = Unit {
            name: "make".into(),
            kind: UnitKind::Function,
            depth: 1,
            nregs: 2,
            vars: vec![],
            blocks: vec![Block {
                ops: vec![
                    Op::new(OpKind::Alloca { result: 0, count: None }, SourceLoc::default()),
                    Op::new(OpKind::Return { value: Some(0) }, SourceLoc::default()),
                ],
            }],
            enclosing: None,
        };
        host.register_unit(alloc_unit);

        let mut heap = Heap::new(64);
        let mut state = caller_state(vec![Value::Invalid], &mut heap);
        let mut errors = 0;
        let mut steps = 1024;
        let mut shared = Shared { heap: &mut heap, errors: &mut errors, steps_remaining: &mut steps, max_steps: 1024 };

        op_fcall(&host, &mut shared, &mut state, 0, "make", &[]).unwrap();
        assert!(!state.failed);
        assert_eq!(shared.heap.capacity(), 64);
        assert!(shared.heap.watermark() >= 1);
    }
}

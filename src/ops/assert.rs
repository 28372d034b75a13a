//! Assertion and report: `assert`, `report`.
//!
//! Both are side-effecting from the user's point of view — they may print to the compiler's
//! diagnostic stream, which is runtime-visible behavior a best-effort folder must not silently
//! absorb. `report` is unconditional: without [`Flags::REPORT`] it always forces failure before
//! emitting, since it would otherwise print something the unfolded program prints too. `assert`
//! is conditioned on severity instead: without `REPORT` its message is simply suppressed, and it
//! only fails when its severity is `Error` or above — the same severity test the program applies
//! at runtime, independent of whether the message got to print.

use crate::{
    errors::OpError,
    flags::Flags,
    heap::Heap,
    host::{EvalHost, SourceLoc},
    state::EvalState,
    value::Value,
    vir::{RegId, Severity},
};

fn severity_name(sev: Severity) -> &'static str {
    match sev {
        Severity::Note => "Note",
        Severity::Warning => "Warning",
        Severity::Error => "Error",
        Severity::Failure => "Failure",
    }
}

fn severity_from_i64(v: i64) -> Severity {
    match v {
        0 => Severity::Note,
        1 => Severity::Warning,
        2 => Severity::Error,
        _ => Severity::Failure,
    }
}

/// Reads `len` character codes starting at `text` back into a `String`, as `image` and
/// `assert`/`report` text arguments are represented.
fn read_string(heap: &Heap, text: crate::value::Ptr, len: i64) -> String {
    (0..len)
        .filter_map(|i| heap.get(text.offset(i)).and_then(Value::as_integer))
        .filter_map(|code| char::from_u32(code as u32))
        .collect()
}

/// `assert cond, sev, text, len` — when `cond == 0`, formats "<Severity>: <text>" and emits it
/// through the diagnostic collaborator at the appropriate level; fails iff `sev >= Error`.
pub fn op_assert<H: EvalHost>(
    host: &H,
    heap: &Heap,
    state: &mut EvalState,
    call_loc: &SourceLoc,
    cond: RegId,
    severity: RegId,
    text: RegId,
    len: RegId,
) {
    if !state.reg(cond).is_false() {
        return;
    }

    let sev = severity_from_i64(state.reg(severity).as_integer().expect("assert severity is an integer"));

    if !state.flags.contains(Flags::REPORT) {
        // Unlike `report`, an `assert` without REPORT only fails when its severity would have
        // halted the unfolded program; a Note/Warning-severity assert simply has its message
        // suppressed.
        if sev >= Severity::Error {
            state.fail(OpError::AssertionFailed);
        }
        return;
    }

    let text_ptr = state.reg(text).as_pointer().expect("assert text is a pointer");
    let text_len = state.reg(len).as_integer().expect("assert length is an integer");
    let message = read_string(heap, text_ptr, text_len);

    let rendered = format!("Assertion {}: {}", severity_name(sev), message);
    match sev {
        Severity::Note => host.note_at(call_loc, &rendered),
        Severity::Warning => host.warn_at(call_loc, &rendered),
        Severity::Error | Severity::Failure => host.error_at(call_loc, &rendered),
    }

    if sev >= Severity::Error {
        state.fail(OpError::AssertionFailed);
    }
}

/// `report sev, text, len` — unconditional form of `assert`: under [`Flags::REPORT`] it always
/// emits, else it always forces failure (the `report` statement would otherwise print something
/// the unfolded program prints too).
pub fn op_report<H: EvalHost>(
    host: &H,
    heap: &Heap,
    state: &mut EvalState,
    call_loc: &SourceLoc,
    severity: RegId,
    text: RegId,
    len: RegId,
) {
    if !state.flags.contains(Flags::REPORT) {
        state.fail(OpError::SuppressedAssertOrReport);
        return;
    }

    let sev = severity_from_i64(state.reg(severity).as_integer().expect("report severity is an integer"));
    let text_ptr = state.reg(text).as_pointer().expect("report text is a pointer");
    let text_len = state.reg(len).as_integer().expect("report length is an integer");
    let message = read_string(heap, text_ptr, text_len);
    let rendered = format!("Report {}: {}", severity_name(sev), message);

    match sev {
        Severity::Note => host.note_at(call_loc, &rendered),
        Severity::Warning => host.warn_at(call_loc, &rendered),
        Severity::Error | Severity::Failure => host.error_at(call_loc, &rendered),
    }

    if sev >= Severity::Error {
        state.fail(OpError::AssertionFailed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::Context, testing::MockHost, value::Ptr, vir::{Block, Unit, UnitKind}};

    fn string_in_heap(heap: &mut Heap, text: &str) -> (Ptr, i64) {
        let ptr = heap.alloc(text.len()).unwrap();
        for (i, c) in text.chars().enumerate() {
            *heap.get_mut(ptr.offset(i as i64)).unwrap() = Value::Integer(c as i64);
        }
        (ptr, text.len() as i64)
    }

    fn state_with_regs(regs: Vec<Value>, flags: Flags) -> EvalState {
        let unit = Unit { name: "t".into(), kind: UnitKind::Thunk, depth: 0, nregs: regs.len(), vars: vec![], blocks: vec![Block::default()], enclosing: None };
        let mut dummy = Heap::new(0);
        let mut context = Context::new(&unit, &mut dummy).unwrap();
        context.regs = regs;
        EvalState::new(context, SourceLoc::default(), "t".into(), flags)
    }

    #[test]
    fn assert_true_condition_is_a_no_op() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "nope");
        let mut state = state_with_regs(
            vec![Value::Integer(1), Value::Integer(3), Value::Pointer(ptr), Value::Integer(len)],
            Flags::empty(),
        );
        op_assert(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2, 3);
        assert!(!state.failed);
    }

    #[test]
    fn assert_false_without_report_fails_before_emitting() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "nope");
        let mut state = state_with_regs(
            vec![Value::Integer(0), Value::Integer(3), Value::Pointer(ptr), Value::Integer(len)],
            Flags::empty(),
        );
        op_assert(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2, 3);
        assert!(state.failed);
        assert_eq!(state.fail_reason, Some(OpError::AssertionFailed));
    }

    #[test]
    fn assert_warning_without_report_does_not_fail() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "careful");
        let mut state = state_with_regs(
            vec![Value::Integer(0), Value::Integer(1), Value::Pointer(ptr), Value::Integer(len)],
            Flags::empty(),
        );
        op_assert(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2, 3);
        assert!(!state.failed);
    }

    #[test]
    fn assert_failure_with_report_emits_and_fails() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "nope");
        let mut state = state_with_regs(
            vec![Value::Integer(0), Value::Integer(3), Value::Pointer(ptr), Value::Integer(len)],
            Flags::REPORT,
        );
        op_assert(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2, 3);
        assert!(state.failed);
        assert_eq!(state.fail_reason, Some(OpError::AssertionFailed));
    }

    #[test]
    fn assert_warning_with_report_does_not_fail() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "careful");
        let mut state = state_with_regs(
            vec![Value::Integer(0), Value::Integer(1), Value::Pointer(ptr), Value::Integer(len)],
            Flags::REPORT,
        );
        op_assert(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2, 3);
        assert!(!state.failed);
    }

    #[test]
    fn report_without_flag_always_fails() {
        let host = MockHost::new();
        let mut heap = Heap::new(64);
        let (ptr, len) = string_in_heap(&mut heap, "hi");
        let mut state = state_with_regs(vec![Value::Integer(0), Value::Pointer(ptr), Value::Integer(len)], Flags::empty());
        op_report(&host, &heap, &mut state, &SourceLoc::default(), 0, 1, 2);
        assert!(state.failed);
        assert_eq!(state.fail_reason, Some(OpError::SuppressedAssertOrReport));
    }
}

//! Comparison and logic: `cmp`, `and`, `or`, `not`, `memcmp`.

use crate::{
    heap::Heap,
    state::EvalState,
    value::{value_cmp, Value},
    vir::{Cmp, RegId},
};

/// Orders two values of the same kind. Integers and pointers use ordinary total ordering; reals
/// follow IEEE 754 unordered semantics — any comparison other than `neq` involving `NaN` is
/// false, matching the resolved open question in `SPEC_FULL.md` §9.
fn compare(lhs: &Value, rhs: &Value, op: Cmp) -> bool {
    match value_cmp(lhs, rhs) {
        Some(ordering) => match op {
            Cmp::Eq => ordering.is_eq(),
            Cmp::Neq => !ordering.is_eq(),
            Cmp::Gt => ordering.is_gt(),
            Cmp::Geq => ordering.is_ge(),
            Cmp::Lt => ordering.is_lt(),
            Cmp::Leq => ordering.is_le(),
        },
        // Unordered (NaN on either side): only `neq` is true.
        None => matches!(op, Cmp::Neq),
    }
}

pub fn op_cmp(state: &mut EvalState, result: RegId, op: Cmp, lhs: RegId, rhs: RegId) {
    let out = compare(state.reg(lhs), state.reg(rhs), op);
    state.set_reg(result, Value::Integer(out as i64));
}

pub fn op_and(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let a = state.reg(lhs).as_integer().expect("and operates on integers");
    let b = state.reg(rhs).as_integer().expect("and operates on integers");
    state.set_reg(result, Value::Integer(a & b));
}

pub fn op_or(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let a = state.reg(lhs).as_integer().expect("or operates on integers");
    let b = state.reg(rhs).as_integer().expect("or operates on integers");
    state.set_reg(result, Value::Integer(a | b));
}

pub fn op_not(state: &mut EvalState, result: RegId, arg: RegId) {
    let out = state.reg(arg).is_false();
    state.set_reg(result, Value::Integer(out as i64));
}

/// Element-wise comparison of two pointer runs, as `'='` on arrays lowers to.
pub fn op_memcmp(state: &mut EvalState, heap: &Heap, result: RegId, lhs: RegId, rhs: RegId, len: RegId) {
    let lhs_ptr = state.reg(lhs).as_pointer().expect("memcmp operates on pointers");
    let rhs_ptr = state.reg(rhs).as_pointer().expect("memcmp operates on pointers");
    let len = state.reg(len).as_integer().expect("memcmp length is an integer");

    let mut equal = true;
    for i in 0..len {
        let a = heap.get(lhs_ptr.offset(i)).expect("memcmp source in bounds");
        let b = heap.get(rhs_ptr.offset(i)).expect("memcmp source in bounds");
        if value_cmp(a, b) != Some(core::cmp::Ordering::Equal) {
            equal = false;
            break;
        }
    }
    state.set_reg(result, Value::Integer(equal as i64));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Cmp::Eq, 3, 3, true)]
    #[case(Cmp::Eq, 3, 4, false)]
    #[case(Cmp::Neq, 3, 4, true)]
    #[case(Cmp::Gt, 4, 3, true)]
    #[case(Cmp::Geq, 3, 3, true)]
    #[case(Cmp::Lt, 2, 3, true)]
    #[case(Cmp::Leq, 3, 3, true)]
    fn integer_comparisons(#[case] op: Cmp, #[case] a: i64, #[case] b: i64, #[case] expected: bool) {
        assert_eq!(compare(&Value::Integer(a), &Value::Integer(b), op), expected);
    }

    #[test]
    fn nan_is_unordered_except_neq() {
        let nan = Value::Real(f64::NAN);
        let one = Value::Real(1.0);
        assert!(!compare(&nan, &one, Cmp::Eq));
        assert!(!compare(&nan, &one, Cmp::Lt));
        assert!(!compare(&nan, &one, Cmp::Gt));
        assert!(compare(&nan, &one, Cmp::Neq));
    }

    #[test]
    fn not_is_logical_negation() {
        assert!(Value::Integer(0).is_false());
        assert!(!Value::Integer(1).is_false());
    }

    #[test]
    fn memcmp_compares_elementwise() {
        use crate::{context::Context, heap::Heap, value::Ptr, vir::{Block, Unit, UnitKind}};

        let mut heap = Heap::new(16);
        let lhs = heap.alloc(3).unwrap();
        let rhs = heap.alloc(3).unwrap();
        for (i, v) in [1, 2, 3].into_iter().enumerate() {
            *heap.get_mut(lhs.offset(i as i64)).unwrap() = Value::Integer(v);
            *heap.get_mut(rhs.offset(i as i64)).unwrap() = Value::Integer(v);
        }

        let unit = Unit { name: "t".into(), kind: UnitKind::Thunk, depth: 0, nregs: 4, vars: vec![], blocks: vec![Block::default()], enclosing: None };
        let mut dummy_heap = Heap::new(0);
        let mut context = Context::new(&unit, &mut dummy_heap).unwrap();
        context.regs = vec![Value::Pointer(lhs), Value::Pointer(rhs), Value::Integer(3), Value::Invalid];
        let mut state = EvalState::new(context, Default::default(), "t".into(), Default::default());

        op_memcmp(&mut state, &heap, 3, 0, 1, 2);
        assert_eq!(state.reg(3), &Value::Integer(1));

        *heap.get_mut(Ptr(rhs.0 + 2)).unwrap() = Value::Integer(99);
        op_memcmp(&mut state, &heap, 3, 0, 1, 2);
        assert_eq!(state.reg(3), &Value::Integer(0));
    }
}

//! Constants and arithmetic: `const`, `const_real`, `add`, `sub`, `mul`, `div`, `mod`, `rem`,
//! `neg`, `abs`, `exp`. Dispatch on the left operand's tag; the right operand shares it, except
//! pointer arithmetic (`add pointer, integer -> pointer`).

use crate::{
    errors::FatalFoldError,
    host::EvalHost,
    state::EvalState,
    value::Value,
    vir::RegId,
};

pub fn op_const(state: &mut EvalState, result: RegId, value: i64) {
    state.set_reg(result, Value::Integer(value));
}

pub fn op_const_real(state: &mut EvalState, result: RegId, value: f64) {
    state.set_reg(result, Value::Real(value));
}

pub fn op_add(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let out = match (state.reg(lhs), state.reg(rhs)) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_add(*b)),
        (Value::Real(a), Value::Real(b)) => Value::Real(a + b),
        (Value::Pointer(p), Value::Integer(n)) => Value::Pointer(p.offset(*n)),
        _ => unreachable!("type mismatch in add is a contract violation"),
    };
    state.set_reg(result, out);
}

pub fn op_sub(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let out = match (state.reg(lhs), state.reg(rhs)) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_sub(*b)),
        (Value::Real(a), Value::Real(b)) => Value::Real(a - b),
        _ => unreachable!("type mismatch in sub is a contract violation"),
    };
    state.set_reg(result, out);
}

pub fn op_mul(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let out = match (state.reg(lhs), state.reg(rhs)) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(a.wrapping_mul(*b)),
        (Value::Real(a), Value::Real(b)) => Value::Real(a * b),
        _ => unreachable!("type mismatch in mul is a contract violation"),
    };
    state.set_reg(result, out);
}

/// `div` on integers truncates toward zero. A zero divisor is a user-program error, not a
/// folding failure: it is reported at the call site and halts the whole compilation.
pub fn op_div<H: EvalHost>(host: &H, state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) -> Result<(), FatalFoldError> {
    let out = match (state.reg(lhs).clone(), state.reg(rhs).clone()) {
        (Value::Integer(a), Value::Integer(b)) => {
            if b == 0 {
                host.fatal_at(&state.call_loc, "division by zero");
                return Err(FatalFoldError::DivisionByZero);
            }
            Value::Integer(a.wrapping_div(b))
        },
        (Value::Real(a), Value::Real(b)) => Value::Real(a / b),
        _ => unreachable!("type mismatch in div is a contract violation"),
    };
    state.set_reg(result, out);
    Ok(())
}

/// `mod` takes the absolute value of the truncated remainder, matching the host language's
/// defined semantics for the modulus operator.
pub fn op_mod<H: EvalHost>(host: &H, state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) -> Result<(), FatalFoldError> {
    let a = state.reg(lhs).as_integer().expect("mod operates on integers");
    let b = state.reg(rhs).as_integer().expect("mod operates on integers");
    if b == 0 {
        host.fatal_at(&state.call_loc, "division by zero");
        return Err(FatalFoldError::ModByZero);
    }
    state.set_reg(result, Value::Integer((a.wrapping_rem(b)).wrapping_abs()));
    Ok(())
}

/// `rem` is the truncated-division remainder, keeping the dividend's sign.
pub fn op_rem<H: EvalHost>(host: &H, state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) -> Result<(), FatalFoldError> {
    let a = state.reg(lhs).as_integer().expect("rem operates on integers");
    let b = state.reg(rhs).as_integer().expect("rem operates on integers");
    if b == 0 {
        host.fatal_at(&state.call_loc, "division by zero");
        return Err(FatalFoldError::RemByZero);
    }
    state.set_reg(result, Value::Integer(a.wrapping_sub(a.wrapping_div(b).wrapping_mul(b))));
    Ok(())
}

/// `exp` operates only on reals, via the host's power function.
pub fn op_exp(state: &mut EvalState, result: RegId, lhs: RegId, rhs: RegId) {
    let a = state.reg(lhs).as_real().expect("exp operates on reals");
    let b = state.reg(rhs).as_real().expect("exp operates on reals");
    state.set_reg(result, Value::Real(a.powf(b)));
}

pub fn op_neg(state: &mut EvalState, result: RegId, arg: RegId) {
    let out = match state.reg(arg) {
        Value::Integer(v) => Value::Integer(v.wrapping_neg()),
        Value::Real(v) => Value::Real(-v),
        _ => unreachable!("type mismatch in neg is a contract violation"),
    };
    state.set_reg(result, out);
}

pub fn op_abs(state: &mut EvalState, result: RegId, arg: RegId) {
    let out = match state.reg(arg) {
        Value::Integer(v) => Value::Integer(v.wrapping_abs()),
        Value::Real(v) => Value::Real(v.abs()),
        _ => unreachable!("type mismatch in abs is a contract violation"),
    };
    state.set_reg(result, out);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{context::Context, heap::Heap, testing::MockHost, vir::{Block, Unit, UnitKind}};

    fn state_with_regs(regs: Vec<Value>) -> EvalState {
        let unit = Unit {
            name: "t".into(),
            kind: UnitKind::Thunk,
            depth: 0,
            nregs: regs.len(),
            vars: vec![],
            blocks: vec![Block::default()],
            enclosing: None,
        };
        let mut heap = Heap::new(4096);
        let mut context = Context::new(&unit, &mut heap).unwrap();
        context.regs = regs;
        EvalState::new(context, Default::default(), "t".into(), Default::default())
    }

    #[rstest]
    #[case(2, 3, 5)]
    #[case(-2, 3, 1)]
    #[case(i64::MAX, 1, i64::MIN)]
    fn add_matches_wrapping_semantics(#[case] a: i64, #[case] b: i64, #[case] expected: i64) {
        let mut state = state_with_regs(vec![Value::Integer(a), Value::Integer(b), Value::Invalid]);
        op_add(&mut state, 2, 0, 1);
        assert_eq!(state.reg(2), &Value::Integer(expected));
    }

    #[test]
    fn div_by_zero_is_fatal() {
        let host = MockHost::new();
        let mut state = state_with_regs(vec![Value::Integer(7), Value::Integer(0), Value::Invalid]);
        let result = op_div(&host, &mut state, 2, 0, 1);
        assert!(result.is_err());
    }

    #[test]
    fn div_truncates_toward_zero() {
        let host = MockHost::new();
        let mut state = state_with_regs(vec![Value::Integer(-7), Value::Integer(2), Value::Invalid]);
        op_div(&host, &mut state, 2, 0, 1).unwrap();
        assert_eq!(state.reg(2), &Value::Integer(-3));
    }

    #[test]
    fn mod_takes_absolute_value() {
        let host = MockHost::new();
        let mut state = state_with_regs(vec![Value::Integer(-7), Value::Integer(3), Value::Invalid]);
        op_mod(&host, &mut state, 2, 0, 1).unwrap();
        assert_eq!(state.reg(2), &Value::Integer(1));
    }

    #[test]
    fn rem_keeps_dividend_sign() {
        let host = MockHost::new();
        let mut state = state_with_regs(vec![Value::Integer(-7), Value::Integer(3), Value::Invalid]);
        op_rem(&host, &mut state, 2, 0, 1).unwrap();
        assert_eq!(state.reg(2), &Value::Integer(-1));
    }

    #[test]
    fn pointer_plus_integer_offsets_pointer() {
        use crate::value::Ptr;
        let mut state = state_with_regs(vec![Value::Pointer(Ptr(4)), Value::Integer(3), Value::Invalid]);
        op_add(&mut state, 2, 0, 1);
        assert_eq!(state.reg(2), &Value::Pointer(Ptr(7)));
    }
}

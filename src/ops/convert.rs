//! Type conversions: `cast` truncates reals toward zero when converting to an integer or offset
//! type, and widens integers when converting to real.

use crate::{state::EvalState, value::Value, vir::{CastKind, RegId}};

pub fn op_cast(state: &mut EvalState, result: RegId, arg: RegId, to: CastKind) {
    let out = match to {
        CastKind::Integer | CastKind::Offset => match state.reg(arg) {
            Value::Integer(v) => Value::Integer(*v),
            Value::Real(v) => Value::Integer(*v as i64),
            _ => unreachable!("type mismatch in cast is a contract violation"),
        },
        CastKind::Real => match state.reg(arg) {
            Value::Integer(v) => Value::Real(*v as f64),
            Value::Real(v) => Value::Real(*v),
            _ => unreachable!("type mismatch in cast is a contract violation"),
        },
    };
    state.set_reg(result, out);
}

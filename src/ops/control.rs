//! Control flow terminators: `return`, `jump`, `cond`, `case`, plus the scalar misc ops `select`
//! and `undefined` that live alongside them in the original opcode grouping.
//!
//! The four terminators are the only opcodes that change which block the dispatch loop scans
//! next; everything else in this module advances straight-line like any other handler.

use crate::{
    errors::OpError,
    ops::Transfer,
    state::EvalState,
    value::{value_cmp, Value},
    vir::{BlockId, RegId},
};

/// Records the returning register and tells the dispatch loop to stop scanning blocks.
pub fn op_return(state: &mut EvalState, value: Option<RegId>) -> Transfer {
    state.result = value;
    Transfer::Return
}

pub fn op_jump(target: BlockId) -> Transfer {
    Transfer::Jump(target)
}

/// `cond v, t0, t1` takes `t0` when `v != 0`, `t1` when `v == 0`.
pub fn op_cond(state: &EvalState, test: RegId, if_true: BlockId, if_false: BlockId) -> Transfer {
    if state.reg(test).is_false() {
        Transfer::Jump(if_false)
    } else {
        Transfer::Jump(if_true)
    }
}

/// `case v, default, (k_i, t_i)+` takes the first target whose key equals `v`, else `default`.
pub fn op_case(state: &EvalState, test: RegId, default: BlockId, cases: &[(i64, BlockId)]) -> Transfer {
    let test = state.reg(test).clone();
    for &(key, target) in cases {
        if value_cmp(&test, &Value::Integer(key)) == Some(core::cmp::Ordering::Equal) {
            return Transfer::Jump(target);
        }
    }
    Transfer::Jump(default)
}

pub fn op_select(state: &mut EvalState, result: RegId, test: RegId, if_true: RegId, if_false: RegId) {
    let value = if state.reg(test).is_false() {
        state.reg(if_false).clone()
    } else {
        state.reg(if_true).clone()
    };
    state.set_reg(result, value);
}

/// The program reads an object that was never assigned — an ordinary folding failure, since the
/// VIR is free to contain paths the folder never proves unreachable.
pub fn op_undefined(state: &mut EvalState, _result: RegId) {
    state.fail(OpError::Undefined);
}

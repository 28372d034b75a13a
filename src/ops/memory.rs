//! Memory: `store`, `load`, `store-indirect`, `load-indirect`, `index`, `alloca`, `copy`.
//!
//! `store`/`load`/`index` address a variable slot, which may live in an enclosing scope —
//! resolved through [`crate::scope::resolve_var`]. The `-indirect` forms and `copy` instead
//! address the arena directly through a [`Value::Pointer`] already held in a register.

use crate::{
    heap::Heap,
    host::EvalHost,
    scope::resolve_var,
    state::{EvalState, Shared},
    value::Value,
    vir::{RegId, Unit, VarId},
};

pub fn op_store<H: EvalHost>(host: &H, unit: &Unit, shared: &mut Shared, state: &mut EvalState, address: VarId, value: RegId) {
    let value = state.reg(value).clone();
    if let Some(slot) = resolve_var(host, unit, shared, state, address) {
        *slot = value;
    }
}

pub fn op_load<H: EvalHost>(host: &H, unit: &Unit, shared: &mut Shared, state: &mut EvalState, result: RegId, address: VarId) {
    let loaded = resolve_var(host, unit, shared, state, address).cloned();
    if let Some(value) = loaded {
        state.set_reg(result, value);
    }
}

/// `index` takes the address of a constrained-array variable, exposing it as a plain pointer.
pub fn op_index<H: EvalHost>(host: &H, unit: &Unit, shared: &mut Shared, state: &mut EvalState, result: RegId, address: VarId) {
    let ptr = match resolve_var(host, unit, shared, state, address) {
        Some(Value::CArray(ptr)) => *ptr,
        Some(_) => unreachable!("index addresses a constrained-array variable"),
        None => return,
    };
    state.set_reg(result, Value::Pointer(ptr));
}

pub fn op_store_indirect(state: &mut EvalState, heap: &mut Heap, address: RegId, value: RegId) {
    let value = state.reg(value).clone();
    let ptr = state.reg(address).as_pointer().expect("store-indirect addresses a pointer");
    *heap.get_mut(ptr).expect("store-indirect target in bounds") = value;
}

pub fn op_load_indirect(state: &mut EvalState, heap: &Heap, result: RegId, address: RegId) {
    let ptr = state.reg(address).as_pointer().expect("load-indirect addresses a pointer");
    let value = heap.get(ptr).expect("load-indirect source in bounds").clone();
    state.set_reg(result, value);
}

/// `alloca count?` allocates `count` (default 1) slots from the arena, returning a pointer to the
/// first. Heap exhaustion is an ordinary folding failure, not a panic.
pub fn op_alloca(state: &mut EvalState, heap: &mut Heap, result: RegId, count: Option<RegId>) {
    let count = match count {
        Some(reg) => state.reg(reg).as_integer().expect("alloca count is an integer") as usize,
        None => 1,
    };
    match heap.alloc(count) {
        Some(ptr) => state.set_reg(result, Value::Pointer(ptr)),
        None => state.fail(crate::errors::OpError::HeapExhausted { allocated: heap.watermark(), requested: count }),
    }
}

pub fn op_copy(state: &mut EvalState, heap: &mut Heap, dst: RegId, src: RegId, count: RegId) {
    let dst = state.reg(dst).as_pointer().expect("copy destination is a pointer");
    let src = state.reg(src).as_pointer().expect("copy source is a pointer");
    let count = state.reg(count).as_integer().expect("copy count is an integer") as usize;
    heap.copy(dst, src, count);
}

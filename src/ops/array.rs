//! Arrays: `const-array`, `wrap`, `unwrap`, `uarray-len`, `uarray-left`, `uarray-right`,
//! `uarray-dir`.
//!
//! An unconstrained array is a pointer plus up to [`MAX_DIMS`] dimension descriptors. Unlike the
//! evaluator this crate replaces, the descriptor itself (`UArray`) is plain Rust data embedded in
//! the [`Value`], not a second arena allocation — there is no separate "uarray struct" pointer to
//! manage once the dimensions live in a `Vec` on the stack/heap of the host process itself.

use crate::{
    errors::OpError,
    heap::Heap,
    state::EvalState,
    value::{Dim, Dir, Value},
    vir::{RegId, MAX_DIMS},
};

fn dir_from_i64(v: i64) -> Dir {
    if v == 0 {
        Dir::To
    } else {
        Dir::Downto
    }
}

pub fn op_const_array(state: &mut EvalState, heap: &mut Heap, result: RegId, args: &[RegId]) {
    match heap.alloc(args.len()) {
        Some(ptr) => {
            for (i, &arg) in args.iter().enumerate() {
                *heap.get_mut(ptr.offset(i as i64)).unwrap() = state.reg(arg).clone();
            }
            state.set_reg(result, Value::Pointer(ptr));
        },
        None => state.fail(OpError::HeapExhausted { allocated: heap.watermark(), requested: args.len() }),
    }
}

/// `wrap arg, (left, right, dir)...` bundles a bare pointer into an unconstrained array handle.
/// More than [`MAX_DIMS`] dimensions is a folding failure, not a panic — new VIR could plausibly
/// ask for more than this interpreter was built to track.
pub fn op_wrap(state: &mut EvalState, result: RegId, arg: RegId, dims: &[(RegId, RegId, RegId)]) {
    if dims.len() > MAX_DIMS {
        state.fail(OpError::TooManyDimensions { dims: dims.len() });
        return;
    }

    let data = state.reg(arg).as_pointer().expect("wrap operates on a pointer");
    let resolved = dims
        .iter()
        .map(|&(left, right, dir)| Dim {
            left: state.reg(left).as_integer().expect("wrap dimension bound is an integer"),
            right: state.reg(right).as_integer().expect("wrap dimension bound is an integer"),
            dir: dir_from_i64(state.reg(dir).as_integer().expect("wrap direction is an integer")),
        })
        .collect();

    state.set_reg(result, Value::UArray(crate::value::UArray { data, dims: resolved }));
}

pub fn op_unwrap(state: &mut EvalState, result: RegId, arg: RegId) {
    let array = state.reg(arg).as_uarray().expect("unwrap operates on an unconstrained array");
    state.set_reg(result, Value::Pointer(array.data));
}

pub fn op_uarray_len(state: &mut EvalState, result: RegId, arg: RegId, dim: u32) {
    let array = state.reg(arg).as_uarray().expect("uarray-len operates on an unconstrained array");
    let len = array.dim(dim as usize).expect("dimension index in range").len();
    state.set_reg(result, Value::Integer(len));
}

pub fn op_uarray_left(state: &mut EvalState, result: RegId, arg: RegId, dim: u32) {
    let array = state.reg(arg).as_uarray().expect("uarray-left operates on an unconstrained array");
    let left = array.dim(dim as usize).expect("dimension index in range").left;
    state.set_reg(result, Value::Integer(left));
}

pub fn op_uarray_right(state: &mut EvalState, result: RegId, arg: RegId, dim: u32) {
    let array = state.reg(arg).as_uarray().expect("uarray-right operates on an unconstrained array");
    let right = array.dim(dim as usize).expect("dimension index in range").right;
    state.set_reg(result, Value::Integer(right));
}

pub fn op_uarray_dir(state: &mut EvalState, result: RegId, arg: RegId, dim: u32) {
    let array = state.reg(arg).as_uarray().expect("uarray-dir operates on an unconstrained array");
    let dir = array.dim(dim as usize).expect("dimension index in range").dir;
    state.set_reg(result, Value::Integer(matches!(dir, Dir::Downto) as i64));
}

use core::cmp::Ordering;

use crate::vir::MAX_DIMS;

// POINTER
// ================================================================================================

/// An arena-relative handle to a contiguous run of [`Value`]s.
///
/// A pointer never carries its own length or element type: the opcode that produced it and the
/// opcode that consumes it agree on both out of band, exactly as in the VIR it interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ptr(pub usize);

impl Ptr {
    /// Offsets this pointer by `delta` slots, as the `add pointer, integer` opcode does.
    pub fn offset(self, delta: i64) -> Ptr {
        Ptr((self.0 as i64 + delta) as usize)
    }
}

// ARRAY DIMENSIONS
// ================================================================================================

/// Direction of an array dimension's index range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    To,
    Downto,
}

/// One dimension of an unconstrained array: an index range and its direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dim {
    pub left: i64,
    pub right: i64,
    pub dir: Dir,
}

impl Dim {
    /// Length of this dimension, clamped to zero rather than going negative for an empty range.
    pub fn len(&self) -> i64 {
        let raw = match self.dir {
            Dir::To => self.right - self.left,
            Dir::Downto => self.left - self.right,
        };
        (raw + 1).max(0)
    }
}

/// An unconstrained-array handle: a pointer to element storage plus up to [`MAX_DIMS`] dimension
/// descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UArray {
    pub data: Ptr,
    pub dims: Vec<Dim>,
}

impl UArray {
    pub fn dim(&self, index: usize) -> Option<&Dim> {
        self.dims.get(index)
    }
}

// VALUE
// ================================================================================================

/// A tagged scalar, pointer, or array value held in a register, variable slot, or arena cell.
///
/// The default, `Invalid`, is what freshly allocated registers and variables of an unsupported
/// type start out as; reading one back out unchanged is the `undefined` opcode's failure case.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Invalid,
    Integer(i64),
    Real(f64),
    Pointer(Ptr),
    UArray(UArray),
    /// Constrained-array storage: a run of `size` slots in the arena, used only for variables.
    CArray(Ptr),
}

impl Default for Value {
    fn default() -> Self {
        Value::Invalid
    }
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<Ptr> {
        match self {
            Value::Pointer(p) => Some(*p),
            Value::CArray(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_uarray(&self) -> Option<&UArray> {
        match self {
            Value::UArray(u) => Some(u),
            _ => None,
        }
    }

    /// True for a zero integer (the encoding VIR uses for boolean `false`).
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Integer(0))
    }
}

/// Ordering between two values of the same kind, mirroring `eval_value_cmp` in the interpreter
/// this crate replaces: integers and pointers compare by raw value, reals compare by IEEE 754
/// total ordering except that any comparison touching `NaN` is unordered (see `cmp::compare`).
pub fn value_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Pointer(a), Value::Pointer(b)) => Some(a.0.cmp(&b.0)),
        (Value::CArray(a), Value::CArray(b)) => Some(a.0.cmp(&b.0)),
        (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_len_to() {
        let dim = Dim { left: 1, right: 10, dir: Dir::To };
        assert_eq!(dim.len(), 10);
    }

    #[test]
    fn dim_len_downto() {
        let dim = Dim { left: 10, right: 1, dir: Dir::Downto };
        assert_eq!(dim.len(), 10);
    }

    #[test]
    fn dim_len_empty_is_zero_not_negative() {
        let dim = Dim { left: 1, right: 0, dir: Dir::To };
        assert_eq!(dim.len(), 0);
    }

    #[test]
    fn value_cmp_mismatched_kinds_is_none() {
        assert_eq!(value_cmp(&Value::Integer(1), &Value::Real(1.0)), None);
    }
}

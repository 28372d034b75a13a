//! `image`: renders a scalar to its textual representation and packs it as a 1-D unconstrained
//! array of character codes over `[1, len] TO`, the VIR encoding of a `string` value.

use crate::{
    errors::OpError,
    heap::Heap,
    state::EvalState,
    value::{Dim, Dir, UArray, Value},
    vir::{ImageType, RegId},
};

/// Significant digits a real's `'IMAGE renders with, matching the host compiler's `DBL_DIG + 3`
/// (`DBL_DIG == 15` for `f64`, so `18`).
const REAL_IMAGE_DIGITS: usize = 18;

/// A reduced `%g`-style formatter: fixed notation within the usual human range, scientific
/// notation outside it, trailing zeros trimmed either way.
fn format_real(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= REAL_IMAGE_DIGITS as i32 {
        let mantissa_digits = REAL_IMAGE_DIGITS.saturating_sub(1);
        let rendered = format!("{:.*e}", mantissa_digits, value);
        trim_exponential(&rendered)
    } else {
        let decimals = (REAL_IMAGE_DIGITS as i32 - 1 - exponent).max(1) as usize;
        let rendered = format!("{:.*}", decimals, value);
        trim_fixed(&rendered)
    }
}

fn trim_fixed(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        format!("{trimmed}0.0")
    } else if !trimmed.contains('.') {
        format!("{trimmed}.0")
    } else {
        trimmed.to_string()
    }
}

fn trim_exponential(s: &str) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s.to_string();
    };
    let mantissa = trim_fixed(mantissa);
    format!("{mantissa}e{exp}")
}

fn render(value: &Value, ty: &ImageType) -> Result<String, OpError> {
    match (value, ty) {
        (Value::Integer(v), ImageType::Integer) => Ok(v.to_string()),
        (Value::Integer(v), ImageType::Enum { literal_names }) => literal_names
            .get(*v as usize)
            .cloned()
            .ok_or(OpError::UnsupportedImageType),
        (Value::Real(v), ImageType::Real) => Ok(format_real(*v)),
        (Value::Integer(v), ImageType::Physical { unit_name }) => Ok(format!("{v} {unit_name}")),
        _ => Err(OpError::UnsupportedImageType),
    }
}

pub fn op_image(state: &mut EvalState, heap: &mut Heap, result: RegId, arg: RegId, ty: &ImageType) {
    let value = state.reg(arg).clone();
    let text = match render(&value, ty) {
        Ok(text) => text,
        Err(reason) => {
            state.fail(reason);
            return;
        },
    };

    let len = text.chars().count();
    let ptr = match heap.alloc(len) {
        Some(ptr) => ptr,
        None => {
            state.fail(OpError::HeapExhausted { allocated: heap.watermark(), requested: len });
            return;
        },
    };
    for (i, ch) in text.chars().enumerate() {
        *heap.get_mut(ptr.offset(i as i64)).unwrap() = Value::Integer(ch as i64);
    }

    let dim = Dim { left: 1, right: len as i64, dir: Dir::To };
    state.set_reg(result, Value::UArray(UArray { data: ptr, dims: vec![dim] }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::Context, host::SourceLoc, vir::{Block, Unit, UnitKind}};

    fn state_with_regs(regs: Vec<Value>, heap: &mut Heap) -> EvalState {
        let unit = Unit { name: "t".into(), kind: UnitKind::Thunk, depth: 0, nregs: regs.len(), vars: vec![], blocks: vec![Block::default()], enclosing: None };
        let mut context = Context::new(&unit, heap).unwrap();
        context.regs = regs;
        EvalState::new(context, SourceLoc::default(), "t".into(), Default::default())
    }

    fn text_of(heap: &Heap, value: &Value) -> String {
        let array = value.as_uarray().unwrap();
        let len = array.dims[0].len() as usize;
        heap.slice(array.data, len)
            .unwrap()
            .iter()
            .map(|v| char::from_u32(v.as_integer().unwrap() as u32).unwrap())
            .collect()
    }

    #[test]
    fn image_of_integer_is_decimal() {
        let mut heap = Heap::new(64);
        let mut state = state_with_regs(vec![Value::Integer(42), Value::Invalid], &mut heap);
        op_image(&mut state, &mut heap, 1, 0, &ImageType::Integer);
        assert_eq!(text_of(&heap, state.reg(1)), "42");
    }

    #[test]
    fn image_of_enum_is_literal_name() {
        let mut heap = Heap::new(64);
        let mut state = state_with_regs(vec![Value::Integer(1), Value::Invalid], &mut heap);
        let ty = ImageType::Enum { literal_names: vec!["low".into(), "high".into()] };
        op_image(&mut state, &mut heap, 1, 0, &ty);
        assert_eq!(text_of(&heap, state.reg(1)), "high");
    }

    #[test]
    fn image_of_physical_includes_unit_name() {
        let mut heap = Heap::new(64);
        let mut state = state_with_regs(vec![Value::Integer(5), Value::Invalid], &mut heap);
        let ty = ImageType::Physical { unit_name: "ns".into() };
        op_image(&mut state, &mut heap, 1, 0, &ty);
        assert_eq!(text_of(&heap, state.reg(1)), "5 ns");
    }

    #[test]
    fn image_of_real_trims_trailing_zeros() {
        let mut heap = Heap::new(64);
        let mut state = state_with_regs(vec![Value::Real(2.5), Value::Invalid], &mut heap);
        op_image(&mut state, &mut heap, 1, 0, &ImageType::Real);
        assert_eq!(text_of(&heap, state.reg(1)), "2.5");
    }
}

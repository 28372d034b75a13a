use crate::{
    errors::OpError,
    heap::Heap,
    value::Value,
    vir::{Unit, UnitKind, VarType},
};

// CONTEXT
// ================================================================================================

/// A per-invocation register file and variable-slot table, with a lazily populated link to the
/// context of its lexically enclosing unit.
///
/// Once `parent` is linked it is never reassigned: the
/// chain only ever grows, and only on demand, the first time a load or store needs a variable
/// that lives in an enclosing scope. The `unit_*` fields mirror just enough of the owning unit's
/// identity to materialize further ancestors without having to carry the whole `Unit` alongside
/// every `Context` in the chain.
#[derive(Debug)]
pub struct Context {
    pub regs: Vec<Value>,
    pub vars: Vec<Value>,
    pub parent: Option<Box<Context>>,
    pub unit_depth: u32,
    pub unit_kind: UnitKind,
    pub enclosing: Option<String>,
}

impl Context {
    /// Allocates a fresh register file and variable table for `unit`, initializing each variable
    /// per its declared VIR type: integers to `0`, reals to `0.0`, unconstrained arrays to a null
    /// handle, and constrained arrays to a heap allocation of their declared size.
    pub fn new(unit: &Unit, heap: &mut Heap) -> Result<Self, OpError> {
        let regs = vec![Value::Invalid; unit.nregs];
        let mut vars = Vec::with_capacity(unit.vars.len());

        for decl in &unit.vars {
            let value = match decl.ty {
                VarType::Integer => Value::Integer(0),
                VarType::Real => Value::Real(0.0),
                VarType::UArray => Value::Invalid,
                VarType::CArray { size } => {
                    let ptr = heap
                        .alloc(size)
                        .ok_or(OpError::HeapExhausted { allocated: heap.watermark(), requested: size })?;
                    Value::CArray(ptr)
                },
                VarType::Unsupported => return Err(OpError::UnsupportedVariableType(decl.ty)),
            };
            vars.push(value);
        }

        Ok(Context {
            regs,
            vars,
            parent: None,
            unit_depth: unit.depth,
            unit_kind: unit.kind,
            enclosing: unit.enclosing.clone(),
        })
    }

    pub fn reg(&self, id: u32) -> &Value {
        &self.regs[id as usize]
    }

    pub fn set_reg(&mut self, id: u32, value: Value) {
        self.regs[id as usize] = value;
    }
}

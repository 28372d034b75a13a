//! §4.G — the folding driver: `eval(call, flags) -> literal-or-original`, the AST-rewrite pass
//! `fold(root)`, and the accumulated bounds-error counter `errors()`.

use std::cell::Cell;

use tracing::{debug, instrument};

use crate::{
    context::Context,
    dispatch,
    errors::{FatalFoldError, FoldError},
    flags::Flags,
    foldable::foldable,
    heap::Heap,
    host::{DeclKind, EvalHost, NodeKind, ScalarKind},
    options::EvalOptions,
    state::{EvalState, Shared},
    value::Value,
};

/// Drives constant folding for one host compiler. Owns the cumulative bounds-error counter,
/// exposed through `errors()`; scoped to an `Evaluator` instance rather than true global state,
/// since a library crate should not reach for a `static` where an
/// owned counter does the job just as well — the host constructs one per compilation.
#[derive(Debug, Default)]
pub struct Evaluator {
    errors: u32,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    /// Cumulative count of bounds-check errors emitted under [`Flags::BOUNDS`] across every
    /// `eval`/`fold` call made through this evaluator.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Attempts to compute `call`'s result at compile time, returning either a literal replacing
    /// it or, unchanged, `call` itself. Only `Err` for a user-program fault (division, `mod`, or
    /// `rem` by zero) serious enough that the whole compilation should halt; by the time it is
    /// returned the host has already reported it through [`EvalHost::fatal_at`].
    #[instrument(level = "trace", skip_all)]
    pub fn eval<H: EvalHost>(&mut self, host: &H, call: &H::Node, flags: Flags) -> Result<H::Node, FatalFoldError> {
        if matches!(host.scalar_kind(call), ScalarKind::NotScalar) {
            return Ok(call.clone());
        }
        if !foldable(host, call, flags) {
            return Ok(call.clone());
        }

        let opts = EvalOptions::from_env(flags);
        let call_loc = host.loc(call);
        let call_name = host.ident(&host.reference(call));

        let Some(thunk) = host.lower_thunk(call) else {
            if opts.flags().contains(Flags::WARN) {
                host.warn_at(&call_loc, &format!("cannot constant-fold call to {call_name}: VIR lowering declined"));
            }
            return Ok(call.clone());
        };

        let mut heap = Heap::new(opts.heap_cap());
        let context = match Context::new(&thunk, &mut heap) {
            Ok(ctx) => ctx,
            Err(reason) => {
                if opts.flags().contains(Flags::WARN) {
                    host.warn_at(&call_loc, &FoldError::new(call_name, reason).to_string());
                }
                return Ok(call.clone());
            },
        };

        let mut state = EvalState::new(context, call_loc.clone(), call_name.clone(), opts.flags());
        let mut steps_remaining = opts.max_steps();
        let mut shared = Shared {
            heap: &mut heap,
            errors: &mut self.errors,
            steps_remaining: &mut steps_remaining,
            max_steps: opts.max_steps(),
        };

        dispatch::run_unit(host, &thunk, &mut state, &mut shared)?;

        if state.failed {
            if opts.flags().contains(Flags::WARN) {
                let reason = state.fail_reason.clone().unwrap_or(crate::errors::OpError::Undefined);
                host.warn_at(&call_loc, &FoldError::new(call_name, reason).to_string());
            }
            return Ok(call.clone());
        }

        let Some(result_reg) = state.result else {
            host.fatal_trace("evaluation returned without setting a result register");
            return Ok(call.clone());
        };
        let value = state.reg(result_reg).clone();

        let literal = match value {
            Value::Integer(v) if matches!(host.scalar_kind(call), ScalarKind::Enum) => host.enum_lit(call, v),
            Value::Integer(v) => host.int_lit(call, v),
            Value::Real(v) => host.real_lit(call, v),
            _ => {
                host.fatal_trace("folded a non-scalar result back into the AST");
                return Ok(call.clone());
            },
        };

        if opts.flags().contains(Flags::VERBOSE) {
            host.notef(&format!("folded call to {call_name}"));
        }
        debug!(call = %call_name, "folded call to a literal");

        Ok(literal)
    }

    /// Rewrites `root` in place: every function-call node through [`Evaluator::eval`] with
    /// `FCALL | FOLDING`, and every reference to a constant declared with a literal initializer
    /// through that literal directly. Idempotent: a node `fold` already replaced with a literal
    /// is a [`NodeKind::Literal`] on the next pass and passes through unchanged.
    #[instrument(level = "trace", skip_all)]
    pub fn fold<H: EvalHost>(&mut self, host: &mut H, root: H::Node) -> Result<H::Node, FatalFoldError> {
        let fatal: Cell<Option<FatalFoldError>> = Cell::new(None);

        let rewritten = host.tree_rewrite(root, &mut |host, node| {
            if fatal.get().is_some() {
                return node;
            }
            match self.fold_one(host, &node) {
                Ok(replacement) => replacement,
                Err(err) => {
                    fatal.set(Some(err));
                    node
                },
            }
        });

        match fatal.into_inner() {
            Some(err) => Err(err),
            None => Ok(rewritten),
        }
    }

    fn fold_one<H: EvalHost>(&mut self, host: &H, node: &H::Node) -> Result<H::Node, FatalFoldError> {
        match host.kind(node) {
            NodeKind::FunctionCall => self.eval(host, node, Flags::FCALL | Flags::FOLDING),
            NodeKind::Reference => {
                let decl = host.reference(node);
                if matches!(host.decl_kind(&decl), DeclKind::ConstDecl) {
                    let init = host.const_initializer(&decl);
                    if matches!(host.kind(&init), NodeKind::Literal) {
                        return Ok(init);
                    }
                }
                Ok(node.clone())
            },
            _ => Ok(node.clone()),
        }
    }
}

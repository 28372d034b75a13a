//! The early-admission predicate (§4.D): a syntactic AST walk deciding whether a call is worth
//! lowering to VIR and interpreting at all.

use crate::{
    flags::Flags,
    host::{DeclKind, EvalHost, NodeKind, ScalarKind},
};

/// Is `node` foldable under `flags`?
///
/// A node is foldable if it belongs to one of the allowed kinds and, recursively, all of its
/// operands are too. Anything else is rejected outright, with a warning under [`Flags::WARN`].
pub fn foldable<H: EvalHost>(host: &H, node: &H::Node, flags: Flags) -> bool {
    match host.kind(node) {
        NodeKind::FunctionCall => {
            let decl = host.reference(node);
            if host.is_impure(&decl) {
                return false;
            }

            for param in host.param_values(node) {
                let is_call = matches!(host.kind(&param), NodeKind::FunctionCall);
                let is_scalar_call = is_call && !matches!(host.scalar_kind(&param), ScalarKind::NotScalar);

                if flags.contains(Flags::FOLDING) && is_scalar_call {
                    // Would have been folded already if possible — no point retrying.
                    return false;
                }
                if is_call && !flags.contains(Flags::FCALL) {
                    return false;
                }
                if !foldable(host, &param, flags) {
                    return false;
                }
            }

            true
        },

        NodeKind::Literal => true,

        NodeKind::TypeConversion => {
            match host.param_values(node).into_iter().next() {
                Some(arg) => foldable(host, &arg, flags),
                None => false,
            }
        },

        NodeKind::Reference => {
            let decl = host.reference(node);
            match host.decl_kind(&decl) {
                DeclKind::EnumLiteral | DeclKind::PhysicalUnit => true,
                DeclKind::ConstDecl => foldable(host, &host.const_initializer(&decl), flags),
                DeclKind::Other => false,
            }
        },

        NodeKind::Other => {
            if flags.contains(Flags::WARN) {
                host.warn_at(&host.loc(node), "expression prevents constant folding");
            }
            false
        },
    }
}

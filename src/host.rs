//! The narrow interface this crate consumes from its surrounding compiler.
//!
//! The front end, the VIR lowering pass, the library loader, and the diagnostic primitives are
//! all out of scope (§1) — they belong to the host compiler this crate is embedded in. Rather
//! than hard-wiring to one host's AST, the evaluator is generic over [`EvalHost`], a trait the
//! host implements once. A test-only mock lives in [`crate::testing`].

use std::sync::Arc;

use crate::vir::Unit;

// SOURCE LOCATIONS
// ================================================================================================

/// An opaque source position, used only to anchor diagnostics. The evaluator never inspects its
/// fields; it just threads locations it was handed back out to [`EvalHost`]'s diagnostic methods.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        SourceLoc { file: file.into(), line, column }
    }
}

// NODE / DECL KINDS
// ================================================================================================

/// The syntactic kind of an AST node, as far as the foldability predicate and the driver need to
/// distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    FunctionCall,
    Literal,
    TypeConversion,
    Reference,
    Other,
}

/// The kind of declaration a [`NodeKind::Reference`] resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    EnumLiteral,
    PhysicalUnit,
    ConstDecl,
    Other,
}

/// The scalar shape of a node's type, used by the driver to decide whether a result can be
/// folded back into a literal and, if so, which literal constructor to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Real,
    Enum,
    Physical,
    NotScalar,
}

// EVAL HOST
// ================================================================================================

/// The collaborator surface §6 describes, bundled into a single trait.
///
/// Implementors own the AST (`Node`), the type system, the VIR lowering pass, the library loader,
/// and diagnostic emission. This crate never constructs a `Node` except by asking the host to
/// (`int_lit`, `real_lit`, `enum_lit`) or by handing one straight back unchanged.
pub trait EvalHost {
    /// A handle into the host's AST. Cheap to clone — most hosts use an arena index or an `Rc`.
    type Node: Clone + std::fmt::Debug;

    // TREE
    // --------------------------------------------------------------------------------------------

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// The scalar shape of `node`'s type, or `NotScalar` for anything else.
    fn scalar_kind(&self, node: &Self::Node) -> ScalarKind;

    /// The declaration a reference node names.
    fn reference(&self, node: &Self::Node) -> Self::Node;

    /// Whether a function declaration is marked impure.
    fn is_impure(&self, decl: &Self::Node) -> bool;

    /// The argument value nodes of a function-call or type-conversion node.
    fn param_values(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn loc(&self, node: &Self::Node) -> SourceLoc;

    fn ident(&self, node: &Self::Node) -> String;

    fn int_lit(&self, origin: &Self::Node, value: i64) -> Self::Node;
    fn real_lit(&self, origin: &Self::Node, value: f64) -> Self::Node;
    fn enum_lit(&self, origin: &Self::Node, value: i64) -> Self::Node;

    /// The kind of declaration a [`NodeKind::Reference`]'s target is.
    fn decl_kind(&self, decl: &Self::Node) -> DeclKind;

    /// The initializer expression of a constant declaration.
    fn const_initializer(&self, decl: &Self::Node) -> Self::Node;

    /// Bottom-up rewrite of `root`: applies `visit` to every node, replacing it with whatever
    /// `visit` returns, children first. Mirrors `tree_rewrite` in the narrow interface.
    fn tree_rewrite(&mut self, root: Self::Node, visit: &mut dyn FnMut(&mut Self, Self::Node) -> Self::Node) -> Self::Node
    where
        Self: Sized;

    // VIR
    // --------------------------------------------------------------------------------------------

    /// Lowers a syntactic call into a thunk: a synthetic VIR unit with one entry block and a
    /// return register. Returns `None` if lowering declines (e.g. the call's VIR would need a
    /// feature the lowering pass does not support).
    fn lower_thunk(&self, call: &Self::Node) -> Option<Unit>;

    /// Lowers (or retrieves already-lowered) VIR for the named unit, used by the `fcall` handler
    /// when a callee has not been loaded yet.
    fn lower_unit(&self, name: &str) -> Option<Unit>;

    // LIBRARY
    // --------------------------------------------------------------------------------------------

    /// Resolves a library-qualified name to a library handle, if one is registered under it.
    fn find_library(&self, name: &str) -> Option<Self::Node>;

    /// Loads a unit from a library, triggering on-demand lowering as needed.
    fn get_unit(&self, lib: &Self::Node, unit_name: &str) -> Option<Self::Node>;

    // DIAGNOSTICS
    // --------------------------------------------------------------------------------------------

    fn note_at(&self, loc: &SourceLoc, msg: &str);
    fn warn_at(&self, loc: &SourceLoc, msg: &str);
    fn error_at(&self, loc: &SourceLoc, msg: &str);

    /// Reports a user-program fault (e.g. division by zero) and halts the whole compilation.
    /// Implementors that can't actually abort the process (tests, mocks) may still return, since
    /// callers of this method treat it as a point of no return and stop using `self` afterwards.
    fn fatal_at(&self, loc: &SourceLoc, msg: &str);

    /// Reports a contract violation — an interpreter bug, not a user error — with a backtrace.
    fn fatal_trace(&self, msg: &str);

    fn notef(&self, msg: &str);
}

//! An in-memory [`EvalHost`] mock standing in for the front end, library loader, and diagnostics
//! sink, so this crate's own unit and integration tests don't need a real compiler. Built once
//! here and re-exported to both `#[cfg(test)]` modules and `tests/` integration tests (gated
//! behind the `testing` feature for the latter).

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    host::{DeclKind, EvalHost, NodeKind, ScalarKind, SourceLoc},
    vir::Unit,
};

// NODE
// ================================================================================================

/// A self-contained AST node. Unlike a real compiler's arena-indexed tree, a [`Node`] owns its
/// children directly (`Rc` for cheap cloning) so tests can build one with no host in scope at all
/// — see [`NodeBuilder`].
#[derive(Clone, Debug)]
pub struct Node(Rc<NodeData>);

#[derive(Debug)]
enum NodeData {
    IntLit(i64),
    RealLit(f64),
    EnumLit(i64),
    Call { callee: Node, args: Vec<Node> },
    TypeConversion { arg: Node },
    Reference { decl: Node },
    FunctionDecl { impure: bool },
    ConstDecl { initializer: Node },
    EnumLiteralDecl,
    PhysicalUnitDecl,
    Other,
}

/// Builds [`Node`]s without needing a [`MockHost`] in scope — handy for the foldability
/// predicate's tests, which only ever walk the tree, never lower it.
pub struct NodeBuilder;

impl NodeBuilder {
    pub fn int_lit(value: i64) -> Node {
        Node(Rc::new(NodeData::IntLit(value)))
    }

    pub fn real_lit(value: f64) -> Node {
        Node(Rc::new(NodeData::RealLit(value)))
    }

    pub fn enum_lit(value: i64) -> Node {
        Node(Rc::new(NodeData::EnumLit(value)))
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Node {
        Node(Rc::new(NodeData::Call { callee, args }))
    }

    pub fn type_conversion(arg: Node) -> Node {
        Node(Rc::new(NodeData::TypeConversion { arg }))
    }

    pub fn reference(decl: Node) -> Node {
        Node(Rc::new(NodeData::Reference { decl }))
    }

    pub fn enum_literal_decl() -> Node {
        Node(Rc::new(NodeData::EnumLiteralDecl))
    }

    pub fn physical_unit_decl() -> Node {
        Node(Rc::new(NodeData::PhysicalUnitDecl))
    }

    pub fn other() -> Node {
        Node(Rc::new(NodeData::Other))
    }
}

fn node_key(node: &Node) -> usize {
    Rc::as_ptr(&node.0) as usize
}

// DIAGNOSTIC LOG
// ================================================================================================

/// Every message a [`MockHost`] was asked to emit, kept for tests that want to assert on
/// diagnostic output.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub fatals: Vec<String>,
}

// MOCK HOST
// ================================================================================================

/// A minimal, in-memory [`EvalHost`]. VIR units are registered directly with [`MockHost::register_unit`]
/// (by name) and thunks with [`MockHost::register_thunk`] (by node identity) — there is no real
/// lowering pass behind this mock, just lookup tables a test fills in beforehand.
#[derive(Default)]
pub struct MockHost {
    units: RefCell<HashMap<String, Unit>>,
    thunks: RefCell<HashMap<usize, Unit>>,
    libraries: RefCell<HashMap<String, Node>>,
    log: RefCell<DiagnosticLog>,
}

impl MockHost {
    pub fn new() -> Self {
        MockHost::default()
    }

    pub fn declare_function(&mut self, name: &str, impure: bool) -> Node {
        let _ = name;
        Node(Rc::new(NodeData::FunctionDecl { impure }))
    }

    pub fn declare_const(&mut self, _name: &str, initializer: Node) -> Node {
        Node(Rc::new(NodeData::ConstDecl { initializer }))
    }

    pub fn register_unit(&mut self, unit: Unit) {
        self.units.borrow_mut().insert(unit.name.clone(), unit);
    }

    pub fn register_thunk(&mut self, call: &Node, thunk: Unit) {
        self.thunks.borrow_mut().insert(node_key(call), thunk);
    }

    pub fn register_library(&mut self, name: &str) -> Node {
        let handle = Node(Rc::new(NodeData::Other));
        self.libraries.borrow_mut().insert(name.to_string(), handle.clone());
        handle
    }

    pub fn log(&self) -> DiagnosticLog {
        self.log.borrow().clone()
    }
}

impl EvalHost for MockHost {
    type Node = Node;

    fn kind(&self, node: &Node) -> NodeKind {
        match &*node.0 {
            NodeData::IntLit(_) | NodeData::RealLit(_) | NodeData::EnumLit(_) => NodeKind::Literal,
            NodeData::Call { .. } => NodeKind::FunctionCall,
            NodeData::TypeConversion { .. } => NodeKind::TypeConversion,
            NodeData::Reference { .. } => NodeKind::Reference,
            _ => NodeKind::Other,
        }
    }

    fn scalar_kind(&self, node: &Node) -> ScalarKind {
        match &*node.0 {
            NodeData::IntLit(_) => ScalarKind::Integer,
            NodeData::RealLit(_) => ScalarKind::Real,
            NodeData::EnumLit(_) => ScalarKind::Enum,
            // Mock calls are assumed scalar-integer-returning unless a test needs otherwise;
            // nothing in this crate's own tests needs a non-scalar call node.
            NodeData::Call { .. } => ScalarKind::Integer,
            _ => ScalarKind::NotScalar,
        }
    }

    fn reference(&self, node: &Node) -> Node {
        match &*node.0 {
            NodeData::Call { callee, .. } => callee.clone(),
            NodeData::Reference { decl } => decl.clone(),
            _ => node.clone(),
        }
    }

    fn is_impure(&self, decl: &Node) -> bool {
        matches!(&*decl.0, NodeData::FunctionDecl { impure: true })
    }

    fn param_values(&self, node: &Node) -> Vec<Node> {
        match &*node.0 {
            NodeData::Call { args, .. } => args.clone(),
            NodeData::TypeConversion { arg } => vec![arg.clone()],
            _ => vec![],
        }
    }

    fn loc(&self, _node: &Node) -> SourceLoc {
        SourceLoc::default()
    }

    fn ident(&self, _node: &Node) -> String {
        String::new()
    }

    fn int_lit(&self, _origin: &Node, value: i64) -> Node {
        NodeBuilder::int_lit(value)
    }

    fn real_lit(&self, _origin: &Node, value: f64) -> Node {
        NodeBuilder::real_lit(value)
    }

    fn enum_lit(&self, _origin: &Node, value: i64) -> Node {
        NodeBuilder::enum_lit(value)
    }

    fn decl_kind(&self, decl: &Node) -> DeclKind {
        match &*decl.0 {
            NodeData::ConstDecl { .. } => DeclKind::ConstDecl,
            NodeData::EnumLiteralDecl => DeclKind::EnumLiteral,
            NodeData::PhysicalUnitDecl => DeclKind::PhysicalUnit,
            _ => DeclKind::Other,
        }
    }

    fn const_initializer(&self, decl: &Node) -> Node {
        match &*decl.0 {
            NodeData::ConstDecl { initializer } => initializer.clone(),
            _ => decl.clone(),
        }
    }

    /// Rebuilds a `Call`/`TypeConversion` node only if one of its rewritten children actually
    /// changed identity, so a node whose subtree `visit` left untouched keeps the same `Rc` —
    /// important since [`MockHost::register_thunk`] keys lowering by node identity, the same way
    /// a real compiler's lowering cache would key by the AST node the front end allocated.
    fn tree_rewrite(&mut self, root: Node, visit: &mut dyn FnMut(&mut Self, Node) -> Node) -> Node {
        let rebuilt = match &*root.0 {
            NodeData::Call { callee, args } => {
                let new_args: Vec<Node> = args.iter().cloned().map(|arg| self.tree_rewrite(arg, visit)).collect();
                if new_args.iter().zip(args.iter()).all(|(new, old)| Rc::ptr_eq(&new.0, &old.0)) {
                    root.clone()
                } else {
                    Node(Rc::new(NodeData::Call { callee: callee.clone(), args: new_args }))
                }
            },
            NodeData::TypeConversion { arg } => {
                let new_arg = self.tree_rewrite(arg.clone(), visit);
                if Rc::ptr_eq(&new_arg.0, &arg.0) {
                    root.clone()
                } else {
                    Node(Rc::new(NodeData::TypeConversion { arg: new_arg }))
                }
            },
            _ => root.clone(),
        };
        visit(self, rebuilt)
    }

    fn lower_thunk(&self, call: &Node) -> Option<Unit> {
        self.thunks.borrow().get(&node_key(call)).cloned()
    }

    fn lower_unit(&self, name: &str) -> Option<Unit> {
        self.units.borrow().get(name).cloned()
    }

    fn find_library(&self, name: &str) -> Option<Node> {
        self.libraries.borrow().get(name).cloned()
    }

    fn get_unit(&self, _lib: &Node, _unit_name: &str) -> Option<Node> {
        None
    }

    fn note_at(&self, _loc: &SourceLoc, msg: &str) {
        self.log.borrow_mut().notes.push(msg.to_string());
    }

    fn warn_at(&self, _loc: &SourceLoc, msg: &str) {
        self.log.borrow_mut().warnings.push(msg.to_string());
    }

    fn error_at(&self, _loc: &SourceLoc, msg: &str) {
        self.log.borrow_mut().errors.push(msg.to_string());
    }

    fn fatal_at(&self, _loc: &SourceLoc, msg: &str) {
        self.log.borrow_mut().fatals.push(msg.to_string());
    }

    fn fatal_trace(&self, msg: &str) {
        self.log.borrow_mut().fatals.push(msg.to_string());
    }

    fn notef(&self, msg: &str) {
        self.log.borrow_mut().notes.push(msg.to_string());
    }
}

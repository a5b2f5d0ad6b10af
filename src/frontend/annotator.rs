//! Annotation pass for Glitteral
//!
//! A single preorder walk that stamps every node with the global table as it
//! stood when the node was visited, the lexically visible parameters and loop
//! indices, whether the node is a statement, and whether it is a mutable
//! container. Definitions grow the global table as they are met, so a name is
//! visible to everything visited after its definition and to nothing before.

use std::rc::Rc;

use log::debug;

use crate::frontend::ast::*;
use crate::stdlib::BuiltinRegistry;

/// The annotator; owns the global table of one compilation
pub struct Annotator {
    globals: Environment,
}

impl Annotator {
    /// A fresh annotator whose global table holds only the builtins
    pub fn new(registry: &BuiltinRegistry) -> Self {
        Self {
            globals: registry.seed_environment(),
        }
    }

    /// The global table as it stands now
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Annotate a sequence of top-level nodes in order
    pub fn annotate(&mut self, nodes: &mut [Node]) {
        let scope = Environment::new();
        for node in nodes.iter_mut() {
            self.visit(node, &scope, true);
        }
    }

    fn visit(&mut self, node: &mut Node, local_scope: &Environment, statement_position: bool) {
        node.annotations.global_snapshot = Some(self.globals.clone());
        node.annotations.local_scope = Some(local_scope.clone());
        node.annotations.statement_position = Some(statement_position);
        node.annotations.mutable = Some(node.is_mutable_kind());

        self.bind(node, local_scope);

        let scope = child_scope(node, local_scope);
        let positions = child_positions(node);
        for (child, position) in node.children_mut().into_iter().zip(positions) {
            self.visit(child, &scope, position);
        }
    }

    /// Enter the names a definition introduces into the global table
    fn bind(&mut self, node: &mut Node, local_scope: &Environment) {
        if let NodeKind::Definition { identifier, value } = &mut node.kind {
            if let (Some(name), NodeKind::Associative { identifier: back_reference, .. }) =
                (identifier.identifier_name(), &mut value.kind)
            {
                *back_reference = Some(name.to_string());
            }
        }

        let binding = match &node.kind {
            NodeKind::Definition { identifier, value } => identifier.identifier_name().map(|name| {
                let mut value = value.unannotated();
                remember_scope(&mut value, &self.globals, local_scope);
                (name.to_string(), value)
            }),
            NodeKind::NamedFunctionDefinition { name, .. } => name
                .identifier_name()
                .map(|name| (name.to_string(), node.unannotated())),
            _ => None,
        };
        if let Some((name, value)) = binding {
            debug!("binding global {}", name);
            self.globals.insert(name, Binding::Node(Rc::new(value)));
        }
    }
}

/// Stamp a bound value with the tables its definition saw, so identifiers
/// inside it can still be resolved from the binding alone
fn remember_scope(node: &mut Node, globals: &Environment, local_scope: &Environment) {
    node.annotations.global_snapshot = Some(globals.clone());
    node.annotations.local_scope = Some(local_scope.clone());
    for child in node.children_mut() {
        remember_scope(child, globals, local_scope);
    }
}

/// The local scope a node's children see
fn child_scope(node: &Node, local_scope: &Environment) -> Environment {
    let mut scope = local_scope.clone();
    match &node.kind {
        NodeKind::NamedFunctionDefinition { arguments, .. } => {
            for argument in arguments {
                if let NodeKind::Atom(Atom::Argument { name, .. }) = &argument.kind {
                    scope.insert(name.clone(), Binding::Node(Rc::new(argument.unannotated())));
                }
            }
        }
        NodeKind::DeterminateIteration { index_identifier, iterable, .. } => {
            if let Some(name) = index_identifier.identifier_name() {
                scope.insert(name.to_string(), Binding::Iteration(Rc::new(iterable.unannotated())));
            }
        }
        _ => {}
    }
    scope
}

/// Statement-position flags for a node's children, in `children_mut` order.
///
/// Structural slots (conditions, operands, elements, names, values) hold
/// expressions. Body elements are statements, except the last element of a
/// function body or `do` block, which is the body's value.
fn child_positions(node: &Node) -> Vec<bool> {
    let count = node.children().len();
    match &node.kind {
        NodeKind::NamedFunctionDefinition { arguments, body, .. } => {
            let mut positions = vec![false; 1 + arguments.len()];
            positions.extend(valued_body(body.len()));
            positions
        }
        NodeKind::DoBlock { body } => valued_body(body.len()),
        NodeKind::SingleBranchConditional { body, .. } | NodeKind::IndeterminateIteration { body, .. } => {
            let mut positions = vec![false];
            positions.extend(vec![true; body.len()]);
            positions
        }
        NodeKind::DeterminateIteration { body, .. } => {
            let mut positions = vec![false, false];
            positions.extend(vec![true; body.len()]);
            positions
        }
        _ => vec![false; count],
    }
}

fn valued_body(length: usize) -> Vec<bool> {
    (0..length).map(|index| index + 1 < length).collect()
}

//! Abstract Syntax Tree definitions for Glitteral
//!
//! Nodes are built once by the parser. The only later writes are the
//! annotation slots and the associative back-reference, both filled by the
//! annotator.

use std::fmt;
use std::rc::Rc;

use crate::frontend::token::TypeSpecifier;
use crate::utils::Span;

/// What an identifier is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A definition's value, a function definition, an argument atom or a
    /// builtin atom
    Node(Rc<Node>),
    /// A loop index; wraps the iterable expression
    Iteration(Rc<Node>),
}

impl Binding {
    pub fn node(&self) -> &Node {
        match self {
            Binding::Node(node) | Binding::Iteration(node) => node,
        }
    }
}

/// Identifier name to binding; persistent, so snapshots are cheap
pub type Environment = im::HashMap<String, Binding>;

/// Slots filled by the annotator
#[derive(Clone, Default)]
pub struct Annotations {
    /// The global table as it was when this node was visited
    pub global_snapshot: Option<Environment>,
    /// Lexically visible parameters and loop indices
    pub local_scope: Option<Environment>,
    /// Whether the generated code for this node must terminate itself
    pub statement_position: Option<bool>,
    /// True only for List and Dictionary values
    pub mutable: Option<bool>,
}

impl Annotations {
    pub fn is_complete(&self) -> bool {
        self.global_snapshot.is_some()
            && self.local_scope.is_some()
            && self.statement_position.is_some()
            && self.mutable.is_some()
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |environment: &Option<Environment>| {
            environment.as_ref().map(|environment| {
                let mut names: Vec<&String> = environment.keys().collect();
                names.sort();
                names.into_iter().cloned().collect::<Vec<_>>()
            })
        };
        f.debug_struct("Annotations")
            .field("global_snapshot", &names(&self.global_snapshot))
            .field("local_scope", &names(&self.local_scope))
            .field("statement_position", &self.statement_position)
            .field("mutable", &self.mutable)
            .finish()
    }
}

/// An AST node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub annotations: Annotations,
}

/// Nodes compare by structure; annotations and spans are ignored
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Sequential literal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialKind {
    /// [1 2 3], mutable
    List,
    /// |1 2 3|, immutable
    Vector,
}

/// Associative literal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociativeKind {
    /// {k v; k v;}, mutable
    Dictionary,
    /// {{k v; k v;}}, immutable
    Hashtable,
}

/// One construct per variant
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// :=λ name |a ^int| → ^int
    NamedFunctionDefinition {
        name: Box<Node>,
        /// Argument atoms
        arguments: Vec<Node>,
        return_type: TypeSpecifier,
        body: Vec<Node>,
    },
    /// := identifier value
    Definition {
        identifier: Box<Node>,
        value: Box<Node>,
    },
    /// do —
    DoBlock { body: Vec<Node> },
    /// _:= collection key value
    SubscriptAssignment {
        collection: Box<Node>,
        key: Box<Node>,
        value: Box<Node>,
    },
    /// if condition —
    Conditional {
        condition: Box<Node>,
        consequent: Box<Node>,
        alternative: Option<Box<Node>>,
    },
    /// when condition —
    SingleBranchConditional {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    /// for |index iterable|—
    DeterminateIteration {
        index_identifier: Box<Node>,
        iterable: Box<Node>,
        body: Vec<Node>,
    },
    /// while condition —
    IndeterminateIteration {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    /// (function arguments...)
    Application {
        function: Box<Node>,
        arguments: Vec<Node>,
    },
    Sequential {
        kind: SequentialKind,
        elements: Vec<Node>,
    },
    Associative {
        kind: AssociativeKind,
        associations: Vec<(Node, Node)>,
        /// The identifier a definition binds this literal to
        identifier: Option<String>,
    },
    Atom(Atom),
}

/// Leaf values
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Identifier(String),
    /// A declared function parameter
    Argument {
        name: String,
        type_specifier: TypeSpecifier,
    },
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Void,
    TypeSpecifier(TypeSpecifier),
    /// A builtin binding; holds the target-language function name
    Builtin(String),
    /// A reserved symbol (`—`, `→`) met in expression position
    Reserved(String),
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            annotations: Annotations::default(),
        }
    }

    pub fn atom(atom: Atom, span: Span) -> Self {
        Self::new(NodeKind::Atom(atom), span)
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::atom(Atom::Identifier(name.into()), span)
    }

    /// The name, if this node is an identifier atom
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Atom(Atom::Identifier(name)) => Some(name),
            _ => None,
        }
    }

    /// Lists and dictionaries may be mutated in place; nothing else may
    pub fn is_mutable_kind(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Sequential { kind: SequentialKind::List, .. }
                | NodeKind::Associative { kind: AssociativeKind::Dictionary, .. }
        )
    }

    /// A copy of this node with every annotation slot cleared
    pub fn unannotated(&self) -> Node {
        let mut copy = self.clone();
        copy.clear_annotations();
        copy
    }

    fn clear_annotations(&mut self) {
        self.annotations = Annotations::default();
        for child in self.children_mut() {
            child.clear_annotations();
        }
    }

    /// Immediate children, in source order
    pub fn children(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::NamedFunctionDefinition { name, arguments, body, .. } => {
                children.push(name);
                children.extend(arguments);
                children.extend(body);
            }
            NodeKind::Definition { identifier, value } => {
                children.push(identifier);
                children.push(value);
            }
            NodeKind::DoBlock { body } => children.extend(body),
            NodeKind::SubscriptAssignment { collection, key, value } => {
                children.extend([&**collection, &**key, &**value]);
            }
            NodeKind::Conditional { condition, consequent, alternative } => {
                children.push(condition);
                children.push(consequent);
                if let Some(alternative) = alternative {
                    children.push(alternative);
                }
            }
            NodeKind::SingleBranchConditional { condition, body }
            | NodeKind::IndeterminateIteration { condition, body } => {
                children.push(condition);
                children.extend(body);
            }
            NodeKind::DeterminateIteration { index_identifier, iterable, body } => {
                children.push(index_identifier);
                children.push(iterable);
                children.extend(body);
            }
            NodeKind::Application { function, arguments } => {
                children.push(function);
                children.extend(arguments);
            }
            NodeKind::Sequential { elements, .. } => children.extend(elements),
            NodeKind::Associative { associations, .. } => {
                for (key, value) in associations {
                    children.push(key);
                    children.push(value);
                }
            }
            NodeKind::Atom(_) => {}
        }
        children
    }

    /// Immediate children, mutably, in source order
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        let mut children: Vec<&mut Node> = Vec::new();
        match &mut self.kind {
            NodeKind::NamedFunctionDefinition { name, arguments, body, .. } => {
                children.push(name);
                children.extend(arguments.iter_mut());
                children.extend(body.iter_mut());
            }
            NodeKind::Definition { identifier, value } => {
                children.push(identifier);
                children.push(value);
            }
            NodeKind::DoBlock { body } => children.extend(body.iter_mut()),
            NodeKind::SubscriptAssignment { collection, key, value } => {
                children.push(collection);
                children.push(key);
                children.push(value);
            }
            NodeKind::Conditional { condition, consequent, alternative } => {
                children.push(condition);
                children.push(consequent);
                if let Some(alternative) = alternative {
                    children.push(alternative);
                }
            }
            NodeKind::SingleBranchConditional { condition, body }
            | NodeKind::IndeterminateIteration { condition, body } => {
                children.push(condition);
                children.extend(body.iter_mut());
            }
            NodeKind::DeterminateIteration { index_identifier, iterable, body } => {
                children.push(index_identifier);
                children.push(iterable);
                children.extend(body.iter_mut());
            }
            NodeKind::Application { function, arguments } => {
                children.push(function);
                children.extend(arguments.iter_mut());
            }
            NodeKind::Sequential { elements, .. } => children.extend(elements.iter_mut()),
            NodeKind::Associative { associations, .. } => {
                for (key, value) in associations.iter_mut() {
                    children.push(key);
                    children.push(value);
                }
            }
            NodeKind::Atom(_) => {}
        }
        children
    }

    /// This node and all of its descendants, preorder
    pub fn descendants(&self) -> Vec<&Node> {
        let mut nodes = vec![self];
        for child in self.children() {
            nodes.extend(child.descendants());
        }
        nodes
    }

    /// Construct name, for diagnostics
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            NodeKind::NamedFunctionDefinition { .. } => "named function definition",
            NodeKind::Definition { .. } => "definition",
            NodeKind::DoBlock { .. } => "do block",
            NodeKind::SubscriptAssignment { .. } => "subscript assignment",
            NodeKind::Conditional { .. } => "conditional",
            NodeKind::SingleBranchConditional { .. } => "single-branch conditional",
            NodeKind::DeterminateIteration { .. } => "determinate iteration",
            NodeKind::IndeterminateIteration { .. } => "indeterminate iteration",
            NodeKind::Application { .. } => "application",
            NodeKind::Sequential { kind: SequentialKind::List, .. } => "list",
            NodeKind::Sequential { kind: SequentialKind::Vector, .. } => "vector",
            NodeKind::Associative { kind: AssociativeKind::Dictionary, .. } => "dictionary",
            NodeKind::Associative { kind: AssociativeKind::Hashtable, .. } => "hashtable",
            NodeKind::Atom(atom) => match atom {
                Atom::Identifier(_) => "identifier",
                Atom::Argument { .. } => "argument",
                Atom::Integer(_) => "integer",
                Atom::Float(_) => "float",
                Atom::String(_) => "string",
                Atom::Boolean(_) => "boolean",
                Atom::Void => "void",
                Atom::TypeSpecifier(_) => "type specifier",
                Atom::Builtin(_) => "builtin",
                Atom::Reserved(_) => "reserved symbol",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Node {
        Node::atom(Atom::Integer(n), Span::dummy())
    }

    #[test]
    fn test_equality_ignores_spans_and_annotations() {
        let mut annotated = Node::new(
            NodeKind::Sequential {
                kind: SequentialKind::List,
                elements: vec![int(1), int(2)],
            },
            Span::new(3, 9),
        );
        annotated.annotations.mutable = Some(true);
        let plain = Node::new(
            NodeKind::Sequential {
                kind: SequentialKind::List,
                elements: vec![int(1), int(2)],
            },
            Span::dummy(),
        );
        assert_eq!(annotated, plain);
        assert!(annotated.annotations.mutable.is_some());
        assert!(annotated.unannotated().annotations.mutable.is_none());
    }

    #[test]
    fn test_mutable_kinds() {
        let list = Node::new(
            NodeKind::Sequential { kind: SequentialKind::List, elements: vec![] },
            Span::dummy(),
        );
        let vector = Node::new(
            NodeKind::Sequential { kind: SequentialKind::Vector, elements: vec![] },
            Span::dummy(),
        );
        let hashtable = Node::new(
            NodeKind::Associative {
                kind: AssociativeKind::Hashtable,
                associations: vec![],
                identifier: None,
            },
            Span::dummy(),
        );
        assert!(list.is_mutable_kind());
        assert!(!vector.is_mutable_kind());
        assert!(!hashtable.is_mutable_kind());
        assert!(!int(3).is_mutable_kind());
    }

    #[test]
    fn test_descendants_are_preorder() {
        let application = Node::new(
            NodeKind::Application {
                function: Box::new(Node::identifier("f", Span::dummy())),
                arguments: vec![int(1), int(2)],
            },
            Span::dummy(),
        );
        let described: Vec<&str> = application.descendants().iter().map(|n| n.describe()).collect();
        assert_eq!(described, vec!["application", "identifier", "integer", "integer"]);
    }
}

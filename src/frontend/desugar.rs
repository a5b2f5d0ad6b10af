//! Comprehension lowering
//!
//! `(map f xs)` has no direct rendering. Before annotation every such call is
//! rewritten into a temporary list, a loop appending `(f element)` for each
//! element of `xs`, and a reference to the temporary. The definition and the
//! loop are hoisted into the nearest enclosing body, right before the
//! statement holding the call. Conditional branches and loop conditions are
//! not always evaluated once, so a call inside one becomes a `do` block
//! carrying its own accumulator and loop.

use log::debug;

use crate::frontend::ast::*;
use crate::utils::Span;

/// Name of the comprehension builtin
const COMPREHENSION: &str = "map";

/// Rewrites comprehension calls; one per compilation
pub struct Desugarer {
    counter: usize,
}

impl Desugarer {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Lower every comprehension in a top-level node sequence
    pub fn desugar(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        self.desugar_body(nodes)
    }

    fn desugar_body(&mut self, body: Vec<Node>) -> Vec<Node> {
        let mut lowered = Vec::with_capacity(body.len());
        for mut statement in body {
            let mut hoisted = Vec::new();
            self.lower(&mut statement, &mut hoisted);
            lowered.extend(hoisted);
            lowered.push(statement);
        }
        lowered
    }

    /// Rewrite `node` in place; synthesized statements go to `hoisted`
    fn lower(&mut self, node: &mut Node, hoisted: &mut Vec<Node>) {
        let span = node.span;
        match &mut node.kind {
            NodeKind::NamedFunctionDefinition { body, .. } | NodeKind::DoBlock { body } => {
                *body = self.desugar_body(std::mem::take(body));
            }
            NodeKind::SingleBranchConditional { condition, body } => {
                self.lower(condition, hoisted);
                *body = self.desugar_body(std::mem::take(body));
            }
            NodeKind::IndeterminateIteration { condition, body } => {
                self.lower_in_place(condition);
                *body = self.desugar_body(std::mem::take(body));
            }
            NodeKind::Conditional { condition, consequent, alternative } => {
                self.lower(condition, hoisted);
                self.lower_in_place(consequent);
                if let Some(alternative) = alternative {
                    self.lower_in_place(alternative);
                }
            }
            NodeKind::DeterminateIteration { iterable, body, .. } => {
                self.lower(iterable, hoisted);
                *body = self.desugar_body(std::mem::take(body));
            }
            NodeKind::Application { function, arguments }
                if function.identifier_name() == Some(COMPREHENSION) && arguments.len() == 2 =>
            {
                for argument in arguments.iter_mut() {
                    self.lower(argument, hoisted);
                }
                let sequence = arguments.pop();
                let transform = arguments.pop();
                if let (Some(transform), Some(sequence)) = (transform, sequence) {
                    let name = self.comprehend(transform, sequence, span, hoisted);
                    *node = Node::identifier(name, span);
                }
            }
            _ => {
                for child in node.children_mut() {
                    self.lower(child, hoisted);
                }
            }
        }
    }

    /// Lower an expression that runs on its own schedule; anything it needs
    /// hoisted is wrapped together with it into a `do` block
    fn lower_in_place(&mut self, node: &mut Node) {
        let mut hoisted = Vec::new();
        self.lower(node, &mut hoisted);
        if hoisted.is_empty() {
            return;
        }
        let span = node.span;
        let value = std::mem::replace(node, Node::new(NodeKind::DoBlock { body: Vec::new() }, span));
        hoisted.push(value);
        *node = Node::new(NodeKind::DoBlock { body: hoisted }, span);
    }

    /// Emit the accumulator and its loop; returns the accumulator's name
    fn comprehend(&mut self, transform: Node, sequence: Node, span: Span, hoisted: &mut Vec<Node>) -> String {
        let accumulator = format!("_comprehension_{}", self.counter);
        let element = format!("_element_{}", self.counter);
        self.counter += 1;
        debug!("lowering comprehension into {}", accumulator);

        hoisted.push(Node::new(
            NodeKind::Definition {
                identifier: Box::new(Node::identifier(accumulator.as_str(), span)),
                value: Box::new(Node::new(
                    NodeKind::Sequential {
                        kind: SequentialKind::List,
                        elements: Vec::new(),
                    },
                    span,
                )),
            },
            span,
        ));

        let transformed = Node::new(
            NodeKind::Application {
                function: Box::new(transform),
                arguments: vec![Node::identifier(element.as_str(), span)],
            },
            span,
        );
        let append = Node::new(
            NodeKind::Application {
                function: Box::new(Node::identifier("append!", span)),
                arguments: vec![Node::identifier(accumulator.as_str(), span), transformed],
            },
            span,
        );
        hoisted.push(Node::new(
            NodeKind::DeterminateIteration {
                index_identifier: Box::new(Node::identifier(element, span)),
                iterable: Box::new(sequence),
                body: vec![append],
            },
            span,
        ));
        accumulator
    }
}

impl Default for Desugarer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::parser::parse;

    fn desugar_source(source: &str) -> Vec<Node> {
        let nodes = parse(tokenize(source).unwrap()).unwrap();
        Desugarer::new().desugar(nodes)
    }

    #[test]
    fn test_comprehension_is_hoisted_before_its_statement() {
        let nodes = desugar_source(":= xs [1 2]\n:= ys (map double xs)");
        let described: Vec<&str> = nodes.iter().map(|n| n.describe()).collect();
        assert_eq!(
            described,
            vec!["definition", "definition", "determinate iteration", "definition"]
        );
        match &nodes[3].kind {
            NodeKind::Definition { value, .. } => {
                assert_eq!(value.identifier_name(), Some("_comprehension_0"));
            }
            other => panic!("expected a definition, got {:?}", other),
        }
        match &nodes[2].kind {
            NodeKind::DeterminateIteration { index_identifier, iterable, body } => {
                assert_eq!(index_identifier.identifier_name(), Some("_element_0"));
                assert_eq!(iterable.identifier_name(), Some("xs"));
                assert_eq!(body.len(), 1);
                match &body[0].kind {
                    NodeKind::Application { function, arguments } => {
                        assert_eq!(function.identifier_name(), Some("append!"));
                        assert_eq!(arguments[0].identifier_name(), Some("_comprehension_0"));
                    }
                    other => panic!("expected append!, got {:?}", other),
                }
            }
            other => panic!("expected a loop, got {:?}", other),
        }
    }

    #[test]
    fn test_comprehension_inside_function_body_stays_there() {
        let nodes = desugar_source(":=λ doubled |xs ^list| → ^list\n   (map double xs)");
        assert_eq!(nodes.len(), 1);
        match &nodes[0].kind {
            NodeKind::NamedFunctionDefinition { body, .. } => {
                let described: Vec<&str> = body.iter().map(|n| n.describe()).collect();
                assert_eq!(described, vec!["definition", "determinate iteration", "identifier"]);
            }
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_comprehensions_get_fresh_names() {
        let nodes = desugar_source("(println (map f (map g xs)))");
        let names: Vec<&str> = nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Definition { identifier, .. } => identifier.identifier_name(),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["_comprehension_0", "_comprehension_1"]);
    }

    #[test]
    fn test_comprehension_in_a_branch_stays_in_the_branch() {
        let nodes = desugar_source("if Falsity —\n   (println (map noisy xs))\n   (println 0)");
        assert_eq!(nodes.len(), 1);
        match &nodes[0].kind {
            NodeKind::Conditional { consequent, alternative, .. } => {
                match &consequent.kind {
                    NodeKind::DoBlock { body } => {
                        let described: Vec<&str> = body.iter().map(|n| n.describe()).collect();
                        assert_eq!(described, vec!["definition", "determinate iteration", "application"]);
                    }
                    other => panic!("expected a do block, got {:?}", other),
                }
                assert!(matches!(alternative.as_deref().map(|n| &n.kind), Some(NodeKind::Application { .. })));
            }
            other => panic!("expected a conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_comprehension_in_a_loop_condition_is_rebuilt_every_pass() {
        let nodes = desugar_source("while (< (length (map f xs)) 3) —\n   (print 1)");
        assert_eq!(nodes.len(), 1);
        match &nodes[0].kind {
            NodeKind::IndeterminateIteration { condition, .. } => match &condition.kind {
                NodeKind::DoBlock { body } => {
                    let described: Vec<&str> = body.iter().map(|n| n.describe()).collect();
                    assert_eq!(described, vec!["definition", "determinate iteration", "application"]);
                }
                other => panic!("expected a do block, got {:?}", other),
            },
            other => panic!("expected a while loop, got {:?}", other),
        }
    }

    #[test]
    fn test_other_calls_are_untouched() {
        let nodes = desugar_source("(map f)\n(println xs)");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0].kind, NodeKind::Application { .. }));
    }
}

//! Rust Code Generator
//!
//! Renders annotated Glitteral nodes as Rust source. Every identifier is
//! resolved through the scope stamps the annotator left on its node, so the
//! generator itself keeps no symbol table.

use crate::backend::codegen::CodeGen;
use crate::frontend::ast::*;
use crate::frontend::token::TypeSpecifier;
use crate::stdlib::{BuiltinFunc, BuiltinRegistry, StaticKind};
use crate::utils::{Error, Result};

const INDENT: &str = "    ";

/// Prelude functions that return a fresh list
const LIST_PRODUCERS: &[&str] = &["range"];

/// Rust code generator
pub struct RustCodeGen<'r> {
    registry: &'r BuiltinRegistry,
}

impl<'r> RustCodeGen<'r> {
    pub fn new(registry: &'r BuiltinRegistry) -> Self {
        Self { registry }
    }

    /// Render one annotated node, with its terminator when it needs one
    pub fn render(&self, node: &Node) -> Result<String> {
        let statement_position = self.statement_position(node)?;
        let code = self.render_kind(node)?;
        if statement_position && takes_terminator(node) {
            Ok(code + ";")
        } else {
            Ok(code)
        }
    }

    fn statement_position(&self, node: &Node) -> Result<bool> {
        match node.annotations.statement_position {
            Some(position) if node.annotations.is_complete() => Ok(position),
            _ => Err(Error::Unannotated {
                construct: node.describe().to_string(),
                span: node.span,
            }),
        }
    }

    fn render_kind(&self, node: &Node) -> Result<String> {
        match &node.kind {
            NodeKind::NamedFunctionDefinition { name, arguments, return_type, body } => {
                self.render_function(name, arguments, *return_type, body)
            }
            NodeKind::Definition { identifier, value } => self.render_definition(identifier, value),
            NodeKind::DoBlock { body } => self.render_block(body),
            NodeKind::SubscriptAssignment { collection, key, value } => {
                let target = self.render(collection)?;
                let key_code = self.render(key)?;
                let value_code = self.render(value)?;
                match static_kind(collection) {
                    StaticKind::Sequential => Ok(format!("{}[{} as usize] = {}", target, key_code, value_code)),
                    StaticKind::Associative => Ok(format!("{}.insert({}, {})", target, key_code, value_code)),
                    StaticKind::Other => Err(Error::NoSpecialization {
                        builtin: "_:=".to_string(),
                        argument: collection.describe().to_string(),
                        span: collection.span,
                    }),
                }
            }
            NodeKind::Conditional { condition, consequent, alternative } => {
                let mut code = format!(
                    "if {} {{\n{}\n}}",
                    self.render(condition)?,
                    indent(&self.render(consequent)?)
                );
                if let Some(alternative) = alternative {
                    code.push_str(&format!(" else {{\n{}\n}}", indent(&self.render(alternative)?)));
                }
                Ok(code)
            }
            NodeKind::SingleBranchConditional { condition, body } => {
                Ok(format!("if {} {}", self.render(condition)?, self.render_block(body)?))
            }
            NodeKind::DeterminateIteration { index_identifier, iterable, body } => {
                let index = match index_identifier.identifier_name() {
                    Some(name) => sanitize_identifier(name),
                    None => return Err(unrenderable(index_identifier)),
                };
                let iterable_code = match iterable.identifier_name() {
                    Some(_) => format!("{}.clone()", self.render(iterable)?),
                    None => self.render(iterable)?,
                };
                Ok(format!("for {} in {} {}", index, iterable_code, self.render_block(body)?))
            }
            NodeKind::IndeterminateIteration { condition, body } => {
                Ok(format!("while {} {}", self.render(condition)?, self.render_block(body)?))
            }
            NodeKind::Application { function, arguments } => self.render_application(function, arguments),
            NodeKind::Sequential { elements, .. } => {
                let elements = elements.iter().map(|e| self.render(e)).collect::<Result<Vec<_>>>()?;
                Ok(format!("vec![{}]", elements.join(", ")))
            }
            NodeKind::Associative { .. } => Err(Error::UnboundAssociative { span: node.span }),
            NodeKind::Atom(atom) => self.render_atom(node, atom),
        }
    }

    fn render_atom(&self, node: &Node, atom: &Atom) -> Result<String> {
        match atom {
            Atom::Identifier(name) => match lookup(node, name) {
                Some(binding) => match &binding.node().kind {
                    NodeKind::Atom(Atom::Builtin(target_name)) => Ok(target_name.clone()),
                    _ => Ok(sanitize_identifier(name)),
                },
                None => Err(Error::UnboundIdentifier {
                    name: name.clone(),
                    span: node.span,
                }),
            },
            Atom::Integer(value) => Ok(format!("{}isize", value)),
            Atom::Float(value) => Ok(format!("{}f64", value)),
            Atom::String(text) => Ok(format!("{:?}", text)),
            Atom::Boolean(value) => Ok(value.to_string()),
            Atom::Void => Ok("()".to_string()),
            Atom::Argument { .. } | Atom::TypeSpecifier(_) | Atom::Builtin(_) | Atom::Reserved(_) => {
                Err(unrenderable(node))
            }
        }
    }

    fn render_function(
        &self,
        name: &Node,
        arguments: &[Node],
        return_type: TypeSpecifier,
        body: &[Node],
    ) -> Result<String> {
        let name = name.identifier_name().ok_or_else(|| unrenderable(name))?;
        let parameters = arguments
            .iter()
            .map(|argument| match &argument.kind {
                NodeKind::Atom(Atom::Argument { name, type_specifier }) => match parameter_type(*type_specifier) {
                    Some(rust_type) => Ok(format!("{}: {}", sanitize_identifier(name), rust_type)),
                    None => Err(unrenderable(argument)),
                },
                _ => Err(unrenderable(argument)),
            })
            .collect::<Result<Vec<_>>>()?;
        let signature = match return_type_of(return_type) {
            Some(rust_type) => format!(" -> {}", rust_type),
            None => String::new(),
        };
        Ok(format!(
            "fn {}({}){} {}",
            sanitize_identifier(name),
            parameters.join(", "),
            signature,
            self.render_block(body)?
        ))
    }

    fn render_definition(&self, identifier: &Node, value: &Node) -> Result<String> {
        let name = identifier
            .identifier_name()
            .map(sanitize_identifier)
            .ok_or_else(|| unrenderable(identifier))?;

        if let NodeKind::Associative { kind, associations, identifier: bound_to } = &value.kind {
            self.statement_position(value)?;
            if bound_to.is_none() {
                return Err(Error::UnboundAssociative { span: value.span });
            }
            let mut lines = vec![format!("let mut {} = HashMap::new();", name)];
            for (key, entry) in associations {
                lines.push(format!("{}.insert({}, {});", name, self.render(key)?, self.render(entry)?));
            }
            if *kind == AssociativeKind::Hashtable {
                lines.push(format!("let {} = {};", name, name));
            }
            return Ok(lines.join("\n"));
        }

        let mutable = value.annotations.mutable == Some(true) || borrow_of(value) == EXCLUSIVE;
        let binding = if mutable { "let mut" } else { "let" };
        Ok(format!("{} {} = {};", binding, name, self.render(value)?))
    }

    fn render_application(&self, function: &Node, arguments: &[Node]) -> Result<String> {
        let mut callee = self.render(function)?;
        if let Some(specialization) = self
            .builtin(function)
            .and_then(|builtin| builtin.specialization.as_ref())
        {
            let kind = arguments.first().map_or(StaticKind::Other, static_kind);
            callee = match specialization.resolve(kind) {
                Some(target_name) => target_name.to_string(),
                None => {
                    return Err(Error::NoSpecialization {
                        builtin: function.identifier_name().unwrap_or(&callee).to_string(),
                        argument: arguments.first().map_or("no argument", |first| first.describe()).to_string(),
                        span: function.span,
                    })
                }
            };
        }
        let arguments = arguments
            .iter()
            .map(|argument| self.render_argument(argument))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{}({})", callee, arguments.join(", ")))
    }

    /// Containers are lent, never moved, into calls
    fn render_argument(&self, argument: &Node) -> Result<String> {
        let code = self.render(argument)?;
        Ok(format!("{}{}", borrow_of(argument), code))
    }

    /// The builtin a callee is bound to, if any
    fn builtin(&self, function: &Node) -> Option<&'r BuiltinFunc> {
        match &resolve(function)?.kind {
            NodeKind::Atom(Atom::Builtin(target_name)) => self.registry.by_target(target_name),
            _ => None,
        }
    }

    /// A braced block of body statements
    fn render_block(&self, body: &[Node]) -> Result<String> {
        let statements = body.iter().map(|node| self.render(node)).collect::<Result<Vec<_>>>()?;
        Ok(format!("{{\n{}\n}}", indent(&statements.join("\n"))))
    }
}

impl<'r> CodeGen for RustCodeGen<'r> {
    fn generate(&mut self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            output.push_str(&self.render(node)?);
            output.push('\n');
        }
        Ok(output)
    }

    fn generate_program(&mut self, nodes: &[Node], prelude: &str) -> Result<String> {
        let statements = self.generate(nodes)?;
        Ok(format!("{}\nfn main() {{\n{}}}\n", prelude, indent(&statements)))
    }

    fn name(&self) -> &str {
        "Rust"
    }
}

/// Local scope first, then the global snapshot
fn lookup<'n>(node: &'n Node, name: &str) -> Option<&'n Binding> {
    let annotations = &node.annotations;
    annotations
        .local_scope
        .as_ref()
        .and_then(|scope| scope.get(name))
        .or_else(|| annotations.global_snapshot.as_ref().and_then(|globals| globals.get(name)))
}

/// The node an expression stands for: identifiers are followed through the
/// definitions they are bound to, each hop looked up in the scope the bound
/// value remembers. Loop indices and unbound names resolve to nothing.
fn resolve(node: &Node) -> Option<&Node> {
    let mut current = node;
    while let Some(name) = current.identifier_name() {
        match lookup(current, name)? {
            Binding::Node(bound) => current = &**bound,
            Binding::Iteration(_) => return None,
        }
    }
    Some(current)
}

/// What a special builtin's argument is known to hold
fn static_kind(node: &Node) -> StaticKind {
    match resolve(node).map(|resolved| &resolved.kind) {
        Some(NodeKind::Sequential { .. }) => StaticKind::Sequential,
        Some(NodeKind::Associative { .. }) => StaticKind::Associative,
        Some(NodeKind::Atom(Atom::Argument { type_specifier, .. })) => kind_of_type(*type_specifier),
        Some(NodeKind::Application { function, .. }) => returned_kind(function),
        _ => StaticKind::Other,
    }
}

/// Static kind of what calling `function` returns
fn returned_kind(function: &Node) -> StaticKind {
    match resolve(function).map(|resolved| &resolved.kind) {
        Some(NodeKind::Atom(Atom::Builtin(target_name))) if LIST_PRODUCERS.contains(&target_name.as_str()) => {
            StaticKind::Sequential
        }
        Some(NodeKind::NamedFunctionDefinition { return_type, .. }) => kind_of_type(*return_type),
        _ => StaticKind::Other,
    }
}

fn kind_of_type(specifier: TypeSpecifier) -> StaticKind {
    match specifier {
        TypeSpecifier::List => StaticKind::Sequential,
        TypeSpecifier::Dictionary => StaticKind::Associative,
        _ => StaticKind::Other,
    }
}

const EXCLUSIVE: &str = "&mut ";

/// Reference marker for passing `node` to a call. Owned mutable containers
/// are lent exclusively, immutable ones shared; `^list`/`^dict` parameters
/// are references already.
fn borrow_of(node: &Node) -> &'static str {
    let resolved = match resolve(node) {
        Some(resolved) => resolved,
        None => return "",
    };
    match &resolved.kind {
        NodeKind::Sequential { kind: SequentialKind::List, .. }
        | NodeKind::Associative { kind: AssociativeKind::Dictionary, .. } => EXCLUSIVE,
        NodeKind::Sequential { kind: SequentialKind::Vector, .. }
        | NodeKind::Associative { kind: AssociativeKind::Hashtable, .. } => "&",
        NodeKind::Application { function, .. } if returned_kind(function) != StaticKind::Other => EXCLUSIVE,
        _ => "",
    }
}

/// Block-like constructs and `let` statements terminate themselves
fn takes_terminator(node: &Node) -> bool {
    !matches!(
        node.kind,
        NodeKind::NamedFunctionDefinition { .. }
            | NodeKind::Definition { .. }
            | NodeKind::DoBlock { .. }
            | NodeKind::Conditional { .. }
            | NodeKind::SingleBranchConditional { .. }
            | NodeKind::DeterminateIteration { .. }
            | NodeKind::IndeterminateIteration { .. }
    )
}

fn parameter_type(specifier: TypeSpecifier) -> Option<&'static str> {
    match specifier {
        TypeSpecifier::Integer => Some("isize"),
        TypeSpecifier::Float => Some("f64"),
        TypeSpecifier::String => Some("&str"),
        TypeSpecifier::Boolean => Some("bool"),
        TypeSpecifier::List => Some("&mut Vec<isize>"),
        TypeSpecifier::Dictionary => Some("&mut HashMap<&str, isize>"),
        TypeSpecifier::Void => None,
    }
}

fn return_type_of(specifier: TypeSpecifier) -> Option<&'static str> {
    match specifier {
        TypeSpecifier::Integer => Some("isize"),
        TypeSpecifier::Float => Some("f64"),
        TypeSpecifier::String => Some("&'static str"),
        TypeSpecifier::Boolean => Some("bool"),
        TypeSpecifier::List => Some("Vec<isize>"),
        TypeSpecifier::Dictionary => Some("HashMap<&'static str, isize>"),
        TypeSpecifier::Void => None,
    }
}

fn unrenderable(node: &Node) -> Error {
    Error::Unrenderable {
        construct: node.describe().to_string(),
        span: node.span,
    }
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{}{}", INDENT, line) })
        .collect::<Vec<_>>()
        .join("\n")
        + if code.ends_with('\n') { "\n" } else { "" }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract",
    "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof", "unsized",
    "virtual", "yield",
];

/// Names that cannot be raw identifiers
const RESERVED_PATHS: &[&str] = &["crate", "self", "super", "Self", "main"];

/// Turn a Glitteral identifier into a legal Rust identifier
pub fn sanitize_identifier(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '?' => sanitized.push_str("_question_"),
            '!' => sanitized.push_str("_bang_"),
            '-' => sanitized.push('_'),
            '+' => sanitized.push_str("_plus_"),
            '−' => sanitized.push_str("_minus_"),
            '⋅' | '*' => sanitized.push_str("_times_"),
            '÷' | '/' => sanitized.push_str("_divided_by_"),
            '%' => sanitized.push_str("_modulo_"),
            '=' => sanitized.push_str("_equal_"),
            '≠' => sanitized.push_str("_not_equal_"),
            '<' => sanitized.push_str("_less_"),
            '>' => sanitized.push_str("_greater_"),
            '≤' => sanitized.push_str("_not_greater_"),
            '≥' => sanitized.push_str("_not_less_"),
            '∧' => sanitized.push_str("_and_"),
            '∨' => sanitized.push_str("_or_"),
            '¬' => sanitized.push_str("_not_"),
            other => sanitized.push(other),
        }
    }
    if RESERVED_PATHS.contains(&sanitized.as_str()) {
        sanitized.push('_');
    } else if RUST_KEYWORDS.contains(&sanitized.as_str()) {
        sanitized.insert_str(0, "r#");
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::annotator::Annotator;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::parser::parse;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    fn generate_rust(source: &str) -> Result<String> {
        let registry = BuiltinRegistry::new();
        let mut nodes = parse(tokenize(source)?)?;
        Annotator::new(&registry).annotate(&mut nodes);
        RustCodeGen::new(&registry).generate(&nodes)
    }

    #[test]
    fn test_dictionary_definition() {
        let rust = generate_rust(":= dee {\"rah\" 1; \"hey\" 2;}").unwrap();
        assert_eq!(
            rust,
            "let mut dee = HashMap::new();\n\
             dee.insert(\"rah\", 1isize);\n\
             dee.insert(\"hey\", 2isize);\n"
        );
    }

    #[test]
    fn test_hashtable_is_rebound_immutably() {
        let rust = generate_rust(":= hee {{\"a\" 1;}}").unwrap();
        assert_eq!(
            rust,
            "let mut hee = HashMap::new();\n\
             hee.insert(\"a\", 1isize);\n\
             let hee = hee;\n"
        );
    }

    #[test]
    fn test_definitions_and_literals() {
        let rust = generate_rust(":= a [1 2]\n:= v |1.5 2.25|\n:= s \"hi\"\n:= t Truth\n:= n Void").unwrap();
        assert_eq!(
            rust,
            "let mut a = vec![1isize, 2isize];\n\
             let v = vec![1.5f64, 2.25f64];\n\
             let s = \"hi\";\n\
             let t = true;\n\
             let n = ();\n"
        );
    }

    #[test]
    fn test_for_loop_over_a_list() {
        let rust = generate_rust(":= a [1 2 3]\nfor |i a|—\n   (println a)").unwrap();
        assert_eq!(
            rust,
            "let mut a = vec![1isize, 2isize, 3isize];\n\
             for i in a.clone() {\n    println_container(&mut a);\n}\n"
        );
    }

    #[test]
    fn test_named_function_definition() {
        let rust = generate_rust(":=λ first_plus_square |a ^int b ^int| → ^int\n   (+ a (⋅ b b))").unwrap();
        assert_eq!(
            rust,
            "fn first_plus_square(a: isize, b: isize) -> isize {\n    \
             add_integers(a, multiply_integers(b, b))\n}\n"
        );
    }

    #[test]
    fn test_void_function_with_container_parameter() {
        let rust = generate_rust(":=λ push-one! |xs ^list| → ^void\n   (append! xs 1)\n   (println (length xs))").unwrap();
        assert_eq!(
            rust,
            "fn push_one_bang_(xs: &mut Vec<isize>) {\n    \
             append(xs, 1isize);\n    \
             println(list_length(xs))\n}\n"
        );
    }

    #[test]
    fn test_conditionals_and_loops() {
        let rust = generate_rust(
            ":= i 0\nif (< i 3) —\n   (print 1)\n   (print 2)\nwhile (< i 3) —\n   (print i)\nwhen Falsity —\n   (print 0)",
        )
        .unwrap();
        assert_eq!(
            rust,
            "let i = 0isize;\n\
             if less(i, 3isize) {\n    print(1isize)\n} else {\n    print(2isize)\n}\n\
             while less(i, 3isize) {\n    print(i);\n}\n\
             if false {\n    print(0isize);\n}\n"
        );
    }

    #[test]
    fn test_do_block_yields_its_last_value() {
        let rust = generate_rust(":= x do —\n   (print 1)\n   2").unwrap();
        assert_eq!(rust, "let x = {\n    print(1isize);\n    2isize\n};\n");
    }

    #[test]
    fn test_subscript_assignment_and_special_builtins() {
        let rust = generate_rust(
            ":= a [1 2]\n:= d {\"k\" 1;}\n_:= a 0 5\n_:= d \"k\" 6\n(print (get a 0))\n(print (get d \"k\"))\n(print (length d))",
        )
        .unwrap();
        assert_eq!(
            rust,
            "let mut a = vec![1isize, 2isize];\n\
             let mut d = HashMap::new();\n\
             d.insert(\"k\", 1isize);\n\
             a[0isize as usize] = 5isize;\n\
             d.insert(\"k\", 6isize);\n\
             print(list_get_subscript(&mut a, 0isize));\n\
             print(dictionary_get_subscript(&mut d, \"k\"));\n\
             print(dictionary_length(&mut d));\n"
        );
    }

    #[test]
    fn test_vectors_are_lent_shared() {
        let rust = generate_rust(":= v |1 2|\n(print (length v))\n(print (length [3]))").unwrap();
        assert_eq!(
            rust,
            "let v = vec![1isize, 2isize];\n\
             print(list_length(&v));\n\
             print(list_length(&mut vec![3isize]));\n"
        );
    }

    #[test]
    fn test_user_function_named_like_a_special_builtin() {
        let rust = generate_rust(":=λ length |n ^int| → ^int\n   n\n(print (length 3))").unwrap();
        assert_eq!(rust, "fn length(n: isize) -> isize {\n    n\n}\nprint(length(3isize));\n");
    }

    #[test]
    fn test_aliases_resolve_to_the_container_they_name() {
        let rust = generate_rust(
            ":= xs [1 2]\n:= ys xs\n:= r (range 0 3)\n(append! ys 4)\n(print (get r 0))\n(println ys)\n(print (length (range 0 2)))",
        )
        .unwrap();
        assert_eq!(
            rust,
            "let mut xs = vec![1isize, 2isize];\n\
             let mut ys = xs;\n\
             let mut r = range(0isize, 3isize);\n\
             append(&mut ys, 4isize);\n\
             print(list_get_subscript(&mut r, 0isize));\n\
             println_container(&mut ys);\n\
             print(list_length(&mut range(0isize, 2isize)));\n"
        );
    }

    #[test]
    fn test_list_returning_function_result_is_a_list() {
        let rust = generate_rust(":=λ evens |n ^int| → ^list\n   (range 0 n)\n:= e (evens 4)\n(print (length e))").unwrap();
        assert_eq!(
            rust,
            "fn evens(n: isize) -> Vec<isize> {\n    range(0isize, n)\n}\n\
             let mut e = evens(4isize);\n\
             print(list_length(&mut e));\n"
        );
    }

    #[test]
    fn test_missing_specialization() {
        let error = generate_rust("(get 1 2)").unwrap_err();
        assert!(matches!(error, Error::NoSpecialization { ref builtin, .. } if builtin == "get"));
    }

    #[test]
    fn test_code_generation_errors() {
        assert!(matches!(
            generate_rust("(print nowhere)"),
            Err(Error::UnboundIdentifier { ref name, .. }) if name == "nowhere"
        ));
        assert!(matches!(generate_rust("(print {1 2;})"), Err(Error::UnboundAssociative { .. })));
        assert!(matches!(generate_rust("(print ^int)"), Err(Error::Unrenderable { .. })));

        let registry = BuiltinRegistry::new();
        let bare = Node::atom(Atom::Integer(1), Span::dummy());
        assert!(matches!(
            RustCodeGen::new(&registry).render(&bare),
            Err(Error::Unannotated { .. })
        ));
    }

    #[test]
    fn test_generate_program_wraps_main() {
        let registry = BuiltinRegistry::new();
        let mut nodes = parse(tokenize("(print 1)").unwrap()).unwrap();
        Annotator::new(&registry).annotate(&mut nodes);
        let program = RustCodeGen::new(&registry)
            .generate_program(&nodes, "// prelude")
            .unwrap();
        assert_eq!(program, "// prelude\nfn main() {\n    print(1isize);\n}\n");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("empty?"), "empty_question_");
        assert_eq!(sanitize_identifier("push!"), "push_bang_");
        assert_eq!(sanitize_identifier("first-plus-square"), "first_plus_square");
        assert_eq!(sanitize_identifier("≤≥"), "_not_greater__not_less_");
        assert_eq!(sanitize_identifier("loop"), "r#loop");
        assert_eq!(sanitize_identifier("main"), "main_");
    }
}

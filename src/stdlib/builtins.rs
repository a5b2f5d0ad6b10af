//! Built-in Functions Registry
//!
//! Defines the builtins every compilation starts with. Each one maps a
//! Glitteral name to the prelude function that implements it. Special
//! builtins name several prelude functions and are resolved against the
//! static kind of their first argument at code generation time.

use std::collections::HashMap;
use std::rc::Rc;

use crate::frontend::ast::{Atom, Binding, Environment, Node};
use crate::utils::Span;

/// Static kind of a special builtin's first argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticKind {
    /// A list or vector, or a `^list` parameter
    Sequential,
    /// A dictionary or hashtable, or a `^dict` parameter
    Associative,
    /// Anything else
    Other,
}

/// Concrete prelude functions a special builtin resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialization {
    pub sequential: Option<String>,
    pub associative: Option<String>,
    /// Used when the first argument is neither
    pub fallback: Option<String>,
}

impl Specialization {
    pub fn resolve(&self, kind: StaticKind) -> Option<&str> {
        let chosen = match kind {
            StaticKind::Sequential => self.sequential.as_ref(),
            StaticKind::Associative => self.associative.as_ref(),
            StaticKind::Other => None,
        };
        chosen.or(self.fallback.as_ref()).map(String::as_str)
    }
}

/// Built-in function
#[derive(Debug, Clone)]
pub struct BuiltinFunc {
    /// Glitteral name
    pub name: String,
    /// Prelude function to generate
    pub target_name: String,
    /// Present for special builtins
    pub specialization: Option<Specialization>,
}

/// Registry of all built-in functions
pub struct BuiltinRegistry {
    functions: HashMap<String, BuiltinFunc>,
    by_target: HashMap<String, String>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
            by_target: HashMap::new(),
        };
        registry.register_all();
        registry
    }

    fn register_all(&mut self) {
        // Integer arithmetic
        self.register_plain("+", "add_integers");
        self.register_plain("−", "subtract_integers");
        self.register_plain("⋅", "multiply_integers");
        self.register_plain("÷", "divide_integers");
        self.register_plain("%", "modulo_integers");

        // Comparison
        self.register_plain("=", "integers_equal");
        self.register_plain("≠", "integers_not_equal");
        self.register_plain("<", "less");
        self.register_plain(">", "greater");
        self.register_plain("≤", "not_greater");
        self.register_plain("≥", "not_less");

        // Logic
        self.register_plain("∧", "and");
        self.register_plain("∨", "or");
        self.register_plain("¬", "not");

        // Containers
        self.register_plain("append!", "append");
        self.register_plain("range", "range");

        // I/O
        self.register_plain("print", "print");
        self.register_plain("print_integer", "print_integer");
        self.register_plain("input", "input");

        // Special
        self.register_special(
            "get",
            "subscript",
            Specialization {
                sequential: Some("list_get_subscript".to_string()),
                associative: Some("dictionary_get_subscript".to_string()),
                fallback: None,
            },
        );
        self.register_special(
            "length",
            "length",
            Specialization {
                sequential: Some("list_length".to_string()),
                associative: Some("dictionary_length".to_string()),
                fallback: None,
            },
        );
        self.register_special(
            "println",
            "println",
            Specialization {
                sequential: Some("println_container".to_string()),
                associative: Some("println_container".to_string()),
                fallback: Some("println".to_string()),
            },
        );
    }

    fn register_plain(&mut self, name: &str, target_name: &str) {
        self.register(BuiltinFunc {
            name: name.to_string(),
            target_name: target_name.to_string(),
            specialization: None,
        });
    }

    fn register_special(&mut self, name: &str, target_name: &str, specialization: Specialization) {
        self.register(BuiltinFunc {
            name: name.to_string(),
            target_name: target_name.to_string(),
            specialization: Some(specialization),
        });
    }

    fn register(&mut self, func: BuiltinFunc) {
        self.by_target.insert(func.target_name.clone(), func.name.clone());
        self.functions.insert(func.name.clone(), func);
    }

    /// Look up a builtin by its Glitteral name
    pub fn get(&self, name: &str) -> Option<&BuiltinFunc> {
        self.functions.get(name)
    }

    /// Look up a builtin by the target name stored in its atom
    pub fn by_target(&self, target_name: &str) -> Option<&BuiltinFunc> {
        self.by_target.get(target_name).and_then(|name| self.functions.get(name))
    }

    /// Check if a name is a builtin
    pub fn is_builtin(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// A fresh global table holding only the builtins
    pub fn seed_environment(&self) -> Environment {
        self.functions
            .values()
            .map(|func| {
                let atom = Node::atom(Atom::Builtin(func.target_name.clone()), Span::dummy());
                (func.name.clone(), Binding::Node(Rc::new(atom)))
            })
            .collect()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_environment_holds_builtin_atoms() {
        let registry = BuiltinRegistry::new();
        let environment = registry.seed_environment();
        let plus = environment.get("+").expect("+ should be seeded");
        assert_eq!(
            plus.node().kind,
            crate::frontend::ast::NodeKind::Atom(Atom::Builtin("add_integers".to_string()))
        );
        assert_eq!(environment.len(), registry.functions.len());
    }

    #[test]
    fn test_specialization_falls_back() {
        let registry = BuiltinRegistry::new();
        let println = registry.by_target("println").and_then(|f| f.specialization.as_ref()).unwrap();
        assert_eq!(println.resolve(StaticKind::Sequential), Some("println_container"));
        assert_eq!(println.resolve(StaticKind::Other), Some("println"));

        let get = registry.get("get").and_then(|f| f.specialization.as_ref()).unwrap();
        assert_eq!(get.resolve(StaticKind::Associative), Some("dictionary_get_subscript"));
        assert_eq!(get.resolve(StaticKind::Other), None);
    }

    #[test]
    fn test_plain_builtins_are_not_special() {
        let registry = BuiltinRegistry::new();
        assert!(registry.is_builtin("append!"));
        assert!(registry.get("append!").unwrap().specialization.is_none());
        assert!(!registry.is_builtin("map"));
    }
}

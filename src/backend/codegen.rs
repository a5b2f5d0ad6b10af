//! Code Generation trait - Backend abstraction

use crate::frontend::ast::Node;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Render annotated top-level nodes as target statements
    fn generate(&mut self, nodes: &[Node]) -> Result<String>;

    /// Render a complete program: the prelude followed by an entry point
    /// wrapping the generated statements
    fn generate_program(&mut self, nodes: &[Node], prelude: &str) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}

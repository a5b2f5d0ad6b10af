//! Glitteral Compiler
//!
//! An indentation-sensitive Lisp compiled to Rust source:
//! source → tokens → nodes → desugared nodes → annotated nodes → Rust.

pub mod backend;
pub mod feedback;
pub mod frontend;
pub mod stdlib;
pub mod utils;

use backend::{CodeGen, RustCodeGen};
use frontend::annotator::Annotator;
use frontend::ast::Node;
use frontend::desugar::Desugarer;
use frontend::lexer::tokenize;
use frontend::parser::parse;
use stdlib::BuiltinRegistry;
use utils::Result;

/// Runtime functions every generated program calls into
pub const DEFAULT_PRELUDE: &str = include_str!("../runtime/prelude.rs");

/// Annotated nodes of one compilation unit
pub struct Analysis {
    pub token_count: usize,
    pub nodes: Vec<Node>,
}

/// Run the front end: tokenize, parse, desugar and annotate
pub fn analyze(source: &str, registry: &BuiltinRegistry) -> Result<Analysis> {
    let tokens = tokenize(source)?;
    let token_count = tokens.len();
    let nodes = parse(tokens)?;
    let mut nodes = Desugarer::new().desugar(nodes);
    Annotator::new(registry).annotate(&mut nodes);
    log::debug!("analyzed {} tokens into {} top-level nodes", token_count, nodes.len());
    Ok(Analysis { token_count, nodes })
}

/// Compile Glitteral source to a complete Rust program
pub fn compile(source: &str, prelude: &str) -> Result<String> {
    let registry = BuiltinRegistry::new();
    let analysis = analyze(source, &registry)?;
    RustCodeGen::new(&registry).generate_program(&analysis.nodes, prelude)
}

//! Frontend module - Lexer, Parser, Desugaring, Annotation

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod desugar;
pub mod annotator;

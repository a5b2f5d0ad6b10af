//! Backend module - Code generation

pub mod codegen;

pub mod rust;

pub use codegen::CodeGen;
pub use rust::RustCodeGen;

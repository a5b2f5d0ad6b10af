//! Rust Backend - Generate Rust source from annotated Glitteral nodes

mod rust_codegen;

pub use rust_codegen::{sanitize_identifier, RustCodeGen};

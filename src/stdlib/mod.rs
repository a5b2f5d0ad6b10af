//! Builtins shared by the annotator and the backend

pub mod builtins;

pub use builtins::{BuiltinFunc, BuiltinRegistry, Specialization, StaticKind};

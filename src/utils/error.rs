//! Error handling for the Glitteral compiler

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// The pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokenizing,
    Indentation,
    Parsing,
    CodeGeneration,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Tokenizing => "TokenizingError",
            Stage::Indentation => "IndentationError",
            Stage::Parsing => "ParsingError",
            Stage::CodeGeneration => "CodeGenerationError",
        }
    }
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Tokenizing Errors ====================

    #[error("Couldn't tokenize {fragment:?}")]
    Untokenizable { fragment: String, span: Span },

    #[error("Ambiguous input: {} are tied as the longest tokenizations of {fragment:?}", .candidates.join(", "))]
    AmbiguousToken {
        fragment: String,
        candidates: Vec<String>,
        span: Span,
    },

    // ==================== Indentation Errors ====================

    #[error("Indentation of {width} spaces is not a multiple of {unit}")]
    Indentation { width: usize, unit: usize, span: Span },

    #[error("Cannot dedent past the left margin")]
    DedentPastMargin { span: Span },

    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("Malformed {construct}: {found}")]
    MalformedForm {
        construct: String,
        found: String,
        span: Span,
    },

    #[error("Invalid {kind} literal {text:?}")]
    InvalidLiteral {
        kind: String,
        text: String,
        span: Span,
    },

    // ==================== Code Generation Errors ====================

    #[error("Cannot render {construct} here")]
    Unrenderable { construct: String, span: Span },

    #[error("Identifier `{name}` is not bound in its environment")]
    UnboundIdentifier { name: String, span: Span },

    #[error("{construct} reached code generation without annotations")]
    Unannotated { construct: String, span: Span },

    #[error("Associative literal must be bound to an identifier by a definition")]
    UnboundAssociative { span: Span },

    #[error("No specialization of `{builtin}` for {argument}")]
    NoSpecialization {
        builtin: String,
        argument: String,
        span: Span,
    },
}

impl Error {
    /// The stage that raised this error
    pub fn stage(&self) -> Stage {
        match self {
            Self::Untokenizable { .. } | Self::AmbiguousToken { .. } => Stage::Tokenizing,
            Self::Indentation { .. } | Self::DedentPastMargin { .. } => Stage::Indentation,
            Self::UnexpectedToken { .. }
            | Self::UnexpectedEnd { .. }
            | Self::MalformedForm { .. }
            | Self::InvalidLiteral { .. } => Stage::Parsing,
            Self::Unrenderable { .. }
            | Self::UnboundIdentifier { .. }
            | Self::Unannotated { .. }
            | Self::UnboundAssociative { .. }
            | Self::NoSpecialization { .. } => Stage::CodeGeneration,
        }
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Untokenizable { span, .. } => Some(*span),
            Self::AmbiguousToken { span, .. } => Some(*span),
            Self::Indentation { span, .. } => Some(*span),
            Self::DedentPastMargin { span } => Some(*span),
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::MalformedForm { span, .. } => Some(*span),
            Self::InvalidLiteral { span, .. } => Some(*span),
            Self::Unrenderable { span, .. } => Some(*span),
            Self::UnboundIdentifier { span, .. } => Some(*span),
            Self::Unannotated { span, .. } => Some(*span),
            Self::UnboundAssociative { span } => Some(*span),
            Self::NoSpecialization { span, .. } => Some(*span),
            Self::UnexpectedEnd { .. } => None,
        }
    }
}

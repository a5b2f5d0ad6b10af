//! Structured Feedback Module
//!
//! Machine-readable diagnostics for the driver's `--message-format json`:
//! - JSON error reports with fix suggestions
//! - Compilation statistics

use serde::{Deserialize, Serialize};

use crate::utils::{Error, Stage};

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "G0101")
    pub code: String,

    /// Stage that raised the error (e.g., "ParsingError")
    pub stage: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Location information
    pub location: Option<Location>,

    /// Suggested fixes
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Description of the fix
    pub message: String,

    /// The replacement text
    pub replacement: Option<String>,
}

// ==================== Compilation Feedback ====================

/// Outcome of compiling one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationFeedback {
    pub success: bool,
    pub source_file: String,
    pub diagnostics: Vec<ErrorReport>,
    pub stats: CompilationStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilationStats {
    pub token_count: usize,
    /// Top-level nodes after desugaring
    pub node_count: usize,
    pub total_time_ms: u64,
    /// Lines of code
    pub loc: usize,
}

// ==================== Error Conversion ====================

impl ErrorReport {
    /// Create an error report from a compiler error raised on `source`
    pub fn from_error(error: &Error, source: &str, file_name: &str) -> Self {
        let (code, suggestions) = error_info(error);
        let location = error.span().map(|span| {
            let (line, column) = span.line_column(source);
            Location {
                file: file_name.to_string(),
                line,
                column,
            }
        });
        Self {
            code: code.to_string(),
            stage: error.stage().as_str().to_string(),
            severity: Severity::Error,
            message: error.to_string(),
            location,
            suggestions,
        }
    }

    /// One-line rendering for terminals: `file:line:column: Stage: message`
    pub fn to_human(&self) -> String {
        match &self.location {
            Some(location) => format!(
                "{}:{}:{}: {}: {}",
                location.file, location.line, location.column, self.stage, self.message
            ),
            None => format!("{}: {}", self.stage, self.message),
        }
    }
}

fn suggestion(message: &str, replacement: Option<&str>) -> Suggestion {
    Suggestion {
        message: message.to_string(),
        replacement: replacement.map(str::to_string),
    }
}

/// Error code and suggested fixes for each error kind
fn error_info(error: &Error) -> (&'static str, Vec<Suggestion>) {
    match error {
        Error::Untokenizable { .. } => (
            "G0001",
            vec![suggestion(
                "Identifiers start with a letter; operators use the symbols + − ⋅ ÷ = ≠ < > ≤ ≥ ∧ ∨ ¬",
                None,
            )],
        ),
        Error::AmbiguousToken { .. } => ("G0002", vec![suggestion("Separate the tokens with a space", None)]),
        Error::Indentation { width, unit, .. } => {
            let nearest = (width + unit / 2) / unit * unit;
            (
                "G0101",
                vec![suggestion(
                    &format!("Indent by a multiple of {} spaces", unit),
                    Some(&" ".repeat(nearest)),
                )],
            )
        }
        Error::DedentPastMargin { .. } => ("G0102", vec![]),
        Error::UnexpectedToken { .. } => ("G0201", vec![]),
        Error::UnexpectedEnd { expected } => (
            "G0202",
            vec![suggestion(&format!("Finish the construct with {}", expected), None)],
        ),
        Error::MalformedForm { construct, .. } => (
            "G0203",
            match construct.as_str() {
                "conditional" => vec![suggestion(
                    "A conditional takes a consequent and at most one alternative; use a do block to sequence",
                    Some("do —"),
                )],
                "application" => vec![suggestion("The first element of an application must name a function", None)],
                _ => vec![],
            },
        ),
        Error::InvalidLiteral { .. } => ("G0204", vec![]),
        Error::Unrenderable { .. } => ("G0301", vec![]),
        Error::UnboundIdentifier { name, .. } => (
            "G0302",
            vec![suggestion(
                &format!("Define '{}' before using it", name),
                Some(&format!(":= {} ", name)),
            )],
        ),
        Error::Unannotated { .. } => ("G0303", vec![]),
        Error::UnboundAssociative { .. } => (
            "G0304",
            vec![suggestion("Bind the literal to a name first", Some(":= table {…}"))],
        ),
        Error::NoSpecialization { builtin, .. } => (
            "G0305",
            vec![suggestion(
                &format!("`{}` needs a list, dictionary or a ^list/^dict parameter", builtin),
                None,
            )],
        ),
    }
}

impl CompilationFeedback {
    pub fn success(source_file: String, stats: CompilationStats) -> Self {
        Self {
            success: true,
            source_file,
            diagnostics: vec![],
            stats,
        }
    }

    pub fn failure(source_file: String, errors: Vec<ErrorReport>, stats: CompilationStats) -> Self {
        Self {
            success: false,
            source_file,
            diagnostics: errors,
            stats,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Whether errors of this stage point at the source text itself
pub fn is_source_error(stage: Stage) -> bool {
    matches!(stage, Stage::Tokenizing | Stage::Indentation | Stage::Parsing)
}

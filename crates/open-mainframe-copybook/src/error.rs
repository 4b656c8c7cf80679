//! Copybook conversion error types.

use miette::Diagnostic;
use thiserror::Error;

use crate::picture::PictureError;

/// Result type for copybook operations.
pub type Result<T> = std::result::Result<T, CopybookError>;

/// Errors produced while resolving a copybook layout.
///
/// Any of these aborts the conversion of the whole copybook; there is no
/// partial layout.
#[derive(Debug, Error, Diagnostic)]
pub enum CopybookError {
    /// A PICTURE string that does not describe a storage size.
    #[error("malformed PICTURE '{clause}' for field {field} at line {line}: {source}")]
    #[diagnostic(
        code(copybook::malformed_picture),
        help("PICTURE strings use symbols such as 9, X, A, S and V with optional (n) repeat counts")
    )]
    MalformedPicture {
        /// The field carrying the clause.
        field: String,
        /// The raw PICTURE string.
        clause: String,
        /// Source line of the field.
        line: u32,
        /// Why the string was rejected.
        source: PictureError,
    },

    /// A REDEFINES target that is not among the preceding items.
    #[error("field {field} at line {line} redefines '{target}', which is not defined before it")]
    #[diagnostic(
        code(copybook::unresolved_redefines),
        help("set `unresolved_redefines = \"record-start\"` under [layout] to place such fields at offset 0")
    )]
    UnresolvedRedefines {
        /// The redefining field.
        field: String,
        /// The missing target name.
        target: String,
        /// Source line of the redefining field.
        line: u32,
    },

    /// Level numbers that do not describe a valid hierarchy.
    #[error("invalid structure at line {line}: {message}")]
    #[diagnostic(code(copybook::structure))]
    Structure {
        /// Source line of the offending entry.
        line: u32,
        /// Description of the problem.
        message: String,
    },

    /// A clause whose operand cannot be used (e.g. a non-numeric OCCURS count).
    #[error("malformed {clause} clause for field {field} at line {line}: {message}")]
    #[diagnostic(code(copybook::malformed_clause))]
    MalformedClause {
        /// The field carrying the clause.
        field: String,
        /// The clause keyword.
        clause: String,
        /// Source line of the field.
        line: u32,
        /// Description of the problem.
        message: String,
    },

    /// File access failed.
    #[error("I/O error: {message}")]
    #[diagnostic(code(copybook::io))]
    Io {
        /// Error message.
        message: String,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(copybook::config))]
    Config {
        /// Error message.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    #[diagnostic(code(copybook::json))]
    Json(#[from] serde_json::Error),
}

impl CopybookError {
    /// Create a structure error.
    pub fn structure(line: u32, message: impl Into<String>) -> Self {
        CopybookError::Structure {
            line,
            message: message.into(),
        }
    }

    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            CopybookError::MalformedPicture { line, .. }
            | CopybookError::UnresolvedRedefines { line, .. }
            | CopybookError::Structure { line, .. }
            | CopybookError::MalformedClause { line, .. } => Some(*line),
            CopybookError::Io { .. } | CopybookError::Config { .. } | CopybookError::Json(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_display() {
        let err = CopybookError::structure(12, "group CUST-NAME has no subordinate items");
        assert_eq!(
            err.to_string(),
            "invalid structure at line 12: group CUST-NAME has no subordinate items"
        );
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn test_malformed_picture_display() {
        let err = CopybookError::MalformedPicture {
            field: "AMOUNT".to_string(),
            clause: "9(".to_string(),
            line: 4,
            source: PictureError::UnbalancedParenthesis,
        };
        let text = err.to_string();
        assert!(text.contains("'9('"));
        assert!(text.contains("AMOUNT"));
        assert!(text.contains("line 4"));
    }

    #[test]
    fn test_io_error_has_no_line() {
        let err = CopybookError::Io {
            message: "missing".to_string(),
        };
        assert_eq!(err.line(), None);
    }
}

//! The crate error type.
//!
//! Every failure raised while scanning carries the line and column the
//! parser saw at the moment of raising; deep inside entity expansion these
//! reflect the innermost frame's position. Post-processing failures have
//! no position.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DtdError>;

/// Coarse classification of a [`DtdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtdErrorKind {
    /// Unexpected character, missing required literal, malformed character
    /// reference, invalid name start.
    Syntax,
    /// Duplicate declarations, references to undeclared element types,
    /// notations or entities, namespace conflicts.
    Semantic,
    /// Reader failures, resolver failures, malformed URIs.
    Io,
    /// End of input where more was required.
    UnexpectedEof,
}

#[derive(Debug, Error)]
pub enum DtdError {
    #[error("{message} (line {line}, column {column})")]
    Syntax { message: String, line: u32, column: u32 },

    #[error("{message} (line {line}, column {column})")]
    Semantic { message: String, line: u32, column: u32 },

    /// A semantic violation detected after parsing; carries no position.
    #[error("{0}")]
    PostProcess(String),

    /// An XML name that violates the naming rules (empty, stray colon in a
    /// namespace-aware local name, unresolvable prefix, ...).
    #[error("invalid XML name: {0}")]
    Name(String),

    #[error("unexpected end of input (line {line}, column {column})")]
    UnexpectedEof { line: u32, column: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed URI '{uri}': {source}")]
    MalformedUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

impl DtdError {
    pub fn kind(&self) -> DtdErrorKind {
        match self {
            DtdError::Syntax { .. } => DtdErrorKind::Syntax,
            DtdError::Semantic { .. } | DtdError::PostProcess(_) | DtdError::Name(_) => {
                DtdErrorKind::Semantic
            }
            DtdError::UnexpectedEof { .. } => DtdErrorKind::UnexpectedEof,
            DtdError::Io(_) | DtdError::MalformedUri { .. } => DtdErrorKind::Io,
        }
    }

    /// The source line at the point of failure, when one was recorded.
    pub fn line(&self) -> Option<u32> {
        match self {
            DtdError::Syntax { line, .. }
            | DtdError::Semantic { line, .. }
            | DtdError::UnexpectedEof { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The source column at the point of failure, when one was recorded.
    pub fn column(&self) -> Option<u32> {
        match self {
            DtdError::Syntax { column, .. }
            | DtdError::Semantic { column, .. }
            | DtdError::UnexpectedEof { column, .. } => Some(*column),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, DtdError::UnexpectedEof { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_position() {
        let err = DtdError::Syntax {
            message: "Character required: >".into(),
            line: 3,
            column: 14,
        };
        assert_eq!(err.kind(), DtdErrorKind::Syntax);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.column(), Some(14));
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("column 14"));
    }

    #[test]
    fn post_process_errors_have_no_position() {
        let err = DtdError::PostProcess("Notation gif not defined.".into());
        assert_eq!(err.kind(), DtdErrorKind::Semantic);
        assert_eq!(err.line(), None);
        assert_eq!(err.column(), None);
    }

    #[test]
    fn io_errors_convert() {
        let err: DtdError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), DtdErrorKind::Io);
        assert!(!err.is_eof());
    }
}

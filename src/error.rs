//! Error types for the card layout engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the card layout engine
///
/// Only a handful of these ever reach a user. Malformed sections, unknown
/// section kinds and unresolvable positions are recovered locally (the
/// section is dropped, skipped or drawn as an empty box) and only logged;
/// `ExportFailed` is the one blocking, user-visible failure.
#[derive(Error, Debug)]
pub enum Error {
    /// A persisted section entry could not be upgraded to the current shape
    #[error("Malformed section at index {index}: {reason}")]
    MalformedSection { index: usize, reason: String },

    /// A `sectionType` that is not part of the closed registry
    #[error("Unknown section type: {0}")]
    UnknownSectionType(String),

    /// A position that cannot be turned into a box
    #[error("Invalid position: {0}")]
    ResolutionError(String),

    /// The capture phase of an export failed
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// A newer export request replaced this one before it completed
    #[error("Export request {0} was superseded by a newer request")]
    Superseded(u64),

    /// PNG encode/decode or bitmap failure
    #[error("Image error: {0}")]
    ImageError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Editor operation referenced a section id that does not exist
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Editor operation would introduce a second section with the same id
    #[error("Duplicate section id: {0}")]
    DuplicateSection(String),

    /// The persistence collaborator failed to read or write
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error class is recoverable without user involvement.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Error::MalformedSection { .. } | Error::UnknownSectionType(_) | Error::ResolutionError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_export_failures_block() {
        assert!(Error::UnknownSectionType("poll".into()).is_degradable());
        assert!(Error::ResolutionError("NaN".into()).is_degradable());
        assert!(!Error::ExportFailed("capture".into()).is_degradable());
    }

    #[test]
    fn messages_name_the_offender() {
        let e = Error::MalformedSection { index: 3, reason: "missing type".into() };
        assert_eq!(e.to_string(), "Malformed section at index 3: missing type");
    }
}

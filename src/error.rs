use std::fmt;

/// Top-level extraction failures. Per-stream and per-entry faults are
/// contained and tallied in the summary instead
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractError {
    /**Input file missing or unreadable */
    Input,
    /**Leading bytes match no supported container */
    UnknownSignature,
    /**Structural OLE failure */
    OleContainer,
    /**Thumbs.db decoding failure */
    ThumbsDb,
    /**Thumbcache decoding failure */
    Thumbcache,
    /**ESE database unreadable or missing its schema */
    Esedb,
    /**Output sink refused a thumbnail */
    Sink,
    /**Cooperative abort observed */
    Cancelled,
}

impl ExtractError {
    /// Process exit code contract shared with the original tooling
    pub fn exit_code(&self) -> i32 {
        match self {
            ExtractError::Input | ExtractError::UnknownSignature => 10,
            ExtractError::Sink => 11,
            ExtractError::OleContainer
            | ExtractError::ThumbsDb
            | ExtractError::Thumbcache
            | ExtractError::Cancelled => 12,
            ExtractError::Esedb => 18,
        }
    }
}

impl std::error::Error for ExtractError {}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Input => write!(f, "Could not read input file"),
            ExtractError::UnknownSignature => write!(f, "Not a recognized thumbnail container"),
            ExtractError::OleContainer => write!(f, "Failed to parse OLE container"),
            ExtractError::ThumbsDb => write!(f, "Failed to parse Thumbs.db"),
            ExtractError::Thumbcache => write!(f, "Failed to parse thumbcache file"),
            ExtractError::Esedb => write!(f, "Failed to read ESE database"),
            ExtractError::Sink => write!(f, "Failed to write to output sink"),
            ExtractError::Cancelled => write!(f, "Extraction cancelled"),
        }
    }
}

use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum ThumbsDbError {
    ParseOle,
    ParseCatalog,
    EntryLengthMismatch,
    MissingEoi,
    UnknownHeader,
    UnknownType,
    Cancelled,
}

impl std::error::Error for ThumbsDbError {}

impl fmt::Display for ThumbsDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbsDbError::ParseOle => write!(f, "Failed to parse OLE container"),
            ThumbsDbError::ParseCatalog => write!(f, "Failed to parse Catalog stream"),
            ThumbsDbError::EntryLengthMismatch => {
                write!(f, "Stream payload length does not match header")
            }
            ThumbsDbError::MissingEoi => write!(f, "Stream missing End of Image marker"),
            ThumbsDbError::UnknownHeader => write!(f, "Unrecognized stream header length"),
            ThumbsDbError::UnknownType => write!(f, "Unrecognized stream image type"),
            ThumbsDbError::Cancelled => write!(f, "Extraction cancelled"),
        }
    }
}

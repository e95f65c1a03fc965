use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum ThumbcacheError {
    BadSignature,
    BadHeader,
    ReadError,
    Cancelled,
}

impl std::error::Error for ThumbcacheError {}

impl fmt::Display for ThumbcacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbcacheError::BadSignature => write!(f, "Not a thumbcache file"),
            ThumbcacheError::BadHeader => write!(f, "Malformed thumbcache header"),
            ThumbcacheError::ReadError => write!(f, "Failed to read thumbcache file"),
            ThumbcacheError::Cancelled => write!(f, "Extraction cancelled"),
        }
    }
}

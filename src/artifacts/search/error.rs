use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum SearchError {
    EsedbUnreadable,
    EsedbSchemaMissing,
}

impl std::error::Error for SearchError {}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::EsedbUnreadable => write!(f, "Could not open ESE database"),
            SearchError::EsedbSchemaMissing => {
                write!(f, "ESE database has no Windows Search property table")
            }
        }
    }
}

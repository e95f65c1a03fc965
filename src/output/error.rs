use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum SinkError {
    Create,
    Write,
}

impl std::error::Error for SinkError {}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Create => write!(f, "Could not create output file or directory"),
            SinkError::Write => write!(f, "Could not write output"),
        }
    }
}

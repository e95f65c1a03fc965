use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum FileSystemError {
    OpenFile,
    ReadFile,
    NotFile,
    OutOfBounds,
    BadGlob,
}

impl std::error::Error for FileSystemError {}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemError::OpenFile => write!(f, "Could not open file"),
            FileSystemError::ReadFile => write!(f, "Could not read file"),
            FileSystemError::NotFile => write!(f, "Not a file"),
            FileSystemError::OutOfBounds => write!(f, "Read beyond end of file"),
            FileSystemError::BadGlob => write!(f, "Could not glob"),
        }
    }
}

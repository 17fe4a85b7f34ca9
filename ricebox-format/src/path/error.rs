use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntoResourcePathError {
    UnrepresentableStr,
    NotUnderRoot,
    InvalidSegment,
}

impl std::error::Error for IntoResourcePathError {}

impl fmt::Display for IntoResourcePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl IntoResourcePathError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoResourcePathError::UnrepresentableStr => "unrepresentable string found in path",
            IntoResourcePathError::NotUnderRoot => "path is not inside the box root",
            IntoResourcePathError::InvalidSegment => {
                "path contains an empty, `.` or `..` segment, or a leading separator"
            }
        }
    }

    pub fn as_io_error(&self) -> std::io::Error {
        use std::io::{Error, ErrorKind};
        Error::new(ErrorKind::InvalidInput, self.as_str())
    }
}

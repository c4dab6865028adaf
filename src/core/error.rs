// Crate-wide error type: a kind plus optional context, built fluently.
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    InvalidArgument,
    DuplicateKey,
    NotFound,
    Import,
    Io,
}

/// Why a deck file was rejected during import.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImportReason {
    MissingHeader,
    WrongHeader,
    InvalidCount,
    UnknownProperty,
    DuplicateKeyProperty,
    PropertyCountMismatch,
    DuplicateProperty,
    Truncated,
    DuplicateRecord,
    Encoding,
}

impl ImportReason {
    pub fn describe(self) -> &'static str {
        match self {
            ImportReason::MissingHeader => "file ends inside the header",
            ImportReason::WrongHeader => "wrong header line",
            ImportReason::InvalidCount => "record count is not a non-negative integer",
            ImportReason::UnknownProperty => "unknown property name",
            ImportReason::DuplicateKeyProperty => "duplicated key property",
            ImportReason::PropertyCountMismatch => "wrong number of properties",
            ImportReason::DuplicateProperty => "duplicated property",
            ImportReason::Truncated => "fewer data lines than declared",
            ImportReason::DuplicateRecord => "records share a key value",
            ImportReason::Encoding => "file is not valid UTF-8",
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<ImportReason>,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    line: Option<usize>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            reason: None,
            message: None,
            hint: None,
            path: None,
            line: None,
            source: None,
        }
    }

    pub fn import(reason: ImportReason) -> Self {
        let mut err = Self::new(ErrorKind::Import).with_message(reason.describe());
        err.reason = Some(reason);
        err
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn reason(&self) -> Option<ImportReason> {
        self.reason
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 1-based line of the input where an import stopped.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {line})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::DuplicateKey => 4,
        ErrorKind::InvalidArgument => 5,
        ErrorKind::Import => 6,
        ErrorKind::Io => 7,
    }
}

//! Error types returned by filter construction and (de)serialisation.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// The filter operation that produced an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Writing the filter contents out with [`dump`](crate::BloomFilter::dump).
    Dump,
    /// Reading filter contents in with [`load`](crate::BloomFilter::load).
    Load,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Dump => write!(f, "dump"),
            Operation::Load => write!(f, "load"),
        }
    }
}

/// A coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The filter parameters were invalid and no filter was constructed.
    Configuration,
    /// Opening, reading, writing or flushing the persisted form failed.
    Io,
    /// The persisted form does not follow the dump grammar.
    Format,
    /// The persisted form is well-formed but describes a differently sized
    /// filter.
    Consistency,
}

/// The reason a line of a dump was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing bitCount metadata line")]
    MissingMetadata,

    #[error("invalid metadata format: {0:?}")]
    MetadataPrefix(String),

    #[error("failed to parse bitCount as unsigned integer: {0:?}")]
    BitCount(String),

    #[error("expected exactly one ':' separator: {0:?}")]
    Separator(String),

    #[error("invalid 8-bit binary value {0:?}")]
    Token(String),

    #[error("line is not valid UTF-8")]
    Encoding,
}

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("filter requires at least one hash function")]
    NoHashers,

    #[error("filter bit length {0} is too small, at least 8 bits are required")]
    BitLength(usize),

    #[error("{op}: i/o failure on {}: {source}", .path.display())]
    Io {
        op: Operation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("{op}: i/o failure: {source}")]
    Stream {
        op: Operation,
        #[source]
        source: io::Error,
    },

    #[error("{op}: line {line}: {reason}")]
    Format {
        op: Operation,
        line: usize,
        #[source]
        reason: FormatError,
    },

    #[error("load: bitCount mismatch (expected: {expected}, got: {got})")]
    BitCountMismatch { expected: usize, got: usize },

    #[error("load: decoded {got} bytes of filter data, expected {expected}")]
    StoreLengthMismatch { expected: usize, got: usize },
}

impl Error {
    /// Return the [`ErrorKind`] this error belongs to.
    ///
    /// For an [`Error::File`] this is the kind of the wrapped error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::File { source, .. } => source.kind(),
            Error::NoHashers | Error::BitLength(_) => ErrorKind::Configuration,
            Error::Io { .. } | Error::Stream { .. } => ErrorKind::Io,
            Error::Format { .. } => ErrorKind::Format,
            Error::BitCountMismatch { .. } | Error::StoreLengthMismatch { .. } => {
                ErrorKind::Consistency
            }
        }
    }

    /// Return the error describing the failure itself, unwrapping the file
    /// context of an [`Error::File`].
    pub fn cause(&self) -> &Error {
        match self {
            Error::File { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Attach the file `path` to this error.
    ///
    /// Stream-level I/O errors become [`Error::Io`], errors that already name
    /// a path are returned as-is and everything else is wrapped in
    /// [`Error::File`].
    pub(crate) fn at_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::Stream { op, source } => Error::Io {
                op,
                path: path.into(),
                source,
            },
            e @ Error::Io { .. } | e @ Error::File { .. } => e,
            other => Error::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn format(op: Operation, line: usize, reason: FormatError) -> Self {
        Error::Format { op, line, reason }
    }
}

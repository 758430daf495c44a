// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur in the virtual file system
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// An argument was empty or malformed
    InvalidArgument,

    /// Path (or an intermediate path component) does not exist
    NotFound,

    /// Target is readonly, or the mutation is not permitted
    AccessDenied,

    /// A byte-level operation was attempted on a directory
    IsADirectory,

    /// A directory operation was attempted on a file
    NotADirectory,

    /// Destination name is already taken
    AlreadyExists,

    /// Non-recursive removal of a non-empty directory
    DirectoryNotEmpty,

    /// Name is empty, reserved or contains forbidden characters
    InvalidName,

    /// Seek would place the cursor before the start of the stream
    NegativeSeek,

    /// A size computation exceeded the wire format's integer range
    ArithmeticOverflow,

    /// The host requested cancellation
    Cancelled,

    /// A bulk operation finished, but at least one item failed
    PartialCopy,

    /// The requested command is not implemented by this plugin
    Unsupported,

    /// Unrecoverable internal invariant violation
    Internal,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MirageFsError: {self:?}")
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Returns `true` if the error is the cancellation code.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// File system result
pub type Result<T> = std::result::Result<T, Error>;

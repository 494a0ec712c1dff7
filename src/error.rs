use core::fmt;

use crate::span::Span;

/// A short, fixed-capacity, US-English error description. Never allocates;
/// this is what lets [`crate::scanner::ScanState`] stay plain, `Copy` data
/// (see §3/§9 of the design notes: the scanner never allocates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorMessage {
    bytes: [u8; 36],
    len: u8,
}

impl ErrorMessage {
    pub(crate) const fn new(text: &str) -> Self {
        let src = text.as_bytes();
        let mut bytes = [0u8; 36];
        let mut i = 0;
        // `text` is always a `&'static str` literal at call sites and is
        // asserted (by construction) to fit; truncate defensively anyway so
        // a future longer literal doesn't panic in release builds.
        while i < src.len() && i < bytes.len() {
            bytes[i] = src[i];
            i += 1;
        }
        ErrorMessage {
            bytes,
            len: i as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        // Safety/invariant: `bytes[..len]` is always copied from a `&str`,
        // so it is valid UTF-8 by construction.
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ErrorMessage {
    fn default() -> Self {
        ErrorMessage {
            bytes: [0; 36],
            len: 0,
        }
    }
}

/// The six failure kinds the scanner can latch into an absorbing state with
/// (§4.2, §7). `InvalidOperation` is the one kind that never latches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadSyntax,
    IllegalByteSequence,
    MaximumNesting,
    InvalidOperation,
    InputTooLarge,
    Malfunction,
}

/// The result code returned from every [`crate::scanner::Scanner::step`] call.
/// `Success` carries a token; every other variant latches the scanner (except
/// `InvalidOperation`, which never mutates scanner state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCode {
    Success,
    BadSyntax,
    IllegalByteSequence,
    MaximumNesting,
    InvalidOperation,
    InputTooLarge,
    Malfunction,
}

impl From<ErrorKind> for ScanCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::BadSyntax => ScanCode::BadSyntax,
            ErrorKind::IllegalByteSequence => ScanCode::IllegalByteSequence,
            ErrorKind::MaximumNesting => ScanCode::MaximumNesting,
            ErrorKind::InvalidOperation => ScanCode::InvalidOperation,
            ErrorKind::InputTooLarge => ScanCode::InputTooLarge,
            ErrorKind::Malfunction => ScanCode::Malfunction,
        }
    }
}

/// A scanner diagnostic: the kind of failure, the span it occurred at, and a
/// short human-readable description. Spans and descriptions are byte offsets
/// and US-English text; callers compute line/column by re-scanning the
/// prefix (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}", offset = span.offset())]
pub struct ScanError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: ErrorMessage,
}

/// Errors from [`crate::decode::stringify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StringifyError {
    /// The caller passed a null/zero-capacity buffer together with a
    /// nonzero required length, or passed a negative length.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// `out_buffer` was too small. No bytes past the limit were written.
    #[error("output buffer has insufficient space")]
    NoBufferSpace,
}

/// Errors from [`crate::decode::numberify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NumberifyError {
    /// The lexeme was empty, or the caller passed a negative length.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// The decoded value overflowed the configured floating-point type.
    #[error("value out of range")]
    OutOfRange,
}

/// Errors from the tree builder (§4.3). Scanner errors surface verbatim;
/// allocation failure is the one error class the builder adds on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("memory allocation failed")]
    OutOfMemory,
}

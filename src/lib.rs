//! # judo
//!
//! A non-recursive, allocation-free JSON / JSON5 scanner, with an optional
//! in-memory tree builder layered on top.
//!
//! Unlike a conventional recursive-descent parser, [`ScanState`] never
//! recurses and never allocates: it is plain `Copy` data, so a caller can
//! snapshot it by value and resume from that snapshot later — handy in
//! memory-constrained or safety-critical settings where an unbounded call
//! stack or a heap isn't available or isn't trusted. Nesting depth is
//! instead bounded at compile time by the `depth-*` Cargo features (see
//! [`scanner::MAX_DEPTH`]).
//!
//! ## Scanning
//!
//! [`ScanState::step`] advances the scanner by exactly one token and returns
//! a [`ScanCode`]. On [`ScanCode::Success`], read the token kind and span off
//! the scanner itself:
//!
//! ```
//! use judo::dialect::Dialect;
//! use judo::error::ScanCode;
//! use judo::scanner::ScanState;
//! use judo::token::TokenKind;
//!
//! let json = br#"{"name": "Elvis"}"#;
//! let mut scanner = ScanState::new(Dialect::default());
//! loop {
//!     let code = scanner.step(json);
//!     assert_eq!(code, ScanCode::Success);
//!     if scanner.token() == TokenKind::Eof {
//!         break;
//!     }
//!     // do something useful with `scanner.token()`/`scanner.span()`
//! }
//! ```
//!
//! A span never decodes itself; call [`decode::stringify`] or
//! [`decode::numberify_f64`]/[`decode::numberify_f32`] on it once you
//! actually need the value.
//!
//! ## Building a tree
//!
//! With the `builder` feature (on by default), [`value::parse`] drives a
//! [`ScanState`] to completion and returns a [`value::Document`] — a tree of
//! individually allocated nodes obtained from a caller-supplied
//! [`value::Allocator`] (the global allocator by default) and torn down by
//! an explicit, non-recursive free rather than a recursive `Drop`.
//!
//! ## Dialects
//!
//! Which grammar is in force — RFC 4627, RFC 8259, or JSON5 — and whether
//! comments and trailing commas are accepted, is chosen with
//! [`dialect::DialectBuilder`], and defaults to whatever `dialect-*` Cargo
//! feature this crate was built with.

pub mod codec;
#[cfg(any(feature = "float32", feature = "float64"))]
pub mod decode;
pub mod dialect;
pub mod error;
pub mod scanner;
pub mod span;
pub mod token;

#[cfg(feature = "builder")]
pub mod value;

pub use dialect::{Dialect, DialectBuilder, Grammar};
pub use error::{BuildError, NumberifyError, ScanCode, ScanError, StringifyError};
pub use scanner::ScanState;
pub use span::Span;
pub use token::{Token, TokenKind};

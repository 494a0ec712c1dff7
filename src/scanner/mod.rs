//! The non-recursive, allocation-free scanner (§4). This is the crate's
//! core, playing the role the teacher's `parser.rs` plays for `actson`:
//! [`ScanState::step`] is the direct descendant of the teacher's
//! `JsonParser::next_event`, but driven by an explicit frame stack instead of
//! a single resumable lexer state, because this scanner reads from a fully
//! materialized buffer rather than an incrementally fed one. A whole token
//! (a whole string, a whole number, a whole run of whitespace and comments)
//! is always lexed within a single `step` call; the teacher's byte-at-a-time
//! resumption states (`ES`, `U1`..`U4`, `T1`..`T3`, ...) have no counterpart
//! here because there is never a partial buffer to suspend over.

mod lex;

use crate::codec::{self, MAX_SOURCE_LEN};
use crate::dialect::{Dialect, Grammar};
use crate::error::{ErrorKind, ErrorMessage, ScanCode, ScanError};
use crate::span::Span;
use crate::token::{Token, TokenKind};

#[cfg(feature = "depth-128")]
pub const MAX_DEPTH: usize = 128;
#[cfg(all(feature = "depth-64", not(feature = "depth-128")))]
pub const MAX_DEPTH: usize = 64;
#[cfg(all(
    feature = "depth-32",
    not(any(feature = "depth-64", feature = "depth-128"))
))]
pub const MAX_DEPTH: usize = 32;
#[cfg(not(any(feature = "depth-32", feature = "depth-64", feature = "depth-128")))]
pub const MAX_DEPTH: usize = 16;

/// Generalizes the teacher's `MODE_ARRAY`/`MODE_OBJECT`/`MODE_KEY` stack tags
/// (`parser.rs`'s `VecDeque<i8>`) into a fixed-capacity array of states, one
/// per nesting level currently open. Unlike the teacher, there is no
/// `MODE_DONE` tag: the root level is tracked separately in `RootState`
/// because it is the one level that is never pushed or popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Just opened `[`; a value or `]` comes next.
    ArrayElementOrEnd,
    /// Just finished an element; `,` or `]` comes next.
    ArrayAfterElement,
    /// Just opened `{`, or just consumed `,`; a key or `}` comes next.
    ObjectKeyOrEnd,
    /// Just scanned a key; `:` and then a value come next.
    ObjectValue,
    /// Just finished a member's value; `,` or `}` comes next.
    ObjectAfterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    BeforeValue,
    AfterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LatchedError {
    kind: ErrorKind,
    span: Span,
    message: ErrorMessage,
}

/// `step` has no invalid-operation case of its own (unlike
/// [`crate::decode::stringify`]/[`crate::decode::numberify`]): every
/// misuse a caller could make — stepping a fresh scanner, stepping one
/// that's latched — is either well-defined or absorbed by the latch, so
/// this only ever wraps a latching diagnostic.
enum Fail {
    Latch(LatchedError),
}

impl From<lex::LexError> for Fail {
    fn from(e: lex::LexError) -> Self {
        Fail::Latch(LatchedError {
            kind: e.kind,
            span: Span::new(e.offset as u32, 0),
            message: ErrorMessage::new(e.message),
        })
    }
}

type StepResult<T> = Result<T, Fail>;

/// The scanner's entire state. `Copy`, no heap allocation, no internal
/// pointers: a caller may snapshot a `ScanState` by value (e.g. to back out
/// of speculative parsing) exactly as if it had `memcpy`'d the bytes (§3,
/// §9). Reading a fresh prefix of the same source from offset 0 and
/// re-running every `step` since reproduces the same sequence of states and
/// tokens: the struct and the grammar it encodes carry no history outside
/// these fields.
#[derive(Clone, Copy)]
pub struct ScanState {
    cursor: u32,
    last_token: TokenKind,
    last_span: Span,
    depth: u16,
    frames: [Frame; MAX_DEPTH],
    root_state: RootState,
    dialect: Dialect,
    error: Option<LatchedError>,
}

impl ScanState {
    pub fn new(dialect: Dialect) -> Self {
        ScanState {
            cursor: 0,
            last_token: TokenKind::Invalid,
            last_span: Span::new(0, 0),
            depth: 0,
            frames: [Frame::ArrayElementOrEnd; MAX_DEPTH],
            root_state: RootState::BeforeValue,
            dialect,
            error: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Current nesting depth: `0` at the root, incremented once per open
    /// array or object.
    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    /// The token kind produced by the most recent successful `step`, or
    /// `Invalid` before the first call and after a failing one.
    pub fn token(&self) -> TokenKind {
        self.last_token
    }

    /// The span of the most recent successful `step`'s token, or, after a
    /// failing `step`, the span the failure occurred at.
    pub fn span(&self) -> Span {
        self.last_span
    }

    /// How many bytes of the source have been consumed so far. Useful to a
    /// caller that re-slices its buffer between calls, or that wants to
    /// resume scanning a later chunk appended to the same backing storage.
    pub fn cursor(&self) -> usize {
        self.cursor as usize
    }

    /// The latched diagnostic, if `step` has returned anything other than
    /// `ScanCode::Success` or `ScanCode::InvalidOperation`. Stays set (and
    /// equal across calls) once latched: see §4.2/§7.
    pub fn last_error(&self) -> Option<ScanError> {
        self.error.map(|e| ScanError {
            kind: e.kind,
            span: e.span,
            message: e.message,
        })
    }

    /// Advances the scanner over `source[..source.len()]`, an explicit-length
    /// buffer (the `length ≥ 0` case of §3's source data model).
    pub fn step(&mut self, source: &[u8]) -> ScanCode {
        let len = source.len();
        self.step_bounded(source, len)
    }

    /// Advances the scanner over `source` up to (but not including) its
    /// first `0x00` byte, the nul-terminator end-of-input convention (the
    /// `length < 0` case of §3). The terminator itself is never part of any
    /// span or lexeme.
    pub fn step_nul_terminated(&mut self, source: &[u8]) -> ScanCode {
        let len = source.iter().position(|&b| b == 0).unwrap_or(source.len());
        self.step_bounded(source, len)
    }

    fn step_bounded(&mut self, full: &[u8], len: usize) -> ScanCode {
        if let Some(err) = self.error {
            self.last_token = TokenKind::Invalid;
            self.last_span = err.span;
            return ScanCode::from(err.kind);
        }

        if len > MAX_SOURCE_LEN {
            let err = LatchedError {
                kind: ErrorKind::InputTooLarge,
                span: Span::new(0, 0),
                message: ErrorMessage::new("source exceeds the maximum supported length"),
            };
            self.last_token = TokenKind::Invalid;
            self.last_span = err.span;
            let code = ScanCode::from(err.kind);
            self.error = Some(err);
            return code;
        }

        let source = &full[..len];
        match self.do_step(source) {
            Ok(token) => {
                self.last_token = token.kind;
                self.last_span = token.span;
                ScanCode::Success
            }
            Err(Fail::Latch(err)) => {
                self.last_token = TokenKind::Invalid;
                self.last_span = err.span;
                let code = ScanCode::from(err.kind);
                self.error = Some(err);
                code
            }
        }
    }

    fn bad_syntax(&self, offset: usize, message: &'static str) -> Fail {
        Fail::Latch(LatchedError {
            kind: ErrorKind::BadSyntax,
            span: Span::new(offset as u32, 0),
            message: ErrorMessage::new(message),
        })
    }

    fn malfunction(&self, offset: usize, message: &'static str) -> Fail {
        Fail::Latch(LatchedError {
            kind: ErrorKind::Malfunction,
            span: Span::new(offset as u32, 0),
            message: ErrorMessage::new(message),
        })
    }

    fn do_step(&mut self, source: &[u8]) -> StepResult<Token> {
        let mut cursor = self.cursor as usize;

        // UTF-8 BOM is only ever significant at offset 0 (§9); once the
        // cursor has moved past it, a `0xEF 0xBB 0xBF` run anywhere else is
        // ordinary (and almost always invalid) document content.
        if cursor == 0 && source.starts_with(&[0xEF, 0xBB, 0xBF]) {
            cursor = 3;
        }

        cursor = lex::skip_trivia(source, cursor, self.dialect)?;

        if cursor >= source.len() {
            if self.depth == 0 && self.root_state == RootState::AfterValue {
                self.cursor = cursor as u32;
                return Ok(Token::new(TokenKind::Eof, Span::new(cursor as u32, 0)));
            }
            return Err(self.bad_syntax(cursor, "unexpected end of input"));
        }

        if self.depth == 0 {
            match self.root_state {
                RootState::AfterValue => {
                    return Err(self.bad_syntax(cursor, "unexpected trailing content after root value"));
                }
                RootState::BeforeValue => {
                    if !self.dialect.any_root_value() && source[cursor] != b'[' && source[cursor] != b'{' {
                        return Err(self.bad_syntax(cursor, "root value must be an array or an object"));
                    }
                    self.root_state = RootState::AfterValue;
                    return self.scan_value(source, cursor);
                }
            }
        }

        match self.frames[self.depth as usize - 1] {
            Frame::ArrayElementOrEnd => self.scan_array_slot(source, cursor, true),
            Frame::ArrayAfterElement => self.scan_array_slot(source, cursor, false),
            Frame::ObjectKeyOrEnd => self.scan_object_key(source, cursor, true),
            Frame::ObjectValue => self.scan_object_colon_and_value(source, cursor),
            Frame::ObjectAfterValue => self.scan_object_key(source, cursor, false),
        }
    }

    fn first_byte_is(source: &[u8], cursor: usize, byte: u8) -> bool {
        source.get(cursor) == Some(&byte)
    }

    fn scan_array_slot(&mut self, source: &[u8], cursor: usize, before_any_element: bool) -> StepResult<Token> {
        if Self::first_byte_is(source, cursor, b']') {
            return self.close_array(cursor);
        }
        if before_any_element {
            self.frames[self.depth as usize - 1] = Frame::ArrayAfterElement;
            return self.scan_value(source, cursor);
        }
        if !Self::first_byte_is(source, cursor, b',') {
            return Err(self.bad_syntax(cursor, "expected ',' or ']'"));
        }
        let after_comma = lex::skip_trivia(source, cursor + 1, self.dialect)?;
        if self.dialect.trailing_commas() && Self::first_byte_is(source, after_comma, b']') {
            return self.close_array(after_comma);
        }
        if after_comma >= source.len() {
            return Err(self.bad_syntax(after_comma, "unexpected end of input"));
        }
        self.scan_value(source, after_comma)
    }

    fn close_array(&mut self, cursor: usize) -> StepResult<Token> {
        if self.depth == 0 {
            return Err(self.malfunction(cursor, "array close with empty frame stack"));
        }
        self.depth -= 1;
        self.cursor = (cursor + 1) as u32;
        Ok(Token::new(TokenKind::ArrayEnd, Span::new(cursor as u32, 1)))
    }

    fn scan_object_key(&mut self, source: &[u8], cursor: usize, before_any_member: bool) -> StepResult<Token> {
        if Self::first_byte_is(source, cursor, b'}') {
            return self.close_object(cursor);
        }
        if !before_any_member {
            if !Self::first_byte_is(source, cursor, b',') {
                return Err(self.bad_syntax(cursor, "expected ',' or '}'"));
            }
            let after_comma = lex::skip_trivia(source, cursor + 1, self.dialect)?;
            if self.dialect.trailing_commas() && Self::first_byte_is(source, after_comma, b'}') {
                return self.close_object(after_comma);
            }
            return self.scan_object_key_at(source, after_comma);
        }
        self.scan_object_key_at(source, cursor)
    }

    fn scan_object_key_at(&mut self, source: &[u8], start: usize) -> StepResult<Token> {
        if start >= source.len() {
            return Err(self.bad_syntax(start, "unexpected end of input"));
        }
        let quote = source[start];
        let end = if quote == b'"' || (self.is_json5() && quote == b'\'') {
            lex::scan_string(source, start, self.dialect)?
        } else if self.is_json5() && self.can_start_identifier(source, start) {
            let end = lex::scan_identifier_run(source, start)?;
            self.reject_reserved_word(source, start, end)?;
            end
        } else {
            return Err(self.bad_syntax(start, "expected a member name"));
        };
        self.frames[self.depth as usize - 1] = Frame::ObjectValue;
        self.cursor = end as u32;
        Ok(Token::new(TokenKind::ObjectName, Span::new(start as u32, (end - start) as u32)))
    }

    fn close_object(&mut self, cursor: usize) -> StepResult<Token> {
        if self.depth == 0 {
            return Err(self.malfunction(cursor, "object close with empty frame stack"));
        }
        self.depth -= 1;
        self.cursor = (cursor + 1) as u32;
        Ok(Token::new(TokenKind::ObjectEnd, Span::new(cursor as u32, 1)))
    }

    fn scan_object_colon_and_value(&mut self, source: &[u8], cursor: usize) -> StepResult<Token> {
        if !Self::first_byte_is(source, cursor, b':') {
            return Err(self.bad_syntax(cursor, "expected ':'"));
        }
        let value_start = lex::skip_trivia(source, cursor + 1, self.dialect)?;
        if value_start >= source.len() {
            return Err(self.bad_syntax(value_start, "unexpected end of input"));
        }
        self.frames[self.depth as usize - 1] = Frame::ObjectAfterValue;
        self.scan_value(source, value_start)
    }

    fn is_json5(&self) -> bool {
        matches!(self.dialect.grammar(), Grammar::Json5)
    }

    fn can_start_identifier(&self, source: &[u8], start: usize) -> bool {
        source[start] == b'\\' || codec::decode(&source[start..]).map(|d| codec::is_identifier_start(d.scalar)).unwrap_or(false)
    }

    fn reject_reserved_word(&self, source: &[u8], start: usize, end: usize) -> StepResult<()> {
        // Exactly the reserved-word list spec.md §4.2 enumerates, preserved
        // verbatim: notably it omits `true`/`false`/`null`/`await`, which
        // some ECMAScript reserved-word lists include but this one doesn't.
        const RESERVED: &[&str] = &[
            "break", "case", "catch", "class", "const", "continue", "debugger", "default",
            "delete", "do", "else", "enum", "export", "extends", "finally", "for", "function",
            "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
            "package", "private", "protected", "public", "return", "static", "super", "switch",
            "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
        ];
        let mut buf = [0u8; 16];
        let written = lex::decode_identifier_label(source, start, end, &mut buf);
        if written <= buf.len() {
            if let Ok(label) = core::str::from_utf8(&buf[..written]) {
                if RESERVED.contains(&label) {
                    return Err(self.bad_syntax(start, "reserved word used as an unquoted member name"));
                }
            }
        }
        Ok(())
    }

    /// Pushes a new frame for `[`/`{` and returns the begin token, or lexes a
    /// scalar token in place. `start` is the already-trivia-skipped offset
    /// of the value's first byte.
    fn scan_value(&mut self, source: &[u8], start: usize) -> StepResult<Token> {
        let first = source[start];

        if first == b'[' {
            if self.depth as usize >= MAX_DEPTH {
                return Err(Fail::Latch(LatchedError {
                    kind: ErrorKind::MaximumNesting,
                    span: Span::new(start as u32, 1),
                    message: ErrorMessage::new("maximum nesting depth exceeded"),
                }));
            }
            self.frames[self.depth as usize] = Frame::ArrayElementOrEnd;
            self.depth += 1;
            self.cursor = (start + 1) as u32;
            return Ok(Token::new(TokenKind::ArrayBegin, Span::new(start as u32, 1)));
        }
        if first == b'{' {
            if self.depth as usize >= MAX_DEPTH {
                return Err(Fail::Latch(LatchedError {
                    kind: ErrorKind::MaximumNesting,
                    span: Span::new(start as u32, 1),
                    message: ErrorMessage::new("maximum nesting depth exceeded"),
                }));
            }
            self.frames[self.depth as usize] = Frame::ObjectKeyOrEnd;
            self.depth += 1;
            self.cursor = (start + 1) as u32;
            return Ok(Token::new(TokenKind::ObjectBegin, Span::new(start as u32, 1)));
        }
        if first == b'"' || (self.is_json5() && first == b'\'') {
            let end = lex::scan_string(source, start, self.dialect)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::String, Span::new(start as u32, (end - start) as u32)));
        }

        self.scan_literal_value(source, start)
    }

    /// Dispatches among numbers, `true`/`false`/`null`, and (JSON5 only) the
    /// signed `NaN`/`Infinite` keywords. Named "Infinite", not "Infinity": a
    /// deliberate deviation from the usual JSON5 spelling.
    fn scan_literal_value(&mut self, source: &[u8], start: usize) -> StepResult<Token> {
        let first = source[start];
        let json5 = self.is_json5();

        if codec::is_digit(first as u32) || (json5 && first == b'.') {
            let end = lex::scan_number(source, start, self.dialect)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
        }

        if json5 && (first == b'+' || first == b'-') {
            if let Some(&next) = source.get(start + 1) {
                if next == b'N' || next == b'I' {
                    let end = self.scan_named_constant(source, start + 1)?;
                    self.cursor = end as u32;
                    return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
                }
            }
            let end = lex::scan_number(source, start, self.dialect)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
        }

        if first == b'-' {
            let end = lex::scan_number(source, start, self.dialect)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
        }

        if json5 && first == b'N' {
            let end = self.scan_named_constant(source, start)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
        }
        if json5 && first == b'I' {
            let end = self.scan_named_constant(source, start)?;
            self.cursor = end as u32;
            return Ok(Token::new(TokenKind::Number, Span::new(start as u32, (end - start) as u32)));
        }

        if first == b't' {
            return self.scan_keyword(source, start, "true", TokenKind::True);
        }
        if first == b'f' {
            return self.scan_keyword(source, start, "false", TokenKind::False);
        }
        if first == b'n' {
            return self.scan_keyword(source, start, "null", TokenKind::Null);
        }

        Err(self.bad_syntax(start, "expected a value"))
    }

    fn scan_keyword(&mut self, source: &[u8], start: usize, word: &'static str, kind: TokenKind) -> StepResult<Token> {
        let end = lex::scan_identifier_run(source, start)?;
        let mut buf = [0u8; 8];
        let written = lex::decode_identifier_label(source, start, end, &mut buf);
        if written > buf.len() || &buf[..written] != word.as_bytes() {
            return Err(self.bad_syntax(start, "unrecognized literal"));
        }
        self.cursor = end as u32;
        Ok(Token::new(kind, Span::new(start as u32, (end - start) as u32)))
    }

    /// Scans `NaN` or `Infinite` (the sign, if any, has already been
    /// consumed by the caller and is not part of `start`).
    fn scan_named_constant(&mut self, source: &[u8], start: usize) -> StepResult<usize> {
        let end = lex::scan_identifier_run(source, start)?;
        let mut buf = [0u8; 8];
        let written = lex::decode_identifier_label(source, start, end, &mut buf);
        let label = if written <= buf.len() { &buf[..written] } else { &[] as &[u8] };
        if label == b"NaN" || label == b"Infinite" {
            Ok(end)
        } else {
            Err(self.bad_syntax(start, "unrecognized literal"))
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState::new(Dialect::default())
    }
}

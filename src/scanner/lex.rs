//! Byte-level lexing helpers shared by the scanner's pushdown automaton
//! (`super::ScanState::step`). Each function scans one complete token body
//! (a number, a string, an identifier run, a comment, or a run of
//! whitespace) from a fully materialized buffer in a single bounded loop —
//! never recursing, never retaining the buffer past the call.

use crate::codec::{self, newline_sequence_len};
use crate::dialect::Dialect;
use crate::error::ErrorKind;

pub(super) struct LexError {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub offset: usize,
}

impl LexError {
    fn at(offset: usize, message: &'static str) -> Self {
        LexError {
            kind: ErrorKind::BadSyntax,
            message,
            offset,
        }
    }

}

pub(super) type LexResult<T> = Result<T, LexError>;

/// Decodes one scalar at `cursor`, translating codec failures into lex
/// errors anchored at `cursor`.
fn peek_scalar(source: &[u8], cursor: usize) -> LexResult<Option<(u32, usize)>> {
    if cursor >= source.len() {
        return Ok(None);
    }
    match codec::decode(&source[cursor..]) {
        Ok(d) if d.consumed == 0 => Ok(None),
        Ok(d) => Ok(Some((d.scalar, d.consumed))),
        Err(kind) => Err(LexError {
            kind,
            message: "invalid UTF-8 byte sequence",
            offset: cursor,
        }),
    }
}

/// Skips whitespace and, if the dialect allows it, line and block comments.
/// Returns the cursor positioned at the first byte of significant content
/// (or at end of input).
pub(super) fn skip_trivia(source: &[u8], mut cursor: usize, dialect: Dialect) -> LexResult<usize> {
    loop {
        let Some((scalar, consumed)) = peek_scalar(source, cursor)? else {
            return Ok(cursor);
        };
        if codec::is_whitespace(scalar) {
            cursor += consumed;
            continue;
        }
        if dialect.comments() && scalar == b'/' as u32 {
            if let Some((b'/' as u32, _)) = peek_scalar(source, cursor + consumed)? {
                cursor = skip_line_comment(source, cursor + consumed + 1)?;
                continue;
            }
            if let Some((b'*' as u32, _)) = peek_scalar(source, cursor + consumed)? {
                cursor = skip_block_comment(source, cursor + consumed + 1)?;
                continue;
            }
        }
        return Ok(cursor);
    }
}

fn skip_line_comment(source: &[u8], mut cursor: usize) -> LexResult<usize> {
    loop {
        let Some((scalar, consumed)) = peek_scalar(source, cursor)? else {
            return Ok(cursor);
        };
        let next = peek_scalar(source, cursor + consumed)?.map(|(s, _)| s);
        if newline_sequence_len(scalar, next).is_some() {
            return Ok(cursor);
        }
        cursor += consumed;
    }
}

fn skip_block_comment(source: &[u8], mut cursor: usize) -> LexResult<usize> {
    let start = cursor;
    loop {
        let Some((scalar, consumed)) = peek_scalar(source, cursor)? else {
            return Err(LexError::at(start, "unterminated block comment"));
        };
        if scalar == b'*' as u32 {
            if let Some((b'/' as u32, slash_len)) = peek_scalar(source, cursor + consumed)? {
                return Ok(cursor + consumed + slash_len);
            }
        }
        cursor += consumed;
    }
}

/// Scans a complete number lexeme starting at `start` (the caller has
/// already confirmed the first scalar can begin a number). Returns the
/// exclusive end offset.
pub(super) fn scan_number(source: &[u8], start: usize, dialect: Dialect) -> LexResult<usize> {
    use crate::dialect::Grammar;
    let json5 = matches!(dialect.grammar(), Grammar::Json5);

    let mut cursor = start;
    let (mut scalar, mut consumed) = peek_scalar(source, cursor)?.ok_or_else(|| {
        LexError::at(start, "expected a number")
    })?;

    if scalar == b'-' as u32 || (json5 && scalar == b'+' as u32) {
        cursor += consumed;
        (scalar, consumed) = peek_scalar(source, cursor)?
            .ok_or_else(|| LexError::at(start, "expected digit after sign"))?;
    }

    // JSON5 hexadecimal literal.
    if json5 && scalar == b'0' as u32 {
        if let Some((next, next_len)) = peek_scalar(source, cursor + consumed)? {
            if next == b'x' as u32 || next == b'X' as u32 {
                let hex_start = cursor + consumed + next_len;
                let mut p = hex_start;
                loop {
                    match peek_scalar(source, p)? {
                        Some((s, l)) if codec::is_hex_digit(s) => p += l,
                        _ => break,
                    }
                }
                if p == hex_start {
                    return Err(LexError::at(start, "invalid hexadecimal number"));
                }
                return Ok(p);
            }
        }
    }

    let mut has_int_digits = false;
    if scalar == b'0' as u32 {
        has_int_digits = true;
        cursor += consumed;
        if let Some((next, _)) = peek_scalar(source, cursor)? {
            if codec::is_digit(next) {
                return Err(LexError::at(start, "illegal octal number"));
            }
        }
    } else if codec::is_digit(scalar) {
        has_int_digits = true;
        while let Some((s, l)) = peek_scalar(source, cursor)? {
            if !codec::is_digit(s) {
                break;
            }
            cursor += l;
        }
    } else if !(json5 && scalar == b'.' as u32) {
        return Err(LexError::at(start, "expected digit"));
    }

    let mut has_frac = false;
    if let Some((b'.' as u32, dot_len)) = peek_scalar(source, cursor)? {
        let frac_start = cursor + dot_len;
        let mut p = frac_start;
        loop {
            match peek_scalar(source, p)? {
                Some((s, l)) if codec::is_digit(s) => p += l,
                _ => break,
            }
        }
        if p == frac_start {
            if json5 && has_int_digits {
                has_frac = true;
                cursor = p;
            } else {
                return Err(LexError::at(start, "expected fractional digit"));
            }
        } else {
            has_frac = true;
            cursor = p;
        }
    }

    if !has_int_digits && !has_frac {
        return Err(LexError::at(start, "invalid number"));
    }

    if let Some((s, l)) = peek_scalar(source, cursor)? {
        if s == b'e' as u32 || s == b'E' as u32 {
            let mut p = cursor + l;
            if let Some((sign, sign_len)) = peek_scalar(source, p)? {
                if sign == b'+' as u32 || sign == b'-' as u32 {
                    p += sign_len;
                }
            }
            let exp_start = p;
            loop {
                match peek_scalar(source, p)? {
                    Some((s, l)) if codec::is_digit(s) => p += l,
                    _ => break,
                }
            }
            if p == exp_start {
                return Err(LexError::at(start, "expected exponent digit"));
            }
            cursor = p;
        }
    }

    Ok(cursor)
}

/// Scans a run of ID_Start/ID_Continue scalars (with `\uXXXX` escapes
/// counted as one logical character each), starting at `start`. Returns the
/// exclusive end offset. The caller has already confirmed the first scalar
/// (or escape) is a valid identifier start.
pub(super) fn scan_identifier_run(source: &[u8], start: usize) -> LexResult<usize> {
    let mut cursor = start;
    let mut first = true;
    loop {
        let (scalar, consumed, is_escape) = match peek_scalar(source, cursor)? {
            None => break,
            Some((s, _)) if s == b'\\' as u32 => {
                let (scalar, len) = scan_unicode_escape(source, cursor)?;
                (scalar, len, true)
            }
            Some((s, l)) => (s, l, false),
        };
        let ok = if first {
            codec::is_identifier_start(scalar)
        } else {
            codec::is_identifier_continue(scalar)
        };
        if !ok {
            if first && is_escape {
                return Err(LexError::at(cursor, "invalid identifier start"));
            }
            break;
        }
        cursor += consumed;
        first = false;
    }
    if cursor == start {
        return Err(LexError::at(start, "expected identifier"));
    }
    Ok(cursor)
}

/// Scans `\uXXXX` at `cursor` (the backslash itself). Returns the decoded
/// scalar and the number of bytes consumed (always 6 for a well-formed
/// escape).
fn scan_unicode_escape(source: &[u8], cursor: usize) -> LexResult<(u32, usize)> {
    let (bs, bs_len) = peek_scalar(source, cursor)?
        .filter(|&(s, _)| s == b'\\' as u32)
        .ok_or_else(|| LexError::at(cursor, "expected escape"))?;
    let _ = bs;
    let (u, u_len) = peek_scalar(source, cursor + bs_len)?
        .filter(|&(s, _)| s == b'u' as u32)
        .ok_or_else(|| LexError::at(cursor, "expected unicode escape"))?;
    let _ = u;
    let mut p = cursor + bs_len + u_len;
    let mut value: u32 = 0;
    for _ in 0..4 {
        let (s, l) = peek_scalar(source, p)?.ok_or_else(|| LexError::at(cursor, "expected hex digit"))?;
        let digit = hex_value(s).ok_or_else(|| LexError::at(cursor, "expected hex digit"))?;
        value = (value << 4) | digit;
        p += l;
    }
    Ok((value, p - cursor))
}

fn hex_value(scalar: u32) -> Option<u32> {
    match scalar {
        0x30..=0x39 => Some(scalar - 0x30),
        0x41..=0x46 => Some(scalar - 0x41 + 10),
        0x61..=0x66 => Some(scalar - 0x61 + 10),
        _ => None,
    }
}

/// Decodes the identifier run `source[start..end]` into `out`, resolving
/// `\uXXXX` escapes (the only escape an identifier can contain) to UTF-8 and
/// copying every other scalar verbatim. Returns the number of bytes written,
/// or `out.len() + 1` if the decoded identifier doesn't fit — which a caller
/// matching against short fixed keywords (`true`, `NaN`, reserved words...)
/// can treat simply as "not a match" without inspecting the truncated bytes.
pub(super) fn decode_identifier_label(source: &[u8], start: usize, end: usize, out: &mut [u8]) -> usize {
    let mut cursor = start;
    let mut written = 0;
    while cursor < end {
        let (scalar, consumed) = match peek_scalar(source, cursor) {
            Ok(Some(v)) => v,
            _ => return out.len() + 1,
        };
        let scalar = if scalar == b'\\' as u32 {
            match scan_unicode_escape(source, cursor) {
                Ok((s, len)) => {
                    let advance = len;
                    cursor += advance;
                    s
                }
                Err(_) => return out.len() + 1,
            }
        } else {
            cursor += consumed;
            scalar
        };
        let mut buf = [0u8; 4];
        let n = codec::encode(scalar, &mut buf);
        if written + n > out.len() {
            return out.len() + 1;
        }
        out[written..written + n].copy_from_slice(&buf[..n]);
        written += n;
    }
    written
}

/// Scans a complete string lexeme starting at `start` (the opening
/// delimiter, `"` or `'`). Returns the exclusive end offset, just past the
/// matching closing delimiter.
pub(super) fn scan_string(source: &[u8], start: usize, dialect: Dialect) -> LexResult<usize> {
    use crate::dialect::Grammar;
    let json5 = matches!(dialect.grammar(), Grammar::Json5);

    let (quote, quote_len) = peek_scalar(source, start)?.expect("caller validated opening quote");
    let mut cursor = start + quote_len;
    let mut pending_high_surrogate = false;

    loop {
        let Some((scalar, consumed)) = peek_scalar(source, cursor)? else {
            return Err(LexError::at(start, "unterminated string"));
        };

        if scalar == quote {
            if pending_high_surrogate {
                return Err(LexError::at(cursor, "unmatched surrogate pair"));
            }
            return Ok(cursor + consumed);
        }

        if scalar < 0x20 {
            return Err(LexError::at(cursor, "control character must be escaped"));
        }

        if scalar == b'\\' as u32 {
            let escape_start = cursor;
            let (next, next_len) = peek_scalar(source, cursor + consumed)?
                .ok_or_else(|| LexError::at(escape_start, "unterminated string"))?;

            match next {
                x if x == b'"' as u32
                    || x == b'\\' as u32
                    || x == b'/' as u32
                    || x == b'b' as u32
                    || x == b'f' as u32
                    || x == b'n' as u32
                    || x == b'r' as u32
                    || x == b't' as u32 =>
                {
                    if pending_high_surrogate {
                        return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                    }
                    cursor += consumed + next_len;
                }
                x if json5 && x == b'\'' as u32 => {
                    if pending_high_surrogate {
                        return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                    }
                    cursor += consumed + next_len;
                }
                x if json5 && (x == b'v' as u32 || x == b'0' as u32) => {
                    if pending_high_surrogate {
                        return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                    }
                    cursor += consumed + next_len;
                }
                x if json5 && x == b'x' as u32 => {
                    if pending_high_surrogate {
                        return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                    }
                    let mut p = cursor + consumed + next_len;
                    for _ in 0..2 {
                        let (s, l) = peek_scalar(source, p)?
                            .ok_or_else(|| LexError::at(escape_start, "expected hex digit"))?;
                        if hex_value(s).is_none() {
                            return Err(LexError::at(escape_start, "expected hex digit"));
                        }
                        p += l;
                    }
                    cursor = p;
                }
                x if x == b'u' as u32 => {
                    let (unicode, escape_len) = scan_unicode_escape(source, escape_start)?;
                    if (0xD800..=0xDBFF).contains(&unicode) {
                        if pending_high_surrogate {
                            return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                        }
                        pending_high_surrogate = true;
                    } else if (0xDC00..=0xDFFF).contains(&unicode) {
                        if !pending_high_surrogate {
                            return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                        }
                        pending_high_surrogate = false;
                    } else if pending_high_surrogate {
                        return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                    }
                    cursor = escape_start + escape_len;
                }
                x if json5 => {
                    if let Some(nl_len) = newline_sequence_len(
                        x,
                        peek_scalar(source, cursor + consumed + next_len)?.map(|(s, _)| s),
                    ) {
                        if pending_high_surrogate {
                            return Err(LexError::at(escape_start, "unmatched surrogate pair"));
                        }
                        // Line continuation: backslash + newline sequence is elided.
                        let total_nl_len = if nl_len == 2 {
                            next_len
                                + peek_scalar(source, cursor + consumed + next_len)?
                                    .map(|(_, l)| l)
                                    .unwrap_or(0)
                        } else {
                            next_len
                        };
                        cursor += consumed + total_nl_len;
                    } else {
                        return Err(LexError::at(escape_start, "invalid escape sequence"));
                    }
                }
                _ => return Err(LexError::at(escape_start, "invalid escape sequence")),
            }
            continue;
        }

        if pending_high_surrogate {
            return Err(LexError::at(cursor, "unmatched surrogate pair"));
        }
        cursor += consumed;
    }
}

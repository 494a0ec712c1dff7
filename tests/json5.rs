use judo::decode;
use judo::dialect::{DialectBuilder, Grammar};
use judo::scanner::ScanState;
use judo::token::TokenKind;
use judo::ScanCode;

fn json5() -> judo::Dialect {
    DialectBuilder::default().with_grammar(Grammar::Json5).build()
}

fn scan_all(json: &[u8], dialect: judo::Dialect) -> Vec<(TokenKind, (usize, usize))> {
    let mut scanner = ScanState::new(dialect);
    let mut out = Vec::new();
    loop {
        let code = scanner.step(json);
        assert_eq!(code, ScanCode::Success, "scan failed: {:?}", scanner.last_error());
        let span = scanner.span();
        out.push((scanner.token(), (span.offset() as usize, span.len() as usize)));
        if scanner.token() == TokenKind::Eof {
            break;
        }
    }
    out
}

#[test]
fn accepts_unquoted_object_keys() {
    let json = br#"{name: "Elvis", $age: 42, _id: "x"}"#;
    let tokens = scan_all(json, json5());
    let kinds: Vec<_> = tokens.into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::ObjectBegin,
            TokenKind::ObjectName,
            TokenKind::String,
            TokenKind::ObjectName,
            TokenKind::Number,
            TokenKind::ObjectName,
            TokenKind::String,
            TokenKind::ObjectEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn rejects_reserved_word_as_unquoted_key() {
    let json = br#"{class: 1}"#;
    let mut scanner = ScanState::new(json5());
    let code = scanner.step(json);
    assert_eq!(code, ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::ObjectBegin);
    let code = scanner.step(json);
    assert_ne!(code, ScanCode::Success);
}

#[test]
fn accepts_single_quoted_strings() {
    let json = br#"['a', 'b\'c']"#;
    let kinds: Vec<_> = scan_all(json, json5()).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::ArrayBegin, TokenKind::String, TokenKind::String, TokenKind::ArrayEnd, TokenKind::Eof]
    );
}

#[test]
fn accepts_trailing_commas() {
    let json = br#"[1, 2, 3,]"#;
    let kinds: Vec<_> = scan_all(json, json5()).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::ArrayBegin,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::ArrayEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn rejects_trailing_comma_outside_json5() {
    let json = br#"[1, 2,]"#;
    let mut scanner = ScanState::new(judo::Dialect::default());
    let mut last = ScanCode::Success;
    loop {
        last = scanner.step(json);
        if last != ScanCode::Success || scanner.token() == TokenKind::Eof {
            break;
        }
    }
    assert_ne!(last, ScanCode::Success);
}

#[test]
fn skips_line_and_block_comments() {
    let json = b"{\n  // a comment\n  \"a\": 1, /* block */ \"b\": 2\n}";
    let kinds: Vec<_> = scan_all(json, json5()).into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::ObjectBegin,
            TokenKind::ObjectName,
            TokenKind::Number,
            TokenKind::ObjectName,
            TokenKind::Number,
            TokenKind::ObjectEnd,
            TokenKind::Eof,
        ]
    );
}

#[cfg(feature = "float64")]
#[test]
fn parses_hex_leading_dot_and_signed_numbers() {
    let json = br#"[0x1F, .5, 5., +3, -.25]"#;
    let mut scanner = ScanState::new(json5());
    let mut values = Vec::new();
    loop {
        let code = scanner.step(json);
        assert_eq!(code, ScanCode::Success);
        match scanner.token() {
            TokenKind::Number => {
                values.push(decode::numberify_f64(json, scanner.span()).unwrap());
            }
            TokenKind::Eof => break,
            _ => {}
        }
    }
    assert_eq!(values, vec![31.0, 0.5, 5.0, 3.0, -0.25]);
}

#[cfg(feature = "float64")]
#[test]
fn parses_nan_and_infinite() {
    let json = br#"[NaN, Infinite, -Infinite, +NaN]"#;
    let mut scanner = ScanState::new(json5());
    let mut values = Vec::new();
    loop {
        let code = scanner.step(json);
        assert_eq!(code, ScanCode::Success);
        match scanner.token() {
            TokenKind::Number => {
                values.push(decode::numberify_f64(json, scanner.span()).unwrap());
            }
            TokenKind::Eof => break,
            _ => {}
        }
    }
    assert!(values[0].is_nan());
    assert_eq!(values[1], f64::INFINITY);
    assert_eq!(values[2], f64::NEG_INFINITY);
    assert!(values[3].is_nan());
}

#[test]
fn decodes_unquoted_key_with_unicode_escape() {
    let json = br#"{a: 1}"#;
    let mut scanner = ScanState::new(json5());
    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::ObjectBegin);
    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::ObjectName);
    let span = scanner.span();
    let mut buf = [0u8; 8];
    let n = decode::stringify(json, span, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"a");
}

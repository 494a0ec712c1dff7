use judo::dialect::{Dialect, DialectBuilder, Grammar};
use judo::error::ErrorKind;
use judo::scanner::ScanState;
use judo::token::TokenKind;
use judo::ScanCode;

fn tokens(json: &[u8], dialect: Dialect) -> Vec<TokenKind> {
    let mut scanner = ScanState::new(dialect);
    let mut kinds = Vec::new();
    loop {
        let code = scanner.step(json);
        assert_eq!(code, ScanCode::Success, "unexpected scan failure: {:?}", scanner.last_error());
        kinds.push(scanner.token());
        if scanner.token() == TokenKind::Eof {
            break;
        }
    }
    kinds
}

#[test]
fn scans_a_flat_object() {
    let json = br#"{"name": "Elvis", "age": 42}"#;
    let kinds = tokens(json, Dialect::default());
    assert_eq!(
        kinds,
        vec![
            TokenKind::ObjectBegin,
            TokenKind::ObjectName,
            TokenKind::String,
            TokenKind::ObjectName,
            TokenKind::Number,
            TokenKind::ObjectEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scans_nested_arrays_and_objects() {
    let json = br#"[1, {"a": [true, false, null]}, "z"]"#;
    let kinds = tokens(json, Dialect::default());
    assert_eq!(
        kinds,
        vec![
            TokenKind::ArrayBegin,
            TokenKind::Number,
            TokenKind::ObjectBegin,
            TokenKind::ObjectName,
            TokenKind::ArrayBegin,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::ArrayEnd,
            TokenKind::ObjectEnd,
            TokenKind::String,
            TokenKind::ArrayEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn eof_is_idempotent_once_reached() {
    let json = br#"null"#;
    let mut scanner = ScanState::new(Dialect::default());
    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::Null);
    for _ in 0..5 {
        assert_eq!(scanner.step(json), ScanCode::Success);
        assert_eq!(scanner.token(), TokenKind::Eof);
    }
}

#[test]
fn latched_error_is_stable_across_repeated_steps() {
    let json = br#"{"a": }"#;
    let mut scanner = ScanState::new(Dialect::default());
    loop {
        let code = scanner.step(json);
        if code != ScanCode::Success {
            break;
        }
    }
    let first = scanner.last_error();
    assert!(first.is_some());
    let first_code = scanner.step(json);
    assert_ne!(first_code, ScanCode::Success);
    for _ in 0..5 {
        let code = scanner.step(json);
        assert_eq!(code, first_code);
        assert_eq!(scanner.last_error(), first);
    }
}

#[test]
fn trailing_content_after_root_value_is_an_error() {
    let json = br#"1 2"#;
    let mut scanner = ScanState::new(Dialect::default());
    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::Number);
    let code = scanner.step(json);
    assert_ne!(code, ScanCode::Success);
}

#[test]
fn rfc4627_rejects_a_scalar_root_value() {
    let dialect = DialectBuilder::default().with_grammar(Grammar::Rfc4627).build();
    let json = br#"42"#;
    let mut scanner = ScanState::new(dialect);
    let code = scanner.step(json);
    assert_ne!(code, ScanCode::Success);
}

#[test]
fn rfc8259_accepts_a_scalar_root_value() {
    let dialect = DialectBuilder::default().with_grammar(Grammar::Rfc8259).build();
    let json = br#"42"#;
    let kinds = tokens(json, dialect);
    assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Eof]);
}

#[test]
fn scanner_state_is_copy_and_resumable_from_a_snapshot() {
    let json = br#"[1, 2, 3]"#;
    let mut scanner = ScanState::new(Dialect::default());
    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::ArrayBegin);

    let snapshot = scanner;

    assert_eq!(scanner.step(json), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::Number);

    let mut resumed = snapshot;
    assert_eq!(resumed.step(json), ScanCode::Success);
    assert_eq!(resumed.token(), TokenKind::Number);
    assert_eq!(resumed.span(), scanner.span());
}

#[test]
fn maximum_nesting_depth_is_enforced() {
    let mut json = String::new();
    for _ in 0..64 {
        json.push('[');
    }
    for _ in 0..64 {
        json.push(']');
    }
    let mut scanner = ScanState::new(Dialect::default());
    let mut last_code = ScanCode::Success;
    loop {
        last_code = scanner.step(json.as_bytes());
        if last_code != ScanCode::Success || scanner.token() == TokenKind::Eof {
            break;
        }
    }
    assert_ne!(last_code, ScanCode::Success);
    assert_eq!(scanner.last_error().unwrap().kind, ErrorKind::MaximumNesting);
}

#[test]
fn nul_terminated_stops_before_the_terminator() {
    let mut buf = Vec::from(*b"null");
    buf.push(0);
    buf.extend_from_slice(b"garbage that must never be scanned");
    let mut scanner = ScanState::new(Dialect::default());
    assert_eq!(scanner.step_nul_terminated(&buf), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::Null);
    assert_eq!(scanner.step_nul_terminated(&buf), ScanCode::Success);
    assert_eq!(scanner.token(), TokenKind::Eof);
}

#[test]
fn utf8_bom_is_skipped_only_at_the_start() {
    let mut json = vec![0xEF, 0xBB, 0xBF];
    json.extend_from_slice(br#"{"k": "v"}"#);
    let kinds = tokens(&json, Dialect::default());
    assert_eq!(
        kinds,
        vec![
            TokenKind::ObjectBegin,
            TokenKind::ObjectName,
            TokenKind::String,
            TokenKind::ObjectEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn rejects_invalid_utf8_in_source() {
    let json = b"\"\xFF\"";
    let mut scanner = ScanState::new(Dialect::default());
    let code = scanner.step(json);
    assert_ne!(code, ScanCode::Success);
}

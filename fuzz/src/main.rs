use judo::dialect::{Dialect, DialectBuilder, Grammar};
use judo::scanner::ScanState;
use judo::token::TokenKind;

#[macro_use]
extern crate afl;

/// Drives a scanner over arbitrary bytes to the first error or `Eof`,
/// checking the invariants `step` promises no matter what garbage it's fed:
/// it never panics, and once it latches an error it keeps reporting the
/// exact same one forever.
fn drive(data: &[u8], dialect: Dialect) {
    let mut scanner = ScanState::new(dialect);
    let mut steps = 0usize;
    loop {
        let code = scanner.step(data);
        if code != judo::ScanCode::Success {
            let first = scanner.last_error();
            for _ in 0..3 {
                let again = scanner.step(data);
                assert_eq!(again, code, "latched error code changed across repeated steps");
                assert_eq!(scanner.last_error(), first, "latched error payload changed across repeated steps");
            }
            break;
        }
        if scanner.token() == TokenKind::Eof {
            break;
        }
        steps += 1;
        if steps > data.len() + 1 {
            panic!("scanner made no forward progress");
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        drive(data, Dialect::default());
        drive(data, DialectBuilder::default().with_grammar(Grammar::Json5).build());
    });
}

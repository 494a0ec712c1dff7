//! A thin demonstration CLI: reads a JSON/JSON5 document from stdin,
//! re-emits it (compact by default, or indented with `--pretty`), and
//! reports a non-zero exit code on failure. Grounded in the logging and
//! argument-handling conventions of `early-boot-config`'s `main.rs`
//! (manual `env::args` parsing, `eprintln!` + `process::exit` on bad usage,
//! `env_logger::Builder` wired to a log-level flag) rather than the
//! scanner's own conventions, since this binary is ambient tooling, not
//! part of the scanner itself.

use std::io::{Read, Write};
use std::process::ExitCode;
use std::{env, io, process};

use judo::decode;
use judo::dialect::{Dialect, DialectBuilder, Grammar};
use judo::error::BuildError;
use judo::value::{self, Allocator, Document, NodeId, ValueType};

const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

struct Args {
    pretty: bool,
    grammar: Option<Grammar>,
    log_level: log::LevelFilter,
}

fn usage() -> ! {
    let program = env::args().next().unwrap_or_else(|| "judo".to_string());
    eprintln!(
        "Usage: {program} [--pretty] [--grammar rfc4627|rfc8259|json5] [--log-level trace|debug|info|warn|error]\n\nReads a JSON/JSON5 document from stdin and re-emits it on stdout.",
    );
    process::exit(1);
}

fn parse_args(argv: impl Iterator<Item = String>) -> Args {
    let mut pretty = false;
    let mut grammar = None;
    let mut log_level = log::LevelFilter::Warn;

    let mut argv = argv.skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--pretty" => pretty = true,
            "--grammar" => {
                let value = argv.next().unwrap_or_else(|| usage());
                grammar = Some(match value.as_str() {
                    "rfc4627" => Grammar::Rfc4627,
                    "rfc8259" => Grammar::Rfc8259,
                    "json5" => Grammar::Json5,
                    _ => usage(),
                });
            }
            "--log-level" => {
                let value = argv.next().unwrap_or_else(|| usage());
                log_level = value.parse().unwrap_or_else(|_| usage());
            }
            "--help" | "-h" => usage(),
            _ => usage(),
        }
    }

    Args { pretty, grammar, log_level }
}

fn main() -> ExitCode {
    let args = parse_args(env::args());

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_module_path(false)
        .init();

    let dialect = match args.grammar {
        Some(grammar) => DialectBuilder::default().with_grammar(grammar).build(),
        None => Dialect::default(),
    };

    let input = match read_stdin_capped() {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("failed to read stdin: {e}");
            return ExitCode::from(3);
        }
    };

    let document = match value::parse(&input, dialect) {
        Ok(doc) => doc,
        Err(BuildError::Scan(err)) => {
            log::error!("parse error at offset {}: {}", err.span.offset(), err.message);
            eprintln!("parse error at offset {}: {}", err.span.offset(), err.message);
            return ExitCode::from(2);
        }
        Err(BuildError::OutOfMemory) => {
            log::error!("out of memory while building document tree");
            return ExitCode::from(2);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = print_value(&mut out, &document, document.root(), args.pretty, 0) {
        log::error!("failed to write stdout: {e}");
        return ExitCode::from(3);
    }
    let _ = writeln!(out);

    ExitCode::SUCCESS
}

fn read_stdin_capped() -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut limited = io::stdin().take(MAX_INPUT_BYTES as u64 + 1);
    limited.read_to_end(&mut buf)?;
    if buf.len() > MAX_INPUT_BYTES {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "input exceeds 10 MiB limit"));
    }
    Ok(buf)
}

enum Frame<'doc> {
    /// Emit `id`'s own token (and, if it's a member, its name prefix).
    Value(NodeId<'doc>, usize),
    /// Emit the next pending child of an already-opened container, or its
    /// closing delimiter once `next` reaches `children.len()`.
    Container {
        children: std::rc::Rc<[NodeId<'doc>]>,
        next: usize,
        indent: usize,
        close: u8,
    },
}

/// Re-emits `id` as text. Iterative rather than recursive, in keeping with
/// the rest of this crate: an explicit work stack stands in for the call
/// stack a naive recursive printer would use.
fn print_value<A: Allocator>(
    out: &mut impl Write,
    doc: &Document<'_, A>,
    root: NodeId<'_>,
    pretty: bool,
    base_indent: usize,
) -> io::Result<()> {
    let mut stack = vec![Frame::Value(root, base_indent)];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Container { children, next, indent, close } => {
                if next < children.len() {
                    if next > 0 {
                        write!(out, ",")?;
                    }
                    if pretty {
                        writeln!(out)?;
                        write!(out, "{}", " ".repeat(indent + 2))?;
                    }
                    let rest = std::rc::Rc::clone(&children);
                    stack.push(Frame::Container { children: rest, next: next + 1, indent, close });
                    stack.push(Frame::Value(children[next], indent + 2));
                } else {
                    if pretty && !children.is_empty() {
                        writeln!(out)?;
                        write!(out, "{}", " ".repeat(indent))?;
                    }
                    out.write_all(&[close])?;
                }
            }
            Frame::Value(id, indent) => {
                if let Some(name) = doc.member_name_span(id) {
                    out.write_all(name.slice(doc.source()))?;
                    write!(out, ": ")?;
                }
                match doc.get_type(id) {
                    ValueType::Null => write!(out, "null")?,
                    ValueType::Bool => write!(out, "{}", doc.as_bool(id))?,
                    ValueType::Number => {
                        let span = doc.value_span(id);
                        let v = decode::numberify_f64(doc.source(), span)
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                        write!(out, "{v}")?;
                    }
                    ValueType::String => {
                        let span = doc.value_span(id);
                        let needed = decode::stringify(doc.source(), span, &mut [])
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                        let mut buf = vec![0u8; needed];
                        decode::stringify(doc.source(), span, &mut buf)
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                        write!(out, "\"")?;
                        out.write_all(&buf)?;
                        write!(out, "\"")?;
                    }
                    ValueType::Array | ValueType::Object => {
                        let (open, close) = if doc.get_type(id) == ValueType::Array {
                            (b'[', b']')
                        } else {
                            (b'{', b'}')
                        };
                        out.write_all(&[open])?;
                        let mut children = Vec::new();
                        let mut cursor = doc.first_child(id);
                        while let Some(child) = cursor {
                            children.push(child);
                            cursor = doc.next_sibling(child);
                        }
                        stack.push(Frame::Container { children: children.into(), next: 0, indent, close });
                    }
                }
            }
        }
    }

    Ok(())
}

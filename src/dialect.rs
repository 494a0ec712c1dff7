//! Grammar dialect selection (§6). Generalizes the teacher's
//! `JsonParserOptions`/`JsonParserOptionsBuilder` (`options.rs`) from a
//! single streaming-mode flag into the full dialect/extension surface this
//! scanner needs, keeping the same builder shape.

/// Which of the three root-value grammars is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// RFC 4627: the root value must be an array or an object.
    Rfc4627,
    /// RFC 8259: the root may be any value.
    Rfc8259,
    /// JSON5: RFC 8259 plus comments, trailing commas, relaxed numbers and
    /// strings, and unquoted object keys.
    Json5,
}

/// The tuple of (RFC choice, comments, trailing commas) that governs
/// scanning. Selected at build time per §6, but represented here as a
/// runtime value (like the teacher's `JsonParserOptions`) so that the
/// compile-time Cargo features only pick this struct's *default*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub(crate) grammar: Grammar,
    pub(crate) comments: bool,
    pub(crate) trailing_commas: bool,
}

impl Dialect {
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn comments(&self) -> bool {
        self.comments
    }

    pub fn trailing_commas(&self) -> bool {
        self.trailing_commas
    }

    /// `true` for JSON5, or if the root value need not be an array/object.
    pub(crate) fn any_root_value(&self) -> bool {
        !matches!(self.grammar, Grammar::Rfc4627)
    }
}

impl Default for Dialect {
    /// The dialect implied by this build's Cargo features.
    fn default() -> Self {
        #[cfg(feature = "dialect-json5")]
        {
            return Dialect {
                grammar: Grammar::Json5,
                comments: true,
                trailing_commas: true,
            };
        }
        #[cfg(all(feature = "dialect-rfc4627", not(feature = "dialect-json5")))]
        {
            return Dialect {
                grammar: Grammar::Rfc4627,
                comments: cfg!(feature = "comments"),
                trailing_commas: cfg!(feature = "trailing-commas"),
            };
        }
        #[cfg(not(any(feature = "dialect-json5", feature = "dialect-rfc4627")))]
        {
            Dialect {
                grammar: Grammar::Rfc8259,
                comments: cfg!(feature = "comments"),
                trailing_commas: cfg!(feature = "trailing-commas"),
            }
        }
    }
}

/// A builder for [`Dialect`], mirroring the teacher's
/// `JsonParserOptionsBuilder`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.dialect.grammar = grammar;
        if matches!(grammar, Grammar::Json5) {
            self.dialect.comments = true;
            self.dialect.trailing_commas = true;
        }
        self
    }

    pub fn with_comments(mut self, comments: bool) -> Self {
        self.dialect.comments = comments;
        self
    }

    pub fn with_trailing_commas(mut self, trailing_commas: bool) -> Self {
        self.dialect.trailing_commas = trailing_commas;
        self
    }

    pub fn build(self) -> Dialect {
        self.dialect
    }
}

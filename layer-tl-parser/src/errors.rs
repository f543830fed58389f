use std::fmt;
use std::io;

use thiserror::Error;

/// A location inside the schema text.
///
/// `offset` is the absolute, 0-based byte offset; `line` and `column` are
/// 1-based and count bytes, not characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// Absolute byte offset from the start of the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    pub(crate) const START: Position = Position { offset: 0, line: 1, column: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}, offset {}", self.line, self.column, self.offset)
    }
}

/// What went wrong while tokenizing.
#[derive(Debug, Error)]
pub enum LexErrorKind {
    /// A raw newline occurred inside a single declaration.
    #[error("unexpected new line in the declaration")]
    UnexpectedNewline,
    /// Input ended in the middle of a declaration.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A character that cannot start or continue a token here.
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    /// The token sequence does not form a declaration.
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        /// Human readable description of what was acceptable.
        expected: &'static str,
        /// Human readable description of what was seen.
        found: String,
    },
    /// A `---name---` separator other than `types` or `functions`.
    #[error("unknown section separator `---{0}---`")]
    InvalidSection(String),
    /// The `#id` literal is not a 32-bit hexadecimal number.
    #[error("invalid identifier literal `{0}`")]
    InvalidId(String),
    /// A token is not valid UTF-8.
    #[error("token is not valid UTF-8")]
    InvalidUtf8,
    /// The underlying reader failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A fatal tokenizer diagnostic, carrying the position it was raised at.
#[derive(Debug, Error)]
#[error("{kind} at {position}")]
pub struct LexError {
    /// The failure.
    pub kind: LexErrorKind,
    /// Where it happened.
    pub position: Position,
}

impl LexError {
    pub(crate) fn new(kind: LexErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// Errors produced while parsing a single type expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeGrammarError {
    /// An empty string was encountered where a type was expected.
    #[error("empty type expression")]
    Empty,
    /// A flag expression (`name.N?Type`) was malformed.
    #[error("invalid flag expression `{0}`")]
    InvalidFlag(String),
    /// The flag bit does not fit into a 32-bit flags word.
    #[error("flag bit {bit} is out of range 0..=31")]
    FlagBitOutOfRange {
        /// The bit index as written.
        bit: u64,
    },
    /// `flags.N?#`: a flags word cannot itself be optional.
    #[error("flags word `{0}` cannot be flag-gated")]
    FlagGatedFlagsWord(String),
    /// `a.0?b.1?T`: flag conditions do not nest.
    #[error("nested flag condition in `{0}`")]
    NestedFlag(String),
    /// A `Vector<…>` argument was malformed.
    #[error("invalid vector type `{0}`")]
    InvalidVector(String),
    /// `!X` used outside a method declaration.
    #[error("type variable `{0}` is only allowed in methods")]
    TypeVarOutsideMethod(String),
    /// Empty namespace components or forbidden characters.
    #[error("invalid type name `{0}`")]
    InvalidName(String),
}

/// Errors produced while ingesting a complete schema.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The IDL text could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// A parameter or result type was not a valid type expression.
    #[error("in `{declaration}`, {}: {source}", describe_parameter(.parameter))]
    Type {
        /// Full name of the declaration.
        declaration: String,
        /// The offending parameter; `None` for the result type.
        parameter: Option<String>,
        /// The grammar failure.
        #[source]
        source: TypeGrammarError,
    },
    /// The JSON schema document is malformed.
    #[error("invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),
    /// A JSON `id` is neither hexadecimal nor decimal 32-bit.
    #[error("invalid JSON identifier `{0}`")]
    InvalidJsonId(String),
    /// A JSON entry has neither `predicate` nor `method`.
    #[error("JSON entry with id `{0}` has no `predicate` or `method` name")]
    MissingJsonName(String),
    /// The source could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

fn describe_parameter(parameter: &Option<String>) -> String {
    match parameter {
        Some(name) => format!("parameter `{name}`"),
        None => "result type".to_owned(),
    }
}

use thiserror::Error;

/// Errors that abort a plan build.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Two declarations, possibly from different schemas, share an identifier.
    #[error("identifier {id:#010x} is declared by both `{first}` and `{second}`")]
    DuplicateIdentifier {
        /// The shared identifier.
        id: u32,
        /// The declaration that claimed it first.
        first: String,
        /// The declaration that collided with it.
        second: String,
    },
    /// Stripping the common prefix of an enum's members left an empty or
    /// repeated label.
    #[error("cannot derive distinct enum labels for `{type_name}` from {siblings:?}")]
    AmbiguousEnumLabel {
        /// The result type being collapsed.
        type_name: String,
        /// Every sibling declaration name.
        siblings: Vec<String>,
    },
    /// A type group without declarations reached the resolver.
    #[error("type `{0}` has no constructors")]
    EmptyTypeGroup(String),
    /// A flag-gated parameter refers to a flags word that is not declared
    /// before it in the same declaration.
    #[error("`{declaration}` refers to undeclared flags word `{word}`")]
    FlagWordMissing {
        /// Full declaration name.
        declaration: String,
        /// The missing word.
        word: String,
    },
    /// A capability pattern is not a valid regular expression.
    #[error("invalid capability pattern `{pattern}`: {source}")]
    InvalidCapabilityPattern {
        /// The pattern as configured.
        pattern: String,
        /// The compile error.
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while encoding or decoding values with a compiled plan.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte stream itself is malformed.
    #[error(transparent)]
    Wire(#[from] layer_tl_types::deserialize::Error),
    /// No plan is registered for this identifier.
    #[error("unknown identifier {0:#010x}")]
    UnknownIdentifier(u32),
    /// A required field has no value.
    #[error("`{declaration}` is missing field `{field}`")]
    MissingField {
        /// Full declaration name.
        declaration: String,
        /// Field name.
        field: String,
    },
    /// A value does not fit the field's declared type.
    #[error("field `{field}` expects a value of type `{expected}`")]
    TypeMismatch {
        /// Field name, or a description of the position.
        field: String,
        /// The declared type.
        expected: String,
    },
    /// A constructor appeared where a different result type is declared.
    #[error("field `{field}` expects a `{expected}`, found `{found}`")]
    WrongType {
        /// Field name, or a description of the position.
        field: String,
        /// The declared result type.
        expected: String,
        /// The constructor that was given or read.
        found: String,
    },
    /// A `bytes`/`string` value too long for the 24-bit length header.
    #[error("field `{field}` holds {len} bytes, more than a length header can describe")]
    PayloadTooLong {
        /// Field name.
        field: String,
        /// Payload length in bytes.
        len: usize,
    },
    /// A bare type that no plan declares.
    #[error("unknown bare type `{0}`")]
    UnknownType(String),
    /// A type variable position received a value that does not carry its own
    /// identifier.
    #[error("value for type variable `{0}` must be self-describing")]
    UnresolvedTypeVariable(String),
}

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::TypeGrammarError;
use crate::tl::{Category, Flag, QualifiedName};

/// Built-in scalar and blob kinds with a fixed wire meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// `int`: 4-byte little-endian signed integer.
    Int,
    /// `long`: 8-byte little-endian signed integer.
    Long,
    /// `double`: 8-byte IEEE-754.
    Double,
    /// `Bool`: one of two reserved constructor identifiers.
    Bool,
    /// `true`: zero bytes, only meaningful behind a flag.
    True,
    /// `bytes`: length-prefixed and padded blob.
    Bytes,
    /// `int128`: raw 16 bytes.
    Int128,
    /// `int256`: raw 32 bytes.
    Int256,
    /// `string`: UTF-8 encoded like `bytes`.
    String,
    /// `Object`: any boxed object, resolved at runtime by its identifier.
    Object,
    /// `JSONValue`: the TL JSON tagged union.
    Json,
    /// `#`: a 32-bit flags word.
    Flags,
}

impl Primitive {
    /// Matches `raw` against the primitive keywords, ignoring ASCII case.
    pub fn from_keyword(raw: &str) -> Option<Self> {
        Some(match raw.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "long" => Self::Long,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "true" => Self::True,
            "bytes" => Self::Bytes,
            "int128" => Self::Int128,
            "int256" => Self::Int256,
            "string" => Self::String,
            "object" => Self::Object,
            "jsonvalue" => Self::Json,
            "#" => Self::Flags,
            _ => return None,
        })
    }

    /// The canonical schema spelling.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Bool => "Bool",
            Self::True => "true",
            Self::Bytes => "bytes",
            Self::Int128 => "int128",
            Self::Int256 => "int256",
            Self::String => "string",
            Self::Object => "Object",
            Self::Json => "JSONValue",
            Self::Flags => "#",
        }
    }

    /// Wire width for fixed-size primitives, `None` for variable-width ones.
    pub fn fixed_size(self) -> Option<u32> {
        match self {
            Self::Int | Self::Bool | Self::Flags => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::Int128 => Some(16),
            Self::Int256 => Some(32),
            Self::True => Some(0),
            Self::Bytes | Self::String | Self::Object | Self::Json => None,
        }
    }
}

/// A parsed TL type expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// A built-in keyword.
    Primitive(Primitive),
    /// `Vector<T>` (boxed, preceded by the vector identifier) or `vector<T>` (bare).
    Vector {
        /// Element type.
        inner: Box<TypeExpr>,
        /// `true` when the vector header identifier is written.
        boxed: bool,
    },
    /// `word.N?T`: present iff bit `N` of `word` is set.
    Flag {
        /// The governing flags word and bit.
        flag: Flag,
        /// The type written when present.
        inner: Box<TypeExpr>,
    },
    /// `!X` or `X`: a method type variable.
    Var(String),
    /// A user-declared type.
    Named {
        /// Namespace-qualified name.
        name: QualifiedName,
        /// `true` for lowercase or `%`-prefixed names: no leading identifier on the wire.
        bare: bool,
    },
}

impl TypeExpr {
    /// The type with any flag wrapper removed.
    pub fn erased(&self) -> &TypeExpr {
        match self {
            Self::Flag { inner, .. } => inner,
            other => other,
        }
    }

    /// The governing flag, if this type is flag-gated.
    pub fn flag(&self) -> Option<&Flag> {
        match self {
            Self::Flag { flag, .. } => Some(flag),
            _ => None,
        }
    }

    /// `true` for the `#` flags word.
    pub fn is_flags_word(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Flags))
    }

    /// `true` for `true` with or without a flag wrapper.
    pub fn is_true_literal(&self) -> bool {
        matches!(self.erased(), Self::Primitive(Primitive::True))
    }

    /// Visits every named type referenced by this expression.
    pub fn visit_named<'a>(&'a self, out: &mut impl FnMut(&'a QualifiedName)) {
        match self {
            Self::Named { name, .. } => out(name),
            Self::Vector { inner, .. } | Self::Flag { inner, .. } => inner.visit_named(out),
            Self::Primitive(_) | Self::Var(_) => {}
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.keyword()),
            Self::Vector { inner, boxed } => {
                let head = if *boxed { "Vector" } else { "vector" };
                write!(f, "{head}<{inner}>")
            }
            Self::Flag { flag, inner } => write!(f, "{flag}?{inner}"),
            Self::Var(name) => write!(f, "!{name}"),
            Self::Named { name, bare } => {
                if *bare && !name.is_bare() {
                    f.write_str("%")?;
                }
                write!(f, "{name}")
            }
        }
    }
}

impl FromStr for TypeExpr {
    type Err = TypeGrammarError;

    /// Parses a type outside any method context; type variables are rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_type(raw)
    }
}

/// Parses a type expression that may not contain type variables.
pub fn parse_type(raw: &str) -> Result<TypeExpr, TypeGrammarError> {
    parse_type_in(raw, Category::Constructor)
}

/// Parses a type expression appearing in a declaration of `category`.
///
/// Variables are only accepted for [`Category::Method`]: `!X` with any
/// name, and the unprefixed `X`. See [`parse_type_with`] for methods that
/// declare other variable names.
pub fn parse_type_in(raw: &str, category: Category) -> Result<TypeExpr, TypeGrammarError> {
    parse_type_with(raw, category, &[])
}

/// Like [`parse_type_in`], where `type_params` lists the names declared by
/// the method's `{t:Type}` blocks. An unprefixed name is a variable only
/// inside a method and only when it is `X` or one of `type_params`;
/// anywhere else it is an ordinary named type.
pub fn parse_type_with(
    raw: &str,
    category: Category,
    type_params: &[String],
) -> Result<TypeExpr, TypeGrammarError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TypeGrammarError::Empty);
    }

    if let Some(p) = Primitive::from_keyword(raw) {
        return Ok(TypeExpr::Primitive(p));
    }

    if let Some((word, rest)) = split_flag(raw)? {
        let (bit, inner_raw) = rest
            .split_once('?')
            .ok_or_else(|| TypeGrammarError::InvalidFlag(raw.to_owned()))?;

        let bit: u64 = bit
            .parse()
            .map_err(|_| TypeGrammarError::InvalidFlag(raw.to_owned()))?;
        let bit = u8::try_from(bit)
            .ok()
            .filter(|b| *b < 32)
            .ok_or(TypeGrammarError::FlagBitOutOfRange { bit })?;

        let inner = parse_type_with(inner_raw, category, type_params)?;
        return match inner {
            TypeExpr::Primitive(Primitive::Flags) => {
                Err(TypeGrammarError::FlagGatedFlagsWord(raw.to_owned()))
            }
            TypeExpr::Flag { .. } => Err(TypeGrammarError::NestedFlag(raw.to_owned())),
            inner => Ok(TypeExpr::Flag {
                flag: Flag { word: word.to_owned(), bit },
                inner: Box::new(inner),
            }),
        };
    }

    if let Some(boxed) = vector_head(raw) {
        let inner_raw = raw[7..]
            .strip_suffix('>')
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TypeGrammarError::InvalidVector(raw.to_owned()))?;
        let inner = parse_type_with(inner_raw, category, type_params)?;
        if matches!(inner, TypeExpr::Flag { .. } | TypeExpr::Primitive(Primitive::Flags)) {
            return Err(TypeGrammarError::InvalidVector(raw.to_owned()));
        }
        return Ok(TypeExpr::Vector { inner: Box::new(inner), boxed });
    }

    if let Some(var) = raw.strip_prefix('!') {
        return match category {
            Category::Method if is_identifier(var) => Ok(TypeExpr::Var(var.to_owned())),
            Category::Method => Err(TypeGrammarError::InvalidName(raw.to_owned())),
            Category::Constructor => Err(TypeGrammarError::TypeVarOutsideMethod(raw.to_owned())),
        };
    }

    if category == Category::Method && (raw == "X" || type_params.iter().any(|p| p == raw)) {
        return Ok(TypeExpr::Var(raw.to_owned()));
    }

    let (name_raw, marked_bare) = match raw.strip_prefix('%') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let name = QualifiedName::parse(name_raw)?;
    let bare = marked_bare || name.is_bare();
    Ok(TypeExpr::Named { name, bare })
}

/// Splits `word.N?...` into `(word, "N?...")` when `raw` is a flag expression.
///
/// Names such as `storage.FileType` also contain a dot, so the split only
/// counts when what follows the first dot is a bit index and a `?`.
fn split_flag(raw: &str) -> Result<Option<(&str, &str)>, TypeGrammarError> {
    if !raw.contains('?') {
        return Ok(None);
    }
    let Some((word, rest)) = raw.split_once('.') else {
        return Err(TypeGrammarError::InvalidFlag(raw.to_owned()));
    };
    if !is_identifier(word) || !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(TypeGrammarError::InvalidFlag(raw.to_owned()));
    }
    Ok(Some((word, rest)))
}

/// `Some(boxed)` when `raw` looks like `Vector<` or `vector<`.
fn vector_head(raw: &str) -> Option<bool> {
    if raw.starts_with("Vector<") {
        Some(true)
    } else if raw.starts_with("vector<") {
        Some(false)
    } else {
        None
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(raw: &str) -> TypeExpr {
        TypeExpr::Named { name: QualifiedName::parse(raw).unwrap(), bare: false }
    }

    #[test]
    fn primitives_are_case_insensitive() {
        assert_eq!(parse_type("int").unwrap(), TypeExpr::Primitive(Primitive::Int));
        assert_eq!(parse_type("bool").unwrap(), TypeExpr::Primitive(Primitive::Bool));
        assert_eq!(parse_type("Bool").unwrap(), TypeExpr::Primitive(Primitive::Bool));
        assert_eq!(parse_type("JSONValue").unwrap(), TypeExpr::Primitive(Primitive::Json));
        assert_eq!(parse_type("#").unwrap(), TypeExpr::Primitive(Primitive::Flags));
    }

    #[test]
    fn flag_expression() {
        let ty = parse_type("flags.3?string").unwrap();
        assert_eq!(
            ty,
            TypeExpr::Flag {
                flag: Flag { word: "flags".into(), bit: 3 },
                inner: Box::new(TypeExpr::Primitive(Primitive::String)),
            }
        );
        assert_eq!(ty.erased(), &TypeExpr::Primitive(Primitive::String));
    }

    #[test]
    fn flag_bit_bounds() {
        assert!(parse_type("flags.31?true").is_ok());
        assert_eq!(
            parse_type("flags.32?true"),
            Err(TypeGrammarError::FlagBitOutOfRange { bit: 32 })
        );
    }

    #[test]
    fn flag_rejects_flags_word_and_nesting() {
        assert!(matches!(
            parse_type("flags.0?#"),
            Err(TypeGrammarError::FlagGatedFlagsWord(_))
        ));
        assert!(matches!(
            parse_type("flags.0?flags2.1?int"),
            Err(TypeGrammarError::NestedFlag(_))
        ));
    }

    #[test]
    fn namespaced_name_is_not_a_flag() {
        assert_eq!(parse_type("storage.FileType").unwrap(), named("storage.FileType"));
    }

    #[test]
    fn vectors() {
        assert_eq!(
            parse_type("Vector<long>").unwrap(),
            TypeExpr::Vector {
                inner: Box::new(TypeExpr::Primitive(Primitive::Long)),
                boxed: true,
            }
        );
        let bare = parse_type("vector<%Message>").unwrap();
        let TypeExpr::Vector { inner, boxed: false } = bare else {
            panic!("expected bare vector");
        };
        assert_eq!(
            *inner,
            TypeExpr::Named { name: QualifiedName::parse("Message").unwrap(), bare: true }
        );
        assert!(parse_type("Vector<>").is_err());
    }

    #[test]
    fn type_variables_only_in_methods() {
        assert_eq!(parse_type_in("!X", Category::Method).unwrap(), TypeExpr::Var("X".into()));
        assert_eq!(parse_type_in("X", Category::Method).unwrap(), TypeExpr::Var("X".into()));
        assert!(matches!(
            parse_type("!X"),
            Err(TypeGrammarError::TypeVarOutsideMethod(_))
        ));
    }

    #[test]
    fn single_letter_names_outside_variables_are_types() {
        assert_eq!(parse_type("X").unwrap(), named("X"));
        assert_eq!(parse_type("A").unwrap(), named("A"));
        assert_eq!(parse_type_in("A", Category::Method).unwrap(), named("A"));

        let declared = ["T".to_owned()];
        assert_eq!(
            parse_type_with("Vector<T>", Category::Method, &declared).unwrap(),
            TypeExpr::Vector { inner: Box::new(TypeExpr::Var("T".into())), boxed: true }
        );
        assert_eq!(parse_type_with("T", Category::Constructor, &declared).unwrap(), named("T"));
    }

    #[test]
    fn display_round_trips_text() {
        for raw in ["flags.0?Vector<InputUser>", "vector<%Message>", "!X", "upload.File"] {
            assert_eq!(parse_type_in(raw, Category::Method).unwrap().to_string(), raw);
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{LexError, LexErrorKind, ParseError, Position};
use crate::iterator::DeclarationReader;
use crate::lexer::Lexer;
use crate::tl::{Category, Parameter, QualifiedName, TypeExpr};

/// A single TL declaration, either a constructor or a method.
///
/// For example:
/// ```text
/// user#12345 id:long first_name:string = User;
/// ```
/// becomes a `Declaration` with `name = user`, `id = 0x12345`,
/// `params = [id:long, first_name:string]` and `result = User`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// Constructor or method.
    pub category: Category,
    /// The 32-bit identifier written as `#xxxxxxxx`, taken as-is.
    pub id: u32,
    /// Qualified declaration name.
    pub name: QualifiedName,
    /// Parameters in declaration (and wire) order.
    pub params: Vec<Parameter>,
    /// The result type.
    pub result: TypeExpr,
}

impl Declaration {
    /// Returns `namespace.name` joined with dots.
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    /// Parses one declaration read from the given section.
    ///
    /// The trailing `;` is optional.
    pub fn parse_as(raw: &str, category: Category) -> Result<Self, ParseError> {
        let raw = raw.trim().trim_end_matches(';');
        let text = match category {
            Category::Constructor => format!("{raw};"),
            Category::Method => format!("---functions---\n{raw};"),
        };

        let mut reader = DeclarationReader::new(Lexer::new(text.as_bytes()));
        let declaration = reader.next().ok_or_else(|| {
            LexError::new(LexErrorKind::UnexpectedEof, Position::START)
        })??;
        match reader.next() {
            None => Ok(declaration),
            Some(Err(e)) => Err(e),
            Some(Ok(extra)) => Err(LexError::new(
                LexErrorKind::UnexpectedToken {
                    expected: "end of input",
                    found: extra.full_name(),
                },
                Position::START,
            )
            .into()),
        }
    }

    /// Names of the type variables used by this declaration, in first-use order.
    pub fn type_variables(&self) -> Vec<&str> {
        fn collect<'a>(ty: &'a TypeExpr, out: &mut Vec<&'a str>) {
            match ty {
                TypeExpr::Var(name) => {
                    if !out.contains(&name.as_str()) {
                        out.push(name);
                    }
                }
                TypeExpr::Vector { inner, .. } | TypeExpr::Flag { inner, .. } => collect(inner, out),
                TypeExpr::Primitive(_) | TypeExpr::Named { .. } => {}
            }
        }

        let mut out = Vec::new();
        for p in &self.params {
            collect(&p.ty, &mut out);
        }
        collect(&self.result, &mut out);
        out
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.name, self.id)?;
        for var in self.type_variables() {
            write!(f, " {{{var}:Type}}")?;
        }
        for p in &self.params {
            write!(f, " {p}")?;
        }
        write!(f, " = {}", self.result)
    }
}

impl FromStr for Declaration {
    type Err = ParseError;

    /// Parses a constructor. Use [`Declaration::parse_as`] for methods.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse_as(raw, Category::Constructor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tl::{Flag, Primitive};

    #[test]
    fn parse_constructor() {
        let d: Declaration = "user#12345 id:long first_name:flags.0?string = User".parse().unwrap();
        assert_eq!(d.category, Category::Constructor);
        assert_eq!(d.id, 0x12345);
        assert_eq!(d.full_name(), "user");
        assert_eq!(d.params.len(), 2);
        assert_eq!(
            d.params[1].flag(),
            Some(&Flag { word: "flags".into(), bit: 0 })
        );
        assert_eq!(d.result.to_string(), "User");
    }

    #[test]
    fn parse_method_with_type_variable() {
        let d = Declaration::parse_as(
            "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;",
            Category::Method,
        )
        .unwrap();
        assert_eq!(d.category, Category::Method);
        assert_eq!(d.params[1].ty, TypeExpr::Var("X".into()));
        assert_eq!(d.result, TypeExpr::Var("X".into()));
        assert_eq!(d.type_variables(), vec!["X"]);
    }

    #[test]
    fn type_variable_in_constructor_is_rejected() {
        let err = "wrapper#1 value:!X = Wrapper".parse::<Declaration>().unwrap_err();
        assert!(matches!(err, ParseError::Type { parameter: Some(ref p), .. } if p == "value"));
    }

    #[test]
    fn display_reproduces_declaration() {
        let d = Declaration::parse_as(
            "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X",
            Category::Method,
        )
        .unwrap();
        assert_eq!(d.to_string(), "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = !X");
    }

    #[test]
    fn flags_word_parameter() {
        let d: Declaration = "holder#1 flags:# = Holder".parse().unwrap();
        assert_eq!(d.params[0].ty, TypeExpr::Primitive(Primitive::Flags));
    }
}

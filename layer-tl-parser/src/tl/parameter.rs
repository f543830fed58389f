use std::fmt;

use serde::Serialize;

use crate::tl::{Flag, TypeExpr};

/// A single `name:Type` parameter inside a TL declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    /// The parameter name as it appears in the schema.
    pub name: String,
    /// The parsed type, including any flag wrapper.
    pub ty: TypeExpr,
}

impl Parameter {
    /// Field identity across sibling constructors: the name plus the type with
    /// the flag wrapper erased.
    ///
    /// `photo:Photo` and `photo:flags.2?Photo` are the same field.
    pub fn same_field(&self, other: &Parameter) -> bool {
        self.name == other.name && self.ty.erased() == other.ty.erased()
    }

    /// The governing flag, if any.
    pub fn flag(&self) -> Option<&Flag> {
        self.ty.flag()
    }

    /// `true` for a `#` flags word.
    pub fn is_flags_word(&self) -> bool {
        self.ty.is_flags_word()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

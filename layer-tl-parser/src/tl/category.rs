use serde::Serialize;

/// Whether a [`super::Declaration`] is a data constructor or an RPC method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A concrete data constructor (the `---types---` section).
    Constructor,
    /// An RPC method (the `---functions---` section).
    Method,
}

impl Category {
    /// Name of the IDL section that switches to this category.
    pub fn section_name(self) -> &'static str {
        match self {
            Self::Constructor => "types",
            Self::Method => "functions",
        }
    }
}

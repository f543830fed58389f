//! Rust types representing a parsed TL schema.

mod category;
mod definition;
mod flag;
mod name;
mod parameter;
mod ty;

pub use category::Category;
pub use definition::Declaration;
pub use flag::Flag;
pub use name::{to_camel, to_pascal, QualifiedName};
pub use parameter::Parameter;
pub use ty::{parse_type, parse_type_in, parse_type_with, Primitive, TypeExpr};

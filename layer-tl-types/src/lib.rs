//! Wire primitives of the TL binary encoding.
//!
//! Everything a codec built from a compiled schema plan needs at run time:
//!
//! | Module          | Contents                                                       |
//! |-----------------|----------------------------------------------------------------|
//! | [`serialize`]   | [`Serializable`], padded `bytes`/`string`, vector headers      |
//! | [`deserialize`] | [`Deserializable`], [`Cursor`], decode errors                  |
//! | [`ids`]         | Identifiers of the built-in `Bool`, `Vector` and JSON constructors |
//! | [`json`]        | [`JsonValue`], the TL `JSONValue` tagged union                 |
//!
//! ```rust
//! use layer_tl_types::{Deserializable, Serializable};
//!
//! let bytes = "hello".to_owned().to_bytes();
//! assert_eq!(bytes.len(), 8);
//! assert_eq!(String::from_bytes(&bytes).unwrap(), "hello");
//! ```

#![deny(unsafe_code)]

pub mod deserialize;
pub mod ids;
pub mod json;
pub mod serialize;

pub use deserialize::{Cursor, Deserializable};
pub use json::JsonValue;
pub use serialize::Serializable;

/// Bare vector: `vector` (lowercase) as opposed to the boxed `Vector`.
///
/// A count followed by the elements, without the `0x1cb5c415` header.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVec<T>(pub Vec<T>);

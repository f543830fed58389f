//! Front-end for Telegram's [Type Language] (TL) schemas.
//!
//! This crate turns `.tl` IDL text, or the equivalent JSON document, into a
//! [`Schema`] of structured [`Declaration`]s. The IDL is read through a
//! streaming [`lexer::Lexer`], so schema text never has to be held in memory
//! as a whole.
//!
//! # Quick start
//!
//! ```rust
//! use layer_tl_parser::parse_tl_file;
//!
//! let src = "user#12345 id:long name:string = User;";
//! for decl in parse_tl_file(src) {
//!     println!("{}", decl.unwrap());
//! }
//! ```
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Error types for lexing and schema ingestion.
pub mod errors;
mod iterator;
mod json;
pub mod lexer;
mod schema;
pub mod tl;

use std::io::Read;

pub use iterator::DeclarationReader;
pub use json::normalize_id;
pub use schema::{IdFormat, Schema, SchemaConfig};
pub use tl::Declaration;

/// Parses a complete TL schema held in memory, yielding [`Declaration`]s one by one.
///
/// `//` comments are skipped, and the `---functions---` / `---types---`
/// separators switch the [`tl::Category`] of the declarations that follow.
/// The iterator ends after the first error.
pub fn parse_tl_file(contents: &str) -> DeclarationReader<&[u8]> {
    parse_tl_reader(contents.as_bytes())
}

/// Like [`parse_tl_file`], but pulls the text from any byte source.
pub fn parse_tl_reader<R: Read>(reader: R) -> DeclarationReader<R> {
    DeclarationReader::new(lexer::Lexer::new(reader))
}

use std::fmt;

use serde::Serialize;

/// A flag reference inside a parameter type, e.g. `flags.0` in `flags.0?true`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Flag {
    /// The name of the flags word that holds this bit (usually `"flags"`).
    pub word: String,
    /// The bit index, always in `0..=31`.
    pub bit: u8,
}

impl Flag {
    /// The value this bit contributes to its flags word when set.
    pub fn mask(&self) -> u32 {
        1u32 << self.bit
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.word, self.bit)
    }
}

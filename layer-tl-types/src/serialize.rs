//! Writing TL values: [`Serializable`] plus the length and header helpers the
//! plan-driven codec uses for values it only knows at run time.
//!
//! All integers are little-endian. `bytes` and `string` share one framing:
//!
//! | payload      | header                          |
//! |--------------|---------------------------------|
//! | `< 254`      | one length byte                 |
//! | `>= 254`     | `0xfe` then a 24-bit LE length  |
//!
//! and the header plus payload is zero-padded to a multiple of 4.

use crate::ids::{BOOL_FALSE_ID, BOOL_TRUE_ID, VECTOR_ID};

/// Payloads at least this long use the four-byte header.
const LONG_HEADER_THRESHOLD: usize = 254;
const LONG_HEADER_MARKER: u8 = 0xfe;

/// Longest `bytes`/`string` payload the 24-bit length can describe.
pub const MAX_BYTES_LEN: usize = 0xff_ffff;

/// A value with a TL wire encoding.
pub trait Serializable {
    /// Appends the encoding of `self` to `buf`.
    fn serialize(&self, buf: &mut impl Extend<u8>);

    /// The encoding of `self` as a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize(&mut out);
        out
    }
}

// ─── sizes ───────────────────────────────────────────────────────────────────

/// Zero bytes needed to round `len` up to a multiple of 4.
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Encoded size of a `bytes`/`string` payload of `len` bytes, header and
/// padding included.
///
/// ```
/// use layer_tl_types::serialize::bytes_len;
/// assert_eq!(bytes_len(3), 4);
/// assert_eq!(bytes_len(5), 8);
/// assert_eq!(bytes_len(254), 260);
/// ```
pub fn bytes_len(len: usize) -> usize {
    let framed = header_len(len) + len;
    framed + padding(framed)
}

fn header_len(len: usize) -> usize {
    if len < LONG_HEADER_THRESHOLD { 1 } else { 4 }
}

// ─── scalars ─────────────────────────────────────────────────────────────────

/// Written as one of the two reserved `Bool` identifiers, never as 0/1.
impl Serializable for bool {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let id = if *self { BOOL_TRUE_ID } else { BOOL_FALSE_ID };
        id.serialize(buf);
    }
}

macro_rules! little_endian {
    ($($ty:ty),* $(,)?) => {$(
        impl Serializable for $ty {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                buf.extend(self.to_le_bytes());
            }
        }
    )*};
}

little_endian!(i32, u32, i64, f64);

/// `int128` and `int256`: raw bytes, no length prefix.
impl<const N: usize> Serializable for [u8; N] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        buf.extend(*self);
    }
}

// ─── bytes / string ──────────────────────────────────────────────────────────

/// Payloads longer than [`MAX_BYTES_LEN`] cannot be framed; callers that
/// take untrusted sizes check before writing.
impl Serializable for [u8] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let len = self.len();
        debug_assert!(len <= MAX_BYTES_LEN, "{len} byte payload overflows the length header");
        if header_len(len) == 1 {
            buf.extend([len as u8]);
        } else {
            let [a, b, c, _] = (len as u32).to_le_bytes();
            buf.extend([LONG_HEADER_MARKER, a, b, c]);
        }
        buf.extend(self.iter().copied());
        buf.extend(std::iter::repeat_n(0u8, padding(header_len(len) + len)));
    }
}

impl Serializable for Vec<u8> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_slice().serialize(buf);
    }
}

impl Serializable for str {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_bytes().serialize(buf);
    }
}

impl Serializable for String {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_str().serialize(buf);
    }
}

// ─── vectors ─────────────────────────────────────────────────────────────────

/// Writes the element count of a vector.
pub fn write_len(len: usize, buf: &mut impl Extend<u8>) {
    (len as i32).serialize(buf);
}

/// Writes the boxed vector header: `vector#1cb5c415` plus the element count.
pub fn write_vector_header(len: usize, buf: &mut impl Extend<u8>) {
    VECTOR_ID.serialize(buf);
    write_len(len, buf);
}

/// Boxed `Vector<T>`.
impl<T: Serializable> Serializable for Vec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        write_vector_header(self.len(), buf);
        for item in self {
            item.serialize(buf);
        }
    }
}

/// Bare `vector<T>`.
impl<T: Serializable> Serializable for crate::RawVec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        write_len(self.0.len(), buf);
        for item in &self.0 {
            item.serialize(buf);
        }
    }
}

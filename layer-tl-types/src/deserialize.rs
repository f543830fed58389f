//! Reading TL values: [`Deserializable`] over a borrowed [`Cursor`].

use thiserror::Error;

use crate::ids::{BOOL_FALSE_ID, BOOL_TRUE_ID, VECTOR_ID};
use crate::serialize::padding;

// ─── Error ───────────────────────────────────────────────────────────────────

/// Why a byte stream could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The buffer ended inside a value.
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    /// A leading identifier is not one the reader accepts here.
    #[error("unexpected constructor id: {id:#010x}")]
    UnexpectedConstructor {
        /// The identifier that was read.
        id: u32,
    },
    /// A `bytes`/`string` header starts with a byte no encoder writes.
    #[error("invalid length prefix {0:#04x}")]
    InvalidLengthPrefix(u8),
    /// A `string` payload is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// A vector announced a negative element count.
    #[error("negative vector length {0}")]
    NegativeLength(i32),
}

/// Result of every read in this crate.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Read position over a byte slice. Reads never copy more than they return.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// A cursor at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes and returns the next `n` bytes.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.buf.len());
        let end = end.ok_or(Error::UnexpectedEof)?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Consumes one byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Fills `out` from the buffer.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(self.take(out.len())?);
        Ok(())
    }

    /// The next little-endian `u32`, left unconsumed. Used to dispatch on a
    /// leading identifier before choosing a reader.
    pub fn peek_u32(&self) -> Result<u32> {
        self.buf
            .get(self.pos..self.pos + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(Error::UnexpectedEof)
    }

    /// Consumes `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }
}

/// The cursor argument of [`Deserializable::deserialize`].
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;

// ─── Deserializable ──────────────────────────────────────────────────────────

/// A value that can be read back from its TL wire encoding.
pub trait Deserializable: Sized {
    /// Reads `Self`, advancing `buf` past it.
    fn deserialize(buf: Buffer) -> Result<Self>;

    /// Reads `Self` from the start of `bytes`; trailing bytes are ignored.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Cursor::from_slice(bytes))
    }
}

// ─── scalars ─────────────────────────────────────────────────────────────────

impl Deserializable for bool {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            BOOL_TRUE_ID => Ok(true),
            BOOL_FALSE_ID => Ok(false),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

macro_rules! little_endian {
    ($($ty:ty),* $(,)?) => {$(
        impl Deserializable for $ty {
            fn deserialize(buf: Buffer) -> Result<Self> {
                let mut raw = [0u8; size_of::<$ty>()];
                buf.read_exact(&mut raw)?;
                Ok(<$ty>::from_le_bytes(raw))
            }
        }
    )*};
}

little_endian!(i32, u32, i64, f64);

impl<const N: usize> Deserializable for [u8; N] {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut raw = [0u8; N];
        buf.read_exact(&mut raw)?;
        Ok(raw)
    }
}

// ─── bytes / string ──────────────────────────────────────────────────────────

impl Deserializable for Vec<u8> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let (header, len) = match buf.read_byte()? {
            0xfe => {
                let mut raw = [0u8; 4];
                buf.read_exact(&mut raw[..3])?;
                (4, u32::from_le_bytes(raw) as usize)
            }
            0xff => return Err(Error::InvalidLengthPrefix(0xff)),
            short => (1, short as usize),
        };
        let payload = buf.take(len)?.to_vec();
        buf.skip(padding(header + len))?;
        Ok(payload)
    }
}

impl Deserializable for String {
    fn deserialize(buf: Buffer) -> Result<Self> {
        String::from_utf8(Vec::<u8>::deserialize(buf)?).map_err(|_| Error::InvalidUtf8)
    }
}

// ─── vectors ─────────────────────────────────────────────────────────────────

/// Reads a vector element count, rejecting negative ones.
pub fn read_len(buf: Buffer) -> Result<usize> {
    let len = i32::deserialize(buf)?;
    usize::try_from(len).map_err(|_| Error::NegativeLength(len))
}

/// Reads the boxed vector identifier and fails on anything else.
pub fn read_vector_id(buf: Buffer) -> Result<()> {
    match u32::deserialize(buf)? {
        VECTOR_ID => Ok(()),
        id => Err(Error::UnexpectedConstructor { id }),
    }
}

impl<T: Deserializable> Deserializable for Vec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        read_vector_id(buf)?;
        crate::RawVec::<T>::deserialize(buf).map(|raw| raw.0)
    }
}

impl<T: Deserializable> Deserializable for crate::RawVec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let len = read_len(buf)?;
        let mut items = Vec::with_capacity(len.min(buf.remaining()));
        for _ in 0..len {
            items.push(T::deserialize(buf)?);
        }
        Ok(crate::RawVec(items))
    }
}

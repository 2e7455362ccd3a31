use core::fmt;

use thiserror::Error;

/// Errors produced while decoding a raw trace-event payload.
///
/// Unknown TLV tags and unexpected topology descriptors are *not* errors;
/// they have designed fallback renderings. An error here means the wire
/// data cannot be safely interpreted at all.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload too short")]
    UnexpectedEnd,

    #[error("TLV {tag:#04x} declares {needed} payload byte(s) but only {remaining} remain")]
    TruncatedRecord {
        tag: u8,
        needed: usize,
        remaining: usize,
    },

    #[error("field `{field}` value {value} is outside its label table of {count} entries")]
    LabelOutOfRange {
        field: &'static str,
        value: u64,
        count: usize,
    },

    #[error("event record has no field `{name}`")]
    MissingField { name: &'static str },

    #[error("event record field `{name}` does not have the expected shape")]
    WrongFieldType { name: &'static str },
}

/// A type that can be reconstructed (decoded) from a raw sequence of bytes.
///
/// Implementors of this trait define how to parse their binary representation
/// from an input buffer. The input slice will be advanced by the number of
/// bytes successfully consumed during decoding.
pub trait Decode {
    /// Attempts to decode `Self` from the beginning of the provided byte slice.
    ///
    /// On success, returns the decoded value and advances `data` by the number
    /// of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input is insufficient to decode a
    /// complete value of this type.
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

macro_rules! impl_decode_for_primitive {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
                    let bytes = data.get(..size_of::<Self>()).ok_or(DecodeError::UnexpectedEnd)?;
                    *data = &data[size_of::<Self>()..];
                    Ok(Self::from_le_bytes(bytes.try_into().unwrap()))
                }
            }
        )*
    };
}

impl_decode_for_primitive!(u8, u16, u32, u64, i8, i16, i32, i64);

impl<const N: usize> Decode for [u8; N] {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = data.get(..N).ok_or(DecodeError::UnexpectedEnd)?;
        *data = &data[N..];
        Ok(bytes.try_into().unwrap())
    }
}

/// An IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddr(pub [u8; 6]);

impl Decode for MacAddr {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(<[u8; 6]>::decode(data)?))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

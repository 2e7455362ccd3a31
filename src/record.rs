//! The raw event record handed over by the host tracing tool.
//!
//! The host parses the trace page format itself and delivers each event as
//! a bag of named fields: integers, raw byte blobs, and device-name
//! strings, together with the capture file's byte order. Records are
//! borrowed for the duration of one decode call and never retained.

use std::collections::HashMap;

use crate::decode::{Decode, DecodeError};

/// Byte order declared by the capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Reads a `u16` in this byte order, advancing `data`.
    pub fn u16(self, data: &mut &[u8]) -> Result<u16, DecodeError> {
        let bytes = <[u8; 2]>::decode(data)?;
        Ok(match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Reads a `u32` in this byte order, advancing `data`.
    pub fn u32(self, data: &mut &[u8]) -> Result<u32, DecodeError> {
        let bytes = <[u8; 4]>::decode(data)?;
        Ok(match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// One named field of an event record.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Num(u64),
    Bytes(&'a [u8]),
    Str(&'a str),
}

/// A single captured trace event, keyed by field name.
#[derive(Debug)]
pub struct EventRecord<'a> {
    endian: Endian,
    fields: HashMap<&'a str, FieldValue<'a>>,
}

impl<'a> EventRecord<'a> {
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            fields: HashMap::new(),
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn with_num(mut self, name: &'a str, value: u64) -> Self {
        self.fields.insert(name, FieldValue::Num(value));
        self
    }

    pub fn with_bytes(mut self, name: &'a str, value: &'a [u8]) -> Self {
        self.fields.insert(name, FieldValue::Bytes(value));
        self
    }

    pub fn with_str(mut self, name: &'a str, value: &'a str) -> Self {
        self.fields.insert(name, FieldValue::Str(value));
        self
    }

    fn get(&self, name: &'static str) -> Result<FieldValue<'a>, DecodeError> {
        self.fields
            .get(name)
            .copied()
            .ok_or(DecodeError::MissingField { name })
    }

    /// Returns the named integer field.
    pub fn num(&self, name: &'static str) -> Result<u64, DecodeError> {
        match self.get(name)? {
            FieldValue::Num(value) => Ok(value),
            _ => Err(DecodeError::WrongFieldType { name }),
        }
    }

    /// Returns the named raw byte blob.
    pub fn bytes(&self, name: &'static str) -> Result<&'a [u8], DecodeError> {
        match self.get(name)? {
            FieldValue::Bytes(value) => Ok(value),
            _ => Err(DecodeError::WrongFieldType { name }),
        }
    }

    /// Returns the named string field.
    pub fn text(&self, name: &'static str) -> Result<&'a str, DecodeError> {
        match self.get(name)? {
            FieldValue::Str(value) => Ok(value),
            _ => Err(DecodeError::WrongFieldType { name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Endian, EventRecord};
    use crate::decode::DecodeError;

    #[test]
    fn fields_round_trip() {
        let blob = [1u8, 2, 3];
        let record = EventRecord::new(Endian::Little)
            .with_num("len", 3)
            .with_bytes("hdata", &blob)
            .with_str("dev", "bcm0");

        assert_eq!(record.num("len"), Ok(3));
        assert_eq!(record.bytes("hdata"), Ok(blob.as_slice()));
        assert_eq!(record.text("dev"), Ok("bcm0"));
    }

    #[test]
    fn missing_and_mistyped_fields() {
        let record = EventRecord::new(Endian::Little).with_num("len", 3);

        assert_eq!(
            record.num("addr"),
            Err(DecodeError::MissingField { name: "addr" })
        );
        assert_eq!(
            record.bytes("len"),
            Err(DecodeError::WrongFieldType { name: "len" })
        );
    }

    #[test]
    fn endian_reads() {
        let buf = [0x12u8, 0x34];

        let mut data = buf.as_slice();
        assert_eq!(Endian::Little.u16(&mut data), Ok(0x3412));

        let mut data = buf.as_slice();
        assert_eq!(Endian::Big.u16(&mut data), Ok(0x1234));

        let short = [0u8; 3];
        let mut data = short.as_slice();
        assert_eq!(Endian::Little.u32(&mut data), Err(DecodeError::UnexpectedEnd));
    }
}

//! TLV signal-stream framing.
//!
//! Firmware-signalling data rides inside the BDC bus-control header as a
//! flat sequence of tag/length/value records. [`dump_signals`] walks the
//! sequence, renders a header line per record, and hands each payload to
//! the decoder registered for its tag.

use log::{debug, warn};

use crate::decode::DecodeError;
use crate::seq::TraceSeq;

/// Reserved filler byte. Not a record: the walker skips over it one byte
/// at a time.
pub const TLV_FILLER: u8 = 0xFF;

/// Decodes one TLV payload into rendered detail lines.
///
/// Implementations must read only as many bytes as they need and must not
/// assume any alignment of the payload slice.
pub type PayloadDecodeFn = fn(&mut TraceSeq<'_>, &[u8]) -> Result<(), DecodeError>;

/// One entry of a driver family's TLV table.
pub struct TlvInfo {
    pub tag: u8,
    pub name: &'static str,
    /// Payload length the driver is expected to emit for this tag. The
    /// on-wire length wins for framing; a mismatch is informational.
    pub expected_len: usize,
    pub decode: Option<PayloadDecodeFn>,
}

/// A closed, static table mapping TLV tags to names and payload decoders.
pub struct TlvRegistry {
    entries: &'static [TlvInfo],
}

impl TlvRegistry {
    pub const fn new(entries: &'static [TlvInfo]) -> Self {
        Self { entries }
    }

    /// Looks up `tag`. Unknown tags resolve to `None`; the caller still
    /// renders the record with the "UNKNOWN" sentinel and skips
    /// specialized decoding.
    pub fn lookup(&self, tag: u8) -> Option<&TlvInfo> {
        self.entries.iter().find(|info| info.tag == tag)
    }
}

/// Walks `siglen` bytes of `signals` as a TLV sequence, rendering each
/// record through `registry`.
///
/// A `siglen` of two or less means the outer frame held no signal data;
/// the walk is a no-op.
///
/// # Errors
///
/// Fails with [`DecodeError::TruncatedRecord`] when a record's declared
/// length (or a missing length byte) would run past the buffer, and with
/// [`DecodeError::UnexpectedEnd`] when `siglen` itself exceeds the
/// supplied slice. Payload-level failures are isolated per record: they
/// render a diagnostic line and the walk continues with the next record.
pub fn dump_signals(
    seq: &mut TraceSeq<'_>,
    registry: &TlvRegistry,
    pad: usize,
    signals: &[u8],
    siglen: usize,
) -> Result<(), DecodeError> {
    if siglen <= 2 {
        return Ok(());
    }
    let buf = signals.get(..siglen).ok_or(DecodeError::UnexpectedEnd)?;

    let mut pos = 0;
    while pos < buf.len() {
        let tag = buf[pos];
        if tag == TLV_FILLER {
            pos += 1;
            continue;
        }

        let declared = *buf.get(pos + 1).ok_or(DecodeError::TruncatedRecord {
            tag,
            needed: 1,
            remaining: 0,
        })? as usize;
        let payload =
            buf.get(pos + 2..pos + 2 + declared)
                .ok_or(DecodeError::TruncatedRecord {
                    tag,
                    needed: declared,
                    remaining: buf.len().saturating_sub(pos + 2),
                })?;

        let info = registry.lookup(tag);
        let name = info.map_or("UNKNOWN", |i| i.name);
        let expected = info.map_or(-1, |i| i.expected_len as i64);
        seq.pad_puts(
            pad,
            &format!("  TLV: {name} ({tag}) len {declared} ({expected}):\n"),
        );

        match info {
            None => debug!("unknown TLV tag {tag:#04x} ({declared} byte payload)"),
            Some(info) => {
                if info.expected_len != declared {
                    debug!("TLV {name} carries {declared} bytes, table expects {expected}");
                }
                if let Some(decode) = info.decode {
                    // One bad payload must not take down its siblings.
                    if let Err(err) = decode(seq, payload) {
                        warn!("TLV {name} payload decode failed: {err}");
                        seq.pad_puts(pad, &format!("  decode error: {err}\n"));
                    }
                }
            }
        }

        pos += declared + 2;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dump_signals, TlvInfo, TlvRegistry};
    use crate::decode::{Decode, DecodeError};
    use crate::seq::TraceSeq;

    fn level(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
        let mut data = payload;
        let value = u8::decode(&mut data)?;
        seq.pad_puts(0, &format!("    level {value}\n"));
        Ok(())
    }

    static ENTRIES: [TlvInfo; 2] = [
        TlvInfo {
            tag: 1,
            name: "LEVEL",
            expected_len: 1,
            decode: Some(level),
        },
        TlvInfo {
            tag: 2,
            name: "OPAQUE",
            expected_len: 4,
            decode: None,
        },
    ];

    static TABLE: TlvRegistry = TlvRegistry::new(&ENTRIES);

    fn decode_to_string(signals: &[u8]) -> String {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        dump_signals(&mut seq, &TABLE, 0, signals, signals.len()).unwrap();
        out
    }

    #[test]
    fn one_record_one_header_plus_payload() {
        let out = decode_to_string(&[0x01, 0x01, 0x2A]);
        assert_eq!(out, "   TLV: LEVEL (1) len 1 (1):\n     level 42\n");
    }

    #[test]
    fn short_buffers_are_a_no_op() {
        assert!(decode_to_string(&[]).is_empty());
        assert!(decode_to_string(&[0x01]).is_empty());
        assert!(decode_to_string(&[0x01, 0x01]).is_empty());
    }

    #[test]
    fn filler_bytes_consume_one_byte_each() {
        let out = decode_to_string(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(out.is_empty());
    }

    #[test]
    fn filler_between_records_is_skipped() {
        let out = decode_to_string(&[0x01, 0x01, 0x07, 0xFF, 0x01, 0x01, 0x09]);
        assert!(out.contains("level 7"));
        assert!(out.contains("level 9"));
    }

    #[test]
    fn unknown_tag_renders_sentinel_and_advances() {
        let out = decode_to_string(&[0x63, 0x02, 0xAA, 0xBB, 0x01, 0x01, 0x05]);
        assert!(out.contains("TLV: UNKNOWN (99) len 2 (-1):"));
        assert!(out.contains("level 5"));
    }

    #[test]
    fn concatenation_decodes_like_each_record_alone() {
        let a = [0x01, 0x01, 0x11];
        let b = [0x02, 0x03, 0x01, 0x02, 0x03];
        let mut joined = a.to_vec();
        joined.extend_from_slice(&b);

        assert_eq!(
            decode_to_string(&joined),
            decode_to_string(&a) + &decode_to_string(&b)
        );
    }

    #[test]
    fn declared_length_past_buffer_is_truncation() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let err = dump_signals(&mut seq, &TABLE, 0, &[0x01, 0x08, 0x2A], 3).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedRecord {
                tag: 1,
                needed: 8,
                remaining: 1,
            }
        );
    }

    #[test]
    fn missing_length_byte_is_truncation() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        // Filler, then a tag with nothing after it.
        let err = dump_signals(&mut seq, &TABLE, 0, &[0xFF, 0xFF, 0x01], 3).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedRecord { tag: 1, .. }));
    }

    #[test]
    fn siglen_beyond_slice_is_an_error() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let err = dump_signals(&mut seq, &TABLE, 0, &[0x01, 0x01], 16).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEnd);
    }

    #[test]
    fn short_payload_is_isolated_to_its_record() {
        // LEVEL with an empty payload fails its decoder, then OPAQUE
        // still renders.
        let out = decode_to_string(&[0x01, 0x00, 0x02, 0x04, 0x01, 0x02, 0x03, 0x04]);
        assert!(out.contains("decode error:"));
        assert!(out.contains("TLV: OPAQUE (2) len 4 (4):"));
    }
}

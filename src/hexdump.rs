//! Hex dumps of raw payload regions, 16 bytes per line.

use core::fmt::Write;

use crate::seq::TraceSeq;

/// Dumps `data` with a printable-ASCII column, FullMAC style.
///
/// Each line carries the byte offset, up to 16 hex bytes, and the
/// printable rendering of those bytes. Non-printable bytes show as `.`.
pub fn dump_ascii(seq: &mut TraceSeq<'_>, pad: usize, data: &[u8]) {
    for (n, chunk) in data.chunks(16).enumerate() {
        let mut line = format!("{:04x} ", n * 16);
        for b in chunk {
            let _ = write!(line, " {b:02x}");
        }
        // Align the ASCII column on a short final line.
        for _ in chunk.len()..16 {
            line.push_str("   ");
        }
        line.push_str("  ");
        for &b in chunk {
            line.push(if (32..127).contains(&b) { b as char } else { '.' });
        }
        line.push('\n');
        seq.pad_puts(pad, &line);
    }
}

/// Dumps `data` as offset-prefixed hex bytes with no ASCII column.
pub fn dump_plain(seq: &mut TraceSeq<'_>, pad: usize, data: &[u8]) {
    for (n, chunk) in data.chunks(16).enumerate() {
        let mut line = format!("{:04x} ", n * 16);
        for b in chunk {
            let _ = write!(line, " {b:02x}");
        }
        line.push('\n');
        seq.pad_puts(pad, &line);
    }
}

//! Named bit-range extraction and rendering.
//!
//! Hardware status words in these drivers pack several independent values
//! into one 32-bit integer. A [`FieldSpec`] table names each bit range, and
//! [`render`]/[`render_flags`] walk a table in listed order (not bit order)
//! and emit one pad-aligned line per field.

use crate::decode::DecodeError;
use crate::seq::TraceSeq;

/// How a field's raw value is turned into display text.
///
/// The closed set of conversions these layouts actually use: plain hex, a
/// fixed label table, and a left-shift rendered as a 32-bit hex address.
#[derive(Debug, Clone, Copy)]
pub enum FieldConv {
    /// `{:#8x}` of the raw field value.
    Hex,
    /// Index into a fixed label table.
    ///
    /// A field value at or past the end of the table fails with
    /// [`DecodeError::LabelOutOfRange`]; layout authors must size the
    /// field width against the table.
    Labels(&'static [&'static str]),
    /// `{:08X}` of the field value shifted left by the given amount.
    ShiftHex(u32),
}

/// One named bit range within a status word.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Start bit of the field.
    pub start: u32,
    /// Number of bits in the field.
    pub width: u32,
    /// Short description (i.e. name) of the field.
    pub name: &'static str,
    /// Long description of the field.
    pub desc: &'static str,
    /// Display conversion for the field value.
    pub conv: FieldConv,
}

impl FieldSpec {
    pub const fn new(start: u32, width: u32, name: &'static str, desc: &'static str) -> Self {
        Self {
            start,
            width,
            name,
            desc,
            conv: FieldConv::Hex,
        }
    }

    pub const fn labeled(
        start: u32,
        width: u32,
        name: &'static str,
        desc: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            start,
            width,
            name,
            desc,
            conv: FieldConv::Labels(labels),
        }
    }

    pub const fn shifted(
        start: u32,
        width: u32,
        name: &'static str,
        desc: &'static str,
        shift: u32,
    ) -> Self {
        Self {
            start,
            width,
            name,
            desc,
            conv: FieldConv::ShiftHex(shift),
        }
    }

    /// Extracts this field's raw value from `value`.
    pub fn extract(&self, value: u64) -> u64 {
        (value >> self.start) & ((1u64 << self.width) - 1)
    }

    fn display(&self, field: u64) -> Result<String, DecodeError> {
        Ok(match self.conv {
            FieldConv::Hex => format!("{field:>#8x}"),
            FieldConv::Labels(labels) => {
                let label =
                    labels
                        .get(field as usize)
                        .ok_or(DecodeError::LabelOutOfRange {
                            field: self.name,
                            value: field,
                            count: labels.len(),
                        })?;
                format!("{label:>8}")
            }
            FieldConv::ShiftHex(shift) => format!("{:08X}", field << shift),
        })
    }
}

/// Renders every field of `layout`, one line each.
pub fn render(
    seq: &mut TraceSeq<'_>,
    pad: usize,
    value: u64,
    layout: &[FieldSpec],
) -> Result<(), DecodeError> {
    for spec in layout {
        let field = spec.extract(value);
        let shown = spec.display(field)?;
        seq.pad_puts(pad, &format!("{:<15} {} ({})\n", spec.name, shown, spec.desc));
    }
    Ok(())
}

/// Renders `layout` in the sparse flag convention.
///
/// Single-bit fields are presence markers: they print (name and
/// description only) when the bit is set and are skipped otherwise.
/// Wider fields always print with their value.
pub fn render_flags(
    seq: &mut TraceSeq<'_>,
    pad: usize,
    value: u64,
    layout: &[FieldSpec],
) -> Result<(), DecodeError> {
    for spec in layout {
        let field = spec.extract(value);
        if spec.width == 1 {
            if field != 0 {
                seq.pad_puts(pad, &format!("{:<25} ({})\n", spec.name, spec.desc));
            }
        } else {
            let shown = spec.display(field)?;
            seq.pad_puts(pad, &format!("{:<25} {} ({})\n", spec.name, shown, spec.desc));
        }
    }
    Ok(())
}

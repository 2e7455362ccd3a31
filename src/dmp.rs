//! DMP descriptor-chain decoding.
//!
//! The chip's enumeration ROM describes its backplane topology as a linear
//! chain of 32-bit descriptors: component entries (two consecutive words),
//! master ports, and slave address regions (optionally followed by an
//! extended size word). The chain has no record-length field, so words can
//! only be grouped by walking them through a small state machine.

use log::trace;

use crate::bitfield::{self, FieldSpec};
use crate::decode::DecodeError;
use crate::seq::{TraceSeq, FULLMAC_PAD};

/// Descriptor type values, taken from the low nibble of each word.
pub mod desc {
    pub const EMPTY: u32 = 0;
    pub const COMP: u32 = 1;
    pub const MPORT: u32 = 3;
    /// Address-family descriptors are tagged in the low three bits only;
    /// bit 3 carries over-32-bit information.
    pub const ADDR: u32 = 5;
    pub const EOT: u32 = 15;
}

const COMP_HEAD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(20, 12, "mfg", "designer"),
    FieldSpec::new(8, 12, "id", "part number"),
    FieldSpec::new(4, 4, "class", "core class"),
];

const COMP_TAIL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(24, 8, "rev", "core revision"),
    FieldSpec::new(19, 5, "nsw", "slave wrappers"),
    FieldSpec::new(14, 5, "nmw", "master wrappers"),
    FieldSpec::new(9, 5, "nsp", "slave ports"),
    FieldSpec::new(4, 5, "nmp", "master ports"),
];

const MPORT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(8, 8, "uid", "unique master id"),
    FieldSpec::new(4, 4, "port", "master port number"),
];

const SLAVE_TYPES: &[&str] = &["SLAVE", "BRIDGE", "SLVWRAP", "MSTWRAP"];
const REGION_SIZES: &[&str] = &["4K", "8K", "16K", "CUSTOM"];

const ADDR_FIELDS: &[FieldSpec] = &[
    FieldSpec::shifted(12, 20, "addr", "base address", 12),
    FieldSpec::new(8, 4, "port", "slave port number"),
    FieldSpec::labeled(6, 2, "type", "slave type", SLAVE_TYPES),
    FieldSpec::labeled(4, 2, "size", "address region size", REGION_SIZES),
    FieldSpec::new(3, 1, "gt32", "address over 32 bit"),
];

const SIZE_FIELDS: &[FieldSpec] = &[
    FieldSpec::shifted(12, 20, "size", "address region size", 12),
    FieldSpec::new(3, 1, "gt32", "size over 32 bit"),
];

/// Decoder position within the descriptor grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DmpState {
    /// Between records.
    #[default]
    Idle,
    /// A component head was seen; the next word should be its tail.
    CompTail,
    /// An address region declared a custom size; the next word should be
    /// the extended size.
    SizeWord,
}

/// Stateful walker over one descriptor chain.
///
/// Every chain decode owns its decoder; state is never shared between
/// independent chains.
#[derive(Debug, Default)]
pub struct DmpChainDecoder {
    state: DmpState,
}

impl DmpChainDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DmpState {
        self.state
    }

    /// Feeds one descriptor word, rendering whatever it completes.
    ///
    /// Returns `true` when the word was the end-of-table marker: the
    /// decoder resets to [`DmpState::Idle`] and the caller should stop
    /// feeding words.
    pub fn step(&mut self, seq: &mut TraceSeq<'_>, word: u32) -> Result<bool, DecodeError> {
        let dtype = word & 0xF;
        let mut eot = false;

        let next = match self.state {
            DmpState::Idle => match dtype {
                desc::COMP => {
                    seq.puts(&format!("Component: 0x{word:08X}\n"));
                    bitfield::render(seq, FULLMAC_PAD + 5, word.into(), COMP_HEAD_FIELDS)?;
                    DmpState::CompTail
                }
                desc::MPORT => {
                    seq.puts(&format!("Master:    0x{word:08X}\n"));
                    bitfield::render(seq, FULLMAC_PAD + 5, word.into(), MPORT_FIELDS)?;
                    DmpState::Idle
                }
                t if t & 7 == desc::ADDR => {
                    seq.puts(&format!("Slave:     0x{word:08X}\n"));
                    bitfield::render(seq, FULLMAC_PAD + 5, word.into(), ADDR_FIELDS)?;
                    // A custom region size defers to the next word.
                    if (word >> 4) & 0x3 == 3 {
                        DmpState::SizeWord
                    } else {
                        DmpState::Idle
                    }
                }
                desc::EOT => {
                    seq.puts("DMP EROM END\n");
                    eot = true;
                    DmpState::Idle
                }
                desc::EMPTY => DmpState::Idle,
                _ => {
                    seq.puts(&format!("unexpected desc: {dtype} data 0x{word:08X}\n"));
                    DmpState::Idle
                }
            },
            DmpState::CompTail => match dtype {
                desc::COMP => {
                    seq.puts(&format!("Component: 0x{word:08X}\n"));
                    bitfield::render(seq, FULLMAC_PAD + 5, word.into(), COMP_TAIL_FIELDS)?;
                    DmpState::Idle
                }
                desc::EOT => {
                    seq.puts("DMP EROM END\n");
                    eot = true;
                    DmpState::Idle
                }
                desc::EMPTY => DmpState::CompTail,
                _ => {
                    seq.puts(&format!("unexpected desc: {dtype} data 0x{word:08X}\n"));
                    DmpState::CompTail
                }
            },
            DmpState::SizeWord => match dtype {
                // Size words are tagged in the low three bits; bit 3 is
                // the over-32-bit marker, so EMPTY never reaches here.
                t if t & 7 == 0 => {
                    seq.puts(&format!("Size:      0x{word:08X}\n"));
                    bitfield::render(seq, FULLMAC_PAD + 5, word.into(), SIZE_FIELDS)?;
                    DmpState::Idle
                }
                desc::EOT => {
                    seq.puts("DMP EROM END\n");
                    eot = true;
                    DmpState::Idle
                }
                _ => {
                    seq.puts(&format!("unexpected desc: {dtype} data 0x{word:08X}\n"));
                    DmpState::SizeWord
                }
            },
        };

        trace!("dmp desc type {dtype}: {:?} -> {next:?}", self.state);
        self.state = next;
        Ok(eot)
    }
}

/// Decodes a whole chain with a fresh decoder, stopping after the
/// end-of-table marker.
pub fn decode_chain(seq: &mut TraceSeq<'_>, words: &[u32]) -> Result<(), DecodeError> {
    let mut decoder = DmpChainDecoder::new();
    for &word in words {
        if decoder.step(seq, word)? {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{decode_chain, desc, DmpChainDecoder, DmpState};
    use crate::seq::TraceSeq;

    // mfg 0x4BF, part 0x812, class 0.
    const COMP_HEAD: u32 = (0x4BF << 20) | (0x812 << 8) | desc::COMP;
    // rev 4, nsw 0, nmw 1, nsp 1, nmp 1.
    const COMP_TAIL: u32 = (4 << 24) | (1 << 14) | (1 << 9) | (1 << 4) | desc::COMP;
    const EOT_WORD: u32 = 0x0000_000F;

    fn addr_word(size: u32) -> u32 {
        // base 0x18005xxx, port 0, type SLAVE.
        (0x18005 << 12) | (size << 4) | desc::ADDR
    }

    #[test]
    fn component_needs_two_words() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let mut dec = DmpChainDecoder::new();

        assert!(!dec.step(&mut seq, COMP_HEAD).unwrap());
        assert_eq!(dec.state(), DmpState::CompTail);
        assert!(!dec.step(&mut seq, COMP_TAIL).unwrap());
        assert_eq!(dec.state(), DmpState::Idle);
        assert!(dec.step(&mut seq, EOT_WORD).unwrap());
        assert_eq!(dec.state(), DmpState::Idle);

        assert_eq!(out.matches("Component:").count(), 2);
        assert_eq!(out.matches("DMP EROM END").count(), 1);
        assert!(out.contains("mfg"));
        assert!(out.contains("rev"));
    }

    #[test]
    fn custom_region_size_defers_to_next_word() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let mut dec = DmpChainDecoder::new();

        dec.step(&mut seq, addr_word(3)).unwrap();
        assert_eq!(dec.state(), DmpState::SizeWord);
        // Size word: 64K region, low nibble zero.
        dec.step(&mut seq, 0x10 << 12).unwrap();
        assert_eq!(dec.state(), DmpState::Idle);

        assert!(out.contains("Slave:"));
        assert!(out.contains("CUSTOM"));
        assert!(out.contains("Size:"));
        assert!(out.contains("00010000"));
    }

    #[test]
    fn fixed_region_size_stays_idle() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let mut dec = DmpChainDecoder::new();

        dec.step(&mut seq, addr_word(1)).unwrap();
        assert_eq!(dec.state(), DmpState::Idle);
        assert!(out.contains("8K"));
    }

    #[test]
    fn master_port_is_single_word() {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        let mut dec = DmpChainDecoder::new();

        let word = (0x2 << 8) | (0x1 << 4) | desc::MPORT;
        dec.step(&mut seq, word).unwrap();
        assert_eq!(dec.state(), DmpState::Idle);
        assert!(out.contains("Master:"));
        assert!(out.contains("uid"));
    }

    #[test]
    fn stray_descriptor_keeps_tail_state() {
        let mut out = String::new();
        let mut dec = DmpChainDecoder::new();

        dec.step(&mut TraceSeq::new(&mut out), COMP_HEAD).unwrap();
        // Master ports are not valid between a head and its tail.
        dec.step(&mut TraceSeq::new(&mut out), desc::MPORT).unwrap();
        assert_eq!(dec.state(), DmpState::CompTail);
        assert!(out.contains("unexpected desc: 3"));

        dec.step(&mut TraceSeq::new(&mut out), COMP_TAIL).unwrap();
        assert_eq!(dec.state(), DmpState::Idle);
    }

    #[test]
    fn empty_words_are_no_ops() {
        let mut out = String::new();
        let mut dec = DmpChainDecoder::new();

        dec.step(&mut TraceSeq::new(&mut out), COMP_HEAD).unwrap();
        let before = out.len();
        dec.step(&mut TraceSeq::new(&mut out), 0).unwrap();
        assert_eq!(dec.state(), DmpState::CompTail);
        assert_eq!(out.len(), before);
    }

    #[test]
    fn eot_ends_chain_in_any_state() {
        for lead_in in [None, Some(COMP_HEAD), Some(addr_word(3))] {
            let mut out = String::new();
            let mut seq = TraceSeq::new(&mut out);
            let mut dec = DmpChainDecoder::new();

            if let Some(word) = lead_in {
                dec.step(&mut seq, word).unwrap();
            }
            assert!(dec.step(&mut seq, EOT_WORD).unwrap());
            assert_eq!(dec.state(), DmpState::Idle);
            assert!(out.contains("DMP EROM END"));
        }
    }

    #[test]
    fn independent_chains_share_nothing() {
        // An interrupted chain must not bleed state into a fresh decode.
        let mut interrupted = String::new();
        let mut seq = TraceSeq::new(&mut interrupted);
        let mut dec = DmpChainDecoder::new();
        dec.step(&mut seq, COMP_HEAD).unwrap();
        drop(dec);

        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        decode_chain(&mut seq, &[COMP_HEAD, COMP_TAIL, EOT_WORD]).unwrap();
        assert_eq!(out.matches("Component:").count(), 2);
        assert!(!out.contains("unexpected"));
    }
}

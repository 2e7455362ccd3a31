//! FullMAC (`brcmfmac`) trace-event renderers.
//!
//! Four events: raw buffer hexdumps, BDC bus-control headers carrying the
//! firmware-signalling TLV stream, SDPCM bus headers, and the descriptor
//! words of the chip's enumeration ROM.

use bitflags::bitflags;

use crate::decode::DecodeError;
use crate::dmp::DmpChainDecoder;
use crate::fwsignal::FWSIGNAL;
use crate::hexdump;
use crate::record::EventRecord;
use crate::registry::{EventHandler, EventHandlerRegistry};
use crate::seq::{TraceSeq, FULLMAC_PAD};
use crate::tlv;

const PAD: usize = FULLMAC_PAD;

bitflags! {
    /// Flag bits of the BDC bus-control header. The upper nibble of the
    /// flags byte carries the protocol version instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BdcFlags: u8 {
        const IS_80211 = 0x01;
        const SUM_GOOD = 0x04;
        const SUM_NEEDED = 0x08;
    }
}

/// `brcmf_hexdump`: a driver-chosen buffer dumped verbatim.
pub struct Hexdump;

impl EventHandler for Hexdump {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let addr = record.num("addr")?;
        let len = record.num("len")? as usize;
        let data = record.bytes("hdata")?;
        let data = data.get(..len).ok_or(DecodeError::UnexpectedEnd)?;

        seq.puts(&format!("address: 0x{addr:X} length: {len} (0x{len:X})\n"));
        hexdump::dump_ascii(seq, PAD, data);
        Ok(())
    }
}

/// `brcmf_bdchdr`: BDC header plus the embedded signal stream.
pub struct BdcHeader;

impl EventHandler for BdcHeader {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let flags = record.num("flags")?;
        let prio = record.num("prio")?;
        let flags2 = record.num("flags2")?;
        seq.puts(&format!("BDC({flags:x}:{prio}:{flags2:x}):\n"));

        let known = BdcFlags::from_bits_truncate(flags as u8);
        if !known.is_empty() {
            let names: Vec<&str> = known.iter_names().map(|(name, _)| name).collect();
            seq.pad_puts(PAD, &format!("  flags: {}\n", names.join("|")));
        }

        let siglen = record.num("siglen")? as usize;
        let signal = record.bytes("signal")?;
        tlv::dump_signals(seq, &FWSIGNAL, PAD, signal, siglen)
    }
}

const DIRECTIONS: &[&str] = &["RX", "TX", "TXG"];
const SDPCM_CHANNELS: &[&str] = &["CONTROL", "EVENT", "DATA", "GLOM"];

/// `brcmf_sdpcm_hdr`: SDPCM bus header, with the hardware extension
/// header in the glomming (TXG) direction.
pub struct SdpcmHeader;

impl EventHandler for SdpcmHeader {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let dir = record.num("dir")?;
        let len = record.num("len")?;
        let hdr = record.bytes("hdr")?;

        // Glommed tx frames carry an 8-byte hardware extension between
        // the frame tag and the software header.
        let (header_len, sw) = if dir == 2 { (20, 12) } else { (12, 4) };
        let hdr = hdr.get(..header_len).ok_or(DecodeError::UnexpectedEnd)?;

        let direction = DIRECTIONS.get(dir as usize).copied().unwrap_or("INV");
        let seqno = hdr[sw];
        seq.puts(&format!(
            "{direction} length {len} (0x{len:X}), seq {seqno} (0x{seqno:X}):\n"
        ));

        let channum = hdr[sw + 1] & 0xF;
        let flags = (hdr[sw + 1] & 0xF0) >> 4;
        let channel = SDPCM_CHANNELS
            .get(channum as usize)
            .copied()
            .unwrap_or("INVALID");

        if dir == 2 {
            let glomlen = u16::from_le_bytes([hdr[4], hdr[5]]);
            let tailpad = u16::from_le_bytes([hdr[10], hdr[11]]);
            seq.pad_puts(PAD, "hw ext. header:\n");
            seq.pad_puts(PAD, &format!(" glomlen: {glomlen}\n"));
            seq.pad_puts(PAD, &format!(" lastfrm: {}\n", hdr[7]));
            seq.pad_puts(PAD, &format!(" tailpad: {tailpad}\n"));
        }

        seq.pad_puts(PAD, "sw header:\n");
        seq.pad_puts(PAD, &format!(" channel: {channel} [{channum}]\n"));
        seq.pad_puts(PAD, &format!(" flags:   {flags}\n"));
        seq.pad_puts(PAD, &format!(" nextlen: {}\n", hdr[sw + 2]));
        seq.pad_puts(PAD, &format!(" doffset: {}\n", hdr[sw + 3]));
        seq.pad_puts(PAD, &format!(" fcmask:  0x{:X}\n", hdr[sw + 4]));
        seq.pad_puts(PAD, &format!(" window:  {}\n", hdr[sw + 5]));
        seq.pad_puts(PAD, &format!(" version: {}\n", hdr[sw + 6]));
        Ok(())
    }
}

/// `brcmf_dmp_desc`: one enumeration-ROM descriptor word per event.
///
/// The chain decoder lives in the handler so word grouping survives
/// across consecutive events of one chain; the end-of-table word resets
/// it for the next chain.
#[derive(Default)]
pub struct DmpDescriptor {
    chain: DmpChainDecoder,
}

impl EventHandler for DmpDescriptor {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let word = record.num("desc")? as u32;
        self.chain.step(seq, word)?;
        Ok(())
    }
}

/// Installs the four FullMAC event handlers.
pub fn register(registry: &mut EventHandlerRegistry) {
    registry.register("brcmfmac", "brcmf_hexdump", Box::new(Hexdump));
    registry.register("brcmfmac", "brcmf_bdchdr", Box::new(BdcHeader));
    registry.register("brcmfmac", "brcmf_sdpcm_hdr", Box::new(SdpcmHeader));
    registry.register("brcmfmac", "brcmf_dmp_desc", Box::new(DmpDescriptor::default()));
}

//! FullMAC firmware-signalling TLV payloads.
//!
//! The `brcmfmac` firmware reports flow-control and packet-lifecycle
//! events as TLV records inside the BDC header (see [`crate::tlv`]). This
//! module holds the driver's tag table and the typed payload decoders.

use crate::bitfield::{self, FieldSpec};
use crate::decode::{Decode, DecodeError, MacAddr};
use crate::seq::{TraceSeq, FULLMAC_PAD};
use crate::tlv::{TlvInfo, TlvRegistry};

/// Firmware-signalling TLV tags.
pub mod tags {
    pub const MAC_OPEN: u8 = 1;
    pub const MAC_CLOSE: u8 = 2;
    pub const MAC_REQUEST_CREDIT: u8 = 3;
    pub const TXSTATUS: u8 = 4;
    pub const PKTTAG: u8 = 5;
    pub const MACDESC_ADD: u8 = 6;
    pub const MACDESC_DEL: u8 = 7;
    pub const RSSI: u8 = 8;
    pub const INTERFACE_OPEN: u8 = 9;
    pub const INTERFACE_CLOSE: u8 = 10;
    pub const FIFO_CREDITBACK: u8 = 11;
    pub const PENDING_TRAFFIC_BMP: u8 = 12;
    pub const MAC_REQUEST_PACKET: u8 = 13;
    pub const HOST_REORDER_RXPKTS: u8 = 14;
    pub const TRANS_ID: u8 = 18;
    pub const COMP_TXSTATUS: u8 = 19;
}

const PAD: usize = FULLMAC_PAD;

/// The FullMAC firmware-signalling TLV table.
pub static FWSIGNAL: TlvRegistry = TlvRegistry::new(&FWSIGNAL_ENTRIES);

static FWSIGNAL_ENTRIES: [TlvInfo; 16] = [
    TlvInfo {
        tag: tags::MAC_OPEN,
        name: "MAC_OPEN",
        expected_len: 1,
        decode: Some(mac_state),
    },
    TlvInfo {
        tag: tags::MAC_CLOSE,
        name: "MAC_CLOSE",
        expected_len: 1,
        decode: Some(mac_state),
    },
    TlvInfo {
        tag: tags::MAC_REQUEST_CREDIT,
        name: "MAC_REQUEST_CREDIT",
        expected_len: 2,
        decode: Some(request),
    },
    TlvInfo {
        tag: tags::TXSTATUS,
        name: "TXSTATUS",
        expected_len: 4,
        decode: Some(tx_status),
    },
    TlvInfo {
        tag: tags::PKTTAG,
        name: "PKTTAG",
        expected_len: 4,
        decode: Some(pkt_tag),
    },
    TlvInfo {
        tag: tags::MACDESC_ADD,
        name: "MACDESC_ADD",
        expected_len: 8,
        decode: Some(mac_descriptor),
    },
    TlvInfo {
        tag: tags::MACDESC_DEL,
        name: "MACDESC_DEL",
        expected_len: 8,
        decode: Some(mac_descriptor),
    },
    TlvInfo {
        tag: tags::RSSI,
        name: "RSSI",
        expected_len: 1,
        decode: None,
    },
    TlvInfo {
        tag: tags::INTERFACE_OPEN,
        name: "INTERFACE_OPEN",
        expected_len: 1,
        decode: Some(interface),
    },
    TlvInfo {
        tag: tags::INTERFACE_CLOSE,
        name: "INTERFACE_CLOSE",
        expected_len: 1,
        decode: Some(interface),
    },
    TlvInfo {
        tag: tags::FIFO_CREDITBACK,
        name: "FIFO_CREDITBACK",
        expected_len: 6,
        decode: Some(fifo_credit),
    },
    TlvInfo {
        tag: tags::PENDING_TRAFFIC_BMP,
        name: "PENDING_TRAFFIC_BMP",
        expected_len: 2,
        decode: Some(pending_traffic),
    },
    TlvInfo {
        tag: tags::MAC_REQUEST_PACKET,
        name: "MAC_REQUEST_PACKET",
        expected_len: 3,
        decode: Some(request),
    },
    TlvInfo {
        tag: tags::HOST_REORDER_RXPKTS,
        name: "HOST_REORDER_RXPKTS",
        expected_len: 10,
        decode: Some(reorder),
    },
    TlvInfo {
        tag: tags::TRANS_ID,
        name: "TRANS_ID",
        expected_len: 6,
        decode: None,
    },
    TlvInfo {
        tag: tags::COMP_TXSTATUS,
        name: "COMP_TXSTATUS",
        expected_len: 1,
        decode: None,
    },
];

const TXS_LABELS: &[&str] = &["discard", "d11-suppr", "fw-suppr", "tossed"];

const TXS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(31, 1, "generation", "life-cycle info"),
    FieldSpec::labeled(27, 4, "flags", "status value", TXS_LABELS),
    FieldSpec::new(24, 3, "fifo", "fifo number"),
    FieldSpec::new(8, 16, "hslot", "hanger slot index"),
    FieldSpec::new(0, 24, "pktid", "packet tag"),
];

const TAG_LABELS: &[&str] = &["N/A", "host", "N/A", "fw-req"];

const TAG_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(31, 1, "generation", "life-cycle info"),
    FieldSpec::labeled(27, 4, "flags", "status value", TAG_LABELS),
    FieldSpec::new(24, 3, "fifo", "fifo number"),
    FieldSpec::new(8, 16, "hslot", "hanger slot index"),
    FieldSpec::new(0, 8, "freerun", "sequence counter"),
];

const TIM_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(0, 1, "BK", "background"),
    FieldSpec::new(1, 1, "BE", "best-effort"),
    FieldSpec::new(2, 1, "VI", "video"),
    FieldSpec::new(3, 1, "VO", "voice"),
];

const REORDER_FLAGS: &[FieldSpec] = &[
    FieldSpec::new(0, 1, "delete", "delete flow"),
    FieldSpec::new(1, 1, "flush", "flush all"),
    FieldSpec::new(2, 1, "curvld", "curidx valid"),
    FieldSpec::new(3, 1, "expvld", "expidx valid"),
    FieldSpec::new(4, 1, "hole", "new hole"),
];

fn handle_line(seq: &mut TraceSeq<'_>, handle: u8) {
    // The low five bits index the firmware's MAC descriptor table.
    seq.pad_puts(PAD, &format!("    handle {handle} (idx {})\n", handle & 0x1F));
}

fn mac_state(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let handle = u8::decode(&mut data)?;
    handle_line(seq, handle);
    Ok(())
}

/// Credit or packet request from the firmware for one MAC descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestData {
    pub count: u8,
    pub handle: u8,
    pub bitmap: u8,
}

impl Decode for RequestData {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let count = u8::decode(data)?;
        let handle = u8::decode(data)?;
        let bitmap = u8::decode(data)?;

        Ok(Self {
            count,
            handle,
            bitmap,
        })
    }
}

fn request(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let req = RequestData::decode(&mut data)?;
    handle_line(seq, req.handle);
    seq.pad_puts(PAD, &format!("    count {} bmp {:x}\n", req.count, req.bitmap));
    Ok(())
}

fn tx_status(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let status = u32::decode(&mut data)?;
    bitfield::render(seq, PAD + 5, status.into(), TXS_FIELDS)
}

fn pkt_tag(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let tag = u32::decode(&mut data)?;
    bitfield::render(seq, PAD + 5, tag.into(), TAG_FIELDS)
}

/// Binding between a MAC descriptor handle and a station address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacDescriptor {
    pub handle: u8,
    pub ifidx: u8,
    pub addr: MacAddr,
}

impl Decode for MacDescriptor {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let handle = u8::decode(data)?;
        let ifidx = u8::decode(data)?;
        let addr = MacAddr::decode(data)?;

        Ok(Self {
            handle,
            ifidx,
            addr,
        })
    }
}

fn mac_descriptor(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let desc = MacDescriptor::decode(&mut data)?;
    handle_line(seq, desc.handle);
    seq.pad_puts(
        PAD,
        &format!("    ifidx  {} mac {}\n", desc.ifidx, desc.addr),
    );
    Ok(())
}

fn interface(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let ifidx = u8::decode(&mut data)?;
    seq.pad_puts(PAD, &format!("    ifidx {ifidx}\n"));
    Ok(())
}

fn fifo_credit(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let [bk, be, vo, vi, bcmc, atim] = <[u8; 6]>::decode(&mut data)?;
    seq.pad_puts(
        PAD,
        &format!("    BK: {bk} BE: {be} VO: {vo} VI: {vi} BC/MC: {bcmc} ATIM: {atim}\n"),
    );
    Ok(())
}

fn pending_traffic(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let handle = u8::decode(&mut data)?;
    let tim = u8::decode(&mut data)?;
    handle_line(seq, handle);
    bitfield::render(seq, PAD + 5, tim.into(), TIM_FIELDS)
}

/// Receive-reorder queue update.
///
/// Values sit at even payload offsets; the odd bytes are unused on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderInfo {
    pub flow_id: u8,
    pub max_idx: u8,
    pub flags: u8,
    pub cur_idx: u8,
    pub exp_idx: u8,
}

impl Decode for ReorderInfo {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let mut slot = || -> Result<u8, DecodeError> {
            let [value, _] = <[u8; 2]>::decode(data)?;
            Ok(value)
        };

        let flow_id = slot()?;
        let max_idx = slot()?;
        let flags = slot()?;
        let cur_idx = slot()?;
        let exp_idx = slot()?;

        Ok(Self {
            flow_id,
            max_idx,
            flags,
            cur_idx,
            exp_idx,
        })
    }
}

fn reorder(seq: &mut TraceSeq<'_>, payload: &[u8]) -> Result<(), DecodeError> {
    let mut data = payload;
    let info = ReorderInfo::decode(&mut data)?;
    seq.pad_puts(
        PAD,
        &format!(
            "    fid {} maxidx {} curidx {} expidx {}\n",
            info.flow_id, info.max_idx, info.cur_idx, info.exp_idx
        ),
    );
    bitfield::render(seq, PAD + 5, info.flags.into(), REORDER_FLAGS)
}

#[cfg(test)]
mod tests {
    use super::FWSIGNAL;
    use crate::seq::TraceSeq;
    use crate::tlv::dump_signals;

    fn decode_to_string(signals: &[u8]) -> String {
        let mut out = String::new();
        let mut seq = TraceSeq::new(&mut out);
        dump_signals(&mut seq, &FWSIGNAL, 0, signals, signals.len()).unwrap();
        out
    }

    #[test]
    fn mixed_stream_frames_every_record() {
        let signals = [
            0x04, 0x04, 0x01, 0x07, 0x00, 0x9C, // TXSTATUS
            0x02, 0x01, 0x21, // MAC_CLOSE
            0x03, 0x03, 0x01, 0x21, 0x1F, // MAC_REQUEST_CREDIT (padded)
            0x1F, 0x01, 0x21, // tag 31: not in the table
        ];
        let out = decode_to_string(&signals);

        assert_eq!(out.matches("TLV:").count(), 4);
        assert!(out.contains("TLV: TXSTATUS (4) len 4 (4):"));
        assert!(out.contains("TLV: MAC_CLOSE (2) len 1 (1):"));
        assert!(out.contains("TLV: MAC_REQUEST_CREDIT (3) len 3 (2):"));
        assert!(out.contains("TLV: UNKNOWN (31) len 1 (-1):"));
    }

    #[test]
    fn captured_stream_parses_end_to_end() {
        // A 17-byte capture: declared lengths frame the records, so the
        // padded credit request swallows the 0x1F byte and the stream
        // ends on MAC_OPEN.
        let signals = [
            0x04, 0x04, 0x01, 0x07, 0x00, 0x9C, 0x02, 0x01, 0x21, 0x03, 0x03, 0x01, 0x21, 0x1F,
            0x01, 0x01, 0x21,
        ];
        let out = decode_to_string(&signals);

        assert_eq!(out.matches("TLV:").count(), 4);
        assert!(out.contains("TLV: MAC_OPEN (1) len 1 (1):"));
        assert!(out.contains("handle 33 (idx 1)"));
    }

    #[test]
    fn tx_status_labels_decode() {
        // 0x9C000701 little-endian: generation set, flags 3 ("tossed"),
        // fifo 4, hslot 7, pktid 0x701.
        let out = decode_to_string(&[0x04, 0x04, 0x01, 0x07, 0x00, 0x9C]);
        assert!(out.contains("generation"));
        assert!(out.contains("tossed"));
        assert!(out.contains("hslot"));
    }

    #[test]
    fn bad_label_index_does_not_stop_the_stream() {
        // PKTTAG flag field decodes to 4, one past its label table, then
        // PENDING_TRAFFIC_BMP must still render.
        let signals = [
            0x05, 0x04, 0x01, 0x00, 0x02, 0xA7, // PKTTAG
            0x0C, 0x02, 0x41, 0x09, // PENDING_TRAFFIC_BMP
        ];
        let out = decode_to_string(&signals);

        assert!(out.contains("TLV: PKTTAG (5) len 4 (4):"));
        assert!(out.contains("decode error:"));
        assert!(out.contains("TLV: PENDING_TRAFFIC_BMP (12) len 2 (2):"));
        assert!(out.contains("handle 65 (idx 1)"));
    }

    #[test]
    fn credit_and_mac_descriptors_with_filler() {
        let signals = [
            0x0B, 0x06, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, // FIFO_CREDITBACK
            0x06, 0x08, 0x41, 0x01, 0x00, 0x90, 0x4C, 0x12, 0x02, 0x7E, // MACDESC_ADD
            0xFF, 0xFF, // filler
            0x07, 0x08, 0x41, 0x01, 0x00, 0x90, 0x4C, 0x12, 0x02, 0x7E, // MACDESC_DEL
        ];
        let out = decode_to_string(&signals);

        assert!(out.contains("BK: 0 BE: 2 VO: 0 VI: 0 BC/MC: 0 ATIM: 0"));
        assert!(out.contains("TLV: MACDESC_ADD (6) len 8 (8):"));
        assert!(out.contains("TLV: MACDESC_DEL (7) len 8 (8):"));
        assert_eq!(out.matches("mac 00:90:4C:12:02:7E").count(), 2);
        assert!(out.contains("ifidx  1"));
    }

    #[test]
    fn reorder_reads_even_offsets() {
        let signals = [
            0x0E, 0x0A, // HOST_REORDER_RXPKTS, 10 bytes
            0x05, 0x00, 0x40, 0x00, 0x0C, 0x00, 0x07, 0x00, 0x08, 0x00,
        ];
        let out = decode_to_string(&signals);

        assert!(out.contains("fid 5 maxidx 64 curidx 7 expidx 8"));
        // flags 0x0C: curidx and expidx valid.
        assert!(out.contains("curvld"));
        assert!(out.contains("expvld"));
    }

    #[test]
    fn request_renders_count_and_bitmap() {
        let out = decode_to_string(&[0x0D, 0x03, 0x02, 0x07, 0x0B]);
        assert!(out.contains("TLV: MAC_REQUEST_PACKET (13) len 3 (3):"));
        assert!(out.contains("handle 7 (idx 7)"));
        assert!(out.contains("count 2 bmp b"));
    }
}

//! SoftMAC (`brcmsmac`) trace-event renderers.
//!
//! Four events across the `brcmsmac` and `brcmsmac_tx` subsystems:
//! MAC interrupt status words, precedence-queue enqueues, d11 tx status,
//! and full d11 tx descriptors.

use crate::bitfield::{self, FieldSpec};
use crate::decode::{Decode, DecodeError};
use crate::hexdump;
use crate::record::EventRecord;
use crate::registry::{EventHandler, EventHandlerRegistry};
use crate::seq::{TraceSeq, SOFTMAC_PAD};

const PAD: usize = SOFTMAC_PAD;

const MACINT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(0, 1, "MI_MACSSPNDD", "MAC suspended"),
    FieldSpec::new(1, 1, "MI_BCNTPL", "beacon template available"),
    FieldSpec::new(2, 1, "MI_TBTT", "TBTT indication"),
    FieldSpec::new(3, 1, "MI_BCNSUCCESS", "successful beacon tx"),
    FieldSpec::new(4, 1, "MI_BCNCANCLD", "IBSS beacon cancele"),
    FieldSpec::new(5, 1, "MI_ATIMWINEND", "end of ATIM window"),
    FieldSpec::new(6, 1, "MI_PMQ", "PMQ entries available"),
    FieldSpec::new(7, 1, "MI_NSPECGEN_0", "PSM gen-stat bit 0"),
    FieldSpec::new(8, 1, "MI_NSPECGEN_1", "PSM gen-stat bit 1"),
    FieldSpec::new(9, 1, "MI_MACTXERR", "MAC level tx error"),
    FieldSpec::new(10, 1, "MI_NSPECGEN_3", "PSM gen-stat bit 3"),
    FieldSpec::new(11, 1, "MI_PHYTXERR", "PHY tx error"),
    FieldSpec::new(12, 1, "MI_PME", "power management event"),
    FieldSpec::new(13, 1, "MI_GP0", "general-purpose timer 0"),
    FieldSpec::new(14, 1, "MI_GP1", "general-purpose timer 1"),
    FieldSpec::new(15, 1, "MI_DMAINT", "DMA interrupt"),
    FieldSpec::new(16, 1, "MI_TXSTP", "TX fifo suspend complete"),
    FieldSpec::new(17, 1, "MI_CCA", "CCA measurement complete"),
    FieldSpec::new(18, 1, "MI_BG_NOISE", "background noise sample collection complete"),
    FieldSpec::new(19, 1, "MI_DTIM_TBTT", "MBSS DTIM TBTT indication"),
    FieldSpec::new(20, 1, "MI_PRQ", "probe response queue needs attention"),
    FieldSpec::new(21, 1, "MI_PWRUP", "radio/phy powered up"),
    FieldSpec::new(22, 1, "MI_RESERVED3", ""),
    FieldSpec::new(23, 1, "MI_RESERVED2", ""),
    FieldSpec::new(24, 1, "UNKNOWN", ""),
    FieldSpec::new(25, 1, "MI_RESERVED1", ""),
    FieldSpec::new(26, 1, "UNKNOWN", ""),
    FieldSpec::new(27, 1, "UNKNOWN", ""),
    FieldSpec::new(28, 1, "MI_RFDISABLE", "RF disable state change"),
    FieldSpec::new(29, 1, "MI_TFS", "MAC has completed a tx"),
    FieldSpec::new(30, 1, "MI_PHYCHANGED", "PHY status change wrt G mode"),
    FieldSpec::new(31, 1, "MI_TO", "general purpose timeout"),
];

/// `brcms_macintstatus`: one interrupt status word per ISR/DPC pass.
pub struct MacIntStatus;

impl EventHandler for MacIntStatus {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let dev = record.text("dev")?;
        let status = record.num("macintstatus")?;
        let in_isr = record.num("in_isr")? != 0;

        seq.puts(&format!("[{dev}] macintstatus {status:#x}, {in_isr}\n"));
        bitfield::render_flags(seq, PAD, status, MACINT_FIELDS)
    }
}

/// `brcms_prec_enq`: a frame entered a precedence queue.
pub struct PrecEnq;

impl EventHandler for PrecEnq {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        seq.puts(&format!(
            "[{}] pktq: prec={} num_prec={} hi_prec={} max={} len={}\n",
            record.text("dev")?,
            record.num("prec")?,
            record.num("num_prec")?,
            record.num("hi_prec")?,
            record.num("max")?,
            record.num("len")?,
        ));

        // Frame counts per precedence level, in the capture's byte order.
        let num_prec = record.num("num_prec")? as usize;
        let mut pmax = record.bytes("pmax")?;
        for i in 0..num_prec {
            let count = record.endian().u16(&mut pmax)?;
            seq.pad_puts(PAD, &format!("prec {i:>2}: {count}\n"));
        }
        Ok(())
    }
}

const FRAMEID_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(0, 3, "TXFID_QUEUE", "Tx queue"),
    FieldSpec::new(3, 2, "TXFID_RATE", "Tx rate"),
    FieldSpec::new(5, 11, "TXFID_SEQ", "Tx sequence"),
];

const TXSTAT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(0, 1, "TX_STATUS_VALID", "Tx status valid"),
    FieldSpec::new(1, 1, "TX_STATUS_ACK_RCV", "ACK received"),
    FieldSpec::new(2, 3, "TX_STATUS_SUPR", "Suppress status"),
    FieldSpec::new(5, 1, "TX_STATUS_AMPDU", "AMPDU status"),
    FieldSpec::new(6, 1, "TX_STATUS_INTERMEDIATE", "Intermediate or 1st ampdu pkg"),
    FieldSpec::new(7, 1, "TX_STATUS_PMINDCTD", "PM mode indicated to AP"),
    FieldSpec::new(8, 4, "TX_STATUS_RTS_RTX", "RTS count"),
    FieldSpec::new(12, 4, "TX_STATUS_FRM_RTX", "Frame count"),
];

/// `brcms_txstatus`: d11 core tx completion.
pub struct TxStatus;

impl EventHandler for TxStatus {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let frameid = record.num("frameid")?;
        let status = record.num("status")?;

        seq.puts(&format!(
            "[{}] frameid={frameid:#x} framelen={} status={status:#x} lasttxtime={} sequence={} phyerr={:#x} ackphyrxsh={:#x}\n",
            record.text("dev")?,
            record.num("framelen")?,
            record.num("lasttxtime")?,
            record.num("sequence")?,
            record.num("phyerr")?,
            record.num("ackphyrxsh")?,
        ));

        seq.pad_puts(PAD, "frame id:\n");
        bitfield::render_flags(seq, PAD + 2, frameid, FRAMEID_FIELDS)?;

        seq.pad_puts(PAD, "tx status:\n");
        bitfield::render_flags(seq, PAD + 2, status, TXSTAT_FIELDS)
    }
}

/// A d11 hardware tx descriptor, as prepended to outgoing frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct D11TxHeader {
    pub mac_tx_control_low: u16,
    pub mac_tx_control_high: u16,
    pub mac_frame_control: u16,
    pub tx_fes_time_normal: u16,
    pub phy_tx_control_word: u16,
    pub phy_tx_control_word_1: u16,
    pub phy_tx_control_word_1_fbr: u16,
    pub phy_tx_control_word_1_rts: u16,
    pub phy_tx_control_word_1_fbr_rts: u16,
    pub main_rates: u16,
    pub xtra_frame_types: u16,
    pub iv: [u8; 16],
    pub tx_frame_ra: [u8; 6],
    pub tx_fes_time_fallback: u16,
    pub rts_plcp_fallback: [u8; 6],
    pub rts_dur_fallback: u16,
    pub frag_plcp_fallback: [u8; 6],
    pub frag_dur_fallback: u16,
    pub m_mode_len: u16,
    pub m_mode_fbr_len: u16,
    pub tstamp_low: u16,
    pub tstamp_high: u16,
    pub abi_mimo_ant_sel: u16,
    pub preload_size: u16,
    pub ampdu_seq_ctl: u16,
    pub tx_frame_id: u16,
    pub tx_status: u16,
    pub max_n_mpdus: u16,
    pub max_a_bytes_mrt: u16,
    pub max_a_bytes_fbr: u16,
    pub min_m_bytes: u16,
    pub rts_phy_header: [u8; 6],
    pub rts_frame_control: u16,
    pub rts_duration: u16,
    pub rts_ra: [u8; 6],
    /// Remainder of the 16-byte rts_frame slot plus the descriptor's
    /// trailing pad word; carried for layout completeness, not rendered.
    pub rts_tail: [u8; 6],
    pub pad: u16,
}

impl Decode for D11TxHeader {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            mac_tx_control_low: u16::decode(data)?,
            mac_tx_control_high: u16::decode(data)?,
            mac_frame_control: u16::decode(data)?,
            tx_fes_time_normal: u16::decode(data)?,
            phy_tx_control_word: u16::decode(data)?,
            phy_tx_control_word_1: u16::decode(data)?,
            phy_tx_control_word_1_fbr: u16::decode(data)?,
            phy_tx_control_word_1_rts: u16::decode(data)?,
            phy_tx_control_word_1_fbr_rts: u16::decode(data)?,
            main_rates: u16::decode(data)?,
            xtra_frame_types: u16::decode(data)?,
            iv: <[u8; 16]>::decode(data)?,
            tx_frame_ra: <[u8; 6]>::decode(data)?,
            tx_fes_time_fallback: u16::decode(data)?,
            rts_plcp_fallback: <[u8; 6]>::decode(data)?,
            rts_dur_fallback: u16::decode(data)?,
            frag_plcp_fallback: <[u8; 6]>::decode(data)?,
            frag_dur_fallback: u16::decode(data)?,
            m_mode_len: u16::decode(data)?,
            m_mode_fbr_len: u16::decode(data)?,
            tstamp_low: u16::decode(data)?,
            tstamp_high: u16::decode(data)?,
            abi_mimo_ant_sel: u16::decode(data)?,
            preload_size: u16::decode(data)?,
            ampdu_seq_ctl: u16::decode(data)?,
            tx_frame_id: u16::decode(data)?,
            tx_status: u16::decode(data)?,
            max_n_mpdus: u16::decode(data)?,
            max_a_bytes_mrt: u16::decode(data)?,
            max_a_bytes_fbr: u16::decode(data)?,
            min_m_bytes: u16::decode(data)?,
            rts_phy_header: <[u8; 6]>::decode(data)?,
            rts_frame_control: u16::decode(data)?,
            rts_duration: u16::decode(data)?,
            rts_ra: <[u8; 6]>::decode(data)?,
            rts_tail: <[u8; 6]>::decode(data)?,
            pad: u16::decode(data)?,
        })
    }
}

fn word_line(seq: &mut TraceSeq<'_>, name: &str, value: u16) {
    seq.pad_puts(PAD, &format!("{name:<30} {value:#x}\n"));
}

fn group(seq: &mut TraceSeq<'_>, name: &str, bytes: &[u8]) {
    seq.pad_puts(PAD, &format!("{name}:\n"));
    hexdump::dump_plain(seq, PAD + 2, bytes);
}

/// `brcms_txdesc`: the full descriptor, dumped field by field.
pub struct TxDesc;

impl EventHandler for TxDesc {
    fn handle(
        &mut self,
        seq: &mut TraceSeq<'_>,
        record: &EventRecord<'_>,
    ) -> Result<(), DecodeError> {
        let txdir = if record.num("in")? == 1 { "IN" } else { "OUT" };
        let mut data = record.bytes("txh")?;
        // The descriptor is laid out little-endian by the hardware,
        // independent of the capture's byte order.
        let txh = D11TxHeader::decode(&mut data)?;

        seq.puts(&format!("{txdir}[{}] txdesc:\n", record.text("dev")?));

        let control_words = [
            ("MacTxControlLow", txh.mac_tx_control_low),
            ("MacTxControlHigh", txh.mac_tx_control_high),
            ("MacFrameControl", txh.mac_frame_control),
            ("TxFesTimeNormal", txh.tx_fes_time_normal),
            ("PhyTxControlWord", txh.phy_tx_control_word),
            ("PhyTxControlWord_1", txh.phy_tx_control_word_1),
            ("PhyTxControlWord_1_Fbr", txh.phy_tx_control_word_1_fbr),
            ("PhyTxControlWord_1_Rts", txh.phy_tx_control_word_1_rts),
            ("PhyTxControlWord_1_FbrRts", txh.phy_tx_control_word_1_fbr_rts),
            ("MainRates", txh.main_rates),
            ("XtraFrameTypes", txh.xtra_frame_types),
        ];
        for (name, value) in control_words {
            word_line(seq, name, value);
        }

        group(seq, "IV", &txh.iv);
        group(seq, "TxFrameRA", &txh.tx_frame_ra);
        word_line(seq, "TxFesTimeFallback", txh.tx_fes_time_fallback);
        group(seq, "RTSPLCPFallback", &txh.rts_plcp_fallback);
        word_line(seq, "RTSDurFallback", txh.rts_dur_fallback);
        group(seq, "FragPLCPFallback", &txh.frag_plcp_fallback);
        word_line(seq, "FragDurFallback", txh.frag_dur_fallback);

        let fes_words = [
            ("MModeLen", txh.m_mode_len),
            ("MmodeFbrLen", txh.m_mode_fbr_len),
            ("TstampLow", txh.tstamp_low),
            ("TstampHigh", txh.tstamp_high),
            ("ABI_MimoAntSel", txh.abi_mimo_ant_sel),
            ("PreloadSize", txh.preload_size),
            ("AmpduSeqCtl", txh.ampdu_seq_ctl),
            ("TxFrameID", txh.tx_frame_id),
            ("TxStatus", txh.tx_status),
            ("MaxNMpdus", txh.max_n_mpdus),
            ("MaxABytes_MRT", txh.max_a_bytes_mrt),
            ("MaxABytes_FBR", txh.max_a_bytes_fbr),
            ("MinMBytes", txh.min_m_bytes),
        ];
        for (name, value) in fes_words {
            word_line(seq, name, value);
        }

        group(seq, "RTSPhyHeader", &txh.rts_phy_header);
        word_line(seq, "rts_frame.frame_control", txh.rts_frame_control);
        word_line(seq, "rts_frame.duration", txh.rts_duration);
        group(seq, "rts_frame.ra", &txh.rts_ra);
        Ok(())
    }
}

/// Installs the four SoftMAC event handlers.
pub fn register(registry: &mut EventHandlerRegistry) {
    registry.register("brcmsmac", "brcms_macintstatus", Box::new(MacIntStatus));
    registry.register("brcmsmac", "brcms_prec_enq", Box::new(PrecEnq));
    registry.register("brcmsmac_tx", "brcms_txstatus", Box::new(TxStatus));
    registry.register("brcmsmac_tx", "brcms_txdesc", Box::new(TxDesc));
}

//! Decoders for Broadcom wireless-driver kernel trace events.
//!
//! The `brcmfmac` (FullMAC) and `brcmsmac` (SoftMAC) drivers emit trace
//! events whose payloads are raw wire structures: TLV-encoded firmware
//! signals inside BDC bus-control headers, SDPCM bus headers, chained
//! enumeration-ROM descriptors, and d11 hardware descriptors. This crate
//! turns those payloads into the human-readable diagnostic text a trace
//! viewer prints next to each event.
//!
//! The host tracing tool hands each captured event to an
//! [`EventHandlerRegistry`](registry::EventHandlerRegistry) as an
//! [`EventRecord`](record::EventRecord) of named fields, and rendered
//! lines come back through a caller-supplied
//! [`TraceSink`](seq::TraceSink). Wire structures implement
//! [`Decode`](decode::Decode), which parses them off the front of a byte
//! slice. Decoding is synchronous and allocation-light; registries are
//! static tables, and any per-chain state lives in the handler instance
//! that needs it.

pub mod bitfield;
pub mod decode;
pub mod dmp;
pub mod events;
pub mod fwsignal;
pub mod hexdump;
pub mod record;
pub mod registry;
pub mod seq;
pub mod tlv;

pub use decode::{Decode, DecodeError, MacAddr};
pub use record::{Endian, EventRecord, FieldValue};
pub use registry::{EventHandler, EventHandlerRegistry};
pub use seq::{TraceSeq, TraceSink, FULLMAC_PAD, SOFTMAC_PAD};

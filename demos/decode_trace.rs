//! Decodes a handful of canned trace records and prints the rendered text.

use brcm_wltrace::events;
use brcm_wltrace::{Endian, EventHandlerRegistry, EventRecord};

fn main() {
    simplelog::TermLogger::init(
        log::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let mut registry = EventHandlerRegistry::new();
    events::register_all(&mut registry);

    // A BDC header whose signal stream credits fifos and binds a MAC
    // descriptor, with filler bytes between records.
    let signal = [
        0x0B, 0x06, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, // FIFO_CREDITBACK
        0x06, 0x08, 0x41, 0x01, 0x00, 0x90, 0x4C, 0x12, 0x02, 0x7E, // MACDESC_ADD
        0xFF, 0xFF, // filler
        0x04, 0x04, 0x01, 0x07, 0x00, 0x9C, // TXSTATUS
    ];
    let bdchdr = EventRecord::new(Endian::Little)
        .with_num("flags", 0x20)
        .with_num("prio", 1)
        .with_num("flags2", 0)
        .with_num("siglen", signal.len() as u64)
        .with_bytes("signal", &signal);

    let mut out = String::new();
    registry.dispatch("brcmfmac", "brcmf_bdchdr", &mut out, &bdchdr);

    // An enumeration-ROM chain, one descriptor word per event: a
    // two-word component, an address region with a custom size, its
    // size word, and the end-of-table marker.
    let chain: [u64; 5] = [
        (0x4BF << 20) | (0x812 << 8) | 1,
        (0x2A << 24) | (1 << 9) | (2 << 4) | 1,
        (0x18005 << 12) | (3 << 4) | 5,
        0x10 << 12,
        0xF,
    ];
    for word in chain {
        let record = EventRecord::new(Endian::Little).with_num("desc", word);
        registry.dispatch("brcmfmac", "brcmf_dmp_desc", &mut out, &record);
    }

    // A SoftMAC interrupt status word.
    let macint = EventRecord::new(Endian::Little)
        .with_str("dev", "bcm47xx_wmac")
        .with_num("macintstatus", (1 << 2) | (1 << 15))
        .with_num("in_isr", 1);
    registry.dispatch("brcmsmac", "brcms_macintstatus", &mut out, &macint);

    print!("{out}");
}

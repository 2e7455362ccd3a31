//! Per-driver event renderers.

pub mod fullmac;
pub mod softmac;

use crate::registry::EventHandlerRegistry;

/// Installs the handlers of both driver families.
pub fn register_all(registry: &mut EventHandlerRegistry) {
    fullmac::register(registry);
    softmac::register(registry);
}

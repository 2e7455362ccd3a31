//! Event-handler registration and dispatch.
//!
//! The host tracing tool announces each captured event by subsystem and
//! event name. A [`EventHandlerRegistry`] maps those pairs to renderer
//! instances; handlers take `&mut self` so a renderer can thread decoder
//! state across events (the descriptor-chain walker needs this).

use std::collections::HashMap;

use log::{debug, warn};

use crate::decode::DecodeError;
use crate::record::EventRecord;
use crate::seq::{TraceSeq, TraceSink};

/// A renderer for one (subsystem, event) pair.
pub trait EventHandler {
    /// Decodes `record` and renders diagnostic text into `seq`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the record cannot be interpreted.
    /// Dispatch reports the failure and carries on; one bad record never
    /// aborts the surrounding trace render.
    fn handle(&mut self, seq: &mut TraceSeq<'_>, record: &EventRecord<'_>)
        -> Result<(), DecodeError>;
}

/// Dispatch table from (subsystem, event) to renderer.
#[derive(Default)]
pub struct EventHandlerRegistry {
    handlers: HashMap<String, Box<dyn EventHandler>>,
}

impl EventHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` for the given (subsystem, event) pair,
    /// replacing any previous registration.
    pub fn register(
        &mut self,
        subsystem: &str,
        event: &str,
        handler: Box<dyn EventHandler>,
    ) {
        self.handlers.insert(Self::key(subsystem, event), handler);
    }

    /// Runs the handler registered for the pair, writing rendered text
    /// into `out`.
    ///
    /// Returns `false` when no handler is registered. Handler failures
    /// degrade to a diagnostic line in the output instead of
    /// propagating.
    pub fn dispatch(
        &mut self,
        subsystem: &str,
        event: &str,
        out: &mut dyn TraceSink,
        record: &EventRecord<'_>,
    ) -> bool {
        let key = Self::key(subsystem, event);
        let Some(handler) = self.handlers.get_mut(&key) else {
            debug!("no handler registered for {key}");
            return false;
        };

        let mut seq = TraceSeq::new(out);
        if let Err(err) = handler.handle(&mut seq, record) {
            warn!("{key}: {err}");
            seq.puts(&format!("[decode error: {err}]\n"));
        }
        true
    }

    fn key(subsystem: &str, event: &str) -> String {
        format!("{subsystem}/{event}")
    }
}

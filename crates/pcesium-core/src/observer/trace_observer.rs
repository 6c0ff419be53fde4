use crate::{
    memory::io::Port,
    observer::VdcObserver,
    vdc::{AccessOrigin, Status, VdcEvent, VramAccess},
};

/// Logs register traffic, interrupts and frame boundaries through `tracing`.
///
/// Per-dot and per-event output is opt-in because it is very chatty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceObserver {
    pub events: bool,
    pub vram: bool,
}

impl TraceObserver {
    pub fn verbose() -> Self {
        Self {
            events: true,
            vram: true,
        }
    }
}

impl VdcObserver for TraceObserver {
    fn on_register_read(&mut self, origin: AccessOrigin, port: Port, value: u8) {
        tracing::trace!(?origin, ?port, value = format_args!("{value:#04X}"), "vdc read");
    }

    fn on_register_write(&mut self, origin: AccessOrigin, port: Port, value: u8) {
        tracing::trace!(?origin, ?port, value = format_args!("{value:#04X}"), "vdc write");
    }

    fn on_vram_access(&mut self, access: &VramAccess) {
        if self.vram {
            tracing::trace!(
                origin = ?access.origin,
                kind = ?access.kind,
                addr = format_args!("{:#06X}", access.addr),
                value = format_args!("{:#06X}", access.value),
                "vram access"
            );
        }
    }

    fn on_event(&mut self, event: VdcEvent, scanline: u16, h_clock: u16) {
        if self.events {
            tracing::trace!(?event, scanline, h_clock, "vdc event");
        }
    }

    fn on_irq(&mut self, source: Status) {
        tracing::debug!(?source, "vdc irq");
    }

    fn on_frame_complete(&mut self, frame: u64) {
        tracing::debug!(frame, "vdc frame complete");
    }
}

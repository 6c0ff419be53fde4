use super::savestate::OpenBusState;

/// Last word driven onto the VRAM data bus by a valid read.
///
/// Reads of unmapped VRAM (`>= 0x8000`) and reads issued before a queued
/// access completes see this value instead of fresh data. Unlike the CPU
/// side there is no decay: the latch holds until the next valid read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct VramOpenBus {
    value: u16,
}

impl VramOpenBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a word returned by a valid VRAM read.
    #[inline]
    pub(crate) fn latch(&mut self, value: u16) {
        self.value = value;
    }

    #[inline]
    pub(crate) fn sample(&self) -> u16 {
        self.value
    }

    pub(crate) fn save_state(&self) -> OpenBusState {
        OpenBusState { value: self.value }
    }

    pub(crate) fn load_state(&mut self, state: OpenBusState) {
        self.value = state.value;
    }
}

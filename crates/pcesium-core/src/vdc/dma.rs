//! VRAM-to-VRAM and sprite attribute table transfer engines.
//!
//! Both run on the dot clock and take the VRAM port ahead of rendering. The
//! VRAM transfer spends two dots per word (read, then write); the SATB
//! transfer spends four dots per word and only reads on the first of them.

use crate::memory::vdc as vdc_mem;

use super::{
    arbiter::{AccessKind, AccessOrigin, Grant, VramAccess, VramArbiter},
    registers::Registers,
    savestate::{SatbDmaState, VramDmaState},
};

/// Outcome of clocking a DMA engine for one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DmaTick {
    /// VRAM access performed this dot, if the engine used the port.
    pub(crate) access: Option<VramAccess>,
    /// The transfer completed on this dot.
    pub(crate) finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct VramDma {
    active: bool,
    /// Next dot writes the buffered word.
    write_phase: bool,
    buffer: u16,
    /// Armed but held until vertical blank.
    deferred: bool,
}

impl VramDma {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn is_deferred(&self) -> bool {
        self.deferred
    }

    pub(crate) fn start(&mut self) {
        self.active = true;
        self.write_phase = false;
        self.deferred = false;
    }

    pub(crate) fn defer(&mut self) {
        self.deferred = true;
    }

    /// Moves one half-word step; SOUR, DESR and LENR update as it runs.
    ///
    /// LENR holds "words left - 1", so a transfer moves LENR+1 words and
    /// leaves LENR at `0xFFFF`.
    pub(crate) fn clock(&mut self, regs: &mut Registers, arbiter: &mut VramArbiter) -> DmaTick {
        if !self.active || !arbiter.is_free() || !arbiter.claim(Grant::VramDma) {
            return DmaTick::default();
        }

        if !self.write_phase {
            let addr = regs.sour;
            self.buffer = arbiter.read(addr);
            self.write_phase = true;
            return DmaTick {
                access: Some(VramAccess {
                    origin: AccessOrigin::VramDma,
                    kind: AccessKind::Read,
                    addr,
                    value: self.buffer,
                }),
                finished: false,
            };
        }

        let addr = regs.desr;
        arbiter.write(addr, self.buffer);
        self.write_phase = false;
        regs.sour = regs.sour.wrapping_add(regs.dcr.source_step());
        regs.desr = regs.desr.wrapping_add(regs.dcr.dest_step());
        let finished = regs.lenr == 0;
        regs.lenr = regs.lenr.wrapping_sub(1);
        if finished {
            self.active = false;
        }
        DmaTick {
            access: Some(VramAccess {
                origin: AccessOrigin::VramDma,
                kind: AccessKind::Write,
                addr,
                value: self.buffer,
            }),
            finished,
        }
    }

    pub(crate) fn save_state(&self) -> VramDmaState {
        VramDmaState {
            active: self.active,
            write_phase: self.write_phase,
            buffer: self.buffer,
            deferred: self.deferred,
        }
    }

    pub(crate) fn load_state(&mut self, state: VramDmaState) {
        self.active = state.active;
        self.write_phase = state.write_phase;
        self.buffer = state.buffer;
        self.deferred = state.deferred;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct SatbDma {
    active: bool,
    /// DVSSR was written since the last transfer.
    requested: bool,
    /// Source latched when the transfer started.
    source: u16,
    index: u16,
    phase: u8,
}

impl SatbDma {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested
    }

    pub(crate) fn request(&mut self) {
        self.requested = true;
    }

    /// Starts a transfer at vertical blank if one was requested or auto
    /// repeat is on. Returns whether it started.
    pub(crate) fn start_at_vblank(&mut self, source: u16, auto: bool) -> bool {
        if !(self.requested || auto) {
            return false;
        }
        self.requested = false;
        self.active = true;
        self.source = source;
        self.index = 0;
        self.phase = 0;
        true
    }

    pub(crate) fn clock(&mut self, arbiter: &mut VramArbiter) -> DmaTick {
        if !self.active {
            return DmaTick::default();
        }

        let mut tick = DmaTick::default();
        if self.phase == 0 && arbiter.claim(Grant::SatbDma) {
            let addr = self.source.wrapping_add(self.index);
            let value = arbiter.read(addr);
            arbiter.write_sprite_ram(self.index as usize, value);
            tick.access = Some(VramAccess {
                origin: AccessOrigin::SatbDma,
                kind: AccessKind::Read,
                addr,
                value,
            });
        }

        self.phase += 1;
        if self.phase == vdc_mem::SATB_DOTS_PER_WORD {
            self.phase = 0;
            self.index += 1;
            if self.index == vdc_mem::SATB_TRANSFER_WORDS {
                self.active = false;
                tick.finished = true;
            }
        }
        tick
    }

    pub(crate) fn save_state(&self) -> SatbDmaState {
        SatbDmaState {
            active: self.active,
            requested: self.requested,
            source: self.source,
            index: self.index,
            phase: self.phase,
        }
    }

    pub(crate) fn load_state(&mut self, state: SatbDmaState) {
        self.active = state.active;
        self.requested = state.requested;
        self.source = state.source;
        self.index = state.index;
        self.phase = state.phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_vram_dma(regs: &mut Registers, arbiter: &mut VramArbiter) -> u32 {
        let mut dma = VramDma::new();
        dma.start();
        let mut dots = 0;
        while dma.is_active() {
            arbiter.begin_dot();
            dma.clock(regs, arbiter);
            dots += 1;
        }
        dots
    }

    #[test]
    fn vram_dma_copies_lenr_plus_one_words() {
        let mut regs = Registers::new();
        let mut arbiter = VramArbiter::new();
        for i in 0..8 {
            arbiter.vram_mut()[0x100 + i] = 0xA000 + i as u16;
        }
        regs.sour = 0x100;
        regs.desr = 0x200;
        regs.lenr = 3;
        assert_eq!(run_vram_dma(&mut regs, &mut arbiter), 8);
        assert_eq!(&arbiter.vram()[0x200..0x205], &[0xA000, 0xA001, 0xA002, 0xA003, 0]);
        assert_eq!((regs.sour, regs.desr, regs.lenr), (0x104, 0x204, 0xFFFF));
    }

    #[test]
    fn vram_dma_decrementing_addresses() {
        let mut regs = Registers::new();
        let mut arbiter = VramArbiter::new();
        arbiter.vram_mut()[0x10] = 1;
        arbiter.vram_mut()[0x0F] = 2;
        regs.store_byte(crate::memory::io::Register::DmaControl, 0x0C, false);
        regs.sour = 0x10;
        regs.desr = 0x30;
        regs.lenr = 1;
        run_vram_dma(&mut regs, &mut arbiter);
        assert_eq!(arbiter.vram()[0x30], 1);
        assert_eq!(arbiter.vram()[0x2F], 2);
        assert_eq!((regs.sour, regs.desr), (0x0E, 0x2E));
    }

    #[test]
    fn satb_dma_takes_four_dots_per_word() {
        let mut arbiter = VramArbiter::new();
        for i in 0..256 {
            arbiter.vram_mut()[0x7F00 + i] = i as u16 ^ 0x5555;
        }
        let mut dma = SatbDma::new();
        dma.request();
        assert!(dma.start_at_vblank(0x7F00, false));
        let mut dots = 0;
        let mut reads = 0;
        while dma.is_active() {
            arbiter.begin_dot();
            let tick = dma.clock(&mut arbiter);
            reads += tick.access.is_some() as u32;
            dots += 1;
        }
        assert_eq!((dots, reads), (1024, 256));
        assert_eq!(arbiter.sprite_ram()[255], 255 ^ 0x5555);
        assert!(!dma.start_at_vblank(0x7F00, false));
        assert!(dma.start_at_vblank(0x7F00, true));
    }
}

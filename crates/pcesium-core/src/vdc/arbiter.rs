//! Single-port VRAM arbitration.
//!
//! The store has one access port. Every dot the controller offers it, in
//! priority order, to the SATB transfer, the VRAM transfer, the background
//! fetcher, the sprite loader and finally the CPU. The CPU side holds at
//! most one queued access; the register interface stalls when a second one
//! arrives before the first is serviced.

use crate::{
    mem_block::vdc::{SpriteRam, Vram},
    memory::vdc as vdc_mem,
};

use super::{open_bus::VramOpenBus, registers::Registers, savestate::ArbiterState};

/// Who issued a VRAM or register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessOrigin {
    /// Emulated CPU through the bus.
    Cpu,
    /// Tooling through the debugger entry points.
    Debugger,
    VramDma,
    SatbDma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// A completed VRAM access, reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VramAccess {
    pub origin: AccessOrigin,
    pub kind: AccessKind,
    pub addr: u16,
    pub value: u16,
}

/// Holder of the VRAM port for one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Grant {
    #[default]
    Idle,
    SatbDma,
    VramDma,
    BackgroundFetch,
    SpriteFetch,
    Cpu,
}

/// CPU-side access waiting for a free slot. Addresses are captured when the
/// access is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CpuAccess {
    Read { addr: u16, origin: AccessOrigin },
    Write { addr: u16, value: u16, origin: AccessOrigin },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VramArbiter {
    vram: Vram,
    sprite_ram: SpriteRam,
    open_bus: VramOpenBus,
    pending: Option<CpuAccess>,
    grant: Grant,
}

impl Default for VramArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl VramArbiter {
    pub(crate) fn new() -> Self {
        Self {
            vram: Vram::new(),
            sprite_ram: SpriteRam::new(),
            open_bus: VramOpenBus::new(),
            pending: None,
            grant: Grant::Idle,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Opens a new dot; the port is free again.
    #[inline]
    pub(crate) fn begin_dot(&mut self) {
        self.grant = Grant::Idle;
    }

    /// Hands the port to `who` for the rest of the dot.
    ///
    /// Granting twice in one dot means two agents would drive the bus at
    /// once; that is a core defect, so it is reported and refused.
    pub(crate) fn claim(&mut self, who: Grant) -> bool {
        if self.grant != Grant::Idle {
            tracing::error!(holder = ?self.grant, requester = ?who, "vram port granted twice in one dot");
            return false;
        }
        self.grant = who;
        true
    }

    pub(crate) fn grant(&self) -> Grant {
        self.grant
    }

    pub(crate) fn is_free(&self) -> bool {
        self.grant == Grant::Idle
    }

    /// Reads a word through the port, refreshing the open-bus latch.
    #[inline]
    pub(crate) fn read(&mut self, addr: u16) -> u16 {
        if addr < vdc_mem::VRAM_VALID_LIMIT {
            let value = self.vram[addr as usize];
            self.open_bus.latch(value);
            value
        } else {
            self.open_bus.sample()
        }
    }

    /// Writes a word through the port. Unmapped addresses drop the write.
    #[inline]
    pub(crate) fn write(&mut self, addr: u16, value: u16) -> bool {
        if addr < vdc_mem::VRAM_VALID_LIMIT {
            self.vram[addr as usize] = value;
            true
        } else {
            tracing::trace!(addr = format_args!("{addr:#06X}"), "write to unmapped vram ignored");
            false
        }
    }

    pub(crate) fn write_sprite_ram(&mut self, index: usize, value: u16) {
        self.sprite_ram[index % vdc_mem::SPRITE_RAM_WORDS] = value;
    }

    pub(crate) fn vram(&self) -> &[u16] {
        &self.vram
    }

    pub(crate) fn vram_mut(&mut self) -> &mut [u16] {
        &mut self.vram
    }

    pub(crate) fn sprite_ram(&self) -> &[u16] {
        &self.sprite_ram
    }

    pub(crate) fn sprite_ram_mut(&mut self) -> &mut [u16] {
        &mut self.sprite_ram
    }

    pub(crate) fn open_bus(&self) -> u16 {
        self.open_bus.sample()
    }

    pub(crate) fn pending(&self) -> Option<CpuAccess> {
        self.pending
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queues a CPU access. The caller must have drained any earlier one.
    pub(crate) fn enqueue(&mut self, access: CpuAccess) {
        debug_assert!(self.pending.is_none(), "cpu vram access queued twice");
        self.pending = Some(access);
    }

    /// Drops a queued access without performing it.
    pub(crate) fn abandon_pending(&mut self) -> Option<CpuAccess> {
        self.pending.take()
    }

    /// Performs the queued CPU access if the port is still free this dot.
    pub(crate) fn service_cpu(&mut self, regs: &mut Registers) -> Option<VramAccess> {
        let access = self.pending?;
        if !self.is_free() || !self.claim(Grant::Cpu) {
            return None;
        }
        self.pending = None;
        let done = match access {
            CpuAccess::Read { addr, origin } => {
                let value = self.read(addr);
                regs.vrr = value;
                VramAccess {
                    origin,
                    kind: AccessKind::Read,
                    addr,
                    value,
                }
            }
            CpuAccess::Write {
                addr,
                value,
                origin,
            } => {
                self.write(addr, value);
                VramAccess {
                    origin,
                    kind: AccessKind::Write,
                    addr,
                    value,
                }
            }
        };
        Some(done)
    }

    pub(crate) fn save_state(&self) -> ArbiterState {
        ArbiterState {
            open_bus: self.open_bus.save_state(),
            pending: self.pending,
            grant: self.grant,
        }
    }

    /// Restores port state; memories are restored separately.
    pub(crate) fn load_state(&mut self, state: &ArbiterState) {
        self.open_bus.load_state(state.open_bus);
        self.pending = state.pending;
        self.grant = state.grant;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_reads_return_latched_word() {
        let mut arbiter = VramArbiter::new();
        arbiter.vram_mut()[0x1234] = 0xBEEF;
        assert_eq!(arbiter.read(0x1234), 0xBEEF);
        assert_eq!(arbiter.read(0x9000), 0xBEEF);
        assert!(!arbiter.write(0x8000, 0x1111));
        assert_eq!(arbiter.read(0xFFFF), 0xBEEF);
    }

    #[test]
    fn cpu_access_waits_for_free_port() {
        let mut arbiter = VramArbiter::new();
        let mut regs = Registers::new();
        arbiter.enqueue(CpuAccess::Write {
            addr: 0x0010,
            value: 0x5A5A,
            origin: AccessOrigin::Cpu,
        });

        arbiter.begin_dot();
        assert!(arbiter.claim(Grant::BackgroundFetch));
        assert!(arbiter.service_cpu(&mut regs).is_none());
        assert!(arbiter.has_pending());

        arbiter.begin_dot();
        let done = arbiter.service_cpu(&mut regs).expect("serviced");
        assert_eq!(done.kind, AccessKind::Write);
        assert_eq!(arbiter.vram()[0x0010], 0x5A5A);
        assert_eq!(arbiter.grant(), Grant::Cpu);
    }

    #[test]
    fn double_grant_is_refused() {
        let mut arbiter = VramArbiter::new();
        arbiter.begin_dot();
        assert!(arbiter.claim(Grant::VramDma));
        assert!(!arbiter.claim(Grant::Cpu));
        assert_eq!(arbiter.grant(), Grant::VramDma);
    }
}

//! CPU-visible VDC register file.
//!
//! The select port picks one of the indexed registers below; the two data
//! ports then update its low or high byte. Bit layouts live in submodules.

mod control;
mod dma_control;
mod memory_width;
mod status;
mod timing;

pub use control::Control;
pub use dma_control::DmaControl;
pub use memory_width::{BgFetchLayout, MemoryWidth};
pub use status::Status;
pub use timing::TimingRegisters;

use crate::memory::io::Register;

use super::savestate::RegistersState;

/// Aggregates every register reachable through the select port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Registers {
    /// Index written to the select port (5 bits).
    pub(crate) select: u8,
    pub(crate) mawr: u16,
    pub(crate) marr: u16,
    /// Data latched by VWR writes; the high byte commits the word.
    pub(crate) vwr: u16,
    /// Last word delivered by a completed CPU read.
    pub(crate) vrr: u16,
    pub(crate) control: Control,
    pub(crate) rcr: u16,
    pub(crate) bxr: u16,
    pub(crate) byr: u16,
    pub(crate) mwr: MemoryWidth,
    pub(crate) timing: TimingRegisters,
    pub(crate) dcr: DmaControl,
    pub(crate) sour: u16,
    pub(crate) desr: u16,
    pub(crate) lenr: u16,
    pub(crate) dvssr: u16,
    pub(crate) status: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Replaces one byte of a 16-bit register and applies the register's width.
#[inline]
pub(crate) fn merge_byte(reg: u16, value: u8, msb: bool, mask: u16) -> u16 {
    let merged = if msb {
        (reg & 0x00FF) | ((value as u16) << 8)
    } else {
        (reg & 0xFF00) | value as u16
    };
    merged & mask
}

impl Registers {
    pub(crate) fn new() -> Self {
        Self {
            select: 0,
            mawr: 0,
            marr: 0,
            vwr: 0,
            vrr: 0,
            control: Control::default(),
            rcr: 0,
            bxr: 0,
            byr: 0,
            mwr: MemoryWidth::default(),
            timing: TimingRegisters::default(),
            dcr: DmaControl::default(),
            sour: 0,
            desr: 0,
            lenr: 0,
            dvssr: 0,
            status: Status::default(),
        }
    }

    pub(crate) fn selected(&self) -> Option<Register> {
        Register::from_index(self.select)
    }

    /// Width mask applied when a register is written.
    pub(crate) fn write_mask(reg: Register) -> u16 {
        match reg {
            Register::Control => 0x1FFF,
            Register::RasterCompare | Register::ScrollX => 0x03FF,
            Register::ScrollY => 0x01FF,
            Register::MemoryWidth => 0x00FF,
            Register::HorizontalSync => timing::HSR_MASK,
            Register::HorizontalDisplay => timing::HDR_MASK,
            Register::VerticalSync => timing::VPR_MASK,
            Register::VerticalDisplay => timing::VDW_MASK,
            Register::VerticalDisplayEnd => timing::VCR_MASK,
            Register::DmaControl => 0x001F,
            _ => 0xFFFF,
        }
    }

    /// Current 16-bit value of a register. `Vram` reports the read buffer.
    pub(crate) fn value(&self, reg: Register) -> u16 {
        match reg {
            Register::Mawr => self.mawr,
            Register::Marr => self.marr,
            Register::Vram => self.vrr,
            Register::Control => self.control.bits(),
            Register::RasterCompare => self.rcr,
            Register::ScrollX => self.bxr,
            Register::ScrollY => self.byr,
            Register::MemoryWidth => self.mwr.bits() as u16,
            Register::HorizontalSync => self.timing.hsr,
            Register::HorizontalDisplay => self.timing.hdr,
            Register::VerticalSync => self.timing.vpr,
            Register::VerticalDisplay => self.timing.vdw,
            Register::VerticalDisplayEnd => self.timing.vcr,
            Register::DmaControl => self.dcr.bits() as u16,
            Register::DmaSource => self.sour,
            Register::DmaDestination => self.desr,
            Register::DmaLength => self.lenr,
            Register::SatbSource => self.dvssr,
        }
    }

    /// Stores one byte into a register without side effects.
    pub(crate) fn store_byte(&mut self, reg: Register, value: u8, msb: bool) {
        let mask = Self::write_mask(reg);
        let slot = match reg {
            Register::Mawr => &mut self.mawr,
            Register::Marr => &mut self.marr,
            Register::Vram => &mut self.vwr,
            Register::Control => {
                let bits = merge_byte(self.control.bits(), value, msb, mask);
                self.control = Control::from_bits_retain(bits);
                return;
            }
            Register::RasterCompare => &mut self.rcr,
            Register::ScrollX => &mut self.bxr,
            Register::ScrollY => &mut self.byr,
            Register::MemoryWidth => {
                // MWR only has a low byte.
                if !msb {
                    self.mwr = MemoryWidth::from_bits_retain(value);
                }
                return;
            }
            Register::HorizontalSync => &mut self.timing.hsr,
            Register::HorizontalDisplay => &mut self.timing.hdr,
            Register::VerticalSync => &mut self.timing.vpr,
            Register::VerticalDisplay => &mut self.timing.vdw,
            Register::VerticalDisplayEnd => &mut self.timing.vcr,
            Register::DmaControl => {
                if !msb {
                    self.dcr = DmaControl::from_bits_retain(value & mask as u8);
                }
                return;
            }
            Register::DmaSource => &mut self.sour,
            Register::DmaDestination => &mut self.desr,
            Register::DmaLength => &mut self.lenr,
            Register::SatbSource => &mut self.dvssr,
        };
        *slot = merge_byte(*slot, value, msb, mask);
    }

    pub(crate) fn save_state(&self) -> RegistersState {
        RegistersState {
            select: self.select,
            mawr: self.mawr,
            marr: self.marr,
            vwr: self.vwr,
            vrr: self.vrr,
            control: self.control.bits(),
            rcr: self.rcr,
            bxr: self.bxr,
            byr: self.byr,
            mwr: self.mwr.bits(),
            hsr: self.timing.hsr,
            hdr: self.timing.hdr,
            vpr: self.timing.vpr,
            vdw: self.timing.vdw,
            vcr: self.timing.vcr,
            dcr: self.dcr.bits(),
            sour: self.sour,
            desr: self.desr,
            lenr: self.lenr,
            dvssr: self.dvssr,
            status: self.status.bits(),
        }
    }

    pub(crate) fn load_state(&mut self, state: &RegistersState) {
        self.select = state.select;
        self.mawr = state.mawr;
        self.marr = state.marr;
        self.vwr = state.vwr;
        self.vrr = state.vrr;
        self.control = Control::from_bits_retain(state.control);
        self.rcr = state.rcr;
        self.bxr = state.bxr;
        self.byr = state.byr;
        self.mwr = MemoryWidth::from_bits_retain(state.mwr);
        self.timing = TimingRegisters {
            hsr: state.hsr,
            hdr: state.hdr,
            vpr: state.vpr,
            vdw: state.vdw,
            vcr: state.vcr,
        };
        self.dcr = DmaControl::from_bits_retain(state.dcr);
        self.sour = state.sour;
        self.desr = state.desr;
        self.lenr = state.lenr;
        self.dvssr = state.dvssr;
        self.status = Status::from_bits_retain(state.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_merge_with_register_width() {
        let mut regs = Registers::new();
        regs.store_byte(Register::ScrollY, 0xFF, false);
        regs.store_byte(Register::ScrollY, 0xFF, true);
        assert_eq!(regs.byr, 0x01FF);

        regs.store_byte(Register::RasterCompare, 0x34, false);
        regs.store_byte(Register::RasterCompare, 0x12, true);
        assert_eq!(regs.rcr, 0x0234);
    }

    #[test]
    fn single_byte_registers_ignore_msb() {
        let mut regs = Registers::new();
        regs.store_byte(Register::MemoryWidth, 0x50, false);
        regs.store_byte(Register::MemoryWidth, 0xFF, true);
        assert_eq!(regs.value(Register::MemoryWidth), 0x50);

        regs.store_byte(Register::DmaControl, 0xFF, false);
        assert_eq!(regs.value(Register::DmaControl), 0x1F);
    }
}

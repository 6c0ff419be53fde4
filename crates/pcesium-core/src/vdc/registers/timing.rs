/// Raw display timing registers (`HSR`, `HDR`, `VPR`, `VDW`, `VCR`).
///
/// Horizontal fields count 8-dot character clocks, vertical fields count
/// lines. All durations are "field + 1" except the vertical display start,
/// which the hardware stretches by two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimingRegisters {
    pub hsr: u16,
    pub hdr: u16,
    pub vpr: u16,
    pub vdw: u16,
    pub vcr: u16,
}

pub const HSR_MASK: u16 = 0x7F1F;
pub const HDR_MASK: u16 = 0x7F7F;
pub const VPR_MASK: u16 = 0xFF1F;
pub const VDW_MASK: u16 = 0x01FF;
pub const VCR_MASK: u16 = 0x00FF;

const DOTS_PER_CHARACTER: u16 = 8;

impl Default for TimingRegisters {
    /// 256x240 active area inside a 344-dot, 263-line raster.
    fn default() -> Self {
        Self {
            hsr: 0x0202,
            hdr: 0x041F,
            vpr: 0x0F02,
            vdw: 0x00EF,
            vcr: 0x0002,
        }
    }
}

impl TimingRegisters {
    pub fn hsw_dots(&self) -> u16 {
        ((self.hsr & 0x1F) + 1) * DOTS_PER_CHARACTER
    }

    pub fn hds_dots(&self) -> u16 {
        (((self.hsr >> 8) & 0x7F) + 1) * DOTS_PER_CHARACTER
    }

    pub fn hdw_dots(&self) -> u16 {
        ((self.hdr & 0x7F) + 1) * DOTS_PER_CHARACTER
    }

    pub fn hde_dots(&self) -> u16 {
        (((self.hdr >> 8) & 0x7F) + 1) * DOTS_PER_CHARACTER
    }

    pub fn vsw_lines(&self) -> u16 {
        (self.vpr & 0x1F) + 1
    }

    pub fn vds_lines(&self) -> u16 {
        ((self.vpr >> 8) & 0xFF) + 2
    }

    pub fn vdw_lines(&self) -> u16 {
        (self.vdw & VDW_MASK) + 1
    }

    pub fn vde_lines(&self) -> u16 {
        (self.vcr & VCR_MASK) + 1
    }

    pub fn line_dots(&self) -> u16 {
        self.hsw_dots() + self.hds_dots() + self.hdw_dots() + self.hde_dots()
    }

    pub fn frame_lines(&self) -> u16 {
        self.vsw_lines() + self.vds_lines() + self.vdw_lines() + self.vde_lines()
    }
}

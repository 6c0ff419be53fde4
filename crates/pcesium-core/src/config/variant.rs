use core::{fmt, str::FromStr};

/// Address decode rule for one controller inside the shared I/O page.
///
/// An I/O offset belongs to the controller when `offset & select_mask ==
/// select_value`; the port is then taken from the low two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortWindow {
    pub select_mask: u16,
    pub select_value: u16,
}

/// Size of the VDC I/O page; offsets mirror within it.
const IO_PAGE_MASK: u16 = 0x03FF;

/// Console slot a VDC instance is wired into.
///
/// Dual-controller consoles place two identical VDCs in the same I/O page and
/// tell them apart by address bits 3-4 (bit 3 set belongs to the priority
/// controller in between). Each variant carries its own decode table so the
/// bus can route accesses without knowing about its sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VdcVariant {
    /// Single-controller console; the whole I/O page mirrors the VDC.
    #[default]
    Standalone,
    /// First controller of a dual-controller console.
    SuperGrafxPrimary,
    /// Second controller of a dual-controller console.
    SuperGrafxSecondary,
}

impl VdcVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            VdcVariant::Standalone => "standalone",
            VdcVariant::SuperGrafxPrimary => "sgx-primary",
            VdcVariant::SuperGrafxSecondary => "sgx-secondary",
        }
    }

    pub const fn port_window(self) -> PortWindow {
        match self {
            VdcVariant::Standalone => PortWindow {
                select_mask: 0x0000,
                select_value: 0x0000,
            },
            VdcVariant::SuperGrafxPrimary => PortWindow {
                select_mask: 0x0018,
                select_value: 0x0000,
            },
            VdcVariant::SuperGrafxSecondary => PortWindow {
                select_mask: 0x0018,
                select_value: 0x0010,
            },
        }
    }

    /// Base offset of the controller's first port inside the I/O page.
    pub const fn io_base(self) -> u16 {
        self.port_window().select_value
    }

    /// Whether this controller decodes the given I/O offset.
    pub const fn claims(self, addr: u16) -> bool {
        let window = self.port_window();
        (addr & IO_PAGE_MASK & window.select_mask) == window.select_value
    }
}

impl fmt::Display for VdcVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VdcVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standalone" | "pce" => Ok(VdcVariant::Standalone),
            "sgx-primary" | "vdc1" => Ok(VdcVariant::SuperGrafxPrimary),
            "sgx-secondary" | "vdc2" => Ok(VdcVariant::SuperGrafxSecondary),
            other => Err(format!("unknown vdc variant `{other}`")),
        }
    }
}

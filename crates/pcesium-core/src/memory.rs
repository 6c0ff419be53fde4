//! Shared definitions for the HuC6270 address spaces.
//!
//! The VDC sits behind a four-byte I/O window and owns two private memories:
//! 64 KiB of word-addressed VRAM and the 256-word sprite attribute table.

/// Private VDC memories and hardware capacities.
pub mod vdc {
    /// Number of 16-bit words backed by real VRAM.
    pub const VRAM_WORDS: usize = 0x8000;
    /// Addresses at or above this value are unmapped (open bus on read).
    pub const VRAM_VALID_LIMIT: u16 = VRAM_WORDS as u16;

    /// Number of sprite attribute entries.
    pub const SPRITE_COUNT: usize = 64;
    /// Words per sprite attribute entry.
    pub const SPRITE_ENTRY_WORDS: usize = 4;
    /// Sprite attribute table size in words.
    pub const SPRITE_RAM_WORDS: usize = SPRITE_COUNT * SPRITE_ENTRY_WORDS;

    /// Per-line sprite cell budget (one cell is 16 pixels wide).
    pub const SPRITE_CELLS_PER_LINE: usize = 16;
    /// Per-line background tile slot capacity.
    pub const BG_TILE_SLOTS: usize = 100;

    /// Rows kept in each frame buffer.
    pub const SCREEN_HEIGHT: usize = 263;
    /// Dots kept per frame buffer row.
    pub const MAX_SCREEN_WIDTH: usize = 682;
    /// Pixel value emitted outside the active display and in burst mode.
    pub const BORDER_PIXEL: u16 = 0x100;

    /// Raster counter value of the first active display line.
    pub const FIRST_DISPLAY_RASTER: u16 = 0x40;
    /// Sprite X coordinate of the first active display dot.
    pub const SPRITE_X_ORIGIN: i16 = 32;

    /// Words moved by a sprite attribute table transfer.
    pub const SATB_TRANSFER_WORDS: u16 = SPRITE_RAM_WORDS as u16;
    /// Dots spent per word by the sprite attribute table transfer.
    pub const SATB_DOTS_PER_WORD: u8 = 4;
    /// Scroll-X latch lead ahead of the active display.
    pub const SCROLL_X_LATCH_LEAD: u16 = 16;

    /// Longest horizontal mode the timing registers can describe.
    pub const MAX_H_MODE_DOTS: u16 = 0x80 * 8;
    /// Longest line: a maximal sync pulse plus three maximal modes.
    pub const MAX_LINE_DOTS: u16 = 0x20 * 8 + 3 * MAX_H_MODE_DOTS;
    /// Longest vertical mode (the active display with VDW at its mask).
    pub const MAX_V_MODE_LINES: u16 = 0x200;
    /// Longest frame the vertical timing registers can describe.
    pub const MAX_FRAME_LINES: u16 = 0x20 + (0xFF + 2) + 0x200 + 0x100;
}

/// CPU-facing port layout.
pub mod io {
    /// Mask selecting the port within the VDC window.
    pub const PORT_MASK: u16 = 0x0003;
    /// Width of the register select field written to port 0.
    pub const REGISTER_SELECT_MASK: u8 = 0x1F;

    /// Ports decoded from the low two address bits.
    #[repr(u8)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Port {
        /// Read: status. Write: register select.
        Status = 0,
        /// Unused; reads return zero.
        Unused = 1,
        /// Low byte of the selected register.
        DataLow = 2,
        /// High byte of the selected register.
        DataHigh = 3,
    }

    impl Port {
        /// Resolves the port for an I/O address relative to the VDC window.
        pub const fn from_addr(addr: u16) -> Self {
            match addr & PORT_MASK {
                0 => Self::Status,
                1 => Self::Unused,
                2 => Self::DataLow,
                _ => Self::DataHigh,
            }
        }

        /// Offset of the port within the window.
        pub const fn offset(self) -> u16 {
            self as u16
        }
    }

    /// Register indices reachable through the select port.
    #[repr(u8)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `00` - MAWR, VRAM write address.
        Mawr = 0x00,
        /// `01` - MARR, VRAM read address.
        Marr = 0x01,
        /// `02` - VWR (write) / VRR (read), VRAM data.
        Vram = 0x02,
        /// `05` - CR, control.
        Control = 0x05,
        /// `06` - RCR, raster compare.
        RasterCompare = 0x06,
        /// `07` - BXR, background X scroll.
        ScrollX = 0x07,
        /// `08` - BYR, background Y scroll.
        ScrollY = 0x08,
        /// `09` - MWR, memory width.
        MemoryWidth = 0x09,
        /// `0A` - HSR, horizontal sync.
        HorizontalSync = 0x0A,
        /// `0B` - HDR, horizontal display.
        HorizontalDisplay = 0x0B,
        /// `0C` - VPR, vertical sync.
        VerticalSync = 0x0C,
        /// `0D` - VDW, vertical display width.
        VerticalDisplay = 0x0D,
        /// `0E` - VCR, vertical display end.
        VerticalDisplayEnd = 0x0E,
        /// `0F` - DCR, DMA control.
        DmaControl = 0x0F,
        /// `10` - SOUR, DMA source.
        DmaSource = 0x10,
        /// `11` - DESR, DMA destination.
        DmaDestination = 0x11,
        /// `12` - LENR, DMA length.
        DmaLength = 0x12,
        /// `13` - DVSSR, sprite attribute table source.
        SatbSource = 0x13,
    }

    impl Register {
        /// Every addressable register, in index order.
        pub const ALL: [Register; 18] = [
            Self::Mawr,
            Self::Marr,
            Self::Vram,
            Self::Control,
            Self::RasterCompare,
            Self::ScrollX,
            Self::ScrollY,
            Self::MemoryWidth,
            Self::HorizontalSync,
            Self::HorizontalDisplay,
            Self::VerticalSync,
            Self::VerticalDisplay,
            Self::VerticalDisplayEnd,
            Self::DmaControl,
            Self::DmaSource,
            Self::DmaDestination,
            Self::DmaLength,
            Self::SatbSource,
        ];

        /// Raw select value backing the register.
        pub const fn index(self) -> u8 {
            self as u8
        }

        /// Resolves a select value; unused indices yield `None`.
        pub const fn from_index(index: u8) -> Option<Self> {
            let reg = match index & super::io::REGISTER_SELECT_MASK {
                0x00 => Self::Mawr,
                0x01 => Self::Marr,
                0x02 => Self::Vram,
                0x05 => Self::Control,
                0x06 => Self::RasterCompare,
                0x07 => Self::ScrollX,
                0x08 => Self::ScrollY,
                0x09 => Self::MemoryWidth,
                0x0A => Self::HorizontalSync,
                0x0B => Self::HorizontalDisplay,
                0x0C => Self::VerticalSync,
                0x0D => Self::VerticalDisplay,
                0x0E => Self::VerticalDisplayEnd,
                0x0F => Self::DmaControl,
                0x10 => Self::DmaSource,
                0x11 => Self::DmaDestination,
                0x12 => Self::DmaLength,
                0x13 => Self::SatbSource,
                _ => return None,
            };
            Some(reg)
        }

        /// Short mnemonic used by logs and debugger views.
        pub const fn mnemonic(self) -> &'static str {
            match self {
                Self::Mawr => "MAWR",
                Self::Marr => "MARR",
                Self::Vram => "VWR",
                Self::Control => "CR",
                Self::RasterCompare => "RCR",
                Self::ScrollX => "BXR",
                Self::ScrollY => "BYR",
                Self::MemoryWidth => "MWR",
                Self::HorizontalSync => "HSR",
                Self::HorizontalDisplay => "HDR",
                Self::VerticalSync => "VPR",
                Self::VerticalDisplay => "VDW",
                Self::VerticalDisplayEnd => "VCR",
                Self::DmaControl => "DCR",
                Self::DmaSource => "SOUR",
                Self::DmaDestination => "DESR",
                Self::DmaLength => "LENR",
                Self::SatbSource => "DVSSR",
            }
        }
    }

    impl core::fmt::Display for Register {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.mnemonic())
        }
    }

    impl TryFrom<u8> for Register {
        type Error = crate::error::Error;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            if value > super::io::REGISTER_SELECT_MASK {
                return Err(crate::error::Error::UnknownRegister(value));
            }
            Self::from_index(value).ok_or(crate::error::Error::UnknownRegister(value))
        }
    }
}

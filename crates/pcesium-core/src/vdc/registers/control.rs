use bitflags::bitflags;

bitflags! {
    /// Control register (`CR`, index `05`).
    ///
    /// Bit layout:
    /// ```text
    /// 15..13 12 11 10 9 8 7 6 5 4 3 2 1 0
    ///   .    I  I  D  P P B S s s V R O C
    /// ```
    /// - `C`: sprite 0 collision interrupt enable
    /// - `O`: sprite overflow interrupt enable
    /// - `R`: raster compare interrupt enable
    /// - `V`: vertical blank interrupt enable
    /// - `s s`: external sync mode
    /// - `S`: sprites on
    /// - `B`: background on
    /// - `P P`: DISP output select
    /// - `D`: dynamic RAM refresh
    /// - `I I`: VRAM address increment (1, 32, 64, 128)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u16 {
        const COLLISION_IRQ = 0x0001;
        const OVERFLOW_IRQ = 0x0002;
        const RASTER_IRQ = 0x0004;
        const VBLANK_IRQ = 0x0008;
        const SYNC_MODE = 0x0030;
        const SPRITES = 0x0040;
        const BACKGROUND = 0x0080;
        const DISP_SELECT = 0x0300;
        const DYNAMIC_REFRESH = 0x0400;
        const INCREMENT = 0x1800;
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::empty()
    }
}

impl Control {
    /// Step applied to MAWR/MARR after each data access.
    pub fn vram_increment(self) -> u16 {
        match (self.bits() & Self::INCREMENT.bits()) >> 11 {
            0 => 1,
            1 => 32,
            2 => 64,
            _ => 128,
        }
    }

    pub fn sprites_enabled(self) -> bool {
        self.contains(Self::SPRITES)
    }

    pub fn background_enabled(self) -> bool {
        self.contains(Self::BACKGROUND)
    }

    /// Both layers off: the controller leaves VRAM entirely to the CPU and
    /// outputs the border color.
    pub fn burst_mode(self) -> bool {
        !self.intersects(Self::SPRITES | Self::BACKGROUND)
    }
}

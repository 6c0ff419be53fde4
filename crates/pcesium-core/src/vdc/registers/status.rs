use bitflags::bitflags;

bitflags! {
    /// Status register returned by a port 0 read.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// . B V D S R O C
    /// ```
    /// - `C`: sprite 0 collided with another sprite
    /// - `O`: more sprite cells on a line than the budget allows
    /// - `R`: raster counter matched RCR
    /// - `S`: sprite attribute table transfer finished
    /// - `D`: VRAM-to-VRAM transfer finished
    /// - `V`: vertical blank started
    /// - `B`: a DMA engine holds VRAM
    ///
    /// Bits 0-5 drive the IRQ line and are cleared by a status read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const COLLISION = 0x01;
        const OVERFLOW = 0x02;
        const RASTER = 0x04;
        const SATB_DONE = 0x08;
        const VRAM_DMA_DONE = 0x10;
        const VBLANK = 0x20;
        const BUSY = 0x40;

        const IRQ_SOURCES = 0x3F;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::empty()
    }
}

impl Status {
    pub fn irq_pending(self) -> bool {
        self.intersects(Self::IRQ_SOURCES)
    }
}

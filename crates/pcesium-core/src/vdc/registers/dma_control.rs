use bitflags::bitflags;

bitflags! {
    /// DMA control register (`DCR`, index `0F`).
    ///
    /// Bit layout:
    /// ```text
    /// 4 3 2 1 0
    /// A d s V S
    /// ```
    /// - `S`: interrupt when the SATB transfer finishes
    /// - `V`: interrupt when the VRAM transfer finishes
    /// - `s`: source address decrements
    /// - `d`: destination address decrements
    /// - `A`: repeat the SATB transfer every vertical blank
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DmaControl: u8 {
        const SATB_IRQ = 0b0_0001;
        const VRAM_IRQ = 0b0_0010;
        const SOURCE_DECREMENT = 0b0_0100;
        const DEST_DECREMENT = 0b0_1000;
        const SATB_AUTO = 0b1_0000;
    }
}

impl Default for DmaControl {
    fn default() -> Self {
        Self::empty()
    }
}

impl DmaControl {
    pub fn source_step(self) -> u16 {
        if self.contains(Self::SOURCE_DECREMENT) { 0xFFFF } else { 1 }
    }

    pub fn dest_step(self) -> u16 {
        if self.contains(Self::DEST_DECREMENT) { 0xFFFF } else { 1 }
    }
}

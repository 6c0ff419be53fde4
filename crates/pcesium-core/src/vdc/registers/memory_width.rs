use bitflags::bitflags;

bitflags! {
    /// Memory width register (`MWR`, index `09`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// G H W W s s v v
    /// ```
    /// - `v v`: VRAM access width (3 selects the 2-plane background fetch)
    /// - `s s`: sprite access width (1 selects the 2-plane sprite fetch)
    /// - `W W`: BAT columns (32, 64, 128, 128)
    /// - `H`: BAT rows (32, 64)
    /// - `G`: plane pair used by the 2-plane background fetch
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryWidth: u8 {
        const VRAM_ACCESS = 0b0000_0011;
        const SPRITE_ACCESS = 0b0000_1100;
        const BAT_WIDTH = 0b0011_0000;
        const BAT_HEIGHT = 0b0100_0000;
        const CG_MODE = 0b1000_0000;
    }
}

impl Default for MemoryWidth {
    fn default() -> Self {
        Self::empty()
    }
}

/// Background pattern fetch layout for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BgFetchLayout {
    /// BAT word plus both pattern words (4 planes).
    Planar4,
    /// BAT word plus one pattern word; `high_pair` picks planes 2-3.
    Planar2 { high_pair: bool },
}

impl MemoryWidth {
    pub fn bat_columns(self) -> u16 {
        match (self.bits() & Self::BAT_WIDTH.bits()) >> 4 {
            0 => 32,
            1 => 64,
            _ => 128,
        }
    }

    pub fn bat_rows(self) -> u16 {
        if self.contains(Self::BAT_HEIGHT) { 64 } else { 32 }
    }

    pub fn bg_fetch_layout(self) -> BgFetchLayout {
        if self.bits() & Self::VRAM_ACCESS.bits() == 0b11 {
            BgFetchLayout::Planar2 {
                high_pair: self.contains(Self::CG_MODE),
            }
        } else {
            BgFetchLayout::Planar4
        }
    }

    /// Sprite cells load two pattern words instead of four.
    pub fn sprite_two_plane(self) -> bool {
        (self.bits() & Self::SPRITE_ACCESS.bits()) >> 2 == 1
    }
}

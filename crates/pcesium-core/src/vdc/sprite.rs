use bitflags::bitflags;

bitflags! {
    /// Attribute bits stored in sprite word 3.
    ///
    /// Bit layout:
    /// ```text
    /// 15 14 13 12 11 10 9 8 7 6 5 4 3 2 1 0
    /// V  .  h  h  H  .  . W F . . . p p p p
    /// ```
    /// - `p`: sprite palette (0..=15)
    /// - `F`: drawn in front of the background
    /// - `W`: 32 pixels wide (two cells)
    /// - `H`: horizontal flip
    /// - `h h`: height (16, 32, 64, 64)
    /// - `V`: vertical flip
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct SpriteAttributes: u16 {
        const PALETTE = 0x000F;
        const FRONT = 0x0080;
        const WIDE = 0x0100;
        const FLIP_HORIZONTAL = 0x0800;
        const HEIGHT = 0x3000;
        const FLIP_VERTICAL = 0x8000;
    }
}

/// Read-only view over one sprite attribute table entry.
///
/// Each entry is four words:
/// - word 0: Y (10 bits, 64 is the first active line)
/// - word 1: X (10 bits, 32 is the first active dot)
/// - word 2: pattern index in bits 1-10; bit 0 picks planes 2-3 when the
///   2-plane sprite fetch is active
/// - word 3: attributes (see [`SpriteAttributes`])
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpriteView<'a> {
    words: &'a [u16],
}

impl<'a> SpriteView<'a> {
    const WORDS_PER_SPRITE: usize = 4;

    pub(crate) fn new(words: &'a [u16]) -> Self {
        debug_assert_eq!(words.len(), Self::WORDS_PER_SPRITE);
        Self { words }
    }

    pub(crate) fn y(&self) -> u16 {
        self.words[0] & 0x03FF
    }

    pub(crate) fn x(&self) -> u16 {
        self.words[1] & 0x03FF
    }

    /// Pattern index; each pattern occupies 64 words.
    pub(crate) fn pattern(&self) -> u16 {
        (self.words[2] >> 1) & 0x03FF
    }

    pub(crate) fn high_plane_pair(&self) -> bool {
        self.words[2] & 1 != 0
    }

    pub(crate) fn attributes(&self) -> SpriteAttributes {
        SpriteAttributes::from_bits_retain(self.words[3])
    }

    pub(crate) fn palette(&self) -> u8 {
        (self.words[3] & SpriteAttributes::PALETTE.bits()) as u8
    }

    pub(crate) fn width(&self) -> u16 {
        if self.attributes().contains(SpriteAttributes::WIDE) { 32 } else { 16 }
    }

    pub(crate) fn height(&self) -> u16 {
        match (self.words[3] & SpriteAttributes::HEIGHT.bits()) >> 12 {
            0 => 16,
            1 => 32,
            _ => 64,
        }
    }

    /// Row of the sprite covering raster line `raster`, before flipping.
    pub(crate) fn row_at(&self, raster: u16) -> Option<u16> {
        let row = raster.wrapping_sub(self.y()) & 0x03FF;
        (row < self.height()).then_some(row)
    }

    /// Pattern index of the 16x16 cell at (`cell_x`, `cell_y`).
    ///
    /// Larger sprites ignore the low index bits that the cell position
    /// supplies instead.
    pub(crate) fn cell_pattern(&self, cell_x: u16, cell_y: u16) -> u16 {
        let mut index = self.pattern();
        if self.width() == 32 {
            index &= !1;
        }
        match self.height() {
            32 => index &= !2,
            64 => index &= !6,
            _ => {}
        }
        (index + cell_x + cell_y * 2) & 0x03FF
    }
}

use crate::{mem_block::MemBlock, memory::vdc as vdc_mem};

use super::{
    registers::{BgFetchLayout, MemoryWidth},
    savestate::{BgPipelineState, TileSlotState},
};

/// One fetched background tile: its BAT word and two pattern words.
///
/// Pattern word 0 carries planes 0 (low byte) and 1 (high byte), word 1
/// carries planes 2 and 3. The leftmost pixel lives in bit 7 of each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct TileSlot {
    bat: u16,
    pattern: [u16; 2],
}

impl TileSlot {
    fn palette(&self) -> u8 {
        (self.bat >> 12) as u8
    }

    fn pattern_base(&self) -> u16 {
        (self.bat & 0x0FFF) << 4
    }

    fn color(&self, column: u8) -> u8 {
        let bit = 7 - (column & 7);
        let lo = self.pattern[0];
        let hi = self.pattern[1];
        (((lo >> bit) & 1)
            | (((lo >> (bit + 8)) & 1) << 1)
            | (((hi >> bit) & 1) << 2)
            | (((hi >> (bit + 8)) & 1) << 3)) as u8
    }
}

/// Which word a background fetch slot reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum BgFetchKind {
    Bat,
    /// Planes 0-1.
    Cg0,
    /// Planes 2-3.
    Cg1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BgFetch {
    pub(crate) tile: usize,
    pub(crate) kind: BgFetchKind,
}

/// Dot offsets inside each 8-dot tile period.
const BAT_SLOT: u16 = 1;
const CG0_SLOT: u16 = 5;
const CG1_SLOT: u16 = 7;

type TileSlots = MemBlock<TileSlot, { vdc_mem::BG_TILE_SLOTS }>;

/// Background tile fetcher and pixel source for the current line.
///
/// The fetch window opens with the scroll-X latch, 16 dots ahead of the
/// active area, and runs one tile per 8 dots until the right border starts
/// or the slot capacity is reached. Tiles that miss their fetch slot (a DMA
/// held the port) keep whatever the previous line left in that slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BgPipeline {
    tiles: TileSlots,
    window_open: bool,
    window_start: u16,
    /// BXR as latched for this line.
    scroll_x: u16,
    /// Vertical position of this line inside the BAT, in pixels.
    scroll_y: u16,
}

impl Default for BgPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl BgPipeline {
    pub(crate) fn new() -> Self {
        Self {
            tiles: TileSlots::new(),
            window_open: false,
            window_start: 0,
            scroll_x: 0,
            scroll_y: 0,
        }
    }

    pub(crate) fn scroll_x(&self) -> u16 {
        self.scroll_x
    }

    pub(crate) fn scroll_y(&self) -> u16 {
        self.scroll_y
    }

    /// Latches the line's vertical position.
    ///
    /// The first active line starts at BYR. A line following a BYR write
    /// starts one below the written value; otherwise the previous line's
    /// position advances by one.
    pub(crate) fn latch_scroll_y(&mut self, byr: u16, first_line: bool, byr_written: bool) {
        let y = if first_line {
            byr
        } else if byr_written {
            byr + 1
        } else {
            self.scroll_y + 1
        };
        self.scroll_y = y & 0x01FF;
    }

    /// Latches BXR and opens the fetch window at `dot` when `fetch` is set.
    pub(crate) fn latch_scroll_x(&mut self, bxr: u16, dot: u16, fetch: bool) {
        self.scroll_x = bxr;
        self.window_start = dot;
        self.window_open = fetch;
    }

    /// Replaces the latched scroll-X without moving the window.
    pub(crate) fn relatch_scroll_x(&mut self, bxr: u16) {
        self.scroll_x = bxr;
    }

    pub(crate) fn close_window(&mut self) {
        self.window_open = false;
    }

    /// Fetch scheduled for `dot`, if the window has one there.
    pub(crate) fn fetch_slot(&self, dot: u16, mwr: MemoryWidth) -> Option<BgFetch> {
        if !self.window_open || dot < self.window_start {
            return None;
        }
        let rel = dot - self.window_start;
        let tile = (rel / 8) as usize;
        if tile >= vdc_mem::BG_TILE_SLOTS {
            return None;
        }
        let kind = match (rel % 8, mwr.bg_fetch_layout()) {
            (BAT_SLOT, _) => BgFetchKind::Bat,
            (CG0_SLOT, BgFetchLayout::Planar4) => BgFetchKind::Cg0,
            (CG1_SLOT, BgFetchLayout::Planar4) => BgFetchKind::Cg1,
            (CG0_SLOT, BgFetchLayout::Planar2 { high_pair: false }) => BgFetchKind::Cg0,
            (CG0_SLOT, BgFetchLayout::Planar2 { high_pair: true }) => BgFetchKind::Cg1,
            _ => return None,
        };
        Some(BgFetch { tile, kind })
    }

    /// VRAM word address read by `fetch`.
    pub(crate) fn fetch_address(&self, fetch: BgFetch, mwr: MemoryWidth) -> u16 {
        match fetch.kind {
            BgFetchKind::Bat => {
                let columns = mwr.bat_columns();
                let rows = mwr.bat_rows();
                let row = (self.scroll_y >> 3) & (rows - 1);
                let column = ((self.scroll_x >> 3) + fetch.tile as u16) & (columns - 1);
                row * columns + column
            }
            BgFetchKind::Cg0 => self.tiles[fetch.tile]
                .pattern_base()
                .wrapping_add(self.scroll_y & 7),
            BgFetchKind::Cg1 => self.tiles[fetch.tile]
                .pattern_base()
                .wrapping_add((self.scroll_y & 7) + 8),
        }
    }

    /// Stores a fetched word. A 2-plane layout clears the pair it skips.
    pub(crate) fn store(&mut self, fetch: BgFetch, word: u16, mwr: MemoryWidth) {
        let two_plane = matches!(mwr.bg_fetch_layout(), BgFetchLayout::Planar2 { .. });
        let slot = &mut self.tiles[fetch.tile];
        match fetch.kind {
            BgFetchKind::Bat => slot.bat = word,
            BgFetchKind::Cg0 => {
                slot.pattern[0] = word;
                if two_plane {
                    slot.pattern[1] = 0;
                }
            }
            BgFetchKind::Cg1 => {
                slot.pattern[1] = word;
                if two_plane {
                    slot.pattern[0] = 0;
                }
            }
        }
    }

    /// Background pixel at active-area column `x`: `(palette, color)`.
    pub(crate) fn pixel(&self, x: u16) -> (u8, u8) {
        let scrolled = x + (self.scroll_x & 7);
        let tile = (scrolled / 8) as usize;
        if tile >= vdc_mem::BG_TILE_SLOTS {
            return (0, 0);
        }
        let slot = &self.tiles[tile];
        (slot.palette(), slot.color(scrolled as u8))
    }

    pub(crate) fn save_state(&self) -> BgPipelineState {
        BgPipelineState {
            tiles: self
                .tiles
                .iter()
                .map(|t| TileSlotState {
                    bat: t.bat,
                    pattern: t.pattern,
                })
                .collect(),
            window_open: self.window_open,
            window_start: self.window_start,
            scroll_x: self.scroll_x,
            scroll_y: self.scroll_y,
        }
    }

    pub(crate) fn load_state(&mut self, state: &BgPipelineState) {
        for (slot, saved) in self.tiles.iter_mut().zip(state.tiles.iter()) {
            *slot = TileSlot {
                bat: saved.bat,
                pattern: saved.pattern,
            };
        }
        self.window_open = state.window_open;
        self.window_start = state.window_start;
        self.scroll_x = state.scroll_x;
        self.scroll_y = state.scroll_y;
    }
}

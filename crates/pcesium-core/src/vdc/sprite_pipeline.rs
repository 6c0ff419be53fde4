use crate::{
    mem_block::MemBlock,
    memory::vdc::{self as vdc_mem, SPRITE_X_ORIGIN},
};

use super::{
    savestate::{SpriteCellState, SpritePipelineState},
    sprite::{SpriteAttributes, SpriteView},
};

/// One 16-pixel-wide slice of a sprite selected for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct SpriteCell {
    /// Sprite attribute table entry this cell came from.
    index: u8,
    /// Left edge relative to the first active dot.
    x: i16,
    /// Address of plane 0 for the selected row.
    addr: u16,
    palette: u8,
    front: bool,
    flip_h: bool,
    /// 2-plane fetch reads planes 2-3 instead of 0-1.
    high_pair: bool,
    planes: [u16; 4],
}

impl SpriteCell {
    fn color(&self, column: u16) -> u8 {
        let bit = if self.flip_h { column } else { 15 - column };
        let [p0, p1, p2, p3] = self.planes;
        (((p0 >> bit) & 1) | (((p1 >> bit) & 1) << 1) | (((p2 >> bit) & 1) << 2) | (((p3 >> bit) & 1) << 3))
            as u8
    }

    fn to_state(self) -> SpriteCellState {
        SpriteCellState {
            index: self.index,
            x: self.x,
            addr: self.addr,
            palette: self.palette,
            front: self.front,
            flip_h: self.flip_h,
            high_pair: self.high_pair,
            planes: self.planes,
        }
    }

    fn from_state(state: &SpriteCellState) -> Self {
        Self {
            index: state.index,
            x: state.x,
            addr: state.addr,
            palette: state.palette,
            front: state.front,
            flip_h: state.flip_h,
            high_pair: state.high_pair,
            planes: state.planes,
        }
    }
}

/// Opaque sprite pixel chosen for a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpritePixel {
    pub(crate) palette: u8,
    /// Color index within the palette (1..=15).
    pub(crate) color: u8,
    /// Drawn over opaque background pixels.
    pub(crate) front: bool,
}

/// Result of sampling all cells at one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SpriteSample {
    pub(crate) pixel: Option<SpritePixel>,
    /// Sprite 0 and another sprite are both opaque here.
    pub(crate) collision: bool,
}

type SpriteCells = MemBlock<SpriteCell, { vdc_mem::SPRITE_CELLS_PER_LINE }>;

/// Sprite evaluation, pattern loading and per-dot sampling.
///
/// Evaluation runs when the right border of line N starts and picks cells
/// for line N+1. The load pass then fetches one pattern word per granted
/// dot until the scroll-X latch of line N+1, when whatever finished loading
/// becomes the draw list. Cells still incomplete at that point are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SpritePipeline {
    eval: SpriteCells,
    eval_count: u8,
    /// Words per cell for the current load pass (4, or 2 in 2-plane mode).
    words_per_cell: u8,
    load_cell: u8,
    load_word: u8,
    draw: SpriteCells,
    draw_count: u8,
    draw_has_sprite0: bool,
}

impl Default for SpritePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SpritePipeline {
    pub(crate) fn new() -> Self {
        Self {
            eval: SpriteCells::new(),
            eval_count: 0,
            words_per_cell: 4,
            load_cell: 0,
            load_word: 0,
            draw: SpriteCells::new(),
            draw_count: 0,
            draw_has_sprite0: false,
        }
    }

    /// Drops any pending evaluation and load pass.
    pub(crate) fn clear_evaluation(&mut self) {
        self.eval_count = 0;
        self.load_cell = 0;
        self.load_word = 0;
    }

    /// Selects the cells covering raster line `raster` in table order.
    ///
    /// Returns `true` when a cell had to be left out because the line budget
    /// was already spent.
    pub(crate) fn evaluate(&mut self, sprite_ram: &[u16], raster: u16, two_plane: bool) -> bool {
        self.clear_evaluation();
        self.words_per_cell = if two_plane { 2 } else { 4 };
        let mut count = 0usize;

        for (index, words) in sprite_ram
            .chunks_exact(vdc_mem::SPRITE_ENTRY_WORDS)
            .enumerate()
        {
            let sprite = SpriteView::new(words);
            let Some(mut row) = sprite.row_at(raster) else {
                continue;
            };
            let attrs = sprite.attributes();
            if attrs.contains(SpriteAttributes::FLIP_VERTICAL) {
                row = sprite.height() - 1 - row;
            }
            let flip_h = attrs.contains(SpriteAttributes::FLIP_HORIZONTAL);
            let cells = sprite.width() / 16;

            for cx in 0..cells {
                if count == vdc_mem::SPRITE_CELLS_PER_LINE {
                    self.eval_count = count as u8;
                    return true;
                }
                let pattern_x = if flip_h { cells - 1 - cx } else { cx };
                let pattern = sprite.cell_pattern(pattern_x, row >> 4);
                self.eval[count] = SpriteCell {
                    index: index as u8,
                    x: sprite.x() as i16 - SPRITE_X_ORIGIN + (cx as i16) * 16,
                    addr: (pattern << 6).wrapping_add(row & 0x0F),
                    palette: sprite.palette(),
                    front: attrs.contains(SpriteAttributes::FRONT),
                    flip_h,
                    high_pair: sprite.high_plane_pair(),
                    planes: [0; 4],
                };
                count += 1;
            }
        }

        self.eval_count = count as u8;
        false
    }

    pub(crate) fn evaluated_cells(&self) -> u8 {
        self.eval_count
    }

    /// Address of the next pattern word the load pass wants.
    pub(crate) fn next_fetch(&self) -> Option<u16> {
        if self.load_cell >= self.eval_count {
            return None;
        }
        let cell = &self.eval[self.load_cell as usize];
        let plane = if self.words_per_cell == 2 {
            let base = if cell.high_pair { 2 } else { 0 };
            base + self.load_word as u16
        } else {
            self.load_word as u16
        };
        Some(cell.addr.wrapping_add(plane * 16))
    }

    /// Stores the word fetched for [`Self::next_fetch`].
    pub(crate) fn store_fetch(&mut self, word: u16) {
        if self.load_cell >= self.eval_count {
            return;
        }
        let cell = &mut self.eval[self.load_cell as usize];
        let plane = if self.words_per_cell == 2 && cell.high_pair {
            2 + self.load_word as usize
        } else {
            self.load_word as usize
        };
        cell.planes[plane] = word;
        self.load_word += 1;
        if self.load_word == self.words_per_cell {
            self.load_word = 0;
            self.load_cell += 1;
        }
    }

    /// Hands fully loaded cells to the drawer and closes the load pass.
    pub(crate) fn promote(&mut self) {
        let loaded = self.load_cell as usize;
        self.draw[..loaded].copy_from_slice(&self.eval[..loaded]);
        self.draw_count = loaded as u8;
        self.draw_has_sprite0 = self.draw[..loaded].iter().any(|c| c.index == 0);
        self.clear_evaluation();
    }

    pub(crate) fn draw_count(&self) -> u8 {
        self.draw_count
    }

    /// Samples the draw list at active-area column `x`.
    ///
    /// The first opaque cell in table order wins. Collision is only worked
    /// out when `detect_collision` is set and sprite 0 is on the line.
    pub(crate) fn sample(&self, x: u16, detect_collision: bool) -> SpriteSample {
        let mut sample = SpriteSample::default();
        let check = detect_collision && self.draw_has_sprite0;
        let mut sprite0_opaque = false;
        let mut other_opaque = false;
        let x = x as i16;

        for cell in &self.draw[..self.draw_count as usize] {
            let column = x - cell.x;
            if !(0..16).contains(&column) {
                continue;
            }
            let color = cell.color(column as u16);
            if color == 0 {
                continue;
            }
            if sample.pixel.is_none() {
                sample.pixel = Some(SpritePixel {
                    palette: cell.palette,
                    color,
                    front: cell.front,
                });
                if !check {
                    break;
                }
            }
            if cell.index == 0 {
                sprite0_opaque = true;
            } else {
                other_opaque = true;
            }
            if sprite0_opaque && other_opaque {
                sample.collision = true;
                break;
            }
        }
        sample
    }

    pub(crate) fn save_state(&self) -> SpritePipelineState {
        SpritePipelineState {
            eval: self.eval[..self.eval_count as usize]
                .iter()
                .map(|c| c.to_state())
                .collect(),
            words_per_cell: self.words_per_cell,
            load_cell: self.load_cell,
            load_word: self.load_word,
            draw: self.draw[..self.draw_count as usize]
                .iter()
                .map(|c| c.to_state())
                .collect(),
        }
    }

    pub(crate) fn load_state(&mut self, state: &SpritePipelineState) {
        self.eval_count = 0;
        for (slot, saved) in self.eval.iter_mut().zip(state.eval.iter()) {
            *slot = SpriteCell::from_state(saved);
            self.eval_count += 1;
        }
        self.words_per_cell = state.words_per_cell;
        self.load_cell = state.load_cell;
        self.load_word = state.load_word;
        self.draw_count = 0;
        for (slot, saved) in self.draw.iter_mut().zip(state.draw.iter()) {
            *slot = SpriteCell::from_state(saved);
            self.draw_count += 1;
        }
        self.draw_has_sprite0 = self.draw[..self.draw_count as usize]
            .iter()
            .any(|c| c.index == 0);
    }
}

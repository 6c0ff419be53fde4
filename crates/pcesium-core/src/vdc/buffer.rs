//! Double-buffered raster output.
//!
//! The controller writes one `u16` per dot into the current buffer: the low
//! 9 bits are a VCE palette index (bit 8 set for sprite palettes and the
//! border). When a frame completes the buffers swap, so consumers read the
//! previous buffer while the next frame is drawn.
//!
//! Alongside the pixels each row records the VCE clock divider in effect
//! when the row started, so the encoder can decode lines drawn at different
//! dot clocks.

use crate::memory::vdc::{BORDER_PIXEL, MAX_SCREEN_WIDTH, SCREEN_HEIGHT};

const FRAME_LEN: usize = SCREEN_HEIGHT * MAX_SCREEN_WIDTH;

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct FrameBuffers {
    pixels: [Box<[u16]>; 2],
    dividers: [Box<[u8]>; 2],
    current: usize,
}

impl core::fmt::Debug for FrameBuffers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffers")
            .field("current", &self.current)
            .field("width", &MAX_SCREEN_WIDTH)
            .field("height", &SCREEN_HEIGHT)
            .finish()
    }
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffers {
    pub(crate) fn new() -> Self {
        Self {
            pixels: [
                vec![BORDER_PIXEL; FRAME_LEN].into_boxed_slice(),
                vec![BORDER_PIXEL; FRAME_LEN].into_boxed_slice(),
            ],
            dividers: [
                vec![0; SCREEN_HEIGHT].into_boxed_slice(),
                vec![0; SCREEN_HEIGHT].into_boxed_slice(),
            ],
            current: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        for buf in &mut self.pixels {
            buf.fill(BORDER_PIXEL);
        }
        for div in &mut self.dividers {
            div.fill(0);
        }
        self.current = 0;
    }

    /// Writes a dot; positions outside the stored raster are discarded.
    #[inline]
    pub(crate) fn put(&mut self, row: u16, column: u16, pixel: u16) {
        let (row, column) = (row as usize, column as usize);
        if row < SCREEN_HEIGHT && column < MAX_SCREEN_WIDTH {
            self.pixels[self.current][row * MAX_SCREEN_WIDTH + column] = pixel;
        }
    }

    pub(crate) fn set_row_divider(&mut self, row: u16, divider: u8) {
        if let Some(slot) = self.dividers[self.current].get_mut(row as usize) {
            *slot = divider;
        }
    }

    pub(crate) fn swap(&mut self) {
        self.current ^= 1;
    }

    pub(crate) fn current(&self) -> &[u16] {
        &self.pixels[self.current]
    }

    pub(crate) fn previous(&self) -> &[u16] {
        &self.pixels[self.current ^ 1]
    }

    pub(crate) fn row(&self, row: usize) -> Option<&[u16]> {
        (row < SCREEN_HEIGHT)
            .then(|| &self.pixels[self.current][row * MAX_SCREEN_WIDTH..(row + 1) * MAX_SCREEN_WIDTH])
    }

    pub(crate) fn current_dividers(&self) -> &[u8] {
        &self.dividers[self.current]
    }

    pub(crate) fn previous_dividers(&self) -> &[u8] {
        &self.dividers[self.current ^ 1]
    }
}

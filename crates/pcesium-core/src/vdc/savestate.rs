#[cfg(feature = "savestate-serde")]
use serde::{Deserialize, Serialize};

use super::{
    arbiter::{CpuAccess, Grant},
    timing::{HMode, VMode, VdcEvent},
};

/// Raw register file contents.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistersState {
    pub select: u8,
    pub mawr: u16,
    pub marr: u16,
    pub vwr: u16,
    pub vrr: u16,
    pub control: u16,
    pub rcr: u16,
    pub bxr: u16,
    pub byr: u16,
    pub mwr: u8,
    pub hsr: u16,
    pub hdr: u16,
    pub vpr: u16,
    pub vdw: u16,
    pub vcr: u16,
    pub dcr: u8,
    pub sour: u16,
    pub desr: u16,
    pub lenr: u16,
    pub dvssr: u16,
    pub status: u8,
}

/// Position within the raster plus the pending event.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingState {
    pub h_mode: HMode,
    pub h_mode_len: u16,
    pub h_mode_elapsed: u16,
    pub h_clock: u16,
    pub v_mode: VMode,
    pub v_mode_len: u16,
    pub v_mode_elapsed: u16,
    pub scanline: u16,
    pub frame_count: u64,
    pub raster_counter: u16,
    pub next_event: VdcEvent,
    pub event_countdown: u16,
    /// Bit per event already dispatched on this line.
    pub fired: u8,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenBusState {
    pub value: u16,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArbiterState {
    pub open_bus: OpenBusState,
    pub pending: Option<CpuAccess>,
    pub grant: Grant,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileSlotState {
    pub bat: u16,
    pub pattern: [u16; 2],
}

/// In-flight background line: fetched tiles, window and latched scroll.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BgPipelineState {
    pub tiles: Vec<TileSlotState>,
    pub window_open: bool,
    pub window_start: u16,
    pub scroll_x: u16,
    pub scroll_y: u16,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteCellState {
    pub index: u8,
    pub x: i16,
    pub addr: u16,
    pub palette: u8,
    pub front: bool,
    pub flip_h: bool,
    pub high_pair: bool,
    pub planes: [u16; 4],
}

/// Cells being loaded for the next line and cells drawn on this one.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpritePipelineState {
    pub eval: Vec<SpriteCellState>,
    pub words_per_cell: u8,
    pub load_cell: u8,
    pub load_word: u8,
    pub draw: Vec<SpriteCellState>,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramDmaState {
    pub active: bool,
    pub write_phase: bool,
    pub buffer: u16,
    pub deferred: bool,
}

#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SatbDmaState {
    pub active: bool,
    pub requested: bool,
    pub source: u16,
    pub index: u16,
    pub phase: u8,
}

/// Cross-line flags owned by the controller itself.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchState {
    pub byr_written: bool,
    pub y_latch_first_line: bool,
    pub x_latched_at: Option<u16>,
    pub y_latched_at: Option<u16>,
    pub vblank_armed: bool,
    pub need_vblank_irq: bool,
}

use super::{
    arbiter::{CpuAccess, Grant},
    registers::Status,
    savestate::RegistersState,
    timing::{HMode, VMode, VdcEvent},
};

/// Read-only view of the controller for register and timing inspectors.
///
/// Taking one has no side effects; the status byte is captured the way
/// [`super::Vdc::peek_status`] reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdcDebugState {
    pub registers: RegistersState,
    pub status: Status,
    pub h_mode: HMode,
    pub v_mode: VMode,
    pub h_clock: u16,
    pub scanline: u16,
    pub frame_count: u64,
    pub raster_counter: u16,
    pub next_event: VdcEvent,
    pub event_countdown: u16,
    /// Scroll values latched for the line being drawn.
    pub latched_scroll_x: u16,
    pub latched_scroll_y: u16,
    /// Sprite cells selected for the next line.
    pub evaluated_sprite_cells: u8,
    /// Sprite cells drawn on the current line.
    pub drawn_sprite_cells: u8,
    pub vram_dma_active: bool,
    pub vram_dma_deferred: bool,
    pub satb_dma_active: bool,
    pub satb_dma_requested: bool,
    pub pending_cpu_access: Option<CpuAccess>,
    /// Port holder for the last executed dot.
    pub grant: Grant,
    pub open_bus: u16,
    pub clock_divider: u8,
}

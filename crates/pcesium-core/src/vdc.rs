//! HuC6270 video display controller.
//!
//! [`Vdc::exec`] advances the controller by one dot. Within a dot the work
//! runs in a fixed order: due timing events are dispatched, the VRAM port is
//! granted to at most one agent, the output pixel is composed, and finally
//! the horizontal/vertical state machine moves on. The CPU-facing register
//! interface ([`Vdc::read`]/[`Vdc::write`]) and the debugger entry points share
//! the same path, so tooling sees the same timing side effects as the bus.

mod arbiter;
mod background_pipeline;
mod buffer;
mod debug_state;
mod dma;
mod open_bus;
mod registers;
pub mod savestate;
mod sprite;
mod sprite_pipeline;
mod timing;

use core::fmt;

use crate::{
    config::{VdcConfig, VramDmaStart},
    error::Error,
    memory::{
        io::{Port, REGISTER_SELECT_MASK, Register},
        vdc::{self as vdc_mem, BORDER_PIXEL},
    },
    observer::{ObserverStack, VdcObserver},
};

pub use arbiter::{AccessKind, AccessOrigin, CpuAccess, Grant, VramAccess};
pub use debug_state::VdcDebugState;
pub use registers::{BgFetchLayout, Control, DmaControl, MemoryWidth, Status, TimingRegisters};
pub use timing::{HMode, VMode, VdcEvent};

use arbiter::VramArbiter;
use background_pipeline::BgPipeline;
use buffer::FrameBuffers;
use dma::{DmaTick, SatbDma, VramDma};
use registers::Registers;
use savestate::LatchState;
use sprite_pipeline::SpritePipeline;
use timing::{Advance, Timing};

/// Clock divider assumed until the colour encoder reports one (5.37 MHz).
pub const DEFAULT_CLOCK_DIVIDER: u8 = 4;

/// Palette bank bit carried by sprite pixels.
const SPRITE_PIXEL: u16 = 0x100;

/// Upper bound on dots spent waiting for a queued CPU access to be granted.
const STALL_GUARD_DOTS: u32 = 1 << 20;

pub struct Vdc {
    pub(crate) config: VdcConfig,
    pub(crate) regs: Registers,
    pub(crate) timing: Timing,
    pub(crate) arbiter: VramArbiter,
    pub(crate) bg: BgPipeline,
    pub(crate) sprites: SpritePipeline,
    pub(crate) vram_dma: VramDma,
    pub(crate) satb_dma: SatbDma,
    pub(crate) latch: LatchState,
    /// Divider reported by the colour encoder, recorded per row.
    pub(crate) clock_divider: u8,
    /// Dots the register interface spent waiting on the VRAM port.
    pub(crate) stall_dots: u32,
    frames: FrameBuffers,
    observers: ObserverStack,
}

impl fmt::Debug for Vdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vdc")
            .field("variant", &self.config.variant)
            .field("scanline", &self.timing.scanline())
            .field("h_clock", &self.timing.h_clock())
            .field("h_mode", &self.timing.h_mode())
            .field("v_mode", &self.timing.v_mode())
            .field("frame", &self.timing.frame_count())
            .field("status", &self.regs.status)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Vdc {
    fn default() -> Self {
        Self::new()
    }
}

impl Vdc {
    /// Powered-on standalone controller with no observers attached.
    pub fn new() -> Self {
        Self::with_config(VdcConfig::default())
    }

    pub fn with_config(config: VdcConfig) -> Self {
        Self::with_observers(config, ObserverStack::new())
    }

    /// Builds a controller with debugger subscribers attached up front.
    pub fn with_observers(config: VdcConfig, observers: ObserverStack) -> Self {
        let regs = Registers::new();
        let timing = Timing::new(&regs.timing);
        let mut vdc = Self {
            config,
            regs,
            timing,
            arbiter: VramArbiter::new(),
            bg: BgPipeline::new(),
            sprites: SpritePipeline::new(),
            vram_dma: VramDma::new(),
            satb_dma: SatbDma::new(),
            latch: LatchState::default(),
            clock_divider: DEFAULT_CLOCK_DIVIDER,
            stall_dots: 0,
            frames: FrameBuffers::new(),
            observers,
        };
        vdc.frames.set_row_divider(0, vdc.clock_divider);
        vdc
    }

    /// Returns the controller to its power-on state.
    ///
    /// Configuration and attached observers survive; memories, registers and
    /// both frame buffers are cleared.
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.timing = Timing::new(&self.regs.timing);
        self.arbiter.reset();
        self.bg = BgPipeline::new();
        self.sprites = SpritePipeline::new();
        self.vram_dma = VramDma::new();
        self.satb_dma = SatbDma::new();
        self.latch = LatchState::default();
        self.stall_dots = 0;
        self.frames.reset();
        self.frames.set_row_divider(0, self.clock_divider);
        tracing::debug!(variant = %self.config.variant, "vdc reset");
    }

    pub fn config(&self) -> VdcConfig {
        self.config
    }

    /// Whether this controller decodes the given I/O offset.
    pub fn claims(&self, addr: u16) -> bool {
        self.config.variant.claims(addr)
    }

    /// Advances the controller by exactly one dot.
    pub fn exec(&mut self) {
        self.arbiter.begin_dot();

        while self.timing.event_due() {
            let event = self.timing.take_event();
            self.dispatch(event);
            self.timing.schedule(&self.regs.timing);
        }

        self.service_vram();

        let (line, dot) = (self.timing.scanline(), self.timing.h_clock());
        let pixel = self.compose();
        self.frames.put(line, dot, pixel);
        if !self.observers.is_empty() {
            self.observers.on_dot(line, dot, pixel);
        }

        let step = self.timing.advance(&self.regs.timing);
        self.after_advance(step);
    }

    pub fn run_dots(&mut self, dots: u32) {
        for _ in 0..dots {
            self.exec();
        }
    }

    /// Runs until the current frame completes.
    pub fn run_frame(&mut self) {
        let frame = self.timing.frame_count();
        while self.timing.frame_count() == frame {
            self.exec();
        }
    }

    /// CPU read from the controller's I/O window.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.read_port(AccessOrigin::Cpu, addr)
    }

    /// CPU write to the controller's I/O window.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.write_port(AccessOrigin::Cpu, addr, value);
    }

    /// Debugger read with the same side effects as a CPU read.
    pub fn debug_read(&mut self, addr: u16) -> u8 {
        self.read_port(AccessOrigin::Debugger, addr)
    }

    /// Debugger write with the same side effects as a CPU write.
    pub fn debug_write(&mut self, addr: u16, value: u8) {
        self.write_port(AccessOrigin::Debugger, addr, value);
    }

    /// Status byte as a port 0 read would return it, without clearing flags.
    pub fn peek_status(&self) -> u8 {
        let mut status = self.regs.status;
        if self.vram_dma.is_active() || self.satb_dma.is_active() {
            status.insert(Status::BUSY);
        }
        status.bits()
    }

    /// Level of the interrupt output.
    pub fn irq_pending(&self) -> bool {
        self.regs.status.irq_pending()
    }

    /// A CPU access is queued and has not been granted the VRAM port yet.
    pub fn is_vram_access_blocked(&self) -> bool {
        self.arbiter.has_pending()
    }

    /// Returns and clears the dots the register interface spent stalled.
    pub fn take_stall_dots(&mut self) -> u32 {
        core::mem::take(&mut self.stall_dots)
    }

    /// Frame currently being drawn, `MAX_SCREEN_WIDTH` pixels per row.
    pub fn screen_buffer(&self) -> &[u16] {
        self.frames.current()
    }

    /// Last completed frame.
    pub fn previous_screen_buffer(&self) -> &[u16] {
        self.frames.previous()
    }

    /// One row of the frame being drawn.
    pub fn row_buffer(&self, row: usize) -> Option<&[u16]> {
        self.frames.row(row)
    }

    pub fn row_clock_dividers(&self) -> &[u8] {
        self.frames.current_dividers()
    }

    pub fn previous_row_clock_dividers(&self) -> &[u8] {
        self.frames.previous_dividers()
    }

    /// Records the colour encoder's dot clock divider from the next row on.
    pub fn set_clock_divider(&mut self, divider: u8) {
        self.clock_divider = divider;
    }

    pub fn h_clock(&self) -> u16 {
        self.timing.h_clock()
    }

    pub fn scanline(&self) -> u16 {
        self.timing.scanline()
    }

    pub fn frame_count(&self) -> u64 {
        self.timing.frame_count()
    }

    /// Current value of register `index` without side effects.
    pub fn peek_register(&self, index: u8) -> Result<u16, Error> {
        let reg = Register::try_from(index)?;
        Ok(self.regs.value(reg))
    }

    pub fn peek_vram(&self, addr: u32) -> Result<u16, Error> {
        self.arbiter
            .vram()
            .get(addr as usize)
            .copied()
            .ok_or(Error::VramOutOfRange {
                addr,
                size: vdc_mem::VRAM_WORDS,
            })
    }

    /// Writes VRAM directly, bypassing the port and its timing.
    pub fn poke_vram(&mut self, addr: u32, value: u16) -> Result<(), Error> {
        let Some(slot) = self.arbiter.vram_mut().get_mut(addr as usize) else {
            tracing::warn!(addr, "debugger vram poke out of range");
            return Err(Error::VramOutOfRange {
                addr,
                size: vdc_mem::VRAM_WORDS,
            });
        };
        *slot = value;
        if !self.observers.is_empty() {
            self.observers.on_vram_access(&VramAccess {
                origin: AccessOrigin::Debugger,
                kind: AccessKind::Write,
                addr: addr as u16,
                value,
            });
        }
        Ok(())
    }

    pub fn peek_sprite_ram(&self, addr: u32) -> Result<u16, Error> {
        self.arbiter
            .sprite_ram()
            .get(addr as usize)
            .copied()
            .ok_or(Error::SpriteRamOutOfRange {
                addr,
                size: vdc_mem::SPRITE_RAM_WORDS,
            })
    }

    pub fn poke_sprite_ram(&mut self, addr: u32, value: u16) -> Result<(), Error> {
        let Some(slot) = self.arbiter.sprite_ram_mut().get_mut(addr as usize) else {
            tracing::warn!(addr, "debugger sprite ram poke out of range");
            return Err(Error::SpriteRamOutOfRange {
                addr,
                size: vdc_mem::SPRITE_RAM_WORDS,
            });
        };
        *slot = value;
        Ok(())
    }

    pub fn debug_state(&self) -> VdcDebugState {
        VdcDebugState {
            registers: self.regs.save_state(),
            status: Status::from_bits_retain(self.peek_status()),
            h_mode: self.timing.h_mode(),
            v_mode: self.timing.v_mode(),
            h_clock: self.timing.h_clock(),
            scanline: self.timing.scanline(),
            frame_count: self.timing.frame_count(),
            raster_counter: self.timing.raster_counter(),
            next_event: self.timing.next_event(),
            event_countdown: self.timing.event_countdown(),
            latched_scroll_x: self.bg.scroll_x(),
            latched_scroll_y: self.bg.scroll_y(),
            evaluated_sprite_cells: self.sprites.evaluated_cells(),
            drawn_sprite_cells: self.sprites.draw_count(),
            vram_dma_active: self.vram_dma.is_active(),
            vram_dma_deferred: self.vram_dma.is_deferred(),
            satb_dma_active: self.satb_dma.is_active(),
            satb_dma_requested: self.satb_dma.is_requested(),
            pending_cpu_access: self.arbiter.pending(),
            grant: self.arbiter.grant(),
            open_bus: self.arbiter.open_bus(),
            clock_divider: self.clock_divider,
        }
    }

    pub fn observers(&self) -> &ObserverStack {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut ObserverStack {
        &mut self.observers
    }

    fn read_port(&mut self, origin: AccessOrigin, addr: u16) -> u8 {
        let port = Port::from_addr(addr);
        let value = match port {
            Port::Status => {
                let value = self.peek_status();
                self.regs.status.remove(Status::IRQ_SOURCES);
                value
            }
            Port::Unused => 0,
            Port::DataLow => self.regs.vrr as u8,
            Port::DataHigh => {
                let value = (self.regs.vrr >> 8) as u8;
                if self.regs.selected() == Some(Register::Vram) {
                    self.queue_vram_read(origin);
                }
                value
            }
        };
        if !self.observers.is_empty() {
            self.observers.on_register_read(origin, port, value);
        }
        value
    }

    fn write_port(&mut self, origin: AccessOrigin, addr: u16, value: u8) {
        let port = Port::from_addr(addr);
        if !self.observers.is_empty() {
            self.observers.on_register_write(origin, port, value);
        }
        match port {
            Port::Status => self.regs.select = value & REGISTER_SELECT_MASK,
            Port::Unused => {}
            Port::DataLow => self.write_data(origin, value, false),
            Port::DataHigh => self.write_data(origin, value, true),
        }
    }

    fn write_data(&mut self, origin: AccessOrigin, value: u8, msb: bool) {
        let Some(reg) = self.regs.selected() else {
            tracing::trace!(select = self.regs.select, value, "write to unassigned register ignored");
            return;
        };
        tracing::trace!(
            register = %reg,
            msb,
            value = format_args!("{value:#04X}"),
            scanline = self.timing.scanline(),
            h_clock = self.timing.h_clock(),
            "vdc register write"
        );
        self.regs.store_byte(reg, value, msb);

        match reg {
            Register::Marr if msb => self.queue_vram_read(origin),
            Register::Vram if msb => self.queue_vram_write(origin),
            Register::ScrollX => self.relatch_scroll_x(),
            Register::ScrollY => {
                self.latch.byr_written = true;
                self.relatch_scroll_y();
            }
            Register::HorizontalSync | Register::HorizontalDisplay => {
                self.timing.schedule(&self.regs.timing);
            }
            Register::DmaLength if msb => self.start_vram_dma(),
            Register::SatbSource if msb => {
                tracing::debug!(source = format_args!("{:#06X}", self.regs.dvssr), "satb dma requested");
                self.satb_dma.request();
            }
            _ => {}
        }
    }

    /// Queues a read of MARR, which then advances by the CR increment.
    fn queue_vram_read(&mut self, origin: AccessOrigin) {
        let addr = self.regs.marr;
        self.queue_cpu_access(CpuAccess::Read { addr, origin });
        self.regs.marr = addr.wrapping_add(self.regs.control.vram_increment());
    }

    /// Queues a write of VWR at MAWR, which then advances by the CR increment.
    fn queue_vram_write(&mut self, origin: AccessOrigin) {
        let addr = self.regs.mawr;
        self.queue_cpu_access(CpuAccess::Write {
            addr,
            value: self.regs.vwr,
            origin,
        });
        self.regs.mawr = addr.wrapping_add(self.regs.control.vram_increment());
    }

    /// The port holds one CPU access; a second one waits for the first by
    /// clocking the controller forward and charging those dots as a stall.
    fn queue_cpu_access(&mut self, access: CpuAccess) {
        let mut waited = 0;
        while self.arbiter.has_pending() {
            if waited == STALL_GUARD_DOTS {
                tracing::error!(
                    pending = ?self.arbiter.pending(),
                    waited,
                    "queued vram access never granted; dropping it"
                );
                self.arbiter.abandon_pending();
                break;
            }
            self.exec();
            waited += 1;
        }
        self.stall_dots = self.stall_dots.saturating_add(waited);
        self.arbiter.enqueue(access);
    }

    fn start_vram_dma(&mut self) {
        let hold = self.config.vram_dma_start == VramDmaStart::VerticalBlank
            && self.timing.v_mode() == VMode::Vdw;
        tracing::debug!(
            source = format_args!("{:#06X}", self.regs.sour),
            dest = format_args!("{:#06X}", self.regs.desr),
            len = self.regs.lenr as u32 + 1,
            deferred = hold,
            "vram dma armed"
        );
        if hold {
            self.vram_dma.defer();
        } else {
            self.vram_dma.start();
        }
    }

    /// A scroll write on the dot right after its latch replaces the value
    /// the latch picked up.
    fn written_on_latch_dot(&self, latched_at: Option<u16>) -> bool {
        latched_at.is_some_and(|dot| dot.wrapping_add(1) == self.timing.h_clock())
    }

    fn relatch_scroll_x(&mut self) {
        if self.written_on_latch_dot(self.latch.x_latched_at) {
            self.bg.relatch_scroll_x(self.regs.bxr);
        }
    }

    fn relatch_scroll_y(&mut self) {
        if self.written_on_latch_dot(self.latch.y_latched_at) {
            self.bg
                .latch_scroll_y(self.regs.byr, self.latch.y_latch_first_line, true);
            self.latch.byr_written = false;
        }
    }

    fn raise_irq(&mut self, source: Status) {
        if self.regs.status.contains(source) {
            return;
        }
        self.regs.status.insert(source);
        if !self.observers.is_empty() {
            self.observers.on_irq(source);
        }
    }

    fn dispatch(&mut self, event: VdcEvent) {
        let dot = self.timing.h_clock();
        match event {
            VdcEvent::None => {}
            VdcEvent::LatchScrollY => {
                if self.timing.v_mode() == VMode::Vdw {
                    let first = self.timing.is_first_display_line();
                    self.bg
                        .latch_scroll_y(self.regs.byr, first, self.latch.byr_written);
                    self.latch.byr_written = false;
                    self.latch.y_latch_first_line = first;
                    self.latch.y_latched_at = Some(dot);
                }
            }
            VdcEvent::LatchScrollX => {
                let fetch = self.regs.control.background_enabled()
                    && self.timing.v_mode() == VMode::Vdw;
                self.bg.latch_scroll_x(self.regs.bxr, dot, fetch);
                self.latch.x_latched_at = Some(dot);
                self.sprites.promote();
            }
            VdcEvent::HdsIrqTrigger => {
                if core::mem::take(&mut self.latch.need_vblank_irq)
                    && self.regs.control.contains(Control::VBLANK_IRQ)
                {
                    self.raise_irq(Status::VBLANK);
                }
            }
            VdcEvent::IncRcrCounter => {
                let counter = self.timing.increment_raster_counter();
                if counter == self.regs.rcr && self.regs.control.contains(Control::RASTER_IRQ) {
                    self.raise_irq(Status::RASTER);
                }
                if self.timing.next_line_displays() && self.regs.control.sprites_enabled() {
                    let two_plane = self.regs.mwr.sprite_two_plane();
                    let overflow = self
                        .sprites
                        .evaluate(self.arbiter.sprite_ram(), counter, two_plane);
                    if overflow && self.regs.control.contains(Control::OVERFLOW_IRQ) {
                        self.raise_irq(Status::OVERFLOW);
                    }
                } else {
                    self.sprites.clear_evaluation();
                }
            }
        }
        if !self.observers.is_empty() {
            self.observers
                .on_event(event, self.timing.scanline(), dot);
        }
    }

    /// Grants this dot's VRAM slot: SATB DMA, VRAM DMA, background fetch,
    /// sprite load, then the queued CPU access.
    fn service_vram(&mut self) {
        let tick = self.satb_dma.clock(&mut self.arbiter);
        self.finish_dma_tick(tick, Status::SATB_DONE, DmaControl::SATB_IRQ);

        let tick = self.vram_dma.clock(&mut self.regs, &mut self.arbiter);
        self.finish_dma_tick(tick, Status::VRAM_DMA_DONE, DmaControl::VRAM_IRQ);

        if self.arbiter.is_free() {
            self.render_fetch();
        }

        if let Some(access) = self.arbiter.service_cpu(&mut self.regs) {
            if !self.observers.is_empty() {
                self.observers.on_vram_access(&access);
            }
        }
    }

    fn finish_dma_tick(&mut self, tick: DmaTick, done: Status, enable: DmaControl) {
        if let (Some(access), false) = (tick.access, self.observers.is_empty()) {
            self.observers.on_vram_access(&access);
        }
        if tick.finished {
            tracing::debug!(?done, scanline = self.timing.scanline(), "dma finished");
            if self.regs.dcr.contains(enable) {
                self.raise_irq(done);
            }
        }
    }

    fn render_fetch(&mut self) {
        if self.regs.control.burst_mode() {
            return;
        }
        let dot = self.timing.h_clock();
        let mwr = self.regs.mwr;

        if let Some(fetch) = self.bg.fetch_slot(dot, mwr) {
            let addr = self.bg.fetch_address(fetch, mwr);
            if self.arbiter.claim(Grant::BackgroundFetch) {
                let word = self.arbiter.read(addr);
                self.bg.store(fetch, word, mwr);
            }
        } else if let Some(addr) = self.sprites.next_fetch() {
            if self.arbiter.claim(Grant::SpriteFetch) {
                let word = self.arbiter.read(addr);
                self.sprites.store_fetch(word);
            }
        }
    }

    fn compose(&mut self) -> u16 {
        let control = self.regs.control;
        if !self.timing.in_display() || control.burst_mode() {
            return BORDER_PIXEL;
        }
        let x = self.timing.h_mode_elapsed();
        let (bg_palette, bg_color) = if control.background_enabled() {
            self.bg.pixel(x)
        } else {
            (0, 0)
        };

        if control.sprites_enabled() {
            let sample = self
                .sprites
                .sample(x, control.contains(Control::COLLISION_IRQ));
            if sample.collision {
                self.raise_irq(Status::COLLISION);
            }
            match sample.pixel {
                Some(sprite) if sprite.front || bg_color == 0 => {
                    return SPRITE_PIXEL | ((sprite.palette as u16) << 4) | sprite.color as u16;
                }
                _ => {}
            }
        }

        if bg_color != 0 {
            ((bg_palette as u16) << 4) | bg_color as u16
        } else {
            0
        }
    }

    fn after_advance(&mut self, step: Advance) {
        if step.entered_h == Some(HMode::Hde) {
            self.bg.close_window();
        }
        if step.line_start {
            self.latch.x_latched_at = None;
            self.latch.y_latched_at = None;
        }
        match step.entered_v {
            Some(VMode::Vdw) => self.latch.vblank_armed = true,
            Some(VMode::Vde) => self.begin_vertical_blank(),
            _ => {}
        }
        if step.frame_end {
            self.frames.swap();
            let frame = self.timing.frame_count();
            tracing::trace!(frame, "vdc frame complete");
            if !self.observers.is_empty() {
                self.observers.on_frame_complete(frame);
            }
        }
        if step.line_start {
            self.frames
                .set_row_divider(self.timing.scanline(), self.clock_divider);
        }
    }

    fn begin_vertical_blank(&mut self) {
        if core::mem::take(&mut self.latch.vblank_armed) {
            self.latch.need_vblank_irq = true;
        }
        let auto = self.regs.dcr.contains(DmaControl::SATB_AUTO);
        if self.satb_dma.start_at_vblank(self.regs.dvssr, auto) {
            tracing::debug!(source = format_args!("{:#06X}", self.regs.dvssr), auto, "satb dma start");
        }
        if self.vram_dma.is_deferred() {
            tracing::debug!("deferred vram dma start");
            self.vram_dma.start();
        }
    }
}

//! Horizontal and vertical timing state machine.
//!
//! A line walks `Hsw -> Hds -> Hdw -> Hde`; a frame walks
//! `Vsw -> Vds -> Vdw -> Vde`. Durations come from the timing registers and
//! are loaded when a mode is entered, so mid-mode register writes only move
//! the pending event, never the dots already emitted.
//!
//! Instead of testing every trigger on every dot, the machine keeps a single
//! pending [`VdcEvent`] plus a countdown. After an event fires, or a timing
//! register changes, the nearest remaining event of the line is picked again.

use crate::memory::vdc as vdc_mem;

use super::{registers::TimingRegisters, savestate::TimingState};

/// Horizontal sub-phase of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HMode {
    /// Horizontal sync width; a line starts here.
    #[default]
    Hsw,
    /// Horizontal display start (left border).
    Hds,
    /// Horizontal display width (active pixels).
    Hdw,
    /// Horizontal display end (right border).
    Hde,
}

/// Vertical sub-phase of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VMode {
    /// Vertical sync width; a frame starts here.
    #[default]
    Vsw,
    /// Vertical display start (top border).
    Vds,
    /// Vertical display width (active lines).
    Vdw,
    /// Vertical display end (bottom border, vertical blank).
    Vde,
}

impl HMode {
    fn next(self) -> Self {
        match self {
            HMode::Hsw => HMode::Hds,
            HMode::Hds => HMode::Hdw,
            HMode::Hdw => HMode::Hde,
            HMode::Hde => HMode::Hsw,
        }
    }

    fn dots(self, regs: &TimingRegisters) -> u16 {
        match self {
            HMode::Hsw => regs.hsw_dots(),
            HMode::Hds => regs.hds_dots(),
            HMode::Hdw => regs.hdw_dots(),
            HMode::Hde => regs.hde_dots(),
        }
    }

    fn order(self) -> u8 {
        self as u8
    }
}

impl VMode {
    fn next(self) -> Self {
        match self {
            VMode::Vsw => VMode::Vds,
            VMode::Vds => VMode::Vdw,
            VMode::Vdw => VMode::Vde,
            VMode::Vde => VMode::Vsw,
        }
    }

    fn lines(self, regs: &TimingRegisters) -> u16 {
        match self {
            VMode::Vsw => regs.vsw_lines(),
            VMode::Vds => regs.vds_lines(),
            VMode::Vdw => regs.vdw_lines(),
            VMode::Vde => regs.vde_lines(),
        }
    }
}

/// Scheduled per-line actions, listed in tie-break order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VdcEvent {
    #[default]
    None = 0,
    /// Line start: load the vertical scroll for this line.
    LatchScrollY = 1,
    /// 16 dots before the active area: load BXR and start tile fetches.
    LatchScrollX = 2,
    /// Left border start: deliver a due vertical blank interrupt.
    HdsIrqTrigger = 3,
    /// Right border start: advance the raster counter and test RCR.
    IncRcrCounter = 4,
}

impl VdcEvent {
    const SCHEDULED: [VdcEvent; 4] = [
        VdcEvent::LatchScrollY,
        VdcEvent::LatchScrollX,
        VdcEvent::HdsIrqTrigger,
        VdcEvent::IncRcrCounter,
    ];

    fn bit(self) -> u8 {
        match self {
            VdcEvent::None => 0,
            other => 1 << (other as u8 - 1),
        }
    }
}

/// Mode changes produced by advancing one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Advance {
    pub(crate) entered_h: Option<HMode>,
    pub(crate) entered_v: Option<VMode>,
    pub(crate) line_start: bool,
    pub(crate) frame_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Timing {
    h_mode: HMode,
    h_mode_len: u16,
    h_mode_elapsed: u16,
    /// Index of the next dot within the line.
    h_clock: u16,
    v_mode: VMode,
    v_mode_len: u16,
    v_mode_elapsed: u16,
    scanline: u16,
    frame_count: u64,
    /// Raster counter compared against RCR (64 on the first active line).
    raster_counter: u16,
    next_event: VdcEvent,
    event_countdown: u16,
    /// Events already dispatched on the current line.
    fired: u8,
}

impl Timing {
    pub(crate) fn new(regs: &TimingRegisters) -> Self {
        let mut timing = Self {
            h_mode: HMode::Hsw,
            h_mode_len: HMode::Hsw.dots(regs),
            h_mode_elapsed: 0,
            h_clock: 0,
            v_mode: VMode::Vsw,
            v_mode_len: VMode::Vsw.lines(regs),
            v_mode_elapsed: 0,
            scanline: 0,
            frame_count: 0,
            raster_counter: 0,
            next_event: VdcEvent::None,
            event_countdown: 0,
            fired: 0,
        };
        timing.schedule(regs);
        timing
    }

    pub(crate) fn h_mode(&self) -> HMode {
        self.h_mode
    }

    pub(crate) fn v_mode(&self) -> VMode {
        self.v_mode
    }

    pub(crate) fn h_clock(&self) -> u16 {
        self.h_clock
    }

    pub(crate) fn scanline(&self) -> u16 {
        self.scanline
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Dots already spent in the current horizontal mode.
    pub(crate) fn h_mode_elapsed(&self) -> u16 {
        self.h_mode_elapsed
    }

    pub(crate) fn raster_counter(&self) -> u16 {
        self.raster_counter
    }

    pub(crate) fn next_event(&self) -> VdcEvent {
        self.next_event
    }

    pub(crate) fn event_countdown(&self) -> u16 {
        self.event_countdown
    }

    pub(crate) fn in_display(&self) -> bool {
        self.v_mode == VMode::Vdw && self.h_mode == HMode::Hdw
    }

    /// The line after this one is the first active display line.
    pub(crate) fn next_line_is_first_display(&self) -> bool {
        self.v_mode == VMode::Vds && self.v_mode_elapsed + 1 >= self.v_mode_len
    }

    /// The line after this one shows active display.
    pub(crate) fn next_line_displays(&self) -> bool {
        self.next_line_is_first_display()
            || (self.v_mode == VMode::Vdw && self.v_mode_elapsed + 1 < self.v_mode_len)
    }

    /// Current line is the first line of the active display.
    pub(crate) fn is_first_display_line(&self) -> bool {
        self.v_mode == VMode::Vdw && self.v_mode_elapsed == 0
    }

    /// Steps the raster counter for the upcoming line and returns it.
    pub(crate) fn increment_raster_counter(&mut self) -> u16 {
        self.raster_counter = if self.next_line_is_first_display() {
            vdc_mem::FIRST_DISPLAY_RASTER
        } else {
            (self.raster_counter + 1) & 0x03FF
        };
        self.raster_counter
    }

    #[inline]
    pub(crate) fn event_due(&self) -> bool {
        self.next_event != VdcEvent::None && self.event_countdown == 0
    }

    /// Marks the pending event as dispatched and returns it.
    pub(crate) fn take_event(&mut self) -> VdcEvent {
        let event = self.next_event;
        self.fired |= event.bit();
        self.next_event = VdcEvent::None;
        event
    }

    /// Line position where `target` starts (or started) on this line.
    fn mode_start(&self, target: HMode, regs: &TimingRegisters) -> u16 {
        if target.order() < self.h_mode.order() {
            // Already behind us; any unfired event anchored there is late.
            return 0;
        }
        let mut mode = self.h_mode;
        let mut start = self.h_clock - self.h_mode_elapsed;
        let mut len = self.h_mode_len;
        while mode != target {
            start = start.saturating_add(len);
            mode = mode.next();
            len = mode.dots(regs);
        }
        start
    }

    fn event_position(&self, event: VdcEvent, regs: &TimingRegisters) -> u16 {
        match event {
            VdcEvent::None | VdcEvent::LatchScrollY => 0,
            VdcEvent::LatchScrollX => self
                .mode_start(HMode::Hdw, regs)
                .saturating_sub(vdc_mem::SCROLL_X_LATCH_LEAD),
            VdcEvent::HdsIrqTrigger => self.mode_start(HMode::Hds, regs),
            VdcEvent::IncRcrCounter => self.mode_start(HMode::Hde, regs),
        }
    }

    /// Picks the nearest event of the line that has not fired yet.
    ///
    /// Events whose position slid behind the current dot fire right away.
    pub(crate) fn schedule(&mut self, regs: &TimingRegisters) {
        let mut best: Option<(u16, VdcEvent)> = None;
        for event in VdcEvent::SCHEDULED {
            if self.fired & event.bit() != 0 {
                continue;
            }
            let at = self.event_position(event, regs).max(self.h_clock);
            if best.is_none_or(|(best_at, _)| at < best_at) {
                best = Some((at, event));
            }
        }
        match best {
            Some((at, event)) => {
                self.next_event = event;
                self.event_countdown = at - self.h_clock;
            }
            None => {
                self.next_event = VdcEvent::None;
                self.event_countdown = 0;
            }
        }
    }

    /// Moves to the next dot, walking mode boundaries as they expire.
    pub(crate) fn advance(&mut self, regs: &TimingRegisters) -> Advance {
        let mut step = Advance::default();
        self.h_clock += 1;
        self.h_mode_elapsed += 1;
        self.event_countdown = self.event_countdown.saturating_sub(1);

        if self.h_mode_elapsed < self.h_mode_len {
            return step;
        }

        let next_h = self.h_mode.next();
        self.h_mode = next_h;
        self.h_mode_len = next_h.dots(regs);
        self.h_mode_elapsed = 0;
        step.entered_h = Some(next_h);

        if next_h == HMode::Hsw {
            self.h_clock = 0;
            self.scanline += 1;
            self.v_mode_elapsed += 1;
            step.line_start = true;

            if self.v_mode_elapsed >= self.v_mode_len {
                let next_v = self.v_mode.next();
                self.v_mode = next_v;
                self.v_mode_len = next_v.lines(regs);
                self.v_mode_elapsed = 0;
                step.entered_v = Some(next_v);

                if next_v == VMode::Vsw {
                    self.scanline = 0;
                    self.frame_count = self.frame_count.wrapping_add(1);
                    step.frame_end = true;
                }
            }

            self.fired = 0;
            self.schedule(regs);
        }

        step
    }

    pub(crate) fn save_state(&self) -> TimingState {
        TimingState {
            h_mode: self.h_mode,
            h_mode_len: self.h_mode_len,
            h_mode_elapsed: self.h_mode_elapsed,
            h_clock: self.h_clock,
            v_mode: self.v_mode,
            v_mode_len: self.v_mode_len,
            v_mode_elapsed: self.v_mode_elapsed,
            scanline: self.scanline,
            frame_count: self.frame_count,
            raster_counter: self.raster_counter,
            next_event: self.next_event,
            event_countdown: self.event_countdown,
            fired: self.fired,
        }
    }

    pub(crate) fn load_state(&mut self, state: &TimingState) {
        self.h_mode = state.h_mode;
        self.h_mode_len = state.h_mode_len;
        self.h_mode_elapsed = state.h_mode_elapsed;
        self.h_clock = state.h_clock;
        self.v_mode = state.v_mode;
        self.v_mode_len = state.v_mode_len;
        self.v_mode_elapsed = state.v_mode_elapsed;
        self.scanline = state.scanline;
        self.frame_count = state.frame_count;
        self.raster_counter = state.raster_counter;
        self.next_event = state.next_event;
        self.event_countdown = state.event_countdown;
        self.fired = state.fired;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn run_dots(timing: &mut Timing, regs: &TimingRegisters, dots: u32) -> Vec<(VdcEvent, u16)> {
        let mut fired = Vec::new();
        for _ in 0..dots {
            while timing.event_due() {
                let event = timing.take_event();
                fired.push((event, timing.h_clock()));
                timing.schedule(regs);
            }
            timing.advance(regs);
        }
        fired
    }

    #[test]
    fn events_fire_at_line_offsets_in_order() {
        let regs = TimingRegisters::default();
        let mut timing = Timing::new(&regs);
        let fired = run_dots(&mut timing, &regs, regs.line_dots() as u32);
        // Hsw 24, Hds 24, Hdw 256, Hde 40.
        assert_eq!(
            fired,
            vec![
                (VdcEvent::LatchScrollY, 0),
                (VdcEvent::HdsIrqTrigger, 24),
                (VdcEvent::LatchScrollX, 32),
                (VdcEvent::IncRcrCounter, 304),
            ]
        );
        assert_eq!(timing.scanline(), 1);
        assert_eq!(timing.h_clock(), 0);
    }

    #[test]
    fn tied_events_keep_tie_order() {
        // HSW=0, HDS=0: Hdw starts at dot 16 so the X latch lands on dot 0.
        let regs = TimingRegisters {
            hsr: 0x0000,
            ..TimingRegisters::default()
        };
        let mut timing = Timing::new(&regs);
        let fired = run_dots(&mut timing, &regs, 9);
        assert_eq!(fired[0], (VdcEvent::LatchScrollY, 0));
        assert_eq!(fired[1], (VdcEvent::LatchScrollX, 0));
        assert_eq!(fired[2], (VdcEvent::HdsIrqTrigger, 8));
    }

    #[test]
    fn moved_event_is_rescheduled_not_replayed() {
        let mut regs = TimingRegisters::default();
        let mut timing = Timing::new(&regs);
        run_dots(&mut timing, &regs, 10);
        // Stretch HDS while still in Hsw; the X latch slides later.
        regs.hsr = 0x0402;
        timing.schedule(&regs);
        let fired = run_dots(&mut timing, &regs, regs.line_dots() as u32 - 10);
        assert!(fired.contains(&(VdcEvent::LatchScrollX, 24 + 40 - 16)));
        assert_eq!(fired.iter().filter(|(e, _)| *e == VdcEvent::LatchScrollX).count(), 1);
    }

    #[test]
    fn frame_wraps_at_configured_totals() {
        let regs = TimingRegisters::default();
        let mut timing = Timing::new(&regs);
        let total = regs.line_dots() as u32 * regs.frame_lines() as u32;
        run_dots(&mut timing, &regs, total - 1);
        assert_eq!(timing.frame_count(), 0);
        assert_eq!(timing.scanline(), 262);
        run_dots(&mut timing, &regs, 1);
        assert_eq!(timing.frame_count(), 1);
        assert_eq!((timing.scanline(), timing.h_clock()), (0, 0));
        assert_eq!(timing.v_mode(), VMode::Vsw);
    }

    #[test]
    fn raster_counter_restarts_on_first_display_line() {
        let regs = TimingRegisters::default();
        let mut timing = Timing::new(&regs);
        let line = regs.line_dots() as u32;
        // Last Vds line: VSW 3 + VDS 17 lines, so line index 19.
        run_dots(&mut timing, &regs, line * 19);
        assert!(timing.next_line_is_first_display());
        assert_eq!(timing.increment_raster_counter(), 0x40);
        run_dots(&mut timing, &regs, line);
        assert!(timing.is_first_display_line());
        assert_eq!(timing.increment_raster_counter(), 0x41);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: crate::tests::TEST_COUNT, .. ProptestConfig::default() })]

        #[test]
        fn any_layout_wraps_at_its_totals(
            hsw in 0u16..8,
            hds in 0u16..16,
            hdw in 0u16..64,
            hde in 0u16..16,
            vsw in 0u16..8,
            vds in 0u16..16,
            vdw in 0u16..64,
            vcr in 0u16..8,
        ) {
            let regs = TimingRegisters {
                hsr: (hds << 8) | hsw,
                hdr: (hde << 8) | hdw,
                vpr: (vds << 8) | vsw,
                vdw,
                vcr,
            };
            let mut timing = Timing::new(&regs);
            let line = regs.line_dots() as u32;
            let lines = regs.frame_lines() as u32;
            let mut last = (0u16, 0u16);
            let mut line_events = 0;
            for dot in 1..=line * lines {
                while timing.event_due() {
                    prop_assert_ne!(timing.take_event(), VdcEvent::None);
                    line_events += 1;
                    timing.schedule(&regs);
                }
                timing.advance(&regs);
                let now = (timing.scanline(), timing.h_clock());
                if now.1 == 0 {
                    prop_assert_eq!(line_events, 4);
                    line_events = 0;
                }
                if dot < line * lines {
                    prop_assert!(now > last, "position went backwards: {:?} -> {:?}", last, now);
                    prop_assert_eq!(timing.frame_count(), 0);
                }
                last = now;
            }
            prop_assert_eq!(timing.frame_count(), 1);
            prop_assert_eq!(last, (0, 0));
        }
    }
}

use crate::{
    error::Error,
    memory::vdc as vdc_mem,
    state::{SaveState, Snapshot, SnapshotMeta},
    vdc::{
        Vdc,
        savestate::{
            ArbiterState, BgPipelineState, LatchState, RegistersState, SatbDmaState,
            SpritePipelineState, TimingState, VramDmaState,
        },
    },
};

#[cfg(feature = "savestate-serde")]
use serde::{Deserialize, Serialize};

/// Serializable snapshot of a whole controller.
///
/// Frame buffers are not included; the next completed frame after a load is
/// fully determined by this data.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdcState {
    pub registers: RegistersState,
    pub timing: TimingState,
    pub arbiter: ArbiterState,
    pub background: BgPipelineState,
    pub sprites: SpritePipelineState,
    pub vram_dma: VramDmaState,
    pub satb_dma: SatbDmaState,
    pub latch: LatchState,
    pub clock_divider: u8,
    pub stall_dots: u32,
    pub vram: Vec<u16>,
    pub sprite_ram: Vec<u16>,
}

impl VdcState {
    fn validate(&self) -> Result<(), Error> {
        if self.vram.len() != vdc_mem::VRAM_WORDS {
            return Err(Error::CorruptState("vram size mismatch"));
        }
        if self.sprite_ram.len() != vdc_mem::SPRITE_RAM_WORDS {
            return Err(Error::CorruptState("sprite ram size mismatch"));
        }
        if self.background.tiles.len() != vdc_mem::BG_TILE_SLOTS {
            return Err(Error::CorruptState("background tile slot count mismatch"));
        }
        if self.sprites.eval.len() > vdc_mem::SPRITE_CELLS_PER_LINE
            || self.sprites.draw.len() > vdc_mem::SPRITE_CELLS_PER_LINE
        {
            return Err(Error::CorruptState("sprite cell list exceeds line budget"));
        }
        if !matches!(self.sprites.words_per_cell, 2 | 4) {
            return Err(Error::CorruptState("sprite fetch width out of range"));
        }
        if self.sprites.load_word >= self.sprites.words_per_cell {
            return Err(Error::CorruptState("sprite load word past the cell"));
        }
        if self.sprites.load_cell as usize > self.sprites.eval.len() {
            return Err(Error::CorruptState("sprite load cell past the evaluated list"));
        }
        // A finished transfer parks its index one past the table.
        if self.satb_dma.active
            && (self.satb_dma.index >= vdc_mem::SATB_TRANSFER_WORDS
                || self.satb_dma.phase >= vdc_mem::SATB_DOTS_PER_WORD)
        {
            return Err(Error::CorruptState("sprite table transfer position out of range"));
        }
        self.validate_timing()
    }

    fn validate_timing(&self) -> Result<(), Error> {
        let t = &self.timing;
        if t.h_mode_len == 0 || t.h_mode_len > vdc_mem::MAX_H_MODE_DOTS {
            return Err(Error::CorruptState("horizontal mode length out of range"));
        }
        if t.h_mode_elapsed >= t.h_mode_len || t.h_mode_elapsed > t.h_clock {
            return Err(Error::CorruptState("horizontal mode position out of range"));
        }
        if t.h_clock >= vdc_mem::MAX_LINE_DOTS {
            return Err(Error::CorruptState("line position out of range"));
        }
        if t.v_mode_len == 0 || t.v_mode_len > vdc_mem::MAX_V_MODE_LINES {
            return Err(Error::CorruptState("vertical mode length out of range"));
        }
        if t.v_mode_elapsed >= t.v_mode_len || t.scanline >= vdc_mem::MAX_FRAME_LINES {
            return Err(Error::CorruptState("vertical position out of range"));
        }
        if t.fired > 0x0F {
            return Err(Error::CorruptState("unknown line event marked as fired"));
        }
        Ok(())
    }
}

impl SaveState for Vdc {
    type State = VdcState;
    type Error = Error;
    type Meta = SnapshotMeta;

    fn save(&self, mut meta: Self::Meta) -> Result<Snapshot<Self::State, Self::Meta>, Self::Error> {
        meta.format_version = Self::FORMAT_VERSION;
        meta.frame = self.timing.frame_count();
        meta.variant = self.config.variant;
        let data = VdcState {
            registers: self.regs.save_state(),
            timing: self.timing.save_state(),
            arbiter: self.arbiter.save_state(),
            background: self.bg.save_state(),
            sprites: self.sprites.save_state(),
            vram_dma: self.vram_dma.save_state(),
            satb_dma: self.satb_dma.save_state(),
            latch: self.latch,
            clock_divider: self.clock_divider,
            stall_dots: self.stall_dots,
            vram: self.arbiter.vram().to_vec(),
            sprite_ram: self.arbiter.sprite_ram().to_vec(),
        };
        Ok(Snapshot { meta, data })
    }

    fn load(&mut self, snapshot: &Snapshot<Self::State, Self::Meta>) -> Result<(), Self::Error> {
        if snapshot.meta.format_version != Self::FORMAT_VERSION {
            return Err(Error::IncompatibleState {
                expected: Self::FORMAT_VERSION,
                actual: snapshot.meta.format_version,
            });
        }
        let state = &snapshot.data;
        state.validate()?;

        if snapshot.meta.variant != self.config.variant {
            tracing::warn!(
                saved = %snapshot.meta.variant,
                current = %self.config.variant,
                "loading a save state taken on a different controller slot"
            );
        }

        self.regs.load_state(&state.registers);
        self.timing.load_state(&state.timing);
        self.arbiter.load_state(&state.arbiter);
        self.arbiter.vram_mut().copy_from_slice(&state.vram);
        self.arbiter.sprite_ram_mut().copy_from_slice(&state.sprite_ram);
        self.bg.load_state(&state.background);
        self.sprites.load_state(&state.sprites);
        self.vram_dma.load_state(state.vram_dma);
        self.satb_dma.load_state(state.satb_dma);
        self.latch = state.latch;
        self.clock_divider = state.clock_divider;
        self.stall_dots = state.stall_dots;

        tracing::debug!(
            frame = snapshot.meta.frame,
            scanline = self.timing.scanline(),
            h_clock = self.timing.h_clock(),
            "vdc state loaded"
        );
        Ok(())
    }
}

#[cfg(feature = "savestate-postcard")]
impl VdcState {
    pub fn to_postcard_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(postcard::to_stdvec(self)?)
    }

    pub fn from_postcard_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

#[cfg(feature = "savestate-postcard")]
impl Snapshot<VdcState, SnapshotMeta> {
    pub fn to_postcard_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(postcard::to_stdvec(self)?)
    }

    pub fn from_postcard_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_vdc() -> Vdc {
        let mut vdc = Vdc::new();
        vdc.poke_vram(0x0000, 0x1001).expect("poke bat");
        vdc.poke_sprite_ram(0, 0x0050).expect("poke sprite");
        for (reg, value) in [(0x05u8, 0x00C0u16), (0x07, 0x0013), (0x08, 0x0021)] {
            vdc.write(0, reg);
            vdc.write(2, value as u8);
            vdc.write(3, (value >> 8) as u8);
        }
        vdc.run_dots(30 * 344 + 100);
        vdc
    }

    #[test]
    fn rejects_other_format_versions() {
        let vdc = busy_vdc();
        let mut snap = vdc.save(SnapshotMeta::default()).expect("save");
        snap.meta.format_version += 1;

        let mut fresh = Vdc::new();
        assert_eq!(
            fresh.load(&snap),
            Err(Error::IncompatibleState {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(fresh.peek_vram(0), Ok(0));
    }

    #[test]
    fn rejects_wrongly_sized_memories() {
        let vdc = busy_vdc();
        let mut snap = vdc.save(SnapshotMeta::default()).expect("save");
        snap.data.vram.pop();

        let mut fresh = Vdc::new();
        assert!(matches!(fresh.load(&snap), Err(Error::CorruptState(_))));
        assert_eq!(fresh.scanline(), 0);
    }

    #[test]
    fn rejects_out_of_range_pipeline_positions() {
        let corruptions: [(&str, fn(&mut VdcState)); 11] = [
            ("load word", |s| s.sprites.load_word = 9),
            ("load word at width", |s| {
                s.sprites.words_per_cell = 2;
                s.sprites.load_word = 2;
            }),
            ("load cell", |s| s.sprites.load_cell = s.sprites.eval.len() as u8 + 1),
            ("satb index", |s| {
                s.satb_dma.active = true;
                s.satb_dma.index = 0x100;
            }),
            ("satb phase", |s| {
                s.satb_dma.active = true;
                s.satb_dma.phase = 4;
            }),
            ("h elapsed past clock", |s| s.timing.h_mode_elapsed = s.timing.h_clock + 1),
            ("h elapsed past mode", |s| {
                s.timing.h_clock = 500;
                s.timing.h_mode_elapsed = s.timing.h_mode_len;
            }),
            ("h mode length", |s| s.timing.h_mode_len = 0),
            ("v elapsed past mode", |s| s.timing.v_mode_elapsed = s.timing.v_mode_len),
            ("scanline", |s| s.timing.scanline = 0xFFFF),
            ("fired", |s| s.timing.fired = 0x10),
        ];

        let vdc = busy_vdc();
        let good = vdc.save(SnapshotMeta::default()).expect("save");
        for (name, corrupt) in corruptions {
            let mut snap = good.clone();
            corrupt(&mut snap.data);

            let mut fresh = Vdc::new();
            assert!(
                matches!(fresh.load(&snap), Err(Error::CorruptState(_))),
                "{name} accepted"
            );
            assert_eq!(fresh.scanline(), 0, "{name} partially loaded");
            fresh.run_dots(400);
        }
    }

    #[test]
    fn accepts_finished_sprite_table_transfer() {
        let mut vdc = Vdc::new();
        vdc.write(0, 0x13);
        vdc.write(2, 0x00);
        vdc.write(3, 0x10);
        vdc.run_frame();
        vdc.run_frame();
        let snap = vdc.save(SnapshotMeta::default()).expect("save");
        assert!(!snap.data.satb_dma.active);
        assert_eq!(snap.data.satb_dma.index, vdc_mem::SATB_TRANSFER_WORDS);

        let mut fresh = Vdc::new();
        assert_eq!(fresh.load(&snap), Ok(()));
    }

    #[test]
    fn save_load_save_is_stable() {
        let vdc = busy_vdc();
        let snap = vdc.save(SnapshotMeta::default()).expect("save");
        assert_eq!(snap.meta.frame, 0);

        let mut restored = Vdc::new();
        restored.load(&snap).expect("load");
        let again = restored.save(snap.meta.clone()).expect("save again");
        assert_eq!(snap, again);
    }

    #[cfg(feature = "savestate-postcard")]
    #[test]
    fn savestate_postcard_roundtrip() {
        let vdc = busy_vdc();
        let snap = vdc.save(SnapshotMeta::default()).expect("save snapshot");
        let bytes = snap.to_postcard_bytes().expect("encode snapshot");

        let decoded =
            Snapshot::<VdcState, SnapshotMeta>::from_postcard_bytes(&bytes).expect("decode");
        let mut restored = Vdc::new();
        restored.load(&decoded).expect("load snapshot");

        let bytes2 = restored
            .save(decoded.meta.clone())
            .expect("save again")
            .to_postcard_bytes()
            .expect("encode again");
        assert_eq!(bytes, bytes2);
    }

    #[cfg(feature = "savestate-postcard")]
    #[test]
    fn truncated_postcard_bytes_report_codec_error() {
        let vdc = busy_vdc();
        let bytes = vdc
            .save(SnapshotMeta::default())
            .expect("save snapshot")
            .to_postcard_bytes()
            .expect("encode snapshot");

        let half = &bytes[..bytes.len() / 2];
        let decoded = Snapshot::<VdcState, SnapshotMeta>::from_postcard_bytes(half);
        assert!(matches!(decoded, Err(Error::Postcard(_))));
    }
}

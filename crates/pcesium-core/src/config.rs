//! Construction-time configuration for a VDC instance.

mod variant;

pub use variant::{PortWindow, VdcVariant};

/// When a VRAM-to-VRAM transfer begins after its length register is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VramDmaStart {
    /// Start on the dot following the LENR high-byte write.
    #[default]
    Immediate,
    /// Hold the request until the next vertical blank begins.
    VerticalBlank,
}

/// Static configuration handed to [`crate::Vdc::with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VdcConfig {
    /// Which chip slot this controller occupies.
    pub variant: VdcVariant,
    /// Start policy for software-triggered VRAM DMA.
    pub vram_dma_start: VramDmaStart,
}

impl VdcConfig {
    pub fn new(variant: VdcVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_vram_dma_start(mut self, start: VramDmaStart) -> Self {
        self.vram_dma_start = start;
        self
    }
}

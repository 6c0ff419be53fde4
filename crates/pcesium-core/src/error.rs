use thiserror::Error;

/// Errors surfaced by tooling and persistence entry points.
///
/// Nothing the emulated program does can produce one of these: register
/// writes with odd values, out-of-range VRAM addresses and zero-length DMA
/// all follow the hardware's wraparound behavior instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Debugger peek/poke beyond the end of VRAM.
    #[error("vram address {addr:#06X} is outside the {size:#06X}-word store")]
    VramOutOfRange { addr: u32, size: usize },

    /// Debugger peek/poke beyond the end of sprite RAM.
    #[error("sprite ram address {addr:#05X} is outside the {size}-word table")]
    SpriteRamOutOfRange { addr: u32, size: usize },

    /// Register index that does not name a VDC register.
    #[error("unknown vdc register index {0:#04X}")]
    UnknownRegister(u8),

    /// Snapshot produced by a different state layout.
    #[error("incompatible save state: expected format {expected}, got {actual}")]
    IncompatibleState { expected: u32, actual: u32 },

    /// Snapshot whose payload does not match the hardware shape.
    #[error("corrupt save state: {0}")]
    CorruptState(&'static str),

    #[cfg(feature = "savestate-postcard")]
    #[error("postcard codec error: {0}")]
    Postcard(#[from] postcard::Error),
}

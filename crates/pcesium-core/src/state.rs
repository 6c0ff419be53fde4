//! Save/load interfaces.
//!
//! Components expose a plain-data `State` type that callers can serialize
//! with any serde format; the `savestate-postcard` feature adds ready-made
//! postcard helpers.

pub mod vdc;

#[cfg(feature = "savestate-serde")]
use serde::{Deserialize, Serialize};

use crate::config::VdcVariant;

pub use vdc::VdcState;

/// Metadata stored next to every snapshot payload.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    /// Layout version of the payload.
    pub format_version: u32,
    /// Frame counter when the snapshot was taken.
    pub frame: u64,
    /// Console slot of the controller that produced the snapshot.
    pub variant: VdcVariant,
}

impl Default for SnapshotMeta {
    fn default() -> Self {
        Self {
            format_version: 1,
            frame: 0,
            variant: VdcVariant::default(),
        }
    }
}

/// Snapshot metadata bundled with its payload.
#[cfg_attr(feature = "savestate-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T, M = SnapshotMeta> {
    pub meta: M,
    pub data: T,
}

pub trait SaveState {
    type State;
    type Error;
    type Meta: Clone;

    /// Bumped whenever the `State` layout changes.
    const FORMAT_VERSION: u32 = 1;

    /// Captures everything that influences future output.
    fn save(&self, meta: Self::Meta) -> Result<Snapshot<Self::State, Self::Meta>, Self::Error>;

    /// Restores a snapshot. On error the component is left untouched.
    fn load(&mut self, snapshot: &Snapshot<Self::State, Self::Meta>) -> Result<(), Self::Error>;
}

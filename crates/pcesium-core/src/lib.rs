//! Dot-stepped emulation of the HuC6270 video display controller.
//!
//! The crate models one controller: its register file, timing state machine,
//! single-port VRAM arbitration, background and sprite pipelines, both DMA
//! engines and a double-buffered raster output. The console clock calls
//! [`Vdc::exec`] once per dot; the bus calls [`Vdc::read`]/[`Vdc::write`].
//!
//! ```
//! use pcesium_core::Vdc;
//!
//! let mut vdc = Vdc::new();
//! vdc.run_frame();
//! assert_eq!(vdc.frame_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod mem_block;
pub mod memory;
pub mod observer;
pub mod state;
pub mod vdc;

pub use config::{VdcConfig, VdcVariant, VramDmaStart};
pub use error::Error;
pub use memory::io::{Port, Register};
pub use observer::{ObserverStack, TraceObserver, VdcObserver};
pub use state::{SaveState, Snapshot, SnapshotMeta, VdcState};
pub use vdc::{Status, Vdc, VdcDebugState};

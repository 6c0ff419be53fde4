//! Debugger subscribers.
//!
//! Tooling attaches [`VdcObserver`] layers to an [`ObserverStack`] handed to
//! the controller at construction. Hooks receive values only; they cannot
//! reach back into the controller, so attaching one never changes emulated
//! behavior. With no layers attached the per-dot hook is skipped entirely.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::Debug,
};

use crate::{
    memory::io::Port,
    vdc::{AccessOrigin, Status, VdcEvent, VramAccess},
};

pub mod trace_observer;

pub use trace_observer::TraceObserver;

pub trait VdcObserver: Any + Send + Debug + 'static {
    /// A port was read; `value` is what the reader received.
    fn on_register_read(&mut self, _origin: AccessOrigin, _port: Port, _value: u8) {}

    fn on_register_write(&mut self, _origin: AccessOrigin, _port: Port, _value: u8) {}

    /// A CPU, debugger or DMA access completed on the VRAM port.
    fn on_vram_access(&mut self, _access: &VramAccess) {}

    /// A scheduled event was dispatched at `scanline`/`h_clock`.
    fn on_event(&mut self, _event: VdcEvent, _scanline: u16, _h_clock: u16) {}

    /// An interrupt source was raised.
    fn on_irq(&mut self, _source: Status) {}

    fn on_dot(&mut self, _scanline: u16, _h_clock: u16, _pixel: u16) {}

    fn on_frame_complete(&mut self, _frame: u64) {}
}

#[derive(Debug, Default)]
pub struct ObserverStack {
    layers: HashMap<TypeId, Box<dyn VdcObserver>>,
}

impl ObserverStack {
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    /// Adds a layer, replacing any previous layer of the same type.
    pub fn add<O>(&mut self, observer: O) -> Option<Box<dyn VdcObserver>>
    where
        O: VdcObserver,
    {
        self.layers.insert(TypeId::of::<O>(), Box::new(observer))
    }

    pub fn with<O: VdcObserver>(mut self, observer: O) -> Self {
        self.add(observer);
        self
    }

    pub fn remove<O>(&mut self) -> Option<Box<dyn VdcObserver>>
    where
        O: VdcObserver,
    {
        self.layers.remove(&TypeId::of::<O>())
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer<T: VdcObserver>(&self) -> Option<&T> {
        let layer = self.layers.get(&TypeId::of::<T>())?;
        (layer.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    pub fn layer_mut<T: VdcObserver>(&mut self) -> Option<&mut T> {
        let layer = self.layers.get_mut(&TypeId::of::<T>())?;
        (layer.as_mut() as &mut dyn Any).downcast_mut::<T>()
    }
}

impl VdcObserver for ObserverStack {
    fn on_register_read(&mut self, origin: AccessOrigin, port: Port, value: u8) {
        for layer in self.layers.values_mut() {
            layer.on_register_read(origin, port, value);
        }
    }

    fn on_register_write(&mut self, origin: AccessOrigin, port: Port, value: u8) {
        for layer in self.layers.values_mut() {
            layer.on_register_write(origin, port, value);
        }
    }

    fn on_vram_access(&mut self, access: &VramAccess) {
        for layer in self.layers.values_mut() {
            layer.on_vram_access(access);
        }
    }

    fn on_event(&mut self, event: VdcEvent, scanline: u16, h_clock: u16) {
        for layer in self.layers.values_mut() {
            layer.on_event(event, scanline, h_clock);
        }
    }

    fn on_irq(&mut self, source: Status) {
        for layer in self.layers.values_mut() {
            layer.on_irq(source);
        }
    }

    fn on_dot(&mut self, scanline: u16, h_clock: u16, pixel: u16) {
        for layer in self.layers.values_mut() {
            layer.on_dot(scanline, h_clock, pixel);
        }
    }

    fn on_frame_complete(&mut self, frame: u64) {
        for layer in self.layers.values_mut() {
            layer.on_frame_complete(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FrameCounter(u64);

    impl VdcObserver for FrameCounter {
        fn on_frame_complete(&mut self, frame: u64) {
            self.0 = frame;
        }
    }

    #[test]
    fn layers_are_keyed_by_type() {
        let mut stack = ObserverStack::new().with(FrameCounter::default());
        assert!(stack.add(FrameCounter(5)).is_some());
        assert_eq!(stack.len(), 1);

        stack.on_frame_complete(9);
        assert_eq!(stack.layer::<FrameCounter>().map(|c| c.0), Some(9));

        stack.remove::<FrameCounter>();
        assert!(stack.is_empty());
    }
}

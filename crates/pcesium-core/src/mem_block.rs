//! Fixed-capacity memory blocks.
//!
//! VRAM is 64 KiB, which is large enough that some targets prefer it on the
//! heap. The `boxed-memblock` feature (and wasm) switch the backing storage to
//! a boxed array while keeping the same slice-like API.

use core::ops::{Deref, DerefMut};

#[cfg(any(feature = "boxed-memblock", target_arch = "wasm32"))]
type MemBlockStorage<T, const N: usize> = Box<[T; N]>;

#[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
type MemBlockStorage<T, const N: usize> = [T; N];

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemBlock<T, const N: usize>(MemBlockStorage<T, N>);

/// Fixed-capacity storage for the VDC's private memories.
pub mod vdc {
    use crate::memory::vdc as vdc_mem;

    /// Word-addressed video RAM.
    pub type Vram = super::MemBlock<u16, { vdc_mem::VRAM_WORDS }>;
    /// Sprite attribute table, 64 entries of 4 words.
    pub type SpriteRam = super::MemBlock<u16, { vdc_mem::SPRITE_RAM_WORDS }>;
}

impl<T, const N: usize> MemBlock<T, N> {
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        #[cfg(any(feature = "boxed-memblock", target_arch = "wasm32"))]
        {
            &*self.0
        }
        #[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
        {
            &self.0
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        #[cfg(any(feature = "boxed-memblock", target_arch = "wasm32"))]
        {
            &mut *self.0
        }
        #[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
        {
            &mut self.0
        }
    }
}

impl<T: Copy + Default, const N: usize> MemBlock<T, N> {
    pub fn new() -> Self {
        Self(new_storage())
    }
}

impl<T: Copy, const N: usize> MemBlock<T, N> {
    /// Create a `MemBlock` where every element is initialized to `value`.
    #[inline]
    pub fn filled(value: T) -> Self {
        Self(new_storage_filled(value))
    }
}

impl<T: Copy + Default, const N: usize> Default for MemBlock<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for MemBlock<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for MemBlock<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

#[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
impl<T: Copy, const N: usize> Copy for MemBlock<T, N> {}

#[cfg(any(feature = "boxed-memblock", target_arch = "wasm32"))]
fn new_storage<T: Copy + Default, const N: usize>() -> MemBlockStorage<T, N> {
    Box::new([T::default(); N])
}

#[cfg(any(feature = "boxed-memblock", target_arch = "wasm32"))]
fn new_storage_filled<T: Copy, const N: usize>(value: T) -> MemBlockStorage<T, N> {
    Box::new([value; N])
}

#[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
fn new_storage<T: Copy + Default, const N: usize>() -> MemBlockStorage<T, N> {
    [T::default(); N]
}

#[cfg(not(any(feature = "boxed-memblock", target_arch = "wasm32")))]
fn new_storage_filled<T: Copy, const N: usize>(value: T) -> MemBlockStorage<T, N> {
    [value; N]
}

impl<T: Copy, const N: usize> MemBlock<T, N> {
    /// Copies `src` into the block; lengths must match.
    pub fn copy_from(&mut self, src: &[T]) -> bool {
        if src.len() != N {
            return false;
        }
        self.as_mut_slice().copy_from_slice(src);
        true
    }
}

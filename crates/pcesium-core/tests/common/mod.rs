#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use pcesium_core::{
    Register, Vdc,
    memory::vdc::{MAX_SCREEN_WIDTH, SCREEN_HEIGHT},
};

pub const SELECT_PORT: u16 = 0;
pub const DATA_LOW_PORT: u16 = 2;
pub const DATA_HIGH_PORT: u16 = 3;

/// First active line and dot with the power-on timing registers.
pub const FIRST_DISPLAY_LINE: usize = 20;
pub const FIRST_DISPLAY_DOT: usize = 48;
pub const DISPLAY_WIDTH: usize = 256;

/// Writes a full register through the select and data ports.
pub fn set_register(vdc: &mut Vdc, reg: Register, value: u16) {
    vdc.write(SELECT_PORT, reg.index());
    vdc.write(DATA_LOW_PORT, value as u8);
    vdc.write(DATA_HIGH_PORT, (value >> 8) as u8);
}

/// Fills VRAM through the debugger path.
pub fn load_vram(vdc: &mut Vdc, addr: u32, words: &[u16]) -> Result<()> {
    for (offset, &word) in words.iter().enumerate() {
        let at = addr + offset as u32;
        vdc.poke_vram(at, word)
            .with_context(|| format!("poking vram {at:#06X}"))?;
    }
    Ok(())
}

pub fn load_sprite(vdc: &mut Vdc, index: u32, entry: [u16; 4]) -> Result<()> {
    for (word, &value) in entry.iter().enumerate() {
        vdc.poke_sprite_ram(index * 4 + word as u32, value)
            .with_context(|| format!("poking sprite {index}"))?;
    }
    Ok(())
}

/// Clocks until the controller sits at `(scanline, h_clock)`.
pub fn run_to(vdc: &mut Vdc, scanline: u16, h_clock: u16) -> Result<()> {
    let limit = 2 * MAX_SCREEN_WIDTH * SCREEN_HEIGHT * 4;
    for _ in 0..limit {
        if (vdc.scanline(), vdc.h_clock()) == (scanline, h_clock) {
            return Ok(());
        }
        vdc.exec();
    }
    bail!("position ({scanline}, {h_clock}) never reached");
}

pub fn pixel(frame: &[u16], row: usize, column: usize) -> u16 {
    frame[row * MAX_SCREEN_WIDTH + column]
}

/// Pixel at active-area coordinates of the power-on layout.
pub fn display_pixel(frame: &[u16], y: usize, x: usize) -> u16 {
    pixel(frame, FIRST_DISPLAY_LINE + y, FIRST_DISPLAY_DOT + x)
}

pub fn row(frame: &[u16], row: usize) -> &[u16] {
    &frame[row * MAX_SCREEN_WIDTH..(row + 1) * MAX_SCREEN_WIDTH]
}

/// Fills the 32x32 BAT with one entry.
pub fn fill_bat(vdc: &mut Vdc, entry: u16) -> Result<()> {
    load_vram(vdc, 0, &[entry; 32 * 32])
}

/// Writes an 8x8 background pattern: `rows[y] = (planes01, planes23)`.
pub fn load_tile(vdc: &mut Vdc, tile: u16, rows: [(u16, u16); 8]) -> Result<()> {
    let base = (tile as u32) << 4;
    for (y, (low, high)) in rows.into_iter().enumerate() {
        vdc.poke_vram(base + y as u32, low)?;
        vdc.poke_vram(base + 8 + y as u32, high)?;
    }
    Ok(())
}

/// Writes a 16x16 sprite pattern whose plane 0 is fully set (colour 1).
pub fn load_solid_sprite_pattern(vdc: &mut Vdc, pattern: u16) -> Result<()> {
    let base = (pattern as u32) << 6;
    load_vram(vdc, base, &[0xFFFF; 16])?;
    load_vram(vdc, base + 16, &[0; 48])
}

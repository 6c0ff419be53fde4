mod common;

use anyhow::{Result, ensure};
use common::{
    DISPLAY_WIDTH, FIRST_DISPLAY_DOT, FIRST_DISPLAY_LINE, display_pixel, fill_bat, load_solid_sprite_pattern,
    load_sprite, load_tile, pixel, row, run_to, set_register,
};
use ctor::ctor;
use pcesium_core::{
    Register, Status, Vdc,
    memory::vdc::{BORDER_PIXEL, SCREEN_HEIGHT},
    vdc::Control,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

const TILE: u16 = 0x100;
/// Background pixel for palette 2, colour 1.
const BG_OPAQUE: u16 = 0x21;
const SPRITE_PATTERN: u16 = 0x80;

/// BAT full of one tile whose leftmost column is opaque on every row.
fn striped_background(vdc: &mut Vdc) -> Result<()> {
    fill_bat(vdc, 0x2000 | TILE)?;
    load_tile(vdc, TILE, [(0x0080, 0x0000); 8])?;
    Ok(())
}

/// Same tile, but only its top row is opaque.
fn top_row_background(vdc: &mut Vdc) -> Result<()> {
    fill_bat(vdc, 0x2000 | TILE)?;
    let mut rows = [(0x0000, 0x0000); 8];
    rows[0] = (0x0080, 0x0000);
    load_tile(vdc, TILE, rows)
}

fn sprite_entry(y: u16, x: u16, palette: u16, front: bool) -> [u16; 4] {
    let attrs = palette | if front { 0x0080 } else { 0 };
    [64 + y, 32 + x, SPRITE_PATTERN << 1, attrs]
}

#[test]
fn background_tiles_land_in_active_area() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    set_register(&mut vdc, Register::Control, Control::BACKGROUND.bits());
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    ensure!(display_pixel(frame, 0, 0) == BG_OPAQUE);
    ensure!(display_pixel(frame, 0, 1) == 0);
    ensure!(display_pixel(frame, 0, 8) == BG_OPAQUE);
    ensure!(display_pixel(frame, 239, 248) == BG_OPAQUE);
    ensure!(pixel(frame, FIRST_DISPLAY_LINE, FIRST_DISPLAY_DOT - 1) == BORDER_PIXEL);
    ensure!(pixel(frame, FIRST_DISPLAY_LINE, FIRST_DISPLAY_DOT + DISPLAY_WIDTH) == BORDER_PIXEL);
    ensure!(pixel(frame, FIRST_DISPLAY_LINE - 1, FIRST_DISPLAY_DOT) == BORDER_PIXEL);
    ensure!(pixel(frame, FIRST_DISPLAY_LINE + 240, FIRST_DISPLAY_DOT) == BORDER_PIXEL);
    Ok(())
}

#[test]
fn row_buffer_tracks_frame_in_progress() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    set_register(&mut vdc, Register::Control, Control::BACKGROUND.bits());
    vdc.run_frame();
    run_to(&mut vdc, 100, 0)?;

    let drawn = FIRST_DISPLAY_LINE + 30;
    let line = vdc
        .row_buffer(drawn)
        .ok_or_else(|| anyhow::anyhow!("row {drawn} missing"))?;
    ensure!(line == row(vdc.screen_buffer(), drawn));
    ensure!(line[FIRST_DISPLAY_DOT] == BG_OPAQUE);
    ensure!(vdc.row_buffer(SCREEN_HEIGHT - 1).is_some());
    ensure!(vdc.row_buffer(SCREEN_HEIGHT).is_none());
    Ok(())
}

#[test]
fn fine_scroll_x_shifts_pixels() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    set_register(&mut vdc, Register::Control, Control::BACKGROUND.bits());
    set_register(&mut vdc, Register::ScrollX, 3);
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    ensure!(display_pixel(frame, 10, 0) == 0);
    ensure!(display_pixel(frame, 10, 5) == BG_OPAQUE);
    ensure!(display_pixel(frame, 10, 13) == BG_OPAQUE);
    Ok(())
}

#[test]
fn scroll_x_writes_take_effect_at_the_latch() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    set_register(&mut vdc, Register::Control, Control::BACKGROUND.bits());

    // After the latch of line 100: that line keeps the old scroll.
    run_to(&mut vdc, 100, 100)?;
    set_register(&mut vdc, Register::ScrollX, 3);
    // Before the latch of line 150: that line already uses the new value.
    run_to(&mut vdc, 150, 10)?;
    set_register(&mut vdc, Register::ScrollX, 0);
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    ensure!(pixel(frame, 100, FIRST_DISPLAY_DOT) == BG_OPAQUE);
    ensure!(pixel(frame, 101, FIRST_DISPLAY_DOT) == 0);
    ensure!(pixel(frame, 101, FIRST_DISPLAY_DOT + 5) == BG_OPAQUE);
    ensure!(pixel(frame, 149, FIRST_DISPLAY_DOT + 5) == BG_OPAQUE);
    ensure!(pixel(frame, 150, FIRST_DISPLAY_DOT) == BG_OPAQUE);
    Ok(())
}

#[test]
fn scroll_y_write_restarts_from_written_value() -> Result<()> {
    let mut vdc = Vdc::new();
    top_row_background(&mut vdc)?;
    set_register(&mut vdc, Register::Control, Control::BACKGROUND.bits());
    set_register(&mut vdc, Register::ScrollY, 2);
    run_to(&mut vdc, 50, 100)?;
    set_register(&mut vdc, Register::ScrollY, 0x10);
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    let opaque = |line: usize| pixel(frame, line, FIRST_DISPLAY_DOT) == BG_OPAQUE;
    // Lines 20.. start at y = 2, so y = 8 falls on line 26.
    ensure!(!opaque(25) && opaque(26) && opaque(34) && opaque(50));
    // Line 51 starts at y = 0x11; the next tile row begins at line 58.
    ensure!(!opaque(51) && !opaque(57) && opaque(58));
    Ok(())
}

#[test]
fn sprite_budget_drops_excess_cells() -> Result<()> {
    let mut vdc = Vdc::new();
    load_solid_sprite_pattern(&mut vdc, SPRITE_PATTERN)?;
    for i in 0..17u16 {
        load_sprite(&mut vdc, i as u32, sprite_entry(10, i * 15, 5, true))?;
    }
    set_register(
        &mut vdc,
        Register::Control,
        (Control::SPRITES | Control::OVERFLOW_IRQ).bits(),
    );
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    let sprite = 0x100 | (5 << 4) | 1;
    ensure!(display_pixel(frame, 10, 0) == sprite);
    ensure!(display_pixel(frame, 10, 235) == sprite);
    ensure!(display_pixel(frame, 10, 250) == 0, "17th sprite was drawn");
    ensure!(display_pixel(frame, 9, 0) == 0);
    ensure!(vdc.peek_status() & Status::OVERFLOW.bits() != 0);
    Ok(())
}

#[test]
fn sprites_within_budget_render_without_overflow() -> Result<()> {
    let mut vdc = Vdc::new();
    load_solid_sprite_pattern(&mut vdc, SPRITE_PATTERN)?;
    for i in 0..16u16 {
        load_sprite(&mut vdc, i as u32, sprite_entry(10, i * 16, 1, true))?;
    }
    set_register(
        &mut vdc,
        Register::Control,
        (Control::SPRITES | Control::OVERFLOW_IRQ).bits(),
    );
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    ensure!((0..DISPLAY_WIDTH).all(|x| display_pixel(frame, 10, x) == 0x111));
    ensure!(vdc.peek_status() & Status::OVERFLOW.bits() == 0);
    Ok(())
}

#[test]
fn sprite_priority_against_background() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    load_solid_sprite_pattern(&mut vdc, SPRITE_PATTERN)?;
    load_sprite(&mut vdc, 0, sprite_entry(10, 0, 3, false))?;
    load_sprite(&mut vdc, 1, sprite_entry(10, 64, 4, true))?;
    set_register(
        &mut vdc,
        Register::Control,
        (Control::SPRITES | Control::BACKGROUND).bits(),
    );
    vdc.run_frame();

    let frame = vdc.previous_screen_buffer();
    // Behind: background wins where it is opaque.
    ensure!(display_pixel(frame, 10, 0) == BG_OPAQUE);
    ensure!(display_pixel(frame, 10, 1) == 0x131);
    // In front: sprite covers the background.
    ensure!(display_pixel(frame, 10, 64) == 0x141);
    ensure!(display_pixel(frame, 10, 80) == BG_OPAQUE);
    Ok(())
}

#[test]
fn sprite_zero_collision_sets_status() -> Result<()> {
    let mut vdc = Vdc::new();
    load_solid_sprite_pattern(&mut vdc, SPRITE_PATTERN)?;
    load_sprite(&mut vdc, 0, sprite_entry(40, 100, 2, true))?;
    load_sprite(&mut vdc, 1, sprite_entry(40, 110, 6, true))?;
    set_register(&mut vdc, Register::Control, Control::SPRITES.bits());
    vdc.run_frame();
    ensure!(vdc.peek_status() & Status::COLLISION.bits() == 0);

    set_register(
        &mut vdc,
        Register::Control,
        (Control::SPRITES | Control::COLLISION_IRQ).bits(),
    );
    vdc.run_frame();
    ensure!(vdc.peek_status() & Status::COLLISION.bits() != 0);

    // First sprite in table order wins the overlap.
    let frame = vdc.previous_screen_buffer();
    ensure!(display_pixel(frame, 40, 112) == 0x121);
    Ok(())
}

#[test]
fn burst_mode_outputs_border() -> Result<()> {
    let mut vdc = Vdc::new();
    striped_background(&mut vdc)?;
    vdc.run_frame();
    let frame = vdc.previous_screen_buffer();
    ensure!(display_pixel(frame, 0, 0) == BORDER_PIXEL);
    ensure!(display_pixel(frame, 100, 8) == BORDER_PIXEL);
    Ok(())
}

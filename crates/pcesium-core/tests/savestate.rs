mod common;

use anyhow::{Result, ensure};
use common::{fill_bat, load_solid_sprite_pattern, load_sprite, load_tile, run_to, set_register};
use ctor::ctor;
use pcesium_core::{
    Register, SaveState, SnapshotMeta, Vdc, VdcState,
    memory::vdc::MAX_SCREEN_WIDTH,
    state::Snapshot,
    vdc::{Control, DmaControl},
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

const SAVE_LINE: u16 = 120;
const SAVE_DOT: u16 = 150;

/// Background, sprites, a scroll change and a VRAM transfer still running
/// when the snapshot is taken.
fn busy_scene() -> Result<Vdc> {
    let mut vdc = Vdc::new();
    fill_bat(&mut vdc, 0x3100)?;
    load_tile(&mut vdc, 0x100, [(0x8181, 0x00FF); 8])?;
    load_solid_sprite_pattern(&mut vdc, 0x80)?;
    for i in 0..8u16 {
        load_sprite(&mut vdc, i as u32, [64 + 90 + i * 6, 32 + i * 20, 0x80 << 1, 0x0080 | i])?;
    }
    set_register(
        &mut vdc,
        Register::Control,
        (Control::BACKGROUND | Control::SPRITES | Control::RASTER_IRQ).bits(),
    );
    set_register(&mut vdc, Register::RasterCompare, 0x40 + 130);
    set_register(&mut vdc, Register::ScrollY, 5);
    vdc.run_frame();

    run_to(&mut vdc, SAVE_LINE, 100)?;
    set_register(&mut vdc, Register::ScrollX, 0x0013);
    set_register(&mut vdc, Register::DmaControl, DmaControl::VRAM_IRQ.bits() as u16);
    set_register(&mut vdc, Register::DmaSource, 0x1000);
    set_register(&mut vdc, Register::DmaDestination, 0x1800);
    set_register(&mut vdc, Register::DmaLength, 0x007F);
    run_to(&mut vdc, SAVE_LINE, SAVE_DOT)?;
    Ok(vdc)
}

fn tail(frame: &[u16]) -> &[u16] {
    &frame[SAVE_LINE as usize * MAX_SCREEN_WIDTH + SAVE_DOT as usize..]
}

#[test]
fn restored_controller_draws_identical_frames() -> Result<()> {
    let mut original = busy_scene()?;
    ensure!(original.debug_state().vram_dma_active, "transfer should be in flight");
    let snapshot = original.save(SnapshotMeta::default())?;

    let mut restored = Vdc::new();
    restored.load(&snapshot)?;
    ensure!(restored.debug_state() == original.debug_state());

    original.run_frame();
    restored.run_frame();
    ensure!(tail(original.previous_screen_buffer()) == tail(restored.previous_screen_buffer()));
    ensure!(original.peek_status() == restored.peek_status());

    original.run_frame();
    restored.run_frame();
    ensure!(original.previous_screen_buffer() == restored.previous_screen_buffer());
    ensure!(original.previous_row_clock_dividers() == restored.previous_row_clock_dividers());
    ensure!((0..0x8000).all(|addr| original.peek_vram(addr) == restored.peek_vram(addr)));
    Ok(())
}

#[test]
fn failed_load_keeps_running_state() -> Result<()> {
    let mut vdc = busy_scene()?;
    let before = vdc.debug_state();
    let mut snapshot: Snapshot<VdcState> = vdc.save(SnapshotMeta::default())?;
    snapshot.data.sprite_ram.truncate(10);

    ensure!(vdc.load(&snapshot).is_err());
    ensure!(vdc.debug_state() == before);
    Ok(())
}

#[cfg(feature = "savestate-postcard")]
#[test]
fn postcard_snapshot_restores_mid_frame() -> Result<()> {
    let mut original = busy_scene()?;
    let bytes = original.save(SnapshotMeta::default())?.to_postcard_bytes()?;

    let mut restored = Vdc::new();
    restored.load(&Snapshot::<VdcState, SnapshotMeta>::from_postcard_bytes(&bytes)?)?;
    original.run_frame();
    restored.run_frame();
    ensure!(tail(original.previous_screen_buffer()) == tail(restored.previous_screen_buffer()));
    Ok(())
}

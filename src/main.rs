//! First-person software viewer for WAD levels.
//!
//! ```bash
//! cargo run --release            # reads config.toml next to the binary
//! RUST_LOG=info cargo run --release
//! ```
//!
//! WASD moves, ←/→ turn, Escape quits.

use std::error::Error;
use std::time::Instant;

use glam::Vec3;
use log::error;
use minifb::Key;

use wadview::config::Config;
use wadview::render::{Pixel, Renderer, RendererConfig, WindowSurface};
use wadview::wad::Archive;
use wadview::world::{load_map, Camera, Map};

/// Map units per second.
const MOVE_SPEED: f32 = 240.0;
/// Degrees per second.
const TURN_SPEED: f32 = 150.0;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default("config.toml")?;

    let archive = Archive::open(&config.archive.path)?;
    let map = load_map(&archive, &config.archive.level)?;

    let mut camera = spawn_camera(&map, &config);

    let (width, height) = (config.window.width, config.window.height);
    let mut surface = WindowSurface::new(&config.window.title, width, height)?;
    let mut renderer = Renderer::new(width, height, RendererConfig::default())?;

    let clear_color = Pixel::rgb(24, 24, 24);
    let mut last = Instant::now();
    while surface.window().is_open() && !surface.window().is_key_down(Key::Escape) {
        let dt = last.elapsed().as_secs_f32().min(0.1);
        last = Instant::now();

        handle_input(surface.window(), &mut camera, dt);
        snap_to_floor(&map, &mut camera, config.camera.eye_height);

        // Presenting happens inside `present`; a panic on the way there
        // still unmaps the buffer through the frame's scoped teardown.
        let mut frame = renderer.begin_frame(&mut surface, &map, &camera)?;
        frame.clear(clear_color);
        frame.draw_node(map.bsp_root)?;
        frame.present()?;
    }
    Ok(())
}

/// Camera from the config, repositioned onto the level's player start
/// when it has one.
fn spawn_camera(map: &Map, config: &Config) -> Camera {
    let cam = &config.camera;
    let mut position = Vec3::from(cam.position);
    let mut rotation = cam.rotation;
    if let Some(start) = map.player_start() {
        position.x = start.pos.x;
        position.z = start.pos.y;
        rotation = start.angle;
    }
    Camera::new(position, rotation, cam.fov, cam.near_plane, cam.far_plane)
}

fn handle_input(window: &minifb::Window, camera: &mut Camera, dt: f32) {
    let mut forward = 0.0;
    let mut side = 0.0;
    if window.is_key_down(Key::W) || window.is_key_down(Key::Up) {
        forward += MOVE_SPEED * dt;
    }
    if window.is_key_down(Key::S) || window.is_key_down(Key::Down) {
        forward -= MOVE_SPEED * dt;
    }
    if window.is_key_down(Key::D) {
        side += MOVE_SPEED * dt;
    }
    if window.is_key_down(Key::A) {
        side -= MOVE_SPEED * dt;
    }
    if forward != 0.0 || side != 0.0 {
        camera.step(forward, side);
    }
    if window.is_key_down(Key::Left) {
        camera.turn(TURN_SPEED * dt);
    }
    if window.is_key_down(Key::Right) {
        camera.turn(-TURN_SPEED * dt);
    }
}

/// Keep the eye a fixed height above the floor of whatever sector the
/// camera is standing in.
fn snap_to_floor(map: &Map, camera: &mut Camera, eye_height: f32) {
    if let Ok(subsector) = map.locate(camera.ground_position()) {
        let sector = &map.sectors[map.sector_of_subsector(subsector) as usize];
        let mut position = camera.position();
        position.y = sector.floor_height as f32 + eye_height;
        camera.set_position(position);
    }
}

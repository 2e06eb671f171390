//! Software renderer for classic 2.5-D level archives.
//!
//! The crate is split along the data flow:
//!
//! * [`wad`] — archive parsing: directory, named lumps, typed records.
//! * [`world`] — the linked map (arenas + BSP) and the camera.
//! * [`render`] — the per-frame column renderer and the pixel surface
//!   it writes to.
//! * [`config`] — TOML configuration consumed by the binary.

pub mod config;
pub mod render;
pub mod wad;
pub mod world;

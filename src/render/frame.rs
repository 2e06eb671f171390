//! Per-frame column renderer.
//!
//! A [`Frame`] holds exclusive write access to the surface buffer from
//! creation until it is presented; dropping it presents on every exit
//! path.  Drawing walks the BSP front-to-back, projects each seg onto a
//! screen-column span and fills the visible vertical strip of every
//! column, while two pieces of bookkeeping keep the work bounded:
//!
//! * `occluded` — columns fully covered by solid walls; once it spans
//!   the whole screen the frame is complete and drawing short-circuits.
//! * `visible_rows` — the per-column row window that two-sided "window"
//!   walls tighten as the walk recedes.

use std::ops::ControlFlow;

use glam::Vec2;
use log::warn;

use super::spans::{Span, SpanSet};
use super::surface::PixelSurface;
use super::{Pixel, RenderError, Renderer, SCALE_MAX, SCALE_MIN};
use crate::world::{BspError, Camera, Map, NodeId, SegId, SubsectorId};

pub struct Frame<'a, S: PixelSurface> {
    renderer: &'a mut Renderer,
    surface: &'a mut S,
    map: &'a Map,
    camera: &'a Camera,
    /// Camera ground position, read once at frame begin.
    eye: Vec2,
    /// Eye-to-screen-plane distance in pixels.
    screen_distance: f32,
    occluded: SpanSet,
    /// Per-column `[row_start, row_end)` still open for drawing.
    /// Rows count bottom-to-top in world sense; `fill_column` flips to
    /// the buffer's top-to-bottom layout.
    visible_rows: Vec<(u16, u16)>,
    presented: bool,
}

impl<'a, S: PixelSurface> Frame<'a, S> {
    pub(crate) fn begin(
        renderer: &'a mut Renderer,
        surface: &'a mut S,
        map: &'a Map,
        camera: &'a Camera,
    ) -> Result<Self, RenderError> {
        let (width, height) = surface.size();
        if width != renderer.width() || height != renderer.height() {
            return Err(RenderError::FrameError(format!(
                "surface is {width}x{height}, renderer targets {}x{}",
                renderer.width(),
                renderer.height()
            )));
        }
        let buffer_len = surface.acquire_write().len();
        if buffer_len != width * height {
            return Err(RenderError::FrameError(format!(
                "surface buffer holds {buffer_len} pixels, expected {}",
                width * height
            )));
        }

        let eye = camera.ground_position();
        let screen_distance = camera.screen_plane_distance(width);
        let visible_rows = vec![(0u16, height as u16); width];
        Ok(Self {
            renderer,
            surface,
            map,
            camera,
            eye,
            screen_distance,
            occluded: SpanSet::new(),
            visible_rows,
            presented: false,
        })
    }

    /// Fill the whole buffer and reset the occlusion bookkeeping.
    pub fn clear(&mut self, color: Pixel) {
        self.surface.acquire_write().fill(color);
        self.occluded.clear();
        let height = self.renderer.height() as u16;
        self.visible_rows.fill((0, height));
    }

    /// True once solid walls cover every column; further draw calls are
    /// no-ops.
    pub fn is_complete(&self) -> bool {
        self.occluded.is_full(self.renderer.width() as u32)
    }

    /// Declare the image final and present it.
    pub fn present(mut self) -> Result<(), RenderError> {
        self.presented = true;
        self.surface.release_and_present()
    }

    /*──────────────────────── BSP walk ─────────────────────────────*/

    /// Draw the subtree under `id` front-to-back, breaking off as soon
    /// as solid walls cover the whole screen.  The traversal order is
    /// [`Map::walk_front_to_back`]'s.
    pub fn draw_node(&mut self, id: NodeId) -> Result<(), BspError> {
        if self.is_complete() {
            return Ok(());
        }
        let map = self.map;
        map.walk_front_to_back(id, self.eye, &mut |subsector| {
            self.draw_subsector(subsector);
            if self.is_complete() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(())
    }

    pub fn draw_subsector(&mut self, id: SubsectorId) {
        if self.is_complete() {
            return;
        }
        let map = self.map;
        for seg_id in map.seg_ids_of(id) {
            self.draw_seg(seg_id);
        }
    }

    /*──────────────────────── one seg ──────────────────────────────*/

    pub fn draw_seg(&mut self, id: SegId) {
        if self.is_complete() {
            return;
        }
        let map = self.map;
        let seg = &map.segs[id as usize];
        let near = self.camera.near_plane();
        let far = self.camera.far_plane();

        let mut p1 = self.camera.to_view(map.vertices[seg.start as usize].pos);
        let mut p2 = self.camera.to_view(map.vertices[seg.end as usize].pos);

        // Trivial rejection: both endpoints on the far side of the same
        // frustum plane.
        if (p1.x < near && p2.x < near) || (p1.x > far && p2.x > far) {
            return;
        }
        let half_tan = (self.camera.fov().to_radians() * 0.5).tan();
        if p1.x > 0.0 && p2.x > 0.0 {
            if p1.y > p1.x * half_tan && p2.y > p2.x * half_tan {
                return;
            }
            if p1.y < -p1.x * half_tan && p2.y < -p2.x * half_tan {
                return;
            }
        }

        if !clip_near(&mut p1, &mut p2, near) {
            return;
        }

        // Project to screen-plane coordinates and then to columns.
        let sy1 = self.screen_distance * p1.y / p1.x;
        let sy2 = self.screen_distance * p2.y / p2.x;
        let col_start = self.column_of(sy1);
        let col_end = self.column_of(sy2);
        if col_start >= col_end {
            // Back-facing or projected to zero width.
            return;
        }

        let sidedef = &map.sidedefs[seg.sidedef as usize];
        let sector = &map.sectors[sidedef.sector as usize];
        if sector.floor_height > sector.ceiling_height {
            warn!(
                "seg {id} of {} faces sector with floor {} above ceiling {}; skipped",
                map.name, sector.floor_height, sector.ceiling_height
            );
            return;
        }

        let span = Span::new(col_start, col_end);
        let gaps = self.occluded.gaps_within(span);
        if gaps.is_empty() {
            return; // fully occluded
        }

        let scale1 = self.scale_of(p1.x);
        let scale2 = self.scale_of(p2.x);
        let opposite = map.opposite_sector(seg).map(|s| &map.sectors[s as usize]);

        let middle_shade = self.shade_for(&sidedef.middle_texture);
        let lower_shade = self.shade_for(&sidedef.lower_texture);
        let upper_shade = self.shade_for(&sidedef.upper_texture);

        let half_w = self.renderer.width() as f32 * 0.5;
        let sy_span = sy2 - sy1;

        for gap in &gaps {
            for col in gap.start..gap.end {
                // Interpolate depth scale by the screen-plane parameter.
                let sy_col = half_w - col as f32;
                let v = ((sy_col - sy1) / sy_span).clamp(0.0, 1.0);
                let scale = scale1 + (scale2 - scale1) * v;

                let window = self.visible_rows[col as usize];
                match opposite {
                    None => {
                        // Solid wall: one strip from floor to ceiling.
                        let rows = self.row_range(
                            sector.floor_height,
                            sector.ceiling_height,
                            scale,
                        );
                        self.fill_column(col, clip_rows(rows, window), middle_shade);
                    }
                    Some(back) => {
                        // Window wall: a lower frame where the far floor
                        // is higher, an upper frame where the far
                        // ceiling is lower, then a tighter row window.
                        if back.floor_height > sector.floor_height {
                            let rows = self.row_range(
                                sector.floor_height,
                                back.floor_height,
                                scale,
                            );
                            self.fill_column(col, clip_rows(rows, window), lower_shade);
                        }
                        if back.ceiling_height < sector.ceiling_height {
                            let rows = self.row_range(
                                back.ceiling_height,
                                sector.ceiling_height,
                                scale,
                            );
                            self.fill_column(col, clip_rows(rows, window), upper_shade);
                        }
                        let through =
                            self.row_range(back.floor_height, back.ceiling_height, scale);
                        self.visible_rows[col as usize] = clip_rows(through, window);
                    }
                }
            }
        }

        // Only solid walls occlude what is behind them.
        if opposite.is_none() {
            self.occluded.insert(span);
        }
    }

    /*──────────────────────── projection ───────────────────────────*/

    /// Column for a screen-plane lateral coordinate, clamped to `[0, W]`.
    fn column_of(&self, screen_y: f32) -> u32 {
        let w = self.renderer.width() as f32;
        (w - (screen_y + w * 0.5).clamp(0.0, w)) as u32
    }

    /// Projection scale at view-space depth `vx`, clamped so degenerate
    /// depths cannot produce unbounded row ranges.
    fn scale_of(&self, vx: f32) -> f32 {
        if vx <= self.camera.near_plane() {
            return SCALE_MAX;
        }
        (self.screen_distance / vx).clamp(SCALE_MIN, SCALE_MAX)
    }

    /// Screen-row strip `[floor_row, ceiling_row)` of a wall slice at
    /// `scale`, in bottom-to-top world rows clamped to `[0, H]`.
    fn row_range(&self, floor: i16, ceiling: i16, scale: f32) -> (u16, u16) {
        let h = self.renderer.height() as f32;
        let half = h * 0.5;
        let eye_y = self.camera.position().y;
        let floor_row = (half + (floor as f32 - eye_y) * scale).round().clamp(0.0, h);
        let ceiling_row = (half + (ceiling as f32 - eye_y) * scale).round().clamp(0.0, h);
        (floor_row as u16, ceiling_row as u16)
    }

    fn shade_for(&mut self, texture: &str) -> Pixel {
        if texture.is_empty() || texture == "-" {
            self.renderer.config().fill_color
        } else {
            self.renderer.shades_mut().shade(texture)
        }
    }

    /// Write one vertical strip; `rows` are world-sense and get flipped
    /// into the buffer's top-to-bottom layout.
    fn fill_column(&mut self, col: u32, rows: (u16, u16), color: Pixel) {
        let (lo, hi) = rows;
        if lo >= hi {
            return;
        }
        let width = self.renderer.width();
        let height = self.renderer.height();
        let x = col as usize;
        let buffer = self.surface.acquire_write();
        for row in lo..hi {
            let y = height - 1 - row as usize;
            buffer[y * width + x] = color;
        }
    }
}

impl<S: PixelSurface> Drop for Frame<'_, S> {
    fn drop(&mut self) {
        if !self.presented {
            if let Err(e) = self.surface.release_and_present() {
                warn!("frame present failed during teardown: {e}");
            }
        }
    }
}

/// Intersect a row strip with a column's visible window.
fn clip_rows(rows: (u16, u16), window: (u16, u16)) -> (u16, u16) {
    let lo = rows.0.max(window.0);
    let hi = rows.1.min(window.1);
    (lo, hi.max(lo))
}

/// Clip a view-space segment against the near plane `vx >= near`.
/// Returns `false` when the segment lies wholly behind it; otherwise the
/// clipped endpoint is replaced by the exact intersection.
fn clip_near(p1: &mut Vec2, p2: &mut Vec2, near: f32) -> bool {
    if p1.x < near && p2.x < near {
        return false;
    }
    if p1.x < near {
        let t = (near - p1.x) / (p2.x - p1.x);
        *p1 += (*p2 - *p1) * t;
        p1.x = near;
    } else if p2.x < near {
        let t = (near - p2.x) / (p1.x - p2.x);
        *p2 += (*p1 - *p2) * t;
        p2.x = near;
    }
    true
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/

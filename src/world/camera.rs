//! Player view-point in world space.

use glam::{Vec2, Vec3};

/// The camera holds a 3-D position and a heading around the vertical
/// axis.  There is no pitch; the view direction is always horizontal.
///
/// World axes: the map's 2-D plane is (x, z); `position.y` is height.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    position: Vec3,
    /// Heading in degrees around the vertical axis.
    rotation: f32,
    /// Horizontal field of view in degrees.
    fov: f32,
    near_plane: f32,
    far_plane: f32,
}

impl Camera {
    pub fn new(position: Vec3, rotation: f32, fov: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            position,
            rotation,
            fov,
            near_plane,
            far_plane,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// The 2-D position used for all BSP and projection work.
    pub fn ground_position(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation.rem_euclid(360.0);
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Transform a map-plane point into view space: translate by the
    /// camera's ground position, then rotate clockwise by the heading.
    ///
    /// Returns `(depth, lateral)`: `.x` grows along the view direction,
    /// `.y` grows to the viewer's left.
    pub fn to_view(&self, p: Vec2) -> Vec2 {
        let rel = p - self.ground_position();
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Vec2::new(rel.x * cos + rel.y * sin, rel.y * cos - rel.x * sin)
    }

    /// Distance from the eye to the screen plane for a viewport `width`
    /// pixels wide: `(width/2) / tan(fov/2)`.
    pub fn screen_plane_distance(&self, width: usize) -> f32 {
        (width as f32 * 0.5) / (self.fov.to_radians() * 0.5).tan()
    }

    /// Unit vector of the view direction on the ground plane.
    pub fn forward(&self) -> Vec2 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Vec2::new(cos, sin)
    }

    /// Move on the ground plane: `forward` units along the heading and
    /// `side` units to the viewer's right.  Height is untouched.
    pub fn step(&mut self, forward: f32, side: f32) {
        let f = self.forward();
        let r = Vec2::new(f.y, -f.x);
        self.position.x += f.x * forward + r.x * side;
        self.position.z += f.y * forward + r.y * side;
    }

    /// Turn around the vertical axis by `delta` degrees (positive =
    /// counter-clockwise in map space).
    pub fn turn(&mut self, delta: f32) {
        self.set_rotation(self.rotation + delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(rotation: f32) -> Camera {
        Camera::new(Vec3::ZERO, rotation, 90.0, 0.1, 1000.0)
    }

    #[test]
    fn view_axes_align_with_heading() {
        let cam = camera_at(0.0);
        // Straight ahead: pure depth.
        let v = cam.to_view(Vec2::new(10.0, 0.0));
        assert!((v - Vec2::new(10.0, 0.0)).length() < 1e-5);
        // To the viewer's left: pure lateral.
        let v = cam.to_view(Vec2::new(0.0, 5.0));
        assert!((v - Vec2::new(0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn view_rotates_with_heading() {
        let cam = camera_at(90.0);
        let v = cam.to_view(Vec2::new(0.0, 10.0));
        assert!((v - Vec2::new(10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn view_translates_with_position() {
        let mut cam = camera_at(0.0);
        cam.set_position(Vec3::new(3.0, 41.0, 4.0));
        let v = cam.to_view(Vec2::new(13.0, 4.0));
        assert!((v - Vec2::new(10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn screen_plane_distance_at_90_deg() {
        let cam = camera_at(0.0);
        assert!((cam.screen_plane_distance(640) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn step_moves_along_heading() {
        let mut cam = camera_at(90.0);
        cam.step(10.0, 0.0);
        assert!((cam.ground_position() - Vec2::new(0.0, 10.0)).length() < 1e-4);

        let mut cam = camera_at(0.0);
        cam.step(0.0, 2.0);
        // Strafing right at heading 0 moves toward -z.
        assert!((cam.ground_position() - Vec2::new(0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_wraps() {
        let mut cam = camera_at(350.0);
        cam.turn(20.0);
        assert!((cam.rotation() - 10.0).abs() < 1e-4);
        cam.turn(-30.0);
        assert!((cam.rotation() - 340.0).abs() < 1e-4);
    }
}

//! Provides the off-screen orthographic capture pipeline.
//!
//! This module handles rasterization only: it takes whatever parts currently
//! sit on the capture layer and converts them to pixels using an orthographic
//! camera, flat shading from a point light riding at the camera, and a
//! z-buffer. The color and depth buffers live in one [`CaptureTarget`] that
//! is cleared and reused for every capture in a run.
//!
//! No GPU is required; it runs entirely on the CPU.
//!
//! # Examples
//! ```
//! use scenepics::render::{render, CaptureCamera, CaptureTarget};
//! use scenepics::scene::Scene;
//!
//! let scene = Scene::new("Empty");
//! let mut target = CaptureTarget::new(64, 64);
//! render(&scene, &CaptureCamera::new(3), &mut target);
//! // Nothing on the capture layer: every pixel is background
//! assert!(target.read_pixels().chunks(4).all(|px| px == [255, 255, 255, 255]));
//! ```

use glam::{Mat4, Vec3, Vec4};

use crate::scene::Scene;

/// The fixed clear color behind every capture (opaque white).
pub const BACKGROUND: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A fixed-size off-screen color + depth buffer, reused across captures.
///
/// # Examples
/// ```
/// use scenepics::render::CaptureTarget;
///
/// let target = CaptureTarget::new(256, 256);
/// assert_eq!(target.read_pixels().len(), 256 * 256 * 4);
/// ```
pub struct CaptureTarget {
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
}

impl CaptureTarget {
    /// Allocates a target cleared to [`BACKGROUND`].
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![BACKGROUND; pixels],
            depth: vec![f32::INFINITY; pixels],
        }
    }

    /// Returns the target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resets color and depth without reallocating.
    pub fn clear(&mut self, color: [f32; 4]) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    /// Reads the color buffer back as RGBA8, row-major from the top-left.
    pub fn read_pixels(&self) -> Vec<u8> {
        let count = self.color.len();
        let mut pixels = vec![0u8; count * 4];
        for i in 0..count {
            pixels[i * 4] = (self.color[i][0].clamp(0.0, 1.0) * 255.0) as u8;
            pixels[i * 4 + 1] = (self.color[i][1].clamp(0.0, 1.0) * 255.0) as u8;
            pixels[i * 4 + 2] = (self.color[i][2].clamp(0.0, 1.0) * 255.0) as u8;
            pixels[i * 4 + 3] = (self.color[i][3].clamp(0.0, 1.0) * 255.0) as u8;
        }
        pixels
    }
}

/// An orthographic capture viewpoint looking along +Z, with a point light at
/// the camera position so captured geometry is lit regardless of the scene.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use scenepics::render::CaptureCamera;
/// use scenepics::scene::Aabb;
///
/// let mut camera = CaptureCamera::new(3);
/// camera.frame(Aabb::new(Vec3::ZERO, Vec3::new(4.0, 2.0, 1.0)), 0.5);
/// assert_eq!(camera.half_size, 2.5);
/// assert_eq!(camera.far, 2.0);
/// ```
pub struct CaptureCamera {
    /// World-space camera position.
    pub position: Vec3,
    /// Half the height/width of the orthographic view volume.
    pub half_size: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Only nodes on this layer are rendered.
    pub culling_layer: u8,
}

impl CaptureCamera {
    /// Creates a camera culling to `layer` with placeholder framing.
    pub fn new(layer: u8) -> Self {
        Self {
            position: Vec3::ZERO,
            half_size: 1.0,
            near: 0.0,
            far: 1000.0,
            culling_layer: layer,
        }
    }

    /// Frames `bounds` with a fixed `margin` on every side: centered on the
    /// bounds' x/y center, placed `margin` in front of the near z face,
    /// half-size covering the larger of width and height plus the margin,
    /// far clip covering the full depth plus a margin at both ends.
    pub fn frame(&mut self, bounds: crate::scene::Aabb, margin: f32) {
        let center = bounds.center();
        let size = bounds.size();
        self.position = Vec3::new(center.x, center.y, bounds.min.z - margin);
        self.half_size = size.x.max(size.y) / 2.0 + margin;
        self.near = 0.0;
        self.far = size.z + 2.0 * margin;
    }

    /// Returns the combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.position + Vec3::Z, Vec3::Y);
        let proj = Mat4::orthographic_rh_gl(
            -self.half_size,
            self.half_size,
            -self.half_size,
            self.half_size,
            self.near,
            self.far,
        );
        proj * view
    }
}

/// Rasterizes every part currently on the camera's culling layer into the
/// target. A part draws only when its owning node is active through its whole
/// ancestor chain and its renderer is enabled.
pub fn render(scene: &Scene, camera: &CaptureCamera, target: &mut CaptureTarget) {
    target.clear(BACKGROUND);

    let view_proj = camera.view_proj();
    let width = target.width as f32;
    let height = target.height as f32;
    let w = target.width as usize;
    let h = target.height as usize;

    for id in scene.node_ids() {
        let node = scene.node(id);
        if node.layer != camera.culling_layer || !scene.is_active_in_hierarchy(id) {
            continue;
        }

        for part in &node.parts {
            let enabled = part.renderer.map(|r| r.enabled).unwrap_or(false);
            let Some(mesh) = part.mesh.as_deref() else {
                continue;
            };
            if !enabled {
                continue;
            }

            for tri in mesh.triangles() {
                let world = [
                    part.transform.transform_point3(tri.verts[0]),
                    part.transform.transform_point3(tri.verts[1]),
                    part.transform.transform_point3(tri.verts[2]),
                ];

                let mut screen = [Vec3::ZERO; 3];
                for i in 0..3 {
                    let clip: Vec4 = view_proj * world[i].extend(1.0);
                    // Orthographic: w is 1, no perspective divide needed
                    screen[i] = Vec3::new(
                        (clip.x * 0.5 + 0.5) * width,
                        (0.5 - clip.y * 0.5) * height,
                        clip.z,
                    );
                }

                // Face normal in world space (flat shading)
                let e1 = world[1] - world[0];
                let e2 = world[2] - world[0];
                let normal = e1.cross(e2).normalize_or_zero();

                // Point light rides at the camera position
                let centroid = (world[0] + world[1] + world[2]) / 3.0;
                let light_dir = (camera.position - centroid).normalize_or_zero();
                let ndl = normal.dot(light_dir).abs();

                let ambient = 0.15;
                let diffuse = ndl * 0.70;
                let specular = ndl.powf(32.0) * 0.10;
                let shade = (ambient + diffuse + specular).min(1.0);

                // Screen-space bounding box
                let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).max(0.0) as usize;
                let max_x = (screen[0].x.max(screen[1].x).max(screen[2].x).ceil() as usize).min(w);
                let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).max(0.0) as usize;
                let max_y = (screen[0].y.max(screen[1].y).max(screen[2].y).ceil() as usize).min(h);

                // Rasterize
                for y in min_y..max_y {
                    for x in min_x..max_x {
                        let px = x as f32 + 0.5;
                        let py = y as f32 + 0.5;

                        let (u, v, w_bary) = barycentric(screen, px, py);
                        if u < 0.0 || v < 0.0 || w_bary < 0.0 {
                            continue;
                        }

                        let z = u * screen[0].z + v * screen[1].z + w_bary * screen[2].z;
                        // Clip against the near/far planes
                        if !(-1.0..=1.0).contains(&z) {
                            continue;
                        }

                        let idx = y * w + x;
                        if z < target.depth[idx] {
                            target.depth[idx] = z;
                            target.color[idx] = [
                                (tri.color[0] * shade).min(1.0),
                                (tri.color[1] * shade).min(1.0),
                                (tri.color[2] * shade).min(1.0),
                                1.0,
                            ];
                        }
                    }
                }
            }
        }
    }
}

fn barycentric(tri: [Vec3; 3], px: f32, py: f32) -> (f32, f32, f32) {
    let v0x = tri[1].x - tri[0].x;
    let v0y = tri[1].y - tri[0].y;
    let v1x = tri[2].x - tri[0].x;
    let v1y = tri[2].y - tri[0].y;
    let v2x = px - tri[0].x;
    let v2y = py - tri[0].y;

    let d00 = v0x * v0x + v0y * v0y;
    let d01 = v0x * v1x + v0y * v1y;
    let d11 = v1x * v1x + v1y * v1y;
    let d20 = v2x * v0x + v2y * v0y;
    let d21 = v2x * v1x + v2y * v1y;

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-10 {
        return (-1.0, -1.0, -1.0);
    }

    let inv = 1.0 / denom;
    let v = (d11 * d20 - d01 * d21) * inv;
    let w = (d00 * d21 - d01 * d20) * inv;
    let u = 1.0 - v - w;

    (u, v, w)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scene::{Aabb, DrawablePart, Mesh};

    fn capture_scene() -> Scene {
        let mut scene = Scene::new("Root");
        let node = scene.add_child(scene.root(), "Cube");
        let mesh = Arc::new(Mesh::cuboid(1, Vec3::ZERO, Vec3::ONE, [0.5, 0.5, 0.5]));
        scene.add_part(node, DrawablePart::new(mesh));
        scene.node_mut(node).layer = 3;
        scene
    }

    fn framed_camera() -> CaptureCamera {
        let mut camera = CaptureCamera::new(3);
        camera.frame(Aabb::new(Vec3::ZERO, Vec3::ONE), 0.5);
        camera
    }

    #[test]
    fn test_empty_layer_renders_background_only() {
        let scene = Scene::new("Root");
        let mut target = CaptureTarget::new(32, 32);
        render(&scene, &CaptureCamera::new(3), &mut target);
        assert!(target
            .read_pixels()
            .chunks(4)
            .all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_cube_on_capture_layer_produces_pixels() {
        let scene = capture_scene();
        let camera = framed_camera();
        let mut target = CaptureTarget::new(64, 64);
        render(&scene, &camera, &mut target);
        let shaded = target
            .read_pixels()
            .chunks(4)
            .filter(|px| px != &[255, 255, 255, 255])
            .count();
        assert!(shaded > 0, "framed cube should cover some pixels");
    }

    #[test]
    fn test_wrong_layer_is_culled() {
        let mut scene = capture_scene();
        let camera = framed_camera();
        let cube = scene.node(scene.root()).children()[0];
        scene.node_mut(cube).layer = 0;
        let mut target = CaptureTarget::new(64, 64);
        render(&scene, &camera, &mut target);
        assert!(target
            .read_pixels()
            .chunks(4)
            .all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_inactive_ancestor_suppresses_draw() {
        let mut scene = capture_scene();
        let camera = framed_camera();
        scene.node_mut(scene.root()).active = false;
        let mut target = CaptureTarget::new(64, 64);
        render(&scene, &camera, &mut target);
        assert!(target
            .read_pixels()
            .chunks(4)
            .all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_disabled_renderer_suppresses_draw() {
        let mut scene = capture_scene();
        let camera = framed_camera();
        let cube = scene.node(scene.root()).children()[0];
        if let Some(renderer) = scene.node_mut(cube).parts[0].renderer.as_mut() {
            renderer.enabled = false;
        }
        let mut target = CaptureTarget::new(64, 64);
        render(&scene, &camera, &mut target);
        assert!(target
            .read_pixels()
            .chunks(4)
            .all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_target_clear_resets_between_captures() {
        let scene = capture_scene();
        let camera = framed_camera();
        let mut target = CaptureTarget::new(64, 64);
        render(&scene, &camera, &mut target);
        target.clear(BACKGROUND);
        assert!(target
            .read_pixels()
            .chunks(4)
            .all(|px| px == [255, 255, 255, 255]));
    }

    #[test]
    fn test_frame_margin_math() {
        let mut camera = CaptureCamera::new(3);
        let bounds = Aabb::new(Vec3::new(-1.0, -2.0, 4.0), Vec3::new(3.0, 0.0, 9.0));
        camera.frame(bounds, 0.5);

        // Centered on x/y, half a unit in front of the near z face
        assert_eq!(camera.position, Vec3::new(1.0, -1.0, 3.5));
        // Wider than tall: half of 4.0 plus the margin
        assert_eq!(camera.half_size, 2.5);
        assert_eq!(camera.near, 0.0);
        // Depth of 5.0 plus a margin at both ends
        assert_eq!(camera.far, 6.0);
    }
}

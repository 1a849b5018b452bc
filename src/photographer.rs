//! Provides the scene photographer: traversal, deduplication, and framing.
//!
//! The photographer walks a scene from its root, collects the drawable parts
//! of each subtree into clusters, and captures every cluster whose identity
//! has not been seen before into `<n>.png` inside the output directory. When
//! the walk finishes it writes `objects.json`, a pretty-printed mapping from
//! each generated filename to the '/'-joined hierarchy path it photographed.
//!
//! Diagnostics go through the `log` facade; the output directory and capture
//! parameters are plain constructor data, so the photographer carries no
//! global state.
//!
//! # Examples
//! ```no_run
//! use scenepics::photographer::{Config, Photographer};
//! use scenepics::scene::Scene;
//!
//! let mut scene = Scene::new("Ship");
//! let mut photographer = Photographer::new(Config::new("ObjectPics"));
//! let manifest = photographer.run(&mut scene).unwrap();
//! assert_eq!(manifest.objects.len(), 0);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use crate::render::{render, CaptureCamera, CaptureTarget};
use crate::scene::{Aabb, NodeId, PartKind, Scene, DEFAULT_LAYER};

/// The manifest filename written next to the captures.
pub const MANIFEST_FILE: &str = "objects.json";

/// Capture configuration handed to [`Photographer::new`].
///
/// # Examples
/// ```
/// use scenepics::photographer::Config;
///
/// let config = Config::new("out/ObjectPics");
/// assert_eq!(config.size, 256);
/// assert_eq!(config.margin, 0.5);
/// assert_eq!(config.capture_layer, 3);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory the PNGs and `objects.json` are written to.
    pub output_dir: PathBuf,
    /// Edge length of the square render target in pixels.
    pub size: u32,
    /// Framing margin in world units on every side of a cluster.
    pub margin: f32,
    /// Layer parts are moved to for the duration of a capture.
    pub capture_layer: u8,
    /// Layer parts are returned to afterwards.
    pub default_layer: u8,
}

impl Config {
    /// Creates a config with the standard 256×256 target, 0.5 margin, and
    /// capture layer 3.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: 256,
            margin: 0.5,
            capture_layer: 3,
            default_layer: DEFAULT_LAYER,
        }
    }
}

/// The filename → hierarchy path mapping written as `objects.json`.
///
/// Entries appear in capture order.
///
/// # Examples
/// ```
/// use scenepics::photographer::Manifest;
///
/// let manifest = Manifest::default();
/// assert!(manifest.objects.is_empty());
/// ```
#[derive(Clone, Debug, Default, Serialize)]
pub struct Manifest {
    /// Generated filename → '/'-joined hierarchy path.
    pub objects: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Looks up the path photographed into `file_name`.
    ///
    /// # Examples
    /// ```
    /// use scenepics::photographer::Manifest;
    ///
    /// assert_eq!(Manifest::default().path_for("0.png"), None);
    /// ```
    pub fn path_for(&self, file_name: &str) -> Option<&str> {
        self.objects.get(file_name).and_then(|v| v.as_str())
    }
}

/// Errors that abort a photographer run.
///
/// Per-cluster problems (invalid parts, duplicates, missing bounds) are
/// logged skips, not errors; only filesystem and encoding failures land here.
///
/// # Examples
/// ```
/// use scenepics::photographer::PhotoError;
///
/// let err = PhotoError::from(std::io::Error::other("disk gone"));
/// assert!(format!("{}", err).contains("disk gone"));
/// ```
#[derive(Debug)]
pub enum PhotoError {
    /// Represents a directory or file write failure.
    Io(std::io::Error),
    /// Represents a PNG encoding failure.
    Image(image::ImageError),
    /// Represents a manifest serialization failure.
    Json(serde_json::Error),
}

impl std::fmt::Display for PhotoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoError::Io(e) => write!(f, "IO error: {}", e),
            PhotoError::Image(e) => write!(f, "Image error: {}", e),
            PhotoError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for PhotoError {}

impl From<std::io::Error> for PhotoError {
    fn from(e: std::io::Error) -> Self {
        PhotoError::Io(e)
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(e: image::ImageError) -> Self {
        PhotoError::Image(e)
    }
}

impl From<serde_json::Error> for PhotoError {
    fn from(e: serde_json::Error) -> Self {
        PhotoError::Json(e)
    }
}

/// Points at one drawable part inside the scene arena.
#[derive(Clone, Copy, Debug)]
struct PartRef {
    node: NodeId,
    slot: usize,
}

/// Photographs every distinct mesh cluster of a scene into PNG thumbnails.
///
/// One instance owns one reused render target and the run-scoped state
/// (seen-identity set, manifest, file counter). `run` is one-shot and
/// synchronous; re-running on an unchanged scene reproduces the same mapping.
pub struct Photographer {
    config: Config,
    camera: CaptureCamera,
    target: CaptureTarget,
    seen_ids: HashSet<i64>,
    manifest: Manifest,
    file_index: u32,
}

impl Photographer {
    /// Creates a photographer; the off-screen target is allocated once here.
    ///
    /// # Examples
    /// ```
    /// use scenepics::photographer::{Config, Photographer};
    ///
    /// let _photographer = Photographer::new(Config::new("ObjectPics"));
    /// ```
    pub fn new(config: Config) -> Self {
        let camera = CaptureCamera::new(config.capture_layer);
        let target = CaptureTarget::new(config.size, config.size);
        Self {
            config,
            camera,
            target,
            seen_ids: HashSet::new(),
            manifest: Manifest::default(),
            file_index: 0,
        }
    }

    /// Walks the whole scene, writes one PNG per distinct cluster plus the
    /// final `objects.json`, and returns the manifest.
    ///
    /// # Errors
    /// Returns an error when the output directory cannot be created or a
    /// PNG or manifest write fails. Skipped clusters are not errors.
    pub fn run(&mut self, scene: &mut Scene) -> Result<Manifest, PhotoError> {
        fs::create_dir_all(&self.config.output_dir)?;
        info!(
            "writing captures to {}",
            self.config.output_dir.display()
        );

        self.seen_ids.clear();
        self.manifest = Manifest::default();
        self.file_index = 0;

        let root = scene.root();
        let root_path = scene.node(root).name().to_string();
        self.visit(scene, root, &root_path)?;

        let json = serde_json::to_string_pretty(&self.manifest)?;
        fs::write(self.config.output_dir.join(MANIFEST_FILE), json)?;

        info!(
            "captured {} clusters from {} nodes",
            self.manifest.objects.len(),
            scene.len()
        );
        Ok(self.manifest.clone())
    }

    /// Captures this node's subtree clusters, then recurses into children.
    ///
    /// Descends regardless of whether the node carries any parts: a branch
    /// without geometry may still have drawable descendants.
    fn visit(&mut self, scene: &mut Scene, node: NodeId, path: &str) -> Result<(), PhotoError> {
        let (static_batch, skinned_batch) = collect_subtree_parts(scene, node);
        self.take_pic(scene, &static_batch, path)?;
        self.take_pic(scene, &skinned_batch, path)?;

        let children = scene.node(node).children().to_vec();
        for child in children {
            let child_path = format!("{}/{}", path, scene.node(child).name());
            self.visit(scene, child, &child_path)?;
        }
        Ok(())
    }

    /// Captures one cluster of parts under the given hierarchy path.
    fn take_pic(
        &mut self,
        scene: &mut Scene,
        parts: &[PartRef],
        path: &str,
    ) -> Result<(), PhotoError> {
        if parts.is_empty() {
            return Ok(());
        }

        // A cluster is skipped when its identity is invalid or already seen.
        // Either way the capture layer is stripped afterwards so previously
        // visited geometry never bleeds into a later unrelated capture.
        let id = cluster_identity(scene, parts);
        if id == 0 {
            debug!("skipping {}: no valid geometry", path);
            restore_layer(scene, parts, self.config.default_layer);
            return Ok(());
        }
        if !self.seen_ids.insert(id) {
            info!("already included {}, skipping", path);
            restore_layer(scene, parts, self.config.default_layer);
            return Ok(());
        }

        // Stage the cluster: structurally present but disabled parts must
        // still be capturable.
        for part_ref in parts {
            enable_ancestors(scene, part_ref.node);
            let node = scene.node_mut(part_ref.node);
            node.layer = self.config.capture_layer;
            if let Some(renderer) = node.parts[part_ref.slot].renderer.as_mut() {
                renderer.enabled = true;
            }
        }

        let Some(bounds) = cluster_bounds(scene, parts) else {
            warn!("skipping {}: no bounds", path);
            restore_layer(scene, parts, self.config.default_layer);
            return Ok(());
        };

        self.camera.frame(bounds, self.config.margin);
        render(scene, &self.camera, &mut self.target);
        let pixels = self.target.read_pixels();

        let file_name = format!("{}.png", self.file_index);
        self.file_index += 1;
        image::save_buffer(
            self.config.output_dir.join(&file_name),
            &pixels,
            self.target.width(),
            self.target.height(),
            image::ColorType::Rgba8,
        )?;

        self.manifest
            .objects
            .insert(file_name, serde_json::Value::String(path.to_string()));
        info!("{}", path);

        restore_layer(scene, parts, self.config.default_layer);
        Ok(())
    }
}

/// Collects every drawable part in the subtree rooted at `node` (the node's
/// own parts first, then depth-first through its children), split into the
/// static and skinned batches.
fn collect_subtree_parts(scene: &Scene, node: NodeId) -> (Vec<PartRef>, Vec<PartRef>) {
    let mut statics = Vec::new();
    let mut skinned = Vec::new();
    collect_into(scene, node, &mut statics, &mut skinned);
    (statics, skinned)
}

fn collect_into(scene: &Scene, node: NodeId, statics: &mut Vec<PartRef>, skinned: &mut Vec<PartRef>) {
    for (slot, part) in scene.node(node).parts.iter().enumerate() {
        let part_ref = PartRef { node, slot };
        match part.kind {
            PartKind::Static => statics.push(part_ref),
            PartKind::Skinned => skinned.push(part_ref),
        }
    }
    for &child in scene.node(node).children() {
        collect_into(scene, child, statics, skinned);
    }
}

/// Sums the part identities into the cluster identity. Any part missing its
/// renderer or mesh voids the whole batch to 0, no matter where it sits.
fn cluster_identity(scene: &Scene, parts: &[PartRef]) -> i64 {
    let mut total: i64 = 0;
    for part_ref in parts {
        match scene.node(part_ref.node).parts[part_ref.slot].identity() {
            0 => return 0,
            id => total = total.wrapping_add(id),
        }
    }
    total
}

/// Unions the world bounds of every part that has a renderer to report them.
fn cluster_bounds(scene: &Scene, parts: &[PartRef]) -> Option<Aabb> {
    let mut total: Option<Aabb> = None;
    for part_ref in parts {
        if let Some(bounds) = scene.node(part_ref.node).parts[part_ref.slot].world_bounds() {
            total = Some(match total {
                Some(current) => current.union(bounds),
                None => bounds,
            });
        }
    }
    total
}

/// Force-enables every inactive ancestor of `node`, walking upward and
/// stopping as soon as a node is already active through its whole chain.
fn enable_ancestors(scene: &mut Scene, node: NodeId) {
    let mut current = Some(node);
    while let Some(id) = current {
        if scene.is_active_in_hierarchy(id) {
            break;
        }
        scene.node_mut(id).active = true;
        current = scene.node(id).parent();
    }
}

/// Puts every part's node back on the default layer.
fn restore_layer(scene: &mut Scene, parts: &[PartRef], layer: u8) {
    for part_ref in parts {
        scene.node_mut(part_ref.node).layer = layer;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::scene::{DrawablePart, Mesh};

    fn part(id: i64) -> DrawablePart {
        DrawablePart::new(Arc::new(Mesh::cuboid(id, Vec3::ZERO, Vec3::ONE, [1.0; 3])))
    }

    #[test]
    fn test_cluster_identity_sums_parts() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        scene.add_part(a, part(3));
        scene.add_part(a, part(4));

        let (statics, _) = collect_subtree_parts(&scene, scene.root());
        assert_eq!(cluster_identity(&scene, &statics), 7);
    }

    #[test]
    fn test_invalid_part_voids_cluster_even_when_first() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        let mut invalid = part(0);
        invalid.renderer = None;
        scene.add_part(a, invalid);
        scene.add_part(a, part(4));

        let (statics, _) = collect_subtree_parts(&scene, scene.root());
        assert_eq!(cluster_identity(&scene, &statics), 0);
    }

    #[test]
    fn test_collect_visits_self_before_children() {
        let mut scene = Scene::new("Root");
        scene.add_part(scene.root(), part(1));
        let a = scene.add_child(scene.root(), "A");
        scene.add_part(a, part(2));

        let (statics, _) = collect_subtree_parts(&scene, scene.root());
        let ids: Vec<i64> = statics
            .iter()
            .map(|r| scene.node(r.node).parts[r.slot].identity())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_collect_splits_kinds() {
        let mut scene = Scene::new("Root");
        scene.add_part(scene.root(), part(1));
        scene.add_part(scene.root(), part(2).with_kind(PartKind::Skinned));

        let (statics, skinned) = collect_subtree_parts(&scene, scene.root());
        assert_eq!(statics.len(), 1);
        assert_eq!(skinned.len(), 1);
    }

    #[test]
    fn test_enable_ancestors_stops_at_active_chain() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        let b = scene.add_child(a, "B");
        scene.node_mut(a).active = false;
        scene.node_mut(b).active = false;

        enable_ancestors(&mut scene, b);
        assert!(scene.is_active_in_hierarchy(b));
    }

    #[test]
    fn test_enable_ancestors_noop_when_already_active() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        enable_ancestors(&mut scene, a);
        assert!(scene.is_active_in_hierarchy(a));
    }

    #[test]
    fn test_cluster_bounds_unions_parts() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        scene.add_part(a, part(1));
        scene.add_part(
            a,
            part(2).with_transform(glam::Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0))),
        );

        let (statics, _) = collect_subtree_parts(&scene, scene.root());
        let bounds = cluster_bounds(&scene, &statics).unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn test_cluster_bounds_none_without_renderers() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        let mut p = part(1);
        p.renderer = None;
        scene.add_part(a, p);

        let (statics, _) = collect_subtree_parts(&scene, scene.root());
        assert!(cluster_bounds(&scene, &statics).is_none());
    }
}

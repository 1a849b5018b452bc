//! Photographs every distinct mesh cluster in a scene graph.
//!
//! scenepics walks a scene snapshot from its root, groups the drawable parts
//! of each subtree into clusters, deduplicates clusters by geometry identity,
//! and renders each new cluster off-screen with an orthographic camera fitted
//! to its bounds plus a fixed margin. Captures land as `0.png`, `1.png`, …
//! in the output directory together with `objects.json`, a mapping from each
//! filename to the '/'-joined hierarchy path it shows.
//!
//! The scene model is engine-agnostic: hosts build a [`scene::Scene`]
//! snapshot (names, parent/child links, drawable parts, active flags,
//! layers) and hand it to a [`photographer::Photographer`] once, after their
//! own initialization has finished.
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//!
//! use glam::Vec3;
//! use scenepics::photographer::{Config, Photographer};
//! use scenepics::scene::{DrawablePart, Mesh, Scene};
//!
//! let mut scene = Scene::new("Ship");
//! let cockpit = scene.add_child(scene.root(), "Cockpit");
//! let mesh = Arc::new(Mesh::cuboid(42, Vec3::ZERO, Vec3::ONE, [0.7, 0.7, 0.9]));
//! scene.add_part(cockpit, DrawablePart::new(mesh));
//!
//! let mut photographer = Photographer::new(Config::new("ObjectPics"));
//! let manifest = photographer.run(&mut scene).unwrap();
//! // The root subtree is the first cluster photographed
//! assert_eq!(manifest.path_for("0.png"), Some("Ship"));
//! ```

pub mod photographer;
pub mod render;
pub mod scene;

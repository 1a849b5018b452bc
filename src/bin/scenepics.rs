//! Provides the `scenepics-cli` demo tool.
//!
//! Usage: `scenepics-cli <output_dir> [size]`
//!
//! Builds a small built-in demo scene and photographs it once into the given
//! directory, the way a host would invoke the photographer after its own
//! initialization completes. Logging goes to stderr; set `RUST_LOG` to
//! adjust verbosity.
//!
//! # Examples
//! ```text
//! scenepics-cli ObjectPics 256
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use scenepics::photographer::{Config, Photographer};
use scenepics::scene::{DrawablePart, Mesh, PartKind, Scene};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_dir> [size]", args[0]);
        eprintln!("  Photographs the built-in demo scene into <output_dir>.");
        eprintln!("  Default size: 256");
        process::exit(1);
    }

    let output_dir = PathBuf::from(&args[1]);
    let size: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(256);

    let mut config = Config::new(output_dir);
    config.size = size;

    let mut scene = demo_scene();
    let mut photographer = Photographer::new(config);

    match photographer.run(&mut scene) {
        Ok(manifest) => {
            eprintln!("Wrote {} captures and objects.json", manifest.objects.len());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// A little ship: shared cockpit geometry on two nodes (exercises dedup), an
/// inactive antenna (exercises ancestor activation), a broken part with no
/// renderer (exercises the invalid-cluster skip), and a skinned pilot.
fn demo_scene() -> Scene {
    let hull = Arc::new(Mesh::cuboid(
        1,
        Vec3::new(-2.0, -0.5, -4.0),
        Vec3::new(2.0, 0.5, 4.0),
        [0.55, 0.55, 0.60],
    ));
    let cockpit = Arc::new(Mesh::cuboid(
        2,
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.8, 0.5),
        [0.30, 0.55, 0.85],
    ));
    let antenna = Arc::new(Mesh::cuboid(
        3,
        Vec3::new(-0.05, 0.0, -0.05),
        Vec3::new(0.05, 1.5, 0.05),
        [0.80, 0.30, 0.30],
    ));
    let pilot = Arc::new(Mesh::cuboid(
        4,
        Vec3::new(-0.2, 0.0, -0.2),
        Vec3::new(0.2, 0.6, 0.2),
        [0.85, 0.70, 0.40],
    ));

    let mut scene = Scene::new("Ship");
    let root = scene.root();
    scene.add_part(root, DrawablePart::new(hull));

    let front = scene.add_child(root, "FrontCockpit");
    scene.add_part(
        front,
        DrawablePart::new(cockpit.clone()).with_transform(Mat4::from_translation(Vec3::new(
            0.0, 0.5, 2.5,
        ))),
    );

    // Same geometry again: photographed once, skipped the second time
    let rear = scene.add_child(root, "RearCockpit");
    scene.add_part(
        rear,
        DrawablePart::new(cockpit).with_transform(Mat4::from_translation(Vec3::new(
            0.0, 0.5, -2.5,
        ))),
    );

    let mast = scene.add_child(root, "Mast");
    let antenna_node = scene.add_child(mast, "Antenna");
    scene.add_part(
        antenna_node,
        DrawablePart::new(antenna).with_transform(Mat4::from_translation(Vec3::new(
            0.0, 0.5, 0.0,
        ))),
    );
    scene.node_mut(mast).active = false;

    let wreck = scene.add_child(root, "Wreckage");
    let mut broken = DrawablePart::new(Arc::new(Mesh::new(5, vec![])));
    broken.renderer = None;
    scene.add_part(wreck, broken);

    let seat = scene.add_child(front, "PilotSeat");
    scene.add_part(
        seat,
        DrawablePart::new(pilot)
            .with_kind(PartKind::Skinned)
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.6, 2.5))),
    );

    scene
}

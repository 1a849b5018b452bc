//! Provides the scene-graph snapshot the photographer walks.
//!
//! A [`Scene`] is an arena of named nodes. Structure (names, parent links,
//! child order, attached parts) is fixed once built; the per-node flags the
//! photographer toggles (active, layer, renderer enabled) stay mutable.
//! Geometry is shared between parts through `Arc<Mesh>`, which is also what
//! gives a mesh its stable identity.
//!
//! # Examples
//! ```
//! use scenepics::scene::Scene;
//!
//! let mut scene = Scene::new("Ship");
//! let cockpit = scene.add_child(scene.root(), "Cockpit");
//! assert_eq!(scene.node(cockpit).name(), "Cockpit");
//! ```

use std::sync::Arc;

use glam::{Mat4, Vec3};

/// The layer nodes start on and are returned to after a capture.
///
/// # Examples
/// ```
/// assert_eq!(scenepics::scene::DEFAULT_LAYER, 0);
/// ```
pub const DEFAULT_LAYER: u8 = 0;

/// Represents a single flat-shaded triangle in mesh-local space.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use scenepics::scene::Triangle;
///
/// let tri = Triangle {
///     verts: [Vec3::ZERO, Vec3::X, Vec3::Y],
///     color: [1.0, 1.0, 1.0],
/// };
/// let _ = tri;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    /// Triangle vertex positions.
    pub verts: [Vec3; 3],
    /// Base RGB color.
    pub color: [f32; 3],
}

/// An axis-aligned bounding box.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use scenepics::scene::Aabb;
///
/// let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
/// assert_eq!(b.center(), Vec3::splat(0.5));
/// assert_eq!(b.size(), Vec3::ONE);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a bounding box from two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Computes the bounding box of a set of points, or `None` if empty.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use scenepics::scene::Aabb;
    ///
    /// assert!(Aabb::from_points(std::iter::empty::<Vec3>()).is_none());
    /// let b = Aabb::from_points([Vec3::ZERO, Vec3::new(2.0, 1.0, 3.0)].into_iter());
    /// assert_eq!(b.unwrap().max, Vec3::new(2.0, 1.0, 3.0));
    /// ```
    pub fn from_points(points: impl Iterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        any.then_some(Self { min, max })
    }

    /// Returns the smallest box containing both `self` and `other`.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use scenepics::scene::Aabb;
    ///
    /// let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    /// let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(0.5));
    /// let u = a.union(b);
    /// assert_eq!(u.min, Vec3::splat(-1.0));
    /// assert_eq!(u.max, Vec3::ONE);
    /// ```
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the box transformed into another space (bounds of the eight
    /// transformed corners).
    ///
    /// # Examples
    /// ```
    /// use glam::{Mat4, Vec3};
    /// use scenepics::scene::Aabb;
    ///
    /// let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
    /// let moved = b.transformed(&Mat4::from_translation(Vec3::X));
    /// assert_eq!(moved.min, Vec3::X);
    /// ```
    pub fn transformed(&self, m: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for c in corners {
            let p = m.transform_point3(c);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

/// Represents shared mesh geometry with a stable identity.
///
/// Identity 0 is the invalid sentinel: a part whose mesh reports identity 0
/// voids the cluster it is photographed with.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use scenepics::scene::Mesh;
///
/// let mesh = Mesh::cuboid(42, Vec3::ZERO, Vec3::ONE, [0.8, 0.2, 0.2]);
/// assert_eq!(mesh.id(), 42);
/// assert_eq!(mesh.triangles().len(), 12);
/// ```
#[derive(Debug)]
pub struct Mesh {
    id: i64,
    triangles: Vec<Triangle>,
    local_bounds: Option<Aabb>,
}

impl Mesh {
    /// Creates a mesh from triangles; local bounds are computed up front.
    ///
    /// # Examples
    /// ```
    /// use scenepics::scene::Mesh;
    ///
    /// let empty = Mesh::new(7, vec![]);
    /// assert!(empty.local_bounds().is_none());
    /// ```
    pub fn new(id: i64, triangles: Vec<Triangle>) -> Self {
        let local_bounds =
            Aabb::from_points(triangles.iter().flat_map(|t| t.verts.iter().copied()));
        Self {
            id,
            triangles,
            local_bounds,
        }
    }

    /// Creates an axis-aligned box mesh (12 triangles) spanning `min`..`max`.
    pub fn cuboid(id: i64, min: Vec3, max: Vec3, color: [f32; 3]) -> Self {
        // Corners, bottom face then top face, counter-clockwise from min
        let c = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        let quads: [[usize; 4]; 6] = [
            [0, 1, 2, 3], // down
            [7, 6, 5, 4], // up
            [0, 4, 5, 1], // north (-z)
            [2, 6, 7, 3], // south (+z)
            [1, 5, 6, 2], // east (+x)
            [3, 7, 4, 0], // west (-x)
        ];
        let mut triangles = Vec::with_capacity(12);
        for q in quads {
            triangles.push(Triangle {
                verts: [c[q[0]], c[q[1]], c[q[2]]],
                color,
            });
            triangles.push(Triangle {
                verts: [c[q[0]], c[q[2]], c[q[3]]],
                color,
            });
        }
        Self::new(id, triangles)
    }

    /// Returns the mesh identity.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the triangle list.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Returns the mesh-local bounds, `None` for an empty mesh.
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.local_bounds
    }
}

/// Distinguishes the two drawable kinds photographed as separate batches.
///
/// # Examples
/// ```
/// use scenepics::scene::PartKind;
///
/// assert_ne!(PartKind::Static, PartKind::Skinned);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartKind {
    /// A plain mesh/renderer pairing.
    Static,
    /// A skinned mesh, captured in its own batch at the same node.
    Skinned,
}

/// The renderer half of a drawable part.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    /// Whether the renderer draws; forced on before a capture.
    pub enabled: bool,
}

/// Represents one drawable geometry + renderer pairing attached to a node.
///
/// Either half may be absent; a part missing its mesh or its renderer has
/// identity 0 and voids any cluster it appears in.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use glam::Vec3;
/// use scenepics::scene::{DrawablePart, Mesh};
///
/// let mesh = Arc::new(Mesh::cuboid(3, Vec3::ZERO, Vec3::ONE, [1.0; 3]));
/// let part = DrawablePart::new(mesh);
/// assert_eq!(part.identity(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct DrawablePart {
    /// Shared geometry reference, if any.
    pub mesh: Option<Arc<Mesh>>,
    /// Renderer state, if any.
    pub renderer: Option<Renderer>,
    /// Local-to-world transform for this part.
    pub transform: Mat4,
    /// Which capture batch the part belongs to.
    pub kind: PartKind,
}

impl DrawablePart {
    /// Creates a static part with an enabled renderer and identity transform.
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh: Some(mesh),
            renderer: Some(Renderer { enabled: true }),
            transform: Mat4::IDENTITY,
            kind: PartKind::Static,
        }
    }

    /// Sets the world transform.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use glam::{Mat4, Vec3};
    /// use scenepics::scene::{DrawablePart, Mesh};
    ///
    /// let mesh = Arc::new(Mesh::cuboid(5, Vec3::ZERO, Vec3::ONE, [1.0; 3]));
    /// let part = DrawablePart::new(mesh).with_transform(Mat4::from_translation(Vec3::X));
    /// assert_eq!(part.world_bounds().unwrap().min, Vec3::X);
    /// ```
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Marks the part as skinned.
    pub fn with_kind(mut self, kind: PartKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the part identity: the mesh identity, or 0 when the mesh or
    /// the renderer is missing.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use glam::Vec3;
    /// use scenepics::scene::{DrawablePart, Mesh};
    ///
    /// let mesh = Arc::new(Mesh::cuboid(9, Vec3::ZERO, Vec3::ONE, [1.0; 3]));
    /// let mut part = DrawablePart::new(mesh);
    /// part.renderer = None;
    /// assert_eq!(part.identity(), 0);
    /// ```
    pub fn identity(&self) -> i64 {
        match (&self.mesh, &self.renderer) {
            (Some(mesh), Some(_)) => mesh.id(),
            _ => 0,
        }
    }

    /// Returns the part's world-space bounds. `None` when there is no
    /// renderer to report them or the mesh is absent/empty.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.renderer?;
        let local = self.mesh.as_ref()?.local_bounds()?;
        Some(local.transformed(&self.transform))
    }
}

/// Identifies a node within its [`Scene`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A named entity in the hierarchy.
///
/// Name, parent, and children are fixed after construction; `parts`,
/// `active`, and `layer` are the flags the photographer toggles.
#[derive(Debug)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Drawable parts attached to this node.
    pub parts: Vec<DrawablePart>,
    /// Local active flag; the node only draws when every ancestor is active too.
    pub active: bool,
    /// Render layer used for capture culling.
    pub layer: u8,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            parts: Vec::new(),
            active: true,
            layer: DEFAULT_LAYER,
        }
    }

    /// Returns the node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent id, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An arena-backed scene hierarchy with a single root.
///
/// Node ids are only valid for the scene that minted them; the accessors
/// panic on ids from another scene.
///
/// # Examples
/// ```
/// use scenepics::scene::Scene;
///
/// let mut scene = Scene::new("Root");
/// let a = scene.add_child(scene.root(), "A");
/// let b = scene.add_child(a, "B");
/// assert_eq!(scene.node(b).parent(), Some(a));
/// assert_eq!(scene.node(scene.root()).children(), &[a]);
/// ```
#[derive(Debug)]
pub struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    /// Creates a scene containing only a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(root_name.into(), None)],
        }
    }

    /// Returns the root id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a child node under `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name.into(), Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Attaches a drawable part to a node.
    pub fn add_part(&mut self, node: NodeId, part: DrawablePart) {
        self.nodes[node.0].parts.push(part);
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the scene has no nodes. Always false: the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all node ids in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Returns whether the node and every ancestor up to the root are active.
    ///
    /// # Examples
    /// ```
    /// use scenepics::scene::Scene;
    ///
    /// let mut scene = Scene::new("Root");
    /// let child = scene.add_child(scene.root(), "Child");
    /// scene.node_mut(scene.root()).active = false;
    /// assert!(!scene.is_active_in_hierarchy(child));
    /// ```
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur);
            if !node.active {
                return false;
            }
            current = node.parent();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_links() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        let b = scene.add_child(scene.root(), "B");
        let a1 = scene.add_child(a, "A1");

        assert_eq!(scene.node(scene.root()).children(), &[a, b]);
        assert_eq!(scene.node(a).children(), &[a1]);
        assert_eq!(scene.node(a1).parent(), Some(a));
        assert_eq!(scene.node(scene.root()).parent(), None);
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn test_active_in_hierarchy_walks_ancestors() {
        let mut scene = Scene::new("Root");
        let a = scene.add_child(scene.root(), "A");
        let a1 = scene.add_child(a, "A1");

        assert!(scene.is_active_in_hierarchy(a1));
        scene.node_mut(a).active = false;
        assert!(!scene.is_active_in_hierarchy(a1));
        assert!(scene.is_active_in_hierarchy(scene.root()));
    }

    #[test]
    fn test_part_identity_requires_mesh_and_renderer() {
        let mesh = Arc::new(Mesh::cuboid(11, Vec3::ZERO, Vec3::ONE, [1.0; 3]));
        let part = DrawablePart::new(mesh.clone());
        assert_eq!(part.identity(), 11);

        let mut no_renderer = part.clone();
        no_renderer.renderer = None;
        assert_eq!(no_renderer.identity(), 0);

        let mut no_mesh = part.clone();
        no_mesh.mesh = None;
        assert_eq!(no_mesh.identity(), 0);
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mesh = Arc::new(Mesh::cuboid(1, Vec3::ZERO, Vec3::ONE, [1.0; 3]));
        let part = DrawablePart::new(mesh)
            .with_transform(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        let bounds = part.world_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_aabb_union_and_transform() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(-1.0, 0.0, 0.5), Vec3::new(0.5, 2.0, 0.5));
        let u = a.union(b);
        assert_eq!(u.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(u.max, Vec3::new(1.0, 2.0, 1.0));

        let rotated = a.transformed(&Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Unit cube rotated a quarter turn around Y still spans one unit per axis
        assert!((rotated.size() - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        let mesh = Arc::new(Mesh::new(5, vec![]));
        let part = DrawablePart::new(mesh);
        assert!(part.world_bounds().is_none());
    }
}

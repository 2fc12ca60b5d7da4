//! Model prefabs and their scene instances.
//!
//! A [`ModelPrefab`] is the loaded source asset: a tree of [`PrefabNode`]s,
//! each of which may carry a [`Mesh`]. Instantiating a prefab produces a
//! [`ModelInstance`], an independent copy whose renderable parts have been
//! flattened into world space. Dropping the prefab afterwards does not affect
//! the instance.

use glam::{Mat4, Quat, Vec3};

use crate::bounds::Aabb;

/// Suffix appended to the name of every instantiated copy of a prefab.
pub const CLONE_SUFFIX: &str = "(Clone)";

/// Triangle mesh geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals (same length as `positions`).
    pub normals: Vec<Vec3>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh, computing area-weighted vertex normals when `normals`
    /// does not match the vertex count.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            compute_vertex_normals(&positions, &indices)
        };
        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Creates an axis-aligned box mesh.
    pub fn cuboid(center: Vec3, size: Vec3) -> Self {
        let h = size * 0.5;
        // (normal, tangent u, tangent v) per face, wound counter-clockwise seen from outside.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push(center + (normal + u * su + v * sv) * h);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }

    /// Local-space bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter())
    }

    /// Returns a copy with `transform` applied to positions and normals.
    #[must_use]
    pub fn transformed(&self, transform: Mat4) -> Self {
        Self {
            positions: self
                .positions
                .iter()
                .map(|p| transform.transform_point3(*p))
                .collect(),
            normals: self
                .normals
                .iter()
                .map(|n| transform.transform_vector3(*n).normalize_or_zero())
                .collect(),
            indices: self.indices.clone(),
        }
    }
}

fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}

/// A node in a prefab hierarchy.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    /// Node name.
    pub name: String,
    /// Offset from the parent node.
    pub offset: Vec3,
    /// Geometry drawn by this node, if any.
    pub mesh: Option<Mesh>,
    /// Child nodes.
    pub children: Vec<PrefabNode>,
}

impl PrefabNode {
    /// Creates an empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a node that draws `mesh`.
    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Default::default()
        }
    }

    /// Adds a child node.
    #[must_use]
    pub fn with_child(mut self, child: PrefabNode) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the offset from the parent.
    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// A loaded model asset that can be instantiated into the scene.
#[derive(Debug, Clone)]
pub struct ModelPrefab {
    /// Prefab name (usually the asset's file stem).
    pub name: String,
    /// Root of the node hierarchy.
    pub root: PrefabNode,
}

impl ModelPrefab {
    /// Creates a prefab.
    pub fn new(name: impl Into<String>, root: PrefabNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Number of nodes that carry a non-empty mesh, nested ones included.
    pub fn renderable_count(&self) -> usize {
        fn count(node: &PrefabNode) -> usize {
            let own = usize::from(node.mesh.as_ref().is_some_and(|m| !m.is_empty()));
            own + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Creates an independent copy of this prefab placed at `position` with
    /// `rotation`, relative to `anchor`.
    ///
    /// Renderable parts are collected depth-first, parents before children,
    /// and baked into world space.
    pub fn instantiate(&self, anchor: Vec3, position: Vec3, rotation: Quat) -> ModelInstance {
        let world = Mat4::from_rotation_translation(rotation, anchor + position);
        let mut parts = Vec::new();
        collect_parts(&self.root, world, &mut parts);
        ModelInstance {
            name: format!("{}{CLONE_SUFFIX}", self.name),
            position: anchor + position,
            rotation,
            parts,
        }
    }
}

fn collect_parts(node: &PrefabNode, parent: Mat4, out: &mut Vec<RenderablePart>) {
    let world = parent * Mat4::from_translation(node.offset);
    if let Some(mesh) = node.mesh.as_ref().filter(|m| !m.is_empty()) {
        let mesh = mesh.transformed(world);
        if let Some(bounds) = mesh.bounds() {
            out.push(RenderablePart {
                name: node.name.clone(),
                mesh,
                bounds,
            });
        }
    }
    for child in &node.children {
        collect_parts(child, world, out);
    }
}

/// One renderable part of an instance, in world space.
#[derive(Debug, Clone)]
pub struct RenderablePart {
    /// Name of the node the part came from.
    pub name: String,
    /// World-space geometry.
    pub mesh: Mesh,
    /// World-space bounds of `mesh`.
    pub bounds: Aabb,
}

/// An instantiated model living in the scene.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    name: String,
    position: Vec3,
    rotation: Quat,
    parts: Vec<RenderablePart>,
}

impl ModelInstance {
    /// Display name, e.g. `Chair(Clone)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Spawn rotation.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Renderable parts in discovery order.
    pub fn parts(&self) -> &[RenderablePart] {
        &self.parts
    }

    /// World-space bounds of every renderable part, in discovery order.
    pub fn renderable_bounds(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.parts.iter().map(|p| p.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.size(), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn test_cuboid_winding_faces_outward() {
        let mesh = Mesh::cuboid(Vec3::ZERO, Vec3::ONE);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.positions[tri[i] as usize]);
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_computed_normals() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mesh = Mesh::new(positions, Vec::new(), vec![0, 1, 2]);
        for n in &mesh.normals {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_instantiate_names_clone() {
        let prefab = ModelPrefab::new(
            "Chair",
            PrefabNode::with_mesh("seat", Mesh::cuboid(Vec3::ZERO, Vec3::ONE)),
        );
        let instance = prefab.instantiate(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(instance.name(), "Chair(Clone)");
        assert_eq!(instance.parts().len(), 1);
    }

    #[test]
    fn test_instantiate_collects_nested_parts_depth_first() {
        let root = PrefabNode::new("root")
            .with_child(
                PrefabNode::with_mesh("a", Mesh::cuboid(Vec3::ZERO, Vec3::ONE)).with_child(
                    PrefabNode::with_mesh("a.1", Mesh::cuboid(Vec3::ZERO, Vec3::ONE))
                        .with_offset(Vec3::new(0.0, 2.0, 0.0)),
                ),
            )
            .with_child(PrefabNode::with_mesh("b", Mesh::cuboid(Vec3::ZERO, Vec3::ONE)))
            .with_child(PrefabNode::with_mesh("empty", Mesh::default()));
        let prefab = ModelPrefab::new("Lamp", root);
        assert_eq!(prefab.renderable_count(), 3);

        let instance = prefab.instantiate(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY);
        let names: Vec<_> = instance.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "a.1", "b"]);
        assert_eq!(instance.parts()[1].bounds.center(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_instance_is_independent_of_prefab() {
        let prefab = ModelPrefab::new(
            "Box",
            PrefabNode::with_mesh("box", Mesh::cuboid(Vec3::ZERO, Vec3::ONE)),
        );
        let instance = prefab.instantiate(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, Quat::IDENTITY);
        drop(prefab);
        assert_eq!(instance.parts()[0].bounds.center(), Vec3::new(0.0, 1.0, 0.0));
    }
}

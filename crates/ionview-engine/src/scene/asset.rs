use glam::{Mat4, Vec3};

use crate::animation::AnimationClip;

use super::transform::Transform;

/// Surface parameters of one primitive. Unlit terms only; no PBR.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// Linear RGB emissive color (HDR, may exceed 1).
    pub emissive: [f32; 3],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl Primitive {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub children: Vec<usize>,
    /// Index into [`SceneAsset::meshes`].
    pub mesh: Option<usize>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the bounding sphere around [`Aabb::center`].
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }
}

/// Summary counts logged after loading.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub nodes: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub triangles: usize,
    pub clips: usize,
}

/// A loaded model: node hierarchy, meshes, and animation clips.
///
/// `roots` lists the top-level nodes of the default scene. Node indices are
/// stable for the life of the asset; animation tracks address nodes by index.
#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub source: String,
    pub nodes: Vec<SceneNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub clips: Vec<AnimationClip>,
}

impl SceneAsset {
    pub fn stats(&self) -> SceneStats {
        let primitives = self.meshes.iter().map(|m| m.primitives.len()).sum();
        let triangles = self
            .meshes
            .iter()
            .flat_map(|m| m.primitives.iter())
            .map(Primitive::triangle_count)
            .sum();

        SceneStats {
            nodes: self.nodes.len(),
            meshes: self.meshes.len(),
            primitives,
            triangles,
            clips: self.clips.len(),
        }
    }

    /// Computes world matrices for every node, indexed like `nodes`.
    ///
    /// Nodes unreachable from `roots` keep the identity matrix. Cycles are
    /// not followed twice.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut out = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&r| (r, Mat4::IDENTITY))
            .collect();

        while let Some((idx, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(idx) else { continue };
            if std::mem::replace(&mut visited[idx], true) {
                log::warn!("scene node {idx} reached twice; hierarchy is not a tree");
                continue;
            }
            let world = parent * node.transform.to_matrix();
            out[idx] = world;
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }

        out
    }

    /// World-space bounds of all mesh vertices, or `None` for an empty scene.
    pub fn bounds(&self, world: &[Mat4]) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;

        for (idx, node) in self.nodes.iter().enumerate() {
            let Some(mesh) = node.mesh.and_then(|m| self.meshes.get(m)) else { continue };
            let m = world.get(idx).copied().unwrap_or(Mat4::IDENTITY);

            for p in mesh.primitives.iter().flat_map(|p| p.positions.iter()) {
                let wp = m.transform_point3(Vec3::from_array(*p));
                match bounds.as_mut() {
                    Some(b) => b.include(wp),
                    None => bounds = Some(Aabb::from_point(wp)),
                }
            }
        }

        bounds
    }
}

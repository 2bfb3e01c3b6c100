//! 3D scene types.
//!
//! Responsibilities:
//! - hold the loaded asset (node hierarchy, meshes, clips)
//! - hold static scene setup (lights, helpers)
//! - cache world matrices after each pose change

mod asset;
mod helpers;
mod light;
mod transform;

pub use asset::{Aabb, Material, Mesh, Primitive, SceneAsset, SceneNode, SceneStats};
pub use helpers::{AxesHelper, LineVertex};
pub use light::{AmbientLight, DirectionalLight};
pub use transform::Transform;

use glam::Mat4;

/// Renderable scene: one asset plus static lighting and helpers.
#[derive(Debug, Clone)]
pub struct Scene {
    asset: SceneAsset,
    world: Vec<Mat4>,
    bounds: Option<Aabb>,

    pub directional: DirectionalLight,
    pub ambient: AmbientLight,
    pub axes: Option<AxesHelper>,
}

impl Scene {
    pub fn new(asset: SceneAsset, directional: DirectionalLight, ambient: AmbientLight) -> Self {
        let world = asset.world_transforms();
        let bounds = asset.bounds(&world);
        Self {
            asset,
            world,
            bounds,
            directional,
            ambient,
            axes: None,
        }
    }

    pub fn with_axes(mut self, axes: AxesHelper) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn asset(&self) -> &SceneAsset {
        &self.asset
    }

    /// Mutable node access for pose application.
    ///
    /// Call [`Scene::refresh_world`] after mutating transforms.
    pub fn nodes_mut(&mut self) -> &mut [SceneNode] {
        &mut self.asset.nodes
    }

    /// Takes the clips out of the asset; the scene keeps geometry only.
    pub fn take_clips(&mut self) -> Vec<crate::animation::AnimationClip> {
        std::mem::take(&mut self.asset.clips)
    }

    /// World matrices, indexed like `asset().nodes`.
    pub fn world(&self) -> &[Mat4] {
        &self.world
    }

    /// World-space bounds at load time.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn refresh_world(&mut self) {
        self.world = self.asset.world_transforms();
    }

    /// Iterates `(node index, world matrix, mesh)` for every node with a mesh.
    pub fn mesh_instances(&self) -> impl Iterator<Item = (usize, Mat4, &Mesh)> + '_ {
        self.asset
            .nodes
            .iter()
            .enumerate()
            .filter_map(move |(idx, node)| {
                let mesh = self.asset.meshes.get(node.mesh?)?;
                Some((idx, self.world.get(idx).copied().unwrap_or(Mat4::IDENTITY), mesh))
            })
    }
}

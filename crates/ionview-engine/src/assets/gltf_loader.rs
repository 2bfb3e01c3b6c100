use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::scene::{Material, Mesh, Primitive, SceneAsset, SceneNode, Transform};

use super::loader::{AssetError, AssetLoader};

/// Loads `.gltf` / `.glb` files from disk through the `gltf` crate.
///
/// Relative sources resolve against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    root: Option<PathBuf>,
}

impl GltfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl AssetLoader for GltfLoader {
    async fn load(&self, source: &str) -> Result<SceneAsset, AssetError> {
        let path = self.resolve(source);
        if !path.is_file() {
            return Err(AssetError::NotFound(path));
        }

        log::info!("loading asset {}", path.display());
        let (doc, buffers, _images) = gltf::import(&path).map_err(|source| AssetError::Import {
            path: path.clone(),
            source,
        })?;

        let asset = convert_document(source, &doc, &buffers)?;
        let stats = asset.stats();
        log::info!(
            "asset loaded: {} nodes, {} meshes ({} primitives, {} triangles), {} clips",
            stats.nodes,
            stats.meshes,
            stats.primitives,
            stats.triangles,
            stats.clips
        );
        Ok(asset)
    }
}

fn convert_document(source: &str, doc: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<SceneAsset, AssetError> {
    let get = |b: gltf::Buffer<'_>| buffers.get(b.index()).map(|d| d.0.as_slice());

    let nodes: Vec<SceneNode> = doc
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            SceneNode {
                name: node.name().map(str::to_string),
                transform: Transform::from_decomposed(t, r, s),
                children: node.children().map(|c| c.index()).collect(),
                mesh: node.mesh().map(|m| m.index()),
            }
        })
        .collect();

    let roots = match doc.default_scene().or_else(|| doc.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => orphan_nodes(&nodes),
    };

    let mut meshes = Vec::with_capacity(doc.meshes().len());
    for mesh in doc.meshes() {
        let mut primitives = Vec::new();
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("mesh {}: skipping {:?} primitive", mesh.index(), prim.mode());
                continue;
            }

            let reader = prim.reader(get);
            let Some(positions) = reader.read_positions() else {
                log::debug!("mesh {}: primitive without positions skipped", mesh.index());
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(ix) => ix.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(AssetError::Invalid {
                    source_name: source.to_string(),
                    reason: format!("mesh {} index {bad} out of range ({} vertices)", mesh.index(), positions.len()),
                });
            }

            let normals = match reader.read_normals() {
                Some(n) => n.collect(),
                None => smooth_normals(&positions, &indices),
            };

            let material = prim.material();
            primitives.push(Primitive {
                positions,
                normals,
                indices,
                material: Material {
                    base_color: material.pbr_metallic_roughness().base_color_factor(),
                    emissive: material.emissive_factor(),
                },
            });
        }

        meshes.push(Mesh {
            name: mesh.name().map(str::to_string),
            primitives,
        });
    }

    let clips = doc
        .animations()
        .map(|anim| read_clip(&anim, get))
        .collect();

    Ok(SceneAsset {
        source: source.to_string(),
        nodes,
        roots,
        meshes,
        clips,
    })
}

fn read_clip<'a, 's, F>(anim: &gltf::Animation<'a>, get: F) -> AnimationClip
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut tracks = Vec::new();

    for channel in anim.channels() {
        let reader = channel.reader(get.clone());
        let node = channel.target().node().index();

        let Some(times) = reader.read_inputs() else { continue };
        let times: Vec<f32> = times.collect();

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => TrackValues::Translation(v.map(Vec3::from_array).collect()),
            Some(ReadOutputs::Rotations(v)) => TrackValues::Rotation(v.into_f32().map(Quat::from_array).collect()),
            Some(ReadOutputs::Scales(v)) => TrackValues::Scale(v.map(Vec3::from_array).collect()),
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("animation {}: morph target channel ignored", anim.index());
                continue;
            }
            None => continue,
        };

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        tracks.push(Track {
            node,
            times,
            values,
            interpolation,
        });
    }

    AnimationClip::new(anim.name().unwrap_or_default(), tracks)
}

/// Nodes that are nobody's child.
fn orphan_nodes(nodes: &[SceneNode]) -> Vec<usize> {
    let children: HashSet<usize> = nodes.iter().flat_map(|n| n.children.iter().copied()).collect();
    (0..nodes.len()).filter(|i| !children.contains(i)).collect()
}

/// Area-weighted vertex normals.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            Vec3::from_array(positions[a]),
            Vec3::from_array(positions[b]),
            Vec3::from_array(positions[c]),
        );
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_GLTF: &str = r#"{
      "asset": { "version": "2.0" },
      "scene": 0,
      "scenes": [ { "nodes": [0] } ],
      "nodes": [
        { "name": "root", "children": [1], "translation": [0.0, 1.0, 0.0] },
        { "name": "drive", "mesh": 0 }
      ],
      "meshes": [
        { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 3, "material": 0 } ] }
      ],
      "materials": [
        { "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.5, 0.5, 1.0] }, "emissiveFactor": [1.0, 0.5, 0.0] }
      ],
      "animations": [
        {
          "name": "Spin",
          "channels": [ { "sampler": 0, "target": { "node": 1, "path": "translation" } } ],
          "samplers": [ { "input": 1, "output": 2, "interpolation": "LINEAR" } ]
        }
      ],
      "buffers": [ { "uri": "tri.bin", "byteLength": 74 } ],
      "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
        { "buffer": 0, "byteOffset": 44, "byteLength": 24 },
        { "buffer": 0, "byteOffset": 68, "byteLength": 6 }
      ],
      "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
        { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [2.0] },
        { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" },
        { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }
      ]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let floats: [f32; 17] = [
            // positions
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            // key times
            0.0, 2.0,
            // translations
            0.0, 0.0, 0.0, 4.0, 0.0, 0.0,
        ];
        let mut bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }

    fn write_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ionview-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.gltf"), TRIANGLE_GLTF).unwrap();
        std::fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();
        dir
    }

    #[test]
    fn loads_nodes_meshes_and_clips() {
        let dir = write_fixture("load");
        let loader = GltfLoader::with_root(&dir);
        let asset = pollster::block_on(loader.load("tri.gltf")).unwrap();

        assert_eq!(asset.roots, vec![0]);
        assert_eq!(asset.nodes.len(), 2);
        assert_eq!(asset.nodes[0].children, vec![1]);
        assert_eq!(asset.nodes[1].mesh, Some(0));
        assert_eq!(asset.nodes[0].transform.translation, Vec3::new(0.0, 1.0, 0.0));

        let prim = &asset.meshes[0].primitives[0];
        assert_eq!(prim.indices, vec![0, 1, 2]);
        assert_eq!(prim.material.base_color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(prim.material.emissive, [1.0, 0.5, 0.0]);
        for n in &prim.normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }

        assert_eq!(asset.clips.len(), 1);
        let clip = &asset.clips[0];
        assert_eq!(clip.name(), "Spin");
        assert_eq!(clip.duration(), 2.0);
        assert_eq!(clip.tracks()[0].node, 1);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_is_not_found() {
        let loader = GltfLoader::new();
        let err = pollster::block_on(loader.load("definitely/not/here.glb")).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn corrupt_file_is_import_error() {
        let dir = std::env::temp_dir().join(format!("ionview-corrupt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.glb"), b"not a gltf file").unwrap();

        let err = pollster::block_on(GltfLoader::with_root(&dir).load("bad.glb")).unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn orphans_become_roots_without_scene() {
        let nodes = vec![
            SceneNode { children: vec![2], ..Default::default() },
            SceneNode::default(),
            SceneNode::default(),
        ];
        assert_eq!(orphan_nodes(&nodes), vec![0, 1]);
    }
}

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use gltf::mesh::Mode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position: position.to_array(), normal: normal.to_array() }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct MeshGeometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl MeshGeometry {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, bounds }
    }

    /// Single upward-facing triangle, handy for building scenes by hand.
    pub fn triangle() -> Self {
        let normal = Vec3::Z;
        let vertices = vec![
            MeshVertex::new(Vec3::new(0.0, 0.0, 0.0), normal),
            MeshVertex::new(Vec3::new(1.0, 0.0, 0.0), normal),
            MeshVertex::new(Vec3::new(0.0, 1.0, 0.0), normal),
        ];
        Self::new(vertices, vec![0, 1, 2])
    }
}

/// Material parameters read from the asset, before any shared handle exists.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedMaterial {
    pub label: String,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    /// `Some` when the material declares `KHR_materials_clearcoat`.
    pub clearcoat_factor: Option<f32>,
    /// `true` when the material declares `KHR_materials_unlit`.
    pub unlit: bool,
}

#[derive(Clone, Debug)]
pub struct ImportedPrimitive {
    pub geometry: Arc<MeshGeometry>,
    /// Index into [`ModelImport::materials`]; `None` uses the glTF default material.
    pub material: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ImportedNode {
    pub name: String,
    /// Mesh name, or `mesh_<index>` when unnamed. Children of a multi-primitive mesh take
    /// their names from it.
    pub mesh_name: Option<String>,
    pub transform: Mat4,
    pub primitives: Vec<ImportedPrimitive>,
    pub children: Vec<ImportedNode>,
}

const RESERVED_NAME_CHARS: [char; 5] = ['[', ']', '.', ':', '/'];

/// Node name as three.js-style loaders expose it: whitespace becomes `_` and property-path
/// punctuation is dropped.
pub fn sanitize_node_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !RESERVED_NAME_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Decoded asset, independent of the thread that will own the scene graph.
#[derive(Clone, Debug)]
pub struct ModelImport {
    pub source: PathBuf,
    pub roots: Vec<ImportedNode>,
    pub materials: Vec<ImportedMaterial>,
}

impl ModelImport {
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _images) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;

        let materials = document
            .materials()
            .enumerate()
            .map(|(index, material)| import_material(index, &material))
            .collect();

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| anyhow!("No scenes found in {}", path_ref.display()))?;

        let mut geometry_cache: HashMap<(usize, usize), Arc<MeshGeometry>> = HashMap::new();
        let mut roots = Vec::new();
        for node in scene.nodes() {
            roots.push(import_node(&node, &buffers, &mut geometry_cache, path_ref)?);
        }

        Ok(Self { source: path_ref.to_path_buf(), roots, materials })
    }
}

fn import_material(index: usize, material: &gltf::Material<'_>) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let label = material.name().map(|s| s.to_string()).unwrap_or_else(|| format!("material_{index}"));
    let clearcoat_factor = material.extension_value("KHR_materials_clearcoat").map(|value| {
        value.get("clearcoatFactor").and_then(|factor| factor.as_f64()).unwrap_or(0.0) as f32
    });
    ImportedMaterial {
        label,
        base_color_factor: pbr.base_color_factor(),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        emissive_factor: material.emissive_factor(),
        clearcoat_factor,
        unlit: material.extension_value("KHR_materials_unlit").is_some(),
    }
}

fn import_node(
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
    geometry_cache: &mut HashMap<(usize, usize), Arc<MeshGeometry>>,
    path: &Path,
) -> Result<ImportedNode> {
    let mesh = node.mesh();
    let mesh_name = mesh
        .as_ref()
        .map(|m| m.name().map(sanitize_node_name).unwrap_or_else(|| format!("mesh_{}", m.index())));
    let name = node
        .name()
        .map(sanitize_node_name)
        .or_else(|| mesh_name.clone())
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut primitives = Vec::new();
    if let Some(mesh) = mesh {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                continue;
            }
            let key = (mesh.index(), primitive.index());
            let geometry = match geometry_cache.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let Some(geometry) = read_primitive(&primitive, buffers, path)? else {
                        continue;
                    };
                    let geometry = Arc::new(geometry);
                    geometry_cache.insert(key, geometry.clone());
                    geometry
                }
            };
            primitives.push(ImportedPrimitive { geometry, material: primitive.material().index() });
        }
    }

    let mut children = Vec::new();
    for child in node.children() {
        children.push(import_node(&child, buffers, geometry_cache, path)?);
    }

    Ok(ImportedNode {
        name,
        mesh_name,
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        primitives,
        children,
    })
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    path: &Path,
) -> Result<Option<MeshGeometry>> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));
    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| anyhow!("POSITION attribute missing in {}", path.display()))?
        .map(Vec3::from_array)
        .collect();
    if positions.is_empty() {
        return Ok(None);
    }

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|read| read.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let mut normals: Vec<Vec3> =
        reader.read_normals().map(|it| it.map(Vec3::from_array).collect()).unwrap_or_default();
    if normals.len() != positions.len() || normals.iter().all(|n| n.length_squared() == 0.0) {
        normals = compute_normals(&positions, &indices);
    }

    let vertices = positions
        .iter()
        .zip(normals.iter())
        .map(|(pos, normal)| MeshVertex::new(*pos, normal.normalize_or_zero()))
        .collect();
    Ok(Some(MeshGeometry::new(vertices, indices)))
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        if normal.length_squared() > 0.0 {
            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }
    }
    for normal in &mut normals {
        *normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
    }
    normals
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        if vertices.is_empty() {
            return MeshBounds { min: Vec3::ZERO, max: Vec3::ZERO, center: Vec3::ZERO, radius: 0.0 };
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let pos = Vec3::from_array(vertex.position);
            min = min.min(pos);
            max = max.max(pos);
        }
        let center = (min + max) * 0.5;
        let radius = vertices
            .iter()
            .map(|vertex| (Vec3::from_array(vertex.position) - center).length())
            .fold(0.0f32, f32::max);
        MeshBounds { min, max, center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::categories_for;
    use crate::part::PartCategory;

    const FIXTURE: &str = "assets/models/roadster_fixture.gltf";

    #[test]
    fn computed_normals_face_out_of_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        for normal in normals {
            assert!((normal - Vec3::Z).length_squared() < 1e-6);
        }
    }

    #[test]
    fn bounds_cover_vertices() {
        let geometry = MeshGeometry::triangle();
        assert_eq!(geometry.bounds.min, Vec3::ZERO);
        assert_eq!(geometry.bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert!(geometry.bounds.radius > 0.7);
    }

    #[test]
    fn load_fixture_keeps_node_names_and_materials() {
        let import = ModelImport::load_gltf(FIXTURE).expect("fixture should import");
        assert_eq!(import.roots.len(), 1);
        let root = &import.roots[0];
        assert_eq!(root.name, "Roadster");
        let names: Vec<&str> = root.children.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, ["TRDEF-Body_01", "Rims_FL", "Rims_FR", "Rim_FL", "Brake_Disc_FL", "Interior_seats"]);
        assert_eq!(import.materials.len(), 5);
        let rims = import.materials.iter().find(|m| m.label == "rims").expect("rims material");
        assert_eq!(rims.clearcoat_factor, Some(0.0));
        let body = import.materials.iter().find(|m| m.label == "paint").expect("paint material");
        assert_eq!(body.clearcoat_factor, None);
        for child in &root.children {
            assert_eq!(child.primitives.len(), 1);
            assert_eq!(child.primitives[0].geometry.indices, vec![0, 1, 2]);
        }
    }

    #[test]
    fn node_names_are_sanitized() {
        assert_eq!(sanitize_node_name("brake disc front"), "brake_disc_front");
        assert_eq!(sanitize_node_name("Rims.FL/[0]:a"), "RimsFL0a");
        assert_eq!(sanitize_node_name("TRDEF-Body_01"), "TRDEF-Body_01");
        let categories: Vec<_> = categories_for(&sanitize_node_name("Brake Disc FL")).collect();
        assert_eq!(categories, [PartCategory::BrakeDisc], "spaced names reach the brake_disc rule");
    }

    #[test]
    fn load_fixture_records_mesh_names() {
        let import = ModelImport::load_gltf(FIXTURE).expect("fixture should import");
        let root = &import.roots[0];
        assert_eq!(root.mesh_name, None);
        assert_eq!(root.children[1].mesh_name.as_deref(), Some("mesh_rims"));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = ModelImport::load_gltf("assets/models/does_not_exist.gltf").unwrap_err();
        assert!(format!("{err:#}").contains("does_not_exist.gltf"));
    }
}

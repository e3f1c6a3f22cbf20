use crate::material::{Material, MaterialHandle};
use crate::mesh::{ImportedMaterial, ImportedNode, MeshGeometry, ModelImport};
use glam::{Mat4, Vec3};
use std::path::PathBuf;
use std::sync::Arc;

/// Renderable payload of a scene node.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub geometry: Arc<MeshGeometry>,
    pub material: MaterialHandle,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Mat4,
    pub mesh: Option<MeshNode>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self { name: name.into(), transform: Mat4::IDENTITY, mesh: None, children }
    }

    pub fn mesh(name: impl Into<String>, geometry: Arc<MeshGeometry>, material: MaterialHandle) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            mesh: Some(MeshNode { geometry, material }),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Root of a loaded asset. Owned by the scene once attached.
#[derive(Debug, Clone)]
pub struct ModelRoot {
    pub source: Option<PathBuf>,
    pub scale: Vec3,
    pub children: Vec<SceneNode>,
}

impl ModelRoot {
    pub fn new(children: Vec<SceneNode>) -> Self {
        Self { source: None, scale: Vec3::ONE, children }
    }

    /// Builds the scene graph for a decoded asset. Primitives that share a glTF material share
    /// one [`MaterialHandle`].
    pub fn from_import(import: ModelImport) -> Self {
        let ModelImport { source, roots, materials } = import;
        let mut builder = GraphBuilder {
            materials: materials.iter().map(|material| MaterialHandle::new(build_material(material))).collect(),
            default_material: None,
        };
        let children = roots.into_iter().map(|node| builder.build_node(node)).collect();
        Self { source: Some(source), scale: Vec3::ONE, children }
    }

    pub fn root_transform(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    /// Depth-first pre-order walk over every descendant, with its world transform.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(&SceneNode, Mat4),
    {
        let root = self.root_transform();
        for child in &self.children {
            walk(child, root, &mut visit);
        }
    }

    pub fn mesh_nodes(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        for child in &self.children {
            collect_meshes(child, &mut out);
        }
        out
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find_map(|child| find_in(child, name))
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.traverse(|_, _| count += 1);
        count
    }
}

fn walk<F>(node: &SceneNode, parent: Mat4, visit: &mut F)
where
    F: FnMut(&SceneNode, Mat4),
{
    let world = parent * node.transform;
    visit(node, world);
    for child in &node.children {
        walk(child, world, visit);
    }
}

fn collect_meshes<'a>(node: &'a SceneNode, out: &mut Vec<&'a SceneNode>) {
    if node.is_mesh() {
        out.push(node);
    }
    for child in &node.children {
        collect_meshes(child, out);
    }
}

fn find_in<'a>(node: &'a SceneNode, name: &str) -> Option<&'a SceneNode> {
    if node.name == name {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_in(child, name))
}

fn build_material(imported: &ImportedMaterial) -> Material {
    let [r, g, b, a] = imported.base_color_factor;
    let base_color = Vec3::new(r, g, b);
    let mut material = if imported.unlit {
        Material::basic(imported.label.clone(), base_color)
    } else {
        Material::standard(
            imported.label.clone(),
            base_color,
            imported.metallic_factor,
            imported.roughness_factor,
        )
        .with_emissive(Vec3::from_array(imported.emissive_factor))
    };
    if let Some(clearcoat) = imported.clearcoat_factor {
        material = material.with_clearcoat(clearcoat);
    }
    material.opacity = a;
    material
}

struct GraphBuilder {
    materials: Vec<MaterialHandle>,
    default_material: Option<MaterialHandle>,
}

impl GraphBuilder {
    fn material(&mut self, index: Option<usize>) -> MaterialHandle {
        if let Some(handle) = index.and_then(|idx| self.materials.get(idx)) {
            return handle.clone();
        }
        self.default_material.get_or_insert_with(|| MaterialHandle::new(Material::gltf_default())).clone()
    }

    fn build_node(&mut self, node: ImportedNode) -> SceneNode {
        let ImportedNode { name, mesh_name, transform, primitives, children } = node;
        let mut out = SceneNode { name, transform, mesh: None, children: Vec::new() };
        if primitives.len() == 1 {
            let primitive = &primitives[0];
            let material = self.material(primitive.material);
            out.mesh = Some(MeshNode { geometry: primitive.geometry.clone(), material });
        } else {
            let base = mesh_name.unwrap_or_else(|| out.name.clone());
            for (index, primitive) in primitives.iter().enumerate() {
                let child_name = format!("{base}_{index}");
                let material = self.material(primitive.material);
                out.children.push(SceneNode::mesh(child_name, primitive.geometry.clone(), material));
            }
        }
        for child in children {
            let built = self.build_node(child);
            out.children.push(built);
        }
        out
    }
}

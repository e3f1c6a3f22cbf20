use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::material::{Material, MaterialHandle};
use crate::mesh::{MeshGeometry, MeshVertex};
use crate::model::ModelRoot;
use crate::scene::SceneContext;

use super::DEPTH_FORMAT;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct MeshFrameData {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub key_dir: [f32; 4],
    pub key_color: [f32; 4],
    pub rim_dir: [f32; 4],
    pub rim_color: [f32; 4],
    pub point_pos: [f32; 4],
    pub point_color: [f32; 4],
}

impl MeshFrameData {
    pub fn from_scene(scene: &SceneContext) -> Self {
        let lights = &scene.lights;
        let scaled = |color: glam::Vec3, intensity: f32| (color * intensity).extend(1.0).to_array();
        Self {
            view_proj: scene.camera.view_projection().to_cols_array_2d(),
            camera_pos: scene.camera.position.extend(1.0).to_array(),
            ambient: scaled(lights.ambient.color, lights.ambient.intensity),
            key_dir: lights.key.direction().extend(0.0).to_array(),
            key_color: scaled(lights.key.color, lights.key.intensity),
            rim_dir: lights.rim.direction().extend(0.0).to_array(),
            rim_color: scaled(lights.rim.color, lights.rim.intensity),
            point_pos: lights.point.position.extend(lights.point.range).to_array(),
            point_color: scaled(lights.point.color, lights.point.intensity),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct MeshDrawData {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    pub params: [f32; 4],
}

impl MeshDrawData {
    pub fn new(world: Mat4, material: &Material) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            base_color: material.base_color.extend(material.opacity).to_array(),
            emissive: material.emissive.unwrap_or_default().extend(0.0).to_array(),
            params: [
                material.metalness,
                material.roughness,
                material.clearcoat.unwrap_or(0.0),
                if material.is_lit() { 0.0 } else { 1.0 },
            ],
        }
    }
}

/// One mesh node to draw this frame.
pub(super) struct DrawItem {
    pub world: Mat4,
    pub geometry: Arc<MeshGeometry>,
    pub material: MaterialHandle,
}

pub(super) fn collect_draws(model: &ModelRoot) -> Vec<DrawItem> {
    let mut draws = Vec::new();
    model.traverse(|node, world| {
        if let Some(mesh) = node.mesh.as_ref() {
            draws.push(DrawItem { world, geometry: mesh.geometry.clone(), material: mesh.material.clone() });
        }
    });
    draws
}

struct GpuGeometry {
    // Keeps the pointer used as cache key alive.
    _source: Arc<MeshGeometry>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct DrawSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    uploaded: Option<MeshDrawData>,
}

struct MeshPipelineResources {
    pipeline: wgpu::RenderPipeline,
    draw_bgl: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
}

#[derive(Default)]
pub(super) struct MeshPass {
    resources: Option<MeshPipelineResources>,
    geometry: HashMap<usize, GpuGeometry>,
    slots: Vec<DrawSlot>,
}

impl MeshPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_resources(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<()> {
        if self.resources.is_some() {
            return Ok(());
        }
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../assets/shaders/mesh.wgsl").into()),
        });
        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Frame BGL"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let draw_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Draw BGL"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_bgl, &draw_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState { count: sample_count, ..Default::default() },
            multiview: None,
            cache: None,
        });
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Frame Buffer"),
            size: std::mem::size_of::<MeshFrameData>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
        });
        self.resources = Some(MeshPipelineResources { pipeline, draw_bgl, frame_buffer, frame_bind_group });
        Ok(())
    }

    /// Uploads frame and per-draw uniforms. A draw's uniform is rewritten when its value changed
    /// or its material asked for a refresh.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneContext,
        draws: &[DrawItem],
    ) -> Result<()> {
        let resources = self.resources.as_ref().context("Mesh pipeline not initialized")?;
        queue.write_buffer(&resources.frame_buffer, 0, bytemuck::bytes_of(&MeshFrameData::from_scene(scene)));

        while self.slots.len() < draws.len() {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Mesh Draw Buffer"),
                size: std::mem::size_of::<MeshDrawData>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mesh Draw BG"),
                layout: &resources.draw_bgl,
                entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
            });
            self.slots.push(DrawSlot { buffer, bind_group, uploaded: None });
        }

        for (slot, draw) in self.slots.iter_mut().zip(draws) {
            let refresh = draw.material.borrow_mut().take_needs_update();
            let data = MeshDrawData::new(draw.world, &draw.material.borrow());
            if refresh || slot.uploaded != Some(data) {
                queue.write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&data));
                slot.uploaded = Some(data);
            }
            let key = Arc::as_ptr(&draw.geometry) as usize;
            self.geometry.entry(key).or_insert_with(|| upload_geometry(device, &draw.geometry));
        }
        Ok(())
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, draws: &[DrawItem]) -> Result<()> {
        let resources = self.resources.as_ref().context("Mesh pipeline not initialized")?;
        pass.set_pipeline(&resources.pipeline);
        pass.set_bind_group(0, &resources.frame_bind_group, &[]);
        for (slot, draw) in self.slots.iter().zip(draws) {
            let key = Arc::as_ptr(&draw.geometry) as usize;
            let Some(gpu) = self.geometry.get(&key) else {
                continue;
            };
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..gpu.index_count, 0, 0..1);
        }
        Ok(())
    }

    /// Drops cached geometry that no longer appears in the draw list.
    pub fn retain_geometry(&mut self, draws: &[DrawItem]) {
        if self.geometry.len() <= draws.len() {
            return;
        }
        let live: std::collections::HashSet<usize> =
            draws.iter().map(|draw| Arc::as_ptr(&draw.geometry) as usize).collect();
        self.geometry.retain(|key, _| live.contains(key));
    }
}

fn upload_geometry(device: &wgpu::Device, geometry: &Arc<MeshGeometry>) -> GpuGeometry {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Vertex Buffer"),
        contents: bytemuck::cast_slice(&geometry.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Index Buffer"),
        contents: bytemuck::cast_slice(&geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuGeometry {
        _source: geometry.clone(),
        vertex_buffer,
        index_buffer,
        index_count: geometry.indices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SceneNode;
    use crate::scene::{SceneManager, SurfaceSize};
    use glam::Vec3;

    #[test]
    fn draw_data_packs_material_capabilities() {
        let lit = Material::standard("paint", Vec3::new(1.0, 0.0, 0.0), 0.8, 0.3).with_clearcoat(1.0);
        let data = MeshDrawData::new(Mat4::IDENTITY, &lit);
        assert_eq!(data.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(data.params, [0.8, 0.3, 1.0, 0.0]);

        let basic = Material::basic("decal", Vec3::ONE);
        let data = MeshDrawData::new(Mat4::IDENTITY, &basic);
        assert_eq!(data.emissive, [0.0; 4]);
        assert_eq!(data.params[3], 1.0);
    }

    #[test]
    fn recolour_changes_draw_data() {
        let material = MaterialHandle::new(Material::standard("rims", Vec3::ONE, 0.1, 0.9));
        let before = MeshDrawData::new(Mat4::IDENTITY, &material.borrow());
        material.borrow_mut().base_color = Vec3::ZERO;
        let after = MeshDrawData::new(Mat4::IDENTITY, &material.borrow());
        assert_ne!(before, after);
    }

    #[test]
    fn frame_data_carries_light_rig() {
        let scene = SceneManager::default().initialize(SurfaceSize::new(100, 100));
        let frame = MeshFrameData::from_scene(&scene);
        assert_eq!(frame.ambient, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(frame.point_pos, [0.0, 5.0, 5.0, 100.0]);
        assert_eq!(frame.key_color[0], 1.2);
    }

    #[test]
    fn collect_draws_skips_groups() {
        let geometry = Arc::new(MeshGeometry::triangle());
        let material = MaterialHandle::new(Material::gltf_default());
        let model = ModelRoot::new(vec![SceneNode::group(
            "car",
            vec![SceneNode::mesh("a", geometry.clone(), material.clone()), SceneNode::mesh("b", geometry, material)],
        )]);
        let draws = collect_draws(&model);
        assert_eq!(draws.len(), 2);
        assert!(Arc::ptr_eq(&draws[0].geometry, &draws[1].geometry));
    }
}

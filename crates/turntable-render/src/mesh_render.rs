//! Model part GPU rendering resources.

use glam::Mat4;

use turntable_core::{Mesh, RenderablePart};

use crate::buffer::{create_index_buffer, create_uniform_buffer, create_vertex_buffer, update_buffer};

/// Base colors assigned to parts in discovery order.
const PART_PALETTE: [[f32; 4]; 6] = [
    [0.78, 0.78, 0.80, 1.0], // light gray
    [0.85, 0.55, 0.35, 1.0], // terracotta
    [0.40, 0.60, 0.85, 1.0], // steel blue
    [0.55, 0.75, 0.45, 1.0], // sage
    [0.90, 0.80, 0.45, 1.0], // sand
    [0.65, 0.50, 0.75, 1.0], // lavender
];

/// Palette color for the part at `index`.
#[must_use]
pub fn part_color(index: usize) -> [f32; 4] {
    PART_PALETTE[index % PART_PALETTE.len()]
}

/// Interleaved vertex layout consumed by the mesh shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for [`MeshVertex`].
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleaves a mesh's positions and normals.
#[must_use]
pub fn interleave(mesh: &Mesh) -> Vec<MeshVertex> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .map(|(p, n)| MeshVertex {
            position: p.to_array(),
            normal: n.to_array(),
        })
        .collect()
}

/// Per-part uniforms.
/// Note: Layout must match WGSL `PartUniforms` exactly (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PartUniforms {
    /// Turntable transform applied to the part's world-space vertices.
    pub model: [[f32; 4]; 4],
    /// Base color (RGBA).
    pub color: [f32; 4],
}

impl Default for PartUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: PART_PALETTE[0],
        }
    }
}

/// GPU resources for one renderable part.
pub struct PartRenderData {
    /// Interleaved vertex buffer.
    pub vertex_buffer: wgpu::Buffer,
    /// Index buffer (triangle indices).
    pub index_buffer: wgpu::Buffer,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Uniform buffer.
    pub uniform_buffer: wgpu::Buffer,
    /// Bind group for the part uniforms.
    pub bind_group: wgpu::BindGroup,
    color: [f32; 4],
}

impl PartRenderData {
    /// Uploads `part` to the GPU.
    pub fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        part: &RenderablePart,
        color: [f32; 4],
    ) -> Self {
        let vertices = interleave(&part.mesh);
        let vertex_buffer = create_vertex_buffer(device, &vertices, Some(part.name.as_str()));
        let index_buffer = create_index_buffer(device, &part.mesh.indices, Some(part.name.as_str()));

        let uniforms = PartUniforms {
            color,
            ..Default::default()
        };
        let uniform_buffer = create_uniform_buffer(device, &uniforms, Some("part uniforms"));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("part bind group"),
            layout: bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: part.mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
            color,
        }
    }

    /// Writes the turntable transform for the next draw.
    pub fn update_transform(&self, queue: &wgpu::Queue, model: Mat4) {
        let uniforms = PartUniforms {
            model: model.to_cols_array_2d(),
            color: self.color,
        };
        update_buffer(queue, &self.uniform_buffer, &[uniforms]);
    }

    /// Records the draw call.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<PartUniforms>(), 80);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn test_interleave_cuboid() {
        let mesh = Mesh::cuboid(Vec3::ZERO, Vec3::ONE);
        let vertices = interleave(&mesh);
        assert_eq!(vertices.len(), mesh.positions.len());
        assert_eq!(vertices[0].position, mesh.positions[0].to_array());
        assert_eq!(vertices[0].normal, mesh.normals[0].to_array());
    }

    #[test]
    fn test_part_color_wraps() {
        assert_eq!(part_color(0), part_color(PART_PALETTE.len()));
        assert_ne!(part_color(0), part_color(1));
    }
}

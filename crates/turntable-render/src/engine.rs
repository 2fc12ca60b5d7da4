//! The headless rendering engine.

use glam::Mat4;

use turntable_core::{FrameBuffer, ModelInstance, Turntable};

use crate::buffer::{
    aligned_bytes_per_row, create_readback_buffer, create_uniform_buffer, strip_row_padding,
    update_buffer,
};
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::mesh_render::{part_color, MeshVertex, PartRenderData};

/// Color format of every render target.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Depth format of every render target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl CameraUniforms {
    fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
        }
    }
}

/// A color and depth texture pair the camera draws into.
struct RenderTarget {
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            color_texture,
            width,
            height,
        }
    }
}

/// The rendering engine backed by wgpu, without a window.
///
/// The engine draws the uploaded model through its [`Camera`] into an
/// off-screen view every frame. Captures allocate a separate render target
/// and readback buffer, draw one frame into it, and release both once the
/// pixels have been copied out.
pub struct RenderEngine {
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The camera the frames are rendered through.
    pub camera: Camera,
    /// Background color.
    pub clear_color: wgpu::Color,
    view_target: RenderTarget,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    part_bind_group_layout: wgpu::BindGroupLayout,
    mesh_pipeline: wgpu::RenderPipeline,
    parts: Vec<PartRenderData>,
    model_matrix: Mat4,
}

impl RenderEngine {
    /// Creates a new headless render engine with a `width` x `height` view.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        log::info!("using graphics adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("turntable device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let camera = Camera::new(width as f32 / height as f32);

        let camera_buffer = create_uniform_buffer(
            &device,
            &CameraUniforms::from_camera(&camera),
            Some("camera uniforms"),
        );

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let part_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Part Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let mesh_pipeline = Self::create_mesh_pipeline(
            &device,
            &camera_bind_group_layout,
            &part_bind_group_layout,
        );

        let view_target = RenderTarget::new(&device, width, height, "view texture");

        Ok(Self {
            device,
            queue,
            camera,
            clear_color: wgpu::Color::WHITE,
            view_target,
            camera_buffer,
            camera_bind_group,
            part_bind_group_layout,
            mesh_pipeline,
            parts: Vec::new(),
            model_matrix: Mat4::IDENTITY,
        })
    }

    fn create_mesh_pipeline(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        part_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Turntable Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/turntable_mesh.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Turntable Mesh Pipeline Layout"),
            bind_group_layouts: &[camera_layout, part_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Turntable Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Imported meshes do not agree on winding.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Width of the view in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.view_target.width
    }

    /// Height of the view in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.view_target.height
    }

    /// Number of parts currently uploaded.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Replaces the uploaded geometry with `instance`'s parts.
    pub fn upload_instance(&mut self, instance: &ModelInstance) {
        self.parts = instance
            .parts()
            .iter()
            .enumerate()
            .map(|(i, part)| {
                PartRenderData::new(&self.device, &self.part_bind_group_layout, part, part_color(i))
            })
            .collect();
        log::debug!(
            "uploaded {} part(s) of {}",
            self.parts.len(),
            instance.name()
        );
    }

    /// Releases all uploaded geometry.
    pub fn clear_meshes(&mut self) {
        self.parts.clear();
    }

    /// Points the camera at the turntable pivot and applies its rotation to
    /// the uploaded geometry.
    pub fn set_turntable(&mut self, turntable: &Turntable) {
        self.camera.set_target(turntable.position);
        self.model_matrix = turntable.subject_transform();
    }

    fn update_uniforms(&self) {
        update_buffer(
            &self.queue,
            &self.camera_buffer,
            &[CameraUniforms::from_camera(&self.camera)],
        );
        for part in &self.parts {
            part.update_transform(&self.queue, self.model_matrix);
        }
    }

    fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, target: &RenderTarget) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Turntable Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(&self.mesh_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for part in &self.parts {
            part.draw(&mut render_pass);
        }
    }

    /// Renders one frame into the view and waits for the GPU.
    pub fn render(&mut self) {
        self.update_uniforms();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        self.encode_draw(&mut encoder, &self.view_target);
        self.queue.submit(std::iter::once(encoder.finish()));
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
    }

    /// Renders one frame into a fresh `width` x `height` target and reads
    /// its pixels back.
    ///
    /// The camera's aspect ratio follows the target for this frame only.
    pub fn capture_frame(&mut self, width: u32, height: u32) -> RenderResult<FrameBuffer> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }

        let view_aspect = self.camera.aspect_ratio;
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        self.update_uniforms();
        self.camera.set_aspect_ratio(view_aspect);

        let target = RenderTarget::new(&self.device, width, height, "capture texture");
        let buffer = create_readback_buffer(&self.device, width, height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture encoder"),
            });
        self.encode_draw(&mut encoder, &target);

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(aligned_bytes_per_row(width)),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        // Map buffer and read data
        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::Timeout)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            strip_row_padding(&data, width, height)
        };
        buffer.unmap();

        // Target and buffer are released here.
        Ok(FrameBuffer {
            width,
            height,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniforms_size() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 64);
    }

    #[test]
    fn test_camera_uniforms_follow_camera() {
        let mut camera = Camera::new(1.0);
        camera.set_target(glam::Vec3::new(1.0, 0.0, 0.0));
        let uniforms = CameraUniforms::from_camera(&camera);
        assert_eq!(
            uniforms.view_proj,
            camera.view_projection_matrix().to_cols_array_2d()
        );
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let result = pollster::block_on(RenderEngine::new_headless(0, 512));
        assert!(matches!(
            result,
            Err(RenderError::InvalidTargetSize {
                width: 0,
                height: 512
            })
        ));
    }
}

//! A compute pipeline fills a window sized texture once at startup; every frame
//! draws that texture on a full screen quad.
use anyhow::Result;
use std::iter;
use wgpu::util::DeviceExt;

use gpu_samples::content::{load_shader, shader_flags};
use gpu_samples::framework::{self, Example};
use gpu_samples::graphics::{
    create_texture_2d, dispatch_grid, quad_triangle_list, texture_sampler_bind_group,
    texture_sampler_layout, GraphicsPipelineCreateInfo, PositionTextureVertex, SampleCount,
};
use gpu_samples::settings::{FrameLimiterSettings, WindowCreateInfo};

const FILL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const CORNFLOWER_BLUE: wgpu::Color = wgpu::Color {
    r: 100.0 / 255.0,
    g: 149.0 / 255.0,
    b: 237.0 / 255.0,
    a: 1.0,
};

struct FillTarget {
    // owns the storage behind `bind_group`
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct BasicCompute {
    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group_layout: wgpu::BindGroupLayout,
    draw_pipeline: wgpu::RenderPipeline,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    target: FillTarget,
}

impl BasicCompute {
    /// Creates the texture, then records and submits the compute dispatch
    /// that fills it.
    fn fill_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> FillTarget {
        Self::fill_texture_with(
            device,
            queue,
            &self.compute_pipeline,
            &self.compute_bind_group_layout,
            &self.texture_bind_group_layout,
            &self.sampler,
            width,
            height,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_texture_with(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        compute_pipeline: &wgpu::ComputePipeline,
        compute_bind_group_layout: &wgpu::BindGroupLayout,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> FillTarget {
        let texture = create_texture_2d(
            device,
            "fill_texture",
            width,
            height,
            FILL_FORMAT,
            wgpu::TextureUsage::STORAGE | wgpu::TextureUsage::SAMPLED,
            SampleCount::One,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: compute_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                }
            ],
            label: Some("compute_bind_group"),
        });

        let (x, y, z) = dispatch_grid(width, height);
        log::info!("dispatching {}x{}x{} workgroups for a {}x{} texture", x, y, z, width, height);
        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {label: Some("fill_texture")}
        );
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {label: None});
            cpass.set_pipeline(compute_pipeline);
            cpass.set_bind_group(0, &compute_bind_group, &[]);
            cpass.dispatch(x, y, z);
        }
        queue.submit(iter::once(encoder.finish()));

        let bind_group = texture_sampler_bind_group(device, texture_bind_group_layout, &view, sampler);
        FillTarget {
            _texture: texture,
            bind_group,
        }
    }
}

impl Example for BasicCompute {
    fn init(
        sc_desc: &wgpu::SwapChainDescriptor,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Self> {
        let flags = shader_flags(adapter);
        let cs_module = load_shader(device, "FillTextureCompute.spv", flags)?;
        let vs_module = load_shader(device, "TexturedQuadVert.spv", flags)?;
        let fs_module = load_shader(device, "TexturedQuadFrag.spv", flags)?;

        let compute_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStage::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: FILL_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                }
            ],
            label: Some("compute_bind_group_layout"),
        });
        let compute_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compute"),
            bind_group_layouts: &[&compute_bind_group_layout],
            push_constant_ranges: &[],
        });
        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fill_texture"),
            layout: Some(&compute_pipeline_layout),
            module: &cs_module,
            entry_point: "main",
        });

        let texture_bind_group_layout = texture_sampler_layout(device);
        let draw_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("draw"),
            bind_group_layouts: &[&texture_bind_group_layout],
            push_constant_ranges: &[],
        });
        let vertex_buffers = [PositionTextureVertex::layout()];
        let draw_pipeline = GraphicsPipelineCreateInfo::standard(sc_desc.format, &vs_module, &fs_module)
            .with_label("textured_quad")
            .with_vertex_buffers(&vertex_buffers)
            .with_layout(&draw_pipeline_layout)
            .build(device);

        let vertices = quad_triangle_list();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices.as_slice()),
            usage: wgpu::BufferUsage::VERTEX,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());

        let target = Self::fill_texture_with(
            device,
            queue,
            &compute_pipeline,
            &compute_bind_group_layout,
            &texture_bind_group_layout,
            &sampler,
            sc_desc.width,
            sc_desc.height,
        );

        Ok(BasicCompute {
            compute_pipeline,
            compute_bind_group_layout,
            draw_pipeline,
            texture_bind_group_layout,
            sampler,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            target,
        })
    }

    fn resize(
        &mut self,
        sc_desc: &wgpu::SwapChainDescriptor,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        self.target = self.fill_texture(device, queue, sc_desc.width, sc_desc.height);
    }

    fn render(
        &mut self,
        frame: &wgpu::SwapChainTexture,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {label: None}
        );
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[wgpu::RenderPassColorAttachmentDescriptor {
                    attachment: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CORNFLOWER_BLUE),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            rpass.set_pipeline(&self.draw_pipeline);
            rpass.set_bind_group(0, &self.target.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            rpass.draw(0..self.vertex_count, 0..1);
        }
        queue.submit(iter::once(encoder.finish()));
    }
}

fn main() -> Result<()> {
    framework::run::<BasicCompute>(
        WindowCreateInfo::standard(),
        FrameLimiterSettings::standard(),
    )
}

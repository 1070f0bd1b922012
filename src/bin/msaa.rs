//! The parts of this example enabling MSAA are:
//! *    One triangle pipeline is built per sample count.
//! *    When the count is above one, the triangle is drawn into a multisampled texture which is
//!      resolved into the offscreen render target instead of being stored.
//! *    The render target is then blitted to the swapchain with a textured quad.
//!
//! Press A and D to step through the sample counts.
use anyhow::Result;
use std::iter;
use std::time::Duration;
use wgpu::util::DeviceExt;

use gpu_samples::content::{load_shader, shader_flags};
use gpu_samples::framework::{self, Example};
use gpu_samples::graphics::{
    create_texture_2d, point_clamp_sampler, quad_vertices, texture_sampler_bind_group,
    texture_sampler_layout, GraphicsPipelineCreateInfo, PositionTextureVertex, SampleCount,
    QUAD_INDICES,
};
use gpu_samples::input::Keyboard;
use gpu_samples::settings::{FrameLimiterSettings, WindowCreateInfo};

const RT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsage,
        sample_count: SampleCount,
    ) -> Self {
        let texture = create_texture_2d(device, label, width, height, RT_FORMAT, usage, sample_count);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        RenderTarget {
            _texture: texture,
            view,
        }
    }

    fn resolve(device: &wgpu::Device, width: u32, height: u32) -> Self {
        RenderTarget::new(
            device,
            "rt",
            width,
            height,
            wgpu::TextureUsage::RENDER_ATTACHMENT | wgpu::TextureUsage::SAMPLED,
            SampleCount::One,
        )
    }

    /// `None` for a single sample: the triangle then goes straight into `rt`.
    fn multisampled(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: SampleCount,
    ) -> Option<Self> {
        if !sample_count.is_multisampled() {
            return None;
        }
        Some(RenderTarget::new(
            device,
            "msaa_rt",
            width,
            height,
            wgpu::TextureUsage::RENDER_ATTACHMENT,
            sample_count,
        ))
    }
}

struct Msaa {
    msaa_pipelines: Vec<wgpu::RenderPipeline>,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_bind_group: wgpu::BindGroup,
    rt: RenderTarget,
    msaa_rt: Option<RenderTarget>,
    rt_sampler: wgpu::Sampler,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    sample_count: SampleCount,
    rebuild_msaa_rt: bool,
    size: (u32, u32),
}

impl Example for Msaa {
    fn init(
        sc_desc: &wgpu::SwapChainDescriptor,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) -> Result<Self> {
        let sample_count = SampleCount::Four;
        log::info!("Press A and D to cycle between sample counts");
        log::info!("Setting sample count to: {:?}", sample_count);

        let flags = shader_flags(adapter);

        // one triangle pipeline per sample count
        let triangle_vs = load_shader(device, "RawTriangleVertices.spv", flags)?;
        let triangle_fs = load_shader(device, "SolidColor.spv", flags)?;
        let triangle_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("triangle"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let triangle_info = GraphicsPipelineCreateInfo::standard(RT_FORMAT, &triangle_vs, &triangle_fs)
            .with_label("triangle")
            .with_layout(&triangle_layout);
        let msaa_pipelines = SampleCount::ALL
            .iter()
            .map(|&count| triangle_info.with_sample_count(count).build(device))
            .collect();

        // blit
        let blit_vs = load_shader(device, "TexturedQuadVert.spv", flags)?;
        let blit_fs = load_shader(device, "TexturedQuadFrag.spv", flags)?;
        let blit_bind_group_layout = texture_sampler_layout(device);
        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit"),
            bind_group_layouts: &[&blit_bind_group_layout],
            push_constant_ranges: &[],
        });
        let vertex_buffers = [PositionTextureVertex::layout()];
        let blit_pipeline = GraphicsPipelineCreateInfo::standard(sc_desc.format, &blit_vs, &blit_fs)
            .with_label("blit")
            .with_vertex_buffers(&vertex_buffers)
            .with_layout(&blit_layout)
            .build(device);

        let rt = RenderTarget::resolve(device, sc_desc.width, sc_desc.height);
        let msaa_rt = RenderTarget::multisampled(device, sc_desc.width, sc_desc.height, sample_count);
        let rt_sampler = point_clamp_sampler(device);
        let blit_bind_group = texture_sampler_bind_group(device, &blit_bind_group_layout, &rt.view, &rt_sampler);

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&quad_vertices()),
            usage: wgpu::BufferUsage::VERTEX,
        });
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsage::INDEX,
        });
        device.poll(wgpu::Maintain::Wait);

        Ok(Msaa {
            msaa_pipelines,
            blit_pipeline,
            blit_bind_group_layout,
            blit_bind_group,
            rt,
            msaa_rt,
            rt_sampler,
            quad_vertex_buffer,
            quad_index_buffer,
            sample_count,
            rebuild_msaa_rt: false,
            size: (sc_desc.width, sc_desc.height),
        })
    }

    fn update(&mut self, keyboard: &Keyboard, _delta: Duration) {
        let prev_sample_count = self.sample_count;
        self.sample_count = self.sample_count.step(keyboard);
        if prev_sample_count != self.sample_count {
            log::info!("Setting sample count to: {:?}", self.sample_count);
            self.rebuild_msaa_rt = true;
        }
    }

    fn resize(
        &mut self,
        sc_desc: &wgpu::SwapChainDescriptor,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
    ) {
        self.size = (sc_desc.width, sc_desc.height);
        self.rt = RenderTarget::resolve(device, sc_desc.width, sc_desc.height);
        self.blit_bind_group = texture_sampler_bind_group(
            device,
            &self.blit_bind_group_layout,
            &self.rt.view,
            &self.rt_sampler,
        );
        self.rebuild_msaa_rt = true;
    }

    fn render(
        &mut self,
        frame: &wgpu::SwapChainTexture,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        if self.rebuild_msaa_rt {
            let (width, height) = self.size;
            self.msaa_rt = RenderTarget::multisampled(device, width, height, self.sample_count);
            self.rebuild_msaa_rt = false;
        }
        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {label: None}
        );

        ///////////////////////////////////////////////////////////////////////
        // TRIANGLE -> RT
        ///////////////////////////////////////////////////////////////////////
        let rpass_color_attachment = match &self.msaa_rt {
            None => wgpu::RenderPassColorAttachmentDescriptor {
                attachment: &self.rt.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            },
            Some(msaa_rt) => wgpu::RenderPassColorAttachmentDescriptor {
                attachment: &msaa_rt.view,
                resolve_target: Some(&self.rt.view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: false,
                },
            },
        };
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("triangle"),
                color_attachments: &[rpass_color_attachment],
                depth_stencil_attachment: None,
            });
            rpass.set_pipeline(&self.msaa_pipelines[self.sample_count.index()]);
            rpass.draw(0..3, 0..1);
        }

        ///////////////////////////////////////////////////////////////////////
        // RT -> SWAPCHAIN
        ///////////////////////////////////////////////////////////////////////
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit"),
                color_attachments: &[wgpu::RenderPassColorAttachmentDescriptor {
                    attachment: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            rpass.set_pipeline(&self.blit_pipeline);
            rpass.set_bind_group(0, &self.blit_bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            rpass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }

        queue.submit(iter::once(encoder.finish()));
    }
}

fn main() -> Result<()> {
    framework::run::<Msaa>(
        WindowCreateInfo::standard(),
        FrameLimiterSettings::standard(),
    )
}

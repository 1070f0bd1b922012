use bytemuck::{Pod, Zeroable};
use cgmath::{Vector2, Vector3};
use winit::event::VirtualKeyCode;

use crate::input::Keyboard;

///////////////////////////////////////////////////////////////////////////////
// VERTICES
///////////////////////////////////////////////////////////////////////////////

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionTextureVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl PositionTextureVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float2,
        },
    ];

    pub fn new(position: Vector3<f32>, tex_coord: Vector2<f32>) -> Self {
        PositionTextureVertex {
            position: position.into(),
            tex_coord: tex_coord.into(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionTextureVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::InputStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Full screen quad, drawn with [`QUAD_INDICES`].
pub fn quad_vertices() -> [PositionTextureVertex; 4] {
    [
        PositionTextureVertex::new(Vector3::new(-1.0, -1.0, 0.0), Vector2::new(0.0, 0.0)),
        PositionTextureVertex::new(Vector3::new(1.0, -1.0, 0.0), Vector2::new(1.0, 0.0)),
        PositionTextureVertex::new(Vector3::new(1.0, 1.0, 0.0), Vector2::new(1.0, 1.0)),
        PositionTextureVertex::new(Vector3::new(-1.0, 1.0, 0.0), Vector2::new(0.0, 1.0)),
    ]
}

/// The same quad as two unindexed triangles.
pub fn quad_triangle_list() -> Vec<PositionTextureVertex> {
    let corners = quad_vertices();
    QUAD_INDICES.iter().map(|&i| corners[i as usize]).collect()
}

///////////////////////////////////////////////////////////////////////////////
// MULTISAMPLING
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleCount {
    One,
    Two,
    Four,
    Eight,
}

impl SampleCount {
    pub const ALL: [SampleCount; 4] = [
        SampleCount::One,
        SampleCount::Two,
        SampleCount::Four,
        SampleCount::Eight,
    ];

    pub fn samples(self) -> u32 {
        1 << self.index()
    }

    pub fn index(self) -> usize {
        match self {
            SampleCount::One => 0,
            SampleCount::Two => 1,
            SampleCount::Four => 2,
            SampleCount::Eight => 3,
        }
    }

    /// Previous count, wrapping from `One` to `Eight`.
    pub fn prev(self) -> Self {
        let len = SampleCount::ALL.len();
        SampleCount::ALL[(self.index() + len - 1) % len]
    }

    /// Next count, wrapping from `Eight` to `One`.
    pub fn next(self) -> Self {
        SampleCount::ALL[(self.index() + 1) % SampleCount::ALL.len()]
    }

    /// A steps down, D steps up; both in the same frame cancel out.
    pub fn step(self, keyboard: &Keyboard) -> Self {
        let mut count = self;
        if keyboard.is_pressed(VirtualKeyCode::A) {
            count = count.prev();
        }
        if keyboard.is_pressed(VirtualKeyCode::D) {
            count = count.next();
        }
        count
    }

    pub fn is_multisampled(self) -> bool {
        self != SampleCount::One
    }
}

///////////////////////////////////////////////////////////////////////////////
// COMPUTE
///////////////////////////////////////////////////////////////////////////////

/// Must match `local_size_x`/`local_size_y` in the compute shaders.
pub const WORKGROUP_SIZE: u32 = 8;

pub fn dispatch_grid(width: u32, height: u32) -> (u32, u32, u32) {
    (width / WORKGROUP_SIZE, height / WORKGROUP_SIZE, 1)
}

///////////////////////////////////////////////////////////////////////////////
// PIPELINES
///////////////////////////////////////////////////////////////////////////////

/// One opaque color target, no depth, triangle list, clockwise, no culling.
#[derive(Clone, Copy)]
pub struct GraphicsPipelineCreateInfo<'a> {
    pub label: Option<&'a str>,
    pub target_format: wgpu::TextureFormat,
    pub vertex_shader: &'a wgpu::ShaderModule,
    pub fragment_shader: &'a wgpu::ShaderModule,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub layout: Option<&'a wgpu::PipelineLayout>,
    pub sample_count: SampleCount,
}

impl<'a> GraphicsPipelineCreateInfo<'a> {
    pub fn standard(
        target_format: wgpu::TextureFormat,
        vertex_shader: &'a wgpu::ShaderModule,
        fragment_shader: &'a wgpu::ShaderModule,
    ) -> Self {
        GraphicsPipelineCreateInfo {
            label: None,
            target_format,
            vertex_shader,
            fragment_shader,
            vertex_buffers: &[],
            layout: None,
            sample_count: SampleCount::One,
        }
    }
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
    pub fn with_vertex_buffers(mut self, vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>]) -> Self {
        self.vertex_buffers = vertex_buffers;
        self
    }
    pub fn with_layout(mut self, layout: &'a wgpu::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }
    pub fn with_sample_count(mut self, sample_count: SampleCount) -> Self {
        self.sample_count = sample_count;
        self
    }

    fn color_target_state(&self) -> wgpu::ColorTargetState {
        let opaque = wgpu::BlendState {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::Zero,
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::ColorTargetState {
            format: self.target_format,
            color_blend: opaque.clone(),
            alpha_blend: opaque,
            write_mask: wgpu::ColorWrite::ALL,
        }
    }

    pub fn build(&self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        log::debug!(
            "creating pipeline {:?} ({:?}, {} samples)",
            self.label,
            self.target_format,
            self.sample_count.samples()
        );
        let color_target_state = &[self.color_target_state()];
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: self.label,
            layout: self.layout,
            vertex: wgpu::VertexState {
                module: self.vertex_shader,
                entry_point: "main",
                buffers: self.vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: self.fragment_shader,
                entry_point: "main",
                targets: color_target_state,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Cw,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: self.sample_count.samples(),
                ..Default::default()
            },
        })
    }
}

///////////////////////////////////////////////////////////////////////////////
// TEXTURES & SAMPLERS
///////////////////////////////////////////////////////////////////////////////

pub fn create_texture_2d(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsage,
    sample_count: SampleCount,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth: 1,
        },
        mip_level_count: 1,
        sample_count: sample_count.samples(),
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
    })
}

pub fn point_clamp_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("point_clamp"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Fragment stage: binding 0 is a 2D float texture, binding 1 its sampler.
pub fn texture_sampler_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStage::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStage::FRAGMENT,
                ty: wgpu::BindingType::Sampler {
                    filtering: true,
                    comparison: false,
                },
                count: None,
            },
        ],
        label: Some("texture_sampler_layout"),
    })
}

pub fn texture_sampler_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("texture_sampler_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::key_event;
    use winit::event::ElementState;

    #[test]
    fn wraps_at_both_ends() {
        assert_eq!(SampleCount::One.prev(), SampleCount::Eight);
        assert_eq!(SampleCount::Eight.next(), SampleCount::One);
        assert_eq!(SampleCount::Two.prev(), SampleCount::One);
        assert_eq!(SampleCount::Four.next(), SampleCount::Eight);
    }

    #[test]
    fn every_key_sequence_stays_in_range() {
        // every A/D sequence up to length 8, starting from the msaa default
        for len in 0..=8u32 {
            for bits in 0..(1u32 << len) {
                let mut count = SampleCount::Four;
                let mut expected = SampleCount::Four.index() as i64;
                for step in 0..len {
                    if bits & (1 << step) == 0 {
                        count = count.prev();
                        expected -= 1;
                    } else {
                        count = count.next();
                        expected += 1;
                    }
                    assert!(SampleCount::ALL.contains(&count));
                }
                assert_eq!(count.index() as i64, expected.rem_euclid(4));
            }
        }
    }

    #[test]
    fn sample_values() {
        let samples: Vec<u32> = SampleCount::ALL.iter().map(|c| c.samples()).collect();
        assert_eq!(samples, vec![1, 2, 4, 8]);
        assert!(!SampleCount::One.is_multisampled());
        assert!(SampleCount::Eight.is_multisampled());
    }

    fn frame(keyboard: &mut Keyboard, count: SampleCount, events: &[(VirtualKeyCode, ElementState)]) -> SampleCount {
        for &(key, state) in events {
            keyboard.handle_event(&key_event(key, state));
        }
        let count = count.step(keyboard);
        keyboard.end_frame();
        count
    }

    #[test]
    fn keys_step_sample_count() {
        use ElementState::{Pressed, Released};
        let mut keyboard = Keyboard::new();

        let count = frame(&mut keyboard, SampleCount::Four, &[(VirtualKeyCode::A, Pressed)]);
        assert_eq!(count, SampleCount::Two);
        let count = frame(&mut keyboard, count, &[(VirtualKeyCode::A, Released)]);
        assert_eq!(count, SampleCount::Two);

        let count = frame(&mut keyboard, count, &[(VirtualKeyCode::D, Pressed)]);
        assert_eq!(count, SampleCount::Four);
        let count = frame(&mut keyboard, count, &[(VirtualKeyCode::D, Released)]);

        let count = frame(
            &mut keyboard,
            count,
            &[(VirtualKeyCode::A, Pressed), (VirtualKeyCode::D, Pressed)],
        );
        assert_eq!(count, SampleCount::Four);
    }

    #[test]
    fn held_key_steps_once() {
        use ElementState::Pressed;
        let mut keyboard = Keyboard::new();
        let mut count = frame(&mut keyboard, SampleCount::Eight, &[(VirtualKeyCode::D, Pressed)]);
        assert_eq!(count, SampleCount::One);
        for _ in 0..5 {
            count = frame(&mut keyboard, count, &[(VirtualKeyCode::D, Pressed)]);
        }
        assert_eq!(count, SampleCount::One);
    }

    #[test]
    fn other_keys_leave_count_alone() {
        let mut keyboard = Keyboard::new();
        let count = frame(
            &mut keyboard,
            SampleCount::One,
            &[(VirtualKeyCode::W, ElementState::Pressed)],
        );
        assert_eq!(count, SampleCount::One);
    }

    #[test]
    fn dispatch_grid_floors() {
        assert_eq!(dispatch_grid(640, 480), (80, 60, 1));
        assert_eq!(dispatch_grid(643, 479), (80, 59, 1));
        assert_eq!(dispatch_grid(7, 8), (0, 1, 1));
        assert_eq!(dispatch_grid(1920, 1080), (240, 135, 1));
    }

    #[test]
    fn compute_shader_matches_workgroup_size() {
        let src = include_str!("../shaders/FillTextureCompute.comp");
        let expected = format!("local_size_x = {}, local_size_y = {}", WORKGROUP_SIZE, WORKGROUP_SIZE);
        assert!(src.contains(&expected));
    }

    #[test]
    fn vertex_layout() {
        let layout = PositionTextureVertex::layout();
        assert_eq!(layout.array_stride, 20);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn quad_geometry() {
        let quad = quad_triangle_list();
        assert_eq!(quad.len(), 6);
        assert_eq!(quad[0], quad[3]);
        assert_eq!(quad[2], quad[4]);
        assert_eq!(quad[5].position, [-1.0, 1.0, 0.0]);
        assert_eq!(quad[5].tex_coord, [0.0, 1.0]);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < quad_vertices().len()));
    }
}

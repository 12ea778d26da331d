use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{Context, Result};

use crate::coords::{ColorRgba, Rect, Viewport};
use crate::imaging::ImageSource;

use super::shader::{
    COLOR_BINDING, COLOR_SAMPLER_BINDING, DEPTH_BINDING, ProgramLayout, UNIFORM_BLOCK_BINDING,
};
use super::{
    COLOR_TEXTURE, DEPTH_TEXTURE, DeviceInit, DrawCommand, Framebuffer, FramebufferId,
    GraphicsDevice, PassState, PixelDatatype, PixelFormat, ProgramHandle, RenderState, Sampler,
    TextureFilter, TextureHandle, TextureInfo, TextureWrap, UniformLayout, UniformMap,
};

// ── registry entries ──────────────────────────────────────────────────────

struct ProgramEntry {
    layout: ProgramLayout,
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: Option<wgpu::Buffer>,
    /// One pipeline per target format the program has drawn into.
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

struct TextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sampler: Sampler,
}

impl TextureEntry {
    fn size(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

// ── device ────────────────────────────────────────────────────────────────

/// [`GraphicsDevice`] backed by wgpu.
///
/// Owns the wgpu device/queue and registries mapping crate handles to wgpu
/// objects. Every draw and clear is recorded into its own encoder and submitted
/// right away.
pub struct WgpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    float32_filterable: bool,

    next_id: u64,
    programs: HashMap<ProgramHandle, ProgramEntry>,
    textures: HashMap<TextureHandle, TextureEntry>,
    framebuffers: HashMap<FramebufferId, TextureHandle>,
    samplers: HashMap<Sampler, wgpu::Sampler>,
    render_states: HashMap<Rect, RenderState>,

    /// Bound wherever a texture input has no value (1×1 transparent black).
    fallback: TextureEntry,
}

impl WgpuDevice {
    /// Blocking [`new_headless`](Self::new_headless).
    pub fn headless(init: DeviceInit) -> Result<Self> {
        pollster::block_on(Self::new_headless(init))
    }

    /// Creates a device without a surface.
    pub async fn new_headless(init: DeviceInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let optional = adapter.features() & wgpu::Features::FLOAT32_FILTERABLE;
        let required_features = init.required_features | optional;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prism device"),
                required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("using adapter \"{}\" ({:?})", info.name, info.backend);

        let fallback = allocate_texture(
            &device,
            "prism fallback texture",
            Viewport::new(1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        write_rgba8(&queue, &fallback.texture, 1, 1, &[0, 0, 0, 0]);

        Ok(Self {
            adapter,
            device,
            queue,
            float32_filterable: !optional.is_empty(),
            next_id: 0,
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            samplers: HashMap::new(),
            render_states: HashMap::new(),
            fallback,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The wgpu texture behind `handle`, for callers that render into or read
    /// back from it directly.
    pub fn wgpu_texture(&self, handle: TextureHandle) -> Option<&wgpu::Texture> {
        self.textures.get(&handle).map(|t| &t.texture)
    }

    /// Number of live textures, framebuffer attachments included.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    fn next_raw(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, program: ProgramHandle, format: wgpu::TextureFormat) -> Result<()> {
        let entry = self
            .programs
            .get_mut(&program)
            .with_context(|| format!("unknown program {program:?}"))?;
        if entry.pipelines.contains_key(&format) {
            return Ok(());
        }

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prism post stage pipeline"),
            layout: Some(&entry.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &entry.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &entry.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline for {program:?} targeting {format:?}");
        entry.pipelines.insert(format, pipeline);
        Ok(())
    }

    fn ensure_sampler(&mut self, desc: Sampler) {
        let device = &self.device;
        self.samplers
            .entry(desc)
            .or_insert_with(|| create_native_sampler(device, desc));
    }

    fn sampler_of(&self, texture: Option<TextureHandle>) -> Sampler {
        texture
            .and_then(|h| self.textures.get(&h))
            .map(|t| t.sampler)
            .unwrap_or_default()
    }

    fn view_of(&self, texture: Option<TextureHandle>) -> &wgpu::TextureView {
        texture
            .and_then(|h| self.textures.get(&h))
            .map_or(&self.fallback.view, |t| &t.view)
    }

    fn register_texture(&mut self, entry: TextureEntry) -> TextureInfo {
        let handle = TextureHandle::from_raw(self.next_raw());
        let info = TextureInfo {
            handle,
            width: entry.width,
            height: entry.height,
        };
        self.textures.insert(handle, entry);
        info
    }

    fn target_of(&self, framebuffer: FramebufferId) -> Result<(TextureHandle, &TextureEntry)> {
        let color = *self
            .framebuffers
            .get(&framebuffer)
            .with_context(|| format!("unknown framebuffer {framebuffer:?}"))?;
        let entry = self
            .textures
            .get(&color)
            .with_context(|| format!("framebuffer {framebuffer:?} lost its color attachment"))?;
        Ok((color, entry))
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_viewport_quad_program(
        &mut self,
        fragment_source: &str,
        layout: &UniformLayout,
    ) -> Result<ProgramHandle> {
        anyhow::ensure!(
            fragment_source.contains("fs_main"),
            "fragment shader must define `fs_main`"
        );
        let plan = ProgramLayout::new(layout).context("invalid uniform layout")?;

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism post stage shader"),
            source: wgpu::ShaderSource::Wgsl(plan.source(fragment_source).into()),
        });

        let mut entries = vec![
            texture_layout_entry(COLOR_BINDING),
            sampler_layout_entry(COLOR_SAMPLER_BINDING),
            texture_layout_entry(DEPTH_BINDING),
        ];
        if plan.has_block() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BLOCK_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(plan.block_size()),
                },
                count: None,
            });
        }
        for (_, binding) in plan.textures() {
            entries.push(texture_layout_entry(binding));
            entries.push(sampler_layout_entry(binding + 1));
        }

        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism post stage bgl"),
            entries: &entries,
        });

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism post stage pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let uniform_buffer = plan.has_block().then(|| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("prism post stage ubo"),
                size: plan.block_size(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let handle = ProgramHandle::from_raw(self.next_raw());
        self.programs.insert(
            handle,
            ProgramEntry {
                layout: plan,
                module,
                bind_group_layout,
                pipeline_layout,
                uniform_buffer,
                pipelines: HashMap::new(),
            },
        );
        log::debug!("compiled {handle:?} with {} uniform(s)", layout.len());
        Ok(handle)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            log::warn!("destroy of unknown program {program:?}");
        }
    }

    fn create_texture(&mut self, source: &ImageSource) -> Result<TextureInfo> {
        let max = self.device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            source.width() <= max && source.height() <= max,
            "image {}x{} exceeds the device limit of {max}",
            source.width(),
            source.height()
        );

        let entry = allocate_texture(
            &self.device,
            "prism uniform texture",
            Viewport::new(source.width(), source.height()),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        write_rgba8(
            &self.queue,
            &entry.texture,
            source.width(),
            source.height(),
            source.pixels(),
        );
        Ok(self.register_texture(entry))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        match self.textures.remove(&texture) {
            Some(entry) => entry.texture.destroy(),
            None => log::warn!("destroy of unknown texture {texture:?}"),
        }
    }

    fn texture_sampler(&self, texture: TextureHandle) -> Option<Sampler> {
        self.textures.get(&texture).map(|t| t.sampler)
    }

    fn set_texture_sampler(&mut self, texture: TextureHandle, sampler: Sampler) {
        match self.textures.get_mut(&texture) {
            Some(entry) => entry.sampler = sampler,
            None => log::warn!("sampler set on unknown texture {texture:?}"),
        }
    }

    fn render_state_from_cache(&mut self, viewport: Rect) -> RenderState {
        let id = self.render_states.len() as u64 + 1;
        *self
            .render_states
            .entry(viewport)
            .or_insert(RenderState { id, viewport })
    }

    fn execute(
        &mut self,
        command: &DrawCommand,
        uniforms: &dyn UniformMap,
        pass: Option<&PassState>,
    ) -> Result<()> {
        let framebuffer = command
            .framebuffer
            .context("draw command has no framebuffer")?;
        let (target, target_entry) = self.target_of(framebuffer)?;
        let (target_format, target_size) = (target_entry.format, target_entry.size());

        let color = uniforms.value(COLOR_TEXTURE).and_then(|v| v.as_texture());
        let depth = uniforms.value(DEPTH_TEXTURE).and_then(|v| v.as_texture());
        anyhow::ensure!(
            color != Some(target) && depth != Some(target),
            "stage reads from the framebuffer it renders into"
        );

        let viewport = match command.render_state {
            Some(state) => state.viewport.clamped_to(target_size),
            None => Some(Rect::from_viewport(target_size)),
        };
        let scissor = match pass {
            Some(pass) => pass.scissor.clamped_to(target_size),
            None => viewport,
        };
        let (Some(viewport), Some(scissor)) = (viewport, scissor) else {
            log::debug!("{:?} covers no pixels of its target; skipped", command.program);
            return Ok(());
        };

        self.ensure_pipeline(command.program, target_format)?;

        let program = self
            .programs
            .get(&command.program)
            .with_context(|| format!("unknown program {:?}", command.program))?;
        let textures: Vec<(u32, Option<TextureHandle>)> = program
            .layout
            .textures()
            .map(|(name, binding)| (binding, uniforms.value(name).and_then(|v| v.as_texture())))
            .collect();
        if let Some(buffer) = &program.uniform_buffer {
            let slots = program.layout.pack(uniforms);
            self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&slots));
        }

        let color_sampler = self.sampler_of(color);
        self.ensure_sampler(color_sampler);
        for (_, texture) in &textures {
            let desc = self.sampler_of(*texture);
            self.ensure_sampler(desc);
        }

        // ── immutable borrows ──────────────────────────────────────────────
        let program = self
            .programs
            .get(&command.program)
            .with_context(|| format!("unknown program {:?}", command.program))?;
        let pipeline = program
            .pipelines
            .get(&target_format)
            .context("pipeline cache miss")?;
        let native_sampler = |desc: Sampler| self.samplers.get(&desc).context("sampler cache miss");

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: COLOR_BINDING,
                resource: wgpu::BindingResource::TextureView(self.view_of(color)),
            },
            wgpu::BindGroupEntry {
                binding: COLOR_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(native_sampler(color_sampler)?),
            },
            wgpu::BindGroupEntry {
                binding: DEPTH_BINDING,
                resource: wgpu::BindingResource::TextureView(self.view_of(depth)),
            },
        ];
        if let Some(buffer) = &program.uniform_buffer {
            entries.push(wgpu::BindGroupEntry {
                binding: UNIFORM_BLOCK_BINDING,
                resource: buffer.as_entire_binding(),
            });
        }
        for (binding, texture) in &textures {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(self.view_of(*texture)),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(native_sampler(self.sampler_of(*texture))?),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism post stage bind group"),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        let target_view = &self.target_of(framebuffer)?.1.view;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism post stage encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism post stage pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &bind_group, &[]);
            rpass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            rpass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
            rpass.draw(0..3, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn create_framebuffer(
        &mut self,
        size: Viewport,
        format: PixelFormat,
        datatype: PixelDatatype,
    ) -> Result<Framebuffer> {
        anyhow::ensure!(size.is_valid(), "framebuffer has zero size ({}x{})", size.width, size.height);
        let max = self.device.limits().max_texture_dimension_2d;
        anyhow::ensure!(
            size.width <= max && size.height <= max,
            "framebuffer {}x{} exceeds the device limit of {max}",
            size.width,
            size.height
        );

        let native = target_format(format, datatype, self.float32_filterable);
        let entry = allocate_texture(
            &self.device,
            "prism stage target",
            size,
            native,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        let color = self.register_texture(entry);
        let id = FramebufferId::from_raw(self.next_raw());
        self.framebuffers.insert(id, color.handle);

        log::debug!("allocated {id:?} {}x{} {native:?}", size.width, size.height);
        Ok(Framebuffer::new(id, color))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        match self.framebuffers.remove(&framebuffer) {
            Some(color) => self.destroy_texture(color),
            None => log::warn!("destroy of unknown framebuffer {framebuffer:?}"),
        }
    }

    fn clear_framebuffer(&mut self, framebuffer: FramebufferId, color: ColorRgba) -> Result<()> {
        let view = &self.target_of(framebuffer)?.1.view;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism clear encoder"),
            });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

// ── wgpu helpers ──────────────────────────────────────────────────────────

fn allocate_texture(
    device: &wgpu::Device,
    label: &str,
    size: Viewport,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> TextureEntry {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    TextureEntry {
        texture,
        view,
        format,
        width: size.width,
        height: size.height,
        sampler: Sampler::default(),
    }
}

fn write_rgba8(queue: &wgpu::Queue, texture: &wgpu::Texture, width: u32, height: u32, pixels: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn texture_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_native_sampler(device: &wgpu::Device, desc: Sampler) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("prism sampler"),
        address_mode_u: address_mode(desc.wrap_s),
        address_mode_v: address_mode(desc.wrap_t),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(desc.mag_filter),
        min_filter: filter_mode(desc.min_filter),
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

fn address_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

/// Native format of a stage target.
///
/// wgpu has no three-channel formats, so `Rgb` targets carry an unused alpha.
/// 32-bit float targets need `FLOAT32_FILTERABLE`; without it they drop to 16 bits.
fn target_format(format: PixelFormat, datatype: PixelDatatype, float32_filterable: bool) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as F;

    let datatype = match datatype {
        PixelDatatype::Float if !float32_filterable => PixelDatatype::HalfFloat,
        other => other,
    };

    match (format, datatype) {
        (PixelFormat::Rgba | PixelFormat::Rgb, PixelDatatype::UnsignedByte) => F::Rgba8Unorm,
        (PixelFormat::Rgba | PixelFormat::Rgb, PixelDatatype::HalfFloat) => F::Rgba16Float,
        (PixelFormat::Rgba | PixelFormat::Rgb, PixelDatatype::Float) => F::Rgba32Float,
        (PixelFormat::LuminanceAlpha, PixelDatatype::UnsignedByte) => F::Rg8Unorm,
        (PixelFormat::LuminanceAlpha, PixelDatatype::HalfFloat) => F::Rg16Float,
        (PixelFormat::LuminanceAlpha, PixelDatatype::Float) => F::Rg32Float,
        (PixelFormat::Luminance, PixelDatatype::UnsignedByte) => F::R8Unorm,
        (PixelFormat::Luminance, PixelDatatype::HalfFloat) => F::R16Float,
        (PixelFormat::Luminance, PixelDatatype::Float) => F::R32Float,
    }
}

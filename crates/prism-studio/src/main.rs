use std::time::Instant;

use anyhow::{Context, Result};
use prism_engine::chain::StageChain;
use prism_engine::coords::{ColorRgba, Viewport};
use prism_engine::device::{DeviceInit, GraphicsDevice, UniformValue, WgpuDevice};
use prism_engine::imaging::ImageSource;
use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::stage::{PostStage, SampleMode, UniformInput};

const VIEWPORT: Viewport = Viewport::new(640, 360);
const FRAMES: usize = 4;

const GRADE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSample(color_texture, color_sampler, in.uv);
    return vec4<f32>(c.rgb * u.tint.rgb * u.exposure, 1.0);
}
"#;

const BRIGHT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSample(color_texture, color_sampler, in.uv);
    let luma = dot(c.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    return select(vec4<f32>(0.0, 0.0, 0.0, 1.0), c, luma > u.threshold);
}
"#;

const COMPOSITE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let graded = textureSample(base, base_sampler, in.uv);
    let glow = textureSample(color_texture, color_sampler, in.uv);
    let over = textureSample(overlay, overlay_sampler, in.uv);
    let lit = graded.rgb + glow.rgb * u.strength;
    return vec4<f32>(mix(lit, over.rgb, over.a), 1.0);
}
"#;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // Optional image composited over the result: `prism-studio [overlay.png]`.
    let overlay = match std::env::args().nth(1) {
        Some(path) => UniformInput::url(path),
        None => UniformInput::from(ImageSource::solid(1, 1, [0, 0, 0, 0])?),
    };

    let mut device = WgpuDevice::headless(DeviceInit::default())?;
    let info = device.adapter_info();
    println!();
    println!("  prism studio  ·  {} ({:?})", info.name, info.backend);
    println!("  {}x{} headless, {FRAMES} frames", VIEWPORT.width, VIEWPORT.height);
    println!();

    let scene = device
        .create_texture(&gradient(VIEWPORT)?)
        .context("failed to upload scene")?;

    let started = Instant::now();
    let mut chain = StageChain::new();
    chain.add(
        PostStage::builder(GRADE)
            .name("grade")
            .uniform("tint", ColorRgba::new(1.0, 0.9, 0.8, 1.0))
            .uniform(
                "exposure",
                UniformInput::callback(move || {
                    UniformValue::Float(1.0 + 0.25 * started.elapsed().as_secs_f32().sin())
                }),
            )
            .build()?,
    )?;
    chain.add(
        PostStage::builder(BRIGHT)
            .name("bright")
            .texture_scale(0.5)
            .sample_mode(SampleMode::Linear)
            .uniform("threshold", 0.6_f32)
            .build()?,
    )?;
    chain.add(
        PostStage::builder(COMPOSITE)
            .name("composite")
            .clear_color(ColorRgba::TRANSPARENT)
            .uniform("base", UniformInput::stage("grade"))
            .uniform("strength", 0.8_f32)
            .uniform("overlay", overlay)
            .build()?,
    )?;

    for frame in 0..FRAMES {
        chain.update(&mut device, VIEWPORT)?;
        let output = chain.execute(&mut device, scene, None)?;
        log::info!(
            "frame {frame}: ready={} output={:?} {}x{}",
            chain.ready(),
            output.handle,
            output.width,
            output.height
        );
    }

    if let Some(stage) = chain.stage_mut("bright") {
        stage.set_uniform("threshold", 0.9_f32);
    }
    chain.update(&mut device, VIEWPORT)?;
    chain.execute(&mut device, scene, None)?;

    log::info!(
        "live before teardown: {} textures, {} programs",
        device.texture_count(),
        device.program_count()
    );
    chain.destroy(&mut device);
    device.destroy_texture(scene.handle);
    log::info!(
        "live after teardown: {} textures, {} programs",
        device.texture_count(),
        device.program_count()
    );

    Ok(())
}

/// Diagonal RGB gradient standing in for a rendered scene.
fn gradient(size: Viewport) -> Result<ImageSource> {
    let mut pixels = Vec::with_capacity(size.width as usize * size.height as usize * 4);
    for y in 0..size.height {
        for x in 0..size.width {
            let u = x as f32 / size.width as f32;
            let v = y as f32 / size.height as f32;
            pixels.extend_from_slice(&[
                (u * 255.0) as u8,
                (v * 255.0) as u8,
                ((1.0 - u * v) * 255.0) as u8,
                255,
            ]);
        }
    }
    ImageSource::from_rgba8(size.width, size.height, pixels)
}

use crate::coords::ColorRgba;
use crate::device::{COLOR_TEXTURE, UniformValue};
use crate::stage::UniformInput;
use crate::testing::{FRAGMENT, MockDevice};

use super::*;

const VIEWPORT: Viewport = Viewport::new(100, 60);

fn stage(name: &str) -> PostStage {
    PostStage::builder(FRAGMENT).name(name).build().unwrap()
}

fn output(chain: &StageChain, name: &str) -> TextureInfo {
    chain.collection().output_texture(name).unwrap()
}

// ── membership ────────────────────────────────────────────────────────────

#[test]
fn duplicate_names_are_rejected() {
    let mut chain = StageChain::new();
    chain.add(stage("blur")).unwrap();
    assert!(chain.add(stage("blur")).is_err());
    assert_eq!(chain.len(), 1);
}

#[test]
fn remove_destroys_stage_and_target() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("blur")).unwrap();
    chain.update(&mut device, VIEWPORT).unwrap();
    let target = chain.collection().framebuffer("blur").unwrap();

    assert!(chain.remove(&mut device, "blur"));
    assert!(!chain.remove(&mut device, "blur"));
    assert!(chain.is_empty());
    assert!(!device.framebuffers.contains_key(&target.id));
    assert!(device.programs.is_empty());
    assert!(!chain.collection().contains_stage("blur"));
}

// ── targets ───────────────────────────────────────────────────────────────

#[test]
fn targets_follow_scale_and_power_of_two() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain
        .add(PostStage::builder(FRAGMENT).name("half").texture_scale(0.5).build().unwrap())
        .unwrap();
    chain
        .add(PostStage::builder(FRAGMENT).name("pow2").force_power_of_two(true).build().unwrap())
        .unwrap();

    chain.update(&mut device, VIEWPORT).unwrap();

    assert_eq!(output(&chain, "half").size(), Viewport::new(50, 30));
    assert_eq!(output(&chain, "pow2").size(), Viewport::new(128, 128));
}

#[test]
fn viewport_change_reallocates_targets() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("blur")).unwrap();

    chain.update(&mut device, VIEWPORT).unwrap();
    let first = chain.collection().framebuffer("blur").unwrap();
    chain.update(&mut device, VIEWPORT).unwrap();
    assert_eq!(chain.collection().framebuffer("blur"), Some(first.clone()));

    chain.update(&mut device, Viewport::new(200, 120)).unwrap();
    let second = chain.collection().framebuffer("blur").unwrap();
    assert_ne!(second.id, first.id);
    assert!(!device.framebuffers.contains_key(&first.id));
    assert_eq!(
        chain.stage("blur").unwrap().render_state().unwrap().viewport.size(),
        Viewport::new(200, 120)
    );
}

#[test]
fn zero_viewport_is_rejected() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("blur")).unwrap();
    assert!(chain.update(&mut device, Viewport::new(0, 10)).is_err());
}

// ── execution ─────────────────────────────────────────────────────────────

#[test]
fn each_stage_reads_the_previous_output() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain
        .add(PostStage::builder(FRAGMENT).name("a").clear_color(ColorRgba::WHITE).build().unwrap())
        .unwrap();
    chain.add(stage("b")).unwrap();
    chain.update(&mut device, VIEWPORT).unwrap();

    let scene = device.supplied_texture(VIEWPORT.width, VIEWPORT.height);
    let result = chain.execute(&mut device, scene, None).unwrap();

    let a_out = output(&chain, "a");
    let b_out = output(&chain, "b");
    assert_eq!(result, b_out);
    assert_eq!(device.executions.len(), 2);
    assert_eq!(device.executions[0].uniforms[COLOR_TEXTURE], Some(UniformValue::Texture(scene.handle)));
    assert_eq!(device.executions[1].uniforms[COLOR_TEXTURE], Some(UniformValue::Texture(a_out.handle)));

    let a_fb = chain.collection().framebuffer("a").unwrap().id;
    assert_eq!(device.clears[0], (a_fb, ColorRgba::WHITE));
    assert_eq!(device.clears[1].1, ColorRgba::BLACK);
}

#[test]
fn disabled_stage_passes_input_through() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("a")).unwrap();
    chain.add(stage("b")).unwrap();
    chain.update(&mut device, VIEWPORT).unwrap();
    let b_target = chain.collection().framebuffer("b").unwrap();

    assert!(chain.set_enabled(&mut device, "b", false));
    assert!(!device.framebuffers.contains_key(&b_target.id));

    chain.update(&mut device, VIEWPORT).unwrap();
    let scene = device.supplied_texture(VIEWPORT.width, VIEWPORT.height);
    let result = chain.execute(&mut device, scene, None).unwrap();
    assert_eq!(result, output(&chain, "a"));
    assert_eq!(device.executions.len(), 1);

    chain.set_enabled(&mut device, "b", true);
    chain.update(&mut device, VIEWPORT).unwrap();
    let result = chain.execute(&mut device, scene, None).unwrap();
    assert_eq!(result, output(&chain, "b"));
}

#[test]
fn stage_uniform_reads_another_member() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("bright")).unwrap();
    chain
        .add(
            PostStage::builder(FRAGMENT)
                .name("composite")
                .uniform("bloom", UniformInput::stage("bright"))
                .build()
                .unwrap(),
        )
        .unwrap();

    chain.update(&mut device, VIEWPORT).unwrap();
    assert!(chain.ready());

    let scene = device.supplied_texture(VIEWPORT.width, VIEWPORT.height);
    chain.execute(&mut device, scene, None).unwrap();

    let bright = output(&chain, "bright");
    let exec = device.last_execution().unwrap();
    assert_eq!(exec.uniforms["bloom"], Some(UniformValue::Texture(bright.handle)));
}

#[test]
fn destroy_releases_everything() {
    let mut device = MockDevice::new();
    let mut chain = StageChain::new();
    chain.add(stage("a")).unwrap();
    chain.add(stage("b")).unwrap();
    chain.update(&mut device, VIEWPORT).unwrap();

    chain.destroy(&mut device);
    assert!(chain.is_empty());
    assert!(device.framebuffers.is_empty());
    assert!(device.programs.is_empty());
}

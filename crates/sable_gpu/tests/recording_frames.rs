//! Compositor output batched through the recording device

use sable_core::{Color, Point, Rect};
use sable_gpu::{
    BlendMode, Batcher, Camera, DrawBuffer, Line, Quad, RecordingDevice, RenderDevice,
    BASIC_SHADER_NAME, NO_TEXTURE,
};
use sable_paint::PixelBuffer;

const TINT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(2) color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color * vec4<f32>(1.0, 0.5, 0.5, 1.0);
}
"#;

#[test]
fn blend_change_splits_a_frame_into_two_batches() {
    let mut device = RecordingDevice::new(128, 128);
    let log = device.log();

    let mut canvas = PixelBuffer::new(16, 16);
    canvas.fill_rect(Color::RED, Rect::new(0.0, 0.0, 8.0, 8.0));
    let texture = device.upload(&canvas);

    let mut batcher = Batcher::new(DrawBuffer::with_defaults());
    device.begin_frame(0, Color::BLACK);
    batcher.start_frame(Camera::default());
    batcher.draw_quad(&Quad::textured(Rect::new(0.0, 0.0, 16.0, 16.0), texture), &mut device);
    batcher.draw_quad(&Quad::textured(Rect::new(16.0, 0.0, 16.0, 16.0), texture), &mut device);
    batcher.draw_quad(
        &Quad::textured(Rect::new(32.0, 0.0, 16.0, 16.0), texture).with_blend(BlendMode::Light),
        &mut device,
    );
    batcher.finish_frame(&mut device);
    device.end_frame();

    let frames = log.frames();
    assert_eq!(frames.len(), 1);
    let batches = &frames[0].batches;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].vertices.len(), 12);
    assert_eq!(batches[0].blend, BlendMode::Normal);
    assert_eq!(batches[0].textures, vec![texture]);
    assert_eq!(batches[1].vertices.len(), 6);
    assert_eq!(batches[1].blend, BlendMode::Light);
    assert!(batches
        .iter()
        .flat_map(|b| b.vertices.iter())
        .all(|v| v.texture == 0));
}

#[test]
fn registered_shader_batches_separately() {
    let mut device = RecordingDevice::new(64, 64);
    let log = device.log();
    let tint = device.register_shader("tint", TINT_SHADER).unwrap();
    assert_ne!(tint, device.shaders().lookup(BASIC_SHADER_NAME));

    let mut batcher = Batcher::default();
    device.begin_frame(2, Color::WHITE);
    batcher.start_frame(Camera::default());
    batcher.draw_quad(&Quad::solid(Rect::new(0.0, 0.0, 8.0, 8.0), Color::BLUE), &mut device);
    batcher.draw_line(
        &Line::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0), Color::GREEN).with_shader(tint),
        &mut device,
    );
    batcher.finish_frame(&mut device);
    device.end_frame();

    let batches = &log.frames()[0].batches;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1].shader, tint);
    assert!(batches[1].textures.is_empty());
    assert!(batches[1].vertices.iter().all(|v| v.texture == NO_TEXTURE));
}

#[test]
fn unknown_shader_name_falls_back_to_basic() {
    let device = RecordingDevice::new(8, 8);
    let shaders = device.shaders();
    assert_eq!(shaders.lookup("missing"), shaders.lookup(BASIC_SHADER_NAME));
}

//! WGSL shaders
//!
//! - [`BASIC_SHADER`]: textured or solid quads from the vertex batches
//! - [`PRESENT_SHADER`]: full-screen triangle copying an off-screen target to the window
//!
//! Custom shaders registered at runtime must declare the same `VertexInput`
//! layout and bind groups as [`BASIC_SHADER`]; the parameter vectors `p0..p7`
//! are theirs to interpret.

/// Batch shader with 8 texture slots
pub const BASIC_SHADER: &str = r#"
struct Globals {
    viewport: vec2<f32>,
    _padding: vec2<f32>,
};

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) slot: i32,
    @location(4) p0: vec4<f32>,
    @location(5) p1: vec4<f32>,
    @location(6) p2: vec4<f32>,
    @location(7) p3: vec4<f32>,
    @location(8) p4: vec4<f32>,
    @location(9) p5: vec4<f32>,
    @location(10) p6: vec4<f32>,
    @location(11) p7: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) @interpolate(flat) slot: i32,
};

@group(0) @binding(0) var<uniform> globals: Globals;

@group(1) @binding(0) var t0: texture_2d<f32>;
@group(1) @binding(1) var t1: texture_2d<f32>;
@group(1) @binding(2) var t2: texture_2d<f32>;
@group(1) @binding(3) var t3: texture_2d<f32>;
@group(1) @binding(4) var t4: texture_2d<f32>;
@group(1) @binding(5) var t5: texture_2d<f32>;
@group(1) @binding(6) var t6: texture_2d<f32>;
@group(1) @binding(7) var t7: texture_2d<f32>;
@group(1) @binding(8) var slot_sampler: sampler;

fn sample_slot(slot: i32, uv: vec2<f32>) -> vec4<f32> {
    var texel = vec4<f32>(1.0, 1.0, 1.0, 1.0);
    switch slot {
        case 0: { texel = textureSampleLevel(t0, slot_sampler, uv, 0.0); }
        case 1: { texel = textureSampleLevel(t1, slot_sampler, uv, 0.0); }
        case 2: { texel = textureSampleLevel(t2, slot_sampler, uv, 0.0); }
        case 3: { texel = textureSampleLevel(t3, slot_sampler, uv, 0.0); }
        case 4: { texel = textureSampleLevel(t4, slot_sampler, uv, 0.0); }
        case 5: { texel = textureSampleLevel(t5, slot_sampler, uv, 0.0); }
        case 6: { texel = textureSampleLevel(t6, slot_sampler, uv, 0.0); }
        case 7: { texel = textureSampleLevel(t7, slot_sampler, uv, 0.0); }
        default: {}
    }
    return texel;
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let ndc = vec2<f32>(
        in.position.x / globals.viewport.x * 2.0 - 1.0,
        1.0 - in.position.y / globals.viewport.y * 2.0,
    );
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.tex_coord = in.tex_coord;
    out.color = in.color;
    out.slot = in.slot;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if in.slot < 0 {
        return in.color;
    }
    let texel = sample_slot(in.slot, in.tex_coord);
    return vec4<f32>(texel.rgb * in.color.rgb, texel.a * in.color.a);
}
"#;

/// Samples one swap target across the whole surface
pub const PRESENT_SHADER: &str = r#"
@group(0) @binding(0) var frame_texture: texture_2d<f32>;
@group(0) @binding(1) var frame_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(frame_texture, frame_sampler, in.uv);
}
"#;

//! Quad and line emission
//!
//! [`Batcher`] turns [`Quad`] and [`Line`] requests into camera-transformed
//! vertices in a [`DrawBuffer`], flushing to a [`DrawSink`] whenever the
//! request needs state the buffer can't share.

use sable_core::{Color, Point, Rect, Vec2};

use crate::batch::DrawBuffer;
use crate::blend::BlendMode;
use crate::camera::Camera;
use crate::device::{DrawSink, TextureHandle};
use crate::shader::ShaderId;
use crate::vertex::{ShaderParams, Vertex, NO_PARAMS, NO_TEXTURE, VERTICES_PER_QUAD};

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// A textured or solid rectangle
#[derive(Clone, Debug)]
pub struct Quad {
    pub frame: Rect,
    pub texture: Option<TextureHandle>,
    /// Source rect in normalized texture coordinates
    pub uv: Rect,
    pub blend: BlendMode,
    pub alpha: f32,
    /// Fill color for solid quads, multiplier for textured ones
    pub tint: Color,
    /// `None` draws with the basic shader
    pub shader: Option<ShaderId>,
    pub params: ShaderParams,
}

impl Quad {
    pub fn textured(frame: Rect, texture: TextureHandle) -> Self {
        Self {
            frame,
            texture: Some(texture),
            uv: Rect::UNIT,
            blend: BlendMode::Normal,
            alpha: 1.0,
            tint: Color::WHITE,
            shader: None,
            params: NO_PARAMS,
        }
    }

    pub fn solid(frame: Rect, color: Color) -> Self {
        Self {
            frame,
            texture: None,
            uv: Rect::UNIT,
            blend: BlendMode::Normal,
            alpha: 1.0,
            tint: color,
            shader: None,
            params: NO_PARAMS,
        }
    }

    pub fn with_uv(mut self, uv: Rect) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_params(mut self, params: ShaderParams) -> Self {
        self.params = params;
        self
    }

    fn vertex_color(&self) -> [f32; 4] {
        let mut color = self.tint.to_f32_array();
        color[3] *= self.alpha.clamp(0.0, 1.0);
        color
    }
}

/// A solid segment of a given thickness
#[derive(Clone, Debug)]
pub struct Line {
    pub from: Point,
    pub to: Point,
    pub color: Color,
    pub weight: f32,
    pub blend: BlendMode,
    pub shader: Option<ShaderId>,
    pub params: ShaderParams,
}

impl Line {
    pub fn new(from: Point, to: Point, color: Color) -> Self {
        Self {
            from,
            to,
            color,
            weight: 1.0,
            blend: BlendMode::Normal,
            shader: None,
            params: NO_PARAMS,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_params(mut self, params: ShaderParams) -> Self {
        self.params = params;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Batcher
// ─────────────────────────────────────────────────────────────────────────────

/// Front end of the batching layer
pub struct Batcher {
    buffer: DrawBuffer,
    camera: Camera,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DrawBuffer::with_defaults())
    }
}

impl Batcher {
    pub fn new(buffer: DrawBuffer) -> Self {
        Self {
            buffer,
            camera: Camera::default(),
        }
    }

    pub fn buffer(&self) -> &DrawBuffer {
        &self.buffer
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Reset the buffer for a new frame
    pub fn start_frame(&mut self, camera: Camera) {
        self.buffer.reset();
        self.camera = camera;
    }

    pub fn flush(&mut self, sink: &mut dyn DrawSink) -> bool {
        self.buffer.flush(sink)
    }

    /// Submit whatever the frame left in the buffer
    pub fn finish_frame(&mut self, sink: &mut dyn DrawSink) {
        self.buffer.flush(sink);
    }

    /// Make room for one quad with the given state; returns the texture slot
    fn prepare(
        &mut self,
        blend: BlendMode,
        shader: ShaderId,
        texture: Option<TextureHandle>,
        sink: &mut dyn DrawSink,
    ) -> i32 {
        let texture_full = texture.is_some_and(|t| !self.buffer.can_accept_texture(t));
        if texture_full || self.buffer.remaining() < VERTICES_PER_QUAD {
            self.buffer.flush(sink);
        }
        // Flushing resets the blend mode, so it is applied last
        self.buffer.set_shader(shader, sink);
        self.buffer.set_blend(blend, sink);
        texture
            .and_then(|t| self.buffer.push_texture(t))
            .unwrap_or(NO_TEXTURE)
    }

    /// Emit two triangles for `quad`
    ///
    /// Zero-area or non-finite frames are skipped. Returns true if vertices
    /// were emitted.
    pub fn draw_quad(&mut self, quad: &Quad, sink: &mut dyn DrawSink) -> bool {
        if quad.frame.is_empty() {
            return false;
        }
        let slot = self.prepare(
            quad.blend,
            quad.shader.unwrap_or(ShaderId::BASIC),
            quad.texture,
            sink,
        );

        let p = self.camera.transform(quad.frame.origin);
        let s = self.camera.transform_size(Vec2::from(quad.frame.size));
        let (u, v, w, h) = (quad.uv.x(), quad.uv.y(), quad.uv.width(), quad.uv.height());
        let color = quad.vertex_color();

        let corners = [
            (Point::new(p.x, p.y + s.y), [u, v + h]),
            (Point::new(p.x + s.x, p.y + s.y), [u + w, v + h]),
            (Point::new(p.x + s.x, p.y), [u + w, v]),
            (Point::new(p.x, p.y + s.y), [u, v + h]),
            (Point::new(p.x, p.y), [u, v]),
            (Point::new(p.x + s.x, p.y), [u + w, v]),
        ];
        for (position, uv) in corners {
            self.buffer
                .push_vertex(Vertex::textured(position, uv, color, slot, &quad.params));
        }

        if self.buffer.is_full() {
            self.buffer.flush(sink);
        }
        true
    }

    /// Emit a solid quad `weight` wide along `line`
    ///
    /// Zero-length lines and non-positive weights are skipped.
    pub fn draw_line(&mut self, line: &Line, sink: &mut dyn DrawSink) -> bool {
        if line.weight <= 0.0 || !line.weight.is_finite() {
            return false;
        }
        let start = self.camera.transform(line.from);
        let end = self.camera.transform(line.to);
        if !start.is_finite() || !end.is_finite() {
            return false;
        }
        let dir = end.to_vec2() - start.to_vec2();
        if dir.length() == 0.0 {
            return false;
        }

        self.prepare(
            line.blend,
            line.shader.unwrap_or(ShaderId::BASIC),
            None,
            sink,
        );

        let half = line.weight * 0.5;
        let n0 = Vec2::new(-dir.y, dir.x).normalize() * half;
        let n1 = Vec2::new(dir.y, -dir.x).normalize() * half;
        let offset = |p: Point, n: Vec2| Point::new(p.x + n.x, p.y + n.y);

        let corners = [
            (offset(start, n0), [1.0, 0.0]),
            (offset(start, n1), [0.0, 0.0]),
            (offset(end, n1), [0.0, 1.0]),
            (offset(end, n1), [0.0, 1.0]),
            (offset(end, n0), [1.0, 1.0]),
            (offset(start, n0), [1.0, 0.0]),
        ];
        for (position, uv) in corners {
            self.buffer
                .push_vertex(Vertex::solid(position, uv, line.color, &line.params));
        }

        if self.buffer.is_full() {
            self.buffer.flush(sink);
        }
        true
    }
}

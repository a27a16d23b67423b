//! Bounded vertex buffer with flush-on-state-change
//!
//! A [`DrawBuffer`] accumulates vertices that share one blend mode, one
//! shader and up to [`MAX_TEXTURE_SLOTS`] bound textures. Whenever that
//! shared state has to change, the buffered vertices are submitted first as
//! a single [`Batch`], so every batch is exactly one draw call.

use smallvec::SmallVec;

use sable_core::{Color, Point};

use crate::blend::BlendMode;
use crate::device::{Batch, DrawSink, TextureHandle};
use crate::shader::ShaderId;
use crate::vertex::{ShaderParams, Vertex, VERTICES_PER_QUAD};

/// Texture bindings available to the batch shader
pub const MAX_TEXTURE_SLOTS: usize = 8;

pub const DEFAULT_MAX_VERTICES: usize = 60_000;

pub struct DrawBuffer {
    vertices: Vec<Vertex>,
    max_vertices: usize,
    textures: SmallVec<[TextureHandle; MAX_TEXTURE_SLOTS]>,
    texture_slots: usize,
    blend: BlendMode,
    shader: ShaderId,
}

impl Default for DrawBuffer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DrawBuffer {
    /// `max_vertices` is rounded down to whole quads; `texture_slots` is
    /// clamped to `1..=MAX_TEXTURE_SLOTS`
    pub fn new(max_vertices: usize, texture_slots: usize) -> Self {
        let max_vertices =
            (max_vertices / VERTICES_PER_QUAD * VERTICES_PER_QUAD).max(VERTICES_PER_QUAD);
        Self {
            vertices: Vec::with_capacity(max_vertices),
            max_vertices,
            textures: SmallVec::new(),
            texture_slots: texture_slots.clamp(1, MAX_TEXTURE_SLOTS),
            blend: BlendMode::Normal,
            shader: ShaderId::BASIC,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_VERTICES, MAX_TEXTURE_SLOTS)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vertices
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a vertex; returns false (and drops it) when the buffer is full
    pub fn push_vertex(&mut self, vertex: Vertex) -> bool {
        if self.is_full() {
            tracing::warn!(
                "DrawBuffer full ({} vertices), dropping vertex",
                self.max_vertices
            );
            return false;
        }
        self.vertices.push(vertex);
        true
    }

    /// Append an untextured vertex filled with `color`
    pub fn push_solid_vertex(&mut self, position: Point, color: Color, params: &ShaderParams) -> bool {
        self.push_vertex(Vertex::solid(position, [0.0, 0.0], color, params))
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.vertices.len() >= self.max_vertices
    }

    /// Vertices that still fit before a flush is needed
    pub fn remaining(&self) -> usize {
        self.max_vertices - self.vertices.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_vertices
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Textures
    // ─────────────────────────────────────────────────────────────────────────

    /// Slot of `texture`, binding it to the next free slot if needed
    ///
    /// Returns `None` when every slot is taken by other textures.
    pub fn push_texture(&mut self, texture: TextureHandle) -> Option<i32> {
        if let Some(slot) = self.slot_of(texture) {
            return Some(slot);
        }
        if self.textures.len() >= self.texture_slots {
            return None;
        }
        self.textures.push(texture);
        Some(self.textures.len() as i32 - 1)
    }

    /// True if `texture` is bound already or a slot is free
    pub fn can_accept_texture(&self, texture: TextureHandle) -> bool {
        self.slot_of(texture).is_some() || self.textures.len() < self.texture_slots
    }

    fn slot_of(&self, texture: TextureHandle) -> Option<i32> {
        self.textures
            .iter()
            .position(|t| t.id == texture.id)
            .map(|slot| slot as i32)
    }

    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    pub fn texture_slots(&self) -> usize {
        self.texture_slots
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Switch blend mode, flushing vertices drawn with the previous mode
    pub fn set_blend(&mut self, blend: BlendMode, sink: &mut dyn DrawSink) {
        if blend != self.blend {
            self.flush(sink);
            self.blend = blend;
        }
    }

    /// Switch shader, flushing vertices drawn with the previous shader
    pub fn set_shader(&mut self, shader: ShaderId, sink: &mut dyn DrawSink) {
        if shader != self.shader {
            self.flush(sink);
            self.shader = shader;
        }
    }

    /// Submit buffered vertices as one batch
    ///
    /// Clears vertices and texture slots and resets the blend mode to
    /// [`BlendMode::Normal`]. The shader stays selected. Returns false when
    /// there was nothing to submit.
    pub fn flush(&mut self, sink: &mut dyn DrawSink) -> bool {
        if self.vertices.is_empty() {
            return false;
        }
        tracing::debug!(
            "Flushing {} vertices, {} textures, blend={}",
            self.vertices.len(),
            self.textures.len(),
            self.blend.label()
        );
        sink.submit(&Batch {
            vertices: &self.vertices,
            textures: &self.textures,
            blend: self.blend,
            shader: self.shader,
        });
        self.vertices.clear();
        self.textures.clear();
        self.blend = BlendMode::Normal;
        true
    }

    /// Drop everything and return to the start-of-frame state
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.textures.clear();
        self.blend = BlendMode::Normal;
        self.shader = ShaderId::BASIC;
    }
}

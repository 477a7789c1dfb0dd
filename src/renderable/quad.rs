//! A single textured, colorable quad.

use std::collections::HashMap;

use crate::api::GraphicsApi;
use crate::error::Error;
use crate::renderable::{
    color_layout, describe_bindings, position_layout, release_bindings, texture_layout,
    wrap_channel, Renderable, VertexRecord,
};
use crate::shader::binding::{AttributeBinding, OwnerId, ResolvedBinding};
use crate::texture::{FrameRect, Sprite, Texture};

/// A named sprite animation and the texture it samples from.
struct SpriteSlot<G: GraphicsApi> {
    texture: G::Texture,
    sprite: Sprite,
}

/// Four vertices in triangle-strip order (upper-left, upper-right,
/// lower-left, lower-right) sharing one interleaved buffer.
///
/// The workhorse drawable: a flat-colored rectangle, a textured rectangle,
/// or an animated sprite, depending on what was set last.
pub struct Quad<G: GraphicsApi> {
    id: OwnerId,
    records: [VertexRecord; 4],
    buffer: Option<G::Buffer>,
    texture: Option<G::Texture>,
    sprites: HashMap<String, SpriteSlot<G>>,
    active_sprite: Option<String>,
    animate: bool,
}

impl<G: GraphicsApi> Quad<G> {
    /// A quad with its origin (upper-left corner) at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: OwnerId::next(),
            records: [
                VertexRecord::at(x, y),
                VertexRecord::at(x + width, y),
                VertexRecord::at(x, y + height),
                VertexRecord::at(x + width, y + height),
            ],
            buffer: None,
            texture: None,
            sprites: HashMap::new(),
            active_sprite: None,
            animate: true,
        }
    }

    /// Register a sprite animation under `name`, make it active, and show
    /// its first frame.
    ///
    /// The texture handle should come from the sprite sheet the sprite was
    /// generated from.
    pub fn set_sprite(&mut self, name: &str, texture: G::Texture, sprite: Sprite) {
        self.write_frame(sprite.frame_at(0));
        self.sprites
            .insert(name.to_owned(), SpriteSlot { texture, sprite });
        self.active_sprite = Some(name.to_owned());
    }

    /// Switch to a previously registered sprite. Returns whether `name`
    /// was known.
    pub fn set_active_sprite(&mut self, name: &str) -> bool {
        if self.sprites.contains_key(name) {
            self.active_sprite = Some(name.to_owned());
            true
        } else {
            false
        }
    }

    /// Pause or resume frame advancement for the active sprite.
    pub fn animate_sprite(&mut self, animate: bool) {
        self.animate = animate;
    }

    fn write_frame(&mut self, frame: FrameRect) {
        self.records[0].texture = [frame.x, frame.y];
        self.records[1].texture = [frame.x + frame.width, frame.y];
        self.records[2].texture = [frame.x, frame.y + frame.height];
        self.records[3].texture = [frame.x + frame.width, frame.y + frame.height];
    }

    /// The vertex records, for inspection.
    #[must_use]
    pub fn records(&self) -> &[VertexRecord] {
        &self.records
    }
}

impl<G: GraphicsApi> Renderable<G> for Quad<G> {
    fn id(&self) -> OwnerId {
        self.id
    }

    fn vertex_count(&self) -> i32 {
        4
    }

    fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let color = [
            wrap_channel(r),
            wrap_channel(g),
            wrap_channel(b),
            wrap_channel(a),
        ];
        for record in &mut self.records {
            record.color = color;
        }
    }

    fn set_texture(&mut self, texture: &Texture<G>) {
        self.texture = texture.id();
        self.write_frame(FrameRect::WHOLE);
    }

    fn position_layout(&self) -> AttributeBinding {
        position_layout(self.id)
    }

    fn texture_layout(&self) -> AttributeBinding {
        texture_layout(self.id)
    }

    fn color_layout(&self) -> AttributeBinding {
        color_layout(self.id)
    }

    fn enable_buffer_data(&mut self, gl: &G, bindings: &[ResolvedBinding]) -> Result<(), Error> {
        if self.buffer.is_none() {
            self.buffer = Some(gl.create_buffer()?);
        }

        // Advance the active sprite before upload so the new frame's
        // coordinates ride along in the same buffer write.
        if let Some(name) = &self.active_sprite {
            if let Some(slot) = self.sprites.get_mut(name) {
                let texture = slot.texture;
                if self.animate {
                    let frame = slot.sprite.advance();
                    self.write_frame(frame);
                }
                gl.active_texture_unit(0);
                gl.bind_texture_2d(Some(texture));
            }
        } else if let Some(texture) = self.texture {
            gl.active_texture_unit(0);
            gl.bind_texture_2d(Some(texture));
        }

        gl.bind_array_buffer(self.buffer);
        gl.array_buffer_data(bytemuck::cast_slice(&self.records));
        describe_bindings(gl, bindings);
        Ok(())
    }

    fn disable_buffer(&self, gl: &G, bindings: &[ResolvedBinding]) {
        gl.bind_array_buffer(None);
        release_bindings(gl, bindings);
    }
}

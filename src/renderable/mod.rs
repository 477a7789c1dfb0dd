//! Drawable objects and the interleaved vertex-buffer convention they
//! share.
//!
//! Every drawable packs its vertices as [`VertexRecord`]s — position,
//! texture coordinate, color — and publishes [`VertexLayout`] descriptors
//! for each sub-field, tagged with its [`OwnerId`]. The scene routes those
//! descriptors through the active shader and back to the drawable at draw
//! time as resolved bindings.

mod mesh;
mod quad;

pub use mesh::{Mesh, TileOptions};
pub use quad::Quad;

use bytemuck::{Pod, Zeroable};

use crate::api::GraphicsApi;
use crate::error::Error;
use crate::shader::binding::{AttributeBinding, AttributeSource, OwnerId, ResolvedBinding,
    VertexLayout};
use crate::texture::Texture;

/// One interleaved vertex: 8 floats, 32 bytes.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct VertexRecord {
    /// World-space position.
    pub position: [f32; 2],
    /// Normalized texture coordinate.
    pub texture: [f32; 2],
    /// RGBA color channels.
    pub color: [f32; 4],
}

impl VertexRecord {
    /// A record at `(x, y)` with zeroed texture and color fields.
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: [x, y],
            texture: [0.0, 0.0],
            color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Bytes from one [`VertexRecord`] to the next.
pub const RECORD_STRIDE: i32 = 32;
/// Byte offset of [`VertexRecord::position`].
pub const POSITION_OFFSET: i32 = 0;
/// Byte offset of [`VertexRecord::texture`].
pub const TEXTURE_OFFSET: i32 = 8;
/// Byte offset of [`VertexRecord::color`].
pub const COLOR_OFFSET: i32 = 16;

/// Layout descriptor for the position sub-field.
#[must_use]
pub fn position_layout(owner: OwnerId) -> AttributeBinding {
    AttributeBinding::layout(
        owner,
        VertexLayout {
            size: 2,
            normalized: false,
            stride: RECORD_STRIDE,
            offset: POSITION_OFFSET,
        },
    )
}

/// Layout descriptor for the texture-coordinate sub-field.
#[must_use]
pub fn texture_layout(owner: OwnerId) -> AttributeBinding {
    AttributeBinding::layout(
        owner,
        VertexLayout {
            size: 2,
            normalized: false,
            stride: RECORD_STRIDE,
            offset: TEXTURE_OFFSET,
        },
    )
}

/// Layout descriptor for the color sub-field.
#[must_use]
pub fn color_layout(owner: OwnerId) -> AttributeBinding {
    AttributeBinding::layout(
        owner,
        VertexLayout {
            size: 4,
            normalized: false,
            stride: RECORD_STRIDE,
            offset: COLOR_OFFSET,
        },
    )
}

/// A color channel stored with explicit wraparound: the value taken mod
/// 256, never clamped. `300 → 44`, `-1 → 255`, `256 → 0`.
#[must_use]
pub fn wrap_channel(value: f32) -> f32 {
    value.rem_euclid(256.0)
}

/// Anything a [`Scene`](crate::scene::Scene) can draw.
///
/// A drawable owns its interleaved vertex data and GPU buffer, publishes
/// layout descriptors tagged with its id, and brackets each draw call with
/// [`enable_buffer_data`](Self::enable_buffer_data) /
/// [`disable_buffer`](Self::disable_buffer).
pub trait Renderable<G: GraphicsApi> {
    /// The id this drawable tags its bindings with.
    fn id(&self) -> OwnerId;

    /// How many vertices one triangle-strip draw call covers.
    fn vertex_count(&self) -> i32;

    /// Write a color into every vertex, channels wrapped mod 256.
    fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32);

    /// Use `texture` for this drawable, mapping the whole image.
    fn set_texture(&mut self, texture: &Texture<G>);

    /// Layout descriptor for vertex positions, tagged with this id.
    fn position_layout(&self) -> AttributeBinding;

    /// Layout descriptor for texture coordinates, tagged with this id.
    fn texture_layout(&self) -> AttributeBinding;

    /// Layout descriptor for vertex colors, tagged with this id.
    fn color_layout(&self) -> AttributeBinding;

    /// Bind and upload the vertex buffer, bind any texture, and describe
    /// every passed-in binding at its resolved location.
    ///
    /// The GPU buffer is created on first call and re-uploaded in full on
    /// every call.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the buffer cannot be created.
    fn enable_buffer_data(&mut self, gl: &G, bindings: &[ResolvedBinding]) -> Result<(), Error>;

    /// Disable the attribute arrays and unbind the buffer.
    fn disable_buffer(&self, gl: &G, bindings: &[ResolvedBinding]);
}

/// Describe every resolved binding against the currently bound buffer:
/// layouts enable + point their attribute array, constants upload directly.
pub(crate) fn describe_bindings<G: GraphicsApi>(gl: &G, bindings: &[ResolvedBinding]) {
    for binding in bindings {
        match &binding.source {
            AttributeSource::Layout(layout) => {
                gl.enable_vertex_attrib_array(binding.location);
                gl.vertex_attrib_pointer(
                    binding.location,
                    layout.size,
                    layout.normalized,
                    layout.stride,
                    layout.offset,
                );
            }
            AttributeSource::Constant(value) => {
                gl.vertex_attrib(binding.location, value.values());
            }
        }
    }
}

/// Undo [`describe_bindings`]: disable the layout-backed attribute arrays.
/// Constants are not arrays and need no disable.
pub(crate) fn release_bindings<G: GraphicsApi>(gl: &G, bindings: &[ResolvedBinding]) {
    for binding in bindings {
        if matches!(binding.source, AttributeSource::Layout(_)) {
            gl.disable_vertex_attrib_array(binding.location);
        }
    }
}

//! A 2D scene renderer for immediate-mode OpenGL via [glow].
//!
//! This crate owns a scene graph of drawable objects, a shader abstraction
//! that discovers its bindable variables by lexing the shader source text,
//! and a shared interleaved vertex-buffer layout used by every drawable
//! (quads, sprite tiles, tile-grid meshes). The heart of the design is the
//! shader-variable binding system: typed data — vertex-buffer layout
//! descriptors, constant vectors, matrices — is associated with declared
//! attribute/uniform names, GPU locations resolve lazily and exactly once,
//! and per-object data is routed to the right GPU calls at draw time, with
//! one shader shared across many drawables identified by unique ids.
//!
//! # Features
//!
//! - **Textual shader introspection**: `attribute`/`uniform` declarations
//!   are lexed out of the source, so binding is by name with no manual
//!   location bookkeeping.
//! - **Hot-swappable shaders**: a scene can replace its entire program;
//!   the outgoing program is torn down and the incoming one links on the
//!   next frame.
//! - **Single-strip grids**: tile meshes stitch rows together with
//!   degenerate triangles and render in one draw call.
//! - **Sprite sheets**: animation frames and Tiled-style atlas lookups in
//!   normalized texture space.
//! - **Camera effects**: smooth-step pan/zoom and seedable Perlin-noise
//!   shake, resolved synchronously inside the fixed-step simulation.
//!
//! # Backends
//!
//! The renderer draws against the [`GraphicsApi`] trait; the `glow`
//! feature (default) provides [`GlowApi`] over a real OpenGL context.
//! Creating one is `unsafe` — the context must be current on the calling
//! thread.
//!
//! [glow]: https://docs.rs/glow

mod api;
mod camera;
mod clock;
mod engine;
mod error;
#[cfg(feature = "glow")]
mod glow_api;
pub mod math;
mod renderable;
mod scene;
mod shader;
mod texture;

pub use api::{GraphicsApi, ShaderStage};
pub use camera::effects::CameraEffects;
pub use camera::{Camera, OrthoBounds, OrthographicCamera, PerspectiveCamera, Transform};
pub use clock::Clock;
pub use engine::Engine;
pub use error::Error;
#[cfg(feature = "glow")]
pub use glow_api::GlowApi;
pub use renderable::{
    color_layout, position_layout, texture_layout, Mesh, Quad, Renderable, TileOptions,
    VertexRecord, COLOR_OFFSET, POSITION_OFFSET, RECORD_STRIDE, TEXTURE_OFFSET,
};
pub use scene::Scene;
pub use shader::{
    source, AttributeBinding, AttributeRegistry, AttributeSource, ConstantValue, OwnerId,
    ResolvedBinding, ShaderProgram, UniformBinding, UniformPayload, UniformRegistry, VertexLayout,
};
pub use texture::{AtlasData, AtlasLayer, FrameRect, Sprite, SpriteSheet, SpriteTile, Texture};

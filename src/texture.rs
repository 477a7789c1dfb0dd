//! Textures, sprites, and sprite-sheet atlases.
//!
//! The renderer only ever needs a GPU texture handle and a rectangle in
//! normalized 0..1 texture space per draw; everything here exists to
//! produce those two things. Image bytes are decoded on the CPU via the
//! `image` crate and uploaded once; sprite sheets slice the uploaded image
//! into animation frames or tile-map cells.

use serde::{Deserialize, Serialize};

use crate::api::GraphicsApi;
use crate::error::Error;

/// A sub-rectangle of a texture in normalized 0..1 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Whether this rect actually maps image content. Empty atlas cells
    /// report `false` and should be skipped by the consumer.
    pub has_texture: bool,
}

impl FrameRect {
    /// The whole texture.
    pub const WHOLE: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
        has_texture: true,
    };

    /// A content-bearing rect.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            has_texture: true,
        }
    }
}

/// A GPU texture and its pixel dimensions.
pub struct Texture<G: GraphicsApi> {
    id: Option<G::Texture>,
    width: u32,
    height: u32,
}

impl<G: GraphicsApi> Default for Texture<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GraphicsApi> Texture<G> {
    /// A texture with no GPU storage yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: None,
            width: 0,
            height: 0,
        }
    }

    /// Decode an encoded image (PNG or JPEG) and upload it.
    ///
    /// # Errors
    ///
    /// [`Error::Image`] if the bytes fail to decode; [`Error::Resource`]
    /// if the device refuses a texture object.
    pub fn upload_from_memory(&mut self, gl: &G, bytes: &[u8]) -> Result<(), Error> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        self.upload_rgba(gl, width, height, &decoded.into_raw())
    }

    /// Upload raw RGBA8 pixels.
    ///
    /// Power-of-two images get a mipmap chain; anything else falls back to
    /// linear filtering with clamp-to-edge wrapping, per WebGL-1 rules.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if the device refuses a texture object.
    pub fn upload_rgba(
        &mut self,
        gl: &G,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), Error> {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);

        if self.id.is_none() {
            self.id = Some(gl.create_texture()?);
        }

        gl.bind_texture_2d(self.id);
        gl.tex_image_2d_rgba(width, height, pixels);
        if width.is_power_of_two() && height.is_power_of_two() {
            gl.generate_mipmaps();
        } else {
            gl.set_linear_clamp_params();
        }
        gl.bind_texture_2d(None);

        self.width = width;
        self.height = height;
        Ok(())
    }

    /// The GPU handle, `None` before the first upload.
    #[must_use]
    pub fn id(&self) -> Option<G::Texture> {
        self.id
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A framed animation cut from a sprite sheet.
///
/// Frames are laid out left-to-right from the base rect, wrapping to the
/// next row every `columns` frames. Frame advancement cycles.
#[derive(Debug, Clone)]
pub struct Sprite {
    frames: usize,
    frames_per_second: f32,
    base: FrameRect,
    columns: usize,
    current: usize,
}

impl Sprite {
    /// An animation of `frames` frames starting at `base`.
    #[must_use]
    pub fn new(frames: usize, frames_per_second: f32, base: FrameRect, columns: usize) -> Self {
        Self {
            frames: frames.max(1),
            frames_per_second,
            base,
            columns: columns.max(1),
            current: 0,
        }
    }

    /// The rect for frame `index` (wrapped into range).
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn frame_at(&self, index: usize) -> FrameRect {
        let index = index % self.frames;
        let col = (index % self.columns) as f32;
        let row = (index / self.columns) as f32;
        FrameRect::new(
            self.base.x + col * self.base.width,
            self.base.y + row * self.base.height,
            self.base.width,
            self.base.height,
        )
    }

    /// Step to the next frame (cycling) and return its rect.
    pub fn advance(&mut self) -> FrameRect {
        self.current = (self.current + 1) % self.frames;
        self.frame_at(self.current)
    }

    /// The frame currently shown.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Playback rate hint, in frames per second.
    #[must_use]
    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }
}

/// Tile-map atlas data in the Tiled export convention: cell values are 0
/// for empty or a 1-based index into the sheet's tile grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasData {
    /// Tile width in pixels.
    #[serde(rename = "tileWidth")]
    pub tile_width: u32,
    /// Tile height in pixels.
    #[serde(rename = "tileHeight")]
    pub tile_height: u32,
    /// Map layers; only the first is consulted.
    pub layers: Vec<AtlasLayer>,
}

/// One layer of atlas cell values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasLayer {
    /// Row-major cell values.
    pub data: Vec<u32>,
}

/// A pixel-space rectangle describing where a sprite's first frame sits on
/// its sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteTile {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Frame width in pixels.
    pub width: f32,
    /// Frame height in pixels.
    pub height: f32,
    /// Frames per sheet row; defaults to all frames on one row.
    pub columns: Option<usize>,
}

/// A texture with frame-slicing metadata: sprite animations and tile-map
/// lookups.
pub struct SpriteSheet<G: GraphicsApi> {
    texture: Texture<G>,
    atlas: Option<AtlasData>,
}

impl<G: GraphicsApi> SpriteSheet<G> {
    /// Wrap an uploaded texture.
    #[must_use]
    pub fn new(texture: Texture<G>) -> Self {
        Self {
            texture,
            atlas: None,
        }
    }

    /// Parse and install tile-map atlas data from its JSON form.
    ///
    /// # Errors
    ///
    /// [`Error::AtlasData`] if the JSON does not match the atlas schema.
    pub fn set_atlas_json(&mut self, json: &str) -> Result<(), Error> {
        self.atlas = Some(serde_json::from_str(json)?);
        Ok(())
    }

    /// Install already-parsed atlas data.
    pub fn set_atlas(&mut self, atlas: AtlasData) {
        self.atlas = Some(atlas);
    }

    /// The underlying texture.
    #[must_use]
    pub fn texture(&self) -> &Texture<G> {
        &self.texture
    }

    /// The underlying texture, e.g. for uploading pixels.
    pub fn texture_mut(&mut self) -> &mut Texture<G> {
        &mut self.texture
    }

    /// The GPU handle of the underlying texture.
    #[must_use]
    pub fn texture_id(&self) -> Option<G::Texture> {
        self.texture.id()
    }

    /// Cut a sprite animation out of this sheet.
    ///
    /// `tile` is in pixel space; the sprite's rects are normalized by the
    /// sheet dimensions, so the texture must be uploaded first.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn generate_sprite(&self, frames: usize, frames_per_second: f32, tile: SpriteTile) -> Sprite {
        let sheet_width = self.texture.width().max(1) as f32;
        let sheet_height = self.texture.height().max(1) as f32;
        let base = FrameRect::new(
            tile.x / sheet_width,
            tile.y / sheet_height,
            tile.width / sheet_width,
            tile.height / sheet_height,
        );
        Sprite::new(frames, frames_per_second, base, tile.columns.unwrap_or(frames))
    }

    /// The texture rect for atlas cell `index`.
    ///
    /// Empty cells, out-of-range indices, and a missing atlas all report
    /// `has_texture = false` with the tile-sized rect at the origin.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn texture_for_index(&self, index: usize) -> FrameRect {
        let empty = FrameRect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            has_texture: false,
        };
        let Some(atlas) = &self.atlas else {
            return empty;
        };
        if self.texture.width() == 0 || self.texture.height() == 0 || atlas.tile_width == 0 {
            return empty;
        }

        let sheet_width = self.texture.width() as f32;
        let sheet_height = self.texture.height() as f32;
        let mut rect = FrameRect {
            x: 0.0,
            y: 0.0,
            width: atlas.tile_width as f32 / sheet_width,
            height: atlas.tile_height as f32 / sheet_height,
            has_texture: false,
        };

        let Some(layer) = atlas.layers.first() else {
            return rect;
        };
        let Some(&cell) = layer.data.get(index) else {
            return rect;
        };
        if cell == 0 {
            return rect;
        }

        // Cell values are 1-based; 0 is reserved for "empty".
        let tile_index = cell - 1;
        let row_len = self.texture.width() / atlas.tile_width;
        if row_len == 0 {
            return rect;
        }
        let x_offset = tile_index % row_len;
        let y_offset = tile_index / row_len;
        rect.x = (x_offset * atlas.tile_width) as f32 / sheet_width;
        rect.y = (y_offset * atlas.tile_height) as f32 / sheet_height;
        rect.has_texture = true;
        rect
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingApi;

    fn sheet_64x32(gl: &RecordingApi) -> SpriteSheet<RecordingApi> {
        let mut texture = Texture::new();
        texture
            .upload_rgba(gl, 64, 32, &[0u8; 64 * 32 * 4])
            .unwrap();
        SpriteSheet::new(texture)
    }

    #[test]
    fn power_of_two_uploads_get_mipmaps() {
        let gl = RecordingApi::new();
        let mut texture = Texture::new();
        texture.upload_rgba(&gl, 64, 32, &[0u8; 64 * 32 * 4]).unwrap();
        let state = gl.state.borrow();
        assert_eq!(state.mipmap_generations, 1);
        assert_eq!(state.linear_clamp_sets, 0);
    }

    #[test]
    fn npot_uploads_fall_back_to_linear_clamp() {
        let gl = RecordingApi::new();
        let mut texture = Texture::new();
        texture.upload_rgba(&gl, 48, 32, &[0u8; 48 * 32 * 4]).unwrap();
        let state = gl.state.borrow();
        assert_eq!(state.mipmap_generations, 0);
        assert_eq!(state.linear_clamp_sets, 1);
    }

    #[test]
    fn reupload_reuses_the_texture_object() {
        let gl = RecordingApi::new();
        let mut texture = Texture::new();
        texture.upload_rgba(&gl, 4, 4, &[0; 64]).unwrap();
        let first = texture.id();
        texture.upload_rgba(&gl, 8, 8, &[0; 256]).unwrap();
        assert_eq!(texture.id(), first);
        assert_eq!(texture.width(), 8);
    }

    #[test]
    fn sprite_frames_advance_and_cycle() {
        let mut sprite = Sprite::new(3, 6.0, FrameRect::new(0.0, 0.0, 0.25, 0.5), 2);
        // Frames wrap into a 2-column layout.
        assert_eq!(sprite.frame_at(0), FrameRect::new(0.0, 0.0, 0.25, 0.5));
        assert_eq!(sprite.frame_at(1), FrameRect::new(0.25, 0.0, 0.25, 0.5));
        assert_eq!(sprite.frame_at(2), FrameRect::new(0.0, 0.5, 0.25, 0.5));

        sprite.advance();
        sprite.advance();
        assert_eq!(sprite.current_frame(), 2);
        // Cycling back to frame 0.
        assert_eq!(sprite.advance(), sprite.frame_at(0));
    }

    #[test]
    fn generate_sprite_normalizes_by_sheet_size() {
        let gl = RecordingApi::new();
        let sheet = sheet_64x32(&gl);
        let sprite = sheet.generate_sprite(
            4,
            8.0,
            SpriteTile {
                x: 16.0,
                y: 16.0,
                width: 16.0,
                height: 16.0,
                columns: None,
            },
        );
        assert_eq!(sprite.frame_at(0), FrameRect::new(0.25, 0.5, 0.25, 0.5));
    }

    #[test]
    fn atlas_cells_map_one_based_indices() {
        let gl = RecordingApi::new();
        let mut sheet = sheet_64x32(&gl);
        sheet
            .set_atlas_json(r#"{"tileWidth": 16, "tileHeight": 16, "layers": [{"data": [0, 3, 6]}]}"#)
            .unwrap();

        // Cell 0 is empty.
        assert!(!sheet.texture_for_index(0).has_texture);

        // Cell value 3 -> tile 2 of a 4-tile-wide sheet: third tile on row 0.
        let rect = sheet.texture_for_index(1);
        assert!(rect.has_texture);
        assert_eq!((rect.x, rect.y), (0.5, 0.0));
        assert_eq!((rect.width, rect.height), (0.25, 0.5));

        // Cell value 6 -> tile 5: second tile on row 1.
        let rect = sheet.texture_for_index(2);
        assert_eq!((rect.x, rect.y), (0.25, 0.5));

        // Out of range reports no texture.
        assert!(!sheet.texture_for_index(99).has_texture);
    }

    #[test]
    fn missing_atlas_reports_no_texture() {
        let gl = RecordingApi::new();
        let sheet = sheet_64x32(&gl);
        assert!(!sheet.texture_for_index(0).has_texture);
    }

    #[test]
    fn malformed_atlas_json_is_an_error() {
        let gl = RecordingApi::new();
        let mut sheet = sheet_64x32(&gl);
        assert!(matches!(
            sheet.set_atlas_json("{\"nope\": true}"),
            Err(Error::AtlasData(_))
        ));
    }
}

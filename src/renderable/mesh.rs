//! A tile grid drawn as one triangle strip.

use crate::api::GraphicsApi;
use crate::error::Error;
use crate::renderable::{
    color_layout, describe_bindings, position_layout, release_bindings, texture_layout,
    wrap_channel, Renderable, VertexRecord,
};
use crate::shader::binding::{AttributeBinding, OwnerId, ResolvedBinding};
use crate::texture::{FrameRect, SpriteSheet, Texture};

/// Shape of a tile grid: how many tiles, and how big each one is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOptions {
    /// Number of tile rows.
    pub row_count: usize,
    /// Number of tile columns.
    pub column_count: usize,
    /// Width of a single tile.
    pub tile_width: f32,
    /// Height of a single tile.
    pub tile_height: f32,
}

/// A `rows × columns` grid of quads sharing one vertex buffer and one draw
/// call.
///
/// Rows are stitched together with degenerate triangles: after the last
/// quad of each row except the final one, that quad's last two vertex
/// records are duplicated, so the strip jumps to the next row without
/// emitting visible geometry. A grid of `R × C` tiles therefore holds
/// `4*R*C + 2*(R-1)` records.
pub struct Mesh<G: GraphicsApi> {
    id: OwnerId,
    rows: usize,
    columns: usize,
    records: Vec<VertexRecord>,
    buffer: Option<G::Buffer>,
    texture: Option<G::Texture>,
}

/// Records per tile.
const TILE_RECORDS: usize = 4;
/// Records in one degenerate row stitch.
const DEGENERATE_RECORDS: usize = 2;

impl<G: GraphicsApi> Mesh<G> {
    /// A grid with its origin (upper-left corner) at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32, tile: TileOptions) -> Self {
        let rows = tile.row_count;
        let columns = tile.column_count;

        let mut records = Vec::with_capacity(
            TILE_RECORDS * rows * columns + DEGENERATE_RECORDS * rows.saturating_sub(1),
        );

        for row in 0..rows {
            #[expect(clippy::cast_precision_loss)]
            let top = y + row as f32 * tile.tile_height;
            for col in 0..columns {
                #[expect(clippy::cast_precision_loss)]
                let left = x + col as f32 * tile.tile_width;
                records.push(VertexRecord::at(left, top));
                records.push(VertexRecord::at(left + tile.tile_width, top));
                records.push(VertexRecord::at(left, top + tile.tile_height));
                records.push(VertexRecord::at(
                    left + tile.tile_width,
                    top + tile.tile_height,
                ));
            }
            // Stitch to the next row by repeating this row's final two
            // records.
            if row + 1 < rows && columns > 0 {
                let len = records.len();
                records.push(records[len - 2]);
                records.push(records[len - 1]);
            }
        }

        Self {
            id: OwnerId::next(),
            rows,
            columns,
            records,
            buffer: None,
            texture: None,
        }
    }

    /// A grid covering `width × height` from `(x, y)` with as many whole
    /// tiles of `tile_width × tile_height` as fit; partial tiles are
    /// dropped.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_extent(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        tile_width: f32,
        tile_height: f32,
    ) -> Self {
        Self::new(
            x,
            y,
            TileOptions {
                row_count: (height / tile_height).floor().max(0.0) as usize,
                column_count: (width / tile_width).floor().max(0.0) as usize,
                tile_width,
                tile_height,
            },
        )
    }

    /// Grid height in tiles.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid width in tiles.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Index of tile `(row, col)`'s first record. The `row * 2` term is
    /// the accumulated degenerate offset from the stitches above it.
    fn tile_record_index(&self, row: usize, col: usize) -> usize {
        (row * self.columns + col) * TILE_RECORDS + row * DEGENERATE_RECORDS
    }

    /// Re-copy every degenerate stitch from its source records, after a
    /// mutation that may have touched a row's last tile.
    fn sync_degenerates(&mut self) {
        if self.columns == 0 {
            return;
        }
        for row in 0..self.rows.saturating_sub(1) {
            let last_tile = self.tile_record_index(row, self.columns - 1);
            let stitch = last_tile + TILE_RECORDS;
            self.records[stitch] = self.records[last_tile + 2];
            self.records[stitch + 1] = self.records[last_tile + 3];
        }
    }

    fn write_tile_frame(&mut self, row: usize, col: usize, frame: FrameRect) {
        let base = self.tile_record_index(row, col);
        self.records[base].texture = [frame.x, frame.y];
        self.records[base + 1].texture = [frame.x + frame.width, frame.y];
        self.records[base + 2].texture = [frame.x, frame.y + frame.height];
        self.records[base + 3].texture = [frame.x + frame.width, frame.y + frame.height];
    }

    /// Color one tile, channels wrapped mod 256.
    ///
    /// Out-of-range coordinates are ignored.
    pub fn set_tile_color(&mut self, row: usize, col: usize, r: f32, g: f32, b: f32, a: f32) {
        if row >= self.rows || col >= self.columns {
            return;
        }
        let color = [
            wrap_channel(r),
            wrap_channel(g),
            wrap_channel(b),
            wrap_channel(a),
        ];
        let base = self.tile_record_index(row, col);
        for record in &mut self.records[base..base + TILE_RECORDS] {
            record.color = color;
        }
        self.sync_degenerates();
    }

    /// Map each tile's texture coordinates from the sheet's atlas data and
    /// sample from the sheet's texture.
    ///
    /// Tiles whose atlas cell is empty keep their current coordinates.
    pub fn set_sprite_sheet(&mut self, sheet: &SpriteSheet<G>) {
        self.texture = sheet.texture_id();
        for index in 0..self.rows * self.columns {
            let frame = sheet.texture_for_index(index);
            if frame.has_texture {
                self.write_tile_frame(index / self.columns, index % self.columns, frame);
            }
        }
        self.sync_degenerates();
    }

    /// The vertex records, for inspection.
    #[must_use]
    pub fn records(&self) -> &[VertexRecord] {
        &self.records
    }
}

impl<G: GraphicsApi> Renderable<G> for Mesh<G> {
    fn id(&self) -> OwnerId {
        self.id
    }

    fn vertex_count(&self) -> i32 {
        i32::try_from(self.records.len()).expect("vertex count exceeds i32::MAX")
    }

    fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let color = [
            wrap_channel(r),
            wrap_channel(g),
            wrap_channel(b),
            wrap_channel(a),
        ];
        // Degenerate records are copies of tile records, so a whole-mesh
        // write keeps them in sync for free.
        for record in &mut self.records {
            record.color = color;
        }
    }

    fn set_texture(&mut self, texture: &Texture<G>) {
        self.texture = texture.id();
        for index in 0..self.rows * self.columns {
            self.write_tile_frame(index / self.columns, index % self.columns, FrameRect::WHOLE);
        }
        self.sync_degenerates();
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

        if let Some(texture) = self.texture {
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingApi;

    fn grid(rows: usize, cols: usize) -> Mesh<RecordingApi> {
        Mesh::new(
            0.0,
            0.0,
            TileOptions {
                row_count: rows,
                column_count: cols,
                tile_width: 16.0,
                tile_height: 16.0,
            },
        )
    }

    #[test]
    fn degenerate_records_per_interior_row_boundary() {
        // 2 rows x 3 columns: 24 tile records + one stitch of 2.
        let mesh = grid(2, 3);
        assert_eq!(mesh.records().len(), 26);
        assert_eq!(mesh.vertex_count(), 26);

        // A single row needs no stitch at all.
        let single = grid(1, 3);
        assert_eq!(single.records().len(), 12);
    }

    #[test]
    fn stitch_duplicates_the_rows_final_two_records() {
        let mesh = grid(2, 3);
        // Row 0's last tile occupies records 8..12; the stitch is 12..14.
        assert_eq!(mesh.records()[12], mesh.records()[10]);
        assert_eq!(mesh.records()[13], mesh.records()[11]);
        // Row 1 starts after the stitch, back at the left edge.
        assert_eq!(mesh.records()[14].position, [0.0, 16.0]);
    }

    #[test]
    fn tile_addressing_skips_accumulated_stitches() {
        let mesh = grid(3, 2);
        assert_eq!(mesh.tile_record_index(0, 0), 0);
        assert_eq!(mesh.tile_record_index(0, 1), 4);
        assert_eq!(mesh.tile_record_index(1, 0), 10);
        assert_eq!(mesh.tile_record_index(2, 1), 24);
    }

    #[test]
    fn from_extent_drops_partial_tiles() {
        let mesh = Mesh::<RecordingApi>::from_extent(0.0, 0.0, 40.0, 20.0, 16.0, 16.0);
        assert_eq!(mesh.columns(), 2);
        assert_eq!(mesh.rows(), 1);
    }

    #[test]
    fn extent_smaller_than_a_tile_is_empty() {
        let mesh = Mesh::<RecordingApi>::from_extent(0.0, 0.0, 8.0, 8.0, 16.0, 16.0);
        assert_eq!(mesh.records().len(), 0);
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn tile_color_resyncs_the_stitch() {
        let mut mesh = grid(2, 3);
        mesh.set_tile_color(0, 2, 300.0, 0.0, 0.0, 255.0);
        // The recolored tile's lower records flow into the stitch.
        assert_eq!(mesh.records()[10].color, [44.0, 0.0, 0.0, 255.0]);
        assert_eq!(mesh.records()[12].color, [44.0, 0.0, 0.0, 255.0]);
        // Out-of-range writes are ignored.
        mesh.set_tile_color(5, 0, 1.0, 1.0, 1.0, 1.0);
    }

    #[test]
    fn whole_mesh_upload_covers_every_record() {
        let gl = RecordingApi::new();
        let mut mesh = grid(2, 2);
        mesh.enable_buffer_data(&gl, &[]).unwrap();
        // 18 records x 32 bytes.
        assert_eq!(gl.state.borrow().buffer_uploads, vec![576]);
    }
}

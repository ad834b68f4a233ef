//! Board module - tiles, screen geometry and the remaining tile set
//!
//! Tiles live on a 3D grid (`x`, `y`, `layer`). Their screen rectangles are
//! derived from [`Geometry`], which is shared by every tile of one generated
//! board. The [`Board`] keeps tiles in generation order; removal preserves the
//! order of the rest.

use crate::types::{
    ImageId, TileId, LAYER_OFFSET, TILE_DRAW_HEIGHT, TILE_DRAW_WIDTH, TILE_GAP, TILE_HIT_HEIGHT,
    TILE_HIT_WIDTH, VIEWPORT_HEIGHT, VIEWPORT_MIN_MARGIN, VIEWPORT_WIDTH,
};

/// Layout constants of one generated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub x_spacing: i32,
    pub y_spacing: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub layer_offset: i32,
}

impl Geometry {
    /// Geometry that centers a `width` x `height` footprint in the viewport,
    /// keeping at least `VIEWPORT_MIN_MARGIN` pixels from the edges.
    pub fn centered(width: u8, height: u8) -> Self {
        let x_spacing = TILE_DRAW_WIDTH + TILE_GAP;
        let y_spacing = TILE_DRAW_HEIGHT + TILE_GAP;
        let offset_x = (VIEWPORT_WIDTH - width as i32 * x_spacing) / 2;
        let offset_y = (VIEWPORT_HEIGHT - height as i32 * y_spacing) / 2;

        Self {
            x_spacing,
            y_spacing,
            offset_x: offset_x.max(VIEWPORT_MIN_MARGIN),
            offset_y: offset_y.max(VIEWPORT_MIN_MARGIN),
            layer_offset: LAYER_OFFSET,
        }
    }

    /// Top-left corner of a grid cell on a given layer.
    pub fn origin(&self, x: u8, y: u8, layer: u8) -> (i32, i32) {
        let left = x as i32 * self.x_spacing + self.offset_x;
        let top = y as i32 * self.y_spacing + self.offset_y + layer as i32 * self.layer_offset;
        (left, top)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::centered(1, 1)
    }
}

/// Axis-aligned screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Area shared with `other` (0 when they only touch or are disjoint).
    pub fn overlap_area(&self, other: &Rect) -> i64 {
        let w = self.right().min(other.right()) - self.left.max(other.left);
        let h = self.bottom().min(other.bottom()) - self.top.max(other.top);
        if w <= 0 || h <= 0 {
            return 0;
        }
        w as i64 * h as i64
    }
}

/// A single tile.
///
/// Position and image never change once generated; only `free` is recomputed
/// when the set of remaining tiles changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: TileId,
    pub image: ImageId,
    pub x: u8,
    pub y: u8,
    pub layer: u8,
    pub geometry: Geometry,
    pub free: bool,
}

impl Tile {
    pub fn new(id: TileId, image: ImageId, x: u8, y: u8, layer: u8, geometry: Geometry) -> Self {
        Self {
            id,
            image,
            x,
            y,
            layer,
            geometry,
            free: true,
        }
    }

    /// Rectangle used for occlusion (slightly larger than the drawn tile).
    pub fn hit_rect(&self) -> Rect {
        let (left, top) = self.geometry.origin(self.x, self.y, self.layer);
        Rect::new(left, top, TILE_HIT_WIDTH, TILE_HIT_HEIGHT)
    }

    /// Rectangle the presentation layer draws.
    pub fn draw_rect(&self) -> Rect {
        let (left, top) = self.geometry.origin(self.x, self.y, self.layer);
        Rect::new(left, top, TILE_DRAW_WIDTH, TILE_DRAW_HEIGHT)
    }
}

/// Tiles still on the board, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Board {
    /// Build a board from tiles and compute their `free` flags.
    pub fn new(tiles: Vec<Tile>) -> Self {
        let mut board = Self { tiles };
        board.recompute_free_status();
        board
    }

    /// Empty board (menu state).
    pub fn empty() -> Self {
        Self { tiles: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    /// Tiles currently selectable.
    pub fn free_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().filter(|t| t.free)
    }

    pub fn count_image(&self, image: ImageId) -> usize {
        self.tiles.iter().filter(|t| t.image == image).count()
    }

    /// Remove a tile by id. The `free` flags of the remaining tiles are left
    /// stale; callers recompute once the mutation is complete.
    pub fn take(&mut self, id: TileId) -> Option<Tile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(index))
    }

    /// Put a taken tile back at its generation-order slot.
    pub fn restore(&mut self, tile: Tile) {
        let index = self.tiles.partition_point(|t| t.id < tile.id);
        self.tiles.insert(index, tile);
    }

    /// Recompute every tile's `free` flag from the current tile set.
    pub fn recompute_free_status(&mut self) {
        crate::occlusion::recompute_free_status(&mut self.tiles);
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

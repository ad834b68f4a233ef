//! Occlusion module - which tiles are selectable
//!
//! A tile is covered by every tile on a strictly higher layer whose hit
//! rectangle overlaps its own. Covered areas are summed and capped at the
//! tile's area; the tile is free when the visible fraction is at least
//! `FREE_VISIBILITY_THRESHOLD`.
//!
//! The computation reads only positions and geometry, so running it twice on an
//! unchanged tile set yields the same flags.

use crate::board::Tile;
use crate::types::FREE_VISIBILITY_THRESHOLD;

/// Visible fraction of `tile` under the tiles of higher layers in `tiles`.
///
/// Returns a value in `[0.0, 1.0]`.
pub fn visible_fraction(tile: &Tile, tiles: &[Tile]) -> f64 {
    let rect = tile.hit_rect();
    let area = rect.area();
    if area == 0 {
        return 0.0;
    }

    let covered: i64 = tiles
        .iter()
        .filter(|other| other.layer > tile.layer)
        .map(|other| rect.overlap_area(&other.hit_rect()))
        .sum();
    let covered = covered.min(area);

    (area - covered) as f64 / area as f64
}

/// Whether `tile` is free within `tiles`.
pub fn is_free(tile: &Tile, tiles: &[Tile]) -> bool {
    visible_fraction(tile, tiles) >= FREE_VISIBILITY_THRESHOLD
}

/// Recompute the `free` flag of every tile in place.
pub fn recompute_free_status(tiles: &mut [Tile]) {
    for i in 0..tiles.len() {
        let free = is_free(&tiles[i], tiles);
        tiles[i].free = free;
    }
}

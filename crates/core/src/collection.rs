//! Collection module - staging area for selected tiles
//!
//! Holds at most `COLLECTION_CAPACITY` tiles between transitions. The buffer
//! itself is a little larger because a hint can stage up to three tiles before
//! the trio they complete is removed.

use arrayvec::ArrayVec;

use crate::board::Tile;
use crate::types::{ImageId, TileId, COLLECTION_CAPACITY, TRIO_SIZE};

/// Staging buffer size: a full collection plus one trio.
pub const STAGING_CAPACITY: usize = COLLECTION_CAPACITY + TRIO_SIZE;

/// Tiles taken from the board, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    tiles: ArrayVec<Tile, STAGING_CAPACITY>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True when no more non-completing tiles can be accepted.
    pub fn is_full(&self) -> bool {
        self.tiles.len() >= COLLECTION_CAPACITY
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn count_image(&self, image: ImageId) -> usize {
        self.tiles.iter().filter(|t| t.image == image).count()
    }

    /// Whether adding a tile of `image` would complete a trio.
    pub fn completes_trio(&self, image: ImageId) -> bool {
        self.count_image(image) + 1 >= TRIO_SIZE
    }

    /// Append a tile. Returns the tile back when the staging buffer is full.
    pub fn push(&mut self, tile: Tile) -> Result<(), Tile> {
        self.tiles.try_push(tile).map_err(|e| e.element())
    }

    /// Remove the first three tiles of the first image that reached a trio.
    ///
    /// Images are checked in order of their oldest tile.
    pub fn take_trio(&mut self) -> Option<(ImageId, [TileId; TRIO_SIZE])> {
        let image = self
            .tiles
            .iter()
            .map(|t| t.image)
            .find(|&image| self.count_image(image) >= TRIO_SIZE)?;

        let mut ids = [0; TRIO_SIZE];
        let mut taken = 0;
        self.tiles.retain(|t| {
            if taken < TRIO_SIZE && t.image == image {
                ids[taken] = t.id;
                taken += 1;
                false
            } else {
                true
            }
        });

        Some((image, ids))
    }

    /// Whether any image already has a complete trio staged.
    pub fn has_trio(&self) -> bool {
        self.tiles
            .iter()
            .any(|t| self.count_image(t.image) >= TRIO_SIZE)
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

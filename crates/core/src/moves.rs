//! Moves module - legal selections, deadlocks and hint planning
//!
//! Two deadlock checks run after every selection:
//!
//! - **Full collection**: with five collected tiles and no staged trio, the
//!   board must still hold either a tile whose image is collected twice or two
//!   tiles of an image collected at least once.
//! - **Free tiles**: when any tile is free, at least one free tile must be
//!   clickable under the full-collection guard.

use arrayvec::ArrayVec;

use crate::board::{Board, Tile};
use crate::collection::Collection;
use crate::types::{ImageId, TileId, CARD_IMAGES, COLLECTION_CAPACITY, TRIO_SIZE};

/// Whether a tile of `image` may enter `collection` right now.
pub fn can_accept(collection: &Collection, image: ImageId) -> bool {
    !collection.is_full() || collection.completes_trio(image)
}

/// Full-collection deadlock: nothing on the board can complete a trio.
pub fn is_full_deadlock(board: &Board, collection: &Collection) -> bool {
    if collection.len() < COLLECTION_CAPACITY || collection.has_trio() {
        return false;
    }

    let completes_with_one = board
        .tiles()
        .iter()
        .any(|t| collection.count_image(t.image) + 1 >= TRIO_SIZE);
    if completes_with_one {
        return false;
    }

    let completes_with_two = collection
        .tiles()
        .iter()
        .any(|c| board.count_image(c.image) >= 2);
    !completes_with_two
}

/// Whether at least one free tile can be clicked. A board with no free tiles
/// reports `true` (nothing to judge).
pub fn has_legal_selection(board: &Board, collection: &Collection) -> bool {
    let mut free = board.free_tiles().peekable();
    if free.peek().is_none() {
        return true;
    }
    free.any(|t| can_accept(collection, t.image))
}

/// Tiles a hint moves from the board to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintPlan {
    pub image: ImageId,
    pub tiles: ArrayVec<TileId, TRIO_SIZE>,
}

/// Pick the image closest to a trio and the board tiles that complete it.
///
/// Candidates are images with at least three tiles across board and
/// collection. The candidate with the most collected tiles wins, then the one
/// with the most board tiles, then the lowest palette index. Tiles on higher
/// layers are taken first; ties go to the older tile.
pub fn plan_hint(board: &Board, collection: &Collection) -> Option<HintPlan> {
    let mut best: Option<(ImageId, usize, usize)> = None;

    for index in 0..CARD_IMAGES.len() {
        let image = ImageId(index as u8);
        let on_board = board.count_image(image);
        let collected = collection.count_image(image);
        if on_board + collected < TRIO_SIZE || collected >= TRIO_SIZE {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_collected, best_board)) => {
                (collected, on_board) > (best_collected, best_board)
            }
        };
        if better {
            best = Some((image, collected, on_board));
        }
    }

    let (image, collected, on_board) = best?;
    let need = (TRIO_SIZE - collected).min(on_board);

    let mut candidates: Vec<&Tile> = board.tiles().iter().filter(|t| t.image == image).collect();
    // Stable sort keeps generation order within a layer.
    candidates.sort_by(|a, b| b.layer.cmp(&a.layer));

    let tiles = candidates.into_iter().take(need).map(|t| t.id).collect();
    Some(HintPlan { image, tiles })
}

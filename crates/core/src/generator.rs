//! Generator module - builds a level's board
//!
//! Steps:
//!
//! 1. Resolve the level's [`LevelConfig`] and clamp the tile budget to a
//!    multiple of 3 that the layer stack can hold
//! 2. Emit three identity tokens per trio group (palette cycles) and shuffle
//! 3. Fill the base layer, then fill upper layers from one shuffled pool of
//!    footprint cells, cycling the pool once per layer
//! 4. Zip tokens with positions into tiles sharing one centered [`Geometry`]
//! 5. Compute occlusion

use crate::board::{Board, Geometry, Tile};
use crate::rng::SimpleRng;
use crate::types::{ImageId, LevelConfig, TileId, TRIO_SIZE};

/// Level configuration with the tile budget the generator will actually place.
///
/// The budget is floored to a multiple of 3 and to the largest multiple of 3
/// that fits in `layers * footprint`.
pub fn effective_config(level: u32) -> LevelConfig {
    let mut config = LevelConfig::for_level(level);
    let trio = TRIO_SIZE as u32;
    let budget = config.total_tiles.min(config.capacity());
    config.total_tiles = budget / trio * trio;
    config
}

/// Generate the board for `level`, drawing shuffles from `rng`.
pub fn generate_board(level: u32, rng: &mut SimpleRng) -> Board {
    let config = effective_config(level);
    let total = config.total_tiles as usize;

    let mut tokens = Vec::with_capacity(total);
    for group in 0..total / TRIO_SIZE {
        let image = ImageId::for_group(group);
        tokens.extend(std::iter::repeat(image).take(TRIO_SIZE));
    }
    rng.shuffle(&mut tokens);

    let positions = layer_positions(&config, total, rng);
    let geometry = Geometry::centered(config.width, config.height);

    let tiles = tokens
        .into_iter()
        .zip(positions)
        .enumerate()
        .map(|(i, (image, (x, y, layer)))| Tile::new(i as TileId, image, x, y, layer, geometry))
        .collect();

    Board::new(tiles)
}

fn layer_positions(config: &LevelConfig, total: usize, rng: &mut SimpleRng) -> Vec<(u8, u8, u8)> {
    let mut positions = Vec::with_capacity(total);

    for y in 0..config.height {
        for x in 0..config.width {
            positions.push((x, y, 0));
        }
    }
    positions.truncate(total);

    let mut pool: Vec<(u8, u8)> = positions.iter().map(|&(x, y, _)| (x, y)).collect();
    rng.shuffle(&mut pool);

    let footprint = config.footprint() as usize;
    if footprint == 0 {
        return positions;
    }

    let upper = total.saturating_sub(positions.len());
    for i in 0..upper {
        let layer = i / footprint + 1;
        if layer >= config.layers as usize {
            break;
        }
        let (x, y) = pool[i % pool.len()];
        positions.push((x, y, layer as u8));
    }

    positions
}

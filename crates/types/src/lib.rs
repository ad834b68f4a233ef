//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, host collaborators, adapter protocol).
//!
//! # Levels
//!
//! Boards are described by a [`LevelConfig`]: a base footprint (width x height),
//! a number of stacked layers and a tile budget. Levels 1-10 come from
//! [`LEVEL_TABLE`]; later levels extrapolate from the last entry.
//!
//! | Level | Footprint | Layers | Tiles |
//! |-------|-----------|--------|-------|
//! | 1 | 3x3 | 2 | 18 |
//! | 2 | 4x4 | 3 | 30 |
//! | 3 | 4x4 | 4 | 36 |
//! | 10 | 4x4 | 11 | 198 |
//! | 10+n | 4x4 | 11+n | 198+24n |
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_TIME_SECS` | 40 | Countdown budget at level 1 |
//! | `TIME_PER_LEVEL_SECS` | 10 | Extra seconds per level |
//! | `COUNTDOWN_TICK_MS` | 1000 | Countdown step |
//! | `SELECTION_COOLDOWN_MS` | 150 | Debounce after an accepted click |
//! | `TRIO_ANIMATION_MS` | 800 | Lifetime of the trio animation marker |
//!
//! # Examples
//!
//! ```
//! use base_stack_types::{level_time_budget_secs, GameAction, LevelConfig, Phase};
//!
//! let config = LevelConfig::for_level(1);
//! assert_eq!(config.footprint(), 9);
//! assert_eq!(config.total_tiles, 18);
//!
//! assert_eq!(level_time_budget_secs(3), 60);
//!
//! let action = GameAction::from_name("hint", None).unwrap();
//! assert_eq!(action, GameAction::Hint);
//! assert_eq!(Phase::Playing.as_str(), "playing");
//! ```

/// Stable identifier of a tile for its whole lifetime on the board.
pub type TileId = u32;

/// Maximum number of tiles resting in the collection after a transition completes.
pub const COLLECTION_CAPACITY: usize = 5;

/// Number of matching tiles that clear together.
pub const TRIO_SIZE: usize = 3;

/// Lives at the start of a full game.
pub const STARTING_LIVES: u32 = 3;

/// Countdown budget for level 1, in seconds.
pub const BASE_TIME_SECS: u32 = 40;

/// Extra countdown seconds granted per level above 1.
pub const TIME_PER_LEVEL_SECS: u32 = 10;

/// Countdown step in milliseconds.
pub const COUNTDOWN_TICK_MS: u32 = 1000;

/// Debounce window after an accepted selection.
pub const SELECTION_COOLDOWN_MS: u32 = 150;

/// How long removed trio ids stay in the animation marker.
pub const TRIO_ANIMATION_MS: u32 = 800;

/// Minimum visible area fraction for a tile to be selectable.
pub const FREE_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Trio base score at level 1.
pub const TRIO_BASE_SCORE: u32 = 100;

/// Trio score increase per level above 1.
pub const TRIO_LEVEL_BONUS: u32 = 50;

/// Flat bonus for clearing a level.
pub const VICTORY_BASE_BONUS: u32 = 1500;

/// Bonus per second left on the countdown when a level is cleared.
pub const VICTORY_TIME_BONUS: u32 = 75;

/// Victory bonus increase per level above 1.
pub const VICTORY_LEVEL_BONUS: u32 = 200;

/// Drawn tile width in pixels.
pub const TILE_DRAW_WIDTH: i32 = 55;

/// Drawn tile height in pixels.
pub const TILE_DRAW_HEIGHT: i32 = 70;

/// Gap between neighbouring tiles of the same layer.
pub const TILE_GAP: i32 = 8;

/// Occlusion hit-rectangle width (slightly larger than the drawn tile).
pub const TILE_HIT_WIDTH: i32 = 60;

/// Occlusion hit-rectangle height.
pub const TILE_HIT_HEIGHT: i32 = 75;

/// Vertical cascade per layer.
pub const LAYER_OFFSET: i32 = 20;

/// Width of the viewport the board is centered in.
pub const VIEWPORT_WIDTH: i32 = 400;

/// Height of the viewport the board is centered in.
pub const VIEWPORT_HEIGHT: i32 = 300;

/// Minimum margin between the viewport edge and the board.
pub const VIEWPORT_MIN_MARGIN: i32 = 20;

/// Tile budget growth per level past the table.
pub const EXTRA_TILES_PER_LEVEL: u32 = 24;

/// Layer growth per level past the table.
pub const EXTRA_LAYERS_PER_LEVEL: u32 = 1;

/// Fixed image palette. Trio group `i` uses entry `i % CARD_IMAGES.len()`.
pub const CARD_IMAGES: [&str; 10] = [
    "/images/jessepollak1.jpg",
    "/images/pepe2.png",
    "/images/toshi3.jpg",
    "/images/pudgypenguins4.png",
    "/images/popcat5.jpg",
    "/images/boop6.jpg",
    "/images/bonk7.png",
    "/images/chillguy8.png",
    "/images/brianarmstrong9.png",
    "/images/cypher10.jpg",
];

/// Image identity of a tile. Tiles sharing an `ImageId` are the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u8);

impl ImageId {
    /// Identity used by trio group `group`, cycling through the palette.
    pub fn for_group(group: usize) -> Self {
        Self((group % CARD_IMAGES.len()) as u8)
    }

    /// Image url of this identity.
    ///
    /// ```
    /// use base_stack_types::ImageId;
    ///
    /// assert_eq!(ImageId(1).url(), "/images/pepe2.png");
    /// assert_eq!(ImageId::for_group(11), ImageId(1));
    /// ```
    pub fn url(&self) -> &'static str {
        CARD_IMAGES[self.0 as usize % CARD_IMAGES.len()]
    }

    /// Reverse lookup from an image url.
    pub fn from_url(url: &str) -> Option<Self> {
        CARD_IMAGES
            .iter()
            .position(|&u| u == url)
            .map(|i| Self(i as u8))
    }
}

/// Board generation parameters for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelConfig {
    pub width: u8,
    pub height: u8,
    pub layers: u8,
    pub total_tiles: u32,
}

/// Predefined configurations for levels 1..=10.
pub const LEVEL_TABLE: [LevelConfig; 10] = [
    LevelConfig { width: 3, height: 3, layers: 2, total_tiles: 18 },
    LevelConfig { width: 4, height: 4, layers: 3, total_tiles: 30 },
    LevelConfig { width: 4, height: 4, layers: 4, total_tiles: 36 },
    LevelConfig { width: 4, height: 4, layers: 5, total_tiles: 48 },
    LevelConfig { width: 4, height: 4, layers: 6, total_tiles: 66 },
    LevelConfig { width: 4, height: 4, layers: 7, total_tiles: 84 },
    LevelConfig { width: 4, height: 4, layers: 8, total_tiles: 108 },
    LevelConfig { width: 4, height: 4, layers: 9, total_tiles: 135 },
    LevelConfig { width: 4, height: 4, layers: 10, total_tiles: 165 },
    LevelConfig { width: 4, height: 4, layers: 11, total_tiles: 198 },
];

impl LevelConfig {
    /// Configuration for a 1-based level number. Level 0 is treated as level 1.
    ///
    /// ```
    /// use base_stack_types::LevelConfig;
    ///
    /// let c = LevelConfig::for_level(12);
    /// assert_eq!(c.layers, 13);
    /// assert_eq!(c.total_tiles, 198 + 48);
    /// ```
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let table_len = LEVEL_TABLE.len() as u32;
        if level <= table_len {
            return LEVEL_TABLE[(level - 1) as usize];
        }

        let last = LEVEL_TABLE[LEVEL_TABLE.len() - 1];
        let extra = level - table_len;
        let layers = (last.layers as u32)
            .saturating_add(extra.saturating_mul(EXTRA_LAYERS_PER_LEVEL))
            .min(u8::MAX as u32) as u8;
        let total = last
            .total_tiles
            .saturating_add(extra.saturating_mul(EXTRA_TILES_PER_LEVEL));

        Self {
            width: last.width,
            height: last.height,
            layers,
            total_tiles: round_to_multiple_of_three(total),
        }
    }

    /// Number of cells in the base layer.
    pub fn footprint(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Number of tiles the layer stack can hold.
    pub fn capacity(&self) -> u32 {
        self.footprint() * self.layers as u32
    }
}

fn round_to_multiple_of_three(n: u32) -> u32 {
    match n % 3 {
        0 => n,
        1 => n - 1,
        _ => n + 1,
    }
}

/// Countdown budget for a level: `BASE_TIME_SECS + TIME_PER_LEVEL_SECS * (level - 1)`.
pub fn level_time_budget_secs(level: u32) -> u32 {
    BASE_TIME_SECS + TIME_PER_LEVEL_SECS * level.max(1).saturating_sub(1)
}

/// Session phase.
///
/// `Idle` is the menu, `LoseLife` is the retry screen and `GameOver` is terminal
/// until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Victory,
    LoseLife,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Victory => "victory",
            Phase::LoseLife => "lose_life",
            Phase::GameOver => "game_over",
        }
    }
}

/// Why a life was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoseReason {
    /// No legal selection can ever complete a trio.
    NoMovesLeft,
    /// Countdown reached zero.
    TimeUp,
}

impl LoseReason {
    /// Message shown on the retry screen.
    pub fn message(&self) -> &'static str {
        match self {
            LoseReason::NoMovesLeft => "No moves left!",
            LoseReason::TimeUp => "Time ran out!",
        }
    }
}

/// Player intents accepted by the session.
///
/// These come from the presentation layer (tile clicks, power-up buttons,
/// screen buttons) or from the autoplay bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Start a new game from the menu
    Start,
    /// Click on a board tile
    SelectTile(TileId),
    /// One-shot freeze power-up
    FreezeTime,
    /// One-shot hint power-up
    Hint,
    /// Continue after a cleared level
    NextLevel,
    /// Replay the current level after losing a life
    Retry,
    /// Back to the menu ("play again")
    Reset,
}

impl GameAction {
    /// Parse an action name (case-insensitive). `SelectTile` needs a tile id.
    ///
    /// ```
    /// use base_stack_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_name("select", Some(4)), Some(GameAction::SelectTile(4)));
    /// assert_eq!(GameAction::from_name("select", None), None);
    /// assert_eq!(GameAction::from_name("nextLevel", None), Some(GameAction::NextLevel));
    /// ```
    pub fn from_name(s: &str, tile_id: Option<TileId>) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "start" => Some(GameAction::Start),
            "select" | "selecttile" => tile_id.map(GameAction::SelectTile),
            "freeze" | "freezetime" => Some(GameAction::FreezeTime),
            "hint" => Some(GameAction::Hint),
            "nextlevel" => Some(GameAction::NextLevel),
            "retry" => Some(GameAction::Retry),
            "reset" => Some(GameAction::Reset),
            _ => None,
        }
    }

    /// camelCase name used by the adapter protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Start => "start",
            GameAction::SelectTile(_) => "select",
            GameAction::FreezeTime => "freeze",
            GameAction::Hint => "hint",
            GameAction::NextLevel => "nextLevel",
            GameAction::Retry => "retry",
            GameAction::Reset => "reset",
        }
    }
}

/// Events emitted by the session while processing actions and ticks.
///
/// The host layer drains them to notify the platform (`Ready`, `GameOver`,
/// `Haptic`); the rest are informational for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A level board is ready to play.
    Ready { level: u32 },
    /// A trio left the collection.
    TrioCleared {
        image: ImageId,
        tiles: [TileId; TRIO_SIZE],
        points: u32,
    },
    /// The level was cleared.
    LevelComplete { level: u32, score: u32, bonus: u32 },
    /// A life was lost but the game goes on.
    LifeLost { reason: LoseReason, lives_left: u32 },
    /// No lives left.
    GameOver { final_score: u32 },
    /// Haptic pulse request (sent on victory).
    Haptic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_budgets_match_original_values() {
        let totals: Vec<u32> = LEVEL_TABLE.iter().map(|c| c.total_tiles).collect();
        assert_eq!(totals, vec![18, 30, 36, 48, 66, 84, 108, 135, 165, 198]);
        assert!(LEVEL_TABLE.iter().all(|c| c.total_tiles % 3 == 0));
    }

    #[test]
    fn level_config_extrapolates_past_table() {
        let c11 = LevelConfig::for_level(11);
        assert_eq!(c11.width, 4);
        assert_eq!(c11.height, 4);
        assert_eq!(c11.layers, 12);
        assert_eq!(c11.total_tiles, 222);

        let c15 = LevelConfig::for_level(15);
        assert_eq!(c15.layers, 16);
        assert_eq!(c15.total_tiles, 198 + 24 * 5);
    }

    #[test]
    fn level_zero_behaves_like_level_one() {
        assert_eq!(LevelConfig::for_level(0), LEVEL_TABLE[0]);
        assert_eq!(level_time_budget_secs(0), BASE_TIME_SECS);
    }

    #[test]
    fn time_budget_grows_ten_seconds_per_level() {
        assert_eq!(level_time_budget_secs(1), 40);
        assert_eq!(level_time_budget_secs(2), 50);
        assert_eq!(level_time_budget_secs(10), 130);
    }

    #[test]
    fn image_ids_cycle_through_palette() {
        assert_eq!(ImageId::for_group(0), ImageId(0));
        assert_eq!(ImageId::for_group(9), ImageId(9));
        assert_eq!(ImageId::for_group(10), ImageId(0));
        assert_eq!(ImageId::from_url("/images/cypher10.jpg"), Some(ImageId(9)));
        assert_eq!(ImageId::from_url("/images/none.png"), None);
    }

    #[test]
    fn action_names_roundtrip() {
        for action in [
            GameAction::Start,
            GameAction::SelectTile(7),
            GameAction::FreezeTime,
            GameAction::Hint,
            GameAction::NextLevel,
            GameAction::Retry,
            GameAction::Reset,
        ] {
            assert_eq!(GameAction::from_name(action.as_str(), Some(7)), Some(action));
        }
        assert_eq!(GameAction::from_name("jump", None), None);
    }

    #[test]
    fn lose_reasons_have_messages() {
        assert_eq!(LoseReason::NoMovesLeft.message(), "No moves left!");
        assert_eq!(LoseReason::TimeUp.message(), "Time ran out!");
    }
}

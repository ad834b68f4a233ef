//! Snapshot module - read-only view of a session for observers
//!
//! A [`GameSnapshot`] is filled in place by `GameSession::snapshot_into`, so a
//! caller can keep one buffer alive across frames.

use arrayvec::ArrayVec;

use crate::board::{Rect, Tile};
use crate::types::{ImageId, LoseReason, Phase, TileId, TRIO_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSnapshot {
    pub id: TileId,
    pub image: ImageId,
    pub x: u8,
    pub y: u8,
    pub layer: u8,
    /// Drawn rectangle in viewport pixels.
    pub rect: Rect,
    pub free: bool,
}

impl From<&Tile> for TileSnapshot {
    fn from(value: &Tile) -> Self {
        Self {
            id: value.id,
            image: value.image,
            x: value.x,
            y: value.y,
            layer: value.layer,
            rect: value.draw_rect(),
            free: value.free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimerSnapshot {
    pub remaining_secs: u32,
    pub budget_secs: u32,
    pub running: bool,
    pub frozen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub level: u32,
    pub lives: u32,
    pub score: u32,
    pub final_score: Option<u32>,
    pub moves: u32,
    pub timer: TimerSnapshot,
    pub freeze_used: bool,
    pub hint_used: bool,
    pub selection_locked: bool,
    pub board: Vec<TileSnapshot>,
    pub collection: Vec<TileSnapshot>,
    pub animating: ArrayVec<TileId, TRIO_SIZE>,
    pub lose_reason: Option<LoseReason>,
    pub episode_id: u32,
    pub seed: u32,
}

impl GameSnapshot {
    /// Reset to the empty state, keeping vector allocations.
    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.level = 0;
        self.lives = 0;
        self.score = 0;
        self.final_score = None;
        self.moves = 0;
        self.timer = TimerSnapshot::default();
        self.freeze_used = false;
        self.hint_used = false;
        self.selection_locked = false;
        self.board.clear();
        self.collection.clear();
        self.animating.clear();
        self.lose_reason = None;
        self.episode_id = 0;
        self.seed = 0;
    }

    pub fn playable(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn lose_message(&self) -> Option<&'static str> {
        self.lose_reason.map(|r| r.message())
    }

    pub fn free_tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.board.iter().filter(|t| t.free).map(|t| t.id)
    }
}

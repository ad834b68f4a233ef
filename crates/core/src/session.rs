//! Session module - the match state machine
//!
//! [`GameSession`] owns the board, the collection, the countdown and the
//! per-game counters. Every player intent and every clock tick runs to
//! completion inside one call: a selection moves the tile, recomputes
//! occlusion, clears a trio, then checks victory and deadlock before
//! returning. Notifications for the host are queued as [`GameEvent`]s.
//!
//! Phases:
//!
//! ```text
//! Idle --start--> Playing --clear board--> Victory --next_level--> Playing
//!                    |
//!                    +--deadlock / time up--> LoseLife --retry--> Playing
//!                    |
//!                    +--last life lost--> GameOver
//! any --reset--> Idle
//! ```

use arrayvec::ArrayVec;
use tracing::debug;

use crate::board::Board;
use crate::collection::Collection;
use crate::countdown::{Countdown, CountdownStep};
use crate::generator::generate_board;
use crate::moves::{can_accept, has_legal_selection, is_full_deadlock, plan_hint};
use crate::rng::SimpleRng;
use crate::scoring::{trio_score, victory_bonus};
use crate::snapshot::{GameSnapshot, TileSnapshot, TimerSnapshot};
use crate::types::*;

/// Tunables of a session. Timings are measured on the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub seed: u32,
    /// Debounce after an accepted selection. 0 disables the debounce.
    pub selection_cooldown_ms: u32,
    /// Lifetime of the trio animation marker.
    pub animation_ms: u32,
}

impl SessionConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            selection_cooldown_ms: SELECTION_COOLDOWN_MS,
            animation_ms: TRIO_ANIMATION_MS,
        }
    }
}

/// Result of the hint power-up. Only `Applied` consumes the one-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOutcome {
    Applied { image: ImageId, taken: u8 },
    NoTiles,
    NoTrioAvailable,
    AlreadyUsed,
    NotPlaying,
}

impl HintOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, HintOutcome::Applied { .. })
    }

    /// Toast text for the presentation layer.
    pub fn message(&self) -> &'static str {
        match self {
            HintOutcome::Applied { .. } => "Trio removed",
            HintOutcome::NoTiles => "No tiles",
            HintOutcome::NoTrioAvailable => "No trio available",
            HintOutcome::AlreadyUsed => "Hint already used",
            HintOutcome::NotPlaying => "Not playing",
        }
    }
}

/// Result of the freeze power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeOutcome {
    Applied,
    AlreadyUsed,
    NotPlaying,
}

impl FreezeOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, FreezeOutcome::Applied)
    }

    pub fn message(&self) -> &'static str {
        match self {
            FreezeOutcome::Applied => "Time frozen!",
            FreezeOutcome::AlreadyUsed => "Freeze already used",
            FreezeOutcome::NotPlaying => "Not playing",
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    rng: SimpleRng,
    phase: Phase,
    level: u32,
    lives: u32,
    score: u32,
    /// Set when the game ends; frozen from then on.
    final_score: Option<u32>,
    /// Accepted selections in the current level.
    moves: u32,
    board: Board,
    collection: Collection,
    countdown: Countdown,
    freeze_used: bool,
    hint_used: bool,
    lose_reason: Option<LoseReason>,
    selection_in_flight: bool,
    last_selection_ms: u64,
    /// Ids of the last cleared trio (presentation only).
    animating: ArrayVec<TileId, TRIO_SIZE>,
    animation_started_ms: u64,
    /// Total milliseconds fed through `tick`.
    clock_ms: u64,
    /// Monotonic board id (increments on every generated or loaded board).
    episode_id: u32,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a new session in the menu with the given RNG seed
    pub fn new(seed: u32) -> Self {
        Self::with_config(SessionConfig::with_seed(seed))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            rng: SimpleRng::new(config.seed),
            phase: Phase::Idle,
            level: 1,
            lives: STARTING_LIVES,
            score: 0,
            final_score: None,
            moves: 0,
            board: Board::empty(),
            collection: Collection::new(),
            countdown: Countdown::new(),
            freeze_used: false,
            hint_used: false,
            lose_reason: None,
            selection_in_flight: false,
            last_selection_ms: 0,
            animating: ArrayVec::new(),
            animation_started_ms: 0,
            clock_ms: 0,
            episode_id: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    /// Score to report to a leaderboard: the final score once the game is
    /// over, the running score otherwise.
    pub fn submission_score(&self) -> u32 {
        self.final_score.unwrap_or(self.score)
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    /// Seconds spent on the current level.
    pub fn elapsed_secs(&self) -> u32 {
        self.countdown.elapsed_secs()
    }

    pub fn freeze_used(&self) -> bool {
        self.freeze_used
    }

    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    pub fn lose_reason(&self) -> Option<LoseReason> {
        self.lose_reason
    }

    pub fn selection_locked(&self) -> bool {
        self.selection_in_flight
    }

    pub fn animating(&self) -> &[TileId] {
        &self.animating
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Events queued since the last drain.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.clear();
        out.phase = self.phase;
        out.level = self.level;
        out.lives = self.lives;
        out.score = self.score;
        out.final_score = self.final_score;
        out.moves = self.moves;
        out.timer = TimerSnapshot {
            remaining_secs: self.countdown.remaining_secs(),
            budget_secs: self.countdown.budget_secs(),
            running: self.countdown.running(),
            frozen: self.countdown.frozen(),
        };
        out.freeze_used = self.freeze_used;
        out.hint_used = self.hint_used;
        out.selection_locked = self.selection_in_flight;
        out.board
            .extend(self.board.tiles().iter().map(TileSnapshot::from));
        out.collection
            .extend(self.collection.tiles().iter().map(TileSnapshot::from));
        out.animating = self.animating.clone();
        out.lose_reason = self.lose_reason;
        out.episode_id = self.episode_id;
        out.seed = self.config.seed;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Start a new game from the menu at level 1.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }

        self.level = 1;
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.final_score = None;
        self.freeze_used = false;
        self.hint_used = false;
        self.begin_level();
        self.events.push(GameEvent::Ready { level: self.level });
        debug!(seed = self.config.seed, "game started");
        true
    }

    /// Continue after a cleared level. Score and lives carry over; the
    /// one-shot power-ups stay spent.
    pub fn next_level(&mut self) -> bool {
        if self.phase != Phase::Victory {
            return false;
        }
        self.level += 1;
        self.begin_level();
        debug!(level = self.level, "next level");
        true
    }

    /// Replay the current level on a fresh board after losing a life.
    pub fn retry_level(&mut self) -> bool {
        if self.phase != Phase::LoseLife {
            return false;
        }
        self.begin_level();
        debug!(level = self.level, lives = self.lives, "level retried");
        true
    }

    /// Back to the menu with all per-game state cleared ("play again").
    pub fn reset(&mut self) -> bool {
        self.countdown.clear();
        self.board.clear();
        self.collection.clear();
        self.phase = Phase::Idle;
        self.level = 1;
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.final_score = None;
        self.moves = 0;
        self.freeze_used = false;
        self.hint_used = false;
        self.lose_reason = None;
        self.release_selection();
        self.animating.clear();
        self.events.push(GameEvent::Ready { level: self.level });
        debug!("session reset");
        true
    }

    /// Replace the current level's board with a prepared layout.
    ///
    /// Used for puzzle layouts and replays. The collection is emptied and the
    /// countdown restarts with the level budget. Only valid while playing.
    pub fn load_board(&mut self, board: Board) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let mut board = board;
        board.recompute_free_status();
        self.install_board(board);
        true
    }

    fn begin_level(&mut self) {
        let board = generate_board(self.level, &mut self.rng);
        self.install_board(board);
    }

    fn install_board(&mut self, board: Board) {
        self.board = board;
        self.collection.clear();
        self.moves = 0;
        self.countdown.start(level_time_budget_secs(self.level));
        self.lose_reason = None;
        self.release_selection();
        self.animating.clear();
        self.episode_id = self.episode_id.wrapping_add(1);
        self.phase = Phase::Playing;
    }

    fn release_selection(&mut self) {
        self.selection_in_flight = false;
    }

    /// Click a tile. Stale, covered, debounced or rejected clicks are no-ops
    /// and return `false`.
    pub fn select_tile(&mut self, id: TileId) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        if self.selection_in_flight {
            return false;
        }

        let Some(tile) = self.board.get(id).copied() else {
            return false;
        };
        if !tile.free || !can_accept(&self.collection, tile.image) {
            return false;
        }

        let Some(tile) = self.board.take(id) else {
            return false;
        };
        let pushed = self.collection.push(tile);
        debug_assert!(pushed.is_ok(), "collection above five tiles");

        self.moves += 1;
        if self.config.selection_cooldown_ms > 0 {
            self.selection_in_flight = true;
            self.last_selection_ms = self.clock_ms;
        }

        self.board.recompute_free_status();
        self.resolve_after_move();
        true
    }

    /// One-shot freeze: the countdown keeps ticking but stops decrementing
    /// for the rest of the level.
    pub fn freeze_time(&mut self) -> FreezeOutcome {
        if self.phase != Phase::Playing {
            return FreezeOutcome::NotPlaying;
        }
        if self.freeze_used {
            return FreezeOutcome::AlreadyUsed;
        }

        self.freeze_used = true;
        self.countdown.freeze();
        debug!(remaining = self.countdown.remaining_secs(), "time frozen");
        FreezeOutcome::Applied
    }

    /// One-shot hint: move the board tiles that complete the most advanced
    /// trio into the collection, then resolve as for a selection.
    pub fn use_hint(&mut self) -> HintOutcome {
        if self.phase != Phase::Playing {
            return HintOutcome::NotPlaying;
        }
        if self.hint_used {
            return HintOutcome::AlreadyUsed;
        }
        if self.board.is_empty() {
            return HintOutcome::NoTiles;
        }
        let Some(plan) = plan_hint(&self.board, &self.collection) else {
            return HintOutcome::NoTrioAvailable;
        };

        let mut taken = 0u8;
        for &id in &plan.tiles {
            let Some(tile) = self.board.take(id) else {
                continue;
            };
            if let Err(tile) = self.collection.push(tile) {
                self.board.restore(tile);
                break;
            }
            taken += 1;
        }

        self.hint_used = true;
        self.board.recompute_free_status();
        debug!(image = plan.image.0, taken, "hint applied");
        self.resolve_after_move();
        HintOutcome::Applied {
            image: plan.image,
            taken,
        }
    }

    /// Trio, then victory, then deadlock.
    fn resolve_after_move(&mut self) {
        if let Some((image, tiles)) = self.collection.take_trio() {
            let points = trio_score(self.level);
            self.score = self.score.saturating_add(points);
            self.animating = ArrayVec::from(tiles);
            self.animation_started_ms = self.clock_ms;
            self.events.push(GameEvent::TrioCleared {
                image,
                tiles,
                points,
            });
        }

        if self.board.is_empty() && self.collection.is_empty() {
            self.win_level();
            return;
        }

        if is_full_deadlock(&self.board, &self.collection)
            || !has_legal_selection(&self.board, &self.collection)
        {
            self.lose_life(LoseReason::NoMovesLeft);
        }
    }

    fn win_level(&mut self) {
        self.countdown.stop();
        let bonus = victory_bonus(self.level, self.countdown.remaining_secs());
        self.score = self.score.saturating_add(bonus);
        self.phase = Phase::Victory;
        self.events.push(GameEvent::LevelComplete {
            level: self.level,
            score: self.score,
            bonus,
        });
        self.events.push(GameEvent::Haptic);
        debug!(level = self.level, score = self.score, bonus, "level cleared");
    }

    fn lose_life(&mut self, reason: LoseReason) {
        self.countdown.stop();
        self.lives = self.lives.saturating_sub(1);
        self.lose_reason = Some(reason);

        if self.lives == 0 {
            self.phase = Phase::GameOver;
            self.final_score = Some(self.score);
            self.events.push(GameEvent::GameOver {
                final_score: self.score,
            });
            debug!(score = self.score, reason = reason.message(), "game over");
        } else {
            self.phase = Phase::LoseLife;
            self.events.push(GameEvent::LifeLost {
                reason,
                lives_left: self.lives,
            });
            debug!(lives = self.lives, reason = reason.message(), "life lost");
        }
    }

    /// Advance the session clock.
    ///
    /// Releases the selection debounce, expires the trio animation marker and
    /// runs the countdown while playing. Returns whether anything observable
    /// changed.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms as u64);
        let mut changed = false;

        if self.selection_in_flight
            && self.clock_ms - self.last_selection_ms >= self.config.selection_cooldown_ms as u64
        {
            self.release_selection();
            changed = true;
        }

        if !self.animating.is_empty()
            && self.clock_ms - self.animation_started_ms >= self.config.animation_ms as u64
        {
            self.animating.clear();
            changed = true;
        }

        if self.phase == Phase::Playing {
            match self.countdown.advance(elapsed_ms) {
                CountdownStep::Unchanged => {}
                CountdownStep::Decremented => changed = true,
                CountdownStep::Expired => {
                    self.lose_life(LoseReason::TimeUp);
                    changed = true;
                }
            }
        }

        changed
    }

    /// Apply a player intent. Returns whether the state changed.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::Start => self.start(),
            GameAction::SelectTile(id) => self.select_tile(id),
            GameAction::FreezeTime => self.freeze_time().applied(),
            GameAction::Hint => self.use_hint().applied(),
            GameAction::NextLevel => self.next_level(),
            GameAction::Retry => self.retry_level(),
            GameAction::Reset => self.reset(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Geometry, Tile};

    fn tile(id: TileId, image: u8, x: u8, y: u8, layer: u8) -> Tile {
        Tile::new(id, ImageId(image), x, y, layer, Geometry::centered(4, 4))
    }

    /// Tiles on the base layer of a 4x4 grid, one per image in order.
    fn flat(images: &[u8]) -> Vec<Tile> {
        images
            .iter()
            .enumerate()
            .map(|(i, &image)| tile(i as TileId, image, (i % 4) as u8, (i / 4) as u8, 0))
            .collect()
    }

    fn no_cooldown() -> SessionConfig {
        SessionConfig {
            seed: 1,
            selection_cooldown_ms: 0,
            animation_ms: TRIO_ANIMATION_MS,
        }
    }

    fn playing_with(tiles: Vec<Tile>) -> GameSession {
        let mut game = GameSession::with_config(no_cooldown());
        assert!(game.start());
        assert!(game.load_board(Board::new(tiles)));
        game.drain_events().for_each(drop);
        game
    }

    #[test]
    fn test_new_session_is_idle() {
        let game = GameSession::new(12345);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.level(), 1);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.score(), 0);
        assert!(game.board().is_empty());
        assert!(!game.countdown().running());
    }

    #[test]
    fn test_start_generates_level_one() {
        let mut game = GameSession::new(12345);
        assert!(game.start());

        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.board().len(), 18);
        assert_eq!(game.time_remaining(), 40);
        assert!(game.countdown().running());
        assert_eq!(game.episode_id(), 1);
        assert_eq!(game.events(), &[GameEvent::Ready { level: 1 }]);
    }

    #[test]
    fn test_start_only_from_idle() {
        let mut game = GameSession::new(1);
        assert!(game.start());
        assert!(!game.start());
        assert_eq!(game.episode_id(), 1);
    }

    #[test]
    fn test_select_moves_tile_to_collection() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        assert!(game.select_tile(3));

        assert!(!game.board().contains(3));
        assert_eq!(game.collection().len(), 1);
        assert_eq!(game.collection().tiles()[0].id, 3);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn test_select_ignores_covered_tile() {
        let mut tiles = flat(&[0, 0, 0]);
        tiles.push(tile(3, 1, 0, 0, 1));
        let mut game = playing_with(tiles);

        assert!(!game.board().get(0).unwrap().free);
        assert!(!game.select_tile(0));
        assert_eq!(game.collection().len(), 0);
        assert_eq!(game.moves(), 0);

        // Uncovering makes it selectable
        assert!(game.select_tile(3));
        assert!(game.board().get(0).unwrap().free);
        assert!(game.select_tile(0));
    }

    #[test]
    fn test_select_ignores_unknown_tile() {
        let mut game = playing_with(flat(&[0, 0, 0]));
        assert!(!game.select_tile(42));
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_select_ignored_when_not_playing() {
        let mut game = GameSession::new(1);
        assert!(!game.select_tile(0));
    }

    #[test]
    fn test_selection_cooldown_debounces() {
        let mut game = GameSession::new(1);
        game.start();
        game.load_board(Board::new(flat(&[0, 0, 0, 1, 1, 1])));

        assert!(game.select_tile(0));
        assert!(game.selection_locked());
        assert!(!game.select_tile(3));

        game.tick(SELECTION_COOLDOWN_MS - 1);
        assert!(!game.select_tile(3));

        assert!(game.tick(1));
        assert!(!game.selection_locked());
        assert!(game.select_tile(3));
    }

    #[test]
    fn test_trio_clears_and_scores() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        assert!(game.select_tile(0));
        assert!(game.select_tile(1));
        assert_eq!(game.score(), 0);
        assert!(game.select_tile(2));

        assert_eq!(game.score(), 100);
        assert!(game.collection().is_empty());
        assert!(!game.board().contains(0));
        assert_eq!(game.animating(), &[0, 1, 2]);
        assert_eq!(
            game.events(),
            &[GameEvent::TrioCleared {
                image: ImageId(0),
                tiles: [0, 1, 2],
                points: 100,
            }]
        );
        assert_eq!(game.phase(), Phase::Playing);
    }

    #[test]
    fn test_animation_marker_clears_after_duration() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        for id in 0..3 {
            game.select_tile(id);
        }

        game.tick(TRIO_ANIMATION_MS - 1);
        assert_eq!(game.animating().len(), 3);
        game.tick(1);
        assert!(game.animating().is_empty());
        assert_eq!(game.score(), 100);
    }

    #[test]
    fn test_victory_when_board_and_collection_empty() {
        let mut game = playing_with(flat(&[4, 4, 4]));
        game.tick(5000);
        assert_eq!(game.time_remaining(), 35);

        for id in 0..3 {
            assert!(game.select_tile(id));
        }

        assert_eq!(game.phase(), Phase::Victory);
        assert_eq!(game.score(), 100 + 1500 + 75 * 35);
        assert!(!game.countdown().running());

        let events: Vec<GameEvent> = game.drain_events().collect();
        assert!(events.contains(&GameEvent::LevelComplete {
            level: 1,
            score: 100 + 1500 + 75 * 35,
            bonus: 1500 + 75 * 35,
        }));
        assert_eq!(events.last(), Some(&GameEvent::Haptic));

        // Timer stays stopped
        game.tick(10_000);
        assert_eq!(game.time_remaining(), 35);
    }

    #[test]
    fn test_full_collection_only_accepts_completing_tile() {
        let mut game = playing_with(flat(&[1, 1, 2, 3, 4, 5, 1]));
        for id in 0..5 {
            assert!(game.select_tile(id));
        }
        assert_eq!(game.collection().len(), 5);
        assert_eq!(game.phase(), Phase::Playing);

        assert!(!game.select_tile(5));
        assert!(game.board().contains(5));
        assert_eq!(game.moves(), 5);
        assert!(game.select_tile(6));
        assert_eq!(game.collection().len(), 3);
        assert_eq!(game.score(), 100);
    }

    #[test]
    fn test_full_deadlock_loses_life() {
        let mut game = playing_with(flat(&[1, 2, 3, 4, 5, 6, 7]));
        for id in 0..4 {
            assert!(game.select_tile(id));
        }
        assert_eq!(game.phase(), Phase::Playing);

        assert!(game.select_tile(4));
        assert_eq!(game.phase(), Phase::LoseLife);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.lose_reason(), Some(LoseReason::NoMovesLeft));
        assert!(!game.countdown().running());
        assert_eq!(
            game.events().last(),
            Some(&GameEvent::LifeLost {
                reason: LoseReason::NoMovesLeft,
                lives_left: 2,
            })
        );
    }

    #[test]
    fn test_deadlock_on_last_life_ends_game() {
        let mut game = playing_with(flat(&[1, 1, 1, 2, 3, 4, 5, 6, 7]));
        game.lives = 1;
        for id in 0..3 {
            game.select_tile(id);
        }
        let score = game.score();
        assert_eq!(score, 100);

        for id in 3..8 {
            game.select_tile(id);
        }

        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.final_score(), Some(score));
        assert_eq!(game.lives(), 0);
        assert!(!game.countdown().running());
        assert_eq!(
            game.events().last(),
            Some(&GameEvent::GameOver { final_score: score })
        );
    }

    #[test]
    fn test_buried_completing_tile_still_deadlocks() {
        let mut tiles = flat(&[1, 1, 2, 3, 4]);
        tiles.push(tile(5, 1, 2, 2, 0));
        tiles.push(tile(6, 8, 2, 2, 1));
        let mut game = playing_with(tiles);

        for id in 0..5 {
            game.select_tile(id);
        }
        assert_eq!(game.phase(), Phase::LoseLife);
        assert_eq!(game.lose_reason(), Some(LoseReason::NoMovesLeft));
    }

    #[test]
    fn test_timer_expiry_loses_life() {
        let mut game = GameSession::new(9);
        game.start();
        game.drain_events().for_each(drop);

        game.tick(39_999);
        assert_eq!(game.phase(), Phase::Playing);
        assert!(game.tick(1));

        assert_eq!(game.phase(), Phase::LoseLife);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.lose_reason(), Some(LoseReason::TimeUp));
        assert!(!game.countdown().running());
        assert_eq!(
            game.events(),
            &[GameEvent::LifeLost {
                reason: LoseReason::TimeUp,
                lives_left: 2,
            }]
        );
    }

    #[test]
    fn test_timer_expiry_on_last_life_ends_game() {
        let mut game = GameSession::new(9);
        game.start();
        game.lives = 1;
        game.score = 700;

        game.tick(40_000);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.final_score(), Some(700));
        assert_eq!(game.submission_score(), 700);
    }

    #[test]
    fn test_freeze_stops_countdown_for_rest_of_level() {
        let mut game = GameSession::new(3);
        assert_eq!(game.freeze_time(), FreezeOutcome::NotPlaying);

        game.start();
        game.tick(2000);
        assert_eq!(game.freeze_time(), FreezeOutcome::Applied);
        game.tick(60_000);
        assert_eq!(game.time_remaining(), 38);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.freeze_time(), FreezeOutcome::AlreadyUsed);
    }

    #[test]
    fn test_freeze_effect_clears_on_next_level_but_stays_spent() {
        let mut game = playing_with(flat(&[0, 0, 0]));
        assert!(game.apply_action(GameAction::FreezeTime));
        for id in 0..3 {
            game.select_tile(id);
        }
        assert_eq!(game.phase(), Phase::Victory);

        assert!(game.next_level());
        assert_eq!(game.level(), 2);
        assert_eq!(game.time_remaining(), 50);
        assert!(!game.countdown().frozen());
        assert!(game.freeze_used());
        assert_eq!(game.freeze_time(), FreezeOutcome::AlreadyUsed);

        game.tick(1000);
        assert_eq!(game.time_remaining(), 49);
    }

    #[test]
    fn test_next_level_keeps_score_and_lives() {
        let mut game = playing_with(flat(&[0, 0, 0]));
        game.lives = 2;
        for id in 0..3 {
            game.select_tile(id);
        }
        let score = game.score();

        assert!(game.apply_action(GameAction::NextLevel));
        assert_eq!(game.score(), score);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.board().len(), 30);
    }

    #[test]
    fn test_next_level_only_from_victory() {
        let mut game = GameSession::new(1);
        assert!(!game.next_level());
        game.start();
        assert!(!game.next_level());
        assert_eq!(game.level(), 1);
    }

    #[test]
    fn test_retry_regenerates_same_level() {
        let mut game = GameSession::new(5);
        game.start();
        let first_episode = game.episode_id();
        game.tick(40_000);
        assert_eq!(game.phase(), Phase::LoseLife);

        assert!(game.apply_action(GameAction::Retry));
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.level(), 1);
        assert_eq!(game.lives(), 2);
        assert_eq!(game.time_remaining(), 40);
        assert!(game.collection().is_empty());
        assert_eq!(game.board().len(), 18);
        assert_eq!(game.episode_id(), first_episode + 1);
        assert_eq!(game.lose_reason(), None);
    }

    #[test]
    fn test_retry_only_after_losing_life() {
        let mut game = GameSession::new(5);
        game.start();
        assert!(!game.retry_level());
    }

    #[test]
    fn test_hint_completes_most_collected_trio() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        game.select_tile(3);

        let outcome = game.use_hint();
        assert_eq!(
            outcome,
            HintOutcome::Applied {
                image: ImageId(1),
                taken: 2
            }
        );
        assert!(game.hint_used());
        assert!(game.collection().is_empty());
        assert_eq!(game.score(), 100);
        assert_eq!(game.board().len(), 3);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn test_hint_takes_covered_tiles() {
        let mut tiles = flat(&[0]);
        tiles.push(tile(1, 2, 0, 0, 1));
        tiles.push(tile(2, 0, 1, 0, 0));
        tiles.push(tile(3, 0, 2, 0, 0));
        let mut game = playing_with(tiles);
        assert!(!game.board().get(0).unwrap().free);

        assert!(game.use_hint().applied());
        assert!(!game.board().contains(0));
        assert_eq!(game.board().len(), 1);
        assert_eq!(game.phase(), Phase::Playing);
    }

    #[test]
    fn test_hint_without_candidates_is_not_consumed() {
        let mut game = playing_with(flat(&[0, 1, 2]));
        assert_eq!(game.use_hint(), HintOutcome::NoTrioAvailable);
        assert!(!game.hint_used());
        assert!(!game.apply_action(GameAction::Hint));
    }

    #[test]
    fn test_hint_is_one_shot() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        assert!(game.use_hint().applied());
        assert_eq!(game.use_hint(), HintOutcome::AlreadyUsed);
    }

    #[test]
    fn test_hint_requires_playing() {
        let mut game = GameSession::new(1);
        assert_eq!(game.use_hint(), HintOutcome::NotPlaying);
    }

    #[test]
    fn test_hint_can_win_level() {
        let mut game = playing_with(flat(&[3, 3, 3]));
        assert!(game.use_hint().applied());
        assert_eq!(game.phase(), Phase::Victory);
    }

    #[test]
    fn test_reset_returns_to_menu() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        game.select_tile(0);
        game.freeze_time();
        game.use_hint();
        game.tick(3000);

        assert!(game.apply_action(GameAction::Reset));
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.moves(), 0);
        assert!(!game.freeze_used());
        assert!(!game.hint_used());
        assert!(game.board().is_empty());
        assert!(game.collection().is_empty());
        assert!(!game.countdown().running());
        assert_eq!(game.events().last(), Some(&GameEvent::Ready { level: 1 }));

        assert!(game.start());
    }

    #[test]
    fn test_load_board_requires_playing() {
        let mut game = GameSession::new(1);
        assert!(!game.load_board(Board::new(flat(&[0, 0, 0]))));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut game = playing_with(flat(&[0, 0, 0, 1, 1, 1]));
        game.select_tile(0);
        let snap = game.snapshot();

        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.board.len(), 5);
        assert_eq!(snap.collection.len(), 1);
        assert_eq!(snap.collection[0].id, 0);
        assert_eq!(snap.moves, 1);
        assert_eq!(snap.timer.remaining_secs, 40);
        assert!(snap.timer.running);
        assert_eq!(snap.free_tile_ids().count(), 5);
        assert_eq!(snap.seed, 1);
    }

    #[test]
    fn test_same_seed_same_boards() {
        let mut a = GameSession::new(77);
        let mut b = GameSession::new(77);
        a.start();
        b.start();
        assert_eq!(a.board(), b.board());
    }
}

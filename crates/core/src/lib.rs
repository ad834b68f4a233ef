//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains the board generator, the occlusion computation and the
//! match state machine. It has **no dependencies** on rendering, networking, or
//! I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical boards and games
//! - **Testable**: Comprehensive unit tests for all game rules
//! - **Portable**: Can run in any environment (web host bridge, headless bot, benches)
//!
//! # Module Structure
//!
//! - [`board`]: Tiles, screen geometry and the board tile set
//! - [`generator`]: Level board generation (trio tokens, layered positions)
//! - [`occlusion`]: Visible-area computation and the `free` flag
//! - [`collection`]: Bounded staging area and trio extraction
//! - [`moves`]: Legal-move and deadlock analysis, hint planning
//! - [`countdown`]: Per-level countdown with freeze support
//! - [`scoring`]: Trio and victory score formulas
//! - [`session`]: The [`GameSession`] reducer tying everything together
//! - [`rng`]: Small LCG used for shuffling
//!
//! # Game Rules
//!
//! - Tiles are stacked on layers; a tile is **free** when at least half of it is
//!   visible under the tiles of higher layers
//! - Clicking a free tile moves it into the collection (5 slots)
//! - Three tiles of the same image in the collection clear as a trio
//! - A full collection only accepts tiles that complete a trio
//! - A level is won when the board and the collection are both empty
//! - Running out of moves or time costs a life; no lives left ends the game
//!
//! # Example
//!
//! ```
//! use base_stack_core::GameSession;
//! use base_stack_types::{GameAction, Phase};
//!
//! let mut game = GameSession::new(12345);
//! game.start();
//! assert_eq!(game.phase(), Phase::Playing);
//!
//! // Click the first free tile
//! let id = game.board().free_tiles().next().map(|t| t.id).unwrap();
//! assert!(game.apply_action(GameAction::SelectTile(id)));
//! assert_eq!(game.collection().len(), 1);
//! ```
//!
//! # Timing
//!
//! The session has no timers of its own. The host calls
//! [`GameSession::tick`](session::GameSession::tick) with the elapsed
//! milliseconds; the session accumulates them into the countdown, the selection
//! cool-down and the trio animation marker.

pub mod board;
pub mod collection;
pub mod countdown;
pub mod generator;
pub mod moves;
pub mod occlusion;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod snapshot;

pub use base_stack_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, Geometry, Rect, Tile};
pub use collection::Collection;
pub use countdown::{Countdown, CountdownStep};
pub use generator::{effective_config, generate_board};
pub use moves::{can_accept, has_legal_selection, is_full_deadlock, plan_hint, HintPlan};
pub use occlusion::{recompute_free_status, visible_fraction};
pub use rng::SimpleRng;
pub use scoring::{trio_score, victory_bonus};
pub use session::{FreezeOutcome, GameSession, HintOutcome, SessionConfig};
pub use snapshot::{GameSnapshot, TileSnapshot, TimerSnapshot};

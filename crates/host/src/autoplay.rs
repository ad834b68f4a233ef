//! Autoplay - pick the next click for the headless bot
//!
//! Candidates are free tiles the collection would accept. They are ranked by
//! how far their image already is in the collection, then by how many copies
//! are free right now, then by layer (clearing high tiles uncovers more).
//! The best candidate whose click does not cost a life wins; if every click
//! loses, the best-ranked one is returned anyway.

use crate::core::{can_accept, GameSession};
use crate::types::{GameAction, Phase, TileId};

/// Next tile to click, or `None` when nothing is clickable.
pub fn suggest_selection(session: &GameSession) -> Option<TileId> {
    if session.phase() != Phase::Playing || session.selection_locked() {
        return None;
    }

    let board = session.board();
    let collection = session.collection();

    let mut ranked: Vec<(usize, usize, u8, TileId)> = board
        .free_tiles()
        .filter(|t| can_accept(collection, t.image))
        .map(|t| {
            let collected = collection.count_image(t.image);
            let free_copies = board.free_tiles().filter(|o| o.image == t.image).count();
            (collected, free_copies, t.layer, t.id)
        })
        .collect();
    // Highest rank first; lowest id breaks ties.
    ranked.sort_by(|a, b| (b.0, b.1, b.2).cmp(&(a.0, a.1, a.2)).then(a.3.cmp(&b.3)));

    let safe = ranked.iter().find(|&&(_, _, _, id)| {
        let mut trial = session.clone();
        trial.select_tile(id) && !matches!(trial.phase(), Phase::LoseLife | Phase::GameOver)
    });

    safe.or(ranked.first()).map(|&(_, _, _, id)| id)
}

/// Next intent for an unattended player, covering menus and power-ups.
///
/// Uses the hint when no safe click exists and the hint is still available.
pub fn suggest_action(session: &GameSession) -> Option<GameAction> {
    match session.phase() {
        Phase::Idle => Some(GameAction::Start),
        Phase::Victory => Some(GameAction::NextLevel),
        Phase::LoseLife => Some(GameAction::Retry),
        Phase::GameOver => None,
        Phase::Playing => {
            if session.selection_locked() {
                return None;
            }
            if !session.hint_used() {
                let mut trial = session.clone();
                if trial.use_hint().applied() && trial.phase() != Phase::LoseLife {
                    let selection = suggest_selection(session);
                    let selection_safe = selection.is_some_and(|id| {
                        let mut probe = session.clone();
                        probe.select_tile(id)
                            && matches!(probe.phase(), Phase::Playing | Phase::Victory)
                    });
                    if !selection_safe {
                        return Some(GameAction::Hint);
                    }
                }
            }
            suggest_selection(session).map(GameAction::SelectTile)
        }
    }
}

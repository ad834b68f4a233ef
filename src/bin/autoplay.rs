//! Headless bot: plays games with the autoplay heuristic and logs results.
//!
//! Usage: `autoplay [games]`. Each game uses `BASE_STACK_SEED + n` as seed and
//! advances the clock by `BASE_STACK_TICK_MS` between clicks.

use anyhow::{Context, Result};
use tracing::{debug, info};

use base_stack::core::GameSession;
use base_stack::host::{dispatch, suggest_action, LoggingHost};
use base_stack::types::Phase;
use base_stack::{init_tracing, AppConfig};

/// Safety cap on loop iterations per game.
const MAX_STEPS: u32 = 200_000;

fn main() -> Result<()> {
    init_tracing();

    let games: u32 = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid game count: {arg}"))?,
        None => 1,
    };
    let config = AppConfig::from_env().context("invalid configuration")?;

    let mut best = 0u32;
    for n in 0..games {
        let mut session_config = config.session;
        session_config.seed = config.session.seed.wrapping_add(n);
        let mut session = GameSession::with_config(session_config);
        let mut host = LoggingHost;

        let mut steps = 0u32;
        while session.phase() != Phase::GameOver && steps < MAX_STEPS {
            steps += 1;
            if let Some(action) = suggest_action(&session) {
                let applied = session.apply_action(action);
                debug!(action = action.as_str(), applied, "bot");
            }
            session.tick(config.tick_ms);
            dispatch(&mut host, session.drain_events());
        }

        let score = session.submission_score();
        best = best.max(score);
        info!(
            game = n + 1,
            seed = session_config.seed,
            level = session.level(),
            score,
            steps,
            "game finished"
        );
    }

    info!(games, best, "done");
    Ok(())
}

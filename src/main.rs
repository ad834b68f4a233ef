//! Game host runner (default binary).
//!
//! Runs the session on a fixed-step loop and exposes it to a presentation
//! layer through the TCP adapter. Platform notifications and score
//! submissions go to the logging collaborators.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use base_stack::adapter::Adapter;
use base_stack::host::{LoggingHost, LoggingSubmitter};
use base_stack::{init_tracing, App, AppConfig};

fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(seed = config.session.seed, tick_ms = config.tick_ms, "starting");

    let Some(mut adapter) = Adapter::start_from_env()? else {
        info!("nothing to serve without the adapter, exiting");
        return Ok(());
    };
    info!(addr = %adapter.local_addr(), "waiting for a controller");

    let mut app = App::new(config.session, LoggingHost, LoggingSubmitter::default());
    let tick = Duration::from_millis(config.tick_ms as u64);
    let mut outbound = Vec::new();
    let mut last_tick = Instant::now();

    loop {
        while let Some(inbound) = adapter.try_recv() {
            app.handle_inbound(inbound, &mut outbound);
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick {
            last_tick = Instant::now();
            let elapsed_ms = u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX);
            app.step(elapsed_ms, &mut outbound);
        }

        for msg in outbound.drain(..) {
            adapter.send(msg);
        }

        let wait = tick.saturating_sub(last_tick.elapsed());
        thread::sleep(wait.min(Duration::from_millis(5)));
    }
}

//! Headless match-3 runner (default binary).
//!
//! With the adapter enabled, serves the engine to a remote controller over
//! TCP in real time. With `MATCH3_AI_DISABLED=1`, plays itself using the
//! hint finder for `MATCH3_AUTOPLAY_MOVES` moves and prints the final board.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use match3::adapter::{
    apply_command, build_observation, create_ack, create_error, Adapter, InboundPayload,
    OutboundMessage,
};
use match3::core::Engine;
use match3::types::{BoardConfig, TICK_MS};

const DEFAULT_AUTOPLAY_MOVES: u32 = 20;

/// Upper bound on simulated ticks per autoplay move
const MAX_TICKS_PER_MOVE: u32 = 10_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BoardConfig::from_env();
    info!(
        width = config.width,
        height = config.height,
        colors = config.item_variety,
        seed = config.seed,
        "starting engine"
    );

    let mut engine = Engine::new(&config)?;
    engine.start()?;

    match Adapter::start_from_env()? {
        Some(adapter) => serve(engine, adapter),
        None => {
            let moves = std::env::var("MATCH3_AUTOPLAY_MOVES")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_AUTOPLAY_MOVES);
            autoplay(engine, moves)
        }
    }
}

/// Real-time loop: apply remote commands, advance time, stream observations
fn serve(mut engine: Engine, mut adapter: Adapter) -> Result<()> {
    let tick = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();
    let mut obs_seq = 0u64;

    loop {
        while let Some(inbound) = adapter.try_recv() {
            match inbound.payload {
                InboundPayload::SnapshotRequest => {
                    obs_seq += 1;
                    let obs = build_observation(&engine.snapshot(), &[], obs_seq);
                    if let Ok(line) = serde_json::to_string(&obs) {
                        adapter.send(OutboundMessage::ToClient {
                            client_id: inbound.client_id,
                            line,
                        });
                    }
                }
                InboundPayload::Command(cmd) => {
                    debug!(client_id = inbound.client_id, seq = inbound.seq, ?cmd, "command");
                    let line = match apply_command(&mut engine, cmd) {
                        Ok(()) => serde_json::to_string(&create_ack(inbound.seq)),
                        Err(e) => serde_json::to_string(&create_error(inbound.seq, &e)),
                    };
                    if let Ok(line) = line {
                        adapter.send(OutboundMessage::ToClient {
                            client_id: inbound.client_id,
                            line,
                        });
                    }
                }
            }
        }

        let elapsed = last_tick.elapsed().as_millis().min(u32::MAX as u128) as u32;
        if elapsed >= TICK_MS {
            last_tick = Instant::now();
            if let Err(e) = engine.tick(elapsed) {
                error!(error = %e, code = e.code(), "engine stopped");
                engine.set_game_over();
            }
        }

        let events = engine.drain_events();
        if !events.is_empty() {
            obs_seq += 1;
            let obs = build_observation(&engine.snapshot(), &events, obs_seq);
            if let Ok(line) = serde_json::to_string(&obs) {
                adapter.send(OutboundMessage::Broadcast { line });
            }
        }

        std::thread::sleep(tick.saturating_sub(last_tick.elapsed()));
    }
}

/// Simulated-time self play driven by the hint finder
fn autoplay(mut engine: Engine, moves: u32) -> Result<()> {
    for _ in 0..moves {
        let mut ticks = 0;
        while engine.is_busy() && ticks < MAX_TICKS_PER_MOVE {
            engine.tick(TICK_MS)?;
            ticks += 1;
        }
        log_events(&mut engine);

        let Some(swap) = engine.suggest_swap() else {
            info!("no swap available, stopping");
            break;
        };
        info!(a = %swap.a, b = %swap.b, "autoplay swap");
        engine.request_swap(swap.a, swap.b);
    }

    engine.settle()?;
    log_events(&mut engine);

    let snapshot = engine.snapshot();
    info!(
        moves = snapshot.moves,
        potential = snapshot.potential,
        "autoplay finished"
    );
    print!("{}", engine.board());
    Ok(())
}

fn log_events(engine: &mut Engine) {
    for event in engine.drain_events() {
        debug!(?event, "board event");
    }
}

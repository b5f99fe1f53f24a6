//! Cairn Replay — recording a lockstep match and replaying it.
//!
//! Demonstrates:
//!   1. Running a tiny resource-gathering simulation for a few hundred turns
//!   2. Recording every turn, plus periodic digests, to a replay directory
//!   3. Replaying the log into a fresh simulation and verifying digests
//!   4. Replaying into a subtly different simulation to show divergence
//!
//! Run with:
//!   cargo run --example record_replay

use cairn::prelude::*;
use serde_json::json;

// ---- Match parameters --------------------------------------------------

const PLAYERS: u32 = 2;
const NUM_TURNS: u32 = 250;
const TURN_MS: u32 = 200;

// ---- Simulation: per-player food stockpiles ----------------------------

struct Granary {
    food: Vec<i64>,
    elapsed_ms: u64,
    /// Gather rate multiplier; any value other than 1 breaks determinism.
    rate: i64,
}

impl Granary {
    fn new(rate: i64) -> Self {
        Self {
            food: Vec::new(),
            elapsed_ms: 0,
            rate,
        }
    }
}

impl Simulation for Granary {
    fn bootstrap(&mut self, attributes: &ReplayAttributes) -> Result<(), SimulationError> {
        let players = attributes
            .get("players")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SimulationError::BootstrapFailed {
                reason: "missing player count".into(),
            })?;
        self.food = vec![0; players as usize];
        Ok(())
    }

    fn advance_turn(&mut self, len: TurnLength, cmds: &[Command]) -> Result<(), SimulationError> {
        for cmd in cmds {
            let amount = cmd.data.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
            let slot = self.food.get_mut(cmd.player.0 as usize).ok_or_else(|| {
                SimulationError::TurnFailed {
                    reason: format!("unknown player {}", cmd.player),
                }
            })?;
            *slot += amount * self.rate;
        }
        self.elapsed_ms += u64::from(len.0);
        Ok(())
    }

    fn compute_state_digest(&self, mode: DigestMode) -> Result<StateDigest, SimulationError> {
        let mut h = DigestHasher::new();
        h.write_u64(self.elapsed_ms);
        if !mode.is_quick() {
            for food in &self.food {
                h.write_u64(*food as u64);
            }
        }
        Ok(h.finish())
    }
}

/// Player `p` gathers on every turn divisible by `p + 2`.
fn orders(turn: u32) -> Vec<Command> {
    (0..PLAYERS)
        .filter(|p| turn % (p + 2) == 0)
        .map(|p| {
            Command::new(
                PlayerId(p),
                Payload::freeze(json!({"type": "gather", "amount": (turn % 7) + 1})),
            )
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut attributes = ReplayAttributes::new();
    attributes.insert("players", json!(PLAYERS));
    attributes.insert("map", json!("Mainland"));

    // ---- 1 + 2. Live run, recorded -------------------------------------

    let config = RecorderConfig {
        replay_root: std::env::temp_dir().join("cairn-replays"),
        active_mods: ["public"].into_iter().collect(),
        ..Default::default()
    };
    let mut live = Granary::new(1);
    live.bootstrap(&attributes)?;
    let mut recorder = ReplayRecorder::start_game(&config, attributes)?;
    for turn in 0..NUM_TURNS {
        let cmds = orders(turn);
        live.advance_turn(TurnLength(TURN_MS), &cmds)?;
        recorder.turn(TurnIndex(turn), TurnLength(TURN_MS), &cmds)?;
        if turn % 10 == 0 {
            recorder.hash(&live.compute_state_digest(DigestMode::Full)?, DigestMode::Full)?;
        } else {
            recorder.hash(&live.compute_state_digest(DigestMode::Quick)?, DigestMode::Quick)?;
        }
    }
    let directory = recorder
        .directory()
        .map(|d| d.to_path_buf())
        .ok_or("recorder has no directory")?;
    recorder.finish()?;
    let log = directory.join(cairn::replay::DEFAULT_LOG_FILE);
    println!("recorded {NUM_TURNS} turns to {}", log.display());

    // ---- 3. Faithful replay --------------------------------------------

    let player_config = PlayerConfig {
        active_mods: ["public"].into_iter().collect(),
        ..Default::default()
    };
    let mut player = ReplayPlayer::new(Granary::new(1), player_config.clone())?;
    player.load(&log)?;
    let summary = player.run()?;
    println!(
        "replay: {} turns, {} commands, {} digest checks, in sync: {}",
        summary.turns_played,
        summary.commands_applied,
        summary.digest_checks.len(),
        summary.in_sync()
    );
    assert!(summary.in_sync());
    assert_eq!(player.simulation().food, live.food);

    // ---- 4. Divergent replay -------------------------------------------

    let mut player = ReplayPlayer::new(Granary::new(2), player_config)?;
    player.load(&log)?;
    let summary = player.run()?;
    for check in summary.mismatches() {
        println!("divergence: {check}");
    }
    assert!(!summary.in_sync());

    Ok(())
}

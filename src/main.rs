//! Cosmic Archer headless runner
//!
//! Plays one scripted run at 60 fps: the archer stands still, auto-fires, and
//! always takes the first perk offered. Useful for soak-testing balance tables.
//!
//! ```text
//! cosmic-archer [--tuning PATH] [--seed N] [--dungeon N] [--seconds N] [--progress PATH]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cosmic_archer::dungeons::{DUNGEON_COUNT, dungeon_theme};
use cosmic_archer::persistence::{JsonFileStore, MemoryStore, ProgressStore};
use cosmic_archer::session::{FixedInput, Session};
use cosmic_archer::sim::{GamePhase, LogSink};
use cosmic_archer::{PerkCatalog, Tuning};

const FRAME_MS: f32 = 1000.0 / 60.0;

/// Plays one scripted Cosmic Archer run and prints a summary
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON balance table; the shipped defaults are used when omitted
    #[arg(long, value_name = "PATH")]
    tuning: Option<PathBuf>,
    /// RNG seed for the run
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Dungeon to play
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=DUNGEON_COUNT as i64)
    )]
    dungeon: u32,
    /// Simulated seconds before the run is exited
    #[arg(long, value_name = "SECONDS", default_value_t = 300.0)]
    seconds: f32,
    /// Progress file; progress is kept in memory when omitted
    #[arg(long, value_name = "PATH")]
    progress: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(t) => t,
            Err(e) => {
                log::error!("{}", e);
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let store: Box<dyn ProgressStore> = match &args.progress {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::default()),
    };

    let mut session = match Session::new(
        args.seed,
        tuning,
        PerkCatalog::standard(),
        args.dungeon,
        Box::new(FixedInput::default()),
        store,
    ) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    session.add_sink(Box::new(LogSink));

    let frames = (args.seconds * 1000.0 / FRAME_MS) as u64;
    for _ in 0..frames {
        if session.phase() == GamePhase::Drafting {
            if let Err(e) = session.select_perk(0) {
                log::warn!("Draft pick failed: {}", e);
            }
            continue;
        }
        session.frame(FRAME_MS);
        if session.is_over() {
            break;
        }
    }
    if !session.is_over() {
        session.exit();
    }

    let state = session.state();
    let p = &state.progression;
    let theme = dungeon_theme(p.current_dungeon);
    println!(
        "Cosmic Archer run (seed {}, dungeon {} {})",
        args.seed, theme.id, theme.name
    );
    println!("  outcome: {:?}", state.phase);
    println!("  time:    {:.1}s", state.duration_secs());
    println!("  stage:   {} ({} completed)", p.current_stage, p.stages_completed());
    println!("  level:   {}", p.level);
    println!("  kills:   {}", p.kill_count);
    println!("  score:   {}", p.score);
    println!("  tokens:  {}", p.pending_tokens);
    let stats = state.player.stats;
    println!("  health:  {:.0}/{:.0}", stats.health, stats.max_health);
    let mut perks: Vec<_> = state.player.applied_perks.iter().copied().collect();
    perks.sort_unstable();
    println!("  perks:   {}", perks.join(", "));

    ExitCode::SUCCESS
}

//! Run orchestration
//!
//! A `Session` owns one run plus the services injected at startup: where
//! movement comes from, who hears about events, and where progress is kept.
//! The simulation itself only sees `GameState`.

use glam::Vec2;

use crate::dungeons::DUNGEON_COUNT;
use crate::perks::PerkCatalog;
use crate::persistence::{GameProgress, ProgressStore, RunSummary};
use crate::sim::{EventSink, GamePhase, GameState, SelectPerkError, TickInput, tick};
use crate::tuning::{ConfigError, Tuning};

/// Longest frame fed to the simulation (ms); longer hitches are clamped
pub const MAX_FRAME_MS: f32 = 100.0;

/// Supplies the normalized movement vector each frame
pub trait InputSource {
    fn movement(&mut self) -> Vec2;
}

/// Input that never changes
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedInput(pub Vec2);

impl InputSource for FixedInput {
    fn movement(&mut self) -> Vec2 {
        self.0
    }
}

/// One run and its collaborators
pub struct Session {
    state: GameState,
    input: Box<dyn InputSource>,
    sinks: Vec<Box<dyn EventSink>>,
    store: Box<dyn ProgressStore>,
    /// Run ended by an explicit exit
    exited: bool,
    /// Progress for the current run has been handed to the store
    reported: Option<RunSummary>,
}

impl Session {
    /// Validate the configuration and start a run.
    /// A bad configuration is fatal: no session is created.
    pub fn new(
        seed: u64,
        tuning: Tuning,
        catalog: PerkCatalog,
        dungeon: u32,
        input: Box<dyn InputSource>,
        store: Box<dyn ProgressStore>,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        if !(1..=DUNGEON_COUNT).contains(&dungeon) {
            return Err(ConfigError::Invalid {
                field: "dungeon".into(),
                reason: format!("must be 1..={}, got {}", DUNGEON_COUNT, dungeon),
            });
        }
        log::info!("Run starting: dungeon {}, seed {}", dungeon, seed);
        Ok(Self {
            state: GameState::with_config(seed, tuning, catalog, dungeon),
            input,
            sinks: Vec::new(),
            store,
            exited: false,
            reported: None,
        })
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for debug tooling and scripted scenarios
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// The run has ended (death, clear or exit)
    pub fn is_over(&self) -> bool {
        self.exited || self.state.phase.is_terminal()
    }

    /// Summary handed to the store when the run ended
    pub fn report(&self) -> Option<&RunSummary> {
        self.reported.as_ref()
    }

    /// Tokens collected and not yet claimed
    pub fn pending_tokens(&self) -> u32 {
        self.state.progression.pending_tokens
    }

    /// Hand the pending tokens to the wallet collaborator
    pub fn claim_tokens(&mut self) -> u32 {
        std::mem::take(&mut self.state.progression.pending_tokens)
    }

    /// Advance one rendered frame
    pub fn frame(&mut self, elapsed_ms: f32) {
        if self.is_over() {
            return;
        }
        let dt = elapsed_ms.clamp(0.0, MAX_FRAME_MS);
        let input = TickInput::moving(self.input.movement());
        tick(&mut self.state, &input, dt);
        self.dispatch();

        if self.state.phase.is_terminal() {
            self.finish();
        }
    }

    /// Pick draft choice `index` and resume
    pub fn select_perk(&mut self, index: usize) -> Result<&'static str, SelectPerkError> {
        let id = self.state.select_perk(index)?;
        self.dispatch();
        Ok(id)
    }

    /// Stop the run now; pools are discarded and progress is reported
    pub fn exit(&mut self) {
        if self.is_over() {
            return;
        }
        log::info!("Run exited at {:.1}s", self.state.duration_secs());
        self.state.end_run();
        self.exited = true;
        self.finish();
    }

    /// Fresh run in the same dungeon. A run still in progress is reported first.
    pub fn reset_game(&mut self) {
        self.abandon_live_run();
        self.state.reset();
        self.exited = false;
        self.reported = None;
    }

    /// Switch dungeon and start over. Locked or unknown dungeons are refused.
    pub fn select_dungeon(&mut self, dungeon: u32) -> bool {
        let progress = self.load_progress();
        if !progress.is_unlocked(dungeon) {
            log::warn!("Dungeon {} is locked", dungeon);
            return false;
        }
        self.abandon_live_run();
        self.state.progression.current_dungeon = dungeon;
        self.reset_game();
        true
    }

    /// Stored progress, or fresh progress if the store cannot be read
    pub fn load_progress(&mut self) -> GameProgress {
        match self.store.load() {
            Ok(progress) => progress,
            Err(e) => {
                log::error!("Failed to load progress: {}", e);
                GameProgress::default()
            }
        }
    }

    /// End a started, unreported run so its kills and tokens reach the totals
    fn abandon_live_run(&mut self) {
        if self.state.time_ms > 0.0 {
            self.exit();
        }
    }

    fn dispatch(&mut self) {
        for event in self.state.drain_events() {
            for sink in self.sinks.iter_mut() {
                sink.emit(&event);
            }
        }
    }

    /// Report the finished run exactly once
    fn finish(&mut self) {
        if self.reported.is_some() {
            return;
        }
        let p = &self.state.progression;
        let run = RunSummary {
            dungeon: p.current_dungeon,
            stages_completed: p.stages_completed(),
            score: p.score,
            duration_secs: self.state.duration_secs(),
            kills: p.kill_count,
            tokens: p.pending_tokens,
        };
        log::info!(
            "Run over: dungeon {}, {} stages, score {}, {:.1}s",
            run.dungeon,
            run.stages_completed,
            run.score,
            run.duration_secs
        );
        self.reported = Some(run);

        let mut progress = self.load_progress();
        progress.current_dungeon = run.dungeon;
        progress.record_run(&run);
        if let Err(e) = self.store.save(&progress) {
            log::error!("Failed to save progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, PersistenceError};
    use crate::sim::{EventLog, GameEvent};
    use crate::tuning::EnemyKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store shared with the test so saved progress can be inspected
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl ProgressStore for SharedStore {
        fn load(&mut self) -> Result<GameProgress, PersistenceError> {
            self.0.borrow_mut().load()
        }
        fn save(&mut self, progress: &GameProgress) -> Result<(), PersistenceError> {
            self.0.borrow_mut().save(progress)
        }
    }

    /// Every operation fails
    struct BrokenStore;

    impl ProgressStore for BrokenStore {
        fn load(&mut self) -> Result<GameProgress, PersistenceError> {
            Err(std::io::Error::other("disk gone").into())
        }
        fn save(&mut self, _: &GameProgress) -> Result<(), PersistenceError> {
            Err(std::io::Error::other("disk gone").into())
        }
    }

    #[derive(Clone, Default)]
    struct SharedLog(Rc<RefCell<EventLog>>);

    impl EventSink for SharedLog {
        fn emit(&mut self, event: &GameEvent) {
            self.0.borrow_mut().emit(event);
        }
    }

    fn session(dungeon: u32, store: Box<dyn ProgressStore>) -> Session {
        Session::new(
            5,
            Tuning::default(),
            PerkCatalog::standard(),
            dungeon,
            Box::new(FixedInput::default()),
            store,
        )
        .unwrap()
    }

    fn kill_player(s: &mut Session) {
        s.state.player.stats.health = 1.0;
        let p = s.state.player.pos;
        s.state.spawn_enemy(EnemyKind::Orc, p);
        s.frame(16.0);
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut tuning = Tuning::default();
        tuning.enemies.bat.cost = 0.0;
        let result = Session::new(
            1,
            tuning,
            PerkCatalog::standard(),
            1,
            Box::new(FixedInput::default()),
            Box::new(MemoryStore::default()),
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let result = Session::new(
            1,
            Tuning::default(),
            PerkCatalog::standard(),
            7,
            Box::new(FixedInput::default()),
            Box::new(MemoryStore::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_death_reported_once() {
        let store = SharedStore::default();
        let mut s = session(1, Box::new(store.clone()));
        s.state.progression.current_stage = 3;
        s.state.progression.score = 2100;
        s.state.progression.kill_count = 21;
        kill_player(&mut s);

        assert!(s.is_over());
        let report = *s.report().unwrap();
        assert_eq!(report.stages_completed, 2);
        s.frame(16.0);
        s.exit();

        let saved = store.0.borrow().progress.clone().unwrap();
        assert_eq!(saved.dungeons[&1].completed_stages, 2);
        assert_eq!(saved.dungeons[&1].best_score, 2100);
        // Reported once: totals not doubled
        assert_eq!(saved.total_kills, 21);
    }

    #[test]
    fn test_store_failures_do_not_escape() {
        let mut s = session(1, Box::new(BrokenStore));
        kill_player(&mut s);
        assert!(s.is_over());
        assert!(s.report().is_some());
        assert!(!s.select_dungeon(2));
    }

    #[test]
    fn test_exit_discards_pools() {
        let mut s = session(1, Box::new(MemoryStore::default()));
        s.state.spawn_enemy(EnemyKind::Bat, Vec2::ZERO);
        s.exit();
        assert!(s.is_over());
        assert!(s.state().enemies.is_empty());
        let t = s.state().time_ms;
        s.frame(16.0);
        assert_eq!(s.state().time_ms, t);
    }

    #[test]
    fn test_reset_game_is_idempotent() {
        let mut s = session(3, Box::new(MemoryStore::default()));
        for _ in 0..300 {
            s.frame(16.0);
        }
        s.reset_game();
        let first = format!("{:?}", s.state());
        s.reset_game();
        let second = format!("{:?}", s.state());
        assert_eq!(first, second);
        assert_eq!(s.state().progression.current_dungeon, 3);
        assert_eq!(s.state().time_ms, 0.0);
    }

    #[test]
    fn test_reset_reports_live_run() {
        let store = SharedStore::default();
        let mut s = session(1, Box::new(store.clone()));
        s.frame(16.0);
        s.state.progression.kill_count = 4;
        s.state.progression.add_tokens(3);
        s.reset_game();

        let saved = store.0.borrow().progress.clone().unwrap();
        assert_eq!(saved.total_kills, 4);
        assert_eq!(saved.total_tokens, 3);
        assert!(!s.is_over());
        assert!(s.report().is_none());

        // A fresh run with no time on it is not reported again
        s.reset_game();
        assert_eq!(store.0.borrow().progress.clone().unwrap().total_kills, 4);
    }

    #[test]
    fn test_switching_dungeon_reports_under_old_dungeon() {
        let store = SharedStore::default();
        let mut progress = GameProgress::default();
        progress.update_dungeon_progress(1, 5, 0, 0.0);
        store.0.borrow_mut().progress = Some(progress);

        let mut s = session(1, Box::new(store.clone()));
        s.state.progression.current_stage = 2;
        s.state.progression.score = 900;
        s.frame(16.0);
        assert!(s.select_dungeon(2));

        let saved = store.0.borrow().progress.clone().unwrap();
        assert_eq!(saved.dungeons[&1].best_score, 900);
        assert_eq!(saved.dungeons[&2].best_score, 0);
        assert_eq!(s.state().progression.current_dungeon, 2);
    }

    #[test]
    fn test_select_dungeon_requires_unlock() {
        let store = SharedStore::default();
        let mut s = session(1, Box::new(store.clone()));
        assert!(!s.select_dungeon(2));

        let mut progress = GameProgress::default();
        progress.update_dungeon_progress(1, 5, 0, 0.0);
        store.0.borrow_mut().progress = Some(progress);
        assert!(s.select_dungeon(2));
        assert_eq!(s.state().progression.current_dungeon, 2);
        assert!(!s.select_dungeon(3));
    }

    #[test]
    fn test_sinks_receive_events() {
        let log = SharedLog::default();
        let mut s = session(1, Box::new(MemoryStore::default()));
        s.add_sink(Box::new(log.clone()));
        let p = s.state.player.pos;
        s.state.spawn_enemy(EnemyKind::Bat, p + Vec2::new(150.0, 0.0));
        s.frame(16.0);
        assert!(log.0.borrow().events.contains(&GameEvent::Shot { projectiles: 1 }));
        assert!(s.state().events.is_empty());
    }

    #[test]
    fn test_claim_tokens() {
        let mut s = session(1, Box::new(MemoryStore::default()));
        s.state.progression.add_tokens(12);
        assert_eq!(s.pending_tokens(), 12);
        assert_eq!(s.claim_tokens(), 12);
        assert_eq!(s.pending_tokens(), 0);
    }
}

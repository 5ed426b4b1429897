//! Round controller: phase, countdown and the single-bubble spawn cycle.
//!
//! The controller is driven from outside with timestamps: `activate` /
//! `key_down` for input and `advance` for the passage of time. Both timers are
//! plain fields, so leaving the running phase drops them and nothing armed in
//! an earlier round can fire into a later one.

use crate::bubble::{entropy_seed, Bubble, BubbleSpawner};
use crate::clock::{Clock, Interval, Timeout};
use crate::config::{ConfigError, GameConfig, RestartPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    Intro,
    Running,
    Finished,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Running => "running",
            Phase::Finished => "finished",
        }
    }
}

/// What happened during an `activate` or `advance` call, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: Phase, to: Phase, at_ms: f64 },
    Tick { remaining_secs: u32, at_ms: f64 },
    BubbleSpawned { bubble: Bubble, forced_repeat: bool, at_ms: f64 },
    BubbleCleared { id: u64, at_ms: f64 },
}

/// Read-only view handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub round_secs: u32,
    pub bubble: Option<Bubble>,
    pub progress_pct: f64,
}

// Which timer fires next inside `advance`.
enum Due {
    Tick,
    BubbleTimeout,
}

pub struct Game {
    config: GameConfig,
    phase: Phase,
    remaining_secs: u32,
    bubble: Option<Bubble>,
    // Value of the most recent bubble, kept after it is cleared so the next
    // spawn can avoid repeating it.
    last_value: Option<u16>,
    spawner: BubbleSpawner,
    countdown: Option<Interval>,
    bubble_timeout: Option<Timeout>,
    round: u32,
}

impl Game {
    /// Build a game in the intro phase. The config is validated first; a zero
    /// tick or bubble lifetime would otherwise re-arm a timer at the same
    /// instant forever.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = BubbleSpawner::new(seed, config.avoid_repeat, config.max_spawn_attempts);
        Ok(Self {
            remaining_secs: config.round_secs,
            config,
            phase: Phase::Intro,
            bubble: None,
            last_value: None,
            spawner,
            countdown: None,
            bubble_timeout: None,
            round: 0,
        })
    }

    /// Game seeded from the platform entropy source.
    pub fn with_entropy(config: GameConfig) -> Result<Self, ConfigError> {
        Self::new(config, entropy_seed())
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn bubble(&self) -> Option<&Bubble> {
        self.bubble.as_ref()
    }

    /// Number of rounds started so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Share of the round still left, 100 at the start and 0 when time is up.
    pub fn progress_pct(&self) -> f64 {
        self.remaining_secs as f64 / self.config.round_secs.max(1) as f64 * 100.0
    }

    /// True while any timer is armed.
    pub fn has_pending_timers(&self) -> bool {
        self.countdown.is_some() || self.bubble_timeout.is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            round_secs: self.config.round_secs,
            bubble: self.bubble.clone(),
            progress_pct: self.progress_pct(),
        }
    }

    /// Keyboard entry point. Timers due up to `now_ms` are processed first so
    /// the key acts on the phase the player actually sees. Returns every event
    /// produced; an ignored key yields only the timer events (usually none).
    pub fn key_down(&mut self, code: &str, now_ms: f64) -> Vec<GameEvent> {
        let mut events = self.advance(now_ms);
        if code == self.config.activation_key {
            events.extend(self.activate(now_ms));
        }
        events
    }

    /// The activation key's effect in the current phase. A press while running
    /// does nothing.
    pub fn activate(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Intro => self.start_round(now_ms, &mut events),
            Phase::Running => {}
            Phase::Finished => {
                self.cancel_timers();
                self.remaining_secs = self.config.round_secs;
                if let Some(b) = self.bubble.take() {
                    events.push(GameEvent::BubbleCleared { id: b.id, at_ms: now_ms });
                }
                match self.config.restart {
                    RestartPolicy::Running => self.start_round(now_ms, &mut events),
                    RestartPolicy::Intro => self.set_phase(Phase::Intro, now_ms, &mut events),
                }
            }
        }
        events
    }

    /// Fire every timer due at or before `now_ms`, earliest first. When the
    /// countdown and the bubble timeout share a deadline the countdown goes
    /// first, so a round ending at that instant spawns nothing.
    pub fn advance(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(due) = self.next_due(now_ms) {
            match due {
                Due::Tick => self.on_tick(&mut events),
                Due::BubbleTimeout => self.on_bubble_timeout(&mut events),
            }
        }
        events
    }

    /// Same as [`Game::advance`] reading the time from `clock`.
    pub fn update(&mut self, clock: &dyn Clock) -> Vec<GameEvent> {
        self.advance(clock.now_ms())
    }

    /// Cancel all timers and drop the bubble. Used on unmount; the phase is
    /// left as is.
    pub fn teardown(&mut self) {
        self.cancel_timers();
        self.bubble = None;
        log::debug!("game torn down in phase {}", self.phase.as_str());
    }

    fn next_due(&self, now_ms: f64) -> Option<Due> {
        let tick = self.countdown.as_ref().filter(|c| c.is_due(now_ms)).map(|c| c.next_due_ms());
        let pop = self.bubble_timeout.as_ref().filter(|t| t.is_due(now_ms)).map(|t| t.due_ms());
        match (tick, pop) {
            (Some(t), Some(p)) if p < t => Some(Due::BubbleTimeout),
            (Some(_), _) => Some(Due::Tick),
            (None, Some(_)) => Some(Due::BubbleTimeout),
            (None, None) => None,
        }
    }

    fn start_round(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        self.cancel_timers();
        self.round += 1;
        self.remaining_secs = self.config.round_secs;
        self.set_phase(Phase::Running, now_ms, events);
        self.countdown = Some(Interval::start(now_ms, self.config.tick_ms_f64(), self.round));
        self.spawn_bubble(now_ms, events);
        log::info!("round {} started ({}s)", self.round, self.config.round_secs);
    }

    fn on_tick(&mut self, events: &mut Vec<GameEvent>) {
        let Some(countdown) = self.countdown.as_mut() else { return };
        let at_ms = countdown.fire();
        if countdown.round != self.round || self.phase != Phase::Running {
            // Armed for another round; should already have been dropped.
            self.countdown = None;
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        events.push(GameEvent::Tick { remaining_secs: self.remaining_secs, at_ms });
        if self.remaining_secs == 0 {
            self.finish_round(at_ms, events);
        }
    }

    fn on_bubble_timeout(&mut self, events: &mut Vec<GameEvent>) {
        let Some(timeout) = self.bubble_timeout.take() else { return };
        let at_ms = timeout.due_ms();
        if let Some(b) = self.bubble.take() {
            events.push(GameEvent::BubbleCleared { id: b.id, at_ms });
        }
        if timeout.round == self.round && self.phase == Phase::Running {
            self.spawn_bubble(at_ms, events);
        }
    }

    fn spawn_bubble(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        let spawned = self.spawner.spawn(self.last_value);
        if spawned.forced {
            log::debug!(
                "accepted repeated value {} after {} draws",
                spawned.bubble.value,
                spawned.attempts
            );
        }
        log::debug!(
            "bubble {} = {} at ({:.1}%, {:.1}%)",
            spawned.bubble.id,
            spawned.bubble.value,
            spawned.bubble.left_pct,
            spawned.bubble.top_pct
        );
        self.last_value = Some(spawned.bubble.value);
        self.bubble = Some(spawned.bubble.clone());
        self.bubble_timeout = Some(Timeout::after(
            now_ms,
            self.config.bubble_lifetime_ms_f64(),
            self.round,
        ));
        events.push(GameEvent::BubbleSpawned {
            bubble: spawned.bubble,
            forced_repeat: spawned.forced,
            at_ms: now_ms,
        });
    }

    fn finish_round(&mut self, at_ms: f64, events: &mut Vec<GameEvent>) {
        self.cancel_timers();
        if let Some(b) = self.bubble.take() {
            events.push(GameEvent::BubbleCleared { id: b.id, at_ms });
        }
        self.set_phase(Phase::Finished, at_ms, events);
        log::info!("round {} finished", self.round);
    }

    fn set_phase(&mut self, to: Phase, at_ms: f64, events: &mut Vec<GameEvent>) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        events.push(GameEvent::PhaseChanged { from, to, at_ms });
    }

    fn cancel_timers(&mut self) {
        self.countdown = None;
        self.bubble_timeout = None;
    }
}

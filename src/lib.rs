//! Bubble Reading core crate.
//!
//! A numbered bubble pops up somewhere on screen, the child reads it aloud,
//! and five seconds later it is replaced by another one until the round
//! countdown runs out. Game rules live in [`game`] and are plain Rust; the
//! [`web`] module is the thin browser shell exposed through `start_game()`.

use wasm_bindgen::prelude::*;

pub mod bubble;
pub mod clock;
pub mod config;
pub mod game;
pub mod render;
pub mod web;

pub use bubble::{Bubble, BubbleSpawner, Spawned};
pub use clock::{Clock, Interval, ManualClock, PerformanceClock, Timeout};
pub use config::{ConfigError, GameConfig, RestartPolicy};
pub use game::{Game, GameEvent, Phase, Snapshot};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Err only means a logger is already installed.
    #[cfg(target_arch = "wasm32")]
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Mount the game with the default (polished) settings.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::mount(GameConfig::default())
}

/// Mount the game with settings from a JSON object, e.g.
/// `{"preset": "simple", "root_id": "game"}`.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(json).inspect_err(|e| log::warn!("rejected config: {}", e))?;
    web::mount(config)
}

#[wasm_bindgen]
pub fn stop_game() {
    web::unmount();
}

/// `"intro"`, `"running"`, `"finished"`, or `"unmounted"`.
#[wasm_bindgen]
pub fn game_phase() -> String {
    web::current_phase()
        .map(Phase::as_str)
        .unwrap_or("unmounted")
        .to_string()
}

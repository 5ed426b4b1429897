//! Round configuration.
//!
//! The polished game and the "simple" classroom build differed in round length,
//! in where the activation key sends a finished round, and in whether a bubble
//! may repeat the previous number. Both live on as presets of one `GameConfig`.

use std::fmt;

/// Where the activation key leads once a round has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RestartPolicy {
    /// Straight into a fresh round.
    #[default]
    Running,
    /// Back to the intro panel; another press is needed to start.
    Intro,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Round length in whole seconds.
    pub round_secs: u32,
    /// Countdown period in milliseconds.
    pub tick_ms: u32,
    /// How long a bubble stays on screen before it is replaced.
    pub bubble_lifetime_ms: u32,
    pub restart: RestartPolicy,
    /// Redraw a bubble whose number matches the one it replaces.
    pub avoid_repeat: bool,
    /// Upper bound on draws per spawn when `avoid_repeat` is on.
    pub max_spawn_attempts: u32,
    /// `KeyboardEvent.code` of the activation key.
    pub activation_key: String,
    /// Id of the DOM element the game renders into (created if missing).
    pub root_id: String,
    /// Decorative background image, if any.
    pub background_url: Option<String>,
    /// Show the walking character while a round runs.
    pub walk_sprite: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::polished()
    }
}

impl GameConfig {
    pub const DEFAULT_ROUND_SECS: u32 = 30;
    pub const SIMPLE_ROUND_SECS: u32 = 300;
    pub const DEFAULT_BUBBLE_LIFETIME_MS: u32 = 5_000;
    pub const DEFAULT_MAX_SPAWN_ATTEMPTS: u32 = 10;

    /// The canonical game: 30 second rounds, restart straight into play, no
    /// back-to-back repeated numbers.
    pub fn polished() -> Self {
        Self {
            round_secs: Self::DEFAULT_ROUND_SECS,
            tick_ms: 1_000,
            bubble_lifetime_ms: Self::DEFAULT_BUBBLE_LIFETIME_MS,
            restart: RestartPolicy::Running,
            avoid_repeat: true,
            max_spawn_attempts: Self::DEFAULT_MAX_SPAWN_ATTEMPTS,
            activation_key: "Space".to_string(),
            root_id: "br-root".to_string(),
            background_url: Some("assets/background.webp".to_string()),
            walk_sprite: false,
        }
    }

    /// Five minute rounds, restart goes back to the intro, numbers may repeat.
    pub fn simple() -> Self {
        Self {
            round_secs: Self::SIMPLE_ROUND_SECS,
            restart: RestartPolicy::Intro,
            avoid_repeat: false,
            background_url: None,
            walk_sprite: true,
            ..Self::polished()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.bubble_lifetime_ms == 0 {
            return Err(ConfigError::ZeroLifetime);
        }
        if self.max_spawn_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.activation_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        Ok(())
    }

    /// Parse a partial JSON object over the defaults. `"preset": "simple"`
    /// switches the base to [`GameConfig::simple`] before the other keys apply.
    #[cfg(feature = "serde_json")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| ConfigError::Json("expected a JSON object".to_string()))?;

        let base = match obj.remove("preset") {
            None => Self::polished(),
            Some(serde_json::Value::String(name)) => match name.as_str() {
                "polished" => Self::polished(),
                "simple" => Self::simple(),
                other => return Err(ConfigError::UnknownPreset(other.to_string())),
            },
            Some(other) => return Err(ConfigError::UnknownPreset(other.to_string())),
        };

        // Overlay the provided keys onto the chosen preset.
        let mut merged = serde_json::to_value(&base).map_err(|e| ConfigError::Json(e.to_string()))?;
        if let Some(target) = merged.as_object_mut() {
            for (k, v) in obj.iter() {
                target.insert(k.clone(), v.clone());
            }
        }
        let cfg: Self = serde_json::from_value(merged).map_err(|e| ConfigError::Json(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    // Timer periods never go below 1ms so a timer cannot be re-armed at the
    // instant it fires.
    pub fn tick_ms_f64(&self) -> f64 {
        self.tick_ms.max(1) as f64
    }

    pub fn bubble_lifetime_ms_f64(&self) -> f64 {
        self.bubble_lifetime_ms.max(1) as f64
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Json(String),
    UnknownPreset(String),
    ZeroDuration,
    ZeroTick,
    ZeroLifetime,
    ZeroAttempts,
    EmptyKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "invalid config JSON: {}", msg),
            ConfigError::UnknownPreset(name) => write!(f, "unknown preset {}", name),
            ConfigError::ZeroDuration => f.write_str("round_secs must be at least 1"),
            ConfigError::ZeroTick => f.write_str("tick_ms must be at least 1"),
            ConfigError::ZeroLifetime => f.write_str("bubble_lifetime_ms must be at least 1"),
            ConfigError::ZeroAttempts => f.write_str("max_spawn_attempts must be at least 1"),
            ConfigError::EmptyKey => f.write_str("activation_key must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for wasm_bindgen::JsValue {
    fn from(err: ConfigError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_where_the_variants_did() {
        let p = GameConfig::polished();
        let s = GameConfig::simple();
        assert_eq!(p.round_secs, 30);
        assert_eq!(s.round_secs, 300);
        assert_eq!(p.restart, RestartPolicy::Running);
        assert_eq!(s.restart, RestartPolicy::Intro);
        assert!(p.avoid_repeat);
        assert!(!s.avoid_repeat);
        assert_eq!(p.bubble_lifetime_ms, s.bubble_lifetime_ms);
        assert_eq!(p.activation_key, "Space");
        assert!(!p.walk_sprite);
        assert!(s.walk_sprite);
    }

    #[test]
    fn timer_periods_never_reach_zero() {
        let c = GameConfig { tick_ms: 0, bubble_lifetime_ms: 0, ..GameConfig::default() };
        assert_eq!(c.tick_ms_f64(), 1.0);
        assert_eq!(c.bubble_lifetime_ms_f64(), 1.0);
        assert_eq!(GameConfig::default().bubble_lifetime_ms_f64(), 5_000.0);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut c = GameConfig::default();
        assert!(c.validate().is_ok());
        c.round_secs = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroDuration));
        let c = GameConfig { max_spawn_attempts: 0, ..GameConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::ZeroAttempts));
        let c = GameConfig { activation_key: "  ".into(), ..GameConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::EmptyKey));
        let c = GameConfig { bubble_lifetime_ms: 0, ..GameConfig::default() };
        assert_eq!(c.validate(), Err(ConfigError::ZeroLifetime));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_overlays_partial_fields() {
        let c = GameConfig::from_json(r#"{ "round_secs": 12, "restart": "intro" }"#).unwrap();
        assert_eq!(c.round_secs, 12);
        assert_eq!(c.restart, RestartPolicy::Intro);
        assert_eq!(c.bubble_lifetime_ms, 5_000);
        assert!(c.avoid_repeat);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_preset_selects_base() {
        let c = GameConfig::from_json(r#"{ "preset": "simple", "root_id": "game" }"#).unwrap();
        assert_eq!(c.round_secs, 300);
        assert!(!c.avoid_repeat);
        assert_eq!(c.root_id, "game");
        assert!(matches!(
            GameConfig::from_json(r#"{ "preset": "hard" }"#),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(GameConfig::from_json("[1,2]"), Err(ConfigError::Json(_))));
        assert!(matches!(GameConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert_eq!(
            GameConfig::from_json(r#"{ "round_secs": 0 }"#),
            Err(ConfigError::ZeroDuration)
        );
    }
}

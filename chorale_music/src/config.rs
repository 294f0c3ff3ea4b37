// Tunable constants for the composition engine.
//
// Every retry cap and probability the search and the progression driver use
// lives here, so tests can force exhaustion or suppress randomness without
// touching the algorithms. `EngineConfig::default()` reproduces the classic
// chorale settings; a JSON file passed to the CLI with `--config` may
// override any subset of fields (missing fields keep their defaults).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Voice search parameters (see beat.rs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whole-beat attempts before the chord is declared unworkable.
    pub max_beat_attempts: usize,
    /// Probability of skipping a neighbor tone in the bass. Each voice above
    /// subtracts `neighbor_skip_step`, so higher voices embellish more.
    pub neighbor_skip_base: f64,
    pub neighbor_skip_step: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_beat_attempts: 100,
            neighbor_skip_base: 0.6,
            neighbor_skip_step: 0.1,
        }
    }
}

impl SearchConfig {
    /// Chance that `voice_index` takes a neighbor tone when it is eligible.
    pub fn neighbor_chance(&self, voice_index: usize) -> f64 {
        let skip = self.neighbor_skip_base - self.neighbor_skip_step * voice_index as f64;
        (1.0 - skip).clamp(0.0, 1.0)
    }
}

/// Harmonic progression parameters (see progression.rs).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Chance per eligible beat of starting a modulation.
    pub modulation_chance: f64,
    /// Beats a pending modulation waits before the new key takes over.
    pub modulation_beats: u32,
    /// Chord draws allowed to find one in both keys before the pending
    /// modulation is dropped.
    pub max_modulation_attempts: usize,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        ProgressionConfig {
            modulation_chance: 0.05,
            modulation_beats: 2,
            max_modulation_attempts: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub beats_per_measure: usize,
    pub measures_per_phrase: usize,
}

impl Default for MeterConfig {
    fn default() -> Self {
        MeterConfig {
            beats_per_measure: 4,
            measures_per_phrase: 4,
        }
    }
}

impl MeterConfig {
    pub fn beats_per_phrase(&self) -> usize {
        self.beats_per_measure * self.measures_per_phrase
    }
}

/// All engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub progression: ProgressionConfig,
    pub meter: MeterConfig,
    /// Chord redraws allowed for a single beat before the song gives up.
    pub max_chord_draws: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search: SearchConfig::default(),
            progression: ProgressionConfig::default(),
            meter: MeterConfig::default(),
            max_chord_draws: 1000,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.search.max_beat_attempts, 100);
        assert_eq!(config.progression.max_modulation_attempts, 50);
        assert_eq!(config.progression.modulation_beats, 2);
        assert_eq!(config.meter.beats_per_phrase(), 16);
    }

    #[test]
    fn test_neighbor_chance_rises_with_voice() {
        let search = SearchConfig::default();
        assert!((search.neighbor_chance(0) - 0.4).abs() < 1e-9);
        assert!((search.neighbor_chance(3) - 0.7).abs() < 1e-9);
        let never = SearchConfig {
            neighbor_skip_base: 2.0,
            ..SearchConfig::default()
        };
        assert_eq!(never.neighbor_chance(3), 0.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"search": {"max_beat_attempts": 7}, "meter": {"beats_per_measure": 3}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.search.max_beat_attempts, 7);
        assert!((config.search.neighbor_skip_base - 0.6).abs() < 1e-9);
        assert_eq!(config.meter.beats_per_measure, 3);
        assert_eq!(config.meter.measures_per_phrase, 4);
        assert_eq!(config.max_chord_draws, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("chorale_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_chord_draws": 5}"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.max_chord_draws, 5);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let path = std::env::temp_dir().join(format!("chorale_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();
        let result = EngineConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}

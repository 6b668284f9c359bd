//! Application configuration, loaded from TOML.
//!
//! Every field has a default, so a partial file (or none at all) is fine:
//!
//! ```toml
//! [capture]
//! width = 800
//! height = 600
//!
//! [debounce]
//! window_ms = 1000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub particles: ParticleConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Like [`load`](Self::load) but falls back to defaults.  A missing file
    /// is silent; a malformed one is logged.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return AppConfig::default();
        }
        match Self::load(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("{:#}; using defaults", e);
                AppConfig::default()
            }
        }
    }
}

// ── [capture] ────────────────────────────────────────────────────────────────

/// Requested capture resolution.  The source may answer with a different size;
/// the board sizes itself to whatever it gets.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 480 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { width: default_width(), height: default_height() }
    }
}

// ── [detector] ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Hands beyond this many are dropped.
    #[serde(default = "default_max_num_hands")]
    pub max_num_hands: usize,
    /// Hands scoring below this are dropped.
    #[serde(default = "default_min_detection_confidence")]
    pub min_detection_confidence: f32,
    /// Passed through to detectors that track between frames.
    #[serde(default = "default_min_tracking_confidence")]
    pub min_tracking_confidence: f32,
    #[serde(default = "default_model_complexity")]
    pub model_complexity: u8,
}

fn default_max_num_hands() -> usize { 1 }
fn default_min_detection_confidence() -> f32 { 0.7 }
fn default_min_tracking_confidence() -> f32 { 0.5 }
fn default_model_complexity() -> u8 { 1 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_num_hands: default_max_num_hands(),
            min_detection_confidence: default_min_detection_confidence(),
            min_tracking_confidence: default_min_tracking_confidence(),
            model_complexity: default_model_complexity(),
        }
    }
}

// ── [debounce] ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DebounceConfig {
    /// A repeat of the current label is accepted again after this long.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_window_ms() -> u64 { 1500 }

impl DebounceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { window_ms: default_window_ms() }
    }
}

// ── [particles] ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ParticleConfig {
    #[serde(default = "default_max_particles")]
    pub max: usize,
    /// Chance of one new particle per display frame.
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f32,
    /// Opacity lost per display frame.
    #[serde(default = "default_fade_per_frame")]
    pub fade_per_frame: f32,
    #[serde(default = "default_size_range")]
    pub size_range: [f32; 2],
    /// Upward speed, pixels per frame.
    #[serde(default = "default_speed_range")]
    pub speed_range: [f32; 2],
}

fn default_max_particles() -> usize { 100 }
fn default_spawn_probability() -> f32 { 0.2 }
fn default_fade_per_frame() -> f32 { 0.02 }
fn default_size_range() -> [f32; 2] { [1.0, 5.0] }
fn default_speed_range() -> [f32; 2] { [0.5, 2.0] }

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max: default_max_particles(),
            spawn_probability: default_spawn_probability(),
            fade_per_frame: default_fade_per_frame(),
            size_range: default_size_range(),
            speed_range: default_speed_range(),
        }
    }
}

// ── [display] ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Target time per display frame.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    /// How long the glyph panel glows after a new label is accepted.
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,
}

fn default_frame_ms() -> u64 { 16 }
fn default_pulse_ms() -> u64 { 300 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { frame_ms: default_frame_ms(), pulse_ms: default_pulse_ms() }
    }
}

// ── [source] ─────────────────────────────────────────────────────────────────

/// Where landmarks come from.  No replay path means the keyboard simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub replay: Option<PathBuf>,
    /// Simulated detector latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

fn default_latency_ms() -> u64 { 30 }

impl Default for SourceConfig {
    fn default() -> Self {
        Self { replay: None, latency_ms: default_latency_ms() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c: AppConfig = toml::from_str("").unwrap();
        assert_eq!(c.capture.width, 640);
        assert_eq!(c.capture.height, 480);
        assert_eq!(c.debounce.window(), Duration::from_millis(1500));
        assert_eq!(c.particles.max, 100);
        assert_eq!(c.detector.max_num_hands, 1);
        assert!(c.source.replay.is_none());
        assert_eq!(c.source.latency_ms, 30);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let c: AppConfig = toml::from_str("[particles]\nmax = 40\n").unwrap();
        assert_eq!(c.particles.max, 40);
        assert_eq!(c.particles.spawn_probability, 0.2);
        assert_eq!(c.particles.fade_per_frame, 0.02);
    }

    #[test]
    fn replay_path_parses() {
        let c: AppConfig = toml::from_str("[source]\nreplay = \"frames.jsonl\"\n").unwrap();
        assert_eq!(c.source.replay, Some(PathBuf::from("frames.jsonl")));
        assert_eq!(c.source.latency_ms, 30);
    }

    #[test]
    fn missing_file_falls_back() {
        let c = AppConfig::load_or_default("/definitely/not/here.toml");
        assert_eq!(c.debounce.window_ms, 1500);
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(AppConfig::load("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn sample_config_matches_defaults() {
        let c: AppConfig = toml::from_str(include_str!("../../demos/gesture_board.toml")).unwrap();
        let d = AppConfig::default();
        assert_eq!(c.capture.width, d.capture.width);
        assert_eq!(c.detector.min_detection_confidence, d.detector.min_detection_confidence);
        assert_eq!(c.debounce.window_ms, d.debounce.window_ms);
        assert_eq!(c.particles.size_range, d.particles.size_range);
        assert_eq!(c.display.pulse_ms, d.display.pulse_ms);
        assert!(c.source.replay.is_none());
    }
}

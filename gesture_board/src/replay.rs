//! Replay recorded landmarks from a JSON Lines file.
//!
//! One line per frame, each an array of hands:
//!
//! ```text
//! [{"landmarks": [[0.5, 0.9, 0.0], …21 points…], "score": 0.97}]
//! []
//! ```
//!
//! Blank lines are skipped.  Every hand needs a `score`, and coordinates must
//! stay within `[-1, 2]`.  Playback loops at the end of the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hand_pose::{HandObservation, RawHand};

use crate::source::LandmarkSource;

pub struct ReplayLandmarkSource {
    path:    PathBuf,
    frames:  Vec<Vec<HandObservation>>,
    cursor:  usize,
    latency: Duration,
    open:    bool,
}

impl ReplayLandmarkSource {
    pub fn open<P: AsRef<Path>>(path: P, latency: Duration) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading replay {}", path.display()))?;
        let frames = parse_frames(&text)
            .with_context(|| format!("parsing replay {}", path.display()))?;
        Ok(ReplayLandmarkSource {
            path: path.to_path_buf(),
            frames,
            cursor: 0,
            latency,
            open: false,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Parse every non-blank line into one frame of hands.
pub fn parse_frames(text: &str) -> Result<Vec<Vec<HandObservation>>> {
    let mut frames = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: Vec<RawHand> = serde_json::from_str(line)
            .with_context(|| format!("line {}", n + 1))?;
        let hands = raw.into_iter()
            .map(HandObservation::try_from)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("line {}", n + 1))?;
        for hand in &hands {
            check_coordinates(hand).with_context(|| format!("line {}", n + 1))?;
        }
        frames.push(hands);
    }
    if frames.is_empty() {
        bail!("no frames");
    }
    Ok(frames)
}

/// Normalized coordinates a recording may carry.  Detectors report points a
/// little outside the frame; anything further out is a corrupt dump.
const COORD_RANGE: std::ops::RangeInclusive<f32> = -1.0..=2.0;

fn check_coordinates(hand: &HandObservation) -> Result<()> {
    for (i, l) in hand.landmarks.iter().enumerate() {
        if !COORD_RANGE.contains(&l.x) || !COORD_RANGE.contains(&l.y) {
            bail!("landmark {} at ({}, {}) is outside {:?}", i, l.x, l.y, COORD_RANGE);
        }
    }
    Ok(())
}

impl LandmarkSource for ReplayLandmarkSource {
    fn acquire(&mut self, width: u32, height: u32) -> Result<(u32, u32)> {
        self.open = true;
        Ok((width, height))
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn detect(&mut self) -> Result<Vec<HandObservation>> {
        if !self.open {
            bail!("replay {} is not open", self.path.display());
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame)
    }
}

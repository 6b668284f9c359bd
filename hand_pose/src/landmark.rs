//! Hand landmark model.
//!
//! A detector reports each hand as 21 keypoints in normalized image
//! coordinates (`x`, `y` in `0.0..=1.0`, origin top-left, `y` growing
//! downward).  Indexing follows the common 21-point hand convention:
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19        DIP
//!     4      6   10  14  18        PIP   (thumb: 4 = tip, 3 = IP)
//!      3     5    9  13  17        MCP
//!       2
//!        1
//!             0                    wrist
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of landmarks in one hand observation.
pub const LANDMARK_COUNT: usize = 21;

/// Anatomical landmark indices.
pub mod index {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;
}

/// Bone segments drawn by a skeleton overlay, as landmark index pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // thumb
    (0, 1), (1, 2), (2, 3), (3, 4),
    // index
    (0, 5), (5, 6), (6, 7), (7, 8),
    // middle
    (5, 9), (9, 10), (10, 11), (11, 12),
    // ring
    (9, 13), (13, 14), (14, 15), (15, 16),
    // pinky + palm edge
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One normalized hand keypoint.  `z` is carried through but ignored by the
/// classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    /// Planar distance to `other`, in normalized units.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Map to pixel coordinates on a `width` × `height` surface.
    pub fn to_pixel(&self, width: usize, height: usize) -> (i32, i32) {
        ((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand for one frame.
///
/// `confidence` is the detector's handedness/presence score, passed through
/// untouched; it says nothing about which gesture the hand is making.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub landmarks:  [Landmark; LANDMARK_COUNT],
    pub confidence: f32,
}

impl HandObservation {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT], confidence: f32) -> Self {
        HandObservation { landmarks, confidence }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &Landmark {
        &self.landmarks[idx]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RawHand: wire form used by JSON landmark dumps
// ════════════════════════════════════════════════════════════════════════════

/// A hand as it appears in a JSON landmark dump:
/// `{ "landmarks": [[x, y, z], …], "score": 0.97 }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawHand {
    pub landmarks: Vec<[f32; 3]>,
    /// Detector presence score; required.
    pub score: f32,
}

/// A [`RawHand`] that did not carry exactly [`LANDMARK_COUNT`] points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkCountError {
    pub found: usize,
}

impl fmt::Display for LandmarkCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} landmarks, found {}", LANDMARK_COUNT, self.found)
    }
}

impl std::error::Error for LandmarkCountError {}

impl TryFrom<RawHand> for HandObservation {
    type Error = LandmarkCountError;

    fn try_from(raw: RawHand) -> Result<Self, Self::Error> {
        if raw.landmarks.len() != LANDMARK_COUNT {
            return Err(LandmarkCountError { found: raw.landmarks.len() });
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (dst, [x, y, z]) in landmarks.iter_mut().zip(raw.landmarks) {
            *dst = Landmark { x, y, z };
        }
        Ok(HandObservation::new(landmarks, raw.score))
    }
}

impl From<&HandObservation> for RawHand {
    fn from(hand: &HandObservation) -> Self {
        RawHand {
            landmarks: hand.landmarks.iter().map(|l| [l.x, l.y, l.z]).collect(),
            score:     hand.confidence,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_ignores_z() {
        let a = Landmark { x: 0.0, y: 0.0, z: 5.0 };
        let b = Landmark { x: 0.3, y: 0.4, z: -5.0 };
        assert!((a.distance_2d(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn to_pixel_scales_by_surface() {
        let l = Landmark::new(0.5, 0.25);
        assert_eq!(l.to_pixel(640, 480), (320, 120));
    }

    #[test]
    fn raw_hand_with_21_points_converts() {
        let raw = RawHand { landmarks: vec![[0.1, 0.2, 0.3]; 21], score: 0.9 };
        let hand = HandObservation::try_from(raw).unwrap();
        assert_eq!(hand.confidence, 0.9);
        assert_eq!(hand.get(index::PINKY_TIP).z, 0.3);
    }

    #[test]
    fn raw_hand_with_wrong_count_is_rejected() {
        let raw = RawHand { landmarks: vec![[0.0; 3]; 20], score: 1.0 };
        let err = HandObservation::try_from(raw).unwrap_err();
        assert_eq!(err, LandmarkCountError { found: 20 });
    }

    #[test]
    fn raw_hand_without_score_is_rejected() {
        let json = format!("{{\"landmarks\": {}}}", serde_json::to_string(&vec![[0.5f32, 0.5, 0.0]; 21]).unwrap());
        let err = serde_json::from_str::<RawHand>(&json).unwrap_err();
        assert!(err.to_string().contains("score"));
    }

    #[test]
    fn connections_stay_in_range() {
        for &(a, b) in HAND_CONNECTIONS.iter() {
            assert!(a < LANDMARK_COUNT && b < LANDMARK_COUNT);
        }
    }
}

//! Rule-based pose classification.
//!
//! Five booleans and one distance are derived from the landmarks, then an
//! ordered rule table is scanned and the first match wins.  Anything that
//! falls through is [`GestureLabel::Unknown`].
//!
//! The thumb test compares tip and IP joint along `x` only, so it assumes one
//! hand laterality as seen by the camera.  A mirrored or left hand reads its
//! thumb the other way round.

use crate::landmark::{index, HandObservation};
use crate::label::GestureLabel;

/// Thumb-tip to index-tip distance below which the two count as touching.
pub const PINCH_THRESHOLD: f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// FingerFeatures
// ════════════════════════════════════════════════════════════════════════════

/// Geometric features the rules are written against.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FingerFeatures {
    pub thumb_open: bool,
    pub index:      bool,
    pub middle:     bool,
    pub ring:       bool,
    pub pinky:      bool,
    /// Thumb tip ↔ index tip, normalized units.
    pub pinch_distance: f32,
}

impl FingerFeatures {
    pub fn from_hand(hand: &HandObservation) -> Self {
        // Extended fingers point up the image, so the tip has the smaller y.
        let extended = |tip: usize, pip: usize| hand.get(tip).y < hand.get(pip).y;

        FingerFeatures {
            thumb_open: hand.get(index::THUMB_TIP).x < hand.get(index::THUMB_IP).x,
            index:      extended(index::INDEX_TIP,  index::INDEX_PIP),
            middle:     extended(index::MIDDLE_TIP, index::MIDDLE_PIP),
            ring:       extended(index::RING_TIP,   index::RING_PIP),
            pinky:      extended(index::PINKY_TIP,  index::PINKY_PIP),
            pinch_distance: hand.get(index::THUMB_TIP).distance_2d(hand.get(index::INDEX_TIP)),
        }
    }

    /// `[thumb, index, middle, ring, pinky]`.
    pub fn extended(&self) -> [bool; 5] {
        [self.thumb_open, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn pinched(&self) -> bool {
        self.pinch_distance < PINCH_THRESHOLD
    }

    /// Exact finger pattern: thumb, index, middle, ring, pinky.
    fn is(&self, pattern: [bool; 5]) -> bool {
        self.extended() == pattern
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rule table
// ════════════════════════════════════════════════════════════════════════════

/// One row of the decision table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub label:   GestureLabel,
    pub matches: fn(&FingerFeatures) -> bool,
}

fn thumbs_up(f: &FingerFeatures) -> bool       { f.is([true,  false, false, false, false]) }
fn peace_sign(f: &FingerFeatures) -> bool      { f.is([false, true,  true,  false, false]) }
fn open_hand(f: &FingerFeatures) -> bool       { f.is([true,  true,  true,  true,  true ]) }
fn rock_sign(f: &FingerFeatures) -> bool       { f.is([true,  true,  false, false, true ]) }
fn ok_sign(f: &FingerFeatures) -> bool         { f.pinched() && f.middle && f.ring && f.pinky }
fn writing_gesture(f: &FingerFeatures) -> bool { f.is([false, true,  false, false, false]) }

/// The pose rules in priority order.  Earlier rows shadow later ones.
pub static RULES: [Rule; 6] = [
    Rule { label: GestureLabel::ThumbsUp,       matches: thumbs_up },
    Rule { label: GestureLabel::PeaceSign,      matches: peace_sign },
    Rule { label: GestureLabel::OpenHand,       matches: open_hand },
    Rule { label: GestureLabel::RockSign,       matches: rock_sign },
    Rule { label: GestureLabel::OkSign,         matches: ok_sign },
    Rule { label: GestureLabel::WritingGesture, matches: writing_gesture },
];

/// First matching rule's label, or `Unknown`.
pub fn classify_features(features: &FingerFeatures, rules: &[Rule]) -> GestureLabel {
    rules.iter()
        .find(|r| (r.matches)(features))
        .map(|r| r.label)
        .unwrap_or(GestureLabel::Unknown)
}

/// Classify one hand.  Never fails: unmatched geometry is `Unknown`.
pub fn classify(hand: &HandObservation) -> GestureLabel {
    classify_features(&FingerFeatures::from_hand(hand), &RULES)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

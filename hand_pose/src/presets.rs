//! Canned hand geometries for each pose.
//!
//! Used by the keyboard simulator, the `pose_menu` explorer, and tests.  The
//! hand is drawn palm-on with the thumb on the left of the image, which is the
//! laterality the classifier's thumb test expects.

use crate::landmark::{HandObservation, Landmark, LANDMARK_COUNT};
use crate::label::GestureLabel;

const WRIST: Landmark = Landmark::new(0.50, 0.90);

// Finger columns: index, middle, ring, pinky.
const FINGER_X: [f32; 4] = [0.42, 0.50, 0.57, 0.64];

const MCP_Y: f32 = 0.62;
const PIP_Y: f32 = 0.52;
const EXT_DIP_Y: f32 = 0.45;
const EXT_TIP_Y: f32 = 0.38;
const FOLD_DIP_Y: f32 = 0.58;
const FOLD_TIP_Y: f32 = 0.60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    ThumbsUp,
    PeaceSign,
    OpenHand,
    RockSign,
    OkSign,
    WritingGesture,
    /// Closed fist; matches no rule.
    Fist,
}

impl Preset {
    pub fn all() -> [Preset; 7] {
        use Preset::*;
        [ThumbsUp, PeaceSign, OpenHand, RockSign, OkSign, WritingGesture, Fist]
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Fist => "Fist",
            other        => other.expected_label().name(),
        }
    }

    /// What [`classify`](crate::classify) returns for this geometry.
    pub fn expected_label(self) -> GestureLabel {
        match self {
            Preset::ThumbsUp       => GestureLabel::ThumbsUp,
            Preset::PeaceSign      => GestureLabel::PeaceSign,
            Preset::OpenHand       => GestureLabel::OpenHand,
            Preset::RockSign       => GestureLabel::RockSign,
            Preset::OkSign         => GestureLabel::OkSign,
            Preset::WritingGesture => GestureLabel::WritingGesture,
            Preset::Fist           => GestureLabel::Unknown,
        }
    }

    /// The preset that draws `label`, for the six poses and `Unknown`.
    pub fn for_label(label: GestureLabel) -> Option<Preset> {
        Preset::all().into_iter().find(|p| p.expected_label() == label)
    }

    pub fn landmarks(self) -> [Landmark; LANDMARK_COUNT] {
        match self {
            Preset::ThumbsUp       => hand(true,  [false, false, false, false]),
            Preset::PeaceSign      => hand(false, [true,  true,  false, false]),
            Preset::OpenHand       => hand(true,  [true,  true,  true,  true ]),
            Preset::RockSign       => hand(true,  [true,  false, false, true ]),
            Preset::WritingGesture => hand(false, [true,  false, false, false]),
            Preset::Fist           => hand(false, [false, false, false, false]),
            Preset::OkSign => {
                // Index curls down to meet the thumb tip.
                let mut l = hand(false, [false, true, true, true]);
                l[7] = Landmark::new(0.38, 0.58);
                l[8] = Landmark::new(0.36, 0.62);
                l[4] = Landmark::new(0.37, 0.63);
                l
            }
        }
    }

    pub fn observation(self, confidence: f32) -> HandObservation {
        HandObservation::new(self.landmarks(), confidence)
    }
}

/// Build a hand with the thumb open or tucked and each finger extended or
/// folded.
fn hand(thumb_open: bool, fingers: [bool; 4]) -> [Landmark; LANDMARK_COUNT] {
    let mut l = [Landmark::default(); LANDMARK_COUNT];
    l[0] = WRIST;

    // Thumb: an open thumb reaches left past its IP joint, a tucked one
    // folds back right across the palm.
    l[1] = Landmark::new(0.42, 0.82);
    l[2] = Landmark::new(0.37, 0.75);
    l[3] = Landmark::new(0.33, 0.70);
    l[4] = if thumb_open {
        Landmark::new(0.28, 0.66)
    } else {
        Landmark::new(0.40, 0.68)
    };

    for (f, (&x, &ext)) in FINGER_X.iter().zip(fingers.iter()).enumerate() {
        let base = 5 + f * 4;
        l[base]     = Landmark::new(x, MCP_Y);
        l[base + 1] = Landmark::new(x, PIP_Y);
        if ext {
            l[base + 2] = Landmark::new(x, EXT_DIP_Y);
            l[base + 3] = Landmark::new(x, EXT_TIP_Y);
        } else {
            l[base + 2] = Landmark::new(x - 0.01, FOLD_DIP_Y);
            l[base + 3] = Landmark::new(x - 0.01, FOLD_TIP_Y);
        }
    }
    l
}

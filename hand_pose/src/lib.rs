//! # hand_pose
//!
//! Static hand-pose classification from 21 normalized hand landmarks, as
//! produced by an off-the-shelf hand-landmark detector.
//!
//! ## Rule table
//!
//! Rules are tried top to bottom; the first match wins.
//!
//! | # | Thumb | Index | Middle | Ring | Pinky | Extra | Label |
//! |---|---|---|---|---|---|---|---|
//! | 1 | open | – | – | – | – | | 👍 Thumbs Up |
//! | 2 | – | up | up | – | – | | ✌️ Peace Sign |
//! | 3 | open | up | up | up | up | | ✋ Open Hand |
//! | 4 | open | up | – | – | up | | 🤟 Rock Sign |
//! | 5 | any | any | up | up | up | thumb tip ↔ index tip < 0.05 | 👌 OK Sign |
//! | 6 | – | up | – | – | – | | ✍️ Writing Gesture |
//! | – | | | | | | | ❓ Unknown gesture |
//!
//! "open" thumb means the thumb tip lies left of the thumb IP joint in image
//! space; "up" means the finger tip lies above its PIP joint.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{classify, presets::Preset, GestureLabel};
//!
//! let hand = Preset::PeaceSign.observation(0.93);
//! assert_eq!(classify(&hand), GestureLabel::PeaceSign);
//! ```

pub mod classify;
pub mod label;
pub mod landmark;
pub mod presets;

pub use classify::{classify, classify_features, FingerFeatures, Rule, PINCH_THRESHOLD, RULES};
pub use label::GestureLabel;
pub use landmark::{
    index, HandObservation, Landmark, LandmarkCountError, RawHand, HAND_CONNECTIONS, LANDMARK_COUNT,
};

//! # gesture_board
//!
//! Live hand-gesture board.  Hands come from a [`source::LandmarkSource`]
//! running on a worker thread; each detection is classified by the
//! `hand_pose` rules, debounced, counted, and shown with a skeleton overlay,
//! a label-colored background and rising particles.
//!
//! ## Display
//!
//! | Label | Background |
//! |---|---|
//! | Thumbs Up | `#003300` |
//! | Peace Sign | `#003366` |
//! | Open Hand | `#330000` |
//! | Rock Sign | `#330033` |
//! | OK Sign | `#003333` |
//! | Writing Gesture | `#333300` |
//! | anything else | `#1A1A2E` |
//!
//! Particles rise while a hand is shown and fade out otherwise.  A newly
//! accepted label flashes the glyph panel for 300 ms.
//!
//! ## Sources
//!
//! * (default): **Simulation**, the keyboard holds a preset pose in front of
//!   a virtual camera.
//! * `--replay <file.jsonl>`: **Replay**, recorded landmark frames, looped.
//!
//! ### Keys
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`6` | Thumbs Up, Peace, Open Hand, Rock, OK, Writing |
//! | `7` | Fist (classified Unknown) |
//! | `0` / `H` | Remove the hand |
//! | `C` | Camera on / off |
//! | `Q` / `Esc` | Quit |

pub mod config;
pub mod session;
pub mod palette;
pub mod particles;
pub mod source;
pub mod replay;
pub mod visualizer;
pub mod app;

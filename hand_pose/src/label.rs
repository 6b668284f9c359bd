//! Gesture labels and their display glyphs.

use std::fmt;

/// Everything the board can show.  The first six are hand poses produced by
/// [`classify`](crate::classify); the last three are session states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureLabel {
    ThumbsUp,
    PeaceSign,
    OpenHand,
    RockSign,
    OkSign,
    WritingGesture,
    /// A hand was seen but matched no rule.
    Unknown,
    /// The detector returned zero hands.
    NoHand,
    /// Capture is switched off.
    CameraOff,
}

impl GestureLabel {
    pub const COUNT: usize = 9;

    pub fn all() -> [GestureLabel; Self::COUNT] {
        use GestureLabel::*;
        [ThumbsUp, PeaceSign, OpenHand, RockSign, OkSign, WritingGesture, Unknown, NoHand, CameraOff]
    }

    /// The six recognisable poses, in rule order.
    pub fn poses() -> [GestureLabel; 6] {
        use GestureLabel::*;
        [ThumbsUp, PeaceSign, OpenHand, RockSign, OkSign, WritingGesture]
    }

    /// Dense index into per-label tables (`0..COUNT`).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp       => "Thumbs Up",
            GestureLabel::PeaceSign      => "Peace Sign",
            GestureLabel::OpenHand       => "Open Hand",
            GestureLabel::RockSign       => "Rock Sign",
            GestureLabel::OkSign         => "OK Sign",
            GestureLabel::WritingGesture => "Writing Gesture",
            GestureLabel::Unknown        => "Unknown gesture",
            GestureLabel::NoHand         => "No hand detected",
            GestureLabel::CameraOff      => "Camera Off",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp       => "👍",
            GestureLabel::PeaceSign      => "✌️",
            GestureLabel::OpenHand       => "✋",
            GestureLabel::RockSign       => "🤟",
            GestureLabel::OkSign         => "👌",
            GestureLabel::WritingGesture => "✍️",
            GestureLabel::Unknown        => "❓",
            GestureLabel::NoHand         => "🤚",
            GestureLabel::CameraOff      => "📷❌",
        }
    }

    /// True for the six hand poses.
    pub fn is_pose(self) -> bool {
        self.index() < GestureLabel::Unknown.index()
    }

    /// True when a hand is on screen, i.e. anything but `NoHand`/`CameraOff`.
    pub fn hand_present(self) -> bool {
        !matches!(self, GestureLabel::NoHand | GestureLabel::CameraOff)
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.name())
    }
}

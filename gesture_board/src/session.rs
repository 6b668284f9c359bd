//! Session state: debounce, tally, and what the board is currently showing.
//!
//! Classifications arrive many times a second.  [`Session::offer`] lets a
//! label through when it differs from the last accepted one, or when the same
//! label has been held for the debounce window.  Only accepted labels touch
//! the display or the counts.

use std::time::{Duration, Instant};

use hand_pose::GestureLabel;
use tracing::{info, trace};

// ════════════════════════════════════════════════════════════════════════════
// Debounce
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    /// Last accepted label and when it was accepted.
    last:   Option<(GestureLabel, Instant)>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Debounce { window, last: None }
    }

    pub fn admits(&self, label: GestureLabel, now: Instant) -> bool {
        match self.last {
            None => true,
            Some((prev, at)) => prev != label || now.saturating_duration_since(at) >= self.window,
        }
    }

    pub fn record(&mut self, label: GestureLabel, now: Instant) {
        self.last = Some((label, now));
    }

    /// Forget the last acceptance so the next offer always gets through.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last_label(&self) -> Option<GestureLabel> {
        self.last.map(|(l, _)| l)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tally
// ════════════════════════════════════════════════════════════════════════════

/// Per-label acceptance counts.  Lives for the whole process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: [u64; GestureLabel::COUNT],
}

impl Tally {
    pub fn increment(&mut self, label: GestureLabel) {
        self.counts[label.index()] += 1;
    }

    pub fn get(&self, label: GestureLabel) -> u64 {
        self.counts[label.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `👍: 3 | ✌️: 0 | … | Unknown: 1`, the six poses plus Unknown.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = GestureLabel::poses()
            .iter()
            .map(|&l| format!("{}: {}", l.glyph(), self.get(l)))
            .collect();
        parts.push(format!("Unknown: {}", self.get(GestureLabel::Unknown)));
        parts.join(" | ")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// Label shown on the board after an acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shown {
    pub label:      GestureLabel,
    pub confidence: f32,
    pub since:      Instant,
}

#[derive(Debug, Clone)]
pub struct Session {
    debounce: Debounce,
    tally:    Tally,
    shown:    Option<Shown>,
}

impl Session {
    pub fn new(window: Duration) -> Self {
        Session {
            debounce: Debounce::new(window),
            tally:    Tally::default(),
            shown:    None,
        }
    }

    /// Feed one classification.  Returns the label if it was accepted.
    pub fn offer(&mut self, label: GestureLabel, confidence: f32, now: Instant) -> Option<GestureLabel> {
        if !self.debounce.admits(label, now) {
            trace!(%label, "debounced");
            return None;
        }
        self.accept(label, confidence, now);
        Some(label)
    }

    /// Accept `label` regardless of the debounce window.
    pub fn force(&mut self, label: GestureLabel, confidence: f32, now: Instant) {
        self.accept(label, confidence, now);
    }

    fn accept(&mut self, label: GestureLabel, confidence: f32, now: Instant) {
        self.debounce.record(label, now);
        self.tally.increment(label);
        self.shown = Some(Shown { label, confidence, since: now });
        info!(%label, confidence = %format_confidence(confidence), count = self.tally.get(label), "gesture");
    }

    /// The next offer is accepted whatever it is.  What is on screen stays.
    pub fn reset_debounce(&mut self) {
        self.debounce.reset();
    }

    pub fn shown(&self) -> Option<&Shown> {
        self.shown.as_ref()
    }

    pub fn label(&self) -> Option<GestureLabel> {
        self.shown.map(|s| s.label)
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn debounce(&self) -> &Debounce {
        &self.debounce
    }

    /// `Confidence: 93.4%`, or `Confidence: --` before the first acceptance.
    pub fn confidence_text(&self) -> String {
        match self.shown {
            Some(s) => format!("Confidence: {}", format_confidence(s.confidence)),
            None    => "Confidence: --".to_string(),
        }
    }
}

/// Percentage with one decimal place.
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1500);

    fn make_session() -> Session {
        Session::new(WINDOW)
    }

    #[test]
    fn first_offer_is_accepted() {
        let mut s = make_session();
        let t0 = Instant::now();
        assert_eq!(s.offer(GestureLabel::ThumbsUp, 0.9, t0), Some(GestureLabel::ThumbsUp));
        assert_eq!(s.tally().get(GestureLabel::ThumbsUp), 1);
        assert_eq!(s.label(), Some(GestureLabel::ThumbsUp));
    }

    #[test]
    fn repeats_inside_window_count_once() {
        let mut s = make_session();
        let t0 = Instant::now();
        for ms in (0..1500).step_by(100) {
            s.offer(GestureLabel::PeaceSign, 0.8, t0 + Duration::from_millis(ms));
        }
        assert_eq!(s.tally().get(GestureLabel::PeaceSign), 1);
        assert_eq!(s.tally().total(), 1);
    }

    #[test]
    fn repeats_after_window_count_each_time() {
        let mut s = make_session();
        let t0 = Instant::now();
        for i in 0..4 {
            let at = t0 + WINDOW * i;
            assert!(s.offer(GestureLabel::OpenHand, 0.8, at).is_some());
        }
        assert_eq!(s.tally().get(GestureLabel::OpenHand), 4);
    }

    #[test]
    fn window_is_measured_from_last_acceptance() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.offer(GestureLabel::RockSign, 0.8, t0);
        // Rejected offers do not move the reference point.
        assert!(s.offer(GestureLabel::RockSign, 0.8, t0 + Duration::from_millis(1400)).is_none());
        assert!(s.offer(GestureLabel::RockSign, 0.8, t0 + Duration::from_millis(1500)).is_some());
    }

    #[test]
    fn change_of_label_is_accepted_immediately() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.offer(GestureLabel::ThumbsUp, 0.9, t0);
        assert!(s.offer(GestureLabel::OkSign, 0.9, t0 + Duration::from_millis(10)).is_some());
        assert!(s.offer(GestureLabel::ThumbsUp, 0.9, t0 + Duration::from_millis(20)).is_some());
        assert_eq!(s.tally().get(GestureLabel::ThumbsUp), 2);
    }

    #[test]
    fn rejected_offer_leaves_display_alone() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.offer(GestureLabel::ThumbsUp, 0.9, t0);
        s.offer(GestureLabel::ThumbsUp, 0.1, t0 + Duration::from_millis(5));
        assert_eq!(s.shown().map(|x| x.confidence), Some(0.9));
    }

    #[test]
    fn tally_sums_to_acceptances() {
        let mut s = make_session();
        let t0 = Instant::now();
        let labels = [
            GestureLabel::ThumbsUp, GestureLabel::ThumbsUp, GestureLabel::NoHand,
            GestureLabel::Unknown,  GestureLabel::Unknown,  GestureLabel::OkSign,
        ];
        let accepted = labels.iter().enumerate()
            .filter(|&(i, &l)| s.offer(l, 0.5, t0 + Duration::from_millis(i as u64)).is_some())
            .count() as u64;
        assert_eq!(accepted, 4);
        assert_eq!(s.tally().total(), accepted);
    }

    #[test]
    fn reset_lets_identical_label_through() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.offer(GestureLabel::PeaceSign, 0.9, t0);
        s.reset_debounce();
        assert!(s.offer(GestureLabel::PeaceSign, 0.9, t0 + Duration::from_millis(1)).is_some());
        assert_eq!(s.tally().get(GestureLabel::PeaceSign), 2);
    }

    #[test]
    fn reset_keeps_shown_label() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.force(GestureLabel::CameraOff, 0.0, t0);
        s.reset_debounce();
        assert_eq!(s.label(), Some(GestureLabel::CameraOff));
        assert_eq!(s.debounce().last_label(), None);
    }

    #[test]
    fn force_ignores_window_but_still_counts() {
        let mut s = make_session();
        let t0 = Instant::now();
        s.offer(GestureLabel::CameraOff, 0.0, t0);
        s.force(GestureLabel::CameraOff, 0.0, t0);
        assert_eq!(s.tally().get(GestureLabel::CameraOff), 2);
    }

    #[test]
    fn confidence_formats_one_decimal() {
        assert_eq!(format_confidence(0.9876), "98.8%");
        assert_eq!(format_confidence(0.0), "0.0%");
        let mut s = make_session();
        assert_eq!(s.confidence_text(), "Confidence: --");
        s.offer(GestureLabel::OkSign, 0.5, Instant::now());
        assert_eq!(s.confidence_text(), "Confidence: 50.0%");
    }

    #[test]
    fn summary_lists_poses_and_unknown() {
        let mut t = Tally::default();
        t.increment(GestureLabel::ThumbsUp);
        t.increment(GestureLabel::Unknown);
        t.increment(GestureLabel::NoHand);
        let line = t.summary();
        assert!(line.starts_with("👍: 1"));
        assert!(line.ends_with("Unknown: 1"));
        assert_eq!(t.total(), 3);
    }
}

//! Top-level application state machine.
//!
//! `AppState` owns the [`Session`], the [`ParticleField`], the camera switch
//! and the hands from the latest detection.  It turns detector answers into
//! debounced labels and drives the particle animation each display frame.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use anyhow::Result;
use hand_pose::{classify, GestureLabel, HandObservation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::palette;
use crate::particles::ParticleField;
use crate::session::Session;
use crate::source::{spawn_source, LandmarkSource, SimInput, SourceHandle, SourceReply};
use crate::visualizer::{UiEvent, Visualizer};

/// How long startup waits for the capture stream before giving up on it.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// ════════════════════════════════════════════════════════════════════════════
// Camera switch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    /// Stream open; detections are requested every frame.
    On,
    /// Waiting for the source to reopen the stream.
    Acquiring,
    Off,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── labels & counts ──────────────────────────────────────────────────
    session:   Session,

    // ── effects ──────────────────────────────────────────────────────────
    particles: ParticleField,
    pulse:     Duration,

    // ── capture ──────────────────────────────────────────────────────────
    camera:    CameraState,
    width:     u32,
    height:    u32,
    requested: (u32, u32),

    /// Hands from the latest detection, for the skeleton overlay.
    hands:     Vec<HandObservation>,

    pub status: String,
}

impl AppState {
    /// New board of `width` × `height` with the camera off.
    pub fn new(cfg: &AppConfig, width: u32, height: u32) -> Self {
        AppState {
            session:   Session::new(cfg.debounce.window()),
            particles: ParticleField::new(cfg.particles.clone(), width as usize, height as usize),
            pulse:     Duration::from_millis(cfg.display.pulse_ms),
            camera:    CameraState::Off,
            width,
            height,
            requested: (cfg.capture.width, cfg.capture.height),
            hands:     Vec::new(),
            status:    "Starting".to_string(),
        }
    }

    // ── detector answers ─────────────────────────────────────────────────

    /// One detection result.  Zero hands reads as `NoHand`; otherwise each
    /// hand is classified and offered in turn.  Ignored unless the camera is
    /// on, so a detection that was in flight when the camera went off cannot
    /// overwrite `CameraOff`.
    pub fn handle_hands(&mut self, hands: Vec<HandObservation>, now: Instant) {
        if self.camera != CameraState::On {
            return;
        }
        if hands.is_empty() {
            self.session.offer(GestureLabel::NoHand, 0.0, now);
        } else {
            for hand in &hands {
                self.session.offer(classify(hand), hand.confidence, now);
            }
        }
        self.hands = hands;
    }

    // ── camera switch ────────────────────────────────────────────────────

    /// Camera goes off: `CameraOff` is shown at once, whatever the debounce
    /// window says, and the overlay is cleared.
    pub fn camera_off(&mut self, now: Instant) {
        self.camera = CameraState::Off;
        self.hands.clear();
        self.session.force(GestureLabel::CameraOff, 0.0, now);
        self.status = "Camera off".to_string();
    }

    pub fn camera_acquiring(&mut self) {
        self.camera = CameraState::Acquiring;
        self.status = "Starting camera".to_string();
    }

    /// Stream is open again.  The debounce memory is cleared so the first
    /// classification is accepted whatever it is.
    pub fn camera_on(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            info!(width, height, "capture size changed");
            self.width = width;
            self.height = height;
            self.particles.resize(width as usize, height as usize);
        }
        self.camera = CameraState::On;
        self.session.reset_debounce();
        self.status = format!("Camera on  {}x{}", width, height);
    }

    /// Acquisition failed.  The board keeps running with the camera off.
    pub fn camera_failed(&mut self, reason: &str, now: Instant) {
        if self.session.label() != Some(GestureLabel::CameraOff) {
            self.session.force(GestureLabel::CameraOff, 0.0, now);
        }
        self.camera = CameraState::Off;
        self.hands.clear();
        self.status = format!("Camera unavailable: {}", reason);
    }

    /// Flip the camera switch.  A toggle while a reopen is underway is
    /// ignored.
    pub fn toggle_camera(&mut self, source: &mut SourceHandle, now: Instant) -> Result<()> {
        match self.camera {
            CameraState::On => {
                source.release()?;
                self.camera_off(now);
            }
            CameraState::Off => {
                let (w, h) = self.requested;
                source.request_acquire(w, h)?;
                self.camera_acquiring();
            }
            CameraState::Acquiring => {}
        }
        Ok(())
    }

    // ── source plumbing ──────────────────────────────────────────────────

    /// Apply every reply the source has ready.
    pub fn poll_source(&mut self, source: &mut SourceHandle, now: Instant) {
        while let Some(reply) = source.try_recv() {
            self.apply_reply(reply, now);
        }
    }

    pub fn apply_reply(&mut self, reply: SourceReply, now: Instant) {
        match reply {
            SourceReply::Hands(hands) => self.handle_hands(hands, now),
            SourceReply::Acquired { width, height } => {
                if self.camera == CameraState::Acquiring {
                    self.camera_on(width, height);
                }
            }
            SourceReply::AcquireFailed(msg) => self.camera_failed(&msg, now),
            // One bad frame changes nothing; the next request goes out as usual.
            SourceReply::DetectFailed(msg) => warn!("dropping frame: {}", msg),
        }
    }

    /// Keep one detection in flight while the camera is on.
    pub fn pump_detection(&mut self, source: &mut SourceHandle) -> Result<()> {
        if self.camera == CameraState::On && !source.is_pending() {
            source.request_detect()?;
        }
        Ok(())
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    /// Advance the particle field one display frame.  New particles only
    /// appear while a hand is on screen.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        let spawning = self.session.label().map_or(false, |l| l.hand_present());
        self.particles.tick(spawning, rng);
    }

    // ── accessors for the render loop ────────────────────────────────────

    pub fn session(&self)   -> &Session            { &self.session }
    pub fn particles(&self) -> &ParticleField      { &self.particles }
    pub fn camera(&self)    -> CameraState         { self.camera }
    pub fn hands(&self)     -> &[HandObservation]  { &self.hands }
    pub fn label(&self)     -> Option<GestureLabel> { self.session.label() }
    pub fn size(&self)      -> (u32, u32)          { (self.width, self.height) }

    pub fn background(&self) -> u32 {
        palette::background(self.session.label())
    }

    /// True for a short while after each accepted label.
    pub fn pulse_active(&self, now: Instant) -> bool {
        self.session.shown()
            .map_or(false, |s| now.saturating_duration_since(s.since) < self.pulse)
    }

    pub fn toggle_text(&self) -> &'static str {
        match self.camera {
            CameraState::On        => "Turn Camera Off",
            CameraState::Acquiring => "Starting...",
            CameraState::Off       => "Turn Camera On",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the board.
///
/// The capture stream is opened before anything else so the window can be
/// sized to it.  If that fails the board still opens, showing `CameraOff`,
/// and the camera toggle can be used to retry.  `sim_tx` is given when the
/// source is the keyboard simulator so the window can forward pose keys.
pub fn run(
    cfg:    AppConfig,
    source: Box<dyn LandmarkSource>,
    sim_tx: Option<Sender<SimInput>>,
    seed:   u64,
) -> Result<()> {
    let mut handle = spawn_source(source, cfg.detector.clone());
    let (want_w, want_h) = (cfg.capture.width, cfg.capture.height);

    let acquired = handle.acquire_blocking(want_w, want_h, ACQUIRE_TIMEOUT);
    let (width, height) = *acquired.as_ref().unwrap_or(&(want_w, want_h));

    let mut vis = Visualizer::new(width as usize, height as usize, cfg.display.frame_ms, sim_tx)?;
    let mut app = AppState::new(&cfg, width, height);
    let mut rng = StdRng::seed_from_u64(seed);

    match acquired {
        Ok((w, h)) => app.camera_on(w, h),
        Err(e) => {
            error!("starting without camera: {:#}", e);
            app.camera_failed(&format!("{:#}", e), Instant::now());
        }
    }

    while vis.is_open() {
        // 1. Window input
        for event in vis.poll_input() {
            match event {
                UiEvent::Quit => return Ok(()),
                UiEvent::ToggleCamera => app.toggle_camera(&mut handle, Instant::now())?,
            }
        }

        // 2. Detector answers, then keep one request in flight
        app.poll_source(&mut handle, Instant::now());
        app.pump_detection(&mut handle)?;

        // 3. Particles
        app.tick(&mut rng);

        // 4. Render
        vis.render(&app, Instant::now());
    }

    info!(total = app.session().tally().total(), "{}", app.session().tally().summary());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimLandmarkSource;
    use hand_pose::presets::Preset;
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(2);

    fn make_app() -> AppState {
        let mut app = AppState::new(&AppConfig::default(), 640, 480);
        app.camera_on(640, 480);
        app
    }

    fn hand(p: Preset) -> Vec<HandObservation> {
        vec![p.observation(0.92)]
    }

    fn sim_handle() -> (SourceHandle, Sender<SimInput>) {
        let (tx, rx) = mpsc::channel();
        let src = SimLandmarkSource::new(rx, Duration::ZERO, 1);
        (spawn_source(Box::new(src), AppConfig::default().detector), tx)
    }

    /// Wait for the next reply and apply it.
    fn settle(app: &mut AppState, h: &mut SourceHandle, now: Instant) {
        let reply = h.wait(WAIT).expect("source answered");
        app.apply_reply(reply, now);
    }

    #[test]
    fn thumbs_up_is_accepted_and_counted() {
        let mut app = make_app();
        app.handle_hands(hand(Preset::ThumbsUp), Instant::now());
        assert_eq!(app.label(), Some(GestureLabel::ThumbsUp));
        assert_eq!(app.session().tally().get(GestureLabel::ThumbsUp), 1);
        assert_eq!(app.background(), 0xFF003300);
    }

    #[test]
    fn ok_sign_is_recognised() {
        let mut app = make_app();
        app.handle_hands(hand(Preset::OkSign), Instant::now());
        assert_eq!(app.label(), Some(GestureLabel::OkSign));
    }

    #[test]
    fn zero_hands_is_no_hand_without_particles() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_hands(hand(Preset::OpenHand), t0);
        app.handle_hands(Vec::new(), t0 + Duration::from_millis(30));
        assert_eq!(app.label(), Some(GestureLabel::NoHand));
        assert_eq!(app.session().shown().map(|s| s.confidence), Some(0.0));
        assert_eq!(app.background(), palette::DEFAULT_BG);

        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 { app.tick(&mut rng); }
        assert!(app.particles().is_empty());
    }

    #[test]
    fn unknown_is_counted_apart_from_no_hand() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_hands(hand(Preset::Fist), t0);
        app.handle_hands(Vec::new(), t0 + Duration::from_millis(10));
        let tally = app.session().tally();
        assert_eq!(tally.get(GestureLabel::Unknown), 1);
        assert_eq!(tally.get(GestureLabel::NoHand), 1);
    }

    #[test]
    fn held_pose_counts_once_per_window() {
        let mut app = make_app();
        let t0 = Instant::now();
        for ms in (0..3000).step_by(33) {
            app.handle_hands(hand(Preset::PeaceSign), t0 + Duration::from_millis(ms));
        }
        // Accepted at 0 ms and 1518 ms; the next would be due at 3018 ms.
        assert_eq!(app.session().tally().get(GestureLabel::PeaceSign), 2);
    }

    #[test]
    fn particles_spawn_while_hand_is_shown() {
        let mut app = make_app();
        app.handle_hands(hand(Preset::RockSign), Instant::now());
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 { app.tick(&mut rng); }
        assert!(!app.particles().is_empty());
        assert!(app.particles().len() <= 100);
    }

    #[test]
    fn camera_off_forces_label_and_suspends_spawning() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_hands(hand(Preset::ThumbsUp), t0);
        app.camera_off(t0 + Duration::from_millis(1));
        assert_eq!(app.label(), Some(GestureLabel::CameraOff));
        assert_eq!(app.background(), palette::DEFAULT_BG);
        assert!(app.hands().is_empty());

        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 { app.tick(&mut rng); }
        assert!(app.particles().is_empty());
    }

    #[test]
    fn late_detection_after_camera_off_is_ignored() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.camera_off(t0);
        app.handle_hands(hand(Preset::OpenHand), t0 + Duration::from_millis(5));
        assert_eq!(app.label(), Some(GestureLabel::CameraOff));
        assert_eq!(app.session().tally().get(GestureLabel::OpenHand), 0);
    }

    #[test]
    fn toggle_off_then_on_accepts_next_detection() {
        let (mut h, tx) = sim_handle();
        let mut app = AppState::new(&AppConfig::default(), 640, 480);
        let t0 = Instant::now();

        // Camera on with a peace sign held.
        app.toggle_camera(&mut h, t0).unwrap();
        assert_eq!(app.camera(), CameraState::Acquiring);
        settle(&mut app, &mut h, t0);
        assert_eq!(app.camera(), CameraState::On);

        tx.send(SimInput::Pose(Preset::PeaceSign)).unwrap();
        app.pump_detection(&mut h).unwrap();
        settle(&mut app, &mut h, t0);
        assert_eq!(app.label(), Some(GestureLabel::PeaceSign));

        // Off: CameraOff shows immediately.
        let t1 = t0 + Duration::from_millis(100);
        app.toggle_camera(&mut h, t1).unwrap();
        assert_eq!(app.label(), Some(GestureLabel::CameraOff));
        assert_eq!(app.camera(), CameraState::Off);

        // On again: debounce memory is gone.
        app.toggle_camera(&mut h, t1).unwrap();
        settle(&mut app, &mut h, t1);
        assert_eq!(app.camera(), CameraState::On);
        assert_eq!(app.session().debounce().last_label(), None);

        let t2 = t1 + Duration::from_millis(10);
        app.pump_detection(&mut h).unwrap();
        settle(&mut app, &mut h, t2);
        assert_eq!(app.label(), Some(GestureLabel::PeaceSign));
        assert_eq!(app.session().tally().get(GestureLabel::PeaceSign), 2);
        assert_eq!(app.session().tally().get(GestureLabel::CameraOff), 1);
    }

    #[test]
    fn reset_accepts_label_identical_to_last() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_hands(hand(Preset::OkSign), t0);
        // Reopen without passing through CameraOff: the same label inside the
        // window is still accepted.
        app.camera_on(640, 480);
        app.handle_hands(hand(Preset::OkSign), t0 + Duration::from_millis(5));
        assert_eq!(app.session().tally().get(GestureLabel::OkSign), 2);
    }

    #[test]
    fn only_one_request_in_flight() {
        let (mut h, _tx) = sim_handle();
        let mut app = AppState::new(&AppConfig::default(), 640, 480);
        let t0 = Instant::now();
        app.toggle_camera(&mut h, t0).unwrap();
        settle(&mut app, &mut h, t0);

        app.pump_detection(&mut h).unwrap();
        assert!(h.is_pending());
        app.pump_detection(&mut h).unwrap();
        settle(&mut app, &mut h, t0);
        assert!(!h.is_pending());
        assert!(h.try_recv().is_none());
        assert_eq!(app.label(), Some(GestureLabel::NoHand));
    }

    #[test]
    fn failed_acquire_keeps_camera_off() {
        let mut app = AppState::new(&AppConfig::default(), 640, 480);
        let t0 = Instant::now();
        app.camera_failed("denied", t0);
        app.apply_reply(SourceReply::AcquireFailed("denied".into()), t0);
        assert_eq!(app.camera(), CameraState::Off);
        assert_eq!(app.label(), Some(GestureLabel::CameraOff));
        assert_eq!(app.session().tally().get(GestureLabel::CameraOff), 1);
        assert!(app.status.contains("denied"));
    }

    #[test]
    fn failed_detection_changes_nothing() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_hands(hand(Preset::ThumbsUp), t0);
        app.apply_reply(SourceReply::DetectFailed("blurry".into()), t0);
        assert_eq!(app.label(), Some(GestureLabel::ThumbsUp));
        assert_eq!(app.session().tally().total(), 1);
    }

    #[test]
    fn pulse_follows_acceptance() {
        let mut app = make_app();
        let t0 = Instant::now();
        assert!(!app.pulse_active(t0));
        app.handle_hands(hand(Preset::OpenHand), t0);
        assert!(app.pulse_active(t0 + Duration::from_millis(100)));
        assert!(!app.pulse_active(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn toggle_text_tracks_camera() {
        let mut app = make_app();
        assert_eq!(app.toggle_text(), "Turn Camera Off");
        app.camera_off(Instant::now());
        assert_eq!(app.toggle_text(), "Turn Camera On");
    }
}

//! Landmark sources and the detection worker.
//!
//! A [`LandmarkSource`] stands in for the camera + hand-landmark detector
//! pair.  It runs on its own thread behind a [`SourceHandle`]; the board asks
//! for one detection at a time and picks the answer up on a later frame.
//! Consumers don't need to know whether hands came from a detector, the
//! keyboard simulator, or a replay file.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use hand_pose::presets::Preset;
use hand_pose::HandObservation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::config::DetectorConfig;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Capture stream plus detector.
pub trait LandmarkSource: Send + 'static {
    /// Open the stream at (about) the requested size; returns the real size.
    fn acquire(&mut self, width: u32, height: u32) -> Result<(u32, u32)>;

    /// Stop the stream.  Detection is not requested again until the next
    /// successful `acquire`.
    fn release(&mut self);

    /// Hands in the current frame.  An empty list is a normal answer.
    fn detect(&mut self) -> Result<Vec<HandObservation>>;
}

// ════════════════════════════════════════════════════════════════════════════
// Worker protocol
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SourceRequest {
    Acquire { width: u32, height: u32 },
    Release,
    Detect,
    Shutdown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SourceReply {
    Acquired { width: u32, height: u32 },
    AcquireFailed(String),
    Hands(Vec<HandObservation>),
    DetectFailed(String),
}

/// Apply detector options to a raw answer: drop weak hands, keep at most
/// `max_num_hands`.
pub fn filter_hands(mut hands: Vec<HandObservation>, cfg: &DetectorConfig) -> Vec<HandObservation> {
    hands.retain(|h| h.confidence >= cfg.min_detection_confidence);
    hands.truncate(cfg.max_num_hands);
    hands
}

// ════════════════════════════════════════════════════════════════════════════
// SourceHandle
// ════════════════════════════════════════════════════════════════════════════

/// Board-side end of a running source.  At most one detection is in flight.
pub struct SourceHandle {
    tx:      SyncSender<SourceRequest>,
    rx:      Receiver<SourceReply>,
    pending: bool,
    worker:  Option<JoinHandle<()>>,
}

/// Move `source` onto its own thread and return the handle that drives it.
pub fn spawn_source(source: Box<dyn LandmarkSource>, detector: DetectorConfig) -> SourceHandle {
    let (req_tx, req_rx) = mpsc::sync_channel::<SourceRequest>(1);
    let (rep_tx, rep_rx) = mpsc::channel::<SourceReply>();
    let worker = thread::Builder::new()
        .name("landmark-source".into())
        .spawn(move || run_worker(source, detector, req_rx, rep_tx))
        .ok();
    if worker.is_none() {
        error!("could not start landmark source thread");
    }
    SourceHandle { tx: req_tx, rx: rep_rx, pending: false, worker }
}

fn run_worker(
    mut source: Box<dyn LandmarkSource>,
    detector:   DetectorConfig,
    rx:         Receiver<SourceRequest>,
    tx:         Sender<SourceReply>,
) {
    for req in rx {
        let reply = match req {
            SourceRequest::Acquire { width, height } => match source.acquire(width, height) {
                Ok((w, h)) => {
                    info!(width = w, height = h, "capture acquired");
                    SourceReply::Acquired { width: w, height: h }
                }
                Err(e) => {
                    error!("capture unavailable: {:#}", e);
                    SourceReply::AcquireFailed(format!("{:#}", e))
                }
            },
            SourceRequest::Release => {
                source.release();
                info!("capture released");
                continue;
            }
            SourceRequest::Detect => match source.detect() {
                Ok(hands) => SourceReply::Hands(filter_hands(hands, &detector)),
                Err(e) => {
                    warn!("detection failed: {:#}", e);
                    SourceReply::DetectFailed(format!("{:#}", e))
                }
            },
            SourceRequest::Shutdown => {
                source.release();
                return;
            }
        };
        if tx.send(reply).is_err() { return; }
    }
}

impl SourceHandle {
    /// Ask the source to open its stream.  The answer arrives as
    /// [`SourceReply::Acquired`] or [`SourceReply::AcquireFailed`].
    pub fn request_acquire(&mut self, width: u32, height: u32) -> Result<()> {
        self.send(SourceRequest::Acquire { width, height })
    }

    /// Open the stream and wait for the answer.
    pub fn acquire_blocking(&mut self, width: u32, height: u32, timeout: Duration) -> Result<(u32, u32)> {
        self.request_acquire(width, height)?;
        loop {
            match self.wait(timeout) {
                Some(SourceReply::Acquired { width, height }) => return Ok((width, height)),
                Some(SourceReply::AcquireFailed(msg))       => bail!(msg),
                Some(other) => debug!(?other, "ignoring stale reply while acquiring"),
                None => bail!("landmark source did not answer within {:?}", timeout),
            }
        }
    }

    pub fn release(&mut self) -> Result<()> {
        self.send(SourceRequest::Release)
    }

    /// Ask for one detection.  Returns `false` without sending if one is
    /// already outstanding.
    pub fn request_detect(&mut self) -> Result<bool> {
        if self.pending {
            return Ok(false);
        }
        self.send(SourceRequest::Detect)?;
        self.pending = true;
        Ok(true)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Next reply if one is ready.
    pub fn try_recv(&mut self) -> Option<SourceReply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(self.settle(reply)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = false;
                None
            }
        }
    }

    /// Next reply, waiting up to `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Option<SourceReply> {
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => Some(self.settle(reply)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.pending = false;
                None
            }
        }
    }

    fn settle(&mut self, reply: SourceReply) -> SourceReply {
        if matches!(reply, SourceReply::Hands(_) | SourceReply::DetectFailed(_)) {
            self.pending = false;
        }
        reply
    }

    fn send(&self, req: SourceRequest) -> Result<()> {
        self.tx.send(req).map_err(|_| anyhow!("landmark source thread has stopped"))
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(SourceRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: keyboard simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Hold this pose in front of the "camera".
    Pose(Preset),
    /// Take the hand away.
    NoHand,
}

/// Landmark source driven by [`SimInput`] events from the visualizer.
///
/// Each detection returns the selected preset with a little positional
/// jitter and a plausible confidence, after a short simulated latency.
pub struct SimLandmarkSource {
    rx:      Receiver<SimInput>,
    current: Option<Preset>,
    latency: Duration,
    rng:     StdRng,
    open:    bool,
}

/// Largest per-coordinate jitter, normalized units.
const SIM_JITTER: f32 = 0.004;

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>, latency: Duration, seed: u64) -> Self {
        SimLandmarkSource {
            rx,
            current: None,
            latency,
            rng: StdRng::seed_from_u64(seed),
            open: false,
        }
    }

    fn drain_input(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::Pose(p)) => self.current = Some(p),
                Ok(SimInput::NoHand)  => self.current = None,
                Err(_) => break,
            }
        }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn acquire(&mut self, width: u32, height: u32) -> Result<(u32, u32)> {
        self.open = true;
        Ok((width, height))
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn detect(&mut self) -> Result<Vec<HandObservation>> {
        if !self.open {
            bail!("capture stream is not open");
        }
        self.drain_input();
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(match self.current {
            Some(preset) => vec![jittered(preset, &mut self.rng)],
            None         => Vec::new(),
        })
    }
}

/// Preset pose with every point nudged by up to [`SIM_JITTER`].
pub fn jittered<R: Rng>(preset: Preset, rng: &mut R) -> HandObservation {
    let mut hand = preset.observation(rng.gen_range(0.85..0.99));
    for l in hand.landmarks.iter_mut() {
        l.x = (l.x + rng.gen_range(-SIM_JITTER..SIM_JITTER)).clamp(0.0, 1.0);
        l.y = (l.y + rng.gen_range(-SIM_JITTER..SIM_JITTER)).clamp(0.0, 1.0);
    }
    hand
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::{classify, GestureLabel};

    const WAIT: Duration = Duration::from_secs(2);

    /// Scripted source: answers from a fixed list, can refuse to open.
    struct FakeSource {
        frames:   Vec<Vec<HandObservation>>,
        cursor:   usize,
        can_open: bool,
    }

    impl LandmarkSource for FakeSource {
        fn acquire(&mut self, width: u32, height: u32) -> Result<(u32, u32)> {
            if !self.can_open { bail!("no camera"); }
            Ok((width / 2, height / 2))
        }
        fn release(&mut self) {}
        fn detect(&mut self) -> Result<Vec<HandObservation>> {
            let f = self.frames[self.cursor % self.frames.len()].clone();
            self.cursor += 1;
            Ok(f)
        }
    }

    fn fake(frames: Vec<Vec<HandObservation>>, can_open: bool) -> SourceHandle {
        spawn_source(Box::new(FakeSource { frames, cursor: 0, can_open }), DetectorConfig::default())
    }

    #[test]
    fn filter_drops_weak_and_extra_hands() {
        let cfg = DetectorConfig::default();
        let hands = vec![
            Preset::OpenHand.observation(0.5),
            Preset::ThumbsUp.observation(0.9),
            Preset::PeaceSign.observation(0.95),
        ];
        let kept = filter_hands(hands, &cfg);
        assert_eq!(kept.len(), 1);
        assert_eq!(classify(&kept[0]), GestureLabel::ThumbsUp);
    }

    #[test]
    fn acquire_reports_actual_size() {
        let mut h = fake(vec![vec![]], true);
        assert_eq!(h.acquire_blocking(640, 480, WAIT).unwrap(), (320, 240));
    }

    #[test]
    fn acquire_failure_is_an_error() {
        let mut h = fake(vec![vec![]], false);
        let err = h.acquire_blocking(640, 480, WAIT).unwrap_err();
        assert!(err.to_string().contains("no camera"));
    }

    #[test]
    fn only_one_detection_in_flight() {
        let mut h = fake(vec![vec![Preset::OkSign.observation(0.9)]], true);
        assert!(h.request_detect().unwrap());
        assert!(!h.request_detect().unwrap());
        assert!(h.is_pending());
        match h.wait(WAIT) {
            Some(SourceReply::Hands(hands)) => assert_eq!(hands.len(), 1),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(!h.is_pending());
        assert!(h.request_detect().unwrap());
    }

    #[test]
    fn sim_source_follows_input() {
        let (tx, rx) = mpsc::channel();
        let mut sim = SimLandmarkSource::new(rx, Duration::ZERO, 11);
        assert!(sim.detect().is_err());
        sim.acquire(640, 480).unwrap();
        assert!(sim.detect().unwrap().is_empty());

        tx.send(SimInput::Pose(Preset::RockSign)).unwrap();
        let hands = sim.detect().unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(classify(&hands[0]), GestureLabel::RockSign);

        tx.send(SimInput::NoHand).unwrap();
        assert!(sim.detect().unwrap().is_empty());

        sim.release();
        assert!(sim.detect().is_err());
    }

    #[test]
    fn jitter_keeps_every_preset_label() {
        let mut rng = StdRng::seed_from_u64(5);
        for preset in Preset::all() {
            for _ in 0..50 {
                let hand = jittered(preset, &mut rng);
                assert_eq!(classify(&hand), preset.expected_label(), "{:?}", preset);
                assert!(hand.confidence >= 0.85 && hand.confidence < 0.99);
            }
        }
    }
}

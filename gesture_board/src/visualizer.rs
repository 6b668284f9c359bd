//! Software-rendered board using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                                               │
//! │   capture area: background color by label,  │
//! │   hand skeleton overlay, rising particles     │
//! │                                               │
//! ├────────┬──────────────────────────────────────┤
//! │ glyph  │  LABEL                               │
//! │ panel  │  Confidence: 97.2%                   │
//! │        │  per-label counts                    │
//! ├────────┴──────────────────────────────────────┤
//! │  [C] Turn Camera Off      status / key legend │
//! └───────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use anyhow::Result;
use hand_pose::presets::Preset;
use hand_pose::{GestureLabel, Landmark, HAND_CONNECTIONS};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::debug;

use crate::app::AppState;
use crate::palette::{
    blend, BONE_COLOR, DIM_TEXT, JOINT_COLOR, PANEL_BG, PARTICLE_COLOR, PULSE_COLOR, TEXT_COLOR,
};
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const HUD_H:     usize = 110;
const GLYPH_BOX: usize = 80;
const MARGIN:    usize = 10;
const TITLE:     &str  = "Gesture Board";

/// What the window asks of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    ToggleCamera,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// Capture area; the window is `frame_h + HUD_H` tall.
    frame_w: usize,
    frame_h: usize,
    win_h:   usize,
    /// Present when the keyboard simulator is the landmark source.
    sim_tx:  Option<Sender<SimInput>>,
    titled:  Option<GestureLabel>,
}

impl Visualizer {
    pub fn new(
        frame_w:  usize,
        frame_h:  usize,
        frame_ms: u64,
        sim_tx:   Option<Sender<SimInput>>,
    ) -> Result<Self> {
        let win_h = frame_h + HUD_H;
        let mut window = Window::new(
            TITLE,
            frame_w, win_h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(frame_ms)));

        Ok(Visualizer {
            window,
            buf: vec![0; frame_w * win_h],
            frame_w,
            frame_h,
            win_h,
            sim_tx,
            titled: None,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read the keyboard.  Pose keys go straight to the simulator; the rest
    /// come back as [`UiEvent`]s.
    ///
    /// | Key | Action |
    /// |---|---|
    /// | `C` | camera on/off |
    /// | `1`–`7` | hold a preset pose (simulator only) |
    /// | `0` / `H` | take the hand away (simulator only) |
    /// | `Q` / `Esc` | quit |
    pub fn poll_input(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        if !self.window.is_open() {
            events.push(UiEvent::Quit);
            return events;
        }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            events.push(UiEvent::Quit);
        }
        if pressed(Key::C) {
            events.push(UiEvent::ToggleCamera);
        }

        if let Some(tx) = &self.sim_tx {
            const POSE_KEYS: [Key; 7] =
                [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6, Key::Key7];
            for (key, preset) in POSE_KEYS.iter().zip(Preset::all()) {
                if pressed(*key) {
                    let _ = tx.send(SimInput::Pose(preset));
                }
            }
            if pressed(Key::Key0) || pressed(Key::H) {
                let _ = tx.send(SimInput::NoHand);
            }
        }

        events
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState, now: Instant) {
        let label = app.label();

        // ── Capture area ──────────────────────────────────────────────────
        let bg = app.background();
        self.fill_rect(0, 0, self.frame_w, self.frame_h, bg);

        for hand in app.hands() {
            self.draw_skeleton(&hand.landmarks, 0, 0, self.frame_w, self.frame_h, 4);
        }

        let (src_w, src_h) = app.size();
        let sx = self.frame_w as f32 / src_w.max(1) as f32;
        let sy = self.frame_h as f32 / src_h.max(1) as f32;
        for p in app.particles().particles() {
            self.fill_circle_alpha(
                (p.x * sx) as i32, (p.y * sy) as i32, (p.size * sx).max(1.0) as i32,
                PARTICLE_COLOR, p.opacity,
            );
        }

        // ── HUD ───────────────────────────────────────────────────────────
        let hud_y = self.frame_h;
        self.fill_rect(0, hud_y, self.frame_w, HUD_H, PANEL_BG);

        let gx = MARGIN;
        let gy = hud_y + MARGIN;
        self.fill_rect(gx, gy, GLYPH_BOX, GLYPH_BOX, bg);
        self.draw_glyph(label, gx, gy);
        if app.pulse_active(now) {
            self.draw_border(gx, gy, GLYPH_BOX, GLYPH_BOX, PULSE_COLOR);
            self.draw_border(gx + 1, gy + 1, GLYPH_BOX - 2, GLYPH_BOX - 2, PULSE_COLOR);
        }

        let tx = gx + GLYPH_BOX + MARGIN;
        let name = label.map_or("--", |l| l.name());
        self.draw_text(name, tx, gy, 3, TEXT_COLOR);
        self.draw_text(&app.session().confidence_text(), tx, gy + 22, 2, TEXT_COLOR);
        self.draw_text(&counts_line(app), tx, gy + 40, 1, TEXT_COLOR);

        let toggle = format!("[C] {}", app.toggle_text());
        self.draw_text(&toggle, tx, gy + 54, 2, TEXT_COLOR);
        self.draw_text(&app.status, tx, gy + 72, 1, DIM_TEXT);
        let legend = if self.sim_tx.is_some() {
            "1-7=pose  0/H=no hand  C=camera  Q=quit"
        } else {
            "C=camera  Q=quit"
        };
        self.draw_text(legend, tx, self.win_h - 12, 1, DIM_TEXT);

        // Window title carries the real glyph; the bitmap font has no emoji.
        if self.titled != label {
            self.titled = label;
            let title = match label {
                Some(l) => format!("{} - {}", TITLE, l),
                None    => TITLE.to_string(),
            };
            self.window.set_title(&title);
        }

        if let Err(e) = self.window.update_with_buffer(&self.buf, self.frame_w, self.win_h) {
            debug!("frame dropped: {}", e);
        }
    }

    // ── Glyph panel ───────────────────────────────────────────────────────

    /// Pictogram for the label: the pose's own hand shape, or a mark for the
    /// session states.
    fn draw_glyph(&mut self, label: Option<GestureLabel>, x: usize, y: usize) {
        match label {
            Some(GestureLabel::NoHand) => {
                self.draw_text("NO", x + 22, y + 24, 4, DIM_TEXT);
            }
            Some(GestureLabel::CameraOff) => {
                let (x0, y0) = (x as i32 + 12, y as i32 + 12);
                let (x1, y1) = (x0 + GLYPH_BOX as i32 - 24, y0 + GLYPH_BOX as i32 - 24);
                self.draw_line(x0, y0, x1, y1, JOINT_COLOR);
                self.draw_line(x0, y1, x1, y0, JOINT_COLOR);
            }
            Some(GestureLabel::Unknown) => {
                self.draw_text("?", x + 30, y + 20, 8, TEXT_COLOR);
            }
            Some(l) => {
                if let Some(preset) = Preset::for_label(l) {
                    // Presets sit in the middle of the unit square; zoom in.
                    let lm = preset.landmarks().map(|p| Landmark::new((p.x - 0.5) * 2.0 + 0.5, (p.y - 0.6) * 1.6 + 0.5));
                    self.draw_skeleton(&lm, x, y, GLYPH_BOX, GLYPH_BOX, 2);
                }
            }
            None => {}
        }
    }

    // ── Skeleton ──────────────────────────────────────────────────────────

    fn draw_skeleton(&mut self, lm: &[Landmark], x: usize, y: usize, w: usize, h: usize, joint_r: i32) {
        let at = |l: &Landmark| {
            let (px, py) = l.to_pixel(w, h);
            (clamp_near(px, w) + x as i32, clamp_near(py, h) + y as i32)
        };
        for &(a, b) in HAND_CONNECTIONS.iter() {
            let (x0, y0) = at(&lm[a]);
            let (x1, y1) = at(&lm[b]);
            self.draw_line(x0, y0, x1, y1, BONE_COLOR);
        }
        for l in lm {
            let (px, py) = at(l);
            self.fill_circle_alpha(px, py, joint_r, JOINT_COLOR, 1.0);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.win_h) {
            for col in x..(x + w).min(self.frame_w) {
                self.buf[row * self.frame_w + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col as i32, y as i32, color);
            self.set_pixel(col as i32, (y + h - 1) as i32, color);
        }
        for row in y..y + h {
            self.set_pixel(x as i32, row as i32, color);
            self.set_pixel((x + w - 1) as i32, row as i32, color);
        }
    }

    /// Bresenham line.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Filled circle blended over what is already there.
    fn fill_circle_alpha(&mut self, cx: i32, cy: i32, r: i32, color: u32, alpha: f32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r { continue; }
                let (x, y) = (cx + dx, cy + dy);
                if let Some(i) = self.index(x, y) {
                    self.buf[i] = blend(self.buf[i], color, alpha);
                }
            }
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.frame_w && (y as usize) < self.win_h {
            Some(y as usize * self.frame_w + x as usize)
        } else {
            None
        }
    }

    /// 3×5 bitmap text, each font pixel drawn `scale`×`scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > self.frame_w { break; }
        }
    }
}

/// Pull a pixel coordinate to within one `extent` of the surface on either
/// side, so line drawing stays short and free of overflow.
fn clamp_near(v: i32, extent: usize) -> i32 {
    let e = extent.min(i32::MAX as usize / 4) as i32;
    v.clamp(-e, 2 * e)
}

/// `Thumbs Up: 2 | … | Unknown: 1` in plain ASCII for the bitmap font.
fn counts_line(app: &AppState) -> String {
    let tally = app.session().tally();
    let mut labels = GestureLabel::poses().to_vec();
    labels.push(GestureLabel::Unknown);
    labels.iter()
        .map(|&l| {
            let name = if l == GestureLabel::Unknown { "Unknown" } else { l.name() };
            format!("{}: {}", name, tally.get(l))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

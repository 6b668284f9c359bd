//! Colors.  All values are packed ARGB (`0xAARRGGBB`, alpha = 0xFF) as minifb
//! expects.

use hand_pose::GestureLabel;

pub const DEFAULT_BG:      u32 = 0xFF1A1A2E;
pub const PANEL_BG:        u32 = 0xFF0F3460;
pub const PULSE_COLOR:     u32 = 0xFF00FF00;
pub const TEXT_COLOR:      u32 = 0xFFEEEEEE;
pub const DIM_TEXT:        u32 = 0xFF888888;

/// Skeleton overlay: bones green, joints red.
pub const BONE_COLOR:      u32 = 0xFF00FF00;
pub const JOINT_COLOR:     u32 = 0xFFFF0000;

/// Particles are drawn in this color at their own opacity.
pub const PARTICLE_COLOR:  u32 = 0xFF00FF00;

/// Board background for an accepted label.  Everything that is not one of the
/// six poses goes back to the default.
pub fn background(label: Option<GestureLabel>) -> u32 {
    match label {
        Some(GestureLabel::ThumbsUp)       => 0xFF003300,
        Some(GestureLabel::PeaceSign)      => 0xFF003366,
        Some(GestureLabel::OpenHand)       => 0xFF330000,
        Some(GestureLabel::RockSign)       => 0xFF330033,
        Some(GestureLabel::OkSign)         => 0xFF003333,
        Some(GestureLabel::WritingGesture) => 0xFF333300,
        Some(GestureLabel::Unknown)
        | Some(GestureLabel::NoHand)
        | Some(GestureLabel::CameraOff)
        | None                             => DEFAULT_BG,
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poses_have_distinct_backgrounds() {
        let mut seen: Vec<u32> = GestureLabel::poses().iter().map(|&l| background(Some(l))).collect();
        seen.push(DEFAULT_BG);
        let n = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), n);
    }

    #[test]
    fn non_poses_revert_to_default() {
        for label in [GestureLabel::Unknown, GestureLabel::NoHand, GestureLabel::CameraOff] {
            assert_eq!(background(Some(label)), DEFAULT_BG);
        }
        assert_eq!(background(None), DEFAULT_BG);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFF00FF00, 0.5), 0xFF008000);
    }
}

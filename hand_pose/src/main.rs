//! Interactive explorer for the pose rules.
//! Pick a preset hand or load a JSON landmark frame and see how it classifies.

use anyhow::{Context, Result};
use hand_pose::presets::Preset;
use hand_pose::{classify, FingerFeatures, HandObservation, RawHand, PINCH_THRESHOLD};
use std::io::{self, BufRead, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Hand Pose Rule Explorer                   ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    loop {
        print_menu();
        let choice = read_line("Select a preset (1–7), f <file.json>, or q to quit: ");
        let choice = choice.trim();

        if choice.eq_ignore_ascii_case("q") {
            println!("\nGoodbye!\n");
            break;
        }

        if let Some(path) = choice.strip_prefix("f ") {
            match load_frame(path.trim()) {
                Ok(hands) if hands.is_empty() => println!("  No hands in frame.\n"),
                Ok(hands) => {
                    for (i, hand) in hands.iter().enumerate() {
                        report(&format!("hand {}", i), hand);
                    }
                }
                Err(e) => println!("  ⚠  {:#}\n", e),
            }
            continue;
        }

        let presets = Preset::all();
        let preset = match choice.parse::<usize>() {
            Ok(n) if (1..=presets.len()).contains(&n) => presets[n - 1],
            _ => { println!("  ⚠  Please enter 1–{}, f <file>, or q.\n", presets.len()); continue; }
        };

        report(preset.name(), &preset.observation(1.0));
    }
}

fn report(title: &str, hand: &HandObservation) {
    let f = FingerFeatures::from_hand(hand);
    let mark = |b: bool| if b { "up" } else { "--" };

    println!();
    println!("  ┌─ {} ─", title);
    println!("  │  thumb open : {}", mark(f.thumb_open));
    println!("  │  index      : {}", mark(f.index));
    println!("  │  middle     : {}", mark(f.middle));
    println!("  │  ring       : {}", mark(f.ring));
    println!("  │  pinky      : {}", mark(f.pinky));
    println!("  │  pinch      : {:.3}  ({})", f.pinch_distance,
             if f.pinched() { "touching" } else { "apart" });
    println!("  │  threshold  : {:.3}", PINCH_THRESHOLD);
    println!("  │");
    println!("  └─ {}   confidence {:.1}%", classify(hand), hand.confidence * 100.0);
    println!();
}

/// A frame file holds a JSON array of hands, the same shape as one line of a
/// replay file.
fn load_frame(path: &str) -> Result<Vec<HandObservation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path))?;
    parse_frame(&text).with_context(|| format!("parsing {}", path))
}

fn parse_frame(text: &str) -> Result<Vec<HandObservation>> {
    let raw: Vec<RawHand> = serde_json::from_str(text)?;
    let hands = raw.into_iter()
        .map(HandObservation::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(hands)
}

fn print_menu() {
    println!("  ┌──────────────────────────────────────────────────────┐");
    for (i, p) in Preset::all().iter().enumerate() {
        println!("  │  {}. {:49} │", i + 1, p.name());
    }
    println!("  └──────────────────────────────────────────────────────┘");
    println!();
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    read_from(&mut io::stdin().lock())
}

/// One line of input; end of input (or a read error) reads as `q`.
fn read_from<R: BufRead>(input: &mut R) -> String {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => "q".to_string(),
        Ok(_) => buf,
    }
}

//! Terminal oscilloscope for the wave generators.
//!
//! Runs one wave of each shape against the system clock and draws their
//! values as bar columns for a couple of seconds. Run with
//! `cargo run --example wave_clock`.

use std::thread::sleep;
use std::time::Duration;
use tactile::prelude::*;

const COLUMNS: usize = 24;

fn bar(value: f64) -> String {
    // Map [-1,1] onto a fixed-width column with a center mark.
    let filled = (((value + 1.0) / 2.0) * (COLUMNS as f64 - 1.0)).round() as usize;
    let mut chars: Vec<char> = vec![' '; COLUMNS];
    chars[COLUMNS / 2] = '|';
    chars[filled] = '#';
    chars.into_iter().collect()
}

fn main() {
    let shapes = [
        WaveShape::Sine,
        WaveShape::Triangle,
        WaveShape::Saw,
        WaveShape::InverseSaw,
        WaveShape::Square,
    ];

    let mut surface = Surface::new();
    for shape in shapes {
        surface.add(
            format!("{:?}", shape).to_lowercase(),
            Wave::new(shape).with_period(1000.0),
        );
    }

    let midi = MidiState::new();
    let clock = SystemClock::new();
    let tempo = FixedTempo::default();

    println!(
        "{:>12} {:>8}  {}",
        "shape",
        "value",
        "-1 .. 0 .. +1 (1000 ms period)"
    );
    for _ in 0..60 {
        let ctx = TickContext::new(clock.now_ms(), &midi, &tempo);
        surface.tick(&ctx, &[]);

        for event in surface.events().drain() {
            if let ControlEvent::WaveSample { id, value, .. } = event {
                println!(
                    "{:>12} {:>8.3}  [{}]",
                    surface.name(id).unwrap_or("?"),
                    value,
                    bar(value)
                );
            }
        }
        println!();
        sleep(Duration::from_millis(33));
    }
}

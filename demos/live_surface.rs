//! Scripted control-surface session.
//!
//! Builds a small rig from a definition, then replays a short scripted MIDI
//! performance against it frame by frame, printing every event the surface
//! emits. Run with `cargo run --example live_surface`.

use tactile::prelude::*;

const FRAME_MS: f64 = 16.0;

fn main() {
    let def = SurfaceDef::new("live demo")
        .with_control(ControlDef::standard_knob("cutoff", Channel::All, 7))
        .with_control(ControlDef::standard_toggle("strobe", Channel::Ch(0), 62))
        .with_control(ControlDef::Button {
            name: "stab".into(),
            channel: Channel::Ch(0),
            note: 36,
            control: None,
            threshold: DEFAULT_THRESHOLD,
            stab: Some(Stab::new(1.0, 0.0, StabLength::Beats(1.0))),
        });

    let registry = ControlRegistry::new();
    let mut surface = registry.build(&def).expect("definition should build");

    let midi = MidiState::new();
    let mut clock = ManualClock::new();
    let tempo = FixedTempo::from_bpm(120.0);

    println!("surface '{}' with {} controls", def.name, surface.len());
    for id in surface.ids().collect::<Vec<_>>() {
        let control = surface.get(id).unwrap();
        println!("  {:8} {:8} {}", surface.name(id).unwrap(), control.kind(), control.label());
    }
    println!();

    let mut notes = Vec::new();
    for frame in 0..40 {
        // Scripted performance: sweep the filter, hit the stab, flip the
        // strobe.
        match frame {
            5..=15 => midi.control_change(0, 7, frame as f64 / 15.0),
            20 => midi.note_on(0, 36, 1.0),
            24 => midi.note_off(0, 36),
            30 => midi.note_on(0, 62, 1.0),
            _ => {}
        }

        notes.clear();
        midi.drain_notes(&mut notes);
        let ctx = TickContext::new(clock.now_ms(), &midi, &tempo);
        surface.tick(&ctx, &notes);

        for event in surface.events().drain() {
            println!("[{:6.0} ms] {:?}", clock.now_ms(), event);
        }
        clock.advance(FRAME_MS);
    }
}

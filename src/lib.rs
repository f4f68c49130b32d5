//! # Tactile: MIDI Control-Surface Library
//!
//! `tactile` binds MIDI controller input (continuous controllers and note
//! edges) to on-screen performance widgets: knobs, buttons, toggles, and
//! free-running waveform generators. It is the value engine of a live-visual
//! ("VJ") control surface; actual drawing stays behind a small sink trait so
//! any GUI toolkit can host it.
//!
//! ## Architecture
//!
//! The library is organized in three layers:
//!
//! - **Signal layer** - pure value algorithms: waveform generation, range
//!   mapping with change detection, threshold edge detection, decay pulses
//! - **Control layer** - the widgets themselves, each a small state machine
//!   ticked once per frame
//! - **Surface layer** - widget storage, note dispatch, typed event
//!   delivery, and the versioned definition schema
//!
//! Everything runs on the host's cooperative frame loop. Each frame the host
//! queries its clock once, drains pending note events, and ticks the
//! surface; controls poll the MIDI source, recompute their state, and then
//! emit typed events and render commands.
//!
//! ## Quick Start
//!
//! ```rust
//! use tactile::prelude::*;
//!
//! // Describe a surface and build it.
//! let def = SurfaceDef::new("demo")
//!     .with_control(ControlDef::standard_knob("cutoff", Channel::All, 7))
//!     .with_control(ControlDef::standard_wave("sweep", WaveShape::Sine));
//! let mut surface = ControlRegistry::new().build(&def).unwrap();
//!
//! // Host-side collaborators.
//! let midi = MidiState::new();
//! let mut clock = ManualClock::new();
//! let tempo = FixedTempo::from_bpm(120.0);
//!
//! // One frame: feed input, tick, drain events.
//! midi.control_change(0, 7, 0.5);
//! let mut notes = Vec::new();
//! midi.drain_notes(&mut notes);
//! clock.advance(16.0);
//!
//! let ctx = TickContext::new(clock.now_ms(), &midi, &tempo);
//! surface.tick(&ctx, &notes);
//!
//! for event in surface.events().drain() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod binding;
pub mod controls;
pub mod events;
pub mod io;
pub mod render;
pub mod serialize;
pub mod signal;
pub mod surface;

/// Prelude module for convenient imports
pub mod prelude {
    // Bindings
    pub use crate::binding::{Channel, KnobBinding, NoteBinding};

    // Signal layer
    pub use crate::signal::{
        DecayPulse, RangedValue, ResponseCurve, ThresholdDetector, WaveShape, DEFAULT_THRESHOLD,
    };

    // Controls
    pub use crate::controls::{
        AnyControl, Button, ButtonState, Control, Knob, Stab, StabLength, TickContext, TickOutput,
        Toggle, Wave, DEFAULT_PERIOD_MS, PERIODS_PER_CYCLE,
    };

    // Surface
    pub use crate::surface::{ControlId, Surface, SurfaceConfig, SurfaceError};

    // Events
    pub use crate::events::{ControlEvent, EventBus};

    // External I/O
    pub use crate::io::{
        AtomicF64, Clock, ControlSource, FixedTempo, ManualClock, MidiState, NoteEdge, NoteEvent,
        NoteSource, SystemClock, TapTempo, TempoSource,
    };

    // Rendering
    pub use crate::render::{
        knob_angle, MemoryRenderer, NullRenderer, RenderCommand, RenderSink, SHADER_POSITION,
    };

    // Definitions
    pub use crate::serialize::{
        ControlDef, ControlMetadata, ControlRegistry, SerializeError, SurfaceDef,
        SURFACE_DEF_VERSION,
    };
}

// Re-export key types at crate root for convenience
pub use prelude::*;

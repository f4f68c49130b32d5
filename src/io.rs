//! External Input Integration
//!
//! This module provides the seams between the surface and its host: the MIDI
//! driver bridge, the frame clock, and the tempo source consumed by
//! beat-synced stabs.
//!
//! [`MidiState`] replaces the global static event fields of typical driver
//! plugins with an owned handle: a driver callback thread writes into it,
//! the UI thread polls continuous values lock-free and drains discrete note
//! events once per frame.

use crate::binding::{Channel, MAX_NUMBER};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Atomic f64 for lock-free communication between threads.
///
/// Uses `AtomicU64` internally since there's no native `AtomicF64`.
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

// =============================================================================
// MIDI State
// =============================================================================

/// A discrete note edge delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEdge {
    On,
    Off,
}

/// A note-on or note-off message, matched against control bindings by exact
/// channel + note identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Concrete channel index, 0–15.
    pub channel: u8,
    pub note: u8,
    /// Normalized velocity in `[0,1]`; 0 for note-off.
    pub velocity: f64,
    pub edge: NoteEdge,
}

/// Polled source of continuous controller values.
pub trait ControlSource {
    /// Current value of `control` on `channel`, normalized to `[0,1]`.
    /// Returns `fallback` when the controller has not been seen yet.
    fn knob(&self, channel: Channel, control: u8, fallback: f64) -> f64;
}

/// Source of queued discrete note events, drained once per frame.
pub trait NoteSource {
    /// Append all pending events to `out` in arrival order and clear the
    /// queue.
    fn drain_notes(&self, out: &mut Vec<NoteEvent>);
}

const CHANNEL_COUNT: usize = 16;
const SLOTS_PER_CHANNEL: usize = MAX_NUMBER as usize + 1;
// One extra bank aggregates the latest write from any channel, so wildcard
// reads see the most recent controller regardless of its channel.
const AGGREGATE_BANK: usize = CHANNEL_COUNT;

const MAX_PENDING_NOTES: usize = 1024;

/// Shared MIDI input state.
///
/// Continuous controller values live in a per-channel grid of [`AtomicF64`]
/// slots initialized to NaN ("never seen"); note events queue behind a mutex
/// that is only touched by the driver callback and the once-per-frame drain,
/// never inside the per-control tick path.
#[derive(Debug)]
pub struct MidiState {
    knobs: Vec<AtomicF64>,
    notes: Mutex<VecDeque<NoteEvent>>,
}

impl MidiState {
    pub fn new() -> Self {
        let mut knobs = Vec::with_capacity((CHANNEL_COUNT + 1) * SLOTS_PER_CHANNEL);
        for _ in 0..(CHANNEL_COUNT + 1) * SLOTS_PER_CHANNEL {
            knobs.push(AtomicF64::new(f64::NAN));
        }
        Self {
            knobs,
            notes: Mutex::new(VecDeque::new()),
        }
    }

    fn slot(&self, bank: usize, control: u8) -> &AtomicF64 {
        &self.knobs[bank * SLOTS_PER_CHANNEL + control as usize]
    }

    /// Record a control-change message. Called from the driver side.
    pub fn control_change(&self, channel: u8, control: u8, value: f64) {
        if channel as usize >= CHANNEL_COUNT || control > MAX_NUMBER {
            return;
        }
        let value = value.clamp(0.0, 1.0);
        self.slot(channel as usize, control).set(value);
        self.slot(AGGREGATE_BANK, control).set(value);
    }

    /// Record a note-on message. Called from the driver side.
    pub fn note_on(&self, channel: u8, note: u8, velocity: f64) {
        self.push_note(NoteEvent {
            channel,
            note,
            velocity: velocity.clamp(0.0, 1.0),
            edge: NoteEdge::On,
        });
    }

    /// Record a note-off message. Called from the driver side.
    pub fn note_off(&self, channel: u8, note: u8) {
        self.push_note(NoteEvent {
            channel,
            note,
            velocity: 0.0,
            edge: NoteEdge::Off,
        });
    }

    fn push_note(&self, event: NoteEvent) {
        if event.channel as usize >= CHANNEL_COUNT || event.note > MAX_NUMBER {
            return;
        }
        let mut queue = self.notes.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_PENDING_NOTES {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Number of queued, undrained note events.
    pub fn pending_notes(&self) -> usize {
        self.notes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MidiState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSource for MidiState {
    fn knob(&self, channel: Channel, control: u8, fallback: f64) -> f64 {
        if control > MAX_NUMBER {
            return fallback;
        }
        let bank = match channel.index() {
            Some(ch) if (ch as usize) < CHANNEL_COUNT => ch as usize,
            Some(_) => return fallback,
            None => AGGREGATE_BANK,
        };
        let value = self.slot(bank, control).get();
        if value.is_nan() {
            fallback
        } else {
            value
        }
    }
}

impl NoteSource for MidiState {
    fn drain_notes(&self, out: &mut Vec<NoteEvent>) {
        let mut queue = self.notes.lock().unwrap_or_else(|e| e.into_inner());
        out.extend(queue.drain(..));
    }
}

// =============================================================================
// Clocks
// =============================================================================

/// Monotonic frame clock, queried once per tick by the driver loop.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-advanced clock for tests, demos, and offline rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now_ms: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, delta_ms: f64) {
        self.now_ms += delta_ms.max(0.0);
    }

    pub fn set(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

// =============================================================================
// Tempo
// =============================================================================

/// Source of the most recent beat length, queried only when a stab runs in
/// sync mode.
pub trait TempoSource {
    fn beat_length_ms(&self) -> f64;
}

/// Constant tempo.
#[derive(Debug, Clone, Copy)]
pub struct FixedTempo {
    beat_ms: f64,
}

impl FixedTempo {
    pub fn new(beat_ms: f64) -> Self {
        Self { beat_ms }
    }

    pub fn from_bpm(bpm: f64) -> Self {
        Self {
            beat_ms: 60_000.0 / bpm.max(1.0),
        }
    }
}

impl Default for FixedTempo {
    fn default() -> Self {
        Self::from_bpm(120.0)
    }
}

impl TempoSource for FixedTempo {
    fn beat_length_ms(&self) -> f64 {
        self.beat_ms
    }
}

/// Tempo derived from successive taps (or external clock pulses); the beat
/// length is the gap between the last two taps.
#[derive(Debug, Clone, Copy)]
pub struct TapTempo {
    last_tap_ms: Option<f64>,
    beat_ms: f64,
}

impl TapTempo {
    pub fn new() -> Self {
        Self {
            last_tap_ms: None,
            beat_ms: 500.0,
        }
    }

    pub fn tap(&mut self, now_ms: f64) {
        if let Some(last) = self.last_tap_ms {
            let gap = now_ms - last;
            if gap > 0.0 {
                self.beat_ms = gap;
            }
        }
        self.last_tap_ms = Some(now_ms);
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}

impl TempoSource for TapTempo {
    fn beat_length_ms(&self) -> f64 {
        self.beat_ms
    }
}

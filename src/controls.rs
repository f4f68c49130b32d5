//! Performance Widgets
//!
//! The four controls that make up a surface: [`Knob`] (continuous ranged
//! value), [`Button`] (momentary with optional stab pulse), [`Toggle`]
//! (latched on/off), and [`Wave`] (free-running periodic generator).
//!
//! Each control implements [`Control`]: once per frame the surface calls
//! `tick` with the shared [`TickContext`], and routes matched note edges
//! through `handle_note`. State is recomputed first; events and render
//! commands are emitted after, through the [`TickOutput`] handed in by the
//! surface.

use crate::binding::{KnobBinding, NoteBinding};
use crate::events::{ControlEvent, EventBus};
use crate::io::{ControlSource, NoteEdge, NoteEvent, TempoSource};
use crate::render::{knob_angle, RenderCommand, RenderSink, SHADER_POSITION};
use crate::signal::{
    lerp, wave_position, DecayPulse, RangedValue, ResponseCurve, ThresholdDetector, WaveShape,
};
use crate::surface::ControlId;
use serde::{Deserialize, Serialize};

/// Per-frame inputs shared by every control: the frame time and the external
/// sources. Built once per tick by the driving host loop.
pub struct TickContext<'a> {
    pub now_ms: f64,
    pub midi: &'a dyn ControlSource,
    pub tempo: &'a dyn TempoSource,
}

impl<'a> TickContext<'a> {
    pub fn new(now_ms: f64, midi: &'a dyn ControlSource, tempo: &'a dyn TempoSource) -> Self {
        Self {
            now_ms,
            midi,
            tempo,
        }
    }
}

/// Emission handle passed to a control during tick and note dispatch.
///
/// Events go to the surface's [`EventBus`]; render commands go to the
/// optional sink and are silently skipped when none is installed.
pub struct TickOutput<'a> {
    id: ControlId,
    bus: &'a mut EventBus,
    renderer: Option<&'a mut (dyn RenderSink + 'static)>,
}

impl<'a> TickOutput<'a> {
    pub fn new(
        id: ControlId,
        bus: &'a mut EventBus,
        renderer: Option<&'a mut (dyn RenderSink + 'static)>,
    ) -> Self {
        Self { id, bus, renderer }
    }

    /// The id the surface assigned to the control being ticked.
    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn publish(&mut self, event: ControlEvent) {
        self.bus.publish(event);
    }

    pub fn render(&mut self, command: RenderCommand) {
        if let Some(sink) = self.renderer.as_mut() {
            sink.apply(command);
        }
    }
}

/// A widget hosted on a surface.
pub trait Control {
    /// Stable type tag, e.g. `"knob"`.
    fn kind(&self) -> &'static str;

    /// Binding label for UI skinning, e.g. `"ALL C7"`.
    fn label(&self) -> String;

    /// Drop transient state (drags, edge history, running pulses). Latched
    /// values survive.
    fn reset(&mut self);

    /// React to a discrete note edge. Controls filter by their own binding;
    /// the default implementation ignores notes entirely.
    fn handle_note(&mut self, _ctx: &TickContext, _event: &NoteEvent, _out: &mut TickOutput) {}

    /// Advance one frame: poll sources, recompute state, then emit.
    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput);
}

// =============================================================================
// Knob
// =============================================================================

/// Drag sensitivity baseline; pointer travel is scaled by this times the
/// surface's configured sensitivity.
const DRAG_SCALE: f64 = 0.005;

#[derive(Debug, Clone, Copy)]
struct DragState {
    origin: (f64, f64),
    offset: f64,
}

/// A continuous rotary control bound to a MIDI CC.
///
/// The stored value is always clamped to `[min, max]`; a change notification
/// fires exactly when the clamped value differs from the previous one.
pub struct Knob {
    binding: KnobBinding,
    value: RangedValue,
    curve: ResponseCurve,
    drag: Option<DragState>,
}

impl Knob {
    /// Standard knob over `[0, 1]` with a linear response.
    pub fn new(binding: KnobBinding) -> Self {
        Self {
            binding,
            value: RangedValue::new(0.0, 1.0),
            curve: ResponseCurve::Linear,
            drag: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.value = RangedValue::new(min, max);
        self
    }

    pub fn with_curve(mut self, curve: ResponseCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn binding(&self) -> KnobBinding {
        self.binding
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }

    pub fn min_value(&self) -> f64 {
        self.value.min()
    }

    pub fn max_value(&self) -> f64 {
        self.value.max()
    }

    /// Position within the bounds, `[0,1]`; 0 when the bounds are degenerate.
    pub fn normalized(&self) -> f64 {
        self.value.normalized()
    }

    /// The value mapped through the response curve; equals [`Knob::value`]
    /// for a linear curve.
    pub fn mapped_value(&self) -> f64 {
        self.curve
            .apply(self.value.min(), self.value.max(), self.value.normalized())
    }

    pub(crate) fn apply(&mut self, raw: f64, out: &mut TickOutput) -> bool {
        match self.value.set(raw) {
            Some(new_value) => {
                out.render(RenderCommand::Rotation {
                    id: out.id(),
                    degrees: knob_angle(self.value.normalized()),
                });
                out.publish(ControlEvent::Value {
                    id: out.id(),
                    value: new_value,
                });
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_bounds(&mut self, min: f64, max: f64, out: &mut TickOutput) -> bool {
        match self.value.set_bounds(min, max) {
            Some(new_value) => {
                out.render(RenderCommand::Rotation {
                    id: out.id(),
                    degrees: knob_angle(self.value.normalized()),
                });
                out.publish(ControlEvent::Value {
                    id: out.id(),
                    value: new_value,
                });
                true
            }
            None => false,
        }
    }

    /// Start a pointer drag at `point` (local coordinates). The current
    /// normalized value becomes the drag offset.
    pub fn begin_drag(&mut self, point: (f64, f64)) {
        self.drag = Some(DragState {
            origin: point,
            offset: self.value.normalized(),
        });
    }

    pub(crate) fn drag_to(&mut self, point: (f64, f64), sensitivity: f64, out: &mut TickOutput) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        // Project pointer travel onto the (1,1) diagonal: up-right raises.
        let travel = (point.0 - drag.origin.0) + (point.1 - drag.origin.1);
        let normalized = drag.offset + travel * sensitivity * DRAG_SCALE;
        let raw = lerp(self.value.min(), self.value.max(), normalized);
        self.apply(raw, out)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

impl Control for Knob {
    fn kind(&self) -> &'static str {
        "knob"
    }

    fn label(&self) -> String {
        self.binding.label()
    }

    fn reset(&mut self) {
        self.drag = None;
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        // The current value doubles as the fallback hint, so an unseen
        // controller leaves the knob where it is.
        let sampled = ctx
            .midi
            .knob(self.binding.channel, self.binding.control, self.value.get());
        self.apply(sampled, out);
    }
}

// =============================================================================
// Button
// =============================================================================

/// Momentary button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Normal,
    Pressed,
}

/// Length of a stab pulse: a fixed duration, or a beat count resolved
/// against the tempo source at trigger time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabLength {
    FixedMs(f64),
    Beats(f64),
}

/// Configuration of the decaying pulse a button fires on press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stab {
    pub starting_value: f64,
    pub ending_value: f64,
    pub length: StabLength,
}

impl Stab {
    pub fn new(starting_value: f64, ending_value: f64, length: StabLength) -> Self {
        Self {
            starting_value,
            ending_value,
            length,
        }
    }
}

/// A momentary button bound to a note, with an optional continuous-control
/// trigger path and an optional stab pulse.
///
/// Down and up are independent notifications; any trigger-down moves the
/// state machine to `Pressed` and any trigger-up back to `Normal`.
pub struct Button {
    binding: NoteBinding,
    control: Option<KnobBinding>,
    detector: ThresholdDetector,
    state: ButtonState,
    stab: Option<Stab>,
    active_stab: Option<DecayPulse>,
}

impl Button {
    pub fn new(binding: NoteBinding) -> Self {
        Self {
            binding,
            control: None,
            detector: ThresholdDetector::default(),
            state: ButtonState::Normal,
            stab: None,
            active_stab: None,
        }
    }

    /// Additionally trigger from a continuous controller crossing the
    /// threshold. Coexists with the note path.
    pub fn with_control(mut self, control: KnobBinding) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.detector = ThresholdDetector::new(threshold);
        self
    }

    /// Fire a stab pulse on every press.
    pub fn with_stab(mut self, stab: Stab) -> Self {
        self.stab = Some(stab);
        self
    }

    pub fn binding(&self) -> NoteBinding {
        self.binding
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        self.state == ButtonState::Pressed
    }

    pub(crate) fn press(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        self.state = ButtonState::Pressed;
        if let Some(stab) = self.stab {
            let length_ms = match stab.length {
                StabLength::FixedMs(ms) => ms,
                StabLength::Beats(beats) => ctx.tempo.beat_length_ms() * beats,
            };
            self.active_stab = Some(DecayPulse::begin(
                ctx.now_ms,
                length_ms,
                stab.starting_value,
                stab.ending_value,
            ));
        }
        out.render(RenderCommand::Selection {
            id: out.id(),
            pressed: true,
        });
        out.publish(ControlEvent::ButtonDown { id: out.id() });
    }

    pub(crate) fn release(&mut self, out: &mut TickOutput) {
        self.state = ButtonState::Normal;
        out.render(RenderCommand::Selection {
            id: out.id(),
            pressed: false,
        });
        out.publish(ControlEvent::ButtonUp { id: out.id() });
    }
}

impl Control for Button {
    fn kind(&self) -> &'static str {
        "button"
    }

    fn label(&self) -> String {
        self.binding.label()
    }

    fn reset(&mut self) {
        self.state = ButtonState::Normal;
        self.detector.reset();
        self.active_stab = None;
    }

    fn handle_note(&mut self, ctx: &TickContext, event: &NoteEvent, out: &mut TickOutput) {
        if !self.binding.matches(event.channel, event.note) {
            return;
        }
        match event.edge {
            NoteEdge::On => self.press(ctx, out),
            NoteEdge::Off => self.release(out),
        }
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        if let Some(control) = self.control {
            let sampled = ctx
                .midi
                .knob(control.channel, control.control, self.detector.previous());
            match self.detector.sample(sampled) {
                Some(true) => self.press(ctx, out),
                Some(false) => self.release(out),
                None => {}
            }
        }

        if let Some(pulse) = self.active_stab {
            match pulse.sample(ctx.now_ms) {
                Some(value) => out.publish(ControlEvent::Stab {
                    id: out.id(),
                    value,
                }),
                None => self.active_stab = None,
            }
        }
    }
}

// =============================================================================
// Toggle
// =============================================================================

/// A latched on/off switch bound to a note, or optionally to a continuous
/// controller.
///
/// The two input modalities behave differently on purpose: a click or a
/// matched note-on *inverts* the state, while continuous-control sampling
/// *levels* it to the threshold comparison. While a control binding is
/// installed, the note path is disabled.
pub struct Toggle {
    binding: NoteBinding,
    control: Option<KnobBinding>,
    detector: ThresholdDetector,
    is_on: bool,
}

impl Toggle {
    pub fn new(binding: NoteBinding) -> Self {
        Self {
            binding,
            control: None,
            detector: ThresholdDetector::default(),
            is_on: false,
        }
    }

    /// Drive the toggle from a continuous controller instead of notes.
    pub fn with_control(mut self, control: KnobBinding) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.detector = ThresholdDetector::new(threshold);
        self
    }

    pub fn binding(&self) -> NoteBinding {
        self.binding
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub(crate) fn set_on(&mut self, on: bool, out: &mut TickOutput) -> bool {
        if self.is_on == on {
            return false;
        }
        self.is_on = on;
        out.render(RenderCommand::Alpha {
            id: out.id(),
            alpha: if on { 1.0 } else { 0.0 },
        });
        out.publish(ControlEvent::Switch { id: out.id(), on });
        true
    }

    /// Direct interaction: invert the state.
    pub(crate) fn click(&mut self, out: &mut TickOutput) {
        let next = !self.is_on;
        self.set_on(next, out);
    }
}

impl Control for Toggle {
    fn kind(&self) -> &'static str {
        "toggle"
    }

    fn label(&self) -> String {
        match self.control {
            Some(control) => control.label(),
            None => self.binding.label(),
        }
    }

    fn reset(&mut self) {
        self.detector.reset();
    }

    fn handle_note(&mut self, _ctx: &TickContext, event: &NoteEvent, out: &mut TickOutput) {
        if self.control.is_some() || !self.binding.matches(event.channel, event.note) {
            return;
        }
        match event.edge {
            NoteEdge::On => {
                // Edge path inverts; the level path in tick() sets.
                let next = !self.is_on;
                self.set_on(next, out);
                out.render(RenderCommand::Selection {
                    id: out.id(),
                    pressed: true,
                });
            }
            NoteEdge::Off => {
                out.render(RenderCommand::Selection {
                    id: out.id(),
                    pressed: false,
                });
            }
        }
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        let Some(control) = self.control else {
            return;
        };
        let sampled = ctx
            .midi
            .knob(control.channel, control.control, self.detector.previous());
        if let Some(level) = self.detector.sample(sampled) {
            out.render(RenderCommand::Selection {
                id: out.id(),
                pressed: level,
            });
            self.set_on(level, out);
        }
    }
}

// =============================================================================
// Wave
// =============================================================================

/// Waveform periods displayed per graphic cycle.
pub const PERIODS_PER_CYCLE: f64 = 2.0;

/// Default wave period in milliseconds.
pub const DEFAULT_PERIOD_MS: f64 = 2000.0;

/// A free-running periodic signal generator.
///
/// Unlike the knob, the wave publishes a sample every tick whether or not
/// the value changed; downstream visuals animate from the steady stream.
pub struct Wave {
    shape: WaveShape,
    period_ms: f64,
    offset_ms: f64,
    position: f64,
    value: f64,
}

impl Wave {
    /// Create a generator with the default 2000 ms period and zero offset.
    pub fn new(shape: WaveShape) -> Self {
        Self {
            shape,
            period_ms: DEFAULT_PERIOD_MS,
            offset_ms: 0.0,
            position: 0.0,
            value: 0.0,
        }
    }

    /// # Panics
    /// Panics if `period_ms` is not positive.
    pub fn with_period(mut self, period_ms: f64) -> Self {
        assert!(period_ms > 0.0, "wave period must be positive");
        self.period_ms = period_ms;
        self
    }

    pub fn with_offset(mut self, offset_ms: f64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    pub fn shape(&self) -> WaveShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: WaveShape) {
        self.shape = shape;
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    /// Cycle position from the last tick, in `[0,1)`.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Waveform value from the last tick, in `[-1,1]`.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Control for Wave {
    fn kind(&self) -> &'static str {
        "wave"
    }

    fn label(&self) -> String {
        format!("{:?}", self.shape).to_uppercase()
    }

    fn reset(&mut self) {
        self.position = 0.0;
        self.value = 0.0;
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        self.position = wave_position(ctx.now_ms, self.period_ms, self.offset_ms, PERIODS_PER_CYCLE);
        self.value = self.shape.value_at(self.position, PERIODS_PER_CYCLE);

        out.render(RenderCommand::ShaderParam {
            id: out.id(),
            name: SHADER_POSITION.to_string(),
            value: self.position,
        });
        out.publish(ControlEvent::WaveSample {
            id: out.id(),
            position: self.position,
            value: self.value,
        });
    }
}

// =============================================================================
// Type-erased storage
// =============================================================================

/// A control of any kind, as stored by the surface.
pub enum AnyControl {
    Knob(Knob),
    Button(Button),
    Toggle(Toggle),
    Wave(Wave),
}

impl AnyControl {
    pub fn as_knob_mut(&mut self) -> Option<&mut Knob> {
        match self {
            AnyControl::Knob(knob) => Some(knob),
            _ => None,
        }
    }

    pub fn as_button_mut(&mut self) -> Option<&mut Button> {
        match self {
            AnyControl::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn as_toggle_mut(&mut self) -> Option<&mut Toggle> {
        match self {
            AnyControl::Toggle(toggle) => Some(toggle),
            _ => None,
        }
    }

    pub fn as_wave_mut(&mut self) -> Option<&mut Wave> {
        match self {
            AnyControl::Wave(wave) => Some(wave),
            _ => None,
        }
    }

    pub fn as_knob(&self) -> Option<&Knob> {
        match self {
            AnyControl::Knob(knob) => Some(knob),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<&Button> {
        match self {
            AnyControl::Button(button) => Some(button),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<&Toggle> {
        match self {
            AnyControl::Toggle(toggle) => Some(toggle),
            _ => None,
        }
    }

    pub fn as_wave(&self) -> Option<&Wave> {
        match self {
            AnyControl::Wave(wave) => Some(wave),
            _ => None,
        }
    }
}

impl Control for AnyControl {
    fn kind(&self) -> &'static str {
        match self {
            AnyControl::Knob(c) => c.kind(),
            AnyControl::Button(c) => c.kind(),
            AnyControl::Toggle(c) => c.kind(),
            AnyControl::Wave(c) => c.kind(),
        }
    }

    fn label(&self) -> String {
        match self {
            AnyControl::Knob(c) => c.label(),
            AnyControl::Button(c) => c.label(),
            AnyControl::Toggle(c) => c.label(),
            AnyControl::Wave(c) => c.label(),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyControl::Knob(c) => c.reset(),
            AnyControl::Button(c) => c.reset(),
            AnyControl::Toggle(c) => c.reset(),
            AnyControl::Wave(c) => c.reset(),
        }
    }

    fn handle_note(&mut self, ctx: &TickContext, event: &NoteEvent, out: &mut TickOutput) {
        match self {
            AnyControl::Knob(c) => c.handle_note(ctx, event, out),
            AnyControl::Button(c) => c.handle_note(ctx, event, out),
            AnyControl::Toggle(c) => c.handle_note(ctx, event, out),
            AnyControl::Wave(c) => c.handle_note(ctx, event, out),
        }
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut TickOutput) {
        match self {
            AnyControl::Knob(c) => c.tick(ctx, out),
            AnyControl::Button(c) => c.tick(ctx, out),
            AnyControl::Toggle(c) => c.tick(ctx, out),
            AnyControl::Wave(c) => c.tick(ctx, out),
        }
    }
}

impl From<Knob> for AnyControl {
    fn from(knob: Knob) -> Self {
        AnyControl::Knob(knob)
    }
}

impl From<Button> for AnyControl {
    fn from(button: Button) -> Self {
        AnyControl::Button(button)
    }
}

impl From<Toggle> for AnyControl {
    fn from(toggle: Toggle) -> Self {
        AnyControl::Toggle(toggle)
    }
}

impl From<Wave> for AnyControl {
    fn from(wave: Wave) -> Self {
        AnyControl::Wave(wave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Channel;
    use crate::io::FixedTempo;
    use crate::render::MemoryRenderer;

    // Source that reports one fixed value for every controller.
    struct StaticSource(f64);

    impl ControlSource for StaticSource {
        fn knob(&self, _channel: Channel, _control: u8, _fallback: f64) -> f64 {
            self.0
        }
    }

    // Source that has never seen any controller.
    struct SilentSource;

    impl ControlSource for SilentSource {
        fn knob(&self, _channel: Channel, _control: u8, fallback: f64) -> f64 {
            fallback
        }
    }

    fn note_on(channel: u8, note: u8) -> NoteEvent {
        NoteEvent {
            channel,
            note,
            velocity: 1.0,
            edge: NoteEdge::On,
        }
    }

    fn note_off(channel: u8, note: u8) -> NoteEvent {
        NoteEvent {
            channel,
            note,
            velocity: 0.0,
            edge: NoteEdge::Off,
        }
    }

    struct Harness {
        bus: EventBus,
        renderer: MemoryRenderer,
        tempo: FixedTempo,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                bus: EventBus::new(),
                renderer: MemoryRenderer::new(),
                tempo: FixedTempo::from_bpm(120.0),
            }
        }

        fn tick(&mut self, control: &mut dyn Control, now_ms: f64, midi: &dyn ControlSource) {
            let ctx = TickContext::new(now_ms, midi, &self.tempo);
            let mut out = TickOutput::new(
                ControlId::default(),
                &mut self.bus,
                Some(&mut self.renderer),
            );
            control.tick(&ctx, &mut out);
        }

        fn note(&mut self, control: &mut dyn Control, now_ms: f64, event: NoteEvent) {
            let midi = SilentSource;
            let ctx = TickContext::new(now_ms, &midi, &self.tempo);
            let mut out = TickOutput::new(
                ControlId::default(),
                &mut self.bus,
                Some(&mut self.renderer),
            );
            control.handle_note(&ctx, &event, &mut out);
        }

        fn events(&mut self) -> Vec<ControlEvent> {
            self.bus.drain()
        }
    }

    #[test]
    fn test_knob_follows_control_source() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::new(Channel::All, 7));

        harness.tick(&mut knob, 0.0, &StaticSource(0.5));
        assert_eq!(knob.value(), 0.5);
        let events = harness.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ControlEvent::Value { value, .. } if value == 0.5));

        // Same sample again: no change, no notification.
        harness.tick(&mut knob, 16.0, &StaticSource(0.5));
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_knob_unseen_controller_is_silent() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::default()).with_range(0.25, 0.75);
        let initial = knob.value();

        harness.tick(&mut knob, 0.0, &SilentSource);
        assert_eq!(knob.value(), initial);
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_knob_clamps_into_range() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::default()).with_range(0.2, 0.6);

        harness.tick(&mut knob, 0.0, &StaticSource(1.0));
        assert_eq!(knob.value(), 0.6);
        harness.tick(&mut knob, 16.0, &StaticSource(0.0));
        assert_eq!(knob.value(), 0.2);
    }

    #[test]
    fn test_knob_rotation_render() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::default());

        harness.tick(&mut knob, 0.0, &StaticSource(1.0));
        assert!(harness
            .renderer
            .commands
            .iter()
            .any(|c| matches!(c, RenderCommand::Rotation { degrees, .. } if *degrees == -179.0)));
    }

    #[test]
    fn test_knob_drag() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::default());

        knob.begin_drag((0.0, 0.0));
        assert!(knob.is_dragging());
        {
            let mut out = TickOutput::new(
                ControlId::default(),
                &mut harness.bus,
                Some(&mut harness.renderer),
            );
            // 200 units of diagonal travel at sensitivity 1 covers the full
            // normalized range.
            assert!(knob.drag_to((100.0, 100.0), 1.0, &mut out));
        }
        assert_eq!(knob.value(), 1.0);
        knob.end_drag();
        assert!(!knob.is_dragging());
    }

    #[test]
    fn test_knob_drag_without_begin_is_ignored() {
        let mut harness = Harness::new();
        let mut knob = Knob::new(KnobBinding::default());
        let mut out = TickOutput::new(
            ControlId::default(),
            &mut harness.bus,
            Some(&mut harness.renderer),
        );
        assert!(!knob.drag_to((50.0, 50.0), 1.0, &mut out));
        assert_eq!(knob.value(), 0.0);
    }

    #[test]
    fn test_knob_exponential_mapping() {
        let knob = Knob::new(KnobBinding::default())
            .with_range(1.0, 100.0)
            .with_curve(ResponseCurve::Exponential);
        // Fresh knob sits at min; mapped value starts at the floor.
        assert!((knob.mapped_value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_button_note_edges() {
        let mut harness = Harness::new();
        let mut button = Button::new(NoteBinding::new(Channel::Ch(0), 60));

        harness.note(&mut button, 0.0, note_on(0, 60));
        assert!(button.is_pressed());
        harness.note(&mut button, 10.0, note_off(0, 60));
        assert!(!button.is_pressed());

        let events = harness.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ControlEvent::ButtonDown { .. }));
        assert!(matches!(events[1], ControlEvent::ButtonUp { .. }));
    }

    #[test]
    fn test_button_ignores_other_notes() {
        let mut harness = Harness::new();
        let mut button = Button::new(NoteBinding::new(Channel::Ch(0), 60));

        harness.note(&mut button, 0.0, note_on(0, 61));
        harness.note(&mut button, 0.0, note_on(1, 60));
        assert!(!button.is_pressed());
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_button_wildcard_channel() {
        let mut harness = Harness::new();
        let mut button = Button::new(NoteBinding::new(Channel::All, 60));

        harness.note(&mut button, 0.0, note_on(9, 60));
        assert!(button.is_pressed());
    }

    #[test]
    fn test_button_threshold_path() {
        let mut harness = Harness::new();
        let mut button =
            Button::new(NoteBinding::new(Channel::All, 0)).with_control(KnobBinding::new(Channel::All, 16));

        harness.tick(&mut button, 0.0, &StaticSource(0.3));
        assert!(!button.is_pressed());
        harness.tick(&mut button, 16.0, &StaticSource(0.7));
        assert!(button.is_pressed());
        // Unchanged sample: no retrigger.
        harness.events();
        harness.tick(&mut button, 32.0, &StaticSource(0.7));
        assert!(harness.events().is_empty());
        // Falling below the threshold releases.
        harness.tick(&mut button, 48.0, &StaticSource(0.4));
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_button_fixed_stab() {
        let mut harness = Harness::new();
        let mut button = Button::new(NoteBinding::new(Channel::All, 60))
            .with_stab(Stab::new(1.0, 0.0, StabLength::FixedMs(1000.0)));

        harness.note(&mut button, 0.0, note_on(0, 60));
        harness.events();

        harness.tick(&mut button, 500.0, &SilentSource);
        let events = harness.events();
        assert_eq!(events.len(), 1);
        assert!(
            matches!(events[0], ControlEvent::Stab { value, .. } if (value - 0.5).abs() < 1e-9)
        );

        // Expired: nothing more comes out.
        harness.tick(&mut button, 1000.0, &SilentSource);
        harness.tick(&mut button, 1016.0, &SilentSource);
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_button_synced_stab_uses_tempo() {
        let mut harness = Harness::new();
        // 120 bpm -> 500 ms beats; two beats -> 1000 ms pulse.
        let mut button = Button::new(NoteBinding::new(Channel::All, 60))
            .with_stab(Stab::new(1.0, 0.0, StabLength::Beats(2.0)));

        harness.note(&mut button, 0.0, note_on(0, 60));
        harness.events();

        harness.tick(&mut button, 250.0, &SilentSource);
        let events = harness.events();
        assert!(
            matches!(events[0], ControlEvent::Stab { value, .. } if (value - 0.75).abs() < 1e-9)
        );

        harness.tick(&mut button, 1100.0, &SilentSource);
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_button_repress_restarts_stab() {
        let mut harness = Harness::new();
        let mut button = Button::new(NoteBinding::new(Channel::All, 60))
            .with_stab(Stab::new(1.0, 0.0, StabLength::FixedMs(100.0)));

        harness.note(&mut button, 0.0, note_on(0, 60));
        harness.tick(&mut button, 200.0, &SilentSource);
        harness.events();

        // Second press after expiry arms a fresh pulse.
        harness.note(&mut button, 300.0, note_on(0, 60));
        harness.tick(&mut button, 350.0, &SilentSource);
        let events = harness.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, ControlEvent::Stab { value, .. } if (value - 0.5).abs() < 1e-9)));
    }

    #[test]
    fn test_toggle_click_inverts() {
        let mut harness = Harness::new();
        let mut toggle = Toggle::new(NoteBinding::new(Channel::All, 62));
        {
            let mut out = TickOutput::new(
                ControlId::default(),
                &mut harness.bus,
                Some(&mut harness.renderer),
            );
            toggle.click(&mut out);
        }
        assert!(toggle.is_on());
        {
            let mut out = TickOutput::new(
                ControlId::default(),
                &mut harness.bus,
                Some(&mut harness.renderer),
            );
            toggle.click(&mut out);
        }
        assert!(!toggle.is_on());

        let events = harness.events();
        assert!(matches!(events[0], ControlEvent::Switch { on: true, .. }));
        assert!(matches!(events[1], ControlEvent::Switch { on: false, .. }));
    }

    #[test]
    fn test_toggle_note_inverts_and_off_does_not() {
        let mut harness = Harness::new();
        let mut toggle = Toggle::new(NoteBinding::new(Channel::Ch(0), 62));

        harness.note(&mut toggle, 0.0, note_on(0, 62));
        assert!(toggle.is_on());
        harness.note(&mut toggle, 10.0, note_off(0, 62));
        assert!(toggle.is_on());
        harness.note(&mut toggle, 20.0, note_on(0, 62));
        assert!(!toggle.is_on());
    }

    #[test]
    fn test_toggle_control_mode_levels_state() {
        let mut harness = Harness::new();
        let mut toggle =
            Toggle::new(NoteBinding::new(Channel::All, 0)).with_control(KnobBinding::new(Channel::All, 16));

        harness.tick(&mut toggle, 0.0, &StaticSource(0.7));
        assert!(toggle.is_on());
        // Above threshold again after a change: still on, levelled not
        // inverted.
        harness.tick(&mut toggle, 16.0, &StaticSource(0.9));
        assert!(toggle.is_on());
        harness.tick(&mut toggle, 32.0, &StaticSource(0.2));
        assert!(!toggle.is_on());
    }

    #[test]
    fn test_toggle_control_mode_disables_note_path() {
        let mut harness = Harness::new();
        let mut toggle =
            Toggle::new(NoteBinding::new(Channel::All, 62)).with_control(KnobBinding::new(Channel::All, 16));

        harness.note(&mut toggle, 0.0, note_on(0, 62));
        assert!(!toggle.is_on());
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_toggle_unchanged_sample_does_not_retrigger() {
        let mut harness = Harness::new();
        let mut toggle =
            Toggle::new(NoteBinding::new(Channel::All, 0)).with_control(KnobBinding::new(Channel::All, 16));

        harness.tick(&mut toggle, 0.0, &StaticSource(0.7));
        harness.events();
        harness.renderer.clear();

        harness.tick(&mut toggle, 16.0, &StaticSource(0.7));
        assert!(harness.events().is_empty());
        assert!(harness.renderer.commands.is_empty());
    }

    #[test]
    fn test_wave_emits_every_tick() {
        let mut harness = Harness::new();
        let mut wave = Wave::new(WaveShape::Sine);

        harness.tick(&mut wave, 0.0, &SilentSource);
        harness.tick(&mut wave, 0.0, &SilentSource);
        let events = harness.events();
        // Two ticks at the same instant still publish twice.
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ControlEvent::WaveSample { position, value, .. } if position == 0.0 && value == 0.0
        ));
    }

    #[test]
    fn test_wave_shader_position_render() {
        let mut harness = Harness::new();
        let mut wave = Wave::new(WaveShape::Sine).with_period(2000.0);

        harness.tick(&mut wave, 1000.0, &SilentSource);
        assert!(harness.renderer.commands.iter().any(|c| matches!(
            c,
            RenderCommand::ShaderParam { name, value, .. }
                if name == SHADER_POSITION && (*value - 0.25).abs() < 1e-9
        )));
    }

    #[test]
    fn test_wave_negative_offset_stays_in_range() {
        let mut harness = Harness::new();
        let mut wave = Wave::new(WaveShape::Saw).with_offset(-5000.0);

        harness.tick(&mut wave, 0.0, &SilentSource);
        assert!((0.0..1.0).contains(&wave.position()));
    }

    #[test]
    fn test_labels() {
        let knob = Knob::new(KnobBinding::new(Channel::All, 7));
        assert_eq!(knob.label(), "ALL C7");

        let toggle =
            Toggle::new(NoteBinding::new(Channel::Ch(2), 62)).with_control(KnobBinding::new(Channel::Ch(2), 20));
        // Control mode labels by controller, not note.
        assert_eq!(toggle.label(), "CH3 C20");

        let wave = Wave::new(WaveShape::InverseSaw);
        assert_eq!(wave.label(), "INVERSESAW");
    }
}

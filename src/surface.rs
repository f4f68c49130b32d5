//! Control Surface
//!
//! A [`Surface`] owns a set of controls, drives them once per frame from the
//! host loop, and fans their output into the event bus and the optional
//! render sink. Within one tick, queued note edges are dispatched first,
//! then every control is ticked in insertion order; each control recomputes
//! its state before anything is emitted.
//!
//! The surface runs entirely on the host's cooperative frame loop: no
//! threads, no locks in the tick path, each control owning its state
//! exclusively.

use crate::controls::{AnyControl, Button, Control, Knob, TickContext, TickOutput, Toggle};
use crate::events::EventBus;
use crate::io::NoteEvent;
use crate::render::{RenderCommand, RenderSink};
use serde::{Deserialize, Serialize};
use slotmap::{DefaultKey, SlotMap};
use std::fmt;

/// Unique identifier for a control hosted on a surface.
pub type ControlId = DefaultKey;

/// Surface-wide interaction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Scales pointer travel during knob drags.
    pub knob_sensitivity: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            knob_sensitivity: 1.0,
        }
    }
}

/// Error types for surface operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    UnknownControl,
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::UnknownControl => write!(f, "Unknown control"),
            SurfaceError::WrongKind { expected, found } => {
                write!(f, "Expected a {}, found a {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

struct Slot {
    control: AnyControl,
    name: String,
}

/// The control surface: widget storage, per-frame driver, and emission hub.
pub struct Surface {
    controls: SlotMap<ControlId, Slot>,
    // Tick and dispatch follow insertion order; SlotMap iteration alone does
    // not guarantee it.
    order: Vec<ControlId>,
    bus: EventBus,
    renderer: Option<Box<dyn RenderSink>>,
    config: SurfaceConfig,
}

impl Surface {
    pub fn new() -> Self {
        Self::with_config(SurfaceConfig::default())
    }

    pub fn with_config(config: SurfaceConfig) -> Self {
        Self {
            controls: SlotMap::new(),
            order: Vec::new(),
            bus: EventBus::new(),
            renderer: None,
            config,
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SurfaceConfig {
        &mut self.config
    }

    /// Install the render sink. Controls added before or after both reach it.
    pub fn set_renderer(&mut self, renderer: Box<dyn RenderSink>) {
        self.renderer = Some(renderer);
    }

    /// Remove the render sink; visual updates are skipped from now on.
    pub fn clear_renderer(&mut self) {
        self.renderer = None;
    }

    /// Add a control under a host-chosen name. Emits the control's binding
    /// label to the renderer so skins can annotate the widget.
    pub fn add(&mut self, name: impl Into<String>, control: impl Into<AnyControl>) -> ControlId {
        let slot = Slot {
            control: control.into(),
            name: name.into(),
        };
        let label = slot.control.label();
        let id = self.controls.insert(slot);
        self.order.push(id);
        if let Some(sink) = self.renderer.as_deref_mut() {
            sink.apply(RenderCommand::Label { id, text: label });
        }
        id
    }

    /// Remove a control, returning it. Its event subscription (if any) is
    /// dropped with it, so delivery stops deterministically.
    pub fn remove(&mut self, id: ControlId) -> Result<AnyControl, SurfaceError> {
        let slot = self
            .controls
            .remove(id)
            .ok_or(SurfaceError::UnknownControl)?;
        self.order.retain(|&other| other != id);
        self.bus.unsubscribe(id);
        Ok(slot.control)
    }

    pub fn get(&self, id: ControlId) -> Option<&AnyControl> {
        self.controls.get(id).map(|slot| &slot.control)
    }

    pub fn get_mut(&mut self, id: ControlId) -> Option<&mut AnyControl> {
        self.controls.get_mut(id).map(|slot| &mut slot.control)
    }

    pub fn name(&self, id: ControlId) -> Option<&str> {
        self.controls.get(id).map(|slot| slot.name.as_str())
    }

    /// Control ids in insertion (tick) order.
    pub fn ids(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn clear(&mut self) {
        self.controls.clear();
        self.order.clear();
    }

    /// Drop transient state on every control.
    pub fn reset_all(&mut self) {
        for (_, slot) in self.controls.iter_mut() {
            slot.control.reset();
        }
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Advance one frame: dispatch `notes` to every control (each filters by
    /// its own binding), then tick every control, all in insertion order.
    pub fn tick(&mut self, ctx: &TickContext, notes: &[NoteEvent]) {
        let Self {
            controls,
            order,
            bus,
            renderer,
            ..
        } = self;

        for event in notes {
            for &id in order.iter() {
                if let Some(slot) = controls.get_mut(id) {
                    let mut out = TickOutput::new(id, bus, renderer.as_deref_mut());
                    slot.control.handle_note(ctx, event, &mut out);
                }
            }
        }

        for &id in order.iter() {
            if let Some(slot) = controls.get_mut(id) {
                let mut out = TickOutput::new(id, bus, renderer.as_deref_mut());
                slot.control.tick(ctx, &mut out);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Direct interaction
    // -------------------------------------------------------------------------

    fn try_knob<R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&mut Knob, &mut TickOutput) -> R,
    ) -> Result<R, SurfaceError> {
        let Self {
            controls,
            bus,
            renderer,
            ..
        } = self;
        let slot = controls.get_mut(id).ok_or(SurfaceError::UnknownControl)?;
        let found = slot.control.kind();
        let Some(knob) = slot.control.as_knob_mut() else {
            return Err(SurfaceError::WrongKind {
                expected: "knob",
                found,
            });
        };
        let mut out = TickOutput::new(id, bus, renderer.as_deref_mut());
        Ok(f(knob, &mut out))
    }

    fn try_button<R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&mut Button, &mut TickOutput) -> R,
    ) -> Result<R, SurfaceError> {
        let Self {
            controls,
            bus,
            renderer,
            ..
        } = self;
        let slot = controls.get_mut(id).ok_or(SurfaceError::UnknownControl)?;
        let found = slot.control.kind();
        let Some(button) = slot.control.as_button_mut() else {
            return Err(SurfaceError::WrongKind {
                expected: "button",
                found,
            });
        };
        let mut out = TickOutput::new(id, bus, renderer.as_deref_mut());
        Ok(f(button, &mut out))
    }

    fn try_toggle<R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&mut Toggle, &mut TickOutput) -> R,
    ) -> Result<R, SurfaceError> {
        let Self {
            controls,
            bus,
            renderer,
            ..
        } = self;
        let slot = controls.get_mut(id).ok_or(SurfaceError::UnknownControl)?;
        let found = slot.control.kind();
        let Some(toggle) = slot.control.as_toggle_mut() else {
            return Err(SurfaceError::WrongKind {
                expected: "toggle",
                found,
            });
        };
        let mut out = TickOutput::new(id, bus, renderer.as_deref_mut());
        Ok(f(toggle, &mut out))
    }

    /// Set a knob's value directly. Returns whether the clamped value
    /// changed (and therefore notified).
    pub fn set_knob_value(&mut self, id: ControlId, raw: f64) -> Result<bool, SurfaceError> {
        self.try_knob(id, |knob, out| knob.apply(raw, out))
    }

    /// Replace a knob's bounds, re-clamping its value.
    pub fn set_knob_bounds(
        &mut self,
        id: ControlId,
        min: f64,
        max: f64,
    ) -> Result<bool, SurfaceError> {
        self.try_knob(id, |knob, out| knob.set_bounds(min, max, out))
    }

    /// Begin a pointer drag on a knob.
    pub fn begin_drag(&mut self, id: ControlId, point: (f64, f64)) -> Result<(), SurfaceError> {
        self.try_knob(id, |knob, _out| knob.begin_drag(point))
    }

    /// Continue a pointer drag, applying the configured sensitivity.
    pub fn drag(&mut self, id: ControlId, point: (f64, f64)) -> Result<bool, SurfaceError> {
        let sensitivity = self.config.knob_sensitivity;
        self.try_knob(id, |knob, out| knob.drag_to(point, sensitivity, out))
    }

    /// Finish a pointer drag.
    pub fn end_drag(&mut self, id: ControlId) -> Result<(), SurfaceError> {
        self.try_knob(id, |knob, _out| knob.end_drag())
    }

    /// Press a button directly (pointer down). The context supplies the
    /// trigger time and tempo for a synced stab.
    pub fn press_button(&mut self, id: ControlId, ctx: &TickContext) -> Result<(), SurfaceError> {
        self.try_button(id, |button, out| button.press(ctx, out))
    }

    /// Release a button directly (pointer up).
    pub fn release_button(&mut self, id: ControlId) -> Result<(), SurfaceError> {
        self.try_button(id, |button, out| button.release(out))
    }

    /// Click a toggle directly, inverting its state.
    pub fn click_toggle(&mut self, id: ControlId) -> Result<(), SurfaceError> {
        self.try_toggle(id, |toggle, out| {
            toggle.click(out);
        })
    }

    /// Set a toggle's state directly. Returns whether it changed.
    pub fn set_toggle(&mut self, id: ControlId, on: bool) -> Result<bool, SurfaceError> {
        self.try_toggle(id, |toggle, out| toggle.set_on(on, out))
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

//! Renderer Sink
//!
//! Controls do not draw; they describe. Each visual state change is emitted
//! as a [`RenderCommand`] to an optional [`RenderSink`], keeping the actual
//! GUI binding host-specific. When no sink is installed the commands are
//! skipped and the control state machines proceed untouched.

use crate::surface::ControlId;
use serde::{Deserialize, Serialize};

/// Shader parameter receiving the wave generator's cycle position.
pub const SHADER_POSITION: &str = "_Position";

/// Full knob sweep: a normalized value of 0 points to 179° and the rotation
/// decreases through 358° of travel as the value rises.
pub fn knob_angle(normalized: f64) -> f64 {
    179.0 - normalized * 358.0
}

/// A host-agnostic visual update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RenderCommand {
    /// Rotate a knob graphic to `degrees` around its forward axis.
    Rotation { id: ControlId, degrees: f64 },

    /// Set a toggle graphic's opacity (1 on, 0 off).
    Alpha { id: ControlId, alpha: f64 },

    /// Set a named shader parameter on the control's material.
    ShaderParam {
        id: ControlId,
        name: String,
        value: f64,
    },

    /// Pressed/normal skinning transition for buttons and toggles.
    Selection { id: ControlId, pressed: bool },

    /// The control's binding label changed, e.g. `"ALL C7"`.
    Label { id: ControlId, text: String },
}

/// Receiver of visual updates, typically adapted to the host GUI toolkit.
pub trait RenderSink {
    fn apply(&mut self, command: RenderCommand);
}

/// Sink that discards every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn apply(&mut self, _command: RenderCommand) {}
}

/// Sink that records commands in order; used by tests and demos.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    pub commands: Vec<RenderCommand>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSink for MemoryRenderer {
    fn apply(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }
}

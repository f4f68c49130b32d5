//! Surface Definitions and Persistence
//!
//! An explicit, versioned construction API for surfaces: layouts are plain
//! data ([`SurfaceDef`] / [`ControlDef`]), built into live surfaces through
//! the [`ControlRegistry`]. This replaces editor-side reflection tricks with
//! a schema that can be stored, diffed, and validated.

use crate::binding::{Channel, KnobBinding, NoteBinding};
use crate::controls::{AnyControl, Button, Knob, Stab, Toggle, Wave};
use crate::signal::{ResponseCurve, WaveShape, DEFAULT_THRESHOLD};
use crate::surface::{Surface, SurfaceConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema version accepted by this crate.
pub const SURFACE_DEF_VERSION: u32 = 1;

fn default_max_value() -> f64 {
    1.0
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_period_ms() -> f64 {
    crate::controls::DEFAULT_PERIOD_MS
}

/// Serializable surface layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDef {
    /// Schema version for forward compatibility
    pub version: u32,

    pub name: String,

    #[serde(default)]
    pub config: SurfaceConfig,

    pub controls: Vec<ControlDef>,
}

impl SurfaceDef {
    /// Create a new empty surface definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SURFACE_DEF_VERSION,
            name: name.into(),
            config: SurfaceConfig::default(),
            controls: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: SurfaceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_control(mut self, control: ControlDef) -> Self {
        self.controls.push(control);
        self
    }

    /// Serialize to JSON string
    #[cfg(feature = "persistence")]
    pub fn to_json(&self) -> Result<String, SerializeError> {
        serde_json::to_string_pretty(self).map_err(SerializeError::Json)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "persistence")]
    pub fn from_json(json: &str) -> Result<Self, SerializeError> {
        serde_json::from_str(json).map_err(SerializeError::Json)
    }
}

impl Default for SurfaceDef {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Serializable control definition.
///
/// Field defaults mirror the standard widgets the original editor menu
/// created: unit-range linear knobs, 0.5 thresholds, 2000 ms waves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ControlDef {
    Knob {
        name: String,
        channel: Channel,
        control: u8,
        #[serde(default)]
        min_value: f64,
        #[serde(default = "default_max_value")]
        max_value: f64,
        #[serde(default)]
        curve: ResponseCurve,
    },
    Button {
        name: String,
        channel: Channel,
        note: u8,
        /// Optional continuous-control trigger CC on the same channel.
        #[serde(default)]
        control: Option<u8>,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default)]
        stab: Option<Stab>,
    },
    Toggle {
        name: String,
        channel: Channel,
        note: u8,
        /// When set, the toggle levels from this CC instead of notes.
        #[serde(default)]
        control: Option<u8>,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Wave {
        name: String,
        shape: WaveShape,
        #[serde(default = "default_period_ms")]
        period_ms: f64,
        #[serde(default)]
        offset_ms: f64,
    },
}

impl ControlDef {
    /// Standard unit-range knob.
    pub fn standard_knob(name: impl Into<String>, channel: Channel, control: u8) -> Self {
        ControlDef::Knob {
            name: name.into(),
            channel,
            control,
            min_value: 0.0,
            max_value: 1.0,
            curve: ResponseCurve::Linear,
        }
    }

    /// Standard note-triggered button.
    pub fn standard_button(name: impl Into<String>, channel: Channel, note: u8) -> Self {
        ControlDef::Button {
            name: name.into(),
            channel,
            note,
            control: None,
            threshold: DEFAULT_THRESHOLD,
            stab: None,
        }
    }

    /// Standard note-triggered toggle.
    pub fn standard_toggle(name: impl Into<String>, channel: Channel, note: u8) -> Self {
        ControlDef::Toggle {
            name: name.into(),
            channel,
            note,
            control: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Standard wave generator with the default period.
    pub fn standard_wave(name: impl Into<String>, shape: WaveShape) -> Self {
        ControlDef::Wave {
            name: name.into(),
            shape,
            period_ms: default_period_ms(),
            offset_ms: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ControlDef::Knob { name, .. }
            | ControlDef::Button { name, .. }
            | ControlDef::Toggle { name, .. }
            | ControlDef::Wave { name, .. } => name,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            ControlDef::Knob { .. } => "knob",
            ControlDef::Button { .. } => "button",
            ControlDef::Toggle { .. } => "toggle",
            ControlDef::Wave { .. } => "wave",
        }
    }
}

/// Error types for definition validation and persistence
#[derive(Debug)]
pub enum SerializeError {
    /// The definition's schema version is not supported by this crate.
    UnsupportedVersion(u32),
    /// A control definition failed validation.
    InvalidDef(String),
    #[cfg(feature = "persistence")]
    Json(serde_json::Error),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::UnsupportedVersion(version) => {
                write!(
                    f,
                    "Unsupported surface definition version {} (expected {})",
                    version, SURFACE_DEF_VERSION
                )
            }
            SerializeError::InvalidDef(msg) => write!(f, "Invalid control definition: {}", msg),
            #[cfg(feature = "persistence")]
            SerializeError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for SerializeError {}

/// Metadata about a registered control type, for UI palettes.
#[derive(Debug, Clone)]
pub struct ControlMetadata {
    pub type_tag: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Registry of the control types a surface can host.
pub struct ControlRegistry {
    entries: Vec<ControlMetadata>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ControlMetadata {
                    type_tag: "knob",
                    name: "Knob",
                    description: "Continuous rotary control bound to a MIDI CC",
                },
                ControlMetadata {
                    type_tag: "button",
                    name: "Button",
                    description: "Momentary note-triggered button with optional stab",
                },
                ControlMetadata {
                    type_tag: "toggle",
                    name: "Toggle",
                    description: "Latched on/off switch, note- or CC-driven",
                },
                ControlMetadata {
                    type_tag: "wave",
                    name: "Wave",
                    description: "Free-running periodic signal generator",
                },
            ],
        }
    }

    pub fn metadata(&self) -> &[ControlMetadata] {
        &self.entries
    }

    pub fn lookup(&self, type_tag: &str) -> Option<&ControlMetadata> {
        self.entries.iter().find(|m| m.type_tag == type_tag)
    }

    /// Validate and build one control from its definition.
    pub fn instantiate(&self, def: &ControlDef) -> Result<AnyControl, SerializeError> {
        match def {
            ControlDef::Knob {
                channel,
                control,
                min_value,
                max_value,
                curve,
                ..
            } => Ok(Knob::new(KnobBinding::new(*channel, *control))
                .with_range(*min_value, *max_value)
                .with_curve(*curve)
                .into()),

            ControlDef::Button {
                name,
                channel,
                note,
                control,
                threshold,
                stab,
            } => {
                if !threshold.is_finite() {
                    return Err(SerializeError::InvalidDef(format!(
                        "button '{}' has a non-finite threshold",
                        name
                    )));
                }
                let mut button =
                    Button::new(NoteBinding::new(*channel, *note)).with_threshold(*threshold);
                if let Some(cc) = control {
                    button = button.with_control(KnobBinding::new(*channel, *cc));
                }
                if let Some(stab) = stab {
                    button = button.with_stab(*stab);
                }
                Ok(button.into())
            }

            ControlDef::Toggle {
                name,
                channel,
                note,
                control,
                threshold,
            } => {
                if !threshold.is_finite() {
                    return Err(SerializeError::InvalidDef(format!(
                        "toggle '{}' has a non-finite threshold",
                        name
                    )));
                }
                let mut toggle =
                    Toggle::new(NoteBinding::new(*channel, *note)).with_threshold(*threshold);
                if let Some(cc) = control {
                    toggle = toggle.with_control(KnobBinding::new(*channel, *cc));
                }
                Ok(toggle.into())
            }

            ControlDef::Wave {
                name,
                shape,
                period_ms,
                offset_ms,
            } => {
                if !(*period_ms > 0.0) {
                    return Err(SerializeError::InvalidDef(format!(
                        "wave '{}' needs a positive period, got {}",
                        name, period_ms
                    )));
                }
                Ok(Wave::new(*shape)
                    .with_period(*period_ms)
                    .with_offset(*offset_ms)
                    .into())
            }
        }
    }

    /// Build a full surface from a definition, checking the schema version.
    pub fn build(&self, def: &SurfaceDef) -> Result<Surface, SerializeError> {
        if def.version != SURFACE_DEF_VERSION {
            return Err(SerializeError::UnsupportedVersion(def.version));
        }
        let mut surface = Surface::with_config(def.config);
        for control_def in &def.controls {
            let control = self.instantiate(control_def)?;
            surface.add(control_def.name(), control);
        }
        Ok(surface)
    }
}

impl Default for ControlRegistry {
    fn default() -> Self {
        Self::new()
    }
}

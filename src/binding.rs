//! MIDI Identities and Bindings
//!
//! This module defines the addressing scheme that ties a control to the MIDI
//! messages that drive it: channels (with an "all channels" wildcard),
//! continuous-controller bindings for knobs, and note bindings for buttons
//! and toggles.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Highest valid MIDI note or controller number.
pub const MAX_NUMBER: u8 = 127;

/// A MIDI channel selector.
///
/// Concrete channels are indexed 0–15. `All` is a wildcard that matches any
/// incoming channel, and reads the most recently written value when polling
/// continuous controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// A specific channel, 0–15.
    Ch(u8),
    /// Wildcard matching every channel.
    All,
}

impl Channel {
    /// Whether this selector accepts a message arriving on `incoming`.
    ///
    /// `incoming` is always a concrete channel index; wire messages never
    /// carry the wildcard.
    pub fn matches(&self, incoming: u8) -> bool {
        match self {
            Channel::Ch(ch) => *ch == incoming,
            Channel::All => true,
        }
    }

    /// The concrete channel index, if any.
    pub fn index(&self) -> Option<u8> {
        match self {
            Channel::Ch(ch) => Some(*ch),
            Channel::All => None,
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel::All
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Channels display 1-based, matching hardware controller labels.
            Channel::Ch(ch) => write!(f, "CH{}", ch + 1),
            Channel::All => write!(f, "ALL"),
        }
    }
}

/// Binding of a knob to a continuous controller (CC) number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnobBinding {
    pub channel: Channel,
    pub control: u8,
}

impl KnobBinding {
    /// Create a binding. Controller numbers above 127 are clamped.
    pub fn new(channel: Channel, control: u8) -> Self {
        Self {
            channel,
            control: control.min(MAX_NUMBER),
        }
    }

    /// Label text for UI skinning, e.g. `"ALL C7"` or `"CH3 C16"`.
    pub fn label(&self) -> String {
        format!("{} C{}", self.channel, self.control)
    }
}

impl Default for KnobBinding {
    fn default() -> Self {
        Self::new(Channel::All, 0)
    }
}

/// Binding of a button or toggle to a note number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteBinding {
    pub channel: Channel,
    pub note: u8,
}

impl NoteBinding {
    /// Create a binding. Note numbers above 127 are clamped.
    pub fn new(channel: Channel, note: u8) -> Self {
        Self {
            channel,
            note: note.min(MAX_NUMBER),
        }
    }

    /// Whether an incoming `(channel, note)` pair addresses this binding.
    pub fn matches(&self, channel: u8, note: u8) -> bool {
        self.channel.matches(channel) && self.note == note
    }

    /// Label text for UI skinning, e.g. `"CH1 N60"`.
    pub fn label(&self) -> String {
        format!("{} N{}", self.channel, self.note)
    }
}

impl Default for NoteBinding {
    fn default() -> Self {
        Self::new(Channel::All, 0)
    }
}

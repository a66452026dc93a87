//! Window set bookkeeping for the thermal loop.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// One openable window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub id: String,
    pub room: String,
    #[serde(default)]
    pub open: bool,
}

impl WindowState {
    pub fn closed(id: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            room: room.into(),
            open: false,
        }
    }
}

pub fn default_windows() -> Vec<WindowState> {
    vec![
        WindowState::closed("living_room", "Living room"),
        WindowState::closed("bedroom", "Bedroom"),
        WindowState::closed("kitchen", "Kitchen"),
        WindowState::closed("bathroom", "Bathroom"),
    ]
}

/// Outcome of applying a window event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUpdate {
    /// The window changed state.
    Changed,
    /// The window was already in that state.
    Unchanged,
    /// No window with that id is known.
    Unknown,
}

/// The windows of the building, keyed by id, in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    windows: Vec<WindowState>,
}

impl WindowSet {
    /// # Errors
    ///
    /// Returns error on an empty or duplicated id.
    pub fn new(windows: Vec<WindowState>) -> SimResult<Self> {
        for (i, w) in windows.iter().enumerate() {
            if w.id.is_empty() || w.id.contains(['/', '+', '#']) {
                return Err(SimError::InvalidParam {
                    field: "windows.id",
                    reason: "must be a non-empty single topic level",
                });
            }
            if windows[..i].iter().any(|other| other.id == w.id) {
                return Err(SimError::DuplicateWindow { id: w.id.clone() });
            }
        }
        Ok(Self { windows })
    }

    pub fn set_open(&mut self, id: &str, open: bool) -> WindowUpdate {
        match self.windows.iter_mut().find(|w| w.id == id) {
            None => WindowUpdate::Unknown,
            Some(w) if w.open == open => WindowUpdate::Unchanged,
            Some(w) => {
                w.open = open;
                WindowUpdate::Changed
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&WindowState> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn open_count(&self) -> usize {
        self.windows.iter().filter(|w| w.open).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowState> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for WindowSet {
    fn default() -> Self {
        Self {
            windows: default_windows(),
        }
    }
}

use thiserror::Error;

use super::state::{JoystickSnapshot, KeyboardState, MouseSnapshot};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Keyboard unavailable: {0}")]
    KeyboardUnavailable(String),

    #[error("Backend initialization failed: {0}")]
    InitializationError(String),
}

/// Source of raw device state for the polling engine
///
/// `pump` is called exactly once at the start of every frame; the read
/// methods then return the state gathered by that pump.
pub trait InputBackend {
    /// Drains pending OS events
    fn pump(&mut self);

    fn read_keyboard(&mut self, keys: &mut KeyboardState) -> Result<(), BackendError>;

    fn joystick_count(&self) -> usize;

    fn read_joystick(&mut self, index: usize) -> Option<JoystickSnapshot>;

    /// Name of the joystick at `index`, in the same order as `read_joystick`
    fn joystick_name(&self, _index: usize) -> Option<String> {
        None
    }

    /// Buttons held and motion accumulated since the previous pump
    fn read_mouse(&mut self) -> MouseSnapshot;
}

/// Backend whose state is set directly; used where no hardware is present
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    pub keyboard: KeyboardState,
    pub joysticks: Vec<JoystickSnapshot>,
    pub joystick_names: Vec<String>,
    pub mouse: MouseSnapshot,
    pub keyboard_error: Option<String>,
    pumps: u64,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joysticks(count: usize) -> Self {
        Self {
            joysticks: vec![
                JoystickSnapshot {
                    axes: vec![0, 0],
                    buttons: vec![false; 16],
                    hats: Vec::new(),
                };
                count
            ],
            ..Self::default()
        }
    }

    pub fn pumps(&self) -> u64 {
        self.pumps
    }

    pub fn joystick_mut(&mut self, index: usize) -> Option<&mut JoystickSnapshot> {
        self.joysticks.get_mut(index)
    }

    pub fn press_button(&mut self, index: usize, button: usize, pressed: bool) {
        if let Some(slot) = self
            .joysticks
            .get_mut(index)
            .and_then(|pad| pad.buttons.get_mut(button))
        {
            *slot = pressed;
        }
    }
}

impl InputBackend for ScriptedBackend {
    fn pump(&mut self) {
        self.pumps += 1;
    }

    fn read_keyboard(&mut self, keys: &mut KeyboardState) -> Result<(), BackendError> {
        if let Some(reason) = &self.keyboard_error {
            return Err(BackendError::KeyboardUnavailable(reason.clone()));
        }
        *keys = self.keyboard;
        Ok(())
    }

    fn joystick_count(&self) -> usize {
        self.joysticks.len()
    }

    fn read_joystick(&mut self, index: usize) -> Option<JoystickSnapshot> {
        self.joysticks.get(index).cloned()
    }

    fn joystick_name(&self, index: usize) -> Option<String> {
        self.joystick_names.get(index).cloned()
    }

    fn read_mouse(&mut self) -> MouseSnapshot {
        self.mouse
    }
}

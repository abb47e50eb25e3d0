//! Hardware input backend
//!
//! ```text
//! gilrs  ── gamepads  ──┐
//! evdev  ── keyboards ──┼── HardwareBackend ── PollingEngine
//! evdev  ── mice      ──┘   (REL_X/REL_Y accumulated during pump)
//! ```

use evdev::{Device, InputEventKind, Key, RelativeAxisType};
use gilrs::{Axis, Button, Gilrs};
use std::io;
use std::os::unix::io::AsRawFd;
use tracing::{debug, error, info, warn};

use super::backend::{BackendError, InputBackend};
use super::code::Direction;
use super::keys::KeyLookup;
use super::state::{HatState, JoystickSnapshot, KeyboardState, MouseSnapshot};

const STICK_AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

const PAD_BUTTONS: [Button; 13] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
];

const MOUSE_BUTTONS: [Key; 3] = [Key::BTN_LEFT, Key::BTN_RIGHT, Key::BTN_MIDDLE];

pub struct HardwareBackend {
    gilrs: Gilrs,
    keyboards: Vec<Device>,
    mice: Vec<Device>,
    lookup: KeyLookup,
    mouse: MouseSnapshot,
}

impl HardwareBackend {
    pub fn new() -> Result<Self, BackendError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(BackendError::InitializationError(e.to_string()));
            }
        };

        let mut keyboards = Vec::new();
        let mut mice = Vec::new();
        for (path, device) in evdev::enumerate() {
            let keys = device.supported_keys();
            let is_keyboard = keys.is_some_and(|k| k.contains(Key::KEY_A));
            let is_mouse = device
                .supported_relative_axes()
                .is_some_and(|axes| axes.contains(RelativeAxisType::REL_X))
                && keys.is_some_and(|k| k.contains(Key::BTN_LEFT));

            if !(is_keyboard || is_mouse) {
                continue;
            }
            if let Err(e) = set_nonblocking(&device) {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
            debug!(
                "Opened {} {} ({})",
                if is_keyboard { "keyboard" } else { "mouse" },
                device.name().unwrap_or("unknown"),
                path.display()
            );
            if is_keyboard {
                keyboards.push(device);
            } else {
                mice.push(device);
            }
        }
        info!("Found {} keyboard(s), {} mice", keyboards.len(), mice.len());

        Ok(Self {
            gilrs,
            keyboards,
            mice,
            lookup: KeyLookup::linux(),
            mouse: MouseSnapshot::default(),
        })
    }

    /// Gamepad names in polling order
    pub fn joystick_names(&self) -> Vec<String> {
        self.gilrs
            .gamepads()
            .map(|(_, gamepad)| gamepad.name().to_string())
            .collect()
    }
}

impl InputBackend for HardwareBackend {
    fn pump(&mut self) {
        while let Some(event) = self.gilrs.next_event() {
            debug!("Gamepad event: {:?}", event.event);
        }

        self.mouse = MouseSnapshot::default();
        for mouse in &mut self.mice {
            match mouse.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if let InputEventKind::RelAxis(axis) = event.kind() {
                            match axis {
                                RelativeAxisType::REL_X => {
                                    self.mouse.dx = self.mouse.dx.saturating_add(event.value())
                                }
                                RelativeAxisType::REL_Y => {
                                    self.mouse.dy = self.mouse.dy.saturating_add(event.value())
                                }
                                _ => {}
                            }
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => debug!("Mouse read failed: {}", e),
            }
            if let Ok(held) = mouse.get_key_state() {
                for (bit, key) in MOUSE_BUTTONS.iter().enumerate() {
                    if held.contains(*key) {
                        self.mouse.buttons |= 1 << bit;
                    }
                }
            }
        }
    }

    fn read_keyboard(&mut self, keys: &mut KeyboardState) -> Result<(), BackendError> {
        if self.keyboards.is_empty() {
            return Err(BackendError::KeyboardUnavailable(
                "no keyboard device found".to_string(),
            ));
        }
        keys.clear();
        for keyboard in &self.keyboards {
            let held = keyboard
                .get_key_state()
                .map_err(|e| BackendError::KeyboardUnavailable(e.to_string()))?;
            for (fbk, native) in self.lookup.iter() {
                if held.contains(Key::new(native)) {
                    keys.set(fbk, true);
                }
            }
        }
        Ok(())
    }

    fn joystick_count(&self) -> usize {
        self.gilrs.gamepads().count()
    }

    fn joystick_name(&self, index: usize) -> Option<String> {
        let (_, gamepad) = self.gilrs.gamepads().nth(index)?;
        Some(gamepad.name().to_string())
    }

    fn read_joystick(&mut self, index: usize) -> Option<JoystickSnapshot> {
        let (_, gamepad) = self.gilrs.gamepads().nth(index)?;

        let axes = STICK_AXES
            .iter()
            .map(|axis| {
                let value = gamepad.value(*axis);
                // gilrs reports up as positive; the code space treats negative Y as up
                let value = match axis {
                    Axis::LeftStickY | Axis::RightStickY => -value,
                    _ => value,
                };
                (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            })
            .collect();
        let buttons = PAD_BUTTONS.iter().map(|b| gamepad.is_pressed(*b)).collect();
        let hat = HatState::CENTERED
            .with(Direction::Left, gamepad.is_pressed(Button::DPadLeft))
            .with(Direction::Right, gamepad.is_pressed(Button::DPadRight))
            .with(Direction::Up, gamepad.is_pressed(Button::DPadUp))
            .with(Direction::Down, gamepad.is_pressed(Button::DPadDown));

        Some(JoystickSnapshot {
            axes,
            buttons,
            hats: vec![hat],
        })
    }

    fn read_mouse(&mut self) -> MouseSnapshot {
        self.mouse
    }
}

// Helper
fn set_nonblocking(device: &Device) -> io::Result<()> {
    let raw_fd = device.as_raw_fd();
    // SAFETY: the descriptor belongs to `device` and stays open for the call.
    let current = unsafe { libc::fcntl(raw_fd, libc::F_GETFL) };
    if current < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    let rc = unsafe { libc::fcntl(raw_fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

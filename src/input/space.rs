//! Answers "is this code active" against a [`FrameSnapshot`]

use tracing::trace;

use super::code::{DecodedCode, InputCode, JoystickControl, MouseControl};
use super::state::FrameSnapshot;

/// Resolver for the flat code space
///
/// Keyboard codes are active when the key is down or when the control they
/// are remapped to is active. Joystick buttons are edge-consuming: a press
/// is reported once and then reads as inactive until released. Directions,
/// hats and mouse state are read passively.
#[derive(Clone, Copy, Debug)]
pub struct InputCodeSpace {
    mice: u8,
}

impl InputCodeSpace {
    pub fn new() -> Self {
        Self { mice: 1 }
    }

    pub fn resolve(&self, frame: &mut FrameSnapshot, code: u16) -> bool {
        let code = InputCode::from_raw(code);
        match code.decode() {
            DecodedCode::Keyboard(key) => {
                if frame.keyboard.is_down(key) {
                    return true;
                }
                let target = frame.remap().get(code);
                match target {
                    Some(target) if target != code => self.resolve_physical(frame, target),
                    _ => false,
                }
            }
            _ => self.resolve_physical(frame, code),
        }
    }

    /// Resolves a code without following the remap table
    fn resolve_physical(&self, frame: &mut FrameSnapshot, code: InputCode) -> bool {
        match code.decode() {
            DecodedCode::Keyboard(key) => frame.keyboard.is_down(key),
            DecodedCode::Joystick { device, control } => {
                let Some(joystick) = frame.joystick_mut(device as usize) else {
                    return false;
                };
                match control {
                    JoystickControl::Direction(direction) => joystick.state.direction(direction),
                    JoystickControl::Hat { hat, direction } => {
                        joystick.raw.hat(hat as usize).contains(direction)
                    }
                    JoystickControl::Button(button) => {
                        let pressed = joystick.take_button(button);
                        if pressed {
                            trace!("Joystick {} button {} reported", device, button);
                        }
                        pressed
                    }
                }
            }
            DecodedCode::Mouse { index, control } => {
                if index >= self.mice {
                    return false;
                }
                match control {
                    MouseControl::Motion(axis) => frame.mouse.axis(axis) != 0,
                    MouseControl::Button(button) => frame.mouse.button(button),
                }
            }
            DecodedCode::Reserved | DecodedCode::Unassigned | DecodedCode::Invalid => false,
        }
    }
}

impl Default for InputCodeSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::code::Direction;
    use crate::input::remap::RemapTable;
    use crate::input::state::{
        HatState, JoystickSnapshot, KeyboardState, MouseSnapshot, JOYSTICK_DEADZONE,
    };
    use std::sync::Arc;

    fn frame_with(pad: JoystickSnapshot, remap: RemapTable) -> FrameSnapshot {
        FrameSnapshot::capture(
            1,
            KeyboardState::default(),
            vec![pad],
            MouseSnapshot::default(),
            Arc::new(remap),
            JOYSTICK_DEADZONE,
            None,
        )
    }

    #[test]
    fn reserved_and_invalid_codes_are_inactive() {
        let space = InputCodeSpace::new();
        let mut frame = FrameSnapshot::empty();
        frame.keyboard.set(0x10, true);
        for code in [0x0100u16, 0x0110, 0x3FFF, 0xC000, 0xC010, 0xFFFF, 0x4005, 0x8002] {
            assert!(!space.resolve(&mut frame, code), "{code:#x}");
        }
    }

    #[test]
    fn joystick_button_reports_once_per_press() {
        let space = InputCodeSpace::new();
        let pad = JoystickSnapshot {
            axes: vec![0, 0],
            buttons: vec![false, true],
            hats: vec![],
        };
        let mut frame = frame_with(pad, RemapTable::new());
        assert!(space.resolve(&mut frame, 0x4081));
        assert!(!space.resolve(&mut frame, 0x4081));
        assert!(!space.resolve(&mut frame, 0x4080));
    }

    #[test]
    fn directions_are_not_consumed() {
        let space = InputCodeSpace::new();
        let pad = JoystickSnapshot {
            axes: vec![0, -0x7000],
            buttons: vec![],
            hats: vec![],
        };
        let mut frame = frame_with(pad, RemapTable::new());
        let up = InputCode::joystick(0, JoystickControl::Direction(Direction::Up)).raw();
        assert!(space.resolve(&mut frame, up));
        assert!(space.resolve(&mut frame, up));
        assert!(!space.resolve(&mut frame, 0x4003));
    }

    #[test]
    fn missing_joystick_is_inactive() {
        let space = InputCodeSpace::new();
        let mut frame = FrameSnapshot::empty();
        assert!(!space.resolve(&mut frame, 0x4580));
        assert!(!space.resolve(&mut frame, 0x4500));
    }

    #[test]
    fn hats_read_from_frame() {
        let space = InputCodeSpace::new();
        let pad = JoystickSnapshot {
            axes: vec![],
            buttons: vec![],
            hats: vec![HatState::CENTERED, HatState::CENTERED.with(Direction::Right, true)],
        };
        let mut frame = frame_with(pad, RemapTable::new());
        let right = InputCode::joystick(0, JoystickControl::Hat { hat: 1, direction: Direction::Right });
        assert!(space.resolve(&mut frame, right.raw()));
        assert!(space.resolve(&mut frame, right.raw()));
        assert!(!space.resolve(&mut frame, 0x4011));
    }

    #[test]
    fn keyboard_follows_remapped_joystick_control() {
        let space = InputCodeSpace::new();
        let mut remap = RemapTable::new();
        remap.set(
            InputCode::key(0x2C),
            InputCode::joystick(0, JoystickControl::Button(0)),
        );
        let pad = JoystickSnapshot {
            axes: vec![],
            buttons: vec![true],
            hats: vec![],
        };
        let mut frame = frame_with(pad, remap);
        assert!(space.resolve(&mut frame, 0x2C));
        assert!(!space.resolve(&mut frame, 0x2C));

        frame.keyboard.set(0x2C, true);
        assert!(space.resolve(&mut frame, 0x2C));
    }

    #[test]
    fn mouse_motion_and_buttons() {
        let space = InputCodeSpace::new();
        let mut frame = FrameSnapshot::empty();
        frame.mouse = MouseSnapshot {
            buttons: 0b100,
            dx: -3,
            dy: 0,
        };
        assert!(space.resolve(&mut frame, 0x8000));
        assert!(!space.resolve(&mut frame, 0x8001));
        assert!(space.resolve(&mut frame, 0x8082));
        assert!(space.resolve(&mut frame, 0x8082));
        assert!(!space.resolve(&mut frame, 0x8080));
        assert!(!space.resolve(&mut frame, 0x8182));
    }
}

//! Flat input code space
//!
//! ```text
//! 0x0000..0x0100  keyboard (FBK scan codes)
//! 0x0100..0x4000  reserved, always inactive
//! 0x4000..0x8000  joystick  [13:8] device, [7:0] subcode
//! 0x8000..0xC000  mouse     [13:8] mouse,  [7:0] subcode
//! ```
//!
//! Joystick subcodes: `0x00..=0x03` stick direction, `0x10..=0x1F` POV hat
//! (`[3:2]` hat, `[1:0]` direction), `0x80..` buttons. Mouse subcodes:
//! `0x00`/`0x01` relative motion on X/Y, `0x80..` buttons.
//!
//! Codes are decoded once into [`DecodedCode`]; bit arithmetic stays in this file.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const KEYBOARD_END: u16 = 0x0100;
pub const JOYSTICK_BASE: u16 = 0x4000;
pub const MOUSE_BASE: u16 = 0x8000;
pub const CODE_LIMIT: u16 = 0xC000;

/// Highest encodable device index (six bits)
pub const MAX_DEVICE_INDEX: u8 = 0x3F;

const HAT_BASE: u8 = 0x10;
const HAT_LAST: u8 = 0x1F;
const BUTTON_BASE: u8 = 0x80;

/// Digital direction, in subcode order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Two-bit subcode value
    pub const fn subcode(self) -> u8 {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
            Direction::Up => 2,
            Direction::Down => 3,
        }
    }

    pub const fn from_subcode(bits: u8) -> Direction {
        match bits & 0x3 {
            0 => Direction::Left,
            1 => Direction::Right,
            2 => Direction::Up,
            _ => Direction::Down,
        }
    }
}

/// Relative mouse axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseAxis {
    X,
    Y,
}

/// Physical control on a joystick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoystickControl {
    /// Digital direction derived from the first stick
    Direction(Direction),
    Hat { hat: u8, direction: Direction },
    Button(u8),
}

/// Physical control on the system mouse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseControl {
    Motion(MouseAxis),
    Button(u8),
}

/// Structured form of an [`InputCode`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodedCode {
    Keyboard(u8),
    /// Padding band between keyboard and joystick codes
    Reserved,
    Joystick { device: u8, control: JoystickControl },
    Mouse { index: u8, control: MouseControl },
    /// Inside a device band but naming no control (e.g. joystick subcode 0x05)
    Unassigned,
    /// At or above 0xC000
    Invalid,
}

/// Packed 16-bit input code
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputCode(u16);

impl InputCode {
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn key(code: u8) -> Self {
        Self(code as u16)
    }

    /// Joystick code; `device` is truncated to six bits
    pub fn joystick(device: u8, control: JoystickControl) -> Self {
        let subcode = match control {
            JoystickControl::Direction(direction) => direction.subcode(),
            JoystickControl::Hat { hat, direction } => {
                HAT_BASE | ((hat & 0x3) << 2) | direction.subcode()
            }
            JoystickControl::Button(button) => BUTTON_BASE | (button & 0x7F),
        };
        Self(JOYSTICK_BASE | (((device & MAX_DEVICE_INDEX) as u16) << 8) | subcode as u16)
    }

    /// Mouse code; `index` is truncated to six bits
    pub fn mouse(index: u8, control: MouseControl) -> Self {
        let subcode = match control {
            MouseControl::Motion(MouseAxis::X) => 0x00,
            MouseControl::Motion(MouseAxis::Y) => 0x01,
            MouseControl::Button(button) => BUTTON_BASE | (button & 0x7F),
        };
        Self(MOUSE_BASE | (((index & MAX_DEVICE_INDEX) as u16) << 8) | subcode as u16)
    }

    /// Device index bits of a joystick or mouse code
    pub const fn device_index(self) -> u8 {
        ((self.0 >> 8) & MAX_DEVICE_INDEX as u16) as u8
    }

    pub fn is_keyboard(self) -> bool {
        self.0 < KEYBOARD_END
    }

    pub fn is_joystick(self) -> bool {
        (JOYSTICK_BASE..MOUSE_BASE).contains(&self.0)
    }

    pub fn decode(self) -> DecodedCode {
        let raw = self.0;
        let subcode = (raw & 0xFF) as u8;

        if raw < KEYBOARD_END {
            DecodedCode::Keyboard(subcode)
        } else if raw < JOYSTICK_BASE {
            DecodedCode::Reserved
        } else if raw < MOUSE_BASE {
            let control = match subcode {
                0x00..=0x03 => JoystickControl::Direction(Direction::from_subcode(subcode)),
                HAT_BASE..=HAT_LAST => JoystickControl::Hat {
                    hat: (subcode & 0x0F) >> 2,
                    direction: Direction::from_subcode(subcode),
                },
                BUTTON_BASE..=0xFF => JoystickControl::Button(subcode - BUTTON_BASE),
                _ => return DecodedCode::Unassigned,
            };
            DecodedCode::Joystick {
                device: self.device_index(),
                control,
            }
        } else if raw < CODE_LIMIT {
            let control = match subcode {
                0x00 => MouseControl::Motion(MouseAxis::X),
                0x01 => MouseControl::Motion(MouseAxis::Y),
                BUTTON_BASE..=0xFF => MouseControl::Button(subcode - BUTTON_BASE),
                _ => return DecodedCode::Unassigned,
            };
            DecodedCode::Mouse {
                index: self.device_index(),
                control,
            }
        } else {
            DecodedCode::Invalid
        }
    }
}

impl From<u16> for InputCode {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<InputCode> for u16 {
    fn from(code: InputCode) -> Self {
        code.0
    }
}

impl fmt::Debug for InputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputCode({:#06x})", self.0)
    }
}

impl fmt::Display for InputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joystick_device_index_survives_encoding() {
        for device in 0..=MAX_DEVICE_INDEX {
            let code = InputCode::joystick(device, JoystickControl::Button(3));
            assert_eq!(((code.raw() >> 8) & 0x3F) as u8, device);
            assert_eq!(
                code.decode(),
                DecodedCode::Joystick {
                    device,
                    control: JoystickControl::Button(3)
                }
            );
        }
    }

    #[test]
    fn known_layout_values() {
        assert_eq!(
            InputCode::joystick(1, JoystickControl::Direction(Direction::Up)).raw(),
            0x4102
        );
        assert_eq!(
            InputCode::joystick(0, JoystickControl::Hat { hat: 1, direction: Direction::Down })
                .raw(),
            0x4017
        );
        assert_eq!(InputCode::joystick(2, JoystickControl::Button(0)).raw(), 0x4280);
        assert_eq!(InputCode::mouse(0, MouseControl::Motion(MouseAxis::Y)).raw(), 0x8001);
        assert_eq!(InputCode::mouse(0, MouseControl::Button(2)).raw(), 0x8082);
    }

    #[test]
    fn bands_decode_to_their_kind() {
        assert_eq!(InputCode::from_raw(0x00C8).decode(), DecodedCode::Keyboard(0xC8));
        assert_eq!(InputCode::from_raw(0x0100).decode(), DecodedCode::Reserved);
        assert_eq!(InputCode::from_raw(0x3FFF).decode(), DecodedCode::Reserved);
        assert_eq!(InputCode::from_raw(0x4005).decode(), DecodedCode::Unassigned);
        assert_eq!(InputCode::from_raw(0x4040).decode(), DecodedCode::Unassigned);
        assert_eq!(InputCode::from_raw(0x8010).decode(), DecodedCode::Unassigned);
        assert_eq!(InputCode::from_raw(0xC000).decode(), DecodedCode::Invalid);
        assert_eq!(InputCode::from_raw(0xFFFF).decode(), DecodedCode::Invalid);
    }

    #[test]
    fn hat_subcodes_split_hat_and_direction() {
        assert_eq!(
            InputCode::from_raw(0x431E).decode(),
            DecodedCode::Joystick {
                device: 3,
                control: JoystickControl::Hat {
                    hat: 3,
                    direction: Direction::Up
                }
            }
        );
    }
}

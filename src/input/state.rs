//! Raw device state captured once per frame

use std::sync::Arc;

use super::code::{Direction, MouseAxis};
use super::remap::RemapTable;

/// Default analog deadzone for digital directions
pub const JOYSTICK_DEADZONE: i32 = 0x4000;

/// Buttons tracked per joystick
pub const MAX_JOY_BUTTONS: usize = 28;

const BUTTON_SHIFT: u32 = 4;

/// Pressed keys, indexed by FBK code
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    bits: [u64; 4],
}

impl KeyboardState {
    pub fn set(&mut self, code: u8, down: bool) {
        let (word, bit) = (code as usize / 64, code as u32 % 64);
        if down {
            self.bits[word] |= 1 << bit;
        } else {
            self.bits[word] &= !(1 << bit);
        }
    }

    pub fn is_down(&self, code: u8) -> bool {
        self.bits[code as usize / 64] & (1 << (code as u32 % 64)) != 0
    }

    pub fn clear(&mut self) {
        self.bits = [0; 4];
    }

    /// Pressed codes in ascending order
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|code| self.is_down(*code))
    }
}

/// Pressed directions of one POV hat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HatState(u8);

impl HatState {
    pub const CENTERED: HatState = HatState(0);

    pub fn with(self, direction: Direction, pressed: bool) -> Self {
        let bit = 1 << direction.subcode();
        if pressed {
            HatState(self.0 | bit)
        } else {
            HatState(self.0 & !bit)
        }
    }

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & (1 << direction.subcode()) != 0
    }

    pub fn is_centered(self) -> bool {
        self.0 == 0
    }
}

/// Raw state of one joystick as read from the backend
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoystickSnapshot {
    pub axes: Vec<i16>,
    pub buttons: Vec<bool>,
    pub hats: Vec<HatState>,
}

impl JoystickSnapshot {
    pub fn axis(&self, axis: usize) -> i16 {
        self.axes.get(axis).copied().unwrap_or(0)
    }

    pub fn hat(&self, hat: usize) -> HatState {
        self.hats.get(hat).copied().unwrap_or_default()
    }
}

/// Raw state of the system mouse for one frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseSnapshot {
    /// Bit n set while button n is held (0 left, 1 right, 2 middle)
    pub buttons: u32,
    pub dx: i32,
    pub dy: i32,
}

impl MouseSnapshot {
    pub fn button(&self, button: u8) -> bool {
        button < 32 && self.buttons & (1 << button) != 0
    }

    pub fn axis(&self, axis: MouseAxis) -> i32 {
        match axis {
            MouseAxis::X => self.dx,
            MouseAxis::Y => self.dy,
        }
    }
}

/// Per-joystick digital mask
///
/// ```text
/// bit 0 up | bit 1 right | bit 2 down | bit 3 left | bits 4..32 buttons 0..28
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoystickButtonState(u32);

impl JoystickButtonState {
    pub fn from_raw(bits: u32) -> Self {
        Self(bits)
    }

    /// Derives the mask from the first stick and the button list
    pub fn from_snapshot(snapshot: &JoystickSnapshot, deadzone: i32) -> Self {
        let x = snapshot.axis(0) as i32;
        let y = snapshot.axis(1) as i32;

        let mut state = Self::default();
        state.set(Self::direction_bit(Direction::Left), x < -deadzone);
        state.set(Self::direction_bit(Direction::Right), x > deadzone);
        state.set(Self::direction_bit(Direction::Up), y < -deadzone);
        state.set(Self::direction_bit(Direction::Down), y > deadzone);

        for (index, pressed) in snapshot.buttons.iter().take(MAX_JOY_BUTTONS).enumerate() {
            state.set(Self::button_bit(index as u8), *pressed);
        }
        state
    }

    pub fn direction_bit(direction: Direction) -> u32 {
        match direction {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Bit for `button`, or `None` past the 28 tracked buttons
    pub fn checked_button_bit(button: u8) -> Option<u32> {
        ((button as usize) < MAX_JOY_BUTTONS).then(|| Self::button_bit(button))
    }

    fn button_bit(button: u8) -> u32 {
        BUTTON_SHIFT + button as u32
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn direction(self, direction: Direction) -> bool {
        self.0 & (1 << Self::direction_bit(direction)) != 0
    }

    pub fn button(self, button: u8) -> bool {
        Self::checked_button_bit(button).is_some_and(|bit| self.0 & (1 << bit) != 0)
    }

    /// Button bits only
    pub fn button_mask(self) -> u32 {
        self.0 & !((1 << BUTTON_SHIFT) - 1)
    }
}

/// One joystick within a frame
#[derive(Clone, Debug, Default)]
pub struct JoystickFrame {
    pub raw: JoystickSnapshot,
    pub state: JoystickButtonState,
    /// Buttons already reported and not yet released
    consumed: u32,
}

impl JoystickFrame {
    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// True once per press; later calls stay false until the button is released
    pub fn take_button(&mut self, button: u8) -> bool {
        let Some(bit) = JoystickButtonState::checked_button_bit(button) else {
            return false;
        };
        let mask = 1 << bit;
        if self.state.bits() & mask != 0 && self.consumed & mask == 0 {
            self.consumed |= mask;
            true
        } else {
            false
        }
    }

    /// Held and not yet reported
    pub fn button_pending(&self, button: u8) -> bool {
        JoystickButtonState::checked_button_bit(button)
            .is_some_and(|bit| self.state.bits() & !self.consumed & (1 << bit) != 0)
    }
}

/// Everything a frame's queries are answered from
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub keyboard: KeyboardState,
    pub mouse: MouseSnapshot,
    joysticks: Vec<JoystickFrame>,
    remap: Arc<RemapTable>,
}

impl FrameSnapshot {
    /// Builds a frame from raw reads
    ///
    /// `previous` supplies the consumed-button latches; a latch survives only
    /// while its button is still held.
    pub fn capture(
        frame: u64,
        keyboard: KeyboardState,
        joysticks: Vec<JoystickSnapshot>,
        mouse: MouseSnapshot,
        remap: Arc<RemapTable>,
        deadzone: i32,
        previous: Option<&FrameSnapshot>,
    ) -> Self {
        let joysticks = joysticks
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let state = JoystickButtonState::from_snapshot(&raw, deadzone);
                let latched = previous
                    .and_then(|p| p.joysticks.get(index))
                    .map_or(0, |j| j.consumed);
                JoystickFrame {
                    raw,
                    state,
                    consumed: latched & state.button_mask(),
                }
            })
            .collect();

        Self {
            frame,
            keyboard,
            mouse,
            joysticks,
            remap,
        }
    }

    /// Frame with no devices and no bindings
    pub fn empty() -> Self {
        Self {
            frame: 0,
            keyboard: KeyboardState::default(),
            mouse: MouseSnapshot::default(),
            joysticks: Vec::new(),
            remap: Arc::new(RemapTable::new()),
        }
    }

    pub fn remap(&self) -> &RemapTable {
        &self.remap
    }

    pub fn joystick_count(&self) -> usize {
        self.joysticks.len()
    }

    pub fn joystick(&self, device: usize) -> Option<&JoystickFrame> {
        self.joysticks.get(device)
    }

    pub fn joystick_mut(&mut self, device: usize) -> Option<&mut JoystickFrame> {
        self.joysticks.get_mut(device)
    }

    pub fn joysticks(&self) -> &[JoystickFrame] {
        &self.joysticks
    }
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

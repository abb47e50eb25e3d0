//! Per-frame polling
//!
//! ```text
//! begin_frame()
//!   ├── backend.pump()            once
//!   ├── read keyboard / joysticks / mouse
//!   ├── take current remap Arc    once
//!   └── FrameSnapshot::capture    (carries button latches forward)
//! is_active(code) ── InputCodeSpace::resolve(&mut frame, code)
//! ```

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::backend::InputBackend;
use super::code::{Direction, InputCode, JoystickControl, MouseAxis, MouseControl};
use super::keys::fbk;
use super::remap::RemapTable;
use super::space::InputCodeSpace;
use super::state::{
    FrameSnapshot, KeyboardState, JOYSTICK_DEADZONE, MAX_JOY_BUTTONS,
};

/// Axes remembered per joystick for `find_active` baselines
const BASELINE_AXES: usize = 8;

/// Hats checked per joystick by `find_active`
const FIND_HATS: u8 = 4;

/// Settings for the polling engine
#[derive(Clone, Debug)]
pub struct PollingSettings {
    pub deadzone: i32,
    pub max_joysticks: usize,
    pub exit_key: u8,
    /// Axis travel against the baseline that counts as a deliberate move
    pub baseline_threshold: i32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            deadzone: JOYSTICK_DEADZONE,
            max_joysticks: 8,
            exit_key: fbk::F12,
            baseline_threshold: 0x4000,
        }
    }
}

pub struct PollingEngine<B: InputBackend> {
    backend: B,
    settings: PollingSettings,
    space: InputCodeSpace,
    remap: watch::Receiver<Arc<RemapTable>>,
    frame: FrameSnapshot,
    frames: u64,
    baselines: Vec<[i32; BASELINE_AXES]>,
    keyboard_failed: bool,
}

impl<B: InputBackend> PollingEngine<B> {
    pub fn new(
        backend: B,
        settings: PollingSettings,
        remap: watch::Receiver<Arc<RemapTable>>,
    ) -> Self {
        Self {
            backend,
            settings,
            space: InputCodeSpace::new(),
            remap,
            frame: FrameSnapshot::empty(),
            frames: 0,
            baselines: Vec::new(),
            keyboard_failed: false,
        }
    }

    pub fn settings(&self) -> &PollingSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn frame(&self) -> &FrameSnapshot {
        &self.frame
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Refreshes every device exactly once and builds the frame snapshot
    pub fn begin_frame(&mut self) {
        self.backend.pump();
        self.frames += 1;

        let mut keyboard = KeyboardState::default();
        match self.backend.read_keyboard(&mut keyboard) {
            Ok(()) => {
                if self.keyboard_failed {
                    debug!("Keyboard readable again");
                    self.keyboard_failed = false;
                }
            }
            Err(e) => {
                if !self.keyboard_failed {
                    warn!("Keyboard read failed, treating all keys as released: {}", e);
                    self.keyboard_failed = true;
                }
                keyboard.clear();
            }
        }

        let count = self.backend.joystick_count().min(self.settings.max_joysticks);
        let joysticks = (0..count)
            .map(|index| self.backend.read_joystick(index).unwrap_or_default())
            .collect();
        let mouse = self.backend.read_mouse();
        let remap = self.remap.borrow_and_update().clone();

        self.frame = FrameSnapshot::capture(
            self.frames,
            keyboard,
            joysticks,
            mouse,
            remap,
            self.settings.deadzone,
            Some(&self.frame),
        );
    }

    /// Whether `code` is active in the current frame
    pub fn is_active(&mut self, code: u16) -> bool {
        self.space.resolve(&mut self.frame, code)
    }

    /// True while the exit key is held
    pub fn exit_requested(&self) -> bool {
        self.frame.keyboard.is_down(self.settings.exit_key)
    }

    /// Raw axis value, doubled, or 0 for absent devices and axes
    pub fn joystick_axis(&self, device: usize, axis: usize) -> i32 {
        self.frame
            .joystick(device)
            .map_or(0, |joystick| (joystick.raw.axis(axis) as i32) << 1)
    }

    /// Relative motion of the system mouse this frame
    pub fn mouse_axis(&self, index: usize, axis: MouseAxis) -> i32 {
        if index != 0 {
            return 0;
        }
        self.frame.mouse.axis(axis)
    }

    /// First active control in scan order, for interactive binding
    ///
    /// Order: keyboard, then per joystick stick directions (only when the
    /// axis moved past the baseline threshold), hats and buttons, then mouse
    /// buttons, then the dominant mouse axis. Nothing is consumed. With
    /// `create_baseline` the current axis positions become the new baseline.
    pub fn find_active(&mut self, create_baseline: bool) -> Option<InputCode> {
        let found = self.scan_active();
        if create_baseline {
            self.baselines = self
                .frame
                .joysticks()
                .iter()
                .map(|joystick| {
                    let mut axes = [0; BASELINE_AXES];
                    for (axis, slot) in axes.iter_mut().enumerate() {
                        *slot = (joystick.raw.axis(axis) as i32) << 1;
                    }
                    axes
                })
                .collect();
        }
        found
    }

    fn scan_active(&self) -> Option<InputCode> {
        if let Some(key) = self.frame.keyboard.pressed().next() {
            return Some(InputCode::key(key));
        }

        for (index, joystick) in self.frame.joysticks().iter().enumerate() {
            let device = index as u8;
            for direction in Direction::ALL {
                let axis = (direction.subcode() >> 1) as usize;
                let baseline = self
                    .baselines
                    .get(index)
                    .map_or(0, |axes| axes[axis]);
                let delta = baseline - ((joystick.raw.axis(axis) as i32) << 1);
                if delta.unsigned_abs() > self.settings.baseline_threshold.unsigned_abs()
                    && joystick.state.direction(direction)
                {
                    return Some(InputCode::joystick(
                        device,
                        JoystickControl::Direction(direction),
                    ));
                }
            }

            for hat in 0..FIND_HATS {
                for direction in Direction::ALL {
                    if joystick.raw.hat(hat as usize).contains(direction) {
                        return Some(InputCode::joystick(
                            device,
                            JoystickControl::Hat { hat, direction },
                        ));
                    }
                }
            }

            let buttons = joystick.raw.buttons.len().min(MAX_JOY_BUTTONS) as u8;
            if let Some(button) = (0..buttons).find(|b| joystick.button_pending(*b)) {
                return Some(InputCode::joystick(device, JoystickControl::Button(button)));
            }
        }

        let mouse = &self.frame.mouse;
        if let Some(button) = (0..32u8).find(|b| mouse.button(*b)) {
            return Some(InputCode::mouse(0, MouseControl::Button(button)));
        }
        if mouse.dx.unsigned_abs() < mouse.dy.unsigned_abs() {
            return Some(InputCode::mouse(0, MouseControl::Motion(MouseAxis::Y)));
        }
        if mouse.dx != 0 {
            return Some(InputCode::mouse(0, MouseControl::Motion(MouseAxis::X)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::backend::ScriptedBackend;
    use crate::input::remap::RemapPublisher;
    use crate::input::state::MouseSnapshot;

    fn engine(backend: ScriptedBackend) -> (PollingEngine<ScriptedBackend>, RemapPublisher) {
        let publisher = RemapPublisher::new();
        let engine = PollingEngine::new(backend, PollingSettings::default(), publisher.subscribe());
        (engine, publisher)
    }

    #[test]
    fn button_edge_across_frames() {
        let (mut engine, _publisher) = engine(ScriptedBackend::with_joysticks(1));

        engine.backend_mut().press_button(0, 2, true);
        engine.begin_frame();
        assert!(engine.is_active(0x4082));
        assert!(!engine.is_active(0x4082));

        engine.begin_frame();
        assert!(!engine.is_active(0x4082));

        engine.backend_mut().press_button(0, 2, false);
        engine.begin_frame();
        assert!(!engine.is_active(0x4082));

        engine.backend_mut().press_button(0, 2, true);
        engine.begin_frame();
        assert!(engine.is_active(0x4082));
    }

    #[test]
    fn pump_runs_once_per_frame() {
        let (mut engine, _publisher) = engine(ScriptedBackend::with_joysticks(2));
        engine.begin_frame();
        engine.is_active(0x4000);
        engine.is_active(0x4100);
        engine.begin_frame();
        assert_eq!(engine.backend().pumps(), 2);
        assert_eq!(engine.frame().frame, 2);
    }

    #[test]
    fn new_remap_is_picked_up_at_frame_start() {
        let (mut engine, publisher) = engine(ScriptedBackend::with_joysticks(1));
        engine.backend_mut().press_button(0, 0, true);
        engine.begin_frame();
        assert!(!engine.is_active(fbk::Z as u16));

        let mut table = RemapTable::new();
        table.set(InputCode::key(fbk::Z), InputCode::joystick(0, JoystickControl::Button(0)));
        publisher.publish(table);
        assert!(!engine.is_active(fbk::Z as u16));

        engine.backend_mut().press_button(0, 0, false);
        engine.begin_frame();
        engine.backend_mut().press_button(0, 0, true);
        engine.begin_frame();
        assert!(engine.is_active(fbk::Z as u16));
    }

    #[test]
    fn keyboard_failure_reads_as_released() {
        let mut backend = ScriptedBackend::new();
        backend.keyboard.set(fbk::SPACE, true);
        backend.keyboard_error = Some("no device".into());
        let (mut engine, _publisher) = engine(backend);
        engine.begin_frame();
        assert!(!engine.is_active(fbk::SPACE as u16));
    }

    #[test]
    fn exit_key_and_axes() {
        let mut backend = ScriptedBackend::with_joysticks(1);
        backend.keyboard.set(fbk::F12, true);
        backend.joysticks[0].axes = vec![1000, -2000];
        backend.mouse = MouseSnapshot { buttons: 0, dx: 4, dy: -1 };
        let (mut engine, _publisher) = engine(backend);
        engine.begin_frame();

        assert!(engine.exit_requested());
        assert_eq!(engine.joystick_axis(0, 0), 2000);
        assert_eq!(engine.joystick_axis(0, 1), -4000);
        assert_eq!(engine.joystick_axis(3, 0), 0);
        assert_eq!(engine.mouse_axis(0, MouseAxis::X), 4);
        assert_eq!(engine.mouse_axis(1, MouseAxis::X), 0);
    }

    #[test]
    fn find_active_scans_in_order() {
        let mut backend = ScriptedBackend::with_joysticks(1);
        backend.press_button(0, 3, true);
        backend.mouse.dx = 5;
        let (mut engine, _publisher) = engine(backend);
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::from_raw(0x4083)));
        // find_active does not consume the press
        assert!(engine.is_active(0x4083));

        engine.backend_mut().press_button(0, 3, false);
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::from_raw(0x8000)));

        engine.backend_mut().keyboard.set(fbk::A, true);
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::key(fbk::A)));
    }

    #[test]
    fn held_stick_needs_movement_from_baseline() {
        let mut backend = ScriptedBackend::with_joysticks(1);
        backend.joysticks[0].axes = vec![-0x7000, 0];
        let (mut engine, _publisher) = engine(backend);
        engine.begin_frame();

        assert_eq!(engine.find_active(true), Some(InputCode::from_raw(0x4000)));
        engine.begin_frame();
        assert_eq!(engine.find_active(false), None);

        engine.backend_mut().joysticks[0].axes = vec![0, 0x7000];
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::from_raw(0x4003)));
    }

    #[test]
    fn extreme_mouse_motion_picks_dominant_axis() {
        let mut backend = ScriptedBackend::new();
        backend.mouse = MouseSnapshot { buttons: 0, dx: i32::MIN, dy: i32::MAX };
        let (mut engine, _publisher) = engine(backend);
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::from_raw(0x8000)));

        engine.backend_mut().mouse = MouseSnapshot { buttons: 0, dx: 1, dy: i32::MIN };
        engine.begin_frame();
        assert_eq!(engine.find_active(false), Some(InputCode::from_raw(0x8001)));
    }
}

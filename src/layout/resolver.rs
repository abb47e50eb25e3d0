//! Builds and publishes the remap table
//!
//! ```text
//! unmapped table
//!   └─ default bindings (player 1, device 0)
//!        └─ <identity>.joy of joystick 0   (p1..p4 → devices 0..3)
//!             └─ sfLayout overrides        (alternate layout only)
//! ```
//!
//! A missing or malformed file leaves the default bindings untouched.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::config::{parse_button, JoyConfig, PlayerConfig, PLAYERS};
use super::error::LayoutError;
use super::heuristic::{ControlInfoProvider, HardwareFamily, LayoutHeuristic, DEFAULT_FIRE_THRESHOLD};
use crate::device::DeviceRegistry;
use crate::input::code::{Direction, InputCode, JoystickControl};
use crate::input::keys::{fbk, find_key};
use crate::input::remap::{RemapPublisher, RemapTable};
use crate::input::state::MAX_JOY_BUTTONS;

/// Player 1 keys bound to device 0 buttons 1..8
pub const DEFAULT_BUTTON_KEYS: [u8; 8] = [
    fbk::Z,
    fbk::X,
    fbk::C,
    fbk::A,
    fbk::S,
    fbk::D,
    fbk::KEY_1,
    fbk::KEY_5,
];

const DIRECTION_KEYS: [(&str, Direction); 4] = [
    ("up", Direction::Up),
    ("down", Direction::Down),
    ("left", Direction::Left),
    ("right", Direction::Right),
];

#[derive(Clone, Debug)]
pub struct ResolverSettings {
    pub config_dirs: Vec<PathBuf>,
    pub fire_threshold: usize,
    pub families: Vec<HardwareFamily>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            config_dirs: vec![PathBuf::from(".")],
            fire_threshold: DEFAULT_FIRE_THRESHOLD,
            families: HardwareFamily::default_alternates(),
        }
    }
}

/// What a resolve pass ended up using
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutOutcome {
    pub identity: Option<String>,
    pub config_path: Option<PathBuf>,
    pub alternate_layout: bool,
    pub bindings: usize,
}

#[derive(Clone, Debug)]
pub struct LayoutResolver {
    settings: ResolverSettings,
    heuristic: LayoutHeuristic,
}

impl LayoutResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        let heuristic = LayoutHeuristic::new(settings.fire_threshold, settings.families.clone());
        Self {
            settings,
            heuristic,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Table holding only the built-in bindings
    pub fn default_table() -> RemapTable {
        let mut table = RemapTable::new();
        table.set(
            InputCode::key(fbk::UPARROW),
            InputCode::joystick(0, JoystickControl::Direction(Direction::Up)),
        );
        table.set(
            InputCode::key(fbk::DOWNARROW),
            InputCode::joystick(0, JoystickControl::Direction(Direction::Down)),
        );
        table.set(
            InputCode::key(fbk::LEFTARROW),
            InputCode::joystick(0, JoystickControl::Direction(Direction::Left)),
        );
        table.set(
            InputCode::key(fbk::RIGHTARROW),
            InputCode::joystick(0, JoystickControl::Direction(Direction::Right)),
        );
        for (button, key) in DEFAULT_BUTTON_KEYS.iter().enumerate() {
            table.set(
                InputCode::key(*key),
                InputCode::joystick(0, JoystickControl::Button(button as u8)),
            );
        }
        table
    }

    /// Resolves the layout for the primary joystick and publishes it
    pub fn resolve(
        &self,
        joysticks: &DeviceRegistry,
        controls: &dyn ControlInfoProvider,
        publisher: &RemapPublisher,
    ) -> LayoutOutcome {
        let identity = joysticks
            .snapshot(0)
            .filter(|record| record.has_identity())
            .map(|record| record.identity());
        let (table, outcome) = self.build(identity.as_deref(), controls);
        publisher.publish(table);
        outcome
    }

    /// Builds the table for `identity` without publishing it
    pub fn build(
        &self,
        identity: Option<&str>,
        controls: &dyn ControlInfoProvider,
    ) -> (RemapTable, LayoutOutcome) {
        let mut table = Self::default_table();
        let mut outcome = LayoutOutcome {
            identity: identity.map(str::to_string),
            ..Default::default()
        };

        let Some(identity) = identity else {
            debug!("No primary joystick identity, using default layout");
            outcome.bindings = table.mapped_count();
            return (table, outcome);
        };

        match self.load_config(identity) {
            Ok((path, config)) => {
                info!("Applying layout file {}", path.display());
                let alternate = self.heuristic.uses_alternate_layout(controls);
                for player in 0..PLAYERS {
                    if let Some(section) = config.player(player) {
                        apply_player(&mut table, &config, player as u8, section, alternate);
                    }
                }
                outcome.config_path = Some(path);
                outcome.alternate_layout = alternate;
            }
            Err(LayoutError::NotFound(name)) => {
                debug!("No layout file {} for {}, using defaults", name, identity);
            }
            Err(e) => {
                warn!("Ignoring layout for {}: {}", identity, e);
            }
        }

        outcome.bindings = table.mapped_count();
        (table, outcome)
    }

    fn load_config(&self, identity: &str) -> Result<(PathBuf, JoyConfig), LayoutError> {
        let path = JoyConfig::locate(&self.settings.config_dirs, identity)?;
        let config = JoyConfig::load(&path)?;
        Ok((path, config))
    }
}

impl Default for LayoutResolver {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

fn apply_player(
    table: &mut RemapTable,
    config: &JoyConfig,
    player: u8,
    section: &PlayerConfig,
    alternate: bool,
) {
    for (key, direction) in DIRECTION_KEYS {
        if let Some(fbk) = section.binding(key).and_then(find_key) {
            table.set(
                InputCode::key(fbk),
                InputCode::joystick(player, JoystickControl::Direction(direction)),
            );
        }
    }

    // Numbered buttons in ascending order, then labels, so a later button or
    // a label wins a contested key
    let mut entries: Vec<(&String, &str)> = section
        .bindings
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key, v)))
        .filter(|(key, _)| !DIRECTION_KEYS.iter().any(|(d, _)| *d == key.as_str()))
        .collect();
    entries.sort_by_key(|(key, _)| apply_order(key));

    for (key, value) in entries {
        bind_button(table, config, player, key, value);
    }

    if alternate {
        if let Some(sf) = &section.sf_layout {
            debug!("Applying alternate layout for player {}", player + 1);
            let mut overrides: Vec<(&String, &str)> = sf
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key, v)))
                .collect();
            overrides.sort_by_key(|(key, _)| apply_order(key));
            for (key, value) in overrides {
                bind_button(table, config, player, key, value);
            }
        }
    }
}

fn apply_order(key: &str) -> (u8, String) {
    (parse_button(key).unwrap_or(u8::MAX), key.to_string())
}

// Helper
fn bind_button(table: &mut RemapTable, config: &JoyConfig, player: u8, key: &str, value: &str) {
    let Some(button) = config.button_index(key) else {
        debug!("Unknown control '{}' for player {}", key, player + 1);
        return;
    };
    if button as usize >= MAX_JOY_BUTTONS {
        return;
    }
    match find_key(value) {
        Some(fbk) => {
            table.set(
                InputCode::key(fbk),
                InputCode::joystick(player, JoystickControl::Button(button)),
            );
        }
        None => debug!("Unknown key name '{}' for {}", value, key),
    }
}

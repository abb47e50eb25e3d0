//! Per-device button layouts
//!
//! Loads the `.joy` file matching the primary joystick's identity, decides
//! whether the alternate layout applies, and publishes the resulting
//! [`RemapTable`](crate::input::RemapTable).

pub mod config;
pub mod error;
pub mod heuristic;
pub mod resolver;

pub use config::{config_file_name, JoyConfig, PlayerConfig};
pub use error::LayoutError;
pub use heuristic::{
    ControlInfo, ControlInfoProvider, DeclaredControls, HardwareFamily, LayoutHeuristic,
    NoControls,
};
pub use resolver::{LayoutOutcome, LayoutResolver, ResolverSettings, DEFAULT_BUTTON_KEYS};

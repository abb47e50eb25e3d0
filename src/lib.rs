//! # padplex
//!
//! Hot-plug aware input layer: tracks USB joysticks and mice as they come
//! and go, folds keyboard, joystick and mouse controls into one 16-bit code
//! space, and rebinds that space from per-device `.joy` files.
//!
//! ```text
//! HotplugMonitor ──► DeviceRegistry ──► LayoutResolver ──► RemapTable
//!                                                            │
//! InputBackend ──► PollingEngine ──► FrameSnapshot ──► InputCodeSpace::resolve
//! ```

pub mod config;
pub mod context;
pub mod device;
pub mod input;
pub mod layout;

pub use config::{log_filter, InputSettings, SettingsError};
pub use context::InputContext;

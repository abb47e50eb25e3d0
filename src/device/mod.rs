//! Device tracking for hot-pluggable joysticks and mice
//!
//! Keeps one bounded [`DeviceRegistry`] per device class in sync with the
//! devices the operating system reports:
//!
//! 1. [`monitor`] - Initial scan plus background hotplug event loop
//! 2. [`registry`] - Lock-guarded, insertion-ordered device lists
//!
//! # Architecture
//!
//! ```text
//! OS (udev) ──► HotplugMonitor ──► DeviceRegistry (joystick)
//!                  (thread)     └─► DeviceRegistry (mouse)
//! ```
//!
//! Registry index 0 is the primary device of its class; the layout resolver
//! keys its configuration lookup on it.

pub mod monitor;
pub mod registry;
#[cfg(feature = "hardware")]
pub mod udev_backend;

pub use monitor::{
    DiscoveredDevice, HotplugAction, HotplugBackend, HotplugEvent, HotplugListener,
    HotplugMonitor, MonitorError, MonitorSettings, MonitorStats,
};
pub use registry::{DeviceRegistries, DeviceRegistry, DEFAULT_CAPACITY};

use serde::{Deserialize, Serialize};

/// One attached USB input device
///
/// Fields the OS could not provide are left empty rather than dropping the device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Unique OS handle (sysfs path), identity of the record
    pub path: String,
    pub vendor_id: String,
    pub product_id: String,
    pub manufacturer: String,
    pub product: String,
}

impl DeviceRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Identity string in `vendor:product` form, e.g. `0583:2060`
    pub fn identity(&self) -> String {
        format!("{}:{}", self.vendor_id, self.product_id)
    }

    /// Whether vendor and product id are both known
    pub fn has_identity(&self) -> bool {
        !self.vendor_id.is_empty() && !self.product_id.is_empty()
    }
}

/// Device classes tracked by the monitor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Joystick,
    Mouse,
}

impl DeviceClass {
    /// Classifies a device by its kernel sysname (`js0`, `mouse1`, ...)
    ///
    /// Anything else on the input subsystem (`event3`, `input7`) is not tracked.
    pub fn from_sysname(sysname: &str) -> Option<Self> {
        if sysname.starts_with("mouse") {
            Some(DeviceClass::Mouse)
        } else if sysname.starts_with("js") {
            Some(DeviceClass::Joystick)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Joystick => "joystick",
            DeviceClass::Mouse => "mouse",
        }
    }
}

//! Bounded, insertion-ordered device lists shared between the monitor thread
//! and the frame thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{DeviceClass, DeviceRecord};

/// Maximum number of devices kept per class
pub const DEFAULT_CAPACITY: usize = 8;

/// Thread-safe ordered collection of [`DeviceRecord`]s for one device class
///
/// Every operation takes the lock for the duration of the list operation only.
/// A full registry drops new devices silently; a removal compacts the list so
/// index 0 stays the oldest surviving device.
#[derive(Debug)]
pub struct DeviceRegistry {
    class: DeviceClass,
    capacity: usize,
    devices: Mutex<Vec<DeviceRecord>>,
}

impl DeviceRegistry {
    pub fn new(class: DeviceClass, capacity: usize) -> Self {
        Self {
            class,
            capacity,
            devices: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceRecord>> {
        // A panicking writer cannot leave the Vec half-updated, so poisoning is ignored.
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a device; returns false when it was dropped
    ///
    /// Dropped when the registry is full or a record with the same path is
    /// already present.
    pub fn add(&self, record: DeviceRecord) -> bool {
        let mut devices = self.lock();
        if devices.len() >= self.capacity {
            debug!(
                "{} registry full ({}), dropping {}",
                self.class.label(),
                self.capacity,
                record.path
            );
            return false;
        }
        if devices.iter().any(|d| d.path == record.path) {
            debug!("{} already registered: {}", self.class.label(), record.path);
            return false;
        }
        devices.push(record);
        true
    }

    /// Removes the device with the given path; returns false when absent
    pub fn remove(&self, path: &str) -> bool {
        let mut devices = self.lock();
        match devices.iter().position(|d| d.path == path) {
            Some(index) => {
                // Vec::remove shifts the tail down, keeping relative order.
                devices.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of the device at `index`, if any
    pub fn snapshot(&self, index: usize) -> Option<DeviceRecord> {
        self.lock().get(index).cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Copy of all devices in registry order
    pub fn records(&self) -> Vec<DeviceRecord> {
        self.lock().clone()
    }

    /// `vendor:product` of the device at `index`
    pub fn identity(&self, index: usize) -> Option<String> {
        self.lock().get(index).map(DeviceRecord::identity)
    }

    /// Product name of the device at `index`
    pub fn product_name(&self, index: usize) -> Option<String> {
        self.lock().get(index).map(|d| d.product.clone())
    }

    /// Logs every device at debug level
    pub fn dump(&self, description: &str) {
        let devices = self.records();
        for (index, device) in devices.iter().enumerate() {
            debug!(
                "{} {}: {} {} ({})",
                self.class.label(),
                index,
                device.identity(),
                device.product,
                device.path
            );
        }
        debug!("{} {}", devices.len(), description);
    }
}

/// The pair of registries the monitor keeps in sync
#[derive(Clone, Debug)]
pub struct DeviceRegistries {
    pub joysticks: Arc<DeviceRegistry>,
    pub mice: Arc<DeviceRegistry>,
}

impl DeviceRegistries {
    pub fn new(capacity: usize) -> Self {
        Self {
            joysticks: Arc::new(DeviceRegistry::new(DeviceClass::Joystick, capacity)),
            mice: Arc::new(DeviceRegistry::new(DeviceClass::Mouse, capacity)),
        }
    }

    pub fn for_class(&self, class: DeviceClass) -> &Arc<DeviceRegistry> {
        match class {
            DeviceClass::Joystick => &self.joysticks,
            DeviceClass::Mouse => &self.mice,
        }
    }

    pub fn clear(&self) {
        self.joysticks.clear();
        self.mice.clear();
    }

    pub fn dump(&self) {
        self.joysticks.dump("joystick(s)");
        self.mice.dump("m(ous|ic)e");
    }
}

impl Default for DeviceRegistries {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! udev implementation of the hotplug backend
//!
//! Enumerates the `input` subsystem and listens on the udev netlink socket.
//! The socket is checked with a zero-timeout `poll(2)` so the monitor loop
//! never blocks on it.

use std::os::unix::io::AsRawFd;
use tracing::debug;
use udev::{Device, Enumerator, EventType, MonitorBuilder, MonitorSocket};

use super::monitor::{
    DiscoveredDevice, HotplugAction, HotplugBackend, HotplugEvent, HotplugListener, MonitorError,
};
use super::DeviceRecord;

const SUBSYSTEM: &str = "input";

/// Hotplug backend backed by libudev
#[derive(Debug, Default)]
pub struct UdevBackend;

impl HotplugBackend for UdevBackend {
    type Listener = UdevListener;

    fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, MonitorError> {
        let mut enumerator =
            Enumerator::new().map_err(|e| MonitorError::ScanFailed(e.to_string()))?;
        enumerator
            .match_subsystem(SUBSYSTEM)
            .map_err(|e| MonitorError::ScanFailed(e.to_string()))?;
        let devices = enumerator
            .scan_devices()
            .map_err(|e| MonitorError::ScanFailed(e.to_string()))?;

        Ok(devices
            .map(|device| DiscoveredDevice {
                sysname: device.sysname().to_string_lossy().into_owned(),
                record: record_from(&device),
            })
            .collect())
    }

    fn listen(&mut self) -> Result<UdevListener, MonitorError> {
        let socket = MonitorBuilder::new()
            .and_then(|builder| builder.match_subsystem(SUBSYSTEM))
            .and_then(|builder| builder.listen())
            .map_err(|e| MonitorError::Unavailable(e.to_string()))?;
        debug!("Listening for udev events on subsystem '{}'", SUBSYSTEM);
        Ok(UdevListener { socket })
    }
}

/// Open udev netlink socket
pub struct UdevListener {
    socket: MonitorSocket,
}

impl UdevListener {
    fn is_readable(&self) -> bool {
        let mut fds = libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `fds` is a single valid pollfd that outlives the call.
        let ready = unsafe { libc::poll(&mut fds, 1, 0) };
        ready > 0 && fds.revents & libc::POLLIN != 0
    }
}

impl HotplugListener for UdevListener {
    fn poll_event(&mut self) -> Option<HotplugEvent> {
        if !self.is_readable() {
            return None;
        }

        // poll() reported data, so receiving does not block.
        let event = self.socket.iter().next()?;
        let action = match event.event_type() {
            EventType::Add => HotplugAction::Add,
            EventType::Remove => HotplugAction::Remove,
            other => HotplugAction::Other(format!("{:?}", other).to_lowercase()),
        };
        let device = event.device();

        Some(HotplugEvent {
            action,
            sysname: device.sysname().to_string_lossy().into_owned(),
            record: record_from(&device),
        })
    }
}

/// Builds a record from the device and its USB parent
///
/// Devices without a USB parent (or with missing attributes) keep empty fields.
fn record_from(device: &Device) -> DeviceRecord {
    let usb = device
        .parent_with_subsystem_devtype("usb", "usb_device")
        .ok()
        .flatten();
    let attribute = |name: &str| -> String {
        usb.as_ref()
            .and_then(|parent| parent.attribute_value(name))
            .map(|value| value.to_string_lossy().trim().to_string())
            .unwrap_or_default()
    };

    DeviceRecord {
        path: device.syspath().to_string_lossy().into_owned(),
        vendor_id: attribute("idVendor"),
        product_id: attribute("idProduct"),
        manufacturer: attribute("manufacturer"),
        product: attribute("product"),
    }
}

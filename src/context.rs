//! Owner of every input component
//!
//! ```text
//! InputContext
//!   ├── HotplugMonitor   (registries, monitor thread)
//!   ├── LayoutResolver ──publish──► RemapPublisher
//!   └── PollingEngine  ◄──watch───┘
//! ```
//!
//! Nothing here is global; several contexts can live side by side.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::InputSettings;
use crate::device::{DeviceRegistry, HotplugBackend, HotplugMonitor, MonitorError};
use crate::input::{DecodedCode, InputBackend, InputCode, PollingEngine, RemapPublisher};
use crate::layout::{ControlInfoProvider, LayoutOutcome, LayoutResolver};

pub struct InputContext<B: InputBackend> {
    monitor: HotplugMonitor,
    publisher: RemapPublisher,
    resolver: LayoutResolver,
    engine: PollingEngine<B>,
    layout: Option<LayoutOutcome>,
}

impl<B: InputBackend> InputContext<B> {
    pub fn new(settings: &InputSettings, backend: B) -> Self {
        let publisher = RemapPublisher::new();
        let engine = PollingEngine::new(backend, settings.polling_settings(), publisher.subscribe());
        Self {
            monitor: HotplugMonitor::new(settings.monitor_settings()),
            publisher,
            resolver: LayoutResolver::new(settings.resolver_settings()),
            engine,
            layout: None,
        }
    }

    /// Starts device tracking and publishes the first layout
    ///
    /// A hotplug channel that cannot be opened is not fatal: the devices
    /// found by the initial scan are used as they are.
    pub fn init<H: HotplugBackend>(
        &mut self,
        hotplug: H,
        controls: &dyn ControlInfoProvider,
    ) -> LayoutOutcome {
        match self.monitor.start(hotplug) {
            Ok(()) => {}
            Err(MonitorError::Unavailable(reason)) => {
                warn!("Hotplug tracking disabled ({}), devices scanned once", reason);
            }
            Err(e) => {
                warn!("Hotplug monitor failed to start: {}", e);
            }
        }
        self.reload_layout(controls)
    }

    /// Rebuilds and republishes the remap table from the current devices
    pub fn reload_layout(&mut self, controls: &dyn ControlInfoProvider) -> LayoutOutcome {
        let outcome = self
            .resolver
            .resolve(&self.monitor.joysticks(), controls, &self.publisher);
        info!(
            "Layout for {}: {} binding(s){}",
            outcome.identity.as_deref().unwrap_or("no joystick"),
            outcome.bindings,
            if outcome.alternate_layout {
                ", alternate layout"
            } else {
                ""
            }
        );
        self.layout = Some(outcome.clone());
        outcome
    }

    pub fn begin_frame(&mut self) {
        self.engine.begin_frame();
    }

    pub fn is_active(&mut self, code: u16) -> bool {
        self.engine.is_active(code)
    }

    pub fn find_active(&mut self, create_baseline: bool) -> Option<InputCode> {
        self.engine.find_active(create_baseline)
    }

    pub fn exit_requested(&self) -> bool {
        self.engine.exit_requested()
    }

    /// Name of the device a code belongs to
    ///
    /// Joysticks are named by the polling backend, so the name matches the
    /// device whose state the code reads. The registry product name is the
    /// fallback for backends that report no names.
    pub fn control_name(&self, code: u16) -> Option<String> {
        match InputCode::from_raw(code).decode() {
            DecodedCode::Keyboard(_) => Some("System keyboard".to_string()),
            DecodedCode::Joystick { device, .. } => {
                let index = device as usize;
                let backend = self.engine.backend();
                if index >= backend.joystick_count() {
                    return None;
                }
                backend
                    .joystick_name(index)
                    .or_else(|| self.monitor.joysticks().product_name(index))
            }
            DecodedCode::Mouse { index: 0, .. } => Some("System mouse".to_string()),
            _ => None,
        }
    }

    pub fn joysticks(&self) -> Arc<DeviceRegistry> {
        self.monitor.joysticks()
    }

    pub fn mice(&self) -> Arc<DeviceRegistry> {
        self.monitor.mice()
    }

    pub fn dump_devices(&self) {
        self.monitor.registries().dump();
    }

    pub fn layout(&self) -> Option<&LayoutOutcome> {
        self.layout.as_ref()
    }

    pub fn monitor(&self) -> &HotplugMonitor {
        &self.monitor
    }

    pub fn publisher(&self) -> &RemapPublisher {
        &self.publisher
    }

    pub fn engine(&self) -> &PollingEngine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PollingEngine<B> {
        &mut self.engine
    }

    /// Stops the monitor thread; the registries keep their last contents
    pub fn shutdown(&mut self) {
        self.monitor.stop();
    }
}

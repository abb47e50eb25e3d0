//! Hotplug monitor
//!
//! Runs the device scan and the hotplug event loop on a dedicated thread.
//! The worker inside that thread is a statum state machine:
//!
//! ```text
//! Scanning ──► Listening ──► (stop flag) exit
//! ```
//!
//! [`HotplugMonitor::start`] blocks until the initial scan has been applied and
//! the notification channel is open (or failed to open), so callers see a fully
//! populated registry as soon as it returns.

use chrono::Local;
use statum::{machine, state};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::registry::{DeviceRegistries, DeviceRegistry, DEFAULT_CAPACITY};
use super::{DeviceClass, DeviceRecord};

/// Kind of change reported by the OS
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
    /// Any other action (`change`, `bind`, ...), ignored by the monitor
    Other(String),
}

/// A single hotplug notification
#[derive(Clone, Debug)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    /// Kernel name used for classification (`js0`, `mouse1`, `event5`)
    pub sysname: String,
    pub record: DeviceRecord,
}

impl HotplugEvent {
    pub fn add(sysname: impl Into<String>, record: DeviceRecord) -> Self {
        Self {
            action: HotplugAction::Add,
            sysname: sysname.into(),
            record,
        }
    }

    pub fn remove(sysname: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            action: HotplugAction::Remove,
            sysname: sysname.into(),
            record: DeviceRecord::new(path),
        }
    }
}

/// A device found by the initial enumeration
#[derive(Clone, Debug)]
pub struct DiscoveredDevice {
    pub sysname: String,
    pub record: DeviceRecord,
}

/// Non-blocking source of hotplug notifications
pub trait HotplugListener {
    /// Returns the next pending event, or `None` when nothing is ready.
    ///
    /// Must not block: implementations use a zero-timeout readiness check.
    fn poll_event(&mut self) -> Option<HotplugEvent>;
}

/// OS access used by the monitor thread
///
/// The backend is moved into the monitor thread, so OS handles that are not
/// `Send` are only ever created there.
pub trait HotplugBackend: Send + 'static {
    type Listener: HotplugListener;

    /// Enumerates every device currently attached on the input subsystem
    fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, MonitorError>;

    /// Opens the hotplug notification channel
    fn listen(&mut self) -> Result<Self::Listener, MonitorError>;
}

/// Monitor errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Hotplug notifications unavailable: {0}")]
    Unavailable(String),

    #[error("Device scan failed: {0}")]
    ScanFailed(String),

    #[error("Failed to spawn monitor thread: {0}")]
    ThreadSpawn(String),
}

/// Monitor settings
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    /// Sleep between two readiness checks of the notification channel
    pub poll_interval: Duration,
    pub registry_capacity: usize,
    /// How often the event loop logs its counters
    pub stats_interval_secs: i64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            registry_capacity: DEFAULT_CAPACITY,
            stats_interval_secs: 60,
        }
    }
}

/// Counters shared between the monitor thread and its handle
#[derive(Debug, Default)]
pub struct MonitorStats {
    applied: AtomicU64,
    ignored: AtomicU64,
}

impl MonitorStats {
    /// Events that changed a registry
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Events for untracked devices, unknown actions or rejected adds
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum WorkerState {
    Scanning,
    Listening,
}

#[machine]
#[derive(Debug)]
pub struct MonitorWorker<S: WorkerState> {
    registries: DeviceRegistries,
    stop: Arc<AtomicBool>,
    stats: Arc<MonitorStats>,
    settings: MonitorSettings,
}

impl<S: WorkerState> MonitorWorker<S> {
    fn registry_for(&self, sysname: &str) -> Option<&Arc<DeviceRegistry>> {
        DeviceClass::from_sysname(sysname).map(|class| self.registries.for_class(class))
    }
}

impl MonitorWorker<Scanning> {
    pub fn create(
        registries: DeviceRegistries,
        stop: Arc<AtomicBool>,
        stats: Arc<MonitorStats>,
        settings: MonitorSettings,
    ) -> Self {
        Self::new(registries, stop, stats, settings)
    }

    /// Clears both registries and repopulates them from a full enumeration
    ///
    /// A failed enumeration leaves the registries empty; the event loop can
    /// still pick devices up as they are plugged in.
    pub fn scan<B: HotplugBackend>(self, backend: &mut B) -> MonitorWorker<Listening> {
        info!("Scanning devices...");
        self.registries.clear();

        match backend.scan() {
            Ok(devices) => {
                for device in devices {
                    if let Some(registry) = self.registry_for(&device.sysname) {
                        registry.add(device.record);
                    }
                }
                info!(
                    "Scan complete: {} joystick(s), {} mouse/mice",
                    self.registries.joysticks.count(),
                    self.registries.mice.count()
                );
                self.registries.dump();
            }
            Err(e) => {
                error!("Initial device scan failed: {}", e);
            }
        }

        self.transition()
    }
}

impl MonitorWorker<Listening> {
    /// Applies one event to the matching registry; returns whether it changed anything
    pub fn apply(&self, event: HotplugEvent) -> bool {
        let Some(registry) = self.registry_for(&event.sysname) else {
            debug!("Ignoring event for untracked device {}", event.sysname);
            self.stats.ignored.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let label = registry.class().label();
        let changed = match event.action {
            HotplugAction::Add => {
                debug!("+ {} {}", label, event.record.path);
                registry.add(event.record)
            }
            HotplugAction::Remove => {
                debug!("- {} {}", label, event.record.path);
                registry.remove(&event.record.path)
            }
            HotplugAction::Other(action) => {
                debug!("Ignoring '{}' for {} {}", action, label, event.sysname);
                false
            }
        };

        let counter = if changed {
            &self.stats.applied
        } else {
            &self.stats.ignored
        };
        counter.fetch_add(1, Ordering::Relaxed);
        changed
    }

    /// Applies every event that is ready right now
    pub fn drain<L: HotplugListener>(&self, listener: &mut L) -> usize {
        let mut count = 0;
        while let Some(event) = listener.poll_event() {
            self.apply(event);
            count += 1;
        }
        count
    }

    /// Event loop; returns once the stop flag is observed
    pub fn run<L: HotplugListener>(self, mut listener: L) {
        info!("udev monitor starting");

        let stats_interval = chrono::Duration::seconds(self.settings.stats_interval_secs);
        let mut last_log_time = Local::now();

        while !self.stop.load(Ordering::Acquire) {
            if self.drain(&mut listener) > 0 {
                self.registries.dump();
            }

            let now = Local::now();
            if now - last_log_time > stats_interval {
                info!(
                    "Hotplug monitor stats: {} applied, {} ignored, {} joystick(s), {} mouse/mice",
                    self.stats.applied(),
                    self.stats.ignored(),
                    self.registries.joysticks.count(),
                    self.registries.mice.count()
                );
                last_log_time = now;
            }

            // stop() unparks the thread, so shutdown does not wait out the full interval
            thread::park_timeout(self.settings.poll_interval);
        }

        info!("udev monitor exiting");
    }
}

struct RunningMonitor {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owner of the device registries and the monitor thread
///
/// `start` may be called again after `stop`; every start builds fresh
/// registries, so handles obtained before a restart keep the old lists.
pub struct HotplugMonitor {
    settings: MonitorSettings,
    registries: DeviceRegistries,
    stats: Arc<MonitorStats>,
    running: Option<RunningMonitor>,
}

impl HotplugMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        let registries = DeviceRegistries::new(settings.registry_capacity);
        Self {
            settings,
            registries,
            stats: Arc::new(MonitorStats::default()),
            running: None,
        }
    }

    pub fn registries(&self) -> DeviceRegistries {
        self.registries.clone()
    }

    pub fn joysticks(&self) -> Arc<DeviceRegistry> {
        self.registries.joysticks.clone()
    }

    pub fn mice(&self) -> Arc<DeviceRegistry> {
        self.registries.mice.clone()
    }

    pub fn stats(&self) -> Arc<MonitorStats> {
        self.stats.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Scans attached devices, then keeps the registries updated in the background
    ///
    /// Returns once the scan has been applied. If the notification channel
    /// cannot be opened, the scan results stay in place and
    /// [`MonitorError::Unavailable`] is returned; no thread keeps running.
    pub fn start<B: HotplugBackend>(&mut self, backend: B) -> Result<(), MonitorError> {
        if self.running.is_some() {
            debug!("Hotplug monitor already running");
            return Ok(());
        }

        self.registries = DeviceRegistries::new(self.settings.registry_capacity);
        self.stats = Arc::new(MonitorStats::default());
        let stop = Arc::new(AtomicBool::new(false));

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), MonitorError>>(1);
        let registries = self.registries.clone();
        let stats = self.stats.clone();
        let settings = self.settings.clone();
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("hotplug_monitor".to_string())
            .spawn(move || {
                let mut backend = backend;
                let worker = MonitorWorker::create(registries, thread_stop, stats, settings)
                    .scan(&mut backend);

                match backend.listen() {
                    Ok(listener) => {
                        let _ = ready_tx.send(Ok(()));
                        worker.run(listener);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| MonitorError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("udev initialized");
                self.running = Some(RunningMonitor { stop, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                warn!("{}; continuing with initial scan only", e);
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                error!("Hotplug monitor thread exited during startup");
                Err(MonitorError::Unavailable(
                    "monitor thread exited during startup".to_string(),
                ))
            }
        }
    }

    /// Stops the event loop and waits for the thread to exit
    ///
    /// No registry mutation happens after this returns. Safe to call when the
    /// monitor never started or already stopped.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.stop.store(true, Ordering::Release);
        running.handle.thread().unpark();
        if running.handle.join().is_err() {
            error!("Hotplug monitor thread panicked");
        }
        info!("udev shut down");
    }
}

impl Drop for HotplugMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn pad(path: &str) -> DeviceRecord {
        DeviceRecord {
            path: path.to_string(),
            vendor_id: "0583".into(),
            product_id: "2060".into(),
            manufacturer: String::new(),
            product: "USB Gamepad".into(),
        }
    }

    type Queue = Arc<Mutex<VecDeque<HotplugEvent>>>;

    struct QueueListener(Queue);

    impl HotplugListener for QueueListener {
        fn poll_event(&mut self) -> Option<HotplugEvent> {
            self.0.lock().ok()?.pop_front()
        }
    }

    struct FakeBackend {
        attached: Vec<DiscoveredDevice>,
        queue: Queue,
        listen_fails: bool,
    }

    impl FakeBackend {
        fn new(attached: &[(&str, &str)]) -> Self {
            Self {
                attached: attached
                    .iter()
                    .map(|(sysname, path)| DiscoveredDevice {
                        sysname: sysname.to_string(),
                        record: pad(path),
                    })
                    .collect(),
                queue: Arc::new(Mutex::new(VecDeque::new())),
                listen_fails: false,
            }
        }
    }

    impl HotplugBackend for FakeBackend {
        type Listener = QueueListener;

        fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, MonitorError> {
            Ok(self.attached.clone())
        }

        fn listen(&mut self) -> Result<QueueListener, MonitorError> {
            if self.listen_fails {
                return Err(MonitorError::Unavailable("netlink refused".into()));
            }
            Ok(QueueListener(self.queue.clone()))
        }
    }

    fn fast_settings() -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn wait_until_drained(queue: &Queue) {
        for _ in 0..5000 {
            if queue.lock().map(|q| q.is_empty()).unwrap_or(true) {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("monitor did not drain its queue");
    }

    #[test]
    fn start_scans_and_classifies_devices() {
        let backend = FakeBackend::new(&[
            ("js0", "/sys/js0"),
            ("event3", "/sys/event3"),
            ("mouse0", "/sys/mouse0"),
            ("js1", "/sys/js1"),
        ]);
        let mut monitor = HotplugMonitor::new(fast_settings());

        monitor.start(backend).expect("monitor should start");

        assert!(monitor.is_running());
        assert_eq!(monitor.joysticks().count(), 2);
        assert_eq!(monitor.mice().count(), 1);
        assert_eq!(
            monitor.joysticks().snapshot(0).map(|d| d.path),
            Some("/sys/js0".to_string())
        );
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[test]
    fn events_are_applied_and_foreign_devices_ignored() {
        let backend = FakeBackend::new(&[("js0", "/sys/js0")]);
        let queue = backend.queue.clone();
        let mut monitor = HotplugMonitor::new(fast_settings());
        monitor.start(backend).expect("monitor should start");

        {
            let mut q = queue.lock().unwrap();
            q.push_back(HotplugEvent::add("js1", pad("/sys/js1")));
            q.push_back(HotplugEvent::add("event7", pad("/sys/event7")));
            q.push_back(HotplugEvent::remove("js0", "/sys/js0"));
            q.push_back(HotplugEvent::add("mouse0", pad("/sys/mouse0")));
        }
        wait_until_drained(&queue);
        monitor.stop();

        let joysticks: Vec<String> =
            monitor.joysticks().records().into_iter().map(|d| d.path).collect();
        assert_eq!(joysticks, vec!["/sys/js1"]);
        assert_eq!(monitor.mice().count(), 1);
        assert_eq!(monitor.stats().applied(), 3);
        assert_eq!(monitor.stats().ignored(), 1);
    }

    #[test]
    fn unavailable_channel_keeps_scan_results() {
        let mut backend = FakeBackend::new(&[("js0", "/sys/js0"), ("mouse0", "/sys/mouse0")]);
        backend.listen_fails = true;
        let mut monitor = HotplugMonitor::new(fast_settings());

        let result = monitor.start(backend);

        assert!(matches!(result, Err(MonitorError::Unavailable(_))));
        assert!(!monitor.is_running());
        assert_eq!(monitor.joysticks().count(), 1);
        assert_eq!(monitor.mice().count(), 1);

        // stop after a failed start is harmless, twice over
        monitor.stop();
        monitor.stop();
    }

    #[test]
    fn restart_rebuilds_registries() {
        let mut monitor = HotplugMonitor::new(fast_settings());
        monitor
            .start(FakeBackend::new(&[("js0", "/sys/js0")]))
            .expect("first start");
        let before = monitor.joysticks();
        monitor.stop();

        monitor
            .start(FakeBackend::new(&[("js4", "/sys/js4"), ("js5", "/sys/js5")]))
            .expect("second start");

        assert!(!Arc::ptr_eq(&before, &monitor.joysticks()));
        assert_eq!(before.count(), 1);
        assert_eq!(monitor.joysticks().count(), 2);
        monitor.stop();
    }

    #[test]
    fn worker_ignores_unknown_actions() {
        let registries = DeviceRegistries::default();
        let stats = Arc::new(MonitorStats::default());
        let worker = MonitorWorker::create(
            registries.clone(),
            Arc::new(AtomicBool::new(false)),
            stats.clone(),
            MonitorSettings::default(),
        )
        .scan(&mut FakeBackend::new(&[]));

        let change = HotplugEvent {
            action: HotplugAction::Other("change".into()),
            sysname: "js0".into(),
            record: pad("/sys/js0"),
        };
        assert!(!worker.apply(change));
        assert!(worker.apply(HotplugEvent::add("js0", pad("/sys/js0"))));
        assert_eq!(registries.joysticks.count(), 1);
        assert_eq!(stats.ignored(), 1);
    }
}

use color_eyre::{eyre::eyre, Result};
use padplex::device::udev_backend::UdevBackend;
use padplex::input::hardware::HardwareBackend;
use padplex::layout::NoControls;
use padplex::{log_filter, InputContext, InputSettings};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = InputSettings::load_or_default();
    debug!("Settings: {:?}", settings);

    let backend =
        HardwareBackend::new().map_err(|e| eyre!("Failed to open input devices: {}", e))?;
    for (index, name) in backend.joystick_names().iter().enumerate() {
        info!("  [{}] {}", index, name);
    }

    let mut context = InputContext::new(&settings, backend);
    let layout = context.init(UdevBackend, &NoControls);
    if let Some(path) = &layout.config_path {
        info!("Layout file: {}", path.display());
    }
    context.dump_devices();

    info!("Polling input, press the exit key or Ctrl+C to quit");
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    let mut last_active = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
            _ = interval.tick() => {
                context.begin_frame();
                if context.exit_requested() {
                    info!("Exit key pressed");
                    break;
                }

                let active = context.find_active(true);
                if active != last_active {
                    if let Some(code) = active {
                        info!(
                            "Active: {} ({})",
                            code,
                            context
                                .control_name(code.raw())
                                .unwrap_or_else(|| "unknown device".to_string())
                        );
                    }
                    last_active = active;
                }
            }
        }
    }

    context.shutdown();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let directives = std::env::var("RUST_LOG").ok();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

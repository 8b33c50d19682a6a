//! # padview
//!
//! Visualize live game-controller input received over a serial link.
//!
//! This binary is the headless desktop shell: it loads the configuration,
//! scans the skin catalog, loads the selected skin, and drives the viewer
//! from a timer loop. Control updates are traced rather than rendered;
//! windowed and compositor shells live outside this crate and implement the
//! same `PresentationAdapter` seam.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::interval;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use padview::config::{Config, LogConfig};
use padview::ports::list_ports;
use padview::scene::{
    AnalogControl, ButtonControl, ControlSink, DrawRegion, PresentationAdapter, StickControl,
};
use padview::skin::{scan_skins, SkinDescriptor};
use padview::viewer::InputViewer;

/// Tick rate for the read-decode-repaint loop (ticks per second)
const TICK_RATE_HZ: u32 = 250;

/// Number of decoded frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Default configuration file path
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Presentation adapter that traces control updates instead of drawing
/// them. Scene bounds are the extent of the skin's placements.
#[derive(Default)]
struct TraceAdapter {
    width: u32,
    height: u32,
}

struct TraceButton {
    label: String,
    pressed: bool,
}

impl ButtonControl for TraceButton {
    fn update(&mut self, pressed: bool) {
        if pressed != self.pressed {
            self.pressed = pressed;
            debug!(
                "{} {}",
                self.label,
                if pressed { "pressed" } else { "released" }
            );
        }
    }
}

struct TraceStick {
    label: String,
}

impl StickControl for TraceStick {
    fn update(&mut self, dx: f32, dy: f32) {
        debug!("{} at ({dx:+.1}, {dy:+.1})", self.label);
    }
}

struct TraceAnalog {
    label: String,
}

impl AnalogControl for TraceAnalog {
    fn update(&mut self, region: DrawRegion) {
        debug!(
            "{} region {}x{} at ({}, {})",
            self.label, region.width, region.height, region.x, region.y
        );
    }
}

impl PresentationAdapter for TraceAdapter {
    fn setup_scene(
        &mut self,
        descriptor: &SkinDescriptor,
        sink: &mut dyn ControlSink,
    ) -> padview::error::Result<()> {
        for (i, button) in descriptor.buttons().iter().enumerate() {
            self.grow_to(&button.geometry);
            sink.assign_button(
                button,
                Box::new(TraceButton {
                    label: format!("button[{i}] ({})", button.image),
                    pressed: false,
                }),
            );
        }
        for (i, stick) in descriptor.sticks().iter().enumerate() {
            self.grow_to(&stick.geometry);
            sink.assign_stick(
                stick,
                Box::new(TraceStick {
                    label: format!("stick[{i}] ({})", stick.image),
                }),
            );
        }
        for (i, analog) in descriptor.analogs().iter().enumerate() {
            self.grow_to(&analog.geometry);
            sink.assign_analog(
                analog,
                Box::new(TraceAnalog {
                    label: format!("analog[{i}] ({})", analog.image),
                }),
            );
        }
        Ok(())
    }

    fn update(&mut self) {}

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl TraceAdapter {
    fn grow_to(&mut self, geometry: &padview::skin::Geometry) {
        let right = geometry.x.max(0) as u32 + geometry.width;
        let bottom = geometry.y.max(0) as u32 + geometry.height;
        self.width = self.width.max(right);
        self.height = self.height.max(bottom);
    }
}

/// Initialize tracing; logs go to daily files when a log directory is
/// configured, to stdout otherwise
fn init_logging(log: &LogConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if log.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    } else {
        let appender = tracing_appender::rolling::daily(&log.dir, "padview.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let _log_guard = init_logging(&config.log);
    info!("padview v{} starting...", env!("CARGO_PKG_VERSION"));

    if config.serial.port.is_empty() {
        info!("no serial port configured; available devices:");
        for port in list_ports() {
            info!("  {} - {}", port.name, port.description);
        }
        bail!("set [serial] port in {config_path} and run again");
    }

    let family = config.skins.family()?;
    let catalog = scan_skins(Path::new(&config.skins.root));
    info!(
        "found {} skin(s) under {}",
        catalog.len(),
        config.skins.root
    );

    let entry = if config.skins.skin.is_empty() {
        catalog.skins_for(family).first()
    } else {
        catalog.find(family, &config.skins.skin)
    };
    let Some(entry) = entry else {
        let available: Vec<_> = catalog
            .skins_for(family)
            .iter()
            .map(|entry| entry.skin_name.as_str())
            .collect();
        bail!("no {family} skin matching '{}' (available: {available:?})", config.skins.skin);
    };

    let descriptor = SkinDescriptor::load(&entry.skin_path, family)?;
    info!(
        "loaded {family} skin '{}' by {}",
        descriptor.name(),
        descriptor.author()
    );

    let mut viewer = InputViewer::new(
        &descriptor,
        family,
        config.serial.clone(),
        TraceAdapter::default(),
    )?;
    info!(
        "scene is {}x{}, reading {} from {}",
        viewer.width(),
        viewer.height(),
        family,
        config.serial.port
    );

    let period_ms = 1000 / TICK_RATE_HZ;
    let mut tick_interval = interval(Duration::from_millis(u64::from(period_ms)));

    info!("starting viewer loop at {TICK_RATE_HZ}Hz, press Ctrl+C to exit");

    let mut frame_count: u64 = 0;
    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if viewer.tick().await {
                    frame_count += 1;

                    if frame_count - last_log_count >= LOG_INTERVAL_FRAMES {
                        info!("decoded {frame_count} frames");
                        last_log_count = frame_count;
                    }
                } else if !viewer.valid() {
                    debug!("device disconnected, waiting for reconnect");
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down...");
                info!("total frames decoded: {frame_count}");
                break;
            }
        }
    }

    Ok(())
}

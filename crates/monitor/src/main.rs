//! Driver Safety Monitor - Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use alerting::LoggingOutputs;
use event_fusion::SafetyEngine;
use monitor::hardware::SensorFeeds;
use monitor::replay::{load_replay, FrameSource, IdleFrameSource};
use monitor::speech::ConsoleTranscriber;
use monitor::{
    init_logging, install_metrics, run_server, AppState, ControlMessage, Driver, DriverPorts,
    Settings,
};
use notifier::{EmergencyNotifier, LoggingNotifier, MqttNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_logging(&settings.logging);

    info!("=== Driver Safety Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    install_metrics(&settings.metrics).context("installing metrics exporter")?;

    let mut feeds = SensorFeeds::start(&settings.sensors);
    if settings.gps.enabled {
        match sensors::spawn_serial_gps(&settings.gps.serial) {
            Ok(feed) => feeds.gps = Some(feed),
            Err(e) => warn!("GPS unavailable, continuing without a fix: {}", e),
        }
    }

    let frames: Box<dyn FrameSource> = match &settings.replay.path {
        Some(path) => Box::new(
            load_replay(path).with_context(|| format!("opening replay {}", path.display()))?,
        ),
        None => Box::new(IdleFrameSource),
    };

    let notifier: Arc<dyn EmergencyNotifier> = if settings.mqtt.enabled {
        Arc::new(MqttNotifier::connect(&settings.mqtt.broker))
    } else {
        Arc::new(LoggingNotifier)
    };

    let ports = DriverPorts {
        frames,
        feeds,
        outputs: Box::new(LoggingOutputs::default()),
        notifier,
        speech: Arc::new(ConsoleTranscriber::default()),
    };
    let engine = SafetyEngine::new(settings.engine.clone());
    let (driver, handle) = Driver::new(
        engine,
        ports,
        settings.mqtt.broker.vehicle_id.clone(),
        settings.replay.frame_interval(),
    );
    let mut driver_task = tokio::spawn(driver.run());

    if settings.http.enabled {
        let state = Arc::new(AppState::new(handle.clone()));
        let bind = settings.http.bind;
        tokio::spawn(async move {
            if let Err(e) = run_server(bind, state).await {
                error!("API server stopped: {}", e);
            }
        });
    }

    tokio::select! {
        result = &mut driver_task => {
            result.context("driver loop panicked")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for ctrl-c")?;
            info!("Interrupted, shutting down");
            if handle.control.send(ControlMessage::Shutdown).await.is_ok() {
                driver_task.await.context("driver loop panicked")?;
            }
        }
    }

    Ok(())
}

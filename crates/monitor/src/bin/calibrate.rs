//! Sensor calibration tool
//!
//! Reads the same settings as the monitor so the recommendation applies to
//! the channels the service will actually use.

use std::io::BufRead;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use monitor::calibrate::{calibrate_alcohol, calibrate_level, SamplingPlan};
use monitor::hardware::{accelerometer, gas_sensor};
use monitor::{init_logging, Settings};

#[derive(Parser, Debug)]
#[command(name = "safety-calibrate")]
#[command(about = "Calibrate the alcohol sensor threshold or check the accelerometer is level", long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Readings per batch
    #[arg(long, default_value_t = 100)]
    samples: usize,

    /// Milliseconds between readings
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Clean-air and alcohol-vapour batches, then a threshold recommendation
    Alcohol,
    /// Average readings at rest and report the mounting tilt
    Level,
}

fn wait_for_enter(step: &str) -> std::io::Result<()> {
    info!("{}", step);
    info!("Press Enter when ready...");
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::load().context("loading settings")?;
    init_logging(&settings.logging);

    let plan = SamplingPlan {
        samples: args.samples.max(1),
        delay: Duration::from_millis(args.delay_ms),
    };

    match args.mode {
        Mode::Alcohol => {
            let Some(mut sensor) = gas_sensor(&settings.sensors) else {
                bail!("no gas sensor configured (sensors.gas_path)");
            };
            calibrate_alcohol(&mut sensor, plan, wait_for_enter)
                .context("alcohol calibration")?;
        }
        Mode::Level => {
            let Some(mut sensor) = accelerometer(&settings.sensors) else {
                bail!("accelerometer not configured (sensors.accel_x/y/z_path)");
            };
            info!("Place the unit on a level surface and keep it still");
            calibrate_level(&mut sensor, plan).context("accelerometer check")?;
        }
    }

    Ok(())
}

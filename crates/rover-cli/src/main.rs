//! RC Avoidance Console - Main Entry Point
//!
//! Drives a controller on simulated hardware from stdin commands, the way a
//! mission planner would drive it on the vehicle.

mod commands;
mod settings;

use clap::Parser;
use commands::OperatorCommand;
use depth_sensor::SyntheticScene;
use rc_controller::{ControlError, Controller, SimulatedHardware};
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(about = "Reactive obstacle-avoidance controller console", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Synthetic scene: clear, left-wall, right-wall, pillar, dead-end, slalom
    #[arg(short, long)]
    scene: Option<SyntheticScene>,

    /// Log every verdict and enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// Start the control loop immediately
    #[arg(long)]
    autostart: bool,
}

/// Initialize logging
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn print_status(controller: &Controller) {
    match serde_json::to_string(&controller.status_report()) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode status: {}", e),
    }
}

fn execute(controller: &mut Controller, command: OperatorCommand) -> Result<(), ControlError> {
    match command {
        OperatorCommand::Start => controller.start(),
        OperatorCommand::Pause => controller.pause(),
        OperatorCommand::Resume => controller.resume(),
        // Both join the worker, which may sit in a sensor wait
        OperatorCommand::Stop => tokio::task::block_in_place(|| controller.stop()),
        OperatorCommand::Reset => tokio::task::block_in_place(|| controller.reset()),
        OperatorCommand::Status => {
            print_status(controller);
            Ok(())
        }
        OperatorCommand::Help => {
            println!("{}", OperatorCommand::HELP);
            Ok(())
        }
        OperatorCommand::Quit => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("=== RC Avoidance Console v{} ===", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load(args.config.as_deref())?;
    if args.verbose {
        settings.controller.verbose = true;
    }
    let scene = match args.scene {
        Some(scene) => scene,
        None => settings.sensor.scene.parse::<SyntheticScene>()?,
    };
    let sensor_config = settings.sensor.sensor_config();
    info!(
        "Camera {} {}x{} @ {} fps playing {:?}",
        sensor_config.device, sensor_config.width, sensor_config.height, sensor_config.fps, scene
    );

    let hardware = Arc::new(SimulatedHardware::from_scene(scene, &sensor_config));
    let mut controller = Controller::new(settings.controller.clone(), hardware)?;

    let mut faults = controller.subscribe_faults();
    tokio::spawn(async move {
        while faults.changed().await.is_ok() {
            let fault = faults.borrow_and_update().clone();
            if let Some(fault) = fault {
                warn!("Control loop faulted: {} (stop or reset to recover)", fault);
            }
        }
    });

    if args.autostart {
        controller.start()?;
    }
    println!("{}", OperatorCommand::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<OperatorCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if command == OperatorCommand::Quit {
            break;
        }
        if let Err(e) = execute(&mut controller, command) {
            error!("{} failed: {}", command, e);
        }
    }

    info!("Shutting down");
    tokio::task::block_in_place(|| controller.stop())?;
    Ok(())
}

//! Spinlink - Smart Trainer Telemetry
//!
//! Replays a capture of trainer notifications through the telemetry pipeline,
//! optionally executing a workout, and prints the ride summary.

use anyhow::Context;
use clap::Parser;
use spinlink::physics::SharedPhysics;
use spinlink::sensors::capture::read_capture;
use spinlink::sensors::pipeline::TelemetryPipeline;
use spinlink::sensors::session::TelemetrySession;
use spinlink::sensors::types::RawNotification;
use spinlink::storage::config::{load_config, load_config_from};
use spinlink::workouts::{library, WorkoutEngine, WorkoutEvent};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "spinlink",
    version,
    about = "Replay captured trainer notifications and summarize the ride"
)]
struct Args {
    /// Capture file, one `<cp|ibd> <hex payload>` notification per line
    capture: PathBuf,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device profile override ("standard" or "kickr")
    #[arg(long)]
    profile: Option<String>,

    /// Built-in workout name or path to a workout JSON file
    #[arg(long)]
    workout: Option<String>,

    /// Seconds between replayed notifications
    #[arg(long, default_value_t = 1.0)]
    spacing: f64,

    /// Road gradient in percent for the speed model
    #[arg(long)]
    gradient: Option<f32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("Starting Spinlink v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    if let Some(profile) = &args.profile {
        config.trainer.profile = profile.clone();
    }
    if let Some(gradient) = args.gradient {
        config.physics.gradient_percent = gradient;
    }
    config.validate().context("Invalid configuration")?;

    let profile = config.trainer.device_profile()?;
    let physics = SharedPhysics::new(config.physics);
    let pipeline = TelemetryPipeline::new(profile, config.trainer.wheel_circumference_m, physics);
    let mut session = TelemetrySession::with_capacity(
        pipeline,
        config.pipeline.sample_queue_capacity,
        config.pipeline.event_queue_capacity,
    );

    let frames = read_capture(&args.capture)
        .with_context(|| format!("Failed to read {}", args.capture.display()))?;
    if !args.spacing.is_finite() || args.spacing <= 0.0 {
        anyhow::bail!("--spacing must be positive");
    }
    let spacing = Duration::from_secs_f64(args.spacing);
    let base = Instant::now();

    let mut events = None;
    if let Some(name) = &args.workout {
        let workout = match library::builtin(name) {
            Ok(workout) => workout,
            Err(_) => library::load_workout(&PathBuf::from(name))
                .with_context(|| format!("Unknown workout '{}'", name))?,
        };
        let mut engine = WorkoutEngine::new();
        events = Some(engine.subscribe());
        engine.start_at(workout, base)?;
        session = session.with_workout(Arc::new(Mutex::new(engine)));
    }

    let (tx, rx) = mpsc::channel(config.pipeline.sample_queue_capacity.max(1));
    let handle = session.spawn(rx);

    for (i, frame) in frames.into_iter().enumerate() {
        let at = base + spacing.mul_f64(i as f64);
        tx.send(RawNotification::at(frame.format, frame.data, at))
            .await
            .context("Telemetry session ended early")?;
    }
    drop(tx);

    let summary = handle.join().await?;

    if let Some(events) = events {
        for event in events.try_iter() {
            print_event(&event);
        }
    }
    println!("{}", summary);

    Ok(())
}

fn print_event(event: &WorkoutEvent) {
    match event {
        WorkoutEvent::WorkoutStarted { workout_name, .. } => {
            println!("> Started '{}'", workout_name)
        }
        WorkoutEvent::IntervalStarted { index, interval } => {
            println!("> Interval {}: {}", index + 1, interval.label())
        }
        WorkoutEvent::RestStarted { rest_seconds, .. } => println!("> Rest {}s", rest_seconds),
        WorkoutEvent::CooldownStarted { cooldown_seconds } => {
            println!("> Cool-down {}s", cooldown_seconds)
        }
        WorkoutEvent::WorkoutCompleted { total_seconds, .. } => {
            println!("> Completed in {:.0}s", total_seconds)
        }
        WorkoutEvent::WorkoutStopped { phase, .. } => println!("> Stopped during {}", phase),
    }
}

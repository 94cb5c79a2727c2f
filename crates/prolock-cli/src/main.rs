//! ProLock door controller.
//!
//! Loads the site configuration, brings up the peripherals and runs the
//! session coordinator until Ctrl-C.

mod simulate;

use anyhow::Context;
use clap::Parser;
use prolock_coordinator::{
    AlarmSiren, CoordinatorConfig, DoorActuator, DoorReconciler, Notice, SessionCoordinator,
};
use prolock_core::Config;
use prolock_hardware::mock::{MockBiometric, MockOutput, MockRfid};
use prolock_hardware::{
    AnyBiometricSensor, AnyOutput, AnyProximityReader, BiometricPoller, HardwareError,
    PeripheralConfig, PeripheralManager, ProximityGate, ProximityPoller, RunFlag,
};
use prolock_network::{AttendanceClient, AttendanceClientConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "prolock", version, about = "Two-factor door access and attendance logging")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "prolock.toml")]
    config: PathBuf,

    /// Use mock devices driven from stdin instead of real hardware.
    #[arg(long)]
    simulate: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "runtime_start_failed");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args));
    // A pending stdin read cannot be cancelled
    runtime.shutdown_timeout(Duration::from_millis(500));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "prolock_failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), simulate = args.simulate, "prolock_starting");

    let config = Config::load_from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    if !args.simulate {
        // Only mock devices are built into this binary
        return Err(HardwareError::initialization_failed(
            "no hardware backend available; run with --simulate",
        )
        .into());
    }

    let running = RunFlag::new();

    let (sensor, finger) = MockBiometric::new();
    let (reader, card) = MockRfid::new();
    let (lock_output, _lock) = MockOutput::new("lock");
    let (buzzer_output, _buzzer) = MockOutput::new("buzzer");

    let (gate, observer) = ProximityGate::new();
    let mut manager = PeripheralManager::new(PeripheralConfig::from(&config));
    manager.register_biometric(
        BiometricPoller::new(AnyBiometricSensor::Mock(sensor), running.clone())
            .with_poll_interval(config.image_poll_interval())
            .with_max_polls(config.biometric.max_image_polls),
    );
    manager.register_proximity(
        ProximityPoller::new(AnyProximityReader::Mock(reader), observer, running.clone())
            .with_read_timeout(config.card_read_timeout()),
    );
    manager
        .verify_devices()
        .await
        .context("peripheral initialization failed")?;
    let mut peripherals = manager.start();

    let client = AttendanceClient::new(AttendanceClientConfig::from(&config))?;
    info!(base_url = client.base_url(), "attendance_service_configured");

    let coordinator_config = CoordinatorConfig::from(&config);

    let (siren, siren_handle) = AlarmSiren::new(
        AnyOutput::Mock(buzzer_output),
        coordinator_config.alarm_pulses,
        coordinator_config.alarm_pulse_interval,
    );
    tokio::spawn(siren.run());

    let (reconciler, remote) = DoorReconciler::new(client.clone(), running.clone());
    tokio::spawn(
        reconciler
            .with_interval(coordinator_config.reconcile_interval)
            .run(),
    );

    let door = DoorActuator::new(AnyOutput::Mock(lock_output), coordinator_config.lock_polarity);
    let coordinator =
        SessionCoordinator::new(client, door, siren_handle, gate, coordinator_config);
    tokio::spawn(print_notices(coordinator.subscribe()));

    let stop = running.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown_requested"),
            Err(e) => warn!(error = %e, "ctrl_c_handler_failed"),
        }
        stop.stop();
    });

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::spawn(simulate::drive(
        input,
        simulate::SimDevices { finger, card },
        running.clone(),
    ));

    coordinator.run(&mut peripherals, remote).await?;
    peripherals.shutdown().await;

    info!("prolock_stopped");
    Ok(())
}

async fn print_notices(mut notices: broadcast::Receiver<Notice>) {
    loop {
        match notices.recv().await {
            Ok(notice) => println!(">> {notice}"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "notices_skipped"),
            Err(RecvError::Closed) => break,
        }
    }
}

//! Runs the warehouse node logic on a host machine with simulated
//! peripherals, uploading to a real collection server or to a canned
//! loopback transport.

mod diag;
mod sim;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use warehouse_node::camera::{CameraManager, CameraTuning};
use warehouse_node::configuration::NodeConfig;
use warehouse_node::httpd::{shared_store, DiagnosticService};
use warehouse_node::platform::Clock;
use warehouse_node::scheduler::Scheduler;
use warehouse_node::sensors::TelemetrySource;
use warehouse_node::uplink::UplinkSender;
use warehouse_node::wifi::LinkManager;

use sim::{SimCamera, SimEntropy, SimIndicator, SimSensor, SimWifi, SystemClock, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Camera node: periodic JPEG upload, detection pulse on the indicator.
    Image,
    /// Sensor node: periodic telemetry upload plus the diagnostic routes.
    Telemetry,
}

#[derive(Debug, Parser)]
#[command(about = "Warehouse node simulator")]
struct Args {
    /// Which node variant to simulate.
    #[arg(long, value_enum, default_value = "image")]
    mode: Mode,

    /// Upload endpoint. Without it the simulator uses a loopback transport
    /// that accepts everything.
    #[arg(long)]
    endpoint: Option<String>,

    /// Stop after this many scheduler ticks (0 runs forever).
    #[arg(long, default_value = "0")]
    ticks: u64,

    /// Inject this many camera init failures before the first success.
    #[arg(long, default_value = "0")]
    camera_init_failures: u32,

    /// Simulated capture size in bytes; below the minimum image size this
    /// exercises the undersized-frame rejection.
    #[arg(long, default_value = "4000")]
    frame_size: usize,

    /// Simulate a network that never associates.
    #[arg(long)]
    no_network: bool,

    /// Listen address for the diagnostic routes in telemetry mode.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = NodeConfig::from_env().context("invalid environment configuration")?;
    let clock = SystemClock::new();

    let transport = match &args.endpoint {
        Some(_) => Transport::Real(reqwest::blocking::Client::new()),
        None => Transport::Loopback,
    };
    let upload_url = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.upload_url.clone());

    let mut link = LinkManager::new(
        SimWifi::new(2, args.no_network),
        config.wifi.clone(),
        config.wifi_poll_interval_ms,
        config.wifi_connect_window_ms,
    );

    let uplink = UplinkSender::new(
        transport,
        SimIndicator,
        SimEntropy,
        upload_url,
        config.min_image_size,
        config.http_timeout_ms,
        config.indicator_pulse_ms,
    );

    match args.mode {
        Mode::Image => {
            // The camera variant treats both boot failures as fatal; on the
            // device this would halt, here we exit with an error.
            if let Err(err) = link.establish(&clock) {
                bail!("{}", err);
            }

            let mut camera = CameraManager::new(
                SimCamera::new(args.camera_init_failures, args.frame_size),
                CameraTuning::default(),
                config.camera_init_retries,
                config.camera_settle_ms,
            );
            if let Err(err) = camera.establish(&clock) {
                bail!("{}", err);
            }

            let mut sched = Scheduler::new(
                &clock,
                link,
                camera,
                uplink,
                None,
                config.network_check_interval_ms,
                config.camera_check_interval_ms,
                config.acquire_interval_ms,
            );
            run(&clock, &mut sched, args.ticks);
        }
        Mode::Telemetry => {
            // The sensor variant boots even without a network; the check
            // timer keeps retrying in the background.
            if link.establish(&clock).is_err() {
                warn!("starting without network, reconnecting in the background");
            }

            let store = shared_store();
            let addr = diag::serve(&args.listen, DiagnosticService::new(store.clone()))
                .context("failed to bind the diagnostic listener")?;
            info!("diagnostic routes on http://{}", addr);

            let mut sched = Scheduler::new(
                &clock,
                link,
                TelemetrySource::new(SimSensor::new()),
                uplink,
                Some(store),
                config.network_check_interval_ms,
                config.camera_check_interval_ms,
                config.acquire_interval_ms,
            );
            run(&clock, &mut sched, args.ticks);
        }
    }

    Ok(())
}

fn run<W, S, T, I, E>(clock: &SystemClock, sched: &mut Scheduler<W, S, T, I, E>, ticks: u64)
where
    W: warehouse_node::platform::WifiDriver,
    S: warehouse_node::scheduler::AcquisitionSource,
    T: warehouse_node::platform::HttpTransport,
    I: warehouse_node::platform::Indicator,
    E: warehouse_node::platform::Entropy,
{
    info!("entering tick loop");
    let mut remaining = ticks;
    loop {
        sched.tick(clock);
        clock.delay_ms(100);
        if ticks != 0 {
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
    }
    info!("tick budget exhausted, exiting");
}

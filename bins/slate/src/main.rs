use anyhow::Context;
use basalt_bus::{BusError, BusReader};
use basalt_config::BusConfig;
use basalt_topics::{ReadResult, TopicReader};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/slate.toml".to_string());
    let config = BusConfig::load(&config_path).context("loading config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    // The producer may not be up yet; keep trying until the region exists.
    let mut bus = loop {
        match BusReader::attach(&config.region_path, config.buffer_capacity) {
            Ok(r) => break r,
            Err(BusError::NotFound { .. }) => {
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(e).context("attaching to region"),
        }
    };
    bus.set_max_retries(config.reader_max_retries);
    let mut reader = TopicReader::new(bus);

    reader.on("tick", |v| {
        debug!(value = %v, "tick");
        Ok(())
    });
    reader.on("engine", |v| {
        debug!(value = %v, "engine");
        Ok(())
    });

    info!(
        "SLATE: attached to {path}. Reading...",
        path = &config.region_path
    );

    let mut last = Instant::now();
    let mut snapshots: u64 = 0;
    let mut dispatched: u64 = 0;
    let mut last_seq: u64 = 0;

    loop {
        match reader.read() {
            ReadResult::Dispatched { topics, seq } => {
                snapshots += 1;
                dispatched += topics as u64;
                last_seq = seq;
            }
            ReadResult::NothingNew => std::thread::sleep(Duration::from_millis(1)),
            ReadResult::Corrupt { seq } => warn!(seq, "corrupt frame skipped"),
            ReadResult::DecodeError { seq } => {
                warn!(seq, "undecodable frame");
                std::thread::sleep(Duration::from_millis(100));
            }
            ReadResult::Detached => {
                warn!("region detached; waiting for a writer");
                std::thread::sleep(Duration::from_millis(200));
                let _ = reader.reattach();
            }
        }

        if last.elapsed() >= Duration::from_secs(1) {
            info!(snapshots, dispatched, last_seq, "read rate (last second)");
            snapshots = 0;
            dispatched = 0;
            last = Instant::now();
        }
    }
}

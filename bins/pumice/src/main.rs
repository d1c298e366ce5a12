use basalt_bus::BusWriter;
use basalt_config::BusConfig;
use basalt_topics::TopicWriter;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/pumice.toml".to_string());
    let config = BusConfig::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let mut bus = BusWriter::open_or_create(&config.region_path, config.buffer_capacity)?;
    bus.unlink_on_close(config.writer_unlink_on_close);
    let mut writer = TopicWriter::new(bus);

    info!(
        "PUMICE: publishing snapshots to {path} (cap={cap})",
        path = &config.region_path,
        cap = config.buffer_capacity
    );

    let mut tick: u64 = 0;
    loop {
        tick += 1;
        let clock_ms = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;

        // Synthetic telemetry stand-ins; a real producer stages whatever
        // state changed this tick.
        writer.add("tick", tick)?;
        writer.add("clock_ms", clock_ms)?;
        writer.add(
            "engine",
            serde_json::json!({ "rpm": 9_000 + (tick % 2_500), "gear": (tick % 8) + 1 }),
        )?;
        let seq = writer.write()?;

        if tick % 100 == 0 {
            info!(seq, tick, "published snapshot");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use albion_radar::capture::UdpCapture;
use albion_radar::config::{load_config, RadarConfig};
use albion_radar::info::MobsInfo;
use albion_radar::pipeline::Pipeline;
use albion_radar::world::World;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "albion_radar=info".into()),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "radar.toml".to_string());
    let config = match load_config(&config_path) {
        Ok(config) => {
            info!(path = %config_path, "loaded configuration");
            config
        }
        Err(error) => {
            warn!(path = %config_path, error = %error, "using default configuration");
            RadarConfig::default()
        }
    };

    let mobs_info = match &config.info.mobs_file {
        Some(path) => Arc::new(MobsInfo::load(path)?),
        None => Arc::new(MobsInfo::new()),
    };

    let world = Arc::new(World::new(mobs_info));
    let mut capture = UdpCapture::bind(&config.capture.bind).await?;
    let mut pipeline = Pipeline::new(
        Arc::clone(&world),
        Duration::from_secs(config.protocol.fragment_ttl_seconds),
    );
    let metrics = pipeline.metrics();

    // Consumer-side sweep: evict far records and tick subscribers
    {
        let world = Arc::clone(&world);
        let metrics = Arc::clone(&metrics);
        let interval = Duration::from_secs(config.eviction.interval_seconds.max(1));
        let max_distance = config.eviction.max_distance;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = world.evict_out_of_range(max_distance);
                if evicted > 0 {
                    info!(
                        evicted = evicted,
                        datagrams = metrics.snapshot().datagrams,
                        "eviction sweep"
                    );
                }
            }
        });
    }

    info!("radar ingestion started");
    loop {
        let datagram = capture.recv().await?;
        pipeline.process_datagram(&datagram.bytes);
    }
}

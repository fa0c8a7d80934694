use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use wxnow::bluetooth::scanner::scan_for_ruuvitag;
use wxnow::config::{Binding, ServiceConfig};
use wxnow::database::{connect_with_retry, PostgresArchive};
use wxnow::{emit, LocalZone, Observation};

/// Convert one observation and replace the output file.
///
/// The conversion queries the archive synchronously, so it runs on a
/// blocking worker. Failures are logged and never stop the service.
async fn publish(
    observation: Observation,
    archive: Arc<PostgresArchive>,
    zone: LocalZone,
    filename: PathBuf,
) {
    let result = tokio::task::spawn_blocking(move || {
        emit(&observation, archive.as_ref(), &zone, &filename)
    })
    .await;

    match result {
        Ok(Ok(status)) => info!("Wrote {} | {}", status.timestamp_line, status.data_line),
        Ok(Err(e)) => error!("Failed to produce wxnow.txt: {}", e),
        Err(e) => error!("Conversion task failed: {}", e),
    }
}

/// Sleep out whatever is left of the poll interval that began at `started`
async fn wait_for_next_poll(started: OffsetDateTime, poll_interval_secs: u64) {
    let elapsed = (OffsetDateTime::now_utc() - started).whole_seconds().max(0) as u64;
    let wait_time = poll_interval_secs.saturating_sub(elapsed);
    if wait_time > 0 {
        debug!("Waiting {} seconds until next poll", wait_time);
        sleep(Duration::from_secs(wait_time)).await;
    }
}

/// One status file per live reading of the outdoor RuuviTag
async fn loop_binding(config: &ServiceConfig, archive: Arc<PostgresArchive>, tag: &str) {
    loop {
        let started = OffsetDateTime::now_utc();

        match scan_for_ruuvitag(tag).await {
            Ok(Some(reading)) => {
                let timestamp = OffsetDateTime::now_utc().unix_timestamp();
                publish(
                    reading.into_observation(timestamp),
                    archive.clone(),
                    config.zone,
                    config.filename.clone(),
                )
                .await;
            }
            Ok(None) => warn!("No data from RuuviTag {} during this scan", tag),
            Err(e) => error!("Scan failed: {}", e),
        }

        wait_for_next_poll(started, config.poll_interval_secs).await;
    }
}

/// One status file per new archive record
async fn archive_binding(config: &ServiceConfig, archive: Arc<PostgresArchive>) {
    let mut last_emitted: Option<i64> = None;

    loop {
        let started = OffsetDateTime::now_utc();

        match archive.latest_record().await {
            Ok(Some(record)) => match Observation::from_record(&record) {
                Ok(observation) if observation.timestamp > last_emitted => {
                    last_emitted = observation.timestamp;
                    publish(
                        observation,
                        archive.clone(),
                        config.zone,
                        config.filename.clone(),
                    )
                    .await;
                }
                Ok(_) => debug!("No new archive record"),
                Err(e) => error!("Unusable archive record: {}", e),
            },
            Ok(None) => warn!("Archive table {} is empty", config.archive_table),
            Err(e) => error!("Failed to read latest archive record: {}", e),
        }

        wait_for_next_poll(started, config.poll_interval_secs).await;
    }
}

async fn main_loop(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting wxnow.txt service");
    info!("Binding is {:?}", config.binding);
    info!("Output goes to {}", config.filename.display());
    info!("Local time zone is {}", config.zone.name());

    let client = connect_with_retry(&config.database_url).await?;
    let archive = Arc::new(PostgresArchive::new(
        client,
        &config.archive_table,
        config.archive_units,
    ));

    match (config.binding, config.ruuvi_tag.clone()) {
        (Binding::Loop, Some(tag)) => loop_binding(&config, archive, &tag).await,
        (Binding::Loop, None) => return Err("Loop binding needs RUUVI_TAG".into()),
        (Binding::Archive, _) => archive_binding(&config, archive).await,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match ServiceConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}

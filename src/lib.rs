use {
    crate::{
        config::Settings,
        error::NotFound,
        sensors::Sensor,
        sink::{InfluxSink, MeasurementBatch, Sink},
    },
    anyhow::Result,
    chrono::Utc,
    log::{debug, info, warn},
    std::{env, time::Duration},
    tokio::time,
};

pub mod config;
pub mod error;
pub mod sensors;
pub mod sink;

pub async fn client() -> Result<()> {
    init_logging();
    color_backtrace::install();

    let settings = Settings::from_env()?;

    let found = sensors::probe(sensors::candidates(&settings));
    if let Ok(sensor) = &found {
        info!("Using {} for readings", sensor.describe());
    }

    run(
        found,
        || InfluxSink::new(settings.db_url(), &settings.db_name),
        &settings,
    )
    .await
}

fn init_logging() {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

/// Burns in the probed sensor, prepares the database and polls forever.
///
/// Returns `Ok` straight away if no sensor was found; the sink is never created.
pub async fn run<S, K, F>(
    found: Result<S, NotFound>,
    connect: F,
    settings: &Settings,
) -> Result<()>
where
    S: Sensor,
    K: Sink,
    F: FnOnce() -> K,
{
    let mut sensor = match found {
        Ok(sensor) => sensor,
        Err(e) => {
            warn!("{}, exiting", e);
            return Ok(());
        }
    };

    sensor.warm_up()?;

    let mut sink = connect();
    sink.ensure_target(&settings.db_name).await?;
    info!("Initialization complete");

    poll(
        &mut sensor,
        &mut sink,
        settings.interval,
        settings.device_id.as_deref(),
    )
    .await
}

/// Read, write, sleep. Only returns on error.
pub async fn poll<S, K>(
    sensor: &mut S,
    sink: &mut K,
    interval: Duration,
    device: Option<&str>,
) -> Result<()>
where
    S: Sensor,
    K: Sink,
{
    loop {
        cycle(sensor, sink, device).await?;
        time::delay_for(interval).await;
    }
}

pub async fn cycle<S, K>(sensor: &mut S, sink: &mut K, device: Option<&str>) -> Result<()>
where
    S: Sensor,
    K: Sink,
{
    let reading = sensor.measure()?;
    debug!("{:?}", reading);

    let mut batch = MeasurementBatch::new(reading, Utc::now());
    if let Some(id) = device {
        batch = batch.tagged("device", id);
    }

    sink.write(batch).await
}

use {
    crate::sensors::Reading,
    anyhow::{anyhow, Result},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    influxdb::{Client as DbClient, InfluxDbWriteable, ReadQuery, Timestamp, WriteQuery},
    log::info,
    std::collections::HashSet,
};

const MEASUREMENT: &str = "balena-sense";

/// One polling cycle's worth of fields, stamped when it was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementBatch {
    pub time: DateTime<Utc>,
    pub fields: Vec<(&'static str, f64)>,
    pub tags: Vec<(&'static str, String)>,
}

impl MeasurementBatch {
    pub fn new(reading: Reading, time: DateTime<Utc>) -> Self {
        let mut fields = vec![
            ("temperature", reading.temperature as f64),
            ("humidity", reading.humidity as f64),
            ("pressure", reading.pressure as f64),
        ];
        if let Some(gas) = reading.gas_resistance {
            fields.push(("gas_resistance", gas as f64));
        }

        Self {
            time,
            fields,
            tags: vec![],
        }
    }

    pub fn tagged(mut self, tag: &'static str, value: impl Into<String>) -> Self {
        self.tags.push((tag, value.into()));
        self
    }

    pub fn into_query(self) -> WriteQuery {
        let timestamp: Timestamp = self.time.into();
        let mut query = timestamp.into_query(MEASUREMENT);
        for (name, value) in self.fields {
            query = query.add_field(name, value);
        }
        for (name, value) in self.tags {
            query = query.add_tag(name, value);
        }
        query
    }
}

#[async_trait(?Send)]
pub trait Sink {
    /// Creates the database if it is missing. Safe to call repeatedly.
    async fn ensure_target(&mut self, name: &str) -> Result<()>;

    async fn write(&mut self, batch: MeasurementBatch) -> Result<()>;
}

pub struct InfluxSink {
    client: DbClient,
    ensured: HashSet<String>,
}

impl InfluxSink {
    pub fn new(url: String, database: &str) -> Self {
        info!("INFLUXDB connecting to {}", url);

        Self {
            client: DbClient::new(url, database),
            ensured: HashSet::new(),
        }
    }
}

#[async_trait(?Send)]
impl Sink for InfluxSink {
    async fn ensure_target(&mut self, name: &str) -> Result<()> {
        if self.ensured.contains(name) {
            return Ok(());
        }

        // CREATE DATABASE is a no-op on the server when it already exists.
        self.client
            .query(&ReadQuery::new(format!("CREATE DATABASE \"{}\"", name)))
            .await
            .or_else(|e| Err(anyhow!("Failed to create database {}: {}", name, e)))?;
        self.ensured.insert(name.to_string());

        Ok(())
    }

    async fn write(&mut self, batch: MeasurementBatch) -> Result<()> {
        self.client
            .query(&batch.into_query())
            .await
            .or_else(|e| Err(anyhow!("Failed to write to InfluxDB: {}", e)))?;

        Ok(())
    }
}

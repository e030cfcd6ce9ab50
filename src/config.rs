use {
    anyhow::{Context, Result},
    std::{env, str::FromStr, time::Duration},
};

const DEFAULT_I2C_DEV: &str = "/dev/i2c-1";
const DEFAULT_DB_ADDR: &str = "influxdb";
const DEFAULT_DB_PORT: u16 = 8086;
const DEFAULT_DB_NAME: &str = "balena-sense";
const DEFAULT_INTERVAL_SECS: u64 = 10;
const DEFAULT_BURN_IN_SECS: u64 = 300;

/// Deployment constants, overridable through the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub i2c_dev: String,
    pub db_address: String,
    pub db_port: u16,
    pub db_name: String,
    pub interval: Duration,
    pub burn_in: Duration,
    /// Added as the `device` tag when present.
    pub device_id: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            i2c_dev: lookup("I2C_DEV").unwrap_or_else(|| DEFAULT_I2C_DEV.to_string()),
            db_address: lookup("DB_ADDR").unwrap_or_else(|| DEFAULT_DB_ADDR.to_string()),
            db_port: parse(&lookup, "DB_PORT", DEFAULT_DB_PORT)?,
            db_name: lookup("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            interval: Duration::from_secs(parse(
                &lookup,
                "POLL_INTERVAL_SECS",
                DEFAULT_INTERVAL_SECS,
            )?),
            burn_in: Duration::from_secs(parse(&lookup, "BURN_IN_SECS", DEFAULT_BURN_IN_SECS)?),
            device_id: lookup("BALENA_DEVICE_UUID").filter(|id| !id.is_empty()),
        })
    }

    pub fn db_url(&self) -> String {
        format!("http://{}:{}", self.db_address, self.db_port)
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_deployment() {
        let s = settings(&[]).unwrap();

        assert_eq!(s.i2c_dev, "/dev/i2c-1");
        assert_eq!(s.db_url(), "http://influxdb:8086");
        assert_eq!(s.db_name, "balena-sense");
        assert_eq!(s.interval, Duration::from_secs(10));
        assert_eq!(s.burn_in, Duration::from_secs(300));
        assert_eq!(s.device_id, None);
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("DB_ADDR", "10.0.0.2"),
            ("DB_PORT", " 9999 "),
            ("POLL_INTERVAL_SECS", "30"),
            ("BURN_IN_SECS", "0"),
            ("BALENA_DEVICE_UUID", "abc123"),
        ])
        .unwrap();

        assert_eq!(s.db_url(), "http://10.0.0.2:9999");
        assert_eq!(s.interval, Duration::from_secs(30));
        assert_eq!(s.burn_in, Duration::from_secs(0));
        assert_eq!(s.device_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_device_id_is_ignored() {
        let s = settings(&[("BALENA_DEVICE_UUID", "")]).unwrap();
        assert_eq!(s.device_id, None);
    }

    #[test]
    fn invalid_number_names_variable() {
        let err = settings(&[("DB_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }
}

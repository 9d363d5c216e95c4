use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use counter_core::error::{CounterError, Result};
use counter_core::name;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub ingest: IngestSection,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub persistence: PersistenceSection,

    #[serde(default)]
    pub sampler: SamplerSection,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerSection::default(),
            ingest: IngestSection::default(),
            retention: RetentionSection::default(),
            persistence: PersistenceSection::default(),
            sampler: SamplerSection::default(),
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CounterError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.ingest.validate()?;
        self.retention.validate()?;
        self.persistence.validate()?;
        self.sampler.validate()?;

        Ok(())
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|_| CounterError::BadRequest("server.listen must be a valid socket address".into()))
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestSection {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self { queue_capacity: default_queue_capacity() }
    }
}

impl IngestSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1_000_000).contains(&self.queue_capacity) {
            return Err(CounterError::BadRequest(
                "ingest.queue_capacity must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }
}

fn default_queue_capacity() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionSection {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs < 60 {
            return Err(CounterError::BadRequest(
                "retention.window_secs must be at least 60".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CounterError::BadRequest(
                "retention.sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_window_secs() -> u64 {
    6 * 60 * 60
}
fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_persist_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            interval_secs: default_persist_interval_secs(),
        }
    }
}

impl PersistenceSection {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CounterError::BadRequest("persistence.data_dir must not be empty".into()));
        }
        if self.interval_secs == 0 {
            return Err(CounterError::BadRequest(
                "persistence.interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_data_dir() -> String {
    "data".into()
}
fn default_persist_interval_secs() -> u64 {
    30
}

/// Random test-data generator; off unless asked for.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_sampler_metric")]
    pub metric: String,

    #[serde(default = "default_sampler_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            enabled: false,
            metric: default_sampler_metric(),
            interval_ms: default_sampler_interval_ms(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !name::is_valid(&self.metric) {
            return Err(CounterError::BadRequest(format!(
                "sampler.metric is not a valid metric name: {}",
                self.metric
            )));
        }
        if self.interval_ms < 10 {
            return Err(CounterError::BadRequest(
                "sampler.interval_ms must be at least 10".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_sampler_metric() -> String {
    "test".into()
}
fn default_sampler_interval_ms() -> u64 {
    200
}

//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use counter_core::error::{CounterError, Result};

pub use schema::{
    CounterConfig, IngestSection, PersistenceSection, RetentionSection, SamplerSection,
    ServerSection,
};

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "COUNTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "counter.yaml";

pub fn load_from_file(path: &str) -> Result<CounterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CounterError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CounterConfig> {
    let cfg: CounterConfig = serde_yaml::from_str(s)
        .map_err(|e| CounterError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// `$COUNTER_CONFIG` if set (must exist), else `counter.yaml` if present,
/// else built-in defaults.
pub fn load() -> Result<CounterConfig> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_from_file(&path);
    }
    match fs::read_to_string(DEFAULT_CONFIG_PATH) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let cfg = CounterConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(CounterError::Internal(format!(
            "read config failed ({DEFAULT_CONFIG_PATH}): {e}"
        ))),
    }
}

/// Verbose diagnostics are on when `DEBUG` is set to anything non-empty.
pub fn debug_enabled() -> bool {
    std::env::var("DEBUG").map(|v| !v.is_empty()).unwrap_or(false)
}

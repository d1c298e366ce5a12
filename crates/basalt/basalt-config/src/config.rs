use serde::Deserialize;
use std::path::Path;

/// Settings shared by every process attached to one region.
///
/// Writer and readers must load the same `buffer_capacity` for a given
/// `region_path`; a mismatch surfaces as `SizeMismatch` on attach.
#[derive(Deserialize, Debug, Clone)]
pub struct BusConfig {
    pub region_path: String,
    #[serde(default = "defaults::buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default)]
    pub writer_unlink_on_close: bool,
    #[serde(default = "defaults::reader_max_retries")]
    pub reader_max_retries: u32,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn buffer_capacity() -> usize {
        512 * 1024
    }

    pub fn reader_max_retries() -> u32 {
        4
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl BusConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let bus_config: BusConfig = toml::from_str(&raw)?;
        Ok(bus_config)
    }
}

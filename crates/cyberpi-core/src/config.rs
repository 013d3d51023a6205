//! Daemon configuration
//!
//! Loaded from a JSON file, by default `~/.cyber_pi.config`:
//!
//! ```json
//! {
//!     "key_path": "~/tesla_private_key.pem",
//!     "vin": "7SAYGDEE1PA000000",
//!     "outputs": { "driver": 21, "passenger": 20, "lock": 16, "awake": 26 },
//!     "poll": { "interval_ms": 500 },
//!     "reconnect": { "type": "exponential", "initial_ms": 500, "max_ms": 30000 },
//!     "gpio": { "type": "auto" }
//! }
//! ```
//!
//! Every key is optional. `key_path` and `vin` default to empty strings,
//! which the session provider rejects.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffConfig;
use crate::error::ConfigError;
use crate::provider::VehicleIdentity;

/// Config file name in the user's home directory
pub const DEFAULT_CONFIG_FILE: &str = ".cyber_pi.config";

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CyberPiConfig {
    /// Path to the private key the session provider authenticates with
    #[serde(default)]
    pub key_path: String,
    /// Vehicle identification number
    #[serde(default)]
    pub vin: String,
    /// Indicator pin assignment
    #[serde(default)]
    pub outputs: OutputPins,
    /// Poll loop cadence
    #[serde(default)]
    pub poll: PollConfig,
    /// Delay between reconnect attempts
    #[serde(default)]
    pub reconnect: BackoffConfig,
    /// Output device selection
    #[serde(default)]
    pub gpio: GpioConfig,
    /// Vehicle session provider selection
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl CyberPiConfig {
    /// `~/.cyber_pi.config`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
        Ok(home.join(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a specific path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Identity handed to the session provider, with `~` expanded in the key path
    pub fn identity(&self) -> VehicleIdentity {
        VehicleIdentity {
            vin: self.vin.clone(),
            key_path: expand_home(&self.key_path),
        }
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Empty paths stay empty so the provider can reject them.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// GPIO pin numbers (BCM) for each indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPins {
    #[serde(default = "default_driver_pin")]
    pub driver: u32,
    #[serde(default = "default_passenger_pin")]
    pub passenger: u32,
    #[serde(default = "default_lock_pin")]
    pub lock: u32,
    #[serde(default = "default_awake_pin")]
    pub awake: u32,
}

fn default_driver_pin() -> u32 {
    21
}

fn default_passenger_pin() -> u32 {
    20
}

fn default_lock_pin() -> u32 {
    16
}

fn default_awake_pin() -> u32 {
    26
}

impl Default for OutputPins {
    fn default() -> Self {
        Self {
            driver: default_driver_pin(),
            passenger: default_passenger_pin(),
            lock: default_lock_pin(),
            awake: default_awake_pin(),
        }
    }
}

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between successful polls
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Dump the full vehicle state every N successful polls (0 disables)
    #[serde(default = "default_state_dump_every")]
    pub state_dump_every: u64,
}

fn default_interval_ms() -> u64 {
    500
}

fn default_state_dump_every() -> u64 {
    10
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            state_dump_every: default_state_dump_every(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Output device selection.
///
/// `chip_base` is the sysfs number of the chip's first line; it is added to
/// each configured pin. Recent Raspberry Pi kernels start the SoC chip at
/// 512. When unset it is read from the `gpiochip*` entries under
/// `base_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GpioConfig {
    /// sysfs if the base path exists, simulated otherwise
    Auto {
        #[serde(default = "default_sysfs_base")]
        base_path: String,
        #[serde(default)]
        chip_base: Option<u32>,
    },
    /// Linux sysfs GPIO
    Sysfs {
        #[serde(default = "default_sysfs_base")]
        base_path: String,
        #[serde(default)]
        chip_base: Option<u32>,
    },
    /// Log-only output device
    Simulated,
}

fn default_sysfs_base() -> String {
    "/sys/class/gpio".to_string()
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self::Auto {
            base_path: default_sysfs_base(),
            chip_base: None,
        }
    }
}

/// Vehicle session provider selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// In-process vehicle simulation
    Simulated {
        /// Fail every N-th poll (0 disables fault injection)
        #[serde(default)]
        fault_every: u64,
        /// Simulated round-trip latency per request
        #[serde(default = "default_latency_ms")]
        latency_ms: u64,
    },
}

fn default_latency_ms() -> u64 {
    50
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Simulated {
            fault_every: 0,
            latency_ms: default_latency_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_missing_keys_default_to_empty() {
        let config: CyberPiConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.key_path, "");
        assert_eq!(config.vin, "");
        assert_eq!(config.outputs, OutputPins::default());
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.reconnect, BackoffConfig::default());
        assert_eq!(config.gpio, GpioConfig::default());
        assert_eq!(config.provider, ProviderConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "key_path": "/etc/cyberpi/key.pem",
            "vin": "7SAYGDEE1PA000000",
            "outputs": { "driver": 5, "awake": 6 },
            "poll": { "interval_ms": 1000, "state_dump_every": 0 },
            "reconnect": { "type": "fixed", "delay_ms": 2000 },
            "gpio": { "type": "simulated" },
            "provider": { "type": "simulated", "fault_every": 7 },
            "unknown_key": true
        }"#;

        let config: CyberPiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.vin, "7SAYGDEE1PA000000");
        assert_eq!(
            config.outputs,
            OutputPins {
                driver: 5,
                passenger: 20,
                lock: 16,
                awake: 6,
            }
        );
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
        assert_eq!(config.poll.state_dump_every, 0);
        assert_eq!(config.reconnect, BackoffConfig::Fixed { delay_ms: 2000 });
        assert_eq!(config.gpio, GpioConfig::Simulated);
        assert_eq!(
            config.provider,
            ProviderConfig::Simulated {
                fault_every: 7,
                latency_ms: 50,
            }
        );
        assert_eq!(
            config.identity().key_path,
            PathBuf::from("/etc/cyberpi/key.pem")
        );
    }

    #[test]
    fn test_parse_sysfs_chip_base() {
        let config: CyberPiConfig = serde_json::from_str(
            r#"{"gpio": {"type": "sysfs", "chip_base": 512}, "outputs": {"driver": 533}}"#,
        )
        .unwrap();
        assert_eq!(
            config.gpio,
            GpioConfig::Sysfs {
                base_path: "/sys/class/gpio".to_string(),
                chip_base: Some(512),
            }
        );
        assert_eq!(config.outputs.driver, 533);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"vin": "5YJ3E1EA7KF000000"}}"#).unwrap();

        let config = CyberPiConfig::load(file.path()).unwrap();
        assert_eq!(config.vin, "5YJ3E1EA7KF000000");
        assert_eq!(config.key_path, "");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CyberPiConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = CyberPiConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(""), PathBuf::new());
        assert_eq!(expand_home("/abs/key.pem"), PathBuf::from("/abs/key.pem"));
        assert_eq!(expand_home("~user/key"), PathBuf::from("~user/key"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/keys/key.pem"), home.join("keys/key.pem"));
        }
    }
}

// src/config/config.rs
use crate::{miner::BinaryArguments, pools, utils::error::MinerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the driver
///
/// Says where the miner binary and its data live and which pool
/// to mine on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Miner binary and runtime settings
    pub miner: MinerSettings,

    /// Pool connection (explicit stratum or pool preset)
    pub connection: ConnectionConfig,
}

/// Settings for running the miner binary
#[derive(Debug, Serialize, Deserialize)]
pub struct MinerSettings {
    /// Path to the VerthashMiner executable
    pub binary: PathBuf,

    /// Directory for generated configs and `verthash.dat`
    /// (default: `./data`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Echo miner output and parse diagnostics at debug level
    #[serde(default)]
    pub debug: bool,

    /// Keep integrated (Intel) GPUs in the miner config
    #[serde(default)]
    pub allow_integrated: bool,

    /// Seconds between hashrate log lines (default: 60)
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

/// How the miner connects to its pool
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Explicit stratum credentials
    Stratum(StratumConfig),

    /// Known pool preset plus payout address
    Pool(PoolPresetConfig),
}

/// Explicit stratum connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratumConfig {
    /// Stratum URL (e.g., "stratum+tcp://pool.example.com:3333")
    pub url: String,
    /// Stratum username, usually the payout address
    pub username: String,
    /// Stratum password (often "x" if not required)
    #[serde(default = "default_password")]
    pub password: String,
}

/// Pool preset selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolPresetConfig {
    /// Preset name, e.g. "woolypooly"
    pub name: String,
    /// Payout address
    pub address: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_report_interval() -> u64 {
    60
}

fn default_password() -> String {
    "x".into()
}

impl Config {
    /// Loads and validates configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read, parsed or validated
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the miner cannot start without
    pub fn validate(&self) -> Result<(), MinerError> {
        if self.miner.binary.as_os_str().is_empty() {
            return Err(MinerError::ConfigError("miner.binary must be set".into()));
        }
        if self.miner.report_interval_secs == 0 {
            return Err(MinerError::ConfigError(
                "miner.report_interval_secs must be positive".into(),
            ));
        }

        match &self.connection {
            ConnectionConfig::Stratum(stratum) => {
                Url::parse(&stratum.url)?;
                if stratum.username.is_empty() {
                    return Err(MinerError::ConfigError(
                        "connection.stratum.username must be set".into(),
                    ));
                }
            }
            ConnectionConfig::Pool(preset) => {
                if preset.address.is_empty() {
                    return Err(MinerError::ConfigError(
                        "connection.pool.address must be set".into(),
                    ));
                }
                pools::pool_by_name(&preset.name, &preset.address)?;
            }
        }
        Ok(())
    }

    /// Resolves the connection into miner arguments
    pub fn binary_arguments(&self) -> Result<BinaryArguments, MinerError> {
        match &self.connection {
            ConnectionConfig::Stratum(stratum) => Ok(BinaryArguments {
                stratum_url: stratum.url.clone(),
                stratum_username: stratum.username.clone(),
                stratum_password: stratum.password.clone(),
                enable_integrated: self.miner.allow_integrated,
            }),
            ConnectionConfig::Pool(preset) => {
                let pool = pools::pool_by_name(&preset.name, &preset.address)?;
                log::info!("Mining on {} (fee {:.2}%)", pool.name(), pool.fee());
                Ok(pool.binary_arguments(self.miner.allow_integrated))
            }
        }
    }

    /// Interval between hashrate reports
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.miner.report_interval_secs)
    }

    /// Generates a configuration template string
    ///
    /// # Arguments
    /// * `pool` - Use a pool preset instead of explicit stratum settings
    ///
    /// # Returns
    /// String containing a commented TOML configuration template
    pub fn generate_template(pool: bool) -> String {
        let mut template = String::new();
        template.push_str("# Verthash miner driver configuration\n\n");
        template.push_str("[miner]\n");
        template.push_str("# Path to the VerthashMiner executable\n");
        template.push_str("binary = \"./VerthashMiner\"\n");
        template.push_str("# Directory for generated configs and verthash.dat\n");
        template.push_str("data_dir = \"./data\"\n");
        template.push_str("# Log every miner output line\n");
        template.push_str("debug = false\n");
        template.push_str("# Keep integrated (Intel) GPUs\n");
        template.push_str("allow_integrated = false\n");
        template.push_str("# Seconds between hashrate reports\n");
        template.push_str("report_interval_secs = 60\n\n");

        if pool {
            template.push_str("# Pool preset (supported: woolypooly)\n");
            template.push_str("[connection.pool]\n");
            template.push_str("name = \"woolypooly\"\n");
            template.push_str("address = \"your_vtc_address\"\n");
        } else {
            template.push_str("# Stratum connection\n");
            template.push_str("[connection.stratum]\n");
            template.push_str("url = \"stratum+tcp://pool.example.com:3333\"\n");
            template.push_str("username = \"your_vtc_address\"\n");
            template.push_str("password = \"x\"\n");
        }

        template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratum_template_loads() {
        let config: Config = toml::from_str(&Config::generate_template(false)).expect("parse");
        config.validate().expect("valid template");

        let args = config.binary_arguments().expect("arguments");
        assert_eq!(args.stratum_url, "stratum+tcp://pool.example.com:3333");
        assert_eq!(args.stratum_password, "x");
        assert!(!args.enable_integrated);
        assert_eq!(config.report_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_pool_template_loads() {
        let config: Config = toml::from_str(&Config::generate_template(true)).expect("parse");
        config.validate().expect("valid template");

        let args = config.binary_arguments().expect("arguments");
        assert_eq!(args.stratum_url, "stratum+tcp://pool.woolypooly.com:3102");
        assert_eq!(args.stratum_username, "your_vtc_address");
    }

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str(
            "[miner]\nbinary = \"vm\"\n[connection.stratum]\nurl = \"stratum+tcp://h:1\"\nusername = \"u\"\n",
        )
        .expect("parse");

        assert_eq!(config.miner.data_dir, PathBuf::from("data"));
        assert!(!config.miner.debug);
        assert_eq!(config.miner.report_interval_secs, 60);
        assert_eq!(config.binary_arguments().unwrap().stratum_password, "x");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config: Config = toml::from_str(
            "[miner]\nbinary = \"vm\"\n[connection.stratum]\nurl = \"not a url\"\nusername = \"u\"\n",
        )
        .expect("parse");
        assert!(matches!(config.validate(), Err(MinerError::UrlError(_))));
    }

    #[test]
    fn test_unknown_pool_rejected() {
        let config: Config = toml::from_str(
            "[miner]\nbinary = \"vm\"\n[connection.pool]\nname = \"nopool\"\naddress = \"V\"\n",
        )
        .expect("parse");
        assert!(matches!(config.validate(), Err(MinerError::InputError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/driver.toml");
        assert!(matches!(result, Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("driver.toml");
        std::fs::write(&path, Config::generate_template(false)).expect("write config");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.miner.binary, PathBuf::from("./VerthashMiner"));
    }
}

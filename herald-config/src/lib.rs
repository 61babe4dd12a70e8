//! # Herald Configuration System
//!
//! Hierarchical configuration for the event system: which destinations a
//! process publishes to and receives from, broker sizing, identity
//! overrides and telemetry.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files, then `HERALD_*` environment variables
//! - **Validation**: destination names and selectors are checked before use

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

mod broker;
mod destination;
mod error;
mod identity;
mod telemetry;
mod validation;

pub use broker::BrokerConfig;
pub use destination::{DestinationKind, ReceiverConfig, TransmitterConfig};
pub use error::ConfigError;
pub use identity::IdentityConfig;
pub use telemetry::TelemetryConfig;
pub use validation::{validate_destination, validate_selector};

const BASE_FILE: &str = "config/herald.yaml";
const ENV_PREFIX: &str = "HERALD_";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct HeraldConfig {
    #[serde(default)]
    #[validate(nested)]
    pub broker: BrokerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub transmitters: Vec<TransmitterConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub receivers: Vec<ReceiverConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub identity: IdentityConfig,

    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl HeraldConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/herald.yaml`, if present
    /// 3. `config/<HERALD_ENV>.yaml` (default `production`), if present
    /// 4. `HERALD_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        } else {
            info!("{BASE_FILE} not found, using default configuration");
        }

        let env = std::env::var("HERALD_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{env}.yaml");
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honouring `HERALD_*`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::finish(
            Figment::from(Serialized::defaults(HeraldConfig::default())).merge(Yaml::file(path)),
        )
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn default_config_validates() {
        let config = HeraldConfig::default();
        config.validate().expect("Default config should validate");
        assert_eq!(config.broker.capacity, 4096);
        assert_eq!(config.telemetry.log_filter, "info");
    }

    #[test]
    fn yaml_layers_and_environment_override() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/herald.yaml",
                r#"
broker:
  capacity: 64
transmitters:
  - destination: pipeline.status
  - destination: ctrl
    kind: queue
    turn_events_off: true
receivers:
  - destination: pipeline.status
    selector: "STATUS = 'done'"
    timeout_ms: -1
"#,
            )?;
            jail.create_file("config/staging.yaml", "telemetry:\n  log_filter: debug\n")?;
            jail.set_env("HERALD_ENV", "staging");
            jail.set_env("HERALD_BROKER__CAPACITY", "128");

            let config = HeraldConfig::load().expect("config should load");
            assert_eq!(config.broker.capacity, 128);
            assert_eq!(config.telemetry.log_filter, "debug");
            assert_eq!(config.transmitters.len(), 2);
            assert_eq!(config.transmitters[1].kind, DestinationKind::Queue);
            assert!(config.transmitters[1].turn_events_off);
            assert_eq!(config.receivers[0].timeout_ms, -1);
            assert_eq!(config.receivers[0].kind, DestinationKind::Topic);
            Ok(())
        });
    }

    #[test]
    fn invalid_destination_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "herald.yaml",
                "transmitters:\n  - destination: \"bad name\"\n",
            )?;
            let err = HeraldConfig::load_from_path("herald.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("invalid_destination"));
            Ok(())
        });
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "herald.yaml",
                "receivers:\n  - destination: status\n    timeout_ms: -5\n",
            )?;
            assert!(matches!(
                HeraldConfig::load_from_path("herald.yaml"),
                Err(ConfigError::Validation(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn loads_an_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(
            &mut file,
            b"identity:\n  hostname: node9\n  ip: 10.0.0.9\ntelemetry:\n  metrics: false\n",
        )
        .expect("write config");

        let config = HeraldConfig::load_from_path(file.path()).expect("config should load");
        assert_eq!(config.identity.hostname.as_deref(), Some("node9"));
        assert_eq!(config.identity.ip, Some(std::net::Ipv4Addr::new(10, 0, 0, 9)));
        assert!(!config.telemetry.metrics);
        assert_eq!(config.broker, BrokerConfig::default());
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            HeraldConfig::load_from_path("does/not/exist.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}

//! Application configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::RecorderError;
use crate::normalize::MissingTimePolicy;
use crate::store::PersistenceMode;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub task: TaskConfig,
}

/// Which upstream representation to fetch.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Structured JSON feature query.
    #[default]
    Query,
    /// Public HTML page with the report table.
    Page,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub source: SourceKind,
    pub base_url: String,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_upstream_timeout")]
    pub timeout: Duration,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub table: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override, for local stores.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub mode: PersistenceMode,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_store_timeout")]
    pub timeout: Duration,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    #[serde(default)]
    pub missing_time: MissingTimePolicy,
    /// Interval between scheduled runs. When unset the task runs once.
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    #[serde(default)]
    pub interval: Option<Duration>,
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("SISMO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), RecorderError> {
        self.upstream.validate()?;
        self.store.validate()?;
        self.task.validate()?;
        Ok(())
    }
}

impl UpstreamConfig {
    fn validate(&self) -> Result<(), RecorderError> {
        if self.base_url.is_empty() {
            return Err(RecorderError::InvalidConfig {
                message: "Upstream base URL cannot be empty".to_string(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(RecorderError::InvalidConfig {
                message: format!("Upstream base URL must be http(s): {}", self.base_url),
            });
        }
        if self.timeout.is_zero() {
            return Err(RecorderError::InvalidConfig {
                message: "Upstream timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), RecorderError> {
        if self.table.is_empty() {
            return Err(RecorderError::InvalidConfig {
                message: "Store table name cannot be empty".to_string(),
            });
        }
        if self.region.is_empty() {
            return Err(RecorderError::InvalidConfig {
                message: "Store region cannot be empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(RecorderError::InvalidConfig {
                message: "Store timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl TaskConfig {
    fn validate(&self) -> Result<(), RecorderError> {
        if let Some(interval) = self.interval {
            if interval.is_zero() {
                return Err(RecorderError::InvalidConfig {
                    message: "Task interval must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("SISMO__UPSTREAM__SOURCE", "page");
        env::set_var(
            "SISMO__UPSTREAM__BASE_URL",
            "https://ultimosismo.igp.gob.pe/ultimosismo/sismos-reportados",
        );
        env::set_var("SISMO__UPSTREAM__TIMEOUT", "20");
        env::set_var("SISMO__STORE__TABLE", "TablaWebScrappingIGP");
        env::set_var("SISMO__STORE__MODE", "append");
        env::set_var("SISMO__TASK__MISSING_TIME", "fail");
        env::set_var("SISMO__TASK__INTERVAL", "300");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.upstream.source, SourceKind::Page);
        assert_eq!(
            config.upstream.base_url,
            "https://ultimosismo.igp.gob.pe/ultimosismo/sismos-reportados"
        );
        assert_eq!(config.upstream.timeout, Duration::from_secs(20));
        assert_eq!(config.store.table, "TablaWebScrappingIGP");
        assert_eq!(config.store.region, "us-east-1");
        assert_eq!(config.store.endpoint, None);
        assert_eq!(config.store.mode, PersistenceMode::Append);
        assert_eq!(config.task.missing_time, MissingTimePolicy::Fail);
        assert_eq!(config.task.interval, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_upstream_config_validate() {
        let config = UpstreamConfig {
            source: SourceKind::Query,
            base_url: "https://example.test/query".to_string(),
            timeout: Duration::from_secs(30),
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upstream_config_validate_rejects_bad_url() {
        let config = UpstreamConfig {
            source: SourceKind::Query,
            base_url: "ftp://example.test".to_string(),
            timeout: Duration::from_secs(30),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_validate_rejects_empty_table() {
        let config = StoreConfig {
            table: String::new(),
            region: default_region(),
            endpoint: None,
            mode: PersistenceMode::Replace,
            timeout: Duration::from_secs(10),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_task_config_validate_rejects_zero_interval() {
        let config = TaskConfig {
            missing_time: MissingTimePolicy::Skip,
            interval: Some(Duration::from_secs(0)),
        };

        assert!(config.validate().is_err());
    }
}

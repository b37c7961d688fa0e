/// Registry configuration loaded from an env file
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ENV_FILE: &str = "env/registry.env";
const DEFAULT_USERNAME: &str = "admin";

/// Target Harbor registry and credentials
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry host, e.g. "harbor.local" (HARBOR_REGISTRY)
    pub registry: String,

    /// Project images are mirrored into (HARBOR_PROJECT)
    pub project: String,

    /// Registry user (HARBOR_USERNAME, defaults to "admin")
    pub username: String,

    /// Registry password (HARBOR_PASSWORD)
    pub password: String,

    /// Skip TLS certificate verification for API calls (HARBOR_INSECURE_TLS)
    pub insecure_tls: bool,
}

impl RegistryConfig {
    /// Load configuration from a dotenv file.
    ///
    /// Variables already set in the process environment take precedence
    /// over the file. The process environment is not modified.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::EnvFileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let mut file_vars = HashMap::new();
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFileUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::EnvFileUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            file_vars.insert(key, value);
        }
        info!("Loaded environment variables from {}", path.display());

        let config = Self::from_lookup(|name| {
            std::env::var(name)
                .ok()
                .or_else(|| file_vars.get(name).cloned())
        })
        .with_context(|| format!("Invalid registry configuration in {}", path.display()))?;

        debug!(
            "Registry: {}, Project: {}",
            config.registry, config.project
        );
        Ok(config)
    }

    /// Build configuration from a variable lookup and validate it
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());

        let insecure_tls = match get("HARBOR_INSECURE_TLS") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                name: "HARBOR_INSECURE_TLS",
                value,
            })?,
            None => false,
        };

        let config = Self {
            registry: get("HARBOR_REGISTRY").unwrap_or_default(),
            project: get("HARBOR_PROJECT").unwrap_or_default(),
            username: get("HARBOR_USERNAME")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: lookup("HARBOR_PASSWORD").unwrap_or_default(),
            insecure_tls,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.is_empty() {
            return Err(ConfigError::MissingVar {
                name: "HARBOR_REGISTRY",
            });
        }
        if self.project.is_empty() {
            return Err(ConfigError::MissingVar {
                name: "HARBOR_PROJECT",
            });
        }
        if self.project.contains('/') {
            return Err(ConfigError::InvalidValue {
                name: "HARBOR_PROJECT",
                value: self.project.clone(),
            });
        }
        self.harbor_url()?;
        Ok(())
    }

    /// Registry host as used in image references and `docker login`
    pub fn registry_host(&self) -> &str {
        let host = self
            .registry
            .strip_prefix("https://")
            .or_else(|| self.registry.strip_prefix("http://"))
            .unwrap_or(&self.registry);
        host.trim_end_matches('/')
    }

    /// Base URL of the Harbor API
    pub fn harbor_url(&self) -> Result<Url, ConfigError> {
        let raw = if self.registry.contains("://") {
            self.registry.clone()
        } else {
            format!("https://{}", self.registry)
        };
        Url::parse(&raw).map_err(|_| ConfigError::InvalidValue {
            name: "HARBOR_REGISTRY",
            value: self.registry.clone(),
        })
    }

    /// Example configuration used in tests
    #[cfg(test)]
    pub fn example() -> Self {
        Self {
            registry: "harbor.local".to_string(),
            project: "mirror".to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: "secret".to_string(),
            insecure_tls: false,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_validation() {
        let mut config = RegistryConfig::example();
        assert!(config.validate().is_ok());

        config.registry = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVar {
                name: "HARBOR_REGISTRY"
            })
        ));

        let mut config = RegistryConfig::example();
        config.project = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingVar {
                name: "HARBOR_PROJECT"
            })
        ));
    }

    #[test]
    fn test_defaults_from_lookup() {
        let config = RegistryConfig::from_lookup(lookup_from(&[
            ("HARBOR_REGISTRY", "harbor.local"),
            ("HARBOR_PROJECT", "kubeflow"),
        ]))
        .unwrap();

        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "");
        assert!(!config.insecure_tls);
    }

    #[test]
    fn test_invalid_insecure_flag() {
        let result = RegistryConfig::from_lookup(lookup_from(&[
            ("HARBOR_REGISTRY", "harbor.local"),
            ("HARBOR_PROJECT", "kubeflow"),
            ("HARBOR_INSECURE_TLS", "maybe"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_harbor_url_and_host() {
        let mut config = RegistryConfig::example();
        assert_eq!(config.harbor_url().unwrap().as_str(), "https://harbor.local/");
        assert_eq!(config.registry_host(), "harbor.local");

        config.registry = "http://harbor.local:8080/".to_string();
        assert_eq!(
            config.harbor_url().unwrap().as_str(),
            "http://harbor.local:8080/"
        );
        assert_eq!(config.registry_host(), "harbor.local:8080");
    }

    #[test]
    fn test_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# harbor mirror").unwrap();
        writeln!(file, "HARBOR_REGISTRY=harbor.test.invalid").unwrap();
        writeln!(file, "HARBOR_PROJECT=mirror-test").unwrap();
        writeln!(file, "HARBOR_PASSWORD=\"p@ss word\"").unwrap();
        writeln!(file, "HARBOR_INSECURE_TLS=true").unwrap();
        drop(file);

        let config = RegistryConfig::from_env_file(&path).unwrap();
        assert_eq!(config.registry, "harbor.test.invalid");
        assert_eq!(config.project, "mirror-test");
        assert_eq!(config.password, "p@ss word");
        assert!(config.insecure_tls);
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::from_env_file(dir.path().join("nope.env")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::EnvFileNotFound { .. })
        ));
    }
}

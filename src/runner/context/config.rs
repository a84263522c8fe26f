//! Process-wide runtime configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming the properties file read at startup.
pub const CONFIG_ENV_VAR: &str = "JUST_RUNTIME_CONFIG";

pub const REQUIRE_SECURITY_DOMAIN_KEY: &str = "security.requireSecurityDomain";

lazy_static! {
    static ref GLOBAL_CONFIG: RuntimeConfig = RuntimeConfig::from_env();
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings shared by every context in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Whether compiling or executing without a resolvable security domain is an error.
    pub require_security_domain: bool,
}

impl RuntimeConfig {
    /// Read once on first use, from the file named by `JUST_RUNTIME_CONFIG`.
    pub fn global() -> &'static RuntimeConfig {
        &GLOBAL_CONFIG
    }

    pub fn from_env() -> Self {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => match Self::load(Path::new(&path)) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "using default runtime configuration");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content);
        debug!(path = %path.display(), ?config, "loaded runtime configuration");
        Ok(config)
    }

    /// Parse properties-file text (`key=value`, `key: value` or `key value`; `#`/`!`
    /// comments). Only the exact value `true` enables a flag.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let split = line
                .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
                .unwrap_or(line.len());
            let key = line[..split].trim();
            let rest = line[split..].trim_start();
            let value = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest)
                .trim();
            if key == REQUIRE_SECURITY_DOMAIN_KEY {
                config.require_security_domain = value == "true";
            }
        }
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            require_security_domain: true,
        }
    }
}

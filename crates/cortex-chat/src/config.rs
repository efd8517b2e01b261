use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::errors::{to_env_var, ConfigError};

pub const WAREHOUSE: &str = "SALES_INTELLIGENCE_WH";
pub const AGENT_API_ENDPOINT: &str = "/api/v2/cortex/agent:run";
/// Upper bound for one agent call, body streaming included.
pub const API_TIMEOUT_MS: u64 = 50_000;
pub const AGENT_MODEL: &str = "llama3.1-70b";
pub const SEARCH_SERVICE: &str = "sales_intelligence.data.sales_conversation_search";
pub const SEMANTIC_MODEL: &str = "@sales_intelligence.data.models/sales_metrics_model.yaml";

const ENV_PREFIX: &str = "CORTEX";

#[derive(Debug, Default, Deserialize)]
struct RawSnowflakeSettings {
    host: Option<String>,
    account: Option<String>,
    user: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    snowflake: RawSnowflakeSettings,
}

/// Credentials for the Snowflake account hosting the agent.
#[derive(Clone)]
pub struct SnowflakeSettings {
    pub host: String,
    pub account: String,
    pub user: String,
    pub password: String,
    pub role: String,
}

impl std::fmt::Debug for SnowflakeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeSettings")
            .field("host", &self.host)
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl SnowflakeSettings {
    /// The https origin of the account. Hosts that already carry a scheme are kept as is.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub snowflake: SnowflakeSettings,
}

impl Settings {
    /// Load settings from the secrets file (explicit path, or the default location when it
    /// exists) layered with `CORTEX_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(
                    File::from(path.to_path_buf())
                        .format(FileFormat::Toml)
                        .required(true),
                );
            }
            None => {
                if let Some(default_path) = default_secrets_path() {
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let raw: RawSettings = config.try_deserialize()?;
        tracing::debug!("Loaded configuration for host {:?}", raw.snowflake.host);
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let RawSnowflakeSettings {
            host,
            account,
            user,
            password,
            role,
        } = raw.snowflake;

        let host = required("snowflake.host", host)?;
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                field: "snowflake.host".to_string(),
            });
        }

        Ok(Settings {
            snowflake: SnowflakeSettings {
                host,
                account: required("snowflake.account", account)?,
                user: required("snowflake.user", user)?,
                password: required("snowflake.password", password)?,
                role: required("snowflake.role", role)?,
            },
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingEnvVar {
        env_var: to_env_var(field),
    })
}

pub fn default_secrets_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("cortex-chat")
            .join("secrets.toml")
    })
}

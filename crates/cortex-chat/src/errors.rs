use reqwest::StatusCode;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Connection not established: {0}")]
    ConnectionFailure(String),

    #[error("No active connection. Check that you have correctly entered your Snowflake credentials")]
    NotConnected,

    #[error("Request failed: {status} - {body}")]
    RequestFailure { status: StatusCode, body: String },

    #[error("Response is not an SSE stream (content type: {content_type:?})")]
    ContentTypeMismatch { content_type: String, body: String },

    #[error("Error parsing event: {source}")]
    EventDecode {
        data: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error executing SQL: {0}")]
    SqlExecution(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: set {env_var} or add it to the secrets file")]
    MissingEnvVar { env_var: String },

    #[error("Configuration value {field} must not be empty")]
    EmptyValue { field: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a dotted config path such as `snowflake.host` to the environment
/// variable that supplies it.
pub fn to_env_var(field: &str) -> String {
    format!("CORTEX_{}", field.to_uppercase().replace('.', "__"))
}

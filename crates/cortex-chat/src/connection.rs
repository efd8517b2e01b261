use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{SnowflakeSettings, WAREHOUSE};
use crate::errors::{AgentError, AgentResult};

const LOGIN_ENDPOINT: &str = "/session/v1/login-request";
const QUERY_ENDPOINT: &str = "/queries/v1/query-request";
const CLIENT_APP_ID: &str = "cortex-chat";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    client_app_id: &'a str,
    client_app_version: &'a str,
    account_name: &'a str,
    login_name: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
    async_exec: bool,
    sequence_id: u64,
    query_submission_time: i64,
}

/// Envelope shared by the session and query endpoints
#[derive(Debug, Deserialize)]
struct SnowflakeResponse<T> {
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    rowtype: Vec<ColumnType>,
    #[serde(default)]
    rowset: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

/// Rows returned by an ad hoc query. Cells are kept as the strings Snowflake sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// An authenticated Snowflake session. Its token authorizes agent calls.
pub struct Connection {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Log in with the configured credentials.
    pub async fn open(settings: &SnowflakeSettings) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AgentError::ConnectionFailure(e.to_string()))?;
        let base_url = settings.base_url();

        let payload = LoginRequest {
            data: LoginData {
                client_app_id: CLIENT_APP_ID,
                client_app_version: env!("CARGO_PKG_VERSION"),
                account_name: &settings.account,
                login_name: &settings.user,
                password: &settings.password,
            },
        };

        let request_id = Uuid::new_v4().to_string();
        let response = client
            .post(format!("{}{}", base_url, LOGIN_ENDPOINT))
            .query(&[
                ("warehouse", WAREHOUSE),
                ("roleName", settings.role.as_str()),
                ("requestId", request_id.as_str()),
            ])
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::ConnectionFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Login to {} failed: {}", base_url, status);
            return Err(AgentError::ConnectionFailure(format!("{}: {}", status, body)));
        }

        let body: SnowflakeResponse<SessionData> = response
            .json()
            .await
            .map_err(|e| AgentError::ConnectionFailure(e.to_string()))?;

        if !body.success {
            let message = body.message.unwrap_or_else(|| "login rejected".to_string());
            tracing::error!("Login to {} rejected: {}", base_url, message);
            return Err(AgentError::ConnectionFailure(message));
        }

        let token = body
            .data
            .and_then(|data| data.token)
            .ok_or_else(|| AgentError::ConnectionFailure("No session token in login response".to_string()))?;

        tracing::info!("Snowflake connection established to {}", base_url);
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Wrap an existing session token.
    pub fn with_token<S: Into<String>, T: Into<String>>(base_url: S, token: T) -> AgentResult<Self> {
        let client = Client::builder().timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn auth_header(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    /// Run one SQL statement on this session and return its rows.
    pub async fn run_sql(&self, query: &str) -> AgentResult<QueryResult> {
        let sql = query.replace(';', "");
        let payload = QueryRequest {
            sql_text: &sql,
            async_exec: false,
            sequence_id: 1,
            query_submission_time: Utc::now().timestamp_millis(),
        };

        let request_id = Uuid::new_v4().to_string();
        let response = self
            .client
            .post(format!("{}{}", self.base_url, QUERY_ENDPOINT))
            .query(&[("requestId", request_id.as_str())])
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::SqlExecution(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::SqlExecution(format!("{}: {}", status, body)));
        }

        let body: SnowflakeResponse<QueryData> = response
            .json()
            .await
            .map_err(|e| AgentError::SqlExecution(e.to_string()))?;

        if !body.success {
            return Err(AgentError::SqlExecution(
                body.message.unwrap_or_else(|| "query failed".to_string()),
            ));
        }

        let data = body.data.unwrap_or(QueryData {
            rowtype: Vec::new(),
            rowset: Vec::new(),
        });
        tracing::debug!("Query returned {} rows", data.rowset.len());

        Ok(QueryResult {
            columns: data.rowtype.into_iter().map(|c| c.name).collect(),
            rows: data
                .rowset
                .into_iter()
                .map(|row| row.into_iter().map(cell_to_string).collect())
                .collect(),
        })
    }
}

fn cell_to_string(cell: Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

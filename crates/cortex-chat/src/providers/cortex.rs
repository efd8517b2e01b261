use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use super::base::{AgentService, FragmentStream};
use crate::config::{AGENT_API_ENDPOINT, API_TIMEOUT_MS};
use crate::connection::Connection;
use crate::errors::{AgentError, AgentResult};
use crate::models::event::StreamEvent;
use crate::models::fragment::Fragment;
use crate::models::request::AgentRequest;
use crate::sse::{self, SseEvent};

const EVENT_STREAM: &str = "text/event-stream";
const DONE_SENTINEL: &str = "[DONE]";

/// Client for the Cortex agent `run` endpoint
pub struct CortexAgentProvider {
    client: Client,
}

impl CortexAgentProvider {
    pub fn new() -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(API_TIMEOUT_MS))
            .build()?;

        Ok(Self { client })
    }

    async fn post(&self, connection: &Connection, request: &AgentRequest) -> AgentResult<Response> {
        let url = format!("{}{}", connection.base_url(), AGENT_API_ENDPOINT);
        tracing::info!("Requesting {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", connection.auth_header())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        tracing::debug!(
            "Response status {} headers {:?}",
            response.status(),
            response.headers()
        );

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                if status.as_u16() >= 400 {
                    tracing::error!("Agent request failed: {}", status);
                } else {
                    tracing::error!("Agent request returned unexpected status {}", status);
                }
                Err(AgentError::RequestFailure { status, body })
            }
        }
    }
}

#[async_trait]
impl AgentService for CortexAgentProvider {
    async fn stream_reply(
        &self,
        connection: &Connection,
        request: &AgentRequest,
    ) -> AgentResult<FragmentStream> {
        let response = self.post(connection, request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.contains(EVENT_STREAM) {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Response is not an SSE stream: {:?}", content_type);
            return Err(AgentError::ContentTypeMismatch { content_type, body });
        }

        let events = sse::event_stream(response.bytes_stream());
        Ok(Box::pin(fragments_from_events(events)))
    }
}

/// Decode every event into fragments. Events that fail to decode are logged and skipped;
/// a transport error ends the stream.
pub fn fragments_from_events<S, E>(events: S) -> impl Stream<Item = AgentResult<Fragment>>
where
    S: Stream<Item = Result<SseEvent, E>>,
    E: Into<AgentError>,
{
    async_stream::stream! {
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    for fragment in decode_event(&event) {
                        yield Ok(fragment);
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    break;
                }
            }
        }
    }
}

fn decode_event(event: &SseEvent) -> Vec<Fragment> {
    if event.data.trim() == DONE_SENTINEL {
        tracing::debug!("End of agent stream");
        return Vec::new();
    }
    if event.event.as_deref() == Some("error") {
        tracing::warn!("Agent reported an error event: {}", event.data);
        return Vec::new();
    }

    match StreamEvent::parse(&event.data) {
        Ok(parsed) => {
            tracing::debug!("Parsed event: {:?}", parsed);
            parsed.fragments()
        }
        Err(source) => {
            let err = AgentError::EventDecode {
                data: event.data.clone(),
                source,
            };
            tracing::warn!("{}, skipping event: {}", err, event.data);
            Vec::new()
        }
    }
}

use futures::StreamExt;

use crate::connection::{Connection, QueryResult};
use crate::errors::{AgentError, AgentResult};
use crate::models::fragment::Fragment;
use crate::models::message::ChatMessage;
use crate::models::request::AgentRequest;
use crate::models::transcript::Transcript;
use crate::providers::base::AgentService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Processing,
}

/// Conversation drives one chat session: it owns the transcript and the session's
/// connection, and runs each question through the agent.
pub struct Conversation {
    agent: Box<dyn AgentService>,
    connection: Option<Connection>,
    transcript: Transcript,
    state: TurnState,
    limit: u32,
}

impl Conversation {
    /// `connection` is `None` when the session could not log in; every turn then fails with
    /// [`AgentError::NotConnected`].
    pub fn new(agent: Box<dyn AgentService>, connection: Option<Connection>, limit: u32) -> Self {
        Self {
            agent,
            connection,
            transcript: Transcript::new(),
            state: TurnState::AwaitingInput,
            limit,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Ask one question. Each fragment is passed to `on_fragment` as it arrives; the
    /// concatenated answer is appended to the transcript and returned.
    ///
    /// On error the user message stays in the transcript but no answer is appended.
    pub async fn submit<F>(&mut self, query: &str, on_fragment: F) -> AgentResult<ChatMessage>
    where
        F: FnMut(&Fragment) + Send,
    {
        self.transcript.push(ChatMessage::user(query));
        self.state = TurnState::Processing;

        let result = self.collect_answer(query, on_fragment).await;
        self.state = TurnState::AwaitingInput;

        let answer = ChatMessage::assistant(result?);
        self.transcript.push(answer.clone());
        Ok(answer)
    }

    async fn collect_answer<F>(&self, query: &str, mut on_fragment: F) -> AgentResult<String>
    where
        F: FnMut(&Fragment) + Send,
    {
        let connection = self.connection.as_ref().ok_or(AgentError::NotConnected)?;
        let request = AgentRequest::new(query, self.limit);

        let mut stream = self.agent.stream_reply(connection, &request).await?;
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            answer.push_str(&fragment.to_string());
        }
        Ok(answer)
    }

    /// Clear the transcript. The connection is kept.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.state = TurnState::AwaitingInput;
    }

    /// Run an ad hoc SQL statement on the session's connection.
    pub async fn run_sql(&self, query: &str) -> AgentResult<QueryResult> {
        let connection = self.connection.as_ref().ok_or(AgentError::NotConnected)?;
        connection.run_sql(query).await.map_err(|e| {
            tracing::error!("{}", e);
            e
        })
    }
}

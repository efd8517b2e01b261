use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::connection::Connection;
use crate::errors::{AgentError, AgentResult};
use crate::models::fragment::Fragment;
use crate::models::request::AgentRequest;
use crate::providers::base::{AgentService, FragmentStream};

/// A scripted reply for one call to the mock
pub enum MockReply {
    Fragments(Vec<AgentResult<Fragment>>),
    Fail(AgentError),
}

/// A mock agent that returns pre-configured replies for testing
pub struct MockAgentService {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl MockAgentService {
    /// Create a new mock with a sequence of replies
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, shared so tests can inspect them after handing the mock off
    pub fn requests(&self) -> Arc<Mutex<Vec<AgentRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl AgentService for MockAgentService {
    async fn stream_reply(
        &self,
        _connection: &Connection,
        request: &AgentRequest,
    ) -> AgentResult<FragmentStream> {
        self.requests.lock().unwrap().push(request.clone());

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            // Return an empty answer if no more pre-configured replies
            return Ok(Box::pin(futures::stream::empty()));
        }
        match replies.remove(0) {
            MockReply::Fragments(fragments) => Ok(Box::pin(futures::stream::iter(fragments))),
            MockReply::Fail(err) => Err(err),
        }
    }
}

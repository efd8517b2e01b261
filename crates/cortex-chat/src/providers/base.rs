use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::connection::Connection;
use crate::errors::AgentResult;
use crate::models::fragment::Fragment;
use crate::models::request::AgentRequest;

/// Fragments of one answer, in arrival order. The stream is consumed once; it ends when
/// the response body ends, or after the first fatal error.
pub type FragmentStream = BoxStream<'static, AgentResult<Fragment>>;

/// Base trait for agent backends
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Send the request on behalf of the given session and start streaming the answer.
    ///
    /// Errors that make the whole response unusable (transport, status, content type) are
    /// returned before any fragment is produced.
    async fn stream_reply(
        &self,
        connection: &Connection,
        request: &AgentRequest,
    ) -> AgentResult<FragmentStream>;
}

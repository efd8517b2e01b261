//! These models represent the objects passed around by the assistant
//!
//! There are a few related formats we need to interact with:
//! - chat messages, kept in the transcript and rendered to the user
//! - the agent request, sent from the assistant to the Cortex agent API
//! - stream events, sent from the agent API back to the assistant
//!
//! Wire formats are decoded into these structs immediately, so the rest of the
//! crate never indexes into raw JSON.
pub mod event;
pub mod fragment;
pub mod message;
pub mod request;
pub mod transcript;

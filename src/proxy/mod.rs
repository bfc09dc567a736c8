//! Proxy module
//!
//! Handles request forwarding to the upstream chat-completion API.

pub mod headers;
pub mod logging;
pub mod openai;
pub mod provider;

pub use logging::RequestContext;
pub use openai::OpenAIProvider;
pub use provider::{ChatProvider, UpstreamReply};

//! These models represent the objects passed around by the orchestrator
//!
//! There are a few different related formats we need to interact with:
//! - chat history messages, sent from the browser interface to the server
//! - anthropic messages/tools, sent from the orchestrator to the LLM
//! - tool calls, sent from the orchestrator to the systems providing capabilities
//!
//! These overlap to varying degrees. We always immediately convert those data models
//! into the internal structs using to/from helpers, so the internal models are not an
//! exact match to any of these formats.
pub mod chat;
pub mod message;
pub mod role;
pub mod tool;

//! Backend — clients for the inference service and the document store.
//!
//! DESIGN
//! ======
//! Messaging goes through the [`ChatBackend`] trait so the chat service can
//! be tested without a live inference service. Streaming completions and
//! document calls are thin pass-throughs with concrete clients.

pub mod completions;
pub mod documents;
pub mod http;
pub mod types;

pub use types::{BackendError, ChatBackend, Role, WireMessage};

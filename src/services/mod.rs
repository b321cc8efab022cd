//! Domain services used by the HTTP routes and the route guard.
//!
//! ARCHITECTURE
//! ============
//! Service modules own chat state, session resolution and input validation
//! so route handlers can stay focused on protocol translation and cookies.

pub mod attachment;
pub mod chat;
pub mod credentials;
pub mod history;
pub mod session;

//! Per-user session state.
//!
//! This module provides in-memory session storage for the two things the
//! assistant remembers between requests: bounded conversation history and
//! the last-selected region. Sessions are identified by UUID, carried in a
//! signed cookie, and swept after idle expiry.
//!
//! # Architecture
//!
//! - [`Session`]: one user's conversation state
//! - [`SessionStore`]: thread-safe store for all active sessions
//! - [`CookieSigner`]: issues and verifies the signed session-id cookie
//!
//! # Example
//!
//! ```rust
//! use naru::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! session.record_exchange("Hello!", "Bhai kya scene hai?");
//!
//! assert_eq!(session.history().len(), 2);
//! ```

mod cookie;
mod store;

pub use cookie::{CookieSigner, SESSION_COOKIE};
pub use store::{MAX_HISTORY, Session, SessionStore};

//! Future-self chat backend and the browser-side state it pairs with.
//!
//! The server half (`auth`, `chat`, `app`) exposes the JSON API; the `client`
//! half models onboarding, the chat transcript cache and API calls on top of
//! an abstract key/value local storage.

pub mod app;
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod profile;
pub mod state;

//! Wire types for the viewerq protocols.
//!
//! This crate contains the shapes of data as they appear on the wire:
//!
//! * [`oauth`]: token endpoint request forms and responses
//! * [`irc`]: the IRCv3 line codec spoken by the chat service
//!
//! Types here are pure data plus parsing. Higher-level behavior (timeouts,
//! retries, persistence) lives in `viewerq-runtime`.

pub mod irc;
pub mod oauth;

pub use irc::*;
pub use oauth::*;

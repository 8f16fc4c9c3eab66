//! Capability interface for the unofficial Instagram direct-message client.
//!
//! The private-API client is an external, unmodifiable collaborator. This
//! crate defines the narrow surface the rest of igdm programs against
//! (login, settings persistence, thread/message listing, send) plus a
//! production implementation that reaches the client through a local
//! instagrapi-rest style bridge. Everything above this crate works against
//! the [`DirectClient`] trait, so tests substitute a double without touching
//! resolver or gateway logic.

pub mod api;
pub mod error;
pub mod rest;
pub mod types;

pub use {
    api::DirectClient,
    error::ClientError,
    rest::RestClient,
    types::{DirectMessage, DirectThread},
};

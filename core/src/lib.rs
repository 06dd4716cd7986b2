//! Client core for the BarterUp skill-exchange service.
//!
//! # Overview
//! `BarterClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. `ApiService` pairs it with a
//! `Transport` (blocking `ureq` by default) and logs every failure once.
//! On top of that sit the local state containers a front end needs: the
//! followed-contacts book, per-contact conversations, the post feed with
//! its seed fallback, and the avatar resolver chain.
//!
//! # Design
//! - Each endpoint is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit and the client is testable without a server.
//! - The bearer token comes from a `CredentialProvider`, never from a
//!   global. `StoredSession` reads it from a `KeyValueStore`.
//! - All failures normalize to `ApiError`; `error::user_message` turns one
//!   into display text.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod avatar;
pub mod client;
pub mod config;
pub mod contacts;
pub mod error;
pub mod feed;
pub mod flow;
pub mod http;
pub mod messages;
pub mod profile;
pub mod service;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use avatar::{AvatarContext, AvatarResolver};
pub use client::BarterClient;
pub use config::ClientConfig;
pub use contacts::{Contact, ContactBook, ContactUpdate, FollowOutcome};
pub use error::ApiError;
pub use feed::Feed;
pub use flow::{AuthFlow, FlowError, Route};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use messages::{Conversations, Message, Sender};
pub use profile::ProfileEditor;
pub use service::ApiService;
pub use session::{CredentialProvider, KeyValueStore, MemoryStore, Session, StaticToken, StoredSession};
pub use transport::{Transport, UreqTransport};
pub use types::{EnhancedPost, Envelope};

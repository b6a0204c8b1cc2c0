//! Synchronous client for the Simplenote note service.
//!
//! # Overview
//! `NoteClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Session` adds a
//! `Transport` on top and exposes login plus the five note operations as
//! plain blocking calls.
//!
//! # Design
//! - The identity (email and token) is fixed at login; there is no refresh.
//! - Every request carries `email` and `auth` as query parameters.
//! - Single notes and index pages are distinct types.
//! - Non-200 statuses, transport failures and undecodable bodies are all
//!   reported as `ApiError`; nothing is retried.

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::Token;
pub use client::{NoteClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::Session;
pub use transport::{Transport, UreqTransport};
pub use types::{
    IndexListing, IndexQuery, NewNote, Note, NotePayload, NoteSummary, NoteUpdate,
    DEFAULT_INDEX_LENGTH, MAX_INDEX_LENGTH, MIN_INDEX_LENGTH,
};

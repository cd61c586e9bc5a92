//! Streaming chat client
//!
//! Sends a typed message to a remote chat endpoint and renders the streamed
//! plain-text reply into a scrolling conversation transcript as it arrives.
//!
//! # Architecture
//!
//! - **Renderer**: drives one request/response exchange and owns the transcript
//! - **Transport**: "send a message, get back a byte stream", with an HTTP implementation
//! - **Transcript**: headless conversation view with typing indicator and auto-scroll
//! - **Terminal**: prints transcript changes for the command-line client
//!
//! # Modules
//!
//! - [`renderer`]: [`StreamingChatRenderer`] and its submission lifecycle
//! - [`decoder`]: UTF-8 decoding across chunk boundaries
//! - [`transcript`]: conversation entries and change notifications
//! - [`transport`]: [`ChatTransport`] trait and [`HttpTransport`]
//! - [`controls`]: input field, send button and Enter key
//! - [`config`]: layered application configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod controls;
pub mod decoder;
pub mod error;
pub mod renderer;
pub mod terminal;
pub mod transcript;
pub mod transport;

pub use error::{Error, Result, TransportError};
pub use renderer::{StreamingChatRenderer, SubmitOutcome};
pub use transcript::{ConversationEntry, EntryId, RenderOutcome, Sender, Transcript};
pub use transport::{ChatTransport, HttpTransport};

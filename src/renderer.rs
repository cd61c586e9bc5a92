//! Streaming chat renderer.
//!
//! [`StreamingChatRenderer`] drives one request/response exchange at a time:
//! it records the user's message, shows a typing indicator, sends the message
//! through a [`ChatTransport`], and renders the streamed reply into its
//! [`Transcript`] as chunks arrive.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Sending -> AwaitingFirstChunk -> Streaming -> Done
//!            \______________\_________________\______/ (error path)
//! ```
//!
//! The bot entry is created lazily from the first chunk that decodes to
//! non-empty text; later chunks append to it. Every transition is logged as a
//! `chat.phase` event and published to [`StreamingChatRenderer::watch_phase`]
//! receivers, so transports and observers can read it mid-exchange.
//!
//! # Example
//!
//! ```rust,no_run
//! use stream_chat::renderer::StreamingChatRenderer;
//! use stream_chat::transport::HttpTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("http://127.0.0.1:5000/chat".parse()?)?;
//! let mut renderer = StreamingChatRenderer::new(transport);
//!
//! renderer.submit_user_message("Hello!").await;
//! for entry in renderer.transcript().entries() {
//!     println!("{:?}: {}", entry.sender(), entry.text());
//! }
//! # Ok(())
//! # }
//! ```

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::controls::{Control, InputField, Key};
use crate::decoder::Utf8StreamDecoder;
use crate::error::TransportError;
use crate::transcript::{EntryId, RenderOutcome, Sender, Transcript};
use crate::transport::{ByteStream, ChatRequest, ChatTransport, TransportResponse};

/// Shown when a stream completes without delivering a single byte.
pub const EMPTY_RESPONSE_MESSAGE: &str = "The bot sent no response or the response was empty.";

/// Prefix of the entry rendered when no bot entry exists at failure time.
pub const CONNECTION_FAILURE_MESSAGE: &str =
    "Could not connect to the bot. Check your connection or the server.";

/// Default label of the typing indicator.
pub const DEFAULT_TYPING_LABEL: &str = "Bot is typing...";

/// Where the current (or last) submission stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Request sent, waiting for response headers.
    Sending,
    /// Headers received, no bot text rendered yet.
    AwaitingFirstChunk,
    /// Bot entry exists and is being appended to.
    Streaming,
    /// Submission settled.
    Done,
}

/// How a submission settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened.
    Skipped,
    /// Stream completed. `entry` is `None` when bytes arrived but none
    /// decoded to visible text.
    Streamed { entry: Option<EntryId> },
    /// Stream completed without any bytes; the fallback message was shown.
    Empty { entry: EntryId },
    /// Endpoint answered with a non-success status.
    HttpError { status: StatusCode, entry: EntryId },
    /// Send or read failed. `partial` is set when the error was appended to
    /// an already streaming bot entry.
    ConnectionError { entry: EntryId, partial: bool },
}

/// Per-submission stream state.
#[derive(Debug)]
struct StreamSession {
    pending_bot_entry: Option<EntryId>,
    received_any_bytes: bool,
    is_first_chunk: bool,
}

impl StreamSession {
    fn new() -> Self {
        Self {
            pending_bot_entry: None,
            received_any_bytes: false,
            is_first_chunk: true,
        }
    }
}

/// Renders streamed chat replies into a transcript.
#[derive(Debug)]
pub struct StreamingChatRenderer<T> {
    transport: T,
    transcript: Transcript,
    input: InputField,
    decoder: Utf8StreamDecoder,
    typing_label: String,
    phase: watch::Sender<Phase>,
}

impl<T: ChatTransport> StreamingChatRenderer<T> {
    /// Create a renderer with an empty transcript.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            transcript: Transcript::new(),
            input: InputField::new(),
            decoder: Utf8StreamDecoder::new(),
            typing_label: DEFAULT_TYPING_LABEL.to_string(),
            phase: watch::Sender::new(Phase::Idle),
        }
    }

    /// Use a custom typing indicator label.
    #[must_use]
    pub fn with_typing_label(mut self, label: impl Into<String>) -> Self {
        self.typing_label = label.into();
        self
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Mutable access, e.g. to subscribe observers or scroll.
    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    #[must_use]
    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver that sees every phase transition, including the ones that
    /// happen while a submission holds `&mut self`.
    #[must_use]
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    #[must_use]
    pub fn typing_label(&self) -> &str {
        &self.typing_label
    }

    /// React to a user control. Returns the outcome when it submitted.
    pub async fn handle_control(&mut self, control: Control) -> Option<SubmitOutcome> {
        match control {
            Control::SendClicked | Control::KeyPressed(Key::Enter) => {
                Some(self.submit_input().await)
            }
            Control::KeyPressed(key) => {
                self.input.apply(key);
                None
            }
        }
    }

    /// Submit the input field's current value.
    pub async fn submit_input(&mut self) -> SubmitOutcome {
        let text = self.input.value().to_owned();
        self.submit_user_message(&text).await
    }

    /// Send `text` and render the reply.
    ///
    /// Whitespace-only input is ignored without touching the transcript or
    /// the transport.
    pub async fn submit_user_message(&mut self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            debug!(name: "chat.submit.skipped", "Ignoring empty message");
            return SubmitOutcome::Skipped;
        }

        self.transcript.push(Sender::User, message);
        self.input.clear();
        self.transcript.show_typing_indicator(self.typing_label.clone());
        self.set_phase(Phase::Sending);

        info!(
            name: "chat.submit.started",
            chars = message.chars().count(),
            "Sending message"
        );

        let request = ChatRequest::new(message);
        let outcome = match self.transport.send(&request).await {
            Ok(response) => {
                self.transcript.remove_typing_indicator();
                self.handle_response(response).await
            }
            Err(err) => self.fail(None, &err),
        };

        self.set_phase(Phase::Done);
        outcome
    }

    /// Render a response whose headers have arrived.
    ///
    /// A non-success status is terminal: the error body (or the status's
    /// reason phrase if the body is empty or unreadable) becomes a single bot
    /// entry and the stream is not consumed further.
    pub async fn handle_response(&mut self, response: TransportResponse) -> SubmitOutcome {
        if response.is_success() {
            return self.consume_stream(response.body).await;
        }

        let status = response.status;
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    name: "chat.http.error_body_unreadable",
                    status = status.as_u16(),
                    error = %err,
                    "Could not read error body"
                );
                String::new()
            }
        };
        warn!(
            name: "chat.http.error",
            status = status.as_u16(),
            body = %body,
            "Chat endpoint returned an error status"
        );

        let detail = if body.is_empty() {
            status.canonical_reason().unwrap_or_default()
        } else {
            body.as_str()
        };
        let entry = self
            .transcript
            .push(Sender::Bot, format!("Error {}: {detail}", status.as_u16()));
        SubmitOutcome::HttpError { status, entry }
    }

    /// Decode and render a successful response body until it ends or fails.
    pub async fn consume_stream(&mut self, body: ByteStream) -> SubmitOutcome {
        self.set_phase(Phase::AwaitingFirstChunk);
        self.decoder = Utf8StreamDecoder::new();

        let mut session = StreamSession::new();
        match self.read_loop(body, &mut session).await {
            Ok(outcome) => outcome,
            Err(err) => self.fail(session.pending_bot_entry, &err),
        }
    }

    async fn read_loop(
        &mut self,
        mut body: ByteStream,
        session: &mut StreamSession,
    ) -> Result<SubmitOutcome, TransportError> {
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            session.received_any_bytes = true;

            let text = self.decoder.decode(&chunk);
            debug!(
                name: "stream.chunk.decoded",
                bytes = chunk.len(),
                chars = text.chars().count(),
                "Chunk received"
            );
            if !text.is_empty() {
                self.render_bot_text(session, &text);
            }
        }

        if !session.received_any_bytes && session.pending_bot_entry.is_none() {
            info!(name: "stream.empty", "Stream finished without data");
            let entry = self.transcript.push(Sender::Bot, EMPTY_RESPONSE_MESSAGE);
            return Ok(SubmitOutcome::Empty { entry });
        }

        // Bytes were received by now, so leftover bytes always get a bot entry.
        let residual = self.decoder.flush();
        if !residual.is_empty() {
            debug!(name: "stream.residual", chars = residual.chars().count(), "Flushed decoder");
            self.render_bot_text(session, &residual);
        }

        info!(
            name: "stream.completed",
            rendered = session.pending_bot_entry.is_some(),
            "Stream finished"
        );
        Ok(SubmitOutcome::Streamed {
            entry: session.pending_bot_entry,
        })
    }

    fn render_bot_text(&mut self, session: &mut StreamSession, text: &str) {
        let target = if session.is_first_chunk {
            None
        } else {
            session.pending_bot_entry
        };
        let outcome = self.transcript.append_or_create(target, Sender::Bot, text);
        if let RenderOutcome::Created(id) = outcome {
            session.pending_bot_entry = Some(id);
            session.is_first_chunk = false;
            self.set_phase(Phase::Streaming);
        }
    }

    fn set_phase(&self, phase: Phase) {
        let previous = self.phase.send_replace(phase);
        debug!(name: "chat.phase", from = ?previous, to = ?phase, "Phase changed");
    }

    /// Error path shared by send and read failures.
    fn fail(&mut self, pending: Option<EntryId>, err: &TransportError) -> SubmitOutcome {
        self.transcript.remove_typing_indicator();

        warn!(
            name: "chat.connection.error",
            error = %err,
            partial = pending.is_some(),
            "Chat exchange failed"
        );

        match pending {
            Some(entry) => {
                self.transcript.append_or_create(
                    Some(entry),
                    Sender::Bot,
                    &format!(" (Connection error: {err})"),
                );
                SubmitOutcome::ConnectionError {
                    entry,
                    partial: true,
                }
            }
            None => {
                let entry = self.transcript.push(
                    Sender::Bot,
                    format!("{CONNECTION_FAILURE_MESSAGE} Details: {err}"),
                );
                SubmitOutcome::ConnectionError {
                    entry,
                    partial: false,
                }
            }
        }
    }
}

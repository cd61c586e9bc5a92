//! Conversation transcript model.
//!
//! The [`Transcript`] is the headless stand-in for the conversation view: an
//! append-only list of [`ConversationEntry`] values, an optional transient
//! [`TypingIndicator`], and a scroll position that follows new content.
//!
//! Every mutation is reported to registered [`TranscriptObserver`]s as a
//! [`TranscriptEvent`], which is how front ends (such as the terminal view)
//! render incrementally.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Author of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the input field.
    User,
    /// The remote chat service.
    Bot,
}

/// Stable handle to an entry in a [`Transcript`].
///
/// Entries are never removed, so the handle stays valid for the lifetime of
/// the transcript that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(usize);

impl EntryId {
    /// Position of the entry in the transcript.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single message shown in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    id: EntryId,
    sender: Sender,
    text: String,
}

impl ConversationEntry {
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Text currently displayed for this entry.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn line_count(&self) -> usize {
        self.text.lines().count().max(1)
    }
}

/// Transient "bot is typing" pseudo-entry. Not part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingIndicator {
    label: String,
}

impl TypingIndicator {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Result of a render step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A new entry was added to the transcript.
    Created(EntryId),
    /// Text was appended to an existing entry.
    Appended,
}

/// Change notification emitted by a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TranscriptEvent {
    /// A new entry was created with its initial text.
    #[serde(rename = "entry.created")]
    EntryCreated {
        id: EntryId,
        sender: Sender,
        text: String,
    },

    /// Text was appended to an existing entry.
    #[serde(rename = "entry.appended")]
    TextAppended {
        id: EntryId,
        /// Only the newly appended fragment.
        text: String,
    },

    /// The typing indicator became visible.
    #[serde(rename = "typing.shown")]
    TypingShown { label: String },

    /// The typing indicator was removed.
    #[serde(rename = "typing.hidden")]
    TypingHidden,

    /// The view scrolled to a new offset.
    #[serde(rename = "view.scrolled")]
    Scrolled { offset: usize },
}

impl TranscriptEvent {
    /// Dotted event name, as used in serialized form.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntryCreated { .. } => "entry.created",
            Self::TextAppended { .. } => "entry.appended",
            Self::TypingShown { .. } => "typing.shown",
            Self::TypingHidden => "typing.hidden",
            Self::Scrolled { .. } => "view.scrolled",
        }
    }
}

/// Receives every change made to a [`Transcript`].
pub trait TranscriptObserver: Send {
    fn on_event(&mut self, event: &TranscriptEvent);
}

/// Shared observer, so the owner can keep a handle after subscribing.
///
/// A poisoned lock still delivers the event.
impl<O: TranscriptObserver> TranscriptObserver for Arc<Mutex<O>> {
    fn on_event(&mut self, event: &TranscriptEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_event(event);
    }
}

/// Scroll position of the transcript view, measured in display lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    /// Line at the top of the viewport.
    pub offset: usize,
    /// Total number of lines in the view.
    pub extent: usize,
}

/// Append-only conversation transcript with a transient typing indicator.
#[derive(Default)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
    typing: Option<TypingIndicator>,
    scroll_offset: usize,
    observers: Vec<Box<dyn TranscriptObserver>>,
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("entries", &self.entries)
            .field("typing", &self.typing)
            .field("scroll_offset", &self.scroll_offset)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for all subsequent changes.
    pub fn subscribe(&mut self, observer: impl TranscriptObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&ConversationEntry> {
        self.entries.get(id.0)
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written by the given sender.
    pub fn by_sender(&self, sender: Sender) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter().filter(move |e| e.sender == sender)
    }

    /// Add a new entry and scroll to it.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> EntryId {
        let id = EntryId(self.entries.len());
        let text = text.into();
        self.entries.push(ConversationEntry {
            id,
            sender,
            text: text.clone(),
        });
        self.emit(&TranscriptEvent::EntryCreated { id, sender, text });
        self.scroll_to_end();
        id
    }

    /// Append to `target` if it exists in this transcript, otherwise create a
    /// new entry from `text`.
    pub fn append_or_create(
        &mut self,
        target: Option<EntryId>,
        sender: Sender,
        text: &str,
    ) -> RenderOutcome {
        if let Some(entry) = target.and_then(|id| self.entries.get_mut(id.0)) {
            entry.text.push_str(text);
            let id = entry.id;
            self.emit(&TranscriptEvent::TextAppended {
                id,
                text: text.to_owned(),
            });
            self.scroll_to_end();
            RenderOutcome::Appended
        } else {
            RenderOutcome::Created(self.push(sender, text))
        }
    }

    /// Show the typing indicator. Returns `false` if it was already visible.
    pub fn show_typing_indicator(&mut self, label: impl Into<String>) -> bool {
        if self.typing.is_some() {
            return false;
        }
        let label = label.into();
        self.typing = Some(TypingIndicator {
            label: label.clone(),
        });
        self.emit(&TranscriptEvent::TypingShown { label });
        self.scroll_to_end();
        true
    }

    /// Remove the typing indicator if present. Returns whether it was shown.
    pub fn remove_typing_indicator(&mut self) -> bool {
        if self.typing.take().is_none() {
            return false;
        }
        self.emit(&TranscriptEvent::TypingHidden);
        // Clamps to the now shorter view.
        self.scroll_to(self.scroll_offset);
        true
    }

    #[must_use]
    pub fn typing_indicator(&self) -> Option<&TypingIndicator> {
        self.typing.as_ref()
    }

    #[must_use]
    pub fn has_typing_indicator(&self) -> bool {
        self.typing.is_some()
    }

    /// Total display lines: every entry plus the typing indicator.
    #[must_use]
    pub fn scroll_extent(&self) -> usize {
        let entries: usize = self.entries.iter().map(ConversationEntry::line_count).sum();
        entries + usize::from(self.typing.is_some())
    }

    #[must_use]
    pub fn scroll_state(&self) -> ScrollState {
        ScrollState {
            offset: self.scroll_offset,
            extent: self.scroll_extent(),
        }
    }

    /// Move the viewport, clamped to the scroll extent.
    pub fn scroll_to(&mut self, offset: usize) {
        let offset = offset.min(self.scroll_extent());
        if offset != self.scroll_offset {
            self.scroll_offset = offset;
            self.emit(&TranscriptEvent::Scrolled { offset });
        }
    }

    /// Scroll to the maximum extent.
    pub fn scroll_to_end(&mut self) {
        let extent = self.scroll_extent();
        self.scroll_to(extent);
    }

    fn emit(&mut self, event: &TranscriptEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<TranscriptEvent>>>);

    impl TranscriptObserver for Recorder {
        fn on_event(&mut self, event: &TranscriptEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_append_or_create() {
        let mut transcript = Transcript::new();

        let outcome = transcript.append_or_create(None, Sender::Bot, "Hel");
        let RenderOutcome::Created(id) = outcome else {
            panic!("expected a new entry, got {outcome:?}");
        };
        assert_eq!(
            transcript.append_or_create(Some(id), Sender::Bot, "lo"),
            RenderOutcome::Appended
        );

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.get(id).unwrap().text(), "Hello");
        assert_eq!(transcript.get(id).unwrap().sender(), Sender::Bot);
    }

    #[test]
    fn test_unknown_target_creates_entry() {
        let mut other = Transcript::new();
        other.push(Sender::User, "a");
        let foreign = other.push(Sender::User, "b");

        let mut transcript = Transcript::new();
        let outcome = transcript.append_or_create(Some(foreign), Sender::Bot, "x");
        assert!(matches!(outcome, RenderOutcome::Created(_)));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_typing_indicator_lifecycle() {
        let mut transcript = Transcript::new();
        assert!(!transcript.has_typing_indicator());

        assert!(transcript.show_typing_indicator("Bot is typing..."));
        assert!(!transcript.show_typing_indicator("again"));
        assert_eq!(
            transcript.typing_indicator().unwrap().label(),
            "Bot is typing..."
        );
        assert!(transcript.is_empty());
        assert_eq!(transcript.scroll_extent(), 1);

        assert!(transcript.remove_typing_indicator());
        assert!(!transcript.remove_typing_indicator());
        assert_eq!(transcript.scroll_state(), ScrollState::default());
    }

    #[test]
    fn test_hiding_typing_indicator_reports_scroll() {
        let recorder = Recorder::default();
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "hi");
        transcript.show_typing_indicator("...");
        assert_eq!(transcript.scroll_state().offset, 2);

        transcript.subscribe(recorder.clone());
        transcript.remove_typing_indicator();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                TranscriptEvent::TypingHidden,
                TranscriptEvent::Scrolled { offset: 1 },
            ]
        );
        assert_eq!(
            transcript.scroll_state(),
            ScrollState {
                offset: 1,
                extent: 1
            }
        );
    }

    #[test]
    fn test_shared_observer_survives_poisoned_lock() {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let poisoner = Arc::clone(&recorder);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("observer owner panicked");
        })
        .join();
        assert!(recorder.is_poisoned());

        let mut transcript = Transcript::new();
        transcript.subscribe(Arc::clone(&recorder));
        transcript.push(Sender::User, "hi");

        let events = recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .0
            .lock()
            .unwrap()
            .clone();
        assert_eq!(
            events.first().map(TranscriptEvent::name),
            Some("entry.created")
        );
    }

    #[test]
    fn test_auto_scroll_follows_content() {
        let mut transcript = Transcript::new();
        let id = transcript.push(Sender::Bot, "one");
        assert_eq!(transcript.scroll_state().offset, 1);

        transcript.scroll_to(0);
        assert_eq!(transcript.scroll_state().offset, 0);

        transcript.append_or_create(Some(id), Sender::Bot, "\ntwo\nthree");
        let state = transcript.scroll_state();
        assert_eq!(state.extent, 3);
        assert_eq!(state.offset, state.extent);

        transcript.scroll_to(100);
        assert_eq!(transcript.scroll_state().offset, 3);
    }

    #[test]
    fn test_observers_see_every_change() {
        let recorder = Recorder::default();
        let mut transcript = Transcript::new();
        transcript.subscribe(recorder.clone());

        transcript.show_typing_indicator("...");
        transcript.remove_typing_indicator();
        let id = transcript.push(Sender::User, "hi");
        transcript.append_or_create(Some(id), Sender::User, "!");

        let names: Vec<_> = recorder.0.lock().unwrap().iter().map(TranscriptEvent::name).collect();
        assert_eq!(
            names,
            vec![
                "typing.shown",
                "view.scrolled",
                "typing.hidden",
                "view.scrolled",
                "entry.created",
                "view.scrolled",
                "entry.appended",
            ]
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = TranscriptEvent::EntryCreated {
            id: EntryId(2),
            sender: Sender::Bot,
            text: "hi".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "entry.created",
                "data": { "id": 2, "sender": "bot", "text": "hi" }
            })
        );
    }
}

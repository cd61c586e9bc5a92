//! Terminal front end for the transcript.
//!
//! [`TerminalView`] prints transcript changes as they happen: new entries on
//! their own line with a sender label, appended text inline, and the typing
//! indicator on a line that is erased again when it is removed.

use std::io::{self, Write};

use tracing::warn;

use crate::config::UiConfig;
use crate::transcript::{Sender, TranscriptEvent, TranscriptObserver};

/// Carriage return plus ANSI "erase entire line".
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Writes transcript events to a terminal-like sink.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
    user_label: String,
    bot_label: String,
    /// Cursor is at the end of a partially written line.
    line_open: bool,
}

impl TerminalView<io::Stdout> {
    /// View writing to stdout with the configured labels.
    #[must_use]
    pub fn stdout(ui: &UiConfig) -> Self {
        Self::new(io::stdout(), ui.user_label.clone(), ui.bot_label.clone())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, user_label: impl Into<String>, bot_label: impl Into<String>) -> Self {
        Self {
            out,
            user_label: user_label.into(),
            bot_label: bot_label.into(),
            line_open: false,
        }
    }

    fn label(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => &self.user_label,
            Sender::Bot => &self.bot_label,
        }
    }

    fn close_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }

    fn render(&mut self, event: &TranscriptEvent) -> io::Result<()> {
        match event {
            TranscriptEvent::EntryCreated { sender, text, .. } => {
                self.close_line()?;
                let line = format!("{}: {text}", self.label(*sender));
                write!(self.out, "{line}")?;
                self.line_open = true;
            }
            TranscriptEvent::TextAppended { text, .. } => {
                write!(self.out, "{text}")?;
                self.line_open = true;
            }
            TranscriptEvent::TypingShown { label } => {
                self.close_line()?;
                write!(self.out, "{label}")?;
                self.line_open = true;
            }
            TranscriptEvent::TypingHidden => {
                write!(self.out, "{CLEAR_LINE}")?;
                self.line_open = false;
            }
            TranscriptEvent::Scrolled { .. } => return Ok(()),
        }
        self.out.flush()
    }

    /// Terminate the current line, if any.
    pub fn finish(&mut self) -> crate::Result<()> {
        self.close_line()?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> TranscriptObserver for TerminalView<W> {
    fn on_event(&mut self, event: &TranscriptEvent) {
        if let Err(e) = self.render(event) {
            warn!(name: "terminal.write.failed", error = %e, event = event.name(), "Failed to render event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_renders_streamed_conversation() {
        let buf = SharedBuffer::default();
        let mut transcript = Transcript::new();
        transcript.subscribe(TerminalView::new(buf.clone(), "You", "Bot"));

        transcript.push(Sender::User, "hi");
        transcript.show_typing_indicator("Bot is typing...");
        transcript.remove_typing_indicator();
        let id = transcript.push(Sender::Bot, "Hel");
        transcript.append_or_create(Some(id), Sender::Bot, "lo");

        assert_eq!(
            buf.contents(),
            format!("You: hi\nBot is typing...{CLEAR_LINE}Bot: Hello")
        );
    }

    #[test]
    fn test_finish_closes_open_line() {
        let buf = SharedBuffer::default();
        let mut view = TerminalView::new(buf.clone(), "me", "it");
        view.on_event(&TranscriptEvent::TypingShown {
            label: "...".to_string(),
        });
        view.finish().unwrap();
        view.finish().unwrap();
        assert_eq!(buf.contents(), "...\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_finish_reports_write_failure() {
        let mut view = TerminalView::new(BrokenPipe, "me", "it");
        let err = view.finish().unwrap_err();
        assert!(
            matches!(&err, crate::Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe),
            "unexpected error: {err:?}"
        );
    }
}

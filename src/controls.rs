//! Input field and user-facing controls.

/// Keys the input field reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Submits the current input.
    Enter,
    /// Inserts a character at the end of the input.
    Char(char),
    /// Deletes the last character.
    Backspace,
}

/// A user interaction with the chat widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The send button was clicked.
    SendClicked,
    /// A key was pressed while the input had focus.
    KeyPressed(Key),
}

impl Control {
    /// Whether this interaction submits the input.
    #[must_use]
    pub fn triggers_submit(self) -> bool {
        matches!(self, Self::SendClicked | Self::KeyPressed(Key::Enter))
    }
}

/// Single-line text input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    value: String,
}

impl InputField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, untrimmed.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Apply an editing key. `Enter` leaves the value untouched.
    pub fn apply(&mut self, key: Key) {
        match key {
            Key::Char(c) => self.value.push(c),
            Key::Backspace => {
                self.value.pop();
            }
            Key::Enter => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_triggers() {
        assert!(Control::SendClicked.triggers_submit());
        assert!(Control::KeyPressed(Key::Enter).triggers_submit());
        assert!(!Control::KeyPressed(Key::Char('a')).triggers_submit());
        assert!(!Control::KeyPressed(Key::Backspace).triggers_submit());
    }

    #[test]
    fn test_editing() {
        let mut input = InputField::new();
        for c in "héy".chars() {
            input.apply(Key::Char(c));
        }
        input.apply(Key::Backspace);
        assert_eq!(input.value(), "hé");

        input.apply(Key::Enter);
        assert_eq!(input.value(), "hé");

        input.clear();
        assert_eq!(input.value(), "");
        input.apply(Key::Backspace);
        assert_eq!(input.value(), "");
    }
}

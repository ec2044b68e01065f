//! Editable single-line input with full cursor movement.
//!
//! Provisioning inputs (URLs, paths) are long and error-prone to retype, so
//! the field supports positional editing, not just append/backspace.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Default)]
pub struct InputField {
    value: Vec<char>,
    cursor: usize,
}

impl InputField {
    pub fn value(&self) -> String {
        self.value.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Masked rendering for sensitive fields: same length, mask glyph only.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.len())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char(c) if !ctrl => {
                self.value.insert(self.cursor, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.value.remove(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                }
            }
            KeyCode::Left if ctrl => self.cursor = self.word_left(),
            KeyCode::Right if ctrl => self.cursor = self.word_right(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.value.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.len(),
            _ => {}
        }
    }

    fn word_left(&self) -> usize {
        let mut pos = self.cursor;
        while pos > 0 && self.value[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !self.value[pos - 1].is_whitespace() {
            pos -= 1;
        }
        pos
    }

    fn word_right(&self) -> usize {
        let len = self.value.len();
        let mut pos = self.cursor;
        while pos < len && !self.value[pos].is_whitespace() {
            pos += 1;
        }
        while pos < len && self.value[pos].is_whitespace() {
            pos += 1;
        }
        pos
    }
}

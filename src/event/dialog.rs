//! Typewriter dialog box

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub speaker: String,
    text: Vec<char>,
    shown: usize,
    chars_per_frame: usize,
}

impl Dialog {
    pub fn new(speaker: impl Into<String>, text: &str, chars_per_frame: usize) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.chars().collect(),
            shown: 0,
            chars_per_frame: chars_per_frame.max(1),
        }
    }

    /// Reveal the next characters
    pub fn update(&mut self) {
        self.shown = (self.shown + self.chars_per_frame).min(self.text.len());
    }

    pub fn is_complete(&self) -> bool {
        self.shown >= self.text.len()
    }

    pub fn visible_text(&self) -> String {
        self.text[..self.shown].iter().collect()
    }

    /// Confirm pressed: finish the line, or close a finished one.
    /// Returns true when the dialog should close.
    pub fn confirm(&mut self) -> bool {
        if self.is_complete() {
            true
        } else {
            self.shown = self.text.len();
            false
        }
    }
}

//! Type-the-phrase challenge.
//!
//! Pass/fail uses [`normalize::matches`]. The per-character feedback shown
//! while typing is prefix based: everything up to the first mismatch is
//! correct, the mismatch itself is incorrect, the rest is pending.

use serde::{Deserialize, Serialize};

use super::normalize::{self, normalize_char};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharFeedback {
    Correct,
    Incorrect,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseChallenge {
    target: String,
    typed: String,
}

impl PhraseChallenge {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            typed: String::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Replace the current input with the full text field contents.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.typed = text.into();
    }

    pub fn is_satisfied(&self) -> bool {
        normalize::matches(&self.typed, &self.target)
    }

    /// Per-position feedback, one entry per position of the longer of the
    /// target and the input.
    pub fn feedback(&self) -> Vec<CharFeedback> {
        feedback(&self.typed, &self.target)
    }
}

/// Prefix-based character feedback for `typed` against `target`.
pub fn feedback(typed: &str, target: &str) -> Vec<CharFeedback> {
    let typed: Vec<char> = typed.chars().collect();
    let target: Vec<char> = target.chars().collect();
    let len = typed.len().max(target.len());

    let first_mismatch = (0..typed.len()).find(|&i| match target.get(i) {
        Some(&t) => normalize_char(typed[i]) != normalize_char(t),
        None => true,
    });

    (0..len)
        .map(|i| match first_mismatch {
            Some(m) if i < m => CharFeedback::Correct,
            Some(m) if i == m => CharFeedback::Incorrect,
            Some(_) => CharFeedback::Pending,
            None if i < typed.len() => CharFeedback::Correct,
            None => CharFeedback::Pending,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use CharFeedback::*;

    #[test]
    fn exact_phrase_passes_case_insensitively() {
        let mut c = PhraseChallenge::new("I am choosing distraction");
        assert!(!c.is_satisfied());
        c.set_input("i AM choosing Distraction");
        assert!(c.is_satisfied());
    }

    #[test]
    fn partial_phrase_does_not_pass() {
        let mut c = PhraseChallenge::new("I am choosing distraction");
        c.set_input("I am choosing");
        assert!(!c.is_satisfied());
    }

    #[test]
    fn feedback_marks_prefix_then_first_error() {
        assert_eq!(
            feedback("abx", "abcd"),
            vec![Correct, Correct, Incorrect, Pending]
        );
    }

    #[test]
    fn feedback_after_mismatch_is_pending_even_if_matching() {
        assert_eq!(
            feedback("axcd", "abcd"),
            vec![Correct, Incorrect, Pending, Pending]
        );
    }

    #[test]
    fn feedback_for_overlong_input() {
        assert_eq!(
            feedback("abcdef", "abcd"),
            vec![Correct, Correct, Correct, Correct, Incorrect, Pending]
        );
    }

    #[test]
    fn feedback_untyped_tail_is_pending() {
        assert_eq!(feedback("", "ab"), vec![Pending, Pending]);
        assert_eq!(feedback("I\u{2019}", "i'm"), vec![Correct, Correct, Pending]);
    }
}

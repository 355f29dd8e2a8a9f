//! Quit-flow challenges.
//!
//! Each validator exposes an "is satisfied" signal that gates the continue
//! action. None of them advances the flow on its own; the user confirms.

mod hold;
mod math;
pub mod normalize;
mod pattern;
mod phrase;

pub use hold::{HoldChallenge, DEFAULT_HOLD_SECS};
pub use math::{MathChallenge, Operator};
pub use pattern::{PatternChallenge, TapResult, GRID_CELLS};
pub use phrase::{feedback, CharFeedback, PhraseChallenge};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::strict_mode::ChallengeType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Challenge {
    Phrase(PhraseChallenge),
    Math(MathChallenge),
    Pattern(PatternChallenge),
    Hold(HoldChallenge),
}

impl Challenge {
    /// Build a fresh challenge of the given type. `phrase` is only used by
    /// the phrase variant.
    pub fn generate<R: Rng + ?Sized>(kind: ChallengeType, phrase: &str, rng: &mut R) -> Self {
        match kind {
            ChallengeType::Phrase => Challenge::Phrase(PhraseChallenge::new(phrase)),
            ChallengeType::Math => Challenge::Math(MathChallenge::generate(rng)),
            ChallengeType::Pattern => Challenge::Pattern(PatternChallenge::generate(rng)),
            ChallengeType::HoldButton => Challenge::Hold(HoldChallenge::default()),
        }
    }

    pub fn kind(&self) -> ChallengeType {
        match self {
            Challenge::Phrase(_) => ChallengeType::Phrase,
            Challenge::Math(_) => ChallengeType::Math,
            Challenge::Pattern(_) => ChallengeType::Pattern,
            Challenge::Hold(_) => ChallengeType::HoldButton,
        }
    }

    /// Bring time-dependent validators up to date.
    pub fn poll(&mut self, now: DateTime<Utc>) {
        if let Challenge::Hold(h) = self {
            h.poll(now);
        }
    }

    pub fn is_satisfied(&self) -> bool {
        match self {
            Challenge::Phrase(c) => c.is_satisfied(),
            Challenge::Math(c) => c.is_satisfied(),
            Challenge::Pattern(c) => c.is_satisfied(),
            Challenge::Hold(c) => c.is_satisfied(),
        }
    }

    pub fn as_phrase(&self) -> Option<&PhraseChallenge> {
        match self {
            Challenge::Phrase(c) => Some(c),
            _ => None,
        }
    }
}

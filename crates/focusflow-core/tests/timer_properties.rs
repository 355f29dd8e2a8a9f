//! Property tests for the timer, challenges and normalization.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use focusflow_core::challenge::normalize::{matches, normalize};
use focusflow_core::challenge::{MathChallenge, Operator, PatternChallenge};
use focusflow_core::services::LoggingNotifier;
use focusflow_core::{ManualClock, SessionKind, TimerService, TimerState};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

fn timer() -> (Arc<ManualClock>, TimerService) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
    ));
    let timer = TimerService::new(clock.clone(), Arc::new(LoggingNotifier));
    (clock, timer)
}

proptest! {
    #[test]
    fn start_reports_full_duration(duration in 1u64..86_400) {
        let (_clock, mut t) = timer();
        t.start(duration, SessionKind::Work, false);
        let remaining = t.remaining_ms();
        prop_assert!(remaining <= duration * 1000);
        prop_assert!(remaining > duration * 1000 - 100);
    }

    #[test]
    fn pause_resume_preserves_remaining(
        duration in 2u64..10_000,
        run_pct in 0u64..100,
        pause_secs in 0i64..1_000_000,
    ) {
        let (clock, mut t) = timer();
        t.start(duration, SessionKind::Work, false);
        let run_secs = (duration * run_pct / 100).min(duration - 1);
        clock.advance_secs(run_secs as i64);
        t.pause();
        let at_pause = t.remaining_ms();

        clock.advance_secs(pause_secs);
        t.resume();
        prop_assert_eq!(t.state(), TimerState::Running);
        prop_assert_eq!(t.remaining_ms(), at_pause);
        prop_assert_eq!(t.paused_duration(), Duration::seconds(pause_secs));
    }

    #[test]
    fn pause_from_non_running_changes_nothing(duration in 1u64..10_000) {
        let (clock, mut t) = timer();
        let idle = t.record();
        prop_assert!(t.pause().is_none());
        prop_assert_eq!(t.record(), idle);

        t.start(duration, SessionKind::Rest, false);
        clock.advance_secs(duration as i64);
        t.tick();
        let done = t.record();
        prop_assert!(t.pause().is_none());
        prop_assert_eq!(t.record(), done);
    }

    #[test]
    fn subtraction_is_never_negative(a in 10u32..=99, b in 10u32..=99) {
        let c = MathChallenge::new(a, b, Operator::Subtract);
        let (lhs, rhs) = c.operands();
        prop_assert!(lhs >= rhs);
        prop_assert!(c.result() >= 0);
    }

    #[test]
    fn generated_subtractions_are_non_negative(seed in any::<u64>()) {
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);
        let c = MathChallenge::generate(&mut rng);
        if c.operator() == Operator::Subtract {
            let (lhs, rhs) = c.operands();
            prop_assert!(lhs >= rhs);
        }
    }

    #[test]
    fn generated_patterns_pass_when_tapped_in_order(seed in any::<u64>()) {
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);
        let mut c = PatternChallenge::generate(&mut rng);
        let seq = c.sequence().to_vec();
        for cell in seq {
            c.tap(cell);
        }
        prop_assert!(c.is_satisfied());
    }

    #[test]
    fn padding_and_case_do_not_matter(
        phrase in "[a-zA-Z' ]{1,40}",
        left in " {0,3}",
        right in "[ \t]{0,3}",
    ) {
        let typed = format!("{left}{}{right}", phrase.to_uppercase());
        prop_assert!(matches(&typed, &phrase));
        prop_assert_eq!(normalize(&typed), normalize(&phrase));
    }
}

#[test]
fn curly_apostrophe_phrase_matches_straight_target() {
    assert!(matches(
        "I\u{2019}m choosing distraction",
        "I'm choosing distraction"
    ));
    assert_eq!(normalize("\u{201C}Test\u{201D}"), normalize("\"Test\""));
}

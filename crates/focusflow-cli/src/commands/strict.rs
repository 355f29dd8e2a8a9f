use chrono::Utc;
use clap::Subcommand;
use focusflow_core::{ChallengeType, Config, DisableOutcome, EnableOutcome, Tone};
use serde_json::json;

use crate::app::print_json;

#[derive(Subcommand)]
pub enum StrictAction {
    /// Turn Strict Mode on
    Enable,
    /// Turn Strict Mode off (instant within 15 minutes of enabling, else in 24 hours)
    Disable,
    /// Cancel a scheduled disable
    CancelDisable,
    /// Show Strict Mode state as JSON
    Status,
    /// Set the tone: gentle, neutral, strict or custom
    Tone { tone: String },
    /// Set the quit challenge: phrase, math, pattern or holdButton
    Challenge { challenge: String },
    /// Set the phrase used with the custom tone
    Phrase { phrase: String },
}

pub fn run(action: StrictAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let now = Utc::now();
    config.strict_mode.settle(now);
    let settings = &mut config.strict_mode;

    match action {
        StrictAction::Enable => match settings.enable(now) {
            EnableOutcome::Enabled => println!("strict mode enabled"),
            EnableOutcome::AlreadyEnabled => println!("strict mode is already enabled"),
            EnableOutcome::DisableCancelled => {
                println!("strict mode stays enabled; scheduled disable cancelled")
            }
        },
        StrictAction::Disable => match settings.request_disable(now) {
            DisableOutcome::DisabledNow => println!("strict mode disabled"),
            DisableOutcome::Scheduled { at } => {
                println!("strict mode will turn off at {}", at.to_rfc3339())
            }
            DisableOutcome::AlreadyPending { at } => {
                println!("disable already scheduled for {}", at.to_rfc3339())
            }
            DisableOutcome::NotEnabled => println!("strict mode is not enabled"),
        },
        StrictAction::CancelDisable => {
            if settings.cancel_pending_disable(now) {
                println!("scheduled disable cancelled");
            } else {
                println!("no disable scheduled");
            }
        }
        StrictAction::Status => {
            print_json(&json!({
                "active": settings.is_active(now),
                "tone": settings.tone,
                "challenge_type": settings.challenge_type,
                "phrase": settings.challenge_phrase(),
                "grace_remaining_secs": settings.grace_remaining(now).map(|d| d.num_seconds()),
                "disable_at": settings.disable_at.filter(|_| settings.pending_disable),
            }))?;
        }
        StrictAction::Tone { tone } => {
            settings.tone = tone.parse::<Tone>()?;
            println!("tone set to {}", settings.tone.as_str());
        }
        StrictAction::Challenge { challenge } => {
            settings.challenge_type = challenge.parse::<ChallengeType>()?;
            println!("challenge set to {}", settings.challenge_type.as_str());
        }
        StrictAction::Phrase { phrase } => {
            if phrase.trim().is_empty() {
                return Err("phrase must not be empty".into());
            }
            settings.custom_phrase = Some(phrase.trim().to_string());
            settings.tone = Tone::Custom;
            println!("custom phrase set");
        }
    }

    config.save()?;
    Ok(())
}

//! Interactive early quit.
//!
//! Non-strict sessions end straight away. Strict sessions walk through the
//! delay countdown, the configured challenge and the streak warning on the
//! terminal. End of input backs out of the flow and leaves the session
//! running.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use focusflow_core::challenge::{feedback, Challenge, CharFeedback, TapResult, GRID_CELLS};
use focusflow_core::{Event, QuitStage};

use crate::app::{print_json, App};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct QuitArgs {
    /// Answer "yes" at the final warning instead of prompting
    #[arg(long)]
    pub yes: bool,
}

pub fn run(args: QuitArgs) -> CliResult<()> {
    let mut app = App::open()?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let events = app.controller.request_quit();
    if events.is_empty() {
        print_json(&app.controller.snapshot())?;
        return Err("no session in progress".into());
    }
    let mut outcome = events;

    if app.controller.quit_flow().is_some() {
        outcome = walk_flow(&mut app, &mut input, args.yes)?;
    }
    for event in &outcome {
        print_json(event)?;
    }
    app.save()
}

fn walk_flow(app: &mut App, input: &mut impl BufRead, yes: bool) -> CliResult<Vec<Event>> {
    loop {
        let Some(stage) = app.controller.quit_flow().map(|f| f.stage()) else {
            return Ok(Vec::new());
        };
        if stage != QuitStage::Delay {
            // The session may have run out while we waited on input.
            let ticked = app.controller.tick();
            if ticked
                .iter()
                .any(|e| matches!(e, Event::SessionCompleted { .. }))
            {
                return Ok(ticked);
            }
        }
        let step = match stage {
            QuitStage::Delay => countdown(app),
            QuitStage::Challenge => challenge(app, input)?,
            QuitStage::StreakWarning => warning(app, input, yes)?,
        };
        if step
            .iter()
            .any(|e| matches!(e, Event::SessionQuit { .. } | Event::QuitFlowAborted { .. }))
        {
            return Ok(step);
        }
    }
}

fn countdown(app: &mut App) -> Vec<Event> {
    let mut last_shown = None;
    loop {
        let events = app.controller.tick();
        if !events.is_empty() {
            eprintln!();
            return events;
        }
        let Some(flow) = app.controller.quit_flow() else {
            return Vec::new();
        };
        let left = flow.delay_remaining(Utc::now()).num_seconds() + 1;
        if last_shown != Some(left) {
            eprint!("\rTake a breath. You can quit in {left:>2}s (Ctrl-C to stay)");
            let _ = io::stderr().flush();
            last_shown = Some(left);
        }
        thread::sleep(Duration::from_millis(100));
    }
}

fn challenge(app: &mut App, input: &mut impl BufRead) -> CliResult<Vec<Event>> {
    let Some(flow) = app.controller.quit_flow_mut() else {
        return Ok(Vec::new());
    };
    let Some(challenge) = flow.challenge_mut() else {
        return Ok(Vec::new());
    };

    // `None` once input has run out.
    let passed: Option<bool> = match challenge {
        Challenge::Phrase(p) => {
            eprintln!("Type this phrase to continue:\n\n  {}\n", p.target());
            prompt(input, "> ")?.map(|line| {
                p.set_input(line.clone());
                if !p.is_satisfied() {
                    eprintln!("  {}", render_feedback(&line, p.target()));
                }
                p.is_satisfied()
            })
        }
        Challenge::Math(m) => {
            eprintln!("Solve to continue: {}", m.question());
            prompt(input, "= ")?.map(|line| {
                m.set_input(&line);
                m.is_satisfied()
            })
        }
        Challenge::Pattern(p) => {
            eprintln!("Tap the cells in this order:");
            for row in 0..3 {
                let cells: Vec<String> = (0..3)
                    .map(|col| match p.order_of(row * 3 + col) {
                        Some(n) => format!("[{n}]"),
                        None => "[ ]".to_string(),
                    })
                    .collect();
                eprintln!("  {}", cells.join(""));
            }
            eprintln!("Cells are numbered 1-{GRID_CELLS}, left to right, top to bottom.");
            prompt(input, "cells> ")?.map(|line| {
                for cell in line.split_whitespace().filter_map(|c| c.parse::<usize>().ok()) {
                    if p.tap(cell.wrapping_sub(1)) == TapResult::Reset {
                        eprintln!("Wrong cell, start again.");
                        break;
                    }
                }
                p.is_satisfied()
            })
        }
        Challenge::Hold(h) => {
            let secs = h.required().num_seconds();
            eprintln!("Press Enter to start holding, then Enter again after {secs} seconds.");
            match prompt(input, "")? {
                None => None,
                Some(_) => {
                    h.press(Utc::now());
                    eprintln!("Holding...");
                    prompt(input, "")?.map(|_| {
                        let done = h.release(Utc::now());
                        if !done {
                            eprintln!("Released too early.");
                        }
                        done
                    })
                }
            }
        }
    };

    match passed {
        Some(true) => Ok(app.controller.continue_quit()),
        None => Ok(app.controller.go_back()),
        Some(false) => match prompt(input, "Not quite. Try again? [Y/n] ")? {
            Some(answer) if !answer.trim().eq_ignore_ascii_case("n") => Ok(Vec::new()),
            _ => Ok(app.controller.go_back()),
        },
    }
}

fn warning(app: &mut App, input: &mut impl BufRead, yes: bool) -> CliResult<Vec<Event>> {
    if let Some(w) = app.controller.quit_flow().and_then(|f| f.streak_warning()) {
        eprintln!("\n{}\n{}\n", w.headline(), w.body());
    }
    if yes {
        return Ok(app.controller.confirm_quit());
    }
    match prompt(input, "Quit anyway? [y/N] ")? {
        Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
            Ok(app.controller.confirm_quit())
        }
        _ => Ok(app.controller.keep_going()),
    }
}

/// Read one line. `None` at end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> CliResult<Option<String>> {
    eprint!("{label}");
    io::stderr().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// `+` for a correct character, `x` for a wrong one.
fn render_feedback(typed: &str, target: &str) -> String {
    feedback(typed, target)
        .iter()
        .map(|f| match f {
            CharFeedback::Correct => '+',
            CharFeedback::Incorrect => 'x',
            CharFeedback::Pending => '.',
        })
        .collect()
}

//! Spinner shown while an install request runs

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::operations::install::{Stage, StageObserver};

const TICK_STRINGS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Progress display for one install request
pub struct ProgressDisplay {
    pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a spinner; hidden when stderr is not a terminal or `hidden` is set
    pub fn new(hidden: bool) -> Self {
        let pb = if hidden || !console::Term::stderr().is_term() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}...") {
            pb.set_style(style.tick_strings(TICK_STRINGS));
        }
        pb.set_message("Listing packages");
        pb.enable_steady_tick(Duration::from_millis(80));

        Self { pb }
    }

    /// Clear the spinner before the terminal message is printed
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl StageObserver for ProgressDisplay {
    fn on_stage(&self, stage: Stage) {
        let message = match stage {
            Stage::Idle => "Listing packages",
            Stage::Staged => "Instrumenting",
            Stage::Instrumented => "Resolving install locations",
            Stage::Resolved => "Building",
            Stage::Invoked | Stage::Succeeded | Stage::Failed => "Cleaning up",
            Stage::CleanedUp => return self.finish(),
        };
        self.pb.set_message(message);
    }
}

impl Drop for ProgressDisplay {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

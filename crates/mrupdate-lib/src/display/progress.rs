//! Progress display for update runs
//!
//! Wraps indicatif bars and adapts engine progress events into status lines
//! printed above the bar.

use super::styling::StyleManager;
use crate::engine::{OutcomeKind, ProgressEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

fn bar_style(styling: &StyleManager) -> ProgressStyle {
    let styled = if styling.is_unicode() {
        ProgressStyle::with_template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
            .map(|style| {
                style
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                    .progress_chars("█▉▊▋▌▍▎▏  ")
            })
    } else {
        ProgressStyle::with_template("{spinner} {msg} [{wide_bar}] {pos}/{len}").map(|style| {
            style
                .tick_strings(&["-", "\\", "|", "/"])
                .progress_chars("##-")
        })
    };

    styled.unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Individual progress tracker
pub struct ProgressTracker<'a> {
    bar: ProgressBar,
    styling: &'a StyleManager,
}

impl<'a> ProgressTracker<'a> {
    /// Bar with a known total; drawn only when `visible`
    pub fn bar(styling: &'a StyleManager, total: u64, visible: bool) -> Self {
        let bar = ProgressBar::new(total);
        if visible {
            bar.set_style(bar_style(styling));
            bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar, styling }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Print a line above the bar without tearing it
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    pub fn finish(&self, message: &str) {
        self.bar
            .finish_with_message(self.styling.format_success(message));
    }

    pub fn abandon(&self, message: &str) {
        self.bar
            .abandon_with_message(self.styling.format_error(message));
    }

    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Renders engine progress events for the terminal
pub struct CliProgress<'a> {
    styling: &'a StyleManager,
    tracker: std::sync::OnceLock<ProgressTracker<'a>>,
    visible: bool,
}

impl<'a> CliProgress<'a> {
    pub fn new(styling: &'a StyleManager, visible: bool) -> Self {
        Self {
            styling,
            tracker: std::sync::OnceLock::new(),
            visible,
        }
    }

    fn tracker(&self) -> Option<&ProgressTracker<'a>> {
        self.tracker.get()
    }

    /// Status line for a finished mod
    pub fn format_outcome(&self, name: &str, kind: OutcomeKind, detail: &str) -> String {
        let message = format!("{}: {}", name, detail);
        match kind {
            OutcomeKind::Updated => self.styling.format_success(&message),
            OutcomeKind::UpToDate => self.styling.format_info(&message),
            OutcomeKind::Missing | OutcomeKind::Unresolved => {
                self.styling.format_warning(&message)
            }
            OutcomeKind::Error => self.styling.format_error(&message),
        }
    }
}

impl ProgressSink for CliProgress<'_> {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { total } => {
                let _ = self
                    .tracker
                    .set(ProgressTracker::bar(self.styling, total as u64, self.visible));
            }
            ProgressEvent::ModStarted { name, .. } => {
                if let Some(tracker) = self.tracker() {
                    tracker.set_message(&format!("Checking {}", name));
                }
            }
            ProgressEvent::ModFinished {
                name, kind, detail, ..
            } => {
                let line = self.format_outcome(&name, kind, &detail);
                match self.tracker() {
                    Some(tracker) => {
                        tracker.println(&line);
                        tracker.inc();
                    }
                    None => println!("{}", line),
                }
            }
            ProgressEvent::RunFinished { .. } => {
                if let Some(tracker) = self.tracker() {
                    tracker.finish_clear();
                }
            }
            ProgressEvent::Cancelled { processed, total } => {
                if let Some(tracker) = self.tracker() {
                    tracker.abandon(&format!("Cancelled after {} of {} mods", processed, total));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("progress.test.rs");
}

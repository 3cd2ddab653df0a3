//! User-facing progress output for batch runs.
//!
//! Diagnostics go through `tracing`; this logger owns the progress bar and
//! the per-window summary lines, routing messages through the bar so they
//! do not clobber its fixed positioning.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Summary = 0,
    Detailed = 1,
    Debug = 2,
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }
}

pub struct ProgressLogger {
    verbosity: VerbosityLevel,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            bar: Mutex::new(None),
        }
    }

    pub fn info(&self, message: &str) {
        self.print(message);
    }

    pub fn detail(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print(message);
        }
    }

    fn print(&self, message: &str) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.println(message);
                return;
            }
        }
        println!("{}", message);
    }

    pub fn start_progress(&self, total: u64, phase: &str) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message(phase.to_string());

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    pub fn advance(&self, steps: u64) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(steps);
            }
        }
    }

    pub fn finish_progress(&self, final_message: &str) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        self.print(final_message);
    }
}

// UI layer: progress reporting for the batch stages. Bars are drawn on
// stderr and indicatif hides them automatically when stderr is not a
// terminal, so logs on stdout stay clean.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A bar counting completed requests of a batch stage.
pub fn batch_progress(len: usize, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar
}

/// A spinner for single-request stages such as login.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

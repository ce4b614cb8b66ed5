use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        elapsed.subsec_millis()
    )
}

pub fn print_hms(start: &Instant) {
    log::info!("Elapsed time: {}", format_hms(start.elapsed()));
}

/// Spinner shown on stderr while a request is in flight.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

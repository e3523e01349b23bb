use gust_core::prelude::ShutdownListener;
use gust_instruments::Reporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp::min;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Shows a progress bar while the test is running: elapsed time against the planned
/// runtime, with a live count of completed iterations read from the reporter.
pub(crate) fn start_progress(
    planned_runtime: Duration,
    reporter: Arc<Reporter>,
    mut shutdown_listener: ShutdownListener,
) {
    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_runtime.as_secs());
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {prefix}] {msg}",
                )
                .expect("Failed to set progress style")
                .progress_chars("#>-"),
            );
            pb.set_prefix(format_hhmmss(planned_runtime));

            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                pb.set_position(min(
                    start_time.elapsed().as_secs(),
                    planned_runtime.as_secs(),
                ));
                pb.set_message(format!("{} iterations", reporter.record_count()));
                std::thread::sleep(REFRESH_INTERVAL);
            }
        })
        .expect("Failed to start progress thread");
}

fn format_hhmmss(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn planned_runtime_renders_as_wall_clock() {
        assert_eq!("00:00:05", format_hhmmss(Duration::from_secs(5)));
        assert_eq!("00:01:30", format_hhmmss(Duration::from_secs(90)));
        assert_eq!("02:05:09", format_hhmmss(Duration::from_secs(7509)));
    }
}

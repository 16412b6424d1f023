//! Terminal progress display for streaming downloads
//!
//! Bridges a download's progress channel onto an indicatif bar. The bar is
//! percentage-based when the server reported a content length and falls back
//! to a spinner otherwise; either way the current transfer rate is shown.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::client::DownloadProgress;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} downloading... {msg}";

/// Drain a progress channel into a terminal bar until the sender drops
///
/// Returns the task handle so the caller can await the final redraw after
/// the download resolves.
pub fn attach_progress_bar(
    mut progress_rx: mpsc::UnboundedReceiver<DownloadProgress>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(100);
        let mut determinate = false;

        while let Some(update) = progress_rx.recv().await {
            match update.percentage {
                Some(pct) => {
                    if !determinate {
                        bar.set_style(percentage_style());
                        determinate = true;
                    }
                    bar.set_position(pct.round() as u64);
                }
                None => {
                    if !determinate {
                        bar.set_style(spinner_style());
                        bar.tick();
                    }
                }
            }
            bar.set_message(format!("{:.0} kB/s", update.speed_kbps));
        }
        bar.finish_and_clear();
    })
}

fn percentage_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bar_task_finishes_when_sender_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = attach_progress_bar(rx);

        tx.send(DownloadProgress {
            percentage: Some(42.0),
            speed_kbps: 1000.0,
        })
        .unwrap();
        drop(tx);

        task.await.unwrap();
    }
}

// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use ctfd_common::assets::ProgressFactory;
use ctfd_common::client::download::DownloadProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "    {msg:24!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "    {spinner} {msg:22!} {bytes} ({bytes_per_sec})";

/// Shows a progress bar for every attachment. Attachments are downloaded one at a time, so only
/// one bar is visible at once.
pub(crate) struct ProgressBars;

impl ProgressFactory for ProgressBars {
    fn for_file(&self, file_name: &str) -> Box<dyn DownloadProgress> {
        let bar = ProgressBar::new_spinner();
        bar.set_message(file_name.to_string());
        Box::new(FileProgress { bar })
    }
}

struct FileProgress {
    bar: ProgressBar,
}

impl DownloadProgress for FileProgress {
    fn start(&self, total: Option<u64>) {
        match total {
            Some(total) => {
                self.bar.set_length(total);
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    self.bar.set_style(style.progress_chars("=> "));
                }
            }
            // No content length, so there is nothing to measure against
            None => {
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    self.bar.set_style(style);
                }
                self.bar.enable_steady_tick(Duration::from_millis(130));
            }
        }
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for FileProgress {
    // Downloads that fail midway never reach finish
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileProgress;
    use ctfd_common::client::download::DownloadProgress;
    use indicatif::ProgressBar;

    #[test]
    fn should_clear_an_unfinished_bar_when_dropped() {
        let bar = ProgressBar::hidden();
        let progress = FileProgress { bar: bar.clone() };
        progress.start(Some(100));
        progress.advance(40);

        drop(progress);

        assert!(bar.is_finished());
    }

    #[test]
    fn should_finish_the_bar_once() {
        let bar = ProgressBar::hidden();
        let progress = FileProgress { bar: bar.clone() };
        progress.start(None);
        progress.advance(7);
        progress.finish();

        assert!(bar.is_finished());
        drop(progress);
        assert_eq!(bar.position(), 7);
    }
}

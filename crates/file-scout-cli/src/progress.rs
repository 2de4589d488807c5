use file_scout_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Load phase: progress bar over the files being read
/// - Hash phase: progress bar over the files needing a full digest
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, label: &str) {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(&format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files",
            label
        )) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn update_bar(&self, done: usize, total: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                if pb.length() != Some(total as u64) {
                    pb.set_length(total as u64);
                }
                pb.set_position(done as u64);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_load_start(&self) {
        self.start_bar("Reading");
    }

    fn on_load_progress(&self, files_read: usize, total_files: usize) {
        self.update_bar(files_read, total_files);
    }

    fn on_load_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Load complete: {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_hash_start(&self) {
        self.start_bar("Hashing");
    }

    fn on_hash_progress(&self, files_hashed: usize, total_files: usize) {
        self.update_bar(files_hashed, total_files);
    }

    fn on_hash_complete(&self, duplicate_groups: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Hash complete: {} duplicate groups in {:.2}s",
            duplicate_groups, duration_secs
        );
    }

    fn on_file_removed(&self, name: &str) {
        eprintln!("  \x1b[31m✗\x1b[0m removed {}", name);
    }
}

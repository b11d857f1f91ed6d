use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

const PB_STYLE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Byte progress bar for the copy loop.
pub struct InstallTracker {
    pb: ProgressBar,
}

impl InstallTracker {
    pub fn new(total_bytes: u64) -> Self {
        let pb = ProgressBar::new(total_bytes);
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        Self { pb }
    }

    pub fn hidden(total_bytes: u64) -> Self {
        let pb = ProgressBar::hidden();
        pb.set_length(total_bytes);
        Self { pb }
    }

    pub fn update(&self, copied: u64, current: Option<String>) {
        self.pb.set_position(copied);
        if let Some(msg) = current {
            self.pb.set_message(msg);
        }
    }

    pub fn finish(self, msg: &'static str) { self.pb.finish_with_message(msg); }

    pub fn abandon(self, msg: &'static str) { self.pb.abandon_with_message(msg); }
}

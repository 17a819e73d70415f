use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

const STATUS_PREFIX: &str = "Cheating status";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Chooses between an animated stderr line and plain log-friendly lines.
#[derive(Clone, Copy, Debug)]
pub struct Ui {
    pretty: bool,
}

impl Ui {
    /// Pretty output needs a terminal on stderr; `auto` also backs off when
    /// stdout is piped, so scripted runs get one line per change.
    pub fn from_args(ui_flag: Option<&str>, stderr_is_tty: bool, stdout_is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        let pretty = stderr_is_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => stdout_is_tty,
                UiMode::Plain => false,
            };
        Self { pretty }
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.pretty {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let style = ProgressStyle::with_template("{spinner} {elapsed_precise} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        Some(spinner)
    }

    /// Announce a setup step; the returned guard reports its duration on drop.
    pub fn step(&self, name: &str) -> StepTimer {
        eprintln!("==> {name}");
        StepTimer {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Live status line for a running session.
    pub fn status_line(&self, initial: &str) -> StatusLine {
        let line = StatusLine {
            spinner: self.spinner(),
            last: initial.to_string(),
            changes: 0,
            start: Instant::now(),
        };
        line.show(initial);
        line
    }
}

pub struct StepTimer {
    name: String,
    start: Instant,
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        eprintln!("    {} done in {}", self.name, format_duration(self.start.elapsed()));
    }
}

pub struct StatusLine {
    spinner: Option<ProgressBar>,
    last: String,
    changes: u64,
    start: Instant,
}

impl StatusLine {
    fn show(&self, status: &str) {
        let message = format!("{STATUS_PREFIX}: {status}");
        match &self.spinner {
            Some(spinner) => spinner.set_message(message),
            None => eprintln!("{message}"),
        }
    }

    /// Redraw when the text changed. Plain mode prints one line per change.
    pub fn update(&mut self, status: &str) {
        if self.last == status {
            return;
        }
        self.changes += 1;
        self.show(status);
        self.last = status.to_string();
    }

    pub fn finish(self, summary: &str) {
        let message = format!(
            "{STATUS_PREFIX}: {} after {} ({} changes; {summary})",
            self.last,
            format_duration(self.start.elapsed()),
            self.changes
        );
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

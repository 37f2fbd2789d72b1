use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use qsubmit::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const BAR_TEMPLATE: &str = "[{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

#[derive(Default)]
struct BarState {
    bar: Option<ProgressBar>,
    skipped: usize,
}

/// Renders submission progress on stderr: a spinner per phase, a bar with one
/// step per run directory, and a line for every skipped directory.
#[derive(Clone, Default)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
    hidden: bool,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that tracks state without drawing anything.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |progress| handler.handle(progress))
    }

    pub fn skipped(&self) -> usize {
        self.state.lock().map(|s| s.skipped).unwrap_or(0)
    }

    fn new_bar(&self, len: u64) -> ProgressBar {
        let target = if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        ProgressBar::with_draw_target(Some(len), target)
    }

    fn handle(&self, progress: Progress) {
        let Ok(mut state) = self.state.lock() else {
            warn!("Progress state mutex was poisoned. Cannot update progress.");
            return;
        };

        match progress {
            Progress::PhaseStart { name } => {
                let bar = self.new_bar(0).with_style(ProgressStyle::default_spinner());
                bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                bar.set_message(name);
                state.bar = Some(bar);
            }
            Progress::TaskStart { total_steps } => {
                let bar = state.bar.take().unwrap_or_else(|| self.new_bar(0));
                bar.disable_steady_tick();
                bar.set_length(total_steps);
                bar.set_position(0);
                match ProgressStyle::with_template(BAR_TEMPLATE) {
                    Ok(style) => bar.set_style(style.progress_chars("##-")),
                    Err(e) => warn!("Invalid progress template: {}", e),
                }
                state.bar = Some(bar);
            }
            Progress::TaskIncrement => {
                if let Some(bar) = &state.bar {
                    bar.inc(1);
                }
            }
            Progress::ScriptWritten { script } => {
                if let Some(bar) = &state.bar {
                    bar.set_message(script.display().to_string());
                }
            }
            Progress::RunSkipped { dir, reason } => {
                state.skipped += 1;
                if let Some(bar) = &state.bar {
                    bar.println(format!("  skipped {}: {}", dir.display(), reason));
                }
            }
            Progress::Message(msg) => {
                if let Some(bar) = &state.bar {
                    bar.println(format!("  {}", msg));
                }
            }
            Progress::TaskFinish => {
                if let Some(bar) = &state.bar {
                    bar.finish();
                }
            }
            Progress::PhaseFinish => {
                if let Some(bar) = state.bar.take() {
                    bar.finish_with_message("Done");
                }
            }
        }
    }

    #[cfg(test)]
    fn position(&self) -> Option<(u64, Option<u64>, String)> {
        let state = self.state.lock().unwrap();
        state
            .bar
            .as_ref()
            .map(|bar| (bar.position(), bar.length(), bar.message()))
    }
}

//! Terminal progress rendering and its state machine.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::debug;

use crate::shutdown::Shutdown;

use super::ProgressEvent;

/// Lifecycle of one tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// No duration known yet; progress cannot be expressed.
    Uninitialized,
    /// Duration known, completion strictly below one.
    Tracking,
    /// Completion reached one; the engine may still be finishing up.
    Complete,
    /// The engine reported completion or the user cancelled.
    Terminated,
}

/// Progress state machine, decoupled from rendering.
///
/// Reaching full completion never terminates the tracker on its own. The
/// engine keeps working after the last counted frame, so only an explicit
/// completion report or user cancellation ends tracking.
#[derive(Debug)]
pub struct ProgressTracker {
    state: DisplayState,
    duration_secs: f64,
    percent: f64,
}

impl ProgressTracker {
    /// Creates a tracker with no known duration.
    pub fn new() -> Self {
        Self {
            state: DisplayState::Uninitialized,
            duration_secs: 0.0,
            percent: 0.0,
        }
    }

    /// Supplies the total duration, moving out of `Uninitialized`.
    pub fn set_duration(&mut self, duration_secs: f64) {
        if self.state == DisplayState::Uninitialized && duration_secs > 0.0 {
            self.duration_secs = duration_secs;
            self.state = DisplayState::Tracking;
        }
    }

    /// Applies one event.
    pub fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::ElapsedTime(elapsed) => {
                if self.state == DisplayState::Tracking {
                    self.percent = (elapsed / self.duration_secs).clamp(0.0, 1.0);
                    if self.percent >= 1.0 {
                        self.state = DisplayState::Complete;
                    }
                }
            }
            ProgressEvent::Completed => {
                self.state = DisplayState::Terminated;
            }
            ProgressEvent::Unparseable(_) => {}
        }
    }

    /// Terminates on behalf of the user.
    pub fn cancel(&mut self) {
        self.state = DisplayState::Terminated;
    }

    /// Completion in `[0, 1]`.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Whether the tracker reached its final state.
    pub fn is_terminated(&self) -> bool {
        self.state == DisplayState::Terminated
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal rendering actor for one engine pass.
///
/// Owns the event inbox and an indicatif bar with millisecond positions.
/// The run loop ends when the tracker terminates or the inbox closes;
/// rendering never feeds back into state.
pub struct ProgressDisplay {
    tracker: ProgressTracker,
    events_rx: mpsc::Receiver<ProgressEvent>,
    shutdown: Shutdown,
    bar: ProgressBar,
    total_ms: u64,
}

impl ProgressDisplay {
    /// Creates a display for an operation of known duration.
    pub fn new(
        duration_secs: f64,
        events_rx: mpsc::Receiver<ProgressEvent>,
        shutdown: Shutdown,
    ) -> Self {
        let mut tracker = ProgressTracker::new();
        tracker.set_duration(duration_secs);

        let total_ms = (duration_secs * 1000.0).max(1.0) as u64;
        let bar = ProgressBar::new(total_ms);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent:>3}%")
                .unwrap()
                .progress_chars("#>-"),
        );

        Self {
            tracker,
            events_rx,
            shutdown,
            bar,
            total_ms,
        }
    }

    /// Consumes events until completion, cancellation or a closed inbox.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => {
                            if let ProgressEvent::Unparseable(record) = &event {
                                debug!("Dropping unparseable progress record: {}", record);
                            }
                            self.tracker.on_event(&event);
                            let position = self.tracker.percent() * self.total_ms as f64;
                            self.bar.set_position(position as u64);
                            if self.tracker.is_terminated() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = self.shutdown.wait() => {
                    self.tracker.cancel();
                    break;
                }
            }
        }
        self.bar.finish_and_clear();
    }
}

use crossbeam_channel::Sender;
use indicatif::ProgressBar;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, PoisonError,
};

/// Receives render progress as a fraction in `[0, 1]`.
///
/// Reporting must not block; sinks may drop values.
pub trait ProgressSink: Sync {
    fn report(&self, fraction: f64);
}

impl ProgressSink for () {
    fn report(&self, _fraction: f64) {}
}

impl ProgressSink for Sender<f64> {
    fn report(&self, fraction: f64) {
        // Full or disconnected receivers just miss an update.
        let _ = self.try_send(fraction);
    }
}

impl ProgressSink for ProgressBar {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn report(&self, fraction: f64) {
        let len = self.length().unwrap_or(0);
        self.set_position((fraction * len as f64).round() as u64);
    }
}

/// Counts finished rows and forwards strictly increasing fractions to
/// a sink.
pub(crate) struct RowProgress<'a, P: ?Sized> {
    sink: &'a P,
    rows: usize,
    done: AtomicUsize,
    last: Mutex<f64>,
}

impl<'a, P: ProgressSink + ?Sized> RowProgress<'a, P> {
    pub(crate) fn new(sink: &'a P, rows: usize) -> Self {
        Self {
            sink,
            rows,
            done: AtomicUsize::new(0),
            last: Mutex::new(0.0),
        }
    }

    /// Records one finished row.
    ///
    /// Threads that lose the race for the lock skip their update. The
    /// final fraction is left to [`RowProgress::finish`].
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn row_done(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done >= self.rows {
            return;
        }
        let fraction = done as f64 / self.rows as f64;
        if let Ok(mut last) = self.last.try_lock() {
            if fraction > *last {
                *last = fraction;
                self.sink.report(fraction);
            }
        }
    }

    pub(crate) fn finish(&self) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last = 1.0;
        self.sink.report(1.0);
    }
}

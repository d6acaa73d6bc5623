/*!
Cooperative cancellation and throttled progress for the envelope streams.
*/

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::constants::PROGRESS_INTERVAL;
use crate::core::error::{Error, Result};

/// Out-of-band cancel signal shared between a stream and its controller.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a handle in the non-canceled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancel signal. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has been raised
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Callback receiving the running count of processed input bytes
pub type ProgressCallback = Box<dyn FnMut(u64) + Send>;

/// Per-stream options: cancellation and progress reporting
pub struct StreamOptions {
    pub(crate) cancel: Option<CancelHandle>,
    pub(crate) progress: Option<ProgressCallback>,
    pub(crate) progress_interval: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            cancel: None,
            progress: None,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the given cancel handle
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Report progress to `callback`
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Override the throttle interval
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Throttled progress counter.
///
/// The first report (0 bytes) and the final report are always delivered;
/// reports in between are delivered at most once per interval.
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    interval: Duration,
    total: u64,
    last_emit: Option<Instant>,
    started: bool,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>, interval: Duration) -> Self {
        Self {
            callback,
            interval,
            total: 0,
            last_emit: None,
            started: false,
        }
    }

    /// Report the initial zero count once
    pub fn start(&mut self) {
        if !self.started {
            self.started = true;
            self.emit();
        }
    }

    /// Add processed bytes, reporting if the interval has elapsed
    pub fn advance(&mut self, bytes: usize) {
        self.total += bytes as u64;
        let due = self
            .last_emit
            .map_or(true, |last| last.elapsed() >= self.interval);
        if due {
            self.emit();
        }
    }

    /// Report the final count unconditionally
    pub fn complete(&mut self) {
        self.start();
        self.emit();
    }

    /// Bytes processed so far
    pub fn total(&self) -> u64 {
        self.total
    }

    fn emit(&mut self) {
        if let Some(callback) = self.callback.as_mut() {
            callback(self.total);
        }
        self.last_emit = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal {
    Finished,
    Failed,
    Canceled,
}

/// Lifecycle bookkeeping shared by every stream: terminal state, cancellation
/// checks around each step, and progress accounting.
pub(crate) struct StreamControl {
    cancel: Option<CancelHandle>,
    progress: ProgressTracker,
    terminal: Option<Terminal>,
    in_flight: bool,
}

impl StreamControl {
    pub(crate) fn new(options: StreamOptions) -> Self {
        Self {
            cancel: options.cancel,
            progress: ProgressTracker::new(options.progress, options.progress_interval),
            terminal: None,
            in_flight: false,
        }
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_canceled)
    }

    /// Gate a step: refuses work on a terminal or canceled stream
    pub(crate) fn begin(&mut self) -> Result<()> {
        match self.terminal {
            Some(Terminal::Canceled) => return Err(Error::StreamCanceled),
            Some(Terminal::Failed) => return Err(Error::InvalidStream("stream has failed".into())),
            Some(Terminal::Finished) => {
                return Err(Error::InvalidStream("stream already finished".into()))
            }
            None => {}
        }
        if self.in_flight {
            // A previous step was dropped before it settled
            self.terminal = Some(Terminal::Failed);
            return Err(Error::InvalidStream("previous step was interrupted".into()));
        }
        if self.cancel_requested() {
            log::warn!("stream canceled before processing");
            self.terminal = Some(Terminal::Canceled);
            return Err(Error::StreamCanceled);
        }
        self.progress.start();
        self.in_flight = true;
        Ok(())
    }

    /// Close a step. A cancel raised while the step ran discards its output.
    pub(crate) fn settle<T>(&mut self, result: Result<T>, consumed: usize) -> Result<T> {
        self.in_flight = false;
        match result {
            Err(error) => {
                self.terminal = Some(match error {
                    Error::StreamCanceled => Terminal::Canceled,
                    _ => Terminal::Failed,
                });
                Err(error)
            }
            Ok(_) if self.cancel_requested() => {
                log::warn!("stream canceled while processing");
                self.terminal = Some(Terminal::Canceled);
                Err(Error::StreamCanceled)
            }
            Ok(value) => {
                self.progress.advance(consumed);
                Ok(value)
            }
        }
    }

    /// Mark the stream finished and deliver the final progress report
    pub(crate) fn complete(&mut self) {
        self.terminal = Some(Terminal::Finished);
        self.progress.complete();
    }

    pub(crate) fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    pub(crate) fn processed(&self) -> u64 {
        self.progress.total()
    }
}

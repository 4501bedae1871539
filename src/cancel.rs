//! Cooperative cancellation for the wait stages.
//!
//! SIGINT/SIGTERM flip a process-wide flag. The discovery and poll loops check it between
//! requests and while sleeping, and return `CiError::Cancelled` once it is set.

#[cfg(unix)]
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static SIGNALLED: AtomicBool = AtomicBool::new(false);

const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[cfg(unix)]
extern "C" fn handle_stop(_sig: i32) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM into the process-wide cancellation flag.
#[cfg(unix)]
pub fn install_signal_handlers() {
    let act = SigAction::new(
        SigHandler::Handler(handle_stop),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // The handler only stores into an atomic, which is async-signal-safe.
        if let Err(e) = unsafe { signal::sigaction(sig, &act) } {
            tracing::debug!(signal = %sig, error = %e, "failed to install signal handler");
        }
    }
}

#[cfg(not(unix))]
pub fn install_signal_handlers() {}

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    local: Arc<AtomicBool>,
    watch_signals: bool,
}

impl CancelToken {
    /// Token that never fires unless `cancel()` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also fires when the installed signal handlers run.
    pub fn from_signals() -> Self {
        Self {
            local: Arc::new(AtomicBool::new(false)),
            watch_signals: true,
        }
    }

    pub fn cancel(&self) {
        self.local.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.local.load(Ordering::SeqCst) || (self.watch_signals && SIGNALLED.load(Ordering::SeqCst))
    }

    /// Sleep for `dur` in short slices. Returns false if cancelled before the time is up.
    pub fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_completes_when_not_cancelled() {
        let t = CancelToken::new();
        let start = Instant::now();
        assert!(t.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_sleep_returns_early_once_cancelled() {
        let t = CancelToken::new();
        let other = t.clone();
        let h = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            other.cancel();
        });
        let start = Instant::now();
        assert!(!t.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        h.join().unwrap();
        assert!(t.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn test_installing_handlers_does_not_cancel() {
        install_signal_handlers();
        install_signal_handlers();
        let t = CancelToken::from_signals();
        assert!(!t.is_cancelled());
        assert!(t.sleep(Duration::from_millis(10)));
    }
}

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::{Receiver, Sender};

/// Broadcasts the global stop signal to every part of the engine that needs to wind down.
///
/// A single handle is created per run and only the Ctrl-C listener raises it; scenario
/// durations are enforced by the scheduler's per-scenario deadlines, not through this
/// signal. VU loops, the scheduler, the progress bar and the resource monitor each hold
/// their own [ShutdownListener] created from the handle.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    pub fn shutdown(&self) {
        if let Err(e) = self.sender.send(()) {
            // Will fail if nobody is listening for a shutdown signal, which happens when the
            // run has already wound down on its own.
            log::debug!("Nobody listening for shutdown signal: {e:?}");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }
}

/// One thread's view of the stop signal. Not shared: every loop that polls for shutdown
/// subscribes its own listener, so a signal observed by one never consumes another's.
#[derive(Debug)]
pub struct ShutdownListener {
    receiver: Receiver<()>,
}

impl ShutdownListener {
    /// Point in time check whether the stop signal has been raised.
    ///
    /// VU loops call this at iteration boundaries only, so cancellation is cooperative and
    /// never interrupts an in-flight request.
    pub fn should_shutdown(&mut self) -> bool {
        match self.receiver.try_recv() {
            Ok(_) => true,
            // A dropped handle means the run is winding down.
            Err(TryRecvError::Closed) => true,
            Err(_) => false,
        }
    }

    /// Wait for the stop signal. Safe to race against another future so that in-progress
    /// async work can be abandoned when the run is aborted.
    pub async fn wait_for_shutdown(&mut self) {
        // Recv only fails when the handle is gone, which counts as shutdown too.
        let _ = self.receiver.recv().await;
    }
}

/// Returned by async work that was cancelled by the stop signal, so callers can tell
/// cancellation apart from a genuine failure.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by shutdown signal".to_string(),
        }
    }
}

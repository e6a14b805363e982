use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};

use crate::Result;

/// Coalesces bursts of triggers: a reload becomes due once no trigger has
/// arrived for the whole window.
#[derive(Debug, Clone)]
pub struct DebounceWindow {
    window: Duration,
    last_trigger: Option<Instant>,
}

impl DebounceWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.last_trigger = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger.is_some()
    }

    /// Time left until the pending reload is due, `None` when idle.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_trigger?;

        Some(self.window.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Returns `true` exactly once per burst, when the window has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.remaining(now) {
            Some(left) if left.is_zero() => {
                self.last_trigger = None;

                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Reload,
    Shutdown,
}

/// Cloneable handle for requesting a reload.
#[derive(Debug, Clone)]
pub struct ReloadTrigger {
    sender: Sender<Signal>,
}

impl ReloadTrigger {
    /// Returns `false` once the debouncer has shut down.
    pub fn trigger(&self) -> bool {
        self.sender.send(Signal::Reload).is_ok()
    }
}

/// Background worker running at most one reload per quiet window.
///
/// Reloads run one after another on the worker thread. Dropping the
/// debouncer discards a pending reload and joins the worker.
#[derive(Debug)]
pub struct ReloadDebouncer {
    trigger: Option<ReloadTrigger>,
    worker: Option<JoinHandle<()>>,
}

impl ReloadDebouncer {
    pub fn spawn<F>(window: Duration, mut on_reload: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (sender, receiver) = unbounded::<Signal>();

        let worker = thread::Builder::new()
            .name("ratings-reload".to_owned())
            .spawn(move || {
                let mut state = DebounceWindow::new(window);

                loop {
                    let received = match state.remaining(Instant::now()) {
                        Some(wait) => receiver.recv_timeout(wait),
                        None => receiver
                            .recv()
                            .map_err(|_| RecvTimeoutError::Disconnected),
                    };

                    match received {
                        Ok(Signal::Reload) => state.trigger(Instant::now()),
                        Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    if state.poll(Instant::now()) {
                        tracing::debug!("running debounced reload");
                        on_reload();
                    }
                }
            })?;

        Ok(Self {
            trigger: Some(ReloadTrigger { sender }),
            worker: Some(worker),
        })
    }

    pub fn trigger(&self) -> bool {
        self.trigger.as_ref().is_some_and(ReloadTrigger::trigger)
    }

    pub fn handle(&self) -> Option<ReloadTrigger> {
        self.trigger.clone()
    }
}

impl Drop for ReloadDebouncer {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            let _ = trigger.sender.send(Signal::Shutdown);
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("reload worker panicked");
            }
        }
    }
}

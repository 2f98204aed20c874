//! Completion detection for streamed answers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::session::{WatchSession, WatchState};
use super::source::ChangeSource;
use crate::adapters::SiteAdapter;
use crate::selector::Selector;
use crate::Result;

/// Quiet period after the last added node before the count is checked
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

fn lock(session: &Mutex<WatchSession>) -> MutexGuard<'_, WatchSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Detects that an answer has finished streaming.
///
/// Chat sites add a copy button to a message once it is complete. The
/// detector records how many copy buttons exist when watching starts,
/// waits for mutations to settle, and fires once the count has grown.
#[derive(Debug, Clone)]
pub struct StreamingDetector {
    copy_button: Selector,
    debounce: Duration,
}

impl StreamingDetector {
    pub fn new(copy_button: Selector, debounce: Duration) -> Self {
        Self {
            copy_button,
            debounce,
        }
    }

    /// Detector for the copy buttons of a site
    pub fn for_adapter(adapter: &dyn SiteAdapter, debounce: Duration) -> Result<Self> {
        let copy_button = Selector::parse(adapter.copy_button_selector())?;
        Ok(Self::new(copy_button, debounce))
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Start watching `source`. `on_complete` runs at most once, after the
    /// subscription has been dropped.
    ///
    /// The baseline count and the subscription are taken before this
    /// returns, so mutations made right afterwards are seen. Must be called
    /// from within a tokio runtime.
    pub fn start_watching<S, F>(&self, source: Arc<S>, on_complete: F) -> WatchHandle
    where
        S: ChangeSource + ?Sized,
        F: FnOnce() + Send + 'static,
    {
        let initial = source.count_matching(&self.copy_button);
        let mut rx = source.observe();

        let mut session = WatchSession::new(self.debounce);
        session.start(initial);
        let session = Arc::new(Mutex::new(session));
        let stop = Arc::new(Notify::new());
        debug!(initial, selector = self.copy_button.as_str(), "watching for completion");

        let task = tokio::spawn({
            let session = session.clone();
            let stop = stop.clone();
            let selector = self.copy_button.clone();

            async move {
                let mut open = true;
                let fired = loop {
                    let deadline = lock(&session).deadline();
                    tokio::select! {
                        _ = stop.notified() => break false,
                        batch = rx.recv(), if open => match batch {
                            Some(batch) => {
                                lock(&session).on_mutation(&batch, Instant::now());
                            }
                            None => open = false,
                        },
                        _ = sleep_until(deadline) => {
                            let count = source.count_matching(&selector);
                            if lock(&session).on_deadline(count, Instant::now()) {
                                break true;
                            }
                        }
                    }

                    let session = lock(&session);
                    if session.state().is_terminal() || (!open && session.deadline().is_none()) {
                        break false;
                    }
                };

                drop(rx);
                if fired {
                    debug!("copy button count grew, answer complete");
                    on_complete();
                }
            }
        });

        WatchHandle {
            session,
            stop,
            task: Some(task),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle to a running watch session. Dropping it stops the watch.
#[derive(Debug)]
pub struct WatchHandle {
    session: Arc<Mutex<WatchSession>>,
    stop: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop watching. A pending debounce is cancelled, so the callback can
    /// no longer fire.
    pub fn stop(&self) {
        if lock(&self.session).stop() {
            debug!("watch stopped");
        }
        self.stop.notify_one();
    }

    pub fn state(&self) -> WatchState {
        lock(&self.session).state()
    }

    /// Has the watch task ended (fired, stopped or source gone)?
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the watch task to end
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            // a panicking callback is the caller's bug; nothing to recover here
            let _ = task.await;
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

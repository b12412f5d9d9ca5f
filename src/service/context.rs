//! Request-scoped feed context
//!
//! Carries the viewer, the deadline and cancellation signal, and the
//! per-request author memo through the whole assembly call chain.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::data::DisplayInfo;

/// Why a feed request stopped before completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    DeadlineExceeded,
    Requested,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Requested => f.write_str("cancellation requested"),
        }
    }
}

/// Cancels the context it was created with.
///
/// Dropping the handle without calling [`CancelHandle::cancel`] leaves the
/// request running.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Context for one feed request
#[derive(Debug, Default)]
pub struct FeedContext {
    viewer: Option<String>,
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
    authors: Mutex<HashMap<String, Option<DisplayInfo>>>,
}

impl FeedContext {
    /// Context for `viewer`; a blank username means anonymous
    pub fn new(viewer: Option<&str>) -> Self {
        let viewer = viewer
            .map(str::trim)
            .filter(|username| !username.is_empty())
            .map(ToOwned::to_owned);

        Self {
            viewer,
            ..Self::default()
        }
    }

    /// Anonymous context
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context that can be cancelled through the returned handle
    pub fn cancellable(viewer: Option<&str>) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut ctx = Self::new(viewer);
        ctx.cancel = Some(rx);
        (ctx, CancelHandle(tx))
    }

    /// Fail with [`CancelReason::DeadlineExceeded`] once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    /// Drive `work` until it finishes, the deadline passes, or the request is
    /// cancelled. Unfinished work is dropped.
    pub async fn guard<F, T>(&self, work: F) -> Result<T, CancelReason>
    where
        F: Future<Output = T>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let cancelled = async {
            match &self.cancel {
                Some(rx) => {
                    let mut rx = rx.clone();
                    let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    // A dropped handle can never cancel.
                    if handle_dropped {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(CancelReason::Requested),
            _ = deadline => Err(CancelReason::DeadlineExceeded),
            output = work => Ok(output),
        }
    }

    /// Author memo lookup; the outer `None` means "not looked up yet"
    pub(crate) fn cached_author(&self, username: &str) -> Option<Option<DisplayInfo>> {
        self.authors
            .lock()
            .ok()
            .and_then(|authors| authors.get(username).cloned())
    }

    pub(crate) fn remember_author(&self, username: &str, info: Option<DisplayInfo>) {
        if let Ok(mut authors) = self.authors.lock() {
            authors.insert(username.to_string(), info);
        }
    }
}

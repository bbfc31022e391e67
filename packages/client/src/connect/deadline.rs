//! Wall-clock deadline for a single connect call
//!
//! Connect calls block the caller. Each call drives its resolution and
//! connect futures on its own current-thread runtime and races them against
//! the deadline timer and the handle's closed signal. The losing future is
//! dropped, which closes any socket it owned.
//!
//! A caller already inside a tokio runtime cannot block on a second one, so
//! there the call runs on a scoped worker thread and the caller waits for it.

use std::future::Future;
use std::panic;
use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::watch;

use crate::error::{self, Result};

/// Absolute point in time by which a connect call must finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `timeout` from now; `None` means no explicit deadline.
    pub(crate) fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    /// Time left, saturating at zero. `None` when unbounded.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Fail with `ConnectTimeout` if the deadline already passed.
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_expired() {
            return Err(error::deadline_elapsed());
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the deadline passes or the handle is
    /// closed, whichever happens first.
    pub(crate) async fn bound<T, F>(&self, closed: &mut watch::Receiver<bool>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timer = async {
            match self.at {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = wait_closed(closed) => Err(error::handle_closed()),
            () = timer => Err(error::deadline_elapsed()),
            result = fut => result,
        }
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    // A dropped sender means the lineage is gone; nothing can close it now.
    if closed.wait_for(|is_closed| *is_closed).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run the future built by `make` to completion on a fresh runtime.
pub(crate) fn block_on<T, F, Fut>(make: F) -> Result<T>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T>>,
    T: Send,
{
    if Handle::try_current().is_err() {
        return drive(make);
    }
    tracing::debug!("Called from inside an async runtime, connecting on a worker thread");
    thread::scope(|scope| {
        scope
            .spawn(|| drive(make))
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    })
}

fn drive<T, F, Fut>(make: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let runtime = runtime()?;
    let result = runtime.block_on(make());
    runtime.shutdown_background();
    result
}

/// Runtime that drives one connect call.
pub(crate) fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .map_err(error::transport_creation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_deadline_never_expires() {
        let deadline = Deadline::after(None);
        assert_eq!(deadline.remaining(), None);
        assert!(!deadline.is_expired());
        assert!(deadline.check().is_ok());
    }

    #[test]
    fn zero_deadline_is_expired() {
        let deadline = Deadline::after(Some(Duration::ZERO));
        assert!(deadline.is_expired());
        assert!(deadline.check().expect_err("expired").is_timeout());
    }

    #[test]
    fn timer_wins_over_pending_future() {
        let rt = runtime().expect("runtime");
        let (_tx, mut rx) = watch::channel(false);
        let deadline = Deadline::after(Some(Duration::from_millis(20)));

        let started = Instant::now();
        let result: Result<()> =
            rt.block_on(deadline.bound(&mut rx, std::future::pending::<Result<()>>()));

        assert!(result.expect_err("deadline passes").is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn closed_signal_wins_over_pending_future() {
        let rt = runtime().expect("runtime");
        let (tx, mut rx) = watch::channel(false);
        tx.send_replace(true);

        let result: Result<()> =
            rt.block_on(Deadline::after(None).bound(&mut rx, std::future::pending::<Result<()>>()));

        let err = result.expect_err("closed");
        assert!(err.is_closed());
        assert!(err.is_transport_io());
    }

    #[test]
    fn block_on_outside_a_runtime() {
        let value = block_on(|| async { Ok(11) }).expect("future completes");
        assert_eq!(value, 11);
    }

    #[tokio::test]
    async fn block_on_inside_a_runtime_does_not_panic() {
        let deadline = Deadline::after(Some(Duration::from_millis(20)));
        let (_tx, mut rx) = watch::channel(false);

        let value = block_on(|| async { Ok(5) }).expect("future completes");
        assert_eq!(value, 5);

        let result: Result<()> = block_on(move || async move {
            deadline
                .bound(&mut rx, std::future::pending::<Result<()>>())
                .await
        });
        assert!(result.expect_err("deadline passes").is_timeout());
    }

    #[test]
    fn completed_future_is_returned() {
        let rt = runtime().expect("runtime");
        let (_tx, mut rx) = watch::channel(false);
        let deadline = Deadline::after(Some(Duration::from_secs(5)));

        let value = rt
            .block_on(deadline.bound(&mut rx, async { Ok(7) }))
            .expect("future completes");
        assert_eq!(value, 7);
    }
}

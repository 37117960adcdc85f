use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use log::{debug, info};
use parking_lot::Mutex;
use protocol::ErrorCode;
use tokio::sync::Notify;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closing,
    Closed,
}

impl SessionStatus {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionStatus::Open,
            1 => SessionStatus::Closing,
            _ => SessionStatus::Closed,
        }
    }
}

/// One library object behind an exclusive lock.
///
/// The wrapped object is not safe to call from several threads at once, so
/// every call goes through [`Session::with_session`]. The session also counts
/// the tasks handed to worker threads so that [`Session::close`] can wait for
/// them.
pub struct Session<T> {
    inner: Mutex<Option<T>>,
    status: AtomicU8,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl<T> Session<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Some(inner)),
            status: AtomicU8::new(SessionStatus::Open as u8),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn ensure_open(&self) -> Result<(), Error> {
        match self.status() {
            SessionStatus::Open => Ok(()),
            _ => Err(Error::Destroying),
        }
    }

    /// Runs `f` while holding the session lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        self.ensure_open()?;
        self.enter(f)
    }

    /// Like [`Session::with_session`] for calls returning a library status.
    pub fn call<R>(&self, f: impl FnOnce(&mut T) -> Result<R, ErrorCode>) -> Result<R, Error> {
        self.with_session(f)?.map_err(Error::Protocol)
    }

    /// Locks without checking the status; used by tasks accepted before a
    /// close began.
    pub(crate) fn enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(Error::Destroying)?;
        Ok(f(inner))
    }

    pub(crate) fn begin_task(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn end_task(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Refuses new work, waits for in-flight tasks, then hands the wrapped
    /// object to `teardown` and drops it.
    ///
    /// Calling it again after the first call is a no-op.
    pub async fn close(&self, teardown: impl FnOnce(&mut T)) {
        let previous = self.status.compare_exchange(
            SessionStatus::Open as u8,
            SessionStatus::Closing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if previous.is_err() {
            debug!("Session close requested twice");
            return;
        }

        loop {
            let idle = self.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            let pending = self.in_flight();
            if pending == 0 {
                break;
            }
            debug!("Session closing, waiting for {} in-flight tasks", pending);
            idle.await;
        }

        let inner = self.inner.lock().take();
        if let Some(mut inner) = inner {
            teardown(&mut inner);
        }

        self.status.store(SessionStatus::Closed as u8, Ordering::Release);
        info!("Session closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_with_session() {
        let session = Session::new(vec![1, 2, 3]);
        let sum = session.with_session(|v| v.iter().sum::<i32>()).unwrap();
        assert_eq!(sum, 6);
        assert_eq!(session.status(), SessionStatus::Open);
    }

    #[test]
    fn test_call_passes_code_through() {
        let session = Session::new(());
        let result = session.call(|_| Err::<(), _>(ErrorCode(0x0123_0000)));
        assert_eq!(result, Err(Error::Protocol(ErrorCode(0x0123_0000))));
    }

    #[tokio::test]
    async fn test_close_runs_teardown_once() {
        let session = Session::new(0u32);
        let mut torn_down = 0;

        session.close(|_| torn_down += 1).await;
        session.close(|_| torn_down += 1).await;

        assert_eq!(torn_down, 1);
        assert_eq!(session.status(), SessionStatus::Closed);
        assert_eq!(session.with_session(|_| ()), Err(Error::Destroying));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_close_waits_for_in_flight() {
        let session = Arc::new(Session::new(0u32));
        session.begin_task();

        let worker = session.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            worker.enter(|v| *v = 7).unwrap();
            worker.end_task();
        });

        let mut seen = 0;
        session.close(|v| seen = *v).await;
        handle.join().unwrap();

        assert_eq!(seen, 7);
    }
}

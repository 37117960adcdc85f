use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use log::{debug, error};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::components::{Job, Session};
use crate::Error;

type Work<T> = Box<dyn FnOnce(&Session<T>) + Send>;

struct Lane<T> {
    queue: VecDeque<Work<T>>,
    running: bool,
}

/// Completion passed to a local callback task with its place in the
/// delivery chain.
type Handoff<O> = (Completion<O>, Option<oneshot::Receiver<()>>, oneshot::Sender<()>);

/// Result of a task submitted with [`Dispatcher::submit`].
///
/// Resolves exactly once, with either the task output or an error.
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T, Error>>,
}

impl<T> Future for Completion<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::WorkerLost)))
    }
}

/// Runs jobs against a session, either inline or on the blocking pool.
///
/// Asynchronous jobs of one session go through a FIFO lane drained by a
/// single pool thread at a time, so they take the session lock in
/// submission order. Different sessions drain their lanes in parallel.
pub struct Dispatcher<T> {
    session: Arc<Session<T>>,
    lane: Arc<Mutex<Lane<T>>>,
    delivered: Mutex<Option<oneshot::Receiver<()>>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new(session: Arc<Session<T>>) -> Self {
        Self {
            session,
            lane: Arc::new(Mutex::new(Lane {
                queue: VecDeque::new(),
                running: false,
            })),
            delivered: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<Session<T>> {
        &self.session
    }

    /// Runs `job` on the calling thread.
    pub fn submit_sync<J: Job<T>>(&self, job: J) -> Result<J::Output, Error> {
        job.validate()?;
        self.session.call(|target| job.execute(target))
    }

    /// Queues `job` for a worker thread and returns immediately.
    ///
    /// Invalid arguments and a closing session are reported here, before
    /// anything is queued.
    pub fn submit<J: Job<T>>(&self, job: J) -> Result<Completion<J::Output>, Error> {
        job.validate()?;
        self.session.ensure_open()?;
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let verb = job.verb();
        let (tx, rx) = oneshot::channel();

        self.session.begin_task();
        let work: Work<T> = Box::new(move |session: &Session<T>| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                session.enter(|target| job.execute(target))?.map_err(Error::Protocol)
            }))
            .unwrap_or_else(|_| {
                error!("Task {} panicked on a worker thread", verb);
                Err(Error::WorkerLost)
            });
            session.end_task();

            if tx.send(result).is_err() {
                debug!("Task {} completed after its completion was dropped", verb);
            }
        });

        let spawn = {
            let mut lane = self.lane.lock();
            lane.queue.push_back(work);
            !mem::replace(&mut lane.running, true)
        };

        if spawn {
            let session = self.session.clone();
            let lane = self.lane.clone();
            runtime.spawn_blocking(move || Self::drain(&session, &lane));
        }

        Ok(Completion { rx })
    }

    /// Queues `job` and calls `on_complete` with its result on the current
    /// [`LocalSet`](tokio::task::LocalSet).
    ///
    /// Callbacks of one dispatcher run in submission order, each exactly
    /// once. On error nothing is queued and `on_complete` is never called.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a `LocalSet`, before `job` is queued.
    pub fn submit_with<J, F>(&self, job: J, on_complete: F) -> Result<(), Error>
    where
        J: Job<T>,
        F: FnOnce(Result<J::Output, Error>) + 'static,
    {
        let (handoff_tx, handoff_rx) = oneshot::channel::<Handoff<J::Output>>();
        tokio::task::spawn_local(async move {
            // Dropped sender: the job was rejected and never queued.
            let Ok((completion, previous, done_tx)) = handoff_rx.await else {
                return;
            };
            let result = completion.await;
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            on_complete(result);
            let _ = done_tx.send(());
        });

        let completion = self.submit(job)?;
        let (done_tx, done_rx) = oneshot::channel();
        let previous = self.delivered.lock().replace(done_rx);
        let _ = handoff_tx.send((completion, previous, done_tx));
        Ok(())
    }

    fn drain(session: &Session<T>, lane: &Mutex<Lane<T>>) {
        loop {
            let work = {
                let mut lane = lane.lock();
                match lane.queue.pop_front() {
                    Some(work) => work,
                    None => {
                        lane.running = false;
                        return;
                    }
                }
            };
            work(session);
        }
    }
}

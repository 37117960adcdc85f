use std::mem;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use protocol::{Operation, Tag};
use tokio::sync::Notify;

use crate::components::AreaKey;
use crate::systems::{AreaGuard, AreaRegistry};
use crate::Error;

/// One remote area access waiting for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteRequest {
    pub sender: Ipv4Addr,
    pub operation: Operation,
    pub tag: Tag,
    /// Bytes written by the remote, or a zero-filled buffer of the requested
    /// size for reads.
    pub data: Vec<u8>,
}

enum Slot {
    Idle,
    Pending(ReadWriteRequest),
    Taken,
    Fulfilled(Option<Vec<u8>>),
}

struct State {
    slot: Slot,
    ticket: u64,
    closed: bool,
}

/// Single-slot handoff between a protocol thread and the host context.
///
/// A protocol thread parks in [`Rendezvous::serve`] until the host completes
/// the request it took with [`Rendezvous::take`]. There is no timeout: a host
/// that keeps a [`PendingRequest`] without completing it stalls that remote
/// request. Dropping a pending request releases the protocol thread with
/// unchanged data and counts as misuse.
pub struct Rendezvous {
    turn: Mutex<()>,
    state: Mutex<State>,
    answered: Condvar,
    wake: Notify,
    registry: Arc<AreaRegistry>,
    misuse: AtomicUsize,
}

impl Rendezvous {
    pub fn new(registry: Arc<AreaRegistry>) -> Self {
        Self {
            turn: Mutex::new(()),
            state: Mutex::new(State {
                slot: Slot::Idle,
                ticket: 0,
                closed: false,
            }),
            answered: Condvar::new(),
            wake: Notify::new(),
            registry,
            misuse: AtomicUsize::new(0),
        }
    }

    /// Protocol-thread side. Blocks until the host completes the request,
    /// then copies the host's answer into `data` for reads.
    pub fn serve(&self, sender: Ipv4Addr, operation: Operation, tag: &Tag, data: &mut [u8]) {
        let _turn = self.turn.lock();

        let mut state = self.state.lock();
        if state.closed {
            debug!("Rendezvous closed, answering {:?} with unchanged data", operation);
            return;
        }

        let payload = match operation {
            Operation::Write => data.to_vec(),
            Operation::Read => vec![0; tag.size()],
        };
        state.ticket += 1;
        state.slot = Slot::Pending(ReadWriteRequest {
            sender,
            operation,
            tag: *tag,
            data: payload,
        });
        self.wake.notify_one();

        self.answered
            .wait_while(&mut state, |state| !matches!(state.slot, Slot::Fulfilled(_)));

        if let Slot::Fulfilled(Some(answer)) = mem::replace(&mut state.slot, Slot::Idle) {
            let len = answer.len().min(data.len());
            data[..len].copy_from_slice(&answer[..len]);
        }
    }

    /// Host side. Takes the waiting request, if any.
    pub fn take(self: &Arc<Self>) -> Option<PendingRequest> {
        let mut state = self.state.lock();
        if !matches!(state.slot, Slot::Pending(_)) {
            return None;
        }

        match mem::replace(&mut state.slot, Slot::Taken) {
            Slot::Pending(request) => Some(PendingRequest {
                request,
                ticket: state.ticket,
                rendezvous: self.clone(),
                completed: false,
            }),
            _ => None,
        }
    }

    /// Resolves once a request is waiting to be taken.
    pub async fn wait(&self) {
        self.wake.notified().await;
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state.lock().slot, Slot::Pending(_) | Slot::Taken)
    }

    /// Releases any waiting protocol thread and answers every later request
    /// with unchanged data.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        if matches!(state.slot, Slot::Pending(_) | Slot::Taken) {
            warn!("Rendezvous shut down with a request in flight, releasing it");
            state.slot = Slot::Fulfilled(None);
            self.answered.notify_all();
        }
    }

    /// Number of requests dropped without completion since the last call.
    pub fn take_misuse(&self) -> usize {
        self.misuse.swap(0, Ordering::AcqRel)
    }

    fn fulfill(&self, ticket: u64, answer: Option<Vec<u8>>) {
        let mut state = self.state.lock();
        if state.ticket != ticket || !matches!(state.slot, Slot::Taken) {
            debug!("Ignoring completion of a released request");
            return;
        }
        state.slot = Slot::Fulfilled(answer);
        self.answered.notify_all();
    }
}

/// A request handed to the host. It must be completed exactly once.
#[must_use = "the protocol thread stays blocked until the request is completed"]
pub struct PendingRequest {
    request: ReadWriteRequest,
    ticket: u64,
    rendezvous: Arc<Rendezvous>,
    completed: bool,
}

impl PendingRequest {
    pub fn request(&self) -> &ReadWriteRequest {
        &self.request
    }

    /// Buffer to populate before [`PendingRequest::complete`] on reads.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.request.data
    }

    /// Answers with the current contents of [`PendingRequest::data_mut`].
    ///
    /// Takes the lock of the matching registered area; while holding an
    /// [`AreaGuard`] on it use [`PendingRequest::respond_locked`].
    pub fn complete(mut self) {
        let data = mem::take(&mut self.request.data);
        self.mirror(None, &data);
        self.finish(Some(data));
    }

    /// Answers with `data`, which must match the requested size. A wrong
    /// length still releases the protocol thread, with unchanged data.
    ///
    /// Takes the area lock like [`PendingRequest::complete`].
    pub fn respond(mut self, data: &[u8]) -> Result<(), Error> {
        self.check_length(data)?;
        self.mirror(None, data);
        self.finish(Some(data.to_vec()));
        Ok(())
    }

    /// Like [`PendingRequest::respond`] for a host that already holds the
    /// area lock. The answer is mirrored through `guard` when it locks the
    /// requested area.
    pub fn respond_locked(mut self, guard: &mut AreaGuard, data: &[u8]) -> Result<(), Error> {
        self.check_length(data)?;
        self.mirror(Some(guard), data);
        self.finish(Some(data.to_vec()));
        Ok(())
    }

    /// Lets the protocol thread continue with its own data.
    pub fn release(mut self) {
        self.finish(None);
    }

    fn check_length(&mut self, data: &[u8]) -> Result<(), Error> {
        let expected = self.request.tag.size();
        if self.request.operation == Operation::Read && data.len() != expected {
            warn!("Rejected read response of {} bytes, {} requested", data.len(), expected);
            self.finish(None);
            return Err(Error::ResponseLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    /// Copies a read answer into the registered area it belongs to.
    fn mirror(&self, guard: Option<&mut AreaGuard>, data: &[u8]) {
        if self.request.operation != Operation::Read {
            return;
        }
        let tag = &self.request.tag;
        let Some(offset) = tag.byte_offset() else {
            return;
        };
        let key = AreaKey::new(tag.area, tag.db_number);

        match guard {
            Some(guard) if guard.key() == key => match guard.get_mut(offset..offset + data.len()) {
                Some(range) => range.copy_from_slice(data),
                None => debug!("Range {}..{} outside of locked area {:?} #{}", offset, offset + data.len(), key.area, key.index),
            },
            _ => {
                self.rendezvous.registry.store(key, offset, data);
            }
        }
    }

    fn finish(&mut self, answer: Option<Vec<u8>>) {
        self.completed = true;

        let answer = match self.request.operation {
            Operation::Read => answer,
            Operation::Write => None,
        };
        self.rendezvous.fulfill(self.ticket, answer);
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if !self.completed {
            warn!("Read/write request from {} dropped without completion", self.request.sender);
            self.rendezvous.misuse.fetch_add(1, Ordering::AcqRel);
            self.finish(None);
        }
    }
}

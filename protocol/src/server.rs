use std::net::Ipv4Addr;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, MutexGuard, RawMutex};

use crate::{Area, CpuStatus, ErrorCode, Operation, Param, ServerStatus, SrvEvent, WordLen};

/// Largest buffer that can back a registered area.
pub const MAX_AREA_SIZE: usize = 0xFFFF;

pub type EventCallback = Arc<dyn Fn(&SrvEvent) + Send + Sync>;

/// Invoked on a protocol thread for every area access while the server runs
/// in resourceless mode. For reads the callback fills `data`; for writes
/// `data` holds what the remote wrote.
pub type ReadWriteCallback = Arc<dyn Fn(Ipv4Addr, Operation, &Tag, &mut [u8]) -> Result<(), ErrorCode> + Send + Sync>;

/// Location of one area access requested by a remote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub area: Area,
    pub db_number: u16,
    pub start: u32,
    pub amount: u32,
    pub word_len: WordLen,
}

impl Tag {
    /// Bytes moved by the access.
    pub fn size(&self) -> usize {
        self.amount as usize * self.word_len.size()
    }

    /// Byte offset of the access inside its area. Counters and timers are
    /// addressed by element, bit accesses have no byte offset.
    pub fn byte_offset(&self) -> Option<usize> {
        match self.word_len {
            WordLen::Bit => None,
            WordLen::Counter | WordLen::Timer => Some(self.start as usize * self.word_len.size()),
            _ => Some(self.start as usize),
        }
    }
}

/// Fixed-size memory backing one registered area.
///
/// The buffer is shared with the library, which locks it for every access it
/// serves, so host reads and writes done under the same lock are atomic with
/// respect to remote traffic.
#[derive(Clone)]
pub struct AreaBuffer {
    data: Arc<Mutex<Box<[u8]>>>,
    len: usize,
}

impl AreaBuffer {
    pub fn new(initial: &[u8]) -> Self {
        Self {
            data: Arc::new(Mutex::new(initial.into())),
            len: initial.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn lock(&self) -> MutexGuard<'_, Box<[u8]>> {
        self.data.lock()
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, Box<[u8]>>> {
        self.data.try_lock()
    }

    /// Lock guard that keeps the buffer alive on its own.
    pub fn lock_arc(&self) -> ArcMutexGuard<RawMutex, Box<[u8]>> {
        self.data.lock_arc()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().to_vec()
    }

    pub fn ptr_eq(&self, other: &AreaBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for AreaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AreaBuffer").field("len", &self.len).finish()
    }
}

/// Blocking server side of the communication library.
///
/// The library runs its own listener and worker threads once started; the
/// callbacks installed here are invoked from those threads.
pub trait PlcServer: Send + 'static {
    fn start(&mut self) -> Result<(), ErrorCode>;

    fn start_to(&mut self, address: &str) -> Result<(), ErrorCode>;

    fn stop(&mut self) -> Result<(), ErrorCode>;

    fn set_events_callback(&mut self, callback: Option<EventCallback>) -> Result<(), ErrorCode>;

    /// Installing a callback switches the server to resourceless mode.
    fn set_read_write_callback(&mut self, callback: Option<ReadWriteCallback>) -> Result<(), ErrorCode>;

    fn register_area(&mut self, area: Area, index: u16, buffer: AreaBuffer) -> Result<(), ErrorCode>;

    fn unregister_area(&mut self, area: Area, index: u16) -> Result<(), ErrorCode>;

    fn events_mask(&self) -> u32;

    fn set_events_mask(&mut self, mask: u32);

    fn get_param(&self, _param: Param) -> Result<i32, ErrorCode> {
        Err(ErrorCode::SRV_INVALID_PARAM_NUMBER)
    }

    fn set_param(&mut self, _param: Param, _value: i32) -> Result<(), ErrorCode> {
        Err(ErrorCode::SRV_INVALID_PARAM_NUMBER)
    }

    fn status(&self) -> ServerStatus;

    fn clients_count(&self) -> usize {
        0
    }

    fn cpu_status(&self) -> CpuStatus {
        CpuStatus::Unknown
    }

    fn set_cpu_status(&mut self, _status: CpuStatus) -> Result<(), ErrorCode> {
        Err(ErrorCode::SRV_INVALID_PARAMS)
    }

    fn last_error(&self) -> ErrorCode {
        ErrorCode::OK
    }
}

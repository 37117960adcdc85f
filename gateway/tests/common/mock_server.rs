use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use protocol::{
    Area, AreaBuffer, CpuStatus, ErrorCode, EventCallback, EventCode, Operation, PlcServer, ReadWriteCallback,
    ServerStatus, SrvEvent, Tag, WordLen,
};

const NOT_RUNNING: ErrorCode = ErrorCode(0x0009);

struct Shared {
    events: Mutex<Option<EventCallback>>,
    read_write: Mutex<Option<ReadWriteCallback>>,
    areas: Mutex<HashMap<(Area, u16), AreaBuffer>>,
    mask: AtomicU32,
    status: Mutex<ServerStatus>,
    cpu: Mutex<CpuStatus>,
    /// Code returned once by the next area or callback call.
    fail_with: Mutex<Option<ErrorCode>>,
}

impl Shared {
    fn emit(&self, event: SrvEvent) {
        if self.mask.load(Ordering::Acquire) & event.code == 0 {
            return;
        }
        let callback = self.events.lock().clone();
        if let Some(callback) = callback {
            callback(&event);
        }
    }

    fn set_status(&self, status: ServerStatus) {
        *self.status.lock() = status;
    }

    fn injected(&self) -> Result<(), ErrorCode> {
        match self.fail_with.lock().take() {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }
}

/// Library server simulation. Remote traffic is driven through [`Remote`].
pub struct MockServer {
    shared: Arc<Shared>,
}

impl MockServer {
    pub fn new() -> (Self, Remote) {
        let shared = Arc::new(Shared {
            events: Mutex::new(None),
            read_write: Mutex::new(None),
            areas: Mutex::new(HashMap::new()),
            mask: AtomicU32::new(EventCode::ALL),
            status: Mutex::new(ServerStatus::Stopped),
            cpu: Mutex::new(CpuStatus::Run),
            fail_with: Mutex::new(None),
        });
        let remote = Remote {
            shared: shared.clone(),
            sender: Ipv4Addr::new(192, 168, 0, 10),
        };
        (Self { shared }, remote)
    }
}

impl PlcServer for MockServer {
    fn start(&mut self) -> Result<(), ErrorCode> {
        self.start_to("0.0.0.0")
    }

    fn start_to(&mut self, address: &str) -> Result<(), ErrorCode> {
        if address.parse::<Ipv4Addr>().is_err() {
            self.shared
                .emit(SrvEvent::new(Ipv4Addr::UNSPECIFIED, EventCode::LISTENER_CANNOT_START));
            return Err(ErrorCode::SRV_CANNOT_START);
        }
        self.shared.set_status(ServerStatus::Running);
        self.shared
            .emit(SrvEvent::new(Ipv4Addr::UNSPECIFIED, EventCode::SERVER_STARTED));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ErrorCode> {
        self.shared.set_status(ServerStatus::Stopped);
        self.shared
            .emit(SrvEvent::new(Ipv4Addr::UNSPECIFIED, EventCode::SERVER_STOPPED));
        Ok(())
    }

    fn set_events_callback(&mut self, callback: Option<EventCallback>) -> Result<(), ErrorCode> {
        self.shared.injected()?;
        *self.shared.events.lock() = callback;
        Ok(())
    }

    fn set_read_write_callback(&mut self, callback: Option<ReadWriteCallback>) -> Result<(), ErrorCode> {
        self.shared.injected()?;
        *self.shared.read_write.lock() = callback;
        Ok(())
    }

    fn register_area(&mut self, area: Area, index: u16, buffer: AreaBuffer) -> Result<(), ErrorCode> {
        self.shared.injected()?;
        let mut areas = self.shared.areas.lock();
        if areas.contains_key(&(area, index)) {
            return Err(ErrorCode::SRV_AREA_ALREADY_EXISTS);
        }
        areas.insert((area, index), buffer);
        Ok(())
    }

    fn unregister_area(&mut self, area: Area, index: u16) -> Result<(), ErrorCode> {
        self.shared.injected()?;
        self.shared
            .areas
            .lock()
            .remove(&(area, index))
            .map(|_| ())
            .ok_or(ErrorCode::SRV_UNKNOWN_AREA)
    }

    fn events_mask(&self) -> u32 {
        self.shared.mask.load(Ordering::Acquire)
    }

    fn set_events_mask(&mut self, mask: u32) {
        self.shared.mask.store(mask, Ordering::Release);
    }

    fn status(&self) -> ServerStatus {
        *self.shared.status.lock()
    }

    fn cpu_status(&self) -> CpuStatus {
        *self.shared.cpu.lock()
    }

    fn set_cpu_status(&mut self, status: CpuStatus) -> Result<(), ErrorCode> {
        *self.shared.cpu.lock() = status;
        Ok(())
    }
}

/// A remote peer talking to a [`MockServer`]. Every call runs on the calling
/// thread, the way the library serves each connection on its own thread.
#[derive(Clone)]
pub struct Remote {
    shared: Arc<Shared>,
    sender: Ipv4Addr,
}

impl Remote {
    pub fn with_sender(&self, sender: Ipv4Addr) -> Self {
        Self {
            shared: self.shared.clone(),
            sender,
        }
    }

    pub fn emit(&self, code: u32) {
        self.shared.emit(SrvEvent::new(self.sender, code));
    }

    pub fn emit_with_params(&self, code: u32, params: [u16; 4]) {
        self.shared
            .emit(SrvEvent::new(self.sender, code).with_params(params));
    }

    /// Makes the next area or callback call fail with `code`.
    pub fn fail_next(&self, code: ErrorCode) {
        *self.shared.fail_with.lock() = Some(code);
    }

    fn tag(area: Area, index: u16, start: u32, amount: u32, word_len: WordLen) -> Tag {
        Tag {
            area,
            db_number: index,
            start,
            amount,
            word_len,
        }
    }

    fn ensure_running(&self) -> Result<(), ErrorCode> {
        match *self.shared.status.lock() {
            ServerStatus::Running => Ok(()),
            _ => Err(NOT_RUNNING),
        }
    }

    pub fn read(&self, area: Area, index: u16, start: u32, size: usize) -> Result<Vec<u8>, ErrorCode> {
        self.read_elements(area, index, start, size as u32, WordLen::Byte)
    }

    /// Reads `amount` elements of `word_len`, the way counters and timers
    /// are addressed by element index.
    pub fn read_elements(
        &self,
        area: Area,
        index: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
    ) -> Result<Vec<u8>, ErrorCode> {
        self.ensure_running()?;
        let tag = Self::tag(area, index, start, amount, word_len);
        let size = tag.size();
        let mut data = vec![0; size];

        let callback = self.shared.read_write.lock().clone();
        match callback {
            Some(callback) => {
                callback(self.sender, Operation::Read, &tag, &mut data)?;
            }
            None => {
                let buffer = self.area(area, index)?;
                let memory = buffer.lock();
                let start = tag.byte_offset().ok_or(ErrorCode::SRV_INVALID_PARAMS)?;
                let source = memory
                    .get(start..start + size)
                    .ok_or(ErrorCode::SRV_INVALID_PARAMS)?;
                data.copy_from_slice(source);
            }
        }

        self.shared
            .emit(SrvEvent::new(self.sender, EventCode::DATA_READ).with_params([area.server_code() as u16, index, 0, 0]));
        Ok(data)
    }

    pub fn write(&self, area: Area, index: u16, start: u32, data: &[u8]) -> Result<(), ErrorCode> {
        self.ensure_running()?;

        let callback = self.shared.read_write.lock().clone();
        match callback {
            Some(callback) => {
                let tag = Self::tag(area, index, start, data.len() as u32, WordLen::Byte);
                let mut data = data.to_vec();
                callback(self.sender, Operation::Write, &tag, &mut data)?;
            }
            None => {
                let buffer = self.area(area, index)?;
                let mut memory = buffer.lock();
                let start = start as usize;
                let target = memory
                    .get_mut(start..start + data.len())
                    .ok_or(ErrorCode::SRV_INVALID_PARAMS)?;
                target.copy_from_slice(data);
            }
        }

        self.shared
            .emit(SrvEvent::new(self.sender, EventCode::DATA_WRITE).with_params([area.server_code() as u16, index, 0, 0]));
        Ok(())
    }

    pub fn registered(&self, area: Area, index: u16) -> bool {
        self.shared.areas.lock().contains_key(&(area, index))
    }

    fn area(&self, area: Area, index: u16) -> Result<AreaBuffer, ErrorCode> {
        self.shared
            .areas
            .lock()
            .get(&(area, index))
            .cloned()
            .ok_or(ErrorCode::SRV_UNKNOWN_AREA)
    }
}

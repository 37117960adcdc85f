use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use protocol::{Area, BlockType, BlocksList, CpuStatus, ErrorCode, PlcClient, WordLen};

const AREA_SIZE: usize = 1024;
const NOT_CONNECTED: ErrorCode = ErrorCode(0x0009);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Disconnect,
    Read { area: Area, start: u32, len: usize },
    Write { area: Area, start: u32, data: Vec<u8> },
    Other(&'static str),
}

/// Handle shared with the test to inspect and steer a [`MockClient`].
#[derive(Clone, Default)]
pub struct Controls {
    pub journal: Arc<Mutex<Vec<Call>>>,
    pub delays: Arc<Mutex<VecDeque<Duration>>>,
    pub fail_with: Arc<Mutex<Option<ErrorCode>>>,
    busy: Arc<AtomicBool>,
}

impl Controls {
    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().clone()
    }

    pub fn delay_next(&self, delays: impl IntoIterator<Item = u64>) {
        self.delays
            .lock()
            .extend(delays.into_iter().map(Duration::from_millis));
    }

    pub fn fail_next(&self, code: ErrorCode) {
        *self.fail_with.lock() = Some(code);
    }
}

/// Controller simulation backing the client side of the tests.
pub struct MockClient {
    controls: Controls,
    memory: HashMap<(Area, u16), Vec<u8>>,
    connected: bool,
}

impl MockClient {
    pub fn new() -> (Self, Controls) {
        let controls = Controls::default();
        let client = Self {
            controls: controls.clone(),
            memory: HashMap::new(),
            connected: false,
        };
        (client, controls)
    }

    /// Runs `f` as one library call: flags overlapping calls, applies the
    /// injected delay and failure.
    fn call<R>(&mut self, call: Call, f: impl FnOnce(&mut Self) -> Result<R, ErrorCode>) -> Result<R, ErrorCode> {
        assert!(
            !self.controls.busy.swap(true, Ordering::AcqRel),
            "library client entered concurrently"
        );

        let delay = self.controls.delays.lock().pop_front();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.controls.journal.lock().push(call);

        let failure = self.controls.fail_with.lock().take();
        let result = match failure {
            Some(code) => Err(code),
            None => f(self),
        };

        self.controls.busy.store(false, Ordering::Release);
        result
    }

    fn area(&mut self, area: Area, db_number: u16) -> &mut Vec<u8> {
        let index = if area == Area::Db { db_number } else { 0 };
        self.memory
            .entry((area, index))
            .or_insert_with(|| vec![0; AREA_SIZE])
    }

    fn range(start: u32, amount: u32, word_len: WordLen) -> std::ops::Range<usize> {
        let start = match word_len {
            WordLen::Bit => start as usize / 8,
            WordLen::Counter | WordLen::Timer => start as usize * word_len.size(),
            _ => start as usize,
        };
        start..start + amount as usize * word_len.size()
    }
}

impl PlcClient for MockClient {
    fn connect(&mut self) -> Result<(), ErrorCode> {
        self.connect_to("default", 0, 1)
    }

    fn connect_to(&mut self, address: &str, _rack: u16, _slot: u16) -> Result<(), ErrorCode> {
        self.call(Call::Connect(address.to_owned()), |client| {
            client.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Result<(), ErrorCode> {
        self.call(Call::Disconnect, |client| {
            client.connected = false;
            Ok(())
        })
    }

    fn read_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &mut [u8],
    ) -> Result<(), ErrorCode> {
        let call = Call::Read {
            area,
            start,
            len: buffer.len(),
        };
        self.call(call, |client| {
            if !client.connected {
                return Err(NOT_CONNECTED);
            }
            let range = Self::range(start, amount, word_len);
            let source = client
                .area(area, db_number)
                .get(range)
                .ok_or(ErrorCode::CLI_ADDRESS_OUT_OF_RANGE)?;
            buffer.copy_from_slice(source);
            Ok(())
        })
    }

    fn write_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &[u8],
    ) -> Result<(), ErrorCode> {
        let call = Call::Write {
            area,
            start,
            data: buffer.to_vec(),
        };
        self.call(call, |client| {
            if !client.connected {
                return Err(NOT_CONNECTED);
            }
            let range = Self::range(start, amount, word_len);
            let len = range.len();
            let target = client
                .area(area, db_number)
                .get_mut(range)
                .ok_or(ErrorCode::CLI_ADDRESS_OUT_OF_RANGE)?;
            target.copy_from_slice(&buffer[..len]);
            Ok(())
        })
    }

    fn list_blocks(&mut self) -> Result<BlocksList, ErrorCode> {
        self.call(Call::Other("list_blocks"), |client| {
            let db = client.memory.keys().filter(|(area, _)| *area == Area::Db).count();
            Ok(BlocksList {
                ob: 1,
                db: db as u32,
                ..Default::default()
            })
        })
    }

    fn list_blocks_of_type(&mut self, block_type: BlockType, list: &mut [u16]) -> Result<usize, ErrorCode> {
        self.call(Call::Other("list_blocks_of_type"), |client| {
            if block_type != BlockType::Db {
                return Ok(0);
            }
            let mut numbers = client
                .memory
                .keys()
                .filter(|(area, _)| *area == Area::Db)
                .map(|(_, index)| *index)
                .collect::<Vec<_>>();
            numbers.sort();
            let count = numbers.len().min(list.len());
            list[..count].copy_from_slice(&numbers[..count]);
            Ok(count)
        })
    }

    fn db_get(&mut self, db_number: u16, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        self.call(Call::Other("db_get"), |client| {
            let area = client.area(Area::Db, db_number);
            let len = area.len().min(buffer.len());
            buffer[..len].copy_from_slice(&area[..len]);
            Ok(len)
        })
    }

    fn plc_status(&mut self) -> Result<CpuStatus, ErrorCode> {
        self.call(Call::Other("plc_status"), |_| Ok(CpuStatus::Run))
    }

    fn connected(&self) -> bool {
        self.connected
    }

    fn pdu_length(&self) -> u16 {
        if self.connected {
            480
        } else {
            0
        }
    }
}

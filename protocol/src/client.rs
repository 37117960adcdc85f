use std::time::{Duration, SystemTime};

use crate::{Area, BlockType, ConnectionType, CpuStatus, ErrorCode, Param, WordLen};

/// Address of one variable in a multi-variable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarSpec {
    pub area: Area,
    pub word_len: WordLen,
    pub db_number: u16,
    pub start: u32,
    pub amount: u32,
}

impl VarSpec {
    pub fn new(area: Area, db_number: u16, start: u32, amount: u32, word_len: WordLen) -> Self {
        Self {
            area,
            word_len,
            db_number,
            start,
            amount,
        }
    }

    /// Bytes covered by the variable.
    pub fn byte_len(&self) -> usize {
        self.amount as usize * self.word_len.size()
    }
}

pub struct ReadVar<'a> {
    pub spec: VarSpec,
    pub data: &'a mut [u8],
    pub result: ErrorCode,
}

pub struct WriteVar<'a> {
    pub spec: VarSpec,
    pub data: &'a [u8],
    pub result: ErrorCode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlocksList {
    pub ob: u32,
    pub fb: u32,
    pub fc: u32,
    pub sfb: u32,
    pub sfc: u32,
    pub db: u32,
    pub sdb: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_type: u8,
    pub block_number: u16,
    pub block_lang: u8,
    pub block_flags: u8,
    pub mc7_size: u32,
    pub load_size: u32,
    pub local_data: u32,
    pub sbb_length: u32,
    pub checksum: u16,
    pub version: u8,
    pub code_date: String,
    pub intf_date: String,
    pub author: String,
    pub family: String,
    pub header: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCode {
    pub code: String,
    pub v1: u8,
    pub v2: u8,
    pub v3: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub module_type_name: String,
    pub serial_number: String,
    pub as_name: String,
    pub copyright: String,
    pub module_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpInfo {
    pub max_pdu_length: u32,
    pub max_connections: u32,
    pub max_mpi_rate: u32,
    pub max_bus_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protection {
    pub sch_schal: u16,
    pub sch_par: u16,
    pub sch_rel: u16,
    pub bart_sch: u16,
    pub anl_sch: u16,
}

/// Blocking client side of the communication library.
///
/// Implementations are not expected to tolerate concurrent calls; callers
/// serialize access. Every call returns the library's status code verbatim
/// on failure. Optional capabilities default to
/// [`ErrorCode::CLI_FUN_NOT_AVAILABLE`].
pub trait PlcClient: Send + 'static {
    fn connect(&mut self) -> Result<(), ErrorCode>;

    fn connect_to(&mut self, address: &str, rack: u16, slot: u16) -> Result<(), ErrorCode>;

    fn disconnect(&mut self) -> Result<(), ErrorCode>;

    fn read_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &mut [u8],
    ) -> Result<(), ErrorCode>;

    fn write_area(
        &mut self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        buffer: &[u8],
    ) -> Result<(), ErrorCode>;

    /// Reads every item, recording each status in `result`.
    fn read_multi_vars(&mut self, items: &mut [ReadVar<'_>]) -> Result<(), ErrorCode> {
        for item in items.iter_mut() {
            let spec = item.spec;
            item.result = self
                .read_area(spec.area, spec.db_number, spec.start, spec.amount, spec.word_len, item.data)
                .err()
                .unwrap_or_default();
        }
        Ok(())
    }

    /// Writes every item, recording each status in `result`.
    fn write_multi_vars(&mut self, items: &mut [WriteVar<'_>]) -> Result<(), ErrorCode> {
        for item in items.iter_mut() {
            let spec = item.spec;
            item.result = self
                .write_area(spec.area, spec.db_number, spec.start, spec.amount, spec.word_len, item.data)
                .err()
                .unwrap_or_default();
        }
        Ok(())
    }

    fn set_connection_params(&mut self, _address: &str, _local_tsap: u16, _remote_tsap: u16) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn set_connection_type(&mut self, _connection_type: ConnectionType) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn get_param(&self, _param: Param) -> Result<i32, ErrorCode> {
        Err(ErrorCode::CLI_INVALID_PARAM_NUMBER)
    }

    fn set_param(&mut self, _param: Param, _value: i32) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_INVALID_PARAM_NUMBER)
    }

    fn list_blocks(&mut self) -> Result<BlocksList, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    /// Fills `list` with block numbers and returns how many were found.
    fn list_blocks_of_type(&mut self, _block_type: BlockType, _list: &mut [u16]) -> Result<usize, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn get_ag_block_info(&mut self, _block_type: BlockType, _number: u16) -> Result<BlockInfo, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    /// Uploads the block body into `buffer` and returns its size.
    fn upload(&mut self, _block_type: BlockType, _number: u16, _buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    /// Uploads the complete block, header and footer included.
    fn full_upload(&mut self, _block_type: BlockType, _number: u16, _buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn download(&mut self, _number: u16, _data: &[u8]) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn delete(&mut self, _block_type: BlockType, _number: u16) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn db_get(&mut self, _db_number: u16, _buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn db_fill(&mut self, _db_number: u16, _fill: u8) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn plc_date_time(&mut self) -> Result<SystemTime, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn set_plc_date_time(&mut self, _time: SystemTime) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn set_plc_system_date_time(&mut self) -> Result<(), ErrorCode> {
        self.set_plc_date_time(SystemTime::now())
    }

    fn order_code(&mut self) -> Result<OrderCode, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn cpu_info(&mut self) -> Result<CpuInfo, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn cp_info(&mut self) -> Result<CpInfo, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn plc_status(&mut self) -> Result<CpuStatus, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn plc_hot_start(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn plc_cold_start(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn plc_stop(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn copy_ram_to_rom(&mut self, _timeout: Duration) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn compress(&mut self, _timeout: Duration) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn protection(&mut self) -> Result<Protection, ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn set_session_password(&mut self, _password: &str) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn clear_session_password(&mut self) -> Result<(), ErrorCode> {
        Err(ErrorCode::CLI_FUN_NOT_AVAILABLE)
    }

    fn connected(&self) -> bool;

    fn pdu_length(&self) -> u16 {
        0
    }

    /// Duration of the last completed job.
    fn exec_time(&self) -> Duration {
        Duration::ZERO
    }

    fn last_error(&self) -> ErrorCode {
        ErrorCode::OK
    }
}

use std::time::{Duration, SystemTime};

use bytes::{Bytes, BytesMut};
use protocol::{
    Area, BlockInfo, BlockType, BlocksList, CpInfo, CpuInfo, CpuStatus, ErrorCode, OrderCode, PlcClient,
    Protection, ReadVar, VarSpec, WordLen, WriteVar, MAX_VARS,
};

use crate::Error;

/// Unit of work run against a session's wrapped object.
pub trait Job<T>: Send + 'static {
    type Output: Send + 'static;

    fn verb(&self) -> &'static str;

    /// Checks the arguments before any worker is involved.
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }

    fn execute(self, target: &mut T) -> Result<Self::Output, ErrorCode>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteItem {
    pub spec: VarSpec,
    pub data: Bytes,
}

/// Per-item result of a multi-variable read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub result: ErrorCode,
    pub data: Bytes,
}

/// Client verbs.
#[derive(Debug, Clone)]
pub enum Task {
    Connect,
    ConnectTo { address: String, rack: u16, slot: u16 },
    Disconnect,
    ReadArea { spec: VarSpec },
    WriteArea { spec: VarSpec, data: Bytes },
    ReadMultiVars { items: Vec<VarSpec> },
    WriteMultiVars { items: Vec<WriteItem> },
    ListBlocks,
    ListBlocksOfType { block_type: BlockType },
    GetAgBlockInfo { block_type: BlockType, number: u16 },
    Upload { block_type: BlockType, number: u16, size: usize },
    FullUpload { block_type: BlockType, number: u16, size: usize },
    Download { number: u16, data: Bytes },
    Delete { block_type: BlockType, number: u16 },
    DbGet { db_number: u16, size: usize },
    DbFill { db_number: u16, fill: u8 },
    GetPlcDateTime,
    SetPlcDateTime { time: SystemTime },
    SetPlcSystemDateTime,
    GetOrderCode,
    GetCpuInfo,
    GetCpInfo,
    PlcStatus,
    PlcHotStart,
    PlcColdStart,
    PlcStop,
    CopyRamToRom { timeout: Duration },
    Compress { timeout: Duration },
    GetProtection,
    SetSessionPassword { password: String },
    ClearSessionPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Bytes(Bytes),
    Items(Vec<ItemResult>),
    Statuses(Vec<ErrorCode>),
    Blocks(BlocksList),
    BlockNumbers(Vec<u16>),
    BlockInfo(BlockInfo),
    DateTime(SystemTime),
    OrderCode(OrderCode),
    CpuInfo(CpuInfo),
    CpInfo(CpInfo),
    CpuStatus(CpuStatus),
    Protection(Protection),
}

impl Outcome {
    pub fn into_done(self) -> Option<()> {
        matches!(self, Outcome::Done).then_some(())
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Outcome::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_items(self) -> Option<Vec<ItemResult>> {
        match self {
            Outcome::Items(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_statuses(self) -> Option<Vec<ErrorCode>> {
        match self {
            Outcome::Statuses(statuses) => Some(statuses),
            _ => None,
        }
    }

    pub fn into_blocks(self) -> Option<BlocksList> {
        match self {
            Outcome::Blocks(blocks) => Some(blocks),
            _ => None,
        }
    }

    pub fn into_block_numbers(self) -> Option<Vec<u16>> {
        match self {
            Outcome::BlockNumbers(numbers) => Some(numbers),
            _ => None,
        }
    }

    pub fn into_block_info(self) -> Option<BlockInfo> {
        match self {
            Outcome::BlockInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn into_date_time(self) -> Option<SystemTime> {
        match self {
            Outcome::DateTime(time) => Some(time),
            _ => None,
        }
    }

    pub fn into_order_code(self) -> Option<OrderCode> {
        match self {
            Outcome::OrderCode(code) => Some(code),
            _ => None,
        }
    }

    pub fn into_cpu_info(self) -> Option<CpuInfo> {
        match self {
            Outcome::CpuInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn into_cp_info(self) -> Option<CpInfo> {
        match self {
            Outcome::CpInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn into_cpu_status(self) -> Option<CpuStatus> {
        match self {
            Outcome::CpuStatus(status) => Some(status),
            _ => None,
        }
    }

    pub fn into_protection(self) -> Option<Protection> {
        match self {
            Outcome::Protection(protection) => Some(protection),
            _ => None,
        }
    }
}

impl Task {
    /// Capacity of the list filled by [`Task::ListBlocksOfType`].
    pub const MAX_BLOCKS_OF_TYPE: usize = 0x2000;

    const MAX_PASSWORD_LEN: usize = 8;

    pub fn read_area(area: Area, db_number: u16, start: u32, amount: u32, word_len: WordLen) -> Self {
        Task::ReadArea {
            spec: VarSpec::new(area, db_number, start, amount, word_len),
        }
    }

    pub fn write_area(
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        data: impl Into<Bytes>,
    ) -> Self {
        Task::WriteArea {
            spec: VarSpec::new(area, db_number, start, amount, word_len),
            data: data.into(),
        }
    }

    fn validate_spec(spec: &VarSpec) -> Result<(), Error> {
        match spec.amount {
            0 => Err(Error::InvalidArgument("amount must be at least 1")),
            _ => Ok(()),
        }
    }

    fn validate_write(spec: &VarSpec, data: &Bytes) -> Result<(), Error> {
        Self::validate_spec(spec)?;
        let expected = spec.byte_len();
        if data.len() < expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn validate_batch(len: usize) -> Result<(), Error> {
        match len {
            0 => Err(Error::EmptyBatch),
            len if len > MAX_VARS => Err(Error::TooManyItems(len)),
            _ => Ok(()),
        }
    }
}

impl<C: PlcClient> Job<C> for Task {
    type Output = Outcome;

    fn verb(&self) -> &'static str {
        match self {
            Task::Connect => "Connect",
            Task::ConnectTo { .. } => "ConnectTo",
            Task::Disconnect => "Disconnect",
            Task::ReadArea { .. } => "ReadArea",
            Task::WriteArea { .. } => "WriteArea",
            Task::ReadMultiVars { .. } => "ReadMultiVars",
            Task::WriteMultiVars { .. } => "WriteMultiVars",
            Task::ListBlocks => "ListBlocks",
            Task::ListBlocksOfType { .. } => "ListBlocksOfType",
            Task::GetAgBlockInfo { .. } => "GetAgBlockInfo",
            Task::Upload { .. } => "Upload",
            Task::FullUpload { .. } => "FullUpload",
            Task::Download { .. } => "Download",
            Task::Delete { .. } => "Delete",
            Task::DbGet { .. } => "DBGet",
            Task::DbFill { .. } => "DBFill",
            Task::GetPlcDateTime => "GetPlcDateTime",
            Task::SetPlcDateTime { .. } => "SetPlcDateTime",
            Task::SetPlcSystemDateTime => "SetPlcSystemDateTime",
            Task::GetOrderCode => "GetOrderCode",
            Task::GetCpuInfo => "GetCpuInfo",
            Task::GetCpInfo => "GetCpInfo",
            Task::PlcStatus => "PlcStatus",
            Task::PlcHotStart => "PlcHotStart",
            Task::PlcColdStart => "PlcColdStart",
            Task::PlcStop => "PlcStop",
            Task::CopyRamToRom { .. } => "CopyRamToRom",
            Task::Compress { .. } => "Compress",
            Task::GetProtection => "GetProtection",
            Task::SetSessionPassword { .. } => "SetSessionPassword",
            Task::ClearSessionPassword => "ClearSessionPassword",
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match self {
            Task::ConnectTo { address, .. } if address.trim().is_empty() => {
                Err(Error::InvalidArgument("address must not be empty"))
            }
            Task::ReadArea { spec } => Self::validate_spec(spec),
            Task::WriteArea { spec, data } => Self::validate_write(spec, data),
            Task::ReadMultiVars { items } => {
                Self::validate_batch(items.len())?;
                items.iter().try_for_each(Self::validate_spec)
            }
            Task::WriteMultiVars { items } => {
                Self::validate_batch(items.len())?;
                items
                    .iter()
                    .try_for_each(|item| Self::validate_write(&item.spec, &item.data))
            }
            Task::Upload { size: 0, .. } | Task::FullUpload { size: 0, .. } | Task::DbGet { size: 0, .. } => {
                Err(Error::InvalidArgument("buffer size must be at least 1"))
            }
            Task::Download { data, .. } if data.is_empty() => Err(Error::InvalidArgument("block data must not be empty")),
            Task::CopyRamToRom { timeout } | Task::Compress { timeout } if timeout.is_zero() => {
                Err(Error::InvalidArgument("timeout must be positive"))
            }
            Task::SetSessionPassword { password } if password.is_empty() || password.len() > Self::MAX_PASSWORD_LEN => {
                Err(Error::InvalidArgument("password must be 1 to 8 characters"))
            }
            _ => Ok(()),
        }
    }

    fn execute(self, client: &mut C) -> Result<Outcome, ErrorCode> {
        let outcome = match self {
            Task::Connect => client.connect().map(|_| Outcome::Done)?,
            Task::ConnectTo { address, rack, slot } => client.connect_to(&address, rack, slot).map(|_| Outcome::Done)?,
            Task::Disconnect => client.disconnect().map(|_| Outcome::Done)?,
            Task::ReadArea { spec } => {
                let mut buffer = BytesMut::zeroed(spec.byte_len());
                client.read_area(spec.area, spec.db_number, spec.start, spec.amount, spec.word_len, &mut buffer)?;
                Outcome::Bytes(buffer.freeze())
            }
            Task::WriteArea { spec, data } => {
                client.write_area(spec.area, spec.db_number, spec.start, spec.amount, spec.word_len, &data)?;
                Outcome::Done
            }
            Task::ReadMultiVars { items } => {
                let mut buffers = items
                    .iter()
                    .map(|spec| BytesMut::zeroed(spec.byte_len()))
                    .collect::<Vec<_>>();
                let mut vars = items
                    .iter()
                    .zip(buffers.iter_mut())
                    .map(|(spec, data)| ReadVar {
                        spec: *spec,
                        data: &mut data[..],
                        result: ErrorCode::OK,
                    })
                    .collect::<Vec<_>>();

                client.read_multi_vars(&mut vars)?;

                let results = vars.iter().map(|var| var.result).collect::<Vec<_>>();
                Outcome::Items(
                    results
                        .into_iter()
                        .zip(buffers)
                        .map(|(result, data)| ItemResult {
                            result,
                            data: data.freeze(),
                        })
                        .collect(),
                )
            }
            Task::WriteMultiVars { items } => {
                let mut vars = items
                    .iter()
                    .map(|item| WriteVar {
                        spec: item.spec,
                        data: &item.data[..],
                        result: ErrorCode::OK,
                    })
                    .collect::<Vec<_>>();

                client.write_multi_vars(&mut vars)?;
                Outcome::Statuses(vars.iter().map(|var| var.result).collect())
            }
            Task::ListBlocks => Outcome::Blocks(client.list_blocks()?),
            Task::ListBlocksOfType { block_type } => {
                let mut list = vec![0u16; Self::MAX_BLOCKS_OF_TYPE];
                let count = client.list_blocks_of_type(block_type, &mut list)?;
                list.truncate(count);
                Outcome::BlockNumbers(list)
            }
            Task::GetAgBlockInfo { block_type, number } => Outcome::BlockInfo(client.get_ag_block_info(block_type, number)?),
            Task::Upload { block_type, number, size } => {
                let mut buffer = BytesMut::zeroed(size);
                let used = client.upload(block_type, number, &mut buffer)?;
                buffer.truncate(used);
                Outcome::Bytes(buffer.freeze())
            }
            Task::FullUpload { block_type, number, size } => {
                let mut buffer = BytesMut::zeroed(size);
                let used = client.full_upload(block_type, number, &mut buffer)?;
                buffer.truncate(used);
                Outcome::Bytes(buffer.freeze())
            }
            Task::Download { number, data } => client.download(number, &data).map(|_| Outcome::Done)?,
            Task::Delete { block_type, number } => client.delete(block_type, number).map(|_| Outcome::Done)?,
            Task::DbGet { db_number, size } => {
                let mut buffer = BytesMut::zeroed(size);
                let used = client.db_get(db_number, &mut buffer)?;
                buffer.truncate(used);
                Outcome::Bytes(buffer.freeze())
            }
            Task::DbFill { db_number, fill } => client.db_fill(db_number, fill).map(|_| Outcome::Done)?,
            Task::GetPlcDateTime => Outcome::DateTime(client.plc_date_time()?),
            Task::SetPlcDateTime { time } => client.set_plc_date_time(time).map(|_| Outcome::Done)?,
            Task::SetPlcSystemDateTime => client.set_plc_system_date_time().map(|_| Outcome::Done)?,
            Task::GetOrderCode => Outcome::OrderCode(client.order_code()?),
            Task::GetCpuInfo => Outcome::CpuInfo(client.cpu_info()?),
            Task::GetCpInfo => Outcome::CpInfo(client.cp_info()?),
            Task::PlcStatus => Outcome::CpuStatus(client.plc_status()?),
            Task::PlcHotStart => client.plc_hot_start().map(|_| Outcome::Done)?,
            Task::PlcColdStart => client.plc_cold_start().map(|_| Outcome::Done)?,
            Task::PlcStop => client.plc_stop().map(|_| Outcome::Done)?,
            Task::CopyRamToRom { timeout } => client.copy_ram_to_rom(timeout).map(|_| Outcome::Done)?,
            Task::Compress { timeout } => client.compress(timeout).map(|_| Outcome::Done)?,
            Task::GetProtection => Outcome::Protection(client.protection()?),
            Task::SetSessionPassword { password } => client.set_session_password(&password).map(|_| Outcome::Done)?,
            Task::ClearSessionPassword => client.clear_session_password().map(|_| Outcome::Done)?,
        };

        Ok(outcome)
    }
}

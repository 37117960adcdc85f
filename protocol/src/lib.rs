mod client;
mod config;
mod event;
mod server;
mod status;

pub use client::{
    BlockInfo, BlocksList, CpInfo, CpuInfo, OrderCode, PlcClient, Protection, ReadVar, VarSpec,
    WriteVar,
};
pub use config::{Config, Target};
pub use event::{event_text, EventCode, SrvEvent};
pub use server::{AreaBuffer, EventCallback, PlcServer, ReadWriteCallback, Tag, MAX_AREA_SIZE};
pub use status::ErrorCode;

/// Maximum number of items in one multi-variable read or write.
pub const MAX_VARS: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown area code: {0:#04x}")]
    UnknownArea(u8),
    #[error("Unknown word length code: {0:#04x}")]
    UnknownWordLen(u8),
    #[error("Unknown block type code: {0:#04x}")]
    UnknownBlockType(u8),
    #[error("Unknown parameter number: {0}")]
    UnknownParam(u8),
}

/// Emulated controller memory classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Area {
    /// Process inputs.
    Pe,
    /// Process outputs.
    Pa,
    /// Merkers.
    Mk,
    /// Data blocks, the only area indexed by a block number.
    Db,
    /// Counters.
    Ct,
    /// Timers.
    Tm,
}

impl Area {
    pub const ALL: [Area; 6] = [Area::Pe, Area::Pa, Area::Mk, Area::Db, Area::Ct, Area::Tm];

    /// Code used on the client side of the wire.
    pub const fn code(self) -> u8 {
        match self {
            Area::Pe => 0x81,
            Area::Pa => 0x82,
            Area::Mk => 0x83,
            Area::Db => 0x84,
            Area::Ct => 0x1C,
            Area::Tm => 0x1D,
        }
    }

    /// Code used when registering server areas.
    pub const fn server_code(self) -> u8 {
        match self {
            Area::Pe => 0,
            Area::Pa => 1,
            Area::Mk => 2,
            Area::Ct => 3,
            Area::Tm => 4,
            Area::Db => 5,
        }
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Area::Db)
    }
}

impl TryFrom<u8> for Area {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Area::ALL
            .into_iter()
            .find(|area| area.code() == code)
            .ok_or(Error::UnknownArea(code))
    }
}

/// Element kinds of an area access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordLen {
    Bit,
    Byte,
    Word,
    DWord,
    Real,
    Counter,
    Timer,
}

impl WordLen {
    pub const fn code(self) -> u8 {
        match self {
            WordLen::Bit => 0x01,
            WordLen::Byte => 0x02,
            WordLen::Word => 0x04,
            WordLen::DWord => 0x06,
            WordLen::Real => 0x08,
            WordLen::Counter => 0x1C,
            WordLen::Timer => 0x1D,
        }
    }

    /// Bytes occupied by one element.
    pub const fn size(self) -> usize {
        match self {
            WordLen::Bit | WordLen::Byte => 1,
            WordLen::Word | WordLen::Counter | WordLen::Timer => 2,
            WordLen::DWord | WordLen::Real => 4,
        }
    }
}

impl TryFrom<u8> for WordLen {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x01 => Ok(WordLen::Bit),
            0x02 => Ok(WordLen::Byte),
            0x04 => Ok(WordLen::Word),
            0x06 => Ok(WordLen::DWord),
            0x08 => Ok(WordLen::Real),
            0x1C => Ok(WordLen::Counter),
            0x1D => Ok(WordLen::Timer),
            _ => Err(Error::UnknownWordLen(code)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Ob,
    Db,
    Sdb,
    Fc,
    Sfc,
    Fb,
    Sfb,
}

impl BlockType {
    pub const fn code(self) -> u8 {
        match self {
            BlockType::Ob => 0x38,
            BlockType::Db => 0x41,
            BlockType::Sdb => 0x42,
            BlockType::Fc => 0x43,
            BlockType::Sfc => 0x44,
            BlockType::Fb => 0x45,
            BlockType::Sfb => 0x46,
        }
    }
}

impl TryFrom<u8> for BlockType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x38 => Ok(BlockType::Ob),
            0x41 => Ok(BlockType::Db),
            0x42 => Ok(BlockType::Sdb),
            0x43 => Ok(BlockType::Fc),
            0x44 => Ok(BlockType::Sfc),
            0x45 => Ok(BlockType::Fb),
            0x46 => Ok(BlockType::Sfb),
            _ => Err(Error::UnknownBlockType(code)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Pg = 1,
    Op = 2,
    Basic = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    #[default]
    Stopped = 0,
    Running = 1,
    Error = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuStatus {
    #[default]
    Unknown = 0x00,
    Stop = 0x04,
    Run = 0x08,
}

/// Tunable library parameters, numbered as the library expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    LocalPort = 1,
    RemotePort = 2,
    PingTimeout = 3,
    SendTimeout = 4,
    RecvTimeout = 5,
    WorkInterval = 6,
    SrcRef = 7,
    DstRef = 8,
    SrcTsap = 9,
    PduRequest = 10,
    MaxClients = 11,
    BSendTimeout = 12,
    BRecvTimeout = 13,
    RecoveryTime = 14,
    KeepAliveTime = 15,
}

impl TryFrom<u8> for Param {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        use Param::*;

        [
            LocalPort,
            RemotePort,
            PingTimeout,
            SendTimeout,
            RecvTimeout,
            WorkInterval,
            SrcRef,
            DstRef,
            SrcTsap,
            PduRequest,
            MaxClients,
            BSendTimeout,
            BRecvTimeout,
            RecoveryTime,
            KeepAliveTime,
        ]
        .into_iter()
        .find(|param| *param as u8 == number)
        .ok_or(Error::UnknownParam(number))
    }
}

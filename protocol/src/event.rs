use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Server event codes, also used as bits of the events mask.
pub struct EventCode;

impl EventCode {
    pub const SERVER_STARTED: u32 = 0x0000_0001;
    pub const SERVER_STOPPED: u32 = 0x0000_0002;
    pub const LISTENER_CANNOT_START: u32 = 0x0000_0004;
    pub const CLIENT_ADDED: u32 = 0x0000_0008;
    pub const CLIENT_REJECTED: u32 = 0x0000_0010;
    pub const CLIENT_NO_ROOM: u32 = 0x0000_0020;
    pub const CLIENT_EXCEPTION: u32 = 0x0000_0040;
    pub const CLIENT_DISCONNECTED: u32 = 0x0000_0080;
    pub const CLIENT_TERMINATED: u32 = 0x0000_0100;
    pub const CLIENTS_DROPPED: u32 = 0x0000_0200;
    pub const PDU_INCOMING: u32 = 0x0001_0000;
    pub const DATA_READ: u32 = 0x0002_0000;
    pub const DATA_WRITE: u32 = 0x0004_0000;
    pub const NEGOTIATE_PDU: u32 = 0x0008_0000;
    pub const READ_SZL: u32 = 0x0010_0000;
    pub const CLOCK: u32 = 0x0020_0000;
    pub const UPLOAD: u32 = 0x0040_0000;
    pub const DOWNLOAD: u32 = 0x0080_0000;
    pub const DIRECTORY: u32 = 0x0100_0000;
    pub const SECURITY: u32 = 0x0200_0000;
    pub const CONTROL: u32 = 0x0400_0000;

    pub const ALL: u32 = 0xFFFF_FFFF;
    pub const NONE: u32 = 0x0000_0000;
}

/// Notification produced by the library's internal threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvEvent {
    pub time: SystemTime,
    pub sender: Ipv4Addr,
    pub code: u32,
    pub ret_code: u16,
    pub params: [u16; 4],
}

impl SrvEvent {
    pub fn new(sender: Ipv4Addr, code: u32) -> Self {
        Self {
            time: SystemTime::now(),
            sender,
            code,
            ret_code: 0,
            params: [0; 4],
        }
    }

    pub fn with_ret_code(mut self, ret_code: u16) -> Self {
        self.ret_code = ret_code;
        self
    }

    pub fn with_params(mut self, params: [u16; 4]) -> Self {
        self.params = params;
        self
    }
}

/// Renders an event the way the server log shows it.
pub fn event_text(event: &SrvEvent) -> String {
    let seconds = event
        .time
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    format!("{} [{}] {}", seconds, event.sender, describe(event))
}

fn describe(event: &SrvEvent) -> String {
    let outcome = if event.ret_code == 0 { "OK" } else { "failed" };

    match event.code {
        EventCode::SERVER_STARTED => "Server started".into(),
        EventCode::SERVER_STOPPED => "Server stopped".into(),
        EventCode::LISTENER_CANNOT_START => "Listener cannot start".into(),
        EventCode::CLIENT_ADDED => "Client added".into(),
        EventCode::CLIENT_REJECTED => "Client refused".into(),
        EventCode::CLIENT_NO_ROOM => "A client was refused due to maximum connections number".into(),
        EventCode::CLIENT_EXCEPTION => "Client exception".into(),
        EventCode::CLIENT_DISCONNECTED => "Client disconnected by peer".into(),
        EventCode::CLIENT_TERMINATED => "Client terminated".into(),
        EventCode::CLIENTS_DROPPED => format!("{} clients have been dropped bacause unresponsive", event.params[0]),
        EventCode::PDU_INCOMING => "PDU incoming".into(),
        EventCode::DATA_READ => format!(
            "Read request, Area : {:#04x}, Start : {}, Size : {} --> {}",
            event.params[0], event.params[2], event.params[3], outcome
        ),
        EventCode::DATA_WRITE => format!(
            "Write request, Area : {:#04x}, Start : {}, Size : {} --> {}",
            event.params[0], event.params[2], event.params[3], outcome
        ),
        EventCode::NEGOTIATE_PDU => format!("The client requires a PDU size of {} bytes", event.params[0]),
        EventCode::READ_SZL => format!("Read SZL request, ID:{:#06x} INDEX:{:#06x} --> {}", event.params[0], event.params[1], outcome),
        EventCode::CLOCK => format!("Clock request --> {outcome}"),
        EventCode::UPLOAD => format!("Block upload request --> {outcome}"),
        EventCode::DOWNLOAD => format!("Block download request --> {outcome}"),
        EventCode::DIRECTORY => format!("Block info request --> {outcome}"),
        EventCode::SECURITY => format!("Security request --> {outcome}"),
        EventCode::CONTROL => format!("CPU control request --> {outcome}"),
        code => format!("Unknown event ({code:#010x})"),
    }
}

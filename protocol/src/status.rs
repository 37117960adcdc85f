use std::fmt;

/// Status code in the library's numeric space.
///
/// A code packs three independent parts: the low word carries a socket error,
/// bits 16..20 an ISO transport error and the upper bits a client or server
/// error. Zero means success.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const OK: ErrorCode = ErrorCode(0);

    pub const ISO_CONNECT: ErrorCode = ErrorCode(0x0001_0000);
    pub const ISO_DISCONNECT: ErrorCode = ErrorCode(0x0002_0000);
    pub const ISO_INVALID_PDU: ErrorCode = ErrorCode(0x0003_0000);
    pub const ISO_INVALID_DATA_SIZE: ErrorCode = ErrorCode(0x0004_0000);
    pub const ISO_NULL_POINTER: ErrorCode = ErrorCode(0x0005_0000);
    pub const ISO_SHORT_PACKET: ErrorCode = ErrorCode(0x0006_0000);
    pub const ISO_TOO_MANY_FRAGMENTS: ErrorCode = ErrorCode(0x0007_0000);
    pub const ISO_PDU_OVERFLOW: ErrorCode = ErrorCode(0x0008_0000);
    pub const ISO_SEND_PACKET: ErrorCode = ErrorCode(0x0009_0000);
    pub const ISO_RECV_PACKET: ErrorCode = ErrorCode(0x000A_0000);
    pub const ISO_INVALID_PARAMS: ErrorCode = ErrorCode(0x000B_0000);

    pub const CLI_NEGOTIATING_PDU: ErrorCode = ErrorCode(0x0010_0000);
    pub const CLI_INVALID_PARAMS: ErrorCode = ErrorCode(0x0020_0000);
    pub const CLI_JOB_PENDING: ErrorCode = ErrorCode(0x0030_0000);
    pub const CLI_TOO_MANY_ITEMS: ErrorCode = ErrorCode(0x0040_0000);
    pub const CLI_INVALID_WORD_LEN: ErrorCode = ErrorCode(0x0050_0000);
    pub const CLI_PARTIAL_DATA_WRITTEN: ErrorCode = ErrorCode(0x0060_0000);
    pub const CLI_SIZE_OVER_PDU: ErrorCode = ErrorCode(0x0070_0000);
    pub const CLI_INVALID_PLC_ANSWER: ErrorCode = ErrorCode(0x0080_0000);
    pub const CLI_ADDRESS_OUT_OF_RANGE: ErrorCode = ErrorCode(0x0090_0000);
    pub const CLI_INVALID_TRANSPORT_SIZE: ErrorCode = ErrorCode(0x00A0_0000);
    pub const CLI_WRITE_DATA_SIZE_MISMATCH: ErrorCode = ErrorCode(0x00B0_0000);
    pub const CLI_ITEM_NOT_AVAILABLE: ErrorCode = ErrorCode(0x00C0_0000);
    pub const CLI_INVALID_VALUE: ErrorCode = ErrorCode(0x00D0_0000);
    pub const CLI_CANNOT_START_PLC: ErrorCode = ErrorCode(0x00E0_0000);
    pub const CLI_ALREADY_RUN: ErrorCode = ErrorCode(0x00F0_0000);
    pub const CLI_CANNOT_STOP_PLC: ErrorCode = ErrorCode(0x0100_0000);
    pub const CLI_CANNOT_COPY_RAM_TO_ROM: ErrorCode = ErrorCode(0x0110_0000);
    pub const CLI_CANNOT_COMPRESS: ErrorCode = ErrorCode(0x0120_0000);
    pub const CLI_ALREADY_STOP: ErrorCode = ErrorCode(0x0130_0000);
    pub const CLI_FUN_NOT_AVAILABLE: ErrorCode = ErrorCode(0x0140_0000);
    pub const CLI_UPLOAD_SEQUENCE_FAILED: ErrorCode = ErrorCode(0x0150_0000);
    pub const CLI_INVALID_DATA_SIZE_RECVD: ErrorCode = ErrorCode(0x0160_0000);
    pub const CLI_INVALID_BLOCK_TYPE: ErrorCode = ErrorCode(0x0170_0000);
    pub const CLI_INVALID_BLOCK_NUMBER: ErrorCode = ErrorCode(0x0180_0000);
    pub const CLI_INVALID_BLOCK_SIZE: ErrorCode = ErrorCode(0x0190_0000);
    pub const CLI_DOWNLOAD_SEQUENCE_FAILED: ErrorCode = ErrorCode(0x01A0_0000);
    pub const CLI_INSERT_REFUSED: ErrorCode = ErrorCode(0x01B0_0000);
    pub const CLI_DELETE_REFUSED: ErrorCode = ErrorCode(0x01C0_0000);
    pub const CLI_NEED_PASSWORD: ErrorCode = ErrorCode(0x01D0_0000);
    pub const CLI_INVALID_PASSWORD: ErrorCode = ErrorCode(0x01E0_0000);
    pub const CLI_NO_PASSWORD_TO_SET_OR_CLEAR: ErrorCode = ErrorCode(0x01F0_0000);
    pub const CLI_JOB_TIMEOUT: ErrorCode = ErrorCode(0x0200_0000);
    pub const CLI_PARTIAL_DATA_READ: ErrorCode = ErrorCode(0x0210_0000);
    pub const CLI_BUFFER_TOO_SMALL: ErrorCode = ErrorCode(0x0220_0000);
    pub const CLI_FUNCTION_REFUSED: ErrorCode = ErrorCode(0x0230_0000);
    pub const CLI_DESTROYING: ErrorCode = ErrorCode(0x0240_0000);
    pub const CLI_INVALID_PARAM_NUMBER: ErrorCode = ErrorCode(0x0250_0000);
    pub const CLI_CANNOT_CHANGE_PARAM: ErrorCode = ErrorCode(0x0260_0000);

    pub const SRV_CANNOT_START: ErrorCode = ErrorCode(0x0010_0000);
    pub const SRV_DB_NULL_POINTER: ErrorCode = ErrorCode(0x0020_0000);
    pub const SRV_AREA_ALREADY_EXISTS: ErrorCode = ErrorCode(0x0030_0000);
    pub const SRV_UNKNOWN_AREA: ErrorCode = ErrorCode(0x0040_0000);
    pub const SRV_INVALID_PARAMS: ErrorCode = ErrorCode(0x0050_0000);
    pub const SRV_TOO_MANY_DB: ErrorCode = ErrorCode(0x0060_0000);
    pub const SRV_INVALID_PARAM_NUMBER: ErrorCode = ErrorCode(0x0070_0000);
    pub const SRV_CANNOT_CHANGE_PARAM: ErrorCode = ErrorCode(0x0080_0000);

    const TCP_MASK: i32 = 0x0000_FFFF;
    const ISO_MASK: i32 = 0x000F_0000;
    const ROLE_MASK: i32 = 0xFFF0_0000_u32 as i32;

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Converts a raw library return value into a `Result`.
    pub fn check(code: i32) -> Result<(), ErrorCode> {
        match code {
            0 => Ok(()),
            code => Err(ErrorCode(code)),
        }
    }

    /// Text of a code returned by a client call.
    pub fn client_text(self) -> String {
        self.compose(client_role_text(self.0 & Self::ROLE_MASK))
    }

    /// Text of a code returned by a server call.
    pub fn server_text(self) -> String {
        self.compose(server_role_text(self.0 & Self::ROLE_MASK))
    }

    fn compose(self, role: Option<String>) -> String {
        if self.is_ok() {
            return "OK".into();
        }

        let parts = [
            tcp_text(self.0 & Self::TCP_MASK),
            iso_text(self.0 & Self::ISO_MASK),
            role,
        ];

        parts.into_iter().flatten().collect::<Vec<_>>().join(" - ")
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCode({:#010x})", self.0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

fn tcp_text(code: i32) -> Option<String> {
    let text = match code {
        0 => return None,
        4 => "TCP : Interrupted system call",
        11 => "TCP : Resource temporarily unavailable",
        98 => "TCP : Address already in use",
        101 => "TCP : Network unreachable",
        104 => "TCP : Connection reset by peer",
        110 => "TCP : Connection timed out",
        111 => "TCP : Connection refused",
        113 => "TCP : No route to host",
        0x0001 => "TCP : Operation not permitted",
        _ => return Some(format!("TCP : Other Socket error ({code})")),
    };
    Some(text.into())
}

fn iso_text(code: i32) -> Option<String> {
    let text = match ErrorCode(code) {
        ErrorCode::OK => return None,
        ErrorCode::ISO_CONNECT => "ISO : Connection error",
        ErrorCode::ISO_DISCONNECT => "ISO : Disconnect error",
        ErrorCode::ISO_INVALID_PDU => "ISO : Bad PDU format",
        ErrorCode::ISO_INVALID_DATA_SIZE => "ISO : Datasize passed to send/recv buffer is invalid",
        ErrorCode::ISO_NULL_POINTER => "ISO : Null passed as pointer",
        ErrorCode::ISO_SHORT_PACKET => "ISO : A short packet received",
        ErrorCode::ISO_TOO_MANY_FRAGMENTS => "ISO : Too many packets without EoT flag",
        ErrorCode::ISO_PDU_OVERFLOW => "ISO : The sum of fragments data exceded maximum packet size",
        ErrorCode::ISO_SEND_PACKET => "ISO : An error occurred during send",
        ErrorCode::ISO_RECV_PACKET => "ISO : An error occurred during recv",
        ErrorCode::ISO_INVALID_PARAMS => "ISO : Invalid connection params (wrong TSAPs)",
        _ => return Some(format!("ISO : Unknown error (0x{code:08x})")),
    };
    Some(text.into())
}

fn client_role_text(code: i32) -> Option<String> {
    let text = match ErrorCode(code) {
        ErrorCode::OK => return None,
        ErrorCode::CLI_NEGOTIATING_PDU => "CPU : Error in PDU negotiation",
        ErrorCode::CLI_INVALID_PARAMS => "CLI : invalid param(s) supplied",
        ErrorCode::CLI_JOB_PENDING => "CLI : Job pending",
        ErrorCode::CLI_TOO_MANY_ITEMS => "CLI : too may items (>20) in multi read/write",
        ErrorCode::CLI_INVALID_WORD_LEN => "CLI : invalid WordLength",
        ErrorCode::CLI_PARTIAL_DATA_WRITTEN => "CLI : Partial data written",
        ErrorCode::CLI_SIZE_OVER_PDU => "CPU : total data exceeds the PDU size",
        ErrorCode::CLI_INVALID_PLC_ANSWER => "CLI : invalid CPU answer",
        ErrorCode::CLI_ADDRESS_OUT_OF_RANGE => "CPU : Address out of range",
        ErrorCode::CLI_INVALID_TRANSPORT_SIZE => "CPU : Invalid Transport size",
        ErrorCode::CLI_WRITE_DATA_SIZE_MISMATCH => "CPU : Data size mismatch",
        ErrorCode::CLI_ITEM_NOT_AVAILABLE => "CPU : Item not available",
        ErrorCode::CLI_INVALID_VALUE => "CPU : Invalid value supplied",
        ErrorCode::CLI_CANNOT_START_PLC => "CPU : Cannot start PLC",
        ErrorCode::CLI_ALREADY_RUN => "CPU : PLC already RUN",
        ErrorCode::CLI_CANNOT_STOP_PLC => "CPU : Cannot stop PLC",
        ErrorCode::CLI_CANNOT_COPY_RAM_TO_ROM => "CPU : Cannot copy RAM to ROM",
        ErrorCode::CLI_CANNOT_COMPRESS => "CPU : Cannot compress",
        ErrorCode::CLI_ALREADY_STOP => "CPU : PLC already STOP",
        ErrorCode::CLI_FUN_NOT_AVAILABLE => "CPU : Function not available",
        ErrorCode::CLI_UPLOAD_SEQUENCE_FAILED => "CPU : Upload sequence failed",
        ErrorCode::CLI_INVALID_DATA_SIZE_RECVD => "CLI : Invalid data size received",
        ErrorCode::CLI_INVALID_BLOCK_TYPE => "CLI : Invalid block type",
        ErrorCode::CLI_INVALID_BLOCK_NUMBER => "CLI : Invalid block number",
        ErrorCode::CLI_INVALID_BLOCK_SIZE => "CLI : Invalid block size",
        ErrorCode::CLI_DOWNLOAD_SEQUENCE_FAILED => "CPU : Download sequence failed",
        ErrorCode::CLI_INSERT_REFUSED => "CPU : block insert refused",
        ErrorCode::CLI_DELETE_REFUSED => "CPU : block delete refused",
        ErrorCode::CLI_NEED_PASSWORD => "CPU : Function not authorized for current protection level",
        ErrorCode::CLI_INVALID_PASSWORD => "CPU : Invalid password",
        ErrorCode::CLI_NO_PASSWORD_TO_SET_OR_CLEAR => "CPU : No password to set or clear",
        ErrorCode::CLI_JOB_TIMEOUT => "CLI : Job Timeout",
        ErrorCode::CLI_PARTIAL_DATA_READ => "CLI : Partial data read",
        ErrorCode::CLI_BUFFER_TOO_SMALL => "CLI : The buffer supplied is too small to accomplish the operation",
        ErrorCode::CLI_FUNCTION_REFUSED => "CLI : function refused by CPU (Unknown error)",
        ErrorCode::CLI_DESTROYING => "CLI : Cannot perform (destroying)",
        ErrorCode::CLI_INVALID_PARAM_NUMBER => "CLI : Invalid Param Number",
        ErrorCode::CLI_CANNOT_CHANGE_PARAM => "CLI : Cannot change this param now",
        _ => return Some(format!("CLI : Unknown error (0x{code:08x})")),
    };
    Some(text.into())
}

fn server_role_text(code: i32) -> Option<String> {
    let text = match ErrorCode(code) {
        ErrorCode::OK => return None,
        ErrorCode::SRV_CANNOT_START => "SRV : Server cannot start",
        ErrorCode::SRV_DB_NULL_POINTER => "SRV : Null passed as area pointer",
        ErrorCode::SRV_AREA_ALREADY_EXISTS => "SRV : Cannot register area since already exists",
        ErrorCode::SRV_UNKNOWN_AREA => "SRV : Unknown area",
        ErrorCode::SRV_INVALID_PARAMS => "SRV : Invalid param(s) supplied",
        ErrorCode::SRV_TOO_MANY_DB => "SRV : Cannot register DB: too many DB",
        ErrorCode::SRV_INVALID_PARAM_NUMBER => "SRV : Invalid param (srv_get/set_param)",
        ErrorCode::SRV_CANNOT_CHANGE_PARAM => "SRV : Cannot change this param now",
        _ => return Some(format!("SRV : Unknown error (0x{code:08x})")),
    };
    Some(text.into())
}

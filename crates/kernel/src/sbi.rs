//! Supervisor Binary Interface calls into the firmware.
//!
//! Arguments travel in `a0..a5`, the function id in `a6` and the extension id
//! in `a7`; the firmware answers with `(error, value)` in `a0`/`a1`.

use core::fmt;

use crate::arch;

/// Legacy console putchar (v0.1).
pub const EID_CONSOLE_PUTCHAR: isize = 0x01;
/// Legacy console getchar (v0.1).
pub const EID_CONSOLE_GETCHAR: isize = 0x02;
/// System reset extension ("SRST").
pub const EID_SYSTEM_RESET: isize = 0x5352_5354;

pub const SRST_TYPE_SHUTDOWN: isize = 0;
pub const SRST_REASON_NONE: isize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbiRet {
    pub error: isize,
    pub value: isize,
}

impl SbiRet {
    pub const fn new(error: isize, value: isize) -> Self {
        Self { error, value }
    }

    pub fn into_result(self) -> Result<isize, SbiError> {
        if self.error == 0 {
            Ok(self.value)
        } else {
            Err(SbiError::from_code(self.error))
        }
    }
}

/// Standard SBI error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SbiError {
    Failed,
    NotSupported,
    InvalidParam,
    Denied,
    InvalidAddress,
    AlreadyAvailable,
    AlreadyStarted,
    AlreadyStopped,
    Unknown(isize),
}

impl SbiError {
    pub const NOT_SUPPORTED: isize = -2;

    pub fn from_code(code: isize) -> Self {
        match code {
            -1 => SbiError::Failed,
            -2 => SbiError::NotSupported,
            -3 => SbiError::InvalidParam,
            -4 => SbiError::Denied,
            -5 => SbiError::InvalidAddress,
            -6 => SbiError::AlreadyAvailable,
            -7 => SbiError::AlreadyStarted,
            -8 => SbiError::AlreadyStopped,
            other => SbiError::Unknown(other),
        }
    }
}

impl fmt::Display for SbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SbiError::Failed => f.write_str("failed"),
            SbiError::NotSupported => f.write_str("not supported"),
            SbiError::InvalidParam => f.write_str("invalid parameter"),
            SbiError::Denied => f.write_str("denied"),
            SbiError::InvalidAddress => f.write_str("invalid address"),
            SbiError::AlreadyAvailable => f.write_str("already available"),
            SbiError::AlreadyStarted => f.write_str("already started"),
            SbiError::AlreadyStopped => f.write_str("already stopped"),
            SbiError::Unknown(code) => write!(f, "unknown error {code}"),
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn sbi_call(
    arg0: isize,
    arg1: isize,
    arg2: isize,
    arg3: isize,
    arg4: isize,
    arg5: isize,
    fid: isize,
    eid: isize,
) -> SbiRet {
    arch::sbi_call([arg0, arg1, arg2, arg3, arg4, arg5], fid, eid)
}

pub fn putchar(ch: u8) {
    sbi_call(ch as isize, 0, 0, 0, 0, 0, 0, EID_CONSOLE_PUTCHAR);
}

/// Legacy extensions return their result in `a0`; negative means no byte.
pub fn getchar() -> Option<u8> {
    let ret = sbi_call(0, 0, 0, 0, 0, 0, 0, EID_CONSOLE_GETCHAR);
    u8::try_from(ret.error).ok()
}

/// Ask the firmware to power off; parks the hart if it refuses.
pub fn shutdown() -> ! {
    let ret = sbi_call(
        SRST_TYPE_SHUTDOWN,
        SRST_REASON_NONE,
        0,
        0,
        0,
        0,
        0,
        EID_SYSTEM_RESET,
    );
    if let Err(err) = ret.into_result() {
        log::error!("sbi shutdown failed: {err}");
    }
    arch::park()
}

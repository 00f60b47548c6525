//! Trap subsystem.
//!
//! Entry (in `arch`): `csrrw sp, sscratch, sp` swaps the interrupted stack
//! pointer with the current process's kernel stack top, the register file is
//! stored into a [`TrapFrame`] at the bottom of that stack, `sscratch` is
//! re-armed with the stack top, and [`kernel_trap`] receives the frame.
//! Returning `Ok` would restore every register, reload `sp` from the frame
//! and `sret`; no trap takes that path yet.

use core::mem::size_of;

use crate::arch;
use crate::fatal::{Fatal, FatalKind};

/// `sstatus.SIE`: global supervisor interrupt enable.
pub const SSTATUS_SIE: usize = 1 << 1;
/// `sie.STIE`: supervisor timer interrupt enable.
pub const SIE_STIE: usize = 1 << 5;

const SCAUSE_INTERRUPT: u32 = 1 << 31;
const SCAUSE_CODE_MASK: u32 = !SCAUSE_INTERRUPT;

/// Words in a [`TrapFrame`]: 30 saved registers plus the interrupted `sp`.
pub const TRAP_FRAME_WORDS: usize = 31;

/// Register file captured by the trap entry stub, in stack order.
///
/// `zero` is never saved and `sp` is stored last: the stub only learns the
/// interrupted value after swapping it out of `sscratch`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub ra: u32,
    pub gp: u32,
    pub tp: u32,
    pub t0: u32,
    pub t1: u32,
    pub t2: u32,
    pub t3: u32,
    pub t4: u32,
    pub t5: u32,
    pub t6: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub a4: u32,
    pub a5: u32,
    pub a6: u32,
    pub a7: u32,
    pub s0: u32,
    pub s1: u32,
    pub s2: u32,
    pub s3: u32,
    pub s4: u32,
    pub s5: u32,
    pub s6: u32,
    pub s7: u32,
    pub s8: u32,
    pub s9: u32,
    pub s10: u32,
    pub s11: u32,
    pub sp: u32,
}

const _: () = assert!(size_of::<TrapFrame>() == TRAP_FRAME_WORDS * 4);

/// Machine-supplied diagnostics for the trap being handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapInfo {
    pub scause: u32,
    pub stval: u32,
    pub sepc: u32,
}

impl TrapInfo {
    pub const fn new(scause: u32, stval: u32, sepc: u32) -> Self {
        Self { scause, stval, sepc }
    }

    pub fn cause(&self) -> TrapCause {
        TrapCause::from_scause(self.scause)
    }
}

/// Decoded `scause`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapCause {
    Interrupt(u32),
    Exception(u32),
}

impl TrapCause {
    pub fn from_scause(scause: u32) -> Self {
        let code = scause & SCAUSE_CODE_MASK;
        if scause & SCAUSE_INTERRUPT != 0 {
            TrapCause::Interrupt(code)
        } else {
            TrapCause::Exception(code)
        }
    }

    pub fn code(&self) -> u32 {
        match *self {
            TrapCause::Interrupt(code) | TrapCause::Exception(code) => code,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, TrapCause::Interrupt(_))
    }

    /// Name of a supervisor-visible cause, as the privileged ISA manual lists it.
    pub fn name(&self) -> &'static str {
        match *self {
            TrapCause::Interrupt(1) => "supervisor software interrupt",
            TrapCause::Interrupt(5) => "supervisor timer interrupt",
            TrapCause::Interrupt(9) => "supervisor external interrupt",
            TrapCause::Interrupt(_) => "unknown interrupt",
            TrapCause::Exception(0) => "instruction address misaligned",
            TrapCause::Exception(1) => "instruction access fault",
            TrapCause::Exception(2) => "illegal instruction",
            TrapCause::Exception(3) => "breakpoint",
            TrapCause::Exception(4) => "load address misaligned",
            TrapCause::Exception(5) => "load access fault",
            TrapCause::Exception(6) => "store/AMO address misaligned",
            TrapCause::Exception(7) => "store/AMO access fault",
            TrapCause::Exception(8) => "environment call from U-mode",
            TrapCause::Exception(9) => "environment call from S-mode",
            TrapCause::Exception(12) => "instruction page fault",
            TrapCause::Exception(13) => "load page fault",
            TrapCause::Exception(15) => "store/AMO page fault",
            TrapCause::Exception(_) => "unknown exception",
        }
    }
}

/// `stvec.MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TrapVectorMode {
    /// Every trap jumps to BASE.
    Direct = 0,
    /// Exceptions jump to BASE, interrupts to BASE + 4 * cause.
    Vectored = 1,
}

const STVEC_MODE_MASK: usize = 0b11;

/// Compose an `stvec` value; `None` when `base` is not 4-byte aligned.
pub fn stvec_value(base: usize, mode: TrapVectorMode) -> Option<usize> {
    if base & STVEC_MODE_MASK != 0 {
        return None;
    }
    Some(base | mode as usize)
}

/// Split an `stvec` value into BASE and MODE (`None` for the reserved modes).
pub fn decode_stvec(value: usize) -> (usize, Option<TrapVectorMode>) {
    let mode = match value & STVEC_MODE_MASK {
        0 => Some(TrapVectorMode::Direct),
        1 => Some(TrapVectorMode::Vectored),
        _ => None,
    };
    (value & !STVEC_MODE_MASK, mode)
}

/// Point `stvec` at the trap entry (direct) or the jump table (vectored).
///
/// Only the single shared handler exists, so every slot of the vectored
/// table jumps to the same entry and both modes behave identically.
pub fn install_trap_vector(mode: TrapVectorMode) -> Result<usize, Fatal> {
    let base = match mode {
        TrapVectorMode::Direct => arch::trap_entry_addr(),
        TrapVectorMode::Vectored => arch::trap_vector_table_addr(),
    };
    let Some(value) = stvec_value(base, mode) else {
        return Err(Fatal::invalid_request("trap vector base is not 4-byte aligned"));
    };
    // SAFETY: `base` is the address of one of the arch trap stubs.
    unsafe { arch::write_stvec(value) };
    log::info!("trap vector installed: base={:#010x} mode={:?}", base, mode);
    Ok(value)
}

/// Set `sie.STIE` and `sstatus.SIE`.
///
/// Clearing a pending timer interrupt is not implemented, and no trap is
/// recoverable, so the first tick after this halts the kernel.
pub fn enable_timer_interrupts() {
    arch::enable_interrupts(SIE_STIE);
    log::warn!("timer interrupts enabled without a recoverable timer handler");
}

/// Classify a trap. No trap is recoverable yet, so this always returns
/// `Err`; the caller halts.
pub fn handle_trap(frame: &TrapFrame, info: TrapInfo) -> Result<(), Fatal> {
    let cause = info.cause();
    log::error!(
        "trap: {} (code={}) sepc={:#010x} stval={:#010x} sp={:#010x} ra={:#010x}",
        cause.name(),
        cause.code(),
        info.sepc,
        info.stval,
        frame.sp,
        frame.ra
    );
    Err(Fatal::new(FatalKind::UnexpectedTrap {
        scause: info.scause,
        stval: info.stval,
        sepc: info.sepc,
    }))
}

/// Called by the arch entry stub with the frame it just filled in.
pub fn kernel_trap(frame: &mut TrapFrame) -> Result<(), Fatal> {
    let info = arch::read_trap_info();
    handle_trap(frame, info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scause_decoding() {
        assert_eq!(TrapCause::from_scause(2), TrapCause::Exception(2));
        let timer = TrapCause::from_scause(0x8000_0005);
        assert_eq!(timer, TrapCause::Interrupt(5));
        assert!(timer.is_interrupt());
        assert_eq!(timer.code(), 5);
        assert_eq!(timer.name(), "supervisor timer interrupt");
        assert_eq!(TrapCause::Exception(11).name(), "unknown exception");
    }

    #[test]
    fn stvec_encoding_round_trips() {
        assert_eq!(stvec_value(0x8020_0100, TrapVectorMode::Direct), Some(0x8020_0100));
        assert_eq!(stvec_value(0x8020_0100, TrapVectorMode::Vectored), Some(0x8020_0101));
        assert_eq!(stvec_value(0x8020_0102, TrapVectorMode::Direct), None);
        assert_eq!(decode_stvec(0x8020_0101), (0x8020_0100, Some(TrapVectorMode::Vectored)));
        assert_eq!(decode_stvec(0x8020_0103), (0x8020_0100, None));
    }

    #[test]
    fn every_trap_is_fatal() {
        let frame = TrapFrame {
            sp: 0x8030_0000,
            ..TrapFrame::default()
        };
        let err = handle_trap(&frame, TrapInfo::new(0x8000_0005, 0, 0x8020_1000)).unwrap_err();
        assert_eq!(
            *err.kind(),
            FatalKind::UnexpectedTrap {
                scause: 0x8000_0005,
                stval: 0,
                sepc: 0x8020_1000,
            }
        );
        assert!(err.location().file().ends_with("trap.rs"));
    }
}
